//! Distance normalization.
//!
//! Range bounds come from the descriptor's bound parameters, each field
//! independently, and fall back to per-variant defaults.

use tf_core::{HardwareType, Header, RadiationType, RangeRecord, SensorParams};

/// Field-of-view parameter names, preferred first.
pub const FOV_PARAMS: &[&str] = &["fov", "fow"];
/// Minimum range parameter name.
pub const MIN_PARAM: &str = "min";
/// Maximum range parameter name.
pub const MAX_PARAM: &str = "max";

/// Per-variant sensor geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeGeometry {
    /// Emitter type
    pub radiation_type: RadiationType,
    /// Radians
    pub field_of_view: f64,
    /// Meters
    pub min_range: f64,
    /// Meters
    pub max_range: f64,
}

/// Ultrasonic distance module.
pub const ULTRASONIC: RangeGeometry = RangeGeometry {
    radiation_type: RadiationType::Ultrasound,
    field_of_view: 0.2617,
    min_range: 0.02,
    max_range: 4.0,
};

/// Infrared distance module.
pub const INFRARED: RangeGeometry = RangeGeometry {
    radiation_type: RadiationType::Infrared,
    field_of_view: 0.01,
    min_range: 0.03,
    max_range: 0.4,
};

impl RangeGeometry {
    /// Defaults for a distance module type.
    pub fn defaults(hardware: HardwareType) -> Self {
        match hardware {
            HardwareType::DistanceIr => INFRARED,
            _ => ULTRASONIC,
        }
    }

    /// Apply parameter overrides field by field.
    pub fn with_params(self, params: &SensorParams) -> Self {
        Self {
            radiation_type: self.radiation_type,
            field_of_view: params.f64_any(FOV_PARAMS).unwrap_or(self.field_of_view),
            min_range: params.get(MIN_PARAM).as_f64().unwrap_or(self.min_range),
            max_range: params.get(MAX_PARAM).as_f64().unwrap_or(self.max_range),
        }
    }
}

/// Raw distance (millimeters) to a range record.
pub fn from_raw(
    hardware: HardwareType,
    params: &SensorParams,
    distance_mm: u16,
    header: Header,
) -> RangeRecord {
    let geometry = RangeGeometry::defaults(hardware).with_params(params);
    RangeRecord {
        header,
        radiation_type: geometry.radiation_type,
        field_of_view: geometry.field_of_view,
        min_range: geometry.min_range,
        max_range: geometry.max_range,
        range: f64::from(distance_mm) / 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tf_core::ParamValue;

    fn header() -> Header {
        Header {
            seq: 1,
            stamp: Utc::now(),
            frame_id: "base_link".into(),
        }
    }

    #[test]
    fn test_ultrasonic_defaults() {
        let record = from_raw(HardwareType::DistanceUs, &SensorParams::new(), 1250, header());
        assert_eq!(record.radiation_type, RadiationType::Ultrasound);
        assert_eq!(record.field_of_view, 0.2617);
        assert_eq!(record.min_range, 0.02);
        assert_eq!(record.max_range, 4.0);
        assert_eq!(record.range, 1.25);
    }

    #[test]
    fn test_infrared_defaults() {
        let record = from_raw(HardwareType::DistanceIr, &SensorParams::new(), 300, header());
        assert_eq!(record.radiation_type, RadiationType::Infrared);
        assert_eq!(record.field_of_view, 0.01);
        assert_eq!(record.min_range, 0.03);
        assert_eq!(record.max_range, 0.4);
        assert_eq!(record.range, 0.3);
    }

    #[test]
    fn test_max_override_leaves_other_fields() {
        let params = SensorParams::new().with(MAX_PARAM, ParamValue::Float(2.5));
        let record = from_raw(HardwareType::DistanceUs, &params, 0, header());
        assert_eq!(record.max_range, 2.5);
        assert_eq!(record.min_range, 0.02);
        assert_eq!(record.field_of_view, 0.2617);
    }

    #[test]
    fn test_integer_and_alias_params() {
        let params = SensorParams::new()
            .with("fow", ParamValue::Float(0.5))
            .with(MIN_PARAM, ParamValue::Integer(1))
            .with(MAX_PARAM, ParamValue::String("far".into()));
        let geometry = RangeGeometry::defaults(HardwareType::DistanceIr).with_params(&params);
        assert_eq!(geometry.field_of_view, 0.5);
        assert_eq!(geometry.min_range, 1.0);
        assert_eq!(geometry.max_range, 0.4);
    }

    #[test]
    fn test_fov_wins_over_alias() {
        let params = SensorParams::new()
            .with("fov", ParamValue::Float(0.3))
            .with("fow", ParamValue::Float(0.5));
        let geometry = RangeGeometry::defaults(HardwareType::DistanceUs).with_params(&params);
        assert_eq!(geometry.field_of_view, 0.3);
    }
}
