//! Per-device configuration parameters.
//!
//! The configuration provider hands out, per module address, an optional
//! requested topic and a map of typed parameters. Parameters are consulted
//! by the normalizers (range bounds) and by the descriptor itself
//! (`frame_id`).

use crate::error::{SensorError, SensorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter key that overrides the record frame label.
pub const FRAME_ID_PARAM: &str = "frame_id";

/// Key consumed as the requested topic rather than as a parameter.
pub const TOPIC_KEY: &str = "topic";

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Parameter not set
    #[default]
    None,
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Flag
    Boolean(bool),
}

impl ParamValue {
    /// Whether a value is present.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Numeric view: floats as-is, integers widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl TryFrom<&toml::Value> for ParamValue {
    type Error = SensorError;

    fn try_from(value: &toml::Value) -> SensorResult<Self> {
        match value {
            toml::Value::Integer(v) => Ok(Self::Integer(*v)),
            toml::Value::Float(v) => Ok(Self::Float(*v)),
            toml::Value::String(s) => Ok(Self::String(s.clone())),
            toml::Value::Boolean(b) => Ok(Self::Boolean(*b)),
            other => Err(SensorError::Configuration(format!(
                "unsupported parameter type '{}'",
                other.type_str()
            ))),
        }
    }
}

/// Named parameters bound to one descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorParams(BTreeMap<String, ParamValue>);

static UNSET: ParamValue = ParamValue::None;

impl SensorParams {
    /// Empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a parameter; absent names yield [`ParamValue::None`].
    pub fn get(&self, name: &str) -> &ParamValue {
        self.0.get(name).unwrap_or(&UNSET)
    }

    /// First numeric value among `names`.
    pub fn f64_any(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.get(name).as_f64())
    }

    /// Frame label override, if configured as a string.
    pub fn frame_id(&self) -> Option<&str> {
        self.get(FRAME_ID_PARAM).as_str()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Configuration entry for one module address.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Requested topic; `None` means the topic namer generates one
    pub topic: Option<String>,
    /// Typed parameters applied to every descriptor of the module
    pub params: SensorParams,
}

impl SensorConfig {
    /// Build from a TOML table, consuming the `topic` key.
    ///
    /// # Errors
    /// Arrays, tables and datetimes are rejected, as is a non-string topic.
    pub fn from_table(table: &toml::Table) -> SensorResult<Self> {
        let mut config = SensorConfig::default();
        for (key, value) in table {
            if key == TOPIC_KEY {
                let topic = value.as_str().ok_or_else(|| {
                    SensorError::Configuration(format!(
                        "'{}' must be a string, got {}",
                        TOPIC_KEY,
                        value.type_str()
                    ))
                })?;
                if !topic.is_empty() {
                    config.topic = Some(topic.to_string());
                }
                continue;
            }
            let param = ParamValue::try_from(value).map_err(|e| {
                SensorError::Configuration(format!("parameter '{}': {}", key, e))
            })?;
            config.params.insert(key.clone(), param);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_param_is_none() {
        let params = SensorParams::new();
        assert_eq!(params.get("max"), &ParamValue::None);
        assert!(!params.get("max").is_set());
    }

    #[test]
    fn test_numeric_view_widens_integers() {
        assert_eq!(ParamValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(ParamValue::String("2.5".into()).as_f64(), None);
    }

    #[test]
    fn test_f64_any_prefers_first_name() {
        let params = SensorParams::new()
            .with("fov", ParamValue::Float(0.5))
            .with("fow", ParamValue::Float(0.7));
        assert_eq!(params.f64_any(&["fov", "fow"]), Some(0.5));
        assert_eq!(params.f64_any(&["fow", "fov"]), Some(0.7));
        assert_eq!(params.f64_any(&["min"]), None);
    }

    #[test]
    fn test_frame_id_requires_string() {
        let params = SensorParams::new().with(FRAME_ID_PARAM, ParamValue::Integer(4));
        assert_eq!(params.frame_id(), None);

        let params = SensorParams::new().with(FRAME_ID_PARAM, ParamValue::String("imu".into()));
        assert_eq!(params.frame_id(), Some("imu"));
    }

    #[test]
    fn test_from_table_extracts_topic() {
        let table: toml::Table = toml::from_str(
            r#"
topic = "/front/range"
frame_id = "front"
max = 2.5
samples = 4
enabled = true
"#,
        )
        .unwrap();

        let config = SensorConfig::from_table(&table).unwrap();
        assert_eq!(config.topic.as_deref(), Some("/front/range"));
        assert_eq!(config.params.get("max"), &ParamValue::Float(2.5));
        assert_eq!(config.params.get("samples"), &ParamValue::Integer(4));
        assert_eq!(config.params.get("enabled"), &ParamValue::Boolean(true));
        assert_eq!(config.params.get(TOPIC_KEY), &ParamValue::None);
        assert_eq!(config.params.frame_id(), Some("front"));
    }

    #[test]
    fn test_from_table_rejects_arrays() {
        let table: toml::Table = toml::from_str("bounds = [1, 2]").unwrap();
        let err = SensorConfig::from_table(&table).unwrap_err();
        assert!(err.to_string().contains("bounds"));
    }

    #[test]
    fn test_empty_topic_means_generated() {
        let table: toml::Table = toml::from_str("topic = \"\"").unwrap();
        let config = SensorConfig::from_table(&table).unwrap();
        assert_eq!(config.topic, None);
    }
}
