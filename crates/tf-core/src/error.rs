//! Error types for tf-sensors.
//!
//! `SensorError` is the single error enum used across the library crates.
//! The taxonomy follows how each condition is handled at runtime:
//!
//! - **`Connection`**: the bus transport cannot be reached at startup. This is
//!   the only terminal condition.
//! - **`Read`** / **`Timeout`**: a device handle read returned a negative bus
//!   status or did not complete in time. Absorbed per poll cycle: logged, the
//!   record is skipped, the descriptor stays live.
//! - **`UnexpectedSample`** / **`Unsupported`**: a handle returned a sample of
//!   the wrong shape or does not offer the requested read. Absorbed like a
//!   read failure.
//! - **`Sink`**: the telemetry sink refused a record or a channel.
//! - **`Configuration`**: semantic errors in loaded configuration.
//!
//! Degraded signal quality (a GPS fix below 3D) is not an error and has no
//! variant here.

use std::fmt;
use thiserror::Error;

// =============================================================================
// Bus Status Codes
// =============================================================================

/// Negative status codes reported by the bus daemon client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusStatus {
    /// Request timed out
    Timeout,
    /// Could not create a stream socket
    NoStreamSocket,
    /// Hostname could not be resolved
    HostnameInvalid,
    /// Could not connect to the daemon
    NoConnect,
    /// Could not start the callback thread
    NoThread,
    /// Request was not sent
    NotAdded,
    /// A connection is already established
    AlreadyConnected,
    /// No connection is established
    NotConnected,
    /// Argument out of range
    InvalidParameter,
    /// Function not supported by this device
    NotSupported,
    /// Device reported an unknown error code
    UnknownErrorCode,
    /// A negative code outside the known table
    Other(i32),
}

impl BusStatus {
    /// Map a raw status code. Non-negative codes are success and yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let status = match code {
            c if c >= 0 => return None,
            -1 => Self::Timeout,
            -2 => Self::NoStreamSocket,
            -3 => Self::HostnameInvalid,
            -4 => Self::NoConnect,
            -5 => Self::NoThread,
            -6 => Self::NotAdded,
            -7 => Self::AlreadyConnected,
            -8 => Self::NotConnected,
            -9 => Self::InvalidParameter,
            -10 => Self::NotSupported,
            -11 => Self::UnknownErrorCode,
            other => Self::Other(other),
        };
        Some(status)
    }

    /// Raw negative code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Timeout => -1,
            Self::NoStreamSocket => -2,
            Self::HostnameInvalid => -3,
            Self::NoConnect => -4,
            Self::NoThread => -5,
            Self::NotAdded => -6,
            Self::AlreadyConnected => -7,
            Self::NotConnected => -8,
            Self::InvalidParameter => -9,
            Self::NotSupported => -10,
            Self::UnknownErrorCode => -11,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::NoStreamSocket => "no_stream_socket",
            Self::HostnameInvalid => "hostname_invalid",
            Self::NoConnect => "no_connect",
            Self::NoThread => "no_thread",
            Self::NotAdded => "not_added",
            Self::AlreadyConnected => "already_connected",
            Self::NotConnected => "not_connected",
            Self::InvalidParameter => "invalid_parameter",
            Self::NotSupported => "not_supported",
            Self::UnknownErrorCode => "unknown_error_code",
            Self::Other(_) => "other",
        };
        write!(f, "{} ({})", label, self.code())
    }
}

// =============================================================================
// Sensor Errors
// =============================================================================

/// Convenience alias for results using [`SensorError`].
pub type SensorResult<T> = std::result::Result<T, SensorError>;

/// Primary error type for tf-sensors.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The bus daemon could not be reached.
    ///
    /// **Error Type**: Terminal - discovery never starts.
    #[error("Could not connect to bus daemon at {host}:{port}: {status}")]
    Connection {
        host: String,
        port: u16,
        status: BusStatus,
    },

    /// A handle read returned a negative bus status.
    ///
    /// **Error Type**: Per cycle - the descriptor is skipped for this cycle only.
    #[error("Read of {what} from '{uid}' failed: {status}")]
    Read {
        uid: String,
        what: &'static str,
        status: BusStatus,
    },

    /// A handle read did not complete within the configured bound.
    ///
    /// **Error Type**: Per cycle.
    #[error("Read of {what} from '{uid}' timed out after {timeout_ms} ms")]
    Timeout {
        uid: String,
        what: &'static str,
        timeout_ms: u64,
    },

    /// A handle returned a sample of a different shape than requested.
    #[error("Device '{uid}' returned an unexpected sample for {what}")]
    UnexpectedSample { uid: String, what: &'static str },

    /// The handle does not offer the requested read.
    #[error("Device '{uid}' does not support reading {what}")]
    Unsupported { uid: String, what: &'static str },

    /// Handle construction or destruction failed on the bus side.
    #[error("Device '{uid}' handle error: {message}")]
    Handle { uid: String, message: String },

    /// A descriptor with the same address, class and type code is already live.
    #[error("Device '{uid}' is already registered as {class} (type {type_code})")]
    AlreadyRegistered {
        uid: String,
        class: crate::sensor::SensorClass,
        type_code: u16,
    },

    /// The telemetry sink rejected a channel or a record.
    #[error("Telemetry sink error on '{topic}': {message}")]
    Sink { topic: String, message: String },

    /// Configuration values parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Underlying I/O failure (sinks writing to files or stdout).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Build a read error from a raw negative status code.
    pub fn read(uid: impl Into<String>, what: &'static str, code: i32) -> Self {
        Self::Read {
            uid: uid.into(),
            what,
            status: BusStatus::from_code(code).unwrap_or(BusStatus::Other(code)),
        }
    }

    /// Whether this error is absorbed within a poll cycle.
    pub fn is_per_cycle(&self) -> bool {
        matches!(
            self,
            Self::Read { .. }
                | Self::Timeout { .. }
                | Self::UnexpectedSample { .. }
                | Self::Unsupported { .. }
                | Self::Sink { .. }
        )
    }
}
