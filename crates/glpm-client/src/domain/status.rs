//! Status codes carried in server responses.
//!
//! Zero means success; every other value is one of the server's error
//! codes. Codes this client does not know are kept verbatim.

use thiserror::Error;

const STATUS_SUCCESS: i32 = 0;

/// A nonzero response status from the glucose server.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    #[error("server reported an invalid parameter")]
    InvalidParameter,
    #[error("server module not initialized")]
    NotInitialized,
    #[error("operation not supported by the sensor")]
    NotSupported,
    #[error("no records found")]
    NoRecords,
    #[error("device not connected")]
    DeviceNotConnected,
    #[error("another procedure is outstanding")]
    ProcedureOutstanding,
    #[error("unknown server status {0}")]
    Unknown(i32),
}

impl RemoteStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::InvalidParameter,
            -2 => Self::NotInitialized,
            -3 => Self::NotSupported,
            -4 => Self::NoRecords,
            -5 => Self::DeviceNotConnected,
            -6 => Self::ProcedureOutstanding,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidParameter => -1,
            Self::NotInitialized => -2,
            Self::NotSupported => -3,
            Self::NoRecords => -4,
            Self::DeviceNotConnected => -5,
            Self::ProcedureOutstanding => -6,
            Self::Unknown(code) => *code,
        }
    }

    /// `Ok(())` for a success status, the decoded status otherwise.
    pub fn check(code: i32) -> Result<(), RemoteStatus> {
        if code == STATUS_SUCCESS {
            Ok(())
        } else {
            Err(Self::from_code(code))
        }
    }
}
