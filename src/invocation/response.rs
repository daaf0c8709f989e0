//! Response definitions
//!
//! The outcome of one invocation.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x02,
}

/// Either a payload or an error message, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Contract payload (empty on error, and on a lookup that found nothing)
    pub payload: Vec<u8>,

    /// Human-readable failure, set only when `status` is `Error`
    pub message: Option<String>,
}

impl Response {
    /// Create an OK response
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            payload,
            message: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
