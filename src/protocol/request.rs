//! Request definitions
//!
//! Represents requests from clients.

/// Request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    Invoke = 0x01,
    Ping = 0x02,
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Call a contract function
    Invoke { function: String, args: Vec<String> },

    /// Ping (health check)
    Ping,
}

impl Request {
    /// Build an invoke request from string-like parts
    pub fn invoke<S: Into<String>>(function: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Request::Invoke {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Get the request kind
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Invoke { .. } => RequestKind::Invoke,
            Request::Ping => RequestKind::Ping,
        }
    }
}
