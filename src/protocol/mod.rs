//! Protocol Module
//!
//! Defines the wire protocol between `wallet-cli` and `wallet-peer`.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Request Kinds
//! - 0x01: INVOKE - Payload: argc (4) + function + args, each as len (4) + UTF-8
//! - 0x02: PING   - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK    - Payload: contract payload
//! - 0x02: ERROR - Payload: UTF-8 error message

mod codec;
mod request;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use request::{Request, RequestKind};
