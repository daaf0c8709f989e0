//! Invocation Module
//!
//! The boundary between a caller's `(function, args)` pair and the
//! contract's typed operations.
//!
//! ## Functions
//! - `initLedger`   - no arguments
//! - `createRecord` - `[key, sender, receiver, amount, time]` with direct keys,
//!   `[sender, receiver, amount, type]` with composite keys
//! - `queryRecord`  - `[key]` for key lookups, `[party, limit?, skip?]` for
//!   rich queries
//!
//! Argument count and argument types are checked once, here, so handlers
//! only ever see well-formed input.

mod command;
mod response;

pub use command::{CreateArgs, Function, Invocation, QueryArgs};
pub use response::{Response, Status};
