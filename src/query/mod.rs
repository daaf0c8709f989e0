//! Rich Query Module
//!
//! The JSON predicate the contract sends to a query-capable store.
//!
//! ## Predicate Format
//! ```text
//! {"selector": {"$or": [{"sender": <id>}, {"receiver": <id>}]},
//!  "sort": [{"transfer_time": "desc"}],
//!  "limit": <n>,
//!  "skip": <n>}
//! ```
//! `skip` is left out when the caller did not supply one.
//!
//! The same types parse and evaluate predicates inside `MemoryStub`, which
//! supports field equality, `$eq`, `$or` and `$and`.

mod builder;
mod selector;

pub use builder::{RichQuery, SortDirection};
