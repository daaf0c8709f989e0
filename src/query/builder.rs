//! Query construction
//!
//! Builds and (de)serializes rich query predicates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Sort order of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A rich query predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichQuery {
    pub selector: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<BTreeMap<String, SortDirection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl RichQuery {
    /// Every record sent or received by `party`, newest first
    pub fn by_party(party: &str, limit: u64, skip: Option<u64>) -> Self {
        let mut selector = Map::new();
        selector.insert(
            "$or".to_string(),
            json!([{ "sender": party }, { "receiver": party }]),
        );

        let mut order = BTreeMap::new();
        order.insert("transfer_time".to_string(), SortDirection::Desc);

        Self {
            selector,
            sort: vec![order],
            limit: Some(limit),
            skip,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
