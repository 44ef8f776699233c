//! Append-only collections deduplicated by value
//!
//! Target entities carry small classification lists (a handful of entries
//! each) that only support appending. Two entries are duplicates when their
//! designated value matches, whatever else differs.

use serde::{Deserialize, Serialize};

/// An item whose identity within a collection is one value field.
pub trait ValueKeyed {
    type Value: PartialEq + ?Sized;

    fn value(&self) -> &Self::Value;
}

/// Append unless an element with an equal value is already present.
pub trait AddIfNotPresent<T: ValueKeyed> {
    /// Returns `true` if `item` was appended. Linear in the collection size.
    fn add_if_not_present(&mut self, item: T) -> bool;
}

impl<T: ValueKeyed> AddIfNotPresent<T> for Vec<T> {
    fn add_if_not_present(&mut self, item: T) -> bool {
        if self.iter().any(|existing| existing.value() == item.value()) {
            return false;
        }
        self.push(item);
        true
    }
}

/// A classification entry (e.g. a Uniclass or OmniClass code) on a target entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The code, e.g. "A1" or "Pr_40_10_57"
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Classification {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ValueKeyed for Classification {
    type Value = str;

    fn value(&self) -> &str {
        &self.value
    }
}
