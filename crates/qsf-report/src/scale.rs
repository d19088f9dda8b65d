//! Named level sets shared between categorical columns.
//!
//! Two columns share a scale exactly when their ordered label sequences are
//! byte-identical. The scale name is a content hash, so it does not depend on
//! which question introduced the labels first.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Level appended to every scale so that skipped answers have a level.
pub const NO_RESPONSE_LEVEL: &str = "No response";

/// Extra level for pick-group-rank items left outside every group.
pub const NOT_GROUPED_LEVEL: &str = "Not grouped";

const SCALE_PREFIX: &str = "scale_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pub name: String,
    pub labels: Vec<String>,
}

impl Scale {
    /// Build a scale from ordered labels, appending the no-response level if absent.
    pub fn from_labels(mut labels: Vec<String>) -> Self {
        if !labels.iter().any(|label| label == NO_RESPONSE_LEVEL) {
            labels.push(NO_RESPONSE_LEVEL.to_string());
        }
        Self {
            name: scale_name(&labels),
            labels,
        }
    }
}

/// `scale_<sha256 hex>` over the ordered labels.
///
/// Each label is terminated by a NUL byte so that `["AB", "C"]` and
/// `["A", "BC"]` hash differently.
pub fn scale_name(labels: &[String]) -> String {
    let mut hasher = Sha256::new();
    for label in labels {
        hasher.update(label.as_bytes());
        hasher.update([0u8]);
    }
    format!("{SCALE_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Deduplicating registry of scales, iterated in name order.
#[derive(Debug, Default)]
pub struct ScaleRegistry {
    scales: BTreeMap<String, Scale>,
}

impl ScaleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `labels` and return the name of the (possibly existing) scale.
    pub fn intern(&mut self, labels: Vec<String>) -> String {
        let scale = Scale::from_labels(labels);
        let name = scale.name.clone();
        self.scales.entry(name.clone()).or_insert(scale);
        name
    }

    pub fn scales(&self) -> impl Iterator<Item = &Scale> {
        self.scales.values()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}
