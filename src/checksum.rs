//! Content hashing for stored documents
//!
//! Hashes are taken over the compact JSON rendering of a document. Object keys
//! come out sorted, so two documents with the same content always hash alike
//! regardless of field order in the source file.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA256 of a canonical JSON document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    fn digest(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Hash of a JSON value in its canonical rendering
    pub fn from_json(value: &serde_json::Value) -> Self {
        match serde_json::to_vec(value) {
            Ok(canonical) => Self::digest(&canonical),
            // Unreachable for a Value
            Err(_) => Self::digest(&[]),
        }
    }

    /// Hash of a document with the named top-level fields left out.
    ///
    /// Used for integrity hashes that must survive edits to free-form
    /// annotations such as `metadata`.
    pub fn of_document<T: Serialize>(document: &T, excluded: &[&str]) -> serde_json::Result<Self> {
        let mut value = serde_json::to_value(document)?;
        if let Some(obj) = value.as_object_mut() {
            obj.retain(|name, _| !excluded.contains(&name.as_str()));
        }
        Ok(Self::from_json(&value))
    }

    /// Short form suitable for file names
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Hash of an arbitrary label
    pub fn of_label(label: &str) -> Self {
        Self::digest(label.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_order_is_irrelevant() {
        let a = json!({"name": "orders", "version": "1.0.0"});
        let b = json!({"version": "1.0.0", "name": "orders"});
        assert_eq!(Checksum::from_json(&a), Checksum::from_json(&b));
        assert_eq!(Checksum::from_json(&a).as_str().len(), 64);
        assert_ne!(Checksum::from_json(&a), Checksum::from_json(&json!({"name": "invoices"})));
    }

    #[test]
    fn test_excluded_fields_do_not_affect_hash() {
        let tagged = json!({"name": "orders", "metadata": {"team": "sales"}});
        let bare = json!({"name": "orders", "metadata": {}});
        assert_eq!(
            Checksum::of_document(&tagged, &["metadata"]).unwrap(),
            Checksum::of_document(&bare, &["metadata"]).unwrap()
        );
        assert_ne!(
            Checksum::of_document(&tagged, &[]).unwrap(),
            Checksum::of_document(&bare, &[]).unwrap()
        );
    }

    #[test]
    fn test_prefix() {
        let checksum = Checksum::of_label("s3://lake");
        assert_eq!(checksum.prefix(12).len(), 12);
        assert!(checksum.as_str().starts_with(checksum.prefix(12)));
        assert_eq!(checksum.prefix(100), checksum.as_str());
    }
}
