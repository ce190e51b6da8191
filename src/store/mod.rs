/// Storage collaborator
///
/// The gateway never touches IPFS or the review index directly. Everything it
/// needs goes through [`ReviewStore`], which the shipped [`ChluNode`] implements
/// on top of an IPFS API client and a relational index, and which tests replace
/// with fakes.

pub mod index;
pub mod ipfs;
pub mod node;
pub mod wait;

pub use index::SqlIndex;
pub use ipfs::IpfsClient;
pub use node::ChluNode;
pub use wait::{poll_until_present, WaitPolicy};

use crate::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage collaborator trait
///
/// Implementations own all network and storage access. They must be safe to
/// share across concurrent requests.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fully initialize connections before the gateway accepts requests
    async fn start(&self) -> GatewayResult<()>;

    /// Release connections; called once after the server stops
    async fn stop(&self) -> GatewayResult<()>;

    /// Read a review record, `None` if the content does not exist
    async fn read_review_record(
        &self,
        multihash: &str,
        options: &ReadOptions,
    ) -> GatewayResult<Option<ReviewRecord>>;

    /// Fetch a DID document, `None` if it is not (yet) visible locally
    async fn get_did(
        &self,
        did: &str,
        wait_until_present: bool,
    ) -> GatewayResult<Option<IdentityDocument>>;

    /// Reviews whose author is `did`
    async fn get_reviews_written_by_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>>;

    /// Reviews whose subject is `did`
    async fn get_reviews_about_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>>;
}

/// Options for reading a review record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOptions {
    /// Follow the update chain to the current head
    pub get_latest_version: bool,
    /// `None` skips validation entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidateOptions>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            get_latest_version: true,
            validate: Some(ValidateOptions::default()),
        }
    }
}

/// Validation settings passed through to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOptions {
    /// Fail the read on validation issues instead of reporting them
    pub throw_errors: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            throw_errors: false,
        }
    }
}

/// A review record as stored: an arbitrary JSON object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewRecord(pub Map<String, Value>);

impl ReviewRecord {
    /// Parse stored content; anything but a JSON object is rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// DID of the customer that signed the review
    pub fn author_did(&self) -> Option<&str> {
        self.0
            .get("customer_signature")
            .and_then(|sig| sig.get("creator"))
            .and_then(Value::as_str)
    }

    /// DID of the vendor being reviewed
    pub fn subject_did(&self) -> Option<&str> {
        self.0
            .get("popr")
            .and_then(|popr| popr.get("vendor_did"))
            .and_then(Value::as_str)
    }

    /// Multihash of the version this record amends
    pub fn previous_version(&self) -> Option<&str> {
        self.0
            .get("previous_version_multihash")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// DID documents are passed through untouched
pub type IdentityDocument = Value;

/// One entry of a DID's relation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Multihash the review was first published under
    pub multihash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_options_wire_shape() {
        let value = serde_json::to_value(ReadOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({ "getLatestVersion": true, "validate": { "throwErrors": false } })
        );
    }

    #[test]
    fn test_record_accessors() {
        let record = ReviewRecord::from_value(json!({
            "rating": 5,
            "customer_signature": { "creator": "did:chlu:alice" },
            "popr": { "vendor_did": "did:chlu:shop" },
            "previous_version_multihash": ""
        }))
        .unwrap();

        assert_eq!(record.author_did(), Some("did:chlu:alice"));
        assert_eq!(record.subject_did(), Some("did:chlu:shop"));
        assert_eq!(record.previous_version(), None);
    }

    #[test]
    fn test_record_must_be_object() {
        assert!(ReviewRecord::from_value(json!([1, 2])).is_none());
        assert!(ReviewRecord::from_value(json!("text")).is_none());
    }

    #[test]
    fn test_summary_skips_missing_fields() {
        let summary = ReviewSummary {
            multihash: "QmA".to_string(),
            latest_version: None,
            author_did: Some("did:chlu:alice".to_string()),
            subject_did: None,
            created_at: None,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({ "multihash": "QmA", "authorDid": "did:chlu:alice" })
        );
    }
}
