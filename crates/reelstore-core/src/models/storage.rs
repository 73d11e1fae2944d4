//! Object reference model: where an uploaded object lives in the object store.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A `(bucket, key)` pair, persisted as the single string `"{bucket},{key}"`.
///
/// Bucket names cannot contain commas, so parsing splits on the first one and
/// the key keeps any commas of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectReferenceError {
    #[error("object reference has no ',' separator")]
    MissingSeparator,
    #[error("object reference has an empty bucket")]
    EmptyBucket,
    #[error("object reference has an empty key")]
    EmptyKey,
}

impl ObjectReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The persisted form.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Display for ObjectReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectReference {
    type Err = ObjectReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bucket, key) = s
            .split_once(',')
            .ok_or(ObjectReferenceError::MissingSeparator)?;
        if bucket.is_empty() {
            return Err(ObjectReferenceError::EmptyBucket);
        }
        if key.is_empty() {
            return Err(ObjectReferenceError::EmptyKey);
        }
        Ok(ObjectReference::new(bucket, key))
    }
}
