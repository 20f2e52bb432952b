use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Version number of a stored document, used for optimistic concurrency control.
///
/// A document that has never been written is at version 0; the first put
/// produces version 1 and every later put increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) written for a document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A JSON document with the metadata the store maintains for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The collection the document belongs to (e.g. "inbound", "locations").
    pub collection: String,

    /// Key of the document, unique within its collection.
    pub key: String,

    /// Version of the document as last read from or written to the store.
    pub version: Version,

    /// When the document was first written. Preserved across updates.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The document body.
    pub body: serde_json::Value,
}

impl Document {
    /// Creates a document that has not been stored yet.
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            collection: collection.into(),
            key: key.into(),
            version: Version::initial(),
            created_at: now,
            updated_at: now,
            body,
        }
    }

    /// Creates an unstored document from a serializable body.
    pub fn from_body<T: Serialize>(
        collection: impl Into<String>,
        key: impl Into<String>,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(collection, key, serde_json::to_value(body)?))
    }

    /// Overrides the creation timestamp of an unstored document.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Replaces the body, keeping identity and version so the write can be
    /// checked against the version that was read.
    pub fn replace_body<T: Serialize>(&mut self, body: &T) -> Result<(), serde_json::Error> {
        self.body = serde_json::to_value(body)?;
        Ok(())
    }

    /// Deserializes the body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }

    /// Returns true if the document has never been written.
    pub fn is_new(&self) -> bool {
        self.version == Version::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Shelf {
        label: String,
        slots: u32,
    }

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
    }

    #[test]
    fn version_initial_and_first() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::first().as_i64(), 1);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn new_document_is_unversioned() {
        let doc = Document::new("shelves", "S1", serde_json::json!({}));
        assert!(doc.is_new());
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn body_roundtrips_through_decode() {
        let shelf = Shelf {
            label: "S1".to_string(),
            slots: 12,
        };
        let mut doc = Document::from_body("shelves", "S1", &shelf).unwrap();
        assert_eq!(doc.decode::<Shelf>().unwrap(), shelf);

        let wider = Shelf {
            label: "S1".to_string(),
            slots: 24,
        };
        doc.replace_body(&wider).unwrap();
        assert_eq!(doc.decode::<Shelf>().unwrap().slots, 24);
        assert_eq!(doc.key, "S1");
    }

    #[test]
    fn created_at_override_sets_both_timestamps() {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let doc = Document::new("shelves", "S1", serde_json::json!({})).created_at(ts);
        assert_eq!(doc.created_at, ts);
        assert_eq!(doc.updated_at, ts);
    }
}
