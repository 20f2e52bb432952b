use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product code used as the primary key throughout the system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ean(String);

impl Ean {
    /// Creates an EAN from a string, trimming surrounding whitespace.
    pub fn new(code: impl Into<String>) -> Self {
        let code: String = code.into();
        Self(code.trim().to_string())
    }

    /// Returns the EAN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the code is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Ean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ean {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ean {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Ean {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier of a single batch line.
///
/// Batch numbers are supplier-assigned and may repeat across products,
/// so each stored line also carries a generated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Creates a new random batch ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a batch ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BatchId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Physical slot descriptor for stored stock.
///
/// Only the zone is mandatory; the finer-grained parts are optional
/// because stock moved between zones may not have been assigned a
/// shelf yet. Two placements match only when every part is equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub zone: String,
    #[serde(default)]
    pub aisle: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub shelf: Option<String>,
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default)]
    pub pallet: Option<String>,
}

impl Placement {
    /// Creates a placement in a zone with no finer location.
    pub fn in_zone(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..Default::default()
        }
    }

    pub fn aisle(mut self, aisle: impl Into<String>) -> Self {
        self.aisle = Some(aisle.into());
        self
    }

    pub fn rack(mut self, rack: impl Into<String>) -> Self {
        self.rack = Some(rack.into());
        self
    }

    pub fn shelf(mut self, shelf: impl Into<String>) -> Self {
        self.shelf = Some(shelf.into());
        self
    }

    pub fn bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = Some(bin.into());
        self
    }

    pub fn pallet(mut self, pallet: impl Into<String>) -> Self {
        self.pallet = Some(pallet.into());
        self
    }

    /// Returns the same slot moved to another zone.
    pub fn with_zone(&self, zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.zone)?;
        for part in [&self.aisle, &self.rack, &self.shelf, &self.bin, &self.pallet] {
            write!(f, "/{}", part.as_deref().unwrap_or("-"))?;
        }
        Ok(())
    }
}
