//! Leaf types shared by every part of the object model: units and measures,
//! identification, and the strictness criteria used for equivalence tests.
pub mod unit;

use crate::metadata::Domain;
use crate::metadata::Extent;
use std::fmt;
use uuid::Uuid;

pub use unit::Measure;
pub use unit::UnitOfMeasure;
pub use unit::UnitType;

/// Strictness of structural comparisons between objects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// All properties, including names, must be identical
    Strict,
    /// Names may differ, values must be equivalent
    Equivalent,
    /// As `Equivalent`, but geographic CRS may differ by their lat/lon order
    EquivalentExceptAxisOrderGeogCrs,
}

/// Process-unique identity of an object. Two handles with the same
/// `ObjectId` refer to (copies of) the same object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> ObjectId {
        ObjectId(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

// ----- I D E N T I F I E R S ----------------------------------------------------------

/// An authority code, e.g. `EPSG:4326`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Identifier {
    pub codespace: String,
    pub code: String,
}

impl Identifier {
    pub fn new(codespace: &str, code: &str) -> Identifier {
        Identifier {
            codespace: codespace.to_string(),
            code: code.to_string(),
        }
    }

    pub fn epsg(code: u32) -> Identifier {
        Identifier::new("EPSG", &code.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.codespace, self.code)
    }
}

/// The properties common to all named objects: name, identifiers,
/// domains of validity and remarks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdentifiedObject {
    pub name: String,
    pub identifiers: Vec<Identifier>,
    pub domains: Vec<Domain>,
    pub remarks: String,
}

impl IdentifiedObject {
    pub fn named(name: &str) -> IdentifiedObject {
        IdentifiedObject {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, codespace: &str, code: &str) -> IdentifiedObject {
        self.identifiers.push(Identifier::new(codespace, code));
        self
    }

    #[must_use]
    pub fn with_epsg(self, code: u32) -> IdentifiedObject {
        self.with_id("EPSG", &code.to_string())
    }

    #[must_use]
    pub fn with_domain(mut self, scope: &str, extent: Extent) -> IdentifiedObject {
        self.domains.push(Domain::new(Some(scope), Some(extent)));
        self
    }

    #[must_use]
    pub fn with_extent(mut self, extent: Option<Extent>) -> IdentifiedObject {
        if let Some(extent) = extent {
            self.domains.push(Domain::new(None, Some(extent)));
        }
        self
    }

    #[must_use]
    pub fn with_remarks(mut self, remarks: &str) -> IdentifiedObject {
        self.remarks = remarks.to_string();
        self
    }

    /// The code of the first identifier from the EPSG codespace, if any
    pub fn epsg_code(&self) -> Option<u32> {
        self.identifiers
            .iter()
            .find(|id| id.codespace == "EPSG")
            .and_then(|id| id.code.parse::<u32>().ok())
    }

    /// The extent of the first domain carrying one
    pub fn extent(&self) -> Option<&Extent> {
        self.domains.iter().find_map(|d| d.extent.as_ref())
    }

    /// Two objects are identified as the same, when they share an identifier
    pub fn shares_identifier_with(&self, other: &IdentifiedObject) -> bool {
        self.identifiers
            .iter()
            .any(|id| other.identifiers.contains(id))
    }

    pub fn is_equivalent_name(&self, other: &str) -> bool {
        is_equivalent_name(&self.name, other)
    }
}

/// Name comparison insensitive to case and to the punctuation
/// varying between catalogs ("WGS_1984" vs. "WGS 84")
pub fn is_equivalent_name(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    normalized_name(a) == normalized_name(b)
}

fn normalized_name(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, ' ' | '_' | '-' | '/' | '(' | ')' | '.' | '&' | ',') {
            continue;
        }
        res.extend(c.to_lowercase());
    }
    // "World Geodetic System 1984" is routinely abbreviated in datum names
    res.replace("worldgeodeticsystem", "wgs")
}

/// Name of a synthesized operation between two objects
pub fn build_op_name(kind: &str, source: &str, target: &str) -> String {
    format!("{kind} from {source} to {target}")
}

// ----- T E S T S ------------------------------------------------------------------
