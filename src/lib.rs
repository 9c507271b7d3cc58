//! *Coordinate reference systems, and the coordinate operations connecting them*.
//!
//! `coordop` models coordinate reference systems (CRS) and coordinate
//! operations along the lines of [ISO-19111](https://www.iso.org/standard/74039.html),
//! and implements the search for every plausible chain of operations
//! between two CRS, in the manner of the [PROJ](https://proj.org)
//! `CoordinateOperationFactory`.
//!
//! The main entry point is [`CoordinateOperationFactory::create_operations`],
//! which takes a source CRS, a target CRS and an [`OperationContext`], and
//! returns a ranked list of candidate operations:
//!
//! ```
//! use coordop::prelude::*;
//!
//! let authority = Minimal::new();
//! let source = authority.create_crs("4326")?;
//! let target = authority.create_crs("32631")?;
//!
//! let ctx = OperationContext::new(Some(&authority), None, 0.0);
//! let ops = CoordinateOperationFactory::new().create_operations(&source, &target, &ctx)?;
//! assert_eq!(ops.len(), 1);
//! assert_eq!(ops[0].name(), "UTM zone 31N");
//! # Ok::<(), coordop::Error>(())
//! ```

pub mod authority;
pub mod common;
pub mod crs;
pub mod cs;
pub mod datum;
pub mod factory;
pub mod io;
pub mod metadata;
pub mod operation;

pub use authority::AuthorityFactory;
pub use authority::GridInfo;
pub use authority::Minimal;
#[cfg(feature = "with_plain")]
pub use authority::Plain;
pub use crs::Crs;
pub use crs::CrsRef;
pub use factory::CoordinateOperationFactory;
pub use factory::OperationContext;
pub use operation::CoordinateOperation;
pub use operation::OperationRef;

/// The bread-and-butter, shrink-wrapped and ready to use
pub mod prelude {
    pub use crate::authority::AuthorityFactory;
    pub use crate::authority::Minimal;
    #[cfg(feature = "with_plain")]
    pub use crate::authority::Plain;
    pub use crate::common::Criterion;
    pub use crate::crs::Crs;
    pub use crate::crs::CrsRef;
    pub use crate::factory::CoordinateOperationFactory;
    pub use crate::factory::GridAvailabilityUse;
    pub use crate::factory::IntermediateCrsUse;
    pub use crate::factory::OperationContext;
    pub use crate::factory::SourceTargetCrsExtentUse;
    pub use crate::factory::SpatialCriterion;
    pub use crate::io::WktVersion;
    pub use crate::metadata::Extent;
    pub use crate::metadata::GeographicBoundingBox;
    pub use crate::operation::CoordinateOperation;
    pub use crate::operation::OperationRef;
    pub use crate::Error;
}

/// Preamble for crate-internal modules, and for user-implemented authorities
pub mod authoring {
    pub use crate::prelude::*;

    pub use crate::authority::GridInfo;
    pub use crate::common::build_op_name;
    pub use crate::common::is_equivalent_name;
    pub use crate::common::unit;
    pub use crate::common::IdentifiedObject;
    pub use crate::common::Identifier;
    pub use crate::common::Measure;
    pub use crate::common::ObjectId;
    pub use crate::common::UnitOfMeasure;
    pub use crate::common::UnitType;
    pub use crate::crs::CrsKind;
    pub use crate::cs::Axis;
    pub use crate::cs::AxisDirection;
    pub use crate::cs::CoordinateSystem;
    pub use crate::cs::CsKind;
    pub use crate::datum::Datum;
    pub use crate::datum::DatumEnsemble;
    pub use crate::datum::DatumOrEnsemble;
    pub use crate::datum::Ellipsoid;
    pub use crate::datum::GeodeticReferenceFrame;
    pub use crate::datum::PrimeMeridian;
    pub use crate::datum::VerticalReferenceFrame;
    pub use crate::metadata::Domain;
    pub use crate::metadata::WORLD;
    pub use crate::metadata::PositionalAccuracy;
    pub use crate::operation::method::*;
    pub use crate::operation::OperationKind;
    pub use crate::operation::SingleOperation;

    pub use log::debug;
    pub use log::info;
    pub use log::trace;
    pub use log::warn;

    pub use std::collections::BTreeMap;
    pub use std::collections::BTreeSet;
    pub use std::sync::Arc;
    pub use std::sync::Weak;
}

use thiserror::Error;

/// The *Rust Geodesy* flavoured error type, extended with the
/// categories needed for CRS and coordinate operation handling
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[error("error: {0}")]
    General(&'static str),

    #[error("{0} not found{1}")]
    NotFound(String, String),

    #[error("no such authority code: {authority}:{code}")]
    NoSuchAuthorityCode { authority: String, code: String },

    #[error("factory error: {0}")]
    Factory(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid operation: empty intersection of areas of validity")]
    EmptyIntersection,

    #[error("formatting error: {0}")]
    Formatting(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("missing required parameter {0}")]
    MissingParam(String),

    #[error("malformed value for parameter {0}: {1}")]
    BadParam(String, String),
}

impl Error {
    /// `EmptyIntersection` is a special case of `InvalidOperation`
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Error::InvalidOperation(_) | Error::EmptyIntersection)
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_taxonomy() {
        assert!(Error::EmptyIntersection.is_invalid_operation());
        assert!(Error::InvalidOperation("steps".to_string()).is_invalid_operation());
        assert!(!Error::Formatting("wkt1".to_string()).is_invalid_operation());
        let e = Error::NoSuchAuthorityCode {
            authority: "EPSG".to_string(),
            code: "0".to_string(),
        };
        assert_eq!(e.to_string(), "no such authority code: EPSG:0");
    }
}
