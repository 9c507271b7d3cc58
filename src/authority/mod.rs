//! Authorities: the catalogs of CRS, coordinate operations and grids the
//! operation factory consults.
use crate::authoring::*;
pub mod builtin;
mod catalog;
mod minimal;
#[cfg(feature = "with_plain")]
mod plain;

pub use catalog::Catalog;
pub use minimal::Minimal;
#[cfg(feature = "with_plain")]
pub use plain::Plain;

// ----- T H E   A U T H O R I T Y   T R A I T -----------------------------------------

/// The `AuthorityFactory` trait defines the mode of communication between the
/// operation factory and an authority database: typed lookups of CRS and
/// operations by code, and of the grids the operations need.
pub trait AuthorityFactory {
    /// In general, implementations should make sure that `new` differs from `default`
    /// only by adding the builtin catalog content
    fn new() -> Self
    where
        Self: Sized;

    /// The codespace of the codes handled (e.g. "EPSG")
    fn authority(&self) -> &str;

    /// The CRS given by `code`. [`Error::NoSuchAuthorityCode`] if unknown
    fn create_crs(&self, code: &str) -> Result<CrsRef, Error>;

    /// The operation given by `code`, with grid names replaced by their
    /// alternative names if `use_proj_alternative_grid_names` is set
    fn create_coordinate_operation(
        &self,
        code: &str,
        use_proj_alternative_grid_names: bool,
    ) -> Result<OperationRef, Error>;

    /// The operations registered as going from the source to the target CRS.
    /// With `discard_if_missing_grid`, operations needing a grid which is not
    /// available are left out
    fn create_from_crs_codes(
        &self,
        source_authority: &str,
        source_code: &str,
        target_authority: &str,
        target_code: &str,
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
    ) -> Result<Vec<OperationRef>, Error>;

    /// Concatenations of two registered operations, through an intermediate
    /// CRS. If `intermediate_crs` is non-empty, only the (authority, code)
    /// pairs listed are considered as intermediates. Authorities without
    /// pivot support return nothing
    #[allow(clippy::too_many_arguments)]
    fn create_from_crs_codes_with_intermediates(
        &self,
        _source_authority: &str,
        _source_code: &str,
        _target_authority: &str,
        _target_code: &str,
        _use_proj_alternative_grid_names: bool,
        _discard_if_missing_grid: bool,
        _intermediate_crs: &[(String, String)],
    ) -> Result<Vec<OperationRef>, Error> {
        Ok(Vec::new())
    }

    /// What is known about a grid, given by (one of) its names
    fn lookup_grid_info(&self, name: &str) -> Option<GridInfo>;

    /// Register a user defined CRS, under `code` in the codespace of the authority
    fn register_crs(&mut self, code: &str, crs: CrsRef);
    /// Register a user defined operation
    fn register_operation(&mut self, code: &str, op: OperationRef);
    /// Register the description of a grid
    fn register_grid(&mut self, info: GridInfo);
}

/// What an authority knows about a grid file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridInfo {
    /// The name by which operations refer to the grid
    pub short_name: String,
    /// Full path of the grid, when available locally
    pub full_name: String,
    pub package_name: String,
    pub url: String,
    pub direct_download: bool,
    pub open_license: bool,
    pub available: bool,
    /// Name of the grid in the PROJ-data distribution, if different
    pub alternative_name: Option<String>,
}

impl GridInfo {
    /// A grid known by name, but not locally available
    pub fn named(short_name: &str) -> GridInfo {
        GridInfo {
            short_name: short_name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_alternative_name(mut self, name: &str) -> GridInfo {
        self.alternative_name = Some(name.to_string());
        self
    }

    /// Downloadable from `url`, under an open license
    #[must_use]
    pub fn with_url(mut self, url: &str) -> GridInfo {
        self.url = url.to_string();
        self.direct_download = true;
        self.open_license = true;
        self
    }

    #[must_use]
    pub fn with_availability(mut self, full_name: &str) -> GridInfo {
        self.full_name = full_name.to_string();
        self.available = true;
        self
    }
}

/// Parse an "AUTH:CODE" string
pub fn split_code(definition: &str) -> Result<(&str, &str), Error> {
    let mut parts = definition.splitn(2, ':');
    match (parts.next(), parts.next()) {
        (Some(authority), Some(code)) if !authority.is_empty() && !code.is_empty() => {
            Ok((authority.trim(), code.trim()))
        }
        _ => Err(Error::BadParam(
            "needing authority:code format".to_string(),
            definition.to_string(),
        )),
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() -> Result<(), Error> {
        assert_eq!(split_code("EPSG:4326")?, ("EPSG", "4326"));
        assert_eq!(split_code("IGNF:LAMB93")?, ("IGNF", "LAMB93"));
        assert!(split_code("4326").is_err());
        assert!(split_code("EPSG:").is_err());
        Ok(())
    }

    #[test]
    fn grid_info() {
        let info = GridInfo::named("ntv2_0.gsb")
            .with_alternative_name("ca_nrc_ntv2_0.tif")
            .with_url("https://cdn.proj.org/ca_nrc_ntv2_0.tif");
        assert!(info.direct_download);
        assert!(!info.available);
        let info = info.with_availability("/tmp/ntv2_0.gsb");
        assert!(info.available);
        assert_eq!(info.full_name, "/tmp/ntv2_0.gsb");
    }
}
