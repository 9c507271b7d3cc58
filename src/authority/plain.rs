use super::Catalog;
use crate::authoring::*;
use std::path::PathBuf;

// ----- T H E   P L A I N   A U T H O R I T Y -----------------------------------------

/// An authority serving the builtin catalog, with grid availability taken
/// from the file system: a grid is available if it, or its alternative,
/// is found in the `grids` subdirectory of one of the search paths.
/// By default, these are `./coordop` and the `coordop` directory under
/// the user's local data directory.
#[derive(Debug)]
pub struct Plain {
    catalog: Catalog,
    paths: Vec<PathBuf>,
}

impl Default for Plain {
    fn default() -> Plain {
        let mut paths = Vec::new();

        let localpath: PathBuf = [".", "coordop"].iter().collect();
        paths.push(localpath);

        if let Some(mut userpath) = dirs::data_local_dir() {
            userpath.push("coordop");
            paths.push(userpath);
        }

        Plain {
            catalog: Catalog::default(),
            paths,
        }
    }
}

impl Plain {
    /// Search `path` for grids before the default locations
    #[must_use]
    pub fn with_search_path(mut self, path: PathBuf) -> Plain {
        self.paths.insert(0, path);
        self
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        for path in &self.paths {
            let mut full_path = path.clone();
            full_path.push("grids");
            full_path.push(name);
            if full_path.is_file() {
                return Some(full_path);
            }
        }
        None
    }
}

impl AuthorityFactory for Plain {
    fn new() -> Plain {
        let ctx = Plain {
            catalog: Catalog::epsg(),
            ..Default::default()
        };
        info!("Plain: builtin EPSG catalog, grids from {:?}", ctx.paths);
        ctx
    }

    fn authority(&self) -> &str {
        self.catalog.authority()
    }

    fn create_crs(&self, code: &str) -> Result<CrsRef, Error> {
        self.catalog.crs(code)
    }

    fn create_coordinate_operation(
        &self,
        code: &str,
        use_proj_alternative_grid_names: bool,
    ) -> Result<OperationRef, Error> {
        self.catalog.operation(code, use_proj_alternative_grid_names)
    }

    fn create_from_crs_codes(
        &self,
        source_authority: &str,
        source_code: &str,
        target_authority: &str,
        target_code: &str,
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
    ) -> Result<Vec<OperationRef>, Error> {
        let available = |name: &str| self.lookup_grid_info(name).map_or(false, |g| g.available);
        Ok(self.catalog.find(
            source_authority,
            source_code,
            target_authority,
            target_code,
            use_proj_alternative_grid_names,
            discard_if_missing_grid,
            &available,
        ))
    }

    fn create_from_crs_codes_with_intermediates(
        &self,
        source_authority: &str,
        source_code: &str,
        target_authority: &str,
        target_code: &str,
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
        intermediate_crs: &[(String, String)],
    ) -> Result<Vec<OperationRef>, Error> {
        let available = |name: &str| self.lookup_grid_info(name).map_or(false, |g| g.available);
        Ok(self.catalog.find_with_intermediates(
            source_authority,
            source_code,
            target_authority,
            target_code,
            use_proj_alternative_grid_names,
            discard_if_missing_grid,
            &available,
            intermediate_crs,
        ))
    }

    /// Grids unknown to the catalog are described if found on disk
    fn lookup_grid_info(&self, name: &str) -> Option<GridInfo> {
        let known = self.catalog.grid(name).cloned();
        let mut info = known.clone().unwrap_or_else(|| GridInfo::named(name));

        let mut candidates = vec![name.to_string(), info.short_name.clone()];
        candidates.extend(info.alternative_name.clone());
        for candidate in candidates {
            if let Some(path) = self.locate(&candidate) {
                trace!("Plain: grid {name} found as {path:?}");
                info = info.with_availability(&path.to_string_lossy());
                return Some(info);
            }
        }
        known
    }

    fn register_crs(&mut self, code: &str, crs: CrsRef) {
        self.catalog.register_crs(code, crs);
    }

    fn register_operation(&mut self, code: &str, op: OperationRef) {
        self.catalog.register_operation(code, op);
    }

    fn register_grid(&mut self, info: GridInfo) {
        self.catalog.register_grid(info);
    }
}

// ----- T E S T S ------------------------------------------------------------------
