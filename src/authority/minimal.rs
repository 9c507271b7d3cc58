use super::Catalog;
use crate::authoring::*;

// ----- T H E   M I N I M A L   A U T H O R I T Y -------------------------------------

/// A minimalistic authority, supporting only the builtin catalog and run-time
/// registered objects. Grids are known by name only, and never available,
/// unless registered as such. Usually sufficient for internal test authoring.
#[derive(Debug, Default)]
pub struct Minimal {
    catalog: Catalog,
}

impl AuthorityFactory for Minimal {
    fn new() -> Minimal {
        info!("Minimal: builtin EPSG catalog");
        Minimal {
            catalog: Catalog::epsg(),
        }
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

    fn lookup_grid_info(&self, name: &str) -> Option<GridInfo> {
        self.catalog.grid(name).cloned()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;

    #[test]
    fn basic() -> Result<(), Error> {
        let ctx = Minimal::new();
        assert_eq!(ctx.authority(), "EPSG");
        assert_eq!(ctx.create_crs("4807")?.name(), "NTF (Paris)");
        assert!(ctx.create_crs("4807x").is_err());

        // Builtin grids are known, but not available
        let info = ctx.lookup_grid_info("conus.las").unwrap();
        assert!(!info.available);
        assert_eq!(info.alternative_name.as_deref(), Some("us_noaa_conus.tif"));
        assert!(ctx.lookup_grid_info("no_such_grid.tif").is_none());

        let ops = ctx.create_from_crs_codes("EPSG", "4267", "EPSG", "4269", false, false)?;
        assert_eq!(ops.len(), 2);
        let ops = ctx.create_from_crs_codes("EPSG", "4267", "EPSG", "4269", false, true)?;
        assert!(ops.is_empty());

        // The empty default is distinct from the builtin content
        assert!(Minimal::default().create_crs("4326").is_err());
        Ok(())
    }

    #[test]
    fn registration() -> Result<(), Error> {
        let mut ctx = Minimal::new();
        ctx.register_grid(GridInfo::named("conus.las").with_availability("./conus.las"));
        ctx.register_grid(GridInfo::named("conus.los").with_availability("./conus.los"));
        let ops = ctx.create_from_crs_codes("EPSG", "4267", "EPSG", "4269", false, true)?;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "NAD27 to NAD83 (1)");

        let crs = builtin::navd88_height();
        ctx.register_crs("900913", crs.clone());
        assert!(Arc::ptr_eq(&ctx.create_crs("900913")?, &crs));

        let op = ctx.create_coordinate_operation("1193", false)?;
        ctx.register_operation("42", op.clone());
        assert!(Arc::ptr_eq(&ctx.create_coordinate_operation("42", true)?, &op));
        Ok(())
    }
}
