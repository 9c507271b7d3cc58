use coordop::authoring::*;
use coordop::authority::Catalog;
use coordop::operation::concatenated;
use coordop::operation::transformation;

// ----- U S E R   P R O V I D E D   A U T H O R I T Y ------------------------------

/// A copy of the Minimal authority, renamed as Maximal, and considering every
/// grid available. Here used as a test and demo of how to write/use a user
/// provided authority.
///
/// Since the integration tests in the "tests" directory of a crate are handled
/// as independent crates, this authority could just as well have been built
/// entirely outside of the coordop source tree.
#[derive(Debug, Default)]
pub struct Maximal {
    catalog: Catalog,
}

fn everything(_: &str) -> bool {
    true
}

impl AuthorityFactory for Maximal {
    fn new() -> Maximal {
        Maximal {
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
        Ok(self.catalog.find(
            source_authority,
            source_code,
            target_authority,
            target_code,
            use_proj_alternative_grid_names,
            discard_if_missing_grid,
            &everything,
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
        Ok(self.catalog.find_with_intermediates(
            source_authority,
            source_code,
            target_authority,
            target_code,
            use_proj_alternative_grid_names,
            discard_if_missing_grid,
            &everything,
            intermediate_crs,
        ))
    }

    fn lookup_grid_info(&self, name: &str) -> Option<GridInfo> {
        let info = self.catalog.grid(name).cloned().unwrap_or_else(|| GridInfo::named(name));
        let full_name = format!("/maximal/grids/{name}");
        Some(info.with_availability(&full_name))
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

fn names(ops: &[OperationRef]) -> Vec<&str> {
    ops.iter().map(|op| op.name()).collect()
}

// ----- T E S T S ------------------------------------------------------------------

#[test]
fn maximal() -> Result<(), Error> {
    let minimal = Minimal::new();
    let maximal = Maximal::new();
    let factory = CoordinateOperationFactory::new();
    let conus = Extent::from_bbox(-100., 35., -90., 45.);

    let nad27 = maximal.create_crs("4267")?;
    let nad83 = maximal.create_crs("4269")?;

    // With the NADCON grids at hand, the grid based operation is the best
    let ctx = OperationContext::new(Some(&maximal), Some(conus.clone()), 0.0);
    let ops = factory.create_operations(&nad27, &nad83, &ctx)?;
    assert_eq!(ops[0].name(), "NAD27 to NAD83 (1)");
    assert_eq!(ops[0].grids_needed(), vec!["us_noaa_conus.tif".to_string()]);

    // Without them, it goes last
    let ctx = OperationContext::new(Some(&minimal), Some(conus), 0.0);
    let ops = factory.create_operations(&nad27, &nad83, &ctx)?;
    assert!(ops.len() > 1);
    assert_eq!(ops.last().map(|op| op.name()), Some("NAD27 to NAD83 (1)"));

    // ...or not at all
    let ctx = ctx.with_grid_availability_use(GridAvailabilityUse::DiscardIfMissing);
    let ops = factory.create_operations(&nad27, &nad83, &ctx)?;
    assert!(!names(&ops).contains(&"NAD27 to NAD83 (1)"));
    Ok(())
}

#[test]
fn projected() -> Result<(), Error> {
    let authority = Minimal::new();
    let ctx = OperationContext::new(Some(&authority), None, 0.0);
    let source = authority.create_crs("4326")?;
    let target = authority.create_crs("32631")?;

    let ops = CoordinateOperationFactory::new().create_operations(&source, &target, &ctx)?;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].is_utm(), Some((31, true)));
    assert_eq!(
        ops[0].export_to_proj_string()?,
        "+proj=pipeline +step +proj=axisswap +order=2,1 +step +proj=unitconvert +xy_in=deg +xy_out=rad +step +proj=utm +zone=31 +ellps=WGS84"
    );
    let wkt = ops[0].export_to_wkt(WktVersion::Wkt2_2019)?;
    assert!(wkt.contains("UTM zone 31N"));
    Ok(())
}

#[test]
fn registered_duplicates() -> Result<(), Error> {
    let mut authority = Minimal::new();
    let nad83 = authority.create_crs("4269")?;
    let wgs84 = authority.create_crs("4326")?;

    // The same null translation as EPSG:1188, under another name
    let properties = IdentifiedObject::named("NAD83 to WGS 84 (copy)")
        .with_epsg(90001)
        .with_extent(nad83.extent());
    let copy = transformation::create_geocentric_translations(properties, &nad83, &wgs84, [0., 0., 0.], &[PositionalAccuracy(4.)])?;
    authority.register_operation("90001", copy);

    let ctx = OperationContext::new(Some(&authority), None, 0.0);
    let ops = CoordinateOperationFactory::new().create_operations(&nad83, &wgs84, &ctx)?;
    assert_eq!(names(&ops), ["NAD83 to WGS 84 (1)"]);
    Ok(())
}

#[test]
fn identity() -> Result<(), Error> {
    let authority = Minimal::new();
    let ctx = OperationContext::new(Some(&authority), None, 0.0);
    let factory = CoordinateOperationFactory::new();

    let wgs84 = authority.create_crs("4326")?;
    let op = factory.create_operation(&wgs84, &wgs84, &ctx)?.unwrap();
    assert_eq!(op.accuracy(), Some(0.0));
    assert!(!op.has_ballpark());

    let utm = authority.create_crs("32633")?;
    let op = factory.create_operation(&utm, &utm, &ctx)?.unwrap();
    assert_eq!(op.accuracy(), Some(0.0));
    Ok(())
}

#[test]
fn concatenation() -> Result<(), Error> {
    let authority = Minimal::new();
    let nad27 = authority.create_crs("4267")?;
    let nad83 = authority.create_crs("4269")?;
    let wgs84 = authority.create_crs("4326")?;

    let first = transformation::create_geocentric_translations(
        IdentifiedObject::named("first"),
        &nad27,
        &nad83,
        [1., 2., 3.],
        &[PositionalAccuracy(2.)],
    )?;
    let second = transformation::create_geocentric_translations(
        IdentifiedObject::named("second"),
        &nad83,
        &wgs84,
        [4., 5., 6.],
        &[PositionalAccuracy(3.)],
    )?;

    let op = concatenated::create_compute_metadata(&[first.clone(), second.clone()], true)?;
    assert_eq!(op.name(), "first + second");
    assert_eq!(op.step_count(), 2);
    assert_eq!(op.accuracy(), Some(5.));

    // A step followed by its inverse leaves nothing
    let inverse = CoordinateOperation::inverse(&first)?;
    let err = concatenated::create_compute_metadata(&[first.clone(), inverse.clone()], true);
    assert!(err.map_or_else(|e| e.is_invalid_operation(), |_| false));

    // The inverse of the inverse is the forward operation
    let back = CoordinateOperation::inverse(&inverse)?;
    assert!(Arc::ptr_eq(&back, &first));
    Ok(())
}
