//! The search for coordinate operations between two CRS.
//!
//! The [`CoordinateOperationFactory`] decomposes the CRS pair recursively,
//! consulting the authority of the [`OperationContext`] for registered
//! operations, and synthesizing operations where the structure of the CRS
//! allows it. The candidates are then filtered, ranked and reduced.
mod context;
mod filter;
mod search;
mod synthesis;

pub use context::GridAvailabilityUse;
pub use context::IntermediateCrsUse;
pub use context::OperationContext;
pub use context::SourceTargetCrsExtentUse;
pub use context::SpatialCriterion;
pub use search::FORCE_SEARCH_PIVOTS;

use crate::authoring::*;
use search::Search;

#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateOperationFactory {}

impl CoordinateOperationFactory {
    pub fn new() -> CoordinateOperationFactory {
        CoordinateOperationFactory {}
    }

    /// The operations from `source` to `target`, best first. The list is
    /// empty if no operation is known or can be synthesized.
    ///
    /// Fails only for CRS which cannot be related at all, e.g. CRS of
    /// different celestial bodies ([`Error::Unsupported`])
    pub fn create_operations(
        &self,
        source: &CrsRef,
        target: &CrsRef,
        ctx: &OperationContext,
    ) -> Result<Vec<OperationRef>, Error> {
        debug!("create_operations: {} to {}, {ctx:?}", source.name(), target.name());
        let candidates = Search::new(ctx).operations(source, target)?;
        Ok(filter::filter_and_sort(candidates, ctx, source, target))
    }

    /// The best operation from `source` to `target`, if any
    pub fn create_operation(
        &self,
        source: &CrsRef,
        target: &CrsRef,
        ctx: &OperationContext,
    ) -> Result<Option<OperationRef>, Error> {
        Ok(self.create_operations(source, target, ctx)?.into_iter().next())
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;

    fn names(ops: &[OperationRef]) -> Vec<&str> {
        ops.iter().map(|op| op.name()).collect()
    }

    #[test]
    fn projected() -> Result<(), Error> {
        let authority = Minimal::new();
        let ctx = OperationContext::new(Some(&authority), None, 0.0);
        let factory = CoordinateOperationFactory::new();

        let wgs84 = authority.create_crs("4326")?;
        let utm31 = authority.create_crs("32631")?;
        let ops = factory.create_operations(&wgs84, &utm31, &ctx)?;
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_conversion());
        assert_eq!(ops[0].accuracy(), Some(0.0));
        assert_eq!(ops[0].method().map(|m| m.name()), Some("Transverse Mercator"));
        assert_eq!(ops[0].is_utm(), Some((31, true)));

        // And back
        let ops = factory.create_operations(&utm31, &wgs84, &ctx)?;
        assert_eq!(names(&ops), ["Inverse of UTM zone 31N"]);

        // Between zones: through the common base CRS
        let utm32 = authority.create_crs("32632")?;
        let ops = factory.create_operations(&utm31, &utm32, &ctx.clone().with_spatial_criterion(SpatialCriterion::PartialIntersection))?;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].step_count(), 2);
        assert_eq!(ops[0].name(), "Inverse of UTM zone 31N + UTM zone 32N");
        Ok(())
    }

    #[test]
    fn geographic() -> Result<(), Error> {
        let authority = Minimal::new();
        let ctx = OperationContext::new(Some(&authority), None, 0.0);
        let factory = CoordinateOperationFactory::new();

        // Identity
        let wgs84 = authority.create_crs("4326")?;
        let ops = factory.create_operations(&wgs84, &wgs84, &ctx)?;
        assert_eq!(names(&ops), ["Null geographic offset from WGS 84 to WGS 84"]);
        assert_eq!(ops[0].accuracy(), Some(0.0));

        // From the authority, the synthesized fallback pruned
        let nad83 = authority.create_crs("4269")?;
        let ops = factory.create_operations(&nad83, &wgs84, &ctx)?;
        assert_eq!(names(&ops), ["NAD83 to WGS 84 (1)"]);

        // Over the US only, more is on offer
        let conus = Extent::from_bbox(-100., 35., -90., 45.);
        let ctx = ctx.with_area_of_interest(Some(conus));
        let ops = factory.create_operations(&nad83, &wgs84, &ctx)?;
        assert_eq!(ops[0].name(), "NAD83 to WGS 84 (5)");
        assert!(names(&ops).contains(&"NAD83 to WGS 84 (1)"));
        assert!(!names(&ops).iter().any(|n| n.starts_with("Ballpark")));

        // Repeatable
        let again = factory.create_operations(&nad83, &wgs84, &ctx)?;
        assert_eq!(names(&again), names(&ops));

        // Prime meridian rotation, from the authority
        let ntf_paris = authority.create_crs("4807")?;
        let ntf = authority.create_crs("4275")?;
        let op = factory.create_operation(&ntf_paris, &ntf, &ctx.clone().with_area_of_interest(None))?.unwrap();
        assert_eq!(op.name(), "NTF (Paris) to NTF (1)");
        Ok(())
    }

    #[test]
    fn without_authority() -> Result<(), Error> {
        let ctx = OperationContext::new(None, None, 0.0);
        let factory = CoordinateOperationFactory::new();
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let ops = factory.create_operations(&nad27, &wgs84, &ctx)?;
        assert_eq!(names(&ops), ["Ballpark geographic offset from NAD27 to WGS 84"]);
        assert!(ops[0].has_ballpark());

        let geocentric = builtin::wgs84_geocentric();
        let op = factory.create_operation(&wgs84, &geocentric, &ctx)?.unwrap();
        assert_eq!(op.method_epsg_code(), Some(9602));
        Ok(())
    }

    #[test]
    fn compound() -> Result<(), Error> {
        let authority = Minimal::new();
        let ctx = OperationContext::new(Some(&authority), None, 0.0);
        let factory = CoordinateOperationFactory::new();

        let compound = authority.create_crs("9518")?;
        let wgs84_3d = authority.create_crs("4979")?;
        let ops = factory.create_operations(&compound, &wgs84_3d, &ctx)?;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "Inverse of WGS 84 to EGM2008 height (1)");
        assert_eq!(ops[0].accuracy(), Some(1.0));
        assert_eq!(ops[0].grids_needed(), vec!["us_nga_egm08_25.tif".to_string()]);

        // The reverse direction
        let ops = factory.create_operations(&wgs84_3d, &compound, &ctx)?;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].target_crs().map(|c| c.name().to_string()), Some("WGS 84 + EGM2008 height".to_string()));

        // Heights are dropped on the way to 2D
        let wgs84 = authority.create_crs("4326")?;
        let ops = factory.create_operations(&compound, &wgs84, &ctx)?;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].accuracy(), Some(0.0));
        Ok(())
    }

    #[test]
    fn compound_without_common_area() -> Result<(), Error> {
        let ctx = OperationContext::new(None, None, 0.0);
        let factory = CoordinateOperationFactory::new();
        let europe = Extent::from_bbox(-10., 40., 0., 50.);
        let height = |name: &str| {
            let object = IdentifiedObject::named(name).with_extent(Some(europe.clone()));
            let datum = VerticalReferenceFrame::new(IdentifiedObject::named(name));
            Crs::vertical(object, DatumOrEnsemble::Datum(datum), CoordinateSystem::gravity_related_height(unit::METRE))
        };
        let source = Crs::compound(
            IdentifiedObject::named("NAD83 + Local height"),
            vec![builtin::nad83_geographic_2d(), height("Local height")?],
        )?;
        let target = Crs::compound(
            IdentifiedObject::named("WGS 84 + Other height"),
            vec![builtin::wgs84_geographic_2d(), height("Other height")?],
        )?;

        // The heights are only defined over Europe, NAD83 is not: horizontal part only
        let ops = factory.create_operations(&source, &target, &ctx)?;
        assert_eq!(names(&ops), ["Ballpark geographic offset from NAD83 to WGS 84"]);
        Ok(())
    }

    #[test]
    fn vertical() -> Result<(), Error> {
        let authority = Minimal::new();
        let ctx = OperationContext::new(Some(&authority), None, 0.0);
        let factory = CoordinateOperationFactory::new();

        let m = authority.create_crs("5703")?;
        let ft = authority.create_crs("8228")?;
        let ops = factory.create_operations(&m, &ft, &ctx)?;
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_conversion());
        assert_eq!(ops[0].method_epsg_code(), Some(1069));
        Ok(())
    }

    #[test]
    fn bound() -> Result<(), Error> {
        let ctx = OperationContext::new(None, None, 0.0);
        let factory = CoordinateOperationFactory::new();
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let bound = Crs::bound_to_wgs84(&nad27, &wgs84, &[-8., 160., 176.])?;

        let ops = factory.create_operations(&bound, &wgs84, &ctx)?;
        assert_eq!(names(&ops), ["Transformation from NAD27 to WGS 84"]);
        assert_eq!(ops[0].method_epsg_code(), Some(9603));

        let ops = factory.create_operations(&wgs84, &bound, &ctx)?;
        assert_eq!(names(&ops), ["Transformation from WGS 84 to NAD27"]);

        // On to a compound CRS through the hub
        let compound = builtin::wgs84_egm2008_compound()?;
        let ops = factory.create_operations(&bound, &compound, &ctx)?;
        assert!(!ops.is_empty());
        assert!(ops[0].name().starts_with("Transformation from NAD27 to WGS 84"));
        Ok(())
    }

    #[test]
    fn celestial_bodies() -> Result<(), Error> {
        let ctx = OperationContext::new(None, None, 0.0);
        let wgs84 = builtin::wgs84_geographic_2d();
        let datum = GeodeticReferenceFrame::new(
            IdentifiedObject::named("Mars 2000"),
            Ellipsoid::new("Mars", 3_396_190.0, 169.894_447_223_611).with_celestial_body("Mars"),
            PrimeMeridian::greenwich(),
        );
        let mars = Crs::geographic(
            IdentifiedObject::named("Mars 2000"),
            DatumOrEnsemble::Datum(datum),
            CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE),
        )?;
        let factory = CoordinateOperationFactory::new();
        assert!(matches!(factory.create_operations(&wgs84, &mars, &ctx), Err(Error::Unsupported(_))));
        Ok(())
    }
}
