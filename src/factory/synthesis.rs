//! Operations synthesized from the definitions of the CRS alone, where
//! the authority has nothing to offer.
use crate::authoring::*;
use crate::crs::GeodeticCrs;
use crate::operation::concatenated;
use crate::operation::conversion;
use crate::operation::proj_based;
use crate::operation::transformation;

/// `op` with its properties amended by `amend`. The copy shares the identity of `op`
pub(crate) fn amended(op: OperationRef, amend: impl FnOnce(CoordinateOperation) -> CoordinateOperation) -> OperationRef {
    let op = Arc::try_unwrap(op).unwrap_or_else(|op| op.as_ref().clone());
    Arc::new(amend(op))
}

/// The common part of the areas of use of two CRS. `None` if either is
/// unrestricted, or if they are disjoint
pub(crate) fn crs_extent_intersection(source: &Crs, target: &Crs) -> Option<Extent> {
    match (source.extent(), target.extent()) {
        (Some(s), Some(t)) => s.intersection(&t),
        (Some(e), None) | (None, Some(e)) => Some(e),
        (None, None) => None,
    }
}

/// The do-nothing operation between two equivalent CRS
pub(crate) fn identity(source: &CrsRef, target: &CrsRef) -> Result<OperationRef, Error> {
    let name = build_op_name("Identity", source.name(), target.name());
    let properties = IdentifiedObject::named(&name).with_extent(crs_extent_intersection(source, target));
    proj_based::create_from_proj_string(properties, source, target, "", &[PositionalAccuracy(0.0)])
}

// ----- G E O D E T I C ---------------------------------------------------------------

fn same_datum(a: &GeodeticCrs, b: &GeodeticCrs) -> bool {
    a.datum().is_equivalent_to(&b.datum(), Criterion::Equivalent)
}

/// A zero offset between two geographic CRS: exact for the same datum, a
/// ballpark operation otherwise
fn geographic_offset(source: &CrsRef, target: &CrsRef, exact: bool) -> Result<OperationRef, Error> {
    let kind = if exact {
        "Null geographic offset"
    } else {
        "Ballpark geographic offset"
    };
    let name = build_op_name(kind, source.name(), target.name());
    let properties = IdentifiedObject::named(&name).with_extent(crs_extent_intersection(source, target));
    let accuracies = if exact { vec![PositionalAccuracy(0.0)] } else { Vec::new() };
    let op = transformation::create_null_geographic_offset(properties, source, target, &accuracies)?;
    Ok(amended(op, |op| op.with_ballpark(!exact)))
}

fn longitude_rotation(
    source: &CrsRef,
    target: &CrsRef,
    from: &PrimeMeridian,
    to: &PrimeMeridian,
) -> Result<OperationRef, Error> {
    let name = build_op_name("Transformation", source.name(), target.name());
    let properties = IdentifiedObject::named(&name).with_extent(Some(Extent::world()));
    let offset = Measure::degrees(from.longitude_degrees() - to.longitude_degrees());
    transformation::create_longitude_rotation(properties, source, target, offset, &[PositionalAccuracy(0.0)])
}

/// Through geocentric space. Exact for the same datum, ballpark otherwise
fn geocentric_translation(source: &CrsRef, target: &CrsRef, exact: bool) -> Result<OperationRef, Error> {
    let kind = if exact {
        "Null geocentric translation"
    } else {
        "Ballpark geocentric translation"
    };
    let name = build_op_name(kind, source.name(), target.name());
    let properties = IdentifiedObject::named(&name).with_extent(crs_extent_intersection(source, target));
    let op = proj_based::create_geod_to_geod(properties, source, target)?;
    let accuracies = if exact { vec![PositionalAccuracy(0.0)] } else { Vec::new() };
    Ok(amended(op, |op| op.with_accuracies(&accuracies).with_ballpark(!exact)))
}

/// The operations between two geodetic (geographic or geocentric) CRS,
/// derived from their datums. CRS of different celestial bodies are an error
pub(crate) fn geodetic(source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
    let (Some(gs), Some(gt)) = (source.geodetic(), target.geodetic()) else {
        return Ok(Vec::new());
    };

    let (body_s, body_t) = (gs.ellipsoid().celestial_body().to_string(), gt.ellipsoid().celestial_body().to_string());
    if body_s != body_t {
        return Err(Error::Unsupported(format!(
            "operations between CRS of different celestial bodies ({body_s}, {body_t})"
        )));
    }

    if source.is_geographic() && target.is_geographic() {
        return geographic_to_geographic(source, target, gs, gt).map(|op| vec![op]);
    }

    let exact = same_datum(gs, gt);
    if source.is_geographic() != target.is_geographic() && exact {
        return Ok(vec![conversion::create_geographic_geocentric(source, target)?]);
    }
    Ok(vec![geocentric_translation(source, target, exact)?])
}

fn geographic_to_geographic(
    source: &CrsRef,
    target: &CrsRef,
    gs: &GeodeticCrs,
    gt: &GeodeticCrs,
) -> Result<OperationRef, Error> {
    let same_ellipsoid = gs.ellipsoid().is_equivalent_to(&gt.ellipsoid(), Criterion::Equivalent);
    let (pm_s, pm_t) = (gs.prime_meridian(), gt.prime_meridian());
    let same_prime_meridian = pm_s.is_equivalent_to(&pm_t, Criterion::Equivalent);

    // Same datum, differing only by the unit of the ellipsoidal height
    let exact = same_datum(gs, gt);
    if let (Some(unit_s), Some(unit_t)) = (gs.cs.vertical_unit(), gt.cs.vertical_unit()) {
        let factor = unit_s.conversion_to_si() / unit_t.conversion_to_si();
        if exact && (factor - 1.0).abs() > 1e-12 {
            let name = build_op_name("Conversion", source.name(), target.name());
            let properties = IdentifiedObject::named(&name).with_extent(crs_extent_intersection(source, target));
            return conversion::create_change_vertical_unit_between(properties, source, target, Some(factor));
        }
    }

    if !same_prime_meridian {
        if same_ellipsoid {
            return longitude_rotation(source, target, &pm_s, &pm_t);
        }

        // Rotate to the target prime meridian on the source ellipsoid, then offset
        let datum_s = gs.datum();
        let label = format!("(with {} prime meridian)", pm_t.name());
        let datum = GeodeticReferenceFrame::new(
            IdentifiedObject::named(&format!("{} {label}", datum_s.name())),
            datum_s.ellipsoid.clone(),
            pm_t.clone(),
        );
        let intermediate = Crs::geographic(
            IdentifiedObject::named(&format!("{} {label}", source.name())),
            DatumOrEnsemble::Datum(datum),
            gs.cs.clone(),
        )?;
        let rotation = longitude_rotation(source, &intermediate, &pm_s, &pm_t)?;
        let offset = geographic_offset(&intermediate, target, false)?;
        return concatenated::create_compute_metadata(&[rotation, offset], false);
    }

    geographic_offset(source, target, exact)
}

// ----- V E R T I C A L ---------------------------------------------------------------

fn vertical_unit_factor(source: &Crs, target: &Crs) -> f64 {
    let si = |crs: &Crs| {
        crs.coordinate_system()
            .and_then(|cs| cs.vertical_unit())
            .map_or(1.0, |u| u.conversion_to_si())
    };
    si(source) / si(target)
}

/// Between two vertical CRS: a change of unit on the same datum, a ballpark
/// transformation otherwise
pub(crate) fn vertical(source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
    let (Some(vs), Some(vt)) = (source.vertical_crs(), target.vertical_crs()) else {
        return Ok(Vec::new());
    };
    let factor = vertical_unit_factor(source, target);
    let extent = crs_extent_intersection(source, target);

    if vs.datum.datum().is_equivalent_to(&vt.datum.datum(), Criterion::Equivalent) {
        if (factor - 1.0).abs() <= 1e-12 {
            return Ok(vec![identity(source, target)?]);
        }
        let name = build_op_name("Conversion", source.name(), target.name());
        let properties = IdentifiedObject::named(&name).with_extent(extent);
        let op = conversion::create_change_vertical_unit_between(properties, source, target, Some(factor))?;
        return Ok(vec![op]);
    }

    let name = format!(
        "{} (ballpark vertical transformation)",
        build_op_name("Transformation", source.name(), target.name())
    );
    let properties = IdentifiedObject::named(&name).with_extent(extent);
    let op = transformation::create_change_vertical_unit(properties, source, target, factor, &[])?;
    Ok(vec![amended(op, |op| op.with_ballpark(true))])
}

/// From a vertical CRS to a geographic 3D CRS, taking gravity related heights
/// as ellipsoidal heights
pub(crate) fn vertical_to_geographic(source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
    if !source.is_vertical() || !target.is_geographic() || target.dimension() != 3 {
        return Ok(Vec::new());
    }
    let name = format!(
        "{} (ballpark vertical transformation, without ellipsoid height to vertical height correction)",
        build_op_name("Transformation", source.name(), target.name())
    );
    let properties = IdentifiedObject::named(&name).with_extent(crs_extent_intersection(source, target));
    let factor = vertical_unit_factor(source, target);
    let op = transformation::create_change_vertical_unit(properties, source, target, factor, &[])?;
    Ok(vec![amended(op, |op| op.with_ballpark(true))])
}

// ----- T E S T S ------------------------------------------------------------------
