//! Operations defined by their PROJ pipeline: either an explicit PROJ string,
//! or a composition of other operations, exported step by step.
use super::OperationKind;
use super::OperationRef;
use crate::authoring::*;

/// How the pipeline of a PROJ based operation is made
#[derive(Clone, Debug)]
pub enum Composition {
    /// An explicit PROJ string
    Text(String),
    /// Source CRS to geocentric, then geocentric to target CRS, ignoring
    /// the datum difference
    GeodToGeod,
    /// Horizontal and vertical operations, applied side by side
    HorizVert { horiz: OperationRef, vert: OperationRef },
    /// Horizontal operation to the interpolation CRS of the vertical operation,
    /// the vertical operation, and a horizontal operation from the interpolation CRS
    HorizVertHoriz {
        horiz_src: OperationRef,
        vert: OperationRef,
        horiz_dst: OperationRef,
        interpolation: CrsRef,
    },
}

impl Composition {
    /// The operations composed
    pub fn operations(&self) -> Vec<&OperationRef> {
        match self {
            Composition::Text(_) | Composition::GeodToGeod => Vec::new(),
            Composition::HorizVert { horiz, vert } => vec![horiz, vert],
            Composition::HorizVertHoriz {
                horiz_src,
                vert,
                horiz_dst,
                ..
            } => vec![horiz_src, vert, horiz_dst],
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProjBasedOperation {
    pub composition: Composition,
    /// The pipeline is to be run backwards
    pub inverted: bool,
}

impl ProjBasedOperation {
    pub fn inverted(&self) -> ProjBasedOperation {
        ProjBasedOperation {
            composition: self.composition.clone(),
            inverted: !self.inverted,
        }
    }
}

fn proj_based(composition: Composition) -> OperationKind {
    OperationKind::ProjBased(ProjBasedOperation {
        composition,
        inverted: false,
    })
}

/// True for names of the placeholder operations synthesized where no real
/// transformation is known
pub fn is_null_transformation(name: &str) -> bool {
    if name.contains(" + ") {
        return false;
    }
    [
        "Ballpark geocentric translation",
        "Ballpark geographic offset",
        "Null geographic offset",
        "Null geocentric translation",
    ]
    .iter()
    .any(|prefix| name.starts_with(prefix))
}

/// An operation given by an explicit PROJ string
pub fn create_from_proj_string(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    proj_string: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    // Validate early: the string must be parseable when exported
    crate::io::proj_string::parse(proj_string)?;
    let kind = proj_based(Composition::Text(proj_string.to_string()));
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind)
        .with_accuracies(accuracies);
    Ok(Arc::new(op))
}

/// Through geocentric space, between two geodetic CRS
pub fn create_geod_to_geod(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
) -> Result<OperationRef, Error> {
    for crs in [source, target] {
        if crs.geodetic().is_none() {
            return Err(Error::InvalidOperation(format!(
                "{}: not a geographic or geocentric CRS",
                crs.name()
            )));
        }
    }
    let kind = proj_based(Composition::GeodToGeod);
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind);
    Ok(Arc::new(op))
}

// Name, extent, accuracy and ballpark flag of a composition
fn composed_metadata(ops: &[&OperationRef]) -> Result<(IdentifiedObject, Vec<PositionalAccuracy>, bool), Error> {
    let names: Vec<&str> = ops
        .iter()
        .map(|op| op.name())
        .filter(|name| !is_null_transformation(name))
        .collect();
    let name = if names.is_empty() {
        ops.iter().map(|op| op.name()).collect::<Vec<_>>().join(" + ")
    } else {
        names.join(" + ")
    };

    let mut extent: Option<Extent> = None;
    for op in ops {
        let Some(op_extent) = op.domain_extent() else {
            continue;
        };
        extent = match extent {
            None => Some(op_extent),
            Some(e) => Some(e.intersection(&op_extent).ok_or(Error::EmptyIntersection)?),
        };
    }

    let accuracy: Option<f64> = ops.iter().map(|op| op.accuracy()).sum();
    let accuracies = accuracy.into_iter().map(PositionalAccuracy).collect();
    let ballpark = ops.iter().any(|op| op.has_ballpark());
    Ok((IdentifiedObject::named(&name).with_extent(extent), accuracies, ballpark))
}

/// A horizontal and a vertical operation, side by side, between two compound CRS
pub fn create_horiz_vert(
    source: &CrsRef,
    target: &CrsRef,
    horiz: &OperationRef,
    vert: &OperationRef,
) -> Result<OperationRef, Error> {
    let (properties, accuracies, ballpark) = composed_metadata(&[horiz, vert])?;
    let kind = proj_based(Composition::HorizVert {
        horiz: horiz.clone(),
        vert: vert.clone(),
    });
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind)
        .with_accuracies(&accuracies)
        .with_ballpark(ballpark);
    Ok(Arc::new(op))
}

/// A vertical operation, framed by the horizontal operations into and out of
/// its interpolation CRS
pub fn create_horiz_vert_horiz(
    source: &CrsRef,
    target: &CrsRef,
    horiz_src: &OperationRef,
    vert: &OperationRef,
    horiz_dst: &OperationRef,
    interpolation: &CrsRef,
) -> Result<OperationRef, Error> {
    let (properties, accuracies, ballpark) = composed_metadata(&[horiz_src, vert, horiz_dst])?;
    let kind = proj_based(Composition::HorizVertHoriz {
        horiz_src: horiz_src.clone(),
        vert: vert.clone(),
        horiz_dst: horiz_dst.clone(),
        interpolation: interpolation.clone(),
    });
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind)
        .with_interpolation_crs(Some(interpolation.clone()))
        .with_accuracies(&accuracies)
        .with_ballpark(ballpark);
    Ok(Arc::new(op))
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;
    use crate::operation::transformation;

    #[test]
    fn null_names() {
        assert!(is_null_transformation("Null geographic offset from WGS 84 to WGS 84"));
        assert!(is_null_transformation("Ballpark geographic offset from NAD27 to WGS 84"));
        assert!(!is_null_transformation("Null geographic offset from A to B + C"));
        assert!(!is_null_transformation("NAD27 to WGS 84 (4)"));
    }

    #[test]
    fn geod_to_geod() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let name = build_op_name("Ballpark geocentric translation", nad27.name(), wgs84.name());
        let op = create_geod_to_geod(IdentifiedObject::named(&name), &nad27, &wgs84)?;
        assert!(op.grids_needed().is_empty());
        assert_eq!(op.accuracy(), None);

        let inv = CoordinateOperation::inverse(&op)?;
        assert_eq!(inv.name(), "Ballpark geocentric translation from WGS 84 to NAD27");
        let OperationKind::ProjBased(p) = &inv.kind else {
            panic!("expected a PROJ based operation");
        };
        assert!(p.inverted);

        let vertical = builtin::egm2008_height();
        assert!(create_geod_to_geod(IdentifiedObject::named("x"), &vertical, &wgs84).is_err());
        Ok(())
    }

    #[test]
    fn horiz_vert_horiz() -> Result<(), Error> {
        let wgs84 = builtin::wgs84_geographic_2d();
        let wgs84_3d = builtin::wgs84_geographic_3d();
        let egm2008 = builtin::egm2008_height();
        let compound = builtin::wgs84_egm2008_compound()?;

        let name = build_op_name("Null geographic offset", wgs84.name(), wgs84_3d.name());
        let null = transformation::create_null_geographic_offset(IdentifiedObject::named(&name), &wgs84, &wgs84_3d, &[PositionalAccuracy(0.0)])?;
        let geoid = transformation::create_gravity_related_height_to_geographic_3d(
            IdentifiedObject::named("EGM2008 height to WGS 84").with_extent(Some(Extent::world())),
            &egm2008,
            &wgs84_3d,
            Some(&wgs84_3d),
            "us_nga_egm08_25.tif",
            &[PositionalAccuracy(1.0)],
        )?;
        let back = CoordinateOperation::inverse(&null)?;

        let op = create_horiz_vert_horiz(&compound, &wgs84_3d, &back, &geoid, &null, &wgs84_3d)?;
        assert_eq!(op.name(), "EGM2008 height to WGS 84");
        assert_eq!(op.accuracy(), Some(1.0));
        assert_eq!(op.grids_needed(), vec!["us_nga_egm08_25.tif".to_string()]);
        assert!(op.interpolation_crs().is_some());
        Ok(())
    }
}
