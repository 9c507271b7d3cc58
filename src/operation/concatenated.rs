//! Concatenated operations: chains of operations, each step's target CRS
//! being the next step's source CRS.
use super::OperationKind;
use super::OperationRef;
use crate::authoring::*;

/// A concatenation of at least 2 steps. Fails if the steps do not chain
pub fn create(
    properties: IdentifiedObject,
    steps: Vec<OperationRef>,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    Ok(Arc::new(build(properties, steps, accuracies)?))
}

fn build(
    properties: IdentifiedObject,
    steps: Vec<OperationRef>,
    accuracies: &[PositionalAccuracy],
) -> Result<CoordinateOperation, Error> {
    if steps.len() < 2 {
        return Err(Error::InvalidOperation(
            "a concatenated operation needs at least 2 steps".to_string(),
        ));
    }

    for pair in steps.windows(2) {
        let (Some(target), Some(source)) = (pair[0].target_crs(), pair[1].source_crs()) else {
            return Err(Error::InvalidOperation(format!(
                "step \"{}\" or \"{}\" lacks a source or target CRS",
                pair[0].name(),
                pair[1].name()
            )));
        };
        if !chains(&target, &source) {
            return Err(Error::InvalidOperation(format!(
                "target CRS of \"{}\" ({}) differs from source CRS of \"{}\" ({})",
                pair[0].name(),
                target.name(),
                pair[1].name(),
                source.name()
            )));
        }
    }

    let source = steps[0].source_crs();
    let target = steps[steps.len() - 1].target_crs();
    let op = CoordinateOperation::assemble(properties, source, target, OperationKind::Concatenated(steps))
        .with_accuracies(accuracies);
    Ok(op)
}

fn chains(target: &CrsRef, source: &CrsRef) -> bool {
    if target.id() == source.id() || target.is_more_or_less_equivalent_to(source) {
        return true;
    }
    // A geographic 3D step may feed a geographic 2D step, and vice versa
    let target = Crs::demote_to_2d(target);
    let source = Crs::demote_to_2d(source);
    target.is_more_or_less_equivalent_to(&source)
}

/// A concatenation with name, extent, accuracy and ballpark flag computed
/// from the steps. Nested concatenations are flattened, and adjacent steps
/// being each other's inverse are removed. If a single step remains, it is
/// returned as is.
///
/// With `check_extent`, steps whose domains do not intersect are an error
/// ([`Error::EmptyIntersection`])
pub fn create_compute_metadata(steps: &[OperationRef], check_extent: bool) -> Result<OperationRef, Error> {
    let mut flattened: Vec<OperationRef> = Vec::new();
    for step in steps {
        if step.is_concatenated() {
            flattened.extend(step.steps().iter().cloned());
        } else {
            flattened.push(step.clone());
        }
    }

    // Cancel out step pairs of the form (op, inverse of op)
    let mut reduced: Vec<OperationRef> = Vec::with_capacity(flattened.len());
    for step in flattened {
        if let Some(last) = reduced.last() {
            if last.is_inverse_of(&step) {
                reduced.pop();
                continue;
            }
        }
        reduced.push(step);
    }

    match reduced.len() {
        0 => {
            return Err(Error::InvalidOperation(
                "the steps cancel out each other".to_string(),
            ))
        }
        1 => return Ok(reduced[0].clone()),
        _ => {}
    }

    let name = reduced
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(" + ");

    let mut extent: Option<Extent> = None;
    for step in reduced.iter() {
        let Some(step_extent) = step.domain_extent() else {
            continue;
        };
        extent = match extent {
            None => Some(step_extent),
            Some(e) => match e.intersection(&step_extent) {
                Some(intersection) => Some(intersection),
                None if check_extent => return Err(Error::EmptyIntersection),
                None => Some(e),
            },
        };
    }

    let accuracy: Option<f64> = reduced.iter().map(|s| s.accuracy()).sum();
    let accuracies: Vec<_> = accuracy.into_iter().map(PositionalAccuracy).collect();
    let ballpark = reduced.iter().any(|s| s.has_ballpark());

    let properties = IdentifiedObject::named(&name).with_extent(extent);
    let op = build(properties, reduced, &accuracies)?.with_ballpark(ballpark);
    Ok(Arc::new(op))
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;
    use crate::operation::transformation;

    fn gt(name: &str, source: &CrsRef, target: &CrsRef, accuracy: f64, extent: Option<Extent>) -> Result<OperationRef, Error> {
        let properties = IdentifiedObject::named(name).with_extent(extent);
        transformation::create_geocentric_translations(properties, source, target, [1., 2., 3.], &[PositionalAccuracy(accuracy)])
    }

    #[test]
    fn chaining() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let a = gt("a", &nad27, &nad83, 2., None)?;
        let b = gt("b", &nad83, &wgs84, 3., None)?;

        let ab = create_compute_metadata(&[a.clone(), b.clone()], true)?;
        assert!(ab.is_concatenated());
        assert_eq!(ab.name(), "a + b");
        assert_eq!(ab.accuracy(), Some(5.));
        assert_eq!(ab.step_count(), 2);
        assert_eq!(ab.source_crs().map(|c| c.name().to_string()), Some("NAD27".to_string()));
        assert_eq!(ab.target_crs().map(|c| c.name().to_string()), Some("WGS 84".to_string()));

        // Steps not chaining
        let err = create(IdentifiedObject::named("ba"), vec![b.clone(), a.clone()], &[]);
        assert!(matches!(err, Err(Error::InvalidOperation(_))));
        assert!(create(IdentifiedObject::named("a"), vec![a.clone()], &[]).is_err());

        // Nested concatenations are flattened
        let c = gt("c", &wgs84, &nad27, 1., None)?;
        let abc = create_compute_metadata(&[ab, c], false)?;
        assert_eq!(abc.step_count(), 3);
        assert_eq!(abc.name(), "a + b + c");
        Ok(())
    }

    #[test]
    fn inverse_pairs_cancel() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let a = gt("a", &nad27, &nad83, 2., None)?;
        let b = gt("b", &nad83, &wgs84, 3., None)?;
        let b_inv = CoordinateOperation::inverse(&b)?;

        let op = create_compute_metadata(&[a.clone(), b.clone(), b_inv.clone()], false)?;
        assert!(Arc::ptr_eq(&op, &a));
        assert!(create_compute_metadata(&[b, b_inv], false).is_err());
        Ok(())
    }

    #[test]
    fn extents() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let west = Some(Extent::from_bbox(-10., 40., 0., 50.));
        let east = Some(Extent::from_bbox(5., 40., 15., 50.));
        let overlap = Some(Extent::from_bbox(-5., 45., 10., 60.));

        let a = gt("a", &nad27, &nad83, 1., west.clone())?;
        let b = gt("b", &nad83, &wgs84, 1., east)?;
        assert!(matches!(create_compute_metadata(&[a.clone(), b.clone()], true), Err(Error::EmptyIntersection)));
        assert!(create_compute_metadata(&[a.clone(), b], false).is_ok());

        let b = gt("b", &nad83, &wgs84, 1., overlap)?;
        let ab = create_compute_metadata(&[a, b], true)?;
        let bbox = ab.domain_extent().and_then(|e| e.bbox).unwrap();
        assert_eq!((bbox.west, bbox.south, bbox.east, bbox.north), (-5., 45., 0., 50.));

        // Without an extent of its own, a concatenation is valid where its steps are
        let a = gt("a", &nad27, &nad83, 1., west.clone())?;
        let b = gt("b", &nad83, &wgs84, 1., west.clone())?;
        let ab = create(IdentifiedObject::named("ab"), vec![a, b], &[])?;
        assert_eq!(ab.domain_extent().and_then(|e| e.bbox), west.and_then(|e| e.bbox));

        let unknown = transformation::create_ntv2(IdentifiedObject::named("u"), &wgs84, &nad27, "x.gsb", &[])?;
        let a = gt("a", &nad27, &wgs84, 1., None)?;
        let op = create_compute_metadata(&[a, unknown], true)?;
        assert_eq!(op.accuracy(), None);
        Ok(())
    }
}
