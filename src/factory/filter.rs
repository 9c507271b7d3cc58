//! Ranking of the candidate operations: filtering by accuracy and area of
//! use, sorting, and removal of dominated and duplicated operations.
use super::GridAvailabilityUse;
use super::OperationContext;
use super::SourceTargetCrsExtentUse;
use super::SpatialCriterion;
use crate::authoring::*;
use crate::operation::proj_based::is_null_transformation;
use std::cmp::Ordering;

// A candidate, with the properties the ranking depends on
struct Candidate {
    op: OperationRef,
    extent: Extent,
    accuracy: Option<f64>,
    grids: Vec<String>,
    grids_available: bool,
    grids_known: bool,
    area: f64,
}

impl Candidate {
    fn new(op: OperationRef, ctx: &OperationContext, area_of_interest: Option<&Extent>) -> Candidate {
        let extent = op.domain_extent().unwrap_or(WORLD);
        let accuracy = op.accuracy();
        let grids = op.grids_needed();
        let (grids_available, grids_known) = match ctx.grid_availability_use() {
            GridAvailabilityUse::Ignored => (true, true),
            _ => (
                grids.iter().all(|g| ctx.grid_available(g)),
                grids.iter().all(|g| ctx.grid_known(g)),
            ),
        };
        let area = match area_of_interest {
            Some(aoi) => extent.intersection(aoi).map_or(0.0, |e| e.pseudo_area()),
            None => extent.pseudo_area(),
        };
        Candidate {
            op,
            extent,
            accuracy,
            grids,
            grids_available,
            grids_known,
            area,
        }
    }

    // At equal accuracy, operations without grids go first. At unknown
    // accuracy, those with grids do: the grids are assumed to buy accuracy
    fn grid_rank(&self) -> u8 {
        match (self.accuracy.is_some(), self.grids.is_empty()) {
            (true, true) | (false, false) => 0,
            _ => 1,
        }
    }
}

/// The ranking order. Each criterion compares a property of the individual
/// candidates, so the order is a strict weak ordering
fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    // true sorts before false
    b.grids_available
        .cmp(&a.grids_available)
        .then_with(|| b.grids_known.cmp(&a.grids_known))
        .then_with(|| b.accuracy.is_some().cmp(&a.accuracy.is_some()))
        .then_with(|| b.area.total_cmp(&a.area))
        .then_with(|| a.accuracy.unwrap_or(0.0).total_cmp(&b.accuracy.unwrap_or(0.0)))
        .then_with(|| a.grid_rank().cmp(&b.grid_rank()))
        .then_with(|| a.op.step_count().cmp(&b.op.step_count()))
        .then_with(|| a.op.name().len().cmp(&b.op.name().len()))
        .then_with(|| a.op.name().cmp(b.op.name()))
}

// ----- A R E A S   O F   I N T E R E S T ----------------------------------------------

/// The areas an operation is checked against: the explicit area of interest,
/// or the one(s) derived from the CRS extents
fn areas_of_interest(ctx: &OperationContext, source: &Crs, target: &Crs) -> Vec<Extent> {
    if let Some(aoi) = ctx.area_of_interest() {
        return vec![aoi.clone()];
    }
    let (source_extent, target_extent) = (source.extent(), target.extent());
    match ctx.source_target_crs_extent_use() {
        SourceTargetCrsExtentUse::None => Vec::new(),
        SourceTargetCrsExtentUse::Both => source_extent.into_iter().chain(target_extent).collect(),
        SourceTargetCrsExtentUse::Intersection => match (source_extent, target_extent) {
            (Some(s), Some(t)) => s.intersection(&t).into_iter().collect(),
            (s, t) => s.or(t).into_iter().collect(),
        },
        SourceTargetCrsExtentUse::Smallest => match (source_extent, target_extent) {
            (Some(s), Some(t)) if t.pseudo_area() < s.pseudo_area() => vec![t],
            (Some(s), _) => vec![s],
            (None, t) => t.into_iter().collect(),
        },
    }
}

// Candidates are ranked by their share of the area all the areas of interest have in common
fn common_area(areas: &[Extent]) -> Option<Extent> {
    let (first, rest) = areas.split_first()?;
    rest.iter().try_fold(first.clone(), |common, area| common.intersection(area))
}

// ----- T H E   P I P E L I N E -------------------------------------------------------

/// Filter, sort and reduce the `candidates` found for the operations from
/// `source` to `target`. The result is deterministic for given input
pub(crate) fn filter_and_sort(
    candidates: Vec<OperationRef>,
    ctx: &OperationContext,
    source: &Crs,
    target: &Crs,
) -> Vec<OperationRef> {
    let areas = areas_of_interest(ctx, source, target);
    let ranking_area = common_area(&areas);
    let desired_accuracy = ctx.desired_accuracy();
    let discard_if_missing = ctx.grid_availability_use() == GridAvailabilityUse::DiscardIfMissing;
    debug!(
        "Ranking {} candidates from {} to {} ({} areas of interest)",
        candidates.len(),
        source.name(),
        target.name(),
        areas.len()
    );

    // Filter
    let mut contains_area_of_interest = false;
    let mut kept = Vec::with_capacity(candidates.len());
    for op in candidates {
        let candidate = Candidate::new(op, ctx, ranking_area.as_ref());
        if desired_accuracy > 0.0 && candidate.accuracy.map_or(true, |a| a > desired_accuracy) {
            trace!("Discarding {}: accuracy {:?}", candidate.op.name(), candidate.accuracy);
            continue;
        }
        if discard_if_missing && !candidate.grids_available {
            trace!("Discarding {}: missing grids {:?}", candidate.op.name(), candidate.grids);
            continue;
        }
        let satisfies = |aoi: &Extent| match ctx.spatial_criterion() {
            SpatialCriterion::StrictContainment => candidate.extent.contains(aoi),
            SpatialCriterion::PartialIntersection => candidate.extent.intersects(aoi),
        };
        if !areas.iter().all(satisfies) {
            trace!("Discarding {}: outside the area of interest", candidate.op.name());
            continue;
        }
        if !is_null_transformation(candidate.op.name()) && areas.iter().all(|aoi| candidate.extent.contains(aoi)) {
            contains_area_of_interest = true;
        }
        kept.push(candidate);
    }

    // Sort
    kept.sort_by(compare);
    prune_null_fallback(&mut kept, contains_area_of_interest);

    // Reduce
    let kept = remove_dominated(kept);
    let mut kept = remove_duplicates(kept);
    prune_null_fallback(&mut kept, contains_area_of_interest);

    debug!("{} operations from {} to {}", kept.len(), source.name(), target.name());
    kept.into_iter().map(|c| c.op).collect()
}

// The synthesized null/ballpark fallback is pointless when it comes last, and
// some operation in front of it covers the area of interest
fn prune_null_fallback(candidates: &mut Vec<Candidate>, contains_area_of_interest: bool) {
    if candidates.len() < 2 || !contains_area_of_interest {
        return;
    }
    if candidates.last().map_or(false, |c| is_null_transformation(c.op.name())) {
        if let Some(c) = candidates.pop() {
            trace!("Pruning fallback {}", c.op.name());
        }
    }
}

// Within a run of candidates of the same area of use, later candidates must
// improve on the earlier ones
fn remove_dominated(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut result: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut grid_sets: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut has_gridless = false;

    for candidate in candidates {
        let same_area = result
            .last()
            .map_or(false, |last| last.extent.is_same_area(&candidate.extent));

        if !same_area {
            grid_sets.clear();
            has_gridless = false;
        } else {
            let Some(last) = result.last() else {
                continue;
            };
            let dominated = has_gridless
                || grid_sets.contains(&candidate.grids)
                || (candidate.accuracy.is_some()
                    && candidate.accuracy == last.accuracy
                    && candidate.op.step_count() > last.op.step_count());
            if dominated {
                trace!("Removing dominated {}", candidate.op.name());
                continue;
            }
        }

        if candidate.grids.is_empty() {
            has_gridless = true;
        }
        grid_sets.insert(candidate.grids.clone());
        result.push(candidate);
    }
    result
}

// Operations with identical PROJ pipelines and areas of use are duplicates.
// Operations that cannot be exported are kept
fn remove_duplicates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut result = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Ok(pipeline) = candidate.op.export_to_proj_string() else {
            result.push(candidate);
            continue;
        };
        let key = match candidate.extent.bbox {
            Some(b) => format!("{pipeline} {} {} {} {}", b.west, b.south, b.east, b.north),
            None => pipeline,
        };
        if seen.insert(key) {
            result.push(candidate);
        } else {
            trace!("Removing duplicate {}", candidate.op.name());
        }
    }
    result
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;
    use crate::operation::concatenated;
    use crate::operation::transformation;

    fn gt(name: &str, code: u32, accuracy: Option<f64>, extent: Extent) -> Result<OperationRef, Error> {
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let properties = IdentifiedObject::named(name).with_epsg(code).with_extent(Some(extent));
        let accuracies: Vec<_> = accuracy.into_iter().map(PositionalAccuracy).collect();
        transformation::create_geocentric_translations(properties, &nad83, &wgs84, [1., 2., code as f64], &accuracies)
    }

    fn names(ops: &[OperationRef]) -> Vec<&str> {
        ops.iter().map(|op| op.name()).collect()
    }

    #[test]
    fn ordering() -> Result<(), Error> {
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let ctx = OperationContext::new(None, None, 0.0)
            .with_source_target_crs_extent_use(SourceTargetCrsExtentUse::None);

        let small = Extent::from_bbox(-10., 40., 0., 50.);
        let large = Extent::from_bbox(-20., 30., 10., 60.);
        let ops = vec![
            gt("unknown", 1, None, large.clone())?,
            gt("small", 2, Some(1.), small)?,
            gt("large, 3m", 3, Some(3.), large.clone())?,
            gt("large, 2m", 4, Some(2.), large)?,
        ];
        let sorted = filter_and_sort(ops, &ctx, &nad83, &wgs84);
        // The 3 m operation is dominated by the 2 m one, with the same area of use
        assert_eq!(names(&sorted), ["large, 2m", "small", "unknown"]);

        // Deterministic
        let again = filter_and_sort(sorted.clone(), &ctx, &nad83, &wgs84);
        assert_eq!(names(&again), names(&sorted));
        Ok(())
    }

    #[test]
    fn accuracy_and_containment() -> Result<(), Error> {
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let aoi = Extent::from_bbox(-5., 42., -1., 48.);
        let ctx = OperationContext::new(None, Some(aoi), 2.5);

        let ops = vec![
            gt("inside", 1, Some(1.), Extent::from_bbox(-4., 43., -2., 47.))?,
            gt("containing", 2, Some(2.), Extent::from_bbox(-10., 40., 0., 50.))?,
            gt("inaccurate", 3, Some(3.), Extent::from_bbox(-10., 40., 0., 50.))?,
            gt("unknown", 4, None, Extent::from_bbox(-10., 40., 0., 50.))?,
        ];
        let sorted = filter_and_sort(ops.clone(), &ctx, &nad83, &wgs84);
        assert_eq!(names(&sorted), ["containing"]);

        let ctx = ctx
            .with_desired_accuracy(0.0)
            .with_spatial_criterion(SpatialCriterion::PartialIntersection);
        let sorted = filter_and_sort(ops, &ctx, &nad83, &wgs84);
        assert_eq!(sorted[0].name(), "containing");
        assert_eq!(sorted.len(), 3);
        assert!(!names(&sorted).contains(&"inaccurate"));
        Ok(())
    }

    #[test]
    fn duplicates_and_fallback() -> Result<(), Error> {
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let area = Extent::from_bbox(-10., 40., 0., 50.);
        let ctx = OperationContext::new(None, Some(area.clone()), 0.0);

        // Same parameters and area, different names and codes
        let a = gt("NAD83 to WGS 84 (a)", 7, Some(1.), area.clone())?;
        let b = gt("NAD83 to WGS 84 (b)", 7, Some(1.), area.clone())?;
        let name = build_op_name("Null geographic offset", nad83.name(), wgs84.name());
        let properties = IdentifiedObject::named(&name).with_extent(Some(Extent::world()));
        let null = transformation::create_null_geographic_offset(properties, &nad83, &wgs84, &[])?;

        let sorted = filter_and_sort(vec![null.clone(), b, a.clone()], &ctx, &nad83, &wgs84);
        assert_eq!(names(&sorted), ["NAD83 to WGS 84 (a)"]);

        // The fallback stays when nothing else covers the area of interest
        let ctx = ctx.with_area_of_interest(Some(Extent::from_bbox(-20., 40., 0., 50.)));
        let sorted = filter_and_sort(vec![null, a], &ctx, &nad83, &wgs84);
        assert_eq!(sorted.len(), 1);
        assert!(is_null_transformation(sorted[0].name()));
        Ok(())
    }

    fn ntv2(name: &str, grid: &str, accuracy: Option<f64>) -> Result<OperationRef, Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let properties = IdentifiedObject::named(name).with_extent(Some(Extent::from_bbox(-10., 40., 0., 50.)));
        let accuracies: Vec<_> = accuracy.into_iter().map(PositionalAccuracy).collect();
        transformation::create_ntv2(properties, &nad27, &nad83, grid, &accuracies)
    }

    // Strictly before, in both directions of comparison
    fn ranks_before(a: &OperationRef, b: &OperationRef, ctx: &OperationContext) -> bool {
        let a = Candidate::new(a.clone(), ctx, None);
        let b = Candidate::new(b.clone(), ctx, None);
        compare(&a, &b) == Ordering::Less && compare(&b, &a) == Ordering::Greater
    }

    #[test]
    fn known_grids_first() -> Result<(), Error> {
        let authority = Minimal::new();
        let ctx = OperationContext::new(Some(&authority), None, 0.0);

        // Neither grid is available, but only one is known to the authority
        let known = ntv2("known", "ntv2_0.gsb", Some(1.5))?;
        let unknown = ntv2("unknown", "nowhere.gsb", Some(0.5))?;
        assert!(ranks_before(&known, &unknown, &ctx));
        Ok(())
    }

    #[test]
    fn grids_at_equal_accuracy() -> Result<(), Error> {
        let europe = Extent::from_bbox(-10., 40., 0., 50.);
        let ctx = OperationContext::new(None, None, 0.0).with_grid_availability_use(GridAvailabilityUse::Ignored);

        // Known and equal accuracy: no grid is better
        let gridded = ntv2("gridded", "ntv2_0.gsb", Some(1.))?;
        let gridless = gt("gridless", 1, Some(1.), europe.clone())?;
        assert!(ranks_before(&gridless, &gridded, &ctx));

        // Unknown accuracy: the grid is assumed to buy some
        let gridded = ntv2("gridded", "ntv2_0.gsb", None)?;
        let gridless = gt("gridless", 1, None, europe)?;
        assert!(ranks_before(&gridded, &gridless, &ctx));
        Ok(())
    }

    #[test]
    fn fewer_steps_first() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let europe = Extent::from_bbox(-10., 40., 0., 50.);
        let ctx = OperationContext::new(None, None, 0.0);

        let properties = IdentifiedObject::named("a").with_extent(Some(europe.clone()));
        let a = transformation::create_geocentric_translations(properties, &nad27, &nad83, [1., 2., 3.], &[PositionalAccuracy(0.5)])?;
        let b = gt("b", 2, Some(0.5), europe.clone())?;
        let properties = IdentifiedObject::named("ab").with_extent(Some(europe.clone()));
        let two_steps = concatenated::create(properties, vec![a, b], &[PositionalAccuracy(1.)])?;
        let one_step = gt("A single step with a longer name", 3, Some(1.), europe)?;
        assert!(ranks_before(&one_step, &two_steps, &ctx));
        Ok(())
    }

    #[test]
    fn name_tie_breaks() -> Result<(), Error> {
        let europe = Extent::from_bbox(-10., 40., 0., 50.);
        let ctx = OperationContext::new(None, None, 0.0);

        // Shorter names first
        let ten = gt("NAD83 to WGS 84 (10)", 1, Some(1.), europe.clone())?;
        let nine = gt("NAD83 to WGS 84 (9)", 2, Some(1.), europe.clone())?;
        assert!(ranks_before(&nine, &ten, &ctx));

        // Then alphabetically
        let a = gt("NAD83 to WGS 84 (a)", 3, Some(1.), europe.clone())?;
        let b = gt("NAD83 to WGS 84 (b)", 4, Some(1.), europe)?;
        assert!(ranks_before(&a, &b, &ctx));
        assert_eq!(compare(&Candidate::new(a.clone(), &ctx, None), &Candidate::new(a, &ctx, None)), Ordering::Equal);
        Ok(())
    }

    fn geographic_over(name: &str, extent: Extent) -> Result<CrsRef, Error> {
        let datum = GeodeticReferenceFrame::new(IdentifiedObject::named(name), Ellipsoid::named("GRS80")?, PrimeMeridian::greenwich());
        let object = IdentifiedObject::named(name).with_extent(Some(extent));
        Crs::geographic(object, DatumOrEnsemble::Datum(datum), CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE))
    }

    #[test]
    fn ranked_on_common_area() -> Result<(), Error> {
        let source = geographic_over("West", Extent::from_bbox(0., 0., 20., 10.))?;
        let target = geographic_over("East", Extent::from_bbox(10., 0., 30., 10.))?;
        let ctx = OperationContext::new(None, None, 0.0)
            .with_source_target_crs_extent_use(SourceTargetCrsExtentUse::Both)
            .with_spatial_criterion(SpatialCriterion::PartialIntersection);

        // "a" covers more of the source area, "b" more of the part shared with the target
        let a = gt("a", 1, Some(1.), Extent::from_bbox(0., 0., 15., 10.))?;
        let b = gt("b", 2, Some(1.), Extent::from_bbox(12., 0., 30., 10.))?;
        let sorted = filter_and_sort(vec![a, b], &ctx, &source, &target);
        assert_eq!(names(&sorted), ["b", "a"]);
        Ok(())
    }

    #[test]
    fn extent_of_steps() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let europe = Extent::from_bbox(-10., 40., 0., 50.);
        let properties = IdentifiedObject::named("a").with_extent(Some(europe.clone()));
        let a = transformation::create_geocentric_translations(properties, &nad27, &nad83, [1., 2., 3.], &[PositionalAccuracy(1.)])?;
        let b = gt("b", 2, Some(1.), europe)?;
        let ab = concatenated::create(IdentifiedObject::named("registered concatenation"), vec![a, b], &[])?;

        let asia = Extent::from_bbox(100., 30., 110., 40.);
        let ctx = OperationContext::new(None, Some(asia), 0.0);
        assert!(filter_and_sort(vec![ab.clone()], &ctx, &nad27, &wgs84).is_empty());

        let ctx = ctx.with_area_of_interest(Some(Extent::from_bbox(-5., 42., -1., 48.)));
        assert_eq!(names(&filter_and_sort(vec![ab], &ctx, &nad27, &wgs84)), ["registered concatenation"]);
        Ok(())
    }

    #[test]
    fn grids() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let mut authority = Minimal::new();
        let ntv2 = builtin::nad27_to_nad83_4(&nad27, &nad83)?;
        let nadcon = builtin::nad27_to_nad83_1(&nad27, &nad83)?;
        let canada = Extent::from_bbox(-100., 45., -90., 49.);

        let ctx = OperationContext::new(Some(&authority), Some(canada.clone()), 0.0)
            .with_spatial_criterion(SpatialCriterion::PartialIntersection);
        let sorted = filter_and_sort(vec![ntv2.clone(), nadcon.clone()], &ctx, &nad27, &nad83);
        // Neither grid is available: the more accurate NADCON goes first
        assert_eq!(names(&sorted), ["NAD27 to NAD83 (1)", "NAD27 to NAD83 (4)"]);

        let ctx = ctx.with_grid_availability_use(GridAvailabilityUse::DiscardIfMissing);
        assert!(filter_and_sort(vec![ntv2.clone(), nadcon.clone()], &ctx, &nad27, &nad83).is_empty());

        authority.register_grid(GridInfo::named("ntv2_0.gsb").with_availability("/grids/ntv2_0.gsb"));
        let ctx = OperationContext::new(Some(&authority), Some(canada), 0.0)
            .with_spatial_criterion(SpatialCriterion::PartialIntersection);
        let sorted = filter_and_sort(vec![nadcon, ntv2], &ctx, &nad27, &nad83);
        assert_eq!(names(&sorted), ["NAD27 to NAD83 (4)", "NAD27 to NAD83 (1)"]);
        Ok(())
    }
}
