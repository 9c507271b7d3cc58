//! The recursive case analysis behind [`CoordinateOperationFactory::create_operations`]
use super::filter::filter_and_sort;
use super::synthesis;
use super::GridAvailabilityUse;
use super::IntermediateCrsUse;
use super::OperationContext;
use crate::authoring::*;
use crate::operation::concatenated;
use crate::operation::proj_based;

/// Set this (to any value) to search for operations through intermediate
/// CRS, however many direct operations the authority has
pub const FORCE_SEARCH_PIVOTS: &str = "COORDOP_FORCE_SEARCH_PIVOTS";

// Below this number of direct operations, intermediate CRS are searched as well
const PIVOT_THRESHOLD: usize = 5;

// Protection against runaway recursion on pathological CRS definitions
const MAX_DEPTH: usize = 12;

pub(crate) struct Search<'a, 'b> {
    ctx: &'b OperationContext<'a>,
    depth: usize,
}

impl<'a, 'b> Search<'a, 'b> {
    pub(crate) fn new(ctx: &'b OperationContext<'a>) -> Search<'a, 'b> {
        Search { ctx, depth: 0 }
    }

    /// The candidate operations from `source` to `target`, unranked
    pub(crate) fn operations(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        if self.depth >= MAX_DEPTH {
            warn!("Giving up on {} to {}: search too deep", source.name(), target.name());
            return Ok(Vec::new());
        }
        self.depth += 1;
        let result = self.dispatch(source, target);
        self.depth -= 1;
        result
    }

    /// The operations from `source` to `target`, ranked as by the context
    fn ranked(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        let candidates = self.operations(source, target)?;
        Ok(filter_and_sort(candidates, self.ctx, source, target))
    }

    fn dispatch(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        trace!("Searching {} to {} (depth {})", source.name(), target.name(), self.depth);

        let equivalent = source.id() == target.id() || source.is_equivalent_to(target, Criterion::Equivalent);
        if equivalent && source.geodetic().is_none() {
            debug!("{} and {} are equivalent", source.name(), target.name());
            return Ok(vec![synthesis::identity(source, target)?]);
        }

        // Authority lookup. Bound CRS are reached through their transformation
        let lookup = !equivalent
            && !source.is_bound()
            && !target.is_bound()
            && !is_derived_from(source, target)
            && !is_derived_from(target, source);
        if lookup {
            let found = self.find_in_authority(source, target);
            if !found.is_empty() {
                if found.iter().any(|op| op.accuracy() == Some(0.0)) {
                    return Ok(found);
                }
                let mut found = found;
                // The synthesized fallback competes with the authority's operations
                if both_geodetic(source, target) {
                    found.extend(synthesis::geodetic(source, target)?);
                }
                return Ok(found);
            }
        }

        if both_geodetic(source, target) {
            debug!("Geodetic: {} to {}", source.name(), target.name());
            return synthesis::geodetic(source, target);
        }

        if source.derived_crs().is_some() {
            return self.from_derived(source, target);
        }
        if target.derived_crs().is_some() {
            return self.to_derived(source, target);
        }

        if source.is_bound() || target.is_bound() {
            return self.with_bound(source, target);
        }

        if source.is_vertical() && target.is_vertical() {
            debug!("Vertical: {} to {}", source.name(), target.name());
            return synthesis::vertical(source, target);
        }
        if source.is_vertical() && target.is_geographic() {
            debug!("Vertical to geographic: {} to {}", source.name(), target.name());
            return synthesis::vertical_to_geographic(source, target);
        }
        if source.is_geographic() && target.is_vertical() {
            let ops = self.operations(target, source)?;
            return Ok(inverted(ops));
        }

        if source.is_compound() && target.is_compound() {
            return self.compound_to_compound(source, target);
        }
        if source.is_compound() && target.is_geographic() {
            return self.compound_to_geographic(source, target);
        }
        if source.is_geographic() && target.is_compound() {
            let ops = self.operations(target, source)?;
            return Ok(inverted(ops));
        }

        debug!("No operations from {} to {}", source.name(), target.name());
        Ok(Vec::new())
    }

    // ----- A U T H O R I T Y ---------------------------------------------------------

    // The operations registered between the two CRS, in both directions, and
    // if needed, through intermediate CRS. Lookup failures mean "nothing found"
    fn find_in_authority(&self, source: &CrsRef, target: &CrsRef) -> Vec<OperationRef> {
        let Some(authority) = self.ctx.authority() else {
            return Vec::new();
        };
        let (Some(s), Some(t)) = (source.identifiers().first(), target.identifiers().first()) else {
            return Vec::new();
        };
        let alternative_names = self.ctx.use_proj_alternative_grid_names();
        let discard = self.ctx.grid_availability_use() == GridAvailabilityUse::DiscardIfMissing;

        let mut found = authority
            .create_from_crs_codes(&s.codespace, &s.code, &t.codespace, &t.code, alternative_names, discard)
            .unwrap_or_else(|e| {
                trace!("Authority: {e}");
                Vec::new()
            });
        let reverse = authority
            .create_from_crs_codes(&t.codespace, &t.code, &s.codespace, &s.code, alternative_names, discard)
            .unwrap_or_else(|e| {
                trace!("Authority: {e}");
                Vec::new()
            });
        found.extend(inverted(reverse));
        debug!("Authority: {} operations from {s} to {t}", found.len());

        if found.iter().any(|op| op.accuracy() == Some(0.0)) {
            return found;
        }

        let search_pivots = match self.ctx.allowed_intermediate_crs() {
            IntermediateCrsUse::Never => false,
            IntermediateCrsUse::Always => true,
            IntermediateCrsUse::IfNoDirectTransformation => {
                found.len() < PIVOT_THRESHOLD || std::env::var_os(FORCE_SEARCH_PIVOTS).is_some()
            }
        };
        if search_pivots {
            let through = authority
                .create_from_crs_codes_with_intermediates(
                    &s.codespace,
                    &s.code,
                    &t.codespace,
                    &t.code,
                    alternative_names,
                    discard,
                    self.ctx.intermediate_crs(),
                )
                .unwrap_or_else(|e| {
                    trace!("Authority: {e}");
                    Vec::new()
                });
            debug!("Authority: {} operations from {s} to {t} through intermediate CRS", through.len());
            found.extend(through);
        }
        found
    }

    // ----- D E R I V E D   C R S ------------------------------------------------------

    // The inverse of the deriving conversion, then on from the base CRS
    fn from_derived(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        let (Some(base), Some(conversion)) = (source.base_crs(), source.deriving_conversion()) else {
            return Ok(Vec::new());
        };
        debug!("Derived source: {} (base {})", source.name(), base.name());
        let inverse = match CoordinateOperation::inverse(&conversion) {
            Ok(inverse) => inverse,
            Err(e) => {
                warn!("{}: {e}", conversion.name());
                return Ok(Vec::new());
            }
        };
        if base.id() == target.id() || base.is_equivalent_to(target, Criterion::Equivalent) {
            return Ok(vec![inverse]);
        }
        let onwards = self.operations(base, target)?;
        Ok(chain(&[inverse], &onwards))
    }

    // On to the base CRS, then the deriving conversion
    fn to_derived(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        let (Some(base), Some(conversion)) = (target.base_crs(), target.deriving_conversion()) else {
            return Ok(Vec::new());
        };
        debug!("Derived target: {} (base {})", target.name(), base.name());
        if base.id() == source.id() || base.is_equivalent_to(source, Criterion::Equivalent) {
            return Ok(vec![conversion]);
        }
        let towards = self.operations(source, base)?;
        Ok(chain(&towards, &[conversion]))
    }

    // ----- B O U N D   C R S ----------------------------------------------------------

    fn with_bound(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        if let (Some(bs), Some(bt)) = (source.bound_crs(), target.bound_crs()) {
            if bs.hub.is_equivalent_to(&bt.hub, Criterion::Equivalent) {
                debug!("Bound to bound, through {}", bs.hub.name());
                let hub = bs.hub.clone();
                let first = self.operations(source, &hub)?;
                let second = self.operations(&hub, target)?;
                return Ok(chain(&first, &second));
            }
            return self.operations(&bs.base, &bt.base);
        }

        let Some(bound) = source.bound_crs() else {
            let ops = self.operations(target, source)?;
            return Ok(inverted(ops));
        };

        // A compound CRS is met at the hub
        if target.is_compound() && bound.hub.is_geographic() {
            debug!("Bound to compound, through {}", bound.hub.name());
            let hub = bound.hub.clone();
            let first = self.operations(source, &hub)?;
            let second = self.operations(&hub, target)?;
            return Ok(chain(&first, &second));
        }

        let hub_matches = matches_hub(&bound.hub, target);
        if !hub_matches {
            debug!("Bound source, unwrapped: {}", bound.base.name());
            return self.operations(&bound.base, target);
        }

        debug!("Bound source, through its transformation to {}", bound.hub.name());
        let transformation = bound.transformation.clone();
        if bound.base.is_vertical() {
            if bound.hub.is_equivalent_to(target, Criterion::Equivalent) {
                return Ok(vec![transformation]);
            }
            return self.operations(&bound.base, target);
        }

        let Some(base_geographic) = Crs::extract_geographic_crs(&bound.base) else {
            return self.operations(&bound.base, target);
        };

        // Into the geographic CRS the transformation applies to
        let mut ops = vec![transformation];
        if !base_geographic.is_equivalent_to(&bound.base, Criterion::Equivalent) {
            let into = self.operations(&bound.base, &base_geographic)?;
            ops = chain(&into, &ops);
        }
        // Out of the hub, if it differs from the target (e.g. by dimension)
        if bound.hub.id() != target.id() && !bound.hub.is_equivalent_to(target, Criterion::Equivalent) {
            let out = self.operations(&bound.hub, target)?;
            ops = chain(&ops, &out);
        }
        Ok(ops)
    }

    // ----- C O M P O U N D   C R S ----------------------------------------------------

    fn compound_to_geographic(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        let horizontal = match source.components().first() {
            Some(h) => h.clone(),
            None => return Ok(Vec::new()),
        };
        let vertical = Crs::extract_vertical_crs(source);

        // Heights are lost on the way to a 2D CRS
        let (Some(vertical), 3) = (vertical, target.dimension()) else {
            debug!("Compound to geographic 2D: horizontal part only");
            return self.operations(&horizontal, target);
        };

        debug!("Compound to geographic: {} / {} to {}", horizontal.name(), vertical.name(), target.name());
        let vertical_ops = self.ranked(&vertical, target)?;
        let mut result = Vec::new();
        for vert in vertical_ops.iter() {
            // The geographic CRS the vertical operation is referred to
            let interpolation = vert
                .interpolation_crs()
                .cloned()
                .or_else(|| vert.target_crs().and_then(|t| Crs::extract_geographic_crs(&t)))
                .unwrap_or_else(|| target.clone());
            let interpolation = Crs::promote_to_3d(&interpolation);

            let into = self.ranked(&horizontal, &interpolation)?;
            let out = self.ranked(&interpolation, target)?;
            let (Some(horiz_src), Some(horiz_dst)) = (into.first(), out.first()) else {
                continue;
            };
            match proj_based::create_horiz_vert_horiz(source, target, horiz_src, vert, horiz_dst, &interpolation) {
                Ok(op) => result.push(op),
                Err(e) => trace!("{}: {e}", vert.name()),
            }
        }

        if result.is_empty() {
            debug!("No vertical operation: horizontal part only");
            return self.operations(&horizontal, target);
        }
        Ok(result)
    }

    fn compound_to_compound(&mut self, source: &CrsRef, target: &CrsRef) -> Result<Vec<OperationRef>, Error> {
        let (Some(horiz_src), Some(horiz_dst)) = (source.components().first(), target.components().first()) else {
            return Ok(Vec::new());
        };
        let horizontal_ops = self.ranked(horiz_src, horiz_dst)?;
        let (Some(vert_src), Some(vert_dst)) = (Crs::extract_vertical_crs(source), Crs::extract_vertical_crs(target))
        else {
            return Ok(horizontal_ops);
        };
        debug!("Compound to compound: vertical part {} to {}", vert_src.name(), vert_dst.name());
        let vertical_ops = self.ranked(&vert_src, &vert_dst)?;
        if vertical_ops.is_empty() {
            return Ok(horizontal_ops);
        }

        let mut result = Vec::new();
        for horiz in horizontal_ops.iter() {
            for vert in vertical_ops.iter() {
                match proj_based::create_horiz_vert(source, target, horiz, vert) {
                    Ok(op) => result.push(op),
                    Err(e) => trace!("{} + {}: {e}", horiz.name(), vert.name()),
                }
            }
        }

        if result.is_empty() {
            debug!("No common area of use for the vertical operations: horizontal part only");
            return Ok(horizontal_ops);
        }
        Ok(result)
    }
}

// ----- H E L P E R S -----------------------------------------------------------------

fn both_geodetic(source: &Crs, target: &Crs) -> bool {
    source.geodetic().is_some() && target.geodetic().is_some()
}

/// True if `crs` is derived from `base` directly
fn is_derived_from(crs: &Crs, base: &CrsRef) -> bool {
    crs.base_crs()
        .map_or(false, |b| b.id() == base.id() || b.is_equivalent_to(base, Criterion::Equivalent))
}

/// A 3D hub matches a 2D target of the same definition, and vice versa
fn matches_hub(hub: &CrsRef, target: &CrsRef) -> bool {
    hub.id() == target.id()
        || hub.is_equivalent_to(target, Criterion::Equivalent)
        || Crs::demote_to_2d(hub).is_equivalent_to(&Crs::demote_to_2d(target), Criterion::Equivalent)
}

/// The inverses of `ops`. Operations without inverse are left out
fn inverted(ops: Vec<OperationRef>) -> Vec<OperationRef> {
    ops.iter()
        .filter_map(|op| match CoordinateOperation::inverse(op) {
            Ok(inverse) => Some(inverse),
            Err(e) => {
                warn!("No inverse of {}: {e}", op.name());
                None
            }
        })
        .collect()
}

/// Every operation of `first` followed by every operation of `second`.
/// Combinations without a common area of use are left out
fn chain(first: &[OperationRef], second: &[OperationRef]) -> Vec<OperationRef> {
    let mut result = Vec::with_capacity(first.len() * second.len());
    for a in first {
        for b in second {
            match concatenated::create_compute_metadata(&[a.clone(), b.clone()], true) {
                Ok(op) => result.push(op),
                Err(e) if e.is_invalid_operation() => trace!("{} + {}: {e}", a.name(), b.name()),
                Err(e) => warn!("{} + {}: {e}", a.name(), b.name()),
            }
        }
    }
    result
}
