//! Coordinate operations, as a closed set of variants.
//!
//! Operations are immutable, and shared through reference counted handles
//! ([`OperationRef`]). Source and target CRS are stored as [`CrsLink`]s: strong
//! in general, but weak for the deriving conversion stored inside a projected
//! CRS, whose target is the projected CRS itself.
pub mod concatenated;
pub mod conversion;
pub mod mapping;
pub mod method;
pub mod proj_based;
pub mod transformation;

use crate::authoring::*;
use mapping::epsg;
use once_cell::sync::OnceCell;

pub use proj_based::Composition;
pub use proj_based::ProjBasedOperation;

pub type OperationRef = Arc<CoordinateOperation>;

/// Link from an operation to its source or target CRS
#[derive(Clone, Debug)]
pub enum CrsLink {
    Strong(CrsRef),
    Weak(Weak<Crs>),
}

impl CrsLink {
    /// The CRS, unless it is weakly linked and already dropped
    pub fn get(&self) -> Option<CrsRef> {
        match self {
            CrsLink::Strong(crs) => Some(crs.clone()),
            CrsLink::Weak(crs) => crs.upgrade(),
        }
    }

    fn strong(&self) -> Option<CrsLink> {
        self.get().map(CrsLink::Strong)
    }
}

// ----- S I N G L E   O P E R A T I O N S ---------------------------------------------

/// A method, and the values of its parameters
#[derive(Clone, Debug, PartialEq)]
pub struct SingleOperation {
    pub method: OperationMethod,
    pub values: Vec<OperationParameterValue>,
}

impl SingleOperation {
    /// Fails if the method lists its parameters, and the number of values differ
    pub fn new(
        method: OperationMethod,
        values: Vec<OperationParameterValue>,
    ) -> Result<SingleOperation, Error> {
        if !method.parameters.is_empty() && method.parameters.len() != values.len() {
            return Err(Error::InvalidOperation(format!(
                "{}: {} parameters, but {} values",
                method.name(),
                method.parameters.len(),
                values.len()
            )));
        }
        Ok(SingleOperation { method, values })
    }

    pub fn method_code(&self) -> Option<u32> {
        self.method.epsg_code()
    }

    /// The value of a parameter given by its EPSG code. Parameters given by
    /// name only are found through their well known names
    pub fn value(&self, epsg_code: u32) -> Option<&ParameterValue> {
        self.values
            .iter()
            .find(|v| v.parameter.epsg_code() == Some(epsg_code))
            .map(|v| &v.value)
    }

    pub fn measure(&self, epsg_code: u32) -> Option<&Measure> {
        self.value(epsg_code).and_then(|v| v.measure())
    }

    /// A measure, converted to `unit`
    pub fn value_in(&self, epsg_code: u32, unit: &UnitOfMeasure) -> Option<f64> {
        self.measure(epsg_code).map(|m| m.convert_to_unit(unit))
    }

    /// Names of the grid files used by this operation
    pub fn filenames(&self) -> Vec<String> {
        self.values
            .iter()
            .filter_map(|v| v.value.filename())
            .map(|f| f.to_string())
            .collect()
    }

    pub fn is_equivalent_to(&self, other: &SingleOperation) -> bool {
        if !self.method.is_equivalent_to(&other.method) || self.values.len() != other.values.len() {
            return false;
        }
        self.values.iter().all(|a| {
            other.values.iter().any(|b| {
                a.parameter.is_equivalent_to(&b.parameter) && a.value.is_equivalent_to(&b.value)
            })
        })
    }

    /// The analytical inverse, for the methods having one expressible by the
    /// same method: parameter negation, reciprocal scaling, or plain reversal
    fn inverted(&self) -> Option<SingleOperation> {
        use epsg::*;
        let code = self.method_code()?;
        let values = match code {
            GEOCENTRIC_TRANSLATION_GEOCENTRIC
            | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D
            | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D
            | MOLODENSKY
            | ABRIDGED_MOLODENSKY
            | LONGITUDE_ROTATION
            | GEOGRAPHIC_2D_OFFSETS
            | GEOGRAPHIC_3D_OFFSETS
            | GEOGRAPHIC_2D_WITH_HEIGHT_OFFSETS
            | VERTICAL_OFFSET => self.values.iter().map(negated).collect(),

            CHANGE_VERTICAL_UNIT => {
                let mut values = self.values.clone();
                for v in values.iter_mut() {
                    if let ParameterValue::Measure(m) = &mut v.value {
                        if m.value == 0.0 {
                            return None;
                        }
                        m.value = 1.0 / m.value;
                    }
                }
                values
            }

            GEOGRAPHIC_GEOCENTRIC
            | CHANGE_VERTICAL_UNIT_NO_CONV_FACTOR
            | AXIS_ORDER_REVERSAL_2D
            | AXIS_ORDER_REVERSAL_3D => self.values.clone(),

            _ => return None,
        };
        Some(SingleOperation {
            method: self.method.clone(),
            values,
        })
    }
}

fn negated(value: &OperationParameterValue) -> OperationParameterValue {
    let mut value = value.clone();
    if let ParameterValue::Measure(m) = &mut value.value {
        m.value = -m.value;
    }
    value
}

// ----- T H E   O P E R A T I O N   T Y P E -------------------------------------------

#[derive(Clone, Debug)]
pub enum OperationKind {
    /// Exact, datum preserving (e.g. a map projection)
    Conversion(SingleOperation),
    /// Datum changing, usually approximate, possibly needing grids
    Transformation(SingleOperation),
    /// At least 2 steps, each step's target chaining to the next step's source
    Concatenated(Vec<OperationRef>),
    ProjBased(ProjBasedOperation),
    /// The inverse of a (detached copy of a) conversion without analytical inverse
    InverseConversion(OperationRef),
    /// The inverse of a (detached copy of a) transformation without analytical inverse
    InverseTransformation(OperationRef),
}

#[derive(Debug)]
pub struct CoordinateOperation {
    pub(crate) id: ObjectId,
    pub object: IdentifiedObject,
    source: Option<CrsLink>,
    target: Option<CrsLink>,
    interpolation: Option<CrsRef>,
    version: Option<String>,
    accuracies: Vec<PositionalAccuracy>,
    source_epoch: Option<f64>,
    target_epoch: Option<f64>,
    has_ballpark: bool,
    pub kind: OperationKind,
    inverse_cache: OnceCell<OperationRef>,
    // For inverses: the operation this is the inverse of
    forward: Option<(ObjectId, Weak<CoordinateOperation>)>,
}

/// Clones are detached: they share the identity of the original, but not
/// its cached inverse
impl Clone for CoordinateOperation {
    fn clone(&self) -> Self {
        CoordinateOperation {
            id: self.id,
            object: self.object.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            interpolation: self.interpolation.clone(),
            version: self.version.clone(),
            accuracies: self.accuracies.clone(),
            source_epoch: self.source_epoch,
            target_epoch: self.target_epoch,
            has_ballpark: self.has_ballpark,
            kind: self.kind.clone(),
            inverse_cache: OnceCell::new(),
            forward: self.forward.clone(),
        }
    }
}

impl CoordinateOperation {
    pub(crate) fn assemble(
        object: IdentifiedObject,
        source: Option<CrsRef>,
        target: Option<CrsRef>,
        kind: OperationKind,
    ) -> CoordinateOperation {
        CoordinateOperation {
            id: ObjectId::new(),
            object,
            source: source.map(CrsLink::Strong),
            target: target.map(CrsLink::Strong),
            interpolation: None,
            version: None,
            accuracies: Vec::new(),
            source_epoch: None,
            target_epoch: None,
            has_ballpark: false,
            kind,
            inverse_cache: OnceCell::new(),
            forward: None,
        }
    }

    #[must_use]
    pub fn with_accuracies(mut self, accuracies: &[PositionalAccuracy]) -> CoordinateOperation {
        self.accuracies = accuracies.to_vec();
        self
    }

    #[must_use]
    pub fn with_interpolation_crs(mut self, crs: Option<CrsRef>) -> CoordinateOperation {
        self.interpolation = crs;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> CoordinateOperation {
        self.version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn with_epochs(mut self, source: Option<f64>, target: Option<f64>) -> CoordinateOperation {
        self.source_epoch = source;
        self.target_epoch = target;
        self
    }

    /// Mark as a ballpark operation: one ignoring a datum difference
    #[must_use]
    pub fn with_ballpark(mut self, ballpark: bool) -> CoordinateOperation {
        self.has_ballpark = ballpark;
        self
    }

    /// A copy with new source and target links
    pub fn with_crs_links(&self, source: CrsLink, target: CrsLink) -> CoordinateOperation {
        let mut op = self.clone();
        op.source = Some(source);
        op.target = Some(target);
        op
    }

    /// A copy with weak links upgraded to strong ones
    pub fn with_strong_links(&self) -> CoordinateOperation {
        let mut op = self.clone();
        op.source = self.source.as_ref().and_then(CrsLink::strong);
        op.target = self.target.as_ref().and_then(CrsLink::strong);
        op
    }

    /// A copy with grid file names substituted by `substitute`, where it has an answer
    pub fn with_substituted_grids(&self, substitute: &dyn Fn(&str) -> Option<String>) -> CoordinateOperation {
        let mut op = self.clone();
        op.id = ObjectId::new();
        op.kind = match &self.kind {
            OperationKind::Conversion(s) => OperationKind::Conversion(substituted(s, substitute)),
            OperationKind::Transformation(s) => {
                OperationKind::Transformation(substituted(s, substitute))
            }
            OperationKind::Concatenated(steps) => OperationKind::Concatenated(
                steps
                    .iter()
                    .map(|s| Arc::new(s.with_substituted_grids(substitute)))
                    .collect(),
            ),
            OperationKind::InverseConversion(f) => {
                OperationKind::InverseConversion(Arc::new(f.with_substituted_grids(substitute)))
            }
            OperationKind::InverseTransformation(f) => {
                OperationKind::InverseTransformation(Arc::new(f.with_substituted_grids(substitute)))
            }
            OperationKind::ProjBased(p) => OperationKind::ProjBased(p.clone()),
        };
        op
    }
}

fn substituted(single: &SingleOperation, substitute: &dyn Fn(&str) -> Option<String>) -> SingleOperation {
    let mut single = single.clone();
    for v in single.values.iter_mut() {
        if let ParameterValue::Filename(f) = &v.value {
            if let Some(name) = substitute(f) {
                v.value = ParameterValue::Filename(name);
            }
        }
    }
    single
}

// ----- A C C E S S O R S -------------------------------------------------------------

impl CoordinateOperation {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.object.identifiers
    }

    /// The source CRS. `None` only for the conversion of a projected CRS
    /// which has been dropped, or for a conversion not yet tied to CRS
    pub fn source_crs(&self) -> Option<CrsRef> {
        self.source.as_ref().and_then(CrsLink::get)
    }

    pub fn target_crs(&self) -> Option<CrsRef> {
        self.target.as_ref().and_then(CrsLink::get)
    }

    pub fn interpolation_crs(&self) -> Option<&CrsRef> {
        self.interpolation.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn source_epoch(&self) -> Option<f64> {
        self.source_epoch
    }

    pub fn target_epoch(&self) -> Option<f64> {
        self.target_epoch
    }

    pub fn has_ballpark(&self) -> bool {
        self.has_ballpark
    }

    /// The explicitly stated accuracy, if any
    pub fn accuracies(&self) -> &[PositionalAccuracy] {
        &self.accuracies
    }

    /// Accuracy in metres. `None` means unknown. Unless explicitly stated,
    /// conversions are exact, and concatenations sum the accuracies of their steps
    pub fn accuracy(&self) -> Option<f64> {
        if let Some(accuracy) = self.accuracies.first() {
            return Some(accuracy.0);
        }
        match &self.kind {
            OperationKind::Conversion(_) | OperationKind::InverseConversion(_) => Some(0.0),
            OperationKind::Concatenated(steps) => steps.iter().map(|s| s.accuracy()).sum(),
            OperationKind::InverseTransformation(forward) => forward.accuracy(),
            _ => None,
        }
    }

    /// The extent of the first domain of validity. A concatenation without
    /// one of its own is valid where all of its steps are
    pub fn domain_extent(&self) -> Option<Extent> {
        if let Some(extent) = self.object.extent() {
            return Some(extent.clone());
        }
        let mut extent: Option<Extent> = None;
        for step in self.steps() {
            let Some(step_extent) = step.domain_extent() else {
                continue;
            };
            extent = match extent {
                None => Some(step_extent),
                Some(e) => Some(e.intersection(&step_extent).unwrap_or(e)),
            };
        }
        extent
    }

    pub fn is_conversion(&self) -> bool {
        matches!(
            self.kind,
            OperationKind::Conversion(_) | OperationKind::InverseConversion(_)
        )
    }

    pub fn is_transformation(&self) -> bool {
        matches!(
            self.kind,
            OperationKind::Transformation(_) | OperationKind::InverseTransformation(_)
        )
    }

    pub fn is_concatenated(&self) -> bool {
        matches!(self.kind, OperationKind::Concatenated(_))
    }

    /// Method and parameter values of a conversion or transformation
    pub fn single(&self) -> Option<&SingleOperation> {
        match &self.kind {
            OperationKind::Conversion(s) | OperationKind::Transformation(s) => Some(s),
            _ => None,
        }
    }

    pub fn method(&self) -> Option<&OperationMethod> {
        self.single().map(|s| &s.method)
    }

    /// EPSG code of the method. Inverse wrappers report the method of their forward
    pub fn method_epsg_code(&self) -> Option<u32> {
        match &self.kind {
            OperationKind::Conversion(s) | OperationKind::Transformation(s) => s.method_code(),
            OperationKind::InverseConversion(f) | OperationKind::InverseTransformation(f) => {
                f.method_epsg_code()
            }
            _ => None,
        }
    }

    /// The steps of a concatenated operation. Empty for other kinds
    pub fn steps(&self) -> &[OperationRef] {
        match &self.kind {
            OperationKind::Concatenated(steps) => steps,
            _ => &[],
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps().len().max(1)
    }

    /// Names of the grid files needed, without duplicates, in order of appearance
    pub fn grids_needed(&self) -> Vec<String> {
        let mut grids: Vec<String> = Vec::new();
        let mut add = |names: Vec<String>| {
            for name in names {
                if !grids.contains(&name) {
                    grids.push(name);
                }
            }
        };
        match &self.kind {
            OperationKind::Conversion(s) | OperationKind::Transformation(s) => add(s.filenames()),
            OperationKind::Concatenated(steps) => {
                for step in steps {
                    add(step.grids_needed());
                }
            }
            OperationKind::InverseConversion(f) | OperationKind::InverseTransformation(f) => {
                add(f.grids_needed())
            }
            OperationKind::ProjBased(p) => {
                for op in p.composition.operations() {
                    add(op.grids_needed());
                }
            }
        }
        grids
    }

    /// Same method and parameter values (steps, for concatenations). Names,
    /// identifiers and CRS are not compared
    pub fn is_equivalent_method_and_values(&self, other: &CoordinateOperation) -> bool {
        use OperationKind::*;
        if self.id == other.id {
            return true;
        }
        match (&self.kind, &other.kind) {
            (Conversion(a), Conversion(b)) | (Transformation(a), Transformation(b)) => {
                a.is_equivalent_to(b)
            }
            (Concatenated(a), Concatenated(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.is_equivalent_method_and_values(y))
            }
            (InverseConversion(a), InverseConversion(b))
            | (InverseTransformation(a), InverseTransformation(b)) => {
                a.is_equivalent_method_and_values(b)
            }
            (ProjBased(_), ProjBased(_)) => {
                match (self.export_to_proj_string(), other.export_to_proj_string()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

// ----- I N V E R S E S ---------------------------------------------------------------

impl CoordinateOperation {
    /// The inverse operation. It is computed once, and cached on `op`. The
    /// inverse of the inverse is `op` itself, as long as `op` is alive.
    pub fn inverse(op: &OperationRef) -> Result<OperationRef, Error> {
        if let Some((_, forward)) = &op.forward {
            if let Some(forward) = forward.upgrade() {
                return Ok(forward);
            }
        }
        let inverse = op.inverse_cache.get_or_try_init(|| {
            let mut inverse = op.computed_inverse()?;
            inverse.forward = Some((op.id, Arc::downgrade(op)));
            Ok::<OperationRef, Error>(Arc::new(inverse))
        })?;
        Ok(inverse.clone())
    }

    fn computed_inverse(&self) -> Result<CoordinateOperation, Error> {
        let kind = match &self.kind {
            OperationKind::Conversion(s) => match s.inverted() {
                Some(s) => OperationKind::Conversion(s),
                None => OperationKind::InverseConversion(Arc::new(self.with_strong_links())),
            },
            OperationKind::Transformation(s) => match s.inverted() {
                Some(s) => OperationKind::Transformation(s),
                None => OperationKind::InverseTransformation(Arc::new(self.with_strong_links())),
            },
            OperationKind::Concatenated(steps) => OperationKind::Concatenated(
                steps
                    .iter()
                    .rev()
                    .map(CoordinateOperation::inverse)
                    .collect::<Result<Vec<_>, Error>>()?,
            ),
            OperationKind::ProjBased(p) => OperationKind::ProjBased(p.inverted()),
            OperationKind::InverseConversion(f) | OperationKind::InverseTransformation(f) => {
                return Ok(f.as_ref().clone());
            }
        };

        Ok(CoordinateOperation {
            id: ObjectId::new(),
            object: self.inverse_object(),
            source: self.target.as_ref().and_then(CrsLink::strong),
            target: self.source.as_ref().and_then(CrsLink::strong),
            interpolation: self.interpolation.clone(),
            version: self.version.clone(),
            accuracies: self.accuracies.clone(),
            source_epoch: self.target_epoch,
            target_epoch: self.source_epoch,
            has_ballpark: self.has_ballpark,
            kind,
            inverse_cache: OnceCell::new(),
            forward: None,
        })
    }

    fn inverse_object(&self) -> IdentifiedObject {
        let mut object = self.object.clone();
        object.name = self.inverse_name();
        object.identifiers = self
            .object
            .identifiers
            .iter()
            .map(|id| {
                let codespace = match id
                    .codespace
                    .strip_prefix("INVERSE(")
                    .and_then(|c| c.strip_suffix(')'))
                {
                    Some(forward) => forward.to_string(),
                    None => format!("INVERSE({})", id.codespace),
                };
                Identifier::new(&codespace, &id.code)
            })
            .collect();
        object
    }

    fn inverse_name(&self) -> String {
        let name = self.name();
        if let Some(forward) = name.strip_prefix("Inverse of ") {
            return forward.to_string();
        }
        if let (Some(source), Some(target)) = (self.source_crs(), self.target_crs()) {
            let forward = format!(" from {} to {}", source.name(), target.name());
            if name.contains(&forward) {
                let inverse = format!(" from {} to {}", target.name(), source.name());
                return name.replacen(&forward, &inverse, 1);
            }
        }
        format!("Inverse of {name}")
    }

    /// True if one operation is known to be the inverse of the other
    pub(crate) fn is_inverse_of(&self, other: &CoordinateOperation) -> bool {
        let wraps = |a: &CoordinateOperation, b: &CoordinateOperation| match &a.kind {
            OperationKind::InverseConversion(f) | OperationKind::InverseTransformation(f) => {
                f.id == b.id
            }
            _ => false,
        };
        let inverts = |a: &CoordinateOperation, b: &CoordinateOperation| {
            a.forward.as_ref().map_or(false, |(id, _)| *id == b.id)
        };
        wraps(self, other) || wraps(other, self) || inverts(self, other) || inverts(other, self)
    }
}

// ----- T E S T S ------------------------------------------------------------------
