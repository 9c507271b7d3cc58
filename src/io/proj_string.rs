//! PROJ strings: parsing, pipeline building, and the PROJ rendition of CRS
//! and coordinate operations.
//!
//! Operations are exported as pipelines from the *normalized* source CRS
//! (longitude, latitude in radians, relative to Greenwich; metres elsewhere)
//! to the normalized target CRS, framed by the steps normalizing the source
//! and denormalizing the target.
use super::format_number;
use crate::authoring::*;
use crate::operation::mapping::epsg;
use crate::operation::mapping::method_mapping;
use crate::operation::mapping::MethodMapping;
use crate::operation::transformation::GRAVITY_RELATED_HEIGHT_TO_GEOGRAPHIC_3D;
use crate::operation::Composition;
use crate::operation::ProjBasedOperation;
use std::fmt;

type Params = Vec<(String, Option<String>)>;

// ----- S T E P S   A N D   P I P E L I N E S -----------------------------------------

/// A single `+proj=...` step
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub name: String,
    pub inverted: bool,
    pub params: Params,
}

impl Step {
    pub fn new(name: &str) -> Step {
        Step {
            name: name.to_string(),
            inverted: false,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Step {
        self.params.push((key.to_string(), Some(value.to_string())));
        self
    }

    #[must_use]
    pub fn with_number(self, key: &str, value: f64) -> Step {
        self.with(key, &format_number(value))
    }

    #[must_use]
    pub fn flag(mut self, key: &str) -> Step {
        self.params.push((key.to_string(), None));
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Step {
        self.params.extend(params);
        self
    }

    #[must_use]
    pub fn inv(mut self) -> Step {
        self.inverted = !self.inverted;
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn with_keys_swapped(&self, pairs: &[(&str, &str)]) -> Step {
        let mut step = self.clone();
        for (key, _) in step.params.iter_mut() {
            for (a, b) in pairs {
                if key == a {
                    *key = b.to_string();
                } else if key == b {
                    *key = a.to_string();
                }
            }
        }
        step
    }

    /// The step undoing this one. Unit conversions and stack operations are
    /// inverted by swapping their parameters, everything else by `+inv`
    pub fn inverse(&self) -> Step {
        match self.name.as_str() {
            "axisswap" if self.param("order") == Some("2,1") => self.clone(),
            "unitconvert" => self.with_keys_swapped(&[("xy_in", "xy_out"), ("z_in", "z_out")]),
            "push" | "pop" => {
                let mut step = self.clone();
                step.name = if self.name == "push" { "pop" } else { "push" }.to_string();
                step
            }
            _ => self.with_keys_swapped(&[("omit_fwd", "omit_inv")]).inv(),
        }
    }

    fn same_params(&self, other: &Step) -> bool {
        self.params.len() == other.params.len()
            && self.params.iter().all(|p| other.params.contains(p))
    }

    pub fn is_inverse_of(&self, other: &Step) -> bool {
        let inverse = self.inverse();
        inverse.name == other.name && inverse.inverted == other.inverted && inverse.same_params(other)
    }
}

fn render_params(params: &[(String, Option<String>)]) -> String {
    params
        .iter()
        .map(|(key, value)| match value {
            Some(value) => format!("+{key}={value}"),
            None => format!("+{key}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "+inv ")?;
        }
        write!(f, "+proj={}", self.name)?;
        if !self.params.is_empty() {
            write!(f, " {}", render_params(&self.params))?;
        }
        Ok(())
    }
}

/// A sequence of steps. Pushing a step which is the inverse of the last one
/// removes both
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: Step) {
        if let Some(last) = self.steps.last() {
            if last.is_inverse_of(&step) {
                self.steps.pop();
                return;
            }
        }
        self.steps.push(step);
    }

    pub fn append(&mut self, other: Pipeline) {
        for step in other.steps {
            self.push(step);
        }
    }

    #[must_use]
    pub fn inverse(&self) -> Pipeline {
        Pipeline {
            steps: self.steps.iter().rev().map(Step::inverse).collect(),
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.steps.as_slice() {
            [] => write!(f, "+proj=noop"),
            [step] if !step.inverted => write!(f, "{step}"),
            steps => {
                write!(f, "+proj=pipeline")?;
                for step in steps {
                    write!(f, " +step {step}")?;
                }
                Ok(())
            }
        }
    }
}

// ----- P A R S I N G -----------------------------------------------------------------

// Collapse whitespace, and glue `key = value` into `key=value`
fn normalize_whitespace(text: &str) -> String {
    let elements: Vec<_> = text.split_whitespace().collect();
    elements
        .join(" ")
        .replace("= ", "=")
        .replace(" =", "=")
        .replace(", ", ",")
        .replace(" ,", ",")
}

/// Parse a PROJ string (a single operation, or a pipeline) into its steps.
/// Pipeline globals are distributed into each step, and an inverted pipeline
/// is resolved into inverted steps in reverse order. Init files and nested
/// pipelines are not supported.
pub fn parse(definition: &str) -> Result<Pipeline, Error> {
    // Impose some line ending sanity and remove the PROJ '+' prefix
    let all = definition
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace(" +", " ")
        .replace("\n+", " ")
        .trim()
        .trim_start_matches('+')
        .to_string();

    // Drop comments
    let mut trimmed = String::new();
    for line in all.lines() {
        let content = line.split('#').next().unwrap_or_default();
        trimmed += " ";
        trimmed += content.trim();
    }

    // Make sure we do not match "step" as part of a word
    let trimmed = " ".to_string() + &normalize_whitespace(&trimmed) + " ";
    let chunks: Vec<&str> = trimmed
        .split(" step ")
        .map(|x| x.trim().trim_start_matches("step ").trim())
        .filter(|x| !x.is_empty() && *x != "step")
        .collect();

    let mut pipeline = Pipeline::new();
    let mut globals: Params = Vec::new();
    let mut pipeline_is_inverted = false;

    for (index, chunk) in chunks.iter().enumerate() {
        let elements: Vec<&str> = chunk.split_whitespace().collect();
        if elements.iter().any(|e| e.starts_with("init=")) {
            return Err(Error::Unsupported(format!("PROJ init clauses: {chunk}")));
        }
        let Some(name) = elements.iter().find_map(|e| e.strip_prefix("proj=")) else {
            return Err(Error::MissingParam(format!("proj, in '{chunk}'")));
        };
        let params: Params = elements
            .iter()
            .filter(|e| !e.starts_with("proj=") && **e != "inv")
            .map(|e| match e.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (e.to_string(), None),
            })
            .collect();
        let inverted = elements.contains(&"inv");

        if name == "pipeline" {
            if index != 0 {
                return Err(Error::Unsupported(format!("nested pipelines: {definition}")));
            }
            // 'inv' among the globals inverts the entire pipeline, not each step
            pipeline_is_inverted = inverted;
            globals = params;
            continue;
        }
        if name.is_empty() {
            continue;
        }

        let mut step = Step::new(name);
        step.inverted = inverted;
        step.params = globals.clone();
        step.params.extend(params);
        pipeline.steps.push(step);
    }

    if pipeline_is_inverted {
        pipeline = pipeline.inverse();
    }
    Ok(pipeline)
}

// ----- N O R M A L I Z A T I O N -----------------------------------------------------

fn unit_name(unit: &UnitOfMeasure) -> String {
    match unit.proj_name() {
        Some(name) => name.to_string(),
        None => super::format_significant(unit.conversion_to_si()),
    }
}

// Axis order, and units: radians for angles, metres for lengths
fn cs_normalization(cs: &CoordinateSystem) -> Pipeline {
    let mut p = Pipeline::new();
    if cs.is_northing_first() {
        p.push(Step::new("axisswap").with("order", "2,1"));
    }

    let mut step = Step::new("unitconvert");
    if cs.kind != CsKind::Vertical {
        let unit = cs.horizontal_unit();
        let canonical = if cs.kind == CsKind::Ellipsoidal { unit::RADIAN } else { unit::METRE };
        if unit != canonical {
            let out = if cs.kind == CsKind::Ellipsoidal { "rad" } else { "m" };
            step = step.with("xy_in", &unit_name(&unit)).with("xy_out", out);
        }
    }
    if let Some(unit) = cs.vertical_unit() {
        if unit != unit::METRE {
            step = step.with("z_in", &unit_name(&unit)).with("z_out", "m");
        }
    }
    if !step.params.is_empty() {
        p.push(step);
    }
    p
}

/// The steps taking coordinates of `crs` to their normalized form
pub(crate) fn normalize(crs: &Crs) -> Result<Pipeline, Error> {
    let mut p = Pipeline::new();
    match &crs.kind {
        CrsKind::Geographic(g) => {
            p.append(cs_normalization(&g.cs));
            let pm = g.prime_meridian();
            if pm.longitude_degrees() != 0.0 {
                let step = Step::new("longlat")
                    .with_params(g.ellipsoid().proj_params())
                    .with("pm", &pm.proj_value());
                p.push(step.inv());
            }
        }
        CrsKind::Geocentric(_) => {}
        CrsKind::Vertical(v) => p.append(cs_normalization(&v.cs)),
        CrsKind::Projected(d) | CrsKind::Derived(d) => {
            p.append(cs_normalization(&d.cs));
            let single = d.conversion.single().ok_or_else(|| {
                Error::Formatting(format!("{}: deriving conversion is not a single operation", crs.name()))
            })?;
            let geog = Crs::extract_geographic_crs(&d.base);
            p.push(projection_step(single, geog.as_deref())?.inverse());
        }
        CrsKind::Compound(components) => {
            for component in components {
                p.append(horizontal_normalization(component)?);
                if component.is_vertical() {
                    p.append(normalize(component)?);
                }
            }
        }
        CrsKind::Bound(b) => p.append(normalize(&b.base)?),
    }
    Ok(p)
}

pub(crate) fn denormalize(crs: &Crs) -> Result<Pipeline, Error> {
    Ok(normalize(crs)?.inverse())
}

// Normalization of the horizontal part only
fn horizontal_normalization(crs: &CrsRef) -> Result<Pipeline, Error> {
    match &crs.kind {
        CrsKind::Vertical(_) => Ok(Pipeline::new()),
        CrsKind::Geographic(_) => normalize(&Crs::demote_to_2d(crs)),
        CrsKind::Compound(components) => {
            let mut p = Pipeline::new();
            for component in components {
                p.append(horizontal_normalization(component)?);
            }
            Ok(p)
        }
        _ => normalize(crs),
    }
}

// ----- S I N G L E   O P E R A T I O N S ---------------------------------------------

/// The projection step of a map projection conversion, including the
/// ellipsoid and prime meridian of its base CRS, when known
fn projection_step(single: &SingleOperation, geog: Option<&Crs>) -> Result<Step, Error> {
    let mapping = method_mapping(&single.method)
        .ok_or_else(|| Error::Formatting(format!("no PROJ mapping for method {}", single.method.name())))?;

    let mut step = match single.utm_zone() {
        Some((zone, north)) => {
            let step = Step::new("utm").with("zone", &zone.to_string());
            if north {
                step
            } else {
                step.flag("south")
            }
        }
        None => projection_parameters(single, mapping)?,
    };

    if let Some(g) = geog.and_then(|g| g.geodetic()) {
        step = step.with_params(g.ellipsoid().proj_params());
        let pm = g.prime_meridian();
        if pm.longitude_degrees() != 0.0 {
            step = step.with("pm", &pm.proj_value());
        }
    }
    Ok(step)
}

fn projection_parameters(single: &SingleOperation, mapping: &MethodMapping) -> Result<Step, Error> {
    let name = mapping
        .proj_name
        .ok_or_else(|| Error::Formatting(format!("{} has no PROJ equivalent", mapping.epsg_name)))?;
    let mut step = Step::new(name);
    for aux in mapping.proj_aux {
        step = match aux.split_once('=') {
            Some((key, value)) => step.with(key, value),
            None => step.flag(aux),
        };
    }

    if mapping.epsg_code == epsg::POLAR_STEREOGRAPHIC_VARIANT_B {
        let lat_ts = single
            .value_in(epsg::LATITUDE_STD_PARALLEL, &unit::DEGREE)
            .ok_or_else(|| Error::MissingParam("Latitude of standard parallel".to_string()))?;
        step = step.with_number("lat_0", if lat_ts < 0.0 { -90.0 } else { 90.0 });
    }

    for param in mapping.params {
        let Some(proj_name) = param.proj_name else {
            continue;
        };
        let unit = match param.kind {
            UnitType::Angular => unit::DEGREE,
            UnitType::Scale => unit::UNITY,
            _ => unit::METRE,
        };
        let value = single
            .value_in(param.epsg_code, &unit)
            .ok_or_else(|| Error::MissingParam(param.epsg_name.to_string()))?;
        step = step.with_number(proj_name, value);
    }
    Ok(step)
}

fn ellipsoid_params(crs: &Crs) -> Result<Params, Error> {
    match crs.geodetic() {
        Some(g) => Ok(g.ellipsoid().proj_params()),
        None => Err(Error::Formatting(format!("{}: not a geodetic CRS", crs.name()))),
    }
}

fn required(single: &SingleOperation, code: u32, unit: &UnitOfMeasure) -> Result<f64, Error> {
    single
        .value_in(code, unit)
        .ok_or_else(|| Error::MissingParam(format!("EPSG:{code} of {}", single.method.name())))
}

// A rate of change per year, in `unit` per year
fn rate(single: &SingleOperation, code: u32, unit: &UnitOfMeasure) -> Result<f64, Error> {
    let measure = single
        .measure(code)
        .ok_or_else(|| Error::MissingParam(format!("EPSG:{code} of {}", single.method.name())))?;
    Ok(measure.si_value() * unit::YEAR.conversion_to_si() / unit.conversion_to_si())
}

fn first_grid(single: &SingleOperation) -> Result<String, Error> {
    single
        .filenames()
        .into_iter()
        .next()
        .ok_or_else(|| Error::MissingParam(format!("grid file of {}", single.method.name())))
}

fn helmert_step(single: &SingleOperation, code: u32) -> Result<Step, Error> {
    use epsg::*;
    let mut step = Step::new("helmert")
        .with_number("x", required(single, X_AXIS_TRANSLATION, &unit::METRE)?)
        .with_number("y", required(single, Y_AXIS_TRANSLATION, &unit::METRE)?)
        .with_number("z", required(single, Z_AXIS_TRANSLATION, &unit::METRE)?);
    if matches!(
        code,
        GEOCENTRIC_TRANSLATION_GEOCENTRIC | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D
    ) {
        return Ok(step);
    }

    step = step
        .with_number("rx", required(single, X_AXIS_ROTATION, &unit::ARC_SECOND)?)
        .with_number("ry", required(single, Y_AXIS_ROTATION, &unit::ARC_SECOND)?)
        .with_number("rz", required(single, Z_AXIS_ROTATION, &unit::ARC_SECOND)?)
        .with_number("s", required(single, SCALE_DIFFERENCE, &unit::PARTS_PER_MILLION)?);

    let time_dependent = (TIME_DEPENDENT_POSITION_VECTOR_GEOCENTRIC..=TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_3D)
        .contains(&code);
    if time_dependent {
        step = step
            .with_number("dx", rate(single, RATE_X_AXIS_TRANSLATION, &unit::METRE)?)
            .with_number("dy", rate(single, RATE_Y_AXIS_TRANSLATION, &unit::METRE)?)
            .with_number("dz", rate(single, RATE_Z_AXIS_TRANSLATION, &unit::METRE)?)
            .with_number("drx", rate(single, RATE_X_AXIS_ROTATION, &unit::ARC_SECOND)?)
            .with_number("dry", rate(single, RATE_Y_AXIS_ROTATION, &unit::ARC_SECOND)?)
            .with_number("drz", rate(single, RATE_Z_AXIS_ROTATION, &unit::ARC_SECOND)?)
            .with_number("ds", rate(single, RATE_SCALE_DIFFERENCE, &unit::PARTS_PER_MILLION)?)
            .with_number("t_epoch", required(single, REFERENCE_EPOCH, &unit::YEAR)?);
    }

    let position_vector = matches!(
        code,
        POSITION_VECTOR_GEOCENTRIC
            | POSITION_VECTOR_GEOGRAPHIC_2D
            | POSITION_VECTOR_GEOGRAPHIC_3D
            | TIME_DEPENDENT_POSITION_VECTOR_GEOCENTRIC
            | TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_2D
            | TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_3D
    );
    let convention = if position_vector { "position_vector" } else { "coordinate_frame" };
    Ok(step.with("convention", convention))
}

pub(crate) fn is_helmert(code: u32) -> bool {
    use epsg::*;
    matches!(
        code,
        COORDINATE_FRAME_GEOCENTRIC
            | COORDINATE_FRAME_GEOGRAPHIC_2D
            | COORDINATE_FRAME_GEOGRAPHIC_3D
            | POSITION_VECTOR_GEOCENTRIC
            | POSITION_VECTOR_GEOGRAPHIC_2D
            | POSITION_VECTOR_GEOGRAPHIC_3D
            | GEOCENTRIC_TRANSLATION_GEOCENTRIC
            | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D
            | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D
    ) || (TIME_DEPENDENT_POSITION_VECTOR_GEOCENTRIC..=TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_3D).contains(&code)
}

fn vertical_unit_steps(single: &SingleOperation) -> Result<Pipeline, Error> {
    let mut p = Pipeline::new();
    let factor = required(single, epsg::UNIT_CONVERSION_SCALAR, &unit::UNITY)?;
    if factor != 1.0 {
        p.push(Step::new("affine").with_number("s33", factor));
    }
    Ok(p)
}

/// The method specific steps, operating on normalized coordinates
fn method_steps(single: &SingleOperation, source: &Crs, target: &Crs) -> Result<Pipeline, Error> {
    use epsg::*;
    let mut p = Pipeline::new();
    let code = single.method_code();

    let Some(code) = code else {
        if is_equivalent_name(single.method.name(), GRAVITY_RELATED_HEIGHT_TO_GEOGRAPHIC_3D) {
            let step = Step::new("vgridshift")
                .with("grids", &first_grid(single)?)
                .with("multiplier", "1");
            p.push(step);
            return Ok(p);
        }
        return Err(Error::Formatting(format!("no PROJ string for method {}", single.method.name())));
    };

    match code {
        GEOGRAPHIC_GEOCENTRIC => {
            if source.is_geocentric() {
                p.push(Step::new("cart").with_params(ellipsoid_params(target)?).inv());
            } else {
                p.push(Step::new("cart").with_params(ellipsoid_params(source)?));
            }
        }

        CHANGE_VERTICAL_UNIT => p.append(vertical_unit_steps(single)?),

        CHANGE_VERTICAL_UNIT_NO_CONV_FACTOR | AXIS_ORDER_REVERSAL_2D | AXIS_ORDER_REVERSAL_3D => {}

        LONGITUDE_ROTATION => {
            let offset = required(single, LONGITUDE_OFFSET, &unit::DEGREE)?;
            // The prime meridians of the CRS take care of the expected rotation
            let pm = |crs: &Crs| crs.geodetic().map_or(0.0, |g| g.prime_meridian().longitude_degrees());
            let residual = offset - (pm(source) - pm(target));
            if residual.abs() > 1e-10 {
                p.push(Step::new("geogoffset").with_number("dlon", residual * 3600.0));
            }
        }

        _ if is_helmert(code) => {
            let helmert = helmert_step(single, code)?;
            if source.is_geocentric() && target.is_geocentric() {
                p.push(helmert);
                return Ok(p);
            }
            let two_d = source.dimension() == 2 || target.dimension() == 2;
            if two_d {
                p.push(Step::new("push").flag("v_3"));
            }
            p.push(Step::new("cart").with_params(ellipsoid_params(source)?));
            p.push(helmert);
            p.push(Step::new("cart").with_params(ellipsoid_params(target)?).inv());
            if two_d {
                p.push(Step::new("pop").flag("v_3"));
            }
        }

        MOLODENSKY | ABRIDGED_MOLODENSKY => {
            let mut step = Step::new("molodensky")
                .with_params(ellipsoid_params(source)?)
                .with_number("dx", required(single, X_AXIS_TRANSLATION, &unit::METRE)?)
                .with_number("dy", required(single, Y_AXIS_TRANSLATION, &unit::METRE)?)
                .with_number("dz", required(single, Z_AXIS_TRANSLATION, &unit::METRE)?)
                .with_number("da", required(single, SEMI_MAJOR_AXIS_DIFFERENCE, &unit::METRE)?)
                .with_number("df", required(single, FLATTENING_DIFFERENCE, &unit::UNITY)?);
            if code == ABRIDGED_MOLODENSKY {
                step = step.flag("abridged");
            }
            p.push(step);
        }

        GEOGRAPHIC_2D_OFFSETS | GEOGRAPHIC_3D_OFFSETS | GEOGRAPHIC_2D_WITH_HEIGHT_OFFSETS | VERTICAL_OFFSET => {
            let offsets = [
                ("dlat", single.value_in(LATITUDE_OFFSET, &unit::ARC_SECOND)),
                ("dlon", single.value_in(LONGITUDE_OFFSET, &unit::ARC_SECOND)),
                ("dh", single.value_in(VERTICAL_OFFSET_PARAM, &unit::METRE)),
                ("dh", single.value_in(GEOID_UNDULATION, &unit::METRE)),
            ];
            let mut step = Step::new("geogoffset");
            for (key, value) in offsets {
                if let Some(value) = value {
                    if value != 0.0 {
                        step = step.with_number(key, value);
                    }
                }
            }
            if !step.params.is_empty() {
                p.push(step);
            }
        }

        NTV1 | NTV2 | NADCON => {
            p.push(Step::new("hgridshift").with("grids", &first_grid(single)?));
        }

        VERTCON => {
            let step = Step::new("vgridshift")
                .with("grids", &first_grid(single)?)
                .with("multiplier", "0.001");
            p.push(step);
        }

        GEOGRAPHIC_3D_TO_GRAVITY_RELATED_HEIGHT_EGM | GEOGRAPHIC_3D_TO_GRAVITY_RELATED_HEIGHT_EGM2008 => {
            let step = Step::new("vgridshift")
                .with("grids", &first_grid(single)?)
                .with("multiplier", "1");
            p.push(step.inv());
        }

        _ => {
            return Err(Error::Formatting(format!(
                "no PROJ string for method {} (EPSG:{code})",
                single.method.name()
            )))
        }
    }
    Ok(p)
}

// Normalization of a geographic CRS used for the horizontal coordinates of a
// vertical CRS: the 2D geographic part, and the vertical axis
fn mixed_normalization(horizontal: &CrsRef, vertical: &Crs) -> Result<Pipeline, Error> {
    let mut p = horizontal_normalization(horizontal)?;
    p.append(normalize(vertical)?);
    Ok(p)
}

fn single_pipeline(op: &CoordinateOperation, single: &SingleOperation) -> Result<Pipeline, Error> {
    let source = op.source_crs();
    let target = op.target_crs();

    // Map projections
    if method_mapping(&single.method).is_some() {
        let mut p = Pipeline::new();
        let geog = source.as_ref().and_then(Crs::extract_geographic_crs);
        if let Some(source) = &source {
            p.append(normalize(source)?);
        }
        p.push(projection_step(single, geog.as_deref())?);
        if let Some(target) = &target {
            match &target.kind {
                CrsKind::Projected(d) | CrsKind::Derived(d) => p.append(cs_normalization(&d.cs).inverse()),
                _ => p.append(denormalize(target)?),
            }
        }
        return Ok(p);
    }

    let (Some(source), Some(target)) = (source, target) else {
        return match single.method_code() {
            Some(epsg::AXIS_ORDER_REVERSAL_2D) | Some(epsg::AXIS_ORDER_REVERSAL_3D) => {
                let mut p = Pipeline::new();
                p.push(Step::new("axisswap").with("order", "2,1"));
                Ok(p)
            }
            Some(epsg::CHANGE_VERTICAL_UNIT) => vertical_unit_steps(single),
            _ => Err(Error::Formatting(format!(
                "{}: a PROJ string needs the source and target CRS",
                op.name()
            ))),
        };
    };

    let mut p = Pipeline::new();
    if single.method_code() == Some(epsg::CHANGE_VERTICAL_UNIT) {
        p.append(horizontal_normalization(&source)?);
        p.append(method_steps(single, &source, &target)?);
        p.append(horizontal_normalization(&target)?.inverse());
        return Ok(p);
    }

    let interpolation = op.interpolation_crs().cloned();
    match (source.is_vertical(), target.is_vertical()) {
        (false, true) => {
            let horizontal = interpolation.unwrap_or_else(|| source.clone());
            p.append(normalize(&source)?);
            p.append(method_steps(single, &source, &target)?);
            p.append(mixed_normalization(&horizontal, &target)?.inverse());
        }
        (true, false) => {
            let horizontal = interpolation.unwrap_or_else(|| target.clone());
            p.append(mixed_normalization(&horizontal, &source)?);
            p.append(method_steps(single, &source, &target)?);
            p.append(denormalize(&target)?);
        }
        _ => {
            p.append(normalize(&source)?);
            p.append(method_steps(single, &source, &target)?);
            p.append(denormalize(&target)?);
        }
    }
    Ok(p)
}

fn proj_based_pipeline(op: &CoordinateOperation, proj: &ProjBasedOperation) -> Result<Pipeline, Error> {
    let endpoints = || match (op.source_crs(), op.target_crs()) {
        (Some(source), Some(target)) => Ok((source, target)),
        _ => Err(Error::Formatting(format!("{}: missing source or target CRS", op.name()))),
    };

    // The source and target CRS of an inverted operation are already swapped,
    // while the composition still runs forwards
    let forward_endpoints = || -> Result<(CrsRef, CrsRef), Error> {
        let (source, target) = endpoints()?;
        Ok(if proj.inverted { (target, source) } else { (source, target) })
    };

    let p = match &proj.composition {
        Composition::Text(text) => parse(text)?,
        Composition::GeodToGeod => {
            let (source, target) = forward_endpoints()?;
            let mut p = normalize(&source)?;
            let two_d = source.is_geographic()
                && target.is_geographic()
                && (source.dimension() == 2 || target.dimension() == 2);
            if two_d {
                p.push(Step::new("push").flag("v_3"));
            }
            if !source.is_geocentric() {
                p.push(Step::new("cart").with_params(ellipsoid_params(&source)?));
            }
            if !target.is_geocentric() {
                p.push(Step::new("cart").with_params(ellipsoid_params(&target)?).inv());
            }
            if two_d {
                p.push(Step::new("pop").flag("v_3"));
            }
            p.append(denormalize(&target)?);
            p
        }
        Composition::HorizVert { horiz, vert } => {
            let mut p = operation_pipeline(horiz)?;
            let frame = match horiz.target_crs() {
                Some(crs) => horizontal_normalization(&crs)?,
                None => Pipeline::new(),
            };
            p.append(frame.clone());
            p.append(operation_pipeline(vert)?);
            p.append(frame.inverse());
            p
        }
        Composition::HorizVertHoriz {
            horiz_src,
            vert,
            horiz_dst,
            ..
        } => {
            let mut p = operation_pipeline(horiz_src)?;
            p.append(operation_pipeline(vert)?);
            p.append(operation_pipeline(horiz_dst)?);
            p
        }
    };

    Ok(if proj.inverted { p.inverse() } else { p })
}

/// The PROJ pipeline of an operation
pub(crate) fn operation_pipeline(op: &CoordinateOperation) -> Result<Pipeline, Error> {
    match &op.kind {
        OperationKind::Conversion(single) | OperationKind::Transformation(single) => single_pipeline(op, single),
        OperationKind::Concatenated(steps) => {
            let mut p = Pipeline::new();
            for step in steps {
                p.append(operation_pipeline(step)?);
            }
            Ok(p)
        }
        OperationKind::InverseConversion(forward) | OperationKind::InverseTransformation(forward) => {
            Ok(operation_pipeline(forward)?.inverse())
        }
        OperationKind::ProjBased(proj) => proj_based_pipeline(op, proj),
    }
}

// ----- C R S   D E F I N I T I O N S -------------------------------------------------

// The TOWGS84 values of a bound CRS: translations, and position vector
// rotations and scale
pub(crate) fn towgs84(transformation: &CoordinateOperation) -> Result<Vec<f64>, Error> {
    use epsg::*;
    let single = transformation
        .single()
        .ok_or_else(|| Error::Formatting(format!("{}: not a Helmert transformation", transformation.name())))?;
    let code = single.method_code().unwrap_or_default();
    let mut values = vec![
        required(single, X_AXIS_TRANSLATION, &unit::METRE)?,
        required(single, Y_AXIS_TRANSLATION, &unit::METRE)?,
        required(single, Z_AXIS_TRANSLATION, &unit::METRE)?,
    ];
    let sign = match code {
        GEOCENTRIC_TRANSLATION_GEOCENTRIC | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D | GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D => {
            return Ok(values)
        }
        POSITION_VECTOR_GEOCENTRIC | POSITION_VECTOR_GEOGRAPHIC_2D | POSITION_VECTOR_GEOGRAPHIC_3D => 1.0,
        COORDINATE_FRAME_GEOCENTRIC | COORDINATE_FRAME_GEOGRAPHIC_2D | COORDINATE_FRAME_GEOGRAPHIC_3D => -1.0,
        _ => {
            return Err(Error::Formatting(format!(
                "{}: no TOWGS84 equivalent",
                transformation.name()
            )))
        }
    };
    for code in [X_AXIS_ROTATION, Y_AXIS_ROTATION, Z_AXIS_ROTATION] {
        values.push(sign * required(single, code, &unit::ARC_SECOND)?);
    }
    values.push(required(single, SCALE_DIFFERENCE, &unit::PARTS_PER_MILLION)?);
    Ok(values)
}

// The parameters of a CRS definition, `proj` first, without the trailing
// `+no_defs +type=crs`
fn crs_params(crs: &Crs) -> Result<Params, Error> {
    let proj = |name: &str| ("proj".to_string(), Some(name.to_string()));
    let mut params = Vec::new();
    match &crs.kind {
        CrsKind::Geographic(g) | CrsKind::Geocentric(g) => {
            params.push(proj(if crs.is_geographic() { "longlat" } else { "geocent" }));
            params.extend(g.ellipsoid().proj_params());
            let pm = g.prime_meridian();
            if pm.longitude_degrees() != 0.0 {
                params.push(("pm".to_string(), Some(pm.proj_value())));
            }
            if crs.is_geocentric() {
                params.push(("units".to_string(), Some("m".to_string())));
            }
        }
        CrsKind::Projected(d) | CrsKind::Derived(d) => {
            let single = d
                .conversion
                .single()
                .ok_or_else(|| Error::Formatting(format!("{}: no PROJ equivalent", crs.name())))?;
            let geog = Crs::extract_geographic_crs(&d.base);
            let step = projection_step(single, geog.as_deref())?;
            params.push(proj(&step.name));
            params.extend(step.params);
            let unit = d.cs.horizontal_unit();
            match unit.proj_name() {
                Some(name) => params.push(("units".to_string(), Some(name.to_string()))),
                None => params.push(("to_meter".to_string(), Some(format_number(unit.conversion_to_si())))),
            }
        }
        CrsKind::Vertical(v) => {
            let unit = v.cs.vertical_unit().unwrap_or(unit::METRE);
            params.push(("vunits".to_string(), Some(unit_name(&unit))));
        }
        CrsKind::Compound(components) => {
            for component in components {
                params.extend(crs_params(component)?);
            }
        }
        CrsKind::Bound(b) => {
            params.extend(crs_params(&b.base)?);
            let values: Vec<String> = towgs84(&b.transformation)?.into_iter().map(format_number).collect();
            params.push(("towgs84".to_string(), Some(values.join(","))));
        }
    }
    Ok(params)
}

/// The `+type=crs` PROJ string of a CRS
pub(crate) fn crs_definition(crs: &Crs) -> Result<String, Error> {
    let mut params = crs_params(crs)?;
    params.push(("no_defs".to_string(), None));
    params.push(("type".to_string(), Some("crs".to_string())));
    Ok(render_params(&params))
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;
    use crate::operation::conversion;
    use crate::operation::proj_based;
    use crate::operation::transformation;

    #[test]
    fn parsing() -> Result<(), Error> {
        let p = parse("+proj=utm +zone=32 +ellps=GRS80")?;
        assert_eq!(p.steps().len(), 1);
        assert_eq!(p.steps()[0].name, "utm");
        assert_eq!(p.steps()[0].param("zone"), Some("32"));
        assert_eq!(p.to_string(), "+proj=utm +zone=32 +ellps=GRS80");

        // Pipeline globals are distributed into the steps
        let p = parse("+proj=pipeline +ellps=GRS80 +step +proj=cart +step +inv +proj=cart")?;
        assert_eq!(p.steps().len(), 2);
        assert_eq!(p.steps()[1].param("ellps"), Some("GRS80"));
        assert!(p.steps()[1].inverted);

        // An inverted pipeline is resolved into inverted steps, in reverse order,
        // with swapped directional omissions
        let p = parse("proj=pipeline inv step omit_fwd proj=utm zone=32 step omit_inv proj=utm zone=33")?;
        assert_eq!(p.to_string(), "+proj=pipeline +step +inv +proj=utm +omit_fwd +zone=33 +step +inv +proj=utm +omit_inv +zone=32");

        // Whitespace around '=' and comments are tolerated
        let p = parse("proj = utm  zone = 32 # UTM zone 32\n")?;
        assert_eq!(p.to_string(), "+proj=utm +zone=32");

        assert!(matches!(parse("+init=epsg:25832"), Err(Error::Unsupported(_))));
        assert!(matches!(
            parse("proj=pipeline step proj=pipeline step proj=utm zone=32"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(parse("+zone=32"), Err(Error::MissingParam(_))));
        assert_eq!(parse("")?.to_string(), "+proj=noop");
        Ok(())
    }

    #[test]
    fn cancellation() {
        let mut p = Pipeline::new();
        p.push(Step::new("unitconvert").with("xy_in", "deg").with("xy_out", "rad"));
        p.push(Step::new("unitconvert").with("xy_in", "rad").with("xy_out", "deg"));
        assert!(p.is_empty());

        p.push(Step::new("cart").with("ellps", "GRS80"));
        p.push(Step::new("cart").with("ellps", "GRS80").inv());
        assert!(p.is_empty());

        p.push(Step::new("cart").with("ellps", "GRS80"));
        p.push(Step::new("cart").with("ellps", "WGS84").inv());
        assert_eq!(p.steps().len(), 2);

        let swap = Step::new("axisswap").with("order", "2,1");
        assert!(swap.is_inverse_of(&swap));
        assert!(Step::new("push").flag("v_3").is_inverse_of(&Step::new("pop").flag("v_3")));
    }

    #[test]
    fn projections() -> Result<(), Error> {
        let utm = builtin::utm(31, true)?;
        let conversion = utm.deriving_conversion().unwrap();
        assert_eq!(
            conversion.export_to_proj_string()?,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step +proj=unitconvert +xy_in=deg +xy_out=rad +step +proj=utm +zone=31 +ellps=WGS84"
        );

        // Without CRS, the projection step only
        let bare = conversion::create_utm(IdentifiedObject::default(), 32, false)?;
        assert_eq!(bare.export_to_proj_string()?, "+proj=utm +zone=32 +south");

        let tm = conversion::create_transverse_mercator(
            IdentifiedObject::named("TM"),
            0.0,
            9.0,
            0.9996,
            200000.0,
            0.0,
        )?;
        assert_eq!(
            tm.export_to_proj_string()?,
            "+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=200000 +y_0=0"
        );

        let inv = CoordinateOperation::inverse(&conversion)?;
        assert_eq!(
            inv.export_to_proj_string()?,
            "+proj=pipeline +step +inv +proj=utm +zone=31 +ellps=WGS84 +step +proj=unitconvert +xy_in=rad +xy_out=deg +step +proj=axisswap +order=2,1"
        );
        Ok(())
    }

    #[test]
    fn transformations() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let gt = transformation::create_geocentric_translations(
            IdentifiedObject::named("NAD27 to WGS 84 (4)"),
            &nad27,
            &wgs84,
            [-8., 160., 176.],
            &[],
        )?;
        assert_eq!(
            gt.export_to_proj_string()?,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step +proj=unitconvert +xy_in=deg +xy_out=rad \
             +step +proj=push +v_3 +step +proj=cart +ellps=clrk66 +step +proj=helmert +x=-8 +y=160 +z=176 \
             +step +inv +proj=cart +ellps=WGS84 +step +proj=pop +v_3 \
             +step +proj=unitconvert +xy_in=rad +xy_out=deg +step +proj=axisswap +order=2,1"
        );

        let ntv2 = transformation::create_ntv2(IdentifiedObject::named("x"), &nad27, &wgs84, "ntv2_0.gsb", &[])?;
        let text = ntv2.export_to_proj_string()?;
        assert!(text.contains("+step +proj=hgridshift +grids=ntv2_0.gsb"));
        let inv = CoordinateOperation::inverse(&ntv2)?;
        assert!(inv.export_to_proj_string()?.contains("+step +inv +proj=hgridshift +grids=ntv2_0.gsb"));

        // The rotation between NTF (Paris) and NTF is carried by the prime meridians
        let paris = builtin::ntf_paris_geographic_2d();
        let ntf = builtin::ntf_geographic_2d();
        let rotation = transformation::create_longitude_rotation(
            IdentifiedObject::named("NTF (Paris) to NTF (1)"),
            &paris,
            &ntf,
            Measure::new(2.5969213, unit::GRAD),
            &[],
        )?;
        assert_eq!(
            rotation.export_to_proj_string()?,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step +proj=unitconvert +xy_in=grad +xy_out=rad \
             +step +inv +proj=longlat +ellps=clrk80ign +pm=paris \
             +step +proj=unitconvert +xy_in=rad +xy_out=deg +step +proj=axisswap +order=2,1"
        );
        Ok(())
    }

    #[test]
    fn vertical() -> Result<(), Error> {
        let wgs84_3d = builtin::wgs84_geographic_3d();
        let egm2008 = builtin::egm2008_height();
        let geoid = transformation::create_geographic_3d_to_gravity_related_height(
            IdentifiedObject::named("WGS 84 to EGM2008 height (1)"),
            &wgs84_3d,
            &egm2008,
            "us_nga_egm08_25.tif",
            &[],
        )?;
        assert_eq!(
            geoid.export_to_proj_string()?,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step +proj=unitconvert +xy_in=deg +xy_out=rad \
             +step +inv +proj=vgridshift +grids=us_nga_egm08_25.tif +multiplier=1 \
             +step +proj=unitconvert +xy_in=rad +xy_out=deg +step +proj=axisswap +order=2,1"
        );

        let feet = conversion::create_change_vertical_unit(IdentifiedObject::named("m to ft"), 1.0 / 0.3048)?;
        assert!(feet.export_to_proj_string()?.starts_with("+proj=affine +s33=3.28"));
        Ok(())
    }

    #[test]
    fn ballpark() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let op = proj_based::create_geod_to_geod(IdentifiedObject::named("Ballpark"), &nad27, &wgs84)?;
        let forward = op.export_to_proj_string()?;
        assert!(forward.contains("+step +proj=cart +ellps=clrk66 +step +inv +proj=cart +ellps=WGS84"));
        let inverse = CoordinateOperation::inverse(&op)?.export_to_proj_string()?;
        assert!(inverse.contains("+step +proj=cart +ellps=WGS84 +step +inv +proj=cart +ellps=clrk66"));

        let text = proj_based::create_from_proj_string(
            IdentifiedObject::named("text"),
            &nad27,
            &wgs84,
            "+proj=pipeline +step +proj=noop",
            &[],
        )?;
        assert_eq!(text.export_to_proj_string()?, "+proj=noop");
        Ok(())
    }

    #[test]
    fn crs_strings() -> Result<(), Error> {
        let wgs84 = builtin::wgs84_geographic_2d();
        assert_eq!(wgs84.export_to_proj_string()?, "+proj=longlat +ellps=WGS84 +no_defs +type=crs");
        let paris = builtin::ntf_paris_geographic_2d();
        assert_eq!(
            paris.export_to_proj_string()?,
            "+proj=longlat +ellps=clrk80ign +pm=paris +no_defs +type=crs"
        );
        let utm = builtin::utm(32, true)?;
        assert_eq!(
            utm.export_to_proj_string()?,
            "+proj=utm +zone=32 +ellps=WGS84 +units=m +no_defs +type=crs"
        );
        let geocentric = builtin::wgs84_geocentric();
        assert_eq!(
            geocentric.export_to_proj_string()?,
            "+proj=geocent +ellps=WGS84 +units=m +no_defs +type=crs"
        );
        let compound = builtin::wgs84_egm2008_compound()?;
        assert_eq!(
            compound.export_to_proj_string()?,
            "+proj=longlat +ellps=WGS84 +vunits=m +no_defs +type=crs"
        );

        let nad27 = builtin::nad27_geographic_2d();
        let bound = Crs::bound_to_wgs84(&nad27, &wgs84, &[-8., 160., 176.])?;
        assert_eq!(
            bound.export_to_proj_string()?,
            "+proj=longlat +ellps=clrk66 +towgs84=-8,160,176 +no_defs +type=crs"
        );
        Ok(())
    }
}
