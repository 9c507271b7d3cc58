//! Well Known Text: WKT2 (2019) for CRS and operations, and the legacy GDAL
//! flavour of WKT1 for CRS and conversions.
use super::format_number;
use super::format_significant;
use super::proj_string;
use crate::authoring::*;
use crate::crs::DerivedCrs;
use crate::crs::GeodeticCrs;
use crate::operation::mapping::epsg;
use crate::operation::mapping::method_mapping;

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn node(keyword: &str, children: Vec<String>) -> String {
    format!("{keyword}[{}]", children.join(","))
}

fn named(keyword: &str, name: &str, mut children: Vec<String>) -> String {
    children.insert(0, quoted(name));
    node(keyword, children)
}

// ----- W K T 2 -----------------------------------------------------------------------

fn id_nodes(identifiers: &[Identifier]) -> Vec<String> {
    identifiers
        .iter()
        .map(|id| {
            let code = match id.code.parse::<u64>() {
                Ok(n) => n.to_string(),
                Err(_) => quoted(&id.code),
            };
            node("ID", vec![quoted(&id.codespace), code])
        })
        .collect()
}

fn usage_nodes(object: &IdentifiedObject) -> Vec<String> {
    let mut nodes = Vec::new();
    for domain in &object.domains {
        let mut children = vec![named("SCOPE", domain.scope.as_deref().unwrap_or("unknown"), vec![])];
        if let Some(extent) = &domain.extent {
            if let Some(description) = &extent.description {
                children.push(named("AREA", description, vec![]));
            }
            if let Some(b) = &extent.bbox {
                let corners = [b.south, b.west, b.north, b.east];
                children.push(node("BBOX", corners.iter().map(|x| format_number(*x)).collect()));
            }
        }
        nodes.push(node("USAGE", children));
    }
    nodes
}

// Usages, then identifiers: the trailing nodes of every top level object
fn trailer(object: &IdentifiedObject) -> Vec<String> {
    let mut nodes = usage_nodes(object);
    nodes.extend(id_nodes(&object.identifiers));
    if !object.remarks.is_empty() {
        nodes.push(named("REMARK", &object.remarks, vec![]));
    }
    nodes
}

fn unit_node(unit: &UnitOfMeasure) -> String {
    let keyword = match unit.kind() {
        UnitType::Angular => "ANGLEUNIT",
        UnitType::Linear => "LENGTHUNIT",
        UnitType::Scale => "SCALEUNIT",
        UnitType::Time => "TIMEUNIT",
        UnitType::Parametric => "PARAMETRICUNIT",
        UnitType::None => "UNIT",
    };
    let mut children = vec![format_significant(unit.conversion_to_si())];
    if let Some(code) = unit.epsg_code() {
        children.extend(id_nodes(&[Identifier::epsg(code)]));
    }
    named(keyword, unit.name(), children)
}

fn ellipsoid_node(ellipsoid: &Ellipsoid) -> String {
    let children = vec![
        format_number(ellipsoid.semimajor_axis()),
        format_number(ellipsoid.inverse_flattening()),
        unit_node(&unit::METRE),
    ];
    named("ELLIPSOID", ellipsoid.name(), children)
}

fn prime_meridian_node(pm: &PrimeMeridian) -> String {
    let children = vec![format_number(pm.longitude.value), unit_node(&pm.longitude.unit)];
    named("PRIMEM", pm.name(), children)
}

fn geodetic_datum_nodes(g: &GeodeticCrs) -> Vec<String> {
    let datum = match &g.datum {
        DatumOrEnsemble::Datum(d) => named("DATUM", d.name(), vec![ellipsoid_node(&d.ellipsoid)]),
        DatumOrEnsemble::Ensemble(e) => {
            let mut children: Vec<String> = e
                .members()
                .iter()
                .map(|m| named("MEMBER", m.name(), id_nodes(&m.object.identifiers)))
                .collect();
            children.push(ellipsoid_node(&g.ellipsoid()));
            children.push(node("ENSEMBLEACCURACY", vec![format_number(e.accuracy)]));
            named("ENSEMBLE", &e.object.name, children)
        }
    };
    vec![datum, prime_meridian_node(&g.prime_meridian())]
}

fn vertical_datum_node(datum: &DatumOrEnsemble<VerticalReferenceFrame>) -> String {
    match datum {
        DatumOrEnsemble::Datum(d) => named("VDATUM", d.name(), vec![]),
        DatumOrEnsemble::Ensemble(e) => {
            let mut children: Vec<String> = e.members().iter().map(|m| named("MEMBER", m.name(), vec![])).collect();
            children.push(node("ENSEMBLEACCURACY", vec![format_number(e.accuracy)]));
            named("ENSEMBLE", &e.object.name, children)
        }
    }
}

// CS node and axes. A unit shared by all axes is written once, after them
fn cs_nodes(cs: &CoordinateSystem) -> Vec<String> {
    let mut nodes = vec![node("CS", vec![cs.kind.wkt_name().to_string(), cs.dimension().to_string()])];
    let shared = cs.axes.windows(2).all(|w| w[0].unit == w[1].unit);
    for (i, axis) in cs.axes.iter().enumerate() {
        let name = format!("{} ({})", axis.name.to_lowercase(), axis.abbreviation);
        let mut children = vec![axis.direction.wkt_name().to_string()];
        if cs.dimension() > 1 {
            children.push(node("ORDER", vec![(i + 1).to_string()]));
        }
        if !shared {
            children.push(unit_node(&axis.unit));
        }
        nodes.push(named("AXIS", &name, children));
    }
    if shared {
        if let Some(axis) = cs.axes.first() {
            nodes.push(unit_node(&axis.unit));
        }
    }
    nodes
}

fn parameter_nodes(single: &SingleOperation) -> Vec<String> {
    single
        .values
        .iter()
        .map(|v| {
            let ids = id_nodes(&v.parameter.object.identifiers);
            let mut children = match &v.value {
                ParameterValue::Measure(m) => vec![format_number(m.value), unit_node(&m.unit)],
                ParameterValue::String(s) | ParameterValue::Filename(s) => vec![quoted(s)],
                ParameterValue::Integer(n) => vec![n.to_string()],
                ParameterValue::Boolean(b) => vec![quoted(if *b { "TRUE" } else { "FALSE" })],
            };
            children.extend(ids);
            let keyword = match v.value {
                ParameterValue::Filename(_) => "PARAMETERFILE",
                _ => "PARAMETER",
            };
            named(keyword, v.parameter.name(), children)
        })
        .collect()
}

fn method_node(method: &OperationMethod) -> String {
    named("METHOD", method.name(), id_nodes(&method.object.identifiers))
}

// A conversion, as nested in a projected or derived CRS
fn conversion_node(keyword: &str, conversion: &CoordinateOperation) -> Result<String, Error> {
    let single = conversion
        .single()
        .ok_or_else(|| Error::Formatting(format!("{}: not a single operation", conversion.name())))?;
    let mut children = vec![method_node(&single.method)];
    children.extend(parameter_nodes(single));
    children.extend(id_nodes(conversion.identifiers()));
    Ok(named(keyword, conversion.name(), children))
}

// The base of a derived CRS: without CS and usage
fn base_geodetic_node(keyword: &str, base: &Crs) -> String {
    let mut children = Vec::new();
    if let Some(g) = base.geodetic() {
        children.extend(geodetic_datum_nodes(g));
        if let Some(axis) = g.cs.axes.first() {
            children.push(unit_node(&axis.unit));
        }
    }
    children.extend(id_nodes(base.identifiers()));
    named(keyword, base.name(), children)
}

fn derived_node(crs: &Crs, d: &DerivedCrs) -> Result<String, Error> {
    let projected = matches!(crs.kind, CrsKind::Projected(_));
    let (keyword, base, conversion) = if projected {
        ("PROJCRS", "BASEGEOGCRS", "CONVERSION")
    } else {
        ("GEOGCRS", "BASEGEOGCRS", "DERIVINGCONVERSION")
    };
    let mut children = vec![base_geodetic_node(base, &d.base), conversion_node(conversion, &d.conversion)?];
    children.extend(cs_nodes(&d.cs));
    children.extend(trailer(&crs.object));
    Ok(named(keyword, crs.name(), children))
}

fn crs_node(crs: &Crs) -> Result<String, Error> {
    let text = match &crs.kind {
        CrsKind::Geographic(g) | CrsKind::Geocentric(g) => {
            let keyword = if crs.is_geographic() { "GEOGCRS" } else { "GEODCRS" };
            let mut children = geodetic_datum_nodes(g);
            children.extend(cs_nodes(&g.cs));
            children.extend(trailer(&crs.object));
            named(keyword, crs.name(), children)
        }
        CrsKind::Vertical(v) => {
            let mut children = vec![vertical_datum_node(&v.datum)];
            children.extend(cs_nodes(&v.cs));
            children.extend(trailer(&crs.object));
            named("VERTCRS", crs.name(), children)
        }
        CrsKind::Projected(d) | CrsKind::Derived(d) => derived_node(crs, d)?,
        CrsKind::Compound(components) => {
            let mut children = components.iter().map(|c| crs_node(c)).collect::<Result<Vec<_>, _>>()?;
            children.extend(trailer(&crs.object));
            named("COMPOUNDCRS", crs.name(), children)
        }
        CrsKind::Bound(b) => {
            let t = &b.transformation;
            let single = t
                .single()
                .ok_or_else(|| Error::Formatting(format!("{}: not a single operation", t.name())))?;
            let mut transformation = vec![method_node(&single.method)];
            transformation.extend(parameter_nodes(single));
            transformation.extend(id_nodes(t.identifiers()));
            node("BOUNDCRS", vec![
                node("SOURCECRS", vec![crs_node(&b.base)?]),
                node("TARGETCRS", vec![crs_node(&b.hub)?]),
                named("ABRIDGEDTRANSFORMATION", t.name(), transformation),
            ])
        }
    };
    Ok(text)
}

pub(crate) fn crs_wkt2(crs: &Crs) -> Result<String, Error> {
    crs_node(crs)
}

// Source, target and interpolation CRS of an operation
fn crs_nodes(op: &CoordinateOperation) -> Result<(Vec<String>, Option<String>), Error> {
    let mut nodes = Vec::new();
    if let Some(source) = op.source_crs() {
        nodes.push(node("SOURCECRS", vec![crs_node(&source)?]));
    }
    if let Some(target) = op.target_crs() {
        nodes.push(node("TARGETCRS", vec![crs_node(&target)?]));
    }
    let interpolation = match op.interpolation_crs() {
        Some(crs) => Some(node("INTERPOLATIONCRS", vec![crs_node(crs)?])),
        None => None,
    };
    Ok((nodes, interpolation))
}

fn accuracy_node(op: &CoordinateOperation) -> Option<String> {
    op.accuracies()
        .first()
        .map(|a| node("OPERATIONACCURACY", vec![format_number(a.0)]))
}

// Method and parameters of an inverse wrapper: Helmert transformations are
// approximated by negating their parameters, other methods are "Inverse of"
fn inverse_method(forward: &CoordinateOperation, name: &str) -> Result<(String, Vec<String>, String), Error> {
    let single = forward
        .single()
        .ok_or_else(|| Error::Formatting(format!("{}: not a single operation", forward.name())))?;
    let code = single.method_code().unwrap_or_default();

    if proj_string::is_helmert(code) {
        let mut negated = single.clone();
        let mut rotated = false;
        for v in negated.values.iter_mut() {
            let parameter_code = v.parameter.epsg_code();
            if let ParameterValue::Measure(m) = &mut v.value {
                if parameter_code == Some(epsg::REFERENCE_EPOCH) {
                    continue;
                }
                if matches!(
                    parameter_code,
                    Some(epsg::X_AXIS_ROTATION) | Some(epsg::Y_AXIS_ROTATION) | Some(epsg::Z_AXIS_ROTATION)
                ) && m.value != 0.0
                {
                    rotated = true;
                }
                m.value = -m.value;
            }
        }
        let name = if rotated {
            format!("{name} (approx. inversion)")
        } else {
            name.to_string()
        };
        return Ok((method_node(&single.method), parameter_nodes(&negated), name));
    }

    let method = named("METHOD", &format!("Inverse of {}", single.method.name()), vec![]);
    Ok((method, parameter_nodes(single), name.to_string()))
}

fn operation_node(op: &CoordinateOperation) -> Result<String, Error> {
    let (crs, interpolation) = crs_nodes(op)?;

    let (keyword, body, name) = match &op.kind {
        OperationKind::Conversion(single) | OperationKind::Transformation(single) => {
            let keyword = if op.is_conversion() && crs.is_empty() {
                "CONVERSION"
            } else {
                "COORDINATEOPERATION"
            };
            let mut body = vec![method_node(&single.method)];
            body.extend(parameter_nodes(single));
            (keyword, body, op.name().to_string())
        }
        OperationKind::InverseConversion(forward) | OperationKind::InverseTransformation(forward) => {
            let (method, parameters, name) = inverse_method(forward, op.name())?;
            let mut body = vec![method];
            body.extend(parameters);
            ("COORDINATEOPERATION", body, name)
        }
        OperationKind::Concatenated(steps) => {
            let body = steps
                .iter()
                .map(|s| Ok(node("STEP", vec![operation_node(s)?])))
                .collect::<Result<Vec<_>, Error>>()?;
            ("CONCATENATEDOPERATION", body, op.name().to_string())
        }
        OperationKind::ProjBased(_) => {
            let pipeline = op.export_to_proj_string()?;
            let body = vec![
                named("METHOD", "PROJ-based coordinate operation", vec![]),
                named("PARAMETER", "PROJ string", vec![quoted(&pipeline)]),
            ];
            ("COORDINATEOPERATION", body, op.name().to_string())
        }
    };

    let mut children = Vec::new();
    if let Some(version) = op.version() {
        children.push(named("VERSION", version, vec![]));
    }
    children.extend(crs);
    children.extend(body);
    children.extend(interpolation);
    children.extend(accuracy_node(op));
    children.extend(trailer(&op.object));
    Ok(named(keyword, &name, children))
}

pub(crate) fn operation_wkt2(op: &CoordinateOperation) -> Result<String, Error> {
    operation_node(op)
}

// ----- W K T 1   ( G D A L ) -------------------------------------------------------

fn authority(object: &IdentifiedObject) -> Vec<String> {
    object
        .identifiers
        .iter()
        .take(1)
        .map(|id| node("AUTHORITY", vec![quoted(&id.codespace), quoted(&id.code)]))
        .collect()
}

fn unit_authority(unit: &UnitOfMeasure) -> Vec<String> {
    unit.epsg_code()
        .map(|code| node("AUTHORITY", vec![quoted("EPSG"), quoted(&code.to_string())]))
        .into_iter()
        .collect()
}

fn wkt1_unit(unit: &UnitOfMeasure) -> String {
    let mut children = vec![format_significant(unit.conversion_to_si())];
    children.extend(unit_authority(unit));
    named("UNIT", unit.name(), children)
}

/// The GDAL rendition of a datum name: "World Geodetic System 1984" is
/// "WGS_1984", otherwise non-alphanumerics collapse into underscores
pub(crate) fn wkt1_datum_name(name: &str) -> String {
    match name {
        "World Geodetic System 1984" => return "WGS_1984".to_string(),
        "European Terrestrial Reference System 1989" => return "European_Terrestrial_Reference_System_1989".to_string(),
        _ => {}
    }
    let mut out = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn wkt1_axis(axis: &Axis) -> String {
    let direction = match axis.direction {
        AxisDirection::GeocentricX | AxisDirection::GeocentricY => "OTHER".to_string(),
        AxisDirection::GeocentricZ => "NORTH".to_string(),
        d => d.wkt_name().to_uppercase(),
    };
    named("AXIS", &axis.name, vec![direction])
}

fn wkt1_datum(g: &GeodeticCrs, towgs84: Option<&[f64]>) -> String {
    let datum = g.datum();
    let ellipsoid = g.ellipsoid();
    let mut spheroid = vec![
        format_number(ellipsoid.semimajor_axis()),
        format_number(ellipsoid.inverse_flattening()),
    ];
    spheroid.extend(authority(&ellipsoid.object));
    let mut children = vec![named("SPHEROID", ellipsoid.name(), spheroid)];
    if let Some(values) = towgs84 {
        children.push(node("TOWGS84", values.iter().map(|x| format_number(*x)).collect()));
    }
    children.extend(authority(&datum.object));
    named("DATUM", &wkt1_datum_name(datum.name()), children)
}

fn wkt1_primem(pm: &PrimeMeridian) -> String {
    let mut children = vec![format_number(pm.longitude_degrees())];
    children.extend(authority(&pm.object));
    named("PRIMEM", pm.name(), children)
}

fn wkt1_geogcs(crs: &Crs, towgs84: Option<&[f64]>) -> Result<String, Error> {
    let g = crs
        .geodetic()
        .ok_or_else(|| Error::Formatting(format!("{}: not a geodetic CRS", crs.name())))?;
    let mut children = vec![wkt1_datum(g, towgs84), wkt1_primem(&g.prime_meridian())];
    if crs.is_geocentric() {
        children.push(wkt1_unit(&unit::METRE));
    } else {
        children.push(wkt1_unit(&g.cs.horizontal_unit()));
    }
    children.extend(g.cs.axes.iter().map(wkt1_axis));
    children.extend(authority(&crs.object));
    let keyword = if crs.is_geocentric() { "GEOCCS" } else { "GEOGCS" };
    Ok(named(keyword, crs.name(), children))
}

// PROJECTION and PARAMETER nodes of a map projection
fn wkt1_projection(single: &SingleOperation, linear: &UnitOfMeasure) -> Result<Vec<String>, Error> {
    let mapping = method_mapping(&single.method)
        .ok_or_else(|| Error::Formatting(format!("{}: no WKT1 equivalent", single.method.name())))?;
    let name = mapping
        .wkt1_name
        .ok_or_else(|| Error::Formatting(format!("{}: no WKT1 equivalent", mapping.epsg_name)))?;
    let mut projection = vec![quoted(name)];
    if let Some(code) = single.method_code() {
        projection.push(node("AUTHORITY", vec![quoted("EPSG"), quoted(&code.to_string())]));
    }
    let mut nodes = vec![node("PROJECTION", projection)];

    let mut seen = Vec::new();
    for param in mapping.params {
        let Some(wkt1_name) = param.wkt1_name else {
            continue;
        };
        if seen.contains(&param.epsg_code) {
            continue;
        }
        seen.push(param.epsg_code);
        let unit = match param.kind {
            UnitType::Angular => unit::DEGREE,
            UnitType::Scale => unit::UNITY,
            _ => linear.clone(),
        };
        let value = single
            .value_in(param.epsg_code, &unit)
            .ok_or_else(|| Error::MissingParam(param.epsg_name.to_string()))?;
        nodes.push(named("PARAMETER", wkt1_name, vec![format_number(value)]));
    }
    Ok(nodes)
}

fn wkt1_node(crs: &Crs, towgs84: Option<&[f64]>) -> Result<String, Error> {
    match &crs.kind {
        CrsKind::Geographic(_) | CrsKind::Geocentric(_) => wkt1_geogcs(crs, towgs84),
        CrsKind::Projected(d) => {
            let base = Crs::extract_geographic_crs(&d.base)
                .ok_or_else(|| Error::Formatting(format!("{}: no geographic base", crs.name())))?;
            let single = d
                .conversion
                .single()
                .ok_or_else(|| Error::Formatting(format!("{}: not a single operation", crs.name())))?;
            let linear = d.cs.horizontal_unit();
            let mut children = vec![wkt1_geogcs(&base, towgs84)?];
            children.extend(wkt1_projection(single, &linear)?);
            children.push(wkt1_unit(&linear));
            children.extend(d.cs.axes.iter().map(wkt1_axis));
            children.extend(authority(&crs.object));
            Ok(named("PROJCS", crs.name(), children))
        }
        CrsKind::Vertical(v) => {
            let datum = v.datum.datum();
            let mut datum_children = vec!["2005".to_string()];
            datum_children.extend(authority(&datum.object));
            let mut children = vec![named("VERT_DATUM", datum.name(), datum_children)];
            let unit = v.cs.vertical_unit().unwrap_or(unit::METRE);
            children.push(wkt1_unit(&unit));
            children.extend(v.cs.axes.iter().map(wkt1_axis));
            children.extend(authority(&crs.object));
            Ok(named("VERT_CS", crs.name(), children))
        }
        CrsKind::Compound(components) => {
            let mut children = components
                .iter()
                .map(|c| wkt1_node(c, towgs84))
                .collect::<Result<Vec<_>, _>>()?;
            children.extend(authority(&crs.object));
            Ok(named("COMPD_CS", crs.name(), children))
        }
        CrsKind::Bound(b) => {
            let values = proj_string::towgs84(&b.transformation)?;
            wkt1_node(&b.base, Some(&values))
        }
        CrsKind::Derived(_) => Err(Error::Formatting(format!(
            "{}: derived CRS have no WKT1 equivalent",
            crs.name()
        ))),
    }
}

pub(crate) fn crs_wkt1(crs: &Crs) -> Result<String, Error> {
    wkt1_node(crs, None)
}

/// WKT1 has no operation objects: conversions are written as their projection
pub(crate) fn operation_wkt1(op: &CoordinateOperation) -> Result<String, Error> {
    match &op.kind {
        OperationKind::Conversion(single) => Ok(wkt1_projection(single, &unit::METRE)?.join(",")),
        _ => Err(Error::Formatting(format!(
            "{}: only conversions can be exported as WKT1",
            op.name()
        ))),
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;
    use crate::operation::transformation;

    #[test]
    fn geographic() -> Result<(), Error> {
        let wgs84 = builtin::wgs84_geographic_2d();
        let wkt = wgs84.export_to_wkt(WktVersion::Wkt2_2019)?;
        assert!(wkt.starts_with("GEOGCRS[\"WGS 84\",ENSEMBLE[\"World Geodetic System 1984 ensemble\",MEMBER["));
        assert!(wkt.contains("ELLIPSOID[\"WGS 84\",6378137,298.257223563,LENGTHUNIT[\"metre\",1,ID[\"EPSG\",9001]]]"));
        assert!(wkt.contains("CS[ellipsoidal,2],AXIS[\"geodetic latitude (Lat)\",north,ORDER[1]]"));
        assert!(wkt.contains("ANGLEUNIT[\"degree\",0.0174532925199433,ID[\"EPSG\",9122]]"));
        assert!(wkt.contains("BBOX[-90,-180,90,180]"));
        assert!(wkt.ends_with("ID[\"EPSG\",4326]]"));

        let wkt1 = wgs84.export_to_wkt(WktVersion::Wkt1Gdal)?;
        assert!(wkt1.starts_with("GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563"));
        assert!(wkt1.contains("AXIS[\"Geodetic latitude\",NORTH]"));
        assert!(wkt1.ends_with("AUTHORITY[\"EPSG\",\"4326\"]]"));
        Ok(())
    }

    #[test]
    fn projected() -> Result<(), Error> {
        let utm = builtin::utm(31, true)?;
        let wkt = utm.export_to_wkt(WktVersion::Wkt2_2019)?;
        assert!(wkt.starts_with("PROJCRS[\"WGS 84 / UTM zone 31N\",BASEGEOGCRS[\"WGS 84\""));
        assert!(wkt.contains("CONVERSION[\"UTM zone 31N\",METHOD[\"Transverse Mercator\",ID[\"EPSG\",9807]]"));
        assert!(wkt.contains("PARAMETER[\"Longitude of natural origin\",3,ANGLEUNIT[\"degree\""));
        assert!(wkt.contains("CS[Cartesian,2],AXIS[\"easting (E)\",east,ORDER[1]]"));

        let wkt1 = utm.export_to_wkt(WktVersion::Wkt1Gdal)?;
        assert!(wkt1.starts_with("PROJCS[\"WGS 84 / UTM zone 31N\",GEOGCS[\"WGS 84\""));
        assert!(wkt1.contains("PROJECTION[\"Transverse_Mercator\",AUTHORITY[\"EPSG\",\"9807\"]]"));
        assert!(wkt1.contains("PARAMETER[\"central_meridian\",3],PARAMETER[\"scale_factor\",0.9996]"));
        assert!(wkt1.contains("PARAMETER[\"false_easting\",500000]"));
        Ok(())
    }

    #[test]
    fn operations() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let wgs84 = builtin::wgs84_geographic_2d();
        let gt = transformation::create_geocentric_translations(
            IdentifiedObject::named("NAD27 to WGS 84 (4)").with_epsg(1173),
            &nad27,
            &wgs84,
            [-8., 160., 176.],
            &[PositionalAccuracy(10.)],
        )?;
        let wkt = gt.export_to_wkt(WktVersion::Wkt2_2019)?;
        assert!(wkt.starts_with("COORDINATEOPERATION[\"NAD27 to WGS 84 (4)\",SOURCECRS[GEOGCRS[\"NAD27\""));
        assert!(wkt.contains("METHOD[\"Geocentric translations (geog2D domain)\",ID[\"EPSG\",9603]]"));
        assert!(wkt.contains("PARAMETER[\"X-axis translation\",-8,LENGTHUNIT[\"metre\",1,ID[\"EPSG\",9001]],ID[\"EPSG\",8605]]"));
        assert!(wkt.contains("OPERATIONACCURACY[10]"));
        assert!(wkt.ends_with("ID[\"EPSG\",1173]]"));
        assert!(gt.export_to_wkt(WktVersion::Wkt1Gdal).is_err());

        // Helmert transformations with rotations are inverted approximately
        let pv = transformation::create_position_vector(
            IdentifiedObject::named("PV"),
            &nad27,
            &wgs84,
            [1., 2., 3., 0.1, 0.2, 0.3, 1.5],
            &[],
        )?;
        let inv = CoordinateOperation::inverse(&pv)?;
        let wkt = inv.export_to_wkt(WktVersion::Wkt2_2019)?;
        assert!(wkt.starts_with("COORDINATEOPERATION[\"Inverse of PV (approx. inversion)\",SOURCECRS[GEOGCRS[\"WGS 84\""));
        assert!(wkt.contains("PARAMETER[\"X-axis rotation\",-0.1,"));

        let ntv2 = transformation::create_ntv2(IdentifiedObject::named("grid"), &nad27, &wgs84, "ntv2_0.gsb", &[])?;
        let wkt = CoordinateOperation::inverse(&ntv2)?.export_to_wkt(WktVersion::Wkt2_2019)?;
        assert!(wkt.contains("METHOD[\"Inverse of NTv2\"]"));
        assert!(wkt.contains("PARAMETERFILE[\"Latitude and longitude difference file\",\"ntv2_0.gsb\""));
        Ok(())
    }

    #[test]
    fn datum_names() {
        assert_eq!(wkt1_datum_name("World Geodetic System 1984"), "WGS_1984");
        assert_eq!(wkt1_datum_name("North American Datum 1927"), "North_American_Datum_1927");
        assert_eq!(wkt1_datum_name("Nouvelle Triangulation Francaise (Paris)"), "Nouvelle_Triangulation_Francaise_Paris");
    }
}
