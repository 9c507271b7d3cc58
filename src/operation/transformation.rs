//! Transformations: datum changing operations, given by a method and
//! parameter values, possibly referring to grid files.
use super::mapping::epsg;
use super::mapping::method_name;
use super::OperationKind;
use super::OperationRef;
use super::SingleOperation;
use crate::authoring::*;

/// Method name of the vertical-to-geographic 3D geoid model transformation,
/// which has no EPSG method code of its own
pub const GRAVITY_RELATED_HEIGHT_TO_GEOGRAPHIC_3D: &str = "GravityRelatedHeight to Geographic3D";

/// A transformation from a method and its parameter values
pub fn create(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    interpolation: Option<&CrsRef>,
    method: OperationMethod,
    values: Vec<OperationParameterValue>,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let single = SingleOperation::new(method, values)?;
    let kind = OperationKind::Transformation(single);
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind)
        .with_interpolation_crs(interpolation.cloned())
        .with_accuracies(accuracies);
    Ok(Arc::new(op))
}

fn create_by_code(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    code: u32,
    values: Vec<OperationParameterValue>,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let name = method_name(code).unwrap_or_default();
    let method = OperationMethod::for_values(name, Some(code), &values);
    create(properties, source, target, None, method, values, accuracies)
}

// Method variant by the domain of the source CRS: (geocentric, geog2D, geog3D)
fn domain_method(source: &CrsRef, codes: [u32; 3]) -> u32 {
    if source.is_geocentric() {
        codes[0]
    } else if source.dimension() == 3 {
        codes[2]
    } else {
        codes[1]
    }
}

fn metres(name: &str, code: u32, value: f64) -> OperationParameterValue {
    OperationParameterValue::measure(name, code, Measure::metres(value))
}

fn arc_seconds(name: &str, code: u32, value: f64) -> OperationParameterValue {
    OperationParameterValue::measure(name, code, Measure::new(value, unit::ARC_SECOND))
}

fn translations(values: [f64; 3]) -> Vec<OperationParameterValue> {
    vec![
        metres("X-axis translation", epsg::X_AXIS_TRANSLATION, values[0]),
        metres("Y-axis translation", epsg::Y_AXIS_TRANSLATION, values[1]),
        metres("Z-axis translation", epsg::Z_AXIS_TRANSLATION, values[2]),
    ]
}

// Translations (m), rotations (arc seconds), scale difference (ppm)
fn helmert_values(values: [f64; 7]) -> Vec<OperationParameterValue> {
    let mut v = translations([values[0], values[1], values[2]]);
    v.push(arc_seconds("X-axis rotation", epsg::X_AXIS_ROTATION, values[3]));
    v.push(arc_seconds("Y-axis rotation", epsg::Y_AXIS_ROTATION, values[4]));
    v.push(arc_seconds("Z-axis rotation", epsg::Z_AXIS_ROTATION, values[5]));
    v.push(OperationParameterValue::measure(
        "Scale difference",
        epsg::SCALE_DIFFERENCE,
        Measure::new(values[6], unit::PARTS_PER_MILLION),
    ));
    v
}

// Rates of the 7 Helmert parameters (per year), and the reference epoch (year)
fn helmert_rates(rates: [f64; 7], epoch: f64) -> Vec<OperationParameterValue> {
    let per_year = 1.0 / unit::YEAR.conversion_to_si();
    let m_per_year = UnitOfMeasure::new("metres per year", per_year, UnitType::Linear);
    let arcsec_per_year = UnitOfMeasure::new(
        "arc-seconds per year",
        unit::ARC_SECOND.conversion_to_si() * per_year,
        UnitType::Angular,
    );
    let ppm_per_year = UnitOfMeasure::new("parts per million per year", 1e-6 * per_year, UnitType::Scale);

    #[rustfmt::skip]
    let names = [
        ("Rate of change of X-axis translation", epsg::RATE_X_AXIS_TRANSLATION, &m_per_year),
        ("Rate of change of Y-axis translation", epsg::RATE_Y_AXIS_TRANSLATION, &m_per_year),
        ("Rate of change of Z-axis translation", epsg::RATE_Z_AXIS_TRANSLATION, &m_per_year),
        ("Rate of change of X-axis rotation",    epsg::RATE_X_AXIS_ROTATION,    &arcsec_per_year),
        ("Rate of change of Y-axis rotation",    epsg::RATE_Y_AXIS_ROTATION,    &arcsec_per_year),
        ("Rate of change of Z-axis rotation",    epsg::RATE_Z_AXIS_ROTATION,    &arcsec_per_year),
        ("Rate of change of Scale difference",   epsg::RATE_SCALE_DIFFERENCE,   &ppm_per_year),
    ];
    let mut v: Vec<_> = names
        .iter()
        .zip(rates)
        .map(|((name, code, unit), rate)| {
            OperationParameterValue::measure(name, *code, Measure::new(rate, (*unit).clone()))
        })
        .collect();
    v.push(OperationParameterValue::measure(
        "Parameter reference epoch",
        epsg::REFERENCE_EPOCH,
        Measure::new(epoch, unit::YEAR),
    ));
    v
}

// ----- H E L M E R T   F A M I L Y ---------------------------------------------------

pub fn create_geocentric_translations(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    translation: [f64; 3],
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    use epsg::*;
    let codes = [
        GEOCENTRIC_TRANSLATION_GEOCENTRIC,
        GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D,
        GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D,
    ];
    let code = domain_method(source, codes);
    create_by_code(properties, source, target, code, translations(translation), accuracies)
}

/// 7 parameter Helmert, position vector convention. Translations in metres,
/// rotations in arc seconds, scale difference in ppm
pub fn create_position_vector(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    parameters: [f64; 7],
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    use epsg::*;
    let codes = [
        POSITION_VECTOR_GEOCENTRIC,
        POSITION_VECTOR_GEOGRAPHIC_2D,
        POSITION_VECTOR_GEOGRAPHIC_3D,
    ];
    let code = domain_method(source, codes);
    create_by_code(properties, source, target, code, helmert_values(parameters), accuracies)
}

/// 7 parameter Helmert, coordinate frame convention
pub fn create_coordinate_frame_rotation(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    parameters: [f64; 7],
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    use epsg::*;
    let codes = [
        COORDINATE_FRAME_GEOCENTRIC,
        COORDINATE_FRAME_GEOGRAPHIC_2D,
        COORDINATE_FRAME_GEOGRAPHIC_3D,
    ];
    let code = domain_method(source, codes);
    create_by_code(properties, source, target, code, helmert_values(parameters), accuracies)
}

/// 15 parameter Helmert, position vector convention: the 7 parameters,
/// their yearly rates, and the reference epoch (decimal year)
pub fn create_time_dependent_position_vector(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    parameters: [f64; 7],
    rates: [f64; 7],
    reference_epoch: f64,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    use epsg::*;
    let codes = [
        TIME_DEPENDENT_POSITION_VECTOR_GEOCENTRIC,
        TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_2D,
        TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_3D,
    ];
    let code = domain_method(source, codes);
    let mut values = helmert_values(parameters);
    values.extend(helmert_rates(rates, reference_epoch));
    create_by_code(properties, source, target, code, values, accuracies)
}

/// 15 parameter Helmert, coordinate frame convention
pub fn create_time_dependent_coordinate_frame_rotation(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    parameters: [f64; 7],
    rates: [f64; 7],
    reference_epoch: f64,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    use epsg::*;
    let codes = [
        TIME_DEPENDENT_COORDINATE_FRAME_GEOCENTRIC,
        TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_2D,
        TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_3D,
    ];
    let code = domain_method(source, codes);
    let mut values = helmert_values(parameters);
    values.extend(helmert_rates(rates, reference_epoch));
    create_by_code(properties, source, target, code, values, accuracies)
}

fn molodensky_values(translation: [f64; 3], da: f64, df: f64) -> Vec<OperationParameterValue> {
    let mut values = translations(translation);
    values.push(metres("Semi-major axis length difference", epsg::SEMI_MAJOR_AXIS_DIFFERENCE, da));
    values.push(OperationParameterValue::measure(
        "Flattening difference",
        epsg::FLATTENING_DIFFERENCE,
        Measure::unity(df),
    ));
    values
}

pub fn create_molodensky(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    translation: [f64; 3],
    semi_major_axis_difference: f64,
    flattening_difference: f64,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = molodensky_values(translation, semi_major_axis_difference, flattening_difference);
    create_by_code(properties, source, target, epsg::MOLODENSKY, values, accuracies)
}

pub fn create_abridged_molodensky(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    translation: [f64; 3],
    semi_major_axis_difference: f64,
    flattening_difference: f64,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = molodensky_values(translation, semi_major_axis_difference, flattening_difference);
    create_by_code(properties, source, target, epsg::ABRIDGED_MOLODENSKY, values, accuracies)
}

// ----- O F F S E T S -----------------------------------------------------------------

pub fn create_longitude_rotation(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    offset: Measure,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::measure(
        "Longitude offset",
        epsg::LONGITUDE_OFFSET,
        offset,
    )];
    create_by_code(properties, source, target, epsg::LONGITUDE_ROTATION, values, accuracies)
}

pub fn create_geographic_2d_offsets(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    latitude_offset: Measure,
    longitude_offset: Measure,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![
        OperationParameterValue::measure("Latitude offset", epsg::LATITUDE_OFFSET, latitude_offset),
        OperationParameterValue::measure("Longitude offset", epsg::LONGITUDE_OFFSET, longitude_offset),
    ];
    create_by_code(properties, source, target, epsg::GEOGRAPHIC_2D_OFFSETS, values, accuracies)
}

pub fn create_geographic_3d_offsets(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    latitude_offset: Measure,
    longitude_offset: Measure,
    vertical_offset: Measure,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![
        OperationParameterValue::measure("Latitude offset", epsg::LATITUDE_OFFSET, latitude_offset),
        OperationParameterValue::measure("Longitude offset", epsg::LONGITUDE_OFFSET, longitude_offset),
        OperationParameterValue::measure("Vertical Offset", epsg::VERTICAL_OFFSET_PARAM, vertical_offset),
    ];
    create_by_code(properties, source, target, epsg::GEOGRAPHIC_3D_OFFSETS, values, accuracies)
}

pub fn create_geographic_2d_with_height_offsets(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    latitude_offset: Measure,
    longitude_offset: Measure,
    geoid_undulation: Measure,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![
        OperationParameterValue::measure("Latitude offset", epsg::LATITUDE_OFFSET, latitude_offset),
        OperationParameterValue::measure("Longitude offset", epsg::LONGITUDE_OFFSET, longitude_offset),
        OperationParameterValue::measure("Geoid undulation", epsg::GEOID_UNDULATION, geoid_undulation),
    ];
    let code = epsg::GEOGRAPHIC_2D_WITH_HEIGHT_OFFSETS;
    create_by_code(properties, source, target, code, values, accuracies)
}

pub fn create_vertical_offset(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    offset: Measure,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::measure(
        "Vertical Offset",
        epsg::VERTICAL_OFFSET_PARAM,
        offset,
    )];
    create_by_code(properties, source, target, epsg::VERTICAL_OFFSET, values, accuracies)
}

/// A zero offset between two geographic CRS: 3D offsets if both are 3D, 2D otherwise
pub fn create_null_geographic_offset(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let zero = Measure::degrees(0.0);
    if source.dimension() == 3 && target.dimension() == 3 {
        let values = (zero.clone(), zero, Measure::metres(0.0));
        return create_geographic_3d_offsets(properties, source, target, values.0, values.1, values.2, accuracies);
    }
    create_geographic_2d_offsets(properties, source, target, zero.clone(), zero, accuracies)
}

/// Scaling of the vertical axis between two CRS of (possibly) different datums
pub fn create_change_vertical_unit(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    factor: f64,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::measure(
        "Unit conversion scalar",
        epsg::UNIT_CONVERSION_SCALAR,
        Measure::unity(factor),
    )];
    create_by_code(properties, source, target, epsg::CHANGE_VERTICAL_UNIT, values, accuracies)
}

// ----- G R I D   B A S E D -----------------------------------------------------------

pub fn create_ntv2(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    filename: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::filename(
        "Latitude and longitude difference file",
        epsg::LATITUDE_LONGITUDE_DIFFERENCE_FILE,
        filename,
    )];
    create_by_code(properties, source, target, epsg::NTV2, values, accuracies)
}

pub fn create_nadcon(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    latitude_difference_file: &str,
    longitude_difference_file: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![
        OperationParameterValue::filename(
            "Latitude difference file",
            epsg::LATITUDE_DIFFERENCE_FILE,
            latitude_difference_file,
        ),
        OperationParameterValue::filename(
            "Longitude difference file",
            epsg::LONGITUDE_DIFFERENCE_FILE,
            longitude_difference_file,
        ),
    ];
    create_by_code(properties, source, target, epsg::NADCON, values, accuracies)
}

pub fn create_vertcon(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    filename: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::filename(
        "Vertical offset file",
        epsg::VERTICAL_OFFSET_FILE,
        filename,
    )];
    create_by_code(properties, source, target, epsg::VERTCON, values, accuracies)
}

/// Geographic 3D to gravity related height by a geoid model grid
pub fn create_geographic_3d_to_gravity_related_height(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    filename: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::filename(
        "Geoid (height correction) model file",
        epsg::GEOID_MODEL_FILE,
        filename,
    )];
    let code = epsg::GEOGRAPHIC_3D_TO_GRAVITY_RELATED_HEIGHT_EGM2008;
    create_by_code(properties, source, target, code, values, accuracies)
}

/// Gravity related height to geographic 3D by a geoid model grid. The
/// interpolation CRS is the geographic CRS the grid is referred to
pub fn create_gravity_related_height_to_geographic_3d(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    interpolation: Option<&CrsRef>,
    filename: &str,
    accuracies: &[PositionalAccuracy],
) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::filename(
        "Geoid (height correction) model file",
        epsg::GEOID_MODEL_FILE,
        filename,
    )];
    let method = OperationMethod::for_values(GRAVITY_RELATED_HEIGHT_TO_GEOGRAPHIC_3D, None, &values);
    create(properties, source, target, interpolation, method, values, accuracies)
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::builtin;

    #[test]
    fn helmert() -> Result<(), Error> {
        let wgs84 = builtin::wgs84_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let wgs84_3d = builtin::wgs84_geographic_3d();
        let geocentric = builtin::wgs84_geocentric();
        let params = [-0.991, 1.9072, 0.5129, -0.0257899075, -0.0096500989, -0.0116599432, 0.0];

        let cf = create_coordinate_frame_rotation(IdentifiedObject::named("cf"), &nad83, &wgs84, params, &[])?;
        assert_eq!(cf.method_epsg_code(), Some(9607));
        assert_eq!(cf.method().map(|m| m.name()), Some("Coordinate Frame rotation (geog2D domain)"));
        let rx = cf.single().unwrap().value_in(8608, &unit::ARC_SECOND).unwrap();
        float_eq::assert_float_eq!(rx, -0.0257899075, abs <= 1e-12);

        let pv = create_position_vector(IdentifiedObject::named("pv"), &wgs84_3d, &wgs84_3d, params, &[])?;
        assert_eq!(pv.method_epsg_code(), Some(1037));
        let gt = create_geocentric_translations(IdentifiedObject::named("gt"), &geocentric, &geocentric, [1., 2., 3.], &[])?;
        assert_eq!(gt.method_epsg_code(), Some(1031));

        let td = create_time_dependent_position_vector(
            IdentifiedObject::named("td"), &geocentric, &geocentric, params, [0.; 7], 2010.0, &[],
        )?;
        assert_eq!(td.method_epsg_code(), Some(1053));
        assert_eq!(td.single().unwrap().values.len(), 15);
        assert_eq!(td.single().unwrap().value_in(1047, &unit::YEAR), Some(2010.0));
        Ok(())
    }

    #[test]
    fn round_trips() -> Result<(), Error> {
        let ntf_paris = builtin::ntf_paris_geographic_2d();
        let ntf = builtin::ntf_geographic_2d();
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();

        let rotation = create_longitude_rotation(
            IdentifiedObject::named("NTF (Paris) to NTF (1)"),
            &ntf_paris,
            &ntf,
            Measure::new(2.5969213, unit::GRAD),
            &[PositionalAccuracy(0.0)],
        )?;
        let molodensky = create_molodensky(IdentifiedObject::named("m"), &nad27, &nad83, [1., 2., 3.], -69.4, -3.7e-5, &[])?;
        let offsets = create_geographic_2d_offsets(
            IdentifiedObject::named("o"),
            &nad27,
            &nad83,
            Measure::new(1.2, unit::ARC_SECOND),
            Measure::new(-0.3, unit::ARC_SECOND),
            &[],
        )?;

        for op in [rotation, molodensky, offsets] {
            let inverse = CoordinateOperation::inverse(&op)?;
            assert!(inverse.is_transformation());
            assert!(inverse.single().is_some());
            assert_eq!(inverse.method_epsg_code(), op.method_epsg_code());
            assert!(!inverse.is_equivalent_method_and_values(&op));
            assert!(Arc::ptr_eq(&CoordinateOperation::inverse(&inverse)?, &op));
        }
        Ok(())
    }

    #[test]
    fn grids() -> Result<(), Error> {
        let nad27 = builtin::nad27_geographic_2d();
        let nad83 = builtin::nad83_geographic_2d();
        let nadcon = create_nadcon(IdentifiedObject::named("NAD27 to NAD83 (1)"), &nad27, &nad83, "conus.las", "conus.los", &[PositionalAccuracy(0.15)])?;
        assert_eq!(nadcon.grids_needed(), vec!["conus.las".to_string(), "conus.los".to_string()]);
        assert_eq!(nadcon.accuracy(), Some(0.15));

        let null = create_null_geographic_offset(IdentifiedObject::named("null"), &nad27, &nad83, &[])?;
        assert_eq!(null.method_epsg_code(), Some(9619));
        assert!(null.grids_needed().is_empty());
        Ok(())
    }
}
