//! Conversions: map projections, and the other datum preserving operations
use super::mapping::epsg;
use super::mapping::method_mapping_by_code;
use super::mapping::method_name;
use super::OperationKind;
use super::OperationRef;
use super::SingleOperation;
use crate::authoring::*;

/// A conversion from a method and its parameter values. Source and target
/// CRS are set when the conversion is used to define a derived CRS
pub fn create(
    properties: IdentifiedObject,
    method: OperationMethod,
    values: Vec<OperationParameterValue>,
) -> Result<OperationRef, Error> {
    let single = SingleOperation::new(method, values)?;
    let op = CoordinateOperation::assemble(properties, None, None, OperationKind::Conversion(single));
    Ok(Arc::new(op))
}

/// A conversion between two given CRS
pub fn create_between(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    method: OperationMethod,
    values: Vec<OperationParameterValue>,
) -> Result<OperationRef, Error> {
    let single = SingleOperation::new(method, values)?;
    let kind = OperationKind::Conversion(single);
    let op = CoordinateOperation::assemble(properties, Some(source.clone()), Some(target.clone()), kind);
    Ok(Arc::new(op))
}

// A projection, given by its method code, and values for its parameters, in
// the order of the mapping table. Angles in degrees, lengths in metres
fn projection(properties: IdentifiedObject, method_code: u32, values: &[f64]) -> Result<OperationRef, Error> {
    let mapping = method_mapping_by_code(method_code)
        .ok_or_else(|| Error::Unsupported(format!("projection method {method_code}")))?;

    // The same parameter may be mapped twice (e.g. "lat_1" and "lat_0" in LCC 1SP)
    let mut params = Vec::new();
    for p in mapping.params.iter() {
        if !params.iter().any(|q: &&super::mapping::ParamMapping| q.epsg_code == p.epsg_code) {
            params.push(*p);
        }
    }
    if params.len() != values.len() {
        return Err(Error::InvalidOperation(format!(
            "{}: {} parameters, but {} values",
            mapping.epsg_name,
            params.len(),
            values.len()
        )));
    }

    let values: Vec<_> = params
        .iter()
        .zip(values)
        .map(|(p, value)| {
            let unit = match p.kind {
                UnitType::Angular => unit::DEGREE,
                UnitType::Linear => unit::METRE,
                _ => unit::UNITY,
            };
            OperationParameterValue::measure(p.epsg_name, p.epsg_code, Measure::new(*value, unit))
        })
        .collect();
    let method = OperationMethod::for_values(mapping.epsg_name, Some(mapping.epsg_code), &values);
    create(properties, method, values)
}

/// Universal Transverse Mercator, zone 1-60, northern or southern hemisphere.
/// Without a name or identifiers in `properties`, the conversion is named and
/// identified as in the EPSG registry ("UTM zone 31N", EPSG:16031)
pub fn create_utm(mut properties: IdentifiedObject, zone: u32, north: bool) -> Result<OperationRef, Error> {
    if !(1..=60).contains(&zone) {
        return Err(Error::BadParam("zone".to_string(), zone.to_string()));
    }
    let hemisphere = if north { 'N' } else { 'S' };
    if properties.name.is_empty() {
        properties.name = format!("UTM zone {zone}{hemisphere}");
    }
    if properties.identifiers.is_empty() {
        let code = if north { 16000 + zone } else { 17000 + zone };
        properties = properties.with_epsg(code);
    }
    let central_meridian = 6.0 * zone as f64 - 183.0;
    let false_northing = if north { 0.0 } else { 10_000_000.0 };
    projection(
        properties,
        epsg::TRANSVERSE_MERCATOR,
        &[0.0, central_meridian, 0.9996, 500_000.0, false_northing],
    )
}

pub fn create_transverse_mercator(
    properties: IdentifiedObject,
    center_lat: f64,
    center_lon: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [center_lat, center_lon, scale, false_easting, false_northing];
    projection(properties, epsg::TRANSVERSE_MERCATOR, &values)
}

pub fn create_lambert_conic_conformal_1sp(
    properties: IdentifiedObject,
    center_lat: f64,
    center_lon: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [center_lat, center_lon, scale, false_easting, false_northing];
    projection(properties, epsg::LAMBERT_CONIC_CONFORMAL_1SP, &values)
}

pub fn create_lambert_conic_conformal_2sp(
    properties: IdentifiedObject,
    false_origin_lat: f64,
    false_origin_lon: f64,
    first_parallel: f64,
    second_parallel: f64,
    false_origin_easting: f64,
    false_origin_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [
        false_origin_lat,
        false_origin_lon,
        first_parallel,
        second_parallel,
        false_origin_easting,
        false_origin_northing,
    ];
    projection(properties, epsg::LAMBERT_CONIC_CONFORMAL_2SP, &values)
}

pub fn create_mercator_variant_a(
    properties: IdentifiedObject,
    center_lat: f64,
    center_lon: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [center_lat, center_lon, scale, false_easting, false_northing];
    projection(properties, epsg::MERCATOR_VARIANT_A, &values)
}

pub fn create_popular_visualisation_pseudo_mercator(
    properties: IdentifiedObject,
    center_lat: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [center_lat, center_lon, false_easting, false_northing];
    projection(properties, epsg::POPULAR_VISUALISATION_PSEUDO_MERCATOR, &values)
}

pub fn create_lambert_azimuthal_equal_area(
    properties: IdentifiedObject,
    center_lat: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
) -> Result<OperationRef, Error> {
    let values = [center_lat, center_lon, false_easting, false_northing];
    projection(properties, epsg::LAMBERT_AZIMUTHAL_EQUAL_AREA, &values)
}

// ----- N O N - P R O J E C T I O N   C O N V E R S I O N S ---------------------------

fn method_for(code: u32, values: &[OperationParameterValue]) -> OperationMethod {
    OperationMethod::for_values(method_name(code).unwrap_or_default(), Some(code), values)
}

/// Scaling of the vertical axis by `factor`
pub fn create_change_vertical_unit(properties: IdentifiedObject, factor: f64) -> Result<OperationRef, Error> {
    let values = vec![OperationParameterValue::measure(
        "Unit conversion scalar",
        epsg::UNIT_CONVERSION_SCALAR,
        Measure::unity(factor),
    )];
    let method = method_for(epsg::CHANGE_VERTICAL_UNIT, &values);
    create(properties, method, values)
}

/// Change of vertical unit between two CRS, with the factor given by their units
pub(crate) fn create_change_vertical_unit_between(
    properties: IdentifiedObject,
    source: &CrsRef,
    target: &CrsRef,
    factor: Option<f64>,
) -> Result<OperationRef, Error> {
    let (code, values) = match factor {
        Some(factor) => {
            let values = vec![OperationParameterValue::measure(
                "Unit conversion scalar",
                epsg::UNIT_CONVERSION_SCALAR,
                Measure::unity(factor),
            )];
            (epsg::CHANGE_VERTICAL_UNIT, values)
        }
        None => (epsg::CHANGE_VERTICAL_UNIT_NO_CONV_FACTOR, Vec::new()),
    };
    let method = method_for(code, &values);
    create_between(properties, source, target, method, values)
}

/// Geographic to geocentric, or the reverse, on the same datum
pub fn create_geographic_geocentric(source: &CrsRef, target: &CrsRef) -> Result<OperationRef, Error> {
    let geodetic = |crs: &CrsRef| crs.is_geographic() || crs.is_geocentric();
    if !geodetic(source) || !geodetic(target) || source.is_geographic() == target.is_geographic() {
        return Err(Error::InvalidOperation(
            "geographic/geocentric conversion needs one geographic and one geocentric CRS".to_string(),
        ));
    }
    let name = build_op_name("Conversion", source.name(), target.name());
    let properties = IdentifiedObject::named(&name).with_extent(Some(Extent::world()));
    let method = method_for(epsg::GEOGRAPHIC_GEOCENTRIC, &[]);
    create_between(properties, source, target, method, Vec::new())
}

/// Swapping of the horizontal axes
pub fn create_axis_order_reversal(is_3d: bool) -> Result<OperationRef, Error> {
    let code = if is_3d {
        epsg::AXIS_ORDER_REVERSAL_3D
    } else {
        epsg::AXIS_ORDER_REVERSAL_2D
    };
    let method = method_for(code, &[]);
    let properties = IdentifiedObject::named(method.name());
    create(properties, method, Vec::new())
}

// ----- U T M   D E T E C T I O N -----------------------------------------------------

impl SingleOperation {
    /// Zone and hemisphere, if this is a Transverse Mercator matching a UTM zone
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        use float_eq::float_eq;
        if self.method_code() != Some(epsg::TRANSVERSE_MERCATOR)
            && !is_equivalent_name(self.method.name(), "Transverse Mercator")
        {
            return None;
        }
        let lat_0 = self.value_in(epsg::LATITUDE_OF_NATURAL_ORIGIN, &unit::DEGREE)?;
        let lon_0 = self.value_in(epsg::LONGITUDE_OF_NATURAL_ORIGIN, &unit::DEGREE)?;
        let k = self.value_in(epsg::SCALE_FACTOR_AT_NATURAL_ORIGIN, &unit::UNITY)?;
        let x_0 = self.value_in(epsg::FALSE_EASTING, &unit::METRE)?;
        let y_0 = self.value_in(epsg::FALSE_NORTHING, &unit::METRE)?;

        if lat_0.abs() > 1e-10 || !float_eq!(k, 0.9996, abs <= 1e-10) {
            return None;
        }
        if !float_eq!(x_0, 500_000.0, abs <= 1e-8) {
            return None;
        }
        let north = match y_0 {
            y if float_eq!(y, 0.0, abs <= 1e-8) => true,
            y if float_eq!(y, 10_000_000.0, abs <= 1e-8) => false,
            _ => return None,
        };
        let zone = ((lon_0 + 183.0) / 6.0).round();
        if !(1.0..=60.0).contains(&zone) || !float_eq!(6.0 * zone - 183.0, lon_0, abs <= 1e-10) {
            return None;
        }
        Some((zone as u32, north))
    }
}

impl CoordinateOperation {
    /// Zone and hemisphere, if this is a conversion matching a UTM zone
    pub fn is_utm(&self) -> Option<(u32, bool)> {
        match &self.kind {
            OperationKind::Conversion(s) => s.utm_zone(),
            _ => None,
        }
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm() -> Result<(), Error> {
        let utm = create_utm(IdentifiedObject::default(), 31, true)?;
        assert_eq!(utm.name(), "UTM zone 31N");
        assert_eq!(utm.object.epsg_code(), Some(16031));
        assert_eq!(utm.is_utm(), Some((31, true)));
        assert_eq!(utm.method().map(|m| m.name()), Some("Transverse Mercator"));
        assert_eq!(utm.accuracy(), Some(0.0));

        let south = create_utm(IdentifiedObject::default(), 60, false)?;
        assert_eq!(south.name(), "UTM zone 60S");
        assert_eq!(south.object.epsg_code(), Some(17060));
        assert_eq!(south.is_utm(), Some((60, false)));

        // Properties given are kept
        let named = create_utm(IdentifiedObject::named("My UTM"), 32, true)?;
        assert_eq!(named.name(), "My UTM");
        assert_eq!(named.object.epsg_code(), Some(16032));
        assert_eq!(named.is_utm(), Some((32, true)));

        assert!(create_utm(IdentifiedObject::default(), 0, true).is_err());
        assert!(create_utm(IdentifiedObject::default(), 61, true).is_err());
        Ok(())
    }

    #[test]
    fn not_utm() -> Result<(), Error> {
        let tm = create_transverse_mercator(IdentifiedObject::named("DKTM1"), 0., 9., 0.99998, 200_000., -5_000_000.)?;
        assert_eq!(tm.is_utm(), None);
        let tm = create_transverse_mercator(IdentifiedObject::named("TM 4"), 0., 4., 0.9996, 500_000., 0.)?;
        assert_eq!(tm.is_utm(), None);
        let tm = create_transverse_mercator(IdentifiedObject::named("TM 3"), 0., 3., 0.9996, 500_000., 0.)?;
        assert_eq!(tm.is_utm(), Some((31, true)));
        Ok(())
    }

    #[test]
    fn projections() -> Result<(), Error> {
        let lcc = create_lambert_conic_conformal_1sp(IdentifiedObject::named("lcc"), 46.8, 2.337229, 0.99987742, 600_000., 2_200_000.)?;
        assert_eq!(lcc.single().unwrap().values.len(), 5);
        let lcc = create_lambert_conic_conformal_2sp(IdentifiedObject::named("lcc"), 46.5, 3., 49., 44., 700_000., 6_600_000.)?;
        assert_eq!(lcc.method_epsg_code(), Some(9802));
        let laea = create_lambert_azimuthal_equal_area(IdentifiedObject::named("laea"), 52., 10., 4_321_000., 3_210_000.)?;
        assert_eq!(laea.single().unwrap().value_in(8807, &unit::METRE), Some(3_210_000.));
        assert!(create_mercator_variant_a(IdentifiedObject::named("merc"), 0., 0., 1., 0., 0.).is_ok());
        assert!(create_popular_visualisation_pseudo_mercator(IdentifiedObject::named("webmerc"), 0., 0., 0., 0.).is_ok());
        Ok(())
    }

    #[test]
    fn other_conversions() -> Result<(), Error> {
        let swap = create_axis_order_reversal(false)?;
        assert_eq!(swap.name(), "Axis Order Reversal (2D)");
        assert_eq!(swap.method_epsg_code(), Some(9843));

        let wgs84 = crate::authority::builtin::wgs84_geographic_3d();
        let geocentric = crate::authority::builtin::wgs84_geocentric();
        let conv = create_geographic_geocentric(&wgs84, &geocentric)?;
        assert_eq!(conv.name(), "Conversion from WGS 84 to WGS 84");
        assert!(conv.is_conversion());
        assert!(create_geographic_geocentric(&wgs84, &wgs84).is_err());
        Ok(())
    }
}
