//! The builtin catalog content: a handful of EPSG CRS and the operations
//! connecting them. Enough for the common North American and French cases,
//! and for internal test authoring.
use crate::authoring::*;
use crate::crs::GeodeticCrs;
use crate::crs::VerticalCrs;
use crate::operation::conversion;
use crate::operation::transformation;

// (description, west, south, east, north)
#[rustfmt::skip]
const AREAS: [(&str, f64, f64, f64, f64); 7] = [
    ("World",                                 -180.0,  -90.0,  180.0,  90.0),
    ("North America - NAD83",                  167.65,  14.92, -40.73,  86.45),
    ("North America - NAD27",                  167.65,   7.15, -47.74,  83.17),
    ("USA - CONUS - onshore",                 -124.79,  24.41, -66.91,  49.38),
    ("Canada",                                -141.01,  40.04, -47.74,  83.17),
    ("France - onshore",                        -4.87,  41.31,   9.63,  51.14),
    ("North America - NAVD88",                -172.54,  23.81, -47.74,  86.46),
];

fn area(description: &str) -> Extent {
    let (name, w, s, e, n) = AREAS
        .iter()
        .find(|a| a.0 == description)
        .copied()
        .unwrap_or(AREAS[0]);
    Extent::new(name, GeographicBoundingBox::new(w, s, e, n))
}

fn geodesy(name: &str, code: u32, area_name: &str) -> IdentifiedObject {
    IdentifiedObject::named(name)
        .with_epsg(code)
        .with_domain("Geodesy.", area(area_name))
}

fn frame(name: &str, code: u32, ellps: &str, prime_meridian: PrimeMeridian) -> GeodeticReferenceFrame {
    let ellipsoid = Ellipsoid::named(ellps).unwrap_or_default();
    GeodeticReferenceFrame::new(IdentifiedObject::named(name).with_epsg(code), ellipsoid, prime_meridian)
}

// ----- D A T U M S -------------------------------------------------------------------

#[rustfmt::skip]
const WGS84_REALIZATIONS: [(&str, u32); 7] = [
    ("World Geodetic System 1984 (Transit)", 1166),
    ("World Geodetic System 1984 (G730)",    1152),
    ("World Geodetic System 1984 (G873)",    1153),
    ("World Geodetic System 1984 (G1150)",   1154),
    ("World Geodetic System 1984 (G1674)",   1155),
    ("World Geodetic System 1984 (G1762)",   1156),
    ("World Geodetic System 1984 (G2139)",   1309),
];

/// The WGS 84 datum ensemble, EPSG:6326
pub fn wgs84_ensemble() -> DatumOrEnsemble<GeodeticReferenceFrame> {
    let members = WGS84_REALIZATIONS
        .iter()
        .map(|(name, code)| frame(name, *code, "WGS84", PrimeMeridian::greenwich()))
        .collect();
    let object = IdentifiedObject::named("World Geodetic System 1984 ensemble").with_epsg(6326);
    let ensemble = DatumEnsemble {
        object,
        members,
        accuracy: 2.0,
    };
    DatumOrEnsemble::Ensemble(ensemble)
}

fn nad83_datum() -> DatumOrEnsemble<GeodeticReferenceFrame> {
    let datum = frame("North American Datum 1983", 6269, "GRS80", PrimeMeridian::greenwich());
    DatumOrEnsemble::Datum(datum)
}

fn nad27_datum() -> DatumOrEnsemble<GeodeticReferenceFrame> {
    let datum = frame("North American Datum 1927", 6267, "clrk66", PrimeMeridian::greenwich());
    DatumOrEnsemble::Datum(datum)
}

fn ntf_datum(prime_meridian: PrimeMeridian) -> DatumOrEnsemble<GeodeticReferenceFrame> {
    let datum = if prime_meridian.longitude.value == 0.0 {
        frame("Nouvelle Triangulation Francaise", 6275, "clrk80ign", prime_meridian)
    } else {
        frame("Nouvelle Triangulation Francaise (Paris)", 6807, "clrk80ign", prime_meridian)
    };
    DatumOrEnsemble::Datum(datum)
}

// ----- G E O D E T I C   C R S -------------------------------------------------------

// The builtin coordinate systems are known to fit their CRS kind
fn geographic(
    object: IdentifiedObject,
    datum: DatumOrEnsemble<GeodeticReferenceFrame>,
    cs: CoordinateSystem,
) -> CrsRef {
    Crs::wrap(object, CrsKind::Geographic(GeodeticCrs { datum, cs }))
}

/// WGS 84, EPSG:4326. Latitude, longitude in degrees
pub fn wgs84_geographic_2d() -> CrsRef {
    let object = IdentifiedObject::named("WGS 84")
        .with_epsg(4326)
        .with_domain("Horizontal component of 3D system.", area("World"));
    let cs = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
    geographic(object, wgs84_ensemble(), cs)
}

/// WGS 84, EPSG:4979. Latitude, longitude in degrees, ellipsoidal height in metres
pub fn wgs84_geographic_3d() -> CrsRef {
    let object = geodesy("WGS 84", 4979, "World");
    let cs = CoordinateSystem::ellipsoidal_3d_lat_lon_h(unit::DEGREE, unit::METRE);
    geographic(object, wgs84_ensemble(), cs)
}

/// WGS 84, EPSG:4978
pub fn wgs84_geocentric() -> CrsRef {
    Crs::geocentric(geodesy("WGS 84", 4978, "World"), wgs84_ensemble())
}

/// WGS 84 in the GIS axis order: longitude, latitude
pub fn ogc_crs84() -> CrsRef {
    let object = IdentifiedObject::named("WGS 84 (CRS84)")
        .with_id("OGC", "CRS84")
        .with_domain("Not known.", area("World"));
    let cs = CoordinateSystem::ellipsoidal_2d_lon_lat(unit::DEGREE);
    geographic(object, wgs84_ensemble(), cs)
}

/// NAD83, EPSG:4269
pub fn nad83_geographic_2d() -> CrsRef {
    let object = geodesy("NAD83", 4269, "North America - NAD83");
    let cs = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
    geographic(object, nad83_datum(), cs)
}

/// NAD27, EPSG:4267
pub fn nad27_geographic_2d() -> CrsRef {
    let object = geodesy("NAD27", 4267, "North America - NAD27");
    let cs = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
    geographic(object, nad27_datum(), cs)
}

/// NTF, EPSG:4275
pub fn ntf_geographic_2d() -> CrsRef {
    let object = geodesy("NTF", 4275, "France - onshore");
    let cs = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
    geographic(object, ntf_datum(PrimeMeridian::greenwich()), cs)
}

/// NTF (Paris), EPSG:4807. Latitude, longitude in grads, relative to the Paris meridian
pub fn ntf_paris_geographic_2d() -> CrsRef {
    let object = geodesy("NTF (Paris)", 4807, "France - onshore");
    let cs = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::GRAD);
    geographic(object, ntf_datum(PrimeMeridian::paris()), cs)
}

// ----- V E R T I C A L   C R S -------------------------------------------------------

fn vertical(object: IdentifiedObject, datum_name: &str, datum_code: u32, height_unit: UnitOfMeasure) -> CrsRef {
    let datum = VerticalReferenceFrame::new(IdentifiedObject::named(datum_name).with_epsg(datum_code));
    let datum = DatumOrEnsemble::Datum(datum);
    let cs = CoordinateSystem::gravity_related_height(height_unit);
    Crs::wrap(object, CrsKind::Vertical(VerticalCrs { datum, cs }))
}

/// EGM2008 height, EPSG:3855
pub fn egm2008_height() -> CrsRef {
    vertical(geodesy("EGM2008 height", 3855, "World"), "EGM2008 geoid", 1027, unit::METRE)
}

/// NAVD88 height, EPSG:5703
pub fn navd88_height() -> CrsRef {
    let object = geodesy("NAVD88 height", 5703, "North America - NAVD88");
    vertical(object, "North American Vertical Datum 1988", 5103, unit::METRE)
}

/// NAVD88 height (ft), EPSG:8228
pub fn navd88_height_ft() -> CrsRef {
    let object = geodesy("NAVD88 height (ft)", 8228, "North America - NAVD88");
    vertical(object, "North American Vertical Datum 1988", 5103, unit::FOOT)
}

/// MSL height, EPSG:5714
pub fn msl_height() -> CrsRef {
    vertical(geodesy("MSL height", 5714, "World"), "Mean Sea Level", 5100, unit::METRE)
}

// ----- C O M P O U N D   A N D   P R O J E C T E D   C R S ---------------------------

/// WGS 84 + EGM2008 height, EPSG:9518
pub fn wgs84_egm2008_compound() -> Result<CrsRef, Error> {
    wgs84_egm2008_compound_of(&wgs84_geographic_2d(), &egm2008_height())
}

pub(crate) fn wgs84_egm2008_compound_of(wgs84: &CrsRef, egm2008: &CrsRef) -> Result<CrsRef, Error> {
    let object = geodesy("WGS 84 + EGM2008 height", 9518, "World");
    Crs::compound(object, vec![wgs84.clone(), egm2008.clone()])
}

/// WGS 84 / UTM zone NN[N|S], EPSG:326NN or 327NN
pub fn utm(zone: u32, north: bool) -> Result<CrsRef, Error> {
    utm_on(&wgs84_geographic_2d(), zone, north)
}

/// A UTM projected CRS on `base`, which is assumed to be WGS 84
pub(crate) fn utm_on(base: &CrsRef, zone: u32, north: bool) -> Result<CrsRef, Error> {
    let conversion = conversion::create_utm(IdentifiedObject::default(), zone, north)?;
    let hemisphere = if north { 'N' } else { 'S' };
    let code = if north { 32600 + zone } else { 32700 + zone };
    let west = 6.0 * zone as f64 - 186.0;
    let (south, north_lat) = if north { (0.0, 84.0) } else { (-80.0, 0.0) };
    let bbox = GeographicBoundingBox::new(west, south, west + 6.0, north_lat);
    let description = format!("Between {}° and {}°", west, west + 6.0);
    let object = IdentifiedObject::named(&format!("WGS 84 / UTM zone {zone}{hemisphere}"))
        .with_epsg(code)
        .with_domain("Engineering survey, topographic mapping.", Extent::new(&description, bbox));
    let cs = CoordinateSystem::easting_northing(unit::METRE);
    Crs::projected(object, base.clone(), &conversion, cs)
}

// ----- O P E R A T I O N S -----------------------------------------------------------

fn op_object(name: &str, code: u32, area_name: &str) -> IdentifiedObject {
    IdentifiedObject::named(name)
        .with_epsg(code)
        .with_domain("Transformation of coordinates.", area(area_name))
}

/// NAD83 to WGS 84 (1), EPSG:1188. A null translation, accurate to 4 m
pub fn nad83_to_wgs84_1(nad83: &CrsRef, wgs84: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NAD83 to WGS 84 (1)", 1188, "North America - NAD83");
    let accuracy = [PositionalAccuracy(4.0)];
    transformation::create_geocentric_translations(properties, nad83, wgs84, [0.0, 0.0, 0.0], &accuracy)
}

/// NAD83 to WGS 84 (5), EPSG:1515. Coordinate frame rotation, CONUS
pub fn nad83_to_wgs84_5(nad83: &CrsRef, wgs84: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NAD83 to WGS 84 (5)", 1515, "USA - CONUS - onshore");
    #[rustfmt::skip]
    let params = [-0.991, 1.9072, 0.5129, -0.025_789_907_5, -0.009_650_098_9, -0.011_659_943_2, 0.0];
    let accuracy = [PositionalAccuracy(1.0)];
    transformation::create_coordinate_frame_rotation(properties, nad83, wgs84, params, &accuracy)
}

/// NAD27 to NAD83 (1), EPSG:1241. NADCON, CONUS
pub fn nad27_to_nad83_1(nad27: &CrsRef, nad83: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NAD27 to NAD83 (1)", 1241, "USA - CONUS - onshore");
    let accuracy = [PositionalAccuracy(0.15)];
    transformation::create_nadcon(properties, nad27, nad83, "conus.las", "conus.los", &accuracy)
}

/// NAD27 to NAD83 (4), EPSG:1313. NTv2, Canada
pub fn nad27_to_nad83_4(nad27: &CrsRef, nad83: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NAD27 to NAD83 (4)", 1313, "Canada");
    let accuracy = [PositionalAccuracy(1.5)];
    transformation::create_ntv2(properties, nad27, nad83, "ntv2_0.gsb", &accuracy)
}

/// NAD27 to WGS 84 (4), EPSG:1173. Geocentric translations, accurate to 10 m
pub fn nad27_to_wgs84_4(nad27: &CrsRef, wgs84: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NAD27 to WGS 84 (4)", 1173, "North America - NAD27");
    let accuracy = [PositionalAccuracy(10.0)];
    transformation::create_geocentric_translations(properties, nad27, wgs84, [-8.0, 160.0, 176.0], &accuracy)
}

/// NTF to WGS 84 (1), EPSG:1193
pub fn ntf_to_wgs84_1(ntf: &CrsRef, wgs84: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NTF to WGS 84 (1)", 1193, "France - onshore");
    let accuracy = [PositionalAccuracy(2.0)];
    transformation::create_geocentric_translations(properties, ntf, wgs84, [-168.0, -60.0, 320.0], &accuracy)
}

/// NTF (Paris) to NTF (1), EPSG:1763
pub fn ntf_paris_to_ntf_1(ntf_paris: &CrsRef, ntf: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("NTF (Paris) to NTF (1)", 1763, "France - onshore");
    let offset = Measure::new(2.5969213, unit::GRAD);
    let accuracy = [PositionalAccuracy(0.0)];
    transformation::create_longitude_rotation(properties, ntf_paris, ntf, offset, &accuracy)
}

/// WGS 84 to EGM2008 height (1), EPSG:3858
pub fn wgs84_to_egm2008_height_1(wgs84_3d: &CrsRef, egm2008: &CrsRef) -> Result<OperationRef, Error> {
    let properties = op_object("WGS 84 to EGM2008 height (1)", 3858, "World");
    let accuracy = [PositionalAccuracy(1.0)];
    let grid = "us_nga_egm08_25.tif";
    transformation::create_geographic_3d_to_gravity_related_height(properties, wgs84_3d, egm2008, grid, &accuracy)
}

/// Descriptions of the grids used by the builtin operations
pub fn grids() -> Vec<GridInfo> {
    vec![
        GridInfo::named("conus.las")
            .with_alternative_name("us_noaa_conus.tif")
            .with_url("https://cdn.proj.org/us_noaa_conus.tif"),
        GridInfo::named("conus.los")
            .with_alternative_name("us_noaa_conus.tif")
            .with_url("https://cdn.proj.org/us_noaa_conus.tif"),
        GridInfo::named("ntv2_0.gsb")
            .with_alternative_name("ca_nrc_ntv2_0.tif")
            .with_url("https://cdn.proj.org/ca_nrc_ntv2_0.tif"),
        GridInfo::named("us_nga_egm08_25.tif").with_url("https://cdn.proj.org/us_nga_egm08_25.tif"),
    ]
}

// ----- T E S T S ------------------------------------------------------------------
