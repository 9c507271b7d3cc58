//! Static tables mapping EPSG method and parameter identities onto their
//! WKT1 (GDAL flavour) names and PROJ string tokens.
use crate::authoring::*;
use once_cell::sync::Lazy;

/// EPSG codes of the methods and parameters handled by this crate
pub mod epsg {
    // Projection methods
    pub const TRANSVERSE_MERCATOR: u32 = 9807;
    pub const TRANSVERSE_MERCATOR_SOUTH_ORIENTATED: u32 = 9808;
    pub const LAMBERT_CONIC_CONFORMAL_1SP: u32 = 9801;
    pub const LAMBERT_CONIC_CONFORMAL_2SP: u32 = 9802;
    pub const ALBERS_EQUAL_AREA: u32 = 9822;
    pub const MERCATOR_VARIANT_A: u32 = 9804;
    pub const MERCATOR_VARIANT_B: u32 = 9805;
    pub const POPULAR_VISUALISATION_PSEUDO_MERCATOR: u32 = 1024;
    pub const LAMBERT_AZIMUTHAL_EQUAL_AREA: u32 = 9820;
    pub const OBLIQUE_STEREOGRAPHIC: u32 = 9809;
    pub const POLAR_STEREOGRAPHIC_VARIANT_A: u32 = 9810;
    pub const POLAR_STEREOGRAPHIC_VARIANT_B: u32 = 9829;
    pub const EQUIDISTANT_CYLINDRICAL: u32 = 1028;
    pub const HOTINE_OBLIQUE_MERCATOR_VARIANT_A: u32 = 9812;
    pub const HOTINE_OBLIQUE_MERCATOR_VARIANT_B: u32 = 9815;

    // Other conversions
    pub const GEOGRAPHIC_GEOCENTRIC: u32 = 9602;
    pub const CHANGE_VERTICAL_UNIT: u32 = 1069;
    pub const CHANGE_VERTICAL_UNIT_NO_CONV_FACTOR: u32 = 1104;
    pub const AXIS_ORDER_REVERSAL_2D: u32 = 9843;
    pub const AXIS_ORDER_REVERSAL_3D: u32 = 9844;

    // Transformations
    pub const COORDINATE_FRAME_GEOCENTRIC: u32 = 1032;
    pub const COORDINATE_FRAME_GEOGRAPHIC_2D: u32 = 9607;
    pub const COORDINATE_FRAME_GEOGRAPHIC_3D: u32 = 1038;
    pub const POSITION_VECTOR_GEOCENTRIC: u32 = 1033;
    pub const POSITION_VECTOR_GEOGRAPHIC_2D: u32 = 9606;
    pub const POSITION_VECTOR_GEOGRAPHIC_3D: u32 = 1037;
    pub const TIME_DEPENDENT_POSITION_VECTOR_GEOCENTRIC: u32 = 1053;
    pub const TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_2D: u32 = 1054;
    pub const TIME_DEPENDENT_POSITION_VECTOR_GEOGRAPHIC_3D: u32 = 1055;
    pub const TIME_DEPENDENT_COORDINATE_FRAME_GEOCENTRIC: u32 = 1056;
    pub const TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_2D: u32 = 1057;
    pub const TIME_DEPENDENT_COORDINATE_FRAME_GEOGRAPHIC_3D: u32 = 1058;
    pub const GEOCENTRIC_TRANSLATION_GEOCENTRIC: u32 = 1031;
    pub const GEOCENTRIC_TRANSLATION_GEOGRAPHIC_2D: u32 = 9603;
    pub const GEOCENTRIC_TRANSLATION_GEOGRAPHIC_3D: u32 = 1035;
    pub const MOLODENSKY: u32 = 9604;
    pub const ABRIDGED_MOLODENSKY: u32 = 9605;
    pub const NTV1: u32 = 9614;
    pub const NTV2: u32 = 9615;
    pub const NADCON: u32 = 9613;
    pub const VERTCON: u32 = 9658;
    pub const LONGITUDE_ROTATION: u32 = 9601;
    pub const VERTICAL_OFFSET: u32 = 9616;
    pub const GEOGRAPHIC_2D_OFFSETS: u32 = 9619;
    pub const GEOGRAPHIC_2D_WITH_HEIGHT_OFFSETS: u32 = 9618;
    pub const GEOGRAPHIC_3D_OFFSETS: u32 = 9660;
    pub const AFFINE_PARAMETRIC: u32 = 9624;
    pub const GEOGRAPHIC_3D_TO_GRAVITY_RELATED_HEIGHT_EGM: u32 = 9661;
    pub const GEOGRAPHIC_3D_TO_GRAVITY_RELATED_HEIGHT_EGM2008: u32 = 1025;

    // Projection parameters
    pub const LATITUDE_OF_NATURAL_ORIGIN: u32 = 8801;
    pub const LONGITUDE_OF_NATURAL_ORIGIN: u32 = 8802;
    pub const SCALE_FACTOR_AT_NATURAL_ORIGIN: u32 = 8805;
    pub const FALSE_EASTING: u32 = 8806;
    pub const FALSE_NORTHING: u32 = 8807;
    pub const LATITUDE_OF_FALSE_ORIGIN: u32 = 8821;
    pub const LONGITUDE_OF_FALSE_ORIGIN: u32 = 8822;
    pub const LATITUDE_1ST_STD_PARALLEL: u32 = 8823;
    pub const LATITUDE_2ND_STD_PARALLEL: u32 = 8824;
    pub const EASTING_FALSE_ORIGIN: u32 = 8826;
    pub const NORTHING_FALSE_ORIGIN: u32 = 8827;
    pub const LATITUDE_STD_PARALLEL: u32 = 8832;
    pub const LONGITUDE_OF_ORIGIN: u32 = 8833;
    pub const LATITUDE_PROJECTION_CENTRE: u32 = 8811;
    pub const LONGITUDE_PROJECTION_CENTRE: u32 = 8812;
    pub const AZIMUTH_INITIAL_LINE: u32 = 8813;
    pub const ANGLE_RECTIFIED_TO_SKEW_GRID: u32 = 8814;
    pub const SCALE_FACTOR_INITIAL_LINE: u32 = 8815;
    pub const EASTING_PROJECTION_CENTRE: u32 = 8816;
    pub const NORTHING_PROJECTION_CENTRE: u32 = 8817;

    // Transformation parameters
    pub const X_AXIS_TRANSLATION: u32 = 8605;
    pub const Y_AXIS_TRANSLATION: u32 = 8606;
    pub const Z_AXIS_TRANSLATION: u32 = 8607;
    pub const X_AXIS_ROTATION: u32 = 8608;
    pub const Y_AXIS_ROTATION: u32 = 8609;
    pub const Z_AXIS_ROTATION: u32 = 8610;
    pub const SCALE_DIFFERENCE: u32 = 8611;
    pub const RATE_X_AXIS_TRANSLATION: u32 = 1040;
    pub const RATE_Y_AXIS_TRANSLATION: u32 = 1041;
    pub const RATE_Z_AXIS_TRANSLATION: u32 = 1042;
    pub const RATE_X_AXIS_ROTATION: u32 = 1043;
    pub const RATE_Y_AXIS_ROTATION: u32 = 1044;
    pub const RATE_Z_AXIS_ROTATION: u32 = 1045;
    pub const RATE_SCALE_DIFFERENCE: u32 = 1046;
    pub const REFERENCE_EPOCH: u32 = 1047;
    pub const SEMI_MAJOR_AXIS_DIFFERENCE: u32 = 8654;
    pub const FLATTENING_DIFFERENCE: u32 = 8655;
    pub const LATITUDE_OFFSET: u32 = 8601;
    pub const LONGITUDE_OFFSET: u32 = 8602;
    pub const VERTICAL_OFFSET_PARAM: u32 = 8603;
    pub const GEOID_UNDULATION: u32 = 8604;
    pub const LATITUDE_LONGITUDE_DIFFERENCE_FILE: u32 = 8656;
    pub const LATITUDE_DIFFERENCE_FILE: u32 = 8657;
    pub const LONGITUDE_DIFFERENCE_FILE: u32 = 8658;
    pub const GEOID_MODEL_FILE: u32 = 8666;
    pub const VERTICAL_OFFSET_FILE: u32 = 8732;
    pub const UNIT_CONVERSION_SCALAR: u32 = 1051;
}

/// A parameter, as seen by the three dialects
#[derive(Debug)]
pub struct ParamMapping {
    pub epsg_name: &'static str,
    pub epsg_code: u32,
    pub wkt1_name: Option<&'static str>,
    pub proj_name: Option<&'static str>,
    pub kind: UnitType,
}

/// A method, as seen by the three dialects. `proj_aux` lists extra
/// tokens emitted after the `+proj=` token
#[derive(Debug)]
pub struct MethodMapping {
    pub epsg_name: &'static str,
    pub epsg_code: u32,
    pub wkt1_name: Option<&'static str>,
    pub proj_name: Option<&'static str>,
    pub proj_aux: &'static [&'static str],
    pub params: &'static [&'static ParamMapping],
}

impl MethodMapping {
    pub fn param(&self, epsg_code: u32) -> Option<&'static ParamMapping> {
        self.params.iter().find(|p| p.epsg_code == epsg_code).copied()
    }
}

const fn param(
    epsg_name: &'static str,
    epsg_code: u32,
    wkt1_name: Option<&'static str>,
    proj_name: Option<&'static str>,
    kind: UnitType,
) -> ParamMapping {
    ParamMapping {
        epsg_name,
        epsg_code,
        wkt1_name,
        proj_name,
        kind,
    }
}

use crate::common::UnitType::Angular;
use crate::common::UnitType::Linear;
use crate::common::UnitType::Scale;

#[rustfmt::skip] const LAT_NAT_ORIGIN: ParamMapping = param("Latitude of natural origin", 8801, Some("latitude_of_origin"), Some("lat_0"), Angular);
#[rustfmt::skip] const LAT_NAT_ORIGIN_NOT_EMITTED: ParamMapping = param("Latitude of natural origin", 8801, Some("latitude_of_origin"), None, Angular);
#[rustfmt::skip] const LAT_NAT_ORIGIN_LAT_1: ParamMapping = param("Latitude of natural origin", 8801, Some("latitude_of_origin"), Some("lat_1"), Angular);
#[rustfmt::skip] const LON_NAT_ORIGIN: ParamMapping = param("Longitude of natural origin", 8802, Some("central_meridian"), Some("lon_0"), Angular);
#[rustfmt::skip] const SCALE_NAT_ORIGIN: ParamMapping = param("Scale factor at natural origin", 8805, Some("scale_factor"), Some("k"), Scale);
#[rustfmt::skip] const SCALE_NAT_ORIGIN_K0: ParamMapping = param("Scale factor at natural origin", 8805, Some("scale_factor"), Some("k_0"), Scale);
#[rustfmt::skip] const FALSE_EASTING: ParamMapping = param("False easting", 8806, Some("false_easting"), Some("x_0"), Linear);
#[rustfmt::skip] const FALSE_NORTHING: ParamMapping = param("False northing", 8807, Some("false_northing"), Some("y_0"), Linear);
#[rustfmt::skip] const LAT_FALSE_ORIGIN: ParamMapping = param("Latitude of false origin", 8821, Some("latitude_of_origin"), Some("lat_0"), Angular);
#[rustfmt::skip] const LON_FALSE_ORIGIN: ParamMapping = param("Longitude of false origin", 8822, Some("central_meridian"), Some("lon_0"), Angular);
#[rustfmt::skip] const LAT_1ST_STD_PARALLEL: ParamMapping = param("Latitude of 1st standard parallel", 8823, Some("standard_parallel_1"), Some("lat_1"), Angular);
#[rustfmt::skip] const LAT_1ST_STD_PARALLEL_LAT_TS: ParamMapping = param("Latitude of 1st standard parallel", 8823, Some("standard_parallel_1"), Some("lat_ts"), Angular);
#[rustfmt::skip] const LAT_2ND_STD_PARALLEL: ParamMapping = param("Latitude of 2nd standard parallel", 8824, Some("standard_parallel_2"), Some("lat_2"), Angular);
#[rustfmt::skip] const EASTING_FALSE_ORIGIN: ParamMapping = param("Easting at false origin", 8826, Some("false_easting"), Some("x_0"), Linear);
#[rustfmt::skip] const NORTHING_FALSE_ORIGIN: ParamMapping = param("Northing at false origin", 8827, Some("false_northing"), Some("y_0"), Linear);
#[rustfmt::skip] const LAT_STD_PARALLEL: ParamMapping = param("Latitude of standard parallel", 8832, Some("latitude_of_origin"), Some("lat_ts"), Angular);
#[rustfmt::skip] const LON_ORIGIN: ParamMapping = param("Longitude of origin", 8833, Some("central_meridian"), Some("lon_0"), Angular);
#[rustfmt::skip] const LAT_PROJ_CENTRE: ParamMapping = param("Latitude of projection centre", 8811, Some("latitude_of_center"), Some("lat_0"), Angular);
#[rustfmt::skip] const LON_PROJ_CENTRE: ParamMapping = param("Longitude of projection centre", 8812, Some("longitude_of_center"), Some("lonc"), Angular);
#[rustfmt::skip] const AZIMUTH: ParamMapping = param("Azimuth of initial line", 8813, Some("azimuth"), Some("alpha"), Angular);
#[rustfmt::skip] const RECTIFIED_GRID_ANGLE: ParamMapping = param("Angle from Rectified to Skew Grid", 8814, Some("rectified_grid_angle"), Some("gamma"), Angular);
#[rustfmt::skip] const SCALE_INITIAL_LINE: ParamMapping = param("Scale factor on initial line", 8815, Some("scale_factor"), Some("k"), Scale);
#[rustfmt::skip] const EASTING_PROJ_CENTRE: ParamMapping = param("Easting at projection centre", 8816, Some("false_easting"), Some("x_0"), Linear);
#[rustfmt::skip] const NORTHING_PROJ_CENTRE: ParamMapping = param("Northing at projection centre", 8817, Some("false_northing"), Some("y_0"), Linear);

const NAT_ORIGIN: [&ParamMapping; 5] = [&LAT_NAT_ORIGIN, &LON_NAT_ORIGIN, &SCALE_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING];
const FALSE_ORIGIN_2SP: [&ParamMapping; 6] = [
    &LAT_FALSE_ORIGIN, &LON_FALSE_ORIGIN, &LAT_1ST_STD_PARALLEL, &LAT_2ND_STD_PARALLEL, &EASTING_FALSE_ORIGIN, &NORTHING_FALSE_ORIGIN,
];

#[rustfmt::skip]
pub static METHOD_MAPPINGS: [MethodMapping; 15] = [
    MethodMapping { epsg_name: "Transverse Mercator", epsg_code: 9807, wkt1_name: Some("Transverse_Mercator"), proj_name: Some("tmerc"), proj_aux: &[], params: &NAT_ORIGIN },
    MethodMapping { epsg_name: "Transverse Mercator (South Orientated)", epsg_code: 9808, wkt1_name: Some("Transverse_Mercator_South_Orientated"), proj_name: Some("tmerc"), proj_aux: &["axis=wsu"], params: &NAT_ORIGIN },
    MethodMapping { epsg_name: "Lambert Conic Conformal (1SP)", epsg_code: 9801, wkt1_name: Some("Lambert_Conformal_Conic_1SP"), proj_name: Some("lcc"), proj_aux: &[],
        params: &[&LAT_NAT_ORIGIN_LAT_1, &LAT_NAT_ORIGIN, &LON_NAT_ORIGIN, &SCALE_NAT_ORIGIN_K0, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Lambert Conic Conformal (2SP)", epsg_code: 9802, wkt1_name: Some("Lambert_Conformal_Conic_2SP"), proj_name: Some("lcc"), proj_aux: &[], params: &FALSE_ORIGIN_2SP },
    MethodMapping { epsg_name: "Albers Equal Area", epsg_code: 9822, wkt1_name: Some("Albers_Conic_Equal_Area"), proj_name: Some("aea"), proj_aux: &[], params: &FALSE_ORIGIN_2SP },
    MethodMapping { epsg_name: "Mercator (variant A)", epsg_code: 9804, wkt1_name: Some("Mercator_1SP"), proj_name: Some("merc"), proj_aux: &[],
        params: &[&LAT_NAT_ORIGIN_NOT_EMITTED, &LON_NAT_ORIGIN, &SCALE_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Mercator (variant B)", epsg_code: 9805, wkt1_name: Some("Mercator_2SP"), proj_name: Some("merc"), proj_aux: &[],
        params: &[&LAT_1ST_STD_PARALLEL_LAT_TS, &LON_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Popular Visualisation Pseudo Mercator", epsg_code: 1024, wkt1_name: Some("Popular_Visualisation_Pseudo_Mercator"), proj_name: Some("webmerc"), proj_aux: &[],
        params: &[&LAT_NAT_ORIGIN, &LON_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Lambert Azimuthal Equal Area", epsg_code: 9820, wkt1_name: Some("Lambert_Azimuthal_Equal_Area"), proj_name: Some("laea"), proj_aux: &[],
        params: &[&LAT_NAT_ORIGIN, &LON_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Oblique Stereographic", epsg_code: 9809, wkt1_name: Some("Oblique_Stereographic"), proj_name: Some("sterea"), proj_aux: &[], params: &NAT_ORIGIN },
    MethodMapping { epsg_name: "Polar Stereographic (variant A)", epsg_code: 9810, wkt1_name: Some("Polar_Stereographic"), proj_name: Some("stere"), proj_aux: &[], params: &NAT_ORIGIN },
    MethodMapping { epsg_name: "Polar Stereographic (variant B)", epsg_code: 9829, wkt1_name: Some("Polar_Stereographic"), proj_name: Some("stere"), proj_aux: &[],
        params: &[&LAT_STD_PARALLEL, &LON_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Equidistant Cylindrical", epsg_code: 1028, wkt1_name: Some("Equirectangular"), proj_name: Some("eqc"), proj_aux: &[],
        params: &[&LAT_1ST_STD_PARALLEL_LAT_TS, &LON_NAT_ORIGIN, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Hotine Oblique Mercator (variant A)", epsg_code: 9812, wkt1_name: Some("Hotine_Oblique_Mercator"), proj_name: Some("omerc"), proj_aux: &["no_uoff"],
        params: &[&LAT_PROJ_CENTRE, &LON_PROJ_CENTRE, &AZIMUTH, &RECTIFIED_GRID_ANGLE, &SCALE_INITIAL_LINE, &FALSE_EASTING, &FALSE_NORTHING] },
    MethodMapping { epsg_name: "Hotine Oblique Mercator (variant B)", epsg_code: 9815, wkt1_name: Some("Hotine_Oblique_Mercator_Azimuth_Center"), proj_name: Some("omerc"), proj_aux: &[],
        params: &[&LAT_PROJ_CENTRE, &LON_PROJ_CENTRE, &AZIMUTH, &RECTIFIED_GRID_ANGLE, &SCALE_INITIAL_LINE, &EASTING_PROJ_CENTRE, &NORTHING_PROJ_CENTRE] },
];

/// Names of the non-projection methods, for naming operations built from a code
#[rustfmt::skip]
pub const OTHER_METHOD_NAMES: [(u32, &str); 34] = [
    (9602, "Geographic/geocentric conversions"),
    (1069, "Change of Vertical Unit"),
    (1104, "Change of Vertical Unit"),
    (9843, "Axis Order Reversal (2D)"),
    (9844, "Axis Order Reversal (Geographic3D horizontal)"),
    (1032, "Coordinate Frame rotation (geocentric domain)"),
    (9607, "Coordinate Frame rotation (geog2D domain)"),
    (1038, "Coordinate Frame rotation (geog3D domain)"),
    (1033, "Position Vector transformation (geocentric domain)"),
    (9606, "Position Vector transformation (geog2D domain)"),
    (1037, "Position Vector transformation (geog3D domain)"),
    (1053, "Time-dependent Position Vector tfm (geocentric)"),
    (1054, "Time-dependent Position Vector tfm (geog2D)"),
    (1055, "Time-dependent Position Vector tfm (geog3D)"),
    (1056, "Time-dependent Coordinate Frame rotation (geocen)"),
    (1057, "Time-dependent Coordinate Frame rotation (geog2D)"),
    (1058, "Time-dependent Coordinate Frame rotation (geog3D)"),
    (1031, "Geocentric translations (geocentric domain)"),
    (9603, "Geocentric translations (geog2D domain)"),
    (1035, "Geocentric translations (geog3D domain)"),
    (9604, "Molodensky"),
    (9605, "Abridged Molodensky"),
    (9614, "NTv1"),
    (9615, "NTv2"),
    (9613, "NADCON"),
    (9658, "VERTCON"),
    (9601, "Longitude rotation"),
    (9616, "Vertical Offset"),
    (9619, "Geographic2D offsets"),
    (9618, "Geographic2D with Height Offsets"),
    (9660, "Geographic3D offsets"),
    (9624, "Affine parametric transformation"),
    (9661, "Geographic3D to GravityRelatedHeight (EGM)"),
    (1025, "Geographic3D to GravityRelatedHeight (EGM2008)"),
];

pub fn method_mapping_by_code(epsg_code: u32) -> Option<&'static MethodMapping> {
    METHOD_MAPPINGS.iter().find(|m| m.epsg_code == epsg_code)
}

/// Look up a method by EPSG name or WKT1 name
pub fn method_mapping_by_name(name: &str) -> Option<&'static MethodMapping> {
    METHOD_MAPPINGS.iter().find(|m| {
        is_equivalent_name(m.epsg_name, name)
            || m.wkt1_name.map_or(false, |w| is_equivalent_name(w, name))
    })
}

/// The mapping of a method, from its EPSG code, or failing that, its name
pub fn method_mapping(method: &OperationMethod) -> Option<&'static MethodMapping> {
    if let Some(code) = method.epsg_code() {
        return method_mapping_by_code(code);
    }
    method_mapping_by_name(method.name())
}

/// Name of a method given by its EPSG code
pub fn method_name(epsg_code: u32) -> Option<&'static str> {
    if let Some(m) = method_mapping_by_code(epsg_code) {
        return Some(m.epsg_name);
    }
    OTHER_METHOD_NAMES
        .iter()
        .find(|(code, _)| *code == epsg_code)
        .map(|(_, name)| *name)
}

// ----- E Q U I V A L E N T   P A R A M E T E R S -------------------------------------

// Parameter names used interchangeably across catalogs and WKT dialects
#[rustfmt::skip]
const EQUIVALENT_PARAMETER_NAMES: [&[&str]; 7] = [
    &["Latitude of natural origin", "Latitude of origin", "Latitude of false origin", "Latitude of projection centre", "latitude_of_center"],
    &["Longitude of natural origin", "Central meridian", "Longitude of origin", "Longitude of false origin", "Longitude of projection centre", "longitude_of_center"],
    &["Scale factor at natural origin", "Scale factor", "Scale factor on initial line"],
    &["False easting", "Easting at false origin", "Easting at projection centre"],
    &["False northing", "Northing at false origin", "Northing at projection centre"],
    &["Latitude of 1st standard parallel", "Latitude of standard parallel", "standard_parallel_1"],
    &["Azimuth of initial line", "azimuth", "Azimuth at projection centre"],
];

// Normalized name -> index of its equivalence group
static EQUIVALENT_PARAMETERS: Lazy<BTreeMap<String, usize>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    for (i, group) in EQUIVALENT_PARAMETER_NAMES.iter().enumerate() {
        for name in group.iter() {
            map.insert(normalized(name), i);
        }
    }
    map
});

// Normalized name -> EPSG code, for parameters given by name only.
// The first mapping of a name wins, so "latitude_of_origin" is 8801
static PARAMETER_CODES: Lazy<BTreeMap<String, u32>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    for p in METHOD_MAPPINGS.iter().flat_map(|m| m.params.iter()) {
        map.entry(normalized(p.epsg_name)).or_insert(p.epsg_code);
        if let Some(wkt1) = p.wkt1_name {
            map.entry(normalized(wkt1)).or_insert(p.epsg_code);
        }
    }
    map.entry(normalized("Latitude of origin")).or_insert(8801);
    map.entry(normalized("Scale factor")).or_insert(8805);
    map
});

fn normalized(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

pub fn param_code_from_name(name: &str) -> Option<u32> {
    PARAMETER_CODES.get(&normalized(name)).copied()
}

pub fn are_equivalent_parameters(a: &str, b: &str) -> bool {
    if is_equivalent_name(a, b) {
        return true;
    }
    let (Some(ga), Some(gb)) = (
        EQUIVALENT_PARAMETERS.get(&normalized(a)),
        EQUIVALENT_PARAMETERS.get(&normalized(b)),
    ) else {
        return false;
    };
    ga == gb
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods() {
        let tm = method_mapping_by_code(epsg::TRANSVERSE_MERCATOR).unwrap();
        assert_eq!(tm.proj_name, Some("tmerc"));
        assert_eq!(tm.params.len(), 5);
        assert_eq!(tm.param(8805).and_then(|p| p.proj_name), Some("k"));

        let lcc = method_mapping_by_name("Lambert_Conformal_Conic_1SP").unwrap();
        assert_eq!(lcc.epsg_code, 9801);
        assert_eq!(method_name(9603), Some("Geocentric translations (geog2D domain)"));
        assert_eq!(method_name(8801), None);
        assert!(method_mapping_by_code(9603).is_none());

        for m in METHOD_MAPPINGS.iter() {
            assert!(m.proj_name.is_some());
            assert!(m.wkt1_name.is_some());
        }
    }

    #[test]
    fn parameter_names() {
        assert_eq!(param_code_from_name("latitude_of_origin"), Some(8801));
        assert_eq!(param_code_from_name("Scale factor"), Some(8805));
        assert_eq!(param_code_from_name("false_northing"), Some(8807));
        assert_eq!(param_code_from_name("Sparkle factor"), None);
        assert!(are_equivalent_parameters("False easting", "Easting at false origin"));
        assert!(are_equivalent_parameters("Central meridian", "Longitude of natural origin"));
        assert!(!are_equivalent_parameters("False easting", "False northing"));
    }
}
