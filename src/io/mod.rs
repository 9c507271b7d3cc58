//! Export of CRS and coordinate operations as text: PROJ strings and WKT
pub mod proj_string;
pub mod wkt;

use crate::authoring::*;

/// The WKT dialects supported for export
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WktVersion {
    /// ISO 19162:2019, single line
    #[default]
    Wkt2_2019,
    /// The legacy GDAL dialect. CRS and conversions only
    Wkt1Gdal,
}

/// Shortest decimal representation of `x`. Negative zero is written as "0"
pub fn format_number(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    format!("{x}")
}

/// `x` rounded to 15 significant digits, then formatted as by [`format_number`].
/// Removes the noise of unit factors computed as quotients (e.g. π/180)
pub(crate) fn format_significant(x: f64) -> String {
    let rounded = format!("{x:.14e}").parse::<f64>().unwrap_or(x);
    format_number(rounded)
}

impl Crs {
    /// The CRS as a PROJ string, `+type=crs` style
    pub fn export_to_proj_string(&self) -> Result<String, Error> {
        proj_string::crs_definition(self)
    }

    pub fn export_to_wkt(&self, version: WktVersion) -> Result<String, Error> {
        match version {
            WktVersion::Wkt2_2019 => wkt::crs_wkt2(self),
            WktVersion::Wkt1Gdal => wkt::crs_wkt1(self),
        }
    }
}

impl CoordinateOperation {
    /// The operation as a PROJ pipeline
    pub fn export_to_proj_string(&self) -> Result<String, Error> {
        Ok(proj_string::operation_pipeline(self)?.to_string())
    }

    pub fn export_to_wkt(&self, version: WktVersion) -> Result<String, Error> {
        match version {
            WktVersion::Wkt2_2019 => wkt::operation_wkt2(self),
            WktVersion::Wkt1Gdal => wkt::operation_wkt1(self),
        }
    }
}

// ----- T E S T S ------------------------------------------------------------------
