use crate::authoring::*;

/// Representation of a biaxial ellipsoid, or a sphere, tied to a celestial body.
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    pub object: IdentifiedObject,
    a: f64,
    f: f64,
    body: String,
}

pub const EARTH: &str = "Earth";

// (PROJ name, EPSG name, EPSG code, a, 1/f)
#[rustfmt::skip]
const ELLIPSOIDS: [(&str, &str, u32, f64, f64); 9] = [
    ("GRS80",     "GRS 1980",                7019, 6_378_137.0,   298.257_222_101),
    ("WGS84",     "WGS 84",                  7030, 6_378_137.0,   298.257_223_563),
    ("intl",      "International 1924",      7022, 6_378_388.0,   297.0),
    ("clrk66",    "Clarke 1866",             7008, 6_378_206.4,   294.978_698_213_898),
    ("clrk80ign", "Clarke 1880 (IGN)",       7011, 6_378_249.2,   293.466_021_293_627),
    ("clrk80",    "Clarke 1880 (RGS)",       7012, 6_378_249.145, 293.465),
    ("bessel",    "Bessel 1841",             7004, 6_377_397.155, 299.152_812_8),
    ("krass",     "Krassowsky 1940",         7024, 6_378_245.0,   298.3),
    ("sphere",    "Sphere",                  7035, 6_370_997.0,   0.0),
];

/// GRS80 is the default ellipsoid.
impl Default for Ellipsoid {
    fn default() -> Ellipsoid {
        Ellipsoid::new("GRS 1980", 6_378_137.0, 298.257_222_101).with_epsg(7019)
    }
}

impl Ellipsoid {
    /// User defined ellipsoid, from semimajor axis and inverse flattening.
    /// An inverse flattening of 0 indicates a sphere.
    #[must_use]
    pub fn new(name: &str, semimajor_axis: f64, inverse_flattening: f64) -> Ellipsoid {
        let f = if inverse_flattening == 0.0 {
            0.0
        } else {
            1.0 / inverse_flattening
        };
        Ellipsoid {
            object: IdentifiedObject::named(name),
            a: semimajor_axis,
            f,
            body: EARTH.to_string(),
        }
    }

    #[must_use]
    pub fn with_epsg(mut self, code: u32) -> Ellipsoid {
        self.object = self.object.with_epsg(code);
        self
    }

    /// An ellipsoid of another planet
    #[must_use]
    pub fn with_celestial_body(mut self, body: &str) -> Ellipsoid {
        self.body = body.to_string();
        self
    }

    /// Predefined ellipsoid, by PROJ or EPSG name
    pub fn named(name: &str) -> Result<Ellipsoid, Error> {
        for (proj, epsg, code, a, rf) in ELLIPSOIDS {
            if name == proj || is_equivalent_name(name, epsg) {
                return Ok(Ellipsoid::new(epsg, a, rf).with_epsg(code));
            }
        }
        Err(Error::NotFound(name.to_string(), ": ellipsoid".to_string()))
    }

    /// The PROJ `+ellps=` name, when this is one of the well known ellipsoids
    pub fn proj_name(&self) -> Option<&'static str> {
        ELLIPSOIDS
            .iter()
            .find(|e| {
                float_eq::float_eq!(e.3, self.a, abs <= 1e-4)
                    && float_eq::float_eq!(e.4, self.inverse_flattening(), abs <= 1e-8)
            })
            .map(|e| e.0)
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn celestial_body(&self) -> &str {
        &self.body
    }

    pub fn is_sphere(&self) -> bool {
        self.f == 0.0
    }

    /// The semimajor axis, *a*
    #[must_use]
    pub fn semimajor_axis(&self) -> f64 {
        self.a
    }

    /// The semiminor axis, *b*
    #[must_use]
    pub fn semiminor_axis(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// The flattening, *f = (a - b)/a*
    #[must_use]
    pub fn flattening(&self) -> f64 {
        self.f
    }

    /// The inverse flattening, *1/f*, or 0 for a sphere
    #[must_use]
    pub fn inverse_flattening(&self) -> f64 {
        if self.f == 0.0 {
            return 0.0;
        }
        1.0 / self.f
    }

    /// The squared eccentricity *e² = (a² - b²) / a²*.
    #[must_use]
    pub fn eccentricity_squared(&self) -> f64 {
        self.f * (2_f64 - self.f)
    }

    /// Same size and shape. Names only matter under `Criterion::Strict`
    pub fn is_equivalent_to(&self, other: &Ellipsoid, criterion: Criterion) -> bool {
        if criterion == Criterion::Strict && self.name() != other.name() {
            return false;
        }
        self.body == other.body
            && float_eq::float_eq!(self.a, other.a, abs <= 1e-4)
            && float_eq::float_eq!(
                self.inverse_flattening(),
                other.inverse_flattening(),
                rmax <= 1e-10
            )
    }

    /// The `+ellps=...` or `+a=... +rf=...` parameters describing this ellipsoid
    pub(crate) fn proj_params(&self) -> Vec<(String, Option<String>)> {
        if let Some(name) = self.proj_name() {
            return vec![("ellps".to_string(), Some(name.to_string()))];
        }
        let a = ("a".to_string(), Some(crate::io::format_number(self.a)));
        if self.is_sphere() {
            return vec![("R".to_string(), a.1)];
        }
        let rf = crate::io::format_number(self.inverse_flattening());
        vec![a, ("rf".to_string(), Some(rf))]
    }
}

// ----- Tests ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named() -> Result<(), Error> {
        let ellps = Ellipsoid::named("intl")?;
        assert_eq!(ellps.flattening(), 1. / 297.);
        assert_eq!(ellps.name(), "International 1924");

        let ellps = Ellipsoid::named("GRS 1980")?;
        assert_eq!(ellps.semimajor_axis(), 6378137.0);
        assert_eq!(ellps.object.epsg_code(), Some(7019));
        assert_eq!(ellps.proj_name(), Some("GRS80"));

        assert!((ellps.semiminor_axis() - 6_356_752.31414_0347).abs() < 1e-6);
        assert!((ellps.eccentricity_squared() - 0.00669_43800_22903_41574).abs() < 1.0e-10);

        assert!(Ellipsoid::named("APL4.9").is_err());
        Ok(())
    }

    #[test]
    fn equivalence() -> Result<(), Error> {
        let wgs84 = Ellipsoid::named("WGS84")?;
        let grs80 = Ellipsoid::named("GRS80")?;
        // The semiminor axes differ by about 0.1 mm, but they are different ellipsoids
        assert!(!wgs84.is_equivalent_to(&grs80, Criterion::Equivalent));
        let renamed = Ellipsoid::new("WGS_1984", 6378137.0, 298.257223563);
        assert!(wgs84.is_equivalent_to(&renamed, Criterion::Equivalent));
        assert!(!wgs84.is_equivalent_to(&renamed, Criterion::Strict));

        let mars = Ellipsoid::new("Mars", 3_396_190.0, 169.894_447_223_611)
            .with_celestial_body("Mars");
        assert!(!mars.is_equivalent_to(&grs80, Criterion::Equivalent));
        assert_eq!(mars.proj_name(), None);
        assert_eq!(mars.proj_params().len(), 2);
        Ok(())
    }
}
