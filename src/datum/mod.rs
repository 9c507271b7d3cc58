//! Datums, datum ensembles, and the ellipsoids and prime meridians they carry
mod ellipsoid;

use crate::authoring::*;
pub use ellipsoid::Ellipsoid;
pub use ellipsoid::EARTH;

/// A prime meridian: its longitude relative to Greenwich
#[derive(Clone, Debug, PartialEq)]
pub struct PrimeMeridian {
    pub object: IdentifiedObject,
    pub longitude: Measure,
}

impl Default for PrimeMeridian {
    fn default() -> PrimeMeridian {
        PrimeMeridian::greenwich()
    }
}

impl PrimeMeridian {
    pub fn new(name: &str, longitude: Measure) -> PrimeMeridian {
        PrimeMeridian {
            object: IdentifiedObject::named(name),
            longitude,
        }
    }

    pub fn greenwich() -> PrimeMeridian {
        PrimeMeridian {
            object: IdentifiedObject::named("Greenwich").with_epsg(8901),
            longitude: Measure::degrees(0.0),
        }
    }

    pub fn paris() -> PrimeMeridian {
        PrimeMeridian {
            object: IdentifiedObject::named("Paris").with_epsg(8903),
            longitude: Measure::new(2.5969213, unit::GRAD),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude.convert_to_unit(&unit::DEGREE)
    }

    pub fn is_equivalent_to(&self, other: &PrimeMeridian, criterion: Criterion) -> bool {
        if criterion == Criterion::Strict && self.name() != other.name() {
            return false;
        }
        self.longitude.is_equivalent_to(&other.longitude)
    }

    /// The PROJ `+pm=` value
    pub(crate) fn proj_value(&self) -> String {
        if is_equivalent_name(self.name(), "Paris")
            && float_eq::float_eq!(self.longitude_degrees(), 2.33722917, abs <= 1e-8)
        {
            return "paris".to_string();
        }
        crate::io::format_number(self.longitude_degrees())
    }
}

// ----- D A T U M S -------------------------------------------------------------------

/// Common behaviour of datums, needed for collapsing ensembles
pub trait Datum: Clone {
    fn object(&self) -> &IdentifiedObject;
    fn with_object(&self, object: IdentifiedObject) -> Self;
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeodeticReferenceFrame {
    pub object: IdentifiedObject,
    pub ellipsoid: Ellipsoid,
    pub prime_meridian: PrimeMeridian,
    pub anchor: Option<String>,
}

impl GeodeticReferenceFrame {
    pub fn new(
        object: IdentifiedObject,
        ellipsoid: Ellipsoid,
        prime_meridian: PrimeMeridian,
    ) -> GeodeticReferenceFrame {
        GeodeticReferenceFrame {
            object,
            ellipsoid,
            prime_meridian,
            anchor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// Datum names are compared loosely except under `Criterion::Strict`. Two frames
    /// sharing an authority identifier are equivalent regardless of name.
    pub fn is_equivalent_to(&self, other: &GeodeticReferenceFrame, criterion: Criterion) -> bool {
        let same_name = match criterion {
            Criterion::Strict => self.name() == other.name(),
            _ => {
                self.object.shares_identifier_with(&other.object)
                    || self.object.is_equivalent_name(other.name())
            }
        };
        same_name
            && self.ellipsoid.is_equivalent_to(&other.ellipsoid, criterion)
            && self.prime_meridian.is_equivalent_to(&other.prime_meridian, criterion)
    }
}

impl Datum for GeodeticReferenceFrame {
    fn object(&self) -> &IdentifiedObject {
        &self.object
    }

    fn with_object(&self, object: IdentifiedObject) -> Self {
        GeodeticReferenceFrame {
            object,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VerticalReferenceFrame {
    pub object: IdentifiedObject,
}

impl VerticalReferenceFrame {
    pub fn new(object: IdentifiedObject) -> VerticalReferenceFrame {
        VerticalReferenceFrame { object }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn is_equivalent_to(&self, other: &VerticalReferenceFrame, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Strict => self.name() == other.name(),
            _ => {
                self.object.shares_identifier_with(&other.object)
                    || self.object.is_equivalent_name(other.name())
            }
        }
    }
}

impl Datum for VerticalReferenceFrame {
    fn object(&self) -> &IdentifiedObject {
        &self.object
    }

    fn with_object(&self, object: IdentifiedObject) -> Self {
        VerticalReferenceFrame { object }
    }
}

// ----- E N S E M B L E S -------------------------------------------------------------

/// A collection of near-equivalent realizations of a datum, interchangeable
/// at the stated positional accuracy
#[derive(Clone, Debug, PartialEq)]
pub struct DatumEnsemble<D: Datum> {
    pub object: IdentifiedObject,
    pub(crate) members: Vec<D>,
    pub accuracy: f64,
}

impl<D: Datum> DatumEnsemble<D> {
    pub fn new(object: IdentifiedObject, members: Vec<D>, accuracy: f64) -> Result<Self, Error> {
        if members.len() < 2 {
            return Err(Error::BadParam(
                "members".to_string(),
                "a datum ensemble needs at least 2 members".to_string(),
            ));
        }
        Ok(DatumEnsemble {
            object,
            members,
            accuracy,
        })
    }

    /// The member datums. At least 2
    pub fn members(&self) -> &[D] {
        &self.members
    }

    /// A datum representing the ensemble: its name is the ensemble name without
    /// the " ensemble" suffix, and its properties are those of the first member
    pub fn as_datum(&self) -> D {
        let name = self
            .object
            .name
            .strip_suffix(" ensemble")
            .unwrap_or(&self.object.name);
        let mut object = self.object.clone();
        object.name = name.to_string();
        self.members[0].with_object(object)
    }
}

/// What a CRS is anchored to: a single datum, or an ensemble of datums
#[derive(Clone, Debug, PartialEq)]
pub enum DatumOrEnsemble<D: Datum> {
    Datum(D),
    Ensemble(DatumEnsemble<D>),
}

impl<D: Datum> DatumOrEnsemble<D> {
    /// The datum, collapsing an ensemble to its representative datum
    pub fn datum(&self) -> D {
        match self {
            DatumOrEnsemble::Datum(d) => d.clone(),
            DatumOrEnsemble::Ensemble(e) => e.as_datum(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DatumOrEnsemble::Datum(d) => &d.object().name,
            DatumOrEnsemble::Ensemble(e) => &e.object.name,
        }
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn wgs84_member(name: &str) -> GeodeticReferenceFrame {
        let ellps = Ellipsoid::named("WGS84").unwrap_or_default();
        GeodeticReferenceFrame::new(IdentifiedObject::named(name), ellps, PrimeMeridian::greenwich())
    }

    #[test]
    fn ensemble() -> Result<(), Error> {
        let ensemble = DatumEnsemble::new(
            IdentifiedObject::named("World Geodetic System 1984 ensemble").with_epsg(6326),
            vec![
                wgs84_member("World Geodetic System 1984 (Transit)"),
                wgs84_member("World Geodetic System 1984 (G730)"),
            ],
            2.0,
        )?;
        assert_eq!(ensemble.members().len(), 2);
        let datum = ensemble.as_datum();
        assert_eq!(datum.name(), "World Geodetic System 1984");
        assert_eq!(datum.object.epsg_code(), Some(6326));
        assert_eq!(datum.ellipsoid.name(), "WGS 84");

        let frame = wgs84_member("WGS_1984");
        assert!(frame.is_equivalent_to(&datum, Criterion::Equivalent));
        assert!(!frame.is_equivalent_to(&datum, Criterion::Strict));

        let single = DatumEnsemble::new(IdentifiedObject::named("x"), vec![frame], 1.0);
        assert!(single.is_err());
        Ok(())
    }

    #[test]
    fn prime_meridians() {
        let paris = PrimeMeridian::paris();
        assert!((paris.longitude_degrees() - 2.33722917).abs() < 1e-8);
        assert_eq!(paris.proj_value(), "paris");
        assert_eq!(PrimeMeridian::greenwich().proj_value(), "0");
        assert!(!paris.is_equivalent_to(&PrimeMeridian::greenwich(), Criterion::Equivalent));
    }
}
