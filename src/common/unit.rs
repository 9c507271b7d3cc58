use std::borrow::Cow;
use std::f64::consts::PI;

/// The physical quantity a unit measures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitType {
    Angular,
    Linear,
    Scale,
    Time,
    Parametric,
    None,
}

/// A unit of measure: name, kind, and conversion factor to the
/// SI unit of its kind (radian for angles, metre for lengths, unity for scales,
/// second for time)
#[derive(Clone, Debug)]
pub struct UnitOfMeasure {
    name: Cow<'static, str>,
    factor: f64,
    kind: UnitType,
    epsg: Option<u32>,
}

impl UnitOfMeasure {
    pub const fn constant(name: &'static str, factor: f64, kind: UnitType, epsg: u32) -> Self {
        UnitOfMeasure {
            name: Cow::Borrowed(name),
            factor,
            kind,
            epsg: Some(epsg),
        }
    }

    /// User defined unit
    pub fn new(name: &str, factor: f64, kind: UnitType) -> Self {
        UnitOfMeasure {
            name: Cow::Owned(name.to_string()),
            factor,
            kind,
            epsg: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conversion_to_si(&self) -> f64 {
        self.factor
    }

    pub fn kind(&self) -> UnitType {
        self.kind
    }

    pub fn epsg_code(&self) -> Option<u32> {
        self.epsg
    }

    /// Name of the unit as understood by the PROJ `unitconvert` operator
    pub fn proj_name(&self) -> Option<&'static str> {
        PROJ_UNIT_NAMES
            .iter()
            .find(|(_, kind, factor)| {
                *kind == self.kind && float_eq::float_eq!(*factor, self.factor, rmax <= 1e-10)
            })
            .map(|(name, _, _)| *name)
    }
}

/// Units are equal when they measure the same quantity with the same factor.
/// The name is considered decoration.
impl PartialEq for UnitOfMeasure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && float_eq::float_eq!(self.factor, other.factor, rmax <= 1e-10)
    }
}

pub const METRE: UnitOfMeasure = UnitOfMeasure::constant("metre", 1.0, UnitType::Linear, 9001);
pub const FOOT: UnitOfMeasure = UnitOfMeasure::constant("foot", 0.3048, UnitType::Linear, 9002);
#[rustfmt::skip]
pub const US_FOOT: UnitOfMeasure = UnitOfMeasure::constant("US survey foot", 0.304_800_609_601_219_2, UnitType::Linear, 9003);
pub const RADIAN: UnitOfMeasure = UnitOfMeasure::constant("radian", 1.0, UnitType::Angular, 9101);
pub const DEGREE: UnitOfMeasure = UnitOfMeasure::constant("degree", PI / 180.0, UnitType::Angular, 9122);
#[rustfmt::skip]
pub const ARC_SECOND: UnitOfMeasure = UnitOfMeasure::constant("arc-second", PI / 648_000.0, UnitType::Angular, 9104);
pub const GRAD: UnitOfMeasure = UnitOfMeasure::constant("grad", PI / 200.0, UnitType::Angular, 9105);
pub const UNITY: UnitOfMeasure = UnitOfMeasure::constant("unity", 1.0, UnitType::Scale, 9201);
#[rustfmt::skip]
pub const PARTS_PER_MILLION: UnitOfMeasure = UnitOfMeasure::constant("parts per million", 1e-6, UnitType::Scale, 9202);
#[rustfmt::skip]
pub const YEAR: UnitOfMeasure = UnitOfMeasure::constant("year", 31_556_925.445, UnitType::Time, 1029);

// (PROJ name, kind, factor to SI)
#[rustfmt::skip]
const PROJ_UNIT_NAMES: [(&str, UnitType, f64); 7] = [
    ("m",     UnitType::Linear,  1.0),
    ("ft",    UnitType::Linear,  0.3048),
    ("us-ft", UnitType::Linear,  0.304_800_609_601_219_2),
    ("km",    UnitType::Linear,  1000.0),
    ("deg",   UnitType::Angular, PI / 180.0),
    ("rad",   UnitType::Angular, 1.0),
    ("grad",  UnitType::Angular, PI / 200.0),
];

// ----- M E A S U R E ---------------------------------------------------------------

/// A numeric value qualified by its unit of measure
#[derive(Clone, Debug, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub unit: UnitOfMeasure,
}

impl Measure {
    pub fn new(value: f64, unit: UnitOfMeasure) -> Self {
        Measure { value, unit }
    }

    pub fn degrees(value: f64) -> Self {
        Measure::new(value, DEGREE)
    }

    pub fn metres(value: f64) -> Self {
        Measure::new(value, METRE)
    }

    pub fn unity(value: f64) -> Self {
        Measure::new(value, UNITY)
    }

    /// The value, converted to the SI unit of its kind
    pub fn si_value(&self) -> f64 {
        self.value * self.unit.conversion_to_si()
    }

    /// The value, converted to `unit`. Conversion across unit kinds is meaningless,
    /// and returns the raw value.
    pub fn convert_to_unit(&self, unit: &UnitOfMeasure) -> f64 {
        if unit.kind() != self.unit.kind() || unit.conversion_to_si() == 0.0 {
            return self.value;
        }
        self.si_value() / unit.conversion_to_si()
    }

    pub fn is_equivalent_to(&self, other: &Measure) -> bool {
        if self.unit.kind() != other.unit.kind() {
            return false;
        }
        let (a, b) = (self.si_value(), other.si_value());
        float_eq::float_eq!(a, b, abs <= 1e-12, rmax <= 1e-10)
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn conversions() {
        let paris = Measure::new(2.5969213, GRAD);
        assert_float_eq!(paris.convert_to_unit(&DEGREE), 2.33722917, abs <= 1e-8);

        let height = Measure::new(100.0, US_FOOT);
        assert_float_eq!(height.si_value(), 30.480_060_96, abs <= 1e-8);

        // Converting across kinds is a no-op
        assert_eq!(height.convert_to_unit(&DEGREE), 100.0);
    }

    #[test]
    fn equality() {
        let deg = UnitOfMeasure::new("deg", PI / 180.0, UnitType::Angular);
        assert_eq!(deg, DEGREE);
        assert_ne!(FOOT, US_FOOT);
        assert_eq!(DEGREE.proj_name(), Some("deg"));
        assert_eq!(US_FOOT.proj_name(), Some("us-ft"));
        assert_eq!(ARC_SECOND.proj_name(), None);
        assert!(Measure::degrees(180.0).is_equivalent_to(&Measure::new(PI, RADIAN)));
    }
}
