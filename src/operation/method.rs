//! The parameter model: parameter definitions, typed values, and methods
use crate::authoring::*;

/// Definition of a parameter: name and, usually, an EPSG code
#[derive(Clone, Debug, PartialEq)]
pub struct OperationParameter {
    pub object: IdentifiedObject,
}

impl OperationParameter {
    pub fn new(name: &str, epsg_code: Option<u32>) -> OperationParameter {
        let mut object = IdentifiedObject::named(name);
        if let Some(code) = epsg_code {
            object = object.with_epsg(code);
        }
        OperationParameter { object }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// The EPSG code, either directly, or through a well known name
    pub fn epsg_code(&self) -> Option<u32> {
        self.object
            .epsg_code()
            .or_else(|| super::mapping::param_code_from_name(self.name()))
    }

    /// Same code, same name, or names known to denote the same parameter
    pub fn is_equivalent_to(&self, other: &OperationParameter) -> bool {
        match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => super::mapping::are_equivalent_parameters(self.name(), other.name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Measure(Measure),
    String(String),
    Filename(String),
    Integer(i64),
    Boolean(bool),
}

impl ParameterValue {
    pub fn measure(&self) -> Option<&Measure> {
        match self {
            ParameterValue::Measure(m) => Some(m),
            _ => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            ParameterValue::Filename(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_equivalent_to(&self, other: &ParameterValue) -> bool {
        match (self, other) {
            (ParameterValue::Measure(a), ParameterValue::Measure(b)) => a.is_equivalent_to(b),
            _ => self == other,
        }
    }
}

/// A parameter definition bound to its value
#[derive(Clone, Debug, PartialEq)]
pub struct OperationParameterValue {
    pub parameter: OperationParameter,
    pub value: ParameterValue,
}

impl OperationParameterValue {
    pub fn new(parameter: OperationParameter, value: ParameterValue) -> OperationParameterValue {
        OperationParameterValue { parameter, value }
    }

    /// A value given as a measure
    pub fn measure(name: &str, epsg_code: u32, value: Measure) -> OperationParameterValue {
        OperationParameterValue::new(
            OperationParameter::new(name, Some(epsg_code)),
            ParameterValue::Measure(value),
        )
    }

    /// A value given as a file name (typically a grid)
    pub fn filename(name: &str, epsg_code: u32, file: &str) -> OperationParameterValue {
        OperationParameterValue::new(
            OperationParameter::new(name, Some(epsg_code)),
            ParameterValue::Filename(file.to_string()),
        )
    }
}

/// A named formula, and the ordered list of parameters it takes
#[derive(Clone, Debug, PartialEq)]
pub struct OperationMethod {
    pub object: IdentifiedObject,
    pub formula: Option<String>,
    pub parameters: Vec<OperationParameter>,
}

impl OperationMethod {
    pub fn new(object: IdentifiedObject, parameters: Vec<OperationParameter>) -> OperationMethod {
        OperationMethod {
            object,
            formula: None,
            parameters,
        }
    }

    /// A method taking its parameter list from a set of parameter values
    pub fn for_values(name: &str, epsg_code: Option<u32>, values: &[OperationParameterValue]) -> OperationMethod {
        let mut object = IdentifiedObject::named(name);
        if let Some(code) = epsg_code {
            object = object.with_epsg(code);
        }
        let parameters = values.iter().map(|v| v.parameter.clone()).collect();
        OperationMethod::new(object, parameters)
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn epsg_code(&self) -> Option<u32> {
        self.object.epsg_code()
    }

    pub fn is_equivalent_to(&self, other: &OperationMethod) -> bool {
        match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => is_equivalent_name(self.name(), other.name()),
        }
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters() {
        let a = OperationParameter::new("Latitude of natural origin", Some(8801));
        let b = OperationParameter::new("latitude_of_origin", None);
        let c = OperationParameter::new("Longitude of natural origin", None);
        assert_eq!(b.epsg_code(), Some(8801));
        assert_eq!(c.epsg_code(), Some(8802));
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&c));

        let v = ParameterValue::Measure(Measure::degrees(3.0));
        assert!(v.is_equivalent_to(&ParameterValue::Measure(Measure::new(10800., unit::ARC_SECOND))));
        assert!(!v.is_equivalent_to(&ParameterValue::Integer(3)));
        assert_eq!(ParameterValue::Filename("conus".into()).filename(), Some("conus"));
    }

    #[test]
    fn methods() {
        let tm = OperationMethod::new(IdentifiedObject::named("Transverse Mercator").with_epsg(9807), vec![]);
        let tm_unidentified = OperationMethod::new(IdentifiedObject::named("Transverse_Mercator"), vec![]);
        assert!(tm.is_equivalent_to(&tm_unidentified));
        let values = [OperationParameterValue::measure("Scale factor at natural origin", 8805, Measure::unity(0.9996))];
        let m = OperationMethod::for_values("Transverse Mercator", Some(9807), &values);
        assert_eq!(m.parameters.len(), 1);
        assert!(m.is_equivalent_to(&tm));
    }
}
