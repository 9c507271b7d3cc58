//! Coordinate systems: ordered lists of axes with direction and unit
use crate::authoring::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisDirection {
    North,
    South,
    East,
    West,
    Up,
    Down,
    GeocentricX,
    GeocentricY,
    GeocentricZ,
}

impl AxisDirection {
    pub fn wkt_name(&self) -> &'static str {
        match self {
            AxisDirection::North => "north",
            AxisDirection::South => "south",
            AxisDirection::East => "east",
            AxisDirection::West => "west",
            AxisDirection::Up => "up",
            AxisDirection::Down => "down",
            AxisDirection::GeocentricX => "geocentricX",
            AxisDirection::GeocentricY => "geocentricY",
            AxisDirection::GeocentricZ => "geocentricZ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub name: String,
    pub abbreviation: String,
    pub direction: AxisDirection,
    pub unit: UnitOfMeasure,
}

impl Axis {
    pub fn new(name: &str, abbreviation: &str, direction: AxisDirection, unit: UnitOfMeasure) -> Axis {
        Axis {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            direction,
            unit,
        }
    }

    /// Same direction and unit: the names are decoration
    pub fn is_equivalent_to(&self, other: &Axis) -> bool {
        self.direction == other.direction && self.unit == other.unit
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsKind {
    Ellipsoidal,
    Cartesian,
    Vertical,
}

impl CsKind {
    pub fn wkt_name(&self) -> &'static str {
        match self {
            CsKind::Ellipsoidal => "ellipsoidal",
            CsKind::Cartesian => "Cartesian",
            CsKind::Vertical => "vertical",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateSystem {
    pub kind: CsKind,
    pub axes: Vec<Axis>,
}

impl CoordinateSystem {
    pub fn new(kind: CsKind, axes: Vec<Axis>) -> CoordinateSystem {
        CoordinateSystem { kind, axes }
    }

    /// Latitude, longitude: the EPSG order
    pub fn ellipsoidal_2d_lat_lon(unit: UnitOfMeasure) -> CoordinateSystem {
        use AxisDirection::*;
        CoordinateSystem::new(CsKind::Ellipsoidal, vec![
            Axis::new("Geodetic latitude", "Lat", North, unit.clone()),
            Axis::new("Geodetic longitude", "Lon", East, unit),
        ])
    }

    /// Longitude, latitude: the GIS order
    pub fn ellipsoidal_2d_lon_lat(unit: UnitOfMeasure) -> CoordinateSystem {
        use AxisDirection::*;
        CoordinateSystem::new(CsKind::Ellipsoidal, vec![
            Axis::new("Geodetic longitude", "Lon", East, unit.clone()),
            Axis::new("Geodetic latitude", "Lat", North, unit),
        ])
    }

    pub fn ellipsoidal_3d_lat_lon_h(angular: UnitOfMeasure, linear: UnitOfMeasure) -> CoordinateSystem {
        let mut cs = CoordinateSystem::ellipsoidal_2d_lat_lon(angular);
        cs.axes.push(ellipsoidal_height(linear));
        cs
    }

    pub fn geocentric() -> CoordinateSystem {
        use AxisDirection::*;
        CoordinateSystem::new(CsKind::Cartesian, vec![
            Axis::new("Geocentric X", "X", GeocentricX, unit::METRE),
            Axis::new("Geocentric Y", "Y", GeocentricY, unit::METRE),
            Axis::new("Geocentric Z", "Z", GeocentricZ, unit::METRE),
        ])
    }

    pub fn easting_northing(unit: UnitOfMeasure) -> CoordinateSystem {
        use AxisDirection::*;
        CoordinateSystem::new(CsKind::Cartesian, vec![
            Axis::new("Easting", "E", East, unit.clone()),
            Axis::new("Northing", "N", North, unit),
        ])
    }

    pub fn gravity_related_height(unit: UnitOfMeasure) -> CoordinateSystem {
        CoordinateSystem::new(CsKind::Vertical, vec![Axis::new(
            "Gravity-related height",
            "H",
            AxisDirection::Up,
            unit,
        )])
    }

    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// First axis pointing north or south
    pub fn is_northing_first(&self) -> bool {
        self.axes
            .first()
            .map_or(false, |a| matches!(a.direction, AxisDirection::North | AxisDirection::South))
    }

    pub fn horizontal_unit(&self) -> UnitOfMeasure {
        self.axes
            .first()
            .map_or(unit::METRE, |a| a.unit.clone())
    }

    /// Unit of the vertical axis, if there is one
    pub fn vertical_unit(&self) -> Option<UnitOfMeasure> {
        self.axes
            .iter()
            .find(|a| matches!(a.direction, AxisDirection::Up | AxisDirection::Down))
            .map(|a| a.unit.clone())
    }

    /// A 2D ellipsoidal coordinate system extended with an ellipsoidal height axis,
    /// or dropping it
    pub fn with_dimension(&self, dimension: usize) -> CoordinateSystem {
        let mut cs = self.clone();
        if self.kind != CsKind::Ellipsoidal {
            return cs;
        }
        match (self.dimension(), dimension) {
            (2, 3) => cs.axes.push(ellipsoidal_height(unit::METRE)),
            (3, 2) => {
                cs.axes.pop();
            }
            _ => (),
        }
        cs
    }

    pub fn is_equivalent_to(&self, other: &CoordinateSystem, criterion: Criterion) -> bool {
        if self.kind != other.kind || self.dimension() != other.dimension() {
            return false;
        }
        let pairwise = |a: &[Axis], b: &[Axis]| a.iter().zip(b).all(|(x, y)| x.is_equivalent_to(y));
        if pairwise(&self.axes, &other.axes) {
            return true;
        }
        if criterion != Criterion::EquivalentExceptAxisOrderGeogCrs || self.kind != CsKind::Ellipsoidal {
            return false;
        }
        let mut swapped = other.axes.clone();
        swapped.swap(0, 1);
        pairwise(&self.axes, &swapped)
    }
}

fn ellipsoidal_height(unit: UnitOfMeasure) -> Axis {
    Axis::new("Ellipsoidal height", "h", AxisDirection::Up, unit)
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_order() {
        let latlon = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
        let lonlat = CoordinateSystem::ellipsoidal_2d_lon_lat(unit::DEGREE);
        assert!(latlon.is_northing_first());
        assert!(!lonlat.is_northing_first());
        assert!(!latlon.is_equivalent_to(&lonlat, Criterion::Equivalent));
        assert!(latlon.is_equivalent_to(&lonlat, Criterion::EquivalentExceptAxisOrderGeogCrs));

        let en = CoordinateSystem::easting_northing(unit::METRE);
        assert!(!en.is_northing_first());
    }

    #[test]
    fn dimensions() {
        let cs2 = CoordinateSystem::ellipsoidal_2d_lat_lon(unit::DEGREE);
        let cs3 = cs2.with_dimension(3);
        assert_eq!(cs3.dimension(), 3);
        assert_eq!(cs3.vertical_unit(), Some(unit::METRE));
        assert_eq!(cs2.vertical_unit(), None);
        assert_eq!(cs3.with_dimension(2), cs2);
        assert_eq!(CoordinateSystem::geocentric().with_dimension(2).dimension(), 3);

        let ft = CoordinateSystem::ellipsoidal_3d_lat_lon_h(unit::DEGREE, unit::FOOT);
        assert!(!ft.is_equivalent_to(&cs3, Criterion::Equivalent));
    }
}
