//! Areas of use and accuracy. The bounding box arithmetic handles boxes
//! crossing the antimeridian, i.e. boxes where `west > east`.

/// A geographic bounding box in degrees, (west, south, east, north).
/// `west > east` indicates a box crossing the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeographicBoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicBoundingBox {
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        GeographicBoundingBox {
            west,
            south,
            east,
            north,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn is_world(&self) -> bool {
        self.covers_all_longitudes() && self.south <= -90.0 && self.north >= 90.0
    }

    fn covers_all_longitudes(&self) -> bool {
        self.west <= -180.0 && self.east >= 180.0
    }

    // The longitude interval(s) covered, as non-crossing pieces
    fn lon_pieces(&self) -> Vec<(f64, f64)> {
        if self.crosses_antimeridian() {
            vec![(self.west, 180.0), (-180.0, self.east)]
        } else {
            vec![(self.west, self.east)]
        }
    }

    pub fn contains(&self, other: &GeographicBoundingBox) -> bool {
        if other.south < self.south || other.north > self.north {
            return false;
        }
        if self.covers_all_longitudes() {
            return true;
        }
        match (self.crosses_antimeridian(), other.crosses_antimeridian()) {
            (false, false) => self.west <= other.west && other.east <= self.east,
            (false, true) => false,
            (true, false) => other.west >= self.west || other.east <= self.east,
            (true, true) => other.west >= self.west && other.east <= self.east,
        }
    }

    pub fn intersects(&self, other: &GeographicBoundingBox) -> bool {
        self.intersection(other).is_some()
    }

    /// The common part of two boxes, or `None` if they are disjoint. When the
    /// intersection consists of two separate pieces, the larger one is returned.
    pub fn intersection(&self, other: &GeographicBoundingBox) -> Option<GeographicBoundingBox> {
        let south = self.south.max(other.south);
        let north = self.north.min(other.north);
        if south > north {
            return None;
        }

        if self.covers_all_longitudes() {
            return Some(GeographicBoundingBox::new(other.west, south, other.east, north));
        }
        if other.covers_all_longitudes() {
            return Some(GeographicBoundingBox::new(self.west, south, self.east, north));
        }

        // Both crossing: the result crosses too, as both contain the antimeridian
        if self.crosses_antimeridian() && other.crosses_antimeridian() {
            let west = self.west.max(other.west);
            let east = self.east.min(other.east);
            return Some(GeographicBoundingBox::new(west, south, east, north));
        }

        let mut best: Option<(f64, f64)> = None;
        for a in self.lon_pieces() {
            for b in other.lon_pieces() {
                let west = a.0.max(b.0);
                let east = a.1.min(b.1);
                if west > east {
                    continue;
                }
                if best.map_or(true, |(w, e)| east - west > e - w) {
                    best = Some((west, east));
                }
            }
        }
        let (west, east) = best?;
        Some(GeographicBoundingBox::new(west, south, east, north))
    }

    /// An authalic-like measure of the box area: the longitude extent times the
    /// difference of the sines of the bounding latitudes. Only useful for ranking.
    pub fn pseudo_area(&self) -> f64 {
        let mut width = self.east - self.west;
        if self.crosses_antimeridian() {
            width += 360.0;
        }
        let height = self.north.to_radians().sin() - self.south.to_radians().sin();
        width.to_radians() * height
    }
}

// ----- E X T E N T ------------------------------------------------------------------

/// An area of use. A missing bounding box means "no geographic restriction".
#[derive(Clone, Debug, PartialEq)]
pub struct Extent {
    pub description: Option<String>,
    pub bbox: Option<GeographicBoundingBox>,
}

pub const WORLD: Extent = Extent {
    description: None,
    bbox: Some(GeographicBoundingBox::new(-180.0, -90.0, 180.0, 90.0)),
};

impl Extent {
    pub fn new(description: &str, bbox: GeographicBoundingBox) -> Extent {
        Extent {
            description: Some(description.to_string()),
            bbox: Some(bbox),
        }
    }

    pub fn from_bbox(west: f64, south: f64, east: f64, north: f64) -> Extent {
        Extent {
            description: None,
            bbox: Some(GeographicBoundingBox::new(west, south, east, north)),
        }
    }

    pub fn world() -> Extent {
        Extent {
            description: Some("World".to_string()),
            ..WORLD
        }
    }

    fn bbox_or_world(&self) -> GeographicBoundingBox {
        self.bbox.unwrap_or(GeographicBoundingBox::new(-180.0, -90.0, 180.0, 90.0))
    }

    pub fn contains(&self, other: &Extent) -> bool {
        self.bbox_or_world().contains(&other.bbox_or_world())
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.bbox_or_world().intersects(&other.bbox_or_world())
    }

    /// Mutual containment
    pub fn is_same_area(&self, other: &Extent) -> bool {
        self.contains(other) && other.contains(self)
    }

    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        if self.contains(other) {
            return Some(other.clone());
        }
        if other.contains(self) {
            return Some(self.clone());
        }
        let bbox = self.bbox_or_world().intersection(&other.bbox_or_world())?;
        Some(Extent {
            description: None,
            bbox: Some(bbox),
        })
    }

    pub fn pseudo_area(&self) -> f64 {
        self.bbox_or_world().pseudo_area()
    }
}

/// Scope and area of use of an object
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Domain {
    pub scope: Option<String>,
    pub extent: Option<Extent>,
}

impl Domain {
    pub fn new(scope: Option<&str>, extent: Option<Extent>) -> Domain {
        Domain {
            scope: scope.map(|s| s.to_string()),
            extent,
        }
    }
}

/// Positional accuracy estimate, in metres
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionalAccuracy(pub f64);

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn intersection() {
        let a = GeographicBoundingBox::new(0., 0., 10., 10.);
        let b = GeographicBoundingBox::new(5., 5., 15., 15.);
        assert_eq!(
            a.intersection(&b),
            Some(GeographicBoundingBox::new(5., 5., 10., 10.))
        );

        let c = GeographicBoundingBox::new(20., 20., 30., 30.);
        assert_eq!(a.intersection(&c), None);
        assert!(!a.intersects(&c));

        let ea = Extent::from_bbox(0., 0., 10., 10.);
        let ec = Extent::from_bbox(20., 20., 30., 30.);
        assert!(ea.intersection(&ec).is_none());
    }

    #[test]
    fn antimeridian() {
        // NAD83 area of use
        let nad83 = GeographicBoundingBox::new(167.65, 14.92, -40.73, 86.45);
        let conus = GeographicBoundingBox::new(-124.79, 24.41, -66.91, 49.38);
        let aleutians = GeographicBoundingBox::new(170., 50., 180., 55.);
        let europe = GeographicBoundingBox::new(-10., 35., 30., 70.);

        assert!(nad83.crosses_antimeridian());
        assert!(nad83.contains(&conus));
        assert!(nad83.contains(&aleutians));
        assert!(!conus.contains(&nad83));
        assert!(!nad83.contains(&europe));

        assert_eq!(nad83.intersection(&conus), Some(conus));
        let across = GeographicBoundingBox::new(175., 20., -170., 60.);
        let i = nad83.intersection(&across).unwrap();
        assert!(i.crosses_antimeridian());
        assert_eq!(i, GeographicBoundingBox::new(175., 20., -170., 60.));
    }

    #[test]
    fn pseudo_area() {
        let world = WORLD.bbox.unwrap();
        assert_float_eq!(world.pseudo_area(), 4.0 * std::f64::consts::PI, abs <= 1e-12);

        let nad83 = GeographicBoundingBox::new(167.65, 14.92, -40.73, 86.45);
        let conus = GeographicBoundingBox::new(-124.79, 24.41, -66.91, 49.38);
        assert!(nad83.pseudo_area() > conus.pseudo_area());
        assert!(conus.pseudo_area() > 0.0);

        assert!(Extent::world().is_same_area(&WORLD));
        assert!(!Extent::world().is_same_area(&Extent::from_bbox(0., 0., 1., 1.)));
    }
}
