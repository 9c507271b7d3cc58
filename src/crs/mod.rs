//! Coordinate reference systems, as a closed set of variants.
//!
//! CRS are immutable, and shared through reference counted handles ([`CrsRef`]).
//! A projected or derived CRS owns its deriving conversion, whose target CRS is
//! the owning CRS itself: that back-reference is stored as a [`Weak`] handle,
//! so no reference cycle is formed.
use crate::authoring::*;
use crate::operation::CrsLink;

pub type CrsRef = Arc<Crs>;

#[derive(Debug)]
pub struct Crs {
    pub(crate) id: ObjectId,
    pub object: IdentifiedObject,
    pub kind: CrsKind,
}

#[derive(Clone, Debug)]
pub enum CrsKind {
    Geographic(GeodeticCrs),
    Geocentric(GeodeticCrs),
    Vertical(VerticalCrs),
    Projected(DerivedCrs),
    /// Any other CRS defined by a conversion from a base CRS
    Derived(DerivedCrs),
    /// Horizontal + vertical components (at least 2)
    Compound(Vec<CrsRef>),
    Bound(BoundCrs),
}

#[derive(Clone, Debug)]
pub struct GeodeticCrs {
    pub datum: DatumOrEnsemble<GeodeticReferenceFrame>,
    pub cs: CoordinateSystem,
}

impl GeodeticCrs {
    pub fn datum(&self) -> GeodeticReferenceFrame {
        self.datum.datum()
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.datum().ellipsoid
    }

    pub fn prime_meridian(&self) -> PrimeMeridian {
        self.datum().prime_meridian
    }
}

#[derive(Clone, Debug)]
pub struct VerticalCrs {
    pub datum: DatumOrEnsemble<VerticalReferenceFrame>,
    pub cs: CoordinateSystem,
}

#[derive(Clone, Debug)]
pub struct DerivedCrs {
    pub base: CrsRef,
    /// The deriving conversion. Its target is a weak link back to the owning CRS
    pub(crate) conversion: OperationRef,
    pub cs: CoordinateSystem,
}

/// A CRS carrying a transformation of its base CRS to a hub CRS (typically
/// WGS 84), as in the legacy `TOWGS84` construct
#[derive(Clone, Debug)]
pub struct BoundCrs {
    pub base: CrsRef,
    pub hub: CrsRef,
    pub transformation: OperationRef,
}

// ----- C O N S T R U C T I O N -------------------------------------------------------

impl Crs {
    /// A new handle for `kind`, unchecked
    pub(crate) fn wrap(object: IdentifiedObject, kind: CrsKind) -> CrsRef {
        Arc::new(Crs {
            id: ObjectId::new(),
            object,
            kind,
        })
    }

    pub fn geographic(
        object: IdentifiedObject,
        datum: DatumOrEnsemble<GeodeticReferenceFrame>,
        cs: CoordinateSystem,
    ) -> Result<CrsRef, Error> {
        if cs.kind != CsKind::Ellipsoidal || !(2..=3).contains(&cs.dimension()) {
            return Err(Error::BadParam(
                "cs".to_string(),
                "geographic CRS needs a 2D or 3D ellipsoidal coordinate system".to_string(),
            ));
        }
        Ok(Crs::wrap(object, CrsKind::Geographic(GeodeticCrs { datum, cs })))
    }

    pub fn geocentric(
        object: IdentifiedObject,
        datum: DatumOrEnsemble<GeodeticReferenceFrame>,
    ) -> CrsRef {
        let cs = CoordinateSystem::geocentric();
        Crs::wrap(object, CrsKind::Geocentric(GeodeticCrs { datum, cs }))
    }

    pub fn vertical(
        object: IdentifiedObject,
        datum: DatumOrEnsemble<VerticalReferenceFrame>,
        cs: CoordinateSystem,
    ) -> Result<CrsRef, Error> {
        if cs.kind != CsKind::Vertical || cs.dimension() != 1 {
            return Err(Error::BadParam(
                "cs".to_string(),
                "vertical CRS needs a 1D vertical coordinate system".to_string(),
            ));
        }
        Ok(Crs::wrap(object, CrsKind::Vertical(VerticalCrs { datum, cs })))
    }

    /// A projected CRS, from a geographic base CRS and a conversion (whose source
    /// and target CRS, if any, are replaced)
    pub fn projected(
        object: IdentifiedObject,
        base: CrsRef,
        conversion: &CoordinateOperation,
        cs: CoordinateSystem,
    ) -> Result<CrsRef, Error> {
        if !base.is_geographic() {
            return Err(Error::BadParam(
                "base".to_string(),
                "the base of a projected CRS must be geographic".to_string(),
            ));
        }
        Crs::derived_variant(object, base, conversion, cs, true)
    }

    /// A derived CRS (e.g. a derived geographic CRS on a rotated pole)
    pub fn derived(
        object: IdentifiedObject,
        base: CrsRef,
        conversion: &CoordinateOperation,
        cs: CoordinateSystem,
    ) -> Result<CrsRef, Error> {
        Crs::derived_variant(object, base, conversion, cs, false)
    }

    fn derived_variant(
        object: IdentifiedObject,
        base: CrsRef,
        conversion: &CoordinateOperation,
        cs: CoordinateSystem,
        projected: bool,
    ) -> Result<CrsRef, Error> {
        if !conversion.is_conversion() {
            return Err(Error::BadParam(
                "conversion".to_string(),
                "a derived CRS must be defined by a conversion".to_string(),
            ));
        }
        let crs = Arc::new_cyclic(|me| {
            let links = (CrsLink::Strong(base.clone()), CrsLink::Weak(me.clone()));
            let conversion = Arc::new(conversion.with_crs_links(links.0, links.1));
            let derived = DerivedCrs {
                base,
                conversion,
                cs,
            };
            let kind = if projected {
                CrsKind::Projected(derived)
            } else {
                CrsKind::Derived(derived)
            };
            Crs {
                id: ObjectId::new(),
                object,
                kind,
            }
        });
        Ok(crs)
    }

    pub fn compound(object: IdentifiedObject, components: Vec<CrsRef>) -> Result<CrsRef, Error> {
        if components.len() < 2 {
            return Err(Error::BadParam(
                "components".to_string(),
                "a compound CRS needs at least 2 components".to_string(),
            ));
        }
        Ok(Crs::wrap(object, CrsKind::Compound(components)))
    }

    /// A bound CRS. It is named as its base CRS
    pub fn bound(base: CrsRef, hub: CrsRef, transformation: OperationRef) -> CrsRef {
        let object = base.object.clone();
        let kind = CrsKind::Bound(BoundCrs {
            base,
            hub,
            transformation,
        });
        Crs::wrap(object, kind)
    }

    /// A CRS bound to `hub` by the 3 or 7 `TOWGS84` parameters
    /// (translations in metres, position vector rotations in arc seconds,
    /// scale difference in ppm)
    pub fn bound_to_wgs84(base: &CrsRef, hub: &CrsRef, towgs84: &[f64]) -> Result<CrsRef, Error> {
        let source = Crs::extract_geographic_crs(base).unwrap_or_else(|| base.clone());
        let name = build_op_name("Transformation", source.name(), hub.name());
        let properties = IdentifiedObject::named(&name);
        let transformation = match towgs84.len() {
            3 => crate::operation::transformation::create_geocentric_translations(
                properties,
                &source,
                hub,
                [towgs84[0], towgs84[1], towgs84[2]],
                &[],
            )?,
            7 => {
                let mut params = [0.0; 7];
                params.copy_from_slice(towgs84);
                crate::operation::transformation::create_position_vector(
                    properties, &source, hub, params, &[],
                )?
            }
            n => {
                return Err(Error::BadParam(
                    "towgs84".to_string(),
                    format!("expected 3 or 7 values, got {n}"),
                ))
            }
        };
        Ok(Crs::bound(base.clone(), hub.clone(), transformation))
    }
}

// ----- A C C E S S O R S -------------------------------------------------------------

impl Crs {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.object.identifiers
    }

    pub fn extent(&self) -> Option<Extent> {
        self.object.extent().cloned()
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, CrsKind::Geographic(_))
    }

    pub fn is_geocentric(&self) -> bool {
        matches!(self.kind, CrsKind::Geocentric(_))
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self.kind, CrsKind::Vertical(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, CrsKind::Compound(_))
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.kind, CrsKind::Bound(_))
    }

    /// Projected CRS are derived CRS too
    pub fn is_derived(&self) -> bool {
        matches!(self.kind, CrsKind::Projected(_) | CrsKind::Derived(_))
    }

    /// Geographic or geocentric
    pub fn geodetic(&self) -> Option<&GeodeticCrs> {
        match &self.kind {
            CrsKind::Geographic(g) | CrsKind::Geocentric(g) => Some(g),
            _ => None,
        }
    }

    pub fn vertical_crs(&self) -> Option<&VerticalCrs> {
        match &self.kind {
            CrsKind::Vertical(v) => Some(v),
            _ => None,
        }
    }

    pub fn derived_crs(&self) -> Option<&DerivedCrs> {
        match &self.kind {
            CrsKind::Projected(d) | CrsKind::Derived(d) => Some(d),
            _ => None,
        }
    }

    pub fn bound_crs(&self) -> Option<&BoundCrs> {
        match &self.kind {
            CrsKind::Bound(b) => Some(b),
            _ => None,
        }
    }

    pub fn components(&self) -> &[CrsRef] {
        match &self.kind {
            CrsKind::Compound(c) => c,
            _ => &[],
        }
    }

    pub fn coordinate_system(&self) -> Option<&CoordinateSystem> {
        match &self.kind {
            CrsKind::Geographic(g) | CrsKind::Geocentric(g) => Some(&g.cs),
            CrsKind::Vertical(v) => Some(&v.cs),
            CrsKind::Projected(d) | CrsKind::Derived(d) => Some(&d.cs),
            _ => None,
        }
    }

    /// Base CRS of a derived or projected CRS
    pub fn base_crs(&self) -> Option<&CrsRef> {
        self.derived_crs().map(|d| &d.base)
    }

    /// The deriving conversion of a derived or projected CRS, with strong
    /// links to both its source (the base CRS) and target (this CRS)
    pub fn deriving_conversion(&self) -> Option<OperationRef> {
        let derived = self.derived_crs()?;
        Some(Arc::new(derived.conversion.with_strong_links()))
    }

    pub fn dimension(&self) -> usize {
        match &self.kind {
            CrsKind::Compound(c) => c.iter().map(|c| c.dimension()).sum(),
            CrsKind::Bound(b) => b.base.dimension(),
            _ => self.coordinate_system().map_or(0, |cs| cs.dimension()),
        }
    }

    /// Celestial body of the ellipsoid of a geodetic CRS, or of the base of a derived one
    pub fn celestial_body(&self) -> Option<String> {
        match &self.kind {
            CrsKind::Geographic(g) | CrsKind::Geocentric(g) => {
                Some(g.ellipsoid().celestial_body().to_string())
            }
            CrsKind::Projected(d) | CrsKind::Derived(d) => d.base.celestial_body(),
            CrsKind::Bound(b) => b.base.celestial_body(),
            CrsKind::Compound(c) => c.iter().find_map(|c| c.celestial_body()),
            CrsKind::Vertical(_) => None,
        }
    }
}

// ----- D E C O M P O S I T I O N ------------------------------------------------------

impl Crs {
    /// The geographic CRS underlying `crs`, if any: the CRS itself, the base of a
    /// projected or derived CRS, the horizontal component of a compound CRS,
    /// or the base of a bound CRS
    pub fn extract_geographic_crs(crs: &CrsRef) -> Option<CrsRef> {
        match &crs.kind {
            CrsKind::Geographic(_) => Some(crs.clone()),
            CrsKind::Projected(d) | CrsKind::Derived(d) => Crs::extract_geographic_crs(&d.base),
            CrsKind::Compound(c) => c.iter().find_map(Crs::extract_geographic_crs),
            CrsKind::Bound(b) => Crs::extract_geographic_crs(&b.base),
            _ => None,
        }
    }

    pub fn extract_vertical_crs(crs: &CrsRef) -> Option<CrsRef> {
        match &crs.kind {
            CrsKind::Vertical(_) => Some(crs.clone()),
            CrsKind::Compound(c) => c.iter().find_map(Crs::extract_vertical_crs),
            CrsKind::Bound(b) => Crs::extract_vertical_crs(&b.base),
            _ => None,
        }
    }

    /// A geographic 2D CRS extended with an ellipsoidal height axis. Other
    /// CRS are returned as is
    pub fn promote_to_3d(crs: &CrsRef) -> CrsRef {
        Crs::with_geographic_dimension(crs, 3)
    }

    pub fn demote_to_2d(crs: &CrsRef) -> CrsRef {
        Crs::with_geographic_dimension(crs, 2)
    }

    fn with_geographic_dimension(crs: &CrsRef, dimension: usize) -> CrsRef {
        let CrsKind::Geographic(g) = &crs.kind else {
            return crs.clone();
        };
        if g.cs.dimension() == dimension {
            return crs.clone();
        }
        let geog = GeodeticCrs {
            datum: g.datum.clone(),
            cs: g.cs.with_dimension(dimension),
        };
        // The identifiers of the 2D CRS do not apply to the 3D version
        let mut object = IdentifiedObject::named(crs.name());
        object.domains = crs.object.domains.clone();
        Crs::wrap(object, CrsKind::Geographic(geog))
    }
}

// ----- E Q U I V A L E N C E ---------------------------------------------------------

impl Crs {
    pub fn is_equivalent_to(&self, other: &Crs, criterion: Criterion) -> bool {
        if self.id == other.id {
            return true;
        }
        if criterion == Criterion::Strict && self.name() != other.name() {
            return false;
        }

        match (&self.kind, &other.kind) {
            (CrsKind::Geographic(a), CrsKind::Geographic(b))
            | (CrsKind::Geocentric(a), CrsKind::Geocentric(b)) => {
                a.datum().is_equivalent_to(&b.datum(), criterion)
                    && a.cs.is_equivalent_to(&b.cs, criterion)
            }
            (CrsKind::Vertical(a), CrsKind::Vertical(b)) => {
                a.datum.datum().is_equivalent_to(&b.datum.datum(), criterion)
                    && a.cs.is_equivalent_to(&b.cs, criterion)
            }
            (CrsKind::Projected(a), CrsKind::Projected(b))
            | (CrsKind::Derived(a), CrsKind::Derived(b)) => {
                // Axis order relaxation applies to geographic CRS only
                let base_criterion = match criterion {
                    Criterion::EquivalentExceptAxisOrderGeogCrs => Criterion::Equivalent,
                    c => c,
                };
                a.base.is_equivalent_to(&b.base, base_criterion)
                    && a.conversion.is_equivalent_method_and_values(&b.conversion)
                    && a.cs.is_equivalent_to(&b.cs, Criterion::Equivalent)
            }
            (CrsKind::Compound(a), CrsKind::Compound(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.is_equivalent_to(y, criterion))
            }
            (CrsKind::Bound(a), CrsKind::Bound(b)) => {
                a.base.is_equivalent_to(&b.base, criterion)
                    && a.hub.is_equivalent_to(&b.hub, criterion)
                    && a.transformation.is_equivalent_method_and_values(&b.transformation)
            }
            _ => false,
        }
    }

    /// Same identifier, or equivalent. Components of a compound CRS match
    /// a CRS equivalent to their horizontal part
    pub(crate) fn is_more_or_less_equivalent_to(&self, other: &Crs) -> bool {
        if self.id == other.id {
            return true;
        }
        let ids_a = self.identifiers();
        let ids_b = other.identifiers();
        if ids_a.len() == 1 && ids_b.len() == 1 && ids_a[0] == ids_b[0] {
            return true;
        }
        if self.is_equivalent_to(other, Criterion::Equivalent) {
            return true;
        }
        // A compound CRS chained to a geographic 3D CRS: the transformation needs
        // the horizontal part only
        let (CrsKind::Compound(a), CrsKind::Compound(b)) = (&self.kind, &other.kind) else {
            return false;
        };
        a.len() == 2 && b.len() == 2 && a[1].is_equivalent_to(&b[1], Criterion::Equivalent)
            && a[0].is_equivalent_to(&b[0], Criterion::EquivalentExceptAxisOrderGeogCrs)
    }
}

// ----- T E S T S ------------------------------------------------------------------
