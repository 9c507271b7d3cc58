use crate::authoring::*;

/// How the areas of use of the source and target CRS determine the area of
/// interest, when none is given explicitly
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceTargetCrsExtentUse {
    /// Ignore the CRS extents
    None,
    /// Consider both extents: operations must satisfy the spatial criterion against each
    Both,
    /// The intersection of the source and target extents
    Intersection,
    /// The smaller of the source and target extents
    #[default]
    Smallest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpatialCriterion {
    /// The area of use of an operation must contain the area of interest
    #[default]
    StrictContainment,
    /// The area of use of an operation must intersect the area of interest
    PartialIntersection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GridAvailabilityUse {
    /// Grid availability is not considered
    Ignored,
    /// Operations with available grids are sorted first
    #[default]
    UseForSorting,
    /// Operations needing a grid which is not available are left out
    DiscardIfMissing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntermediateCrsUse {
    /// Always search for operations through an intermediate CRS
    Always,
    /// Only when the authority has few direct operations
    #[default]
    IfNoDirectTransformation,
    Never,
}

// ----- T H E   O P E R A T I O N   C O N T E X T -------------------------------------

/// The search configuration of [`CoordinateOperationFactory::create_operations`].
///
/// A context holding an authority borrows it for the duration of the search.
/// Authorities backed by a live database connection should not be shared
/// between threads through a context: use one context per thread.
#[derive(Clone)]
pub struct OperationContext<'a> {
    authority: Option<&'a dyn AuthorityFactory>,
    area_of_interest: Option<Extent>,
    desired_accuracy: f64,
    extent_use: SourceTargetCrsExtentUse,
    spatial_criterion: SpatialCriterion,
    grid_availability: GridAvailabilityUse,
    intermediate_crs_use: IntermediateCrsUse,
    intermediate_crs: Vec<(String, String)>,
    use_proj_alternative_grid_names: bool,
}

impl<'a> OperationContext<'a> {
    /// A context with default policies. A `desired_accuracy` of 0 means
    /// "no accuracy requirement"
    pub fn new(
        authority: Option<&'a dyn AuthorityFactory>,
        area_of_interest: Option<Extent>,
        desired_accuracy: f64,
    ) -> OperationContext<'a> {
        OperationContext {
            authority,
            area_of_interest,
            desired_accuracy,
            extent_use: SourceTargetCrsExtentUse::default(),
            spatial_criterion: SpatialCriterion::default(),
            grid_availability: GridAvailabilityUse::default(),
            intermediate_crs_use: IntermediateCrsUse::default(),
            intermediate_crs: Vec::new(),
            use_proj_alternative_grid_names: true,
        }
    }

    #[must_use]
    pub fn with_area_of_interest(mut self, extent: Option<Extent>) -> Self {
        self.area_of_interest = extent;
        self
    }

    #[must_use]
    pub fn with_desired_accuracy(mut self, accuracy: f64) -> Self {
        self.desired_accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn with_source_target_crs_extent_use(mut self, extent_use: SourceTargetCrsExtentUse) -> Self {
        self.extent_use = extent_use;
        self
    }

    #[must_use]
    pub fn with_spatial_criterion(mut self, criterion: SpatialCriterion) -> Self {
        self.spatial_criterion = criterion;
        self
    }

    #[must_use]
    pub fn with_grid_availability_use(mut self, grid_availability: GridAvailabilityUse) -> Self {
        self.grid_availability = grid_availability;
        self
    }

    #[must_use]
    pub fn with_allowed_intermediate_crs(mut self, intermediate_crs_use: IntermediateCrsUse) -> Self {
        self.intermediate_crs_use = intermediate_crs_use;
        self
    }

    /// Restrict intermediate CRS to the (authority, code) pairs given.
    /// An empty list means "any"
    #[must_use]
    pub fn with_intermediate_crs(mut self, intermediate_crs: &[(&str, &str)]) -> Self {
        self.intermediate_crs = intermediate_crs
            .iter()
            .map(|(a, c)| (a.to_string(), c.to_string()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_proj_alternative_grid_names(mut self, use_alternative_names: bool) -> Self {
        self.use_proj_alternative_grid_names = use_alternative_names;
        self
    }

    pub fn authority(&self) -> Option<&'a dyn AuthorityFactory> {
        self.authority
    }

    pub fn area_of_interest(&self) -> Option<&Extent> {
        self.area_of_interest.as_ref()
    }

    pub fn desired_accuracy(&self) -> f64 {
        self.desired_accuracy
    }

    pub fn source_target_crs_extent_use(&self) -> SourceTargetCrsExtentUse {
        self.extent_use
    }

    pub fn spatial_criterion(&self) -> SpatialCriterion {
        self.spatial_criterion
    }

    pub fn grid_availability_use(&self) -> GridAvailabilityUse {
        self.grid_availability
    }

    pub fn allowed_intermediate_crs(&self) -> IntermediateCrsUse {
        self.intermediate_crs_use
    }

    pub fn intermediate_crs(&self) -> &[(String, String)] {
        &self.intermediate_crs
    }

    pub fn use_proj_alternative_grid_names(&self) -> bool {
        self.use_proj_alternative_grid_names
    }

    /// Availability of a grid, as told by the authority. Without an
    /// authority, all grids are considered unavailable
    pub(crate) fn grid_available(&self, name: &str) -> bool {
        self.authority
            .and_then(|a| a.lookup_grid_info(name))
            .map_or(false, |info| info.available)
    }

    /// Whether the authority knows the grid at all
    pub(crate) fn grid_known(&self, name: &str) -> bool {
        self.authority
            .and_then(|a| a.lookup_grid_info(name))
            .is_some()
    }
}

impl std::fmt::Debug for OperationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("authority", &self.authority.map(|a| a.authority().to_string()))
            .field("area_of_interest", &self.area_of_interest)
            .field("desired_accuracy", &self.desired_accuracy)
            .field("extent_use", &self.extent_use)
            .field("spatial_criterion", &self.spatial_criterion)
            .field("grid_availability", &self.grid_availability)
            .field("intermediate_crs_use", &self.intermediate_crs_use)
            .field("intermediate_crs", &self.intermediate_crs)
            .finish()
    }
}

// ----- T E S T S ------------------------------------------------------------------
