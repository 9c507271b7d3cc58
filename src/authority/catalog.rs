use super::builtin;
use crate::authoring::*;
use crate::operation::concatenated;

// ----- T H E   C A T A L O G ---------------------------------------------------------

/// The in-memory registry behind the builtin authorities: CRS and
/// operations by code, and grid descriptions by name.
#[derive(Debug)]
pub struct Catalog {
    authority: String,
    crs: BTreeMap<String, CrsRef>,
    operations: BTreeMap<String, OperationRef>,
    grids: BTreeMap<String, GridInfo>,
}

impl Default for Catalog {
    fn default() -> Catalog {
        Catalog {
            authority: "EPSG".to_string(),
            crs: BTreeMap::new(),
            operations: BTreeMap::new(),
            grids: BTreeMap::new(),
        }
    }
}

impl Catalog {
    /// The builtin EPSG content
    pub fn epsg() -> Catalog {
        let mut catalog = Catalog::default();

        let crs = [
            builtin::wgs84_geographic_2d(),
            builtin::wgs84_geographic_3d(),
            builtin::wgs84_geocentric(),
            builtin::nad83_geographic_2d(),
            builtin::nad27_geographic_2d(),
            builtin::ntf_geographic_2d(),
            builtin::ntf_paris_geographic_2d(),
            builtin::egm2008_height(),
            builtin::navd88_height(),
            builtin::navd88_height_ft(),
            builtin::msl_height(),
        ];
        for crs in crs {
            if let Some(code) = crs.object.epsg_code() {
                catalog.register_crs(&code.to_string(), crs);
            }
        }

        // The compound CRS is built from the registered components, to keep identities
        let (Some(wgs84), Some(egm2008)) = (catalog.lookup_crs("4326"), catalog.lookup_crs("3855")) else {
            return catalog;
        };
        match builtin::wgs84_egm2008_compound_of(&wgs84, &egm2008) {
            Ok(compound) => catalog.register_crs("9518", compound),
            Err(e) => warn!("Catalog: {e}"),
        }

        let operations = catalog.builtin_operations();
        for op in operations {
            if let Some(code) = op.object.epsg_code() {
                catalog.register_operation(&code.to_string(), op);
            }
        }

        for grid in builtin::grids() {
            catalog.register_grid(grid);
        }
        catalog
    }

    fn builtin_operations(&self) -> Vec<OperationRef> {
        let crs = |code: &str| self.lookup_crs(code);
        let mut operations = Vec::new();
        let mut add = |op: Result<OperationRef, Error>| match op {
            Ok(op) => operations.push(op),
            Err(e) => warn!("Catalog: builtin operation rejected: {e}"),
        };

        if let (Some(nad83), Some(wgs84)) = (crs("4269"), crs("4326")) {
            add(builtin::nad83_to_wgs84_1(&nad83, &wgs84));
            add(builtin::nad83_to_wgs84_5(&nad83, &wgs84));
        }
        if let (Some(nad27), Some(nad83)) = (crs("4267"), crs("4269")) {
            add(builtin::nad27_to_nad83_1(&nad27, &nad83));
            add(builtin::nad27_to_nad83_4(&nad27, &nad83));
        }
        if let (Some(nad27), Some(wgs84)) = (crs("4267"), crs("4326")) {
            add(builtin::nad27_to_wgs84_4(&nad27, &wgs84));
        }
        if let (Some(ntf), Some(wgs84)) = (crs("4275"), crs("4326")) {
            add(builtin::ntf_to_wgs84_1(&ntf, &wgs84));
        }
        if let (Some(ntf_paris), Some(ntf)) = (crs("4807"), crs("4275")) {
            add(builtin::ntf_paris_to_ntf_1(&ntf_paris, &ntf));
        }
        if let (Some(wgs84_3d), Some(egm2008)) = (crs("4979"), crs("3855")) {
            add(builtin::wgs84_to_egm2008_height_1(&wgs84_3d, &egm2008));
        }
        operations
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    fn no_such_code(&self, code: &str) -> Error {
        Error::NoSuchAuthorityCode {
            authority: self.authority.clone(),
            code: code.to_string(),
        }
    }

    /// Registered CRS, or a WGS 84 / UTM CRS built on demand
    fn lookup_crs(&self, code: &str) -> Option<CrsRef> {
        if let Some(crs) = self.crs.get(code) {
            return Some(crs.clone());
        }
        let number = code.parse::<u32>().ok()?;
        let (zone, north) = match number {
            32601..=32660 => (number - 32600, true),
            32701..=32760 => (number - 32700, false),
            _ => return None,
        };
        let wgs84 = self.crs.get("4326")?;
        builtin::utm_on(wgs84, zone, north).ok()
    }

    pub fn crs(&self, code: &str) -> Result<CrsRef, Error> {
        self.lookup_crs(code).ok_or_else(|| self.no_such_code(code))
    }

    pub fn operation(&self, code: &str, use_proj_alternative_grid_names: bool) -> Result<OperationRef, Error> {
        let op = self
            .operations
            .get(code)
            .ok_or_else(|| self.no_such_code(code))?;
        if use_proj_alternative_grid_names {
            return Ok(self.with_alternative_grids(op));
        }
        Ok(op.clone())
    }

    /// A grid, by its short name or its alternative name
    pub fn grid(&self, name: &str) -> Option<&GridInfo> {
        if let Some(info) = self.grids.get(name) {
            return Some(info);
        }
        self.grids
            .values()
            .find(|g| g.alternative_name.as_deref() == Some(name))
    }

    pub fn register_crs(&mut self, code: &str, crs: CrsRef) {
        self.crs.insert(code.to_string(), crs);
    }

    pub fn register_operation(&mut self, code: &str, op: OperationRef) {
        self.operations.insert(code.to_string(), op);
    }

    pub fn register_grid(&mut self, info: GridInfo) {
        self.grids.insert(info.short_name.clone(), info);
    }

    // A copy using the alternative grid names, if it uses any grid having one
    fn with_alternative_grids(&self, op: &OperationRef) -> OperationRef {
        let alternative = |name: &str| self.grid(name).and_then(|g| g.alternative_name.clone());
        if !op.grids_needed().iter().any(|g| alternative(g).is_some()) {
            return op.clone();
        }
        Arc::new(op.with_substituted_grids(&alternative))
    }
}

// ----- S E A R C H -------------------------------------------------------------------

fn identified_by(crs: &Option<CrsRef>, authority: &str, code: &str) -> bool {
    crs.as_ref().map_or(false, |crs| {
        crs.identifiers()
            .iter()
            .any(|id| id.codespace == authority && id.code == code)
    })
}

impl Catalog {
    /// The operations from (`source_authority`, `source_code`) to
    /// (`target_authority`, `target_code`), in order of registration code.
    /// With `discard_if_missing_grid`, operations needing a grid for which
    /// `available` says no are left out
    #[allow(clippy::too_many_arguments)]
    pub fn find(
        &self,
        source_authority: &str,
        source_code: &str,
        target_authority: &str,
        target_code: &str,
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
        available: &dyn Fn(&str) -> bool,
    ) -> Vec<OperationRef> {
        let mut result = Vec::new();
        for op in self.operations.values() {
            if !identified_by(&op.source_crs(), source_authority, source_code)
                || !identified_by(&op.target_crs(), target_authority, target_code)
            {
                continue;
            }
            let op = if use_proj_alternative_grid_names {
                self.with_alternative_grids(op)
            } else {
                op.clone()
            };
            if discard_if_missing_grid && !op.grids_needed().iter().all(|g| available(g)) {
                trace!("Catalog: discarding {}: missing grid", op.name());
                continue;
            }
            result.push(op);
        }
        result
    }

    // Operations in either direction, the reverse ones inverted
    #[allow(clippy::too_many_arguments)]
    fn find_both_ways(
        &self,
        source: (&str, &str),
        target: (&str, &str),
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
        available: &dyn Fn(&str) -> bool,
    ) -> Vec<OperationRef> {
        let flags = (use_proj_alternative_grid_names, discard_if_missing_grid);
        let mut ops = self.find(source.0, source.1, target.0, target.1, flags.0, flags.1, available);
        for op in self.find(target.0, target.1, source.0, source.1, flags.0, flags.1, available) {
            match CoordinateOperation::inverse(&op) {
                Ok(inverse) => ops.push(inverse),
                Err(e) => trace!("Catalog: no inverse of {}: {e}", op.name()),
            }
        }
        ops
    }

    /// Concatenations of two operations through an intermediate CRS. If
    /// `intermediate_crs` is empty, every registered CRS is a candidate
    #[allow(clippy::too_many_arguments)]
    pub fn find_with_intermediates(
        &self,
        source_authority: &str,
        source_code: &str,
        target_authority: &str,
        target_code: &str,
        use_proj_alternative_grid_names: bool,
        discard_if_missing_grid: bool,
        available: &dyn Fn(&str) -> bool,
        intermediate_crs: &[(String, String)],
    ) -> Vec<OperationRef> {
        let pivots: Vec<(String, String)> = if intermediate_crs.is_empty() {
            self.crs
                .keys()
                .map(|code| (self.authority.clone(), code.clone()))
                .collect()
        } else {
            intermediate_crs.to_vec()
        };

        let source = (source_authority, source_code);
        let target = (target_authority, target_code);
        let flags = (use_proj_alternative_grid_names, discard_if_missing_grid);
        let mut result = Vec::new();
        for (authority, code) in pivots.iter() {
            let pivot = (authority.as_str(), code.as_str());
            if pivot == source || pivot == target {
                continue;
            }
            let first = self.find_both_ways(source, pivot, flags.0, flags.1, available);
            if first.is_empty() {
                continue;
            }
            let second = self.find_both_ways(pivot, target, flags.0, flags.1, available);
            for a in first.iter() {
                for b in second.iter() {
                    match concatenated::create_compute_metadata(&[a.clone(), b.clone()], true) {
                        Ok(op) => result.push(op),
                        Err(e) => trace!("Catalog: {} + {}: {e}", a.name(), b.name()),
                    }
                }
            }
        }
        debug!(
            "Catalog: {} operations from {}:{} to {}:{} through an intermediate CRS",
            result.len(),
            source_authority,
            source_code,
            target_authority,
            target_code
        );
        result
    }
}

// ----- T E S T S ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn everything(_: &str) -> bool {
        true
    }

    fn nothing(_: &str) -> bool {
        false
    }

    #[test]
    fn lookup() -> Result<(), Error> {
        let catalog = Catalog::epsg();
        assert_eq!(catalog.authority(), "EPSG");
        assert_eq!(catalog.crs("4326")?.name(), "WGS 84");
        assert_eq!(catalog.crs("9518")?.components().len(), 2);
        assert!(Arc::ptr_eq(&catalog.crs("4326")?, &catalog.crs("4326")?));

        let utm = catalog.crs("32631")?;
        assert_eq!(utm.name(), "WGS 84 / UTM zone 31N");
        assert!(Arc::ptr_eq(utm.base_crs().unwrap(), &catalog.crs("4326")?));
        assert_eq!(catalog.crs("32733")?.name(), "WGS 84 / UTM zone 33S");

        assert!(matches!(catalog.crs("32661"), Err(Error::NoSuchAuthorityCode { .. })));
        assert!(matches!(catalog.crs("0"), Err(Error::NoSuchAuthorityCode { .. })));

        let op = catalog.operation("1173", false)?;
        assert_eq!(op.name(), "NAD27 to WGS 84 (4)");
        assert!(catalog.operation("9999", false).is_err());
        Ok(())
    }

    #[test]
    fn grids() -> Result<(), Error> {
        let catalog = Catalog::epsg();
        let op = catalog.operation("1313", true)?;
        assert_eq!(op.grids_needed(), vec!["ca_nrc_ntv2_0.tif".to_string()]);
        assert_eq!(catalog.grid("ca_nrc_ntv2_0.tif").map(|g| g.short_name.as_str()), Some("ntv2_0.gsb"));

        // Without the alternative names, the operation is the registered one
        let registered = catalog.operation("1313", false)?;
        assert!(Arc::ptr_eq(&registered, &catalog.operation("1313", false)?));

        let ops = catalog.find("EPSG", "4267", "EPSG", "4269", false, false, &everything);
        assert_eq!(ops.len(), 2);
        let ops = catalog.find("EPSG", "4267", "EPSG", "4269", false, true, &nothing);
        assert!(ops.is_empty());
        let ops = catalog.find("EPSG", "4267", "EPSG", "4269", true, true, &|g| g == "ca_nrc_ntv2_0.tif");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "NAD27 to NAD83 (4)");
        Ok(())
    }

    #[test]
    fn intermediates() -> Result<(), Error> {
        let catalog = Catalog::epsg();
        let ops = catalog.find_with_intermediates("EPSG", "4267", "EPSG", "4326", false, false, &everything, &[]);
        // NADCON and NTv2, each followed by one of the two NAD83 to WGS 84 transformations
        assert_eq!(ops.len(), 4);
        assert!(ops.iter().all(|op| op.step_count() == 2));
        assert!(ops.iter().any(|op| op.name() == "NAD27 to NAD83 (1) + NAD83 to WGS 84 (1)"));

        let whitelist = [("EPSG".to_string(), "4269".to_string())];
        let ops = catalog.find_with_intermediates("EPSG", "4267", "EPSG", "4326", false, false, &everything, &whitelist);
        assert_eq!(ops.len(), 4);
        let whitelist = [("EPSG".to_string(), "4275".to_string())];
        let ops = catalog.find_with_intermediates("EPSG", "4267", "EPSG", "4326", false, false, &everything, &whitelist);
        assert!(ops.is_empty());

        // Reverse direction: the legs are inverted
        let ops = catalog.find_with_intermediates("EPSG", "4326", "EPSG", "4267", false, false, &everything, &[]);
        assert!(ops.iter().any(|op| op.name() == "Inverse of NAD83 to WGS 84 (1) + Inverse of NAD27 to NAD83 (1)"));
        Ok(())
    }
}
