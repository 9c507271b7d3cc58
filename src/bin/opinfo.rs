//! opinfo: List the coordinate operations between two CRS, best first
use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use coordop::authority::split_code;
use coordop::prelude::*;
use log::{debug, info};
use std::path::PathBuf;

/// OPINFO: The coordop operation lister. Finds and ranks the coordinate
/// operations between a source and a target CRS, given as AUTH:CODE
/// (e.g. "EPSG:4269 EPSG:4326").
#[derive(Parser, Debug)]
#[clap(name = "opinfo")]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Desired accuracy in metres. Operations with unknown or worse accuracy are left out
    #[clap(long)]
    accuracy: Option<f64>,

    /// Area of interest, as west,south,east,north in degrees
    #[clap(long, allow_hyphen_values = true)]
    aoi: Option<String>,

    /// How grid availability influences the result
    #[clap(long, value_enum, default_value = "sort")]
    grid_policy: GridPolicy,

    /// How the area of use of an operation is checked against the area of interest
    #[clap(long, value_enum, default_value = "contains")]
    spatial_test: SpatialTest,

    /// Never search for operations through an intermediate CRS
    #[clap(long)]
    no_pivots: bool,

    /// Also print the operations as WKT2
    #[clap(long)]
    wkt: bool,

    /// Directory holding a "grids" subdirectory, searched first
    #[clap(long)]
    grid_dir: Option<PathBuf>,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// The source CRS
    source: String,

    /// The target CRS
    target: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GridPolicy {
    Ignore,
    Sort,
    Discard,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpatialTest {
    Contains,
    Intersects,
}

fn parse_aoi(aoi: &str) -> Result<Extent, anyhow::Error> {
    let values = aoi
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .with_context(|| format!("Malformed area of interest: {aoi}"))?;
    let [west, south, east, north] = values.as_slice() else {
        bail!("Expected west,south,east,north - got {aoi}");
    };
    Ok(Extent::from_bbox(*west, *south, *east, *north))
}

fn crs(authority: &Plain, definition: &str) -> Result<CrsRef, anyhow::Error> {
    let (auth, code) = split_code(definition)?;
    if auth != authority.authority() {
        bail!("Unknown authority: {auth}");
    }
    Ok(authority.create_crs(code)?)
}

fn main() -> Result<(), anyhow::Error> {
    let options = Cli::parse();
    env_logger::Builder::new()
        .filter_level(options.verbose.log_level_filter())
        .init();
    debug!("{options:#?}");

    let mut authority = Plain::new();
    if let Some(dir) = &options.grid_dir {
        authority = authority.with_search_path(dir.clone());
    }

    let source = crs(&authority, &options.source)?;
    let target = crs(&authority, &options.target)?;
    let area_of_interest = options.aoi.as_deref().map(parse_aoi).transpose()?;

    let grid_availability = match options.grid_policy {
        GridPolicy::Ignore => GridAvailabilityUse::Ignored,
        GridPolicy::Sort => GridAvailabilityUse::UseForSorting,
        GridPolicy::Discard => GridAvailabilityUse::DiscardIfMissing,
    };
    let spatial_criterion = match options.spatial_test {
        SpatialTest::Contains => SpatialCriterion::StrictContainment,
        SpatialTest::Intersects => SpatialCriterion::PartialIntersection,
    };
    let mut ctx = OperationContext::new(Some(&authority), area_of_interest, options.accuracy.unwrap_or(0.0))
        .with_grid_availability_use(grid_availability)
        .with_spatial_criterion(spatial_criterion);
    if options.no_pivots {
        ctx = ctx.with_allowed_intermediate_crs(IntermediateCrsUse::Never);
    }

    let ops = CoordinateOperationFactory::new().create_operations(&source, &target, &ctx)?;
    info!("{} operations from {} to {}", ops.len(), source.name(), target.name());
    println!("Candidate operations found: {}", ops.len());

    for (i, op) in ops.iter().enumerate() {
        println!("-------------------------------------");
        let code = op
            .identifiers()
            .first()
            .map(|id| format!("{}:{}, ", id.codespace, id.code))
            .unwrap_or_default();
        println!("{}: {code}{}", i + 1, op.name());
        match op.accuracy() {
            Some(accuracy) => println!("   accuracy: {accuracy} m"),
            None => println!("   accuracy: unknown"),
        }
        if let Some(extent) = op.domain_extent() {
            let description = extent.description.as_deref().unwrap_or("unnamed");
            match extent.bbox {
                Some(b) => println!("   area of use: {description}, {}, {}, {}, {}", b.west, b.south, b.east, b.north),
                None => println!("   area of use: {description}"),
            }
        }
        let grids = op.grids_needed();
        if !grids.is_empty() {
            println!("   grids: {}", grids.join(", "));
        }
        match op.export_to_proj_string() {
            Ok(pipeline) => println!("   PROJ string: {pipeline}"),
            Err(e) => println!("   PROJ string: unavailable ({e})"),
        }
        if options.wkt {
            println!("   WKT2: {}", op.export_to_wkt(WktVersion::Wkt2_2019)?);
        }
    }
    Ok(())
}
