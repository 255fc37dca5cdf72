use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use route_planner::cache::{CostCache, DEFAULT_FLUSH_EVERY};
use route_planner::error::PlannerError;
use route_planner::geocode::{DEFAULT_REGION, GeocoderConfig, MapQuestGeocoder};
use route_planner::input::load_addresses;
use route_planner::mapquest::{MapQuestConfig, MapQuestDirections};
use route_planner::matrix::MatrixOptions;
use route_planner::osrm::{OsrmClient, OsrmConfig};
use route_planner::planner::{PlannerOptions, RoutePlan, plan, validate};
use route_planner::report::RouteReport;
use route_planner::route_cost::RouteCostProvider;
use route_planner::solver::{DEFAULT_EXACT_SEARCH_LIMIT, OptimizeOptions};

/// Plan a delivery tour from a depot through a list of addresses.
#[derive(Debug, Parser)]
#[command(name = "route-planner", version)]
struct Cli {
    /// File with one `label,address` per line; the first line is the depot.
    #[arg(default_value = "addresses.csv")]
    addresses: PathBuf,

    /// Where to write the JSON route report.
    #[arg(short, long, default_value = "route.json")]
    output: PathBuf,

    /// MapQuest key, used for geocoding and fallback routing.
    #[arg(long, env = "MAPQUEST_API_KEY", hide_env_values = true)]
    mapquest_key: Option<String>,

    /// Persistent route cost cache.
    #[arg(long, env = "ROUTE_PLANNER_CACHE", default_value = "route_costs_cache.json")]
    cache: PathBuf,

    /// New cache entries between flushes to disk.
    #[arg(long, default_value_t = DEFAULT_FLUSH_EVERY)]
    flush_every: usize,

    /// Region appended to addresses that do not mention it.
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Do not append a region to addresses.
    #[arg(long)]
    no_region: bool,

    /// OSRM server used as the primary router.
    #[arg(long, default_value_t = OsrmConfig::default().base_url)]
    osrm_url: String,

    /// OSRM routing profile.
    #[arg(long, default_value_t = OsrmConfig::default().profile)]
    osrm_profile: String,

    /// Milliseconds to wait between route lookups.
    #[arg(long, default_value_t = 300)]
    request_delay_ms: u64,

    /// Milliseconds to wait between geocoding requests.
    #[arg(long, default_value_t = 500)]
    geocode_delay_ms: u64,

    /// Largest stop count (depot included) solved exactly.
    #[arg(long, default_value_t = DEFAULT_EXACT_SEARCH_LIMIT)]
    exact_limit: usize,

    /// 2-opt passes applied to heuristic tours.
    #[arg(long, default_value_t = 0)]
    two_opt_passes: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "route planning failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PlannerError> {
    let entries = load_addresses(&cli.addresses)?;
    validate(&entries)?;

    let api_key = cli
        .mapquest_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(PlannerError::MissingCredentials("MAPQUEST_API_KEY"))?;

    let mapquest = MapQuestConfig::new(api_key);
    let region = (!cli.no_region).then_some(cli.region);
    let geocoder = MapQuestGeocoder::new(GeocoderConfig::new(mapquest.clone()).with_region(region))?;

    let osrm = OsrmClient::new(OsrmConfig {
        base_url: cli.osrm_url,
        profile: cli.osrm_profile,
        ..OsrmConfig::default()
    })?;
    let directions = MapQuestDirections::new(mapquest)?;

    let mut cache = CostCache::new(&cli.cache).with_flush_every(cli.flush_every);
    cache.load();
    let mut costs = RouteCostProvider::new(cache, osrm, directions);

    let options = PlannerOptions {
        geocode_delay: Duration::from_millis(cli.geocode_delay_ms),
        matrix: MatrixOptions {
            request_delay: Duration::from_millis(cli.request_delay_ms),
        },
        optimize: OptimizeOptions {
            exact_search_limit: cli.exact_limit,
            two_opt_passes: cli.two_opt_passes,
        },
    };

    let result = plan(&entries, &geocoder, &mut costs, &options);

    if let Err(err) = costs.flush_cache() {
        warn!(error = %err, "could not save route cost cache");
    }
    let stats = costs.stats();
    info!(
        cache_hits = stats.cache_hits,
        primary = stats.primary,
        fallback = stats.fallback,
        unreachable = stats.unreachable,
        "route lookups"
    );

    let route = result?;
    print_summary(&route);

    RouteReport::from_plan(&route).write_json(&cli.output)?;
    info!(path = %cli.output.display(), "route report written");
    Ok(())
}

fn print_summary(route: &RoutePlan) {
    let tour = &route.tour;
    println!("Route summary ({:?})", tour.strategy);
    println!("  Total distance: {:.2} km", tour.total_distance_meters / 1000.0);
    println!("  Total time: {:.2} hours", tour.total_duration_seconds / 3600.0);
    println!("Route order:");
    let last = tour.order.len().saturating_sub(1);
    for (position, planned) in route.ordered_stops().enumerate() {
        let marker = if position == 0 || position == last { " (depot)" } else { "" };
        println!(
            "  {position}. {}{marker}: {}",
            planned.stop.label, planned.stop.address
        );
    }
    if !route.skipped.is_empty() {
        println!("Skipped (could not geocode):");
        for planned in &route.skipped {
            println!("  {}: {}", planned.stop.label, planned.stop.address);
        }
    }
}
