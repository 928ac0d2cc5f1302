//! Climate explorer command-line client.
//!
//! Exercises the remote tile, point, metadata and catalog search services
//! for a selection, through the same resolver and fetch orchestration the
//! dashboard runs on.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use explorer_common::{GwlLevel, ValueType};
use explorer_fetch::{
    FetcherConfig, HttpFetcher, Orchestrator, OrchestratorConfig, PointValues, SlotData,
};
use explorer_resolver::{
    selection::{SOLAR_DISTRIBUTED, SOLAR_UTILITY, WIND_FAR, WIND_NEAR},
    Endpoints, Resolver, ResourceType, SelectionState,
};

#[derive(Parser, Debug)]
#[command(name = "explorer")]
#[command(about = "Query downscaled climate projection services for a selection")]
struct Args {
    /// Tile / point / metadata service base URL
    #[arg(long, env = "TILE_API_URL", default_value = "https://tiles.cal-adapt.org")]
    tile_base: String,

    /// Catalog search service base URL
    #[arg(long, env = "SEARCH_API_URL", default_value = "https://query.cal-adapt.org")]
    search_base: String,

    /// Configuration directory (contains metrics.yaml)
    #[arg(long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the metrics in the catalog
    Metrics,
    /// Fetch tile metadata and the legend for a metric
    Tile {
        /// Metric id from the catalog
        #[arg(long, default_value = "0")]
        metric: usize,
        #[arg(long, default_value = "abs", value_parser = parse_value_type)]
        value_type: ValueType,
        /// Warming level to show (defaults to the level closest to 1.5°C)
        #[arg(long)]
        gwl: Option<f64>,
    },
    /// Query mean/min/max metric values at a location
    Point {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value = "0")]
        metric: usize,
        #[arg(long, default_value = "abs", value_parser = parse_value_type)]
        value_type: ValueType,
        #[arg(long)]
        gwl: Option<f64>,
    },
    /// Query renewables drought data at a location
    Renewables {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Configuration code: srdu, srdd, wrdn or wrdf
        #[arg(long, default_value = SOLAR_UTILITY)]
        configuration: String,
    },
    /// Search downloadable assets for the selected models and counties
    Search {
        #[arg(long, value_delimiter = ',', required = true)]
        models: Vec<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        variables: Vec<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        boundaries: Vec<String>,
        #[arg(long, value_delimiter = ',', default_value = "ssp370")]
        scenarios: Vec<String>,
    },
}

fn parse_value_type(raw: &str) -> Result<ValueType, String> {
    match raw.to_lowercase().as_str() {
        "abs" | "absolute" => Ok(ValueType::Abs),
        "del" | "delta" => Ok(ValueType::Del),
        other => Err(format!("unknown value type '{}', expected abs or del", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let catalog = config::load_catalog(&args.config_dir)?;
    let resolver = Resolver::new(catalog, Endpoints::new(&args.tile_base, &args.search_base));
    let api =
        Arc::new(HttpFetcher::new(FetcherConfig::default()).context("Failed to create fetcher")?);
    let orchestrator = Orchestrator::new(api, resolver, OrchestratorConfig::default());

    match args.command {
        Command::Metrics => list_metrics(&orchestrator),
        Command::Tile {
            metric,
            value_type,
            gwl,
        } => show_tile(&orchestrator, metric, value_type, gwl).await?,
        Command::Point {
            lon,
            lat,
            metric,
            value_type,
            gwl,
        } => show_point(&orchestrator, lon, lat, metric, value_type, gwl).await?,
        Command::Renewables {
            lon,
            lat,
            configuration,
        } => show_renewables(&orchestrator, lon, lat, &configuration).await?,
        Command::Search {
            models,
            variables,
            boundaries,
            scenarios,
        } => run_search(&orchestrator, models, variables, boundaries, scenarios).await?,
    }

    orchestrator.shutdown().await;
    Ok(())
}

fn list_metrics(orchestrator: &Orchestrator) {
    for metric in &orchestrator.resolver().catalog().metrics {
        let mut value_types = Vec::new();
        if metric.abs.is_some() {
            value_types.push("abs");
        }
        if metric.del.is_some() {
            value_types.push("del");
        }
        println!("{:3}  {:24} [{}]", metric.id, metric.title, value_types.join(", "));
    }
}

/// Sync the map slots for a selection, optionally repositioning to an
/// explicitly requested warming level once the valid list is known.
async fn sync_selection(
    orchestrator: &Orchestrator,
    metric: usize,
    value_type: ValueType,
    gwl: Option<f64>,
) -> Result<SelectionState> {
    let mut state = SelectionState::default();
    state.set_metric(metric);
    state.set_value_type(value_type);

    orchestrator.sync_map(&mut state).await;

    let gwl_view = orchestrator.gwl_view().borrow().clone();
    let SlotData::Ready(list) = gwl_view.data else {
        bail!(
            "No warming-level list for metric {} ({}): {}",
            metric,
            value_type,
            gwl_view.error.unwrap_or_else(|| "selection has no data".to_string())
        );
    };

    if let Some(requested) = gwl {
        let wanted = GwlLevel::Number(requested);
        let Some(index) = list.levels.iter().position(|l| l.same_level(&wanted)) else {
            let available: Vec<String> = list.levels.iter().map(|l| l.literal()).collect();
            bail!(
                "Warming level {} not available; valid levels: {}",
                requested,
                available.join(", ")
            );
        };
        if index != state.gwl_index {
            state.set_gwl_index(index);
            orchestrator.sync_map(&mut state).await;
        }
    }

    Ok(state)
}

async fn show_tile(
    orchestrator: &Orchestrator,
    metric: usize,
    value_type: ValueType,
    gwl: Option<f64>,
) -> Result<()> {
    let state = sync_selection(orchestrator, metric, value_type, gwl).await?;

    let view = orchestrator.tile_view().borrow().clone();
    if let Some(error) = view.error {
        bail!("Tile request failed: {}", error);
    }
    let SlotData::Ready(tilejson) = view.data else {
        println!("No tile data for this selection");
        return Ok(());
    };

    for template in &tilejson.tiles {
        println!("{}", template);
    }

    if let Some(legend) = orchestrator.resolver().legend(&state) {
        println!("\n{}", legend.title);
        for (value, label) in legend.scale.ticks(3) {
            let color = legend.ramp.sample(legend.scale.normalize(value));
            println!("  {:>10}  {}", label, color.to_hex());
        }
    }
    Ok(())
}

fn print_point_values(values: &PointValues) {
    if let Some(mean) = values.mean {
        println!("mean: {:.3}", mean);
    }
    if let Some(min) = values.min {
        println!("min:  {:.3}", min);
    }
    if let Some(max) = values.max {
        println!("max:  {:.3}", max);
    }
}

async fn show_point(
    orchestrator: &Arc<Orchestrator>,
    lon: f64,
    lat: f64,
    metric: usize,
    value_type: ValueType,
    gwl: Option<f64>,
) -> Result<()> {
    let state = sync_selection(orchestrator, metric, value_type, gwl).await?;

    info!(lon, lat, "Querying point values");
    orchestrator.trigger_point(lon, lat, &state).await;

    let view = orchestrator.point_view().borrow().clone();
    if let Some(error) = view.error {
        bail!("Point query failed: {}", error);
    }
    match view.data {
        SlotData::Ready(values) => print_point_values(&values),
        SlotData::NoData => println!("No data available at this location"),
        SlotData::Empty => println!("No point data for this selection"),
    }
    Ok(())
}

async fn show_renewables(
    orchestrator: &Orchestrator,
    lon: f64,
    lat: f64,
    configuration: &str,
) -> Result<()> {
    let mut state = SelectionState::default();
    match configuration {
        SOLAR_UTILITY | SOLAR_DISTRIBUTED => state.set_resource_type(ResourceType::Solar),
        WIND_NEAR | WIND_FAR => state.set_resource_type(ResourceType::Wind),
        other => bail!(
            "Unknown configuration '{}', expected one of {}, {}, {}, {}",
            other,
            SOLAR_UTILITY,
            SOLAR_DISTRIBUTED,
            WIND_NEAR,
            WIND_FAR
        ),
    }
    state.set_configuration(configuration);

    orchestrator.query_renewables_point(lon, lat, &state).await;

    let view = orchestrator.point_view().borrow().clone();
    if let Some(error) = view.error {
        bail!("Renewables query failed: {}", error);
    }
    match view.data {
        SlotData::Ready(values) => print_point_values(&values),
        SlotData::NoData => println!("No data available at this location"),
        SlotData::Empty => println!("No renewables data for this selection"),
    }
    Ok(())
}

async fn run_search(
    orchestrator: &Orchestrator,
    models: Vec<String>,
    variables: Vec<String>,
    boundaries: Vec<String>,
    scenarios: Vec<String>,
) -> Result<()> {
    let mut state = SelectionState::default();
    state.selected_models = models.into_iter().collect();
    state.selected_variables = variables.into_iter().collect();
    state.selected_boundaries = boundaries.into_iter().collect();
    state.selected_scenarios = scenarios.into_iter().collect();

    match orchestrator.submit_search(&state).await {
        Ok(_) => {}
        Err(validation) => {
            for field in &validation.missing {
                eprintln!("missing required field: {}", field);
            }
            bail!("{}", validation);
        }
    }

    let view = orchestrator.search_view().borrow().clone();
    if let Some(error) = view.error {
        bail!("Search failed: {}", error);
    }
    match view.data {
        SlotData::Ready(results) => {
            for model in &results {
                println!("{}", model.model);
                for link in &model.links {
                    println!("  {:12} {}", link.name, link.href);
                }
            }
        }
        SlotData::NoData => println!("No matching datasets found"),
        SlotData::Empty => println!("No results"),
    }
    Ok(())
}
