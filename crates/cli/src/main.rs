use clap::{Parser, ValueEnum};
use smallworld_core::config::level_multiplier_for;
use smallworld_core::{DistanceMetric, HnswConfig, HnswIndex, NeighborSelection, Point};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    Euclidean,
    SquaredEuclidean,
    Cosine,
}

impl From<MetricArg> for DistanceMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Euclidean => DistanceMetric::Euclidean,
            MetricArg::SquaredEuclidean => DistanceMetric::SquaredEuclidean,
            MetricArg::Cosine => DistanceMetric::Cosine,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SelectionArg {
    Simple,
    Heuristic,
}

impl From<SelectionArg> for NeighborSelection {
    fn from(s: SelectionArg) -> Self {
        match s {
            SelectionArg::Simple => NeighborSelection::Simple,
            SelectionArg::Heuristic => NeighborSelection::Heuristic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "smallworld",
    about = "Build an HNSW index over a point set and run a k-NN query"
)]
struct Args {
    /// JSON file with an array of {"label", "vector"} points (built-in demo set if omitted)
    #[arg(long)]
    points: Option<PathBuf>,

    /// JSON file with an index configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum neighbors per node per layer (M)
    #[arg(short = 'm', long = "max-neighbors")]
    max_neighbors: Option<usize>,

    /// Beam width used while inserting
    #[arg(long)]
    ef_construction: Option<usize>,

    /// Beam width used while querying
    #[arg(long)]
    ef_search: Option<usize>,

    /// Level normalization factor (defaults to 1/ln M)
    #[arg(long)]
    level_multiplier: Option<f64>,

    /// Seed for the level generator
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    metric: Option<MetricArg>,

    #[arg(long, value_enum)]
    selection: Option<SelectionArg>,

    /// Prune neighbor lists that grow past M through back-edges
    #[arg(long, default_value_t = false)]
    prune: bool,

    /// Comma-separated query vector
    #[arg(long, default_value = "15,16,17,18")]
    query: String,

    /// Number of neighbors to return
    #[arg(short = 'k', default_value_t = 3)]
    k: usize,

    /// Print every node with its per-layer neighbor lists
    #[arg(long, default_value_t = false)]
    print_index: bool,

    /// Print graph statistics as JSON
    #[arg(long, default_value_t = false)]
    stats: bool,

    /// Compare the result against a brute-force scan; exit 1 on mismatch
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn demo_points() -> Vec<Point> {
    [
        ("A", [1.0, 2.0, 3.0, 4.0]),
        ("B", [5.0, 6.0, 7.0, 8.0]),
        ("C", [9.0, 10.0, 11.0, 12.0]),
        ("D", [13.0, 14.0, 15.0, 21.0]),
        ("E", [17.0, 18.0, 19.0, 20.0]),
        ("F", [21.0, 22.0, 23.0, 32.0]),
        ("G", [25.0, 26.0, 27.0, 28.0]),
        ("H", [29.0, 30.0, 31.0, 32.0]),
        ("I", [33.0, 34.0, 35.0, 36.0]),
        ("J", [37.0, 38.0, 39.0, 40.0]),
    ]
    .into_iter()
    .map(|(label, v)| Point::new(label, v.to_vec()))
    .collect()
}

fn parse_points(json: &str) -> Result<Vec<Point>, serde_json::Error> {
    serde_json::from_str(json)
}

fn parse_query(s: &str) -> Result<Vec<f32>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f32>()
                .map_err(|e| format!("invalid query component '{t}': {e}"))
        })
        .collect()
}

/// Applies command-line overrides on top of a base configuration.
/// Changing M without an explicit multiplier re-derives it as 1/ln M.
fn apply_overrides(mut config: HnswConfig, args: &Args) -> HnswConfig {
    if let Some(m) = args.max_neighbors {
        config.max_neighbors = m;
        if args.level_multiplier.is_none() {
            config.level_multiplier = level_multiplier_for(m);
        }
    }
    if let Some(ef) = args.ef_construction {
        config.ef_construction = ef;
    }
    if let Some(ef) = args.ef_search {
        config.ef_search = ef;
    }
    if let Some(ml) = args.level_multiplier {
        config.level_multiplier = ml;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(metric) = args.metric {
        config.distance_metric = metric.into();
    }
    if let Some(selection) = args.selection {
        config.neighbor_selection = selection.into();
    }
    if args.prune {
        config.prune_overflow = true;
    }
    config
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_json);

    let base = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => HnswConfig::default(),
    };
    let config = apply_overrides(base, &args);

    let points = match &args.points {
        Some(path) => parse_points(&std::fs::read_to_string(path)?)?,
        None => demo_points(),
    };
    let query = parse_query(&args.query)?;

    let mut index = HnswIndex::new(config).map_err(|e| {
        tracing::error!(error = %e, "Rejected configuration");
        e
    })?;

    let start = Instant::now();
    let total = points.len();
    for point in points {
        let label = point.label.clone();
        if let Err(e) = index.insert(point) {
            tracing::error!(label = %label, error = %e, "Insert failed");
            return Err(e.into());
        }
    }
    tracing::info!(
        points = total,
        max_layer = index.max_layer(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Index built"
    );

    if args.print_index {
        print!("{index}");
    }
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&index.stats())?);
    }

    let hits = index.search(&query, args.k).map_err(|e| {
        tracing::error!(error = %e, "Query failed");
        e
    })?;
    println!("Query results (k = {}):", args.k);
    for hit in &hits {
        println!("  {}  distance = {:.6}", hit.label(), hit.distance);
    }

    if args.verify {
        let exact = index.exact_search(&query, args.k)?;
        let expected: Vec<&str> = exact.iter().map(|h| h.label()).collect();
        let actual: Vec<&str> = hits.iter().map(|h| h.label()).collect();
        println!("Expected: {}", expected.join(" "));
        println!("Actual:   {}", actual.join(" "));
        if expected != actual {
            tracing::error!("Approximate result differs from brute force");
            std::process::exit(1);
        }
        println!("Verification passed");
    }

    Ok(())
}
