use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use cachelib::cache::AccessOutcome;
use cachelib::config::CacheConfig;
use cachelib::io::get_reader;
use cachelib::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays a load/store trace against a set-associative write-back cache"))]
struct Args {
    /// Number of set index bits (the cache has 2^s sets)
    #[arg(short = 's', required_unless_present = "config")]
    set_bits: Option<u32>,

    /// Number of lines per set (associativity)
    #[arg(short = 'E', required_unless_present = "config")]
    lines_per_set: Option<usize>,

    /// Number of block offset bits (each line holds 2^b bytes)
    #[arg(short = 'b', required_unless_present = "config")]
    block_bits: Option<u32>,

    /// Trace file to replay
    #[arg(short, long)]
    trace: String,

    /// JSON file with the cache geometry, instead of -s, -E and -b
    #[arg(short, long, conflicts_with_all = ["set_bits", "lines_per_set", "block_bits"])]
    config: Option<String>,

    /// Print every trace record with what it did to the cache
    #[arg(short, long)]
    verbose: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Also write the summary counters to this file
    #[arg(short, long)]
    results: Option<String>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

impl Args {
    fn cache_config(&self) -> Result<CacheConfig, String> {
        match (&self.config, self.set_bits, self.lines_per_set, self.block_bits) {
            (Some(path), _, _, _) => {
                let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
                serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))
            }
            (None, Some(s), Some(e), Some(b)) => Ok(CacheConfig::new(s, e, b)),
            _ => Err("Either a config file or all of -s, -E and -b are required".to_string()),
        }
    }
}

fn describe(outcome: AccessOutcome) -> &'static str {
    match outcome {
        AccessOutcome::Hit => "hit",
        AccessOutcome::Miss => "miss",
        AccessOutcome::MissEviction { dirty: false } => "miss eviction",
        AccessOutcome::MissEviction { dirty: true } => "miss dirty-eviction",
    }
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = args.cache_config()?;
    let mut simulator = Simulator::new(&config).map_err(|e| e.to_string())?;
    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace_reader = get_reader(trace_file)?;
    let result = if args.verbose {
        simulator.simulate_with(trace_reader, |record, outcome| {
            println!("{} {:x},{} {}", record.operation.as_char(), record.address, record.size, describe(outcome));
        })
    } else {
        simulator.simulate(trace_reader)
    };
    let summary = result.map_err(|e| format!("{}: {e}", args.trace))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    } else {
        println!("{summary}");
    }
    if let Some(path) = &args.results {
        summary.write_results(path).map_err(|e| format!("Couldn't write the results file at path {path}: {e}"))?;
    }
    if args.performance {
        let simulation_time = simulator.get_execution_time();
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        eprintln!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        let cache = simulator.cache();
        eprintln!("Parsed input configuration: {config:?}");
        eprintln!("Sets: {}, lines per set: {}, block size: {} bytes", cache.num_sets(), cache.lines_per_set(), config.block_size());
        eprintln!("Valid lines: {}, dirty lines: {}", cache.valid_line_count(), cache.dirty_line_count());
    }
    Ok(())
}
