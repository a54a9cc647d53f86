use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use winarray_sim::{run_simulator, SimulatorConfig};

fn cli() -> Command {
    Command::new("winarray-sim")
        .version(winarray_sim::VERSION)
        .about("Scroll simulator for lazily fetched remote arrays")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log fetches and merges (debug level)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with simulator settings"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a seeded scroll simulation")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .value_parser(value_parser!(u64))
                        .help("Number of simulated user actions"),
                )
                .arg(
                    Arg::new("collection-size")
                        .long("collection-size")
                        .value_parser(value_parser!(u64))
                        .help("Items in the virtual remote collection"),
                )
                .arg(
                    Arg::new("window")
                        .long("window")
                        .value_parser(value_parser!(usize))
                        .help("Visible rows"),
                )
                .arg(
                    Arg::new("margin")
                        .long("margin")
                        .value_parser(value_parser!(usize))
                        .help("Prefetch margin on each side of the window"),
                )
                .arg(
                    Arg::new("latency-ms")
                        .long("latency-ms")
                        .value_parser(value_parser!(u64))
                        .help("Delay of every fetch response"),
                )
                .arg(
                    Arg::new("failure-rate")
                        .long("failure-rate")
                        .value_parser(value_parser!(f64))
                        .help("Probability of an injected fetch failure per step"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<SimulatorConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            SimulatorConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(SimulatorConfig::default()),
    }
}

/// Flags override values from the config file
fn apply_overrides(mut config: SimulatorConfig, args: &ArgMatches) -> SimulatorConfig {
    if let Some(seed) = args.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if let Some(steps) = args.get_one::<u64>("steps") {
        config.steps = *steps;
    }
    if let Some(size) = args.get_one::<u64>("collection-size") {
        config.collection_size = *size;
    }
    if let Some(window) = args.get_one::<usize>("window") {
        config.window_len = *window;
    }
    if let Some(margin) = args.get_one::<usize>("margin") {
        config.index_margin = *margin;
    }
    if let Some(latency) = args.get_one::<u64>("latency-ms") {
        config.latency_ms = *latency;
    }
    if let Some(rate) = args.get_one::<f64>("failure-rate") {
        config.failure_rate = *rate;
    }
    if args.get_flag("stop-on-violation") {
        config.stop_on_first_violation = true;
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let config = apply_overrides(config, args);
            let report = run_simulator(config).await?;

            if args.get_flag("json") {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("config", _)) => {
            print!("{}", config.to_toml()?);
        }
        _ => {
            cli().print_help()?;
        }
    }

    Ok(())
}
