use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use popstat_service::config::{self, PopstatConfig};
use popstat_service::export;
use popstat_service::ingest::ssb::SsbClient;
use popstat_service::logging::{self, DataSource};
use popstat_service::model::{Period, PopError, Table, METRIC_POPULATION};
use popstat_service::municipalities;
use popstat_service::periods;
use popstat_service::pipeline;
use popstat_service::render;

#[derive(Parser)]
#[command(name = "popstat", about = "Population figures for the municipalities of Rogaland")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "POPSTAT_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// All municipalities: change between two quarters
    Snapshot {
        /// Earlier quarter (default: the one before --latest)
        #[arg(long)]
        previous: Option<Period>,
        /// Later quarter (default: newest published)
        #[arg(long)]
        latest: Option<Period>,
        #[arg(long, default_value = METRIC_POPULATION)]
        metric: String,
        /// Directory to write a CSV export into
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also draw a bar chart
        #[arg(long)]
        chart: bool,
    },
    /// One municipality over a range of quarters
    Trend {
        /// Region code, municipality number or name
        #[arg(long)]
        municipality: String,
        #[arg(long)]
        from: Option<Period>,
        #[arg(long)]
        to: Option<Period>,
        /// Number of quarters when --from is not given
        #[arg(long, default_value_t = 8)]
        quarters: usize,
        #[arg(long, default_value = METRIC_POPULATION)]
        metric: String,
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also draw a line chart
        #[arg(long)]
        chart: bool,
    },
    /// Reported growth and population for a single quarter
    Report {
        #[arg(long)]
        period: Option<Period>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List selectable quarters, oldest first
    Quarters {
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// List the municipalities in the registry
    Municipalities,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(
        config.log_level(),
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &PopstatConfig) -> Result<(), PopError> {
    match command {
        Command::Snapshot { previous, latest, metric, csv, chart } => {
            let latest = latest.unwrap_or_else(periods::latest_published_quarter);
            let previous = previous.unwrap_or_else(|| latest.previous());
            let client = SsbClient::new(&config.api.url, config.timeout())?;
            let codes = municipalities::all_codes();

            let snapshot = pipeline::run_snapshot(&client, config, &codes, &metric, previous, latest)
                .inspect_err(|e| logging::log_ssb_failure("snapshot", e))?;

            let table = render::snapshot_table(&snapshot);
            println!("{}", render::table(&table));
            if chart {
                let bars: Vec<(String, f64)> = snapshot
                    .rows
                    .iter()
                    .filter_map(|r| Some((r.label.clone(), r.value_latest?)))
                    .collect();
                println!("{}", render::bar_chart(&table.title, &bars, 50));
            }
            if let Some(dir) = csv {
                let name = export::csv_file_name(
                    &config.region.name,
                    &previous.to_string(),
                    &latest.to_string(),
                );
                save(&table, &dir, &name)?;
            }
        }

        Command::Trend { municipality, from, to, quarters, metric, csv, chart } => {
            let m = municipalities::resolve(&municipality).ok_or_else(|| {
                PopError::InvalidQuery(format!("unknown municipality: {}", municipality))
            })?;
            let to = to.unwrap_or_else(periods::latest_published_quarter);
            let range = match from {
                Some(from) => periods::period_range(from, to)?,
                None => {
                    let from = (1..quarters.max(1)).fold(to, |p, _| p.previous());
                    periods::period_range(from, to)?
                }
            };
            let client = SsbClient::new(&config.api.url, config.timeout())?;

            let series = pipeline::run_trend(&client, config, m.code, &metric, &range)
                .inspect_err(|e| logging::log_ssb_failure("trend", e))?;

            let table = render::trend_table(&series);
            println!("{}", render::table(&table));
            if let Some((change, percent)) = series.total_change() {
                println!(
                    "Total change: {} ({}%)\n",
                    render::format_change(Some(change)),
                    render::format_percent(percent)
                );
            }
            if chart {
                println!("{}", render::line_chart(&table.title, &series.series(), 12));
            }
            if let (Some(dir), Some(first), Some(last)) = (csv, range.first(), range.last()) {
                let name = export::csv_file_name(m.name, &first.to_string(), &last.to_string());
                save(&table, &dir, &name)?;
            }
        }

        Command::Report { period, csv } => {
            let period = period.unwrap_or_else(periods::latest_published_quarter);
            let client = SsbClient::new(&config.api.url, config.timeout())?;
            let codes = municipalities::all_codes();

            let report = pipeline::run_quarter_report(&client, config, &codes, period)
                .inspect_err(|e| logging::log_ssb_failure("report", e))?;

            let table = render::quarter_report_table(&report);
            println!("{}", render::table(&table));
            if let Some(dir) = csv {
                let p = period.to_string();
                let name = export::csv_file_name(&config.region.name, &p, &p);
                save(&table, &dir, &name)?;
            }
        }

        Command::Quarters { count } => {
            for q in periods::recent_quarters(count) {
                println!("{}", q);
            }
        }

        Command::Municipalities => {
            for m in municipalities::MUNICIPALITY_REGISTRY {
                println!("{}  {}", m.code, m.name);
            }
        }
    }
    Ok(())
}

fn save(table: &Table, dir: &Path, name: &str) -> Result<(), PopError> {
    let path = export::write_csv_file(table, dir, name)
        .inspect_err(|e| logging::error(DataSource::Export, None, &e.to_string()))?;
    println!("CSV written to {}", path.display());
    Ok(())
}
