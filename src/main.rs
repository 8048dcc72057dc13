use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use energy_share_forecast::{pipeline, EnergySource, ScenarioConfig};

/// Renewable share of German electricity consumption, historical and projected
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Quarter-hourly realised generation CSV
    production_file: PathBuf,
    /// Quarter-hourly realised consumption CSV
    consumption_file: PathBuf,
    /// Scenario JSON; built-in reference scenario when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Write the JSON report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Historical year to project from (overrides the scenario)
    #[arg(long)]
    reference_year: Option<i32>,
    /// Year to project into (overrides the scenario)
    #[arg(long)]
    target_year: Option<i32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    if let Some(year) = args.reference_year {
        scenario.reference_year = year;
    }
    if let Some(year) = args.target_year {
        scenario.target_year = year;
    }

    let output = pipeline::run(&args.production_file, &args.consumption_file, &scenario)
        .context("running renewable share pipeline")?;

    for aggregate in output.yearly.values() {
        info!(
            year = aggregate.year,
            production_mwh = aggregate.production,
            consumption_mwh = aggregate.consumption,
            share_percent = aggregate.renewable_share_percent(),
            "historical year"
        );
        for source in EnergySource::ALL {
            debug!(
                year = aggregate.year,
                source = source.label(),
                production_mwh = aggregate.source(source),
                "historical production by source"
            );
        }
    }

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &output.report())?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
