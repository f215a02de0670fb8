use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use charging_sites::cluster::{self, ClusterOptions, PointIndex};
use charging_sites::config::{Config, SingleAnalysis};
use charging_sites::ingest::{self, Source, extract};
use charging_sites::logging::{self, LogLevel, Stage};
use charging_sites::model::SiteError;
use charging_sites::{output, report};

/// Finds charge points of the same physical site in OpenStreetMap and
/// proposes one charging station node per site.
#[derive(Parser, Debug)]
#[command(name = "charging-sites")]
#[command(about = "Group OSM charge points into charging sites")]
struct Cli {
    /// Use the cached download instead of querying Overpass.
    #[arg(long)]
    noload: bool,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output OSM file.
    #[arg(long)]
    output: Option<String>,

    /// Maximum number of stations per partition.
    #[arg(long)]
    max_sample: Option<usize>,

    /// Maximum distance in meters between charge points of one site.
    #[arg(long)]
    max_gap: Option<f64>,

    /// Minimum share of identical values for name, brand and operator.
    #[arg(long)]
    min_common: Option<f64>,

    /// Metric for the statistics over single stations.
    #[arg(long, value_enum)]
    single_analysis: Option<SingleAnalysis>,

    /// Also write log entries to this file.
    #[arg(long)]
    log_file: Option<String>,

    /// Show debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    logging::init_logger(level, cli.log_file.as_deref(), cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SiteError::NoStations) => {
            eprintln!("\tNo stations");
            ExitCode::from(1)
        }
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, SiteError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(output) = &cli.output {
        config.output_file = output.clone();
    }
    if let Some(max_sample) = cli.max_sample {
        config.max_sample = max_sample;
    }
    if let Some(max_gap) = cli.max_gap {
        config.max_gap = max_gap;
    }
    if let Some(min_common) = cli.min_common {
        config.min_common = min_common;
    }
    if let Some(mode) = cli.single_analysis {
        config.single_analysis = mode;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), SiteError> {
    let config = load_config(cli)?;
    if cli.log_file.is_none() && config.log_file.is_some() {
        let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
        logging::init_logger(level, config.log_file.as_deref(), cli.verbose);
    }

    println!("\nAnalyzing OSM charging stations\n");

    let source = if cli.noload { Source::Cache } else { Source::Overpass };
    let elements = ingest::load_elements(&config, source)?;

    let extraction = extract::extract_stations(&elements)?;
    let stations = &extraction.stations;
    println!(
        "\t{} charging stations, {} charge points found",
        stations.len(),
        extraction.charge_point_count
    );

    // Grouping

    println!("\nIdentifying groups ...");
    let options = ClusterOptions::from(&config);
    let analysis = cluster::analyze(stations, &options, &mut |remaining| {
        print!("\r\t{}      ", remaining);
        std::io::stdout().flush().ok();
    });

    let grouping = &analysis.grouping;
    println!("\r\tFound {} sites", grouping.groups.len());
    println!(
        "\tTotal {} charge points in {} groups",
        grouping.grouped_point_count(),
        grouping.groups.len() - grouping.singleton_count()
    );
    if !grouping.excluded.is_empty() {
        println!("\t{} stations kept out of grouping", grouping.excluded.len());
    }

    // Output

    output::save_osm(Path::new(&config.output_file), &elements, &analysis)?;
    logging::info(
        Stage::Output,
        None,
        &format!(
            "Saved {} elements and {} new sites to {}",
            elements.len(),
            analysis.sites.len(),
            config.output_file
        ),
    );

    // Statistics

    let histogram = report::size_histogram(&grouping.groups, stations.len());
    report::print_size_histogram(&histogram);

    let index: PointIndex = stations.iter().map(|p| (p.id, p)).collect();
    let single = report::single_point_stats(&grouping.groups, &index, config.single_analysis);
    report::print_single_point_stats(single.as_ref());

    report::print_run_summary(
        stations.len(),
        extraction.charge_point_count,
        grouping.excluded.len(),
        analysis.sites.len(),
    );

    println!("\nDone\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "charging-sites",
            "--noload",
            "--max-gap",
            "35",
            "--single-analysis",
            "output",
            "--output",
            "sites.osm",
        ]);
        assert!(cli.noload);

        let config = load_config(&cli).expect("valid overrides");
        assert_eq!(config.max_gap, 35.0);
        assert_eq!(config.single_analysis, SingleAnalysis::Output);
        assert_eq!(config.output_file, "sites.osm");
        assert_eq!(config.max_sample, 5000);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["charging-sites", "--min-common", "1.5"]);
        assert!(matches!(load_config(&cli), Err(SiteError::ConfigError(_))));
    }
}
