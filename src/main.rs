//! telemetry-analyzer - feature usage from telemetry CSV exports
//!
//! A CLI tool that aggregates per-feature attribute usage counts from a
//! telemetry CSV, prints bar charts, and writes `output.json` and
//! `attributes.json`.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (empty or malformed input, config, I/O, etc.)
//!   2 - Input parsed but no row matched the feature marker

mod analysis;
mod cli;
mod config;
mod ingest;
mod models;
mod registry;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use ingest::IngestError;
use models::{Report, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("telemetry-analyzer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if args.list_registry {
        return handle_list_registry(&args);
    }

    match run_analysis(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            if let Some(IngestError::Empty) = e.downcast_ref::<IngestError>() {
                warn!("Input is empty, nothing to analyze");
                eprintln!("\n⚠️  Input file is empty. Please provide a file with data.");
            } else {
                error!("Error occurred: {:#}", e);
                eprintln!("\n❌ Analysis failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .telemetry-analyzer.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the marker, export names, and registry entries.");
    Ok(())
}

/// Handle --list-registry: print every identifier and its display name.
fn handle_list_registry(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let registry = config.name_registry();

    let width = registry.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    for (id, name) in registry.iter() {
        println!("{:<width$}  {}", id, name, width = width);
    }
    println!("\n{} entries", registry.len());
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid settings")?;

    let registry = config.name_registry();
    debug!("Name registry holds {} entries", registry.len());

    let input = args.input.as_deref().context("No input file given")?;
    let input_label = input.display().to_string();

    // Step 1: Read the telemetry rows
    if !args.quiet {
        println!("📥 Reading telemetry: {}", input_label);
    }
    let rows = ingest::read_rows(input)?;
    info!("Loaded {} rows from {}", rows.len(), input_label);

    // Step 2: Aggregate
    let result = analysis::aggregate(
        &rows,
        &registry,
        &config.aggregation.marker,
        config.aggregation.separator,
    )
    .with_context(|| format!("Failed to aggregate {}", input_label))?;

    if result.is_empty() {
        warn!(
            "No rows matched marker '{}' ({} rows read)",
            config.aggregation.marker, result.stats.rows_read
        );
    }

    let report = Report {
        metadata: ReportMetadata {
            input: input_label,
            analysis_date: Utc::now(),
            marker: config.aggregation.marker.clone(),
            stats: result.stats,
            feature_count: result.feature_map.len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        features: result.feature_map,
        attributes: result.attribute_map,
    };

    // Step 3: Write the exports
    if args.no_export {
        info!("Skipping JSON exports (--no-export)");
    } else {
        let paths = report::write_exports(
            &config.general.output_dir,
            &config.export.feature_file,
            &config.export.attribute_file,
            &report.features,
            &report.attributes,
        )?;
        if !args.quiet {
            println!("💾 Feature map: {}", paths.features.display());
            println!("💾 Attribute map: {}", paths.attributes.display());
        }
    }

    // Step 4: Optional report file
    if let Some(ref path) = args.report {
        let output = match args.format {
            OutputFormat::Markdown => report::generate_markdown_report(
                &report,
                config.export.chart_width,
                config.export.top,
            ),
            OutputFormat::Json => report::generate_json_report(&report)?,
        };
        std::fs::write(path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if !args.quiet {
            println!("📝 Report saved to: {}", path.display());
        }
    }

    if !args.quiet {
        print_summary(&report, &config);
    }

    if report.features.is_empty() {
        eprintln!(
            "\n⛔ No feature names contained '{}'. Exported maps are empty (exit code 2).",
            config.aggregation.marker
        );
        return Ok(2);
    }

    Ok(0)
}

/// Print the terminal summary with the feature chart.
fn print_summary(report: &Report, config: &Config) {
    let stats = &report.metadata.stats;

    println!("\n📊 Usage Count of Feature Config Names:");
    let mut ranked = report.ranked_features();
    if let Some(n) = config.export.top {
        ranked.truncate(n);
    }
    if ranked.is_empty() {
        println!("   (none)");
    } else {
        for line in report::render_bar_chart(&ranked, config.export.chart_width).lines() {
            println!("   {}", line);
        }
    }

    println!(
        "\n   Rows: {} read | {} matched | {} skipped",
        stats.rows_read, stats.rows_matched, stats.rows_skipped
    );
    println!(
        "   Features: {} | Attribute pairs: {}",
        report.features.len(),
        report.attribute_pairs()
    );
    println!("   Duration: {:.3}s", report.metadata.duration_seconds);
    println!("\n✅ Analysis complete!");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
