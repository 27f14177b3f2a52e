//! Survey Plotter - charts from survey CSV exports
//!
//! Loads every CSV export in a data folder, normalizes answer labels and
//! renders the configured charts into a plot folder.
//!
//! Exit codes:
//!   0 - Success (every chart rendered)
//!   1 - Runtime error (missing data, bad config, unwritable folders, etc.)
//!   2 - At least one chart failed to render

mod cli;
mod config;
mod error;
mod freshness;
mod loader;
mod models;
mod recipes;
mod render;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use freshness::FreshnessCache;
use loader::{LabelNormalizer, TableLoader};
use render::{OutputSettings, Renderer, Theme};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args, config_verbose(&args));

    info!("Survey Plotter v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Plotting failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .survey-plotter.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize folders, styling, labels and charts.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Reads `general.verbose` before logging is up. Load errors are reported
/// later by `load_config`.
fn config_verbose(args: &Args) -> bool {
    let config = match args.config {
        Some(ref path) => Config::load(path).ok(),
        None => Config::load_default().ok().flatten(),
    };
    config.is_some_and(|c| c.general.verbose)
}

/// Run the complete plotting workflow. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    if config.charts.is_empty() {
        warn!("No charts selected; check --only titles against the config");
    }

    let data_folder = Path::new(&config.general.data_folder).to_path_buf();
    let loader = TableLoader::new().with_delimiter(config.general.delimiter as u8);

    // Handle --dry-run: list inputs and charts and exit
    if args.dry_run {
        return handle_dry_run(&loader, &data_folder, &config);
    }

    // Step 1: Prepare output folders
    let output = OutputSettings::from(&config);
    if output.save {
        prepare_plot_folders(&output)?;
    }

    // Step 2: Load and normalize the working table
    println!("📥 Loading CSV files from {}", data_folder.display());
    let mut table = loader
        .load(&data_folder)
        .with_context(|| format!("Failed to load data from {}", data_folder.display()))?;
    let replaced = LabelNormalizer::new(config.labels.clone()).normalize(&mut table);
    info!(
        "Loaded {} rows, {} columns ({} labels normalized)",
        table.len(),
        table.columns().len(),
        replaced
    );

    // Step 3: Render every chart
    println!("\n📊 Rendering {} charts...", config.charts.len());
    let cache = FreshnessCache::new(
        Duration::from_secs(config.cache.ttl_seconds),
        config.cache.capacity,
    );
    let mut renderer = Renderer::new(Theme::from(&config.style), output, &data_folder, cache);
    let summary = recipes::run_recipes(&mut renderer, &table, &config.charts, !args.quiet);

    // Print summary
    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Summary:");
    println!("   Charts rendered: {}", summary.rendered.len());
    println!("   Files written: {}", summary.artifact_count());
    for (title, message) in &summary.failed {
        println!("   ⛔ {}: {}", title, message);
    }
    println!("   Duration: {:.1}s", duration);

    if summary.has_failures() {
        eprintln!(
            "\n⛔ {} of {} charts failed (exit code 2).",
            summary.failed.len(),
            config.charts.len()
        );
        return Ok(2);
    }

    println!("\n✅ Done! Charts saved under {}", config.general.plot_folder);
    Ok(0)
}

/// Handle --dry-run: list input files and the charts that would be rendered.
fn handle_dry_run(loader: &TableLoader, data_folder: &Path, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: nothing is rendered\n");

    let files = loader
        .list_files(data_folder)
        .with_context(|| format!("Failed to list {}", data_folder.display()))?;

    if files.is_empty() {
        println!("   No CSV files found in {}", data_folder.display());
    } else {
        println!("   Found {} CSV files:\n", files.len());
        for file in &files {
            println!("     📄 {}", file.display());
        }
    }

    println!("\n   Charts:");
    for chart in &config.charts {
        println!(
            "     📈 {} ({}) -> {}",
            chart.title(),
            chart.kind(),
            render::filename::sanitize(chart.title())
        );
    }

    println!("\n✅ Dry run complete. No files were written.");
    Ok(0)
}

/// Create `{plot}/{format}` for every configured format.
fn prepare_plot_folders(output: &OutputSettings) -> Result<()> {
    for format in &output.formats {
        let folder = output.plot_folder.join(format.extension());
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create {}", folder.display()))?;
        debug!("Plot folder ready: {}", folder.display());
    }
    Ok(())
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
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
