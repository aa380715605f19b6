//! celldist - nearest-neighbor cell distance CLI
//!
//! Command-line interface for aggregating and reporting spatial distances
//! between labelled cell populations.

use celldist::data::{Study, Vocabulary};
use celldist::error::{CellDistError, Result};
use celldist::neighbor::BruteForce;
use celldist::pipeline::AnalysisConfig;
use celldist::report::{
    comparison_report, render_study_rays, ComparisonOptions, ExplicitResolver, LabelResolver,
    SubstringResolver,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

/// Table format for comparison output
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableFormat {
    /// Tab-separated, one row per target label
    Tsv,
    /// Pretty-printed JSON
    Json,
}

/// Nearest-neighbor distances between cell populations
#[derive(Parser)]
#[command(name = "celldist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate neighbor statistics for every sample and label pair
    Aggregate {
        /// Path to cells TSV (sample_id, field_id, label, x, y)
        #[arg(short = 'c', long)]
        cells: PathBuf,

        /// Analysis configuration YAML (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Label order (comma-separated); defaults to order of appearance
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,

        /// Output path for the neighbor statistics TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compare distances from one label to a family of target labels
    Compare {
        /// Path to cells TSV
        #[arg(short = 'c', long)]
        cells: PathBuf,

        /// Analysis configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Label order (comma-separated)
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,

        /// Source label
        #[arg(short, long)]
        from: String,

        /// Select targets containing this substring (e.g. "PD1")
        #[arg(long, conflicts_with = "to_labels", required_unless_present = "to_labels")]
        to_pattern: Option<String>,

        /// Select targets by exact name (comma-separated)
        #[arg(long, value_delimiter = ',')]
        to_labels: Option<Vec<String>>,

        /// Measure from the targets to the source label instead
        #[arg(long)]
        transposed: bool,

        /// Drop samples with a missing value instead of filling zeros
        #[arg(long)]
        remove_missing: bool,

        /// Run a paired t-test between the two targets
        #[arg(long)]
        paired_test: bool,

        /// Output path for the comparison table
        #[arg(short, long)]
        output: PathBuf,

        /// Table format
        #[arg(long, value_enum, default_value = "tsv")]
        format: TableFormat,

        /// Also draw the bar chart to this path
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Draw a ray plot for every field containing both labels
    Rays {
        /// Path to cells TSV
        #[arg(short = 'c', long)]
        cells: PathBuf,

        /// Analysis configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Source label
        #[arg(short, long)]
        from: String,

        /// Target label
        #[arg(short, long)]
        to: String,

        /// Directory for figures (overrides the configuration)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Write a default analysis configuration
    Example {
        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Aggregate {
            cells,
            config,
            labels,
            output,
        } => cmd_aggregate(&cells, config.as_deref(), labels, &output),

        Commands::Compare {
            cells,
            config,
            labels,
            from,
            to_pattern,
            to_labels,
            transposed,
            remove_missing,
            paired_test,
            output,
            format,
            plot,
        } => {
            let resolver: Box<dyn LabelResolver> = match (to_pattern, to_labels) {
                (Some(pattern), _) => Box::new(SubstringResolver::new(pattern)),
                (None, Some(list)) => Box::new(ExplicitResolver::new(list)),
                (None, None) => Box::new(ExplicitResolver::new(Vec::new())),
            };
            let options = ComparisonOptions {
                transposed,
                remove_missing_samples: remove_missing,
                unit_scale: None,
                run_paired_test: paired_test,
            };
            cmd_compare(
                &cells,
                config.as_deref(),
                labels,
                &from,
                resolver.as_ref(),
                options,
                &output,
                format,
                plot.as_deref(),
            )
        }

        Commands::Rays {
            cells,
            config,
            from,
            to,
            output_dir,
        } => cmd_rays(&cells, config.as_deref(), &from, &to, output_dir),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            AnalysisConfig::from_yaml(&std::fs::read_to_string(path)?)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_study(cells: &Path, labels: Option<Vec<String>>, config: &AnalysisConfig) -> Result<Study> {
    let vocabulary = labels.map(Vocabulary::new).transpose()?;
    let study = Study::from_tsv(cells, vocabulary, config.microns_per_pixel)?;
    info!(
        "Loaded {} samples, {} labels from {:?}",
        study.samples().len(),
        study.vocabulary().len(),
        cells
    );
    Ok(study)
}

/// Aggregate a study and write the neighbor statistics table
fn cmd_aggregate(
    cells: &Path,
    config_path: Option<&Path>,
    labels: Option<Vec<String>>,
    output: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut study = load_study(cells, labels, &config)?;
    let store = study.compute_neighbors(&config, &BruteForce)?;
    store.to_tsv(output)?;
    info!("Wrote neighbor statistics to {:?}", output);
    Ok(())
}

/// Build a comparison report for one source label
#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    cells: &Path,
    config_path: Option<&Path>,
    labels: Option<Vec<String>>,
    from: &str,
    resolver: &dyn LabelResolver,
    mut options: ComparisonOptions,
    output: &Path,
    format: TableFormat,
    plot: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut study = load_study(cells, labels, &config)?;
    options.unit_scale = study.unit_scale(config.use_pixel);
    let store = study.compute_neighbors(&config, &BruteForce)?;

    let report = comparison_report(store, from, resolver, &options)?;

    match format {
        TableFormat::Tsv => report.to_tsv(output)?,
        TableFormat::Json => std::fs::write(output, report.to_json()?)?,
    }
    info!(
        "Wrote comparison of {} -> [{}] over {} samples to {:?}",
        report.from_label,
        report.targets.join(", "),
        report.n_samples(),
        output
    );
    if let Some(p) = report.p_value {
        info!("Paired t-test p = {:.4e}", p);
    }

    if let Some(plot_path) = plot {
        report.render(plot_path, config.format)?;
        info!("Wrote chart to {:?}", plot_path);
    }
    Ok(())
}

/// Render ray plots for every qualifying field
fn cmd_rays(
    cells: &Path,
    config_path: Option<&Path>,
    from: &str,
    to: &str,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    let study = load_study(cells, None, &config)?;
    let summary = render_study_rays(&BruteForce, &study, from, to, &config)?;
    if !summary.failed.is_empty() {
        return Err(CellDistError::Plot(format!(
            "{} of {} ray plots failed",
            summary.failed.len(),
            summary.failed.len() + summary.written.len()
        )));
    }
    Ok(())
}

/// Write a default configuration file
fn cmd_example(output_path: &Path) -> Result<()> {
    let yaml = AnalysisConfig::default().to_yaml()?;
    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote default configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);
    Ok(())
}
