use std::path::PathBuf;

use clap::{Parser, Subcommand};
use echem_core::{AnomalyMethod, Domain};

/// Transform electrochemistry series and derive insights from them.
///
/// Series files are JSON: `{"x": [...], "y": [...], "domain": "CV"}` with
/// `domain` optional.
#[derive(Parser, Debug)]
#[command(name = "echem", version, about = "Electrochemistry series pipelines and insights")]
pub struct CliArgs {
    /// Config profile; keys resolve as {PROFILE}_{KEY} before {KEY}
    #[arg(long, global = true, env = "ECHEM_PROFILE")]
    pub profile: Option<String>,

    /// Rules directory (overrides ECHEM_RULES_DIR)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Single-line JSON output (overrides ECHEM_PRETTY)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a pipeline over a series and print the result
    Transform {
        /// Series JSON file
        #[arg(long)]
        input: PathBuf,

        /// Pipeline record JSON file
        #[arg(long, conflicts_with = "template", required_unless_present = "template")]
        pipeline: Option<PathBuf>,

        /// PipelineTemplate id from the rules directory
        #[arg(long)]
        template: Option<String>,

        /// Write the output here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Analyze a series, optionally after running a pipeline
    Insights {
        /// Series JSON file
        #[arg(long)]
        input: PathBuf,

        /// Technique: CV, EIS, CA, CP, LSV (defaults to the series' own tag)
        #[arg(long)]
        domain: Option<Domain>,

        /// Pipeline record JSON file applied before analysis
        #[arg(long, conflicts_with = "template")]
        pipeline: Option<PathBuf>,

        /// PipelineTemplate id applied before analysis
        #[arg(long)]
        template: Option<String>,

        /// Anomaly detector: zscore, iqr, moving-average
        #[arg(long)]
        method: Option<AnomalyMethod>,

        /// Print the full report (anomaly scores, trend fit, noise) instead of
        /// the ranked insight list
        #[arg(long)]
        report: bool,
    },

    /// Load and validate every rule document in the rules directory
    Validate,
}
