mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use echem_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};
use crate::commands::Context;

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();
    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    config.log_summary();

    let ctx = Context::new(&config, args.rules, args.compact)?;

    match args.command {
        Command::Transform {
            input,
            pipeline,
            template,
            output,
        } => commands::transform(
            &ctx,
            &input,
            pipeline.as_deref(),
            template.as_deref(),
            output.as_deref(),
        ),
        Command::Insights {
            input,
            domain,
            pipeline,
            template,
            method,
            report,
        } => commands::insights(
            &ctx,
            &input,
            domain,
            pipeline.as_deref(),
            template.as_deref(),
            method,
            report,
        ),
        Command::Validate => commands::validate(&ctx),
    }
}
