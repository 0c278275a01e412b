// Copyright 2026 Applyflow Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use applyflow::cli;

#[derive(Parser)]
#[command(
    name = "applyflow",
    about = "Applyflow — drive multi-step job application flows with pacing controls",
    version,
    after_help = "Run 'applyflow <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply to one job posting
    Apply {
        /// URL of the application page
        url: String,
        /// JSON file mapping answer keys to values
        #[arg(long)]
        answers: PathBuf,
        /// Job title, for the attempt record
        #[arg(long)]
        title: Option<String>,
        /// Company name, for the attempt record
        #[arg(long)]
        company: Option<String>,
    },
    /// Classify a page and preview field bindings without acting
    Classify {
        /// Local HTML file or live URL
        target: String,
        /// Host the attempt would have started on (quick-apply detection)
        #[arg(long)]
        origin: Option<String>,
        /// Optional answers file for a binding dry run
        #[arg(long)]
        answers: Option<PathBuf>,
    },
    /// Check environment and diagnose issues
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("applyflow=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("applyflow=info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let result = match cli.command {
        Commands::Apply {
            url,
            answers,
            title,
            company,
        } => cli::apply_cmd::run(&url, &answers, title.as_deref(), company.as_deref()).await,
        Commands::Classify {
            target,
            origin,
            answers,
        } => cli::classify_cmd::run(&target, origin.as_deref(), answers.as_deref()).await,
        Commands::Doctor => cli::doctor::run().await,
    };

    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    result
}
