//! SiteProof CLI - Build-Time Metrics Pipeline Steps
//!
//! Subcommands: fetch, validate, export-readme, export-bullets
//! Each step is independently runnable; the dependency order is
//! fetch -> validate -> exporters, hand-off via the metrics JSON file.
//! Returns non-zero on missing input, parse failure, or (validate only)
//! any error-severity finding.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use siteproof_core::{
    export, source_repos, GitHubClient, IngestPipeline, SiteMetrics, Validator,
};

#[derive(Parser)]
#[command(name = "siteproof-cli")]
#[command(about = "SiteProof CLI - Evidence-Backed Metrics Pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the metrics document
    #[arg(short, long, global = true, default_value = "data/metrics.json")]
    metrics: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch artifacts from the configured source repositories and
    /// regenerate the metrics document
    Fetch,

    /// Gate-check the metrics document against honesty rules
    Validate,

    /// Splice the generated metrics block into a README
    ExportReadme {
        /// README file to update in place
        #[arg(short, long, default_value = "README.md")]
        readme: PathBuf,
    },

    /// Write LinkedIn/resume bullet files
    ExportBullets {
        /// Output directory for the bullet files
        #[arg(short, long, default_value = "exports")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch => {
            let client = match GitHubClient::from_env() {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, "failed to build GitHub client");
                    return ExitCode::FAILURE;
                }
            };

            let pipeline = IngestPipeline::new(client, source_repos());
            let doc = pipeline.run();

            if let Err(e) = doc.save(&cli.metrics) {
                error!(error = %e, "failed to write metrics document");
                return ExitCode::FAILURE;
            }

            println!("Metrics written to {}", cli.metrics.display());
            println!("  projects: {}", doc.projects.len());
            println!("  projects with evidence: {}", doc.hero.projects_count);
            println!("  best accuracy: {}%", doc.hero.best_accuracy);
            println!("  fastest P95: {}ms", doc.hero.fastest_p95_ms);
            println!("  docker reduction: {}%", doc.hero.docker_reduction_pct);
            ExitCode::SUCCESS
        }

        Commands::Validate => {
            let doc = match SiteMetrics::load(&cli.metrics) {
                Ok(d) => d,
                Err(e) => {
                    error!(error = %e, "cannot validate");
                    return ExitCode::FAILURE;
                }
            };

            let report = Validator::new().validate(&doc);

            for finding in report.warnings() {
                println!("warning [{}]: {}", finding.rule, finding.message);
            }
            for finding in report.errors() {
                println!("error [{}]: {}", finding.rule, finding.message);
            }

            if report.has_errors() {
                println!(
                    "\n{} validation error(s); fix these before deploying.",
                    report.errors().count()
                );
                ExitCode::from(2)
            } else {
                println!("All validations passed.");
                ExitCode::SUCCESS
            }
        }

        Commands::ExportReadme { readme } => {
            let doc = match SiteMetrics::load(&cli.metrics) {
                Ok(d) => d,
                Err(e) => {
                    error!(error = %e, "cannot export");
                    return ExitCode::FAILURE;
                }
            };

            match export::update_readme(&readme, &doc) {
                Ok(()) => {
                    println!("Updated metrics block in {}", readme.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "README export failed");
                    ExitCode::FAILURE
                }
            }
        }

        Commands::ExportBullets { out_dir } => {
            let doc = match SiteMetrics::load(&cli.metrics) {
                Ok(d) => d,
                Err(e) => {
                    error!(error = %e, "cannot export");
                    return ExitCode::FAILURE;
                }
            };

            match export::write_bullets(&doc, &out_dir) {
                Ok(()) => {
                    println!(
                        "Bullet exports written to {} and {}",
                        out_dir.join(export::LINKEDIN_FILE).display(),
                        out_dir.join(export::RESUME_FILE).display()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "bullet export failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
