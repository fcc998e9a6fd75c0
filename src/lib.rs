//! SiteProof Core - Evidence-Backed Metrics Pipeline
//!
//! # The Four Rules (Non-Negotiable)
//! 1. Every Claim Carries Provenance
//! 2. Production Means Reproducible
//! 3. Internal Facts Never Imply Public Evidence
//! 4. Missing Data Degrades, Never Fabricates

pub mod config;
pub mod export;
pub mod extract;
pub mod github;
pub mod model;
pub mod pipeline;
pub mod validate;

pub use config::{impact_bullets, source_repos, RepoConfig};
pub use export::{
    linkedin_bullets, readme_block, resume_snippets, splice_markers, update_readme, write_bullets,
    ExportError, BEGIN_MARKER, END_MARKER,
};
pub use extract::{extractor_for, ArtifactSet, ExtractorFn};
pub use github::{ContentSource, FetchError, GitHubClient};
pub use model::{
    DocumentError, EvidenceLink, HeroKpis, Metric, MetricValue, ProjectMetrics, ProjectStage,
    Provenance, SiteMetrics,
};
pub use pipeline::{compute_hero, IngestPipeline};
pub use validate::{ContentRule, Finding, Severity, ValidationReport, Validator};

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
