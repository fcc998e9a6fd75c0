//! Ingest Pipeline - Single Entry Point for Document Generation
//!
//! Processes the configured repositories strictly in sequence, assembles a
//! fresh `SiteMetrics` document, and replaces the output file whole. An
//! individual missing or unparsable artifact never aborts the run; only the
//! final write can fail.

use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::{self, RepoConfig};
use crate::extract::{extractor_for, ArtifactSet};
use crate::github::ContentSource;
use crate::model::{HeroKpis, Metric, ProjectMetrics, Provenance, SiteMetrics};

/// Orchestrates fetch -> extract -> aggregate for a configured repo list.
pub struct IngestPipeline<S: ContentSource> {
    source: S,
    repos: Vec<RepoConfig>,
}

impl<S: ContentSource> IngestPipeline<S> {
    pub fn new(source: S, repos: Vec<RepoConfig>) -> Self {
        Self { source, repos }
    }

    /// Builds a complete document from scratch. Degrades gracefully: a repo
    /// with no recoverable metrics still contributes its display metadata.
    pub fn run(&self) -> SiteMetrics {
        let projects: Vec<ProjectMetrics> = self
            .repos
            .iter()
            .map(|cfg| self.ingest_repo(cfg))
            .collect();

        SiteMetrics {
            hero: compute_hero(&projects),
            impact_bullets: config::impact_bullets(),
            projects,
            last_generated_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn ingest_repo(&self, cfg: &RepoConfig) -> ProjectMetrics {
        info!(repo = %cfg.full_name(), "processing repository");

        let mut artifacts = ArtifactSet::new();
        for path in &cfg.artifact_paths {
            match self.source.file_text(&cfg.owner, &cfg.repo, path) {
                Ok(Some(text)) => {
                    info!(repo = %cfg.full_name(), %path, "loaded artifact");
                    artifacts.insert(path.clone(), text);
                }
                Ok(None) => {
                    warn!(repo = %cfg.full_name(), %path, "artifact not found");
                }
                Err(err) => {
                    warn!(repo = %cfg.full_name(), %path, error = %err, "artifact fetch failed, treating as absent");
                }
            }
        }

        let readme = cfg.readme_path.as_ref().and_then(|path| {
            match self.source.file_text(&cfg.owner, &cfg.repo, path) {
                Ok(Some(text)) => {
                    info!(repo = %cfg.full_name(), "loaded README");
                    Some(text)
                }
                Ok(None) => {
                    warn!(repo = %cfg.full_name(), %path, "README not found");
                    None
                }
                Err(err) => {
                    warn!(repo = %cfg.full_name(), %path, error = %err, "README fetch failed");
                    None
                }
            }
        });

        let mut metrics = match extractor_for(&cfg.repo) {
            Some(extract) => extract(&artifacts, readme.as_deref(), &cfg.html_url()),
            None => {
                warn!(repo = %cfg.full_name(), "no extraction strategy registered");
                BTreeMap::new()
            }
        };
        info!(repo = %cfg.full_name(), count = metrics.len(), "extracted metrics");

        self.stamp_commit_dates(cfg, &mut metrics);

        ProjectMetrics {
            repo: cfg.full_name(),
            title: cfg.title.clone(),
            stage: cfg.stage,
            metrics,
            summary: cfg.summary.clone(),
            case_study_path: cfg.case_study_path.clone(),
            tech: cfg.tech.clone(),
        }
    }

    /// Stamps artifact-derived metrics with the latest commit date of the
    /// contributing artifact. Lookup failure leaves the stamp absent.
    fn stamp_commit_dates(&self, cfg: &RepoConfig, metrics: &mut BTreeMap<String, Metric>) {
        let mut dates: BTreeMap<String, Option<String>> = BTreeMap::new();
        for metric in metrics.values_mut() {
            if metric.provenance != Provenance::RepoArtifact || metric.last_updated_iso.is_some() {
                continue;
            }
            let Some(label) = metric.evidence.first().map(|e| e.label.clone()) else {
                continue;
            };
            let Some(path) = cfg
                .artifact_paths
                .iter()
                .find(|p| p.ends_with(label.as_str()))
            else {
                continue;
            };
            let date = dates
                .entry(path.clone())
                .or_insert_with(|| self.source.last_commit_iso(&cfg.owner, &cfg.repo, path))
                .clone();
            metric.last_updated_iso = date;
        }
    }
}

/// Derived headline figures across all projects. Each defaults to 0 when no
/// qualifying source metric exists anywhere.
pub fn compute_hero(projects: &[ProjectMetrics]) -> HeroKpis {
    let projects_count = projects
        .iter()
        .filter(|p| p.has_reproducible_metric())
        .count() as u32;

    let numeric_values = |key: &str| -> Vec<f64> {
        projects
            .iter()
            .flat_map(|p| p.metrics.values())
            .filter(|m| m.key == key)
            .filter_map(|m| m.value.as_f64())
            .collect()
    };

    let best_accuracy = numeric_values("accuracy")
        .into_iter()
        .fold(0.0_f64, f64::max);

    let fastest_p95_ms = numeric_values("p95_latency_ms")
        .into_iter()
        .reduce(f64::min)
        .unwrap_or(0.0);

    let docker_reduction_pct = numeric_values("docker_reduction")
        .into_iter()
        .fold(0.0_f64, f64::max);

    HeroKpis {
        projects_count,
        best_accuracy,
        fastest_p95_ms,
        docker_reduction_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvidenceLink, MetricValue, ProjectStage};

    fn project(repo: &str, metrics: Vec<Metric>) -> ProjectMetrics {
        ProjectMetrics {
            repo: repo.to_string(),
            title: repo.to_string(),
            stage: ProjectStage::SyntheticBenchmark,
            metrics: metrics.into_iter().map(|m| (m.key.clone(), m)).collect(),
            summary: String::new(),
            case_study_path: format!("/projects/{repo}"),
            tech: vec![],
        }
    }

    fn metric(key: &str, value: MetricValue, reproducible: bool) -> Metric {
        Metric {
            key: key.to_string(),
            value,
            unit: None,
            note: None,
            evidence: vec![EvidenceLink::new("e", "https://example.com/e")],
            last_updated_iso: None,
            provenance: Provenance::RepoArtifact,
            reproducible,
        }
    }

    #[test]
    fn test_hero_defaults_to_zero_without_sources() {
        let hero = compute_hero(&[project("a/b", vec![])]);
        assert_eq!(hero, HeroKpis::default());
    }

    #[test]
    fn test_hero_aggregation() {
        let projects = vec![
            project(
                "a/one",
                vec![
                    metric("accuracy", MetricValue::Float(93.1), true),
                    metric("p95_latency_ms", MetricValue::Int(186), true),
                ],
            ),
            project(
                "a/two",
                vec![
                    metric("accuracy", MetricValue::Float(89.0), true),
                    metric("p95_latency_ms", MetricValue::Int(87), true),
                    metric("docker_reduction", MetricValue::Int(88), true),
                ],
            ),
            project("a/three", vec![metric("features", "40+".into(), false)]),
        ];
        let hero = compute_hero(&projects);
        assert_eq!(hero.projects_count, 2);
        assert_eq!(hero.best_accuracy, 93.1);
        assert_eq!(hero.fastest_p95_ms, 87.0);
        assert_eq!(hero.docker_reduction_pct, 88.0);
    }

    #[test]
    fn test_hero_ignores_text_values() {
        let projects = vec![project(
            "a/b",
            vec![metric("accuracy", "93%+".into(), true)],
        )];
        let hero = compute_hero(&projects);
        assert_eq!(hero.best_accuracy, 0.0);
    }
}
