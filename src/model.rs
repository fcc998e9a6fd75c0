//! Metrics Document Model
//!
//! The `SiteMetrics` JSON document is the single hand-off artifact between
//! the fetch, validate, and export steps. Wire shape is camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("metrics document not found at {0}; run `siteproof-cli fetch` first")]
    Missing(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as a SiteMetrics document")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How a metric's value was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    RepoArtifact,
    ReadmeText,
    CommitStats,
    ResumeInternal,
}

/// Maturity label on a project; governs which reproducibility rules apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStage {
    Production,
    SyntheticBenchmark,
    Prototype,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceLink {
    pub label: String,
    pub href: String,
}

impl EvidenceLink {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }

    /// A link only substantiates a claim if its href actually resolves somewhere.
    pub fn is_resolvable(&self) -> bool {
        !self.href.trim().is_empty()
    }
}

/// Metric values are numbers for comparison/aggregation, strings for
/// pre-formatted composites like "169K+".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// A single quantified claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub key: String,
    pub value: MetricValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceLink>,
    #[serde(
        rename = "lastUpdatedISO",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated_iso: Option<String>,
    pub provenance: Provenance,
    pub reproducible: bool,
}

impl Metric {
    /// Value plus display unit, e.g. "186ms" or "93.1%".
    pub fn display_value(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}{}", self.value, unit),
            None => self.value.to_string(),
        }
    }

    pub fn has_public_evidence(&self) -> bool {
        self.evidence.iter().any(EvidenceLink::is_resolvable)
    }
}

/// One source repository's contribution to the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub repo: String,
    pub title: String,
    pub stage: ProjectStage,
    pub metrics: BTreeMap<String, Metric>,
    pub summary: String,
    pub case_study_path: String,
    pub tech: Vec<String>,
}

impl ProjectMetrics {
    pub fn has_reproducible_metric(&self) -> bool {
        self.metrics.values().any(|m| m.reproducible)
    }
}

/// Headline aggregate figures for top-of-page display.
/// Each defaults to 0 when no qualifying source metric exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeroKpis {
    #[serde(rename = "projectsCount")]
    pub projects_count: u32,
    #[serde(rename = "bestAccuracy")]
    pub best_accuracy: f64,
    #[serde(rename = "fastestP95ms")]
    pub fastest_p95_ms: f64,
    #[serde(rename = "dockerReductionPct")]
    pub docker_reduction_pct: f64,
}

/// The root document, regenerated from scratch on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetrics {
    pub hero: HeroKpis,
    pub impact_bullets: Vec<Metric>,
    pub projects: Vec<ProjectMetrics>,
    #[serde(rename = "lastGeneratedISO")]
    pub last_generated_iso: String,
}

impl SiteMetrics {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::Missing(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whole-file replace, pretty-printed. Parent directories are created.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn all_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.projects.iter().flat_map(|p| p.metrics.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_value_untagged() {
        let v: MetricValue = serde_json::from_str("186").unwrap();
        assert_eq!(v, MetricValue::Int(186));

        let v: MetricValue = serde_json::from_str("0.942").unwrap();
        assert_eq!(v, MetricValue::Float(0.942));

        let v: MetricValue = serde_json::from_str(r#""169K+""#).unwrap();
        assert_eq!(v, MetricValue::Text("169K+".to_string()));
        assert!(!v.is_numeric());
    }

    #[test]
    fn test_wire_shape_field_names() {
        let doc = SiteMetrics {
            hero: HeroKpis::default(),
            impact_bullets: vec![],
            projects: vec![],
            last_generated_iso: "2025-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains(r#""impactBullets""#));
        assert!(json.contains(r#""lastGeneratedISO""#));
        assert!(json.contains(r#""projectsCount""#));
        assert!(json.contains(r#""fastestP95ms""#));
    }

    #[test]
    fn test_provenance_snake_case() {
        let json = serde_json::to_string(&Provenance::ResumeInternal).unwrap();
        assert_eq!(json, r#""resume_internal""#);
        let json = serde_json::to_string(&ProjectStage::SyntheticBenchmark).unwrap();
        assert_eq!(json, r#""synthetic_benchmark""#);
    }

    #[test]
    fn test_display_value_with_unit() {
        let metric = Metric {
            key: "p95_latency_ms".to_string(),
            value: MetricValue::Int(186),
            unit: Some("ms".to_string()),
            note: None,
            evidence: vec![],
            last_updated_iso: None,
            provenance: Provenance::RepoArtifact,
            reproducible: true,
        };
        assert_eq!(metric.display_value(), "186ms");
    }

    #[test]
    fn test_empty_href_is_not_public_evidence() {
        let metric = Metric {
            key: "mape_production".to_string(),
            value: MetricValue::Text("<8%".to_string()),
            unit: None,
            note: None,
            evidence: vec![EvidenceLink::new("Internal (employer)", "")],
            last_updated_iso: None,
            provenance: Provenance::ResumeInternal,
            reproducible: false,
        };
        assert!(!metric.has_public_evidence());
    }
}
