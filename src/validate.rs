//! Content Validation - Honesty Gate for the Metrics Document
//!
//! Rules produce severity-tagged findings; every rule runs and findings are
//! aggregated rather than stopping at the first failure. Error findings
//! block a release (non-zero exit in the CLI); warnings never do.
//!
//! Project-specific editorial guardrails live in data tables rather than
//! hard-coded conditionals, keeping the rule engine generic.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::model::{Metric, ProjectStage, Provenance, SiteMetrics};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Validation rule trait - inspects the whole document, produces findings.
pub trait ContentRule {
    fn name(&self) -> &'static str;
    fn check(&self, doc: &SiteMetrics) -> Vec<Finding>;
}

// --- Editorial policy tables ---

/// A named project's metric must carry a qualifier substring in its note.
pub struct NotePolicy {
    pub title_match: &'static str,
    pub metric_key: &'static str,
    pub required_substring: &'static str,
}

pub const NOTE_POLICIES: &[NotePolicy] = &[NotePolicy {
    title_match: "fantasy",
    metric_key: "accuracy",
    required_substring: "±3",
}];

/// A named project must carry a specific stage label.
pub struct StagePolicy {
    pub title_match: &'static str,
    pub required_stage: ProjectStage,
}

pub const STAGE_POLICIES: &[StagePolicy] = &[StagePolicy {
    title_match: "chat",
    required_stage: ProjectStage::SyntheticBenchmark,
}];

// --- Concrete rules ---

/// Hero KPIs must be non-zero whenever a qualifying source metric exists.
struct HeroKpiRule;

impl ContentRule for HeroKpiRule {
    fn name(&self) -> &'static str {
        "hero_kpis"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];

        let has_key = |key: &str| doc.all_metrics().any(|m| m.key == key);

        if doc.hero.projects_count == 0
            && doc.projects.iter().any(|p| p.has_reproducible_metric())
        {
            findings.push(Finding::error(
                self.name(),
                "hero projectsCount is 0, but projects with reproducible metrics exist",
            ));
        }
        if doc.hero.best_accuracy == 0.0 && has_key("accuracy") {
            findings.push(Finding::error(
                self.name(),
                "hero bestAccuracy is 0, but accuracy metrics exist in projects",
            ));
        }
        if doc.hero.fastest_p95_ms == 0.0 && has_key("p95_latency_ms") {
            findings.push(Finding::error(
                self.name(),
                "hero fastestP95ms is 0, but latency metrics exist in projects",
            ));
        }
        if doc.hero.docker_reduction_pct == 0.0 && has_key("docker_reduction") {
            findings.push(Finding::error(
                self.name(),
                "hero dockerReductionPct is 0, but docker reduction metrics exist in projects",
            ));
        }

        findings
    }
}

/// Structural completeness of every metric. Presence of `provenance` and
/// `reproducible` is already enforced by deserialization; what remains is
/// key and value content.
struct MetricFieldsRule;

impl ContentRule for MetricFieldsRule {
    fn name(&self) -> &'static str {
        "metric_fields"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];
        for project in &doc.projects {
            for (map_key, metric) in &project.metrics {
                if metric.key.trim().is_empty() {
                    findings.push(Finding::error(
                        self.name(),
                        format!("project {}: metric missing 'key' field", project.repo),
                    ));
                } else if map_key != &metric.key {
                    findings.push(Finding::error(
                        self.name(),
                        format!(
                            "project {}: metric map key '{}' does not match metric key '{}'",
                            project.repo, map_key, metric.key
                        ),
                    ));
                }
                if matches!(&metric.value, crate::model::MetricValue::Text(t) if t.trim().is_empty())
                {
                    findings.push(Finding::error(
                        self.name(),
                        format!(
                            "project {}: metric '{}' has an empty value",
                            project.repo, metric.key
                        ),
                    ));
                }
            }
        }
        findings
    }
}

/// A "production"-staged project must back every metric with reproducible
/// evidence.
struct ProductionClaimsRule;

impl ContentRule for ProductionClaimsRule {
    fn name(&self) -> &'static str {
        "production_claims"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];
        for project in &doc.projects {
            if project.stage != ProjectStage::Production {
                continue;
            }
            for metric in project.metrics.values() {
                if !metric.reproducible {
                    findings.push(Finding::error(
                        self.name(),
                        format!(
                            "project {}: metric '{}' is labeled 'production' but reproducible=false",
                            project.repo, metric.key
                        ),
                    ));
                }
            }
        }
        findings
    }
}

/// Reproducible metrics should point at something.
struct EvidenceRule;

impl ContentRule for EvidenceRule {
    fn name(&self) -> &'static str {
        "evidence_links"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];
        for project in &doc.projects {
            for metric in project.metrics.values() {
                if metric.reproducible && !metric.has_public_evidence() {
                    findings.push(Finding::warning(
                        self.name(),
                        format!(
                            "project {}: metric '{}' is reproducible but has no evidence links",
                            project.repo, metric.key
                        ),
                    ));
                }
            }
        }
        findings
    }
}

struct EmptyProjectRule;

impl ContentRule for EmptyProjectRule {
    fn name(&self) -> &'static str {
        "empty_projects"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        doc.projects
            .iter()
            .filter(|p| p.metrics.is_empty())
            .map(|p| {
                Finding::warning(
                    self.name(),
                    format!("project {}: no metrics found", p.repo),
                )
            })
            .collect()
    }
}

/// Internal facts must never imply public verifiability.
struct InternalProvenanceRule;

impl ContentRule for InternalProvenanceRule {
    fn name(&self) -> &'static str {
        "internal_provenance"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];
        for bullet in &doc.impact_bullets {
            if bullet.provenance != Provenance::ResumeInternal {
                findings.push(Finding::error(
                    self.name(),
                    format!(
                        "impact bullet '{}': expected provenance=resume_internal",
                        bullet.key
                    ),
                ));
            }
            if bullet.reproducible {
                findings.push(Finding::error(
                    self.name(),
                    format!(
                        "impact bullet '{}': internal metrics must have reproducible=false",
                        bullet.key
                    ),
                ));
            }
        }
        for metric in doc.impact_bullets.iter().chain(doc.all_metrics()) {
            if metric.provenance == Provenance::ResumeInternal && metric.has_public_evidence() {
                findings.push(Finding::error(
                    self.name(),
                    format!(
                        "metric '{}': resume_internal provenance must not carry a resolvable evidence href",
                        metric.key
                    ),
                ));
            }
        }
        findings
    }
}

/// Applies the editorial policy tables.
struct EditorialPolicyRule;

impl ContentRule for EditorialPolicyRule {
    fn name(&self) -> &'static str {
        "editorial_policy"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let mut findings = vec![];

        for policy in NOTE_POLICIES {
            let Some(project) = doc
                .projects
                .iter()
                .find(|p| p.title.to_lowercase().contains(policy.title_match))
            else {
                continue;
            };
            let Some(metric) = project.metrics.get(policy.metric_key) else {
                continue;
            };
            let note_ok = metric
                .note
                .as_deref()
                .is_some_and(|n| n.contains(policy.required_substring));
            if !note_ok {
                findings.push(Finding::error(
                    self.name(),
                    format!(
                        "project {}: metric '{}' must include \"{}\" in its note field",
                        project.repo, policy.metric_key, policy.required_substring
                    ),
                ));
            }
        }

        for policy in STAGE_POLICIES {
            let Some(project) = doc
                .projects
                .iter()
                .find(|p| p.title.to_lowercase().contains(policy.title_match))
            else {
                continue;
            };
            if project.stage != policy.required_stage {
                findings.push(Finding::error(
                    self.name(),
                    format!(
                        "project {}: stage must be {}, found {}",
                        project.repo,
                        serde_json::to_string(&policy.required_stage).unwrap_or_default(),
                        serde_json::to_string(&project.stage).unwrap_or_default()
                    ),
                ));
            }
        }

        findings
    }
}

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("phone pattern")
});

/// Scans the serialized document for leaked PII patterns.
struct PiiScanRule;

impl ContentRule for PiiScanRule {
    fn name(&self) -> &'static str {
        "pii_scan"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        let serialized = serde_json::to_string(doc).unwrap_or_default();
        let mut findings = vec![];
        if EMAIL_PATTERN.is_match(&serialized) {
            findings.push(Finding::error(
                self.name(),
                "potential email address found in metrics document; remove all PII",
            ));
        }
        if PHONE_PATTERN.is_match(&serialized) {
            findings.push(Finding::error(
                self.name(),
                "potential phone number found in metrics document; remove all PII",
            ));
        }
        findings
    }
}

/// Uptime claims need a public status page behind them. Scoped to metrics
/// that actually mention uptime, so unrelated percentages (cache hit rates
/// and the like) cannot false-positive.
///
/// Note the interaction with `InternalProvenanceRule`: a `resume_internal`
/// metric cannot carry a resolvable href, so an internal uptime claim can
/// never satisfy this rule. Internal uptime figures are effectively
/// disallowed in the document.
struct UptimeClaimRule;

impl UptimeClaimRule {
    fn claims_uptime(metric: &Metric) -> bool {
        metric.key.to_lowercase().contains("uptime")
            || metric
                .note
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains("uptime"))
    }

    fn has_status_page(metric: &Metric) -> bool {
        metric
            .evidence
            .iter()
            .any(|e| e.href.contains("status.") || e.href.contains("uptime."))
    }
}

impl ContentRule for UptimeClaimRule {
    fn name(&self) -> &'static str {
        "uptime_claims"
    }

    fn check(&self, doc: &SiteMetrics) -> Vec<Finding> {
        doc.all_metrics()
            .chain(doc.impact_bullets.iter())
            .filter(|m| Self::claims_uptime(m) && !Self::has_status_page(m))
            .map(|m| {
                Finding::error(
                    self.name(),
                    format!(
                        "metric '{}' claims uptime without a public status page link",
                        m.key
                    ),
                )
            })
            .collect()
    }
}

/// Validator orchestrates rules and aggregates findings.
pub struct Validator {
    rules: Vec<Box<dyn ContentRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(HeroKpiRule),
                Box::new(MetricFieldsRule),
                Box::new(ProductionClaimsRule),
                Box::new(EvidenceRule),
                Box::new(EmptyProjectRule),
                Box::new(InternalProvenanceRule),
                Box::new(EditorialPolicyRule),
                Box::new(PiiScanRule),
                Box::new(UptimeClaimRule),
            ],
        }
    }

    pub fn validate(&self, doc: &SiteMetrics) -> ValidationReport {
        let findings = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(doc))
            .collect();
        ValidationReport { findings }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvidenceLink, HeroKpis, MetricValue};

    fn empty_doc() -> SiteMetrics {
        SiteMetrics {
            hero: HeroKpis::default(),
            impact_bullets: vec![],
            projects: vec![],
            last_generated_iso: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_empty_document_is_clean() {
        let report = Validator::new().validate(&empty_doc());
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn test_pii_scan_flags_email() {
        let mut doc = empty_doc();
        doc.impact_bullets.push(Metric {
            key: "contact".to_string(),
            value: MetricValue::Text("someone@example.com".to_string()),
            unit: None,
            note: None,
            evidence: vec![],
            last_updated_iso: None,
            provenance: Provenance::ResumeInternal,
            reproducible: false,
        });
        let report = Validator::new().validate(&doc);
        assert!(report.errors().any(|f| f.rule == "pii_scan"));
    }

    #[test]
    fn test_uptime_claim_requires_status_page() {
        let mut doc = empty_doc();
        doc.impact_bullets.push(Metric {
            key: "uptime_pct".to_string(),
            value: MetricValue::Float(99.9),
            unit: Some("%".to_string()),
            note: None,
            evidence: vec![],
            last_updated_iso: None,
            provenance: Provenance::ResumeInternal,
            reproducible: false,
        });
        let report = Validator::new().validate(&doc);
        assert!(report.errors().any(|f| f.rule == "uptime_claims"));

        doc.impact_bullets[0].evidence =
            vec![EvidenceLink::new("status", "https://status.example.com")];
        let report = Validator::new().validate(&doc);
        assert!(!report.errors().any(|f| f.rule == "uptime_claims"));
    }

    #[test]
    fn test_metric_map_key_mismatch_is_error() {
        let mut doc = empty_doc();
        let metric = Metric {
            key: "p95_latency_ms".to_string(),
            value: MetricValue::Int(186),
            unit: Some("ms".to_string()),
            note: None,
            evidence: vec![EvidenceLink::new("artifact", "https://example.com/e")],
            last_updated_iso: None,
            provenance: Provenance::RepoArtifact,
            reproducible: true,
        };
        doc.hero.projects_count = 1;
        doc.hero.fastest_p95_ms = 186.0;
        doc.projects.push(crate::model::ProjectMetrics {
            repo: "o/r".to_string(),
            title: "Service".to_string(),
            stage: ProjectStage::Production,
            metrics: [("latency".to_string(), metric)].into_iter().collect(),
            summary: "s".to_string(),
            case_study_path: "/projects/r".to_string(),
            tech: vec![],
        });

        let report = Validator::new().validate(&doc);
        let mismatch: Vec<_> = report
            .errors()
            .filter(|f| f.rule == "metric_fields")
            .collect();
        assert_eq!(mismatch.len(), 1);
        assert!(mismatch[0].message.contains("'latency'"));
        assert!(mismatch[0].message.contains("'p95_latency_ms'"));
    }

    #[test]
    fn test_internal_uptime_claim_cannot_satisfy_both_rules() {
        let mut doc = empty_doc();
        doc.impact_bullets.push(Metric {
            key: "uptime_pct".to_string(),
            value: MetricValue::Float(99.9),
            unit: Some("%".to_string()),
            note: None,
            evidence: vec![EvidenceLink::new("status", "https://status.example.com")],
            last_updated_iso: None,
            provenance: Provenance::ResumeInternal,
            reproducible: false,
        });

        // The status link satisfies the uptime rule but is itself a
        // resolvable href on an internal metric.
        let report = Validator::new().validate(&doc);
        assert!(!report.errors().any(|f| f.rule == "uptime_claims"));
        assert!(report.errors().any(|f| f.rule == "internal_provenance"));
    }

    #[test]
    fn test_unrelated_percentage_does_not_trip_uptime_rule() {
        let mut doc = empty_doc();
        doc.impact_bullets.push(Metric {
            key: "cache_hit_rate".to_string(),
            value: MetricValue::Float(99.5),
            unit: Some("%".to_string()),
            note: Some("semantic cache".to_string()),
            evidence: vec![],
            last_updated_iso: None,
            provenance: Provenance::ResumeInternal,
            reproducible: false,
        });
        let report = Validator::new().validate(&doc);
        assert!(!report.errors().any(|f| f.rule == "uptime_claims"));
    }
}
