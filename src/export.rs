//! Markdown Exporters
//!
//! Pure transformations from a `SiteMetrics` document into Markdown lines,
//! wrapped by thin file-I/O drivers: a marker-delimited README splice and
//! standalone bullet files for LinkedIn/resume use.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::model::{Metric, ProjectMetrics, ProjectStage, SiteMetrics};

pub const BEGIN_MARKER: &str = "<!-- AUTO-GENERATED METRICS:BEGIN -->";
pub const END_MARKER: &str = "<!-- AUTO-GENERATED METRICS:END -->";

pub const LINKEDIN_FILE: &str = "linkedin_bullets.md";
pub const RESUME_FILE: &str = "resume_snippets.md";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("README markers are corrupt: end marker appears before begin marker")]
    InvertedMarkers,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn stage_badge(stage: ProjectStage) -> &'static str {
    match stage {
        ProjectStage::Production => "[PRODUCTION]",
        ProjectStage::SyntheticBenchmark => "[SYNTHETIC]",
        ProjectStage::Prototype => "[PROTOTYPE]",
    }
}

fn metric_description(metric: &Metric) -> String {
    metric
        .note
        .clone()
        .unwrap_or_else(|| metric.key.replace('_', " "))
}

fn find_metric<'a>(
    projects: &'a [ProjectMetrics],
    key: &str,
) -> Option<(&'a ProjectMetrics, &'a Metric)> {
    projects
        .iter()
        .filter(|p| p.stage != ProjectStage::Prototype)
        .find_map(|p| p.metrics.get(key).map(|m| (p, m)))
}

/// Builds the README metrics block. Pure function of the document.
pub fn readme_block(doc: &SiteMetrics) -> Vec<String> {
    let mut lines = vec![];

    lines.push(String::new());
    lines.push("## Verified Production Metrics".to_string());
    lines.push(String::new());
    lines.push(
        "> All metrics below are auto-generated from data/metrics.json with GitHub artifacts as evidence."
            .to_string(),
    );
    lines.push(
        "> Synthetic benchmarks are clearly labeled. Prototype projects excluded from hero KPIs."
            .to_string(),
    );
    lines.push(String::new());

    lines.push("### Key Performance Indicators".to_string());
    lines.push(String::new());

    if doc.hero.best_accuracy > 0.0 {
        if let Some((project, metric)) = find_metric(&doc.projects, "accuracy") {
            let definition = metric
                .note
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default();
            let evidence = metric
                .evidence
                .first()
                .map(|e| format!(" [evidence]({})", e.href))
                .unwrap_or_default();
            lines.push(format!(
                "- **{}% Model Accuracy**{} - {}{}",
                doc.hero.best_accuracy, definition, project.title, evidence
            ));
        }
    }

    if doc.hero.fastest_p95_ms > 0.0 {
        if let Some((project, metric)) = find_metric(&doc.projects, "p95_latency_ms") {
            let evidence = metric
                .evidence
                .first()
                .map(|e| format!(" [evidence]({})", e.href))
                .unwrap_or_default();
            lines.push(format!(
                "- **{}ms P95 Latency** - {}{}",
                doc.hero.fastest_p95_ms, project.title, evidence
            ));
        }
    }

    if doc.hero.docker_reduction_pct > 0.0 {
        if let Some((project, metric)) = find_metric(&doc.projects, "docker_reduction") {
            let note = metric
                .note
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default();
            let evidence = metric
                .evidence
                .first()
                .map(|e| format!(" [evidence]({})", e.href))
                .unwrap_or_default();
            lines.push(format!(
                "- **{}% Docker Reduction**{} - {}{}",
                doc.hero.docker_reduction_pct, note, project.title, evidence
            ));
        }
    }

    let benchmarked = doc
        .projects
        .iter()
        .filter(|p| p.stage != ProjectStage::Prototype)
        .count();
    lines.push(format!(
        "- **{benchmarked} ML Systems** with verified benchmarks"
    ));
    lines.push(String::new());

    lines.push("### Project Portfolio".to_string());
    lines.push(String::new());

    for project in &doc.projects {
        lines.push(format!(
            "#### {} {}",
            project.title,
            stage_badge(project.stage)
        ));
        lines.push(String::new());
        lines.push(project.summary.clone());
        lines.push(String::new());

        if !project.metrics.is_empty() {
            lines.push("**Key Metrics:**".to_string());
            for metric in project.metrics.values().take(3) {
                let links: Vec<String> = metric
                    .evidence
                    .iter()
                    .filter(|e| e.is_resolvable())
                    .map(|e| format!("[{}]({})", e.label, e.href))
                    .collect();
                let suffix = if links.is_empty() {
                    String::new()
                } else {
                    format!(" - {}", links.join(", "))
                };
                lines.push(format!(
                    "- {} {}{}",
                    metric.display_value(),
                    metric_description(metric),
                    suffix
                ));
            }
            lines.push(String::new());
        }

        lines.push(format!("**Tech:** {}", project.tech.join(", ")));
        lines.push(String::new());
        lines.push(format!("[View on GitHub](https://github.com/{})", project.repo));
        lines.push(String::new());
    }

    lines.push("### Benchmark Methodology".to_string());
    lines.push(String::new());
    lines.push("1. **Provenance-First:** Every metric includes its source (GitHub artifact, README, etc.)".to_string());
    lines.push(
        "2. **Stage Labels:** Projects are labeled as Production, Synthetic Benchmark, or Prototype"
            .to_string(),
    );
    lines.push(
        "3. **Evidence Links:** Reproducible metrics link directly to GitHub artifacts".to_string(),
    );
    lines.push(
        "4. **Honest Reporting:** Missing artifacts = metric hidden or marked as target"
            .to_string(),
    );
    lines.push(String::new());
    lines.push(format!("*Last updated: {}*", doc.last_generated_iso));
    lines.push(String::new());

    lines
}

/// Splices `block` into `readme` between the marker lines. Content outside
/// the marker span is preserved byte-for-byte. Markers absent (either or
/// both) falls back to appending a newly-marked block; an inverted pair is
/// a distinct, fatal condition.
pub fn splice_markers(readme: &str, block: &str) -> Result<String, ExportError> {
    let begin = readme.find(BEGIN_MARKER);
    let end = readme.find(END_MARKER);

    match (begin, end) {
        (Some(b), Some(e)) => {
            if e <= b {
                return Err(ExportError::InvertedMarkers);
            }
            let mut out = String::with_capacity(readme.len() + block.len());
            out.push_str(&readme[..b + BEGIN_MARKER.len()]);
            out.push('\n');
            out.push_str(block);
            out.push_str(&readme[e..]);
            Ok(out)
        }
        _ => {
            warn!("README markers not found, appending a new metrics block");
            Ok(format!("{readme}\n\n{BEGIN_MARKER}\n{block}{END_MARKER}\n"))
        }
    }
}

/// Whole-file read-modify-write of the README metrics section.
pub fn update_readme(path: &Path, doc: &SiteMetrics) -> Result<(), ExportError> {
    let existing = fs::read_to_string(path)?;
    let block = readme_block(doc).join("\n");
    let updated = splice_markers(&existing, &block)?;
    fs::write(path, updated)?;
    Ok(())
}

/// LinkedIn-ready achievement bullets, one section per project plus an
/// explicitly-annotated internal section.
pub fn linkedin_bullets(doc: &SiteMetrics) -> Vec<String> {
    let mut bullets = vec![];

    bullets.push("# LinkedIn Profile Bullets".to_string());
    bullets.push(String::new());
    bullets.push("Copy and paste these achievement bullets into your LinkedIn profile.".to_string());
    bullets.push(String::new());
    bullets.push("---".to_string());
    bullets.push(String::new());

    for project in &doc.projects {
        bullets.push(format!("## {}", project.title));
        bullets.push(String::new());

        if project.metrics.is_empty() {
            let tech: Vec<&str> = project.tech.iter().take(3).map(String::as_str).collect();
            bullets.push(format!("- Built {} with {}", project.title, tech.join(", ")));
            bullets.push(String::new());
            continue;
        }

        let highlights: Vec<String> = project
            .metrics
            .values()
            .take(3)
            .map(|m| format!("{} {}", m.display_value(), metric_description(m)))
            .collect();

        let evidence = project
            .metrics
            .values()
            .find_map(|m| m.evidence.iter().find(|e| e.is_resolvable()))
            .map(|e| format!(" ([evidence]({}))", e.href))
            .unwrap_or_default();

        bullets.push(format!(
            "- Shipped {}: {}{}",
            project.title,
            highlights.join(", "),
            evidence
        ));
        bullets.push(String::new());
    }

    bullets.push("## Impact Highlights (Internal)".to_string());
    bullets.push(String::new());
    for impact in &doc.impact_bullets {
        bullets.push(format!(
            "- {}: {} (internal metrics, not publicly reproducible)",
            metric_description(impact),
            impact.display_value()
        ));
    }

    bullets
}

/// Concise resume statements plus summary stats from the hero KPIs.
pub fn resume_snippets(doc: &SiteMetrics) -> Vec<String> {
    let mut snippets = vec![];

    snippets.push("# Resume Snippets".to_string());
    snippets.push(String::new());
    snippets.push("Copy these concise achievement statements for your resume.".to_string());
    snippets.push(String::new());
    snippets.push("---".to_string());
    snippets.push(String::new());

    snippets.push("## Technical Projects".to_string());
    snippets.push(String::new());

    for project in &doc.projects {
        if project.metrics.is_empty() {
            continue;
        }
        let top: Vec<String> = project
            .metrics
            .values()
            .take(2)
            .map(Metric::display_value)
            .collect();
        let tech: Vec<&str> = project.tech.iter().take(4).map(String::as_str).collect();
        snippets.push(format!(
            "- **{}:** {} | {}",
            project.title,
            top.join(", "),
            tech.join(", ")
        ));
    }
    snippets.push(String::new());

    snippets.push("## Professional Impact".to_string());
    snippets.push(String::new());
    for impact in &doc.impact_bullets {
        snippets.push(format!(
            "- {}: {}",
            metric_description(impact),
            impact.display_value()
        ));
    }
    snippets.push(String::new());

    snippets.push("## Summary Stats".to_string());
    snippets.push(String::new());
    snippets.push(format!(
        "- {} production ML systems with verified benchmarks",
        doc.hero.projects_count
    ));
    if doc.hero.best_accuracy > 0.0 {
        snippets.push(format!("- Up to {}% model accuracy", doc.hero.best_accuracy));
    }
    if doc.hero.fastest_p95_ms > 0.0 {
        snippets.push(format!(
            "- API latency as low as {}ms P95",
            doc.hero.fastest_p95_ms
        ));
    }
    if doc.hero.docker_reduction_pct > 0.0 {
        snippets.push(format!(
            "- Docker optimization up to {}% reduction",
            doc.hero.docker_reduction_pct
        ));
    }

    snippets
}

/// Writes both bullet exports under `dir`, creating it if absent.
pub fn write_bullets(doc: &SiteMetrics, dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(LINKEDIN_FILE), linkedin_bullets(doc).join("\n"))?;
    fs::write(dir.join(RESUME_FILE), resume_snippets(doc).join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_replaces_span_and_preserves_outside() {
        let readme = format!(
            "# Title\n\nintro text\n\n{BEGIN_MARKER}\nold content\n{END_MARKER}\n\ntrailer\n"
        );
        let result = splice_markers(&readme, "new content\n").unwrap();

        assert!(result.starts_with("# Title\n\nintro text\n\n"));
        assert!(result.ends_with(format!("{END_MARKER}\n\ntrailer\n").as_str()));
        assert!(result.contains("new content"));
        assert!(!result.contains("old content"));
    }

    #[test]
    fn test_splice_appends_when_markers_absent() {
        let result = splice_markers("# Title\n", "block\n").unwrap();
        assert!(result.starts_with("# Title\n"));
        assert!(result.contains(BEGIN_MARKER));
        assert!(result.contains(END_MARKER));
        assert!(result.contains("block"));
    }

    #[test]
    fn test_splice_appends_when_only_one_marker_present() {
        let readme = format!("# Title\n{BEGIN_MARKER}\nstale\n");
        let result = splice_markers(&readme, "block\n").unwrap();
        assert!(result.contains(END_MARKER));
    }

    #[test]
    fn test_splice_rejects_inverted_markers() {
        let readme = format!("{END_MARKER}\nmiddle\n{BEGIN_MARKER}\n");
        let err = splice_markers(&readme, "block\n").unwrap_err();
        assert!(matches!(err, ExportError::InvertedMarkers));
    }
}
