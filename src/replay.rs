//! Scripted replay of a visitor session
//!
//! A YAML script of mounts, visibility samples and clicks is run against the
//! in-memory platform. The resulting report shows which sections were
//! revealed, where the page scrolled and how often the application was
//! entered.
//!
//! ```yaml
//! rendered: [hero, sample, about, docs]
//! steps:
//!   - action: mount
//!   - action: sample
//!     section: about
//!     ratio: 0.4
//!   - action: click
//!     control: nav-about
//!   - action: unmount
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::config::LandingConfig;
use crate::fake::{EntryProbe, FakeDocument, FakeViewport};
use crate::layout::NavControl;
use crate::navigation::NavOutcome;
use crate::page::LandingPage;
use crate::platform::VisibilitySample;
use crate::section::SectionId;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayStep {
    Mount,
    Unmount,
    Sample { section: SectionId, ratio: f64 },
    Click { control: NavControl },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayScript {
    /// Ids present in the render tree. Defaults to every configured section.
    #[serde(default)]
    pub rendered: Option<Vec<String>>,
    /// Run without an entry callback, as a standalone preview would
    #[serde(default)]
    pub preview: bool,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).context("Failed to parse replay script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;
        Self::from_yaml(&source)
    }
}

/// What a single step did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepResult {
    Mounted { observed: usize, skipped: usize },
    Unmounted,
    Sampled { revealed: Option<SectionId> },
    Clicked { control: NavControl, result: NavOutcome },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepResult>,
    /// Sections in the order they were revealed
    pub reveals: Vec<SectionId>,
    /// Scroll targets in request order
    pub scrolls: Vec<String>,
    pub entries: usize,
    /// Final revealed flag per mounted section
    pub revealed: BTreeMap<SectionId, bool>,
}

pub fn run(config: &LandingConfig, script: &ReplayScript) -> Result<ReplayReport> {
    let document = match &script.rendered {
        Some(ids) => FakeDocument::with_ids(ids.iter().cloned()),
        None => FakeDocument::with_ids(config.sections.iter().map(|id| id.to_string())),
    };
    let probe = EntryProbe::new();
    let on_enter = (!script.preview).then(|| probe.callback());

    let mut page = LandingPage::new(
        config,
        FakeViewport::new(),
        document.clone(),
        document.clone(),
        on_enter,
    )
    .context("Invalid landing config")?;

    let mut steps = Vec::with_capacity(script.steps.len());
    let mut reveals = Vec::new();

    for step in &script.steps {
        let result = match step {
            ReplayStep::Mount => {
                let report = page.mount();
                StepResult::Mounted {
                    observed: report.observed.len(),
                    skipped: report.already_registered.len(),
                }
            }
            ReplayStep::Unmount => {
                page.unmount();
                StepResult::Unmounted
            }
            ReplayStep::Sample { section, ratio } => {
                let sample = VisibilitySample::new(section.clone(), *ratio);
                let revealed = page
                    .on_visibility([&sample])
                    .into_iter()
                    .next()
                    .map(|t| t.section);
                if let Some(id) = &revealed {
                    reveals.push(id.clone());
                }
                StepResult::Sampled { revealed }
            }
            ReplayStep::Click { control } => StepResult::Clicked {
                control: *control,
                result: page.click(*control),
            },
        };
        steps.push(result);
    }

    let revealed = page
        .tracker()
        .sections()
        .iter()
        .map(|s| (s.id().clone(), s.is_revealed()))
        .collect();

    let report = ReplayReport {
        steps,
        reveals,
        scrolls: document.scrolls().into_iter().map(|c| c.target).collect(),
        entries: probe.calls(),
        revealed,
    };
    info!(
        steps = report.steps.len(),
        reveals = report.reveals.len(),
        scrolls = report.scrolls.len(),
        entries = report.entries,
        "Replay finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = r#"
rendered: [hero, sample, about, docs]
steps:
  - action: mount
  - action: sample
    section: about
    ratio: 0.4
  - action: sample
    section: about
    ratio: 0.0
  - action: click
    control: nav-about
  - action: click
    control: hero-open-demo
  - action: unmount
  - action: sample
    section: docs
    ratio: 1.0
"#;

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::from_yaml(SCRIPT).expect("valid script");
        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[3],
            ReplayStep::Click {
                control: NavControl::NavAbout
            }
        );
        assert!(!script.preview);
    }

    #[test]
    fn test_replay_report() {
        let script = ReplayScript::from_yaml(SCRIPT).expect("valid script");
        let report = run(&LandingConfig::default(), &script).expect("replay runs");

        assert_eq!(report.reveals, vec![SectionId::from("about")]);
        assert_eq!(report.scrolls, vec!["about".to_string()]);
        assert_eq!(report.entries, 1);
        assert_eq!(report.revealed.get(&SectionId::from("about")), Some(&true));
        assert_eq!(report.revealed.get(&SectionId::from("docs")), Some(&false));
        // Sample after unmount is dropped
        assert_eq!(
            report.steps.last(),
            Some(&StepResult::Sampled { revealed: None })
        );
    }

    #[test]
    fn test_preview_has_no_entry_callback() {
        let script = ReplayScript::from_yaml(
            "preview: true\nsteps:\n  - action: click\n    control: cta-dashboard\n",
        )
        .expect("valid script");
        let report = run(&LandingConfig::default(), &script).expect("replay runs");

        assert_eq!(report.entries, 0);
        assert_eq!(
            report.steps,
            vec![StepResult::Clicked {
                control: NavControl::CtaDashboard,
                result: NavOutcome::NoEntryCallback,
            }]
        );
    }

    #[test]
    fn test_invalid_config_fails_replay() {
        let script = ReplayScript::from_yaml(SCRIPT).expect("valid script");
        let config = LandingConfig {
            reveal_threshold: f64::NAN,
            ..LandingConfig::default()
        };
        assert!(run(&config, &script).is_err());
    }

    #[test]
    fn test_unknown_control_rejected() {
        let err = ReplayScript::from_yaml("steps:\n  - action: click\n    control: nav-blog\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_report_serializes() {
        let script = ReplayScript::from_yaml(SCRIPT).expect("valid script");
        let report = run(&LandingConfig::default(), &script).expect("replay runs");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["entries"], 1);
        assert_eq!(json["steps"][3]["result"]["outcome"], "scrolled");
    }
}
