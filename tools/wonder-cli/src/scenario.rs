//! Scripted save/restore scenarios run against a session with a manual clock.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use wonder_core::{ContextId, ManualClock, SessionCacheConfig, SlotKey};
use wonder_session::{
    AjaxSession, RecordSummary, RenderedPage, SaveDirective, SaveOutcome, StoreMode, Tier,
};

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Session settings replacing the effective configuration.
    #[serde(default)]
    pub config: Option<SessionCacheConfig>,
    /// Steps, run in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    /// Save a page.
    Save {
        /// Context ID of the response.
        context: ContextId,
        /// Page name (also its identity).
        page: String,
        /// Slot key of the updated fragment.
        #[serde(default)]
        slot: Option<SlotKey>,
        /// Original context ID of the Ajax sequence.
        #[serde(default)]
        original: Option<ContextId>,
        /// Store marker; defaults to `dont-store` when a slot is given.
        #[serde(default)]
        store: Option<StoreMode>,
    },
    /// Restore a page.
    Restore {
        /// Context ID to restore.
        context: ContextId,
        /// Page name the restore must return.
        #[serde(default)]
        expect_page: Option<String>,
        /// Whether the restore must miss.
        #[serde(default)]
        expect_miss: bool,
    },
    /// Move the clock forward.
    Advance {
        /// Seconds to advance.
        secs: u64,
    },
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// 1-based step number.
    pub step: usize,
    /// Step kind.
    pub action: &'static str,
    /// Context ID or duration, for display.
    pub target: String,
    /// What happened.
    pub outcome: String,
    /// Page involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Whether the step's expectation held; `None` when it had none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

/// Results of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Per-step results.
    pub steps: Vec<StepResult>,
    /// Replacement cache contents after the last step.
    pub replacement_cache: Vec<RecordSummary>,
}

impl ScenarioReport {
    /// Number of failed expectations.
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| s.passed == Some(false)).count()
    }
}

impl Scenario {
    /// Parse a scenario; JSON when the path ends in `.json`, TOML otherwise.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        let scenario: Self = if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON scenario: {}", path))?
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML scenario: {}", path))?
        };
        if let Some(config) = &scenario.config {
            config
                .validate()
                .with_context(|| format!("Invalid session settings in {}", path))?;
        }
        Ok(scenario)
    }

    /// Run every step against a fresh session.
    pub fn run(&self, base: &SessionCacheConfig) -> ScenarioReport {
        let config = self.config.clone().unwrap_or_else(|| base.clone());
        let clock = Arc::new(ManualClock::at_epoch());
        let mut session: AjaxSession<RenderedPage> = AjaxSession::with_clock(config, clock.clone());

        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| run_step(i + 1, step, &mut session, &clock))
            .collect();

        ScenarioReport {
            steps,
            replacement_cache: session
                .replacement_cache()
                .map(|cache| cache.snapshot())
                .unwrap_or_default(),
        }
    }
}

fn run_step(
    number: usize,
    step: &Step,
    session: &mut AjaxSession<RenderedPage>,
    clock: &ManualClock,
) -> StepResult {
    match step {
        Step::Save {
            context,
            page,
            slot,
            original,
            store,
        } => {
            let directive = SaveDirective {
                store: store.unwrap_or(if slot.is_some() {
                    StoreMode::DontStore
                } else {
                    StoreMode::Default
                }),
                slot_key: slot.clone(),
                original_context_id: original.clone(),
            };
            let outcome = session.save_page_with(
                RenderedPage::new(page.as_str(), page.as_str()),
                context.clone(),
                &directive,
            );
            let outcome = match outcome {
                SaveOutcome::Backtrack => Tier::Backtrack.to_string(),
                SaveOutcome::Replacement { .. } => Tier::Replacement.to_string(),
                SaveOutcome::Permanent => Tier::Permanent.to_string(),
                SaveOutcome::Skipped => "skipped".to_string(),
            };
            StepResult {
                step: number,
                action: "save",
                target: context.to_string(),
                outcome,
                page: Some(page.clone()),
                passed: None,
            }
        }
        Step::Restore {
            context,
            expect_page,
            expect_miss,
        } => {
            let restored = session.restore_page(context);
            let page = restored.as_ref().map(|r| r.page.name.clone());
            let passed = if *expect_miss {
                Some(restored.is_none())
            } else {
                expect_page.as_ref().map(|want| page.as_ref() == Some(want))
            };
            StepResult {
                step: number,
                action: "restore",
                target: context.to_string(),
                outcome: restored
                    .as_ref()
                    .map(|r| format!("hit ({})", r.tier))
                    .unwrap_or_else(|| "miss".to_string()),
                page,
                passed,
            }
        }
        Step::Advance { secs } => {
            clock.advance_secs(i64::try_from(*secs).unwrap_or(i64::MAX));
            StepResult {
                step: number,
                action: "advance",
                target: format!("+{}s", secs),
                outcome: "advance".to_string(),
                page: None,
                passed: None,
            }
        }
    }
}
