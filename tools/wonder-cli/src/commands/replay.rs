//! Scenario replay against an in-memory session.

use std::fs;

use anyhow::{bail, Context as _, Result};

use super::ReplayArgs;
use crate::context::Context;
use crate::output::outcome_badge;
use crate::scenario::{Scenario, ScenarioReport};

/// Run the replay command.
pub fn run(args: ReplayArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.scenario);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
    let scenario = Scenario::parse(&path.to_string_lossy(), &content)?;

    if scenario.config.is_some() {
        ctx.output
            .debug("Scenario carries its own session settings; ignoring loaded config");
    }
    ctx.output
        .debug(&format!("Running {} steps", scenario.steps.len()));

    let report = scenario.run(&ctx.config.session);

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        print_report(&report, args.show_cache, ctx);
    }

    let failures = report.failures();
    if failures > 0 {
        bail!("{} expectation(s) failed", failures);
    }

    ctx.output.success("All expectations held");
    Ok(())
}

fn print_report(report: &ScenarioReport, show_cache: bool, ctx: &Context) {
    ctx.output.header("Replay");

    let widths = [4, 8, 10, 22, 12, 6];
    ctx.output
        .table_row(&["#", "ACTION", "TARGET", "OUTCOME", "PAGE", "CHECK"], &widths);
    for step in &report.steps {
        let number = step.step.to_string();
        let check = match step.passed {
            Some(true) => outcome_badge("pass"),
            Some(false) => outcome_badge("fail"),
            None => String::new(),
        };
        let badge = outcome_badge(&step.outcome);
        ctx.output.table_row(
            &[
                number.as_str(),
                step.action,
                step.target.as_str(),
                badge.as_str(),
                step.page.as_deref().unwrap_or("-"),
                check.as_str(),
            ],
            &widths,
        );
    }

    if !show_cache {
        return;
    }

    ctx.output.header("Replacement cache");
    if report.replacement_cache.is_empty() {
        ctx.output.info("(empty)");
        return;
    }
    let widths = [10, 16, 4, 6, 8];
    ctx.output
        .table_row(&["CONTEXT", "KEY", "GEN", "OLD", "EXPIRED"], &widths);
    for record in &report.replacement_cache {
        let generation = record.generation.to_string();
        let old = record.old_generation.to_string();
        let expired = record.expired.to_string();
        ctx.output.table_row(
            &[
                record.context_id.as_str(),
                record.cache_key.as_str(),
                generation.as_str(),
                old.as_str(),
                expired.as_str(),
            ],
            &widths,
        );
    }
}
