//! `pea aliases` command implementation.
//!
//! Loads a package graph snapshot, runs the module-aliasing engine over it
//! and prints the module name every aliased target ends up with.

use std::time::Instant;

use camino::Utf8PathBuf;
use clap::Args;
use pea_alias::{AliasOptions, AliasReport, Diagnostic, ModuleAliasTracker, TracingSink};
use pea_config::{load_snapshot, AliasingSection};
use pea_core::error::{PeaError, PeaResult};
use pea_core::types::{ModuleAliases, PackageGraph, TargetId};
use serde::Serialize;

use super::CommandContext;
use crate::output::colors::ColorSupport;

/// Arguments of `pea aliases`
#[derive(Args, Debug, Clone)]
pub struct AliasesArgs {
    /// Graph snapshot to apply module aliases to
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: Utf8PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Override the primary source language
    #[arg(long, value_name = "LANGUAGE")]
    pub primary_language: Option<String>,

    /// Fail when reconciliation drops an alias
    #[arg(long)]
    pub deny_conflicts: bool,
}

impl AliasesArgs {
    pub fn cli_overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(language) = &self.primary_language {
            overrides.push(("primary-language", language.clone()));
        }
        if self.deny_conflicts {
            overrides.push(("deny-conflicts", "true".to_string()));
        }
        overrides
    }
}

/// Final module name and alias table of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasedTarget {
    pub target: TargetId,
    pub module: String,
    pub aliases: ModuleAliases,
}

/// Everything one run produced
#[derive(Debug, Serialize)]
pub struct AliasesOutput {
    pub report: AliasReport,
    pub targets: Vec<AliasedTarget>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Execute the `pea aliases` command
pub async fn execute(args: AliasesArgs, ctx: &CommandContext) -> PeaResult<()> {
    let start_time = Instant::now();

    let config = ctx.load_config(&args.cli_overrides()).await?;
    let aliasing = config.aliasing();

    let path = ctx.resolve_path(&args.snapshot);
    let mut graph = load_snapshot(&path).await?;
    let output = apply_aliases(&mut graph, &aliasing)?;

    if args.json {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| PeaError::config("output", format!("Failed to serialize result: {}", e)))?;
        println!("{}", json);
    } else {
        for line in render_output(&output, &ctx.output.colors()) {
            println!("{}", line);
        }
        ctx.output.success(&format!(
            "Module aliasing finished in {:.2}s",
            start_time.elapsed().as_secs_f64()
        ));
    }

    deny_conflicts(&aliasing, &output.report)
}

/// Run the tracker over `graph` with the configured options
pub fn apply_aliases(graph: &mut PackageGraph, aliasing: &AliasingSection) -> PeaResult<AliasesOutput> {
    let mut tracker = ModuleAliasTracker::with_options(AliasOptions {
        primary_language: aliasing.primary_language,
    });

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let report = tracker.track_graph(graph, &mut (&mut diagnostics, TracingSink))?;

    let targets = graph
        .aliased_targets()
        .map(|(target, definition)| AliasedTarget {
            module: definition.module_name().to_string(),
            aliases: definition.module_aliases().clone(),
            target,
        })
        .collect();

    Ok(AliasesOutput {
        report,
        targets,
        diagnostics,
    })
}

/// Human-readable listing of a run
pub fn render_output(output: &AliasesOutput, colors: &ColorSupport) -> Vec<String> {
    let mut lines = Vec::new();

    if output.targets.is_empty() {
        lines.push(colors.dim("No module aliases applied"));
    }
    for aliased in &output.targets {
        lines.push(format!("{} as {}", aliased.target, colors.cyan(&aliased.module)));
        for (original, alias) in &aliased.aliases {
            lines.push(format!("  {} -> {}", original, colors.cyan(alias)));
        }
    }

    for diagnostic in &output.diagnostics {
        lines.push(colors.yellow(&diagnostic.to_string()));
    }

    lines.push(colors.dim(&format!(
        "{} applied, {} dropped, {} products reconciled",
        output.report.applied,
        output.report.dropped.len(),
        output.report.reconciled_products
    )));
    lines
}

/// Fail the run when aliases were dropped and `deny-conflicts` is set
pub fn deny_conflicts(aliasing: &AliasingSection, report: &AliasReport) -> PeaResult<()> {
    if aliasing.deny_conflicts && !report.dropped.is_empty() {
        let modules: Vec<String> = report
            .dropped
            .iter()
            .map(|dropped| format!("{} ({})", dropped.module, dropped.target))
            .collect();
        return Err(PeaError::config(
            "aliasing.deny-conflicts",
            format!("Conflicting aliases were dropped for {}", modules.join(", ")),
        ));
    }
    Ok(())
}
