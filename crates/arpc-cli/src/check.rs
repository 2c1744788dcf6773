//! # Check Subcommand
//!
//! Design-time consistency pass: every listed method must resolve.

use anyhow::Context;
use arpc_codec::{Codec, WarmupReport};
use clap::Args;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(codec: &Codec, args: &CheckArgs) -> anyhow::Result<String> {
    let report = codec.warm_up().context("schema set failed to resolve")?;
    Ok(if args.json {
        render_json(&report).to_string()
    } else {
        render_text(&report)
    })
}

fn render_text(report: &WarmupReport) -> String {
    format!(
        "ok: {} methods, {} named types, {} validators",
        report.methods.len(),
        report.named_types,
        report.validators
    )
}

fn render_json(report: &WarmupReport) -> serde_json::Value {
    serde_json::json!({
        "methods": report.methods,
        "named_types": report.named_types,
        "validators": report.validators,
    })
}
