//! # Decode Subcommand
//!
//! Decodes one request payload (from a file or stdin) and prints its
//! parameters. A rejected request prints the error response that would
//! be sent back and exits non-zero.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use arpc_codec::{id_of_request, Codec, DecodedRequest, NativeValue, Record};
use clap::Args;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read the request from this file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn read_payload(args: &DecodeArgs) -> anyhow::Result<String> {
    match &args.file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw).context("reading stdin")?;
            Ok(raw)
        }
    }
}

/// Decoded parameters as text, or the error response for a rejected request.
pub fn run(codec: &Codec, raw: &str) -> Result<String, String> {
    match codec.decode_request(raw) {
        Ok(request) => Ok(render(&request)),
        Err(err) => {
            tracing::warn!(error = %err, "request rejected");
            Err(codec.encode_error(id_of_request(raw).as_deref(), &err))
        }
    }
}

pub fn render(request: &DecodedRequest) -> String {
    let mut lines = vec![format!(
        "{} id={}",
        request.method,
        request.id.as_deref().unwrap_or("null")
    )];
    for (position, param) in request.params.iter().enumerate() {
        lines.push(format!("  [{position}] {}", render_value(param)));
    }
    lines.join("\n")
}

fn render_value(value: &NativeValue) -> String {
    match value {
        NativeValue::Object(object) => match object.downcast_ref::<Record>() {
            Some(record) => {
                let fields: Vec<String> = record
                    .iter()
                    .map(|(name, value)| format!("{name}: {}", render_value(value)))
                    .collect();
                format!("{} {{ {} }}", object.type_name(), fields.join(", "))
            }
            None => value.to_string(),
        },
        NativeValue::Quantity(q) => match q.to_u128() {
            Some(n) => format!("{q} ({n})"),
            None => q.to_string(),
        },
        other => other.to_string(),
    }
}
