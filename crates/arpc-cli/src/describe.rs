//! # Describe Subcommand
//!
//! Prints a method signature:
//!
//! ```text
//! submitsignature(DATA64 (DATA), DATA32 (DATA)) -> BOOLEAN
//!   10002 Block template not found: No template matches the seal hash.
//!   10003 Failed to seal block
//! ```

use std::fmt::Write;

use anyhow::Context;
use arpc_codec::{Codec, MethodSignature};
use arpc_schema::{NamedType, Shape};
use clap::Args;

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Method name.
    pub method: String,

    /// Also list the fields of object types.
    #[arg(long)]
    pub fields: bool,

    /// Print the signature as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(codec: &Codec, args: &DescribeArgs) -> anyhow::Result<String> {
    let signature = codec
        .signature(&args.method)
        .with_context(|| format!("describing '{}'", args.method))?;
    Ok(if args.json {
        render_json(&signature).to_string()
    } else {
        render(&signature, args.fields)
    })
}

/// Parameter and result type names plus the declared errors, with their
/// codes, messages and reasons.
pub fn render_json(signature: &MethodSignature) -> serde_json::Value {
    let params: Vec<String> = signature.params.iter().map(|p| p.ty().name().to_string()).collect();
    serde_json::json!({
        "method": signature.name,
        "params": params,
        "result": signature.result.ty().name(),
        "errors": &*signature.errors,
    })
}

pub fn render(signature: &MethodSignature, with_fields: bool) -> String {
    let params: Vec<String> = signature.params.iter().map(|p| p.ty().to_string()).collect();
    let mut out = format!("{}({}) -> {}", signature.name, params.join(", "), signature.result.ty());

    if with_fields {
        let objects = signature
            .params
            .iter()
            .chain(std::iter::once(signature.result.as_ref()))
            .map(|p| p.ty());
        for ty in objects {
            render_fields(&mut out, ty);
        }
    }

    for usage in signature.errors.iter() {
        let d = usage.descriptor();
        let _ = write!(out, "\n  {} {}", d.code(), d.message());
        if let Some(reason) = usage.reason() {
            let _ = write!(out, ": {reason}");
        }
    }
    out
}

fn render_fields(out: &mut String, ty: &NamedType) {
    if let Shape::Object(fields) = ty.ty().shape() {
        let _ = write!(out, "\n  {} {{", ty.name());
        for field in fields {
            let _ = write!(out, "\n    {}: {}", field.name(), field.ty());
        }
        out.push_str("\n  }");
    }
}
