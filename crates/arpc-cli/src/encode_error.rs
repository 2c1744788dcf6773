//! # Encode-Error Subcommand
//!
//! Renders the error response a server sends when `method` raises one of
//! its declared domain errors.

use anyhow::{anyhow, Context};
use arpc_codec::Codec;
use clap::Args;

#[derive(Args, Debug)]
pub struct EncodeErrorArgs {
    /// Method declaring the error.
    pub method: String,

    /// Error definition name, e.g. `Unauthorized`.
    pub error: String,

    /// Request id to echo.
    #[arg(long)]
    pub id: Option<String>,

    /// Detail text for the `data` member.
    #[arg(long)]
    pub data: Option<String>,
}

pub fn run(codec: &Codec, args: &EncodeErrorArgs) -> anyhow::Result<String> {
    let err = codec
        .domain_error(&args.method, &args.error, args.data.clone())
        .with_context(|| format!("error schema of '{}' does not resolve", args.method))?
        .ok_or_else(|| anyhow!("method '{}' does not declare error '{}'", args.method, args.error))?;
    Ok(codec.encode_error(args.id.as_deref(), &err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(method: &str, error: &str) -> EncodeErrorArgs {
        EncodeErrorArgs {
            method: method.into(),
            error: error.into(),
            id: Some("3".into()),
            data: None,
        }
    }

    #[test]
    fn renders_declared_error() {
        let codec = crate::repo_codec();
        let text = run(&codec, &args("getseed", "Unauthorized")).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","id":"3","error":{"code":10001,"message":"Unauthorized"}}"#
        );
    }

    #[test]
    fn undeclared_error_is_refused() {
        let codec = crate::repo_codec();
        let err = run(&codec, &args("getseed", "FailedToSealBlock")).unwrap_err();
        assert!(err.to_string().contains("does not declare"));
    }
}
