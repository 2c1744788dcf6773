//! # arpc CLI Entry Point
//!
//! Parses arguments, installs logging and dispatches to handler modules.

use std::path::PathBuf;

use arpc_cli::{check, decode, describe, encode_error};
use clap::Parser;

/// Schema-driven JSON-RPC toolkit.
///
/// Checks a schema set, describes method signatures, decodes request
/// payloads and renders declared errors.
#[derive(Parser, Debug)]
#[command(name = "arpc", version, about)]
struct Cli {
    /// Directory holding `type/*.json`, method schemas and `methods.txt`.
    #[arg(long, global = true, env = "ARPC_SCHEMA_DIR", default_value = "schemas")]
    schema_dir: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve every method and compile its validators.
    Check(check::CheckArgs),
    /// Print a method signature.
    Describe(describe::DescribeArgs),
    /// Decode a request payload.
    Decode(decode::DecodeArgs),
    /// Render a declared domain error as a response.
    EncodeError(encode_error::EncodeErrorArgs),
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let codec = arpc_cli::open_codec(&cli.schema_dir)?;

    let output = match &cli.command {
        Commands::Check(args) => check::run(&codec, args)?,
        Commands::Describe(args) => describe::run(&codec, args)?,
        Commands::Decode(args) => {
            let raw = decode::read_payload(args)?;
            match decode::run(&codec, &raw) {
                Ok(text) => text,
                Err(response) => {
                    println!("{response}");
                    anyhow::bail!("request rejected");
                }
            }
        }
        Commands::EncodeError(args) => encode_error::run(&codec, args)?,
    };
    println!("{output}");
    Ok(())
}
