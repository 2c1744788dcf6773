//! # arpc-cli — Schema Set Tooling
//!
//! ## Subcommands
//!
//! - `check` — resolve every method of a schema set and compile its validators
//! - `describe` — print a method's parameter, result and error types
//! - `decode` — decode a request payload and print its native parameters
//! - `encode-error` — render a method's declared domain error as a response
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live in one module each.
//! - Handlers return their output as text so tests can assert on it.
//! - Objects decode into `Record`s; no host types are registered here.

use std::path::Path;

use anyhow::Context;
use arpc_codec::{Codec, ObjectCodecTable};

pub mod check;
pub mod decode;
pub mod describe;
pub mod encode_error;

/// Open the schema set in `dir` with record-based object decoding.
pub fn open_codec(dir: &Path) -> anyhow::Result<Codec> {
    Codec::from_schema_dir(dir, ObjectCodecTable::records())
        .with_context(|| format!("opening schema directory {}", dir.display()))
}

#[cfg(test)]
pub(crate) fn repo_codec() -> Codec {
    let mut dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    open_codec(&dir.join("schemas")).unwrap()
}
