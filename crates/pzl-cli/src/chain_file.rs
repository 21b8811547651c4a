//! Question/answer list files read by `pzl build`.
//!
//! `.json` files hold a bare array of strings. Anything else is parsed as
//! TOML with a single `chain` array:
//!
//! ```toml
//! chain = ["Question 1?", "Answer 1", "Congratulations!"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainFile {
    chain: Vec<String>,
}

/// Read the flat question/answer list from `path`.
pub fn load_chain(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading chain file: {}", path.display()))?;

    let items = if is_json(path) {
        serde_json::from_str::<Vec<String>>(&content)
            .with_context(|| format!("parsing JSON chain file: {}", path.display()))?
    } else {
        toml::from_str::<ChainFile>(&content)
            .with_context(|| format!("parsing TOML chain file: {}", path.display()))?
            .chain
    };

    tracing::debug!(path = %path.display(), items = items.len(), "loaded chain file");
    Ok(items)
}

/// Default artifact path: `puzzle.toml` -> `puzzle.pzl.json` in the same directory.
pub fn default_output(chain_path: &Path) -> PathBuf {
    let stem = chain_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "puzzle".to_string());
    chain_path.with_file_name(format!("{stem}.pzl.json"))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
