use anyhow::{Context, Result};
use pzl_core::config::PuzzleSettings;
use std::path::Path;

/// Settings plus whether they came from a file.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: PuzzleSettings,
    pub from_file: bool,
}

/// Load `path`, falling back to defaults when it does not exist.
///
/// Runs before logging is initialised, so the fallback is reported by the
/// caller through `from_file`.
pub fn load_settings(path: &Path) -> Result<LoadedSettings> {
    if !path.exists() {
        return Ok(LoadedSettings {
            settings: PuzzleSettings::default(),
            from_file: false,
        });
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings: {}", path.display()))?;
    let settings = PuzzleSettings::from_toml(&content)
        .with_context(|| format!("parsing settings: {}", path.display()))?;
    Ok(LoadedSettings {
        settings,
        from_file: true,
    })
}
