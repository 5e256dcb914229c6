use std::path::Path;

use serde::Deserialize;
use surveyflow_engine::EngineConfig;

/// Contents of a `--config` file.
///
/// ```toml
/// [engine]
/// require_explicit_end = false
/// allow_answer_revision = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    pub engine: EngineConfig,
}

/// Read and parse a config TOML file. Returns a human-readable error string
/// on failure.
pub(crate) fn read_config(path: &Path) -> Result<CliConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}
