use serde::{Deserialize, Serialize};
use surveyflow_core::ValidatorOptions;

/// Engine policy, usually loaded from the `[engine]` table of a TOML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse activation unless some question or option explicitly ends the
    /// survey.
    pub require_explicit_end: bool,
    /// Allow replacing an answer until navigation has moved past its question.
    pub allow_answer_revision: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            require_explicit_end: true,
            allow_answer_revision: true,
        }
    }
}

impl EngineConfig {
    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            require_explicit_end: self.require_explicit_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"allow_answer_revision": false}"#).unwrap();
        assert!(config.require_explicit_end);
        assert!(!config.allow_answer_revision);
        assert!(config.validator_options().require_explicit_end);
    }
}
