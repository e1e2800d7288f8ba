// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Lowering options.

use brook_ir::runtime;
use brook_types::MethodSig;
use serde::Deserialize;
use thiserror::Error;

/// Knobs for one compilation. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoweringConfig {
    /// Static routine turning an arbitrary object into an `Iterator`.
    pub runtime_iterator: RuntimeRoutine,
    /// Blocks switch to the specialized emission mode.
    pub specialize_blocks: bool,
    /// Loops check the slot and stack invariant on the success path.
    pub verify_balance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeRoutine {
    pub owner: String,
    pub name: String,
}

impl Default for RuntimeRoutine {
    fn default() -> Self {
        Self {
            owner: runtime::DEFAULT_METHODS.to_string(),
            name: runtime::ITERATOR_COERCION.to_string(),
        }
    }
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            runtime_iterator: RuntimeRoutine::default(),
            specialize_blocks: true,
            verify_balance: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid lowering config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LoweringConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Signature of the configured iterator coercion.
    pub fn iterator_coercion(&self) -> MethodSig {
        runtime::iterator_coercion(&self.runtime_iterator.owner, &self.runtime_iterator.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(LoweringConfig::from_json("{}").unwrap(), LoweringConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = LoweringConfig::from_json(
            r#"{ "runtime_iterator": { "owner": "rt/Iter", "name": "of" }, "verify_balance": false }"#,
        )
        .unwrap();
        assert!(config.specialize_blocks);
        assert!(!config.verify_balance);
        let sig = config.iterator_coercion();
        assert_eq!(sig.owner, "rt/Iter");
        assert_eq!(sig.name, "of");
        assert!(sig.is_static);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = LoweringConfig::from_json(r#"{ "specialise_blocks": true }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid lowering config"));
    }
}
