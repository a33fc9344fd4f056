// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: numeric ranges,
//! non-empty paths, and agent name uniqueness.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::CairnConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &CairnConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.embedding.dimension == 0 {
        errors.push(ConfigError::validation("embedding.dimension must be greater than 0"));
    }

    for (key, value) in [
        ("storage.vector_json_path", &config.storage.vector_json_path),
        ("storage.conversations_path", &config.storage.conversations_path),
        ("embedding.host", &config.embedding.host),
        ("completion.host", &config.completion.host),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }

    if config.completion.history_window == 0 {
        errors.push(ConfigError::validation(
            "completion.history_window must be at least 1",
        ));
    }

    let retrieval = &config.retrieval;
    if retrieval.default_limit == 0 {
        errors.push(ConfigError::validation("retrieval.default_limit must be at least 1"));
    }
    if retrieval.candidate_multiplier == 0 {
        errors.push(ConfigError::validation(
            "retrieval.candidate_multiplier must be at least 1",
        ));
    }
    for (key, weight) in [
        ("retrieval.vector_weight", retrieval.vector_weight),
        ("retrieval.lexical_weight", retrieval.lexical_weight),
    ] {
        if !(0.0..=1.0).contains(&weight) {
            errors.push(ConfigError::validation(format!(
                "{key} must be between 0.0 and 1.0, got {weight}"
            )));
        }
    }

    if config.chunking.chunk_size == 0 {
        errors.push(ConfigError::validation("chunking.chunk_size must be at least 1"));
    } else if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        errors.push(ConfigError::validation(format!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap, config.chunking.chunk_size
        )));
    }

    if config.tools.code_interpreter.trim().is_empty() {
        errors.push(ConfigError::validation("tools.code_interpreter must not be empty"));
    }

    if config.tool_host.enabled && config.tool_host.url.trim().is_empty() {
        errors.push(ConfigError::validation(
            "tool_host.url must be set when tool_host.enabled is true",
        ));
    }

    let mut seen_names = HashSet::new();
    for (i, agent) in config.agents.iter().enumerate() {
        if agent.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "agents[{i}].name must not be empty"
            )));
        } else if !seen_names.insert(agent.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate agent name `{}` in [[agents]] array",
                agent.name
            )));
        }

        if !(0.0..=2.0).contains(&agent.temperature) {
            errors.push(ConfigError::validation(format!(
                "agents[{i}].temperature must be between 0.0 and 2.0, got {}",
                agent.temperature
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AgentSpecConfig;

    fn spec(name: &str, temperature: f32) -> AgentSpecConfig {
        AgentSpecConfig {
            name: name.to_string(),
            system_prompt: "prompt".to_string(),
            temperature,
            max_tokens: None,
            tools: vec![],
            retrieval: false,
        }
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&CairnConfig::default()).is_ok());
    }

    #[test]
    fn zero_dimension_fails_validation() {
        let mut config = CairnConfig::default();
        config.embedding.dimension = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "embedding.dimension"));
    }

    #[test]
    fn overlap_not_smaller_than_size_fails() {
        let mut config = CairnConfig::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "chunk_overlap"));
    }

    #[test]
    fn weight_out_of_range_fails() {
        let mut config = CairnConfig::default();
        config.retrieval.lexical_weight = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "retrieval.lexical_weight"));
    }

    #[test]
    fn duplicate_agent_names_fail_validation() {
        let mut config = CairnConfig::default();
        config.agents = vec![spec("coder", 0.3), spec("coder", 0.5)];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "duplicate agent name `coder`"));
    }

    #[test]
    fn errors_are_collected_not_short_circuited() {
        let mut config = CairnConfig::default();
        config.embedding.dimension = 0;
        config.agents = vec![spec("", 3.0)];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn enabled_tool_host_requires_url() {
        let mut config = CairnConfig::default();
        config.tool_host.enabled = true;
        config.tool_host.url = " ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "tool_host.url"));
    }
}
