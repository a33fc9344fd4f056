// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Cairn configuration system.

use cairn_config::diagnostic::ConfigError;
use cairn_config::model::{CairnConfig, UntaggedPolicy};
use cairn_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with known fields across sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_cairn_config() {
    let toml = r#"
[app]
log_level = "debug"

[storage]
database_path = "/tmp/cairn-test.db"
wal_mode = false
vector_json_path = "/tmp/vectors.json"
conversations_path = "/tmp/conversations.json"

[embedding]
model = "all-minilm"
dimension = 384

[retrieval]
rerank = false
untagged = "isolated"

[tool_host]
enabled = true
url = "http://tools.local:9000"
api_key = "secret"

[[agents]]
name = "Coder"
system_prompt = "You write code"
temperature = 0.2
tools = ["execute_code"]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.storage.relational_path(), Some("/tmp/cairn-test.db"));
    assert!(!config.storage.wal_mode);
    assert_eq!(config.embedding.model, "all-minilm");
    assert_eq!(config.embedding.dimension, 384);
    assert!(!config.retrieval.rerank);
    assert_eq!(config.retrieval.untagged, UntaggedPolicy::Isolated);
    assert!(config.tool_host.enabled);
    assert_eq!(config.tool_host.api_key.as_deref(), Some("secret"));
    assert_eq!(config.agents.len(), 1);
    assert_eq!(config.agents[0].tools, vec!["execute_code"]);
    assert!(!config.agents[0].retrieval);
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.embedding.dimension, 768);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.retrieval.default_limit, 5);
    assert_eq!(config.retrieval.candidate_multiplier, 2);
    assert!(config.retrieval.rerank);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert!(!config.tool_host.enabled);
    assert!(config.agents.is_empty());
    assert_eq!(config.effective_agents().len(), 4);
}

/// An empty database path disables the relational probe.
#[test]
fn empty_database_path_disables_relational_backend() {
    let config = load_config_from_str("[storage]\ndatabase_path = \"\"\n").unwrap();
    assert_eq!(config.storage.relational_path(), None);
}

/// Unknown keys are rejected at the top level and inside sections.
#[test]
fn unknown_keys_are_rejected() {
    assert!(load_config_from_str("[telemetry]\nenabled = true\n").is_err());
    assert!(load_config_from_str("[embedding]\ndimesion = 5\n").is_err());
}

/// Unknown keys become diagnostics with a suggestion and valid key listing.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let errors = load_and_validate_str("[embedding]\ndimesion = 384\n").unwrap_err();
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            key == "dimesion"
                && suggestion.as_deref() == Some("dimension")
                && valid_keys.contains("timeout_secs")
        }
        _ => false,
    });
    assert!(found, "expected UnknownKey diagnostic, got: {errors:?}");
}

/// Wrong value types surface as InvalidType diagnostics.
#[test]
fn invalid_type_diagnostic() {
    let errors = load_and_validate_str("[embedding]\ndimension = \"big\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("dimension"))),
        "got: {errors:?}"
    );
}

/// Config that parses but violates constraints fails validation.
#[test]
fn load_and_validate_reports_validation_errors() {
    let toml = r#"
[[agents]]
name = "twin"
system_prompt = "a"

[[agents]]
name = "twin"
system_prompt = "b"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Diagnostics render through miette without panicking.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let errors = load_and_validate_str("[retrieval]\nrerenk = true\n").unwrap_err();
    let handler = GraphicalReportHandler::new();
    for error in &errors {
        let mut out = String::new();
        handler
            .render_report(&mut out, error as &dyn Diagnostic)
            .expect("render should succeed");
        assert!(out.contains("rerenk"));
    }
}

/// Local file plus `CAIRN_*` variables layer over defaults.
#[test]
fn env_vars_override_local_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "cairn.toml",
            r#"
[embedding]
dimension = 512

[tool_host]
url = "http://from-file:1"
"#,
        )?;
        jail.set_env("CAIRN_EMBEDDING_DIMENSION", "384");
        jail.set_env("CAIRN_TOOL_HOST_API_KEY", "from-env");

        let config: CairnConfig = load_config()?;
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.tool_host.url, "http://from-file:1");
        assert_eq!(config.tool_host.api_key.as_deref(), Some("from-env"));
        Ok(())
    });
}
