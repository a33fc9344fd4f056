// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Cairn.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cairn configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CairnConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Where chunks and conversations are persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding backend settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Completion backend settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Vector search and reranking.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Document chunking for ingestion.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// External tool host.
    #[serde(default)]
    pub tool_host: ToolHostConfig,

    /// Agent definitions. Empty means the built-in default set.
    #[serde(default)]
    pub agents: Vec<AgentSpecConfig>,
}

impl CairnConfig {
    /// The agents to build: the configured list, or the defaults when none are configured.
    pub fn effective_agents(&self) -> Vec<AgentSpecConfig> {
        if self.agents.is_empty() {
            default_agents()
        } else {
            self.agents.clone()
        }
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "cairn".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite database for the relational vector backend.
    /// `None` or an empty string skips the probe and uses the JSON file backend.
    #[serde(default = "default_database_path")]
    pub database_path: Option<String>,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Chunk file used when the relational backend is unavailable.
    #[serde(default = "default_vector_json_path")]
    pub vector_json_path: String,

    /// Conversation log file.
    #[serde(default = "default_conversations_path")]
    pub conversations_path: String,
}

impl StorageConfig {
    /// The database path, if the relational backend should be probed.
    pub fn relational_path(&self) -> Option<&str> {
        self.database_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            vector_json_path: default_vector_json_path(),
            conversations_path: default_conversations_path(),
        }
    }
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("cairn").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from("data").join(name))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> Option<String> {
    Some(data_file("cairn.db"))
}

fn default_wal_mode() -> bool {
    true
}

fn default_vector_json_path() -> String {
    data_file("vector_store.json")
}

fn default_conversations_path() -> String {
    data_file("conversations.json")
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Dimension every stored vector must have.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Per-request timeout.
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_embedding_timeout() -> u64 {
    30
}

/// Completion backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Chat model name.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Default generation cap; agents may override.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Number of trailing history messages sent with each request.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Upper bound on completion/tool-dispatch rounds within one turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Per-request timeout.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_completion_model(),
            max_tokens: default_max_tokens(),
            history_window: default_history_window(),
            max_tool_rounds: default_max_tool_rounds(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_model() -> String {
    "llama3.2".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_history_window() -> usize {
    10
}

fn default_max_tool_rounds() -> usize {
    3
}

fn default_completion_timeout() -> u64 {
    120
}

/// How chunks lacking a filtered metadata field are treated by searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UntaggedPolicy {
    /// A chunk without the field matches any filter value.
    #[default]
    Visible,
    /// A chunk without the field never matches a filter on it.
    Isolated,
}

/// Retrieval and reranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Results returned when the caller does not specify a limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Enable the lexical rerank pass.
    #[serde(default = "default_rerank")]
    pub rerank: bool,

    /// Candidates fetched per requested result when reranking.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Weight of the vector similarity in the reranked score.
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// Weight of the query-term overlap in the reranked score.
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Treatment of chunks that lack a filtered metadata field.
    #[serde(default)]
    pub untagged: UntaggedPolicy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            rerank: default_rerank(),
            candidate_multiplier: default_candidate_multiplier(),
            vector_weight: default_vector_weight(),
            lexical_weight: default_lexical_weight(),
            untagged: UntaggedPolicy::default(),
        }
    }
}

fn default_limit() -> usize {
    5
}

fn default_rerank() -> bool {
    true
}

fn default_candidate_multiplier() -> usize {
    2
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_lexical_weight() -> f32 {
    0.3
}

/// Word-window chunking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkingConfig {
    /// Words per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

/// Built-in tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Interpreter executable for `execute_code`.
    #[serde(default = "default_code_interpreter")]
    pub code_interpreter: String,

    /// Arguments placed before the code string.
    #[serde(default = "default_code_args")]
    pub code_args: Vec<String>,

    /// Wall-clock limit for one execution.
    #[serde(default = "default_code_timeout")]
    pub code_timeout_secs: u64,

    /// Output beyond this many bytes is truncated.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            code_interpreter: default_code_interpreter(),
            code_args: default_code_args(),
            code_timeout_secs: default_code_timeout(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

fn default_code_interpreter() -> String {
    "python3".to_string()
}

fn default_code_args() -> Vec<String> {
    vec!["-I".to_string(), "-c".to_string()]
}

fn default_code_timeout() -> u64 {
    10
}

fn default_max_output_bytes() -> usize {
    16 * 1024
}

/// External tool host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolHostConfig {
    /// Discover hosted tools at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the tool host.
    #[serde(default = "default_tool_host_url")]
    pub url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_tool_host_timeout")]
    pub timeout_secs: u64,
}

impl Default for ToolHostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_tool_host_url(),
            api_key: None,
            timeout_secs: default_tool_host_timeout(),
        }
    }
}

fn default_tool_host_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_tool_host_timeout() -> u64 {
    30
}

/// A named agent persona.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSpecConfig {
    /// Unique agent name.
    pub name: String,

    /// Persona prompt.
    pub system_prompt: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Generation cap; falls back to `completion.max_tokens`.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Tool names bound to this agent, in order. `hosted:*` binds every discovered hosted tool.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Retrieve document context on every turn unless the caller overrides it.
    #[serde(default)]
    pub retrieval: bool,
}

fn default_temperature() -> f32 {
    0.7
}

/// The agent set used when no `[[agents]]` are configured.
pub fn default_agents() -> Vec<AgentSpecConfig> {
    let agent = |name: &str, prompt: &str, temperature: f32, tools: &[&str], retrieval: bool| {
        AgentSpecConfig {
            name: name.to_string(),
            system_prompt: prompt.to_string(),
            temperature,
            max_tokens: None,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            retrieval,
        }
    };

    vec![
        agent(
            "General Chat",
            "You are a friendly, capable assistant. Hold a natural conversation and help with \
             whatever the user is working on.",
            0.7,
            &[],
            false,
        ),
        agent(
            "RAG Assistant",
            "You answer questions from the user's documents. Cite the document each fact comes \
             from, and say plainly when the documents do not contain the answer.",
            0.5,
            &["search_documents", "recall_conversation"],
            true,
        ),
        agent(
            "Coder",
            "You are a careful programming assistant. Work out the requirements, plan, write \
             clean code, explain it, and suggest tests. Run Python to check your solutions, \
             preferring the standard library.",
            0.3,
            &["execute_code"],
            false,
        ),
        agent(
            "Research Assistant",
            "You research topics thoroughly. Break questions into parts, search the available \
             documents and past conversations, combine what you find, and present it in a \
             structured way with sources.",
            0.4,
            &["search_documents", "recall_conversation", "hosted:*"],
            false,
        ),
    ]
}
