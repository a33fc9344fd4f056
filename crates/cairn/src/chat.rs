// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cairn chat`: talk to one agent, either once or in a REPL.

use cairn_agent::{Agent, TurnOptions, TurnReply};
use cairn_core::CairnError;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::app::App;
use crate::commands::{excerpt, to_filter};

/// Options shared by one-shot and interactive chat.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub retrieval: Option<bool>,
    pub filter: Vec<(String, String)>,
    /// Save the conversation on exit, with these tags.
    pub save: bool,
    pub tags: Vec<String>,
}

impl ChatOptions {
    fn turn_options(&self) -> TurnOptions {
        TurnOptions {
            retrieval: self.retrieval,
            metadata_filter: to_filter(&self.filter),
        }
    }
}

/// Send one message and print the reply.
pub async fn run_once(
    app: &App,
    agent_name: &str,
    message: &str,
    options: &ChatOptions,
) -> Result<(), CairnError> {
    let agent = app.agents.get(agent_name)?;
    let reply = agent.run_turn(message, options.turn_options()).await?;
    print_reply(&reply);
    if options.save {
        save(app, &agent, &options.tags).await?;
    }
    Ok(())
}

/// Interactive loop. `/quit` exits, `/clear` resets history, `/save [tags]` saves.
pub async fn run_repl(app: &App, agent_name: &str, options: &ChatOptions) -> Result<(), CairnError> {
    let agent = app.agents.get(agent_name)?;
    let mut rl = DefaultEditor::new()
        .map_err(|e| CairnError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{} {}", "cairn chat with".bold(), agent.name().green().bold());
    if !agent.tool_names().is_empty() {
        println!("tools: {}", agent.tool_names().join(", ").dimmed());
    }
    if !agent.missing_tools().is_empty() {
        println!(
            "{}",
            format!("unavailable tools: {}", agent.missing_tools().join(", ")).yellow()
        );
    }
    println!("Type {} to exit.\n", "/quit".yellow());

    let prompt = format!("{}> ", agent.name().green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    "/quit" | "/exit" => break,
                    "/clear" => {
                        agent.clear_history().await;
                        println!("{}", "history cleared".dimmed());
                        continue;
                    }
                    _ => {}
                }
                if let Some(rest) = trimmed.strip_prefix("/save") {
                    let mut tags = options.tags.clone();
                    tags.extend(rest.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from));
                    if let Err(e) = save(app, &agent, &tags).await {
                        eprintln!("{}: {e}", "error".red());
                    }
                    continue;
                }

                match agent.run_turn(trimmed, options.turn_options()).await {
                    Ok(reply) => print_reply(&reply),
                    Err(e) => {
                        debug!(error = %e, "turn failed in repl");
                        eprintln!("{}", e.user_message().red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    if options.save {
        save(app, &agent, &options.tags).await?;
    }
    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn save(app: &App, agent: &Agent, tags: &[String]) -> Result<(), CairnError> {
    let messages = agent.history().await;
    if messages.is_empty() {
        println!("{}", "nothing to save".dimmed());
        return Ok(());
    }
    let mut metadata = serde_json::Map::new();
    metadata.insert("agent".to_string(), serde_json::Value::String(agent.name().to_string()));
    let id = app
        .conversations
        .save(messages, tags.iter().cloned(), metadata)
        .await?;
    println!("{} {id}", "saved conversation".green());
    Ok(())
}

fn print_reply(reply: &TurnReply) {
    for result in &reply.tool_results {
        let status = if result.success {
            "ok".green()
        } else {
            "failed".red()
        };
        println!(
            "{}",
            format!("  [tool {} {status}] {}", result.tool, excerpt(&result.to_message_content(), 120)).dimmed()
        );
    }
    if !reply.retrieved.is_empty() {
        let sources: Vec<&str> = reply.retrieved.iter().map(|h| h.document_name.as_str()).collect();
        println!("{}", format!("  [context: {}]", sources.join(", ")).dimmed());
    }
    println!("{}\n", reply.message);
}
