// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cairn doctor`: check the vector backend and every external collaborator.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use cairn_core::types::HealthStatus;
use cairn_core::{CairnError, PluginAdapter};
use colored::Colorize;

use crate::app::App;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

pub async fn run_doctor(app: &App, plain: bool) -> Result<(), CairnError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(app).await;

    println!();
    println!("  cairn doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        let ms = result.duration.as_millis();
        let label = match (&result.status, use_color) {
            (CheckStatus::Pass, true) => "✓".green().to_string(),
            (CheckStatus::Warn, true) => "!".yellow().to_string(),
            (CheckStatus::Fail, true) => "✗".red().to_string(),
            (CheckStatus::Pass, false) => "[OK]  ".to_string(),
            (CheckStatus::Warn, false) => "[WARN]".to_string(),
            (CheckStatus::Fail, false) => "[FAIL]".to_string(),
        };
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("    {label} {:<20} {} ({ms}ms)", result.name, result.message);
    }

    println!();
    match issues {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();
    Ok(())
}

pub async fn collect_checks(app: &App) -> Vec<CheckResult> {
    let mut results = vec![check_store(app).await];
    results.push(check_adapter("Embedding", app.adapters.embedder.as_ref()).await);
    results.push(check_adapter("Completion", app.adapters.completion.as_ref()).await);
    match &app.adapters.tool_host {
        Some(host) => results.push(check_adapter("Tool host", host.as_ref()).await),
        None => results.push(CheckResult {
            name: "Tool host".to_string(),
            status: CheckStatus::Pass,
            message: "disabled".to_string(),
            duration: Duration::ZERO,
        }),
    }
    results.push(check_agents(app));
    results
}

async fn check_store(app: &App) -> CheckResult {
    let start = Instant::now();
    let backend = app.store.backend();
    let wanted_sqlite = app.config.storage.relational_path().is_some();
    let (status, message) = match app.store.stats().await {
        Ok(stats) if backend == "json" && wanted_sqlite => (
            CheckStatus::Warn,
            format!("fell back to JSON file ({} chunks)", stats.total_chunks),
        ),
        Ok(stats) => (
            CheckStatus::Pass,
            format!("{backend} backend, {} chunks", stats.total_chunks),
        ),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: "Vector store".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

async fn check_adapter<A: PluginAdapter + ?Sized>(name: &str, adapter: &A) -> CheckResult {
    let start = Instant::now();
    let (status, message) = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, format!("{} reachable", adapter.name())),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: name.to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

fn check_agents(app: &App) -> CheckResult {
    let start = Instant::now();
    let mut missing = Vec::new();
    for name in app.agents.names() {
        if let Ok(agent) = app.agents.get(name)
            && !agent.missing_tools().is_empty()
        {
            missing.push(format!("{name}: {}", agent.missing_tools().join(", ")));
        }
    }
    let (status, message) = if missing.is_empty() {
        (CheckStatus::Pass, format!("{} agents", app.agents.len()))
    } else {
        (CheckStatus::Warn, format!("missing tools ({})", missing.join("; ")))
    };
    CheckResult {
        name: "Agents".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}
