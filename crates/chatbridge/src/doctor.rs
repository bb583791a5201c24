// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatbridge doctor` command implementation.
//!
//! Runs diagnostic checks against the environment: configuration, the chat
//! database, the external sender program, and the notification webhook.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chatbridge_config::ChatBridgeConfig;
use chatbridge_core::BridgeError;
use chatbridge_store::{queries, ChatDatabase};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `chatbridge doctor` command. With `plain`, disables colored output.
pub async fn run_doctor(config: &ChatBridgeConfig, plain: bool) -> Result<(), BridgeError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config),
        check_auth(config),
        check_database(&config.store.database_path).await,
        check_sender(&config.send.sender_program),
        check_webhook(config).await,
        check_memory_baseline(),
    ];

    println!();
    println!("  chatbridge doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// The loaded configuration still passes validation.
fn check_config(config: &ChatBridgeConfig) -> CheckResult {
    let start = Instant::now();
    match chatbridge_config::validation::validate_config(config) {
        Ok(()) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Serving needs a shared secret.
fn check_auth(config: &ChatBridgeConfig) -> CheckResult {
    let start = Instant::now();
    match config.server.auth_token {
        Some(_) => CheckResult::new("Auth token", CheckStatus::Pass, "configured", start),
        None => CheckResult::new(
            "Auth token",
            CheckStatus::Warn,
            "not set (serve will refuse to start)",
            start,
        ),
    }
}

/// The chat database opens read-only and yields a starting watermark.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = chatbridge_store::expand_home(db_path);

    let db = match ChatDatabase::open_read_only(&path).await {
        Ok(db) => db,
        Err(e) => {
            return CheckResult::new("Chat database", CheckStatus::Fail, e.to_string(), start);
        }
    };

    match queries::messages::latest_timestamp(&db).await {
        Ok(rows) if rows.len() == 1 => CheckResult::new(
            "Chat database",
            CheckStatus::Pass,
            format!("readable (watermark {})", rows[0]),
            start,
        ),
        Ok(rows) => CheckResult::new(
            "Chat database",
            CheckStatus::Fail,
            format!("no starting watermark ({} rows)", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "Chat database",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

/// Resolve a program name the way a shell would: paths as-is, bare names
/// against `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|p| p.is_file())
    })
}

fn check_sender(program: &str) -> CheckResult {
    let start = Instant::now();
    match find_program(program) {
        Some(path) => CheckResult::new(
            "Sender program",
            CheckStatus::Pass,
            path.display().to_string(),
            start,
        ),
        None => CheckResult::new(
            "Sender program",
            CheckStatus::Fail,
            format!("`{program}` not found"),
            start,
        ),
    }
}

async fn check_webhook(config: &ChatBridgeConfig) -> CheckResult {
    let start = Instant::now();
    let Some(url) = &config.notify.webhook_url else {
        return CheckResult::new(
            "Notify webhook",
            CheckStatus::Pass,
            "not configured (notifications logged)",
            start,
        );
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.notify.timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::new(
                "Notify webhook",
                CheckStatus::Fail,
                format!("HTTP client error: {e}"),
                start,
            );
        }
    };

    match client.head(url).send().await {
        Ok(_) => CheckResult::new("Notify webhook", CheckStatus::Pass, "reachable", start),
        Err(e) => {
            let msg = if e.is_timeout() {
                format!("timeout ({}s)", config.notify.timeout_secs)
            } else if e.is_connect() {
                "connection refused".to_string()
            } else {
                format!("error: {e}")
            };
            CheckResult::new("Notify webhook", CheckStatus::Warn, msg, start)
        }
    }
}

/// Memory baseline via jemalloc.
fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}
