//! Command implementations for the report CLI.
//!
//! Each command module provides:
//! - Args struct for clap argument parsing
//! - execute() function that performs the command
//! - Human-readable and JSON output formatting

pub mod convert;
pub mod delete;
pub mod init;
pub mod insert;
pub mod list;
pub mod outline;
pub mod read;
pub mod reorder;
pub mod watch;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header that tags writes with the caller's client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Common error type for HTTP requests.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Connection settings shared by every command.
pub struct Context {
    pub client: reqwest::Client,
    pub base_url: String,
    pub client_id: Uuid,
    pub human: bool,
}

impl Context {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Build an HTTP client that identifies itself with `client_id`.
pub fn build_client(client_id: Uuid) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&client_id.to_string())
        .map_err(|e| anyhow::anyhow!("Invalid client id: {}", e))?;
    headers.insert(CLIENT_ID_HEADER, value);

    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

/// Print output in JSON or human-readable format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}

/// Make an HTTP request and handle common error cases.
pub async fn make_request<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CliError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(CliError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Response to every block mutation.
#[derive(Debug, Deserialize, Serialize)]
pub struct MutationResponse {
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<String>,
}

impl HumanReadable for MutationResponse {
    fn print_human(&self) {
        use colored::Colorize;

        if self.applied {
            println!("{}", "Applied".green().bold());
        } else {
            println!(
                "{} {}",
                "Not applied".yellow().bold(),
                "(read-only report or nothing to change)".dimmed()
            );
        }
        for id in &self.created {
            println!("  {} {}", "Created:".cyan(), id);
        }
    }
}

/// Format a timestamp for human display.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string for display, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Home & Garden sales", 10), "Home &...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn context_joins_paths() {
        let ctx = Context {
            client: reqwest::Client::new(),
            base_url: "http://localhost:3000/".to_string(),
            client_id: Uuid::nil(),
            human: false,
        };
        assert_eq!(ctx.url("/reports"), "http://localhost:3000/reports");
    }
}
