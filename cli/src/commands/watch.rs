//! Watch command - stream live updates of a report.
//!
//! Connects to the server's SSE endpoint and prints each event as it
//! arrives. Updates written with this CLI's own client id are skipped by the
//! server.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CliError, Context, HumanReadable, format_timestamp};

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Report ID
    pub id: String,

    /// Also print heartbeat events
    #[arg(long)]
    pub heartbeats: bool,
}

/// One server-sent event.
#[derive(Debug, Deserialize, Serialize)]
pub struct StreamEvent {
    pub event: String,
    pub data: Value,
}

impl HumanReadable for StreamEvent {
    fn print_human(&self) {
        let timestamp = self.data["timestamp"]
            .as_str()
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| format_timestamp(&ts.with_timezone(&chrono::Utc)))
            .unwrap_or_default();

        match self.event.as_str() {
            "report" => {
                let document = &self.data["document"];
                println!(
                    "{} {} {} ({} blocks)",
                    timestamp.dimmed(),
                    "UPDATE".green().bold(),
                    document["title"].as_str().unwrap_or_default(),
                    document["blocks"].as_array().map_or(0, Vec::len)
                );
            }
            "catchup" => println!(
                "{} {} {} update(s) missed, re-read the report",
                timestamp.dimmed(),
                "CATCHUP".yellow().bold(),
                self.data["events_missed"]
            ),
            other => println!("{} {}", timestamp.dimmed(), other.dimmed()),
        }
    }
}

/// Incremental parser for a `text/event-stream` body.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: String,
}

impl EventDecoder {
    /// Feeds a chunk of the body and returns every event it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(&chunk.replace("\r\n", "\n"));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let mut name = String::from("message");
    let mut data = Vec::new();
    for line in frame.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    let data = serde_json::from_str(&data).unwrap_or(Value::String(data));
    Some(StreamEvent { event: name, data })
}

/// Execute the watch command. Runs until the server closes the stream.
pub async fn execute(ctx: &Context, args: WatchArgs) -> Result<()> {
    let mut response = ctx
        .client
        .get(ctx.url(&format!("/reports/{}/events", args.id)))
        .query(&[("client", ctx.client_id.to_string())])
        .send()
        .await
        .map_err(CliError::from)?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CliError::Server {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    if ctx.human {
        println!(
            "{} {} {}",
            "Watching".green().bold(),
            args.id,
            "(Ctrl-C to stop)".dimmed()
        );
    }

    let mut decoder = EventDecoder::default();
    while let Some(chunk) = response.chunk().await.map_err(CliError::from)? {
        for event in decoder.push(&String::from_utf8_lossy(&chunk)) {
            if event.event == "heartbeat" && !args.heartbeats {
                continue;
            }
            if ctx.human {
                event.print_human();
            } else {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_events_split_across_chunks() {
        let mut decoder = EventDecoder::default();
        assert!(decoder.push("event: report\ndata: {\"type\":").is_empty());

        let events = decoder.push("\"report\"}\n\nevent: heartbeat\ndata: {}\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "report");
        assert_eq!(events[0].data["type"], "report");
        assert_eq!(events[1].event, "heartbeat");
    }

    #[test]
    fn comments_and_crlf_are_handled() {
        let mut decoder = EventDecoder::default();
        assert!(decoder.push(":\r\n\r\n").is_empty());

        let events = decoder.push("data: plain text\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, Value::String("plain text".to_string()));
    }
}
