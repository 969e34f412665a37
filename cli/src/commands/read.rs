//! Read command - fetch one report with its blocks.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Context, HumanReadable, format_timestamp, make_request, output, truncate};

/// Arguments for the read command.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Report ID
    pub id: String,

    /// Apply the report's selected dimensions to charts and tables
    #[arg(long)]
    pub projected: bool,
}

/// Stored filters of a report.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub time_period: String,
    #[serde(default)]
    pub selected_dimensions: Vec<String>,
}

/// A report as returned by GET /reports/{id}.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(default)]
    pub access_level: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One-line summary of a block for terminal display.
pub fn describe_block(block: &Value) -> String {
    let kind = block["type"].as_str().unwrap_or("?");
    match kind {
        "text" => truncate(block["content"].as_str().unwrap_or_default(), 60),
        "table" => {
            let columns = block["data"]["headers"].as_array().map_or(0, Vec::len);
            let rows = block["data"]["rows"].as_array().map_or(0, Vec::len);
            format!(
                "{} ({columns} columns, {rows} rows)",
                block["title"].as_str().unwrap_or_default()
            )
        }
        "chart" => format!(
            "{} [{}] ({} points)",
            block["title"].as_str().unwrap_or_default(),
            block["chartType"].as_str().unwrap_or("line"),
            block["data"].as_array().map_or(0, Vec::len)
        ),
        _ => String::new(),
    }
}

impl HumanReadable for Report {
    fn print_human(&self) {
        let title: &str = if self.title.is_empty() {
            "Untitled Report"
        } else {
            &self.title
        };
        println!("{}", title.green().bold());
        println!("{}", "=".repeat(80));
        println!("{}: {}", "ID".cyan(), self.id);
        println!("{}: {}", "Access".cyan(), self.access_level);
        println!("{}: {}", "Category".cyan(), self.category);
        if self.favorite {
            println!("{}: {}", "Favorite".cyan(), "yes".yellow());
        }
        println!("{}: {}", "Time period".cyan(), self.filters.time_period);
        if !self.filters.selected_dimensions.is_empty() {
            println!(
                "{}: {}",
                "Dimensions".cyan(),
                self.filters.selected_dimensions.join(", ")
            );
        }
        if let Some(updated) = &self.updated_at {
            println!("{}: {}", "Updated".cyan(), format_timestamp(updated));
        }
        println!();

        println!("{} ({})", "Blocks".cyan().bold(), self.blocks.len());
        println!("{}", "-".repeat(80));
        for (index, block) in self.blocks.iter().enumerate() {
            println!(
                "{:>3}  {:<10} {:<14} {}",
                index,
                block["type"].as_str().unwrap_or("?").yellow(),
                truncate(block["id"].as_str().unwrap_or_default(), 14).dimmed(),
                describe_block(block)
            );
        }
    }
}

/// Execute the read command.
pub async fn execute(ctx: &Context, args: ReadArgs) -> Result<()> {
    let mut request = ctx.client.get(ctx.url(&format!("/reports/{}", args.id)));
    if args.projected {
        request = request.query(&[("projected", "true")]);
    }
    let response: Report = make_request(request).await?;
    output(&response, ctx.human)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describes_each_block_kind() {
        assert_eq!(
            describe_block(&json!({"type": "text", "content": "<p>hi</p>"})),
            "<p>hi</p>"
        );
        assert_eq!(
            describe_block(&json!({
                "type": "table", "title": "Revenue by Time",
                "data": {"headers": ["Time", "Revenue"], "rows": [["Jan", "1"]]}
            })),
            "Revenue by Time (2 columns, 1 rows)"
        );
        assert_eq!(
            describe_block(&json!({"type": "chart", "title": "T", "chartType": "bar", "data": []})),
            "T [bar] (0 points)"
        );
        assert_eq!(describe_block(&json!({"type": "separator"})), "");
    }
}
