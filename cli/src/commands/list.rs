//! List command - show every report, grouped as in the sidebar.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{Context, HumanReadable, make_request, output};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {}

/// One sidebar entry.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReportEntry {
    pub id: String,
    pub title: String,
}

/// Reports split into sidebar sections.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroups {
    #[serde(default)]
    pub favorites: Vec<ReportEntry>,
    #[serde(default)]
    pub my_reports: Vec<ReportEntry>,
    #[serde(default)]
    pub shared_with_me: Vec<ReportEntry>,
}

/// Response from GET /reports. Full documents are not kept.
#[derive(Debug, Deserialize, Serialize)]
pub struct ListResponse {
    pub groups: ReportGroups,
}

fn print_section(name: &str, entries: &[ReportEntry]) {
    println!("{} ({})", name.cyan().bold(), entries.len());
    if entries.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for entry in entries {
        println!("  {}  {}", entry.id.yellow(), entry.title);
    }
}

impl HumanReadable for ListResponse {
    fn print_human(&self) {
        println!("{}", "Reports".green().bold());
        println!("{}", "=".repeat(80));
        print_section("Favorites", &self.groups.favorites);
        print_section("My Reports", &self.groups.my_reports);
        print_section("Shared with me", &self.groups.shared_with_me);
    }
}

/// Execute the list command.
pub async fn execute(ctx: &Context, _args: ListArgs) -> Result<()> {
    let request = ctx.client.get(ctx.url("/reports"));
    let response: ListResponse = make_request(request).await?;
    output(&response, ctx.human)
}
