//! Outline command - list the headings of a report.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{Context, HumanReadable, make_request, output};

/// Arguments for the outline command.
#[derive(Args, Debug)]
pub struct OutlineArgs {
    /// Report ID
    pub id: String,
}

/// One H1 or H2 heading.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub block_id: String,
    pub block_index: usize,
}

/// Headings in document order.
#[derive(Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Outline(pub Vec<Heading>);

impl HumanReadable for Outline {
    fn print_human(&self) {
        if self.0.is_empty() {
            println!("{}", "No headings".dimmed());
            return;
        }
        for heading in &self.0 {
            let indent = if heading.level > 1 { "  " } else { "" };
            let text = if heading.level == 1 {
                heading.text.bold()
            } else {
                heading.text.normal()
            };
            println!(
                "{indent}{} {}",
                text,
                format!("(block {})", heading.block_index).dimmed()
            );
        }
    }
}

/// Execute the outline command.
pub async fn execute(ctx: &Context, args: OutlineArgs) -> Result<()> {
    let request = ctx
        .client
        .get(ctx.url(&format!("/reports/{}/outline", args.id)));
    let response: Outline = make_request(request).await?;
    output(&response, ctx.human)
}
