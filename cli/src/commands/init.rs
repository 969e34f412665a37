//! Init command - create the sample reports on an empty server.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{Context, HumanReadable, make_request, output};

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Response from POST /reports/init.
#[derive(Debug, Deserialize, Serialize)]
pub struct InitResponse {
    pub created: Vec<String>,
}

impl HumanReadable for InitResponse {
    fn print_human(&self) {
        if self.created.is_empty() {
            println!("{}", "Reports already exist, nothing created".yellow());
            return;
        }
        println!("{} {} report(s)", "Created".green().bold(), self.created.len());
        for id in &self.created {
            println!("  {}", id);
        }
    }
}

/// Execute the init command.
pub async fn execute(ctx: &Context, _args: InitArgs) -> Result<()> {
    let request = ctx
        .client
        .post(ctx.url("/reports/init"))
        .json(&serde_json::json!({}));
    let response: InitResponse = make_request(request).await?;
    output(&response, ctx.human)
}
