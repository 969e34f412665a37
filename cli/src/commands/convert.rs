//! Convert command - switch a chart or table block to another view.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{Context, MutationResponse, make_request, output};

/// Arguments for the convert command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Report ID
    pub id: String,

    /// Block ID
    pub block: String,

    /// Target view: table, line, bar, pie or advanced
    pub to: String,
}

/// Execute the convert command.
pub async fn execute(ctx: &Context, args: ConvertArgs) -> Result<()> {
    let request = ctx
        .client
        .post(ctx.url(&format!(
            "/reports/{}/blocks/{}/convert",
            args.id, args.block
        )))
        .json(&json!({ "to": args.to }));
    let response: MutationResponse = make_request(request).await?;
    output(&response, ctx.human)
}
