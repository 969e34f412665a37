//! Move command - reorder a block by index.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{Context, MutationResponse, make_request, output};

/// Arguments for the move command.
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Report ID
    pub id: String,

    /// Current index of the block
    pub from: usize,

    /// Destination index
    pub to: usize,
}

/// Execute the move command.
pub async fn execute(ctx: &Context, args: MoveArgs) -> Result<()> {
    let request = ctx
        .client
        .post(ctx.url(&format!("/reports/{}/blocks/move", args.id)))
        .json(&json!({ "from": args.from, "to": args.to }));
    let response: MutationResponse = make_request(request).await?;
    output(&response, ctx.human)
}
