//! Insert command - add a placeholder block to a report.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{Context, MutationResponse, make_request, output};

/// Arguments for the insert command.
#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Report ID
    pub id: String,

    /// Block kind: text, table, chart or separator
    pub kind: String,

    /// Position of the new block (default: end of report)
    #[arg(long)]
    pub at: Option<usize>,
}

#[derive(Debug, Serialize)]
struct InsertRequest<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

/// Execute the insert command.
pub async fn execute(ctx: &Context, args: InsertArgs) -> Result<()> {
    let body = InsertRequest {
        kind: &args.kind,
        index: args.at,
    };
    let request = ctx
        .client
        .post(ctx.url(&format!("/reports/{}/blocks", args.id)))
        .json(&body);
    let response: MutationResponse = make_request(request).await?;
    output(&response, ctx.human)
}
