//! Delete command - remove a block from a report.

use anyhow::Result;
use clap::Args;

use super::{Context, MutationResponse, make_request, output};

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Report ID
    pub id: String,

    /// Block ID
    pub block: String,
}

/// Execute the delete command.
pub async fn execute(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let request = ctx
        .client
        .delete(ctx.url(&format!("/reports/{}/blocks/{}", args.id, args.block)));
    let response: MutationResponse = make_request(request).await?;
    output(&response, ctx.human)
}
