//! Command-line client for the report server.
//!
//! Commands:
//! - list: Reports grouped as in the sidebar
//! - read: One report with its blocks
//! - outline: Heading outline of a report
//! - init: Create the sample reports
//! - insert, delete, move, convert: Block operations
//! - watch: Stream live updates
//!
//! Configuration via environment:
//! - REPORT_URL: Base URL of the report server (default: http://localhost:3000)
//! - REPORT_CLIENT_ID: Client id sent with every request (default: random)

mod commands;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use commands::{
    Context, convert::ConvertArgs, delete::DeleteArgs, init::InitArgs, insert::InsertArgs,
    list::ListArgs, outline::OutlineArgs, read::ReadArgs, reorder::MoveArgs, watch::WatchArgs,
};

/// Report editor CLI
///
/// Read and edit block-based reports from the command line. Prints JSON by
/// default; use --human for formatted output.
#[derive(Parser)]
#[command(name = "report")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// Report server URL
    #[arg(
        long,
        env = "REPORT_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    url: String,

    /// Client id that tags this CLI's writes
    #[arg(long, env = "REPORT_CLIENT_ID", global = true)]
    client_id: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List reports
    List(ListArgs),

    /// Read a report
    Read(ReadArgs),

    /// Show the heading outline of a report
    Outline(OutlineArgs),

    /// Create the sample reports if none exist
    Init(InitArgs),

    /// Insert a block
    Insert(InsertArgs),

    /// Delete a block
    Delete(DeleteArgs),

    /// Move a block to another position
    #[command(name = "move")]
    Move(MoveArgs),

    /// Convert a chart or table block to another view
    Convert(ConvertArgs),

    /// Watch a report for live updates
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let client_id = cli.client_id.unwrap_or_else(Uuid::new_v4);
    let client = match commands::build_client(client_id) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let ctx = Context {
        client,
        base_url: cli.url,
        client_id,
        human: cli.human,
    };

    let result = match cli.command {
        Commands::List(args) => commands::list::execute(&ctx, args).await,
        Commands::Read(args) => commands::read::execute(&ctx, args).await,
        Commands::Outline(args) => commands::outline::execute(&ctx, args).await,
        Commands::Init(args) => commands::init::execute(&ctx, args).await,
        Commands::Insert(args) => commands::insert::execute(&ctx, args).await,
        Commands::Delete(args) => commands::delete::execute(&ctx, args).await,
        Commands::Move(args) => commands::reorder::execute(&ctx, args).await,
        Commands::Convert(args) => commands::convert::execute(&ctx, args).await,
        Commands::Watch(args) => commands::watch::execute(&ctx, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
