//! CLI entry point for the document graph client.
//!
//! Results are written to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use docgraph_client::{EdgeIndex, GraphClient};
use docgraph_core::config::ChainConfig;
use docgraph_core::{AccountName, CallContext, Checksum256, Name};

#[derive(Parser)]
#[command(name = "docgraph")]
#[command(about = "Create and query documents and edges in the on-chain document graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Contract account (otherwise read from config).
    #[arg(long, global = true, env = "DOCGRAPH_CONTRACT")]
    contract: Option<String>,

    /// Config file prefix (default: docgraph).
    #[arg(short, long, default_value = "docgraph", global = true)]
    config: String,

    /// Abort the command after this many seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a document from a JSON file of content groups.
    CreateDocument {
        #[arg(long)]
        creator: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Create a named edge between two documents.
    CreateEdge {
        #[arg(long)]
        creator: String,
        /// Hash of the source document.
        #[arg(long)]
        from: Checksum256,
        /// Hash of the target document.
        #[arg(long)]
        to: Checksum256,
        /// Edge name.
        #[arg(long)]
        name: String,
    },
    /// List edges leaving a document.
    EdgesFrom {
        hash: Checksum256,
        /// Only edges with this name.
        #[arg(long)]
        name: Option<String>,
    },
    /// List edges arriving at a document.
    EdgesTo {
        hash: Checksum256,
        /// Only edges with this name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the most recently created document.
    LastDocument,
    /// Show a document by hash.
    GetDocument { hash: Checksum256 },
}

#[derive(Serialize)]
struct TransactionOutput {
    transaction_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.json_logs {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let chain_config = ChainConfig::load(&cli.config)?;
    let contract = AccountName::from(
        cli.contract
            .clone()
            .unwrap_or_else(|| chain_config.contract.clone()),
    );
    let client = GraphClient::connect(&chain_config)?;

    let ctx = match cli.timeout_secs {
        Some(secs) => CallContext::with_timeout(Duration::from_secs(secs)),
        None => CallContext::new(),
    };

    // Ctrl-C cancels whatever call is in flight.
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });

    let output = match cli.command {
        Command::CreateDocument { creator, file } => {
            let created = client
                .create_document(&ctx, &contract, &creator.into(), &file)
                .await?;
            serde_json::to_string_pretty(&created)?
        }
        Command::CreateEdge {
            creator,
            from,
            to,
            name,
        } => {
            let transaction_id = client
                .create_edge(&ctx, &contract, &creator.into(), &from, &to, &name.into())
                .await?;
            serde_json::to_string_pretty(&TransactionOutput { transaction_id })?
        }
        Command::EdgesFrom { hash, name } => {
            let edges = fetch_edges(&client, &ctx, &contract, &hash, EdgeIndex::FromNode, name).await?;
            serde_json::to_string_pretty(&edges)?
        }
        Command::EdgesTo { hash, name } => {
            let edges = fetch_edges(&client, &ctx, &contract, &hash, EdgeIndex::ToNode, name).await?;
            serde_json::to_string_pretty(&edges)?
        }
        Command::LastDocument => {
            let doc = client.last_document(&ctx, &contract).await?;
            serde_json::to_string_pretty(&doc)?
        }
        Command::GetDocument { hash } => {
            let doc = client.document(&ctx, &contract, &hash).await?;
            serde_json::to_string_pretty(&doc)?
        }
    };

    println!("{output}");
    Ok(())
}

async fn fetch_edges(
    client: &GraphClient,
    ctx: &CallContext,
    contract: &AccountName,
    hash: &Checksum256,
    index: EdgeIndex,
    name: Option<String>,
) -> anyhow::Result<Vec<docgraph_core::Edge>> {
    let edges = match name {
        Some(name) => {
            client
                .edges_named(ctx, contract, hash, index, &Name::from(name))
                .await?
        }
        None => client.edges(ctx, contract, hash, index).await?,
    };
    Ok(edges)
}
