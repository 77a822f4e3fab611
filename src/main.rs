use anyhow::Result;
use clap::{Parser, Subcommand};
use research_hub::config::Config;
use research_hub::mcp::McpServer;
use research_hub::ResearchHub;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Hub - MCP tools over PubMed, Semantic Scholar, arXiv, CrossRef and Reddit
#[derive(Parser, Debug)]
#[command(name = "research-hub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query scholarly databases through MCP tools", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress everything but errors in the log
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (stdio by default)
    Serve {
        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to in HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Search several databases at once and print the results as JSON
    Search {
        query: String,

        /// Comma-separated databases (default: pubmed,semantic_scholar,arxiv,crossref)
        #[arg(long, short, value_delimiter = ',')]
        databases: Vec<String>,

        /// Maximum results per database
        #[arg(long, short = 'n', default_value_t = 10)]
        max_results: usize,
    },

    /// Resolve a DOI, PMID, arXiv id or Semantic Scholar id
    Resolve {
        identifier: String,

        /// Identifier type (doi, pmid, arxiv, provider-native); detected when omitted
        #[arg(long)]
        id_type: Option<String>,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("research_hub={}", level)));

    // stdout carries the MCP stdio transport and command output
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&cli, &config);

    match cli.command {
        Commands::Serve { http, port, host } => {
            let hub = ResearchHub::from_config(&config)?;
            let server = McpServer::new(&hub)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Commands::Search {
            query,
            databases,
            max_results,
        } => {
            let hub = ResearchHub::from_config(&config)?;
            let databases = (!databases.is_empty()).then_some(databases);
            let result = hub
                .fanout()
                .search(&query, databases.as_deref(), max_results)
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Resolve {
            identifier,
            id_type,
        } => {
            let hub = ResearchHub::from_config(&config)?;
            let resolution = hub
                .resolver()
                .resolve(&identifier, id_type.as_deref())
                .await;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }

        Commands::Config => {
            print!("{}", config.to_redacted_toml()?);
        }
    }

    Ok(())
}
