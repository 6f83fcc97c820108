use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mgo_rs::{
    config::ConfigLoader,
    logging::init_logging,
    mongo::SharedClient,
    query::{translate_query_str, FormatMap},
};
use mongodb::bson::{Bson, Document};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "mgo", version, about = "Query MongoDB collections with URL-style filters")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "MGO_CONFIG")]
    config: Option<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the primary answers
    Ping,
    /// Print documents matching a query string
    Find(QueryArgs),
    /// Print the number of documents matching a query string
    Count(QueryArgs),
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Database name
    #[arg(short, long)]
    database: String,

    /// Collection name
    #[arg(short = 'C', long)]
    collection: String,

    /// Query string, e.g. "status=active&sort=-created&limit=10"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Field coercions as JSON, e.g. '{"age":"int"}'
    #[arg(short, long)]
    format: Option<String>,
}

impl QueryArgs {
    fn format_map(&self) -> Result<Option<FormatMap>> {
        self.format
            .as_deref()
            .map(FormatMap::from_json)
            .transpose()
            .context("Invalid --format")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load_from_file(cli.config.as_deref())
        .load_from_env()
        .build()?;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let guard = init_logging(&config.logging)?;

    let shared = SharedClient::new();
    let client = match shared.configure(config.mongo).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Unable to connect to MongoDB");
            // exit skips destructors; flush the file writer first
            drop(guard);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Ping => {
            client.ping().await?;
            println!("ok");
        }
        Command::Find(args) => {
            let format = args.format_map()?;
            let filter = translate_query_str(&args.query, format.as_ref())?;
            let documents: Vec<Document> = client
                .get_all(&filter, &args.collection, &args.database)
                .await?;
            let json: Vec<_> = documents
                .into_iter()
                .map(|d| Bson::Document(d).into_relaxed_extjson())
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::Count(args) => {
            let format = args.format_map()?;
            let filter = translate_query_str(&args.query, format.as_ref())?;
            let count = client
                .count(filter.to_document()?, &args.collection, &args.database)
                .await?;
            println!("{}", count);
        }
    }

    Ok(())
}
