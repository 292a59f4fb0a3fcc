use clap::Parser;
use pn_core::Result;
use pn_scrapers::{build_fetcher, init_logging, FetchArgs, Importer};
use pn_storage::{create_storage, StorageKind};
use pn_web::handlers::ImportResponse;
use pn_web::{create_app, AppState};
use tracing::{error, info};

mod config;

use config::NotionArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Save Threads posts to a Notion database", long_about = None)]
pub struct Cli {
    /// Where records are written (notion, memory)
    #[arg(long, env = "PN_STORAGE", default_value = "notion")]
    storage: StorageKind,
    #[command(flatten)]
    notion: NotionArgs,
    #[command(flatten)]
    fetch: FetchArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Import a single post and print the outcome
    Import {
        url: String,
    },
}

fn build_importer(cli: &Cli) -> Result<Importer> {
    let notion = match cli.storage {
        StorageKind::Notion => Some(cli.notion.notion_config()?),
        StorageKind::Memory => None,
    };
    let store = create_storage(cli.storage, notion)?;
    let fetcher = build_fetcher(&cli.fetch)?;
    info!("🦗 Importer ready (fetch: {}, storage: {})", fetcher.name(), store.name());
    Ok(Importer::new(fetcher, store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging("info");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { host, port } => {
            let state = match build_importer(&cli) {
                Ok(importer) => AppState::new(importer),
                Err(e) => {
                    error!("⚠️ Starting without a working importer: {}", e);
                    AppState::unconfigured(&e)
                }
            };

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("🌐 Listening on http://{}", addr);
            axum::serve(listener, create_app(state)).await?;
        }
        Commands::Import { url } => {
            let importer = build_importer(&cli)?;
            let outcome = importer.import(url).await?;
            let response = ImportResponse::from(outcome);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
