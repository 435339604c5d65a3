use clap::{Parser, Subcommand};
use guidebook_core::OutlineSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use guidebook::config::Config;
use guidebook::models::CreateGuideInput;
use guidebook::{api, db, render};

#[derive(Parser)]
#[command(name = "gbk")]
#[command(about = "Chapter and section outline editor for structured guides")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the guidebook server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000", env = "GUIDEBOOK_PORT")]
        port: u16,
    },
    /// Create an empty guide
    New {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List stored guides
    List,
    /// Print a guide's published outline as a tree
    Tree {
        guide: Uuid,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "guidebook=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so `list` and `tree` output stays clean on stdout
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<db::Database> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting guidebook server on port {}", port);

    let db = open_database(config)?;
    let app = api::create_router_with_config(db, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Guidebook server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => serve(&config, port).await?,
        Some(Commands::New { title, description }) => {
            let db = open_database(&config)?;
            let guide = db.create_guide(CreateGuideInput { title, description })?;
            println!("{}", guide.id);
        }
        Some(Commands::List) => {
            let db = open_database(&config)?;
            for summary in db.list_guides()? {
                println!(
                    "{}  {}  ({} chapters, {} sections)",
                    summary.guide.id,
                    summary.guide.title,
                    summary.chapter_count,
                    summary.section_count
                );
            }
        }
        Some(Commands::Tree { guide }) => {
            let db = open_database(&config)?;
            let outline = db.load_outline(guide)?;
            print!("{}", render::render_outline(&outline));
        }
        // Default: start server
        None => serve(&config, 3000).await?,
    }

    Ok(())
}
