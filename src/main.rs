use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agenda::cli::{AdminCommands, init_store, run_backup, run_init};
use agenda::config::{Integrations, ServerConfig};
use agenda::mail::{LogMailer, Mailer, SmtpMailer};
use agenda::scheduling::today;
use agenda::server::{AppState, create_router};
use agenda::store::Store;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "A booking server for school rooms and equipment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database, uploads and backups
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Public base URL for external access (e.g., "https://agenda.example.com").
        /// Used for links sent by mail and OAuth redirects. Defaults to http://<host>:<port>.
        #[arg(long)]
        public_base_url: Option<String>,

        /// Lifetime of login sessions
        #[arg(long, default_value = "12")]
        session_ttl_hours: i64,
    },
}

async fn serve(config: ServerConfig, integrations: Integrations) -> anyhow::Result<()> {
    let store = init_store(&config.data_dir, &integrations)?;
    if !store.has_superadmin()? {
        bail!("Server not initialized. Run 'agenda admin init' first to create the super admin.");
    }
    // Brings databases created by older releases up to the current schema
    store.initialize()?;

    for dir in ["uploads/perfil", "uploads/logos", "backups"] {
        fs::create_dir_all(config.data_dir.join(dir))?;
    }

    let expired = store.expire_overdue_assinaturas(today())?;
    if expired > 0 {
        info!("Marked {expired} overdue subscriptions as expired");
    }

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_settings(&integrations.mail)? {
        Some(smtp) => {
            info!(
                server = integrations.mail.server.as_deref().unwrap_or_default(),
                port = integrations.mail.port,
                "delivering mail over SMTP"
            );
            Arc::new(smtp)
        }
        None => {
            warn!("MAIL_SERVER is not set; outgoing mail is written to the log");
            Arc::new(LogMailer::new(integrations.mail.default_sender.clone()))
        }
    };

    let state = Arc::new(AppState::new(Arc::new(store), mailer, &config, &integrations));
    if state.stripe.is_none() {
        info!("Stripe is not configured; online checkout is disabled");
    }

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("agenda=info".parse()?))
        .init();

    let cli = Cli::parse();
    let integrations = Integrations::from_env();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive, &integrations)?;
            }
            AdminCommands::Backup { data_dir } => {
                run_backup(data_dir, &integrations)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            public_base_url,
            session_ttl_hours,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: PathBuf::from(data_dir),
                public_base_url,
                session_ttl_hours,
            };
            serve(config, integrations).await?;
        }
    }

    Ok(())
}
