use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Authors and books over REST")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve the HTTP API (default)
    Serve {
        /// Overrides `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit
    Migrate,
    /// Print every documented route
    Routes,
    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(
                env = ?settings.environment,
                host = %settings.server.host,
                port = settings.server.port,
                "bookshelf serve"
            );
            bookshelf_app::run(settings).await
        }
        Command::Migrate => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            let applied = bookshelf_app::migrate(&settings).await?;
            tracing::info!(applied, db = %settings.database.endpoint, "bookshelf migrate finished");
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Routes => {
            let registry = bookshelf_app::registry()?;
            for (method, path) in bookshelf_http::router::route_table(&registry) {
                println!("{method:<6} {path}");
            }
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
