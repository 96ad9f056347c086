use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use storefront::config::Config;
use storefront::notify::{LogHook, OrderHooks};
use storefront::{build_app, cli, db};

#[derive(Parser)]
#[command(name = "storefront", about = "Storefront REST backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create a user and print their invite code
    CreateUser {
        name: String,
        #[arg(long)]
        email: Option<String>,
        /// Grant staff (admin) rights
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,tower_http=info")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let hooks = OrderHooks::new().with(LogHook);
            let app = build_app(pool, config.secure_cookies, hooks).await?;

            let listener = TcpListener::bind(config.bind_addr).await?;
            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app).await?;
        }
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::CreateUser { name, email, admin } => {
            cli::create_user(&pool, &name, email.as_deref(), admin).await?;
        }
    }

    Ok(())
}
