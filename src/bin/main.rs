use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sakhi_api::{
    AppContext, AuthSettings, DatabaseConfig, UserStore, create_connection, ensure_schema,
};
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sakhi-api")]
#[command(about = "Sakhi women's health backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Server {
        /// Bind address, e.g. 0.0.0.0:5000
        #[arg(long, env = "SAKHI_BIND", default_value = "0.0.0.0:5000")]
        bind: String,
        #[arg(long, env = "SAKHI_DB_URL", default_value = "memory")]
        db_url: String,
        /// HMAC secret used to sign credentials
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
        /// Credential lifetime in hours
        #[arg(long, default_value_t = 7 * 24)]
        token_ttl_hours: u64,
    },
    /// Initialize the database
    Init {
        #[arg(long, env = "SAKHI_DB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Grant the ADMIN role to an existing account
    Promote {
        email: String,
        #[arg(long, env = "SAKHI_DB_URL", default_value = "memory")]
        db_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sakhi_api=info".parse()?)
                .add_directive("surrealdb=warn".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            bind,
            db_url,
            jwt_secret,
            token_ttl_hours,
        } => {
            let settings = AuthSettings::new(
                jwt_secret,
                Duration::from_secs(token_ttl_hours.saturating_mul(60 * 60)),
            )
            .context("invalid auth settings")?;

            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for REST server: {}", db_config.url);
            if db_config.url == "memory" {
                warn!("In-memory database: all data is lost on shutdown");
            }

            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;

            let app = sakhi_api::api::create_router(AppContext::new(db, &settings));

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("Server listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::Init { db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for initialization: {}", db_config.url);

            info!("Initializing database...");
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::Promote { email, db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;

            match UserStore::new(db).promote(&email).await? {
                Some(user) => println!("User '{}' ({}) is now an admin.", email, user.id),
                None => println!("No user found with email '{}'.", email),
            }
        }
    }

    Ok(())
}
