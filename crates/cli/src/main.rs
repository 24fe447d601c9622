//! Support portal CLI - catalog management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List videos matching a search
//! portal-cli videos list --search invoice
//!
//! # Add a video (signs in as the admin first)
//! PORTAL_ADMIN_PASSWORD=... portal-cli videos add --email admin@polosys.com \
//!     --title "Printing invoices" --description "A4 and thermal" \
//!     --url "https://youtu.be/dQw4w9WgXcQ"
//!
//! # Import channel videos from a candidates file
//! portal-cli videos import --email admin@polosys.com --candidates channel.json --search gst
//!
//! # Forget the cached admin flag
//! portal-cli session logout
//! ```
//!
//! # Commands
//!
//! - `videos` - List, add, update, delete and import tutorial videos
//! - `queries` - List, add, update and delete saved queries
//! - `links` - List, add, update and delete reference links
//! - `session` - Show or clear the cached admin session
//!
//! Logs go to stderr; command output goes to stdout. Set
//! `PORTAL_LOG_FORMAT=json` for JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use support_portal::PortalConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(author, version, about = "Support portal catalog tools")]
struct Cli {
    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tutorial videos
    Videos {
        #[command(subcommand)]
        action: VideoAction,
    },
    /// Manage saved queries
    Queries {
        #[command(subcommand)]
        action: QueryAction,
    },
    /// Manage reference links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// Inspect or clear the cached admin session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

/// Credentials for commands that write to the store.
#[derive(Args)]
struct AdminArgs {
    /// Admin email address
    #[arg(short, long, env = "PORTAL_ADMIN_EMAIL")]
    email: String,

    /// Admin password
    #[arg(long, env = "PORTAL_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum VideoAction {
    /// List videos
    List {
        /// Case-insensitive filter on title and description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a video at the top of the catalog
    Add {
        #[command(flatten)]
        admin: AdminArgs,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        /// YouTube watch, embed or short URL
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Edit a video in place; omitted fields keep their value
    Update {
        #[command(flatten)]
        admin: AdminArgs,
        /// Video record id
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Remove a video
    Delete {
        #[command(flatten)]
        admin: AdminArgs,
        /// Video record id
        id: String,
    },
    /// Import channel videos that are not in the catalog yet
    Import {
        #[command(flatten)]
        admin: AdminArgs,
        /// JSON array of `{videoId, title, description, publishedAt}`
        #[arg(long)]
        candidates: PathBuf,
        /// Only import candidates matching this text
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

#[derive(Subcommand)]
enum QueryAction {
    /// List saved queries
    List {
        /// Case-insensitive filter on title and query text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Save a query at the top of the list
    Add {
        #[command(flatten)]
        admin: AdminArgs,
        #[arg(short, long)]
        title: String,
        /// Query text, stored verbatim
        #[arg(short, long)]
        query: String,
    },
    /// Edit a saved query in place; omitted fields keep their value
    Update {
        #[command(flatten)]
        admin: AdminArgs,
        /// Query record id
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Remove a saved query
    Delete {
        #[command(flatten)]
        admin: AdminArgs,
        /// Query record id
        id: String,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// List reference links
    List {
        /// Case-insensitive filter on title, URL and description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a link at the top of the list
    Add {
        #[command(flatten)]
        admin: AdminArgs,
        #[arg(short, long)]
        title: String,
        /// http or https URL
        #[arg(short, long)]
        url: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Edit a link in place; omitted fields keep their value
    Update {
        #[command(flatten)]
        admin: AdminArgs,
        /// Link record id
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a link
    Delete {
        #[command(flatten)]
        admin: AdminArgs,
        /// Link record id
        id: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show which view the portal would open at launch
    Show,
    /// Sign out and clear the cached admin flag
    Logout,
}

/// Initialize Sentry error tracking if `SENTRY_DSN` is configured.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Map tracing levels to Sentry events or breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "support_portal=info,portal_cli=info".into());

    let is_json = std::env::var("PORTAL_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = PortalConfig::from_env();
    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(support_portal::PortalError::from(e).into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &PortalConfig) -> Result<(), commands::CommandError> {
    let output = commands::Output { json: cli.json };

    match cli.command {
        Commands::Videos { action } => match action {
            VideoAction::List { search } => {
                commands::videos::list(config, output, search.as_deref()).await?;
            }
            VideoAction::Add {
                admin,
                title,
                description,
                url,
                category,
            } => {
                let draft = support_portal_core::VideoDraft {
                    title,
                    description,
                    url,
                    category,
                };
                commands::videos::add(config, &admin.into(), output, draft).await?;
            }
            VideoAction::Update {
                admin,
                id,
                title,
                description,
                url,
                category,
            } => {
                let changes = commands::videos::VideoChanges {
                    title,
                    description,
                    url,
                    category,
                };
                commands::videos::update(config, &admin.into(), output, &id, changes).await?;
            }
            VideoAction::Delete { admin, id } => {
                commands::videos::delete(config, &admin.into(), &id).await?;
            }
            VideoAction::Import {
                admin,
                candidates,
                search,
            } => {
                commands::videos::import(config, &admin.into(), &candidates, &search).await?;
            }
        },
        Commands::Queries { action } => match action {
            QueryAction::List { search } => {
                commands::queries::list(config, output, search.as_deref()).await?;
            }
            QueryAction::Add {
                admin,
                title,
                query,
            } => {
                let draft = support_portal_core::QueryDraft { title, query };
                commands::queries::add(config, &admin.into(), output, draft).await?;
            }
            QueryAction::Update {
                admin,
                id,
                title,
                query,
            } => {
                commands::queries::update(config, &admin.into(), output, &id, title, query)
                    .await?;
            }
            QueryAction::Delete { admin, id } => {
                commands::queries::delete(config, &admin.into(), &id).await?;
            }
        },
        Commands::Links { action } => match action {
            LinkAction::List { search } => {
                commands::links::list(config, output, search.as_deref()).await?;
            }
            LinkAction::Add {
                admin,
                title,
                url,
                description,
            } => {
                let draft = support_portal_core::LinkDraft {
                    title,
                    url,
                    description,
                };
                commands::links::add(config, &admin.into(), output, draft).await?;
            }
            LinkAction::Update {
                admin,
                id,
                title,
                url,
                description,
            } => {
                let changes = commands::links::LinkChanges {
                    title,
                    url,
                    description,
                };
                commands::links::update(config, &admin.into(), output, &id, changes).await?;
            }
            LinkAction::Delete { admin, id } => {
                commands::links::delete(config, &admin.into(), &id).await?;
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Show => commands::session::show(config).await?,
            SessionAction::Logout => commands::session::logout(config).await?,
        },
    }
    Ok(())
}

impl From<AdminArgs> for commands::Credentials {
    fn from(args: AdminArgs) -> Self {
        Self {
            email: args.email,
            password: secrecy::SecretString::from(args.password),
        }
    }
}
