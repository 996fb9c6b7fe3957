//! # Rusty-Blog Binary
//!
//! Operator CLI: assembles the store chosen at compile time and prints
//! what a given viewer would see.

mod seed;

use std::sync::Arc;

use anyhow::{bail, Result};
use bl_config::Settings;
use bl_core::clock::SystemClock;
use bl_pages::{self as pages, AppState};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

#[cfg(feature = "db-sqlite")]
use bl_db_sqlite::SqliteBlogRepo;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("rusty-blog needs a store feature, e.g. `db-sqlite`");

/// rusty-blog command-line interface.
#[derive(Parser, Debug)]
#[command(name = "rusty-blog", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or upgrade the database schema.
    Migrate,
    /// Insert demo users, categories, posts and comments.
    Seed,
    /// Show the front page.
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// View as this user instead of anonymously
        #[arg(long = "as")]
        viewer: Option<String>,
    },
    /// Show one category's posts.
    Category {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "as")]
        viewer: Option<String>,
    },
    /// Show a user's profile page.
    Profile {
        username: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "as")]
        viewer: Option<String>,
    },
    /// Show a post with its comments.
    Post {
        id: Uuid,
        #[arg(long = "as")]
        viewer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(settings.log.filter.as_str()));
    if let Ok(path) = std::env::var(bl_config::CONFIG_PATH_VAR) {
        log::debug!("configuration overlaid from {path}");
    }

    // Connecting also applies pending migrations.
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteBlogRepo::with_max_connections(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await?;

    let state = AppState {
        repo: Box::new(repo),
        clock: Arc::new(SystemClock),
        posts_per_page: settings.blog.posts_per_page,
    };

    match cli.command {
        Commands::Migrate => {
            log::info!("schema is up to date at {}", settings.database.url);
        }
        Commands::Seed => seed::run(&state).await?,
        Commands::Feed { page, viewer } => {
            let viewer = resolve_viewer(&state, viewer).await?;
            print(&pages::index(&state, viewer, page).await?)?;
        }
        Commands::Category { slug, page, viewer } => {
            let viewer = resolve_viewer(&state, viewer).await?;
            print(&pages::category_posts(&state, viewer, &slug, page).await?)?;
        }
        Commands::Profile { username, page, viewer } => {
            let viewer = resolve_viewer(&state, viewer).await?;
            print(&pages::profile(&state, viewer, &username, page).await?)?;
        }
        Commands::Post { id, viewer } => {
            let viewer = resolve_viewer(&state, viewer).await?;
            print(&pages::post_detail(&state, viewer, id).await?)?;
        }
    }

    Ok(())
}

/// Stands in for the session lookup a web front end would do.
async fn resolve_viewer(state: &AppState, username: Option<String>) -> Result<Option<Uuid>> {
    let Some(username) = username else {
        return Ok(None);
    };
    match state.repo.get_user_by_username(&username).await? {
        Some(user) => Ok(Some(user.id)),
        None => bail!("no such user: {username}"),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
