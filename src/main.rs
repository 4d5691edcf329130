//! birdwatch CLI - browser-driven Twitter/X data extraction.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use birdwatch::config::Config;
use birdwatch::features::{read_replies, read_tweet, search, trending, user_posts};
use birdwatch::harness::{self, Envelope};
use birdwatch::session::auth;

/// birdwatch - extract structured data from Twitter/X through a real browser.
///
/// Each subcommand reads one JSON request from stdin and writes one JSON
/// envelope to stdout; logs go to stderr.
#[derive(Parser)]
#[command(name = "birdwatch")]
#[command(about = "Browser-driven Twitter/X data extraction")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List trending topics (stdin: {"count"?})
    Trending,

    /// Search tweets (stdin: {"query", "count"?, "tab"?})
    Search,

    /// Read a user's timeline (stdin: {"username", "count"?, "tab"?})
    UserPosts,

    /// Read a single tweet (stdin: {"tweet"})
    ReadTweet,

    /// Read replies under a tweet (stdin: {"tweet", "count"?})
    ReadReplies,

    /// Interactive login into the persistent profile (run once, locally)
    Login,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing. Stdout is reserved for the envelope.
    let filter = if cli.verbose {
        EnvFilter::new("birdwatch=debug,info")
    } else {
        EnvFilter::new("birdwatch=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            let err = anyhow::Error::from(err);
            tracing::error!(error = %err, "Configuration failed");
            harness::emit::<()>(&Envelope::failure(
                format!("{err:#}"),
                Some(harness::error_info(&err)),
            ));
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Trending => harness::run(|request| trending::run(&config, request)).await,
        Commands::Search => harness::run(|request| search::run(&config, request)).await,
        Commands::UserPosts => harness::run(|request| user_posts::run(&config, request)).await,
        Commands::ReadTweet => harness::run(|request| read_tweet::run(&config, request)).await,
        Commands::ReadReplies => harness::run(|request| read_replies::run(&config, request)).await,
        Commands::Login => run_login(&config).await,
    }
}

async fn run_login(config: &Config) -> ExitCode {
    match auth::login(config).await {
        Ok(marker) => {
            eprintln!("Login recorded at {}", marker.logged_in_at);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Login failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
