use std::error::Error;
use std::io::IsTerminal;

use clap::Parser;
use dotenv::dotenv;
use gh_search::{render_table, Args, Command, Config, GitHubSearcher, ReposArgs, Searcher};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Logs go to stderr so JSON output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();
    let config = Config::resolve(args.hostname.clone(), args.token.clone());
    debug!("Searching {}", config.host);

    let outcome = match &args.command {
        Command::Repos(repos) => run_repos(&config, repos).await,
    };
    if let Err(e) = &outcome {
        error!("Search failed: {}", e);
    }
    outcome
}

async fn run_repos(config: &Config, args: &ReposArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let query = args.to_query()?;
    let searcher = GitHubSearcher::from_config(config)?;
    let stdout_tty = std::io::stdout().is_terminal();

    if args.web {
        let url = searcher.url(&query)?;
        if stdout_tty {
            eprintln!("Open {} in your browser.", url);
        }
        println!("{}", url);
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message(format!("Searching repositories for '{}'", query.search_terms()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = searcher.search(&query).await;
    spinner.finish_and_clear();
    let result = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.items)?);
    } else {
        print!("{}", render_table(&result, stdout_tty));
    }
    Ok(())
}
