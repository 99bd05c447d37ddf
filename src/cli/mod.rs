//! Command line interface
//!
//! - `serve`: HTTP API
//! - `research`: answer one question and exit
//! - `interactive`: REPL with follow-up questions

pub mod interactive;
pub mod output;
pub mod research;
pub mod serve;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::ResearchOptions;
use crate::infrastructure::logging;

/// Research Assistant - plan, search and synthesize answers to research questions
#[derive(Parser)]
#[command(name = "research-assistant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Research a single question and print the report
    Research(ResearchArgs),

    /// Ask questions interactively; later questions follow up on earlier ones
    Interactive,
}

#[derive(Args, Debug, Clone)]
pub struct ResearchArgs {
    /// The research question
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of sources to gather, clamped to the configured bounds
    #[arg(long, short = 'n')]
    pub sources: Option<usize>,
}

impl ResearchArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }

    pub fn options(&self) -> ResearchOptions {
        match self.sources {
            Some(count) => ResearchOptions::default().with_num_sources(count),
            None => ResearchOptions::default(),
        }
    }
}

/// Load `.env`, configuration and logging for a subcommand
pub fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Logging already initialized: {}", e);
    }

    Ok(config)
}
