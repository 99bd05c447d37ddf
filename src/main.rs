use clap::Parser;
use research_assistant::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Research(args) => cli::research::run(args).await,
        Command::Interactive => cli::interactive::run().await,
    }
}
