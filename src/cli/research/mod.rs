//! Research command - answers one question and exits

use std::io::IsTerminal;

use super::ResearchArgs;
use super::output::Formatter;
use crate::api::types::ResearchResponse;
use crate::domain::ResearchResult;

pub async fn run(args: ResearchArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let orchestrator = crate::build_orchestrator(&config)?;

    let result = orchestrator
        .research_with(&args.query(), args.options())
        .await?;
    println!("{}", render(&result, args.json, std::io::stdout().is_terminal())?);

    Ok(())
}

fn render(result: &ResearchResult, json: bool, color: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(&ResearchResponse::from_domain(result))?)
    } else {
        Ok(Formatter::new(color).render(result))
    }
}
