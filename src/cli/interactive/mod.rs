//! Interactive command - a REPL where each question follows up on the last

use std::io::IsTerminal;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::output::Formatter;
use crate::domain::{ResearchError, ResearchOrchestrator, SessionId};

/// One parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    New,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();

    match line.to_lowercase().as_str() {
        "" => ReplCommand::Empty,
        "/quit" | "/exit" | "quit" | "exit" => ReplCommand::Quit,
        "/new" => ReplCommand::New,
        "/help" => ReplCommand::Help,
        _ => ReplCommand::Ask(line.to_string()),
    }
}

/// Tracks the session that follow-ups attach to
#[derive(Debug, Default)]
pub struct Conversation {
    session_id: Option<SessionId>,
}

impl Conversation {
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn reset(&mut self) {
        self.session_id = None;
    }

    /// Research the first question of a session, follow up on later ones
    pub async fn ask(
        &mut self,
        orchestrator: &ResearchOrchestrator,
        question: &str,
    ) -> Result<crate::domain::ResearchResult, ResearchError> {
        let result = match &self.session_id {
            Some(session_id) => orchestrator.follow_up(question, session_id).await,
            None => orchestrator.research(question).await,
        };

        match &result {
            Ok(result) => self.session_id = Some(result.session_id.clone()),
            // evicted or deleted sessions start over on the next question
            Err(ResearchError::SessionNotFound { .. }) => self.reset(),
            Err(_) => {}
        }

        result
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let orchestrator = crate::build_orchestrator(&config)?;
    let formatter = Formatter::new(std::io::stdout().is_terminal());

    let mut editor = DefaultEditor::new()?;
    let mut conversation = Conversation::default();

    println!(
        "{}",
        formatter.info("Research Assistant - ask a question, /new for a new session, /quit to exit")
    );

    loop {
        let prompt = if conversation.session_id().is_some() {
            "follow-up> "
        } else {
            "research> "
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use /quit to exit"));
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match parse_line(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => print_help(&formatter),
            ReplCommand::New => {
                conversation.reset();
                println!("{}", formatter.info("Started a new session"));
            }
            ReplCommand::Ask(question) => {
                editor.add_history_entry(question.as_str()).ok();
                debug!(question = %question, "Interactive question");

                match conversation.ask(&orchestrator, &question).await {
                    Ok(result) => println!("{}", formatter.render(&result)),
                    Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
                }
            }
        }
    }

    println!("{}", formatter.info("Goodbye!"));
    Ok(())
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Commands:"));
    println!("  <question>  research a question, or follow up on the current session");
    println!("  /new        start a new session");
    println!("  /help       show this help");
    println!("  /quit       exit");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::research::mock::{MockPlanner, MockRetriever, MockSynthesizer};
    use crate::domain::{OrchestratorConfig, ResearchPlan};
    use crate::infrastructure::session::InMemorySessionStore;

    fn orchestrator() -> ResearchOrchestrator {
        ResearchOrchestrator::new(
            Arc::new(MockPlanner::returning(ResearchPlan::new(vec!["qubits".to_string()], 5))),
            Arc::new(MockRetriever::live()),
            Arc::new(MockSynthesizer::working()),
            Arc::new(InMemorySessionStore::new()),
            OrchestratorConfig::default(),
        )
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), ReplCommand::Empty);
        assert_eq!(parse_line("/QUIT"), ReplCommand::Quit);
        assert_eq!(parse_line("exit"), ReplCommand::Quit);
        assert_eq!(parse_line("/new"), ReplCommand::New);
        assert_eq!(parse_line("/help"), ReplCommand::Help);
        assert_eq!(
            parse_line("  How is it used? "),
            ReplCommand::Ask("How is it used?".to_string())
        );
    }

    #[tokio::test]
    async fn test_conversation_follows_up() {
        let orchestrator = orchestrator();
        let mut conversation = Conversation::default();

        let first = conversation.ask(&orchestrator, "What is quantum computing?").await.unwrap();
        assert!(!first.is_follow_up);

        let second = conversation.ask(&orchestrator, "How is it used?").await.unwrap();
        assert!(second.is_follow_up);
        assert_eq!(second.session_id, first.session_id);

        let record = orchestrator.session(&first.session_id).await.unwrap();
        assert_eq!(record.turn_count(), 2);
    }

    #[tokio::test]
    async fn test_new_session_after_reset() {
        let orchestrator = orchestrator();
        let mut conversation = Conversation::default();

        let first = conversation.ask(&orchestrator, "quantum").await.unwrap();
        conversation.reset();
        let second = conversation.ask(&orchestrator, "fusion").await.unwrap();

        assert!(!second.is_follow_up);
        assert_ne!(second.session_id, first.session_id);
        assert_eq!(orchestrator.list_sessions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deleted_session_starts_over() {
        let orchestrator = orchestrator();
        let mut conversation = Conversation::default();

        let first = conversation.ask(&orchestrator, "quantum").await.unwrap();
        orchestrator.delete_session(&first.session_id).await.unwrap();

        let err = conversation.ask(&orchestrator, "more").await.unwrap_err();
        assert!(matches!(err, ResearchError::SessionNotFound { .. }));
        assert!(conversation.session_id().is_none());

        let next = conversation.ask(&orchestrator, "more").await.unwrap();
        assert!(!next.is_follow_up);
    }
}
