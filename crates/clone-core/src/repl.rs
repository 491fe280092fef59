//! ============================================================================
//! REPL Driver - Interactive question/answer loop
//! ============================================================================
//! Reads one line per iteration, exits on the sentinel phrase, otherwise
//! dispatches the line and prints the reply. A failed turn prints an error
//! and the loop keeps running.
//! ============================================================================

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::completion::CompletionApi;
use crate::dispatcher::PromptDispatcher;
use crate::memory::MemoryStore;
use crate::session::ConversationSession;

pub const PROMPT: &str = "Please enter your question (or type 'thank you clone' to exit): ";

/// Typed (case-insensitively) to end the session
pub const EXIT_SENTINEL: &str = "thank you clone";

pub const FAREWELL: &str = "You're welcome! Goodbye!";
pub const SHUTDOWN_NOTICE: &str = "*SHUTTING DOWN*";

/// Whether a raw input line is the exit sentinel
pub fn is_exit_command(input: &str) -> bool {
    input.trim().to_lowercase() == EXIT_SENTINEL
}

/// Per-turn flags forwarded to the dispatcher on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnOptions {
    pub clear_messages: bool,
    pub self_aware: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed the sentinel phrase
    Sentinel,
    /// Input closed (EOF)
    EndOfInput,
}

/// Outcome of a REPL run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplSummary {
    pub turns: usize,
    pub failed_turns: usize,
    pub exit: ExitReason,
}

/// Drives the chat loop over any line source and output sink
pub struct ReplDriver<S, C> {
    dispatcher: PromptDispatcher,
    memory_store: S,
    completion_api: C,
    session: ConversationSession,
    options: TurnOptions,
}

impl<S: MemoryStore, C: CompletionApi> ReplDriver<S, C> {
    pub fn new(dispatcher: PromptDispatcher, memory_store: S, completion_api: C) -> Self {
        Self {
            dispatcher,
            memory_store,
            completion_api,
            session: ConversationSession::new(),
            options: TurnOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TurnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn completion_api(&self) -> &C {
        &self.completion_api
    }

    /// Run until the sentinel is typed or input ends
    pub async fn run<R, W>(&mut self, mut input: R, output: &mut W) -> std::io::Result<ReplSummary>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut turns = 0;
        let mut failed_turns = 0;
        let mut line = String::new();

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line).await? == 0 {
                info!("Input closed after {} turns", turns);
                writeln!(output)?;
                return Ok(ReplSummary {
                    turns,
                    failed_turns,
                    exit: ExitReason::EndOfInput,
                });
            }

            if is_exit_command(&line) {
                writeln!(output, "{}", FAREWELL)?;
                writeln!(output, "{}", SHUTDOWN_NOTICE)?;
                info!("Exit requested after {} turns", turns);
                return Ok(ReplSummary {
                    turns,
                    failed_turns,
                    exit: ExitReason::Sentinel,
                });
            }

            let query = line.trim();
            if query.is_empty() {
                debug!("Empty input, prompting again");
                continue;
            }

            let result = self
                .dispatcher
                .dispatch(
                    query,
                    self.options.clear_messages,
                    self.options.self_aware,
                    &self.memory_store,
                    &self.completion_api,
                    &mut self.session,
                )
                .await;

            match result {
                Ok(reply) => {
                    turns += 1;
                    writeln!(output, "{}", reply)?;
                }
                Err(e) => {
                    failed_turns += 1;
                    warn!("Turn failed: {}", e);
                    writeln!(output, "Error: {}", e)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompletionError, RetrievalError};
    use crate::memory::MemoryRecord;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoMemories;

    #[async_trait]
    impl MemoryStore for NoMemories {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<MemoryRecord>, RetrievalError> {
            Ok(vec![])
        }
    }

    /// Echoes the query back, failing on queries that start with "fail"
    #[derive(Default)]
    struct EchoApi {
        calls: Mutex<Vec<String>>,
    }

    impl EchoApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionApi for EchoApi {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
            let query = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.calls.lock().unwrap().push(query.clone());
            if query.starts_with("fail") {
                return Err(CompletionError::Transport("connection refused".into()));
            }
            Ok(format!("echo: {}", query))
        }
    }

    fn driver() -> ReplDriver<NoMemories, EchoApi> {
        ReplDriver::new(PromptDispatcher::default(), NoMemories, EchoApi::default())
    }

    async fn run(driver: &mut ReplDriver<NoMemories, EchoApi>, input: &str) -> (ReplSummary, String) {
        let mut output = Vec::new();
        let summary = driver.run(input.as_bytes(), &mut output).await.unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_exit_command_matching() {
        assert!(is_exit_command("thank you clone"));
        assert!(is_exit_command("Thank You Clone\n"));
        assert!(is_exit_command("  THANK YOU CLONE  "));
        assert!(!is_exit_command("thank you, clone"));
        assert!(!is_exit_command("thank you clone!"));
        assert!(!is_exit_command("thanks"));
    }

    #[tokio::test]
    async fn test_mixed_case_sentinel_never_dispatches() {
        let mut driver = driver();
        let (summary, output) = run(&mut driver, "Thank You Clone\n").await;

        assert_eq!(summary.exit, ExitReason::Sentinel);
        assert_eq!(summary.turns, 0);
        assert!(driver.completion_api().calls().is_empty());
        assert_eq!(
            output,
            format!("{}{}\n{}\n", PROMPT, FAREWELL, SHUTDOWN_NOTICE)
        );
    }

    #[tokio::test]
    async fn test_turns_print_replies_and_accumulate_history() {
        let mut driver = driver();
        let (summary, output) = run(&mut driver, "hello\nhow are you?\nthank you clone\n").await;

        assert_eq!(summary.turns, 2);
        assert!(output.contains("echo: hello\n"));
        assert!(output.contains("echo: how are you?\n"));
        assert_eq!(output.matches(PROMPT).count(), 3);
        assert_eq!(driver.session().len(), 4);
    }

    #[tokio::test]
    async fn test_blank_input_reprompts() {
        let mut driver = driver();
        let (summary, output) = run(&mut driver, "\n   \nhello\nthank you clone\n").await;

        assert_eq!(driver.completion_api().calls(), vec!["hello".to_string()]);
        assert_eq!(summary.turns, 1);
        assert_eq!(output.matches(PROMPT).count(), 4);
    }

    #[tokio::test]
    async fn test_failed_turn_reports_and_continues() {
        let mut driver = driver();
        let (summary, output) = run(&mut driver, "fail please\nhello\nthank you clone\n").await;

        assert_eq!(summary.failed_turns, 1);
        assert_eq!(summary.turns, 1);
        assert!(output.contains("Error: Transport error: connection refused\n"));
        assert!(output.contains("echo: hello\n"));
        assert_eq!(driver.session().len(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let mut driver = driver();
        let (summary, output) = run(&mut driver, "hello\n").await;

        assert_eq!(summary.exit, ExitReason::EndOfInput);
        assert_eq!(summary.turns, 1);
        assert!(!output.contains(FAREWELL));
    }

    #[tokio::test]
    async fn test_clear_messages_option_applies_every_turn() {
        let mut driver = driver().with_options(TurnOptions {
            clear_messages: true,
            self_aware: false,
        });
        run(&mut driver, "one\ntwo\nthree\n").await;

        assert_eq!(
            driver.session().history(),
            &[ChatMessage::user("three"), ChatMessage::assistant("echo: three")]
        );
    }
}
