//! Terminal input shared by the interactive commands.
//!
//! The editor, the watch loop, and confirmation prompts all read from the
//! same line channel so lines read ahead by one are never lost to another.
//! Stdin is read on its own OS thread: a blocking read there never holds up
//! runtime shutdown, and the process exits with the thread still parked.

use std::future::Future;
use std::io::{BufRead, Write as _};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use sprinkler_app::ports::Confirmation;

/// Line reader over stdin, shareable between tasks.
#[derive(Clone)]
pub struct TerminalInput {
    lines: Arc<Mutex<mpsc::Receiver<std::io::Result<String>>>>,
}

impl TerminalInput {
    /// Start the stdin reader thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn stdin() -> std::io::Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Feed lines from any blocking reader through a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn from_reader<R>(reader: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(1);
        std::thread::Builder::new()
            .name("stdin".into())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if sender.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            })?;
        Ok(Self {
            lines: Arc::new(Mutex::new(receiver)),
        })
    }

    /// Next line without its terminator, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.lines.lock().await.recv().await.transpose()
    }
}

/// `y/N` prompt on the terminal.
pub struct TerminalConfirmation {
    input: TerminalInput,
    assume_yes: bool,
}

impl TerminalConfirmation {
    #[must_use]
    pub fn new(input: TerminalInput, assume_yes: bool) -> Self {
        Self { input, assume_yes }
    }
}

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send {
        let prompt = prompt.to_string();
        let input = self.input.clone();
        let assume_yes = self.assume_yes;
        async move {
            if assume_yes {
                println!("{prompt} [y/N] y");
                return true;
            }
            print!("{prompt} [y/N] ");
            let _ = std::io::stdout().flush();
            match input.next_line().await {
                Ok(Some(answer)) => is_yes(&answer),
                Ok(None) => false,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read confirmation");
                    false
                }
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
