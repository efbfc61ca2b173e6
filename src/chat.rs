use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::error::Result;
use crate::export::{ExportFormat, default_filename, export};
use crate::format::{EMPTY_BATCH_MESSAGE, render_markdown};
use crate::generator::Generator;
use crate::record::TestCaseRecord;
use crate::transport::Transport;

const HELP: &str = "\
Type a feature requirement to generate test cases.
Commands:
  /export [path]  write the latest batch (format from extension: .txt, .csv, .json)
  /history        list requirements sent in this session
  /help           show this message
  /quit           leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message(String),
    Error(String),
    Quit,
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub requirement: String,
    /// Number of records received, or `None` when the request failed.
    pub count: Option<usize>,
}

/// In-memory chat session. Nothing outlives the process.
pub struct Session<T: Transport> {
    generator: Generator<T>,
    categories: Vec<String>,
    history: Vec<Exchange>,
    last_batch: Option<Vec<TestCaseRecord>>,
}

impl<T: Transport> Session<T> {
    pub fn new(generator: Generator<T>, categories: Vec<String>) -> Self {
        Self {
            generator,
            categories,
            history: Vec::new(),
            last_batch: None,
        }
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn last_batch(&self) -> Option<&[TestCaseRecord]> {
        self.last_batch.as_deref()
    }

    /// Handle one line of input. Requests run to completion before this returns.
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::Nothing;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default();
            let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
            return match name {
                "quit" | "exit" => Reply::Quit,
                "help" => Reply::Message(HELP.to_string()),
                "history" => self.render_history(),
                "export" => self.export_last(arg.map(PathBuf::from)),
                other => Reply::Error(format!("Unknown command: /{other} (try /help)")),
            };
        }

        self.generate(line).await
    }

    async fn generate(&mut self, requirement: &str) -> Reply {
        debug!(requirement, "generating from chat");
        match self.generator.generate(requirement, &self.categories).await {
            Ok(records) if records.is_empty() => {
                self.history.push(Exchange {
                    requirement: requirement.to_string(),
                    count: Some(0),
                });
                Reply::Error(EMPTY_BATCH_MESSAGE.to_string())
            }
            Ok(records) => {
                self.history.push(Exchange {
                    requirement: requirement.to_string(),
                    count: Some(records.len()),
                });
                let rendered = render_markdown(&records);
                self.last_batch = Some(records);
                Reply::Message(rendered)
            }
            Err(e) => {
                self.history.push(Exchange {
                    requirement: requirement.to_string(),
                    count: None,
                });
                Reply::Error(format!("Error: {e}"))
            }
        }
    }

    fn render_history(&self) -> Reply {
        if self.history.is_empty() {
            return Reply::Message("No requirements yet.".to_string());
        }
        let lines: Vec<String> = self
            .history
            .iter()
            .enumerate()
            .map(|(i, ex)| match ex.count {
                Some(n) => format!("{}. {} ({n} test cases)", i + 1, ex.requirement),
                None => format!("{}. {} (failed)", i + 1, ex.requirement),
            })
            .collect();
        Reply::Message(lines.join("\n"))
    }

    fn export_last(&self, path: Option<PathBuf>) -> Reply {
        let Some(ref records) = self.last_batch else {
            return Reply::Error("Nothing to export yet.".to_string());
        };
        let format = path
            .as_deref()
            .and_then(ExportFormat::from_path)
            .unwrap_or_default();
        let path = path.unwrap_or_else(|| default_filename(format));
        match export(records, &path, format) {
            Ok(written) => Reply::Message(format!(
                "Exported {} test cases to {}",
                records.len(),
                written.display()
            )),
            Err(e) => Reply::Error(format!("Error: {e}")),
        }
    }
}

/// Drive a session from `input` until EOF or `/quit`, writing replies to `out`.
pub async fn run<T, R, W>(session: &mut Session<T>, input: R, out: &mut W) -> Result<()>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{HELP}")?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.handle_line(&line).await {
            Reply::Message(text) => writeln!(out, "{text}")?,
            Reply::Error(text) => writeln!(out, "❌ {text}")?,
            Reply::Nothing => {}
            Reply::Quit => break,
        }
    }
    info!(requests = session.history().len(), "chat session ended");
    Ok(())
}
