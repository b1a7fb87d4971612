use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::menu::{render_page, AnalysisType, QuestionId, SelectionState, QUESTION_PLACEHOLDER};
use crate::render::render_text;

const HELP: &str = "\
Commands:
  analysis <overview|store-distribution|ownership-analysis|location-analysis>
  question <1-20|none>
  show        render the current selection again
  questions   list the question menu
  help        show this help
  quit        leave the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Analysis(AnalysisType),
    Question(Option<QuestionId>),
    Show,
    Questions,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let command = match verb.to_ascii_lowercase().as_str() {
            "analysis" | "a" => Command::Analysis(rest.parse()?),
            "question" | "q" => Command::Question(QuestionId::parse_selection(rest)?),
            "show" | "" => Command::Show,
            "questions" => Command::Questions,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(command)
    }
}

pub fn question_menu() -> String {
    let mut menu = String::from(QUESTION_PLACEHOLDER);
    for question in QuestionId::ALL {
        menu.push('\n');
        menu.push_str(question.label());
    }
    menu
}

/// One interactive session over an already loaded dataset.
pub struct Session<'a> {
    dataset: &'a Dataset,
    selection: SelectionState,
}

impl<'a> Session<'a> {
    pub fn new(dataset: &'a Dataset, selection: SelectionState) -> Self {
        Session { dataset, selection }
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn render(&self) -> String {
        render_text(&render_page(self.dataset, &self.selection))
    }

    /// Applies a command and returns what to print, or `None` to end the session.
    pub fn apply(&mut self, command: Command) -> Option<String> {
        match command {
            Command::Analysis(analysis) => {
                self.selection.analysis = analysis;
                Some(self.render())
            }
            Command::Question(question) => {
                self.selection.question = question;
                Some(self.render())
            }
            Command::Show => Some(self.render()),
            Command::Questions => Some(question_menu()),
            Command::Help => Some(HELP.to_string()),
            Command::Quit => None,
        }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        info!(action = "start", component = "session", "Interactive session started");
        writeln!(output, "{}", self.render()).context("Failed to write to output")?;

        for line in input.lines() {
            let line = line.context("Failed to read command")?;
            let reply = match Command::parse(&line) {
                Ok(command) => match self.apply(command) {
                    Some(reply) => reply,
                    None => break,
                },
                Err(e) => {
                    warn!(action = "parse", component = "session", error = %e, "Rejected command");
                    format!("Error: {}", e)
                }
            };
            writeln!(output, "{}", reply).context("Failed to write to output")?;
            output.flush().context("Failed to flush output")?;
        }

        info!(action = "complete", component = "session", "Interactive session ended");
        Ok(())
    }
}
