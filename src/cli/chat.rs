//! Interactive chat REPL for renshu.
//!
//! Plain lines are conversation turns; lines starting with `/` are session
//! commands. The loop itself is generic over its reader and writer so the
//! whole session can be driven from tests.

use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::cli::lesson::format_step;
use crate::cli::scenario::format_scenario_step;
use crate::cli::state::format_state;
use crate::cli::turn::format_turn;
use crate::content::ContentLibrary;
use crate::coordinator::TurnCoordinator;
use crate::core::Message;
use crate::error::Result;
use crate::storage::StateStore;

const HELP: &str = "\
Type Japanese to talk. Commands:
  /help                              show this help
  /exit                              leave the session
  /user <id>                         track proficiency for <id>
  /state                             show the current user's state
  /state reset                       reset the current user's state
  /history clear                     forget the conversation so far
  /lesson <id>                       lesson overview
  /lesson-step <id> <i>              one lesson step
  /scenario <id> <i>                 one scenario line
  /scenario-reply <id> <i> <text>    answer a scenario line";

/// What the REPL should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatResponse {
    /// Print this and keep going.
    Output(String),
    /// End the session.
    Exit,
}

/// One interactive session: a coordinator, the content tables, the current
/// user and the conversation so far.
pub struct ChatSession<S: StateStore> {
    coordinator: TurnCoordinator<S>,
    library: ContentLibrary,
    user_id: Option<String>,
    history: Vec<Message>,
}

impl<S: StateStore> ChatSession<S> {
    pub fn new(
        coordinator: TurnCoordinator<S>,
        library: ContentLibrary,
        user_id: Option<String>,
    ) -> Self {
        Self {
            coordinator,
            library,
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            history: Vec::new(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Handle one input line.
    pub fn handle_line(&mut self, line: &str) -> ChatResponse {
        let line = line.trim();
        if line.is_empty() {
            return ChatResponse::Output(String::new());
        }

        if let Some(command) = line.strip_prefix('/') {
            return self.handle_command(command);
        }

        ChatResponse::Output(self.talk(line))
    }

    fn talk(&mut self, text: &str) -> String {
        let history = (!self.history.is_empty()).then_some(self.history.as_slice());
        match self
            .coordinator
            .run_turn_for_user(text, history, self.user_id.as_deref())
        {
            Ok(turn) => {
                self.history.push(Message::user(text));
                self.history.push(Message::assistant(turn.jp.clone()));
                format_turn(&turn)
            }
            Err(e) => format!("error: {}", e),
        }
    }

    fn handle_command(&mut self, command: &str) -> ChatResponse {
        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();
        debug!(command = name, "chat command");

        let output = match name {
            "exit" | "quit" => return ChatResponse::Exit,
            "help" => HELP.to_string(),
            "user" => self.set_user(rest),
            "state" => self.state(rest),
            "history" if rest == "clear" => {
                self.history.clear();
                "History cleared.".to_string()
            }
            "lesson" if rest.is_empty() => "usage: /lesson <id>".to_string(),
            "lesson" => render(self.library.overview(rest).map(|o| {
                format!(
                    "{}  [{}] {}  ({} vocab, {} grammar)",
                    o.id, o.level, o.title, o.vocab_count, o.grammar_count
                )
            })),
            "lesson-step" => match parse_id_index(rest) {
                Some((id, index, _)) => {
                    render(self.library.lesson_step(id, index).map(|s| format_step(&s)))
                }
                None => "usage: /lesson-step <id> <i>".to_string(),
            },
            "scenario" => match parse_id_index(rest) {
                Some((id, index, _)) => render(
                    self.library
                        .scenario_step(id, index)
                        .map(|s| format_scenario_step(&s)),
                ),
                None => "usage: /scenario <id> <i>".to_string(),
            },
            "scenario-reply" => match parse_id_index(rest) {
                Some((id, index, text)) if !text.is_empty() => render(
                    self.library
                        .scenario_reply(&self.coordinator, id, index, text, self.user_id.as_deref())
                        .map(|reply| {
                            let mut out = format_turn(&reply.analysis);
                            match reply.npc_line {
                                Some(next) => {
                                    out.push_str("\n\n");
                                    out.push_str(&format_scenario_step(&next));
                                }
                                None => out.push_str("\n\n(End of scenario)"),
                            }
                            out
                        }),
                ),
                _ => "usage: /scenario-reply <id> <i> <text>".to_string(),
            },
            _ => format!("unknown command: /{} (try /help)", name),
        };

        ChatResponse::Output(output)
    }

    fn set_user(&mut self, id: &str) -> String {
        if id.is_empty() {
            return match &self.user_id {
                Some(current) => format!("Current user: {}", current),
                None => "No user set; turns are not tracked.".to_string(),
            };
        }
        info!(user_id = id, "chat user switched");
        self.user_id = Some(id.to_string());
        format!("User set to {}.", id)
    }

    fn state(&self, rest: &str) -> String {
        let Some(user_id) = self.user_id.as_deref() else {
            return "No user set. Use /user <id> first.".to_string();
        };

        match rest {
            "" => render(self.coordinator.get_user_state(user_id).map(|s| format_state(&s))),
            "reset" => render(
                self.coordinator
                    .reset_user_state(user_id)
                    .map(|s| format!("State reset.\n\n{}", format_state(&s))),
            ),
            _ => "usage: /state [reset]".to_string(),
        }
    }

    /// Read lines from `input` until EOF or `/exit`, writing responses to
    /// `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        writeln!(output, "renshu chat. /help for commands, /exit to leave.")?;
        prompt(&mut output)?;

        for line in input.lines() {
            match self.handle_line(&line?) {
                ChatResponse::Exit => break,
                ChatResponse::Output(text) => {
                    if !text.is_empty() {
                        writeln!(output, "{}\n", text)?;
                    }
                }
            }
            prompt(&mut output)?;
        }

        writeln!(output)?;
        Ok(())
    }
}

fn prompt<W: Write>(output: &mut W) -> Result<()> {
    write!(output, "> ")?;
    output.flush()?;
    Ok(())
}

fn render(result: Result<String>) -> String {
    result.unwrap_or_else(|e| format!("error: {}", e))
}

/// Split `"<id> <index> [rest]"`.
fn parse_id_index(args: &str) -> Option<(&str, usize, &str)> {
    let mut parts = args.splitn(3, char::is_whitespace);
    let id = parts.next().filter(|s| !s.is_empty())?;
    let index = parts.next()?.trim().parse().ok()?;
    let rest = parts.next().unwrap_or_default().trim();
    Some((id, index, rest))
}
