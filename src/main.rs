//! Renshu - Japanese conversation coach
//!
//! CLI entry point with logging setup and global panic handler.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use renshu::cli::{
    load_history, ChatSession, GrammarCommand, GrammarOptions, LessonCommand, LessonOptions,
    ModelsCommand, ModelsOptions, ScenarioCommand, ScenarioOptions, StateAction, StateCommand,
    StateOptions, TurnCommand, TurnOptions,
};
use renshu::config::{crash_log_path, Config};
use renshu::content::ContentLibrary;
use renshu::coordinator::TurnCoordinator;
use renshu::error::exit_codes;
use renshu::storage::FileStateStore;

/// Default number of users listed by `state list`.
const DEFAULT_LIST_LIMIT: usize = 20;

// =============================================================================
// CLI Definition
// =============================================================================

/// Renshu - Japanese conversation coach with adaptive difficulty
#[derive(Parser)]
#[command(name = "renshu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation
    Chat {
        /// Track proficiency for this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Run a single conversational turn
    Turn {
        /// What you want to say
        text: String,
        /// Track proficiency for this user
        #[arg(long)]
        user: Option<String>,
        /// JSON file with prior messages ([{"role", "content"}])
        #[arg(long)]
        history: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Inspect or reset per-user proficiency state
    State {
        #[command(subcommand)]
        action: StateCliAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Detect grammar points in text without calling a model
    Grammar {
        /// Text to analyze
        text: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List lessons, or show a lesson overview or step
    Lesson {
        /// Lesson ID (omit to list all lessons)
        id: Option<String>,
        /// Step index, starting at 0
        #[arg(long)]
        step: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List scenarios, show a scenario line, or answer it
    Scenario {
        /// Scenario ID (omit to list all scenarios)
        id: Option<String>,
        /// Line index, starting at 0
        #[arg(requires = "id")]
        step: Option<usize>,
        /// Answer the line with this text
        #[arg(long, requires = "step")]
        reply: Option<String>,
        /// Track proficiency for this user
        #[arg(long)]
        user: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show backend status and installed local models
    Models {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Subcommand)]
enum StateCliAction {
    /// Show a user's level and grammar statistics
    Show {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// Clear a user's statistics and level
    Reset {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// List stored users
    List {
        /// Maximum number of users
        #[arg(long, short)]
        limit: Option<usize>,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("renshu error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to `<renshu home>/crash.log` and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("renshu panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
/// output with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "renshu=debug" } else { "renshu=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat { user } => run_chat(user),
        Commands::Turn {
            text,
            user,
            history,
            json,
            quiet,
        } => run_turn(&text, user, history, json, quiet),
        Commands::State {
            action,
            json,
            quiet,
        } => run_state(action, json, quiet),
        Commands::Grammar { text, json, quiet } => run_grammar(&text, json, quiet),
        Commands::Lesson {
            id,
            step,
            json,
            quiet,
        } => run_lesson(id, step, json, quiet),
        Commands::Scenario {
            id,
            step,
            reply,
            user,
            json,
            quiet,
        } => run_scenario(id, step, reply, user, json, quiet),
        Commands::Models { json, quiet } => run_models(json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_chat(user: Option<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();
    let coordinator = TurnCoordinator::from_config(&config)?;
    let mut session = ChatSession::new(coordinator, ContentLibrary::default(), user);

    let stdin = std::io::stdin();
    session.run(stdin.lock(), std::io::stdout())?;

    Ok(success_to_exit_code(true))
}

fn run_turn(
    text: &str,
    user: Option<String>,
    history: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();
    let history = match history {
        Some(path) => load_history(&path)?,
        None => Vec::new(),
    };

    let cmd = TurnCommand::new(TurnCoordinator::from_config(&config)?);
    let options = TurnOptions {
        json,
        quiet,
        user_id: user,
        history,
    };

    let output = cmd.run(text, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_state(
    action: StateCliAction,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();
    let store = FileStateStore::from_config(&config)?;

    let cmd = StateCommand::new(store);
    let options = StateOptions { json, quiet };
    let action = match action {
        StateCliAction::Show { user } => StateAction::Show { user_id: user },
        StateCliAction::Reset { user } => StateAction::Reset { user_id: user },
        StateCliAction::List { limit } => StateAction::List {
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT),
        },
    };

    let output = cmd.run(&action);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_grammar(text: &str, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();

    let cmd = GrammarCommand::new(config.detector());
    let options = GrammarOptions { json, quiet };

    let output = cmd.run(text);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_lesson(
    id: Option<String>,
    step: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let library = ContentLibrary::default();

    let cmd = LessonCommand::new(&library);
    let options = LessonOptions { json, quiet };

    let output = cmd.run(id.as_deref(), step);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_scenario(
    id: Option<String>,
    step: Option<usize>,
    reply: Option<String>,
    user: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let library = ContentLibrary::default();

    let cmd = ScenarioCommand::new(&library);
    let options = ScenarioOptions {
        json,
        quiet,
        user_id: user,
    };

    let output = match (id, step, reply) {
        (Some(id), Some(step), Some(text)) => {
            let config = Config::load();
            let coordinator = TurnCoordinator::from_config(&config)?;
            cmd.reply(&coordinator, &id, step, &text, &options)
        }
        (Some(id), step, _) => cmd.step(&id, step.unwrap_or(0)),
        (None, _, _) => cmd.list(),
    };
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_models(json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();

    let cmd = ModelsCommand::new(config.llm);
    let options = ModelsOptions { json, quiet };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(
            success_to_exit_code(true),
            ExitCode::from(exit_codes::SUCCESS as u8)
        );
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::parse_from(["renshu", "chat", "--user", "hana"]);
        assert!(!cli.verbose);
        match cli.command {
            Commands::Chat { user } => assert_eq!(user.as_deref(), Some("hana")),
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_cli_parse_turn() {
        let cli = Cli::parse_from([
            "renshu",
            "--verbose",
            "turn",
            "昨日映画を見ました",
            "--user",
            "hana",
            "--history",
            "h.json",
            "--json",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Turn {
                text,
                user,
                history,
                json,
                quiet,
            } => {
                assert_eq!(text, "昨日映画を見ました");
                assert_eq!(user.as_deref(), Some("hana"));
                assert_eq!(history, Some(PathBuf::from("h.json")));
                assert!(json);
                assert!(!quiet);
            }
            _ => panic!("Expected Turn command"),
        }
    }

    #[test]
    fn test_cli_parse_state_show() {
        let cli = Cli::parse_from(["renshu", "state", "show", "--user", "hana", "--json"]);
        match cli.command {
            Commands::State { action, json, .. } => {
                assert!(json);
                match action {
                    StateCliAction::Show { user } => assert_eq!(user, "hana"),
                    _ => panic!("Expected Show action"),
                }
            }
            _ => panic!("Expected State command"),
        }
    }

    #[test]
    fn test_cli_parse_state_list() {
        let cli = Cli::parse_from(["renshu", "state", "list", "--limit", "5"]);
        match cli.command {
            Commands::State {
                action: StateCliAction::List { limit },
                ..
            } => assert_eq!(limit, Some(5)),
            _ => panic!("Expected State list"),
        }
    }

    #[test]
    fn test_cli_parse_state_reset_requires_user() {
        assert!(Cli::try_parse_from(["renshu", "state", "reset"]).is_err());
    }

    #[test]
    fn test_cli_parse_grammar() {
        let cli = Cli::parse_from(["renshu", "grammar", "行くつもりです", "-q"]);
        match cli.command {
            Commands::Grammar { text, quiet, .. } => {
                assert_eq!(text, "行くつもりです");
                assert!(quiet);
            }
            _ => panic!("Expected Grammar command"),
        }
    }

    #[test]
    fn test_cli_parse_lesson() {
        let cli = Cli::parse_from(["renshu", "lesson", "n5_lesson_01", "--step", "2"]);
        match cli.command {
            Commands::Lesson { id, step, .. } => {
                assert_eq!(id.as_deref(), Some("n5_lesson_01"));
                assert_eq!(step, Some(2));
            }
            _ => panic!("Expected Lesson command"),
        }

        let cli = Cli::parse_from(["renshu", "lesson"]);
        assert!(matches!(cli.command, Commands::Lesson { id: None, .. }));
    }

    #[test]
    fn test_cli_parse_scenario_reply() {
        let cli = Cli::parse_from([
            "renshu",
            "scenario",
            "scene_conbini_01",
            "3",
            "--reply",
            "はい、お願いします",
            "--user",
            "hana",
        ]);
        match cli.command {
            Commands::Scenario {
                id,
                step,
                reply,
                user,
                ..
            } => {
                assert_eq!(id.as_deref(), Some("scene_conbini_01"));
                assert_eq!(step, Some(3));
                assert_eq!(reply.as_deref(), Some("はい、お願いします"));
                assert_eq!(user.as_deref(), Some("hana"));
            }
            _ => panic!("Expected Scenario command"),
        }
    }

    #[test]
    fn test_cli_parse_scenario_reply_requires_step() {
        assert!(
            Cli::try_parse_from(["renshu", "scenario", "scene_conbini_01", "--reply", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_parse_models() {
        let cli = Cli::parse_from(["renshu", "models", "--json"]);
        assert!(matches!(cli.command, Commands::Models { json: true, .. }));
    }
}
