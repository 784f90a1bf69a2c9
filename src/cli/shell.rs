//! Interactive session shell
//!
//! Reads one command per line and prints the enabled actions after each,
//! the way a windowed front end would grey out its buttons.

use super::main_impl::{remove_with_spinner, write_previews};
use crate::driver::{Command, Driver};
use crate::tracing_config::events;
use crate::types::{Action, ActionSet};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  load PATH        load an image (jpg, jpeg, png, bmp)
  drop PAYLOAD     load a drag-and-drop payload, e.g. {C:/My Photos/cat.png}
  remove           remove the background
  save [PATH]      save the result [default: suggested name in the save directory]
  clear            clear the session
  status           show the session state
  preview [DIR]    write fitted previews into DIR
  help             show this help
  quit             leave the shell";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Dispatch(Command),
    Remove,
    Status,
    Preview(Option<PathBuf>),
    Help,
    Quit,
}

/// Parse a shell line; `Ok(None)` for blank lines
pub(crate) fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(k, r)| (k, r.trim()));
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match keyword.to_lowercase().as_str() {
        "load" | "open" => {
            let path = argument.ok_or("usage: load PATH")?;
            ShellCommand::Dispatch(Command::Load(PathBuf::from(path)))
        },
        "drop" => {
            let payload = argument.ok_or("usage: drop PAYLOAD")?;
            ShellCommand::Dispatch(Command::Drop(payload))
        },
        "remove" => ShellCommand::Remove,
        "save" => ShellCommand::Dispatch(Command::Save(argument.map(PathBuf::from))),
        "clear" => ShellCommand::Dispatch(Command::Clear),
        "status" => ShellCommand::Status,
        "preview" => ShellCommand::Preview(argument.map(PathBuf::from)),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}', type 'help'")),
    };
    Ok(Some(command))
}

/// Shell keyword for an action
fn keyword(action: Action) -> &'static str {
    match action {
        Action::Load => "load",
        Action::RemoveBackground => "remove",
        Action::Save => "save",
        Action::Clear => "clear",
    }
}

pub(crate) fn describe_actions(actions: ActionSet) -> String {
    actions
        .enabled()
        .map(keyword)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_status(driver: &Driver) {
    let session = driver.session();
    println!("phase:    {}", session.phase());
    println!("backend:  {}", session.backend_name());
    if let Some(path) = session.source_path() {
        println!("source:   {}", path.display());
    }
    if let Some(image) = session.original() {
        println!("original: {}x{}", image.width(), image.height());
    }
    if let Some(image) = session.result() {
        println!("result:   {}x{}", image.width(), image.height());
    }
    if let Some(path) = driver.default_save_path() {
        println!("save to:  {}", path.display());
    }
}

/// Run the shell until `quit` or end of input
pub(crate) async fn run(driver: &mut Driver, preview_dir: Option<&Path>) -> Result<()> {
    println!("bgremove-studio interactive session, type 'help' for commands");
    println!("enabled: {}", describe_actions(driver.actions()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read command")? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            },
        };

        let changed = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{HELP}");
                false
            },
            ShellCommand::Status => {
                print_status(driver);
                false
            },
            ShellCommand::Preview(dir) => {
                match dir.as_deref().or(preview_dir) {
                    Some(dir) => {
                        if let Err(e) = write_previews(driver, dir) {
                            println!("❌ {e:#}");
                        }
                    },
                    None => println!("usage: preview DIR (or start with --preview-dir)"),
                }
                false
            },
            ShellCommand::Remove => match remove_with_spinner(driver).await {
                Ok(outcome) => {
                    println!("✅ {outcome}");
                    true
                },
                Err(e) => {
                    println!("❌ {e:#}");
                    false
                },
            },
            ShellCommand::Dispatch(command) => match driver.dispatch(command) {
                Ok(outcome) => {
                    println!("✅ {outcome}");
                    true
                },
                Err(e) => {
                    events::error_with_context(&e, "shell command");
                    println!("❌ {e}");
                    false
                },
            },
        };

        if changed {
            if let Some(dir) = preview_dir {
                if let Err(e) = write_previews(driver, dir) {
                    println!("❌ {e:#}");
                }
            }
        }
        println!("enabled: {}", describe_actions(driver.actions()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    #[test]
    fn test_parse_line_commands() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(
            parse_line("load /tmp/my photo.jpg"),
            Ok(Some(ShellCommand::Dispatch(Command::Load(PathBuf::from(
                "/tmp/my photo.jpg"
            )))))
        );
        assert_eq!(
            parse_line("drop {/tmp/a b.png}"),
            Ok(Some(ShellCommand::Dispatch(Command::Drop(
                "{/tmp/a b.png}".to_string()
            ))))
        );
        assert_eq!(parse_line("REMOVE"), Ok(Some(ShellCommand::Remove)));
        assert_eq!(
            parse_line("save"),
            Ok(Some(ShellCommand::Dispatch(Command::Save(None))))
        );
        assert_eq!(
            parse_line("save out.png"),
            Ok(Some(ShellCommand::Dispatch(Command::Save(Some(
                PathBuf::from("out.png")
            )))))
        );
        assert_eq!(parse_line("exit"), Ok(Some(ShellCommand::Quit)));
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("load").is_err());
        assert!(parse_line("drop   ").is_err());
        assert!(parse_line("frobnicate").unwrap_err().contains("frobnicate"));
    }

    #[test]
    fn test_describe_actions() {
        assert_eq!(describe_actions(ActionSet::for_phase(Phase::Empty)), "load, clear");
        assert_eq!(
            describe_actions(ActionSet::for_phase(Phase::Processed)),
            "load, remove, save, clear"
        );
    }
}
