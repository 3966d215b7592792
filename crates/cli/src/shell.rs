//! Interactive shell.
//!
//! Reads one command per line and runs it against a single long-lived
//! `AppState`, so the session and loaded dashboards persist between
//! commands. Errors are shown as notices and never end the shell.

#![allow(clippy::print_stdout)]

use std::io::Write;

use clap::Parser;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use parkline_app::AppState;

use crate::commands::{self, Command};
use crate::render;

/// A line typed at the shell prompt.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Errors splitting a line into words.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// Split a line into words. Single or double quotes group words; a
/// backslash escapes the next character outside single quotes.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"') | None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    in_word = true;
                }
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(TokenizeError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn prompt(app: &AppState) {
    let who = app.session().map_or("guest", |s| s.username());
    print!("parkline({who})> ");
    let _ = std::io::stdout().flush();
}

/// Run the shell until `exit`, `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if standard input cannot be read.
pub async fn run(app: &mut AppState) -> std::io::Result<()> {
    println!("Parkline shell ({} backend). Type 'help' for commands, 'exit' to quit.", app.mode());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        render::notices(&app.notices());
        prompt(app);
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let words = match tokenize(&line) {
            Ok(words) => words,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            Some(_) => {}
        }

        match ShellLine::try_parse_from(&words) {
            Ok(parsed) => {
                if let Err(e) = commands::execute(app, parsed.command).await {
                    tracing::debug!(error = %e, "Shell command failed");
                }
            }
            Err(e) => {
                let _ = e.print();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(
            tokenize("  book   3 ").unwrap(),
            vec!["book".to_string(), "3".to_string()]
        );
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_quotes_and_escapes() {
        assert_eq!(
            tokenize(r#"lots create --name "City Center" --address 'MG Road, 12' --price 40"#)
                .unwrap(),
            vec![
                "lots", "create", "--name", "City Center", "--address", "MG Road, 12", "--price",
                "40"
            ]
        );
        assert_eq!(tokenize(r"a\ b").unwrap(), vec!["a b"]);
        assert_eq!(tokenize(r#""""#).unwrap(), vec![""]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert_eq!(
            tokenize(r#"login "admin"#),
            Err(TokenizeError::UnterminatedQuote)
        );
    }

    #[test]
    fn test_shell_line_parses_commands() {
        let words = tokenize("lots delete 4 --yes").unwrap();
        let parsed = ShellLine::try_parse_from(&words).unwrap();
        assert!(matches!(
            parsed.command,
            Command::Lots {
                action: commands::LotsAction::Delete { yes: true, .. }
            }
        ));
        assert!(ShellLine::try_parse_from(["bogus"]).is_err());
    }
}
