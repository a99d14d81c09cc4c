// src/engine/approval.rs

//! Yes/no confirmation seam.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::pin::Pin;

use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::{Result, WatchfixError};

/// Asks the user a yes/no question.
pub trait Approver: Send + Sync {
    fn confirm<'a>(
        &'a self,
        question: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;
}

/// Interpret one line of input. `None` means "ask again".
pub fn parse_approval(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Prompt on `output` and read answers from `input` until one is valid.
///
/// End of input is [`WatchfixError::ApprovalInputClosed`].
pub fn prompt_until_valid<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    loop {
        write!(output, "\n{question} [y/n]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(WatchfixError::ApprovalInputClosed);
        }

        match parse_approval(&line) {
            Some(answer) => return Ok(answer),
            None => writeln!(output, "Please enter 'y' or 'n'")?,
        }
    }
}

/// Approver backed by the process's stdin/stdout.
///
/// The blocking read runs on a detached thread so an abandoned prompt (for
/// example on Ctrl-C) never keeps the runtime from shutting down.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalApprover;

impl Approver for TerminalApprover {
    fn confirm<'a>(
        &'a self,
        question: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        let question = question.to_string();
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            std::thread::spawn(move || {
                let stdin = io::stdin();
                let stdout = io::stdout();
                let answer = prompt_until_valid(&mut stdin.lock(), &mut stdout.lock(), &question);
                if tx.send(answer).is_err() {
                    debug!("approval answered after the prompt was abandoned");
                }
            });

            rx.await.map_err(|_| WatchfixError::ApprovalInputClosed)?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn accepts_yes_and_no_variants() {
        for yes in ["y", "Y", " yes ", "YES\n"] {
            assert_eq!(parse_approval(yes), Some(true), "{yes:?}");
        }
        for no in ["n", "No", "  NO\r\n"] {
            assert_eq!(parse_approval(no), Some(false), "{no:?}");
        }
        for other in ["", "maybe", "yep", "nah"] {
            assert_eq!(parse_approval(other), None, "{other:?}");
        }
    }

    #[test]
    fn reprompts_until_valid() {
        let mut input = Cursor::new("what\n\nyes\n");
        let mut output = Vec::new();

        let answer = prompt_until_valid(&mut input, &mut output, "Apply?").unwrap();
        assert!(answer);

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("\nApply? [y/n]: ").count(), 3);
        assert_eq!(printed.matches("Please enter 'y' or 'n'").count(), 2);
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut input = Cursor::new("huh\n");
        let mut output = Vec::new();
        let err = prompt_until_valid(&mut input, &mut output, "Apply?").unwrap_err();
        assert!(matches!(err, WatchfixError::ApprovalInputClosed));
    }
}
