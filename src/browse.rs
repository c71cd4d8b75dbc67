//! Line-driven browsing of a loaded dataset.
//!
//! Each input line is one command; the current view is re-rendered after
//! every command that changes it. Bad commands print a message and leave
//! the session as it was.

use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;

use crate::{
    cli::BrowseArgs,
    commands,
    preview::{PreviewMode, RowsPerPage},
    session::Session,
};

const HELP: &str = "Commands: next (n), prev (p), page <number>, mode <head|tail|head-and-tail|paginated>, rows <20|50|100>, show, help, quit (q)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    Page(usize),
    Mode(PreviewMode),
    Rows(RowsPerPage),
    Show,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(format!("Too many arguments in '{}'", line.trim()));
        }
        let command = match (verb.as_str(), argument) {
            ("next" | "n", None) => BrowseCommand::Next,
            ("prev" | "previous" | "p", None) => BrowseCommand::Previous,
            ("show" | "", None) => BrowseCommand::Show,
            ("help" | "?", None) => BrowseCommand::Help,
            ("quit" | "exit" | "q", None) => BrowseCommand::Quit,
            ("page", Some(value)) => {
                let number = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("Page must be a positive number, got '{value}'"))?;
                BrowseCommand::Page(number - 1)
            }
            ("mode", Some(value)) => {
                BrowseCommand::Mode(<PreviewMode as ValueEnum>::from_str(value, true)?)
            }
            ("rows", Some(value)) => BrowseCommand::Rows(
                value
                    .parse::<usize>()
                    .ok()
                    .and_then(RowsPerPage::from_count)
                    .ok_or_else(|| format!("Rows per page must be 20, 50, or 100, got '{value}'"))?,
            ),
            (other, _) => return Err(format!("Unknown command '{other}'. {HELP}")),
        };
        Ok(command)
    }
}

pub fn execute(args: &BrowseArgs) -> Result<()> {
    let mut session = commands::open_session(&args.source)?;
    session.set_preview_mode(PreviewMode::Paginated);
    session.set_rows_per_page(args.rows_per_page)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_loop(&mut session, &args.columns, stdin.lock(), stdout.lock())
}

/// Shows the first view, then applies one command per input line until
/// `quit` or end of input.
pub fn run_loop<R, W>(
    session: &mut Session,
    columns: &[String],
    input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    show(session, columns, &mut output)?;
    for line in input.lines() {
        let line = line.context("Reading browse command")?;
        let command = match line.parse::<BrowseCommand>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };
        debug!("Browse command: {command:?}");
        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => writeln!(output, "{HELP}")?,
            BrowseCommand::Show => show(session, columns, &mut output)?,
            BrowseCommand::Next => {
                if session.next_page()? {
                    show(session, columns, &mut output)?;
                } else {
                    writeln!(output, "Already on the last page.")?;
                }
            }
            BrowseCommand::Previous => {
                if session.previous_page()? {
                    show(session, columns, &mut output)?;
                } else {
                    writeln!(output, "Already on the first page.")?;
                }
            }
            BrowseCommand::Page(page) => {
                session.go_to_page(page)?;
                show(session, columns, &mut output)?;
            }
            BrowseCommand::Mode(mode) => {
                session.set_preview_mode(mode);
                show(session, columns, &mut output)?;
            }
            BrowseCommand::Rows(rows_per_page) => {
                session.set_rows_per_page(rows_per_page)?;
                show(session, columns, &mut output)?;
            }
        }
    }
    output.flush().context("Flushing browse output")?;
    Ok(())
}

fn show<W: Write>(session: &Session, columns: &[String], output: &mut W) -> Result<()> {
    let preview = session.preview(columns)?;
    write!(output, "{}", commands::render_preview(&preview))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::StationError,
        loader::{Fetch, LoadOptions, Source},
    };

    struct Offline;

    impl Fetch for Offline {
        fn fetch(&self, url: &str) -> crate::error::Result<Vec<u8>> {
            Err(StationError::Network(format!("offline: {url}")))
        }
    }

    fn session_with_rows(count: usize) -> Session {
        let rows = (1..=count).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut session = Session::new();
        session
            .load(
                &Source::Upload {
                    file_name: "ids.csv".to_string(),
                    bytes: format!("id\n{rows}\n").into_bytes(),
                },
                &LoadOptions::default(),
                &Offline,
            )
            .unwrap();
        session.set_preview_mode(PreviewMode::Paginated);
        session.set_rows_per_page(RowsPerPage::Fifty).unwrap();
        session
    }

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!("n".parse::<BrowseCommand>(), Ok(BrowseCommand::Next));
        assert_eq!("PREV".parse::<BrowseCommand>(), Ok(BrowseCommand::Previous));
        assert_eq!("page 3".parse::<BrowseCommand>(), Ok(BrowseCommand::Page(2)));
        assert_eq!(
            "mode head-and-tail".parse::<BrowseCommand>(),
            Ok(BrowseCommand::Mode(PreviewMode::HeadAndTail))
        );
        assert_eq!(
            "rows 100".parse::<BrowseCommand>(),
            Ok(BrowseCommand::Rows(RowsPerPage::Hundred))
        );
        assert!("rows 30".parse::<BrowseCommand>().is_err());
        assert!("page 0".parse::<BrowseCommand>().is_err());
        assert!("jump".parse::<BrowseCommand>().is_err());
    }

    #[test]
    fn next_walks_pages_and_stops_at_the_end() {
        let mut session = session_with_rows(105);
        let mut output = Vec::new();
        let script = "next\nnext\nnext\nquit\n";
        run_loop(&mut session, &[], script.as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Showing rows 1 to 50 of 105"));
        assert!(text.contains("Showing rows 51 to 100 of 105"));
        assert!(text.contains("Showing rows 101 to 105 of 105"));
        assert!(text.contains("Page 3 of 3"));
        assert!(text.contains("Already on the last page."));
        assert_eq!(session.pagination().page(), 2);
    }

    #[test]
    fn bad_commands_do_not_stop_browsing() {
        let mut session = session_with_rows(60);
        let mut output = Vec::new();
        run_loop(&mut session, &[], "prev\nbogus\nnext\n".as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Already on the first page."));
        assert!(text.contains("Unknown command 'bogus'"));
        assert_eq!(session.pagination().page(), 1);
    }
}
