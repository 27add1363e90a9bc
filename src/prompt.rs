//! Terminal collaborators: candidate selection, first-run questions and
//! hidden secret entry. Everything is written to stderr so stdout only
//! carries command output.

use std::io::{self, BufRead, IsTerminal, Write};
use vstore::{Disambiguator, FuzzyMatch, Result, SettingsPrompt, VstoreError};

/// Reads a candidate index from standard input
pub struct StdinSelector {
    attempts: u32,
}

impl StdinSelector {
    pub fn new(attempts: u32) -> Self {
        Self { attempts }
    }
}

impl Disambiguator for StdinSelector {
    fn select(&mut self, query: &str, candidates: &[FuzzyMatch]) -> Result<usize> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        select_from(&mut input, &mut io::stderr(), query, candidates, self.attempts)
    }
}

fn select_from(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    query: &str,
    candidates: &[FuzzyMatch],
    attempts: u32,
) -> Result<usize> {
    if candidates.is_empty() {
        writeln!(output, "No object matches {query}")?;
    } else {
        writeln!(output, "Several objects match {query}:")?;
    }
    for (index, candidate) in candidates.iter().enumerate() {
        writeln!(output, "{index} => {}", candidate.path)?;
    }
    writeln!(output, "{} => ... new file path", candidates.len())?;

    for _ in 0..attempts {
        write!(output, "Select: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim().parse::<usize>() {
            Ok(index) if index <= candidates.len() => return Ok(index),
            _ => writeln!(output, "Pick a number between 0 and {}", candidates.len())?,
        }
    }

    Err(VstoreError::PathResolutionFailure(format!(
        "no object selected for {query}"
    )))
}

/// Asks the first-run questions on the terminal
pub struct TerminalPrompt;

impl SettingsPrompt for TerminalPrompt {
    fn master_key(&mut self) -> Result<String> {
        eprintln!("No settings found, creating new ones.");
        secret("Master key: ")
    }

    fn remote(&mut self) -> Result<String> {
        eprint!("Remote URL: ");
        io::stderr().flush()?;
        read_line(&mut io::stdin().lock())
    }
}

/// Hidden entry on a terminal, a plain line when stdin is piped
pub fn secret(label: &str) -> Result<String> {
    if io::stdin().is_terminal() {
        return Ok(rpassword::prompt_password(label)?);
    }
    eprint!("{label}");
    io::stderr().flush()?;
    read_line(&mut io::stdin().lock())
}

fn read_line(input: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(VstoreError::Other("unexpected end of input".into()));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use vstore::resolver::fuzzy_find;

    fn candidates() -> Vec<FuzzyMatch> {
        fuzzy_find("db", &["svc/db".to_string(), "work/dbadmin".to_string()])
    }

    fn run(input: &str, attempts: u32) -> (Result<usize>, String) {
        let mut output = Vec::new();
        let result = select_from(
            &mut Cursor::new(input.as_bytes()),
            &mut output,
            "db",
            &candidates(),
            attempts,
        );
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn lists_candidates_and_new_entry() {
        let (result, output) = run("1\n", 3);
        assert_eq!(result.unwrap(), 1);
        assert!(output.contains("0 => svc/db"));
        assert!(output.contains("1 => work/dbadmin"));
        assert!(output.contains("2 => ... new file path"));
    }

    #[test]
    fn new_entry_is_candidate_count() {
        let (result, _) = run("2\n", 3);
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn retries_unreadable_input() {
        let (result, output) = run("abc\n7\n0\n", 3);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(output.matches("Pick a number").count(), 2);
    }

    #[test]
    fn gives_up_after_attempts() {
        let (result, _) = run("x\ny\nz\n0\n", 3);
        assert!(matches!(result, Err(VstoreError::PathResolutionFailure(_))));
    }

    #[test]
    fn end_of_input_fails() {
        let (result, _) = run("", 3);
        assert!(matches!(result, Err(VstoreError::PathResolutionFailure(_))));
    }

    #[test]
    fn read_line_strips_newline() {
        let mut input = Cursor::new(b"git@host:repo.git\r\nrest".to_vec());
        assert_eq!(read_line(&mut input).unwrap(), "git@host:repo.git");
        assert!(read_line(&mut Cursor::new(Vec::new())).is_err());
    }
}
