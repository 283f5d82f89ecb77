//! Interactive prompts
//!
//! Yes/no confirmation and the import strategy question.

use anyhow::Result;
use std::io::{self, BufRead, Write};

use shelf_core::MergeStrategy;

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(parse_yes(&input))
}

/// Ask whether an import should merge or replace
///
/// Without a TTY the answer is `Merge`.
pub fn prompt_strategy() -> Result<MergeStrategy> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(MergeStrategy::Merge);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Merge with existing data or replace it? [M/r] ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(MergeStrategy::Merge);
        };
        match parse_strategy(&line?) {
            Some(strategy) => return Ok(strategy),
            None => println!("Please answer 'm' (merge) or 'r' (replace)."),
        }
    }
}

fn parse_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

/// Empty input picks the default
fn parse_strategy(input: &str) -> Option<MergeStrategy> {
    let input = input.trim();
    if input.is_empty() {
        return Some(MergeStrategy::default());
    }
    input.parse().ok()
}
