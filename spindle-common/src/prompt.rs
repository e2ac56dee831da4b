//! Blocking terminal prompts
//!
//! Both tools are fully interactive with no flags; every decision comes from
//! a line read at the terminal. These helpers keep the prompt loops out of
//! the workflow code.

use std::io::{BufRead, ErrorKind, Write};

/// Read one trimmed line from stdin after printing `prompt`
///
/// A closed stdin is an error, not an empty answer; the re-prompt loops
/// built on top of this must terminate when no more input can arrive.
pub fn read_line(prompt: &str) -> std::io::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    read_trimmed_line(&mut std::io::stdin().lock())
}

fn read_trimmed_line<R: BufRead>(input: &mut R) -> std::io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "input closed",
        ));
    }
    Ok(line.trim().to_string())
}

/// Ask a yes/no question, re-prompting until the answer is recognizable
///
/// Propagates I/O errors (including closed stdin) instead of re-prompting.
pub fn confirm(question: &str) -> std::io::Result<bool> {
    loop {
        let answer = read_line(&format!("{} (y/n): ", question))?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please enter 'y' or 'n'"),
        }
    }
}

/// Ask for a numeric menu choice in `1..=max`, re-prompting on bad input
pub fn menu_choice(prompt: &str, max: usize) -> std::io::Result<usize> {
    loop {
        let answer = read_line(prompt)?;
        match answer.parse::<usize>() {
            Ok(n) if n >= 1 && n <= max => return Ok(n),
            _ => println!("Invalid choice. Enter a number between 1 and {}", max),
        }
    }
}
