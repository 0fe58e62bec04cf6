//! Interactive symbol picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `fx forecast` and choose a pair" UX
//!
//! The picker offers the symbol list of the selected source but accepts any
//! typed symbol.

use std::io::{self, IsTerminal, Write};

use crate::domain::{SourceKind, Symbol};
use crate::error::{AppError, EXIT_USAGE};

/// Use the symbol given on the command line, or ask for one.
///
/// When stdin is not a terminal the flag is required.
pub fn resolve_symbol(given: Option<Symbol>, flag: &str, label: &str, source: SourceKind) -> Result<Symbol, AppError> {
    if let Some(symbol) = given {
        return Ok(symbol);
    }
    if !io::stdin().is_terminal() {
        return Err(AppError::new(EXIT_USAGE, format!("Missing {flag} <SYMBOL>.")));
    }
    prompt_for_symbol(label, source.symbol_choices())
}

/// Prompt the user to select a symbol.
///
/// Behavior:
/// - list the offered symbols
/// - accept either a number (from the list) or a symbol
/// - `q` cancels
pub fn prompt_for_symbol(label: &str, choices: &[&str]) -> Result<Symbol, AppError> {
    println!("{label}:");
    for (idx, symbol) in choices.iter().enumerate() {
        println!("{:>3}) {symbol}", idx + 1);
    }

    loop {
        print!("Select by number (1-{}) or type a symbol (q to quit): ", choices.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(EXIT_USAGE, "No input received."));
        }

        match parse_choice(input.trim(), choices) {
            Ok(Some(symbol)) => return Ok(symbol),
            Ok(None) => return Err(AppError::new(EXIT_USAGE, "Canceled.")),
            Err(msg) => println!("{msg}"),
        }
    }
}

/// Interpret one line of picker input. `Ok(None)` means the user quit.
fn parse_choice(input: &str, choices: &[&str]) -> Result<Option<Symbol>, String> {
    if input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }

    if let Ok(choice) = input.parse::<usize>() {
        if (1..=choices.len()).contains(&choice) {
            return Symbol::new(choices[choice - 1]).map(Some).map_err(|e| e.to_string());
        }
        return Err(format!(
            "Invalid choice: {choice}. Enter a number between 1 and {}.",
            choices.len()
        ));
    }

    Symbol::new(input).map(Some).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FOREX_SYMBOLS;

    #[test]
    fn numbers_pick_from_the_list() {
        let picked = parse_choice("2", &FOREX_SYMBOLS).unwrap().unwrap();
        assert_eq!(picked.as_str(), "EUR");
    }

    #[test]
    fn typed_symbols_pass_through() {
        let picked = parse_choice("NZD", &FOREX_SYMBOLS).unwrap().unwrap();
        assert_eq!(picked.as_str(), "NZD");
    }

    #[test]
    fn out_of_range_and_quit() {
        assert!(parse_choice("99", &FOREX_SYMBOLS).is_err());
        assert!(parse_choice("", &FOREX_SYMBOLS).is_err());
        assert_eq!(parse_choice("Q", &FOREX_SYMBOLS), Ok(None));
    }

    #[test]
    fn given_symbol_skips_prompt() {
        let usd = Symbol::new("USD").unwrap();
        let got = resolve_symbol(Some(usd.clone()), "--base", "Base", SourceKind::Sample).unwrap();
        assert_eq!(got, usd);
    }
}
