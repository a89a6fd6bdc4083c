//! Terminal output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Display;

use serde::Serialize;

use crate::error::CliError;

pub fn line(text: impl Display) {
    println!("{text}");
}

pub fn field(label: &str, value: impl Display) {
    println!("{label:<18}{value}");
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn error(err: &CliError) {
    eprintln!("error: {err}");
}

/// `[####------] 40%` for a percentage.
pub fn bar(percent: f64) -> String {
    let fraction = (percent / 100.0).clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (fraction * 10.0).round() as usize;
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(10 - filled),
        fraction * 100.0
    )
}
