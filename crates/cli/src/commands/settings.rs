//! Theme, terms and age gate.

use barbuddy_client::AppState;

use super::{AgeAction, TermsAction, ThemeAction};
use crate::error::CliError;
use crate::output;

pub fn theme(state: &AppState, action: ThemeAction) -> Result<(), CliError> {
    let theme = match action {
        ThemeAction::Show => state.theme().theme(),
        ThemeAction::Set { theme } => {
            state.theme().set_theme(theme);
            theme
        }
        ThemeAction::Toggle => state.theme().toggle_theme(),
    };
    output::line(theme);
    Ok(())
}

pub fn terms(state: &AppState, action: TermsAction) -> Result<(), CliError> {
    if matches!(action, TermsAction::Accept) {
        state.terms().accept_terms(None);
    }
    match state.terms().acceptance_record() {
        Some(record) if state.terms().has_accepted_terms() => output::line(format!(
            "Accepted version {} on {}",
            record.version,
            record.timestamp.format("%Y-%m-%d")
        )),
        _ => output::line("Terms not accepted"),
    }
    Ok(())
}

pub fn age(state: &AppState, action: AgeAction) -> Result<(), CliError> {
    match action {
        AgeAction::Status => {}
        AgeAction::Verify => state.age_verification().set_verified(true),
        AgeAction::Revoke => state.age_verification().set_verified(false),
    }
    let record = state.age_verification().get();
    match record.verification_date {
        Some(date) if record.is_verified => {
            output::line(format!("Verified on {}", date.format("%Y-%m-%d")));
        }
        _ => output::line("Not verified"),
    }
    Ok(())
}
