use barbuddy_client::{AppState, ClientError};
use barbuddy_core::{DrunkScaleRating, Stat};

use super::TrackerAction;
use crate::error::CliError;
use crate::output;

pub async fn run(state: &AppState, action: TrackerAction) -> Result<(), CliError> {
    let tracker = state.daily_tracker();
    match action {
        TrackerAction::Show => show(state),
        TrackerAction::Add { stat, by } => {
            let value = tracker.update_stat(stat, by);
            output::line(format!("{stat}: {value}"));
        }
        TrackerAction::Remove { stat, by } => {
            let value = tracker.update_stat(stat, by.saturating_neg());
            output::line(format!("{stat}: {value}"));
        }
        TrackerAction::Rate { value } => {
            let rating = DrunkScaleRating::new(value).map_err(ClientError::from)?;
            tracker.set_drunk_scale(rating);
            output::line(format!("Tonight: {} ({})", rating.value(), rating.label()));
        }
        TrackerAction::Save => {
            let added = tracker.save_to_profile();
            output::line(format!(
                "Saved {} new drinks and games to your profile",
                added.total()
            ));
        }
        TrackerAction::Sync => {
            tracker.load_today_stats().await;
            show(state);
        }
        TrackerAction::Reset => {
            tracker.reset_all_stats();
            output::line("Tracker reset");
        }
    }
    Ok(())
}

fn show(state: &AppState) {
    let tracker = state.daily_tracker();
    let daily = tracker.daily();
    let totals = tracker.get().totals;
    output::line(format!("{:<20}{:>8}{:>8}", "", "tonight", "total"));
    for stat in Stat::ALL {
        output::line(format!(
            "{:<20}{:>8}{:>8}",
            stat.as_str(),
            daily.counts.get(stat),
            totals.get(stat)
        ));
    }
    output::line(format!(
        "{:<20}{:>8}{:>8}",
        "all",
        tracker.daily_total(),
        tracker.total_count()
    ));
    if let Some(rating) = daily.drunk_scale {
        output::field("Drunk scale", format!("{} ({})", rating.value(), rating.label()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use barbuddy_client::ClientConfig;

    use super::*;

    #[tokio::test]
    async fn test_remove_by_min_clamps_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(ClientConfig::demo(dir.path())).unwrap();
        state.daily_tracker().update_stat(Stat::Shots, 2);

        run(&state, TrackerAction::Remove { stat: Stat::Shots, by: i64::MIN })
            .await
            .unwrap();
        assert_eq!(state.daily_tracker().daily().counts.shots, 0);
        state.shutdown().await;
    }
}
