use barbuddy_client::AppState;
use barbuddy_client::ClientError;
use barbuddy_core::{DrunkScaleRating, UserId};

use super::{FriendAction, ProfileAction};
use crate::error::CliError;
use crate::output;

pub async fn run(state: &AppState, action: ProfileAction) -> Result<(), CliError> {
    let profile = state.profile();
    match action {
        ProfileAction::Show { json } => {
            if json {
                return output::json(&profile.get());
            }
            show(state);
        }
        ProfileAction::Onboard {
            first_name,
            last_name,
        } => {
            let id = profile.complete_onboarding(&first_name, &last_name)?;
            output::line(format!("Welcome to BarBuddy, {first_name}! Your id is {id}"));
        }
        ProfileAction::Name {
            first_name,
            last_name,
        } => {
            profile.set_user_name(&first_name, &last_name)?;
            output::line(format!("Name set to {}", profile.get().full_name()));
        }
        ProfileAction::Xp { limit } => xp(state, limit),
        ProfileAction::NightOut => {
            if profile.increment_nights_out() {
                output::line(format!("Night out #{} logged", profile.get().nights_out));
            } else {
                output::line("Already logged a night out today");
            }
        }
        ProfileAction::Rate { value } => {
            let rating = DrunkScaleRating::new(value).map_err(ClientError::from)?;
            if profile.add_drunk_scale_rating(rating) {
                output::line(format!(
                    "Rated {} ({}). Rank: {}",
                    rating.value(),
                    rating.label(),
                    profile.rank().title()
                ));
            } else {
                output::line("Already rated today, try again after midnight");
            }
        }
        ProfileAction::Friend { action } => friends(state, action).await,
        ProfileAction::Reset => {
            if profile.reset_profile() {
                output::line("Profile reset");
            } else {
                return Err(CliError::Usage(
                    "profile has been customized; use reset-stats instead".to_owned(),
                ));
            }
        }
        ProfileAction::ResetStats => {
            profile.reset_stats();
            state.daily_tracker().reset_all_stats();
            output::line("Stats reset");
        }
    }
    Ok(())
}

fn show(state: &AppState) {
    let p = state.profile().get();
    let rank = state.profile().rank();
    let name = p.full_name();
    output::field("Name", if name.trim().is_empty() { "(not set)" } else { name.trim() });
    output::field("User id", &p.user_id);
    output::field("Nights out", p.nights_out);
    output::field("Bars hit", p.bars_hit);
    output::field(
        "Drunk scale",
        format!("{:.1} avg, {} ratings", state.profile().average_drunk_scale(), p.drunk_scale_ratings.len()),
    );
    output::field("Rank", format!("{} (tier {})", rank.title(), rank.tier()));
    output::field("XP", p.xp);
    output::field("Total drinks", p.totals.total());
    output::field("Friends", p.friends.len());
    output::field(
        "Achievements",
        format!(
            "{}/{}",
            state.achievements().completed_count(),
            state.achievements().achievements().len()
        ),
    );
}

fn xp(state: &AppState, limit: usize) {
    let profile = state.profile();
    let rank = profile.xp_rank();
    output::field("Rank", format!("{} {}", rank.title, rank.sub_title));
    output::field("XP", profile.get().xp);
    output::field("To next rank", profile.xp_for_next_rank());
    output::field("Progress", output::bar(profile.progress_to_next_rank()));
    let activities = profile.get().xp_activities;
    if activities.is_empty() {
        return;
    }
    output::line("");
    for activity in activities.iter().rev().take(limit) {
        output::line(format!(
            "{}  +{:<4} {}",
            activity.timestamp.format("%Y-%m-%d %H:%M"),
            activity.xp_awarded,
            activity.description
        ));
    }
}

async fn friends(state: &AppState, action: FriendAction) {
    let profile = state.profile();
    match action {
        FriendAction::List => {
            let friends = profile.get().friends;
            if friends.is_empty() {
                output::line("No friends yet");
            }
            for f in friends {
                output::line(format!(
                    "{:<14} {:<20} {:<16} {} nights, {} bars",
                    f.user_id.as_str(), f.name, f.rank_title, f.nights_out, f.bars_hit
                ));
            }
        }
        FriendAction::Add { user_id } => {
            let id = UserId::new(user_id);
            if profile.add_friend(&id).await {
                output::line(format!("Added {id}"));
            } else {
                output::line(format!("Could not add {id}"));
            }
        }
        FriendAction::Remove { user_id } => {
            let id = UserId::new(user_id);
            if profile.remove_friend(&id) {
                output::line(format!("Removed {id}"));
            } else {
                output::line(format!("{id} is not a friend"));
            }
        }
    }
}

pub fn achievements(state: &AppState) -> Result<(), CliError> {
    for a in state.achievements().achievements() {
        let status = match (a.completed, a.progress, a.max_progress) {
            (true, _, _) => "done".to_owned(),
            (false, Some(p), Some(max)) => format!("{p}/{max}"),
            _ => String::new(),
        };
        output::line(format!("{} {:<28} {:<8} {}", a.icon, a.title, status, a.description));
    }
    if state.achievements().should_show_3am_popup() {
        state.achievements().mark_3am_popup_shown();
        output::line("");
        output::line("It's after 3am. Drink some water.");
    }
    Ok(())
}
