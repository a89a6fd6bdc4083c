use barbuddy_client::{AppState, venues};
use barbuddy_core::{
    SpecialId, Venue, VenueId, current_day_name, format_open_hours, format_price,
    format_time_slot,
};
use chrono::{Datelike, Timelike, Weekday};

use super::VenueAction;
use crate::error::CliError;
use crate::output;

pub fn run(state: &AppState, action: VenueAction) -> Result<(), CliError> {
    let today = state.context().now().with_timezone(&state.context().offset());
    match action {
        VenueAction::List => {
            let favorites = state.favorites();
            for venue in venues::all() {
                let star = if favorites.is_favorite_venue(&venue.id) { "*" } else { " " };
                output::line(format!(
                    "{star} {:<4} {:<28} {:<5} {}",
                    venue.id.as_str(),
                    venue.name,
                    format_price(venue.price_level),
                    format_open_hours(venue.hours_on(today.weekday()))
                ));
            }
        }
        VenueAction::Show { venue_id } => show(state, find(&venue_id)?, today.weekday()),
        VenueAction::Specials { day, kind } => {
            let day = day.unwrap_or_else(|| today.weekday());
            let specials: Vec<_> = match kind {
                Some(kind) => venues::specials_by_type(kind)
                    .into_iter()
                    .filter(|(_, s)| s.day == day)
                    .collect(),
                None => venues::specials_for_day(day),
            };
            if specials.is_empty() {
                output::line("No specials");
            }
            for (venue, special) in specials {
                let star = if state.favorites().is_favorite_special(&special.id) { "*" } else { " " };
                output::line(format!(
                    "{star} {:<24} {:<28} {} - {}",
                    venue.name,
                    special.title,
                    format_time_slot(&special.start_time),
                    format_time_slot(&special.end_time)
                ));
            }
        }
        VenueAction::CheckIn { venue_id, arrival } => {
            let venue = find(&venue_id)?;
            if state
                .venue_interaction()
                .increment_interaction(&venue.id, arrival.as_deref())
            {
                state.profile().increment_bars_hit();
                output::line(format!("Checked in at {}", venue.name));
            } else {
                output::line(format!(
                    "Already checked in at {} in the last two hours",
                    venue.name
                ));
            }
        }
        VenueAction::Like { venue_id, slot } => {
            let venue = find(&venue_id)?;
            let slot = slot.unwrap_or_else(|| {
                let half = if today.minute() >= 30 { 30 } else { 0 };
                format!("{}:{half:02}", today.hour())
            });
            if state.venue_interaction().like_venue(&venue.id, &slot) {
                output::line(format!("Liked {} at {}", venue.name, format_time_slot(&slot)));
            } else {
                output::line(format!("Already liked {} today", venue.name));
            }
        }
        VenueAction::Popular => {
            for (id, count) in state.venue_interaction().most_popular_venues() {
                let name = venues::find(&id).map_or(id.as_str(), |v| v.name.as_str());
                output::line(format!("{count:>4}  {name}"));
            }
            output::field("Total likes", state.venue_interaction().total_likes());
            output::field("Bars visited", state.venue_interaction().total_bars_visited());
        }
        VenueAction::Favorite { venue_id } => {
            let venue = find(&venue_id)?;
            let on = state.favorites().toggle_venue(venue.id.clone());
            output::line(format!(
                "{} {} favorites",
                venue.name,
                if on { "added to" } else { "removed from" }
            ));
        }
        VenueAction::FavoriteSpecial { special_id } => {
            let id = SpecialId::new(special_id);
            let known = venues::all()
                .iter()
                .any(|v| v.specials.iter().any(|s| s.id == id));
            if !known {
                return Err(CliError::Usage(format!("no special {id}")));
            }
            let on = state.favorites().toggle_special(id.clone());
            output::line(format!(
                "{id} {} favorites",
                if on { "added to" } else { "removed from" }
            ));
        }
    }
    Ok(())
}

fn find(id: &str) -> Result<&'static Venue, CliError> {
    venues::find(&VenueId::new(id)).ok_or_else(|| CliError::Usage(format!("no venue {id}")))
}

fn show(state: &AppState, venue: &Venue, today: Weekday) {
    let interactions = state.venue_interaction();
    output::line(&venue.name);
    output::line(&venue.description);
    output::line("");
    output::field("Address", &venue.address);
    output::field("Phone", &venue.phone);
    output::field("Price", format_price(venue.price_level));
    output::field("Rating", venue.rating);
    output::field(
        current_day_name(&state.context().now().with_timezone(&state.context().offset())),
        format_open_hours(venue.hours_on(today)),
    );
    output::field("Check-ins", interactions.interaction_count(&venue.id));
    output::field("Likes", interactions.like_count(&venue.id));
    if let Some(arrival) = interactions.popular_arrival_time(&venue.id) {
        output::field("Usually arrive", format_time_slot(&arrival));
    }
    if let Some((slot, likes)) = interactions.hot_time(&venue.id) {
        output::field("Hot time", format!("{} ({likes} likes)", format_time_slot(&slot)));
    }

    let activity = interactions.time_slot_activity(&venue.id);
    if activity.iter().any(|a| a.visits > 0 || a.likes > 0) {
        output::line("");
        for slot in activity {
            let marker = match (slot.is_current, slot.is_peak) {
                (true, _) => "<- now",
                (false, true) => "peak",
                _ => "",
            };
            output::line(format!(
                "{:>9}  {:>3} visits {:>3} likes  {marker}",
                format_time_slot(&slot.time),
                slot.visits,
                slot.likes
            ));
        }
    }

    let specials: Vec<_> = venue.specials_on(today).collect();
    if !specials.is_empty() {
        output::line("");
        for special in specials {
            output::line(format!("{}: {}", special.title, special.description));
        }
    }
}
