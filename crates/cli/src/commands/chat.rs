use std::collections::HashSet;
use std::time::Duration;

use barbuddy_client::AppState;
use barbuddy_client::stores::ChatMessage;
use barbuddy_core::{ChatMessageId, VenueId};

use super::ChatAction;
use crate::error::CliError;
use crate::output;

pub async fn run(state: &AppState, action: ChatAction) -> Result<(), CliError> {
    let chat = state.venue_chat();
    match action {
        ChatAction::Read { venue_id } => {
            let venue = VenueId::new(venue_id);
            chat.create_or_get_session(&venue).await;
            chat.load_messages(&venue).await;
            if let Some(error) = chat.get().error {
                return Err(CliError::Usage(error));
            }
            let messages = chat.messages();
            if messages.is_empty() {
                output::line("No messages tonight");
            }
            messages.iter().for_each(print);
        }
        ChatAction::Send { venue_id, message } => {
            let venue = VenueId::new(venue_id);
            let session = chat.create_or_get_session(&venue).await;
            chat.send_message(&venue, &message)?;
            output::line(format!("Sent as {}", session.anonymous_name));
        }
        ChatAction::Watch { venue_id, seconds } => {
            let venue = VenueId::new(venue_id);
            let session = chat.create_or_get_session(&venue).await;
            output::line(format!("Watching as {}", session.anonymous_name));
            watch(state, &venue, Duration::from_secs(seconds)).await;
        }
    }
    Ok(())
}

async fn watch(state: &AppState, venue: &VenueId, duration: Duration) {
    let chat = state.venue_chat();
    let mut seen: HashSet<ChatMessageId> = HashSet::new();
    let mut rx = chat.watch();
    chat.subscribe(venue);

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    loop {
        let fresh: Vec<ChatMessage> = rx
            .borrow_and_update()
            .messages
            .iter()
            .filter(|m| !seen.contains(&m.id))
            .cloned()
            .collect();
        for message in fresh {
            print(&message);
            seen.insert(message.id);
        }
        tokio::select! {
            () = &mut deadline => break,
            changed = rx.changed() => if changed.is_err() { break },
        }
    }
    chat.unsubscribe();
}

fn print(message: &ChatMessage) {
    output::line(format!(
        "{} {:<20} {}",
        message.created_at.format("%H:%M"),
        message.anonymous_name,
        message.content
    ));
}
