use barbuddy_client::AppState;
use barbuddy_core::PhotoId;

use super::PhotoAction;
use crate::error::CliError;
use crate::output;

pub fn run(state: &AppState, action: PhotoAction) -> Result<(), CliError> {
    let roll = state.camera_roll();
    match action {
        PhotoAction::List => {
            for photo in roll.photos() {
                output::line(format!(
                    "{}  {}  {}",
                    photo.id,
                    photo.timestamp.format("%Y-%m-%d %H:%M"),
                    photo.filename
                ));
            }
            output::line(format!("{} photos", roll.photo_count()));
        }
        PhotoAction::Add { uri } => {
            let photo = state.record_photo(uri);
            output::line(format!("Saved {} as {}", photo.filename, photo.id));
        }
        PhotoAction::Remove { photo_id } => {
            let id = PhotoId::new(photo_id);
            if !roll.remove_photo(&id) {
                return Err(CliError::Usage(format!("no photo {id}")));
            }
            output::line(format!("Removed {id}"));
        }
        PhotoAction::Clear => {
            roll.clear_all_photos();
            output::line("Camera roll cleared");
        }
    }
    Ok(())
}
