use barbuddy_client::AppState;
use barbuddy_core::TaskId;

use super::BingoAction;
use crate::error::CliError;
use crate::output;

pub async fn run(state: &AppState, action: BingoAction) -> Result<(), CliError> {
    let bingo = state.bingo();
    match action {
        BingoAction::Show => show(state),
        BingoAction::Complete { task_id } => {
            let id = TaskId::new(task_id);
            if !bingo.tasks().iter().any(|t| t.id == id) {
                return Err(CliError::Usage(format!("no bingo task named {id}")));
            }
            if bingo.complete_task(&id) {
                output::line(format!("{id} done ({}/9)", bingo.completed_count()));
                if bingo.is_completed() {
                    output::line("BINGO! Card complete.");
                }
            } else {
                output::line(format!("{id} was already done"));
            }
        }
        BingoAction::Reset => {
            bingo.reset_bingo();
            output::line("Card cleared");
        }
        BingoAction::Sync => {
            bingo.load_from_remote().await;
            show(state);
        }
    }
    Ok(())
}

fn show(state: &AppState) {
    for task in state.bingo().tasks() {
        let mark = if task.completed { "x" } else { " " };
        output::line(format!("[{mark}] {} {:<22} {}", task.emoji, task.id.as_str(), task.title));
    }
    output::line(format!("{}/9 complete", state.bingo().completed_count()));
}
