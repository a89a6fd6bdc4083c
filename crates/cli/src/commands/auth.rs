use barbuddy_client::AppState;

use super::AuthAction;
use crate::error::CliError;
use crate::output;

pub async fn run(state: &AppState, action: AuthAction) -> Result<(), CliError> {
    match action {
        AuthAction::Status => match state.auth().current_user() {
            Some(user) => {
                output::field("Signed in as", &user.email);
                output::field("Account id", &user.id);
            }
            None => output::line("Not signed in"),
        },
        AuthAction::SignIn { email, password } => {
            state.sign_in(&email, &password).await?;
            output::line(format!("Signed in as {email}"));
        }
        AuthAction::SignUp {
            email,
            password,
            first_name,
            last_name,
        } => {
            let user = state
                .auth()
                .sign_up(&email, &password, &first_name, &last_name)
                .await?;
            state.profile().load_from_remote(&user).await;
            output::line(format!("Account created for {}", user.email));
        }
        AuthAction::SignOut => {
            state.auth().sign_out();
            output::line("Signed out");
        }
    }
    Ok(())
}
