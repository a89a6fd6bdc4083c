//! Subcommand definitions and handlers.

use barbuddy_core::{SpecialType, Stat, Theme};
use chrono::Weekday;
use clap::Subcommand;

pub mod auth;
pub mod bingo;
pub mod chat;
pub mod photos;
pub mod profile;
pub mod settings;
pub mod tracker;
pub mod venues;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile summary
    Show {
        /// Print the raw profile as JSON
        #[arg(long)]
        json: bool,
    },
    /// Finish onboarding and get a user id
    Onboard { first_name: String, last_name: String },
    /// Change the display name
    Name { first_name: String, last_name: String },
    /// XP rank and recent activity
    Xp {
        /// Number of activities to list
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Count tonight as a night out (once per day)
    NightOut,
    /// Submit a drunk-scale rating, 1-10 (once per day)
    Rate { value: i64 },
    /// Manage friends
    Friend {
        #[command(subcommand)]
        action: FriendAction,
    },
    /// Clear everything unless the profile was customized
    Reset,
    /// Zero the counters but keep name and friends
    ResetStats,
}

#[derive(Subcommand)]
pub enum FriendAction {
    /// List friends
    List,
    /// Look a user up by id and add them
    Add { user_id: String },
    /// Remove a friend
    Remove { user_id: String },
}

#[derive(Subcommand)]
pub enum TrackerAction {
    /// Tonight's counters
    Show,
    /// Add to a counter
    Add {
        stat: Stat,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },
    /// Subtract from a counter (never below zero)
    Remove {
        stat: Stat,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },
    /// Set tonight's drunk-scale rating
    Rate { value: i64 },
    /// Fold tonight's counters into the profile
    Save,
    /// Pull today's counters from the backend
    Sync,
    /// Zero tonight and the running totals
    Reset,
}

#[derive(Subcommand)]
pub enum BingoAction {
    /// Show the card
    Show,
    /// Mark a task done
    Complete { task_id: String },
    /// Clear the card
    Reset,
    /// Merge completions from the backend
    Sync,
}

#[derive(Subcommand)]
pub enum VenueAction {
    /// List venues
    List,
    /// Venue details, hours and activity
    Show { venue_id: String },
    /// Specials for a day (default today)
    Specials {
        #[arg(long)]
        day: Option<Weekday>,
        #[arg(long = "type")]
        kind: Option<SpecialType>,
    },
    /// Check in at a venue (every two hours at most)
    CheckIn {
        venue_id: String,
        /// Arrival slot such as 21:30
        #[arg(long)]
        arrival: Option<String>,
    },
    /// Like a venue (once per day)
    Like {
        venue_id: String,
        /// Time slot such as 23:00, defaults to now
        #[arg(long)]
        slot: Option<String>,
    },
    /// Most checked-into venues
    Popular,
    /// Toggle a venue as favorite
    Favorite { venue_id: String },
    /// Toggle a special as favorite
    FavoriteSpecial { special_id: String },
}

#[derive(Subcommand)]
pub enum ChatAction {
    /// Print recent messages
    Read { venue_id: String },
    /// Post a message (1-200 characters)
    Send { venue_id: String, message: String },
    /// Follow a venue's chat
    Watch {
        venue_id: String,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

#[derive(Subcommand)]
pub enum PhotoAction {
    /// List saved photos, newest first
    List,
    /// Save a photo by URI
    Add { uri: String },
    /// Delete a photo
    Remove { photo_id: String },
    /// Delete every photo
    Clear,
}

#[derive(Subcommand)]
pub enum ThemeAction {
    Show,
    Set { theme: Theme },
    Toggle,
}

#[derive(Subcommand)]
pub enum TermsAction {
    /// Show acceptance status
    Status,
    /// Accept the current terms
    Accept,
}

#[derive(Subcommand)]
pub enum AgeAction {
    Status,
    /// Confirm the user is of drinking age
    Verify,
    /// Clear the verification
    Revoke,
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Show the signed-in account
    Status,
    SignIn {
        email: String,
        #[arg(long)]
        password: String,
    },
    SignUp {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    SignOut,
}
