use barbuddy_core::Theme;
use serde::{Deserialize, Serialize};

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct ThemeState {
    theme: Theme,
}

impl StoreState for ThemeState {
    const KEY: &'static str = "theme-storage";
}

/// Color scheme preference. Dark until changed.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    state: PersistedStore<ThemeState>,
}

impl ThemeStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self { state: ctx.open() }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.state.read(|s| s.theme)
    }

    pub fn set_theme(&self, theme: Theme) {
        self.state.update(|s| s.theme = theme);
    }

    /// Switch to the other theme and return it.
    pub fn toggle_theme(&self) -> Theme {
        self.state.update(|s| {
            s.theme = s.theme.toggled();
            s.theme
        })
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}
