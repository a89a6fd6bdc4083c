use barbuddy_core::{SpecialId, VenueId};
use serde::{Deserialize, Serialize};

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

/// Favorited venues and specials, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Favorites {
    pub favorite_venues: Vec<VenueId>,
    pub favorite_specials: Vec<SpecialId>,
}

impl StoreState for Favorites {
    const KEY: &'static str = "favorites-storage";
}

fn add_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        false
    } else {
        list.push(item);
        true
    }
}

fn remove_item<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    let before = list.len();
    list.retain(|x| x != item);
    list.len() != before
}

fn toggle<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if remove_item(list, &item) {
        false
    } else {
        list.push(item);
        true
    }
}

#[derive(Debug, Clone)]
pub struct FavoritesStore {
    state: PersistedStore<Favorites>,
}

impl FavoritesStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self { state: ctx.open() }
    }

    #[must_use]
    pub fn get(&self) -> Favorites {
        self.state.get()
    }

    /// Returns `false` if the venue was already a favorite.
    pub fn add_venue(&self, id: VenueId) -> bool {
        self.state.update(|s| add_unique(&mut s.favorite_venues, id))
    }

    pub fn remove_venue(&self, id: &VenueId) -> bool {
        self.state.update(|s| remove_item(&mut s.favorite_venues, id))
    }

    /// Flip the venue's favorite status; returns the new status.
    pub fn toggle_venue(&self, id: VenueId) -> bool {
        self.state.update(|s| toggle(&mut s.favorite_venues, id))
    }

    #[must_use]
    pub fn is_favorite_venue(&self, id: &VenueId) -> bool {
        self.state.read(|s| s.favorite_venues.contains(id))
    }

    pub fn add_special(&self, id: SpecialId) -> bool {
        self.state.update(|s| add_unique(&mut s.favorite_specials, id))
    }

    pub fn remove_special(&self, id: &SpecialId) -> bool {
        self.state.update(|s| remove_item(&mut s.favorite_specials, id))
    }

    pub fn toggle_special(&self, id: SpecialId) -> bool {
        self.state.update(|s| toggle(&mut s.favorite_specials, id))
    }

    #[must_use]
    pub fn is_favorite_special(&self, id: &SpecialId) -> bool {
        self.state.read(|s| s.favorite_specials.contains(id))
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}
