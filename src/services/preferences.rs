// Preference controllers: restore at startup, save on every change, reset.

use crate::preferences::Preferences;
use crate::state::{Action, Store};
use crate::types::{LeadFilters, LeadSort};

/// Apply saved filter and sort descriptors, if any. Returns what was restored.
pub fn restore_preferences(store: &Store, prefs: &Preferences) -> (bool, bool) {
    let filters = prefs.load_filters();
    let sort = prefs.load_sort();
    let restored = (filters.is_some(), sort.is_some());

    if let Some(filters) = filters {
        store.dispatch(Action::SetFilters(filters));
    }
    if let Some(sort) = sort {
        store.dispatch(Action::SetSort(sort));
    }

    log::debug!(
        "Restored preferences: filters={} sort={}",
        restored.0,
        restored.1
    );
    restored
}

pub fn apply_filters(store: &Store, prefs: &Preferences, filters: LeadFilters) {
    prefs.save_filters(&filters);
    store.dispatch(Action::SetFilters(filters));
}

pub fn apply_sort(store: &Store, prefs: &Preferences, sort: LeadSort) {
    prefs.save_sort(&sort);
    store.dispatch(Action::SetSort(sort));
}

/// Clear saved entries, restore the defaults and write the defaults back.
pub fn reset_preferences(store: &Store, prefs: &Preferences) {
    prefs.clear();

    let filters = LeadFilters::default();
    let sort = LeadSort::default();
    store.dispatch(Action::SetFilters(filters.clone()));
    store.dispatch(Action::SetSort(sort));

    prefs.save_filters(&filters);
    prefs.save_sort(&sort);
    log::info!("Lead filters and sort reset to defaults");
}
