// Lead controllers: initial load and optimistic editing.

use crate::error::ConsoleError;
use crate::services::backend::LeadBackend;
use crate::state::{Action, Store};
use crate::types::Lead;
use crate::validation::validate_email;

/// Fetch the lead list into the store.
///
/// Clears any previous error, raises the loading flag for the duration of the
/// call and always lowers it again. A fetch failure is stored as the shared
/// error message and returned.
pub async fn load_leads(store: &Store, backend: &dyn LeadBackend) -> Result<usize, ConsoleError> {
    store.dispatch(Action::SetLoading(true));
    store.dispatch(Action::SetError(None));

    let result = backend.fetch_leads().await;

    let outcome = match result {
        Ok(leads) => {
            let count = leads.len();
            log::info!("Loaded {} leads", count);
            store.dispatch(Action::SetLeads(leads));
            Ok(count)
        }
        Err(e) => {
            log::warn!("Lead fetch failed: {}", e);
            store.dispatch(Action::SetError(Some(e.to_string())));
            Err(e)
        }
    };

    store.dispatch(Action::SetLoading(false));
    outcome
}

/// Load-on-mount: fetch only when nothing is loaded and no load is running.
///
/// Returns `Ok(false)` when the fetch was skipped.
pub async fn ensure_leads_loaded(
    store: &Store,
    backend: &dyn LeadBackend,
) -> Result<bool, ConsoleError> {
    let needs_load = store.read(|s| s.leads.is_empty() && !s.is_loading);
    if !needs_load {
        return Ok(false);
    }
    load_leads(store, backend).await.map(|_| true)
}

/// Save an edited lead with optimistic apply and rollback.
///
/// The edit is visible in the store before the backend answers. On success
/// the backend's copy replaces it; on failure the copy captured before the
/// edit is restored, the error message is set and the error is returned.
///
/// Two overlapping saves of the same lead are not coordinated: whichever
/// dispatch lands last wins.
pub async fn update_lead(
    store: &Store,
    backend: &dyn LeadBackend,
    edited: Lead,
) -> Result<Lead, ConsoleError> {
    validate_email(&edited.email)?;

    store.dispatch(Action::SetError(None));

    let rollback = store.read(|s| s.find_lead(&edited.id).cloned());
    if rollback.is_none() {
        log::warn!("Saving lead {} that is not in the store", edited.id);
    }

    store.dispatch(Action::UpdateLead(edited.clone()));

    match backend.update_lead(edited).await {
        Ok(saved) => {
            log::info!("Saved lead {}", saved.id);
            store.dispatch(Action::UpdateLead(saved.clone()));
            Ok(saved)
        }
        Err(e) => {
            log::warn!("Lead save failed, rolling back: {}", e);
            if let Some(previous) = rollback {
                store.dispatch(Action::UpdateLead(previous));
            }
            store.dispatch(Action::SetError(Some(e.to_string())));
            Err(e)
        }
    }
}
