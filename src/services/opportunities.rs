// Conversion controller: lead → opportunity, at most once per lead.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::error::ConsoleError;
use crate::services::backend::LeadBackend;
use crate::state::{Action, Store};
use crate::types::{Lead, LeadStatus, Opportunity, OpportunityDraft};
use crate::validation::validate_draft;

/// Leads with a conversion currently waiting on the backend.
///
/// Holding a claim is what makes the uniqueness check meaningful across
/// overlapping conversions of the same lead.
#[derive(Default)]
pub struct ConversionLocks {
    in_flight: Mutex<HashSet<String>>,
}

impl ConversionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self, lead_id: &str) -> Option<ConversionClaim<'_>> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(lead_id.to_string()) {
            return None;
        }
        Some(ConversionClaim {
            locks: self,
            lead_id: lead_id.to_string(),
        })
    }

    pub fn is_converting(&self, lead_id: &str) -> bool {
        self.in_flight.lock().contains(lead_id)
    }
}

/// Releases the lead on drop, including when the conversion future is dropped.
struct ConversionClaim<'a> {
    locks: &'a ConversionLocks,
    lead_id: String,
}

impl Drop for ConversionClaim<'_> {
    fn drop(&mut self) {
        self.locks.in_flight.lock().remove(&self.lead_id);
    }
}

fn reject(store: &Store, err: ConsoleError) -> ConsoleError {
    log::warn!("Conversion rejected: {}", err);
    store.dispatch(Action::SetError(Some(err.to_string())));
    err
}

/// Convert a lead into a new opportunity.
///
/// Fails with `AlreadyConverted` before touching the backend if the lead
/// already has an opportunity, and with `ConversionInProgress` if another
/// conversion of the same lead is still running. On success the opportunity
/// is appended and the lead's status becomes `qualified`.
pub async fn convert_lead(
    store: &Store,
    backend: &dyn LeadBackend,
    locks: &ConversionLocks,
    lead_id: &str,
    draft: OpportunityDraft,
) -> Result<Opportunity, ConsoleError> {
    validate_draft(&draft)?;

    store.dispatch(Action::SetError(None));

    if store.read(|s| s.is_lead_converted(lead_id)) {
        return Err(reject(store, ConsoleError::AlreadyConverted));
    }

    let _claim = match locks.claim(lead_id) {
        Some(claim) => claim,
        None => return Err(reject(store, ConsoleError::ConversionInProgress)),
    };

    let opportunity = match backend.convert_lead(lead_id, draft).await {
        Ok(opportunity) => opportunity,
        Err(e) => {
            log::warn!("Conversion of lead {} failed: {}", lead_id, e);
            store.dispatch(Action::SetError(Some(e.to_string())));
            return Err(e);
        }
    };

    // The store may have changed while we waited; keep the one-per-lead rule.
    if store.read(|s| s.is_lead_converted(lead_id)) {
        return Err(reject(store, ConsoleError::AlreadyConverted));
    }

    log::info!("Converted lead {} into {}", lead_id, opportunity.id);
    store.dispatch(Action::AddOpportunity(opportunity.clone()));

    if let Some(lead) = store.read(|s| s.find_lead(lead_id).cloned()) {
        let qualified = Lead {
            status: LeadStatus::Qualified,
            ..lead
        };
        store.dispatch(Action::UpdateLead(qualified));
    }

    Ok(opportunity)
}
