//! Centralized application state.
//!
//! `AppState` is the sole owner of leads and opportunities. It only changes
//! through `Store::dispatch`, which applies one `Action` with the pure
//! `reduce` function. Everything else reads snapshots or subscribes.

use tokio::sync::watch;

use crate::types::{Lead, LeadFilters, LeadSort, Opportunity};

/// Application state shared by every view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub leads: Vec<Lead>,
    pub opportunities: Vec<Opportunity>,
    pub filters: LeadFilters,
    pub sort: LeadSort,
    /// Copy of the selected lead, kept in sync by `Action::UpdateLead`.
    pub selected_lead: Option<Lead>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AppState {
    pub fn find_lead(&self, lead_id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == lead_id)
    }

    pub fn opportunity_for_lead(&self, lead_id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.lead_id == lead_id)
    }

    pub fn is_lead_converted(&self, lead_id: &str) -> bool {
        self.opportunity_for_lead(lead_id).is_some()
    }
}

/// The closed set of state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetLeads(Vec<Lead>),
    /// Full replacement of the lead with the same id.
    UpdateLead(Lead),
    SetOpportunities(Vec<Opportunity>),
    /// Appends without deduplication; callers enforce one opportunity per lead.
    AddOpportunity(Opportunity),
    SetFilters(LeadFilters),
    SetSort(LeadSort),
    SetSelectedLead(Option<Lead>),
    SetLoading(bool),
    SetError(Option<String>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetLeads(_) => "set_leads",
            Action::UpdateLead(_) => "update_lead",
            Action::SetOpportunities(_) => "set_opportunities",
            Action::AddOpportunity(_) => "add_opportunity",
            Action::SetFilters(_) => "set_filters",
            Action::SetSort(_) => "set_sort",
            Action::SetSelectedLead(_) => "set_selected_lead",
            Action::SetLoading(_) => "set_loading",
            Action::SetError(_) => "set_error",
        }
    }
}

/// Apply one action. Total: every action succeeds on every state.
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetLeads(leads) => state.leads = leads,
        Action::UpdateLead(lead) => {
            if let Some(selected) = state.selected_lead.as_mut() {
                if selected.id == lead.id {
                    *selected = lead.clone();
                }
            }
            if let Some(existing) = state.leads.iter_mut().find(|l| l.id == lead.id) {
                *existing = lead;
            }
        }
        Action::SetOpportunities(opportunities) => state.opportunities = opportunities,
        Action::AddOpportunity(opportunity) => state.opportunities.push(opportunity),
        Action::SetFilters(filters) => state.filters = filters,
        Action::SetSort(sort) => state.sort = sort,
        Action::SetSelectedLead(lead) => state.selected_lead = lead,
        Action::SetLoading(loading) => state.is_loading = loading,
        Action::SetError(error) => state.error = error,
    }
    state
}

/// State container. Share it behind an `Arc`; there is no global instance.
pub struct Store {
    tx: watch::Sender<AppState>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    pub fn dispatch(&self, action: Action) {
        log::debug!("dispatch {}", action.name());
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action);
        });
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that wakes on every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LeadStatus, OpportunityStage, SortDirection, SortField, StatusFilter};
    use chrono::Utc;

    fn lead(id: &str, status: LeadStatus) -> Lead {
        Lead {
            id: id.to_string(),
            name: format!("Name {}", id),
            company: format!("Company {}", id),
            email: format!("{}@example.com", id.to_lowercase()),
            source: "web".to_string(),
            score: 50,
            status,
        }
    }

    fn opportunity(lead_id: &str) -> Opportunity {
        Opportunity {
            id: format!("opp-{}", lead_id),
            name: "Deal".to_string(),
            stage: OpportunityStage::Prospect,
            amount: None,
            account_name: "Acme".to_string(),
            created_at: Utc::now(),
            lead_id: lead_id.to_string(),
        }
    }

    #[test]
    fn test_initial_state_defaults() {
        let state = AppState::default();
        assert!(state.leads.is_empty());
        assert_eq!(state.filters.status, StatusFilter::All);
        assert_eq!(state.sort.field, SortField::Score);
        assert_eq!(state.sort.direction, SortDirection::Desc);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_update_lead_replaces_by_id_and_refreshes_selection() {
        let state = reduce(
            AppState::default(),
            Action::SetLeads(vec![lead("L1", LeadStatus::New), lead("L2", LeadStatus::New)]),
        );
        let state = reduce(state, Action::SetSelectedLead(Some(lead("L1", LeadStatus::New))));

        let mut edited = lead("L1", LeadStatus::Qualified);
        edited.email = "new@acme.com".to_string();
        let state = reduce(state, Action::UpdateLead(edited.clone()));

        assert_eq!(state.leads[0], edited);
        assert_eq!(state.leads[1].status, LeadStatus::New);
        assert_eq!(state.selected_lead, Some(edited));
    }

    #[test]
    fn test_update_lead_leaves_other_selection_alone() {
        let state = reduce(
            AppState::default(),
            Action::SetLeads(vec![lead("L1", LeadStatus::New), lead("L2", LeadStatus::New)]),
        );
        let state = reduce(state, Action::SetSelectedLead(Some(lead("L2", LeadStatus::New))));
        let state = reduce(state, Action::UpdateLead(lead("L1", LeadStatus::Contacted)));

        assert_eq!(
            state.selected_lead.as_ref().map(|l| l.status),
            Some(LeadStatus::New)
        );
    }

    #[test]
    fn test_update_unknown_lead_is_noop() {
        let state = reduce(
            AppState::default(),
            Action::SetLeads(vec![lead("L1", LeadStatus::New)]),
        );
        let after = reduce(state.clone(), Action::UpdateLead(lead("L9", LeadStatus::Qualified)));
        assert_eq!(after, state);
    }

    #[test]
    fn test_add_opportunity_appends_without_dedup() {
        let state = reduce(AppState::default(), Action::AddOpportunity(opportunity("L1")));
        let state = reduce(state, Action::AddOpportunity(opportunity("L1")));
        assert_eq!(state.opportunities.len(), 2);
        assert!(state.is_lead_converted("L1"));
        assert!(!state.is_lead_converted("L2"));
    }

    #[test]
    fn test_store_dispatch_notifies_subscribers() {
        let store = Store::new();
        let mut rx = store.subscribe();
        store.dispatch(Action::SetLoading(true));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading);

        store.dispatch(Action::SetError(Some("boom".into())));
        assert_eq!(store.snapshot().error.as_deref(), Some("boom"));
        assert!(store.read(|s| s.is_loading));
    }
}
