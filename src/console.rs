//! `SalesConsole` wires the store, the backend, the preference store and the
//! search debouncer together and exposes one method per user interaction.
//!
//! There is no global instance; front ends own a console (usually in an
//! `Arc`) and pass it where it is needed.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConsoleConfig, PreferencesKind};
use crate::debounce::SearchDebouncer;
use crate::error::{ConsoleError, ValidationError};
use crate::forms::{ConvertForm, LeadEditor};
use crate::preferences::{
    JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences,
    SqlitePreferenceStore,
};
use crate::services::backend::{LeadBackend, MockBackend};
use crate::services::opportunities::ConversionLocks;
use crate::services::{leads, opportunities, preferences};
use crate::state::{Action, AppState, Store};
use crate::types::{
    Lead, LeadFilters, LeadSort, Opportunity, OpportunityDraft, SortField, StatusFilter,
};
use crate::view;

pub struct SalesConsole {
    store: Arc<Store>,
    backend: Arc<dyn LeadBackend>,
    preferences: Preferences,
    search: SearchDebouncer,
    conversions: ConversionLocks,
}

impl SalesConsole {
    pub fn new(
        backend: Arc<dyn LeadBackend>,
        preferences: Preferences,
        search_debounce: Duration,
    ) -> Self {
        Self {
            store: Arc::new(Store::new()),
            backend,
            preferences,
            search: SearchDebouncer::new(search_debounce),
            conversions: ConversionLocks::new(),
        }
    }

    /// Build a console with the mock backend and the configured preference store.
    ///
    /// A preference store that cannot be opened degrades to an in-memory one.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, String> {
        let backend = MockBackend::new(config.backend.clone())
            .map_err(|e| format!("Failed to load seed leads: {}", e))?;

        Ok(Self::new(
            Arc::new(backend),
            Preferences::new(open_preference_store(config)),
            config.search_debounce(),
        ))
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.snapshot()
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restore saved preferences, then load leads if none are loaded.
    pub async fn mount(&self) -> Result<bool, ConsoleError> {
        self.restore_preferences();
        self.ensure_leads_loaded().await
    }

    pub fn restore_preferences(&self) {
        preferences::restore_preferences(&self.store, &self.preferences);
        let search = self.store.read(|s| s.filters.search.clone());
        self.search.settle(search);
    }

    pub async fn ensure_leads_loaded(&self) -> Result<bool, ConsoleError> {
        leads::ensure_leads_loaded(&self.store, self.backend.as_ref()).await
    }

    pub async fn load_leads(&self) -> Result<usize, ConsoleError> {
        leads::load_leads(&self.store, self.backend.as_ref()).await
    }

    // =========================================================================
    // Lead list
    // =========================================================================

    /// Raw search input. The list follows once the debounce window settles.
    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        let filters = LeadFilters {
            search: text.clone(),
            ..self.store.read(|s| s.filters.clone())
        };
        preferences::apply_filters(&self.store, &self.preferences, filters);
        self.search.input(text);
    }

    pub fn set_status_filter(&self, status: StatusFilter) {
        let filters = LeadFilters {
            status,
            ..self.store.read(|s| s.filters.clone())
        };
        preferences::apply_filters(&self.store, &self.preferences, filters);
    }

    pub fn set_sort(&self, sort: LeadSort) {
        preferences::apply_sort(&self.store, &self.preferences, sort);
    }

    /// Column-header click.
    pub fn toggle_sort(&self, field: SortField) -> LeadSort {
        let sort = self.store.read(|s| s.sort).toggled(field);
        self.set_sort(sort);
        sort
    }

    pub fn reset_preferences(&self) {
        preferences::reset_preferences(&self.store, &self.preferences);
        self.search.settle(String::new());
    }

    /// The search text the list is currently filtered by.
    pub fn settled_search(&self) -> String {
        self.search.settled()
    }

    pub fn search_debouncer(&self) -> &SearchDebouncer {
        &self.search
    }

    pub fn visible_leads(&self) -> Vec<Lead> {
        let search = self.search.settled();
        self.store
            .read(|s| view::visible_leads(&s.leads, &s.filters, &s.sort, &search))
    }

    pub fn lead_summary(&self) -> String {
        let visible = self.visible_leads().len();
        let total = self.store.read(|s| s.leads.len());
        view::lead_count_label(visible, total)
    }

    // =========================================================================
    // Selection and editing
    // =========================================================================

    fn find_lead(&self, lead_id: &str) -> Result<Lead, ConsoleError> {
        self.store
            .read(|s| s.find_lead(lead_id).cloned())
            .ok_or_else(|| ConsoleError::LeadNotFound(lead_id.to_string()))
    }

    /// Select a lead for the detail panel. An unknown id leaves the selection as is.
    pub fn select_lead(&self, lead_id: &str) -> Result<Lead, ConsoleError> {
        let lead = self.find_lead(lead_id)?;
        self.store.dispatch(Action::SetSelectedLead(Some(lead.clone())));
        Ok(lead)
    }

    pub fn clear_selection(&self) {
        self.store.dispatch(Action::SetSelectedLead(None));
    }

    pub fn editor_for(&self, lead_id: &str) -> Result<LeadEditor, ConsoleError> {
        self.find_lead(lead_id).map(LeadEditor::new)
    }

    pub async fn save_lead(&self, lead: Lead) -> Result<Lead, ConsoleError> {
        leads::update_lead(&self.store, self.backend.as_ref(), lead).await
    }

    /// Save through the editor, keeping its saving flag and baseline current.
    ///
    /// An editor without changes returns its lead untouched and never reaches
    /// the backend.
    pub async fn submit_editor(&self, editor: &mut LeadEditor) -> Result<Lead, ConsoleError> {
        if let Some(message) = editor.email_error() {
            return Err(ValidationError::Email(message.to_string()).into());
        }
        let lead = match editor.submission() {
            Some(lead) => lead,
            None => return Ok(editor.original().clone()),
        };

        editor.set_saving(true);
        let result = self.save_lead(lead).await;
        match &result {
            Ok(saved) => editor.mark_saved(saved.clone()),
            Err(_) => editor.set_saving(false),
        }
        result
    }

    // =========================================================================
    // Opportunities
    // =========================================================================

    pub fn convert_form_for(&self, lead_id: &str) -> Result<ConvertForm, ConsoleError> {
        self.find_lead(lead_id).map(|lead| ConvertForm::for_lead(&lead))
    }

    pub async fn convert_lead(
        &self,
        lead_id: &str,
        draft: OpportunityDraft,
    ) -> Result<Opportunity, ConsoleError> {
        opportunities::convert_lead(
            &self.store,
            self.backend.as_ref(),
            &self.conversions,
            lead_id,
            draft,
        )
        .await
    }

    pub async fn submit_convert_form(
        &self,
        form: &mut ConvertForm,
    ) -> Result<Opportunity, ConsoleError> {
        let draft = form.to_draft()?;
        let lead_id = form.lead_id.clone();
        self.convert_lead(&lead_id, draft).await
    }

    pub fn is_lead_converted(&self, lead_id: &str) -> bool {
        self.store.read(|s| s.is_lead_converted(lead_id))
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.store.read(|s| s.opportunities.clone())
    }

    pub fn opportunity_summary(&self) -> String {
        view::opportunity_count_label(self.store.read(|s| s.opportunities.len()))
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub fn error(&self) -> Option<String> {
        self.store.read(|s| s.error.clone())
    }

    pub fn dismiss_error(&self) {
        self.store.dispatch(Action::SetError(None));
    }
}

fn open_preference_store(config: &ConsoleConfig) -> Arc<dyn PreferenceStore> {
    let kind = config.preferences.kind;
    if kind == PreferencesKind::Memory {
        return Arc::new(MemoryPreferenceStore::new());
    }

    let path = match config.preferences.resolved_path() {
        Ok(path) => path,
        Err(e) => {
            log::warn!("Preferences will not persist: {}", e);
            return Arc::new(MemoryPreferenceStore::new());
        }
    };

    match kind {
        PreferencesKind::Sqlite => match SqlitePreferenceStore::open(&path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!(
                    "Failed to open preference database {}: {}. Using in-memory preferences.",
                    path.display(),
                    e
                );
                Arc::new(MemoryPreferenceStore::new())
            }
        },
        _ => Arc::new(JsonFilePreferenceStore::new(path)),
    }
}
