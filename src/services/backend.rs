//! Lead backend seam and its in-process simulation.
//!
//! `MockBackend` stands in for a remote API: every call waits a fixed latency
//! and then fails with an independent random draw per call. The lead dataset
//! is static and embedded at compile time; updates are echoed, not stored.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::ConsoleError;
use crate::types::{Lead, Opportunity, OpportunityDraft};

const SEED_LEADS: &str = include_str!("../fixtures/leads.json");

/// Remote operations the controllers depend on.
#[async_trait]
pub trait LeadBackend: Send + Sync {
    async fn fetch_leads(&self) -> Result<Vec<Lead>, ConsoleError>;

    /// Persist an edited lead; returns the stored (possibly normalized) copy.
    async fn update_lead(&self, lead: Lead) -> Result<Lead, ConsoleError>;

    /// Create an opportunity for `lead_id`. The backend assigns `id` and `created_at`.
    async fn convert_lead(
        &self,
        lead_id: &str,
        draft: OpportunityDraft,
    ) -> Result<Opportunity, ConsoleError>;
}

/// Per-operation call counts, for asserting what reached the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCalls {
    pub fetch: usize,
    pub update: usize,
    pub convert: usize,
}

#[derive(Default)]
struct CallCounters {
    fetch: AtomicUsize,
    update: AtomicUsize,
    convert: AtomicUsize,
}

pub struct MockBackend {
    config: BackendConfig,
    leads: Vec<Lead>,
    rng: Mutex<StdRng>,
    calls: CallCounters,
}

impl MockBackend {
    /// Backend serving the embedded seed dataset.
    pub fn new(config: BackendConfig) -> Result<Self, serde_json::Error> {
        let leads: Vec<Lead> = serde_json::from_str(SEED_LEADS)?;
        Ok(Self::with_leads(config, leads))
    }

    pub fn with_leads(config: BackendConfig, leads: Vec<Lead>) -> Self {
        let config = config.normalized();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        log::debug!(
            "Mock backend: {} leads, {}ms latency, failure rates fetch={} update={} convert={}",
            leads.len(),
            config.latency_ms,
            config.fetch_failure_rate,
            config.update_failure_rate,
            config.convert_failure_rate
        );
        Self {
            config,
            leads,
            rng: Mutex::new(rng),
            calls: CallCounters::default(),
        }
    }

    pub fn calls(&self) -> BackendCalls {
        BackendCalls {
            fetch: self.calls.fetch.load(Ordering::SeqCst),
            update: self.calls.update.load(Ordering::SeqCst),
            convert: self.calls.convert.load(Ordering::SeqCst),
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.config.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn simulate_failure(&self, rate: f64) -> bool {
        rate > 0.0 && self.rng.lock().random::<f64>() < rate
    }
}

/// `opp-<unix millis>-<9 hex chars>`
fn generate_opportunity_id(created_millis: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("opp-{}-{}", created_millis, &suffix[..9])
}

#[async_trait]
impl LeadBackend for MockBackend {
    async fn fetch_leads(&self) -> Result<Vec<Lead>, ConsoleError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.simulate_failure(self.config.fetch_failure_rate) {
            return Err(ConsoleError::FetchFailed("Failed to fetch leads".to_string()));
        }

        Ok(self.leads.clone())
    }

    async fn update_lead(&self, lead: Lead) -> Result<Lead, ConsoleError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.simulate_failure(self.config.update_failure_rate) {
            return Err(ConsoleError::UpdateFailed("Failed to update lead".to_string()));
        }

        Ok(lead)
    }

    async fn convert_lead(
        &self,
        lead_id: &str,
        draft: OpportunityDraft,
    ) -> Result<Opportunity, ConsoleError> {
        self.calls.convert.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.simulate_failure(self.config.convert_failure_rate) {
            return Err(ConsoleError::ConvertFailed(
                "Failed to convert lead to opportunity".to_string(),
            ));
        }

        let created_at = Utc::now();
        Ok(Opportunity {
            id: generate_opportunity_id(created_at.timestamp_millis()),
            name: draft.name,
            stage: draft.stage,
            amount: draft.amount,
            account_name: draft.account_name,
            created_at,
            lead_id: lead_id.to_string(),
        })
    }
}
