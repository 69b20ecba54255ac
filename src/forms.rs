//! Edit-form state for the lead detail panel and the convert dialog.
//!
//! These hold transient copies only. Nothing here touches the store; the
//! console hands the finished lead or draft to a controller.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::types::{Lead, LeadStatus, OpportunityDraft, OpportunityStage};
use crate::validation::{parse_amount, require, validate_email};

// =============================================================================
// Lead editor
// =============================================================================

#[derive(Debug, Clone)]
pub struct LeadEditor {
    original: Lead,
    edited: Lead,
    email_error: Option<String>,
    is_saving: bool,
}

impl LeadEditor {
    pub fn new(lead: Lead) -> Self {
        Self {
            edited: lead.clone(),
            original: lead,
            email_error: None,
            is_saving: false,
        }
    }

    pub fn original(&self) -> &Lead {
        &self.original
    }

    pub fn edited(&self) -> &Lead {
        &self.edited
    }

    pub fn email_error(&self) -> Option<&str> {
        self.email_error.as_deref()
    }

    /// Email is only validated once it differs from the stored value.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.edited.email = email.into();
        self.email_error = if self.edited.email != self.original.email {
            validate_email(&self.edited.email)
                .err()
                .map(|e| e.to_string())
        } else {
            None
        };
    }

    pub fn set_status(&mut self, status: LeadStatus) {
        self.edited.status = status;
    }

    pub fn is_editing(&self) -> bool {
        self.edited.email != self.original.email || self.edited.status != self.original.status
    }

    pub fn can_save(&self) -> bool {
        self.is_editing() && self.email_error.is_none() && !self.is_saving
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn set_saving(&mut self, saving: bool) {
        self.is_saving = saving;
    }

    /// The lead to hand to the save controller, if saving is allowed.
    pub fn submission(&self) -> Option<Lead> {
        self.can_save().then(|| self.edited.clone())
    }

    /// After a successful save the saved copy becomes the new baseline.
    pub fn mark_saved(&mut self, saved: Lead) {
        self.original = saved.clone();
        self.edited = saved;
        self.email_error = None;
        self.is_saving = false;
    }

    pub fn cancel(&mut self) {
        self.edited = self.original.clone();
        self.email_error = None;
    }

    /// Conversion is offered for unmodified leads that have no opportunity yet.
    pub fn can_convert(&self, already_converted: bool) -> bool {
        !self.is_editing() && !already_converted
    }
}

// =============================================================================
// Convert form
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConvertField {
    Name,
    AccountName,
    Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertForm {
    pub lead_id: String,
    pub name: String,
    pub account_name: String,
    pub stage: OpportunityStage,
    /// Raw text, parsed on submit.
    pub amount: String,
    errors: BTreeMap<ConvertField, String>,
}

impl ConvertForm {
    /// Prefilled from the lead: "<company> - <name>", account = company.
    pub fn for_lead(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id.clone(),
            name: format!("{} - {}", lead.company, lead.name),
            account_name: lead.company.clone(),
            stage: OpportunityStage::Prospect,
            amount: String::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.errors.remove(&ConvertField::Name);
    }

    pub fn set_account_name(&mut self, account_name: impl Into<String>) {
        self.account_name = account_name.into();
        self.errors.remove(&ConvertField::AccountName);
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.errors.remove(&ConvertField::Amount);
    }

    pub fn set_stage(&mut self, stage: OpportunityStage) {
        self.stage = stage;
    }

    pub fn error(&self, field: ConvertField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Check every field, recording one message per failing field.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();

        if let Err(e) = require(&self.name, "Opportunity name is required") {
            self.errors.insert(ConvertField::Name, e.to_string());
        }
        if let Err(e) = require(&self.account_name, "Account name is required") {
            self.errors.insert(ConvertField::AccountName, e.to_string());
        }
        if let Err(e) = parse_amount(&self.amount) {
            self.errors.insert(ConvertField::Amount, e.to_string());
        }

        self.errors.is_empty()
    }

    /// Validate and build the draft for the conversion controller.
    pub fn to_draft(&mut self) -> Result<OpportunityDraft, ValidationError> {
        let amount = require(&self.name, "Opportunity name is required")
            .and_then(|_| require(&self.account_name, "Account name is required"))
            .and_then(|_| parse_amount(&self.amount));

        match amount {
            Ok(amount) => Ok(OpportunityDraft {
                name: self.name.clone(),
                stage: self.stage,
                amount,
                account_name: self.account_name.clone(),
            }),
            Err(e) => {
                self.validate();
                Err(e)
            }
        }
    }
}
