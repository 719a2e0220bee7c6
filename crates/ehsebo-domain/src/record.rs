//! Persisted budget records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    budget::{calculate_remaining, calculate_total_expenses, BudgetFormData},
    common::*,
    currency::{format_amount, Currency},
};

/// A saved budget. Amounts are in the base currency.
///
/// `remaining` is a snapshot taken when the record is built or revised; it is
/// not recomputed if the amounts are changed some other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub form: BudgetFormData,
    pub remaining: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

impl BudgetRecord {
    /// Builds a new record from a form snapshot, stamping both timestamps with `now`.
    pub fn from_form(
        id: impl Into<String>,
        name: impl Into<String>,
        form: BudgetFormData,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            form,
            remaining: calculate_remaining(&form),
            created_at: now,
            updated_at: now,
            user_id: user_id.into(),
        }
    }

    /// Produces the edited version of this record. Identity, owner and
    /// creation time are kept; `remaining` and `updated_at` are refreshed.
    pub fn revise(&self, name: impl Into<String>, form: BudgetFormData, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            name: name.into(),
            form,
            remaining: calculate_remaining(&form),
            created_at: self.created_at,
            updated_at: now,
            user_id: self.user_id.clone(),
        }
    }

    /// Returns the amounts as a form snapshot.
    pub fn form(&self) -> BudgetFormData {
        self.form
    }

    pub fn total_expenses(&self) -> f64 {
        calculate_total_expenses(&self.form)
    }

    /// Returns `true` when the stored `remaining` no longer matches the amounts.
    pub fn is_remaining_stale(&self) -> bool {
        self.remaining != calculate_remaining(&self.form)
    }

    pub fn is_overspent(&self) -> bool {
        self.remaining < 0.0
    }
}

impl Identifiable for BudgetRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for BudgetRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for BudgetRecord {
    fn display_label(&self) -> String {
        format!(
            "{} ({})",
            self.name,
            format_amount(self.remaining, Currency::BASE)
        )
    }
}

/// Generates a fresh, unique record identifier.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}
