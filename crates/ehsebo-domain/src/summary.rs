//! Collection-wide reporting built on the per-form formulas.

use serde::{Deserialize, Serialize};

use crate::{
    budget::{calculate_remaining, calculate_total_expenses, sum_forms, BudgetFormData, ExpenseCategory},
    record::BudgetRecord,
};

/// Per-category expense totals across a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub medical: f64,
    pub salaries: f64,
    pub car_rental: f64,
    pub other: f64,
}

impl CategoryBreakdown {
    pub fn from_form(form: &BudgetFormData) -> Self {
        Self {
            medical: form.medical_expenses,
            salaries: form.salaries,
            car_rental: form.car_rental,
            other: form.other_expenses,
        }
    }

    pub fn amount(&self, category: ExpenseCategory) -> f64 {
        match category {
            ExpenseCategory::Medical => self.medical,
            ExpenseCategory::Salaries => self.salaries,
            ExpenseCategory::CarRental => self.car_rental,
            ExpenseCategory::Other => self.other,
        }
    }

    /// Category with the largest total. Ties go to the earlier category.
    pub fn highest(&self) -> (ExpenseCategory, f64) {
        ExpenseCategory::ALL
            .iter()
            .map(|category| (*category, self.amount(*category)))
            .fold((ExpenseCategory::Medical, self.medical), |best, next| {
                if next.1 > best.1 {
                    next
                } else {
                    best
                }
            })
    }

    /// Each category's share of the total expenses, in percent.
    pub fn shares(&self) -> Vec<(ExpenseCategory, f64)> {
        let total: f64 = ExpenseCategory::ALL.iter().map(|c| self.amount(*c)).sum();
        ExpenseCategory::ALL
            .iter()
            .map(|category| {
                let share = if total > 0.0 {
                    self.amount(*category) / total * 100.0
                } else {
                    0.0
                };
                (*category, share)
            })
            .collect()
    }
}

/// Aggregate statistics for a collection of budget records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub record_count: usize,
    pub total_budget: f64,
    pub total_expenses: f64,
    pub remaining: f64,
    pub average_expenses: f64,
    pub breakdown: CategoryBreakdown,
}

impl BudgetSummary {
    /// Sums each field across `records` and applies the per-form formulas to
    /// the combined snapshot. The stored `remaining` snapshots are ignored.
    pub fn from_records(records: &[BudgetRecord]) -> Self {
        let combined = sum_forms(records.iter().map(|record| &record.form));
        let total_expenses = calculate_total_expenses(&combined);
        let average_expenses = if records.is_empty() {
            0.0
        } else {
            total_expenses / records.len() as f64
        };
        Self {
            record_count: records.len(),
            total_budget: combined.total_budget,
            total_expenses,
            remaining: calculate_remaining(&combined),
            average_expenses,
            breakdown: CategoryBreakdown::from_form(&combined),
        }
    }

    /// Share of the budget already spent, in percent. Zero when there is no budget.
    pub fn spending_percentage(&self) -> f64 {
        if self.total_budget > 0.0 {
            self.total_expenses / self.total_budget * 100.0
        } else {
            0.0
        }
    }

    pub fn remaining_percentage(&self) -> f64 {
        remaining_percentage(self.remaining, self.total_budget)
    }

    pub fn is_overspent(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Share of `total` still available, floored at zero. Zero when `total` is not positive.
pub fn remaining_percentage(remaining: f64, total: f64) -> f64 {
    if total > 0.0 {
        (remaining / total * 100.0).max(0.0)
    } else {
        0.0
    }
}
