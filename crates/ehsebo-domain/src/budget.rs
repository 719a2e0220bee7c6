//! Budget form snapshots and the arithmetic derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transient snapshot of the budget form. All amounts are in the base currency.
///
/// Negative values are accepted; every derived calculation handles them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetFormData {
    #[serde(default)]
    pub total_budget: f64,
    #[serde(default)]
    pub medical_expenses: f64,
    #[serde(default)]
    pub salaries: f64,
    #[serde(default)]
    pub car_rental: f64,
    #[serde(default)]
    pub other_expenses: f64,
}

impl BudgetFormData {
    pub fn new(
        total_budget: f64,
        medical_expenses: f64,
        salaries: f64,
        car_rental: f64,
        other_expenses: f64,
    ) -> Self {
        Self {
            total_budget,
            medical_expenses,
            salaries,
            car_rental,
            other_expenses,
        }
    }

    /// Returns a copy with one expense category replaced.
    pub fn with_expense(mut self, category: ExpenseCategory, amount: f64) -> Self {
        match category {
            ExpenseCategory::Medical => self.medical_expenses = amount,
            ExpenseCategory::Salaries => self.salaries = amount,
            ExpenseCategory::CarRental => self.car_rental = amount,
            ExpenseCategory::Other => self.other_expenses = amount,
        }
        self
    }

    /// Field-wise sum of two snapshots.
    pub fn combine(&self, other: &BudgetFormData) -> BudgetFormData {
        BudgetFormData {
            total_budget: self.total_budget + other.total_budget,
            medical_expenses: self.medical_expenses + other.medical_expenses,
            salaries: self.salaries + other.salaries,
            car_rental: self.car_rental + other.car_rental,
            other_expenses: self.other_expenses + other.other_expenses,
        }
    }

    /// Returns `true` when every field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.total_budget,
            self.medical_expenses,
            self.salaries,
            self.car_rental,
            self.other_expenses,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Sum of the four expense fields. No clamping.
pub fn calculate_total_expenses(form: &BudgetFormData) -> f64 {
    form.medical_expenses + form.salaries + form.car_rental + form.other_expenses
}

/// `total_budget` minus total expenses. Negative means overspent.
pub fn calculate_remaining(form: &BudgetFormData) -> f64 {
    form.total_budget - calculate_total_expenses(form)
}

/// Sums every field across `forms` into a single snapshot, so the same
/// formulas apply to a whole collection.
pub fn sum_forms<'a, I>(forms: I) -> BudgetFormData
where
    I: IntoIterator<Item = &'a BudgetFormData>,
{
    forms
        .into_iter()
        .fold(BudgetFormData::default(), |acc, form| acc.combine(form))
}

/// The fixed expense categories a budget is split into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    Medical,
    Salaries,
    CarRental,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 4] = [
        ExpenseCategory::Medical,
        ExpenseCategory::Salaries,
        ExpenseCategory::CarRental,
        ExpenseCategory::Other,
    ];

    /// Reads this category's amount from a form snapshot.
    pub fn amount_in(self, form: &BudgetFormData) -> f64 {
        match self {
            ExpenseCategory::Medical => form.medical_expenses,
            ExpenseCategory::Salaries => form.salaries,
            ExpenseCategory::CarRental => form.car_rental,
            ExpenseCategory::Other => form.other_expenses,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Medical => "Medical",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::CarRental => "Car Rental",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
