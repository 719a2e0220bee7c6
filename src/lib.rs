#![doc(test(attr(deny(warnings))))]

//! Ehsebo keeps monthly budget records: a total budget, four expense
//! categories and the remaining balance, persisted per user and shown in a
//! base and a secondary currency.
//!
//! [`BudgetApp`] wires the workspace crates together and is the only layer
//! that logs.

pub mod app;
pub mod error;
mod logging;

use std::sync::Once;

pub use app::BudgetApp;
pub use error::{AppError, AppResult};
pub use ehsebo_config;
pub use ehsebo_core;
pub use ehsebo_domain;
pub use ehsebo_storage_json;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        logging::init_tracing();
        tracing::info!("Ehsebo tracing initialized.");
    });
}
