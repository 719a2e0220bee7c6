//! ehsebo-domain
//!
//! Pure domain models (budget forms, budget records, currencies, summaries).
//! No I/O, no storage. Only data types and the arithmetic derived from them.

pub mod budget;
pub mod common;
pub mod currency;
pub mod record;
pub mod sheet;
pub mod summary;

pub use budget::*;
pub use common::*;
pub use currency::*;
pub use record::*;
pub use sheet::*;
pub use summary::*;
