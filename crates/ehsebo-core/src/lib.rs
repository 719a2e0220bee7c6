//! ehsebo-core
//!
//! Persistence and merge logic for budget records, plus the exchange-rate,
//! session and selection state that sits next to it.
//! Depends on ehsebo-domain. No terminal I/O, no logging, no concrete storage medium.

pub mod error;
pub mod exchange;
pub mod mirror;
pub mod record_store;
pub mod selection;
pub mod session;
pub mod storage;
pub mod time;


pub use error::{CoreError, Result};
pub use exchange::*;
pub use mirror::*;
pub use record_store::*;
pub use selection::*;
pub use session::*;
pub use storage::*;
pub use time::*;
