//! # hrstore
//!
//! Data-access layer for an HR administration backend: employees, employments
//! and salary history kept in a remote document database, read through an
//! admin-scoped TTL cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hrstore::HrStore;
//! use hrstore::config::CacheConfig;
//! use hrstore::session::AdminIdentity;
//! use hrstore::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hr = HrStore::new(Arc::new(MemoryStore::new()), &CacheConfig::from_env()?);
//!     hr.session().login(AdminIdentity::new("Asha", "9000000001", "admin"))?;
//!
//!     for employee in hr.employees().list().await? {
//!         println!("{} {}", employee.id, employee.name);
//!     }
//!
//!     hr.session().logout();
//!     Ok(())
//! }
//! ```

// ── Caching core ──────────────────────────────────────────────────────────────
pub mod cache;
pub mod config;

// ── Storage boundary and typed access ────────────────────────────────────────
pub mod model;
pub mod repository;
pub mod store;

// ── Principal tracking and wiring ────────────────────────────────────────────
pub mod hr;
pub mod session;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheStats, Clock, ManualClock, ScopedReadCache, SystemClock};
pub use config::{CacheConfig, ConfigError};
pub use hr::HrStore;
pub use model::{Employee, Employment, Record, SalaryRecord};
pub use repository::{Repository, RepositoryError};
pub use session::{AdminIdentity, Session, SessionError};
pub use store::{Document, DocumentStore, MemoryStore, StoreError};
