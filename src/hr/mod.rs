//! One-stop wiring for the HR backend.
//!
//! [`HrStore`] owns the shared cache and hands out the repositories and the
//! session that use it. Build one at startup and pass it (or an `Arc` of it)
//! to whatever needs data access.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use hrstore::HrStore;
//! use hrstore::config::CacheConfig;
//! use hrstore::session::AdminIdentity;
//! use hrstore::store::MemoryStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hr = HrStore::new(Arc::new(MemoryStore::new()), &CacheConfig::default());
//! hr.session().login(AdminIdentity::new("Asha", "9000000001", "admin")).unwrap();
//!
//! let employee = hr.employees().create(&json!({ "name": "Ravi" })).await.unwrap();
//! hr.employments()
//!     .create(&json!({ "employeeId": employee.id, "designation": "Engineer" }))
//!     .await
//!     .unwrap();
//!
//! let jobs = hr.employments_for_employee(&employee.id).await.unwrap();
//! assert_eq!(jobs[0].designation.as_deref(), Some("Engineer"));
//! # }
//! ```

use std::sync::Arc;

use crate::cache::{CacheStats, ScopedReadCache};
use crate::config::CacheConfig;
use crate::model::{Employee, Employment, SalaryRecord};
use crate::repository::{Repository, RepositoryError};
use crate::session::Session;
use crate::store::{Document, DocumentStore};

/// The data-access layer of the HR backend.
pub struct HrStore {
    cache: Arc<ScopedReadCache<Document>>,
    session: Session,
    employees: Repository<Employee>,
    employments: Repository<Employment>,
    salary_history: Repository<SalaryRecord>,
}

impl HrStore {
    /// Builds the layer over `store` with a cache configured by `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: &CacheConfig) -> Self {
        Self::with_cache(store, Arc::new(ScopedReadCache::from_config(config)))
    }

    /// Builds the layer over `store` using an existing `cache`.
    pub fn with_cache(
        store: Arc<dyn DocumentStore>,
        cache: Arc<ScopedReadCache<Document>>,
    ) -> Self {
        Self {
            session: Session::new(Arc::clone(&cache)),
            employees: Repository::new(Arc::clone(&store), Arc::clone(&cache)),
            employments: Repository::new(Arc::clone(&store), Arc::clone(&cache)),
            salary_history: Repository::new(store, Arc::clone(&cache)),
            cache,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn employees(&self) -> &Repository<Employee> {
        &self.employees
    }

    pub fn employments(&self) -> &Repository<Employment> {
        &self.employments
    }

    pub fn salary_history(&self) -> &Repository<SalaryRecord> {
        &self.salary_history
    }

    /// Returns every employment of employee `employee_id`. Never cached.
    pub async fn employments_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Employment>, RepositoryError> {
        self.employments.list_where("employeeId", employee_id).await
    }

    /// Returns the salary revisions of employment `employment_id`. Never cached.
    pub async fn salary_history_for_employment(
        &self,
        employment_id: &str,
    ) -> Result<Vec<SalaryRecord>, RepositoryError> {
        self.salary_history
            .list_where("employmentId", employment_id)
            .await
    }

    /// Returns the shared cache's counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
