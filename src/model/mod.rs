//! HR records as stored in the document database.
//!
//! Field names follow the stored camelCase spelling. Fields this crate does
//! not model (education history, salary components, bank details, ...) are
//! kept in `extra` so a read-modify-write never drops them.
//!
//! The document id is the storage key, not a stored field: it is filled in
//! on decode and never serialized back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection holding [`Employee`] documents.
pub const EMPLOYEES: &str = "employees";
/// Collection holding [`Employment`] documents.
pub const EMPLOYMENTS: &str = "employments";
/// Collection holding [`SalaryRecord`] documents.
pub const SALARY_HISTORY: &str = "salaryHistory";

/// A record type stored in one named collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the collection the record lives in.
    const COLLECTION: &'static str;

    /// Returns the document id.
    fn id(&self) -> &str;
}

/// A person on the payroll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    /// Human-facing employee code, distinct from the document id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Employee {
    const COLLECTION: &'static str = EMPLOYEES;

    fn id(&self) -> &str {
        &self.id
    }
}

/// One employment of an [`Employee`]: role, dates and pay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employment {
    #[serde(default, skip_serializing)]
    pub id: String,
    /// Document id of the employee this employment belongs to.
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctc: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Employment {
    const COLLECTION: &'static str = EMPLOYMENTS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A historical salary revision for an [`Employment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub employment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for SalaryRecord {
    const COLLECTION: &'static str = SALARY_HISTORY;

    fn id(&self) -> &str {
        &self.id
    }
}
