//! Record Access Layer.
//!
//! The employee collection lives in an external CRUD service. Every call is a
//! single request/response; transport failures and non-success statuses
//! surface as [`ApiError::StoreUnavailable`] except a missing record, which
//! surfaces as [`ApiError::NotFound`]. Updates replace the whole record and
//! are last-write-wins.

mod http;
mod memory;
mod model;

use async_trait::async_trait;
use platform_api::ApiResult;

pub use http::HttpEmployeeStore;
pub use memory::MemoryEmployeeStore;
pub use model::{EmployeeId, EmployeeRecord, NewEmployee, TimeOffRequest};

#[cfg(doc)]
use platform_api::ApiError;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn list_employees(&self) -> ApiResult<Vec<EmployeeRecord>>;

    async fn get_employee(&self, id: &EmployeeId) -> ApiResult<EmployeeRecord>;

    async fn create_employee(&self, fields: NewEmployee) -> ApiResult<EmployeeRecord>;

    /// Whole-record replace.
    async fn update_employee(
        &self,
        id: &EmployeeId,
        record: &EmployeeRecord,
    ) -> ApiResult<EmployeeRecord>;

    async fn delete_employee(&self, id: &EmployeeId) -> ApiResult<()>;
}

/// Exact, case-sensitive username lookup over a listing. Rows without a
/// username never match.
pub fn find_by_username<'a>(
    records: &'a [EmployeeRecord],
    username: &str,
) -> Option<&'a EmployeeRecord> {
    if username.is_empty() {
        return None;
    }
    records.iter().find(|record| record.username == username)
}
