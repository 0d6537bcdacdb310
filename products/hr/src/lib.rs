//! Employee lifecycle engine.
//!
//! Each record moves along two independent axes: onboarding (`Pending` →
//! `Active`, terminal) and time off (`None` → `Pending` → `Approved` |
//! `Rejected`, re-enterable by resubmission). Every operation is a full
//! read-modify-write of one record against the store, last write wins.
//!
//! Operations are split by who may trigger them: [`EmployeeDesk`] acts on the
//! signed-in employee's own record, [`HrDesk`] on any record.

mod directory;
mod employee;
mod hr;
pub mod lifecycle;

use std::sync::Arc;

use platform_api::ApiResult;
use platform_store::{EmployeeId, EmployeeRecord, EmployeeStore};

pub use directory::StaffProfile;
pub use employee::{DashboardKind, DashboardView, EmployeeDesk, PasswordChange, ProfileUpdate};
pub use hr::{EmployeeListing, HrDesk};
pub use lifecycle::{
    OnboardingForm, OnboardingState, TimeOffDecision, TimeOffStatus, TimeOffSubmission,
};

#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn EmployeeStore>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    /// Operations available to the employee signed in as `username`.
    pub fn employee(&self, username: impl Into<String>) -> EmployeeDesk {
        EmployeeDesk::new(self.store.clone(), username.into())
    }

    pub fn hr(&self) -> HrDesk {
        HrDesk::new(self.store.clone())
    }

    pub async fn directory(&self) -> ApiResult<Vec<StaffProfile>> {
        directory::staff_directory(self.store.as_ref()).await
    }
}

/// Reads the record, applies `change`, writes the whole record back.
pub(crate) async fn read_modify_write<F>(
    store: &dyn EmployeeStore,
    id: &EmployeeId,
    change: F,
) -> ApiResult<EmployeeRecord>
where
    F: FnOnce(&mut EmployeeRecord) -> ApiResult<()>,
{
    let mut record = store.get_employee(id).await?;
    change(&mut record)?;
    store.update_employee(id, &record).await
}
