use std::sync::Arc;

use platform_api::{ApiError, ApiResult};
use platform_store::{EmployeeRecord, EmployeeStore, find_by_username};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::lifecycle::{self, OnboardingForm, OnboardingState, TimeOffStatus, TimeOffSubmission};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    Onboarding,
    Dashboard,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub view: DashboardKind,
    pub onboarding: OnboardingState,
    pub time_off_status: TimeOffStatus,
    pub employee: EmployeeRecord,
}

impl From<EmployeeRecord> for DashboardView {
    fn from(employee: EmployeeRecord) -> Self {
        let onboarding = OnboardingState::of(&employee);
        let view = match onboarding {
            OnboardingState::Pending => DashboardKind::Onboarding,
            OnboardingState::Active => DashboardKind::Dashboard,
        };
        Self {
            view,
            onboarding,
            time_off_status: TimeOffStatus::of(&employee.time_off_request),
            employee,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub address: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Employee-scoped operations. The record acted on is always the one whose
/// username equals the session identity.
pub struct EmployeeDesk {
    store: Arc<dyn EmployeeStore>,
    username: String,
}

impl EmployeeDesk {
    pub(crate) fn new(store: Arc<dyn EmployeeStore>, username: String) -> Self {
        Self { store, username }
    }

    async fn own_record(&self) -> ApiResult<EmployeeRecord> {
        let records = self.store.list_employees().await?;
        find_by_username(&records, &self.username)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn modify_own<F>(&self, change: F) -> ApiResult<EmployeeRecord>
    where
        F: FnOnce(&mut EmployeeRecord) -> ApiResult<()>,
    {
        let mut record = self.own_record().await?;
        change(&mut record)?;
        let id = record.id.clone();
        self.store.update_employee(&id, &record).await
    }

    pub async fn dashboard(&self) -> ApiResult<DashboardView> {
        self.own_record().await.map(DashboardView::from)
    }

    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> ApiResult<EmployeeRecord> {
        let record = self
            .modify_own(|record| {
                record.full_name = update.full_name;
                record.address = update.address;
                Ok(())
            })
            .await?;
        info!(id = %record.id, "profile updated");
        Ok(record)
    }

    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn update_assignment(&self, assignment: String) -> ApiResult<EmployeeRecord> {
        let record = self
            .modify_own(|record| {
                record.current_assignment = assignment;
                Ok(())
            })
            .await?;
        info!(id = %record.id, "current assignment updated");
        Ok(record)
    }

    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn change_password(&self, change: PasswordChange) -> ApiResult<EmployeeRecord> {
        let record = self
            .modify_own(|record| {
                if change.current_password != record.password_secret {
                    return Err(ApiError::validation("Current password is incorrect"));
                }
                if change.new_password != change.confirm_password {
                    return Err(ApiError::validation("New passwords do not match"));
                }
                if change.new_password.is_empty() {
                    return Err(ApiError::validation("New password cannot be empty"));
                }
                if change.new_password == record.password_secret {
                    return Err(ApiError::validation(
                        "New password must be different from current password",
                    ));
                }
                record.password_secret = change.new_password;
                Ok(())
            })
            .await?;
        info!(id = %record.id, "password changed");
        Ok(record)
    }

    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn complete_onboarding(&self, form: OnboardingForm) -> ApiResult<EmployeeRecord> {
        let record = self
            .modify_own(|record| lifecycle::complete_onboarding(record, form))
            .await?;
        info!(id = %record.id, state = "active", "onboarding completed by employee");
        Ok(record)
    }

    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn submit_time_off(
        &self,
        submission: TimeOffSubmission,
    ) -> ApiResult<EmployeeRecord> {
        let record = self
            .modify_own(|record| lifecycle::submit_time_off(record, submission))
            .await?;
        info!(
            id = %record.id,
            start = %record.time_off_request.start_date,
            end = %record.time_off_request.end_date,
            "time-off request submitted"
        );
        Ok(record)
    }
}
