use std::sync::Arc;

use platform_api::{ApiError, ApiResult, require_fields};
use platform_store::{EmployeeId, EmployeeRecord, EmployeeStore, NewEmployee, find_by_username};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    lifecycle::{self, TimeOffDecision, TimeOffStatus},
    read_modify_write,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListing {
    pub total: usize,
    pub employees: Vec<EmployeeRecord>,
}

/// HR-scoped operations over every record.
pub struct HrDesk {
    store: Arc<dyn EmployeeStore>,
}

impl HrDesk {
    pub(crate) fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    /// Case-insensitive search over name, username, time-off note and
    /// assignment. A blank term lists everyone.
    pub async fn list_employees(&self, search: Option<&str>) -> ApiResult<EmployeeListing> {
        let records = self.store.list_employees().await?;
        let total = records.len();
        let term = search.map(str::trim).unwrap_or_default().to_lowercase();
        let employees = if term.is_empty() {
            records
        } else {
            records
                .into_iter()
                .filter(|record| matches_search(record, &term))
                .collect()
        };
        Ok(EmployeeListing { total, employees })
    }

    #[instrument(skip(self, password))]
    pub async fn create_employee(
        &self,
        username: &str,
        password: &str,
    ) -> ApiResult<EmployeeRecord> {
        require_fields(&[("username", username), ("password", password)])?;
        let records = self.store.list_employees().await?;
        if find_by_username(&records, username).is_some() {
            return Err(ApiError::UsernameTaken(username.to_owned()));
        }
        let record = self
            .store
            .create_employee(NewEmployee::stub(username, password))
            .await?;
        info!(id = %record.id, state = "pending", "employee stub created");
        Ok(record)
    }

    /// Whole-record replace. The username stays unique across the collection.
    #[instrument(skip(self, edited))]
    pub async fn edit_employee(
        &self,
        id: &EmployeeId,
        edited: EmployeeRecord,
    ) -> ApiResult<EmployeeRecord> {
        require_fields(&[("username", edited.username.as_str())])?;
        let records = self.store.list_employees().await?;
        if records
            .iter()
            .any(|record| record.id != *id && record.username == edited.username)
        {
            warn!(username = %edited.username, "edit rejected: username taken");
            return Err(ApiError::UsernameTaken(edited.username));
        }
        let record = read_modify_write(self.store.as_ref(), id, |current| {
            *current = lifecycle::merge_hr_edit(current, edited);
            Ok(())
        })
        .await?;
        info!("employee edited");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn approve_new_hire(&self, id: &EmployeeId) -> ApiResult<EmployeeRecord> {
        let record = read_modify_write(self.store.as_ref(), id, |record| {
            lifecycle::approve_new_hire(record);
            Ok(())
        })
        .await?;
        info!(state = "active", "new hire approved");
        Ok(record)
    }

    #[instrument(skip(self, decision), fields(approved = decision.approved))]
    pub async fn decide_time_off(
        &self,
        id: &EmployeeId,
        decision: TimeOffDecision,
    ) -> ApiResult<EmployeeRecord> {
        let mut previous = TimeOffStatus::None;
        let record = read_modify_write(self.store.as_ref(), id, |record| {
            previous = lifecycle::decide_time_off(record, decision);
            Ok(())
        })
        .await?;
        if matches!(previous, TimeOffStatus::Approved | TimeOffStatus::Rejected) {
            warn!(?previous, "overwrote an already reviewed time-off request");
        }
        let status = TimeOffStatus::of(&record.time_off_request);
        info!(?status, "time-off request decided");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: &EmployeeId) -> ApiResult<()> {
        self.store.delete_employee(id).await?;
        info!("employee deleted");
        Ok(())
    }
}

fn matches_search(record: &EmployeeRecord, term: &str) -> bool {
    [
        record.full_name.as_str(),
        record.username.as_str(),
        record.time_off_request.note.as_str(),
        record.current_assignment.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}
