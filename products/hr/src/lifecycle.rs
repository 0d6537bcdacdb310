//! Record-level transitions of the two lifecycle axes.
//!
//! Functions here only mutate an in-memory record; persisting the result is
//! the caller's job (see [`crate::LifecycleEngine`]).

use platform_api::{ApiError, ApiResult, require_fields};
use platform_store::{EmployeeRecord, TimeOffRequest};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingState {
    Pending,
    Active,
}

impl OnboardingState {
    pub fn of(record: &EmployeeRecord) -> Self {
        if record.onboarding_pending {
            Self::Pending
        } else {
            Self::Active
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOffStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl TimeOffStatus {
    /// An unreviewed request is pending whatever its `approved` flag says.
    pub fn of(request: &TimeOffRequest) -> Self {
        match (request.reviewed, request.approved) {
            (false, _) if request.is_blank() => Self::None,
            (false, _) => Self::Pending,
            (true, true) => Self::Approved,
            (true, false) => Self::Rejected,
        }
    }
}

/// Guided onboarding form filled in by the new hire.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingForm {
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub address: String,
    pub current_assignment: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeOffSubmission {
    pub start_date: String,
    pub end_date: String,
    pub note: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TimeOffDecision {
    pub approved: bool,
    #[serde(default)]
    pub note: Option<String>,
}

/// Pending → Active through the employee's own form.
pub fn complete_onboarding(record: &mut EmployeeRecord, form: OnboardingForm) -> ApiResult<()> {
    if OnboardingState::of(record) == OnboardingState::Active {
        return Err(ApiError::validation("Onboarding is already complete"));
    }
    require_fields(&[
        ("password", form.password.as_str()),
        ("fullName", form.full_name.as_str()),
        ("position", form.position.as_str()),
        ("address", form.address.as_str()),
    ])?;
    record.password_secret = form.password;
    record.full_name = form.full_name;
    record.position = form.position;
    record.address = form.address;
    record.current_assignment = form.current_assignment.unwrap_or_default();
    record.onboarding_pending = false;
    Ok(())
}

/// Pending → Active on HR's say-so. Idempotent.
pub fn approve_new_hire(record: &mut EmployeeRecord) {
    record.onboarding_pending = false;
}

/// Replaces any previous request, decided or not, with a fresh pending one.
pub fn submit_time_off(
    record: &mut EmployeeRecord,
    submission: TimeOffSubmission,
) -> ApiResult<()> {
    require_fields(&[
        ("startDate", submission.start_date.as_str()),
        ("endDate", submission.end_date.as_str()),
    ])?;
    record.time_off_request =
        TimeOffRequest::submitted(submission.start_date, submission.end_date, submission.note);
    Ok(())
}

/// Marks the request reviewed with the given outcome. Returns the status the
/// request had before, so callers can notice a re-decision.
pub fn decide_time_off(record: &mut EmployeeRecord, decision: TimeOffDecision) -> TimeOffStatus {
    let previous = TimeOffStatus::of(&record.time_off_request);
    let request = &mut record.time_off_request;
    request.approved = decision.approved;
    request.reviewed = true;
    if let Some(note) = decision.note {
        request.note = note;
    }
    previous
}

/// HR may clear the onboarding flag through a full edit but never raise it
/// again once the record is active. An approved request is always reviewed.
pub fn merge_hr_edit(current: &EmployeeRecord, mut edited: EmployeeRecord) -> EmployeeRecord {
    edited.id = current.id.clone();
    edited.onboarding_pending = current.onboarding_pending && edited.onboarding_pending;
    if edited.time_off_request.approved {
        edited.time_off_request.reviewed = true;
    }
    edited
}
