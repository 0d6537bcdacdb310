use std::sync::Arc;

use platform_api::{ApiError, ApiResult, require_fields};
use platform_store::{EmployeeRecord, EmployeeStore, NewEmployee, TimeOffRequest, find_by_username};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{Role, SessionStore};

/// The single administrative credential pair HR signs in with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HrCredential {
    pub username: String,
    pub password: String,
}

impl Default for HrCredential {
    fn default() -> Self {
        Self {
            username: "AdminHR".into(),
            password: "hr123".into(),
        }
    }
}

/// Self-service signup form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub address: String,
    pub current_assignment: Option<String>,
}

impl Registration {
    fn into_new_employee(self) -> NewEmployee {
        NewEmployee {
            username: self.username,
            password_secret: self.password,
            full_name: self.full_name,
            address: self.address,
            position: self.position,
            current_assignment: self.current_assignment.unwrap_or_default(),
            onboarding_pending: true,
            time_off_request: TimeOffRequest::default(),
            bio: None,
            image: None,
        }
    }
}

/// Verifies credentials and binds or clears role sessions.
///
/// Secrets are compared verbatim against the stored value.
pub struct IdentityService {
    store: Arc<dyn EmployeeStore>,
    sessions: Arc<SessionStore>,
    hr: HrCredential,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn EmployeeStore>,
        sessions: Arc<SessionStore>,
        hr: HrCredential,
    ) -> Self {
        Self {
            store,
            sessions,
            hr,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, role: Role, username: &str, password: &str) -> ApiResult<()> {
        let verified = match role {
            Role::Employee => {
                let records = self.store.list_employees().await?;
                find_by_username(&records, username)
                    .is_some_and(|record| record.password_secret == password)
            }
            Role::Hr => self.hr.username == username && self.hr.password == password,
        };
        if !verified {
            warn!(username, "sign-in rejected");
            return Err(ApiError::InvalidCredentials);
        }
        self.sessions.set(role, username).await;
        info!(username, "signed in");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self, role: Role) {
        self.sessions.clear(role).await;
        info!("signed out");
    }

    /// Creates a pending employee record and signs its owner in.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> ApiResult<EmployeeRecord> {
        let records = self.store.list_employees().await?;
        if find_by_username(&records, &registration.username).is_some() {
            warn!("registration rejected: username taken");
            return Err(ApiError::UsernameTaken(registration.username));
        }
        require_fields(&[
            ("fullName", registration.full_name.as_str()),
            ("username", registration.username.as_str()),
            ("password", registration.password.as_str()),
            ("position", registration.position.as_str()),
            ("address", registration.address.as_str()),
        ])?;

        let record = self
            .store
            .create_employee(registration.into_new_employee())
            .await?;
        self.sessions.set(Role::Employee, &record.username).await;
        info!(id = %record.id, "employee registered");
        Ok(record)
    }
}
