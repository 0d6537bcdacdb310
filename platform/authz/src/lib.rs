//! Access guards for role-protected views.
//!
//! A guard only inspects the session store; it never mutates it and does not
//! tell "never signed in" apart from any other signed-out state. This is a
//! presentation gate, not a server-side security boundary.

use platform_authn::{Role, SessionStore};
use tracing::debug;

pub const EMPLOYEE_LOGIN_PATH: &str = "/LoginEmployee";
pub const HR_LOGIN_PATH: &str = "/LoginHR";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Granted { identity: String },
    Redirect { location: &'static str },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted { .. })
    }
}

pub trait Guard {
    const ROLE: Role;
    const LOGIN_PATH: &'static str;

    fn check(sessions: &SessionStore) -> Access {
        match sessions.get(Self::ROLE).identity() {
            Some(identity) => Access::Granted {
                identity: identity.to_owned(),
            },
            None => {
                debug!(
                    role = %Self::ROLE,
                    location = Self::LOGIN_PATH,
                    "not signed in; redirecting"
                );
                Access::Redirect {
                    location: Self::LOGIN_PATH,
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EmployeeGuard;

impl Guard for EmployeeGuard {
    const ROLE: Role = Role::Employee;
    const LOGIN_PATH: &'static str = EMPLOYEE_LOGIN_PATH;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HrGuard;

impl Guard for HrGuard {
    const ROLE: Role = Role::Hr;
    const LOGIN_PATH: &'static str = HR_LOGIN_PATH;
}
