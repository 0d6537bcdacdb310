use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::SessionBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Hr,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Employee, Role::Hr];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Hr => "hr",
        }
    }

    pub(crate) fn signed_in_key(self) -> &'static str {
        match self {
            Role::Employee => "isSignedIn",
            Role::Hr => "isHRSignedIn",
        }
    }

    pub(crate) fn identity_key(self) -> &'static str {
        match self {
            Role::Employee => "currentUser",
            Role::Hr => "currentHRUser",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role's session. Signed in exactly when an identity is bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<String>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    fn bound(identity: &str) -> Self {
        Self {
            identity: Some(identity.to_owned()),
        }
    }

    pub fn signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Session", 2)?;
        state.serialize_field("signedIn", &self.signed_in())?;
        state.serialize_field("identity", &self.identity)?;
        state.end()
    }
}

#[derive(Debug, Default)]
struct Slots {
    employee: Session,
    hr: Session,
}

impl Slots {
    fn slot(&self, role: Role) -> &Session {
        match role {
            Role::Employee => &self.employee,
            Role::Hr => &self.hr,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Session {
        match role {
            Role::Employee => &mut self.employee,
            Role::Hr => &mut self.hr,
        }
    }
}

/// Process-wide session state with one independent slot per role.
///
/// Reads are synchronous and served from memory. Every mutation is written
/// through to the backend before it returns; a failed write is logged and the
/// in-memory state stays authoritative.
pub struct SessionStore {
    slots: RwLock<Slots>,
    backend: Arc<dyn SessionBackend>,
    writes: Mutex<()>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Rebuilds both slots from the backend. A role comes back signed in only
    /// when its flag is `"true"` and a non-empty identity is stored.
    pub async fn restore(backend: Arc<dyn SessionBackend>) -> Self {
        let entries = backend.load().await.unwrap_or_else(|err| {
            warn!(error = %err, "failed to load persisted sessions; starting signed out");
            HashMap::new()
        });
        let mut slots = Slots::default();
        for role in Role::ALL {
            *slots.slot_mut(role) = restore_slot(&entries, role);
            debug!(%role, signed_in = slots.slot(role).signed_in(), "session restored");
        }
        Self {
            slots: RwLock::new(slots),
            backend,
            writes: Mutex::new(()),
        }
    }

    pub fn get(&self, role: Role) -> Session {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slot(role)
            .clone()
    }

    pub(crate) async fn set(&self, role: Role, identity: &str) {
        self.apply(role, Session::bound(identity)).await;
    }

    pub(crate) async fn clear(&self, role: Role) {
        self.apply(role, Session::signed_out()).await;
    }

    async fn apply(&self, role: Role, session: Session) {
        let _write = self.writes.lock().await;
        {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            *slots.slot_mut(role) = session.clone();
        }
        if let Err(err) = self.persist(role, &session).await {
            warn!(%role, error = %err, "failed to persist session change");
        }
    }

    async fn persist(&self, role: Role, session: &Session) -> anyhow::Result<()> {
        let flag = if session.signed_in() { "true" } else { "false" };
        self.backend.put(role.signed_in_key(), flag).await?;
        match session.identity() {
            Some(identity) => self.backend.put(role.identity_key(), identity).await,
            None => self.backend.remove(role.identity_key()).await,
        }
    }
}

fn restore_slot(entries: &HashMap<String, String>, role: Role) -> Session {
    let flagged = entries
        .get(role.signed_in_key())
        .is_some_and(|flag| flag == "true");
    match entries.get(role.identity_key()) {
        Some(identity) if flagged && !identity.is_empty() => Session::bound(identity),
        _ => Session::signed_out(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::MemorySessionBackend;

    struct BrokenBackend;

    #[async_trait]
    impl SessionBackend for BrokenBackend {
        async fn load(&self) -> anyhow::Result<HashMap<String, String>> {
            Err(anyhow::anyhow!("disk gone"))
        }

        async fn put(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk gone"))
        }

        async fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk gone"))
        }
    }

    #[tokio::test]
    async fn starts_signed_out_on_empty_backend() {
        let store = SessionStore::restore(Arc::new(MemorySessionBackend::new())).await;
        for role in Role::ALL {
            assert_eq!(store.get(role), Session::signed_out());
        }
    }

    #[tokio::test]
    async fn set_and_clear_write_through_four_entries() {
        let backend = Arc::new(MemorySessionBackend::new());
        let store = SessionStore::restore(backend.clone()).await;

        store.set(Role::Employee, "alice").await;
        store.set(Role::Hr, "AdminHR").await;
        let entries = backend.entries();
        assert_eq!(entries["isSignedIn"], "true");
        assert_eq!(entries["currentUser"], "alice");
        assert_eq!(entries["isHRSignedIn"], "true");
        assert_eq!(entries["currentHRUser"], "AdminHR");

        store.clear(Role::Employee).await;
        let entries = backend.entries();
        assert_eq!(entries["isSignedIn"], "false");
        assert!(!entries.contains_key("currentUser"));
        assert_eq!(store.get(Role::Hr).identity(), Some("AdminHR"));
    }

    #[tokio::test]
    async fn restores_previous_process_state() {
        let backend = Arc::new(MemorySessionBackend::new());
        let first = SessionStore::restore(backend.clone()).await;
        first.set(Role::Hr, "AdminHR").await;
        drop(first);

        let second = SessionStore::restore(backend).await;
        assert_eq!(second.get(Role::Hr).identity(), Some("AdminHR"));
        assert!(!second.get(Role::Employee).signed_in());
    }

    #[tokio::test]
    async fn flag_without_identity_restores_signed_out() {
        let backend = MemorySessionBackend::with_entries([
            ("isSignedIn", "true"),
            ("isHRSignedIn", "false"),
            ("currentHRUser", "AdminHR"),
        ]);
        let store = SessionStore::restore(Arc::new(backend)).await;
        assert!(!store.get(Role::Employee).signed_in());
        assert!(!store.get(Role::Hr).signed_in());
    }

    #[tokio::test]
    async fn backend_failures_do_not_block_sessions() {
        let store = SessionStore::restore(Arc::new(BrokenBackend)).await;
        store.set(Role::Employee, "alice").await;
        assert_eq!(store.get(Role::Employee).identity(), Some("alice"));
        store.clear(Role::Employee).await;
        assert!(!store.get(Role::Employee).signed_in());
    }

    #[test]
    fn session_serializes_flag_and_identity() {
        let json = serde_json::to_value(Session::bound("alice")).unwrap();
        assert_eq!(json, serde_json::json!({"signedIn": true, "identity": "alice"}));
        let json = serde_json::to_value(Session::signed_out()).unwrap();
        assert_eq!(json, serde_json::json!({"signedIn": false, "identity": null}));
    }
}
