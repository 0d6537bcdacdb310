use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use platform_api::{ApiError, ApiResult};
use tokio::sync::RwLock;

use crate::{EmployeeId, EmployeeRecord, EmployeeStore, NewEmployee};

/// In-process collection with json-server semantics: sequential string ids,
/// whole-record replace, 404 on unknown ids.
#[derive(Debug)]
pub struct MemoryEmployeeStore {
    records: RwLock<Vec<EmployeeRecord>>,
    next_id: AtomicU64,
}

impl Default for MemoryEmployeeStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<EmployeeRecord>) -> Self {
        let next = records
            .iter()
            .filter_map(|record| record.id.as_str().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self {
            records: RwLock::new(records),
            next_id: AtomicU64::new(next),
        }
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn list_employees(&self) -> ApiResult<Vec<EmployeeRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn get_employee(&self, id: &EmployeeId) -> ApiResult<EmployeeRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_employee(&self, fields: NewEmployee) -> ApiResult<EmployeeRecord> {
        let id = EmployeeId::new(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        let record = fields.into_record(id);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_employee(
        &self,
        id: &EmployeeId,
        record: &EmployeeRecord,
    ) -> ApiResult<EmployeeRecord> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|existing| &existing.id == id)
            .ok_or(ApiError::NotFound)?;
        *slot = EmployeeRecord {
            id: id.clone(),
            ..record.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_employee(&self, id: &EmployeeId) -> ApiResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_continue_after_seeded_records() {
        let seeded = NewEmployee::stub("mercy", "cat123").into_record(EmployeeId::new("12"));
        let store = MemoryEmployeeStore::with_records(vec![seeded]);
        let created = store
            .create_employee(NewEmployee::stub("bob", "temp123"))
            .await
            .unwrap();
        assert_eq!(created.id.as_str(), "13");
        assert_eq!(store.list_employees().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_is_whole_record_and_keeps_path_id() {
        let store = MemoryEmployeeStore::new();
        let created = store
            .create_employee(NewEmployee::stub("bob", "temp123"))
            .await
            .unwrap();

        let replacement = EmployeeRecord {
            id: EmployeeId::new("other"),
            username: "bob".into(),
            password_secret: "temp123".into(),
            position: "Gardener".into(),
            ..EmployeeRecord::default()
        };
        let stored = store.update_employee(&created.id, &replacement).await.unwrap();
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.position, "Gardener");
        assert!(!stored.onboarding_pending);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryEmployeeStore::new();
        let id = EmployeeId::new("9");
        assert!(matches!(store.get_employee(&id).await, Err(ApiError::NotFound)));
        assert!(matches!(store.delete_employee(&id).await, Err(ApiError::NotFound)));
        assert!(matches!(
            store.update_employee(&id, &EmployeeRecord::default()).await,
            Err(ApiError::NotFound)
        ));
    }
}
