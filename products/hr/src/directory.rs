use platform_api::ApiResult;
use platform_store::{EmployeeId, EmployeeRecord, EmployeeStore};
use serde::Serialize;

/// Public staff card shown on the home page. Credentials and time-off data
/// never leave the store through this view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaffProfile {
    pub id: EmployeeId,
    pub name: String,
    pub position: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl StaffProfile {
    fn from_record(record: EmployeeRecord) -> Option<Self> {
        let bio = record.bio.filter(|bio| !bio.trim().is_empty())?;
        Some(Self {
            id: record.id,
            name: record.full_name,
            position: record.position,
            bio,
            image: record.image,
        })
    }
}

/// Employees who have written a bio, in store order.
pub(crate) async fn staff_directory(store: &dyn EmployeeStore) -> ApiResult<Vec<StaffProfile>> {
    let records = store.list_employees().await?;
    Ok(records
        .into_iter()
        .filter_map(StaffProfile::from_record)
        .collect())
}
