use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Store-assigned record identifier. Numeric ids coming off the wire are
/// normalized to their decimal string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EmployeeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for EmployeeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// Leave request embedded in every employee record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeOffRequest {
    pub start_date: String,
    pub end_date: String,
    pub note: String,
    pub approved: bool,
    pub reviewed: bool,
}

impl TimeOffRequest {
    pub fn submitted(
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            note: note.into(),
            approved: false,
            reviewed: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.start_date.is_empty() && self.end_date.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    /// Empty on directory-only rows that carry no credentials.
    #[serde(rename = "employeeUser", default)]
    pub username: String,
    #[serde(rename = "employeePassword", default)]
    pub password_secret: String,
    #[serde(rename = "employeeName", default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub current_assignment: String,
    #[serde(rename = "newEmployeeFlag", default)]
    pub onboarding_pending: bool,
    #[serde(rename = "timeRequest", default)]
    pub time_off_request: TimeOffRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Fields the portal does not model; carried through whole-record writes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field set for `createEmployee`; the store assigns the id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[serde(rename = "employeeUser")]
    pub username: String,
    #[serde(rename = "employeePassword")]
    pub password_secret: String,
    #[serde(rename = "employeeName")]
    pub full_name: String,
    pub address: String,
    pub position: String,
    pub current_assignment: String,
    #[serde(rename = "newEmployeeFlag")]
    pub onboarding_pending: bool,
    #[serde(rename = "timeRequest")]
    pub time_off_request: TimeOffRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewEmployee {
    /// Minimal account created by HR: credentials only, onboarding pending.
    pub fn stub(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_secret: password.into(),
            onboarding_pending: true,
            ..Self::default()
        }
    }

    pub fn into_record(self, id: EmployeeId) -> EmployeeRecord {
        EmployeeRecord {
            id,
            username: self.username,
            password_secret: self.password_secret,
            full_name: self.full_name,
            address: self.address,
            position: self.position,
            current_assignment: self.current_assignment,
            onboarding_pending: self.onboarding_pending,
            time_off_request: self.time_off_request,
            bio: self.bio,
            image: self.image,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_server_record() {
        let record: EmployeeRecord = serde_json::from_value(json!({
            "id": 7,
            "employeeName": "Mercy Brown",
            "employeeUser": "MercyB47",
            "employeePassword": "cat123",
            "address": "12 Fern Lane",
            "position": "Gardener",
            "currentAssignment": "Succulent Hydration Project",
            "timeRequest": {
                "startDate": "2024-06-01",
                "endDate": "2024-06-10",
                "approved": true,
                "note": "beach"
            },
            "newEmployeeFlag": false,
            "bio": "Loves ferns",
            "badge": "gold"
        }))
        .unwrap();

        assert_eq!(record.id, EmployeeId::new("7"));
        assert_eq!(record.username, "MercyB47");
        assert!(record.time_off_request.approved);
        assert!(!record.time_off_request.reviewed);
        assert_eq!(record.extra.get("badge"), Some(&json!("gold")));
    }

    #[test]
    fn unknown_fields_survive_reencoding() {
        let record: EmployeeRecord = serde_json::from_value(json!({
            "id": "a1",
            "employeeUser": "bob",
            "employeePassword": "temp123",
            "badge": "silver"
        }))
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["badge"], json!("silver"));
        assert_eq!(value["newEmployeeFlag"], json!(false));
        assert_eq!(value["timeRequest"]["reviewed"], json!(false));
        assert!(value.get("bio").is_none());
    }

    #[test]
    fn decodes_row_without_credentials() {
        let records: Vec<EmployeeRecord> = serde_json::from_value(json!([
            {
                "id": "1",
                "employeeUser": "MercyB47",
                "employeePassword": "cat123"
            },
            {
                "id": 9,
                "employeeName": "Ivy Chen",
                "position": "Arborist",
                "bio": "Prunes the old oaks",
                "image": "/images/ivy.jpg"
            }
        ]))
        .unwrap();

        let gardener = &records[1];
        assert_eq!(gardener.id, EmployeeId::new("9"));
        assert_eq!(gardener.username, "");
        assert_eq!(gardener.password_secret, "");
        assert_eq!(gardener.bio.as_deref(), Some("Prunes the old oaks"));
    }

    #[test]
    fn stub_is_pending_with_blank_request() {
        let stub = NewEmployee::stub("bob", "temp123");
        assert!(stub.onboarding_pending);
        assert!(stub.time_off_request.is_blank());
        assert!(stub.full_name.is_empty());
    }
}
