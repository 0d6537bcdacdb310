use anyhow::{Context, anyhow};
use async_trait::async_trait;
use platform_api::{ApiError, ApiResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{EmployeeId, EmployeeRecord, EmployeeStore, NewEmployee};

const COLLECTION: &str = "employees";

/// Client for a json-server style `/employees` collection.
#[derive(Clone, Debug)]
pub struct HttpEmployeeStore {
    client: Client,
    collection: Url,
}

impl HttpEmployeeStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> anyhow::Result<Self> {
        let mut base =
            Url::parse(base_url).with_context(|| format!("invalid record store url {base_url}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("record store url {base_url} cannot carry a path"));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let collection = base.join(COLLECTION)?;
        Ok(Self { client, collection })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn item_url(&self, id: &EmployeeId) -> ApiResult<Url> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::store(anyhow!("record store url cannot carry a path")))?
            .push(id.as_str());
        Ok(url)
    }
}

fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        debug!(url = %response.url(), "record store returned 404");
        return Err(ApiError::NotFound);
    }
    response.error_for_status().map_err(|err| {
        warn!(%status, error = %err, "record store rejected request");
        ApiError::store(err)
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    check(response)?.json::<T>().await.map_err(ApiError::store)
}

fn transport(err: reqwest::Error) -> ApiError {
    warn!(error = %err, "record store unreachable");
    ApiError::store(err)
}

#[async_trait]
impl EmployeeStore for HttpEmployeeStore {
    async fn list_employees(&self) -> ApiResult<Vec<EmployeeRecord>> {
        let response = self
            .client
            .get(self.collection.clone())
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn get_employee(&self, id: &EmployeeId) -> ApiResult<EmployeeRecord> {
        let response = self
            .client
            .get(self.item_url(id)?)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn create_employee(&self, fields: NewEmployee) -> ApiResult<EmployeeRecord> {
        let response = self
            .client
            .post(self.collection.clone())
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn update_employee(
        &self,
        id: &EmployeeId,
        record: &EmployeeRecord,
    ) -> ApiResult<EmployeeRecord> {
        let response = self
            .client
            .put(self.item_url(id)?)
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn delete_employee(&self, id: &EmployeeId) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.item_url(id)?)
            .send()
            .await
            .map_err(transport)?;
        check(response).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode as AxumStatus,
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;

    type Rows = Arc<Mutex<Vec<Value>>>;

    async fn list(State(rows): State<Rows>) -> Json<Vec<Value>> {
        Json(rows.lock().unwrap().clone())
    }

    async fn create(State(rows): State<Rows>, Json(mut body): Json<Value>) -> Json<Value> {
        let mut rows = rows.lock().unwrap();
        body["id"] = json!(format!("{}", rows.len() + 100));
        rows.push(body.clone());
        Json(body)
    }

    async fn fetch(
        State(rows): State<Rows>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, AxumStatus> {
        rows.lock()
            .unwrap()
            .iter()
            .find(|row| row["id"] == json!(id))
            .cloned()
            .map(Json)
            .ok_or(AxumStatus::NOT_FOUND)
    }

    async fn replace(
        State(rows): State<Rows>,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, AxumStatus> {
        let mut rows = rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row["id"] == json!(id))
            .ok_or(AxumStatus::NOT_FOUND)?;
        *row = body.clone();
        Ok(Json(body))
    }

    async fn remove(State(rows): State<Rows>, Path(id): Path<String>) -> AxumStatus {
        let mut rows = rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row["id"] != json!(id));
        if rows.len() == before {
            AxumStatus::NOT_FOUND
        } else {
            AxumStatus::OK
        }
    }

    async fn spawn_json_server(rows: Rows) -> String {
        let router = Router::new()
            .route("/employees", get(list).post(create))
            .route(
                "/employees/{id}",
                get(fetch).put(replace).delete(remove),
            )
            .with_state(rows);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn seed_rows() -> Rows {
        Arc::new(Mutex::new(vec![json!({
            "id": "1",
            "employeeName": "Mercy Brown",
            "employeeUser": "MercyB47",
            "employeePassword": "cat123",
            "address": "12 Fern Lane",
            "position": "Gardener",
            "currentAssignment": "",
            "timeRequest": {
                "startDate": "",
                "endDate": "",
                "approved": false,
                "reviewed": false,
                "note": ""
            },
            "newEmployeeFlag": false
        })]))
    }

    #[test]
    fn collection_url_tolerates_trailing_slash_and_prefix() {
        let plain = HttpEmployeeStore::new("http://localhost:3001").unwrap();
        assert_eq!(plain.collection_url().as_str(), "http://localhost:3001/employees");
        let prefixed = HttpEmployeeStore::new("http://localhost:3001/api/").unwrap();
        assert_eq!(
            prefixed.collection_url().as_str(),
            "http://localhost:3001/api/employees"
        );
        assert!(HttpEmployeeStore::new("not a url").is_err());
    }

    #[tokio::test]
    async fn crud_round_against_json_server() {
        let rows = seed_rows();
        let base = spawn_json_server(rows.clone()).await;
        let store = HttpEmployeeStore::new(&base).unwrap();

        let listed = store.list_employees().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "MercyB47");

        let created = store
            .create_employee(NewEmployee::stub("bob", "temp123"))
            .await
            .unwrap();
        assert_eq!(created.id, EmployeeId::new("101"));
        assert!(created.onboarding_pending);

        let mut updated = created.clone();
        updated.full_name = "Bob Stone".into();
        let stored = store.update_employee(&created.id, &updated).await.unwrap();
        assert_eq!(stored.full_name, "Bob Stone");
        assert_eq!(
            store.get_employee(&created.id).await.unwrap().full_name,
            "Bob Stone"
        );

        store.delete_employee(&created.id).await.unwrap();
        assert_eq!(rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_record_maps_to_not_found() {
        let base = spawn_json_server(seed_rows()).await;
        let store = HttpEmployeeStore::new(&base).unwrap();
        let err = store.get_employee(&EmployeeId::new("404")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        let err = store
            .delete_employee(&EmployeeId::new("404"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let store = HttpEmployeeStore::new(&format!("http://{addr}")).unwrap();
        let err = store.list_employees().await.unwrap_err();
        assert!(matches!(err, ApiError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn server_errors_are_unavailable() {
        let router = Router::new().route(
            "/employees",
            get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let store = HttpEmployeeStore::new(&format!("http://{addr}")).unwrap();
        let err = store.list_employees().await.unwrap_err();
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }
}
