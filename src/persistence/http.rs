// src/persistence/http.rs
//! Client for the REST surface of the record server:
//! `GET/POST {base}/api/modules/{id}` and `GET/POST {base}/api/attendance`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::{PersistenceError, PersistenceGateway, PersistenceResult};
use crate::attendance::AttendanceSnapshot;
use crate::records::{ModuleKey, ModuleSnapshot};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> PersistenceResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn module_url(&self, key: &ModuleKey) -> String {
        format!("{}/api/modules/{}", self.base_url, key.as_str())
    }

    pub fn attendance_url(&self) -> String {
        format!("{}/api/attendance", self.base_url)
    }
}

async fn check_status(response: Response) -> PersistenceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PersistenceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> PersistenceResult<T> {
    debug!("GET {}", url);
    let response = check_status(client.get(url).send().await?).await?;
    Ok(response.json::<T>().await?)
}

// The server answers an unknown key with an empty document, so reads never
// come back as `None` from this adapter.
#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>> {
        get_json(&self.client, &self.module_url(key)).await.map(Some)
    }

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
        let url = self.module_url(key);
        let response = self.client.post(&url).json(snapshot).send().await?;
        check_status(response).await?;
        info!("POST {} ({} rows) acknowledged.", url, snapshot.rows.len());
        Ok(())
    }

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>> {
        get_json(&self.client, &self.attendance_url()).await.map(Some)
    }

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()> {
        let url = self.attendance_url();
        let response = self.client.post(&url).json(snapshot).send().await?;
        check_status(response).await?;
        info!("POST {} acknowledged.", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_rest_layout() {
        let gateway = HttpGateway::new("http://localhost:3000/").unwrap();
        let key = ModuleKey::parse("partners").unwrap();
        assert_eq!(gateway.module_url(&key), "http://localhost:3000/api/modules/partners");
        assert_eq!(gateway.attendance_url(), "http://localhost:3000/api/attendance");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_persistence_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let gateway = HttpGateway::new("http://127.0.0.1:9").unwrap();
        let key = ModuleKey::parse("inventory").unwrap();
        let err = gateway.get_module(&key).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Http(_)));
    }
}
