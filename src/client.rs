use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::Config;
use crate::model::logical::Record;
use crate::model::storage::{Fields, FieldsPayload, RecordBody, RecordWithId, WriteAck};

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success status; the store's own response text is the message.
    #[error("{0}")]
    Status(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Unlesbare Antwort des Datenspeichers: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for one record collection of the store. Auth is an ambient
/// session cookie carried verbatim on every request; there is no retry,
/// timeout override, or pagination.
pub struct RecordClient {
    http: Client,
    base_url: String,
    app_id: String,
}

impl RecordClient {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => warn!("Session-Cookie unbrauchbar, wird ignoriert: {}", e),
            }
        }
        let http = Client::builder()
            .user_agent(concat!("marktplatz/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(RecordClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            app_id: config.app_id.clone(),
        })
    }

    fn records_url(&self) -> String {
        format!("{}/apps/{}/records", self.base_url, self.app_id)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/apps/{}/records/{}", self.base_url, self.app_id, id)
    }

    pub fn list(&self) -> Result<Vec<Record>, TransportError> {
        let url = self.records_url();
        debug!("GET {}", url);
        let response = check(self.http.get(&url).send()?)?;
        parse_record_table(&response.text()?)
    }

    pub fn get(&self, id: &str) -> Result<Option<Record>, TransportError> {
        let url = self.record_url(id);
        debug!("GET {}", url);
        let response = self.http.get(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: RecordWithId = check(response)?.json()?;
        Ok(Some(Record::from_parts(record.id, record.body)))
    }

    /// The store acknowledges writes without returning the record; callers
    /// re-list to observe the result. The ack's id is extracted when the
    /// store sends one.
    pub fn create(&self, fields: &Fields) -> Result<Option<String>, TransportError> {
        let url = self.records_url();
        debug!("POST {}", url);
        let response = check(self.http.post(&url).json(&FieldsPayload { fields }).send()?)?;
        let ack: WriteAck = response.json().unwrap_or_default();
        Ok(ack.id)
    }

    /// Partial update: only the named attributes are overwritten. Sending a
    /// key with an empty string clears it; omitted keys are untouched.
    pub fn update(&self, id: &str, fields: &Fields) -> Result<(), TransportError> {
        let url = self.record_url(id);
        debug!("PATCH {}", url);
        check(self.http.patch(&url).json(&FieldsPayload { fields }).send()?)?;
        Ok(())
    }

    /// Idempotent from the caller's view: any success status counts, even
    /// with an empty response body.
    pub fn delete(&self, id: &str) -> Result<bool, TransportError> {
        let url = self.record_url(id);
        debug!("DELETE {}", url);
        check(self.http.delete(&url).send()?)?;
        Ok(true)
    }
}

fn check(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().unwrap_or_default();
    if body.is_empty() {
        body = status.to_string();
    }
    Err(TransportError::Status(body))
}

/// Decodes the list endpoint's id-keyed object in document order, injecting
/// each key as `record_id`. Document order is all the ordering the store
/// guarantees, so it must survive decoding.
fn parse_record_table(raw: &str) -> Result<Vec<Record>, TransportError> {
    let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
    table
        .into_iter()
        .map(|(id, value)| {
            let body: RecordBody = serde_json::from_value(value)?;
            Ok(Record::from_parts(id, body))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_table_keeps_document_order_and_injects_ids() {
        let raw = r#"{
            "b2": {"createdat": "2024-01-02T00:00:00Z", "fields": {"hersteller": "Nike"}},
            "a1": {"createdat": "2024-01-01T00:00:00Z", "fields": {}}
        }"#;
        let records = parse_record_table(raw).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, ["b2", "a1"]);
        assert_eq!(records[0].fields.hersteller.as_deref(), Some("Nike"));
    }

    #[test]
    fn record_table_rejects_non_object_payloads() {
        assert!(matches!(
            parse_record_table("[1,2,3]"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn urls_follow_the_collection_layout() {
        let config = Config {
            base_url: "https://example.test/rest/".to_owned(),
            app_id: "app1".to_owned(),
            ..Config::default()
        };
        let client = RecordClient::new(&config).unwrap();
        assert_eq!(client.records_url(), "https://example.test/rest/apps/app1/records");
        assert_eq!(
            client.record_url("r9"),
            "https://example.test/rest/apps/app1/records/r9"
        );
    }
}
