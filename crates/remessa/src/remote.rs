//! Remote store client for remessa.
//!
//! Best-effort HTTP client against the hosted table resource. The client
//! translates between the wire schema (snake-case Portuguese field names,
//! ISO timestamps) and [`ShipmentRecord`], and never lets a remote failure
//! escape as anything the caller cannot recover from: `list` fails with
//! [`Error::RemoteUnavailable`] for the service layer to catch, and the
//! write paths signal failure only through their return value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::ShipmentRecord;

/// HTTP request timeout for remote calls.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Remote persistence backend for shipment records.
///
/// The seam between the service layer and the network: production code uses
/// [`HttpRemote`], tests inject in-memory doubles to exercise the fallback
/// paths.
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Fetch all records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteUnavailable`] on network failure, a
    /// non-success status, or an untranslatable response body. The caller
    /// is expected to catch this and fall back to local data.
    async fn list(&self) -> Result<Vec<ShipmentRecord>>;

    /// Insert or update a record, merging on id.
    ///
    /// Returns whether the remote accepted the write. Never errors: a
    /// failure here must not block a mutation that already landed locally.
    async fn upsert(&self, record: &ShipmentRecord) -> bool;

    /// Delete a record by id, best-effort.
    ///
    /// Returns whether the remote confirmed the deletion. Callers treat
    /// any outcome as non-fatal since local removal has already happened.
    async fn delete(&self, id: &str) -> bool;
}

/// A shipment record as the remote table serves it.
///
/// The wire schema is fixed by the hosted backend: snake-case Portuguese
/// column names and a server-assigned ISO `created_at`. Keeping this as an
/// explicit struct pair (rather than ad-hoc JSON) means upstream schema
/// drift fails loudly at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireRecord {
    pub id: String,
    pub numero_conhecimento: String,
    pub nome_paciente: String,
    pub data_envio: chrono::NaiveDate,
    pub destino: String,
    pub data_recebimento: Option<chrono::NaiveDate>,
    pub observacao: Option<String>,
    /// Server-assigned; omitted from upsert payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ShipmentRecord> for WireRecord {
    fn from(record: &ShipmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            numero_conhecimento: record.tracking_number.clone(),
            nome_paciente: record.patient_name.clone(),
            data_envio: record.ship_date,
            destino: record.destination.clone(),
            data_recebimento: record.receive_date,
            observacao: record.note.clone(),
            // The server owns this column
            created_at: None,
        }
    }
}

impl From<WireRecord> for ShipmentRecord {
    fn from(wire: WireRecord) -> Self {
        Self {
            id: wire.id,
            tracking_number: wire.numero_conhecimento,
            patient_name: wire.nome_paciente,
            ship_date: wire.data_envio,
            destination: wire.destino,
            receive_date: wire.data_recebimento,
            note: wire.observacao,
            created_at: wire
                .created_at
                .map(|t| t.timestamp_millis())
                .unwrap_or_default(),
        }
    }
}

/// Remote store client over HTTPS with key-based auth.
#[derive(Debug)]
pub struct HttpRemote {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Create a client for the given table endpoint.
    ///
    /// `base_url` is the REST root (e.g. `https://host/rest/v1`); a
    /// trailing slash is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteUnavailable`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    /// Attach the key-based auth header pair to a request.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn patients_url(&self, query: &str) -> String {
        format!("{}/patients{query}", self.base_url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn list(&self) -> Result<Vec<ShipmentRecord>> {
        let url = self.patients_url("?select=*&order=created_at.desc");
        let response = self.authorized(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteUnavailable {
                message: format!("list returned status {status}"),
            });
        }

        let rows: Vec<WireRecord> = response.json().await?;
        debug!("Fetched {} records from remote", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert(&self, record: &ShipmentRecord) -> bool {
        let url = self.patients_url("");
        let payload = WireRecord::from(record);

        let result = self
            .authorized(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Remote upsert accepted for {}", record.id);
                true
            }
            Ok(response) => {
                warn!(
                    "Remote upsert for {} returned status {}",
                    record.id,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Remote upsert for {} failed: {e}", record.id);
                false
            }
        }
    }

    async fn delete(&self, id: &str) -> bool {
        let url = self.patients_url(&format!("?id=eq.{id}"));

        let result = self.authorized(self.client.delete(&url)).send().await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Remote delete confirmed for {id}");
                true
            }
            Ok(response) => {
                warn!("Remote delete for {id} returned status {}", response.status());
                false
            }
            Err(e) => {
                warn!("Remote delete for {id} failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> ShipmentRecord {
        ShipmentRecord {
            id: "abc123def".to_string(),
            tracking_number: "AWB123".to_string(),
            patient_name: "JOÃO".to_string(),
            ship_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            destination: "SP".to_string(),
            receive_date: None,
            note: Some("urgente".to_string()),
            created_at: 1_709_300_000_000,
        }
    }

    #[test]
    fn test_wire_record_deserializes_server_row() {
        let json = r#"{
            "id": "abc123def",
            "numero_conhecimento": "AWB123",
            "nome_paciente": "JOÃO",
            "data_envio": "2024-03-01",
            "destino": "SP",
            "data_recebimento": null,
            "observacao": null,
            "created_at": "2024-03-01T12:30:00+00:00"
        }"#;

        let wire: WireRecord = serde_json::from_str(json).unwrap();
        let record = ShipmentRecord::from(wire);

        assert_eq!(record.id, "abc123def");
        assert_eq!(record.tracking_number, "AWB123");
        assert_eq!(record.patient_name, "JOÃO");
        assert_eq!(record.receive_date, None);
        assert_eq!(record.note, None);
        // ISO timestamp translated into epoch milliseconds
        assert_eq!(record.created_at, 1_709_296_200_000);
    }

    #[test]
    fn test_wire_record_upsert_payload_shape() {
        let wire = WireRecord::from(&sample_record());
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["numero_conhecimento"], "AWB123");
        assert_eq!(json["nome_paciente"], "JOÃO");
        assert_eq!(json["data_envio"], "2024-03-01");
        assert_eq!(json["destino"], "SP");
        assert!(json["data_recebimento"].is_null());
        assert_eq!(json["observacao"], "urgente");
        // The server owns created_at; it never appears in the payload
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_wire_translation_round_trip() {
        let record = sample_record();
        let back = ShipmentRecord::from(WireRecord::from(&record));

        assert_eq!(back.id, record.id);
        assert_eq!(back.tracking_number, record.tracking_number);
        assert_eq!(back.patient_name, record.patient_name);
        assert_eq!(back.ship_date, record.ship_date);
        assert_eq!(back.destination, record.destination);
        assert_eq!(back.receive_date, record.receive_date);
        assert_eq!(back.note, record.note);
        // created_at is server-assigned and not carried through an upsert payload
        assert_eq!(back.created_at, 0);
    }

    #[test]
    fn test_http_remote_urls() {
        let remote = HttpRemote::new("https://example.test/rest/v1/", "key").unwrap();
        assert_eq!(
            remote.patients_url("?select=*&order=created_at.desc"),
            "https://example.test/rest/v1/patients?select=*&order=created_at.desc"
        );
        assert_eq!(
            remote.patients_url("?id=eq.abc123def"),
            "https://example.test/rest/v1/patients?id=eq.abc123def"
        );
    }
}
