//! Shipment data service: the façade over the dual-store setup.
//!
//! The service implements the local-first, remote-best-effort consistency
//! policy: every mutation lands in the local store unconditionally before
//! the remote is attempted, and remote failures are logged and absorbed so
//! the application keeps working with no network at all (field and clinic
//! conditions). The two stores are not guaranteed to converge; there is no
//! background reconciliation.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::record::{generate_id, ShipmentRecord};
use crate::remote::{HttpRemote, RemoteStore};
use crate::store::LocalStore;

/// Where reads are currently served from, as a static capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// A remote backend is configured; reads prefer it.
    Cloud,
    /// No usable remote configuration; everything is local.
    Local,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A snapshot of the service's standing, for the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    /// Configured storage mode.
    pub mode: StorageMode,
    /// Number of records in the local store.
    pub records: usize,
    /// Path of the local database file.
    pub database_path: PathBuf,
}

/// CRUD surface over the local store and the optional remote backend.
#[derive(Debug)]
pub struct ShipmentService {
    local: LocalStore,
    remote: Option<Box<dyn RemoteStore>>,
}

impl ShipmentService {
    /// Create a service over the given stores.
    ///
    /// `remote: None` puts the service in permanent local-only mode.
    #[must_use]
    pub fn new(local: LocalStore, remote: Option<Box<dyn RemoteStore>>) -> Self {
        Self { local, remote }
    }

    /// Build a service from configuration: opens the local database and
    /// constructs the HTTP client when a usable remote is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database or HTTP client cannot be set up.
    pub fn from_config(config: &Config) -> Result<Self> {
        let local = LocalStore::open(config.database_path())?;
        let remote: Option<Box<dyn RemoteStore>> = if config.remote_configured() {
            Some(Box::new(HttpRemote::new(
                &config.remote.base_url,
                &config.remote.api_key,
            )?))
        } else {
            None
        };
        Ok(Self::new(local, remote))
    }

    /// Access the underlying local store (backup import/export).
    #[must_use]
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Fetch all records.
    ///
    /// Prefers the remote store when configured; a successful remote read
    /// is mirrored into the local store so the offline fallback stays
    /// fresh. On any remote failure the local collection is returned
    /// instead and a warning notes that the system is in offline mode.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store itself fails.
    pub async fn fetch_all(&self) -> Result<Vec<ShipmentRecord>> {
        if let Some(remote) = &self.remote {
            match remote.list().await {
                Ok(records) => {
                    // Keep the offline fallback aligned with the last
                    // successful remote read.
                    if let Err(e) = self.local.replace_all(&records) {
                        warn!("Failed to mirror remote records locally: {e}");
                    }
                    return Ok(records);
                }
                Err(e) => {
                    warn!("Remote unavailable, operating in offline mode: {e}");
                }
            }
        }
        self.local.list()
    }

    /// Fetch the records matching a free-text query.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store fails.
    pub async fn search(&self, query: &str) -> Result<Vec<ShipmentRecord>> {
        let records = self.fetch_all().await?;
        Ok(records.into_iter().filter(|r| r.matches(query)).collect())
    }

    /// Save a record, creating or replacing it.
    ///
    /// Assigns an id when absent and applies the save-time normalization.
    /// The creation timestamp of an already-stored record is preserved
    /// exactly. The record always lands in the local store first; the
    /// remote upsert is attempted afterwards and its failure is logged and
    /// absorbed. Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local write fails.
    pub async fn save(&self, record: ShipmentRecord) -> Result<ShipmentRecord> {
        let mut record = record.normalized();
        if record.id.is_empty() {
            record.id = generate_id();
        }
        if record.created_at == 0 {
            record.created_at = Utc::now().timestamp_millis();
        }
        if let Some(existing) = self.local.get(&record.id)? {
            // Edits never touch the creation timestamp
            record.created_at = existing.created_at;
        }

        self.local.upsert(&record)?;
        debug!("Saved record {} locally", record.id);

        if let Some(remote) = &self.remote {
            if !remote.upsert(&record).await {
                warn!("Remote upsert failed for {}; record kept locally", record.id);
            }
        }

        Ok(record)
    }

    /// Delete a record by id.
    ///
    /// The local removal is immediate and unconditional; the remote delete
    /// is attempted afterwards and any outcome there is non-fatal. Returns
    /// whether a record was removed locally — the remote result never
    /// resurrects a record in the caller's view.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local write fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.local.remove(id)?;
        debug!("Local removal of {id}: {removed}");

        if let Some(remote) = &self.remote {
            if !remote.delete(id).await {
                warn!("Remote delete failed for {id}; local removal stands");
            }
        }

        Ok(removed)
    }

    /// Report the service's standing: storage mode, record count, paths.
    ///
    /// The mode is a static capability flag derived from configuration,
    /// not a live connectivity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read.
    pub fn status(&self) -> Result<ServiceStatus> {
        let mode = if self.remote.is_some() {
            StorageMode::Cloud
        } else {
            StorageMode::Local
        };
        Ok(ServiceStatus {
            mode,
            records: self.local.count()?,
            database_path: self.local.path().to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// Remote double that always fails, simulating an unreachable backend.
    #[derive(Debug)]
    struct DownRemote;

    #[async_trait]
    impl RemoteStore for DownRemote {
        async fn list(&self) -> Result<Vec<ShipmentRecord>> {
            Err(Error::RemoteUnavailable {
                message: "connection refused".to_string(),
            })
        }

        async fn upsert(&self, _record: &ShipmentRecord) -> bool {
            false
        }

        async fn delete(&self, _id: &str) -> bool {
            false
        }
    }

    /// Remote double serving a fixed collection and accepting all writes.
    #[derive(Debug)]
    struct FixedRemote {
        records: Vec<ShipmentRecord>,
    }

    #[async_trait]
    impl RemoteStore for FixedRemote {
        async fn list(&self) -> Result<Vec<ShipmentRecord>> {
            Ok(self.records.clone())
        }

        async fn upsert(&self, _record: &ShipmentRecord) -> bool {
            true
        }

        async fn delete(&self, _id: &str) -> bool {
            true
        }
    }

    fn draft(tracking: &str) -> ShipmentRecord {
        ShipmentRecord::new(
            tracking.to_string(),
            "joão".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "sp".to_string(),
            None,
            None,
        )
    }

    fn local_only() -> ShipmentService {
        ShipmentService::new(LocalStore::open_in_memory().unwrap(), None)
    }

    fn with_down_remote() -> ShipmentService {
        ShipmentService::new(LocalStore::open_in_memory().unwrap(), Some(Box::new(DownRemote)))
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_normalizes() {
        let service = local_only();
        let mut record = draft("AWB123");
        record.id = String::new();

        let saved = service.save(record).await.unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(saved.patient_name, "JOÃO");
        assert_eq!(saved.destination, "SP");
        assert!(saved.created_at > 0);
    }

    #[tokio::test]
    async fn test_save_ids_unique_across_collection() {
        let service = local_only();
        for i in 0..20 {
            let mut record = draft(&format!("AWB{i}"));
            record.id = String::new();
            service.save(record).await.unwrap();
        }

        let records = service.local().list().unwrap();
        let ids: std::collections::HashSet<&str> =
            records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_resave_preserves_created_at() {
        let service = local_only();
        let saved = service.save(draft("AWB123")).await.unwrap();
        let original_created_at = saved.created_at;

        let mut edited = saved.clone();
        edited.destination = "rj".to_string();
        edited.created_at = 999; // attempt to tamper
        let resaved = service.save(edited).await.unwrap();

        assert_eq!(resaved.created_at, original_created_at);
        assert_eq!(resaved.destination, "RJ");
        assert_eq!(service.local().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_survives_remote_failure() {
        let service = with_down_remote();

        let saved = service.save(draft("AWB123")).await.unwrap();

        let stored = service.local().get(&saved.id).unwrap();
        assert_eq!(stored, Some(saved));
    }

    #[tokio::test]
    async fn test_delete_survives_remote_failure() {
        let service = with_down_remote();
        let saved = service.save(draft("AWB123")).await.unwrap();

        let removed = service.delete(&saved.id).await.unwrap();

        assert!(removed);
        assert!(service.local().get(&saved.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_id_reports_noop() {
        let service = local_only();
        assert!(!service.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_all_local_only() {
        let service = local_only();
        let saved = service.save(draft("AWB123")).await.unwrap();

        let records = service.fetch_all().await.unwrap();
        assert_eq!(records, vec![saved]);
    }

    #[tokio::test]
    async fn test_fetch_all_falls_back_when_remote_down() {
        let service = with_down_remote();
        let saved = service.save(draft("AWB123")).await.unwrap();

        let records = service.fetch_all().await.unwrap();
        assert_eq!(records, vec![saved]);
    }

    #[tokio::test]
    async fn test_fetch_all_prefers_remote_and_mirrors_locally() {
        let remote_record = draft("REMOTE1").normalized();
        let remote = FixedRemote {
            records: vec![remote_record.clone()],
        };
        let local = LocalStore::open_in_memory().unwrap();
        local.upsert(&draft("STALE").normalized()).unwrap();
        let service = ShipmentService::new(local, Some(Box::new(remote)));

        let records = service.fetch_all().await.unwrap();

        assert_eq!(records, vec![remote_record.clone()]);
        // The local fallback now reflects the remote read
        assert_eq!(service.local().list().unwrap(), vec![remote_record]);
    }

    #[tokio::test]
    async fn test_search_filters_records() {
        let service = local_only();
        service.save(draft("AWB123")).await.unwrap();
        let mut other = draft("XYZ999");
        other.patient_name = "maria".to_string();
        service.save(other).await.unwrap();

        let hits = service.search("maria").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].patient_name, "MARIA");

        let all = service.search("").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_status_reports_mode_and_count() {
        let service = local_only();
        service.save(draft("AWB123")).await.unwrap();

        let status = service.status().unwrap();
        assert_eq!(status.mode, StorageMode::Local);
        assert_eq!(status.records, 1);

        let cloud = with_down_remote();
        assert_eq!(cloud.status().unwrap().mode, StorageMode::Cloud);
    }

    #[test]
    fn test_storage_mode_display() {
        assert_eq!(StorageMode::Cloud.to_string(), "cloud");
        assert_eq!(StorageMode::Local.to_string(), "local");
    }
}
