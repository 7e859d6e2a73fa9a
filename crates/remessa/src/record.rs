//! Core domain type for remessa.
//!
//! This module defines the shipment record tracked by the application and
//! the client-side id generation used to key records across both stores.

use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::export::{display_date, search_date_text};

/// Length of a generated record id.
pub const ID_LENGTH: usize = 9;

/// Alphabet for generated record ids (base-36, lowercase).
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new opaque record id.
///
/// Ids are random 9-character base-36 tokens, generated client-side so that
/// records created offline can be merged with the remote store later.
#[must_use]
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// A patient shipment record.
///
/// The sole domain entity: one row in the tracking list, keyed by an opaque
/// id that is immutable once assigned and used for merging across stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    /// Opaque unique identifier, generated client-side when absent.
    pub id: String,

    /// Tracking ("conhecimento") number. Required free text.
    pub tracking_number: String,

    /// Patient name. Uppercased at save time.
    pub patient_name: String,

    /// Date the shipment left origin.
    pub ship_date: NaiveDate,

    /// Destination. Uppercased at save time.
    pub destination: String,

    /// Date the shipment was received; `None` means not yet received.
    #[serde(default)]
    pub receive_date: Option<NaiveDate>,

    /// Optional free-text note. Empty strings are normalized to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Creation timestamp in epoch milliseconds. Set once at first save and
    /// never modified by later edits.
    pub created_at: i64,
}

impl ShipmentRecord {
    /// Create a new record with a freshly generated id and creation timestamp.
    #[must_use]
    pub fn new(
        tracking_number: String,
        patient_name: String,
        ship_date: NaiveDate,
        destination: String,
        receive_date: Option<NaiveDate>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            tracking_number,
            patient_name,
            ship_date,
            destination,
            receive_date,
            note,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Apply the save-time normalization rules: patient name and destination
    /// are uppercased, an empty note becomes `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.patient_name = self.patient_name.to_uppercase();
        self.destination = self.destination.to_uppercase();
        self.note = self.note.filter(|n| !n.is_empty());
        self
    }

    /// Whether the shipment has been received.
    #[must_use]
    pub fn is_received(&self) -> bool {
        self.receive_date.is_some()
    }

    /// The free-text haystack used by search.
    ///
    /// Includes every text field plus the display renderings of both dates
    /// and their `MM/YYYY` and `YYYY` fragments, so a search for "03/2024"
    /// finds all March 2024 shipments.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts = vec![
            self.tracking_number.clone(),
            self.patient_name.clone(),
            self.destination.clone(),
        ];
        if let Some(note) = &self.note {
            parts.push(note.clone());
        }
        parts.push(search_date_text(self.ship_date));
        if let Some(received) = self.receive_date {
            parts.push(search_date_text(received));
        }
        parts.join(" ").to_lowercase()
    }

    /// Case-insensitive substring match against [`Self::search_text`].
    ///
    /// An empty (or whitespace-only) query matches every record.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.search_text().contains(&query)
    }

    /// The receive date rendered for humans, or the empty string if the
    /// shipment is still pending.
    #[must_use]
    pub fn receive_date_display(&self) -> String {
        display_date(self.receive_date)
    }
}
