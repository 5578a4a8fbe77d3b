//! Startup bulk load from the persistence service

use reqwest::Client;

use crate::core::error::{Result, TrackerError};
use crate::telemetry::wire::{decode_payload, DecodedBatch};

/// Fetches the full animal set once at session start
pub struct BulkLoader {
    client: Client,
    api_url: String,
}

impl BulkLoader {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    pub fn animals_url(&self) -> String {
        format!("{}/animals", self.api_url.trim_end_matches('/'))
    }

    /// `GET /animals`; each record is validated individually
    pub async fn fetch(&self) -> Result<DecodedBatch> {
        let url = self.animals_url();
        tracing::info!("Loading animals from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrackerError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TrackerError::Http(format!("{}: {}", status, error_text)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TrackerError::Http(e.to_string()))?;

        if !payload.is_array() {
            return Err(TrackerError::MalformedUpdate(
                "bulk load must return an array of records".into(),
            ));
        }

        let batch = decode_payload(payload);
        tracing::info!(
            "Bulk load returned {} records ({} rejected)",
            batch.updates.len(),
            batch.rejected.len()
        );
        Ok(batch)
    }
}
