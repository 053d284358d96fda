//! Store health reporting.

use crate::document::DocumentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Result of a store health check.
///
/// Serializes with a lowercase `status` tag, ready to return from a
/// `/health` route as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthReport {
    /// The document is readable; carries collection counts and the
    /// bookkeeping stamps.
    Healthy {
        users: usize,
        products: usize,
        orders: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_updated: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },

    /// The document could not be read.
    Unhealthy { error: String },
}

impl HealthReport {
    /// Returns true for a healthy report.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

impl DocumentStore {
    /// Checks whether the store document is readable.
    ///
    /// Never fails: any read error is downgraded into an
    /// [`HealthReport::Unhealthy`] result instead of propagating.
    pub async fn health_check(&self) -> HealthReport {
        match self.read().await {
            Ok(document) => HealthReport::Healthy {
                users: document.users.len(),
                products: document.products.len(),
                orders: document.orders.len(),
                last_updated: document.last_updated,
                version: document.version,
            },
            Err(err) => {
                warn!(path = %self.path().display(), "health check failed: {err}");
                HealthReport::Unhealthy {
                    error: err.to_string(),
                }
            }
        }
    }
}
