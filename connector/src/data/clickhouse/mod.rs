//! ClickHouse entity store
//!
//! Stores report rows in one `ReplacingMergeTree` table per report.
//! Uses the async HTTP client from the `clickhouse` crate, which pools
//! connections via HTTP keep-alive, so concurrent row writes share sockets.

pub mod error;
mod repository_impl;
pub mod schema;

pub use error::ClickhouseError;

use clickhouse::Client;

use crate::core::config::ClickhouseConfig;

/// ClickHouse entity store service
///
/// Handles connection setup and provides access to the ClickHouse client.
pub struct ClickhouseService {
    client: Client,
    config: ClickhouseConfig,
}

impl ClickhouseService {
    /// Initialize the service and verify the server is reachable
    pub async fn init(config: &ClickhouseConfig) -> Result<Self, ClickhouseError> {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let Some(ref user) = config.user {
            client = client.with_user(user);
        }
        if let Some(ref password) = config.password {
            client = client.with_password(password);
        }

        if config.compression {
            client = client.with_compression(clickhouse::Compression::Lz4);
        }

        let service = Self {
            client,
            config: config.clone(),
        };

        service.health_check().await.map_err(|e| {
            ClickhouseError::Connection(format!(
                "{}. Verify ClickHouse is running and accessible at {}",
                e, config.url
            ))
        })?;

        tracing::debug!(
            url = %config.url,
            database = %config.database,
            compression = %config.compression,
            ensure_schema = %config.ensure_schema,
            "ClickhouseService initialized"
        );

        Ok(service)
    }

    /// Get the ClickHouse client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Whether report tables are created on prepare
    pub fn ensure_schema(&self) -> bool {
        self.config.ensure_schema
    }

    /// Health check - verify connection to ClickHouse
    pub async fn health_check(&self) -> Result<(), ClickhouseError> {
        self.client
            .query("SELECT 1")
            .execute()
            .await
            .map_err(ClickhouseError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clickhouse_error_types() {
        let err = ClickhouseError::Connection("test".to_string());
        assert!(err.to_string().contains("test"));
    }
}
