//! HTTP client for the hosted message log.
//!
//! Speaks the backend's PostgREST dialect: one table, `select=*`, filter
//! and ordering as query parameters, `offset`/`limit` pagination.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::types::MessageRecord;

use super::{FeedQuery, MessagePages, OrderKey};

/// HTTP client for the message feed.
pub struct FeedClient {
    http_client: reqwest::Client,
    base_url: String,
    table: String,
}

impl FeedClient {
    /// Create a new feed client from configuration.
    ///
    /// Returns an error if the configuration is invalid or missing
    /// required fields.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| Error::Config("feed.base_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            headers.insert(
                "apikey",
                HeaderValue::from_str(api_key)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            table: config.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url,
            urlencoding::encode(&self.table)
        )
    }
}

#[async_trait]
impl MessagePages for FeedClient {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        order: OrderKey,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("created_at", format!("gte.{}", query.since.to_rfc3339())),
            ("order", format!("{}.asc", order.column())),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(owner_id) = &query.owner_id {
            params.push(("user_id", format!("eq.{}", owner_id)));
        }

        let response = self
            .http_client
            .get(self.table_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Feed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let records: Vec<MessageRecord> = response
                .json()
                .await
                .map_err(|e| Error::Feed(format!("failed to parse response: {}", e)))?;
            Ok(records)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Feed(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}
