//! Message feed ingestion.
//!
//! The feed is the hosted backend's flat message log. Ingestion retrieves
//! every record inside the trailing window, page by page:
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │  Message log │ ──► │ fetch_window  │ ──► │ Vec<MessageRecord>│
//! │ (PostgREST)  │     │ (1000/page)   │     │  (one request)   │
//! └──────────────┘     └───────────────┘     └──────────────────┘
//! ```
//!
//! Pages are awaited sequentially and a fresh call always starts from
//! page zero; there is no persisted cursor. Ordering prefers the
//! dedicated send-time column; if the store rejects that ordering (the
//! column is absent on older deployments) the whole ingestion restarts
//! once, ordered by row creation time. A failed page after the fallback
//! fails the whole ingestion rather than skipping the page, which would
//! silently corrupt the aggregates.

mod client;

pub use client::FeedClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::MessageRecord;

/// Records fetched per page.
pub const PAGE_SIZE: usize = 1000;

/// Window and tenant filter applied to every page of one ingestion.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    /// Inclusive lower bound on row creation time
    pub since: DateTime<Utc>,
    /// Restrict to one owner's conversations when set
    pub owner_id: Option<String>,
}

/// Column used to order the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    /// Dedicated send-time column (primary)
    SentAt,
    /// Row creation time (fallback for stores without the column)
    CreatedAt,
}

impl OrderKey {
    pub fn column(&self) -> &'static str {
        match self {
            OrderKey::SentAt => "horario_envio",
            OrderKey::CreatedAt => "created_at",
        }
    }
}

/// One page of the message log.
///
/// Implemented by [`FeedClient`] for the real backend and by in-memory
/// fixtures in tests.
#[async_trait]
pub trait MessagePages: Send + Sync {
    /// Fetch `limit` records starting at `offset`, ordered ascending by
    /// `order`, restricted by `query`.
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        order: OrderKey,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MessageRecord>>;
}

/// Fetch the complete window, applying the ordering fallback uniformly.
pub async fn fetch_window<F: MessagePages + ?Sized>(
    feed: &F,
    query: &FeedQuery,
    page_size: usize,
) -> Result<Vec<MessageRecord>> {
    match collect_ordered(feed, query, OrderKey::SentAt, page_size).await {
        Ok(records) => Ok(records),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Send-time ordering rejected, restarting ingestion ordered by creation time"
            );
            collect_ordered(feed, query, OrderKey::CreatedAt, page_size).await
        }
    }
}

async fn collect_ordered<F: MessagePages + ?Sized>(
    feed: &F,
    query: &FeedQuery,
    order: OrderKey,
    page_size: usize,
) -> Result<Vec<MessageRecord>> {
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = feed.fetch_page(query, order, offset, page_size).await?;
        let fetched = page.len();
        records.extend(page);

        if fetched < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::debug!(
        records = records.len(),
        order = order.column(),
        "Fetched message window"
    );
    Ok(records)
}
