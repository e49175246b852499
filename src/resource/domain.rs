//! Resource content and its cached form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a resource read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceBody {
    /// UTF-8 text.
    Text(String),
    /// Opaque bytes.
    Blob(Vec<u8>),
}

/// Content returned by one resource read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContent {
    /// URI the content was read from.
    pub uri: String,
    /// MIME type of the body.
    pub mime_type: String,
    /// Payload.
    pub body: ResourceBody,
}

impl ResourceContent {
    /// Creates text content.
    #[must_use]
    pub fn text(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            body: ResourceBody::Text(text.into()),
        }
    }

    /// Creates binary content.
    #[must_use]
    pub fn blob(uri: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            body: ResourceBody::Blob(bytes),
        }
    }

    /// Returns the body as text, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            ResourceBody::Text(text) => Some(text),
            ResourceBody::Blob(_) => None,
        }
    }
}

/// Content held by the cache together with its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContent {
    /// Cached payload.
    pub content: ResourceContent,
    /// When the content was stored.
    pub cached_at: DateTime<Utc>,
    /// When the content stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CachedContent {
    /// Returns whether the content is stale at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
