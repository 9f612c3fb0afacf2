//! Collaborator contracts: the remote data service, the notification sink,
//! and the navigation API.
//!
//! All three are implemented by the embedding application; this crate only
//! defines the seams it calls through.

use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{NewProduct, Product, ProductFilters, ProductId, ProductPatch, SortOption};

// =============================================================================
// Data service
// =============================================================================

/// Failure reported by the remote data service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("product {id} not found")]
    NotFound { id: ProductId },

    #[error("conflicting write on product {id}")]
    Conflict { id: ProductId },

    #[error("service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("backend error: {0}")]
    Backend(String),
}

impl ServiceError {
    /// Whether retrying the same call may succeed.
    pub fn retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable { .. })
    }
}

/// Parameters for a list query.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortOption>,
    #[serde(default)]
    pub filters: ProductFilters,
}

/// One page of a list query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: usize,
}

/// The remote CRUD/query service. Opaque to this crate beyond this contract.
pub trait ProductService {
    fn list(&self, options: &ListOptions) -> Result<ProductPage, ServiceError>;
    fn create(&self, payload: &NewProduct) -> Result<Product, ServiceError>;
    fn update(&self, id: &ProductId, patch: &ProductPatch) -> Result<Product, ServiceError>;
    fn delete(&self, id: &ProductId) -> Result<(), ServiceError>;
}

// =============================================================================
// Notification sink
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    #[default]
    Info,
    Success,
    Destructive,
}

/// A user-facing toast. Fire-and-forget; no reply is consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
    /// How long the toast stays up; sink default when absent.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Success,
            duration_ms: None,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
}

/// Where notices go.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Delivers notices over a channel for the UI thread to drain.
pub struct ChannelNotifier {
    tx: Sender<Notice>,
}

impl ChannelNotifier {
    pub fn new(tx: Sender<Notice>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // Receiver may be gone during teardown; notices are best-effort.
        let _ = self.tx.send(notice);
    }
}

/// Discards every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: Notice) {}
}

// =============================================================================
// Navigation
// =============================================================================

/// The current address, split the way the URL synchronizer consumes it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Query string without the leading `?`.
    pub search: String,
}

/// Browser-style navigation API.
pub trait Navigator {
    fn current_location(&self) -> Location;
    fn navigate(&self, url: &str, replace: bool);
}
