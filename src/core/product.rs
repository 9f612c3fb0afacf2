//! Product entity, identifiers, and partial updates.
//!
//! Provides:
//! - `ProductId` - opaque server id or client temp id
//! - `Product` - the dashboard's product record
//! - `NewProduct` - creation payload (no id, no timestamps)
//! - `ProductPatch` - partial update built from `Patch<T>` fields

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use crate::clock::WallClock;
use crate::error::InvalidProductId;

/// Prefix of client-generated temporary ids.
const TEMP_ID_PREFIX: &str = "product_";

/// Product identifier - non-empty opaque string.
///
/// Server-assigned ids are opaque. Ids minted client-side for the optimistic
/// window use the `product_<timestamp>_<random>` form and are recognizable
/// via `is_temp`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidProductId> {
        let s = s.into();
        if s.is_empty() {
            Err(InvalidProductId { raw: s })
        } else {
            Ok(Self(s))
        }
    }

    /// Mint a temporary id for an optimistic create.
    pub fn temp(now: WallClock) -> Self {
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("{TEMP_ID_PREFIX}{}_{suffix:08x}", now.0))
    }

    /// Whether this id was minted client-side.
    pub fn is_temp(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({:?})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product priority for triage views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product record as materialized client-side.
///
/// Only `id` and `name` are required; every other field exists because some
/// filter, group, or sort dimension names it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub created_at: WallClock,
    #[serde(default)]
    pub updated_at: WallClock,
}

impl Product {
    /// Materialize a creation payload under a freshly minted temp id.
    pub fn temp_from(payload: &NewProduct, now: WallClock) -> Self {
        Self {
            id: ProductId::temp(now),
            name: payload.name.clone(),
            description: payload.description.clone(),
            category: payload.category.clone(),
            vendor: payload.vendor.clone(),
            assignee: payload.assignee.clone(),
            stage: payload.stage.clone(),
            priority: payload.priority,
            tags: payload.tags.clone(),
            price: payload.price,
            quantity: payload.quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this product with a patch folded in.
    pub fn patched(&self, patch: &ProductPatch) -> Self {
        let mut next = self.clone();
        patch.apply_to(&mut next);
        next
    }
}

/// Creation payload - what the caller supplies before the server assigns an
/// id and timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl NewProduct {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Duplication payload: the source product with `(Copy)` suffixed to the
    /// name and the id stripped.
    pub fn duplicating(source: &Product) -> Self {
        Self {
            name: format!("{} (Copy)", source.name),
            ..Self::restoring(source)
        }
    }

    /// Re-creation payload for restoring a deleted product.
    pub fn restoring(source: &Product) -> Self {
        Self {
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            vendor: source.vendor.clone(),
            assignee: source.assignee.clone(),
            stage: source.stage.clone(),
            priority: source.priority,
            tags: source.tags.clone(),
            price: source.price,
            quantity: source.quantity,
        }
    }
}

/// Partial update for product fields.
///
/// All fields default to `Keep`. Absent = keep, null = clear, value = set on
/// the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub name: Patch<String>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub category: Patch<Vec<String>>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub vendor: Patch<String>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub assignee: Patch<String>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub stage: Patch<String>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub priority: Patch<Priority>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub tags: Patch<Vec<String>>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub price: Patch<f64>,

    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub quantity: Patch<u32>,
}

impl ProductPatch {
    /// Shallow-merge this patch into a product. Timestamps are the server's
    /// business; they are left untouched here.
    pub fn apply_to(&self, target: &mut Product) {
        self.name.clone().apply_required(&mut target.name);
        target.description = self.description.clone().apply(target.description.take());
        if let Some(category) = self.category.as_set() {
            target.category = category.clone();
        }
        target.vendor = self.vendor.clone().apply(target.vendor.take());
        target.assignee = self.assignee.clone().apply(target.assignee.take());
        target.stage = self.stage.clone().apply(target.stage.take());
        target.priority = self.priority.clone().apply(target.priority.take());
        if let Some(tags) = self.tags.as_set() {
            target.tags = tags.clone();
        }
        target.price = self.price.clone().apply(target.price.take());
        target.quantity = self.quantity.clone().apply(target.quantity.take());
    }

    /// The full patch that restores `snapshot` field by field - the reverse
    /// effect of any smaller patch applied on top of it.
    pub fn replacing(snapshot: &Product) -> Self {
        fn opt<T: Clone>(value: &Option<T>) -> Patch<T> {
            match value {
                Some(v) => Patch::Set(v.clone()),
                None => Patch::Clear,
            }
        }

        Self {
            name: Patch::Set(snapshot.name.clone()),
            description: opt(&snapshot.description),
            category: Patch::Set(snapshot.category.clone()),
            vendor: opt(&snapshot.vendor),
            assignee: opt(&snapshot.assignee),
            stage: opt(&snapshot.stage),
            priority: opt(&snapshot.priority),
            tags: Patch::Set(snapshot.tags.clone()),
            price: opt(&snapshot.price),
            quantity: opt(&snapshot.quantity),
        }
    }

    /// Whether every field is `Keep`.
    pub fn is_empty(&self) -> bool {
        self.name.is_keep()
            && self.description.is_keep()
            && self.category.is_keep()
            && self.vendor.is_keep()
            && self.assignee.is_keep()
            && self.stage.is_keep()
            && self.priority.is_keep()
            && self.tags.is_keep()
            && self.price.is_keep()
            && self.quantity.is_keep()
    }
}
