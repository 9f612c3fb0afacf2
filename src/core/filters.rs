//! Filtering criteria for product list queries.
//!
//! Provides:
//! - `ProductFilters` - structured predicate set, one field per dimension
//! - `NumericRange` / `DateRange` - inclusive bounds
//!
//! An empty collection or absent bound means "unconstrained" for that
//! dimension.

use serde::{Deserialize, Serialize};

use super::product::{Priority, Product};
use crate::clock::WallClock;

/// Inclusive numeric bounds; either end may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Inclusive date bounds in ms since epoch; either end may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub after: Option<u64>,
    #[serde(default)]
    pub before: Option<u64>,
}

impl DateRange {
    pub fn contains(&self, at: WallClock) -> bool {
        if let Some(after) = self.after {
            if at.0 < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if at.0 > before {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}

/// Filters for product list queries.
///
/// Multi-value dimensions match when the product carries AT LEAST ONE of the
/// listed values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilters {
    /// Filter by lifecycle stage.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<String>,

    /// Filter by tag.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Filter by category.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Filter by vendor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vendors: Vec<String>,

    /// Filter by assignee.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,

    /// Filter by priority.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<Priority>,

    /// Price bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<NumericRange>,

    /// Stock quantity bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<NumericRange>,

    /// Creation date bounds (ms since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateRange>,

    /// Last-update date bounds (ms since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateRange>,
}

impl ProductFilters {
    /// Whether every dimension is unconstrained.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
            && self.tags.is_empty()
            && self.categories.is_empty()
            && self.vendors.is_empty()
            && self.assignees.is_empty()
            && self.priorities.is_empty()
            && self.price.map_or(true, |r| r.is_empty())
            && self.quantity.map_or(true, |r| r.is_empty())
            && self.created.map_or(true, |r| r.is_empty())
            && self.updated.map_or(true, |r| r.is_empty())
    }

    /// Check a product against every constrained dimension.
    pub fn matches(&self, product: &Product) -> bool {
        if !self.stages.is_empty() {
            match &product.stage {
                Some(stage) if self.stages.contains(stage) => {}
                _ => return false,
            }
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|t| product.tags.contains(t)) {
            return false;
        }

        if !self.categories.is_empty()
            && !self.categories.iter().any(|c| product.category.contains(c))
        {
            return false;
        }

        if !self.vendors.is_empty() {
            match &product.vendor {
                Some(vendor) if self.vendors.contains(vendor) => {}
                _ => return false,
            }
        }

        if !self.assignees.is_empty() {
            match &product.assignee {
                Some(assignee) if self.assignees.contains(assignee) => {}
                _ => return false,
            }
        }

        if !self.priorities.is_empty() {
            match product.priority {
                Some(priority) if self.priorities.contains(&priority) => {}
                _ => return false,
            }
        }

        if let Some(range) = &self.price {
            if !range.is_empty() {
                match product.price {
                    Some(price) if range.contains(price) => {}
                    _ => return false,
                }
            }
        }

        if let Some(range) = &self.quantity {
            if !range.is_empty() {
                match product.quantity {
                    Some(quantity) if range.contains(f64::from(quantity)) => {}
                    _ => return false,
                }
            }
        }

        if let Some(range) = &self.created {
            if !range.contains(product.created_at) {
                return false;
            }
        }

        if let Some(range) = &self.updated {
            if !range.contains(product.updated_at) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::ProductId;

    fn product(stage: &str, tags: &[&str], price: f64) -> Product {
        Product {
            id: ProductId::new("p").unwrap(),
            name: "P".into(),
            description: None,
            category: vec![],
            vendor: None,
            assignee: None,
            stage: Some(stage.into()),
            priority: Some(Priority::High),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            price: Some(price),
            quantity: None,
            created_at: WallClock(5_000),
            updated_at: WallClock(6_000),
        }
    }

    #[test]
    fn empty_filters_match_everything() {
        let filters = ProductFilters::default();
        assert!(filters.is_empty());
        assert!(filters.matches(&product("live", &[], 1.0)));
    }

    #[test]
    fn stage_and_tag_dimensions() {
        let filters = ProductFilters {
            stages: vec!["live".into()],
            tags: vec!["blue".into(), "red".into()],
            ..ProductFilters::default()
        };
        assert!(filters.matches(&product("live", &["red"], 1.0)));
        assert!(!filters.matches(&product("draft", &["red"], 1.0)));
        assert!(!filters.matches(&product("live", &["green"], 1.0)));
    }

    #[test]
    fn price_range_is_inclusive() {
        let filters = ProductFilters {
            price: Some(NumericRange {
                min: Some(2.0),
                max: Some(4.0),
            }),
            ..ProductFilters::default()
        };
        assert!(filters.matches(&product("live", &[], 2.0)));
        assert!(filters.matches(&product("live", &[], 4.0)));
        assert!(!filters.matches(&product("live", &[], 4.5)));
    }

    #[test]
    fn date_range_checks_created_at() {
        let filters = ProductFilters {
            created: Some(DateRange {
                after: Some(4_000),
                before: Some(6_000),
            }),
            ..ProductFilters::default()
        };
        assert!(filters.matches(&product("live", &[], 1.0)));

        let too_early = ProductFilters {
            created: Some(DateRange {
                after: Some(9_000),
                before: None,
            }),
            ..ProductFilters::default()
        };
        assert!(!too_early.matches(&product("live", &[], 1.0)));
    }

    #[test]
    fn bounded_range_rejects_missing_value() {
        let filters = ProductFilters {
            quantity: Some(NumericRange {
                min: Some(1.0),
                max: None,
            }),
            ..ProductFilters::default()
        };
        // product() leaves quantity unset
        assert!(!filters.matches(&product("live", &[], 1.0)));
    }
}
