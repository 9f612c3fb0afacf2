//! Presentation configuration for the product list.
//!
//! Provides:
//! - `ViewMode` / `GroupKey` - view toggles with strict string parsing
//! - `SortField` / `SortDirection` / `SortOption` - sort configuration
//! - `TableColumn` - column descriptors with visibility toggles

use serde::{Deserialize, Serialize};

/// How the list is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Gallery,
}

impl ViewMode {
    /// Strict parse for URL state; anything unknown is absent, not an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "table" => Some(ViewMode::Table),
            "gallery" => Some(ViewMode::Gallery),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Table => "table",
            ViewMode::Gallery => "gallery",
        }
    }
}

/// Grouping dimension for the list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    #[default]
    None,
    Category,
    Vendor,
    Assignee,
    Stage,
    Priority,
}

impl GroupKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(GroupKey::None),
            "category" => Some(GroupKey::Category),
            "vendor" => Some(GroupKey::Vendor),
            "assignee" => Some(GroupKey::Assignee),
            "stage" => Some(GroupKey::Stage),
            "priority" => Some(GroupKey::Priority),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupKey::None => "none",
            GroupKey::Category => "category",
            GroupKey::Vendor => "vendor",
            GroupKey::Assignee => "assignee",
            GroupKey::Stage => "stage",
            GroupKey::Priority => "priority",
        }
    }

    /// Bucket label for products missing this dimension.
    pub fn default_bucket(self) -> &'static str {
        match self {
            GroupKey::Vendor => "No Vendor",
            GroupKey::Assignee => "Unassigned",
            _ => "Uncategorized",
        }
    }
}

/// Fields the list can sort on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Price,
    Quantity,
    Priority,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortField::Name),
            "price" => Some(SortField::Price),
            "quantity" => Some(SortField::Quantity),
            "priority" => Some(SortField::Priority),
            "created_at" => Some(SortField::CreatedAt),
            "updated_at" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Quantity => "quantity",
            SortField::Priority => "priority",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// A sort choice as presented in the sort menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: SortField,
    pub direction: SortDirection,
    /// User-facing menu label, e.g. "Newest first".
    pub label: String,
}

impl Default for SortOption {
    fn default() -> Self {
        Self {
            field: SortField::UpdatedAt,
            direction: SortDirection::Descending,
            label: "Recently updated".into(),
        }
    }
}

/// A table column with a visibility toggle. Pure presentation state, never
/// persisted server-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    pub label: String,
    pub visible: bool,
}

impl TableColumn {
    fn new(id: &str, label: &str, visible: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible,
        }
    }
}

/// The default column set for the products table.
pub fn default_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::new("name", "Name", true),
        TableColumn::new("category", "Category", true),
        TableColumn::new("vendor", "Vendor", true),
        TableColumn::new("stage", "Stage", true),
        TableColumn::new("priority", "Priority", true),
        TableColumn::new("price", "Price", true),
        TableColumn::new("quantity", "Quantity", false),
        TableColumn::new("assignee", "Assignee", false),
        TableColumn::new("updated_at", "Updated", true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_mode_parse_is_strict() {
        assert_eq!(ViewMode::parse("table"), Some(ViewMode::Table));
        assert_eq!(ViewMode::parse("gallery"), Some(ViewMode::Gallery));
        assert_eq!(ViewMode::parse("Gallery"), None);
        assert_eq!(ViewMode::parse("kanban"), None);
    }

    #[test]
    fn group_key_round_trips_as_str() {
        for key in [
            GroupKey::None,
            GroupKey::Category,
            GroupKey::Vendor,
            GroupKey::Assignee,
            GroupKey::Stage,
            GroupKey::Priority,
        ] {
            assert_eq!(GroupKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn default_buckets_per_dimension() {
        assert_eq!(GroupKey::Category.default_bucket(), "Uncategorized");
        assert_eq!(GroupKey::Vendor.default_bucket(), "No Vendor");
        assert_eq!(GroupKey::Assignee.default_bucket(), "Unassigned");
    }
}
