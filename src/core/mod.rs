//! Domain model: products, patches, filters, and view configuration.

mod filters;
mod patch;
mod product;
mod view;

pub use filters::{DateRange, NumericRange, ProductFilters};
pub use patch::Patch;
pub use product::{NewProduct, Priority, Product, ProductId, ProductPatch};
pub use view::{
    default_columns, GroupKey, SortDirection, SortField, SortOption, TableColumn, ViewMode,
};
