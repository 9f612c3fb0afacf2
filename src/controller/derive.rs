//! Derived views over `ProductsState`.
//!
//! Pure recomputations; nothing here mutates state or talks to the
//! service.

use std::collections::BTreeMap;

use crate::core::{GroupKey, Product, TableColumn};

use super::state::ProductsState;

/// The renderable list: archived entries excluded, favorites sorted to the
/// front. The sort is stable, so within each partition the server order is
/// preserved.
pub fn filtered_products(state: &ProductsState) -> Vec<Product> {
    let mut products: Vec<Product> = state
        .products
        .iter()
        .filter(|p| !state.archived.contains(&p.id))
        .cloned()
        .collect();
    products.sort_by_key(|p| !state.favorites.contains(&p.id));
    products
}

/// Bucket products by the state's grouping dimension.
///
/// Bucket keys come back alphabetically ordered (BTreeMap iteration).
/// Products missing the dimension land in its default bucket; a product
/// with several categories lands in each. With grouping off, everything is
/// one `"All"` bucket.
pub fn grouped_products(state: &ProductsState, products: &[Product]) -> BTreeMap<String, Vec<Product>> {
    let mut buckets: BTreeMap<String, Vec<Product>> = BTreeMap::new();
    let group_by = state.group_by;

    for product in products {
        match group_by {
            GroupKey::None => {
                buckets
                    .entry("All".to_string())
                    .or_default()
                    .push(product.clone());
            }
            GroupKey::Category => {
                if product.category.is_empty() {
                    buckets
                        .entry(group_by.default_bucket().to_string())
                        .or_default()
                        .push(product.clone());
                } else {
                    for category in &product.category {
                        buckets
                            .entry(category.clone())
                            .or_default()
                            .push(product.clone());
                    }
                }
            }
            GroupKey::Vendor => {
                push_optional(&mut buckets, product, product.vendor.as_deref(), group_by);
            }
            GroupKey::Assignee => {
                push_optional(&mut buckets, product, product.assignee.as_deref(), group_by);
            }
            GroupKey::Stage => {
                push_optional(&mut buckets, product, product.stage.as_deref(), group_by);
            }
            GroupKey::Priority => {
                let key = product.priority.map(|p| p.as_str());
                push_optional(&mut buckets, product, key, group_by);
            }
        }
    }

    buckets
}

fn push_optional(
    buckets: &mut BTreeMap<String, Vec<Product>>,
    product: &Product,
    key: Option<&str>,
    group_by: GroupKey,
) {
    let key = key.unwrap_or_else(|| group_by.default_bucket());
    buckets
        .entry(key.to_string())
        .or_default()
        .push(product.clone());
}

/// Columns currently toggled visible, in configured order.
pub fn visible_columns(state: &ProductsState) -> Vec<&TableColumn> {
    state.table_columns.iter().filter(|c| c.visible).collect()
}

/// Whether any filter key is set, the search box is non-empty, or grouping
/// is active.
pub fn has_active_filters(state: &ProductsState) -> bool {
    !state.filters.is_empty()
        || !state.search_query.is_empty()
        || state.group_by != GroupKey::None
}

/// Whether the server holds more rows than are materialized.
pub fn can_load_more(state: &ProductsState) -> bool {
    state.products.len() < state.pagination.total_items
}
