//! Reducer state machine for the product list.
//!
//! Provides:
//! - `ProductsState` - everything the list view renders from
//! - `ProductsAction` - the full transition vocabulary
//! - `reduce` - deterministic, single-purpose transitions
//!
//! The reducer owns its state and mutates in place; dispatches are processed
//! strictly in the order issued.

use std::collections::BTreeSet;

use crate::core::{
    default_columns, GroupKey, Product, ProductFilters, ProductId, SortOption, TableColumn,
    ViewMode,
};

/// Pagination bookkeeping. `current_page` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub items_per_page: usize,
    pub total_items: usize,
    pub is_loading_more: bool,
}

impl Pagination {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page,
            total_items: 0,
            is_loading_more: false,
        }
    }
}

/// State of the paginated, filterable, sortable product collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductsState {
    /// Server-fetched page(s) plus any direct optimistic dispatches.
    pub products: Vec<Product>,
    /// Raw search text, as typed.
    pub search_query: String,
    /// The 300ms-settled search text; the only value that reaches queries
    /// and cache keys.
    pub debounced_search_query: String,
    pub filters: ProductFilters,
    pub selected_view: ViewMode,
    pub group_by: GroupKey,
    pub sort: SortOption,
    pub table_columns: Vec<TableColumn>,
    pub pagination: Pagination,
    /// Client-local overlays, never persisted server-side by this layer.
    pub favorites: BTreeSet<ProductId>,
    pub archived: BTreeSet<ProductId>,
    pub selected: BTreeSet<ProductId>,
}

impl ProductsState {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            products: Vec::new(),
            search_query: String::new(),
            debounced_search_query: String::new(),
            filters: ProductFilters::default(),
            selected_view: ViewMode::default(),
            group_by: GroupKey::default(),
            sort: SortOption::default(),
            table_columns: default_columns(),
            pagination: Pagination::new(items_per_page),
            favorites: BTreeSet::new(),
            archived: BTreeSet::new(),
            selected: BTreeSet::new(),
        }
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }
}

/// Transition vocabulary for `reduce`.
#[derive(Clone, Debug)]
pub enum ProductsAction {
    /// Replace the materialized collection (plain fetch path).
    SetProducts(Vec<Product>),
    /// Extend the collection (load-more path).
    AppendProducts(Vec<Product>),
    /// Prepend one product (optimistic create, delete compensation).
    AddProduct(Product),
    /// Swap the entry with this id for an authoritative one.
    ReplaceProduct { id: ProductId, product: Product },
    RemoveProduct(ProductId),
    SetSearchQuery(String),
    SetDebouncedSearchQuery(String),
    SetFilters(ProductFilters),
    ClearFilters,
    SetView(ViewMode),
    SetGroupBy(GroupKey),
    SetSort(SortOption),
    SetColumns(Vec<TableColumn>),
    /// Flip visibility of the column with this id; unknown ids are ignored.
    ToggleColumn(String),
    SetPage(u32),
    SetTotalItems(usize),
    SetLoadingMore(bool),
    ToggleSelected(ProductId),
    ClearSelection,
    ToggleFavorite(ProductId),
    ToggleArchived(ProductId),
    /// Back to pristine state, keeping the configured page size.
    Reset,
}

/// Apply one action. Every case is a single-purpose transition.
pub fn reduce(state: &mut ProductsState, action: ProductsAction) {
    match action {
        ProductsAction::SetProducts(products) => {
            state.products = products;
        }
        ProductsAction::AppendProducts(mut products) => {
            state.products.append(&mut products);
        }
        ProductsAction::AddProduct(product) => {
            state.products.insert(0, product);
        }
        ProductsAction::ReplaceProduct { id, product } => {
            if let Some(slot) = state.products.iter_mut().find(|p| p.id == id) {
                *slot = product;
            }
        }
        ProductsAction::RemoveProduct(id) => {
            state.products.retain(|p| p.id != id);
            state.selected.remove(&id);
        }
        ProductsAction::SetSearchQuery(query) => {
            state.search_query = query;
        }
        ProductsAction::SetDebouncedSearchQuery(query) => {
            state.debounced_search_query = query;
        }
        ProductsAction::SetFilters(filters) => {
            state.filters = filters;
        }
        ProductsAction::ClearFilters => {
            state.filters = ProductFilters::default();
        }
        ProductsAction::SetView(view) => {
            state.selected_view = view;
        }
        ProductsAction::SetGroupBy(group_by) => {
            state.group_by = group_by;
        }
        ProductsAction::SetSort(sort) => {
            state.sort = sort;
        }
        ProductsAction::SetColumns(columns) => {
            state.table_columns = columns;
        }
        ProductsAction::ToggleColumn(column_id) => {
            if let Some(column) = state
                .table_columns
                .iter_mut()
                .find(|c| c.id == column_id)
            {
                column.visible = !column.visible;
            }
        }
        ProductsAction::SetPage(page) => {
            state.pagination.current_page = page.max(1);
        }
        ProductsAction::SetTotalItems(total) => {
            state.pagination.total_items = total;
        }
        ProductsAction::SetLoadingMore(loading) => {
            state.pagination.is_loading_more = loading;
        }
        ProductsAction::ToggleSelected(id) => {
            toggle(&mut state.selected, id);
        }
        ProductsAction::ClearSelection => {
            state.selected.clear();
        }
        ProductsAction::ToggleFavorite(id) => {
            toggle(&mut state.favorites, id);
        }
        ProductsAction::ToggleArchived(id) => {
            toggle(&mut state.archived, id);
        }
        ProductsAction::Reset => {
            *state = ProductsState::new(state.pagination.items_per_page);
        }
    }
}

fn toggle(set: &mut BTreeSet<ProductId>, id: ProductId) {
    if !set.remove(&id) {
        set.insert(id);
    }
}
