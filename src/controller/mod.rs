//! The product list controller.
//!
//! Composes the reducer state machine, the optimistic update tracker, and
//! the undo/redo stack, and delegates persistence to the external data
//! service. Mutations follow a three-phase protocol:
//!
//! 1. optimistic: synthesize the locally visible result, register it with
//!    the tracker, dispatch it into state immediately
//! 2. commit: call the data service; on success reconcile state to the
//!    authoritative entity, resolve the tracker entry, and record a
//!    compensating action on the undo stack
//! 3. compensation: on service failure reverse the optimistic dispatch,
//!    leave the tracker entry marked failed (it auto-clears), emit a
//!    destructive notice, and return the error to the caller
//!
//! Everything runs on the caller's thread; the embedding application is
//! expected to call `tick` from its event loop to drive the debounce and
//! sweep deadlines.

mod cache;
mod debounce;
mod derive;
mod state;

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

use crate::clock::{TimeSource, WallClock};
use crate::config::StateConfig;
use crate::core::{
    GroupKey, NewProduct, Product, ProductFilters, ProductId, ProductPatch, SortOption,
    TableColumn, ViewMode,
};
use crate::history::{Effect, UndoStack};
use crate::optimistic::{Mutation, OptimisticTracker};
use crate::service::{Navigator, Notice, Notifier, ProductService};
use crate::url;

pub use cache::{QueryCache, QueryKey, DEFAULT_CACHE_TTL_MS};
pub use debounce::Debouncer;
pub use derive::{
    can_load_more, filtered_products, grouped_products, has_active_filters, visible_columns,
};
pub use state::{reduce, Pagination, ProductsAction, ProductsState};

use crate::history::KeyChord;

/// Controller-level failures (anything that is not the service or the
/// history reporting for itself).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("product {id} not found in the current view")]
    ProductNotFound { id: ProductId },
}

/// Whether a fetch replaces the collection or extends it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchMode {
    Replace,
    Append,
}

/// Reducer state machine plus mutation, fetch, and history coordination
/// for the paginated product collection.
pub struct ProductController {
    state: Rc<RefCell<ProductsState>>,
    tracker: OptimisticTracker,
    history: UndoStack,
    cache: QueryCache,
    debouncer: Debouncer,
    service: Rc<dyn ProductService>,
    notifier: Rc<dyn Notifier>,
    clock: Rc<dyn TimeSource>,
}

impl ProductController {
    pub fn new(
        service: Rc<dyn ProductService>,
        notifier: Rc<dyn Notifier>,
        clock: Rc<dyn TimeSource>,
        config: &StateConfig,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(ProductsState::new(config.page_size))),
            tracker: OptimisticTracker::new(config.optimistic_timeout_ms, config.failure_linger_ms),
            history: UndoStack::new(config.max_history),
            cache: QueryCache::new(config.cache_ttl_ms),
            debouncer: Debouncer::new(config.debounce_ms),
            service,
            notifier,
            clock,
        }
    }

    /// Read access to the raw reducer state.
    pub fn state(&self) -> Ref<'_, ProductsState> {
        self.state.borrow()
    }

    fn now(&self) -> WallClock {
        self.clock.now()
    }

    fn dispatch(&self, action: ProductsAction) {
        reduce(&mut self.state.borrow_mut(), action);
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// The collection with pending optimistic updates layered on top -
    /// what the list actually renders.
    pub fn visible_products(&self) -> Vec<Product> {
        let base = self.state.borrow().products.clone();
        self.tracker.overlay(base)
    }

    /// Renderable list: overlay applied, archived hidden, favorites first.
    pub fn filtered_products(&self) -> Vec<Product> {
        let state = self.state.borrow();
        let mut products: Vec<Product> = self
            .tracker
            .overlay(state.products.clone())
            .into_iter()
            .filter(|p| !state.archived.contains(&p.id))
            .collect();
        products.sort_by_key(|p| !state.favorites.contains(&p.id));
        products
    }

    pub fn grouped_products(&self) -> BTreeMap<String, Vec<Product>> {
        let products = self.filtered_products();
        derive::grouped_products(&self.state.borrow(), &products)
    }

    pub fn visible_columns(&self) -> Vec<TableColumn> {
        derive::visible_columns(&self.state.borrow())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn has_active_filters(&self) -> bool {
        derive::has_active_filters(&self.state.borrow())
    }

    pub fn can_load_more(&self) -> bool {
        derive::can_load_more(&self.state.borrow())
    }

    pub fn has_pending_mutations(&self) -> bool {
        self.tracker.has_pending()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // =========================================================================
    // Fetch path
    // =========================================================================

    fn query_key(&self, page: u32) -> String {
        let state = self.state.borrow();
        QueryKey {
            page,
            search: state.debounced_search_query.clone(),
            group_by: state.group_by,
            sort: state.sort.clone(),
            filters: state.filters.clone(),
        }
        .fingerprint()
    }

    fn list_options(&self, page: u32) -> crate::service::ListOptions {
        let state = self.state.borrow();
        let limit = state.pagination.items_per_page;
        crate::service::ListOptions {
            limit,
            offset: (page.saturating_sub(1) as usize) * limit,
            search: if state.debounced_search_query.is_empty() {
                None
            } else {
                Some(state.debounced_search_query.clone())
            },
            sort: Some(state.sort.clone()),
            filters: state.filters.clone(),
        }
    }

    /// Fetch the current page, read-through cached.
    pub fn fetch_products(&mut self) -> crate::Result<()> {
        let page = self.state.borrow().pagination.current_page;
        self.fetch_page(page, FetchMode::Replace)
    }

    fn fetch_page(&mut self, page: u32, mode: FetchMode) -> crate::Result<()> {
        let now = self.now();
        let key = self.query_key(page);

        if mode == FetchMode::Replace {
            if let Some(hit) = self.cache.get(&key, now) {
                let cached = hit.clone();
                self.dispatch(ProductsAction::SetProducts(cached.items));
                self.dispatch(ProductsAction::SetTotalItems(cached.total));
                return Ok(());
            }
        }

        let options = self.list_options(page);
        let fetched = self.service.list(&options)?;
        // The raw server page is what gets cached, never the overlay.
        self.cache.put(key, fetched.clone(), now);

        match mode {
            FetchMode::Replace => self.dispatch(ProductsAction::SetProducts(fetched.items)),
            FetchMode::Append => self.dispatch(ProductsAction::AppendProducts(fetched.items)),
        }
        self.dispatch(ProductsAction::SetTotalItems(fetched.total));
        Ok(())
    }

    /// Extend the collection with the next page (infinite scroll).
    ///
    /// `Ok(false)` when a load is already in flight or everything is
    /// materialized. The page number rolls back if the fetch fails.
    pub fn load_more(&mut self) -> crate::Result<bool> {
        {
            let state = self.state.borrow();
            if state.pagination.is_loading_more || !derive::can_load_more(&state) {
                return Ok(false);
            }
        }

        let next_page = self.state.borrow().pagination.current_page + 1;
        self.dispatch(ProductsAction::SetLoadingMore(true));
        self.dispatch(ProductsAction::SetPage(next_page));

        let outcome = self.fetch_page(next_page, FetchMode::Append);
        self.dispatch(ProductsAction::SetLoadingMore(false));

        match outcome {
            Ok(()) => Ok(true),
            Err(err) => {
                self.dispatch(ProductsAction::SetPage(next_page - 1));
                Err(err)
            }
        }
    }

    // =========================================================================
    // Search, filters, presentation
    // =========================================================================

    /// Record a keystroke. The raw value lands in state immediately; the
    /// query and cache key only see it once it settles (see `tick`).
    pub fn set_search_query(&mut self, query: &str) {
        let now = self.now();
        self.dispatch(ProductsAction::SetSearchQuery(query.to_string()));
        self.debouncer.input(query, now);
    }

    pub fn set_filters(&mut self, filters: ProductFilters) -> crate::Result<()> {
        self.dispatch(ProductsAction::SetFilters(filters));
        self.dispatch(ProductsAction::SetPage(1));
        self.fetch_products()
    }

    pub fn clear_filters(&mut self) -> crate::Result<()> {
        self.dispatch(ProductsAction::ClearFilters);
        self.dispatch(ProductsAction::SetPage(1));
        self.fetch_products()
    }

    pub fn set_sort(&mut self, sort: SortOption) -> crate::Result<()> {
        self.dispatch(ProductsAction::SetSort(sort));
        self.dispatch(ProductsAction::SetPage(1));
        self.fetch_products()
    }

    pub fn set_group_by(&mut self, group_by: GroupKey) -> crate::Result<()> {
        self.dispatch(ProductsAction::SetGroupBy(group_by));
        self.fetch_products()
    }

    /// Presentation only; no refetch.
    pub fn set_view(&mut self, view: ViewMode) {
        self.dispatch(ProductsAction::SetView(view));
    }

    pub fn toggle_column(&mut self, column_id: &str) {
        self.dispatch(ProductsAction::ToggleColumn(column_id.to_string()));
    }

    pub fn toggle_selected(&mut self, id: &ProductId) {
        self.dispatch(ProductsAction::ToggleSelected(id.clone()));
    }

    pub fn clear_selection(&mut self) {
        self.dispatch(ProductsAction::ClearSelection);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn create_product(&mut self, payload: NewProduct) -> crate::Result<Product> {
        self.create_internal(payload, false)
    }

    /// A create of the source product with `(Copy)` suffixed to the name
    /// and the id stripped.
    pub fn duplicate_product(&mut self, id: &ProductId) -> crate::Result<Product> {
        let source = self.require_product(id)?;
        self.create_internal(NewProduct::duplicating(&source), true)
    }

    fn create_internal(&mut self, payload: NewProduct, duplicate: bool) -> crate::Result<Product> {
        let now = self.now();
        let temp = Product::temp_from(&payload, now);

        let update_id = self.tracker.register(Mutation::Create { data: temp.clone() }, now);
        self.dispatch(ProductsAction::AddProduct(temp.clone()));

        match self.service.create(&payload) {
            Ok(created) => {
                self.dispatch(ProductsAction::ReplaceProduct {
                    id: temp.id.clone(),
                    product: created.clone(),
                });
                self.tracker
                    .resolve(update_id, true, now, self.notifier.as_ref());

                let (execute, undo) = self.create_effects(&created);
                if duplicate {
                    self.history
                        .record_duplicate(&created.name, execute, undo, now);
                } else {
                    self.history.record_create(&created.name, execute, undo, now);
                }

                info!(product = %created.id, name = %created.name, "product created");
                self.notifier.notify(Notice::success(
                    "Product created",
                    format!("\"{}\" was created.", created.name),
                ));
                Ok(created)
            }
            Err(err) => {
                self.dispatch(ProductsAction::RemoveProduct(temp.id.clone()));
                self.tracker
                    .resolve(update_id, false, now, self.notifier.as_ref());
                self.notifier
                    .notify(Notice::destructive("Create failed", err.to_string()));
                Err(err.into())
            }
        }
    }

    pub fn update_product(
        &mut self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> crate::Result<Product> {
        let now = self.now();
        let original = self.require_product(id)?;
        let optimistic = original.patched(&patch);

        let update_id = self.tracker.register(
            Mutation::Update {
                original: original.clone(),
                patch: patch.clone(),
            },
            now,
        );
        self.dispatch(ProductsAction::ReplaceProduct {
            id: id.clone(),
            product: optimistic,
        });

        match self.service.update(id, &patch) {
            Ok(updated) => {
                self.dispatch(ProductsAction::ReplaceProduct {
                    id: id.clone(),
                    product: updated.clone(),
                });
                self.tracker
                    .resolve(update_id, true, now, self.notifier.as_ref());

                let (execute, undo) = self.update_effects(&original, &patch);
                self.history.record_update(&updated.name, execute, undo, now);

                info!(product = %id, "product updated");
                self.notifier.notify(Notice::success(
                    "Product updated",
                    format!("\"{}\" was saved.", updated.name),
                ));
                Ok(updated)
            }
            Err(err) => {
                self.dispatch(ProductsAction::ReplaceProduct {
                    id: id.clone(),
                    product: original,
                });
                self.tracker
                    .resolve(update_id, false, now, self.notifier.as_ref());
                self.notifier
                    .notify(Notice::destructive("Update failed", err.to_string()));
                Err(err.into())
            }
        }
    }

    pub fn delete_product(&mut self, id: &ProductId) -> crate::Result<()> {
        let now = self.now();
        let original = self.require_product(id)?;

        let update_id = self.tracker.register(
            Mutation::Delete {
                original: original.clone(),
            },
            now,
        );
        self.dispatch(ProductsAction::RemoveProduct(id.clone()));

        match self.service.delete(id) {
            Ok(()) => {
                self.tracker
                    .resolve(update_id, true, now, self.notifier.as_ref());

                let (execute, undo) = self.delete_effects(&original);
                self.history.record_delete(&original.name, execute, undo, now);

                info!(product = %id, name = %original.name, "product deleted");
                self.notifier.notify(Notice::success(
                    "Product deleted",
                    format!("\"{}\" was deleted.", original.name),
                ));
                Ok(())
            }
            Err(err) => {
                // Re-insert the optimistically removed entity.
                self.dispatch(ProductsAction::AddProduct(original));
                self.tracker
                    .resolve(update_id, false, now, self.notifier.as_ref());
                self.notifier
                    .notify(Notice::destructive("Delete failed", err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Favorite is a client-local overlay; toggling is its own inverse, so
    /// the recorded effects just toggle again.
    pub fn toggle_favorite(&mut self, id: &ProductId) {
        let now = self.now();
        let name = self.display_name(id);
        self.dispatch(ProductsAction::ToggleFavorite(id.clone()));

        let execute = self.toggle_effect(id, ToggleSet::Favorites);
        let undo = self.toggle_effect(id, ToggleSet::Favorites);
        self.history.record_favorite(&name, execute, undo, now);
    }

    /// Archive is a client-local overlay, same shape as favorite.
    pub fn toggle_archived(&mut self, id: &ProductId) {
        let now = self.now();
        let name = self.display_name(id);
        self.dispatch(ProductsAction::ToggleArchived(id.clone()));

        let execute = self.toggle_effect(id, ToggleSet::Archived);
        let undo = self.toggle_effect(id, ToggleSet::Archived);
        self.history.record_archive(&name, execute, undo, now);
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn undo(&mut self) -> crate::Result<bool> {
        self.history
            .undo(self.notifier.as_ref())
            .map_err(Into::into)
    }

    pub fn redo(&mut self) -> crate::Result<bool> {
        self.history
            .redo(self.notifier.as_ref())
            .map_err(Into::into)
    }

    pub fn handle_shortcut(&mut self, chord: &KeyChord) -> crate::Result<bool> {
        self.history
            .handle_shortcut(chord, self.notifier.as_ref())
            .map_err(Into::into)
    }

    // =========================================================================
    // Timers and lifecycle
    // =========================================================================

    /// Drive the deadlines. The embedding event loop calls this on its own
    /// cadence; everything fires relative to the injected clock.
    pub fn tick(&mut self) -> crate::Result<()> {
        let now = self.now();

        if let Some(settled) = self.debouncer.poll(now) {
            self.dispatch(ProductsAction::SetDebouncedSearchQuery(settled));
            self.dispatch(ProductsAction::SetPage(1));
            self.fetch_page(1, FetchMode::Replace)?;
        }

        self.tracker.sweep(now, self.notifier.as_ref());
        self.cache.purge_expired(now);
        Ok(())
    }

    /// Back to pristine: state, cache, tracker, history, debounce.
    pub fn reset(&mut self) {
        self.dispatch(ProductsAction::Reset);
        self.cache.clear();
        self.tracker.clear();
        self.history.clear();
        self.debouncer.cancel();
    }

    // =========================================================================
    // URL synchronization
    // =========================================================================

    /// Mirror the sharable view state into the address bar
    /// (history-replace, so filter edits do not pollute back/forward).
    pub fn sync_url(&self, navigator: &dyn Navigator) {
        let patch = url::patch_from_state(&self.state.borrow());
        url::sync_to_url(&patch, navigator);
    }

    /// Adopt state parsed from the address bar (on load / navigation),
    /// then fetch under the adopted query.
    pub fn apply_url_state(&mut self, parsed: &url::UrlState) -> crate::Result<()> {
        if let Some(view) = parsed.view {
            self.dispatch(ProductsAction::SetView(view));
        }
        if let Some(group_by) = parsed.group_by {
            self.dispatch(ProductsAction::SetGroupBy(group_by));
        }
        if let Some(sort) = &parsed.sort {
            self.dispatch(ProductsAction::SetSort(sort.clone()));
        }
        if let Some(search) = &parsed.search {
            // A URL-borne search is already settled; it skips the debounce.
            self.dispatch(ProductsAction::SetSearchQuery(search.clone()));
            self.dispatch(ProductsAction::SetDebouncedSearchQuery(search.clone()));
        }
        if let Some(filters) = &parsed.filters {
            self.dispatch(ProductsAction::SetFilters(filters.clone()));
        }
        if let Some(page) = parsed.page {
            self.dispatch(ProductsAction::SetPage(page));
        }
        self.fetch_products()
    }

    // =========================================================================
    // Effect builders
    // =========================================================================

    fn require_product(&self, id: &ProductId) -> Result<Product, ControllerError> {
        self.state
            .borrow()
            .product(id)
            .cloned()
            .ok_or_else(|| ControllerError::ProductNotFound { id: id.clone() })
    }

    fn display_name(&self, id: &ProductId) -> String {
        self.state
            .borrow()
            .product(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Effects for a committed create. Redo re-creates server-side (the
    /// server may assign a fresh id, tracked in the shared cell); undo
    /// deletes whichever id is current.
    fn create_effects(&self, created: &Product) -> (Effect, Effect) {
        let current_id = Rc::new(RefCell::new(created.id.clone()));
        let payload = NewProduct::restoring(created);

        let execute = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            let current_id = Rc::clone(&current_id);
            Box::new(move || {
                let recreated = service.create(&payload)?;
                *current_id.borrow_mut() = recreated.id.clone();
                reduce(
                    &mut state.borrow_mut(),
                    ProductsAction::AddProduct(recreated),
                );
                Ok(())
            })
        };

        let undo = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            Box::new(move || {
                let id = current_id.borrow().clone();
                service.delete(&id)?;
                reduce(&mut state.borrow_mut(), ProductsAction::RemoveProduct(id));
                Ok(())
            })
        };

        (execute, undo)
    }

    /// Effects for a committed update. Redo re-applies the patch; undo
    /// pushes the full pre-update snapshot back to the server.
    fn update_effects(&self, original: &Product, patch: &ProductPatch) -> (Effect, Effect) {
        let execute = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            let id = original.id.clone();
            let patch = patch.clone();
            Box::new(move || {
                let updated = service.update(&id, &patch)?;
                reduce(
                    &mut state.borrow_mut(),
                    ProductsAction::ReplaceProduct {
                        id: id.clone(),
                        product: updated,
                    },
                );
                Ok(())
            })
        };

        let undo = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            let id = original.id.clone();
            let restore = ProductPatch::replacing(original);
            Box::new(move || {
                let restored = service.update(&id, &restore)?;
                reduce(
                    &mut state.borrow_mut(),
                    ProductsAction::ReplaceProduct {
                        id: id.clone(),
                        product: restored,
                    },
                );
                Ok(())
            })
        };

        (execute, undo)
    }

    /// Effects for a committed delete. Undo re-creates from the snapshot
    /// (adopting the server's id for any later redo); redo deletes again.
    fn delete_effects(&self, original: &Product) -> (Effect, Effect) {
        let current_id = Rc::new(RefCell::new(original.id.clone()));
        let payload = NewProduct::restoring(original);

        let execute = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            let current_id = Rc::clone(&current_id);
            Box::new(move || {
                let id = current_id.borrow().clone();
                service.delete(&id)?;
                reduce(&mut state.borrow_mut(), ProductsAction::RemoveProduct(id));
                Ok(())
            })
        };

        let undo = {
            let state = Rc::clone(&self.state);
            let service = Rc::clone(&self.service);
            Box::new(move || {
                let restored = service.create(&payload)?;
                *current_id.borrow_mut() = restored.id.clone();
                reduce(
                    &mut state.borrow_mut(),
                    ProductsAction::AddProduct(restored),
                );
                Ok(())
            })
        };

        (execute, undo)
    }

    fn toggle_effect(&self, id: &ProductId, set: ToggleSet) -> Effect {
        let state = Rc::clone(&self.state);
        let id = id.clone();
        Box::new(move || {
            let action = match set {
                ToggleSet::Favorites => ProductsAction::ToggleFavorite(id.clone()),
                ToggleSet::Archived => ProductsAction::ToggleArchived(id.clone()),
            };
            reduce(&mut state.borrow_mut(), action);
            Ok(())
        })
    }
}

#[derive(Clone, Copy)]
enum ToggleSet {
    Favorites,
    Archived,
}
