//! URL synchronization for sharable list state.
//!
//! The sharable subset of `ProductsState` (view, grouping, sort, search,
//! filters, page) is mirrored into the query string so a pasted link
//! reconstructs the same view. Sync always uses history-replace so tweaking
//! a filter does not pollute back/forward, and parsing is strict: unknown
//! keys and malformed values are dropped silently rather than surfaced as
//! errors.

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::debug;

use crate::controller::ProductsState;
use crate::core::{GroupKey, ProductFilters, SortDirection, SortField, SortOption, ViewMode};
use crate::service::Navigator;

const PARAM_VIEW: &str = "view";
const PARAM_GROUP_BY: &str = "groupBy";
const PARAM_SORT: &str = "sort";
const PARAM_SEARCH: &str = "search";
const PARAM_FILTERS: &str = "filters";
const PARAM_PAGE: &str = "page";

/// State recovered from the query string. Every field is optional; absence
/// means "leave the default alone".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UrlState {
    pub view: Option<ViewMode>,
    pub group_by: Option<GroupKey>,
    pub sort: Option<SortOption>,
    pub search: Option<String>,
    pub filters: Option<ProductFilters>,
    pub page: Option<u32>,
}

/// A set of query-string edits. `Some` writes the parameter, `None` deletes
/// it; parameters the patch does not mention are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UrlPatch {
    entries: BTreeMap<String, Option<String>>,
}

impl UrlPatch {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), Some(value.into()));
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.insert(key.to_string(), None);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the recognized parameters out of a query string (with or without
/// the leading `?`). Anything unrecognized or malformed is ignored.
pub fn parse_url_state(query: &str) -> UrlState {
    let mut parsed = UrlState::default();

    for (key, value) in query_pairs(query) {
        match key.as_ref() {
            PARAM_VIEW => parsed.view = ViewMode::parse(&value),
            PARAM_GROUP_BY => parsed.group_by = GroupKey::parse(&value),
            PARAM_SORT => parsed.sort = parse_sort(&value),
            PARAM_SEARCH => {
                if !value.is_empty() {
                    parsed.search = Some(value.into_owned());
                }
            }
            PARAM_FILTERS => parsed.filters = parse_filters_from_url(&value),
            PARAM_PAGE => {
                // Pages are 1-based; zero and garbage are both rejected.
                parsed.page = value.parse::<u32>().ok().filter(|p| *p >= 1);
            }
            _ => {}
        }
    }

    parsed
}

/// `field.direction`, e.g. `price.asc`. Both halves must parse.
fn parse_sort(raw: &str) -> Option<SortOption> {
    let (field, direction) = raw.split_once('.')?;
    let field = SortField::parse(field)?;
    let direction = SortDirection::parse(direction)?;
    Some(SortOption {
        field,
        direction,
        label: sort_label(field, direction).to_string(),
    })
}

fn sort_label(field: SortField, direction: SortDirection) -> &'static str {
    match (field, direction) {
        (SortField::Name, SortDirection::Ascending) => "Name A-Z",
        (SortField::Name, SortDirection::Descending) => "Name Z-A",
        (SortField::Price, SortDirection::Ascending) => "Price low to high",
        (SortField::Price, SortDirection::Descending) => "Price high to low",
        (SortField::Quantity, SortDirection::Ascending) => "Quantity low to high",
        (SortField::Quantity, SortDirection::Descending) => "Quantity high to low",
        (SortField::Priority, SortDirection::Ascending) => "Priority low to high",
        (SortField::Priority, SortDirection::Descending) => "Priority high to low",
        (SortField::CreatedAt, SortDirection::Ascending) => "Oldest first",
        (SortField::CreatedAt, SortDirection::Descending) => "Newest first",
        (SortField::UpdatedAt, SortDirection::Ascending) => "Least recently updated",
        (SortField::UpdatedAt, SortDirection::Descending) => "Recently updated",
    }
}

/// Deserialize the filters parameter from its JSON encoding. A malformed
/// payload is dropped, not an error (a corrupted or outdated link degrades
/// to "no filter"); a payload that decodes to an empty filter set is
/// treated as absent.
pub fn parse_filters_from_url(raw: &str) -> Option<ProductFilters> {
    match serde_json::from_str::<ProductFilters>(raw) {
        Ok(filters) if filters.is_empty() => None,
        Ok(filters) => Some(filters),
        Err(err) => {
            debug!(%err, "discarding malformed filters parameter");
            None
        }
    }
}

/// JSON encoding of the filters for the query string. Empty dimensions are
/// skipped entirely; a fully empty filter set serializes to nothing.
pub fn serialize_filters_for_url(filters: &ProductFilters) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    serde_json::to_string(filters).ok()
}

fn query_pairs(query: &str) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                urlencoding::decode(key).unwrap_or(Cow::Borrowed(key)),
                urlencoding::decode(value).unwrap_or(Cow::Borrowed(value)),
            )
        })
        .collect()
}

// =============================================================================
// Serialization
// =============================================================================

/// The full query-string patch for the given state. Parameters at their
/// default value are deleted so the URL stays minimal.
pub fn patch_from_state(state: &ProductsState) -> UrlPatch {
    let mut patch = UrlPatch::default();

    if state.selected_view == ViewMode::default() {
        patch.delete(PARAM_VIEW);
    } else {
        patch.set(PARAM_VIEW, state.selected_view.as_str());
    }

    if state.group_by == GroupKey::None {
        patch.delete(PARAM_GROUP_BY);
    } else {
        patch.set(PARAM_GROUP_BY, state.group_by.as_str());
    }

    let default_sort = SortOption::default();
    if state.sort.field == default_sort.field && state.sort.direction == default_sort.direction {
        patch.delete(PARAM_SORT);
    } else {
        patch.set(
            PARAM_SORT,
            format!("{}.{}", state.sort.field.as_str(), state.sort.direction.as_str()),
        );
    }

    if state.search_query.is_empty() {
        patch.delete(PARAM_SEARCH);
    } else {
        patch.set(PARAM_SEARCH, state.search_query.clone());
    }

    match serialize_filters_for_url(&state.filters) {
        Some(json) => patch.set(PARAM_FILTERS, json),
        None => patch.delete(PARAM_FILTERS),
    }

    if state.pagination.current_page <= 1 {
        patch.delete(PARAM_PAGE);
    } else {
        patch.set(PARAM_PAGE, state.pagination.current_page.to_string());
    }

    patch
}

/// Merge a patch into the navigator's current query string and navigate
/// with history-replace. Parameters outside the patch survive untouched;
/// when nothing changes, no navigation happens at all.
pub fn sync_to_url(patch: &UrlPatch, navigator: &dyn Navigator) {
    let location = navigator.current_location();

    let mut params: BTreeMap<String, String> = query_pairs(&location.search)
        .into_iter()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in &patch.entries {
        match value {
            Some(value) => {
                params.insert(key.clone(), value.clone());
            }
            None => {
                params.remove(key);
            }
        }
    }

    let next_search = encode_query(&params);
    if next_search == location.search {
        return;
    }

    let url = if next_search.is_empty() {
        location.pathname.clone()
    } else {
        format!("{}?{}", location.pathname, next_search)
    };
    debug!(%url, "syncing list state to url");
    navigator.navigate(&url, true);
}

fn encode_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{reduce, ProductsAction};
    use crate::service::Location;
    use std::cell::RefCell;

    struct MemoryNavigator {
        location: RefCell<Location>,
        navigations: RefCell<Vec<(String, bool)>>,
    }

    impl MemoryNavigator {
        fn at(search: &str) -> Self {
            Self {
                location: RefCell::new(Location {
                    pathname: "/products".into(),
                    search: search.into(),
                }),
                navigations: RefCell::new(Vec::new()),
            }
        }
    }

    impl Navigator for MemoryNavigator {
        fn current_location(&self) -> Location {
            self.location.borrow().clone()
        }

        fn navigate(&self, url: &str, replace: bool) {
            self.navigations.borrow_mut().push((url.into(), replace));
            let (pathname, search) = url.split_once('?').unwrap_or((url, ""));
            *self.location.borrow_mut() = Location {
                pathname: pathname.into(),
                search: search.into(),
            };
        }
    }

    #[test]
    fn parse_recognizes_the_whitelisted_params() {
        let parsed = parse_url_state("?view=gallery&groupBy=vendor&sort=price.asc&page=3");
        assert_eq!(parsed.view, Some(ViewMode::Gallery));
        assert_eq!(parsed.group_by, Some(GroupKey::Vendor));
        assert_eq!(parsed.page, Some(3));

        let sort = parsed.sort.unwrap();
        assert_eq!(sort.field, SortField::Price);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn malformed_values_are_dropped_not_errors() {
        let parsed = parse_url_state("view=kanban&sort=price&page=0&filters=not-json&bogus=1");
        assert_eq!(parsed, UrlState::default());
    }

    #[test]
    fn search_param_is_percent_decoded() {
        let parsed = parse_url_state("search=blue%20widget");
        assert_eq!(parsed.search.as_deref(), Some("blue widget"));
    }

    #[test]
    fn filters_round_trip_through_the_query_string() {
        let filters = ProductFilters {
            stages: vec!["live".into()],
            tags: vec!["sale".into(), "new".into()],
            ..ProductFilters::default()
        };
        let json = serialize_filters_for_url(&filters).unwrap();
        let encoded = urlencoding::encode(&json).into_owned();

        let parsed = parse_url_state(&format!("filters={encoded}"));
        assert_eq!(parsed.filters, Some(filters));
    }

    #[test]
    fn filter_serialization_accepts_its_own_output() {
        let filters = ProductFilters {
            vendors: vec!["Acme".into()],
            priorities: vec![crate::core::Priority::High],
            price: Some(crate::core::NumericRange {
                min: Some(1.0),
                max: None,
            }),
            created: Some(crate::core::DateRange {
                after: Some(5_000),
                before: None,
            }),
            ..ProductFilters::default()
        };

        let json = serialize_filters_for_url(&filters).unwrap();
        // Empty dimensions are dropped from the encoding entirely.
        assert!(!json.contains("stages"));
        assert_eq!(parse_filters_from_url(&json), Some(filters));

        // An empty set serializes to nothing at all.
        assert_eq!(serialize_filters_for_url(&ProductFilters::default()), None);
    }

    #[test]
    fn state_round_trips_through_the_url() {
        let mut state = ProductsState::new(25);
        reduce(&mut state, ProductsAction::SetView(ViewMode::Gallery));
        reduce(&mut state, ProductsAction::SetGroupBy(GroupKey::Category));
        reduce(
            &mut state,
            ProductsAction::SetSort(SortOption {
                field: SortField::Name,
                direction: SortDirection::Ascending,
                label: "Name A-Z".into(),
            }),
        );
        reduce(
            &mut state,
            ProductsAction::SetSearchQuery("blue widget".into()),
        );
        reduce(
            &mut state,
            ProductsAction::SetFilters(ProductFilters {
                vendors: vec!["Acme".into()],
                ..ProductFilters::default()
            }),
        );
        reduce(&mut state, ProductsAction::SetTotalItems(100));
        reduce(&mut state, ProductsAction::SetPage(2));

        let navigator = MemoryNavigator::at("");
        sync_to_url(&patch_from_state(&state), &navigator);

        let parsed = parse_url_state(&navigator.current_location().search);
        assert_eq!(parsed.view, Some(ViewMode::Gallery));
        assert_eq!(parsed.group_by, Some(GroupKey::Category));
        assert_eq!(parsed.search.as_deref(), Some("blue widget"));
        assert_eq!(parsed.page, Some(2));
        assert_eq!(parsed.filters, Some(state.filters.clone()));

        let sort = parsed.sort.unwrap();
        assert_eq!(sort.field, SortField::Name);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn defaults_are_deleted_from_the_url() {
        let navigator = MemoryNavigator::at("view=gallery&page=4&search=old");
        let state = ProductsState::new(25);

        sync_to_url(&patch_from_state(&state), &navigator);
        assert_eq!(navigator.current_location().search, "");
    }

    #[test]
    fn unrelated_params_survive_a_sync() {
        let navigator = MemoryNavigator::at("utm_source=mail");
        let mut state = ProductsState::new(25);
        reduce(&mut state, ProductsAction::SetView(ViewMode::Gallery));

        sync_to_url(&patch_from_state(&state), &navigator);
        let search = navigator.current_location().search;
        assert!(search.contains("utm_source=mail"));
        assert!(search.contains("view=gallery"));
    }

    #[test]
    fn sync_uses_replace_and_skips_noop_navigations() {
        let navigator = MemoryNavigator::at("");
        let mut state = ProductsState::new(25);
        reduce(&mut state, ProductsAction::SetView(ViewMode::Gallery));

        sync_to_url(&patch_from_state(&state), &navigator);
        sync_to_url(&patch_from_state(&state), &navigator);

        let navigations = navigator.navigations.borrow();
        assert_eq!(navigations.len(), 1);
        assert!(navigations[0].1, "navigation must be history-replace");
    }
}
