use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::items::ItemSet;
use super::optimistic::{ToggleOutcome, ToggleTicket, Toggleable};
use super::query::ListQuery;
use super::{ListItem, ToggleField};
use crate::error::{NetworkError, ToggleError};

/// Items per page, shared with the server contract.
pub const PAGE_SIZE: usize = 10;

/// 1-based page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(u32);

impl Page {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    /// Initial or reset fetch in flight.
    #[default]
    Loading,
    Idle,
    /// A subsequent page is in flight.
    LoadingMore,
    /// The most recent fetch failed.
    Errored,
}

impl ListStatus {
    #[must_use]
    pub const fn is_fetching(self) -> bool {
        matches!(self, Self::Loading | Self::LoadingMore)
    }
}

/// Identity of an issued fetch. A result is applied only while its tag is
/// the controller's single in-flight tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTag {
    pub generation: u64,
    pub page: Page,
}

/// A fetch the caller must perform and report back through `complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub tag: FetchTag,
    pub query: ListQuery,
    pub page: Page,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { received: usize },
    /// The fetch failed; the caller reports it to the user.
    Failed(NetworkError),
    /// Superseded or torn down; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailedFetch {
    Initial,
    More,
}

/// Page-oriented accumulation of `T` for one query, with optimistic
/// per-item toggles. Sans-IO: callers perform the requests it hands out.
#[derive(Debug, Clone)]
pub struct ListController<T: ListItem> {
    query: ListQuery,
    entries: ItemSet<T>,
    page: Page,
    has_more: bool,
    status: ListStatus,
    generation: u64,
    in_flight: Option<FetchTag>,
    last_failure: Option<FailedFetch>,
    disposed: bool,
}

impl<T: ListItem> ListController<T> {
    /// Creates a controller for `query` and returns its first fetch.
    #[must_use]
    pub fn mount(query: ListQuery) -> (Self, PageRequest) {
        let mut controller = Self {
            query: query.clone(),
            entries: ItemSet::new(),
            page: Page::FIRST,
            has_more: true,
            status: ListStatus::Loading,
            generation: 0,
            in_flight: None,
            last_failure: None,
            disposed: false,
        };
        let request = controller.initialize(query);
        (controller, request)
    }

    /// Discards everything and starts over at page 1 under `query`.
    pub fn initialize(&mut self, query: ListQuery) -> PageRequest {
        self.generation += 1;
        self.query = query;
        self.entries.clear();
        self.page = Page::FIRST;
        self.has_more = true;
        self.status = ListStatus::Loading;
        self.last_failure = None;
        self.disposed = false;

        debug!(generation = self.generation, query = ?self.query, "list initialized");
        self.issue(Page::FIRST)
    }

    /// Same as `initialize`; any fetch for the previous query becomes stale.
    pub fn reset_with_query(&mut self, query: ListQuery) -> PageRequest {
        self.initialize(query)
    }

    /// Re-runs the current query from page 1.
    pub fn refresh(&mut self) -> PageRequest {
        let query = self.query.clone();
        self.initialize(query)
    }

    /// Next page, or `None` when a fetch is in flight, the list is
    /// exhausted, or the first page never loaded.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.disposed || !self.has_more {
            return None;
        }
        let retrying_more = self.status == ListStatus::Errored
            && self.last_failure == Some(FailedFetch::More);
        if self.status != ListStatus::Idle && !retrying_more {
            return None;
        }

        self.status = ListStatus::LoadingMore;
        self.page = self.page.next();
        Some(self.issue(self.page))
    }

    /// Applies the result of a fetch previously handed out.
    pub fn complete(&mut self, tag: FetchTag, result: Result<Vec<T>, NetworkError>) -> FetchOutcome {
        if self.disposed || self.in_flight != Some(tag) {
            debug!(
                generation = tag.generation,
                page = %tag.page,
                current = self.generation,
                "discarding stale page"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        let incremental = tag.page != Page::FIRST;
        match result {
            Ok(batch) => {
                let received = batch.len();
                self.has_more = received == PAGE_SIZE;
                if incremental {
                    self.entries.extend(batch);
                } else {
                    self.entries.replace(batch);
                }
                self.status = ListStatus::Idle;
                self.last_failure = None;

                debug!(page = %tag.page, received, has_more = self.has_more, "page applied");
                FetchOutcome::Applied { received }
            }
            Err(error) => {
                if incremental {
                    self.page = Page(tag.page.get() - 1);
                    self.last_failure = Some(FailedFetch::More);
                } else {
                    self.last_failure = Some(FailedFetch::Initial);
                }
                self.status = ListStatus::Errored;

                warn!(page = %tag.page, error = %error, "page fetch failed");
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Removes every occurrence of `id`; call only after the server confirmed
    /// the delete.
    pub fn remove_item(&mut self, id: &T::Id) -> usize {
        self.entries.remove_item(id)
    }

    /// Teardown: no later result may touch the state.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.generation += 1;
        self.in_flight = None;
        self.entries.drop_pending();
    }

    fn issue(&mut self, page: Page) -> PageRequest {
        let tag = FetchTag {
            generation: self.generation,
            page,
        };
        self.in_flight = Some(tag);
        PageRequest {
            tag,
            query: self.query.clone(),
            page,
            page_size: PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        self.entries.items()
    }

    #[must_use]
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.entries.find(id)
    }

    #[must_use]
    pub fn status(&self) -> ListStatus {
        self.status
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    /// Tag of the one fetch whose result would currently be applied.
    #[must_use]
    pub fn in_flight(&self) -> Option<FetchTag> {
        self.in_flight
    }

    #[must_use]
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The "nothing found" condition: a settled fetch with no items.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        self.status == ListStatus::Idle && self.entries.is_empty()
    }

    #[must_use]
    pub fn pending_toggles(&self) -> usize {
        self.entries.pending_toggles()
    }
}

impl<T: Toggleable> ListController<T> {
    /// Flips `field` on the item locally and returns the ticket for the
    /// network call.
    pub fn begin_toggle(
        &mut self,
        id: &T::Id,
        field: ToggleField,
    ) -> Result<ToggleTicket<T::Id>, ToggleError> {
        if self.disposed {
            return Err(ToggleError::Disposed);
        }
        self.entries.begin_toggle(id, field)
    }

    /// Commits or rolls back a toggle. `None` means the list no longer
    /// tracks it (reset, removed, or disposed) and nothing changed.
    pub fn settle_toggle(
        &mut self,
        ticket: &ToggleTicket<T::Id>,
        result: Result<(), NetworkError>,
    ) -> Option<ToggleOutcome> {
        if self.disposed {
            return None;
        }
        self.entries.settle_toggle(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ToggleState;
    use assert_matches::assert_matches;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        liked: bool,
        likes: u64,
    }

    impl ListItem for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    impl Toggleable for Row {
        fn toggle_state(&self, field: ToggleField) -> Option<ToggleState> {
            (field == ToggleField::Like).then_some(ToggleState::new(self.liked, self.likes))
        }

        fn set_toggle_state(&mut self, _field: ToggleField, state: ToggleState) {
            self.liked = state.active;
            self.likes = state.count;
        }
    }

    fn rows(range: std::ops::Range<u32>) -> Vec<Row> {
        range
            .map(|id| Row {
                id,
                liked: false,
                likes: 5,
            })
            .collect()
    }

    #[test]
    fn test_mount_starts_loading_page_one() {
        let (list, request) = ListController::<Row>::mount(ListQuery::author("alice"));
        assert_eq!(list.status(), ListStatus::Loading);
        assert_eq!(request.page, Page::FIRST);
        assert_eq!(request.page_size, PAGE_SIZE);
        assert_eq!(request.query, ListQuery::author("alice"));
        assert!(list.items().is_empty());
        assert!(list.has_more());
    }

    #[test]
    fn test_full_page_then_short_page() {
        let (mut list, first) = ListController::mount(ListQuery::author("alice"));
        assert_eq!(list.complete(first.tag, Ok(rows(0..10))), FetchOutcome::Applied { received: 10 });
        assert!(list.has_more());
        assert_eq!(list.status(), ListStatus::Idle);

        let second = list.load_more().unwrap();
        assert_eq!(second.page.get(), 2);
        assert_eq!(list.status(), ListStatus::LoadingMore);
        list.complete(second.tag, Ok(rows(10..14)));

        assert_eq!(list.items().len(), 14);
        assert!(!list.has_more());
        assert!(list.load_more().is_none());
    }

    #[test]
    fn test_load_more_rejected_while_fetching() {
        let (mut list, _first) = ListController::<Row>::mount(ListQuery::timeline());
        assert!(list.load_more().is_none());
        assert_eq!(list.page(), Page::FIRST);
    }

    #[test]
    fn test_initial_failure_keeps_empty_and_blocks_load_more() {
        let (mut list, first) = ListController::<Row>::mount(ListQuery::timeline());
        let outcome = list.complete(first.tag, Err(NetworkError::transport("offline")));
        assert_matches!(outcome, FetchOutcome::Failed(_));
        assert_eq!(list.status(), ListStatus::Errored);
        assert!(list.items().is_empty());
        assert!(list.load_more().is_none());
        assert!(!list.is_empty_result());

        let retry = list.refresh();
        assert_eq!(list.status(), ListStatus::Loading);
        assert_eq!(retry.page, Page::FIRST);
    }

    #[test]
    fn test_failed_load_more_rolls_back_page() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..10)));

        let second = list.load_more().unwrap();
        list.complete(second.tag, Err(NetworkError::Status { code: 502 }));
        assert_eq!(list.page(), Page::FIRST);
        assert_eq!(list.items().len(), 10);
        assert_eq!(list.status(), ListStatus::Errored);

        let retry = list.load_more().unwrap();
        assert_eq!(retry.page.get(), 2);
        list.complete(retry.tag, Ok(rows(10..20)));
        assert_eq!(list.items().len(), 20);
        assert_eq!(list.page().get(), 2);
    }

    #[test]
    fn test_reset_discards_late_response() {
        let (mut list, old) = ListController::mount(ListQuery::search("dogs"));
        let new = list.reset_with_query(ListQuery::search("cats"));

        assert_eq!(list.complete(new.tag, Ok(rows(100..103))), FetchOutcome::Applied { received: 3 });
        assert_eq!(list.complete(old.tag, Ok(rows(0..10))), FetchOutcome::Stale);

        let ids: Vec<u32> = list.items().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert!(!list.has_more());
    }

    #[test]
    fn test_duplicate_completion_is_stale() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..2)));
        assert_eq!(list.complete(first.tag, Ok(rows(0..2))), FetchOutcome::Stale);
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_dispose_ignores_everything() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.dispose();
        assert_eq!(list.complete(first.tag, Ok(rows(0..10))), FetchOutcome::Stale);
        assert!(list.items().is_empty());
        assert!(list.load_more().is_none());
        assert_eq!(list.begin_toggle(&0, ToggleField::Like), Err(ToggleError::Disposed));
    }

    #[test]
    fn test_empty_first_page() {
        let (mut list, first) = ListController::<Row>::mount(ListQuery::search("cats"));
        list.complete(first.tag, Ok(Vec::new()));
        assert!(list.is_empty_result());
        assert_eq!(list.status(), ListStatus::Idle);
        assert!(!list.has_more());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..10)));
        let second = list.load_more().unwrap();
        list.complete(second.tag, Ok(rows(9..11)));
        assert_eq!(list.items().iter().filter(|r| r.id == 9).count(), 2);
    }

    #[test]
    fn test_toggle_success_and_failure() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..3)));

        let ticket = list.begin_toggle(&1, ToggleField::Like).unwrap();
        assert_eq!(ticket.action, crate::endpoint::Action::Like);
        assert_eq!(list.find(&1).map(|r| (r.liked, r.likes)), Some((true, 6)));

        let outcome = list.settle_toggle(&ticket, Err(NetworkError::transport("offline")));
        assert_matches!(outcome, Some(ToggleOutcome::RolledBack { .. }));
        assert_eq!(list.find(&1).map(|r| (r.liked, r.likes)), Some((false, 5)));
        assert_eq!(list.status(), ListStatus::Idle);

        let ticket = list.begin_toggle(&1, ToggleField::Like).unwrap();
        assert_eq!(list.settle_toggle(&ticket, Ok(())), Some(ToggleOutcome::Applied));
        assert_eq!(list.find(&1).map(|r| (r.liked, r.likes)), Some((true, 6)));
        assert_eq!(list.pending_toggles(), 0);
    }

    #[test]
    fn test_toggle_errors() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..1)));
        assert_matches!(list.begin_toggle(&42, ToggleField::Like), Err(ToggleError::ItemNotFound(_)));
        assert_matches!(
            list.begin_toggle(&0, ToggleField::Follow),
            Err(ToggleError::Unsupported { field: "follow", .. })
        );
    }

    #[test]
    fn test_toggle_settled_after_reset_is_untracked() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        list.complete(first.tag, Ok(rows(0..1)));
        let ticket = list.begin_toggle(&0, ToggleField::Like).unwrap();

        let next = list.refresh();
        list.complete(next.tag, Ok(rows(0..1)));
        assert_eq!(list.settle_toggle(&ticket, Err(NetworkError::transport("x"))), None);
        assert_eq!(list.find(&0).map(|r| r.likes), Some(5));
    }

    #[test]
    fn test_remove_item_removes_all_occurrences() {
        let (mut list, first) = ListController::mount(ListQuery::timeline());
        let mut batch = rows(0..3);
        batch.push(Row { id: 1, liked: false, likes: 5 });
        list.complete(first.tag, Ok(batch));
        list.begin_toggle(&1, ToggleField::Like).unwrap();

        assert_eq!(list.remove_item(&1), 2);
        assert_eq!(list.items().len(), 2);
        assert_eq!(list.pending_toggles(), 0);
        assert_eq!(list.remove_item(&1), 0);
    }
}
