//! Async runner for a [`ListController`] over remote endpoints.
//!
//! The controller lock is held only to issue or settle work, never across
//! an endpoint call, so a superseding reset can land while a fetch is out.
//! The credential is read at each call; hosts push session changes through
//! [`PagedList::sync_session`].

use std::fmt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::controller::{FetchOutcome, ListController, ListStatus, PageRequest};
use super::optimistic::{ToggleOutcome, Toggleable};
use super::query::{ListQuery, ListResource};
use super::{ListItem, ToggleField};
use crate::endpoint::{Action, ListingEndpoint, MutationEndpoint};
use crate::error::{NetworkResult, ToggleError};
use crate::notify::{Notifier, ToastMessage};
use crate::session::{BearerToken, Session};

pub struct PagedList<T: ListItem, L, M, N> {
    resource: ListResource,
    credential: RwLock<Option<BearerToken>>,
    listing: L,
    mutations: M,
    notifier: N,
    state: Mutex<ListController<T>>,
}

impl<T, L, M, N> PagedList<T, L, M, N>
where
    T: ListItem + Clone + Send,
    T::Id: fmt::Display + Send,
    L: ListingEndpoint<T>,
    M: MutationEndpoint,
    N: Notifier,
{
    /// Builds the list and hands back its first fetch, to be passed to
    /// [`Self::run`].
    pub fn new(
        resource: ListResource,
        query: ListQuery,
        session: &Session,
        listing: L,
        mutations: M,
        notifier: N,
    ) -> (Self, PageRequest) {
        let (controller, first) = ListController::mount(query);
        let list = Self {
            resource,
            credential: RwLock::new(session.bearer().cloned()),
            listing,
            mutations,
            notifier,
            state: Mutex::new(controller),
        };
        (list, first)
    }

    /// Builds the list and waits for its first page.
    pub async fn mount(
        resource: ListResource,
        query: ListQuery,
        session: &Session,
        listing: L,
        mutations: M,
        notifier: N,
    ) -> Self {
        let (list, first) = Self::new(resource, query, session, listing, mutations, notifier);
        list.run(first).await;
        list
    }

    /// Adopts the session's current credential for every later call.
    pub async fn sync_session(&self, session: &Session) {
        *self.credential.write().await = session.bearer().cloned();
    }

    async fn credential(&self) -> Option<BearerToken> {
        self.credential.read().await.clone()
    }

    /// Performs an issued fetch and applies the result if still current.
    pub async fn run(&self, request: PageRequest) -> FetchOutcome {
        let credential = self.credential().await;
        let result = self
            .listing
            .fetch_page(
                credential.as_ref(),
                &request.query,
                request.page,
                request.page_size,
            )
            .await;

        let outcome = self.state.lock().await.complete(request.tag, result);
        match &outcome {
            FetchOutcome::Failed(_) => {
                self.notifier
                    .notify(ToastMessage::error(self.resource.load_failed_message()));
            }
            FetchOutcome::Stale => debug!(page = %request.page, "dropped stale page"),
            FetchOutcome::Applied { .. } => {}
        }
        outcome
    }

    pub async fn initialize(&self, query: ListQuery) -> FetchOutcome {
        let request = self.state.lock().await.initialize(query);
        self.run(request).await
    }

    pub async fn reset_with_query(&self, query: ListQuery) -> FetchOutcome {
        let request = self.state.lock().await.reset_with_query(query);
        self.run(request).await
    }

    pub async fn refresh(&self) -> FetchOutcome {
        let request = self.state.lock().await.refresh();
        self.run(request).await
    }

    /// `None` when the list is busy, exhausted, or disposed.
    pub async fn load_more(&self) -> Option<FetchOutcome> {
        let request = self.state.lock().await.load_more()?;
        Some(self.run(request).await)
    }

    /// Deletes an item remotely and drops it locally once the server agrees.
    pub async fn delete(&self, id: &T::Id) -> NetworkResult<usize> {
        let item_id = id.to_string();
        let credential = self.credential().await;
        match self
            .mutations
            .apply_action(credential.as_ref(), &item_id, Action::Delete)
            .await
        {
            Ok(()) => {
                let removed = self.state.lock().await.remove_item(id);
                info!(%item_id, removed, "item deleted");
                self.notifier.notify(ToastMessage::success("Tweet deleted"));
                Ok(removed)
            }
            Err(e) => {
                self.notifier
                    .notify(ToastMessage::error("Failed to delete tweet"));
                Err(e)
            }
        }
    }

    pub async fn dispose(&self) {
        self.state.lock().await.dispose();
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.items().to_vec()
    }

    pub async fn status(&self) -> ListStatus {
        self.state.lock().await.status()
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.has_more()
    }

    pub fn resource(&self) -> ListResource {
        self.resource
    }
}

impl<T, L, M, N> PagedList<T, L, M, N>
where
    T: Toggleable + Clone + Send,
    T::Id: fmt::Display + Send + Sync,
    L: ListingEndpoint<T>,
    M: MutationEndpoint,
    N: Notifier,
{
    /// Applies the toggle immediately, then confirms or rolls it back.
    /// Every failure produces exactly one error toast.
    pub async fn toggle(
        &self,
        id: &T::Id,
        field: ToggleField,
    ) -> Result<Option<ToggleOutcome>, ToggleError> {
        let ticket = self.state.lock().await.begin_toggle(id, field)?;

        let item_id = ticket.item_id.to_string();
        let credential = self.credential().await;
        let result = self
            .mutations
            .apply_action(credential.as_ref(), &item_id, ticket.action)
            .await;

        if result.is_err() {
            self.notifier
                .notify(ToastMessage::error(field.failure_message(ticket.target)));
        }
        Ok(self.state.lock().await.settle_toggle(&ticket, result))
    }
}
