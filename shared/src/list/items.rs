//! A flat collection of items with optimistic toggles and no pagination.
//!
//! Lists keep their accumulated pages in one of these. Single-item screens
//! (a tweet's detail page, a profile header) and short fixed panels use it
//! directly, so every surface rolls back the same way.

use tracing::{debug, warn};

use super::optimistic::{ToggleLedger, ToggleOutcome, ToggleState, ToggleTicket, Toggleable};
use super::{ListItem, ToggleField};
use crate::error::{NetworkError, ToggleError};

#[derive(Debug, Clone)]
pub struct ItemSet<T: ListItem> {
    items: Vec<T>,
    toggles: ToggleLedger<T::Id>,
}

impl<T: ListItem> Default for ItemSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            toggles: ToggleLedger::default(),
        }
    }
}

impl<T: ListItem> ItemSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in fresh server data. Toggles still out for the old data
    /// settle as untracked.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.toggles.clear();
    }

    pub(crate) fn extend(&mut self, batch: Vec<T>) {
        self.items.extend(batch);
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Forgets pending toggles but keeps the items as they are shown.
    pub(crate) fn drop_pending(&mut self) {
        self.toggles.clear();
    }

    /// Removes every occurrence of `id`.
    pub fn remove_item(&mut self, id: &T::Id) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.toggles.forget_item(id);
        before - self.items.len()
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    #[must_use]
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn pending_toggles(&self) -> usize {
        self.toggles.pending_count()
    }
}

impl<T: ListItem> From<Vec<T>> for ItemSet<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            toggles: ToggleLedger::default(),
        }
    }
}

impl<T: Toggleable> ItemSet<T> {
    /// Flips `field` on the item locally and returns the ticket for the
    /// network call.
    pub fn begin_toggle(
        &mut self,
        id: &T::Id,
        field: ToggleField,
    ) -> Result<ToggleTicket<T::Id>, ToggleError> {
        let item = self
            .find(id)
            .ok_or_else(|| ToggleError::ItemNotFound(format!("{id:?}")))?;
        let current = item
            .toggle_state(field)
            .ok_or_else(|| ToggleError::Unsupported {
                id: format!("{id:?}"),
                field: field.as_str(),
            })?;

        let (mutation_id, target, shown) = self.toggles.push(id, field, current);
        self.write_state(id, field, shown);

        debug!(?id, field = field.as_str(), target, "optimistic toggle applied");
        Ok(ToggleTicket {
            mutation_id,
            item_id: id.clone(),
            field,
            target,
            action: field.action(target),
        })
    }

    /// Commits or rolls back a toggle. `None` means the ticket is no longer
    /// tracked (replaced, removed or cleared) and nothing changed.
    pub fn settle_toggle(
        &mut self,
        ticket: &ToggleTicket<T::Id>,
        result: Result<(), NetworkError>,
    ) -> Option<ToggleOutcome> {
        let shown = self.toggles.settle(
            &ticket.item_id,
            ticket.field,
            ticket.mutation_id,
            result.is_ok(),
        )?;
        self.write_state(&ticket.item_id, ticket.field, shown);

        match result {
            Ok(()) => Some(ToggleOutcome::Applied),
            Err(reason) => {
                warn!(id = ?ticket.item_id, field = ticket.field.as_str(), error = %reason, "toggle rolled back");
                Some(ToggleOutcome::RolledBack { reason })
            }
        }
    }

    fn write_state(&mut self, id: &T::Id, field: ToggleField, state: ToggleState) {
        for item in self.items.iter_mut().filter(|item| item.id() == id) {
            item.set_toggle_state(field, state);
        }
    }
}
