//! Optimistic toggles with rollback.
//!
//! A toggle is a small transaction: snapshot, apply locally, wait for the
//! server, then commit or roll back. Rapid toggles on the same item and
//! field are kept in a per-key chain so the visible value always follows
//! the latest live intent and the paired counter never double-applies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use uuid::Uuid;

use super::query::ListResource;
use super::ListItem;
use crate::endpoint::Action;
use crate::error::NetworkError;

/// A boolean relation on an item together with its paired counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleField {
    /// `is_liked` / `likes_count`
    Like,
    /// `is_retweeted` / `retweets_count`
    Retweet,
    /// `is_following` / `followers_count`
    Follow,
}

impl ToggleField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Retweet => "retweet",
            Self::Follow => "follow",
        }
    }

    /// Wire action that moves the field to `target`.
    #[must_use]
    pub const fn action(self, target: bool) -> Action {
        match (self, target) {
            (Self::Like, true) => Action::Like,
            (Self::Like, false) => Action::Unlike,
            (Self::Retweet, true) => Action::Retweet,
            (Self::Retweet, false) => Action::Unretweet,
            (Self::Follow, true) => Action::Follow,
            (Self::Follow, false) => Action::Unfollow,
        }
    }

    #[must_use]
    pub const fn resource(self) -> ListResource {
        match self {
            Self::Like | Self::Retweet => ListResource::Tweets,
            Self::Follow => ListResource::Users,
        }
    }

    #[must_use]
    pub const fn failure_message(self, target: bool) -> &'static str {
        match (self, target) {
            (Self::Like, _) => "Failed to like tweet",
            (Self::Retweet, _) => "Failed to retweet",
            (Self::Follow, true) => "Failed to follow user",
            (Self::Follow, false) => "Failed to unfollow user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleState {
    pub active: bool,
    pub count: u64,
}

impl ToggleState {
    #[must_use]
    pub const fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    /// The state after moving the flag to `target`; the counter moves by one
    /// step only when the flag actually changes.
    #[must_use]
    pub const fn toward(self, target: bool) -> Self {
        if self.active == target {
            self
        } else if target {
            Self::new(true, self.count.saturating_add(1))
        } else {
            Self::new(false, self.count.saturating_sub(1))
        }
    }
}

/// Items that expose toggleable fields.
pub trait Toggleable: ListItem {
    /// `None` when the item has no such field.
    fn toggle_state(&self, field: ToggleField) -> Option<ToggleState>;

    fn set_toggle_state(&mut self, field: ToggleField, state: ToggleState);
}

/// Handed out by `begin_toggle`; the caller sends `action` and returns the
/// ticket with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleTicket<Id> {
    pub mutation_id: Uuid,
    pub item_id: Id,
    pub field: ToggleField,
    pub target: bool,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied,
    RolledBack { reason: NetworkError },
}

#[derive(Debug, Clone)]
struct Intent {
    mutation_id: Uuid,
    target: bool,
    confirmed: bool,
}

#[derive(Debug, Clone)]
struct ToggleChain {
    baseline: ToggleState,
    intents: Vec<Intent>,
}

impl ToggleChain {
    fn visible(&self) -> ToggleState {
        let target = self
            .intents
            .last()
            .map_or(self.baseline.active, |intent| intent.target);
        self.baseline.toward(target)
    }

    fn fold_confirmed(&mut self) {
        let settled = self.intents.iter().take_while(|i| i.confirmed).count();
        for intent in self.intents.drain(..settled) {
            self.baseline = self.baseline.toward(intent.target);
        }
    }
}

/// Pending toggles keyed by item and field.
#[derive(Debug, Clone)]
pub(crate) struct ToggleLedger<Id> {
    chains: HashMap<(Id, ToggleField), ToggleChain>,
}

impl<Id> Default for ToggleLedger<Id> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash> ToggleLedger<Id> {
    /// Records a new intent and returns the state to show right away.
    pub(crate) fn push(
        &mut self,
        item_id: &Id,
        field: ToggleField,
        current: ToggleState,
    ) -> (Uuid, bool, ToggleState) {
        let chain = self
            .chains
            .entry((item_id.clone(), field))
            .or_insert_with(|| ToggleChain {
                baseline: current,
                intents: Vec::new(),
            });

        let target = !chain.visible().active;
        let mutation_id = Uuid::new_v4();
        chain.intents.push(Intent {
            mutation_id,
            target,
            confirmed: false,
        });

        (mutation_id, target, chain.visible())
    }

    /// Settles one intent. Returns the state to show afterwards, or `None`
    /// when the intent is no longer tracked.
    pub(crate) fn settle(
        &mut self,
        item_id: &Id,
        field: ToggleField,
        mutation_id: Uuid,
        succeeded: bool,
    ) -> Option<ToggleState> {
        let key = (item_id.clone(), field);
        let chain = self.chains.get_mut(&key)?;
        let index = chain
            .intents
            .iter()
            .position(|i| i.mutation_id == mutation_id)?;

        if succeeded {
            chain.intents[index].confirmed = true;
        } else {
            chain.intents.remove(index);
        }
        chain.fold_confirmed();

        let visible = chain.visible();
        if chain.intents.is_empty() {
            self.chains.remove(&key);
        }
        Some(visible)
    }

    pub(crate) fn forget_item(&mut self, item_id: &Id) {
        self.chains.retain(|(id, _), _| id != item_id);
    }

    pub(crate) fn clear(&mut self) {
        self.chains.clear();
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.chains.values().map(|c| c.intents.len()).sum()
    }
}
