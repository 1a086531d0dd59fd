//! Paginated collections with optimistic item mutations.

mod controller;
mod driver;
mod items;
mod optimistic;
mod query;

use std::fmt;
use std::hash::Hash;

pub use self::controller::{
    FetchOutcome, FetchTag, ListController, ListStatus, Page, PageRequest, PAGE_SIZE,
};
pub use self::driver::PagedList;
pub use self::items::ItemSet;
pub use self::optimistic::{ToggleField, ToggleOutcome, ToggleState, ToggleTicket, Toggleable};
pub use self::query::{ListFilter, ListQuery, ListResource, Qualifier, Relation};

/// Anything a list can hold.
pub trait ListItem {
    type Id: Clone + Eq + Hash + fmt::Debug;

    fn id(&self) -> &Self::Id;
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::error::NetworkError;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: u32,
        liked: bool,
        likes: u64,
    }

    impl ListItem for Post {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    impl Toggleable for Post {
        fn toggle_state(&self, _field: ToggleField) -> Option<ToggleState> {
            Some(ToggleState::new(self.liked, self.likes))
        }

        fn set_toggle_state(&mut self, _field: ToggleField, state: ToggleState) {
            self.liked = state.active;
            self.likes = state.count;
        }
    }

    fn page_of(start: u32, len: usize) -> Vec<Post> {
        (start..start + len as u32)
            .map(|id| Post {
                id,
                liked: false,
                likes: 0,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn pages_accumulate_in_server_order(
            full_pages in 0usize..6,
            tail in 0usize..PAGE_SIZE,
        ) {
            let (mut list, mut request) = ListController::mount(ListQuery::timeline());
            let mut expected = Vec::new();
            let mut previous_len = 0;

            for n in 0..=full_pages {
                let len = if n == full_pages { tail } else { PAGE_SIZE };
                let batch = page_of((n * 100) as u32, len);
                expected.extend(batch.clone());
                list.complete(request.tag, Ok(batch));

                prop_assert_eq!(list.items(), expected.as_slice());
                prop_assert!(list.items().len() >= previous_len);
                previous_len = list.items().len();

                match list.load_more() {
                    Some(next) => request = next,
                    None => break,
                }
            }

            prop_assert!(!list.has_more());
            prop_assert!(list.load_more().is_none());
        }

        #[test]
        fn short_page_ends_pagination_until_reset(
            short in 0usize..PAGE_SIZE,
            failures in 0usize..3,
        ) {
            let (mut list, first) = ListController::mount(ListQuery::search("x"));
            list.complete(first.tag, Ok(page_of(0, short)));
            prop_assert!(!list.has_more());

            for _ in 0..failures {
                prop_assert!(list.load_more().is_none());
            }

            let again = list.reset_with_query(ListQuery::search("y"));
            prop_assert!(list.has_more());
            list.complete(again.tag, Ok(page_of(0, PAGE_SIZE)));
            prop_assert!(list.has_more());
        }

        #[test]
        fn toggles_never_drift(
            steps in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<prop::sample::Index>()), 1..24),
            initial_liked in any::<bool>(),
        ) {
            let initial_likes = 5u64;
            let (mut list, first) = ListController::mount(ListQuery::timeline());
            list.complete(first.tag, Ok(vec![Post { id: 1, liked: initial_liked, likes: initial_likes }]));

            let mut pending = Vec::new();
            let mut succeeded = Vec::new();
            let mut flips = 0usize;

            // Each step either fires a new toggle or settles a pending one.
            for (fire, succeed, pick) in steps {
                if fire || pending.is_empty() {
                    pending.push((flips, list.begin_toggle(&1, ToggleField::Like).unwrap()));
                    flips += 1;
                } else {
                    let (issued, ticket) = pending.remove(pick.index(pending.len()));
                    let result = if succeed {
                        succeeded.push((issued, ticket.target));
                        Ok(())
                    } else {
                        Err(NetworkError::transport("x"))
                    };
                    prop_assert!(list.settle_toggle(&ticket, result).is_some());
                }

                let post = &list.items()[0];
                let drift = post.likes.abs_diff(initial_likes);
                prop_assert!(drift <= 1);
                prop_assert!(drift as usize <= flips);
                prop_assert_eq!(post.liked != initial_liked, drift == 1);
            }

            while let Some((issued, ticket)) = pending.pop() {
                succeeded.push((issued, ticket.target));
                prop_assert_eq!(list.settle_toggle(&ticket, Ok(())), Some(ToggleOutcome::Applied));
            }
            prop_assert_eq!(list.pending_toggles(), 0);

            let expected_liked = succeeded
                .iter()
                .max_by_key(|(issued, _)| *issued)
                .map_or(initial_liked, |(_, target)| *target);
            let expected_likes = match (initial_liked, expected_liked) {
                (a, b) if a == b => initial_likes,
                (false, true) => initial_likes + 1,
                _ => initial_likes - 1,
            };

            let post = &list.items()[0];
            prop_assert_eq!(post.liked, expected_liked);
            prop_assert_eq!(post.likes, expected_likes);
        }
    }
}
