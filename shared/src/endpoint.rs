//! Remote collaborators of the list controller, for hosts that drive it
//! with async calls instead of Crux effects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NetworkResult;
use crate::list::{ListQuery, Page};
use crate::session::BearerToken;

/// Item-level write actions understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Like,
    Unlike,
    Retweet,
    Unretweet,
    Follow,
    Unfollow,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
            Self::Retweet => "retweet",
            Self::Unretweet => "unretweet",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::Delete => "delete",
        }
    }

    /// `POST {collection}/{id}/{action}` for toggles, `DELETE {collection}/{id}` for deletes.
    #[must_use]
    pub fn path(self, item_id: &str) -> String {
        match self {
            Self::Like | Self::Unlike | Self::Retweet | Self::Unretweet => {
                format!("/api/tweets/{item_id}/{}", self.as_str())
            }
            Self::Follow | Self::Unfollow => format!("/api/users/{item_id}/{}", self.as_str()),
            Self::Delete => format!("/api/tweets/{item_id}"),
        }
    }
}

#[async_trait]
pub trait ListingEndpoint<T>: Send + Sync {
    async fn fetch_page(
        &self,
        credential: Option<&BearerToken>,
        query: &ListQuery,
        page: Page,
        page_size: usize,
    ) -> NetworkResult<Vec<T>>;
}

#[async_trait]
pub trait MutationEndpoint: Send + Sync {
    async fn apply_action(
        &self,
        credential: Option<&BearerToken>,
        item_id: &str,
        action: Action,
    ) -> NetworkResult<()>;
}
