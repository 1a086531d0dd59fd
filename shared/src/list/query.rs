use serde::{Deserialize, Serialize};

use crate::model::{TweetId, UserId};

/// Which listing endpoint a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListResource {
    Tweets,
    Users,
}

impl ListResource {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Tweets => "/api/tweets",
            Self::Users => "/api/users",
        }
    }

    /// Key of the item array in the response envelope.
    #[must_use]
    pub const fn envelope_key(self) -> &'static str {
        match self {
            Self::Tweets => "tweets",
            Self::Users => "users",
        }
    }

    #[must_use]
    pub const fn load_failed_message(self) -> &'static str {
        match self {
            Self::Tweets => "Failed to load tweets",
            Self::Users => "Failed to load users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Followers,
    Following,
}

impl Relation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Following => "following",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ListFilter {
    /// The signed-in user's home timeline.
    Timeline,
    Author { handle: String },
    Search { term: String },
    Replies { parent: TweetId },
    Relation { user: UserId, relation: Relation },
}

/// Narrows a result set; absent means plain tweets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Replies,
    Media,
    Likes,
}

impl Qualifier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replies => "replies",
            Self::Media => "media",
            Self::Likes => "likes",
        }
    }
}

/// What is being listed. Any difference between two queries means the
/// accumulated results of one say nothing about the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    pub filter: ListFilter,
    #[serde(default)]
    pub qualifier: Option<Qualifier>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::timeline()
    }
}

impl ListQuery {
    #[must_use]
    pub fn timeline() -> Self {
        Self {
            filter: ListFilter::Timeline,
            qualifier: None,
        }
    }

    pub fn author(handle: impl Into<String>) -> Self {
        Self {
            filter: ListFilter::Author {
                handle: handle.into(),
            },
            qualifier: None,
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            filter: ListFilter::Search { term: term.into() },
            qualifier: None,
        }
    }

    #[must_use]
    pub fn replies_to(parent: TweetId) -> Self {
        Self {
            filter: ListFilter::Replies { parent },
            qualifier: None,
        }
    }

    #[must_use]
    pub fn relation(user: UserId, relation: Relation) -> Self {
        Self {
            filter: ListFilter::Relation { user, relation },
            qualifier: None,
        }
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Query-string parameters (besides `page`) understood by the backend.
    #[must_use]
    pub fn wire_params(&self, resource: ListResource) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        match (&self.filter, resource) {
            (ListFilter::Timeline, _) => {}
            (ListFilter::Author { handle }, _) => {
                if !handle.is_empty() {
                    params.push(("username", handle.clone()));
                }
            }
            (ListFilter::Search { term }, _) => {
                if !term.is_empty() {
                    params.push(("query", term.clone()));
                }
            }
            (ListFilter::Replies { parent }, _) => {
                if !parent.as_str().is_empty() {
                    params.push(("replyToId", parent.as_str().to_string()));
                }
            }
            (ListFilter::Relation { user, relation }, ListResource::Users) => {
                params.push(("type", relation.as_str().to_string()));
                params.push(("userId", user.as_str().to_string()));
            }
            (ListFilter::Relation { .. }, ListResource::Tweets) => {}
        }

        if resource == ListResource::Tweets {
            if let Some(qualifier) = self.qualifier {
                params.push(("type", qualifier.as_str().to_string()));
            }
        }

        params
    }

    /// Copy shown when the first page comes back empty.
    #[must_use]
    pub fn empty_message(&self, resource: ListResource) -> String {
        match (&self.filter, resource) {
            (ListFilter::Search { term }, _) if !term.is_empty() => {
                format!("No results found for \"{term}\"")
            }
            (ListFilter::Author { handle }, ListResource::Tweets) => {
                format!("@{handle} hasn't posted any tweets yet")
            }
            (ListFilter::Replies { .. }, ListResource::Tweets) => {
                "No replies yet. Be the first to reply!".into()
            }
            (ListFilter::Relation { relation: Relation::Followers, .. }, ListResource::Users) => {
                "This user doesn't have any followers yet".into()
            }
            (ListFilter::Relation { relation: Relation::Following, .. }, ListResource::Users) => {
                "This user isn't following anyone yet".into()
            }
            (_, ListResource::Tweets) => {
                "Your timeline is empty. Follow some users to see their tweets!".into()
            }
            (_, ListResource::Users) => "No users to display".into(),
        }
    }
}
