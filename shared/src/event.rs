use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::endpoint::Action;
use crate::error::{NetworkResult, SessionError};
use crate::list::{FetchTag, ListQuery, ListResource, ToggleField, ToggleTicket};
use crate::model::{CurrentUser, Profile, Tweet, TweetId, UserId, UserSummary};
use crate::profile::ProfileUpdate;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token and user handed back by login and register.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    pub token: String,
    pub user: CurrentUser,
}

impl fmt::Debug for AuthSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSuccess")
            .field("token", &"[REDACTED]")
            .field("user", &self.user.username)
            .finish()
    }
}

/// Where a toggle was pressed. Each surface keeps its own copy of the item
/// and rolls back independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// The mounted tweet or user list.
    #[default]
    List,
    /// The tweet detail page for likes and retweets, the profile header
    /// for follows.
    Detail,
    /// The "who to follow" panel.
    Suggestions,
}

/// A toggle in flight, tagged by the item kind and the surface it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingToggle {
    Tweet {
        surface: Surface,
        ticket: ToggleTicket<TweetId>,
    },
    User {
        surface: Surface,
        ticket: ToggleTicket<UserId>,
    },
}

impl PendingToggle {
    #[must_use]
    pub fn field(&self) -> ToggleField {
        match self {
            Self::Tweet { ticket, .. } => ticket.field,
            Self::User { ticket, .. } => ticket.field,
        }
    }

    #[must_use]
    pub fn mutation_id(&self) -> Uuid {
        match self {
            Self::Tweet { ticket, .. } => ticket.mutation_id,
            Self::User { ticket, .. } => ticket.mutation_id,
        }
    }

    #[must_use]
    pub fn target(&self) -> bool {
        match self {
            Self::Tweet { ticket, .. } => ticket.target,
            Self::User { ticket, .. } => ticket.target,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Tweet { ticket, .. } => ticket.action,
            Self::User { ticket, .. } => ticket.action,
        }
    }

    #[must_use]
    pub fn item_id(&self) -> &str {
        match self {
            Self::Tweet { ticket, .. } => ticket.item_id.as_str(),
            Self::User { ticket, .. } => ticket.item_id.as_str(),
        }
    }

    #[must_use]
    pub fn surface(&self) -> Surface {
        match self {
            Self::Tweet { surface, .. } | Self::User { surface, .. } => *surface,
        }
    }

    /// The user a pending follow is about.
    #[must_use]
    pub fn followed_user(&self) -> Option<&UserId> {
        match self {
            Self::User { ticket, .. } => Some(&ticket.item_id),
            Self::Tweet { .. } => None,
        }
    }
}

/// Everything the shell can send, plus the core's own capability callbacks
/// (skipped from serialization).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Event {
    Noop,

    Configure(ClientConfig),
    AppStarted,
    #[serde(skip)]
    CredentialLoaded(Result<Option<String>, SessionError>),
    #[serde(skip)]
    CurrentUserResponse(NetworkResult<CurrentUser>),

    LoginRequested(LoginForm),
    RegisterRequested(RegisterForm),
    #[serde(skip)]
    AuthResponse(NetworkResult<AuthSuccess>),
    LogoutRequested,
    #[serde(skip)]
    CredentialStored(Result<(), SessionError>),

    ListMounted {
        resource: ListResource,
        query: ListQuery,
    },
    ListQueryChanged {
        resource: ListResource,
        query: ListQuery,
    },
    LoadMoreRequested {
        resource: ListResource,
    },
    RefreshRequested {
        resource: ListResource,
    },
    ListUnmounted {
        resource: ListResource,
    },
    #[serde(skip)]
    TweetPageResponse {
        tag: FetchTag,
        result: NetworkResult<Vec<Tweet>>,
    },
    #[serde(skip)]
    UserPageResponse {
        tag: FetchTag,
        result: NetworkResult<Vec<UserSummary>>,
    },

    ToggleRequested {
        item_id: String,
        field: ToggleField,
        #[serde(default)]
        surface: Surface,
    },
    #[serde(skip)]
    ToggleResponse {
        pending: PendingToggle,
        result: NetworkResult<()>,
    },
    DeleteTweetRequested {
        tweet_id: TweetId,
    },
    #[serde(skip)]
    DeleteTweetResponse {
        tweet_id: TweetId,
        result: NetworkResult<()>,
    },

    ComposeContentChanged(String),
    ComposeImageChanged(String),
    ComposeSubmitted {
        reply_to: Option<TweetId>,
    },
    #[serde(skip)]
    ComposeResponse {
        reply: bool,
        result: NetworkResult<()>,
    },

    ProfileRequested {
        username: String,
    },
    #[serde(skip)]
    ProfileResponse(NetworkResult<Profile>),
    ProfileUpdateSubmitted(ProfileUpdate),
    #[serde(skip)]
    ProfileUpdateResponse(NetworkResult<CurrentUser>),

    TweetRequested {
        tweet_id: TweetId,
    },
    #[serde(skip)]
    TweetResponse {
        tweet_id: TweetId,
        result: NetworkResult<Tweet>,
    },
    TweetClosed,

    SuggestionsRequested,
    #[serde(skip)]
    SuggestionsResponse(NetworkResult<Vec<UserSummary>>),

    DismissToast,
    TimerTick {
        now_ms: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::AppStarted => "app_started",
            Self::CredentialLoaded(_) => "credential_loaded",
            Self::CurrentUserResponse(_) => "current_user_response",
            Self::LoginRequested(_) => "login_requested",
            Self::RegisterRequested(_) => "register_requested",
            Self::AuthResponse(_) => "auth_response",
            Self::LogoutRequested => "logout_requested",
            Self::CredentialStored(_) => "credential_stored",
            Self::ListMounted { .. } => "list_mounted",
            Self::ListQueryChanged { .. } => "list_query_changed",
            Self::LoadMoreRequested { .. } => "load_more_requested",
            Self::RefreshRequested { .. } => "refresh_requested",
            Self::ListUnmounted { .. } => "list_unmounted",
            Self::TweetPageResponse { .. } => "tweet_page_response",
            Self::UserPageResponse { .. } => "user_page_response",
            Self::ToggleRequested { .. } => "toggle_requested",
            Self::ToggleResponse { .. } => "toggle_response",
            Self::DeleteTweetRequested { .. } => "delete_tweet_requested",
            Self::DeleteTweetResponse { .. } => "delete_tweet_response",
            Self::ComposeContentChanged(_) => "compose_content_changed",
            Self::ComposeImageChanged(_) => "compose_image_changed",
            Self::ComposeSubmitted { .. } => "compose_submitted",
            Self::ComposeResponse { .. } => "compose_response",
            Self::ProfileRequested { .. } => "profile_requested",
            Self::ProfileResponse(_) => "profile_response",
            Self::ProfileUpdateSubmitted(_) => "profile_update_submitted",
            Self::ProfileUpdateResponse(_) => "profile_update_response",
            Self::TweetRequested { .. } => "tweet_requested",
            Self::TweetResponse { .. } => "tweet_response",
            Self::TweetClosed => "tweet_closed",
            Self::SuggestionsRequested => "suggestions_requested",
            Self::SuggestionsResponse(_) => "suggestions_response",
            Self::DismissToast => "dismiss_toast",
            Self::TimerTick { .. } => "timer_tick",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LoginRequested(_)
                | Self::RegisterRequested(_)
                | Self::LogoutRequested
                | Self::ListQueryChanged { .. }
                | Self::LoadMoreRequested { .. }
                | Self::RefreshRequested { .. }
                | Self::ToggleRequested { .. }
                | Self::DeleteTweetRequested { .. }
                | Self::ComposeContentChanged(_)
                | Self::ComposeImageChanged(_)
                | Self::ComposeSubmitted { .. }
                | Self::ProfileRequested { .. }
                | Self::ProfileUpdateSubmitted(_)
                | Self::TweetRequested { .. }
                | Self::TweetClosed
                | Self::DismissToast
        )
    }
}
