use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::list::{ListItem, ToggleField, ToggleState, Toggleable};

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(TweetId);
typed_id!(UserId);

/// Embedded author/actor reference as the backend nests it inside tweets.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub profile_image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: TweetId,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    pub user: UserRef,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub retweets_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_retweeted: bool,
    #[serde(default)]
    pub retweeted_by: Option<UserRef>,
    #[serde(default)]
    pub reply_to_user: Option<UserRef>,
    #[serde(default)]
    pub reply_to_id: Option<TweetId>,
}

impl Tweet {
    #[must_use]
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.user.id == user_id
    }

    #[must_use]
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        format_time_ago(self.created_at, now)
    }

    /// Absolute date, for when no clock reading is available yet.
    #[must_use]
    pub fn posted_label(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }

    /// Replies cannot be replied to in turn.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.reply_to_id.is_some()
    }
}

impl ListItem for Tweet {
    type Id = TweetId;

    fn id(&self) -> &TweetId {
        &self.id
    }
}

impl Toggleable for Tweet {
    fn toggle_state(&self, field: ToggleField) -> Option<ToggleState> {
        match field {
            ToggleField::Like => Some(ToggleState::new(self.is_liked, self.likes_count)),
            ToggleField::Retweet => Some(ToggleState::new(self.is_retweeted, self.retweets_count)),
            ToggleField::Follow => None,
        }
    }

    fn set_toggle_state(&mut self, field: ToggleField, state: ToggleState) {
        match field {
            ToggleField::Like => {
                self.is_liked = state.active;
                self.likes_count = state.count;
            }
            ToggleField::Retweet => {
                self.is_retweeted = state.active;
                self.retweets_count = state.count;
            }
            ToggleField::Follow => {}
        }
    }
}

/// A row in a user list (search results, followers, following).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub followers_count: u64,
}

impl ListItem for UserSummary {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Toggleable for UserSummary {
    fn toggle_state(&self, field: ToggleField) -> Option<ToggleState> {
        match field {
            ToggleField::Follow => Some(ToggleState::new(self.is_following, self.followers_count)),
            ToggleField::Like | ToggleField::Retweet => None,
        }
    }

    fn set_toggle_state(&mut self, field: ToggleField, state: ToggleState) {
        if field == ToggleField::Follow {
            self.is_following = state.active;
            self.followers_count = state.count;
        }
    }
}

/// The signed-in account, as returned by `/api/users/me` and the auth endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub tweets_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub is_following: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    #[must_use]
    pub fn joined_label(&self) -> String {
        format!("Joined {}", self.created_at.format("%B %Y"))
    }
}

impl ListItem for Profile {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// The follow button on a profile header.
impl Toggleable for Profile {
    fn toggle_state(&self, field: ToggleField) -> Option<ToggleState> {
        match field {
            ToggleField::Follow => Some(ToggleState::new(self.is_following, self.followers_count)),
            ToggleField::Like | ToggleField::Retweet => None,
        }
    }

    fn set_toggle_state(&mut self, field: ToggleField, state: ToggleState) {
        if field == ToggleField::Follow {
            self.is_following = state.active;
            self.followers_count = state.count;
        }
    }
}

#[must_use]
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_secs = now.signed_duration_since(then).num_seconds();

    if diff_secs < 0 {
        return if diff_secs > -60 {
            "Just now".into()
        } else {
            "Upcoming".into()
        };
    }
    if diff_secs < 5 {
        return "Just now".into();
    }
    if diff_secs < 60 {
        return format!("{diff_secs}s ago");
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }
    if diff_days < 365 {
        return then.format("%b %-d").to_string();
    }

    then.format("%b %-d, %Y").to_string()
}
