use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::Action;
use crate::error::{ConfigError, NetworkError, NetworkResult};
use crate::event::AuthSuccess;
use crate::list::{ListQuery, ListResource, Page};
use crate::model::{CurrentUser, Tweet};

pub type HttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

/// Absolute URLs for every backend route, rooted at the configured origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    base: Url,
}

impl ApiRoutes {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base: config.base_url()?,
        })
    }

    /// Appends `path` to the base, keeping any path prefix the base carries.
    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{path}", self.base.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(None);
        url
    }

    #[must_use]
    pub fn list_page(&self, resource: ListResource, query: &ListQuery, page: Page) -> String {
        let mut url = self.url(resource.path());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            for (key, value) in query.wire_params(resource) {
                pairs.append_pair(key, &value);
            }
        }
        url.into()
    }

    #[must_use]
    pub fn action(&self, item_id: &str, action: Action) -> String {
        self.url(&action.path(item_id)).into()
    }

    #[must_use]
    pub fn login(&self) -> String {
        self.url("/api/users/login").into()
    }

    #[must_use]
    pub fn register(&self) -> String {
        self.url("/api/users/register").into()
    }

    #[must_use]
    pub fn current_user(&self) -> String {
        self.url("/api/users/me").into()
    }

    #[must_use]
    pub fn profile(&self, username: &str) -> String {
        let mut url = self.url("/api/users/profile");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(username);
        }
        url.into()
    }

    #[must_use]
    pub fn create_tweet(&self) -> String {
        self.url("/api/tweets").into()
    }

    #[must_use]
    pub fn tweet(&self, tweet_id: &str) -> String {
        let mut url = self.url("/api/tweets");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(tweet_id);
        }
        url.into()
    }

    #[must_use]
    pub fn update_profile(&self) -> String {
        self.url("/api/users/profile").into()
    }

    #[must_use]
    pub fn suggestions(&self) -> String {
        self.url("/api/users/suggestions").into()
    }
}

fn check_status(code: u16) -> NetworkResult<()> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(NetworkError::Status { code })
    }
}

/// The body of a successful response; any other status is an error.
pub fn read_body(result: HttpResult) -> NetworkResult<Vec<u8>> {
    let mut response = result?;
    check_status(response.status().into())?;
    Ok(response.take_body().unwrap_or_default())
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> NetworkResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Unwraps `{"tweets": [...]}` / `{"users": [...]}`.
pub fn decode_page<T: DeserializeOwned>(resource: ListResource, body: &[u8]) -> NetworkResult<Vec<T>> {
    let mut envelope: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)?;
    let key = resource.envelope_key();
    let items = envelope
        .remove(key)
        .ok_or_else(|| NetworkError::payload(format!("missing '{key}' array")))?;
    Ok(serde_json::from_value(items)?)
}

#[derive(Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    success: bool,
    token: String,
    user: CurrentUser,
}

#[derive(Deserialize)]
struct UserEnvelope<U> {
    #[serde(default = "accepted")]
    success: bool,
    user: U,
}

#[derive(Deserialize)]
struct TweetEnvelope {
    tweet: Tweet,
}

const fn accepted() -> bool {
    true
}

/// `{"success": true, "token": ..., "user": {...}}` from login and register.
pub fn decode_auth(body: &[u8]) -> NetworkResult<AuthSuccess> {
    let envelope: AuthEnvelope = decode_json(body)?;
    if !envelope.success {
        return Err(NetworkError::payload("authentication rejected"));
    }
    Ok(AuthSuccess {
        token: envelope.token,
        user: envelope.user,
    })
}

/// `{"user": {...}}`, optionally with a `success` flag that must be true.
pub fn decode_user<U: DeserializeOwned>(body: &[u8]) -> NetworkResult<U> {
    let envelope: UserEnvelope<U> = decode_json(body)?;
    if !envelope.success {
        return Err(NetworkError::payload("user lookup rejected"));
    }
    Ok(envelope.user)
}

/// `{"tweet": {...}}` from the single-tweet route.
pub fn decode_tweet(body: &[u8]) -> NetworkResult<Tweet> {
    let envelope: TweetEnvelope = decode_json(body)?;
    Ok(envelope.tweet)
}
