use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ComposeError;
use crate::model::TweetId;

pub const POSTED_MESSAGE: &str = "Tweet posted!";
pub const REPLY_POSTED_MESSAGE: &str = "Reply posted!";
pub const POST_FAILED_MESSAGE: &str = "Failed to post tweet";

/// Body of `POST /api/tweets`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTweet {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<TweetId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposeDraft {
    pub content: String,
    pub image_url: String,
    pub submitting: bool,
}

impl ComposeDraft {
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.content.trim().is_empty()
    }

    /// Builds the request body. Content is sent as typed; only blank
    /// content is refused.
    pub fn validate(&self, reply_to: Option<TweetId>) -> Result<NewTweet, ComposeError> {
        if self.submitting {
            return Err(ComposeError::AlreadySubmitting);
        }
        if self.content.trim().is_empty() {
            return Err(ComposeError::EmptyContent);
        }

        let image = match self.image_url.trim() {
            "" => None,
            raw => {
                let url = Url::parse(raw)
                    .map_err(|e| ComposeError::InvalidImageUrl(format!("{raw}: {e}")))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ComposeError::InvalidImageUrl(raw.to_string()));
                }
                Some(raw.to_string())
            }
        };

        Ok(NewTweet {
            content: self.content.clone(),
            image,
            reply_to_id: reply_to,
        })
    }

    /// Marks the draft in flight and returns the body to send.
    pub fn begin_submit(&mut self, reply_to: Option<TweetId>) -> Result<NewTweet, ComposeError> {
        let tweet = self.validate(reply_to)?;
        self.submitting = true;
        Ok(tweet)
    }

    pub fn finish_submit(&mut self, succeeded: bool) {
        if succeeded {
            *self = Self::default();
        } else {
            self.submitting = false;
        }
    }
}

#[must_use]
pub fn posted_message(is_reply: bool) -> &'static str {
    if is_reply {
        REPLY_POSTED_MESSAGE
    } else {
        POSTED_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn draft(content: &str, image: &str) -> ComposeDraft {
        ComposeDraft {
            content: content.into(),
            image_url: image.into(),
            submitting: false,
        }
    }

    #[test]
    fn test_blank_content_rejected() {
        assert_matches!(draft("   \n", "").validate(None), Err(ComposeError::EmptyContent));
        assert!(!draft(" ", "").can_submit());
    }

    #[test]
    fn test_image_url_must_be_http() {
        assert_matches!(
            draft("hi", "ftp://x/y.png").validate(None),
            Err(ComposeError::InvalidImageUrl(_))
        );
        assert_matches!(
            draft("hi", "not a url").validate(None),
            Err(ComposeError::InvalidImageUrl(_))
        );
        let tweet = draft("hi", "https://img.test/a.png").validate(None).unwrap();
        assert_eq!(tweet.image.as_deref(), Some("https://img.test/a.png"));
    }

    #[test]
    fn test_wire_shape() {
        let tweet = draft(" hello ", "").validate(Some(TweetId::new("t9"))).unwrap();
        let json = serde_json::to_value(&tweet).unwrap();
        assert_eq!(json, serde_json::json!({ "content": " hello ", "replyToId": "t9" }));
    }

    #[test]
    fn test_single_submission_in_flight() {
        let mut d = draft("hello", "");
        d.begin_submit(None).unwrap();
        assert_matches!(d.begin_submit(None), Err(ComposeError::AlreadySubmitting));

        d.finish_submit(false);
        assert_eq!(d.content, "hello");
        d.begin_submit(None).unwrap();
        d.finish_submit(true);
        assert_eq!(d, ComposeDraft::default());
    }

    #[test]
    fn test_posted_message() {
        assert_eq!(posted_message(true), "Reply posted!");
        assert_eq!(posted_message(false), "Tweet posted!");
    }
}
