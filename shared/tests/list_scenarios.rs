use chirp_core::event::{PendingToggle, Surface};
use chirp_core::list::{FetchTag, ListQuery};
use chirp_core::model::{CurrentUser, Tweet, UserId, UserSummary};
use chirp_core::notify::ToastKind;
use chirp_core::{App, BearerToken, Effect, Event, ListResource, ListStatus, Model, NetworkError, ToggleField};
use crux_core::testing::AppTester;
use serde_json::json;

fn signed_in() -> Model {
    let mut model = Model::default();
    model.session.sign_in(
        BearerToken::new("tok"),
        CurrentUser {
            id: UserId::new("me"),
            name: "Me".into(),
            username: "me".into(),
            ..CurrentUser::default()
        },
    );
    model
}

fn tweets(prefix: &str, n: usize) -> Vec<Tweet> {
    (0..n)
        .map(|i| {
            serde_json::from_value(json!({
                "_id": format!("{prefix}{i}"),
                "content": format!("tweet {i}"),
                "user": {"_id": "alice", "name": "Alice", "username": "alice"},
                "createdAt": "2024-03-01T12:00:00Z",
                "likesCount": 5
            }))
            .unwrap()
        })
        .collect()
}

fn user(id: &str, following: bool, followers: u64) -> UserSummary {
    serde_json::from_value(json!({
        "_id": id,
        "name": id,
        "username": id,
        "isFollowing": following,
        "followersCount": followers
    }))
    .unwrap()
}

fn tweet_tag(model: &Model) -> FetchTag {
    model.tweets.as_ref().and_then(|l| l.in_flight()).unwrap()
}

fn user_tag(model: &Model) -> FetchTag {
    model.users.as_ref().and_then(|l| l.in_flight()).unwrap()
}

fn last_toggle(model: &Model) -> PendingToggle {
    model.toggles_in_flight.last().cloned().unwrap()
}

#[test]
fn author_feed_pages_until_short_page() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in();

    app.update(
        Event::ListMounted {
            resource: ListResource::Tweets,
            query: ListQuery::author("alice"),
        },
        &mut model,
    );
    let tag = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag, result: Ok(tweets("a", 10)) }, &mut model);

    let view = app.view(&model);
    let list = view.tweets.as_ref().unwrap();
    assert_eq!(list.items.len(), 10);
    assert!(list.has_more);

    let update = app.update(Event::LoadMoreRequested { resource: ListResource::Tweets }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    let tag = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag, result: Ok(tweets("b", 4)) }, &mut model);

    let list = model.tweets.as_ref().unwrap();
    assert_eq!(list.items().len(), 14);
    assert!(!list.has_more());
    assert_eq!(list.items()[10].id.as_str(), "b0");

    let update = app.update(Event::LoadMoreRequested { resource: ListResource::Tweets }, &mut model);
    assert!(update.effects.is_empty());
    assert_eq!(model.tweets.as_ref().unwrap().items().len(), 14);
}

#[test]
fn empty_search_shows_no_results() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ListMounted {
            resource: ListResource::Tweets,
            query: ListQuery::search("cats"),
        },
        &mut model,
    );
    let tag = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag, result: Ok(Vec::new()) }, &mut model);

    let view = app.view(&model);
    let list = view.tweets.unwrap();
    assert!(list.items.is_empty());
    assert_eq!(list.status, ListStatus::Idle);
    assert_eq!(list.empty_message.as_deref(), Some("No results found for \"cats\""));
    assert!(model.toast.is_none());
}

#[test]
fn second_follow_failure_reverts_to_state_before_it() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in();

    app.update(
        Event::ListMounted {
            resource: ListResource::Users,
            query: ListQuery::search("u"),
        },
        &mut model,
    );
    let tag = user_tag(&model);
    app.update(Event::UserPageResponse { tag, result: Ok(vec![user("u1", false, 3)]) }, &mut model);

    app.update(
        Event::ToggleRequested {
            item_id: "u1".into(),
            field: ToggleField::Follow,
            surface: Surface::List,
        },
        &mut model,
    );
    let follow = last_toggle(&model);
    assert_eq!(app.view(&model).pending_follows, vec![UserId::new("u1")]);
    app.update(Event::ToggleResponse { pending: follow, result: Ok(()) }, &mut model);
    assert!(model.users.as_ref().unwrap().items()[0].is_following);

    app.update(
        Event::ToggleRequested {
            item_id: "u1".into(),
            field: ToggleField::Follow,
            surface: Surface::List,
        },
        &mut model,
    );
    let unfollow = last_toggle(&model);
    assert!(!model.users.as_ref().unwrap().items()[0].is_following);
    app.update(
        Event::ToggleResponse {
            pending: unfollow,
            result: Err(NetworkError::Status { code: 500 }),
        },
        &mut model,
    );

    let u1 = &model.users.as_ref().unwrap().items()[0];
    assert!(u1.is_following);
    assert_eq!(u1.followers_count, 4);
    assert_eq!(model.toast.as_ref().map(|t| t.message.as_str()), Some("Failed to unfollow user"));
    assert!(app.view(&model).pending_follows.is_empty());
}

#[test]
fn failed_like_reverts_exactly() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in();

    app.update(
        Event::ListMounted { resource: ListResource::Tweets, query: ListQuery::timeline() },
        &mut model,
    );
    let tag = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag, result: Ok(tweets("t", 1)) }, &mut model);

    let update = app.update(
        Event::ToggleRequested {
            item_id: "t0".into(),
            field: ToggleField::Like,
            surface: Surface::List,
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    let shown = &model.tweets.as_ref().unwrap().items()[0];
    assert!(shown.is_liked);
    assert_eq!(shown.likes_count, 6);

    let pending = last_toggle(&model);
    app.update(
        Event::ToggleResponse {
            pending,
            result: Err(NetworkError::transport("offline")),
        },
        &mut model,
    );

    let tweet = &model.tweets.as_ref().unwrap().items()[0];
    assert!(!tweet.is_liked);
    assert_eq!(tweet.likes_count, 5);
    let toast = model.toast.as_ref().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Failed to like tweet");
    assert_eq!(model.tweets.as_ref().unwrap().status(), ListStatus::Idle);
}

#[test]
fn late_page_for_replaced_query_is_discarded() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ListMounted { resource: ListResource::Tweets, query: ListQuery::search("q1") },
        &mut model,
    );
    let q1 = tweet_tag(&model);
    app.update(
        Event::ListQueryChanged { resource: ListResource::Tweets, query: ListQuery::search("q2") },
        &mut model,
    );
    let q2 = tweet_tag(&model);

    app.update(Event::TweetPageResponse { tag: q2, result: Ok(tweets("new", 2)) }, &mut model);
    app.update(Event::TweetPageResponse { tag: q1, result: Ok(tweets("old", 10)) }, &mut model);

    let ids: Vec<&str> = model.tweets.as_ref().unwrap().items().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["new0", "new1"]);
}

#[test]
fn failed_load_more_rolls_back_and_retries_same_page() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ListMounted { resource: ListResource::Tweets, query: ListQuery::timeline() },
        &mut model,
    );
    let tag = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag, result: Ok(tweets("a", 10)) }, &mut model);

    app.update(Event::LoadMoreRequested { resource: ListResource::Tweets }, &mut model);
    let failed = tweet_tag(&model);
    app.update(
        Event::TweetPageResponse { tag: failed, result: Err(NetworkError::Status { code: 502 }) },
        &mut model,
    );
    assert_eq!(model.tweets.as_ref().unwrap().status(), ListStatus::Errored);
    assert_eq!(model.tweets.as_ref().unwrap().items().len(), 10);
    assert_eq!(model.toast.as_ref().map(|t| t.message.as_str()), Some("Failed to load tweets"));

    app.update(Event::LoadMoreRequested { resource: ListResource::Tweets }, &mut model);
    assert_eq!(tweet_tag(&model).page, failed.page);
}

#[test]
fn compose_success_refreshes_feed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in();

    app.update(
        Event::ListMounted { resource: ListResource::Tweets, query: ListQuery::timeline() },
        &mut model,
    );
    let first = tweet_tag(&model);
    app.update(Event::TweetPageResponse { tag: first, result: Ok(tweets("a", 3)) }, &mut model);

    app.update(Event::ComposeContentChanged("hello".into()), &mut model);
    let update = app.update(Event::ComposeSubmitted { reply_to: None }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert!(app.view(&model).compose.submitting);

    let update = app.update(Event::ComposeResponse { reply: false, result: Ok(()) }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert_eq!(model.toast.as_ref().map(|t| t.message.as_str()), Some("Tweet posted!"));
    assert!(model.compose.content.is_empty());
    assert_ne!(tweet_tag(&model), first);
    assert_eq!(model.tweets.as_ref().unwrap().status(), ListStatus::Loading);
}

#[test]
fn suggested_follow_rolls_back_without_touching_search_results() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in();

    app.update(
        Event::ListMounted { resource: ListResource::Users, query: ListQuery::search("u") },
        &mut model,
    );
    let tag = user_tag(&model);
    app.update(Event::UserPageResponse { tag, result: Ok(vec![user("u1", false, 3)]) }, &mut model);
    app.update(Event::SuggestionsRequested, &mut model);
    app.update(Event::SuggestionsResponse(Ok(vec![user("u1", false, 3)])), &mut model);

    app.update(
        Event::ToggleRequested {
            item_id: "u1".into(),
            field: ToggleField::Follow,
            surface: Surface::Suggestions,
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.suggestions[0].is_following);
    assert!(!view.users.as_ref().unwrap().items[0].is_following);

    let pending = last_toggle(&model);
    app.update(
        Event::ToggleResponse { pending, result: Err(NetworkError::Status { code: 500 }) },
        &mut model,
    );
    let view = app.view(&model);
    assert!(!view.suggestions[0].is_following);
    assert_eq!(view.suggestions[0].followers_count, 3);
    assert_eq!(model.toast.as_ref().map(|t| t.message.as_str()), Some("Failed to follow user"));
}
