use chrono::{DateTime, TimeZone, Utc};
use crux_core::App as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::http::{self, ApiRoutes, HttpResult};
use crate::capabilities::{kv, Capabilities};
use crate::compose::{posted_message, ComposeDraft, NewTweet, POST_FAILED_MESSAGE};
use crate::config::ClientConfig;
use crate::endpoint::Action;
use crate::error::{NetworkError, NetworkResult, ProfileUpdateError, ToggleError};
use crate::event::{Event, LoginForm, PendingToggle, RegisterForm, Surface};
use crate::list::{
    FetchOutcome, ItemSet, ListController, ListItem, ListQuery, ListResource, ListStatus,
    PageRequest, ToggleField, ToggleOutcome, ToggleTicket, Toggleable,
};
use crate::model::{CurrentUser, Profile, Tweet, TweetId, UserId, UserSummary};
use crate::notify::ToastMessage;
use crate::profile::{
    ProfileEditor, ProfileUpdate, PROFILE_UPDATED_MESSAGE, PROFILE_UPDATE_FAILED_MESSAGE,
};
use crate::session::{BearerToken, Session, SessionState};

pub const PROFILE_FAILED_MESSAGE: &str = "Failed to load profile";
pub const TWEET_FAILED_MESSAGE: &str = "Failed to load tweet";
pub const LOGGED_OUT_MESSAGE: &str = "Logged out successfully";
pub const TWEET_DELETED_MESSAGE: &str = "Tweet deleted";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete tweet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Login => "Logged in successfully!",
            Self::Register => "Account created successfully!",
        }
    }

    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Login => "Invalid credentials",
            Self::Register => "Failed to create account",
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub config: ClientConfig,
    routes: Option<ApiRoutes>,
    pub session: Session,
    pub pending_auth: Option<AuthMode>,
    pub tweets: Option<ListController<Tweet>>,
    pub users: Option<ListController<UserSummary>>,
    pub toggles_in_flight: Vec<PendingToggle>,
    pub compose: ComposeDraft,
    /// The tweet detail page: zero or one tweet.
    pub detail: ItemSet<Tweet>,
    pub requested_tweet: Option<TweetId>,
    /// The profile header: zero or one profile.
    pub profile: ItemSet<Profile>,
    pub requested_profile: Option<String>,
    pub profile_editor: ProfileEditor,
    pub suggestions: ItemSet<UserSummary>,
    pub suggestions_loading: bool,
    pub toast: Option<ToastMessage>,
    /// Last shell clock reading; zero until the first tick.
    pub now_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        let config = ClientConfig::default();
        Self {
            routes: ApiRoutes::new(&config).ok(),
            config,
            session: Session::default(),
            pending_auth: None,
            tweets: None,
            users: None,
            toggles_in_flight: Vec::new(),
            compose: ComposeDraft::default(),
            detail: ItemSet::new(),
            requested_tweet: None,
            profile: ItemSet::new(),
            requested_profile: None,
            profile_editor: ProfileEditor::default(),
            suggestions: ItemSet::new(),
            suggestions_loading: false,
            toast: None,
            now_ms: 0,
        }
    }
}

impl Model {
    pub fn show_toast(&mut self, toast: ToastMessage) {
        self.toast = Some(toast.shown_at(self.now_ms));
    }

    pub fn clear_toast(&mut self) {
        self.toast = None;
    }

    /// Advances the clock. Toasts raised before the first reading start
    /// their timer now.
    pub fn tick(&mut self, now_ms: u64) {
        if self.now_ms == 0 {
            if let Some(toast) = self.toast.take() {
                self.toast = Some(toast.shown_at(now_ms));
            }
        }
        self.now_ms = self.now_ms.max(now_ms);
    }

    #[must_use]
    pub fn routes(&self) -> Option<&ApiRoutes> {
        self.routes.as_ref()
    }

    /// A mounted list for `resource`, if it has not been torn down.
    fn live_tweets(&self) -> Option<&ListController<Tweet>> {
        self.tweets.as_ref().filter(|l| !l.is_disposed())
    }

    fn live_users(&self) -> Option<&ListController<UserSummary>> {
        self.users.as_ref().filter(|l| !l.is_disposed())
    }

    /// Drops everything that belonged to the signed-out user. Lists keep
    /// their slots so responses already in flight stay stale.
    fn forget_user_state(&mut self) {
        if let Some(list) = self.tweets.as_mut() {
            list.dispose();
        }
        if let Some(list) = self.users.as_mut() {
            list.dispose();
        }
        self.toggles_in_flight.clear();
        self.compose = ComposeDraft::default();
        self.detail.clear();
        self.requested_tweet = None;
        self.profile.clear();
        self.requested_profile = None;
        self.profile_editor = ProfileEditor::default();
        self.suggestions.clear();
        self.suggestions_loading = false;
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub status: ListStatus,
    pub has_more: bool,
    pub empty_message: Option<String>,
}

impl<T: ListItem + Clone> ListView<T> {
    fn of(list: &ListController<T>, resource: ListResource) -> Self {
        Self::mapped(list, resource, Clone::clone)
    }
}

impl<T> ListView<T> {
    fn mapped<S: ListItem>(
        list: &ListController<S>,
        resource: ListResource,
        f: impl Fn(&S) -> T,
    ) -> Self {
        Self {
            items: list.items().iter().map(f).collect(),
            status: list.status(),
            has_more: list.has_more(),
            empty_message: list
                .is_empty_result()
                .then(|| list.query().empty_message(resource)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TweetView {
    pub tweet: Tweet,
    pub time_ago: String,
    pub can_delete: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TweetDetailView {
    pub tweet: TweetView,
    pub can_reply: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProfileView {
    pub profile: Profile,
    pub joined: String,
    pub is_self: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposeView {
    pub content: String,
    pub image_url: String,
    pub submitting: bool,
    pub can_submit: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub session: SessionState,
    pub user: Option<CurrentUser>,
    pub auth_submitting: bool,
    pub tweets: Option<ListView<TweetView>>,
    pub users: Option<ListView<UserSummary>>,
    /// Users with a follow or unfollow still awaiting the server.
    pub pending_follows: Vec<UserId>,
    pub compose: ComposeView,
    pub tweet_detail: Option<TweetDetailView>,
    pub tweet_loading: bool,
    pub profile: Option<ProfileView>,
    pub profile_loading: bool,
    /// Pre-filled edit form, present only on the signed-in user's own profile.
    pub profile_form: Option<ProfileUpdate>,
    pub profile_saving: bool,
    pub suggestions: Vec<UserSummary>,
    pub toast: Option<ToastMessage>,
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One backend call. Owns what it needs to turn the response, or a failure
/// to send at all, into the matching event.
#[derive(Debug, Clone)]
enum ApiCall {
    Page {
        resource: ListResource,
        request: PageRequest,
    },
    Toggle(PendingToggle),
    Delete(TweetId),
    Compose(NewTweet),
    Login(LoginForm),
    Register(RegisterForm),
    CurrentUser,
    Profile(String),
    UpdateProfile(ProfileUpdate),
    Tweet(TweetId),
    Suggestions,
}

impl ApiCall {
    fn route(&self, routes: &ApiRoutes) -> (Method, String) {
        match self {
            Self::Page { resource, request } => (
                Method::Get,
                routes.list_page(*resource, &request.query, request.page),
            ),
            Self::Toggle(pending) => (
                Method::Post,
                routes.action(pending.item_id(), pending.action()),
            ),
            Self::Delete(id) => (Method::Delete, routes.action(id.as_str(), Action::Delete)),
            Self::Compose(_) => (Method::Post, routes.create_tweet()),
            Self::Login(_) => (Method::Post, routes.login()),
            Self::Register(_) => (Method::Post, routes.register()),
            Self::CurrentUser => (Method::Get, routes.current_user()),
            Self::Profile(username) => (Method::Get, routes.profile(username)),
            Self::UpdateProfile(_) => (Method::Put, routes.update_profile()),
            Self::Tweet(id) => (Method::Get, routes.tweet(id.as_str())),
            Self::Suggestions => (Method::Get, routes.suggestions()),
        }
    }

    fn body(&self) -> NetworkResult<Option<Vec<u8>>> {
        let body = match self {
            Self::Compose(tweet) => serde_json::to_vec(tweet)?,
            Self::Login(form) => serde_json::to_vec(form)?,
            Self::Register(form) => serde_json::to_vec(form)?,
            Self::UpdateProfile(update) => serde_json::to_vec(update)?,
            _ => return Ok(None),
        };
        Ok(Some(body))
    }

    fn finish(self, body: NetworkResult<Vec<u8>>) -> Event {
        match self {
            Self::Page {
                resource: ListResource::Tweets,
                request,
            } => Event::TweetPageResponse {
                tag: request.tag,
                result: body.and_then(|b| http::decode_page(ListResource::Tweets, &b)),
            },
            Self::Page {
                resource: ListResource::Users,
                request,
            } => Event::UserPageResponse {
                tag: request.tag,
                result: body.and_then(|b| http::decode_page(ListResource::Users, &b)),
            },
            Self::Toggle(pending) => Event::ToggleResponse {
                pending,
                result: body.map(drop),
            },
            Self::Delete(tweet_id) => Event::DeleteTweetResponse {
                tweet_id,
                result: body.map(drop),
            },
            Self::Compose(tweet) => Event::ComposeResponse {
                reply: tweet.reply_to_id.is_some(),
                result: body.map(drop),
            },
            Self::Login(_) | Self::Register(_) => {
                Event::AuthResponse(body.and_then(|b| http::decode_auth(&b)))
            }
            Self::CurrentUser => {
                Event::CurrentUserResponse(body.and_then(|b| http::decode_user(&b)))
            }
            Self::Profile(_) => Event::ProfileResponse(body.and_then(|b| http::decode_user(&b))),
            Self::UpdateProfile(_) => {
                Event::ProfileUpdateResponse(body.and_then(|b| http::decode_user(&b)))
            }
            Self::Tweet(tweet_id) => Event::TweetResponse {
                tweet_id,
                result: body.and_then(|b| http::decode_tweet(&b)),
            },
            Self::Suggestions => Event::SuggestionsResponse(
                body.and_then(|b| http::decode_page(ListResource::Users, &b)),
            ),
        }
    }
}

fn start_list<T: ListItem>(slot: &mut Option<ListController<T>>, query: ListQuery) -> PageRequest {
    if let Some(list) = slot.as_mut() {
        return list.initialize(query);
    }
    let (list, request) = ListController::mount(query);
    *slot = Some(list);
    request
}

fn begin_toggle<T: Toggleable>(
    slot: &mut Option<ListController<T>>,
    id: T::Id,
    field: ToggleField,
) -> Result<ToggleTicket<T::Id>, ToggleError> {
    match slot.as_mut() {
        Some(list) => list.begin_toggle(&id, field),
        None => Err(ToggleError::ItemNotFound(format!("{id:?}"))),
    }
}

/// Applies a toggle on the surface it was pressed on.
fn begin_surface_toggle(
    model: &mut Model,
    item_id: String,
    field: ToggleField,
    surface: Surface,
) -> Result<PendingToggle, ToggleError> {
    let tweet = |ticket| PendingToggle::Tweet { surface, ticket };
    let user = |ticket| PendingToggle::User { surface, ticket };

    match (field.resource(), surface) {
        (ListResource::Tweets, Surface::List) => {
            begin_toggle(&mut model.tweets, TweetId::new(item_id), field).map(tweet)
        }
        (ListResource::Tweets, Surface::Detail) => {
            model.detail.begin_toggle(&TweetId::new(item_id), field).map(tweet)
        }
        (ListResource::Tweets, Surface::Suggestions) => Err(ToggleError::Unsupported {
            id: item_id,
            field: field.as_str(),
        }),
        (ListResource::Users, Surface::List) => {
            begin_toggle(&mut model.users, UserId::new(item_id), field).map(user)
        }
        (ListResource::Users, Surface::Detail) => {
            model.profile.begin_toggle(&UserId::new(item_id), field).map(user)
        }
        (ListResource::Users, Surface::Suggestions) => {
            model.suggestions.begin_toggle(&UserId::new(item_id), field).map(user)
        }
    }
}

fn settle_surface_toggle(
    model: &mut Model,
    pending: &PendingToggle,
    result: NetworkResult<()>,
) -> Option<ToggleOutcome> {
    match pending {
        PendingToggle::Tweet {
            surface: Surface::Detail,
            ticket,
        } => model.detail.settle_toggle(ticket, result),
        PendingToggle::Tweet { ticket, .. } => model
            .tweets
            .as_mut()
            .and_then(|list| list.settle_toggle(ticket, result)),
        PendingToggle::User {
            surface: Surface::Detail,
            ticket,
        } => model.profile.settle_toggle(ticket, result),
        PendingToggle::User {
            surface: Surface::Suggestions,
            ticket,
        } => model.suggestions.settle_toggle(ticket, result),
        PendingToggle::User { ticket, .. } => model
            .users
            .as_mut()
            .and_then(|list| list.settle_toggle(ticket, result)),
    }
}

fn report_page(model: &mut Model, resource: ListResource, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Failed(error) => {
            warn!(
                ?resource,
                code = error.code(),
                status = error.http_status(),
                "list fetch failed"
            );
            model.show_toast(ToastMessage::error(resource.load_failed_message()));
        }
        FetchOutcome::Stale => debug!(?resource, "stale page dropped"),
        FetchOutcome::Applied { received } => debug!(?resource, received, "page applied"),
    }
}

/// The shell's clock as a date, or `None` before the first tick.
fn view_time(now_ms: u64) -> Option<DateTime<Utc>> {
    if now_ms == 0 {
        return None;
    }
    i64::try_from(now_ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[derive(Default)]
pub struct App;

impl App {
    fn dispatch(&self, call: ApiCall, model: &mut Model, caps: &Capabilities) {
        let Some(routes) = model.routes() else {
            warn!(?call, "no API routes configured");
            let event = call.finish(Err(NetworkError::transport("API base URL not configured")));
            self.update(event, model, caps);
            return;
        };
        let (method, url) = call.route(routes);
        let body = match call.body() {
            Ok(body) => body,
            Err(e) => {
                self.update(call.finish(Err(e)), model, caps);
                return;
            }
        };

        debug!(?method, %url, "request");
        let mut builder = match method {
            Method::Get => caps.http.get(&url),
            Method::Post => caps.http.post(&url),
            Method::Put => caps.http.put(&url),
            Method::Delete => caps.http.delete(&url),
        };
        if let Some(token) = model.session.bearer() {
            builder = builder.header("Authorization", token.authorization_header());
        }
        if let Some(body) = body {
            builder = builder.header("Content-Type", "application/json").body(body);
        }
        builder.send(move |result: HttpResult| call.finish(http::read_body(result)));
    }

    fn fetch_page(&self, resource: ListResource, request: PageRequest, model: &mut Model, caps: &Capabilities) {
        self.dispatch(ApiCall::Page { resource, request }, model, caps);
    }

    fn fetch_profile(&self, username: String, model: &mut Model, caps: &Capabilities) {
        model.requested_profile = Some(username.clone());
        self.dispatch(ApiCall::Profile(username), model, caps);
    }

    fn fetch_tweet(&self, tweet_id: TweetId, model: &mut Model, caps: &Capabilities) {
        if model.detail.first().map(|t| &t.id) != Some(&tweet_id) {
            model.detail.clear();
        }
        model.requested_tweet = Some(tweet_id.clone());
        self.dispatch(ApiCall::Tweet(tweet_id), model, caps);
    }

    fn refresh_tweets(&self, model: &mut Model, caps: &Capabilities) {
        let request = model
            .tweets
            .as_mut()
            .filter(|l| !l.is_disposed())
            .map(ListController::refresh);
        if let Some(request) = request {
            self.fetch_page(ListResource::Tweets, request, model, caps);
        }
    }

    fn forget_credential(model: &Model, caps: &Capabilities) {
        caps.key_value.delete(model.config.credential_key.clone(), |result| {
            Event::CredentialStored(kv::acknowledge(result))
        });
    }

    fn authenticate(&self, call: ApiCall, mode: AuthMode, model: &mut Model, caps: &Capabilities) {
        if model.pending_auth.is_some() {
            debug!(?mode, "auth already in flight");
            return;
        }
        model.pending_auth = Some(mode);
        self.dispatch(call, model, caps);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[allow(clippy::too_many_lines)]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "event");
        }

        match event {
            Event::Noop => return,

            Event::Configure(config) => {
                match config.validate().and_then(|()| ApiRoutes::new(&config)) {
                    Ok(routes) => {
                        info!(base = %config.api_base_url, "client configured");
                        model.routes = Some(routes);
                        model.config = config;
                    }
                    Err(e) => warn!(error = %e, "rejected client config"),
                }
            }

            Event::AppStarted => {
                model.session.begin_restore();
                caps.key_value
                    .get(model.config.credential_key.clone(), |result| {
                        Event::CredentialLoaded(kv::decode_credential(result))
                    });
            }

            Event::CredentialLoaded(result) => {
                let token = result.unwrap_or_else(|e| {
                    warn!(error = %e, "credential read failed");
                    None
                });
                if model.session.credential_loaded(token.map(BearerToken::new)) {
                    self.dispatch(ApiCall::CurrentUser, model, caps);
                }
            }

            Event::CurrentUserResponse(result) => {
                if model.session.state() != SessionState::LoadingProfile {
                    debug!("profile response outside restore ignored");
                    return;
                }
                if model.session.profile_loaded(result).is_err() {
                    Self::forget_credential(model, caps);
                }
            }

            Event::LoginRequested(form) => {
                self.authenticate(ApiCall::Login(form), AuthMode::Login, model, caps);
            }

            Event::RegisterRequested(form) => {
                self.authenticate(ApiCall::Register(form), AuthMode::Register, model, caps);
            }

            Event::AuthResponse(result) => {
                let mode = model.pending_auth.take().unwrap_or(AuthMode::Login);
                match result {
                    Ok(success) => {
                        let token = BearerToken::new(success.token);
                        caps.key_value.set(
                            model.config.credential_key.clone(),
                            kv::encode_credential(token.expose()),
                            |result| Event::CredentialStored(kv::acknowledge(result)),
                        );
                        model.session.sign_in(token, success.user);
                        model.show_toast(ToastMessage::success(mode.success_message()));
                    }
                    Err(e) => {
                        warn!(
                            ?mode,
                            code = e.code(),
                            status = e.http_status(),
                            "authentication failed"
                        );
                        model.show_toast(ToastMessage::error(mode.failure_message()));
                    }
                }
            }

            Event::LogoutRequested => {
                model.session.teardown();
                model.forget_user_state();
                Self::forget_credential(model, caps);
                model.show_toast(ToastMessage::success(LOGGED_OUT_MESSAGE));
            }

            Event::CredentialStored(result) => {
                if let Err(e) = result {
                    warn!(error = %e, "credential storage failed");
                }
                return;
            }

            Event::ListMounted { resource, query } | Event::ListQueryChanged { resource, query } => {
                let request = match resource {
                    ListResource::Tweets => start_list(&mut model.tweets, query),
                    ListResource::Users => start_list(&mut model.users, query),
                };
                self.fetch_page(resource, request, model, caps);
            }

            Event::LoadMoreRequested { resource } => {
                let request = match resource {
                    ListResource::Tweets => model.tweets.as_mut().and_then(ListController::load_more),
                    ListResource::Users => model.users.as_mut().and_then(ListController::load_more),
                };
                match request {
                    Some(request) => self.fetch_page(resource, request, model, caps),
                    None => {
                        debug!(?resource, "load more ignored");
                        return;
                    }
                }
            }

            Event::RefreshRequested { resource } => {
                let request = match resource {
                    ListResource::Tweets => model
                        .tweets
                        .as_mut()
                        .filter(|l| !l.is_disposed())
                        .map(ListController::refresh),
                    ListResource::Users => model
                        .users
                        .as_mut()
                        .filter(|l| !l.is_disposed())
                        .map(ListController::refresh),
                };
                if let Some(request) = request {
                    self.fetch_page(resource, request, model, caps);
                }
            }

            Event::ListUnmounted { resource } => match resource {
                ListResource::Tweets => {
                    if let Some(list) = model.tweets.as_mut() {
                        list.dispose();
                    }
                }
                ListResource::Users => {
                    if let Some(list) = model.users.as_mut() {
                        list.dispose();
                    }
                }
            },

            Event::TweetPageResponse { tag, result } => {
                let Some(list) = model.tweets.as_mut() else {
                    return;
                };
                let outcome = list.complete(tag, result);
                report_page(model, ListResource::Tweets, &outcome);
            }

            Event::UserPageResponse { tag, result } => {
                let Some(list) = model.users.as_mut() else {
                    return;
                };
                let outcome = list.complete(tag, result);
                report_page(model, ListResource::Users, &outcome);
            }

            Event::ToggleRequested {
                item_id,
                field,
                surface,
            } => {
                if !model.session.is_authenticated() {
                    warn!(field = field.as_str(), "toggle requires a signed-in user");
                    return;
                }
                match begin_surface_toggle(model, item_id, field, surface) {
                    Ok(pending) => {
                        model.toggles_in_flight.push(pending.clone());
                        self.dispatch(ApiCall::Toggle(pending), model, caps);
                    }
                    Err(e) => {
                        warn!(error = %e, ?surface, "toggle rejected");
                        return;
                    }
                }
            }

            Event::ToggleResponse { pending, result } => {
                let mutation_id = pending.mutation_id();
                model
                    .toggles_in_flight
                    .retain(|p| p.mutation_id() != mutation_id);
                if let Err(e) = &result {
                    warn!(
                        field = pending.field().as_str(),
                        code = e.code(),
                        status = e.http_status(),
                        "toggle failed"
                    );
                    model.show_toast(ToastMessage::error(
                        pending.field().failure_message(pending.target()),
                    ));
                }
                if settle_surface_toggle(model, &pending, result).is_none() {
                    debug!(field = pending.field().as_str(), "toggle settled for an untracked item");
                }
            }

            Event::DeleteTweetRequested { tweet_id } => {
                if !model.session.is_authenticated() {
                    warn!(%tweet_id, "delete requires a signed-in user");
                    return;
                }
                self.dispatch(ApiCall::Delete(tweet_id), model, caps);
            }

            Event::DeleteTweetResponse { tweet_id, result } => match result {
                Ok(()) => {
                    let removed = model
                        .tweets
                        .as_mut()
                        .map_or(0, |list| list.remove_item(&tweet_id))
                        + model.detail.remove_item(&tweet_id);
                    info!(%tweet_id, removed, "tweet deleted");
                    model.show_toast(ToastMessage::success(TWEET_DELETED_MESSAGE));
                }
                Err(e) => {
                    warn!(%tweet_id, code = e.code(), status = e.http_status(), "delete failed");
                    model.show_toast(ToastMessage::error(DELETE_FAILED_MESSAGE));
                }
            },

            Event::ComposeContentChanged(content) => model.compose.content = content,

            Event::ComposeImageChanged(image_url) => model.compose.image_url = image_url,

            Event::ComposeSubmitted { reply_to } => {
                if !model.session.is_authenticated() {
                    warn!("compose requires a signed-in user");
                    return;
                }
                match model.compose.begin_submit(reply_to) {
                    Ok(tweet) => self.dispatch(ApiCall::Compose(tweet), model, caps),
                    Err(e) => debug!(error = %e, "compose not submitted"),
                }
            }

            Event::ComposeResponse { reply, result } => {
                model.compose.finish_submit(result.is_ok());
                match result {
                    Ok(()) => {
                        model.show_toast(ToastMessage::success(posted_message(reply)));
                        self.refresh_tweets(model, caps);
                        // The open tweet's reply count changed.
                        let open = model.detail.first().map(|t| t.id.clone());
                        if let Some(tweet_id) = open.filter(|_| reply) {
                            self.fetch_tweet(tweet_id, model, caps);
                        }
                    }
                    Err(e) => {
                        warn!(code = e.code(), status = e.http_status(), "post failed");
                        model.show_toast(ToastMessage::error(POST_FAILED_MESSAGE));
                    }
                }
            }

            Event::ProfileRequested { username } => {
                self.fetch_profile(username, model, caps);
            }

            Event::ProfileResponse(result) => {
                let Some(requested) = model.requested_profile.take() else {
                    return;
                };
                match result {
                    Ok(profile) if profile.username.eq_ignore_ascii_case(&requested) => {
                        model.profile.replace(vec![profile]);
                    }
                    Ok(profile) => {
                        debug!(got = %profile.username, %requested, "profile for another user dropped");
                        model.requested_profile = Some(requested);
                        return;
                    }
                    Err(e) => {
                        warn!(
                            %requested,
                            code = e.code(),
                            status = e.http_status(),
                            "profile fetch failed"
                        );
                        model.show_toast(ToastMessage::error(PROFILE_FAILED_MESSAGE));
                    }
                }
            }

            Event::ProfileUpdateSubmitted(update) => {
                if !model.session.is_authenticated() {
                    warn!("profile update requires a signed-in user");
                    return;
                }
                match model.profile_editor.begin_save(update) {
                    Ok(update) => self.dispatch(ApiCall::UpdateProfile(update), model, caps),
                    Err(ProfileUpdateError::AlreadySaving) => {
                        debug!("profile save already in flight");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "profile update rejected");
                        model.show_toast(ToastMessage::error(e.to_string()));
                    }
                }
            }

            Event::ProfileUpdateResponse(result) => {
                model.profile_editor.finish_save();
                match result {
                    Ok(user) => {
                        let username = user.username.clone();
                        let showing_own = model.profile.first().is_some_and(|p| p.id == user.id);
                        model.session.update_user(user);
                        model.show_toast(ToastMessage::success(PROFILE_UPDATED_MESSAGE));
                        if showing_own {
                            self.fetch_profile(username, model, caps);
                        }
                    }
                    Err(e) => {
                        warn!(code = e.code(), status = e.http_status(), "profile update failed");
                        model.show_toast(ToastMessage::error(PROFILE_UPDATE_FAILED_MESSAGE));
                    }
                }
            }

            Event::TweetRequested { tweet_id } => {
                self.fetch_tweet(tweet_id, model, caps);
            }

            Event::TweetResponse { tweet_id, result } => {
                if model.requested_tweet.as_ref() != Some(&tweet_id) {
                    debug!(%tweet_id, "tweet response no longer wanted");
                    return;
                }
                model.requested_tweet = None;
                match result {
                    Ok(tweet) => model.detail.replace(vec![tweet]),
                    Err(e) => {
                        warn!(
                            %tweet_id,
                            code = e.code(),
                            status = e.http_status(),
                            "tweet fetch failed"
                        );
                        model.detail.clear();
                        model.show_toast(ToastMessage::error(TWEET_FAILED_MESSAGE));
                    }
                }
            }

            Event::TweetClosed => {
                model.requested_tweet = None;
                model.detail.clear();
            }

            Event::SuggestionsRequested => {
                if !model.session.is_authenticated() {
                    debug!("suggestions need a signed-in user");
                    return;
                }
                model.suggestions_loading = true;
                self.dispatch(ApiCall::Suggestions, model, caps);
            }

            Event::SuggestionsResponse(result) => {
                if !model.suggestions_loading {
                    return;
                }
                model.suggestions_loading = false;
                match result {
                    Ok(users) => model.suggestions.replace(users),
                    // The panel stays as it was; no toast.
                    Err(e) => warn!(
                        code = e.code(),
                        status = e.http_status(),
                        "suggestions fetch failed"
                    ),
                }
            }

            Event::DismissToast => model.clear_toast(),

            Event::TimerTick { now_ms } => {
                model.tick(now_ms);
                let expired = model
                    .toast
                    .as_ref()
                    .is_some_and(|toast| toast.is_expired(model.now_ms));
                if !expired {
                    return;
                }
                model.clear_toast();
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let now = view_time(model.now_ms);
        let me = model.session.current_user().map(|u| u.id.clone());
        let tweet_view = |tweet: &Tweet| TweetView {
            time_ago: now.map_or_else(|| tweet.posted_label(), |now| tweet.time_ago(now)),
            can_delete: me.as_ref().is_some_and(|id| tweet.is_authored_by(id)),
            tweet: tweet.clone(),
        };

        let tweets = model
            .live_tweets()
            .map(|list| ListView::mapped(list, ListResource::Tweets, &tweet_view));

        let tweet_detail = model.detail.first().map(|tweet| TweetDetailView {
            can_reply: !tweet.is_reply(),
            tweet: tweet_view(tweet),
        });

        let profile = model.profile.first().map(|profile| ProfileView {
            joined: profile.joined_label(),
            is_self: me.as_ref() == Some(&profile.id),
            profile: profile.clone(),
        });
        let profile_form = profile
            .as_ref()
            .filter(|view| view.is_self)
            .map(|view| ProfileUpdate::from_profile(&view.profile));

        ViewModel {
            session: model.session.state(),
            user: model.session.current_user().cloned(),
            auth_submitting: model.pending_auth.is_some(),
            tweets,
            users: model
                .live_users()
                .map(|list| ListView::of(list, ListResource::Users)),
            pending_follows: model
                .toggles_in_flight
                .iter()
                .filter_map(PendingToggle::followed_user)
                .cloned()
                .collect(),
            compose: ComposeView {
                content: model.compose.content.clone(),
                image_url: model.compose.image_url.clone(),
                submitting: model.compose.submitting,
                can_submit: model.compose.can_submit(),
            },
            tweet_detail,
            tweet_loading: model.requested_tweet.is_some(),
            profile,
            profile_loading: model.requested_profile.is_some(),
            profile_form,
            profile_saving: model.profile_editor.saving,
            suggestions: model.suggestions.items().to_vec(),
            toast: model.toast.clone(),
        }
    }
}
