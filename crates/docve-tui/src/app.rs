//! Application state management.
//!
//! `App` owns the session handle, the API client and the data behind every
//! view. Navigation always goes through the auth gate. Network calls run in
//! spawned tasks that report back over an mpsc channel as `AppEvent`s; each
//! view's requests share a cancellation token that is cancelled when the view
//! is left.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docve_core::api::{run_cancellable, UploadProgress};
use docve_core::auth::{
    self, Credentials, FieldErrors, LoginError, LoginFlow, LoginSuccess, SignupError,
    SignupFieldErrors, SignupFlow, SignupForm, SIGNUP_REDIRECT_DELAY,
};
use docve_core::chat::{self, ChatSession};
use docve_core::config::ENV_PASSWORD;
use docve_core::models::{
    AccessGrant, ActivityEntry, DashboardStats, Document, DocumentStatus, NewShelf, Shelf,
    ShelfAccess, ShelfType, UploadRequest, User, UserQuery,
};
use docve_core::{ApiClient, ApiError, AuthGate, Config, Route, SharedSessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background event channel
const CHANNEL_BUFFER_SIZE: usize = 32;

pub const MAX_USERNAME_LENGTH: usize = 50;

pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Limit for free-text inputs (search, shelf fields, upload path, chat)
pub const MAX_FIELD_LENGTH: usize = 256;

/// Rows moved by PageUp/PageDown
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Users shown in the dashboard's recent-users panel
const RECENT_USERS_LIMIT: usize = 5;

// ============================================================================
// View enums
// ============================================================================

/// Top-level tabs shown once signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Shelves,
    MyShelves,
    Chat,
    Admin,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Shelves, Tab::MyShelves, Tab::Chat, Tab::Admin];

    pub fn route(&self) -> Route {
        match self {
            Tab::Dashboard => Route::Dashboard,
            Tab::Shelves => Route::Shelves,
            Tab::MyShelves => Route::MyShelves,
            Tab::Chat => Route::Chat,
            Tab::Admin => Route::SuperAdmin,
        }
    }

    pub fn title(&self) -> &'static str {
        self.route().title()
    }

    /// The tab a route belongs to. Public routes have none.
    pub fn from_route(route: &Route) -> Option<Self> {
        match route {
            Route::Dashboard => Some(Tab::Dashboard),
            Route::Shelves | Route::ShelfDocuments(_) => Some(Tab::Shelves),
            Route::MyShelves => Some(Tab::MyShelves),
            Route::Chat => Some(Tab::Chat),
            Route::SuperAdmin => Some(Tab::Admin),
            Route::Login | Route::Signup => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Shelves,
            Tab::Shelves => Tab::MyShelves,
            Tab::MyShelves => Tab::Chat,
            Tab::Chat => Tab::Admin,
            Tab::Admin => Tab::Dashboard,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Admin,
            Tab::Shelves => Tab::Dashboard,
            Tab::MyShelves => Tab::Shelves,
            Tab::Chat => Tab::MyShelves,
            Tab::Admin => Tab::Chat,
        }
    }
}

/// Something awaiting a y/n before it is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Shelf { id: String, name: String },
    Document { id: String, name: String },
    User { id: String, name: String },
}

impl DeleteTarget {
    pub fn describe(&self) -> String {
        match self {
            DeleteTarget::Shelf { name, .. } => format!("shelf \"{}\"", name),
            DeleteTarget::Document { name, .. } => format!("document \"{}\"", name),
            DeleteTarget::User { name, .. } => format!("user \"{}\"", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingDelete(DeleteTarget),
    EditingShelf,
    ManagingAccess,
    GrantingAccess,
    EnteringUploadPath,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginFocus {
    #[default]
    Username,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignupFocus {
    #[default]
    Username,
    Email,
    Password,
    Confirm,
    Button,
}

impl SignupFocus {
    pub fn next(&self) -> Self {
        match self {
            SignupFocus::Username => SignupFocus::Email,
            SignupFocus::Email => SignupFocus::Password,
            SignupFocus::Password => SignupFocus::Confirm,
            SignupFocus::Confirm => SignupFocus::Button,
            SignupFocus::Button => SignupFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            SignupFocus::Username => SignupFocus::Button,
            SignupFocus::Email => SignupFocus::Username,
            SignupFocus::Password => SignupFocus::Email,
            SignupFocus::Confirm => SignupFocus::Password,
            SignupFocus::Button => SignupFocus::Confirm,
        }
    }

    /// Key into `SignupFieldErrors` for this field.
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            SignupFocus::Username => Some("username"),
            SignupFocus::Email => Some("email"),
            SignupFocus::Password => Some("password"),
            SignupFocus::Confirm => Some("confirmPassword"),
            SignupFocus::Button => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShelfField {
    #[default]
    Name,
    Description,
    Type,
    Button,
}

impl ShelfField {
    pub fn next(&self) -> Self {
        match self {
            ShelfField::Name => ShelfField::Description,
            ShelfField::Description => ShelfField::Type,
            ShelfField::Type => ShelfField::Button,
            ShelfField::Button => ShelfField::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ShelfField::Name => ShelfField::Button,
            ShelfField::Description => ShelfField::Name,
            ShelfField::Type => ShelfField::Description,
            ShelfField::Button => ShelfField::Type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatFocus {
    #[default]
    Documents,
    Input,
}

/// Create/edit shelf modal.
#[derive(Debug, Clone, Default)]
pub struct ShelfForm {
    /// Id of the shelf being edited; `None` creates a new one
    pub editing: Option<String>,
    pub name: String,
    pub description: String,
    pub shelf_type: ShelfType,
    pub focus: ShelfField,
    pub error: Option<String>,
    pub saving: bool,
}

impl ShelfForm {
    fn edit(shelf: &Shelf) -> Self {
        Self {
            editing: Some(shelf.id.clone()),
            name: shelf.name.clone(),
            description: shelf.description.clone().unwrap_or_default(),
            shelf_type: shelf.shelf_type.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn to_new_shelf(&self) -> NewShelf {
        NewShelf::new(&self.name, &self.description, self.shelf_type)
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Shelf"
        } else {
            "Create Shelf"
        }
    }
}

/// Grant form inside the access panel.
#[derive(Debug, Clone, Default)]
pub struct GrantForm {
    pub user_id: String,
    pub permission: usize,
}

impl GrantForm {
    pub fn permission_label(&self) -> &'static str {
        AccessGrant::PERMISSIONS[self.permission % AccessGrant::PERMISSIONS.len()]
    }

    pub fn cycle_permission(&mut self) {
        self.permission = (self.permission + 1) % AccessGrant::PERMISSIONS.len();
    }
}

// ============================================================================
// Background events
// ============================================================================

/// Results delivered from spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    Login(Result<LoginSuccess, LoginError>),
    Signup(Result<Route, SignupError>),
    /// Delayed navigation after a success banner
    Redirect(Route),
    /// Startup check of the stored token, tagged with the token it checked
    SessionChecked(String, Result<(), ApiError>),
    DashboardStats(Result<DashboardStats, ApiError>),
    RecentUsers(Result<Vec<User>, ApiError>),
    Activity(Result<Vec<ActivityEntry>, ApiError>),
    Shelves(Result<Vec<Shelf>, ApiError>),
    ShelfSaved(Result<Option<Shelf>, ApiError>),
    ShelfDeleted(Result<(), ApiError>),
    Access(Result<Vec<ShelfAccess>, ApiError>),
    AccessChanged(Result<(), ApiError>),
    CurrentShelf(Result<Shelf, ApiError>),
    Documents(String, Result<Vec<Document>, ApiError>),
    UploadProgress(UploadProgress),
    UploadFinished(Result<Option<Document>, ApiError>),
    DocumentChanged(Result<(), ApiError>),
    ChatDocuments(Result<Vec<Document>, ApiError>),
    /// Simulated reply, tagged with the conversation it belongs to
    ChatReply(u64, String),
    Users(Result<Vec<User>, ApiError>),
    UserDeleted(Result<(), ApiError>),
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    store: SharedSessionStore,
    pub api: ApiClient,
    pub gate: AuthGate,

    pub route: Route,
    pub state: AppState,
    pub status_message: Option<String>,
    /// Navigation scheduled behind a success banner; suspends gate re-checks
    pending_redirect: Option<Route>,

    // Login
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_field_errors: FieldErrors,
    pub login_error: Option<String>,
    pub login_busy: bool,
    pub login_success: bool,

    // Signup
    pub signup: SignupForm,
    pub signup_focus: SignupFocus,
    pub signup_errors: SignupFieldErrors,
    pub signup_error: Option<String>,
    pub signup_busy: bool,
    pub signup_success: bool,

    // Dashboard
    pub stats: Option<DashboardStats>,
    pub recent_users: Vec<User>,
    pub activity: Vec<ActivityEntry>,
    pub dashboard_loading: bool,
    pub dashboard_error: Option<String>,

    // Shelves
    pub shelves: Vec<Shelf>,
    pub shelves_loading: bool,
    pub shelf_selection: usize,
    pub search_query: String,
    pub shelf_form: ShelfForm,
    pub access_shelf: Option<Shelf>,
    pub access: Vec<ShelfAccess>,
    pub access_selection: usize,
    pub grant_form: GrantForm,

    // Documents of one shelf
    pub current_shelf: Option<Shelf>,
    pub documents: Vec<Document>,
    pub documents_loading: bool,
    pub document_selection: usize,
    pub upload_path: String,
    pub upload_progress: Option<UploadProgress>,
    pub uploading: bool,

    // Chat
    pub chat: ChatSession,
    pub chat_documents: Vec<Document>,
    pub chat_selection: usize,
    pub chat_input: String,
    pub chat_focus: ChatFocus,

    // Super admin
    pub users: Vec<User>,
    pub users_loading: bool,
    pub user_selection: usize,

    view_token: CancellationToken,
    /// Cancels a pending chat reply when the conversation is replaced
    chat_token: CancellationToken,
    chat_generation: u64,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
}

impl App {
    /// Create the application from the on-disk config.
    pub fn new(config: Config) -> Result<Self> {
        let store = config.session_store()?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: SharedSessionStore) -> Result<Self> {
        let base_url = config.api_base_url();
        debug!(%base_url, "Creating API client");
        let api = ApiClient::new(&base_url, store.clone())?;
        let gate = AuthGate::new(store.clone());
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            store,
            api,
            gate,

            route: Route::Login,
            state: AppState::Normal,
            status_message: None,
            pending_redirect: None,

            login_username: String::new(),
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_field_errors: FieldErrors::default(),
            login_error: None,
            login_busy: false,
            login_success: false,

            signup: SignupForm::default(),
            signup_focus: SignupFocus::Username,
            signup_errors: SignupFieldErrors::new(),
            signup_error: None,
            signup_busy: false,
            signup_success: false,

            stats: None,
            recent_users: Vec::new(),
            activity: Vec::new(),
            dashboard_loading: false,
            dashboard_error: None,

            shelves: Vec::new(),
            shelves_loading: false,
            shelf_selection: 0,
            search_query: String::new(),
            shelf_form: ShelfForm::default(),
            access_shelf: None,
            access: Vec::new(),
            access_selection: 0,
            grant_form: GrantForm::default(),

            current_shelf: None,
            documents: Vec::new(),
            documents_loading: false,
            document_selection: 0,
            upload_path: String::new(),
            upload_progress: None,
            uploading: false,

            chat: ChatSession::new(),
            chat_documents: Vec::new(),
            chat_selection: 0,
            chat_input: String::new(),
            chat_focus: ChatFocus::Documents,

            users: Vec::new(),
            users_loading: false,
            user_selection: 0,

            view_token: CancellationToken::new(),
            chat_token: CancellationToken::new(),
            chat_generation: 0,
            events_tx: tx,
            events_rx: rx,
        })
    }

    /// Land on the dashboard (or wherever the gate sends us) and, when a
    /// token is already stored, ask the server whether it still accepts it.
    pub fn start(&mut self) {
        self.navigate(Route::Dashboard);

        if let Some(token) = self.store.get() {
            let api = self.api.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = api.validate_token().await;
                Self::send_event(&tx, AppEvent::SessionChecked(token, result)).await;
            });
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Ask the gate for `route` and enter whatever it decides.
    pub fn navigate(&mut self, route: Route) {
        let navigation = self.gate.guard(route);
        if navigation.is_redirect() {
            debug!(to = %navigation.target(), "Gate redirected navigation");
        }
        self.pending_redirect = None;
        self.enter(navigation.target().clone());
    }

    /// Navigate by path, as typed or stored.
    pub fn navigate_path(&mut self, path: &str) {
        let navigation = self.gate.resolve(path);
        self.pending_redirect = None;
        self.enter(navigation.target().clone());
    }

    /// Re-run the gate for the current route. Called every frame so that a
    /// store cleared elsewhere moves the UI to login on the next render.
    pub fn sync_route(&mut self) {
        if self.pending_redirect.is_some() {
            return;
        }
        let navigation = self.gate.guard(self.route.clone());
        if navigation.is_redirect() {
            info!(from = %self.route, to = %navigation.target(), "Session changed, redirecting");
            self.enter(navigation.target().clone());
        }
    }

    fn enter(&mut self, route: Route) {
        if route != self.route {
            self.view_token.cancel();
            self.view_token = CancellationToken::new();
        }
        debug!(route = %route, "Entering view");
        self.route = route;
        self.state = AppState::Normal;
        self.load_current_view();
    }

    pub fn current_tab(&self) -> Option<Tab> {
        Tab::from_route(&self.route)
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.navigate(tab.route());
    }

    /// Reload the data behind the current view.
    pub fn refresh(&mut self) {
        self.status_message = None;
        self.load_current_view();
    }

    fn load_current_view(&mut self) {
        match self.route.clone() {
            Route::Login => self.reset_login_form(),
            Route::Signup => self.reset_signup_form(),
            Route::Dashboard => self.load_dashboard(),
            Route::Shelves | Route::MyShelves => self.load_shelves(),
            Route::ShelfDocuments(id) => self.load_documents(&id),
            Route::Chat => self.load_chat_documents(),
            Route::SuperAdmin => self.load_users(),
        }
    }

    fn schedule_redirect(&mut self, route: Route, delay: Duration) {
        self.pending_redirect = Some(route.clone());
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Self::send_event(&tx, AppEvent::Redirect(route)).await;
        });
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.gate.is_authenticated()
    }

    fn reset_login_form(&mut self) {
        if self.login_username.is_empty() {
            self.login_username = self.config.prefill_username().unwrap_or_default();
        }
        if self.login_password.is_empty() {
            self.login_password = std::env::var(ENV_PASSWORD).unwrap_or_default();
        }
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_field_errors = FieldErrors::default();
        self.login_error = None;
        self.login_busy = false;
        self.login_success = false;
    }

    /// Validate the login form locally, then exchange it for a token in the
    /// background. Nothing is sent when validation fails.
    pub fn submit_login(&mut self) {
        if self.login_busy || self.login_success {
            return;
        }
        let credentials = Credentials::new(&self.login_username, &self.login_password);
        self.login_error = None;
        if let Err(fields) = credentials.validate() {
            self.login_field_errors = fields;
            return;
        }
        self.login_field_errors = FieldErrors::default();
        self.login_busy = true;

        let flow = LoginFlow::new(self.api.clone());
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = flow.login(&credentials).await;
            Self::send_event(&tx, AppEvent::Login(result)).await;
        });
    }

    fn reset_signup_form(&mut self) {
        self.signup = SignupForm::default();
        self.signup_focus = SignupFocus::Username;
        self.signup_errors.clear();
        self.signup_error = None;
        self.signup_busy = false;
        self.signup_success = false;
    }

    pub fn submit_signup(&mut self) {
        if self.signup_busy || self.signup_success {
            return;
        }
        self.signup_error = None;
        if let Err(fields) = self.signup.validate() {
            self.signup_errors = fields;
            return;
        }
        self.signup_errors.clear();
        self.signup_busy = true;

        let flow = SignupFlow::new(self.api.clone());
        let form = self.signup.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = flow.register(&form).await;
            Self::send_event(&tx, AppEvent::Signup(result)).await;
        });
    }

    /// Drop the session and return to the login screen.
    pub fn logout(&mut self) {
        match auth::logout(self.store.as_ref()) {
            Ok(route) => {
                self.clear_session_data();
                self.navigate(route);
                self.status_message = Some("Signed out".to_string());
            }
            Err(e) => {
                error!(error = %e, "Failed to clear session");
                self.status_message = Some(format!("Sign out failed: {}", e));
            }
        }
    }

    /// The server rejected our token: treat it as a logout.
    fn force_logout(&mut self) {
        warn!("Server rejected the session token, signing out");
        self.logout();
        self.status_message = Some("Session expired. Please sign in again.".to_string());
    }

    fn clear_session_data(&mut self) {
        self.view_token.cancel();
        self.view_token = CancellationToken::new();

        self.login_password.clear();
        self.stats = None;
        self.recent_users.clear();
        self.activity.clear();
        self.shelves.clear();
        self.search_query.clear();
        self.access_shelf = None;
        self.access.clear();
        self.current_shelf = None;
        self.documents.clear();
        self.upload_progress = None;
        self.uploading = false;
        self.reset_chat();
        self.chat_documents.clear();
        self.chat_input.clear();
        self.users.clear();
    }

    /// Common failure handling for view requests. Returns the error text for
    /// callers that show it somewhere other than the status bar.
    fn handle_api_error(&mut self, action: &str, err: ApiError) -> Option<String> {
        if err.is_cancelled() {
            debug!(action, "Request cancelled");
            return None;
        }
        if err.is_unauthorized() {
            self.force_logout();
            return None;
        }
        warn!(action, error = %err, "Request failed");
        let message = format!("{} failed: {}", action, err);
        self.status_message = Some(message.clone());
        Some(message)
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
        if let Err(e) = tx.send(event).await {
            error!(error = %e, "Failed to deliver background result - channel closed");
        }
    }

    /// Run `request` on a task tied to the current view; its result comes
    /// back as `into_event(result)`.
    fn spawn_request<T, F, Fut, E>(&self, request: F, into_event: E)
    where
        T: Send + 'static,
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        E: FnOnce(Result<T, ApiError>) -> AppEvent + Send + 'static,
    {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let token = self.view_token.clone();
        tokio::spawn(async move {
            let result = run_cancellable(&token, request(api)).await;
            Self::send_event(&tx, into_event(result)).await;
        });
    }

    /// Drain finished background work, then re-check the gate.
    pub fn check_background_tasks(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.process_event(event);
        }
        self.sync_route();
    }

    pub fn process_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Login(result) => {
                self.login_busy = false;
                match result {
                    Ok(success) => {
                        self.login_success = true;
                        self.login_password.clear();
                        self.remember_username();
                        self.schedule_redirect(success.next, success.redirect_after);
                    }
                    Err(err) => {
                        if let Some(fields) = err.field_errors() {
                            self.login_field_errors = fields.clone();
                        } else {
                            self.login_error = Some(err.to_string());
                        }
                    }
                }
            }
            AppEvent::Signup(result) => {
                self.signup_busy = false;
                match result {
                    Ok(next) => {
                        self.signup_success = true;
                        self.schedule_redirect(next, SIGNUP_REDIRECT_DELAY);
                    }
                    Err(err) => {
                        if let Some(fields) = err.field_errors() {
                            self.signup_errors = fields.clone();
                        }
                        if !matches!(err, SignupError::Validation(_)) {
                            self.signup_error = Some(err.to_string());
                        }
                    }
                }
            }
            AppEvent::Redirect(route) => {
                self.login_success = false;
                self.signup_success = false;
                self.navigate(route);
            }
            AppEvent::SessionChecked(checked, result) => match result {
                Ok(()) => debug!("Stored session accepted"),
                Err(err) if err.is_unauthorized() => {
                    // The user may have signed in again while the check was in flight
                    if self.store.get().as_deref() == Some(checked.as_str()) {
                        self.force_logout();
                    } else {
                        debug!("Rejected token is no longer the stored session");
                    }
                }
                // Only an explicit rejection ends the session
                Err(err) => debug!(error = %err, "Could not validate stored session"),
            },
            AppEvent::DashboardStats(result) => {
                self.dashboard_loading = false;
                match result {
                    Ok(stats) => {
                        self.dashboard_error = None;
                        self.stats = Some(stats);
                    }
                    Err(err) => {
                        self.dashboard_error = self.handle_api_error("Loading statistics", err);
                    }
                }
            }
            AppEvent::RecentUsers(result) => match result {
                Ok(users) => self.recent_users = users,
                Err(err) => {
                    self.handle_api_error("Loading recent users", err);
                }
            },
            AppEvent::Activity(result) => match result {
                Ok(entries) => self.activity = entries,
                Err(err) => {
                    self.handle_api_error("Loading activity", err);
                }
            },
            AppEvent::Shelves(result) => {
                self.shelves_loading = false;
                match result {
                    Ok(shelves) => {
                        self.shelves = shelves;
                        self.clamp_selections();
                    }
                    Err(err) => {
                        self.handle_api_error("Loading shelves", err);
                    }
                }
            }
            AppEvent::ShelfSaved(result) => {
                self.shelf_form.saving = false;
                match result {
                    Ok(created) => {
                        let name = created
                            .map(|s| s.name)
                            .unwrap_or_else(|| self.shelf_form.name.trim().to_string());
                        self.status_message = Some(format!("Saved shelf \"{}\"", name));
                        self.shelf_form = ShelfForm::default();
                        self.state = AppState::Normal;
                        self.load_shelves();
                    }
                    Err(err) => {
                        if let Some(message) = self.handle_api_error("Saving shelf", err) {
                            self.shelf_form.error = Some(message);
                        }
                    }
                }
            }
            AppEvent::ShelfDeleted(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Shelf deleted".to_string());
                    self.load_shelves();
                }
                Err(err) => {
                    self.handle_api_error("Deleting shelf", err);
                }
            },
            AppEvent::Access(result) => match result {
                Ok(entries) => {
                    self.access = entries;
                    self.access_selection = self.access_selection.min(self.access.len().saturating_sub(1));
                }
                Err(err) => {
                    self.handle_api_error("Loading access", err);
                }
            },
            AppEvent::AccessChanged(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Access updated".to_string());
                    self.grant_form = GrantForm::default();
                    if self.state == AppState::GrantingAccess {
                        self.state = AppState::ManagingAccess;
                    }
                    self.load_access();
                }
                Err(err) => {
                    self.handle_api_error("Updating access", err);
                }
            },
            AppEvent::CurrentShelf(result) => match result {
                Ok(shelf) => self.current_shelf = Some(shelf),
                Err(err) => {
                    self.handle_api_error("Loading shelf", err);
                }
            },
            AppEvent::Documents(shelf_id, result) => {
                if self.route != Route::ShelfDocuments(shelf_id) {
                    return;
                }
                self.documents_loading = false;
                match result {
                    Ok(documents) => {
                        self.documents = documents;
                        self.clamp_selections();
                    }
                    Err(err) => {
                        self.handle_api_error("Loading documents", err);
                    }
                }
            }
            AppEvent::UploadProgress(progress) => {
                self.upload_progress = Some(progress);
            }
            AppEvent::UploadFinished(result) => {
                self.uploading = false;
                match result {
                    Ok(document) => {
                        let name = document
                            .map(|d| d.name)
                            .unwrap_or_else(|| self.upload_path.clone());
                        self.status_message = Some(format!("Uploaded {}", name));
                        self.upload_path.clear();
                        if let Route::ShelfDocuments(id) = self.route.clone() {
                            self.load_documents(&id);
                        }
                    }
                    Err(err) => {
                        self.upload_progress = None;
                        self.handle_api_error("Upload", err);
                    }
                }
            }
            AppEvent::DocumentChanged(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Document updated".to_string());
                    if let Route::ShelfDocuments(id) = self.route.clone() {
                        self.load_documents(&id);
                    }
                }
                Err(err) => {
                    self.handle_api_error("Updating document", err);
                }
            },
            AppEvent::ChatDocuments(result) => match result {
                Ok(documents) => {
                    self.chat_documents = documents;
                    self.clamp_selections();
                }
                Err(err) => {
                    self.handle_api_error("Loading documents", err);
                }
            },
            AppEvent::ChatReply(generation, reply) => {
                if generation == self.chat_generation {
                    self.chat.receive_reply(reply);
                } else {
                    debug!("Dropping reply for a replaced conversation");
                }
            }
            AppEvent::Users(result) => {
                self.users_loading = false;
                match result {
                    Ok(users) => {
                        self.users = users;
                        self.clamp_selections();
                    }
                    Err(err) => {
                        self.handle_api_error("Loading users", err);
                    }
                }
            }
            AppEvent::UserDeleted(result) => match result {
                Ok(()) => {
                    self.status_message = Some("User deleted".to_string());
                    self.load_users();
                }
                Err(err) => {
                    self.handle_api_error("Deleting user", err);
                }
            },
        }
    }

    fn remember_username(&mut self) {
        let username = self.login_username.trim().to_string();
        if self.config.last_username.as_deref() == Some(username.as_str()) {
            return;
        }
        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    fn load_dashboard(&mut self) {
        self.dashboard_loading = true;
        self.spawn_request(|api| async move { api.dashboard_stats().await }, AppEvent::DashboardStats);
        self.spawn_request(
            |api| async move { api.recent_users(RECENT_USERS_LIMIT).await },
            AppEvent::RecentUsers,
        );
        self.spawn_request(|api| async move { api.recent_activity().await }, AppEvent::Activity);
    }

    // =========================================================================
    // Shelves
    // =========================================================================

    fn load_shelves(&mut self) {
        self.shelves_loading = true;
        let search = Some(self.search_query.trim().to_string()).filter(|s| !s.is_empty());
        self.spawn_request(
            move |api| async move { api.shelves(search.as_deref()).await },
            AppEvent::Shelves,
        );
    }

    /// Run the current search query against the server.
    pub fn search_shelves(&mut self) {
        self.shelf_selection = 0;
        self.load_shelves();
    }

    /// Shelves shown by the current view: My Shelves hides shared ones, and
    /// the search box filters by name and description as you type.
    pub fn visible_shelves(&self) -> Vec<&Shelf> {
        let query = self.search_query.trim();
        self.shelves
            .iter()
            .filter(|s| self.route != Route::MyShelves || !s.is_shared())
            .filter(|s| query.is_empty() || s.matches(query))
            .collect()
    }

    pub fn selected_shelf(&self) -> Option<&Shelf> {
        self.visible_shelves().get(self.shelf_selection).copied()
    }

    pub fn open_selected_shelf(&mut self) {
        if let Some(id) = self.selected_shelf().map(|s| s.id.clone()) {
            self.navigate(Route::ShelfDocuments(id));
        }
    }

    pub fn open_create_shelf(&mut self) {
        self.shelf_form = ShelfForm::default();
        self.state = AppState::EditingShelf;
    }

    pub fn open_edit_shelf(&mut self) {
        if let Some(form) = self.selected_shelf().map(ShelfForm::edit) {
            self.shelf_form = form;
            self.state = AppState::EditingShelf;
        }
    }

    pub fn submit_shelf_form(&mut self) {
        if self.shelf_form.saving {
            return;
        }
        let shelf = self.shelf_form.to_new_shelf();
        if let Err(message) = shelf.validate() {
            self.shelf_form.error = Some(message);
            return;
        }
        self.shelf_form.error = None;
        self.shelf_form.saving = true;

        match self.shelf_form.editing.clone() {
            Some(id) => self.spawn_request(
                move |api| async move { api.update_shelf(&id, &shelf).await.map(|_| None) },
                AppEvent::ShelfSaved,
            ),
            None => self.spawn_request(
                move |api| async move { api.create_shelf(&shelf).await.map(Some) },
                AppEvent::ShelfSaved,
            ),
        }
    }

    pub fn request_delete_shelf(&mut self) {
        if let Some(shelf) = self.selected_shelf() {
            self.state = AppState::ConfirmingDelete(DeleteTarget::Shelf {
                id: shelf.id.clone(),
                name: shelf.name.clone(),
            });
        }
    }

    /// Open the access panel. Only shared shelves have one.
    pub fn open_access(&mut self) {
        let Some(shelf) = self.selected_shelf().cloned() else {
            return;
        };
        if !shelf.is_shared() {
            self.status_message = Some("Access can only be managed on shared shelves".to_string());
            return;
        }
        self.access_shelf = Some(shelf);
        self.access.clear();
        self.access_selection = 0;
        self.grant_form = GrantForm::default();
        self.state = AppState::ManagingAccess;
        self.load_access();
    }

    fn load_access(&mut self) {
        let Some(id) = self.access_shelf.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        self.spawn_request(move |api| async move { api.shelf_access(&id).await }, AppEvent::Access);
    }

    pub fn submit_grant(&mut self) {
        let Some(id) = self.access_shelf.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        let user_id = self.grant_form.user_id.trim().to_string();
        if user_id.is_empty() {
            self.status_message = Some("Enter a user id to grant access".to_string());
            return;
        }
        let grant = AccessGrant::new(&user_id, self.grant_form.permission_label());
        self.spawn_request(
            move |api| async move { api.grant_shelf_access(&id, &grant).await },
            AppEvent::AccessChanged,
        );
    }

    pub fn revoke_selected_access(&mut self) {
        let Some(id) = self.access_shelf.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        let Some(user_id) = self.access.get(self.access_selection).map(|a| a.user_id.clone()) else {
            return;
        };
        self.spawn_request(
            move |api| async move { api.revoke_shelf_access(&id, &user_id).await },
            AppEvent::AccessChanged,
        );
    }

    // =========================================================================
    // Documents
    // =========================================================================

    fn load_documents(&mut self, shelf_id: &str) {
        if self.current_shelf.as_ref().map(|s| s.id.as_str()) != Some(shelf_id) {
            self.current_shelf = None;
            self.documents.clear();
            self.document_selection = 0;
            self.upload_progress = None;
        }
        self.documents_loading = true;

        let id = shelf_id.to_string();
        self.spawn_request(move |api| async move { api.shelf(&id).await }, AppEvent::CurrentShelf);

        let id = shelf_id.to_string();
        let event_id = id.clone();
        self.spawn_request(
            move |api| async move { api.shelf_documents(&id).await },
            move |result| AppEvent::Documents(event_id, result),
        );
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.documents.get(self.document_selection)
    }

    pub fn open_upload(&mut self) {
        if self.uploading {
            self.status_message = Some("An upload is already in progress".to_string());
            return;
        }
        self.state = AppState::EnteringUploadPath;
    }

    /// Stream the file at `upload_path` into the current shelf.
    pub fn start_upload(&mut self) {
        let Route::ShelfDocuments(shelf_id) = self.route.clone() else {
            return;
        };
        let path = self.upload_path.trim().to_string();
        if path.is_empty() {
            self.status_message = Some("Enter the path of a file to upload".to_string());
            return;
        }
        self.state = AppState::Normal;
        self.uploading = true;
        self.upload_progress = None;
        info!(%path, shelf_id = %shelf_id, "Starting upload");

        let request = UploadRequest::new(path, &shelf_id);
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let token = self.view_token.clone();
        tokio::spawn(async move {
            let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
            let forward_tx = tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    Self::send_event(&forward_tx, AppEvent::UploadProgress(progress)).await;
                }
            });

            let result =
                run_cancellable(&token, api.upload_document(&request, Some(progress_tx))).await;
            // The sender went away with the upload future; let the last
            // progress event land before the result
            if let Err(e) = forwarder.await {
                warn!(error = %e, "Upload progress forwarder failed");
            }
            Self::send_event(&tx, AppEvent::UploadFinished(result)).await;
        });
    }

    pub fn mark_selected(&mut self, status: DocumentStatus) {
        let Some(id) = self.selected_document().map(|d| d.id.clone()) else {
            return;
        };
        self.spawn_request(
            move |api| async move { api.mark_document(&id, status).await },
            AppEvent::DocumentChanged,
        );
    }

    pub fn request_delete_document(&mut self) {
        if let Some(document) = self.selected_document() {
            self.state = AppState::ConfirmingDelete(DeleteTarget::Document {
                id: document.id.clone(),
                name: document.name.clone(),
            });
        }
    }

    /// Open the chat about the selected document.
    pub fn chat_about_selected(&mut self) {
        let Some((id, name)) = self.selected_document().map(|d| (d.id.clone(), d.name.clone())) else {
            return;
        };
        self.reset_chat();
        self.chat.select_document(&id, &name);
        self.chat_focus = ChatFocus::Input;
        self.navigate(Route::Chat);
    }

    // =========================================================================
    // Chat
    // =========================================================================

    fn load_chat_documents(&mut self) {
        self.spawn_request(|api| async move { api.documents().await }, AppEvent::ChatDocuments);
    }

    pub fn select_chat_document(&mut self) {
        let Some((id, name)) = self
            .chat_documents
            .get(self.chat_selection)
            .map(|d| (d.id.clone(), d.name.clone()))
        else {
            return;
        };
        self.reset_chat();
        self.chat.select_document(&id, &name);
        self.chat_input.clear();
        self.chat_focus = ChatFocus::Input;
    }

    pub fn new_chat(&mut self) {
        self.reset_chat();
        self.chat_input.clear();
        self.chat_focus = ChatFocus::Documents;
    }

    /// Send the typed message; the reply arrives after the typing delay.
    pub fn send_chat_message(&mut self) {
        if self.chat.document().is_none() {
            self.status_message = Some("Select a document to chat about".to_string());
            return;
        }
        if self.chat.is_typing() {
            return;
        }
        let Some(prompt) = self.chat.send(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();

        // Tied to the conversation, not the view: the reply lands even if
        // the user looks away, but not after the chat is replaced
        let tx = self.events_tx.clone();
        let token = self.chat_token.clone();
        let generation = self.chat_generation;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Chat reply cancelled"),
                reply = chat::reply_after_delay(prompt) => {
                    Self::send_event(&tx, AppEvent::ChatReply(generation, reply)).await;
                }
            }
        });
    }

    /// Start an empty conversation and abandon any reply still pending.
    fn reset_chat(&mut self) {
        self.chat_token.cancel();
        self.chat_token = CancellationToken::new();
        self.chat_generation += 1;
        self.chat.new_chat();
    }

    // =========================================================================
    // Super admin
    // =========================================================================

    fn load_users(&mut self) {
        self.users_loading = true;
        self.spawn_request(
            |api| async move { api.users(&UserQuery::default()).await },
            AppEvent::Users,
        );
    }

    pub fn request_delete_user(&mut self) {
        if let Some(user) = self.users.get(self.user_selection) {
            self.state = AppState::ConfirmingDelete(DeleteTarget::User {
                id: user.id.clone(),
                name: user.display_name(),
            });
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    pub fn confirm_delete(&mut self) {
        let AppState::ConfirmingDelete(target) = std::mem::replace(&mut self.state, AppState::Normal)
        else {
            return;
        };
        info!(item = %target.describe(), "Deleting");
        match target {
            DeleteTarget::Shelf { id, .. } => self.spawn_request(
                move |api| async move { api.delete_shelf(&id).await },
                AppEvent::ShelfDeleted,
            ),
            DeleteTarget::Document { id, .. } => self.spawn_request(
                move |api| async move { api.delete_document(&id).await },
                AppEvent::DocumentChanged,
            ),
            DeleteTarget::User { id, .. } => self.spawn_request(
                move |api| async move { api.delete_user(&id).await },
                AppEvent::UserDeleted,
            ),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn list_len(&self) -> usize {
        if matches!(self.state, AppState::ManagingAccess) {
            return self.access.len();
        }
        match self.route {
            Route::Shelves | Route::MyShelves => self.visible_shelves().len(),
            Route::ShelfDocuments(_) => self.documents.len(),
            Route::Chat => self.chat_documents.len(),
            Route::SuperAdmin => self.users.len(),
            Route::Dashboard | Route::Login | Route::Signup => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        if matches!(self.state, AppState::ManagingAccess) {
            return Some(&mut self.access_selection);
        }
        match self.route {
            Route::Shelves | Route::MyShelves => Some(&mut self.shelf_selection),
            Route::ShelfDocuments(_) => Some(&mut self.document_selection),
            Route::Chat => Some(&mut self.chat_selection),
            Route::SuperAdmin => Some(&mut self.user_selection),
            Route::Dashboard | Route::Login | Route::Signup => None,
        }
    }

    /// Move the current list's selection by `delta`, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.list_len();
        if let Some(selection) = self.selection_mut() {
            *selection = step_selection(*selection, delta, len);
        }
    }

    pub fn select_first(&mut self) {
        if let Some(selection) = self.selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.list_len();
        if let Some(selection) = self.selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    fn clamp_selections(&mut self) {
        let shelves = self.visible_shelves().len();
        self.shelf_selection = self.shelf_selection.min(shelves.saturating_sub(1));
        self.document_selection = self.document_selection.min(self.documents.len().saturating_sub(1));
        self.chat_selection = self.chat_selection.min(self.chat_documents.len().saturating_sub(1));
        self.user_selection = self.user_selection.min(self.users.len().saturating_sub(1));
    }
}

fn step_selection(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a character may be appended to a free-text field
pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
