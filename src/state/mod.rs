use crate::api::{ApiClient, ApiError};
use crate::book::{CollectionError, PageCollection};
use crate::config::{Backend, EnvConfig};
use crate::flip::{FlipController, Navigator};
use crate::models::{Mode, Page, Role, Session};
use crate::persist::{PersistError, Persistence};
use crate::storage;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::set_timeout;
use std::time::Duration;

/// Delay between adding a page and turning to it, so the new page is rendered.
const NAVIGATE_AFTER_APPEND_MS: u64 = 100;

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: EnvConfig,
    pub api_client: RwSignal<ApiClient>,

    /// Signed-in session (remote backend only). Components react to changes here.
    pub session: RwSignal<Option<Session>>,
    /// False until a restored session has been checked with the server.
    pub session_checked: RwSignal<bool>,

    /// `None` until the reader picks a mode (local) or the role is known (remote).
    pub mode: RwSignal<Option<Mode>>,

    pub pages: RwSignal<PageCollection>,
    pub pages_loading: RwSignal<bool>,
    pub pages_error: RwSignal<Option<String>>,
    pages_request_id: RwSignal<u64>,

    /// Failure of an explicit action (add page), shown inline until dismissed.
    pub action_error: RwSignal<Option<String>>,
    /// An added page is still being stored; its number is not in `pages` yet.
    pub append_in_flight: RwSignal<bool>,

    /// Set while a `FlipBook` is mounted.
    pub navigator: RwSignal<Option<FlipController>>,
    /// A title/body field has focus; page-turn shortcuts stay off.
    pub inputs_active: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(EnvConfig::new())
    }

    pub fn with_config(config: EnvConfig) -> Self {
        let mut api_client = ApiClient::from_config(&config);

        let (session, mode) = match config.backend {
            Backend::Local => (None, storage::load_state().mode),
            Backend::Remote => (storage::load_session(), None),
        };
        if let Some(s) = &session {
            api_client.set_token(s.access_token.clone());
        }
        let session_checked = session.is_none();

        Self {
            config,
            api_client: RwSignal::new(api_client),
            session: RwSignal::new(session),
            session_checked: RwSignal::new(session_checked),
            mode: RwSignal::new(mode),
            pages: RwSignal::new(PageCollection::default()),
            pages_loading: RwSignal::new(false),
            pages_error: RwSignal::new(None),
            pages_request_id: RwSignal::new(0),
            action_error: RwSignal::new(None),
            append_in_flight: RwSignal::new(false),
            navigator: RwSignal::new(None),
            inputs_active: RwSignal::new(false),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.config.backend == Backend::Remote
    }

    /// Untracked; read mode until a mode is known.
    pub fn current_mode(&self) -> Mode {
        self.mode.get_untracked().unwrap_or(Mode::Read)
    }

    fn persistence(&self) -> Persistence {
        match self.config.backend {
            Backend::Local => Persistence::Local,
            Backend::Remote => Persistence::Remote(self.api_client.get_untracked()),
        }
    }

    /// Replace the in-memory book with whatever the backend holds.
    ///
    /// A response that arrives after a newer load (or sign-out) is dropped.
    pub fn load_book(&self) {
        let request_id = self.pages_request_id.get_untracked().wrapping_add(1);
        self.pages_request_id.set(request_id);
        self.pages_loading.set(true);
        self.pages_error.set(None);

        let state = self.clone();
        let persistence = self.persistence();
        spawn_local(async move {
            let result = persistence.load_pages().await;
            if state.pages_request_id.get_untracked() != request_id {
                return;
            }
            match result {
                Ok(pages) => {
                    log::debug!("loaded {} pages", pages.len());
                    state.pages.set(PageCollection::from_pages(pages));
                }
                Err(e) => {
                    log::error!("failed to load pages: {e}");
                    state.pages_error.set(Some(e.to_string()));
                    state.handle_failure(&e);
                }
            }
            state.pages_loading.set(false);
        });
    }

    /// Local backend only: remember the reader's choice.
    pub fn choose_mode(&self, mode: Mode) {
        self.mode.set(Some(mode));
        if self.is_remote() {
            return;
        }
        if let Err(e) = storage::save_mode(mode) {
            log::warn!("could not remember mode: {e}");
        }
    }

    /// Add an empty page, persist it, then show it.
    ///
    /// Ignored while an earlier add is unsettled, since both would pick the
    /// same page number.
    pub fn append_page(&self) {
        if self.append_in_flight.get_untracked() {
            log::debug!("add page ignored; previous add still pending");
            return;
        }
        let mut next = self.pages.get_untracked();
        let (index, page) = match next.append_blank(self.current_mode()) {
            Ok(added) => added,
            Err(e) => {
                self.action_error.set(Some(e.to_string()));
                return;
            }
        };
        self.action_error.set(None);
        self.append_in_flight.set(true);

        let state = self.clone();
        let persistence = self.persistence();
        spawn_local(async move {
            let result = persistence.insert_page(next.pages(), &page).await;
            state.append_in_flight.set(false);
            match result {
                Ok(stored) => {
                    let index = state.pages.try_update(|c| c.upsert(stored)).unwrap_or(index);
                    set_timeout(
                        move || {
                            state.jump_to(index as i64);
                        },
                        Duration::from_millis(NAVIGATE_AFTER_APPEND_MS),
                    );
                }
                Err(e) => {
                    log::error!("failed to add page {}: {e}", page.number);
                    state
                        .action_error
                        .set(Some(format!("Could not add page: {e}")));
                    state.handle_failure(&e);
                }
            }
        });
    }

    /// Replace the page at `index` in the visible book and persist it.
    pub fn update_at(&self, index: usize, page: Page) -> Result<(), CollectionError> {
        if !self.current_mode().is_write() {
            return Err(CollectionError::ReadOnly);
        }

        let mut next = self.pages.get_untracked();
        next.update_at(index, page.clone())?;
        let book = next.pages().to_vec();
        self.pages.set(next);

        self.persist_in_background(book, page);
        Ok(())
    }

    /// Persist a page without touching the visible book.
    pub fn autosave(&self, page: Page) -> Result<(), PersistError> {
        if !self.current_mode().is_write() {
            return Err(PersistError::ReadOnly);
        }
        let book = self.pages.with_untracked(|c| c.with_replaced(&page));
        self.persist_in_background(book, page);
        Ok(())
    }

    fn persist_in_background(&self, book: Vec<Page>, page: Page) {
        let state = self.clone();
        let persistence = self.persistence();
        spawn_local(async move {
            if let Err(e) = persistence.save_page(&book, &page).await {
                log::error!("failed to save page {}: {e}", page.number);
                state.handle_failure(&e);
            }
        });
    }

    /// Turn to `target`, clamped into the book. `None` when nothing moved.
    pub fn jump_to(&self, target: i64) -> Option<usize> {
        let nav = self.navigator.get_untracked();
        self.pages
            .with_untracked(|c| c.jump_to(target, nav.as_ref().map(|n| n as &dyn Navigator)))
    }

    pub fn flip_prev(&self) {
        if let Some(nav) = self.navigator.get_untracked() {
            nav.flip_prev();
        }
    }

    pub fn flip_next(&self) {
        if let Some(nav) = self.navigator.get_untracked() {
            nav.flip_next();
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let mut client = self.api_client.get_untracked();
        let session = client.sign_in(email, password).await?;

        if let Err(e) = storage::save_session(&session) {
            log::warn!("could not persist session: {e}");
        }
        client.set_token(session.access_token.clone());
        self.api_client.set(client);
        self.session_checked.set(true);
        self.session.set(Some(session));
        Ok(())
    }

    pub fn sign_out(&self) {
        let client = self.api_client.get_untracked();
        if client.is_authenticated() {
            spawn_local(async move {
                if let Err(e) = client.sign_out().await {
                    log::warn!("sign-out request failed: {e}");
                }
            });
        }
        self.end_session();
    }

    fn end_session(&self) {
        storage::clear_session();
        self.api_client.update(|c| c.clear_token());
        self.pages_request_id.update(|id| *id = id.wrapping_add(1));
        self.session.set(None);
        self.session_checked.set(true);
        self.mode.set(None);
        self.pages.set(PageCollection::default());
        self.pages_loading.set(false);
        self.append_in_flight.set(false);
    }

    /// Confirm the current session, resolve the role into a mode, load pages.
    pub fn start_session(&self) {
        if self.session.get_untracked().is_none() {
            return;
        }
        let client = self.api_client.get_untracked();
        let state = self.clone();
        spawn_local(async move {
            let user = match client.get_user().await {
                Ok(user) => user,
                Err(e) => {
                    log::warn!("stored session rejected: {e}");
                    state.end_session();
                    return;
                }
            };
            state.session_checked.set(true);

            let role = client.load_role(&user.id).await.unwrap_or_else(|e| {
                log::error!("failed to load role for {}: {e}", user.id);
                Role::default()
            });
            log::info!("signed in as {} ({role})", user.email.as_deref().unwrap_or(&user.id));
            state.mode.set(Some(role.mode()));
            state.load_book();
        });
    }

    /// An expired session ends it and sends the reader back to login.
    fn handle_failure(&self, e: &PersistError) {
        if e.is_unauthorized() {
            self.end_session();
            let _ = window().location().set_href("/login");
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
