//! The effect boundary between editor state and a backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::instrument;

use crate::{
    domain::{
        Config, ContentKind, ContentRecord, Document, Status, TaxonomyKind, TaxonomyOption, User,
    },
    editor::{Action, Debouncer, EditorState, Notification, Options, SaveError},
    storage::Backend,
};

/// The effect boundary around an [`EditorState`].
///
/// Every backend call made by the editor goes through the store, which
/// dispatches the outcome to the state. Failures are recorded as a
/// [`Notification`] and returned to the caller; none of them end the editing
/// session.
///
/// Saves are serialized: a save waits for the one in flight to finish, then
/// builds its payload, so it observes the id assigned by the earlier save.
pub struct EditorStore<B> {
    backend: B,
    config: Config,
    state: Mutex<EditorState>,
    save_gate: tokio::sync::Mutex<()>,
    autosave: Debouncer<Option<User>>,
}

impl<B: Backend> EditorStore<B> {
    /// A store editing new content of the given kind.
    ///
    /// Autosaves are debounced by the configured delay.
    pub fn new(backend: B, kind: ContentKind, config: Config) -> Arc<Self> {
        Arc::new_cyclic(|store: &Weak<Self>| {
            let store = store.clone();
            let autosave = Debouncer::new(config.autosave_delay(), move |user: Option<User>| {
                let store = store.clone();
                async move {
                    if let Some(store) = store.upgrade() {
                        // the failure is recorded as a notification
                        let _ = store.save_content(user.as_ref(), None).await;
                    }
                }
            });

            Self {
                backend,
                config,
                state: Mutex::new(EditorState::new(kind)),
                save_gate: tokio::sync::Mutex::new(()),
                autosave,
            }
        })
    }

    /// The backend the store talks to.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> EditorState {
        self.lock().clone()
    }

    /// Apply an action to the state.
    pub fn dispatch(&self, action: Action) {
        let mut state = self.lock();
        *state = state.clone().reduce(action);
    }

    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the document.
    pub fn set_raw_content(&self, document: Document) {
        self.dispatch(Action::SetRawContent(document));
    }

    /// Replace the tag selection.
    pub fn set_selected_tags(&self, selection: Vec<TaxonomyOption>) {
        self.dispatch(Action::SetSelectedTags(selection));
    }

    /// Replace the theme selection.
    pub fn set_selected_themes(&self, selection: Vec<TaxonomyOption>) {
        self.dispatch(Action::SetSelectedThemes(selection));
    }

    /// Replace the book selection.
    pub fn set_selected_books(&self, selection: Vec<TaxonomyOption>) {
        self.dispatch(Action::SetSelectedBooks(selection));
    }

    /// Change the requested visibility.
    pub fn set_status(&self, status: Status) {
        self.dispatch(Action::SetStatus(status));
    }

    /// Abandon the current content, and any pending autosave.
    pub fn reset(&self) {
        self.autosave.cancel();
        self.dispatch(Action::Reset);
    }

    /// The document's title.
    pub fn title(&self) -> String {
        self.lock().title()
    }

    /// The document's description.
    pub fn description(&self) -> String {
        self.lock().description()
    }

    /// Estimated read time in minutes, at the configured reading speed.
    pub fn read_time(&self) -> u32 {
        self.lock().read_time(self.config.words_per_minute())
    }

    /// The options fetched for this session.
    pub fn options(&self) -> Options {
        self.lock().options().clone()
    }

    /// Fetch every tag, theme, category and book.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fetches fails. The previous options
    /// are kept.
    pub async fn refresh_options(&self) -> Result<(), SaveError> {
        let fetched = tokio::try_join!(
            self.backend.fetch_taxonomy(TaxonomyKind::Tag),
            self.backend.fetch_taxonomy(TaxonomyKind::Theme),
            self.backend.fetch_taxonomy(TaxonomyKind::Category),
            self.backend.fetch_books(),
        );

        match fetched {
            Ok((tags, themes, categories, books)) => {
                tracing::debug!(
                    "Fetched {} tags, {} themes, {} categories and {} books",
                    tags.len(),
                    themes.len(),
                    categories.len(),
                    books.len()
                );
                self.dispatch(Action::OptionsLoaded(Options {
                    tags,
                    themes,
                    categories,
                    books,
                }));
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Load an existing record of the store's kind for editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be fetched. The current content
    /// is kept.
    pub async fn load(&self, id: &str) -> Result<(), SaveError> {
        let kind = self.lock().kind();
        match self.backend.fetch_content(kind, id).await {
            Ok(record) => {
                self.autosave.cancel();
                self.dispatch(Action::Hydrate(record));
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Create a taxonomy option, add it to the session's options, and select
    /// it.
    ///
    /// # Errors
    ///
    /// Fails without calling the backend if there is no user, and otherwise
    /// if the backend rejects the option.
    pub async fn create_option(
        &self,
        kind: TaxonomyKind,
        name: &str,
        user: Option<&User>,
    ) -> Result<TaxonomyOption, SaveError> {
        let Some(user) = user else {
            return Err(self.fail(SaveError::NotAuthenticated));
        };

        match self.backend.create_taxonomy(kind, name, &user.uid).await {
            Ok(option) => {
                tracing::info!("Created {kind} '{}'", option.name);
                self.dispatch(Action::OptionCreated {
                    kind,
                    option: option.clone(),
                });
                Ok(option)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Persist the current content.
    ///
    /// Creates the record on its first save and updates it afterwards. On
    /// success the state adopts the id and taxonomy of the record returned by
    /// the backend. `status_override` replaces the selected status for this
    /// save only.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - there is no user
    /// - the document is invalid
    /// - the content is an article without a selected book
    /// - the backend rejects the save
    ///
    /// Only the last of these makes a network call.
    #[instrument(skip_all, fields(kind = tracing::field::Empty))]
    pub async fn save_content(
        &self,
        user: Option<&User>,
        status_override: Option<Status>,
    ) -> Result<ContentRecord, SaveError> {
        let Some(user) = user else {
            return Err(self.fail(SaveError::NotAuthenticated));
        };

        let _gate = self.save_gate.lock().await;

        let (payload, revision, session) = {
            let state = self.lock();
            tracing::Span::current().record("kind", tracing::field::display(state.kind()));
            let payload = state.payload(user, status_override, self.config.words_per_minute());
            (payload, state.revision(), state.session())
        };
        let payload = payload.map_err(|e| self.fail(e))?;

        self.dispatch(Action::SaveStarted);
        tracing::debug!(
            "Saving {} as {}",
            payload.id.as_deref().unwrap_or("new content"),
            payload.status
        );

        match self.backend.upsert_content(&payload).await {
            Ok(record) => {
                tracing::info!("Saved {} {}", record.kind, record.id);
                self.dispatch(Action::SaveSucceeded {
                    record: record.clone(),
                    revision,
                    session,
                });
                Ok(record)
            }
            Err(e) => {
                let error = SaveError::from(e);
                tracing::warn!("Save failed: {error}");
                self.dispatch(Action::SaveFailed {
                    session,
                    notification: Notification::error(error.user_message()),
                });
                Err(error)
            }
        }
    }

    /// Save after the autosave delay, unless another edit comes first.
    pub fn trigger_delayed_save(&self, user: Option<User>) {
        self.autosave.call(user);
    }

    /// Cancel a pending autosave.
    ///
    /// Returns `true` if one was pending.
    pub fn cancel_delayed_save(&self) -> bool {
        self.autosave.cancel()
    }

    /// Whether an autosave is scheduled and has not started yet.
    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Record a failure for the user, and hand it back.
    fn fail(&self, error: SaveError) -> SaveError {
        if error.is_local() {
            tracing::debug!("{error}");
        } else {
            tracing::warn!("{error}");
        }
        self.dispatch(Action::Notify(Notification::error(error.user_message())));
        error
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for EditorStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };

    use chrono::Utc;

    use super::*;
    use crate::{
        domain::{ContentPayload, Node},
        editor::{GENERIC_ERROR, SaveStatus},
        storage::BackendError,
    };

    /// Records every payload it is sent, and answers like a server would.
    #[derive(Debug, Default)]
    struct MockBackend {
        payloads: Mutex<Vec<ContentPayload>>,
        calls: AtomicUsize,
        fail: AtomicBool,
        /// A tag the server attaches to everything it saves.
        extra_tag: Option<String>,
    }

    impl MockBackend {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn payloads(&self) -> Vec<ContentPayload> {
            self.payloads.lock().unwrap().clone()
        }
    }

    impl Backend for MockBackend {
        async fn fetch_taxonomy(
            &self,
            kind: TaxonomyKind,
        ) -> Result<Vec<TaxonomyOption>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TaxonomyOption::new(format!("{kind}-1"), format!("First {kind}"))])
        }

        async fn create_taxonomy(
            &self,
            kind: TaxonomyKind,
            name: &str,
            _user_uid: &str,
        ) -> Result<TaxonomyOption, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TaxonomyOption::new(format!("{kind}-new"), name))
        }

        async fn fetch_books(&self) -> Result<Vec<TaxonomyOption>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TaxonomyOption::new("b1", "Dune")])
        }

        async fn fetch_content(
            &self,
            _kind: ContentKind,
            id: &str,
        ) -> Result<ContentRecord, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads()
                .last()
                .map(|payload| {
                    ContentRecord::from_payload(id.to_owned(), payload, Utc::now(), Utc::now())
                })
                .ok_or(BackendError::Status {
                    status: 404,
                    message: Some("Not found".to_owned()),
                })
        }

        async fn upsert_content(
            &self,
            payload: &ContentPayload,
        ) -> Result<ContentRecord, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());
            tokio::task::yield_now().await;

            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Status {
                    status: 500,
                    message: None,
                });
            }

            let id = payload
                .id
                .clone()
                .unwrap_or_else(|| format!("r{}", self.payloads.lock().unwrap().len()));
            let now = Utc::now();
            let mut record = ContentRecord::from_payload(id, payload, now, now);
            record.tag_ids.extend(self.extra_tag.clone());
            Ok(record)
        }
    }

    fn user() -> User {
        User::new("u1", "Ada")
    }

    fn document(words: usize) -> Document {
        Document::new(vec![
            Node::heading(1, vec![Node::text("Dune")]),
            Node::paragraph(vec![Node::text(vec!["word"; words].join(" "))]),
        ])
    }

    fn store(backend: MockBackend, kind: ContentKind) -> Arc<EditorStore<MockBackend>> {
        let store = EditorStore::new(backend, kind, Config::default());
        store.set_raw_content(document(10));
        store
    }

    #[tokio::test]
    async fn saving_without_a_user_makes_no_calls() {
        let store = store(MockBackend::default(), ContentKind::Post);

        let result = store.save_content(None, None).await;

        assert!(matches!(result, Err(SaveError::NotAuthenticated)));
        assert_eq!(store.backend().calls(), 0);
        assert_eq!(store.state().id(), None);
        assert_eq!(store.state().save_status(), SaveStatus::Dirty);
        assert_eq!(
            store.state().notification(),
            Some(&Notification::error("You must be signed in to save"))
        );
    }

    #[tokio::test]
    async fn article_without_books_makes_no_calls() {
        let store = store(MockBackend::default(), ContentKind::Article);

        let result = store.save_content(Some(&user()), None).await;

        assert!(matches!(result, Err(SaveError::MissingBook)));
        assert_eq!(store.backend().calls(), 0);
        assert!(store.state().notification().is_some());
    }

    #[tokio::test]
    async fn first_save_creates_and_later_saves_update() {
        let store = store(MockBackend::default(), ContentKind::Post);

        let created = store.save_content(Some(&user()), None).await.unwrap();
        assert_eq!(store.state().id(), Some(created.id.as_str()));
        assert_eq!(store.state().save_status(), SaveStatus::Clean);

        store.set_raw_content(document(300));
        store
            .save_content(Some(&user()), Some(Status::Published))
            .await
            .unwrap();

        let payloads = store.backend().payloads();
        assert_eq!(payloads[0].id, None);
        assert_eq!(payloads[1].id.as_deref(), Some(created.id.as_str()));
        assert_eq!(payloads[1].read_time, 2);
        assert_eq!(payloads[1].status, Status::Published);
        assert_eq!(store.state().status(), Status::Published);
    }

    #[tokio::test]
    async fn server_taxonomy_replaces_the_selection() {
        let backend = MockBackend {
            extra_tag: Some("tag-1".to_owned()),
            ..MockBackend::default()
        };
        let store = store(backend, ContentKind::Article);
        store.refresh_options().await.unwrap();
        store.set_selected_books(store.options().books);

        store.save_content(Some(&user()), None).await.unwrap();

        assert_eq!(
            store.state().selected_tags(),
            &[TaxonomyOption::new("tag-1", "First tag")]
        );
        assert_eq!(store.backend().payloads()[0].tag_ids, Vec::<String>::new());
    }

    #[tokio::test]
    async fn failed_save_keeps_local_state() {
        let backend = MockBackend::default();
        backend.fail.store(true, Ordering::SeqCst);
        let store = store(backend, ContentKind::Post);

        let result = store.save_content(Some(&user()), None).await;

        assert!(matches!(result, Err(SaveError::Backend(_))));
        assert_eq!(store.backend().calls(), 1);
        assert_eq!(store.state().id(), None);
        assert_eq!(store.state().save_status(), SaveStatus::Dirty);
        assert_eq!(
            store.state().notification(),
            Some(&Notification::error(GENERIC_ERROR))
        );
    }

    #[tokio::test]
    async fn concurrent_saves_are_serialized() {
        let store = store(MockBackend::default(), ContentKind::Post);
        let user = user();

        let (first, second) = tokio::join!(
            store.save_content(Some(&user), None),
            store.save_content(Some(&user), None),
        );

        let first = first.unwrap();
        assert_eq!(second.unwrap().id, first.id);
        let payloads = store.backend().payloads();
        assert_eq!(payloads[0].id, None);
        assert_eq!(payloads[1].id.as_deref(), Some(first.id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_coalesces_edits() {
        let store = store(MockBackend::default(), ContentKind::Post);
        let delay = Config::default().autosave_delay();

        for words in 1..=5 {
            store.set_raw_content(document(words));
            store.trigger_delayed_save(Some(user()));
            tokio::time::sleep(delay / 10).await;
        }
        assert!(store.autosave_pending());
        tokio::time::sleep(delay * 2).await;

        assert_eq!(store.backend().calls(), 1);
        assert_eq!(store.state().save_status(), SaveStatus::Clean);
        assert!(!store.autosave_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_uses_the_configured_delay() {
        let mut config = Config::default();
        config.set_autosave_delay(Duration::from_millis(50));
        let store = EditorStore::new(MockBackend::default(), ContentKind::Post, config);
        store.set_raw_content(document(3));

        store.trigger_delayed_save(Some(user()));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.backend().calls(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.backend().calls(), 1);
        assert_eq!(store.backend().payloads()[0].raw_content, document(3));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_the_autosave() {
        let store = store(MockBackend::default(), ContentKind::Post);

        store.trigger_delayed_save(Some(user()));
        store.reset();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(store.backend().calls(), 0);
        assert!(store.state().raw_content().is_empty());
    }

    #[tokio::test]
    async fn created_options_are_selected() {
        let store = store(MockBackend::default(), ContentKind::Post);

        assert!(matches!(
            store.create_option(TaxonomyKind::Tag, "Sci-fi", None).await,
            Err(SaveError::NotAuthenticated)
        ));
        assert_eq!(store.backend().calls(), 0);

        let option = store
            .create_option(TaxonomyKind::Tag, "Sci-fi", Some(&user()))
            .await
            .unwrap();
        assert_eq!(store.state().selected_tags(), &[option.clone()]);
        assert_eq!(store.options().tags, vec![option]);
    }

    #[tokio::test]
    async fn loading_hydrates_the_state() {
        let store = store(MockBackend::default(), ContentKind::Post);
        store.save_content(Some(&user()), None).await.unwrap();
        store.reset();

        store.load("r1").await.unwrap();

        assert_eq!(store.state().id(), Some("r1"));
        assert_eq!(store.title(), "Dune");
        assert_eq!(store.state().save_status(), SaveStatus::Clean);
    }
}
