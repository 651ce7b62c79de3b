//! The editor's state and the pure transitions between states.
//!
//! [`EditorState::reduce`] never performs I/O. Network calls live in
//! [`crate::editor::EditorStore`], which dispatches [`Action`]s describing
//! their outcomes.

use nonempty::NonEmpty;

use crate::domain::{
    BookIds, ContentKind, ContentPayload, ContentRecord, Document, Status, TaxonomyKind,
    TaxonomyOption, User, render_html,
};
use crate::editor::SaveError;

/// Whether the editor has changes that are not yet persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStatus {
    /// Everything is persisted.
    #[default]
    Clean,
    /// There are unsaved edits.
    Dirty,
    /// A save is in flight.
    Saving,
}

/// How prominent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something failed.
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// How prominent the message is.
    pub level: NotificationLevel,
    /// The text to show.
    pub message: String,
}

impl Notification {
    /// An informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// An error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// The options fetched for an editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Every tag.
    pub tags: Vec<TaxonomyOption>,
    /// Every theme.
    pub themes: Vec<TaxonomyOption>,
    /// Every category.
    pub categories: Vec<TaxonomyOption>,
    /// Every book, projected to options.
    pub books: Vec<TaxonomyOption>,
}

impl Options {
    /// The options of one taxonomy.
    #[must_use]
    pub fn of(&self, kind: TaxonomyKind) -> &[TaxonomyOption] {
        match kind {
            TaxonomyKind::Tag => &self.tags,
            TaxonomyKind::Theme => &self.themes,
            TaxonomyKind::Category => &self.categories,
        }
    }

    const fn of_mut(&mut self, kind: TaxonomyKind) -> &mut Vec<TaxonomyOption> {
        match kind {
            TaxonomyKind::Tag => &mut self.tags,
            TaxonomyKind::Theme => &mut self.themes,
            TaxonomyKind::Category => &mut self.categories,
        }
    }
}

/// Rebuild a selection from ids, taking names from the known options.
///
/// An id that matches no option keeps the id as its name.
fn resolve(
    ids: &[String],
    options: &[TaxonomyOption],
    selected: &[TaxonomyOption],
) -> Vec<TaxonomyOption> {
    ids.iter()
        .map(|id| {
            options
                .iter()
                .chain(selected)
                .find(|option| &option.id == id)
                .cloned()
                .unwrap_or_else(|| TaxonomyOption::new(id.clone(), id.clone()))
        })
        .collect()
}

fn ids(selection: &[TaxonomyOption]) -> Vec<String> {
    selection.iter().map(|option| option.id.clone()).collect()
}

/// Something that happened to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The document was edited.
    SetRawContent(Document),
    /// The tag selection changed.
    SetSelectedTags(Vec<TaxonomyOption>),
    /// The theme selection changed.
    SetSelectedThemes(Vec<TaxonomyOption>),
    /// The book selection changed.
    SetSelectedBooks(Vec<TaxonomyOption>),
    /// The requested visibility changed.
    SetStatus(Status),
    /// The session's options were fetched.
    OptionsLoaded(Options),
    /// A taxonomy option was created, and should be selected.
    OptionCreated {
        /// The taxonomy the option belongs to.
        kind: TaxonomyKind,
        /// The new option.
        option: TaxonomyOption,
    },
    /// An existing record was loaded for editing.
    Hydrate(ContentRecord),
    /// The editor was left; start over with empty content.
    Reset,
    /// A save request was sent.
    SaveStarted,
    /// The backend accepted a save.
    SaveSucceeded {
        /// The canonical record returned by the backend.
        record: ContentRecord,
        /// The revision the saved payload was built from.
        revision: u64,
        /// The session the save was started in.
        session: u64,
    },
    /// The backend rejected a save.
    SaveFailed {
        /// The session the save was started in.
        session: u64,
        /// What to tell the user.
        notification: Notification,
    },
    /// Show a message.
    Notify(Notification),
    /// Hide the current message.
    Dismiss,
}

/// The state of one editor.
///
/// Edits bump a revision counter. A save remembers the revision its payload
/// was built from, so a save that completes after further edits leaves the
/// state [`SaveStatus::Dirty`]. Hydrating or resetting starts a new session;
/// save results from an earlier session are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    kind: ContentKind,
    id: Option<String>,
    raw_content: Document,
    status: Status,
    selected_tags: Vec<TaxonomyOption>,
    selected_themes: Vec<TaxonomyOption>,
    selected_books: Vec<TaxonomyOption>,
    options: Options,
    save_status: SaveStatus,
    revision: u64,
    session: u64,
    notification: Option<Notification>,
}

impl EditorState {
    /// An empty editor for new content.
    #[must_use]
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            id: None,
            raw_content: Document::default(),
            status: Status::Draft,
            selected_tags: Vec::new(),
            selected_themes: Vec::new(),
            selected_books: Vec::new(),
            options: Options::default(),
            save_status: SaveStatus::Clean,
            revision: 0,
            session: 0,
            notification: None,
        }
    }

    /// Apply an action, returning the next state.
    #[must_use]
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SetRawContent(document) => {
                self.raw_content = document;
                self.touch();
            }
            Action::SetSelectedTags(selection) => {
                self.selected_tags = selection;
                self.touch();
            }
            Action::SetSelectedThemes(selection) => {
                self.selected_themes = selection;
                self.touch();
            }
            Action::SetSelectedBooks(selection) => {
                self.selected_books = selection;
                self.touch();
            }
            Action::SetStatus(status) => {
                self.status = status;
                self.touch();
            }
            Action::OptionsLoaded(options) => self.options = options,
            Action::OptionCreated { kind, option } => {
                let options = self.options.of_mut(kind);
                if !options.contains(&option) {
                    options.push(option.clone());
                }
                let selection = match kind {
                    TaxonomyKind::Tag => Some(&mut self.selected_tags),
                    TaxonomyKind::Theme => Some(&mut self.selected_themes),
                    TaxonomyKind::Category => None,
                };
                if let Some(selection) =
                    selection.filter(|selection| !selection.contains(&option))
                {
                    selection.push(option);
                    self.touch();
                }
            }
            Action::Hydrate(record) => {
                let selected_tags = resolve(&record.tag_ids, &self.options.tags, &[]);
                let selected_themes = resolve(record.theme_ids(), &self.options.themes, &[]);
                let selected_books = resolve(record.book_ids(), &self.options.books, &[]);
                self = Self {
                    kind: record.kind,
                    id: Some(record.id),
                    raw_content: record.raw_content,
                    status: record.status,
                    selected_tags,
                    selected_themes,
                    selected_books,
                    options: self.options,
                    save_status: SaveStatus::Clean,
                    revision: self.revision,
                    session: self.session + 1,
                    notification: None,
                };
            }
            Action::Reset => {
                self = Self {
                    options: self.options,
                    revision: self.revision,
                    session: self.session + 1,
                    ..Self::new(self.kind)
                };
            }
            Action::SaveStarted => self.save_status = SaveStatus::Saving,
            Action::SaveSucceeded {
                record,
                revision,
                session,
            } => {
                if session != self.session {
                    return self;
                }
                self.selected_tags =
                    resolve(&record.tag_ids, &self.options.tags, &self.selected_tags);
                self.selected_themes =
                    resolve(record.theme_ids(), &self.options.themes, &self.selected_themes);
                self.selected_books =
                    resolve(record.book_ids(), &self.options.books, &self.selected_books);
                self.id = Some(record.id);
                self.status = record.status;
                self.save_status = if revision == self.revision {
                    SaveStatus::Clean
                } else {
                    SaveStatus::Dirty
                };
            }
            Action::SaveFailed {
                session,
                notification,
            } => {
                if session == self.session {
                    self.save_status = SaveStatus::Dirty;
                }
                self.notification = Some(notification);
            }
            Action::Notify(notification) => self.notification = Some(notification),
            Action::Dismiss => self.notification = None,
        }
        self
    }

    fn touch(&mut self) {
        self.revision += 1;
        if self.save_status == SaveStatus::Clean {
            self.save_status = SaveStatus::Dirty;
        }
    }

    /// Build the payload persisting the current state.
    ///
    /// `status_override` replaces the selected status for this save only.
    ///
    /// # Errors
    ///
    /// Fails if the document is invalid, or if the content is an article
    /// without a selected book.
    pub fn payload(
        &self,
        user: &User,
        status_override: Option<Status>,
        words_per_minute: usize,
    ) -> Result<ContentPayload, SaveError> {
        self.raw_content.validate()?;

        let book_ids = match self.kind {
            ContentKind::Article => {
                let books = NonEmpty::from_vec(ids(&self.selected_books))
                    .ok_or(SaveError::MissingBook)?;
                Some(BookIds::Many(books.into()))
            }
            ContentKind::Review => self
                .selected_books
                .first()
                .map(|book| BookIds::One(book.id.clone())),
            ContentKind::Post => None,
        };

        Ok(ContentPayload {
            id: self.id.clone(),
            kind: self.kind,
            title: self.title(),
            description: self.description(),
            raw_content: self.raw_content.clone(),
            html_content: self.html(),
            status: status_override.unwrap_or(self.status),
            tag_ids: ids(&self.selected_tags),
            theme_ids: self.kind.has_themes().then(|| ids(&self.selected_themes)),
            book_ids,
            read_time: self.read_time(words_per_minute),
            user_uid: user.uid.clone(),
        })
    }

    /// The kind of content being edited.
    #[must_use]
    pub const fn kind(&self) -> ContentKind {
        self.kind
    }

    /// The persisted id, if the content has been saved.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The document being edited.
    #[must_use]
    pub const fn raw_content(&self) -> &Document {
        &self.raw_content
    }

    /// The selected visibility.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Selected tags.
    #[must_use]
    pub fn selected_tags(&self) -> &[TaxonomyOption] {
        &self.selected_tags
    }

    /// Selected themes.
    #[must_use]
    pub fn selected_themes(&self) -> &[TaxonomyOption] {
        &self.selected_themes
    }

    /// Selected books.
    #[must_use]
    pub fn selected_books(&self) -> &[TaxonomyOption] {
        &self.selected_books
    }

    /// The options fetched for this session.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Whether there are unsaved edits, or a save in flight.
    #[must_use]
    pub const fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    /// Incremented by every edit.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Incremented whenever the editor switches to other content.
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// The current message for the user.
    #[must_use]
    pub const fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// The document's title.
    #[must_use]
    pub fn title(&self) -> String {
        self.raw_content.title()
    }

    /// The document's description.
    #[must_use]
    pub fn description(&self) -> String {
        self.raw_content.description()
    }

    /// Estimated read time in minutes.
    #[must_use]
    pub fn read_time(&self, words_per_minute: usize) -> u32 {
        self.raw_content.read_time(words_per_minute)
    }

    /// The document rendered to HTML.
    #[must_use]
    pub fn html(&self) -> String {
        render_html(&self.raw_content)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Node, document::WORDS_PER_MINUTE};

    fn user() -> User {
        User::new("u1", "Ada")
    }

    fn document() -> Document {
        Document::new(vec![
            Node::heading(1, vec![Node::text("Dune")]),
            Node::paragraph(vec![Node::text("A desert planet")]),
        ])
    }

    fn option(id: &str, name: &str) -> TaxonomyOption {
        TaxonomyOption::new(id, name)
    }

    fn record(payload: &ContentPayload, id: &str) -> ContentRecord {
        let now = Utc::now();
        ContentRecord::from_payload(id.to_owned(), payload, now, now)
    }

    fn edited(kind: ContentKind) -> EditorState {
        EditorState::new(kind).reduce(Action::SetRawContent(document()))
    }

    #[test]
    fn new_state_is_clean_and_unsaved() {
        let state = EditorState::new(ContentKind::Post);
        assert_eq!(state.save_status(), SaveStatus::Clean);
        assert_eq!(state.id(), None);
        assert_eq!(state.title(), "No title");
        assert_eq!(state.read_time(WORDS_PER_MINUTE), 0);
    }

    #[test]
    fn edits_mark_the_state_dirty() {
        let state = edited(ContentKind::Post);
        assert_eq!(state.save_status(), SaveStatus::Dirty);
        assert_eq!(state.revision(), 1);

        let state = state.reduce(Action::SetSelectedTags(vec![option("t1", "Sci-fi")]));
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn article_without_books_is_rejected() {
        let state = edited(ContentKind::Article);
        assert!(matches!(
            state.payload(&user(), None, WORDS_PER_MINUTE),
            Err(SaveError::MissingBook)
        ));
    }

    #[test]
    fn invalid_document_is_rejected() {
        let state = EditorState::new(ContentKind::Post).reduce(Action::SetRawContent(
            Document::new(vec![Node::paragraph(vec![Node::text("no heading")])]),
        ));
        assert!(matches!(
            state.payload(&user(), None, WORDS_PER_MINUTE),
            Err(SaveError::InvalidDocument(_))
        ));
    }

    #[test]
    fn payload_shape_follows_kind() {
        let books = vec![option("b1", "Dune"), option("b2", "Solaris")];

        let review = edited(ContentKind::Review)
            .reduce(Action::SetSelectedBooks(books.clone()))
            .reduce(Action::SetSelectedThemes(vec![option("th1", "Power")]))
            .payload(&user(), None, WORDS_PER_MINUTE)
            .unwrap();
        assert_eq!(review.book_ids, Some(BookIds::One("b1".to_owned())));
        assert_eq!(review.theme_ids, None);

        let article = edited(ContentKind::Article)
            .reduce(Action::SetSelectedBooks(books))
            .reduce(Action::SetSelectedThemes(vec![option("th1", "Power")]))
            .payload(&user(), Some(Status::Published), WORDS_PER_MINUTE)
            .unwrap();
        assert_eq!(
            article.book_ids,
            Some(BookIds::Many(vec!["b1".to_owned(), "b2".to_owned()]))
        );
        assert_eq!(article.theme_ids, Some(vec!["th1".to_owned()]));
        assert_eq!(article.status, Status::Published);
        assert_eq!(article.title, "Dune");
        assert_eq!(article.description, "A desert planet");
        assert_eq!(article.html_content, "<h1>Dune</h1><p>A desert planet</p>");
        assert_eq!(article.read_time, 1);
        assert_eq!(article.user_uid, "u1");
        assert_eq!(article.id, None);
    }

    #[test]
    fn successful_save_adopts_server_ids() {
        let state = edited(ContentKind::Post)
            .reduce(Action::OptionsLoaded(Options {
                tags: vec![option("t1", "Sci-fi"), option("t2", "Classic")],
                ..Options::default()
            }))
            .reduce(Action::SetSelectedTags(vec![option("t1", "Sci-fi")]));
        let payload = state.payload(&user(), None, WORDS_PER_MINUTE).unwrap();
        let mut saved = record(&payload, "r1");
        saved.tag_ids.push("t2".to_owned());
        saved.tag_ids.push("t3".to_owned());

        let revision = state.revision();
        let session = state.session();
        let state = state.reduce(Action::SaveStarted).reduce(Action::SaveSucceeded {
            record: saved,
            revision,
            session,
        });

        assert_eq!(state.id(), Some("r1"));
        assert_eq!(state.save_status(), SaveStatus::Clean);
        assert_eq!(
            state.selected_tags(),
            &[
                option("t1", "Sci-fi"),
                option("t2", "Classic"),
                option("t3", "t3")
            ]
        );
    }

    #[test]
    fn edits_during_a_save_stay_dirty() {
        let state = edited(ContentKind::Post);
        let payload = state.payload(&user(), None, WORDS_PER_MINUTE).unwrap();
        let revision = state.revision();
        let session = state.session();

        let state = state.reduce(Action::SaveStarted);
        assert_eq!(state.save_status(), SaveStatus::Saving);

        let state = state
            .reduce(Action::SetStatus(Status::Published))
            .reduce(Action::SaveSucceeded {
                record: record(&payload, "r1"),
                revision,
                session,
            });
        assert_eq!(state.save_status(), SaveStatus::Dirty);
        assert_eq!(state.id(), Some("r1"));
    }

    #[test]
    fn failed_save_keeps_local_state() {
        let state = edited(ContentKind::Post);
        let session = state.session();
        let before = state.clone();

        let state = state.reduce(Action::SaveStarted).reduce(Action::SaveFailed {
            session,
            notification: Notification::error("Something went wrong"),
        });

        assert_eq!(state.save_status(), SaveStatus::Dirty);
        assert_eq!(state.id(), None);
        assert_eq!(state.raw_content(), before.raw_content());
        assert_eq!(
            state.notification(),
            Some(&Notification::error("Something went wrong"))
        );
    }

    #[test]
    fn results_from_an_earlier_session_are_ignored() {
        let state = edited(ContentKind::Post);
        let payload = state.payload(&user(), None, WORDS_PER_MINUTE).unwrap();
        let revision = state.revision();
        let session = state.session();

        let state = state
            .reduce(Action::SaveStarted)
            .reduce(Action::Reset)
            .reduce(Action::SaveSucceeded {
                record: record(&payload, "r1"),
                revision,
                session,
            });

        assert_eq!(state.id(), None);
        assert_eq!(state.save_status(), SaveStatus::Clean);
        assert!(state.raw_content().is_empty());
    }

    #[test]
    fn hydrate_resolves_names_from_options() {
        let state = edited(ContentKind::Article)
            .reduce(Action::OptionsLoaded(Options {
                themes: vec![option("th1", "Power")],
                books: vec![option("b1", "Dune")],
                ..Options::default()
            }))
            .reduce(Action::SetSelectedBooks(vec![option("b1", "Dune")]));
        let mut payload = state.payload(&user(), None, WORDS_PER_MINUTE).unwrap();
        payload.theme_ids = Some(vec!["th1".to_owned()]);
        payload.status = Status::Published;

        let state = EditorState::new(ContentKind::Post)
            .reduce(Action::OptionsLoaded(state.options().clone()))
            .reduce(Action::Hydrate(record(&payload, "a1")));

        assert_eq!(state.kind(), ContentKind::Article);
        assert_eq!(state.id(), Some("a1"));
        assert_eq!(state.status(), Status::Published);
        assert_eq!(state.save_status(), SaveStatus::Clean);
        assert_eq!(state.selected_themes(), &[option("th1", "Power")]);
        assert_eq!(state.selected_books(), &[option("b1", "Dune")]);
        assert_eq!(state.title(), "Dune");
    }

    #[test]
    fn reset_keeps_kind_and_options() {
        let options = Options {
            tags: vec![option("t1", "Sci-fi")],
            ..Options::default()
        };
        let state = edited(ContentKind::Review)
            .reduce(Action::OptionsLoaded(options.clone()))
            .reduce(Action::Reset);

        assert_eq!(state.kind(), ContentKind::Review);
        assert_eq!(state.options(), &options);
        assert!(state.raw_content().is_empty());
        assert_eq!(state.session(), 1);
    }

    #[test]
    fn created_options_are_selected() {
        let state = EditorState::new(ContentKind::Article).reduce(Action::OptionCreated {
            kind: TaxonomyKind::Theme,
            option: option("th1", "Power"),
        });
        assert_eq!(state.options().themes, vec![option("th1", "Power")]);
        assert_eq!(state.selected_themes(), &[option("th1", "Power")]);

        let state = state.reduce(Action::OptionCreated {
            kind: TaxonomyKind::Category,
            option: option("c1", "Fiction"),
        });
        assert_eq!(state.options().categories, vec![option("c1", "Fiction")]);
        assert!(state.selected_tags().is_empty());
    }
}
