//! The structured rich-text document produced by the editing surface.
//!
//! A [`Document`] is a tree of typed [`Node`]s in the editor's JSON shape:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Hi"}]}
//! ]}
//! ```
//!
//! Besides the tree itself, this module derives the values stored alongside a
//! piece of content: its title, description and estimated read time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when the document has no heading with text children.
pub const NO_TITLE: &str = "No title";

/// Description used when the document has no paragraph with text children.
pub const NO_DESCRIPTION: &str = "No description";

/// Default reading speed for read time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum DocTag {
    #[default]
    #[serde(rename = "doc")]
    Doc,
}

/// A rich-text document.
///
/// The editor guarantees that the first node is a heading, but nothing else
/// does. Call [`Document::validate`] before persisting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    tag: DocTag,
    #[serde(default)]
    content: Vec<Node>,
}

/// The type of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// A heading, with a `level` attribute between 1 and 6.
    Heading,
    /// A paragraph of inline content.
    Paragraph,
    /// A quotation containing block nodes.
    Blockquote,
    /// An unordered list of list items.
    BulletList,
    /// An ordered list of list items.
    OrderedList,
    /// An item of a bullet or ordered list.
    ListItem,
    /// Preformatted code.
    CodeBlock,
    /// A thematic break.
    HorizontalRule,
    /// A line break inside inline content.
    HardBreak,
    /// An image, with `src` and optional `alt` attributes.
    Image,
    /// A run of text, optionally carrying marks.
    Text,
}

impl NodeKind {
    /// Whether nodes of this kind live inside paragraphs and headings.
    #[must_use]
    pub const fn is_inline(self) -> bool {
        matches!(self, Self::Text | Self::HardBreak)
    }

    /// Whether nodes of this kind hold list items.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::BulletList | Self::OrderedList)
    }
}

/// The type of a [`Mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strike,
    /// Inline code.
    Code,
    /// A hyperlink, with an `href` attribute.
    Link,
}

/// Inline formatting applied to a text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// The kind of formatting.
    #[serde(rename = "type")]
    pub kind: MarkKind,
    /// Mark attributes, such as a link's `href`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl Mark {
    /// A mark without attributes.
    #[must_use]
    pub const fn new(kind: MarkKind) -> Self {
        Self { kind, attrs: None }
    }

    /// A link mark pointing at `href`.
    #[must_use]
    pub fn link(href: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("href".to_owned(), Value::String(href.into()));
        Self {
            kind: MarkKind::Link,
            attrs: Some(attrs),
        }
    }

    /// A string attribute of the mark.
    #[must_use]
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(key)?.as_str()
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The type of the node.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Node attributes, such as a heading's `level`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    /// The text of a text node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Formatting applied to a text node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Node {
    /// A node of the given kind with the given children and no attributes.
    #[must_use]
    pub const fn new(kind: NodeKind, content: Vec<Self>) -> Self {
        Self {
            kind,
            attrs: None,
            content,
            text: None,
            marks: Vec::new(),
        }
    }

    /// A text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text, Vec::new())
        }
    }

    /// A heading of the given level.
    #[must_use]
    pub fn heading(level: u8, content: Vec<Self>) -> Self {
        Self::new(NodeKind::Heading, content).with_attr("level", Value::from(level))
    }

    /// A paragraph.
    #[must_use]
    pub const fn paragraph(content: Vec<Self>) -> Self {
        Self::new(NodeKind::Paragraph, content)
    }

    /// A blockquote.
    #[must_use]
    pub const fn blockquote(content: Vec<Self>) -> Self {
        Self::new(NodeKind::Blockquote, content)
    }

    /// Set an attribute, replacing any previous value.
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(key.to_owned(), value);
        self
    }

    /// Add a mark to a text node.
    #[must_use]
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// A string attribute of the node.
    #[must_use]
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(key)?.as_str()
    }

    /// The level of a heading, if the attribute is present and numeric.
    #[must_use]
    pub fn heading_level(&self) -> Option<u64> {
        self.attrs.as_ref()?.get("level")?.as_u64()
    }

    /// The concatenated text of the node's direct text children.
    ///
    /// Returns `None` when the node has no text children at all. Text nested
    /// deeper than one level is ignored.
    #[must_use]
    pub fn direct_text(&self) -> Option<String> {
        let mut texts = self
            .content
            .iter()
            .filter(|child| child.kind == NodeKind::Text)
            .peekable();
        texts.peek()?;
        Some(texts.filter_map(|child| child.text.as_deref()).collect())
    }

    /// All text below this node.
    ///
    /// Inline children are concatenated; block children are separated by a
    /// single space.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self.kind {
            NodeKind::Text => self.text.clone().unwrap_or_default(),
            NodeKind::HardBreak => " ".to_owned(),
            _ if self.content.iter().any(|child| child.kind.is_inline()) => {
                self.content.iter().map(Self::plain_text).collect()
            }
            _ => self
                .content
                .iter()
                .map(Self::plain_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn validate(&self, parent: Option<NodeKind>, path: &str) -> Result<(), DocumentError> {
        match self.kind {
            NodeKind::Text => {
                if !self.content.is_empty() {
                    return Err(DocumentError::TextWithChildren(path.to_owned()));
                }
                if self.text.as_deref().is_none_or(str::is_empty) {
                    return Err(DocumentError::EmptyText(path.to_owned()));
                }
            }
            NodeKind::Heading if !matches!(self.heading_level(), Some(1..=6)) => {
                return Err(DocumentError::InvalidHeadingLevel(path.to_owned()));
            }
            NodeKind::ListItem if !parent.is_some_and(NodeKind::is_list) => {
                return Err(DocumentError::OrphanListItem(path.to_owned()));
            }
            kind if kind.is_list() => {
                if let Some(child) = self
                    .content
                    .iter()
                    .find(|child| child.kind != NodeKind::ListItem)
                {
                    return Err(DocumentError::InvalidListChild {
                        path: path.to_owned(),
                        kind: child.kind,
                    });
                }
            }
            _ => {}
        }

        for (index, child) in self.content.iter().enumerate() {
            child.validate(Some(self.kind), &format!("{path}/{index}"))?;
        }
        Ok(())
    }
}

/// Structural problems found by [`Document::validate`].
///
/// Paths are `/`-separated child indices from the document root.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The document has no nodes.
    #[error("the document is empty")]
    Empty,
    /// The first node is not a heading.
    #[error("the document must start with a heading, found {0:?}")]
    FirstNodeNotHeading(NodeKind),
    /// An inline node sits directly in the document.
    #[error("{kind:?} node at {path} must be inside a paragraph or heading")]
    MisplacedInline {
        /// Location of the node.
        path: String,
        /// The kind of the misplaced node.
        kind: NodeKind,
    },
    /// A text node has no text.
    #[error("text node at {0} has no text")]
    EmptyText(String),
    /// A text node has children.
    #[error("text node at {0} has children")]
    TextWithChildren(String),
    /// A heading level is missing or outside 1..=6.
    #[error("heading at {0} has no valid level")]
    InvalidHeadingLevel(String),
    /// A list item is not inside a list.
    #[error("list item at {0} is not inside a list")]
    OrphanListItem(String),
    /// A list holds something other than list items.
    #[error("list at {path} contains a {kind:?} node")]
    InvalidListChild {
        /// Location of the list.
        path: String,
        /// The kind of the offending child.
        kind: NodeKind,
    },
}

impl Document {
    /// A document with the given top-level nodes.
    #[must_use]
    pub const fn new(content: Vec<Node>) -> Self {
        Self {
            tag: DocTag::Doc,
            content,
        }
    }

    /// The top-level nodes.
    #[must_use]
    pub fn content(&self) -> &[Node] {
        &self.content
    }

    /// Whether the document has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn first_of(&self, kind: NodeKind) -> Option<&Node> {
        self.content.iter().find(|node| node.kind == kind)
    }

    /// The text of the first heading, or [`NO_TITLE`].
    #[must_use]
    pub fn title(&self) -> String {
        self.first_of(NodeKind::Heading)
            .and_then(Node::direct_text)
            .unwrap_or_else(|| NO_TITLE.to_owned())
    }

    /// The text of the first paragraph, or [`NO_DESCRIPTION`].
    #[must_use]
    pub fn description(&self) -> String {
        self.first_of(NodeKind::Paragraph)
            .and_then(Node::direct_text)
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned())
    }

    /// Words in the top-level headings, paragraphs and blockquotes.
    ///
    /// Text is split on single spaces; empty tokens are not words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        let text = self
            .content
            .iter()
            .filter(|node| {
                matches!(
                    node.kind,
                    NodeKind::Heading | NodeKind::Paragraph | NodeKind::Blockquote
                )
            })
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join(" ");

        text.split(' ').filter(|word| !word.is_empty()).count()
    }

    /// Estimated read time in whole minutes, rounded up.
    ///
    /// An empty document takes 0 minutes.
    #[must_use]
    pub fn read_time(&self, words_per_minute: usize) -> u32 {
        let minutes = self.word_count().div_ceil(words_per_minute.max(1));
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    /// Check the structure of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found, see [`DocumentError`].
    pub fn validate(&self) -> Result<(), DocumentError> {
        let first = self.content.first().ok_or(DocumentError::Empty)?;
        if first.kind != NodeKind::Heading {
            return Err(DocumentError::FirstNodeNotHeading(first.kind));
        }

        for (index, node) in self.content.iter().enumerate() {
            let path = index.to_string();
            if node.kind.is_inline() {
                return Err(DocumentError::MisplacedInline {
                    path,
                    kind: node.kind,
                });
            }
            node.validate(None, &path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn words(count: usize) -> String {
        vec!["word"; count].join(" ")
    }

    #[test]
    fn title_concatenates_direct_text_children() {
        let document = Document::new(vec![Node::heading(
            1,
            vec![Node::text("Hi"), Node::text(" there")],
        )]);
        assert_eq!(document.title(), "Hi there");
    }

    #[test]
    fn title_falls_back_without_heading() {
        let document = Document::new(vec![Node::paragraph(vec![Node::text("body")])]);
        assert_eq!(document.title(), NO_TITLE);
    }

    #[test]
    fn title_falls_back_for_heading_without_text() {
        let document = Document::new(vec![Node::heading(1, Vec::new())]);
        assert_eq!(document.title(), NO_TITLE);
    }

    #[test]
    fn title_ignores_nested_structure() {
        let nested = Node::new(NodeKind::Paragraph, vec![Node::text("deep")]);
        let document = Document::new(vec![Node::heading(2, vec![nested, Node::text("top")])]);
        assert_eq!(document.title(), "top");
    }

    #[test]
    fn description_uses_first_paragraph() {
        let document = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("First "), Node::text("para")]),
            Node::paragraph(vec![Node::text("Second")]),
        ]);
        assert_eq!(document.description(), "First para");
    }

    #[test]
    fn description_falls_back_without_paragraph() {
        let document = Document::new(vec![Node::heading(1, vec![Node::text("Title")])]);
        assert_eq!(document.description(), NO_DESCRIPTION);
    }

    #[test_case(0, 0 ; "empty document")]
    #[test_case(1, 1 ; "single word")]
    #[test_case(200, 1 ; "exactly one minute")]
    #[test_case(201, 2 ; "one word over")]
    #[test_case(400, 2 ; "exactly two minutes")]
    fn read_time_rounds_up(word_count: usize, minutes: u32) {
        let content = if word_count == 0 {
            Vec::new()
        } else {
            let heading_words = word_count.min(3);
            let mut content = vec![Node::heading(1, vec![Node::text(words(heading_words))])];
            if word_count > heading_words {
                content.push(Node::paragraph(vec![Node::text(words(
                    word_count - heading_words,
                ))]));
            }
            content
        };
        let document = Document::new(content);

        assert_eq!(document.word_count(), word_count);
        assert_eq!(document.read_time(WORDS_PER_MINUTE), minutes);
    }

    #[test]
    fn word_count_includes_blockquotes_but_not_lists() {
        let document = Document::new(vec![
            Node::heading(1, vec![Node::text("one two")]),
            Node::blockquote(vec![
                Node::paragraph(vec![Node::text("three")]),
                Node::paragraph(vec![Node::text("four")]),
            ]),
            Node::new(
                NodeKind::BulletList,
                vec![Node::new(
                    NodeKind::ListItem,
                    vec![Node::paragraph(vec![Node::text("ignored")])],
                )],
            ),
        ]);
        assert_eq!(document.word_count(), 4);
    }

    #[test]
    fn repeated_spaces_are_not_words() {
        let document = Document::new(vec![Node::paragraph(vec![Node::text("a  b   c ")])]);
        assert_eq!(document.word_count(), 3);
    }

    #[test]
    fn parses_editor_json() {
        let document: Document = serde_json::from_value(json!({
            "type": "doc",
            "content": [
                {
                    "type": "heading",
                    "attrs": {"level": 1},
                    "content": [{"type": "text", "text": "Dune"}]
                },
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "A "},
                    {"type": "text", "text": "classic", "marks": [{"type": "bold"}]}
                ]}
            ]
        }))
        .unwrap();

        assert_eq!(document.title(), "Dune");
        assert_eq!(document.description(), "A classic");
        assert!(document.validate().is_ok());
    }

    #[test]
    fn unknown_node_types_fail_to_parse() {
        let result: Result<Document, _> = serde_json::from_value(json!({
            "type": "doc",
            "content": [{"type": "video"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_empty_document() {
        assert_eq!(Document::default().validate(), Err(DocumentError::Empty));
    }

    #[test]
    fn validate_requires_leading_heading() {
        let document = Document::new(vec![Node::paragraph(vec![Node::text("body")])]);
        assert_eq!(
            document.validate(),
            Err(DocumentError::FirstNodeNotHeading(NodeKind::Paragraph))
        );
    }

    #[test]
    fn validate_rejects_bad_heading_level() {
        let document = Document::new(vec![Node::heading(7, vec![Node::text("Title")])]);
        assert_eq!(
            document.validate(),
            Err(DocumentError::InvalidHeadingLevel("0".to_owned()))
        );
    }

    #[test]
    fn validate_rejects_top_level_text() {
        let document = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::text("loose"),
        ]);
        assert_eq!(
            document.validate(),
            Err(DocumentError::MisplacedInline {
                path: "1".to_owned(),
                kind: NodeKind::Text,
            })
        );
    }

    #[test]
    fn validate_rejects_empty_text_nodes() {
        let document = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("")]),
        ]);
        assert_eq!(
            document.validate(),
            Err(DocumentError::EmptyText("1/0".to_owned()))
        );
    }

    #[test]
    fn validate_checks_list_structure() {
        let orphan = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::new(NodeKind::ListItem, Vec::new()),
        ]);
        assert_eq!(
            orphan.validate(),
            Err(DocumentError::OrphanListItem("1".to_owned()))
        );

        let mixed = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::new(
                NodeKind::OrderedList,
                vec![Node::paragraph(vec![Node::text("x")])],
            ),
        ]);
        assert_eq!(
            mixed.validate(),
            Err(DocumentError::InvalidListChild {
                path: "1".to_owned(),
                kind: NodeKind::Paragraph,
            })
        );
    }
}
