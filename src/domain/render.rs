//! HTML rendering of documents.
//!
//! The rendered HTML is stored with every content record as its
//! `htmlContent`. Uses [maud](https://maud.lambda.xyz/), so all text and
//! attribute values are escaped.

use maud::{Markup, html};

use crate::domain::document::{Document, Mark, MarkKind, Node, NodeKind};

/// Render a document to an HTML fragment.
#[must_use]
pub fn render_html(document: &Document) -> String {
    html! {
        @for node in document.content() {
            (render_node(node))
        }
    }
    .into_string()
}

fn render_node(node: &Node) -> Markup {
    let children = html! {
        @for child in &node.content {
            (render_node(child))
        }
    };

    match node.kind {
        NodeKind::Heading => match node.heading_level().unwrap_or(1) {
            0 | 1 => html! { h1 { (children) } },
            2 => html! { h2 { (children) } },
            3 => html! { h3 { (children) } },
            4 => html! { h4 { (children) } },
            5 => html! { h5 { (children) } },
            _ => html! { h6 { (children) } },
        },
        NodeKind::Paragraph => html! { p { (children) } },
        NodeKind::Blockquote => html! { blockquote { (children) } },
        NodeKind::BulletList => html! { ul { (children) } },
        NodeKind::OrderedList => html! { ol { (children) } },
        NodeKind::ListItem => html! { li { (children) } },
        NodeKind::CodeBlock => html! { pre { code { (children) } } },
        NodeKind::HorizontalRule => html! { hr; },
        NodeKind::HardBreak => html! { br; },
        NodeKind::Image => {
            let src = node.attr_str("src").unwrap_or_default();
            let alt = node.attr_str("alt");
            html! { img src=(src) alt=[alt]; }
        }
        NodeKind::Text => render_marks(node.text.as_deref().unwrap_or_default(), &node.marks),
    }
}

/// Wrap text in its marks; the first mark is outermost.
fn render_marks(text: &str, marks: &[Mark]) -> Markup {
    marks
        .iter()
        .rev()
        .fold(html! { (text) }, |inner, mark| match mark.kind {
            MarkKind::Bold => html! { strong { (inner) } },
            MarkKind::Italic => html! { em { (inner) } },
            MarkKind::Underline => html! { u { (inner) } },
            MarkKind::Strike => html! { s { (inner) } },
            MarkKind::Code => html! { code { (inner) } },
            MarkKind::Link => {
                let href = mark.attr_str("href").unwrap_or("#");
                html! { a href=(href) { (inner) } }
            }
        })
}
