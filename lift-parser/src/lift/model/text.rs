//! Rich text with embedded spans.
//!
//! The markup interleaves character data and `span` elements. The model flattens that into
//! one string plus a tree of spans addressing byte ranges of it, which keeps plain-text access
//! cheap and the spans easy to query.

use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::markup::Node;
use crate::lift::scalar::{Key, Lang, ScalarKind, Url};
use crate::lift::schema::{Cardinality, FieldSchema, TypeSchema};
use crate::lift::serializing::Emitter;
use crate::lift::version::LiftVersion;
use std::fmt;

pub const TEXT_SCHEMA: TypeSchema =
    TypeSchema::new("text", &[&[FieldSchema::mixed("content", &["span"])]]);

pub const SPAN_SCHEMA: TypeSchema = TypeSchema::new(
    "span",
    &[&[
        FieldSchema::attribute("lang", Cardinality::Optional, ScalarKind::Lang),
        FieldSchema::attribute("href", Cardinality::Optional, ScalarKind::Url),
        FieldSchema::attribute("class", Cardinality::Optional, ScalarKind::Key),
        FieldSchema::mixed("content", &["span"]),
    ]],
);

/// A formatted range of the enclosing [`Text`]. Offsets are byte offsets into
/// [`Text::content`]; nested spans lie within their parent's range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub lang: Option<Lang>,
    pub href: Option<Url>,
    pub class: Option<Key>,
    pub spans: Vec<Span>,
    pub residue: Residue,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<Lang>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<Url>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<Key>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub spans: Vec<Span>,
    pub residue: Residue,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The substring a span covers. `None` if the span does not address valid bounds.
    pub fn span_text(&self, span: &Span) -> Option<&str> {
        self.content.get(span.start..span.end)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

impl From<&str> for Text {
    fn from(content: &str) -> Self {
        Text::new(content)
    }
}

fn collect_inline(
    nodes: Vec<Node>,
    content: &mut String,
    spans: &mut Vec<Span>,
    ctx: &mut MapContext,
) -> LiftResult<()> {
    for node in nodes {
        match node {
            Node::Text(text) => content.push_str(&text),
            Node::Element(element) => {
                ctx.enter(format!("span[{}]", spans.len()));
                let mut bound = Bound::bind(element, SPAN_SCHEMA, ctx)?;
                let start = content.len();
                let lang = bound.attr("lang", ctx)?;
                let href = bound.attr("href", ctx)?;
                let class = bound.attr("class", ctx)?;
                let mut inner = Vec::new();
                collect_inline(bound.content("content"), content, &mut inner, ctx)?;
                spans.push(Span {
                    start,
                    end: content.len(),
                    lang,
                    href,
                    class,
                    spans: inner,
                    residue: bound.finish(),
                });
                ctx.leave();
            }
        }
    }
    Ok(())
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    match nodes.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => nodes.push(Node::Text(text.to_string())),
    }
}

/// Rebuild mixed content for `content[start..end]`. Out-of-bounds spans are clamped.
fn render(
    content: &str,
    start: usize,
    end: usize,
    spans: &[Span],
    version: LiftVersion,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut cursor = start;
    for span in spans {
        let span_start = span.start.clamp(cursor, end);
        let span_end = span.end.clamp(span_start, end);
        push_text(&mut nodes, content.get(cursor..span_start).unwrap_or_default());

        let mut out = Emitter::new(SPAN_SCHEMA, "span", version);
        out.attr("lang", span.lang.as_ref());
        out.attr("href", span.href.as_ref());
        out.attr("class", span.class.as_ref());
        out.content(
            "content",
            render(content, span_start, span_end, &span.spans, version),
        );
        out.residue(&span.residue);
        nodes.push(Node::Element(out.finish()));
        cursor = span_end;
    }
    push_text(&mut nodes, content.get(cursor..end).unwrap_or_default());
    nodes
}

impl LiftNode for Text {
    fn schema(_version: LiftVersion) -> TypeSchema {
        TEXT_SCHEMA
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        let mut text = Text::default();
        collect_inline(bound.content("content"), &mut text.content, &mut text.spans, ctx)?;
        text.residue = bound.finish();
        Ok(text)
    }

    fn emit(&self, out: &mut Emitter) {
        let nodes = render(
            &self.content,
            0,
            self.content.len(),
            &self.spans,
            out.version(),
        );
        out.content("content", nodes);
        out.residue(&self.residue);
    }
}
