//! Schema-driven mapping from element trees to the typed model
//!
//!     Mapping an element happens in two steps. [`Bound::bind`] makes one forward pass over the
//!     element, sorting every attribute and child into the slot of the schema field that
//!     claims it; whatever no field claims goes into the [`Residue`]. Required fields that
//!     stayed empty fail the element right there with a `SchemaViolation`. The type's
//!     [`LiftNode::from_bound`] then pulls typed values out of the slots.
//!
//! Tolerance
//!
//!     - An optional scalar that does not coerce is reported as a `MalformedValue` diagnostic.
//!       Dates are kept verbatim as `DateTime::Unparsed`; other kinds are left unset and the
//!       raw attribute moves to the residue.
//!     - A second occurrence of a single-valued child goes to the residue.
//!     - Nothing is ever dropped: slots a type did not consume are returned to the residue
//!       as well.

use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use super::error::{LiftError, LiftResult};
use super::markup::{Element, Node};
use super::scalar::{DateTime, Scalar};
use super::schema::{FieldSchema, Source, TypeSchema};
use super::serializing::Emitter;
use super::version::LiftVersion;

/// A type that maps to and from one element shape.
pub trait LiftNode: Sized {
    fn schema(version: LiftVersion) -> TypeSchema;

    fn from_bound(bound: Bound, ctx: &mut MapContext) -> LiftResult<Self>;

    fn emit(&self, out: &mut Emitter);
}

/// Attributes and children no schema field claimed, kept for re-emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Residue {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Residue {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }
}

/// State carried through one mapping run.
#[derive(Debug)]
pub struct MapContext {
    version: LiftVersion,
    strict_dates: bool,
    path: Vec<String>,
    diagnostics: Diagnostics,
}

impl MapContext {
    pub fn new(version: LiftVersion) -> Self {
        Self {
            version,
            strict_dates: false,
            path: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Treat malformed optional dates as schema violations.
    pub fn with_strict_dates(mut self, strict: bool) -> Self {
        self.strict_dates = strict;
        self
    }

    pub fn version(&self) -> LiftVersion {
        self.version
    }

    pub fn set_version(&mut self, version: LiftVersion) {
        self.version = version;
    }

    pub fn strict_dates(&self) -> bool {
        self.strict_dates
    }

    /// Element path of the node being mapped, e.g. `/lift/entry[2]/sense[0]`.
    pub fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    pub fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// Record a diagnostic, located at the current path unless it already has a context.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let diagnostic = if diagnostic.context.is_empty() {
            let path = self.path();
            diagnostic.at(path)
        } else {
            diagnostic
        };
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn violation(
        &self,
        element: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> LiftError {
        LiftError::SchemaViolation {
            element,
            field,
            reason: reason.into(),
            context: self.path(),
        }
    }
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Value(String),
    Elements(Vec<Element>),
    Content(Vec<Node>),
}

impl Slot {
    fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    fn push_element(&mut self, element: Element) {
        match self {
            Slot::Elements(elements) => elements.push(element),
            _ => *self = Slot::Elements(vec![element]),
        }
    }

    fn push_node(&mut self, node: Node) {
        match self {
            Slot::Content(nodes) => nodes.push(node),
            _ => *self = Slot::Content(vec![node]),
        }
    }
}

/// An element sorted into the slots of its schema.
#[derive(Debug)]
pub struct Bound {
    schema: TypeSchema,
    fields: Vec<&'static FieldSchema>,
    slots: Vec<Slot>,
    residue: Residue,
}

impl Bound {
    pub fn bind(element: Element, schema: TypeSchema, ctx: &MapContext) -> LiftResult<Bound> {
        let fields: Vec<&'static FieldSchema> = schema.fields().collect();
        let mut slots: Vec<Slot> = fields.iter().map(|_| Slot::Empty).collect();
        let mut residue = Residue::default();

        for (key, value) in element.attributes {
            match schema.attribute_for(&key) {
                Some(index) => slots[index] = Slot::Value(value),
                None => residue.attributes.push((key, value)),
            }
        }

        let text_field = schema.text_field();
        for node in element.children {
            match node {
                Node::Text(text) => match text_field {
                    Some(index) => slots[index].push_node(Node::Text(text)),
                    None => residue.children.push(Node::Text(text)),
                },
                Node::Element(child) => match schema.child_for(&child.name) {
                    Some(index) if fields[index].source == Source::Text => {
                        slots[index].push_node(Node::Element(child))
                    }
                    Some(index) if fields[index].is_repeated() || slots[index].is_empty() => {
                        slots[index].push_element(child)
                    }
                    _ => residue.children.push(Node::Element(child)),
                },
            }
        }

        for (field, slot) in fields.iter().zip(&slots) {
            if field.is_required() && slot.is_empty() {
                return Err(ctx.violation(schema.tag, field.key, "is required"));
            }
        }

        Ok(Bound {
            schema,
            fields,
            slots,
            residue,
        })
    }

    pub fn schema(&self) -> TypeSchema {
        self.schema
    }

    fn take(&mut self, property: &str) -> Option<(&'static FieldSchema, Slot)> {
        let index = self.fields.iter().position(|f| f.property == property)?;
        Some((self.fields[index], std::mem::take(&mut self.slots[index])))
    }

    fn take_value(&mut self, property: &str) -> Option<(&'static FieldSchema, String)> {
        match self.take(property)? {
            (field, Slot::Value(raw)) => Some((field, raw)),
            (_, other) => {
                self.restore(property, other);
                None
            }
        }
    }

    fn restore(&mut self, property: &str, slot: Slot) {
        if let Some(index) = self.fields.iter().position(|f| f.property == property) {
            self.slots[index] = slot;
        }
    }

    /// Coerce an attribute. Optional values that do not coerce are reported and left unset.
    pub fn attr<T: Scalar>(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<Option<T>> {
        let Some((field, raw)) = self.take_value(property) else {
            return Ok(None);
        };
        match T::parse_scalar(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) if field.is_required() => {
                Err(ctx.violation(self.schema.tag, field.key, err.to_string()))
            }
            Err(err) => {
                ctx.report(Diagnostic::new(
                    DiagnosticKind::MalformedValue,
                    format!("<{}> {}: {err}", self.schema.tag, field.key),
                ));
                self.residue.attributes.push((field.key.to_string(), raw));
                Ok(None)
            }
        }
    }

    pub fn required_attr<T: Scalar>(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<T> {
        let tag = self.schema.tag;
        self.attr(property, ctx)?
            .ok_or_else(|| ctx.violation(tag, property, "is required"))
    }

    /// Read a date attribute. Unreadable optional dates are kept verbatim unless the
    /// context is strict about dates.
    pub fn date(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<Option<DateTime>> {
        let Some((field, raw)) = self.take_value(property) else {
            return Ok(None);
        };
        match DateTime::parse_scalar(&raw) {
            Ok(date) => Ok(Some(date)),
            Err(err) if field.is_required() || ctx.strict_dates() => {
                Err(ctx.violation(self.schema.tag, field.key, err.to_string()))
            }
            Err(err) => {
                ctx.report(Diagnostic::new(
                    DiagnosticKind::MalformedValue,
                    format!("<{}> {}: {err}", self.schema.tag, field.key),
                ));
                Ok(Some(DateTime::Unparsed(raw)))
            }
        }
    }

    /// Raw child elements of a field, in document order.
    pub fn elements(&mut self, property: &'static str) -> Vec<Element> {
        match self.take(property) {
            Some((_, Slot::Elements(elements))) => elements,
            Some((_, other)) => {
                self.restore(property, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Mixed character content of a text field.
    pub fn content(&mut self, property: &'static str) -> Vec<Node> {
        match self.take(property) {
            Some((_, Slot::Content(nodes))) => nodes,
            Some((_, other)) => {
                self.restore(property, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    pub fn one<T: LiftNode>(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<Option<T>> {
        match self.elements(property).into_iter().next() {
            Some(element) => map_child(element, None, ctx).map(Some),
            None => Ok(None),
        }
    }

    pub fn required_one<T: LiftNode>(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<T> {
        let tag = self.schema.tag;
        self.one(property, ctx)?
            .ok_or_else(|| ctx.violation(tag, property, "is required"))
    }

    pub fn many<T: LiftNode>(
        &mut self,
        property: &'static str,
        ctx: &mut MapContext,
    ) -> LiftResult<Vec<T>> {
        self.elements(property)
            .into_iter()
            .enumerate()
            .map(|(index, element)| map_child(element, Some(index), ctx))
            .collect()
    }

    /// Forget an unreadable raw value kept for `key`, for fields the type fills in itself.
    pub fn discard_raw(&mut self, key: &str) {
        self.residue.attributes.retain(|(name, _)| name != key);
    }

    /// The residue, plus anything left in slots the type did not consume.
    pub fn finish(self) -> Residue {
        let mut residue = self.residue;
        for (field, slot) in self.fields.iter().zip(self.slots) {
            match slot {
                Slot::Empty => {}
                Slot::Value(value) => residue.attributes.push((field.key.to_string(), value)),
                Slot::Elements(elements) => residue
                    .children
                    .extend(elements.into_iter().map(Node::Element)),
                Slot::Content(nodes) => residue.children.extend(nodes),
            }
        }
        residue
    }
}

/// Map an element through `T`'s schema for the context's version.
pub fn map_element<T: LiftNode>(element: Element, ctx: &mut MapContext) -> LiftResult<T> {
    let schema = T::schema(ctx.version());
    tracing::trace!(tag = %element.name, schema = schema.tag, "binding element");
    let bound = Bound::bind(element, schema, ctx)?;
    T::from_bound(bound, ctx)
}

/// Map a child element, tracking its position in the context path.
pub fn map_child<T: LiftNode>(
    element: Element,
    index: Option<usize>,
    ctx: &mut MapContext,
) -> LiftResult<T> {
    let segment = match index {
        Some(index) => format!("{}[{index}]", element.name),
        None => element.name.clone(),
    };
    ctx.enter(segment);
    let result = map_element(element, ctx);
    ctx.leave();
    result
}
