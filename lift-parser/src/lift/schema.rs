//! Field schemas
//!
//!     Every mapped element is described once, as data: which attributes and children it has,
//!     whether each one is required, optional or repeated, and what kind of value it holds.
//!     The mapper (`mapping`) reads elements through these descriptions and the serializer
//!     (`serializing`) writes them back through the very same ones, so the two directions can
//!     not drift apart.
//!
//! Groups
//!
//!     A [`TypeSchema`] is a list of field groups. Shapes shared by many elements (multitext
//!     content, the extensible metadata block) are written once as a group and reused; the
//!     flattened field order is the serialization order.
//!
//! Names
//!
//!     A field has a `property` (the name the model uses) and a `key` (the attribute or tag in
//!     the markup). They are equal except where the format renamed things between revisions,
//!     e.g. the 0.13 `type` attribute of `field` that 0.15 calls `name`.

use super::scalar::{Property, PropertyBag, ScalarKind};

/// Where a field's value lives on the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Attribute,
    /// Child elements with a matching tag.
    Child,
    /// The element's character content.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Uninterpreted text.
    Literal,
    Scalar(ScalarKind),
    /// A child element mapped through its own schema.
    Nested,
    /// Children whose tag is any of the listed ones, kept in document order and dispatched
    /// by tag.
    Polymorphic(&'static [&'static str]),
    /// Character content interleaved with the listed inline elements.
    Mixed(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub property: &'static str,
    pub key: &'static str,
    pub source: Source,
    pub cardinality: Cardinality,
    pub kind: ValueKind,
}

impl FieldSchema {
    pub const fn attribute(key: &'static str, cardinality: Cardinality, kind: ScalarKind) -> Self {
        Self {
            property: key,
            key,
            source: Source::Attribute,
            cardinality,
            kind: ValueKind::Scalar(kind),
        }
    }

    pub const fn child(key: &'static str, cardinality: Cardinality) -> Self {
        Self {
            property: key,
            key,
            source: Source::Child,
            cardinality,
            kind: ValueKind::Nested,
        }
    }

    pub const fn polymorphic(
        property: &'static str,
        tags: &'static [&'static str],
        cardinality: Cardinality,
    ) -> Self {
        Self {
            property,
            key: property,
            source: Source::Child,
            cardinality,
            kind: ValueKind::Polymorphic(tags),
        }
    }

    pub const fn mixed(property: &'static str, inline: &'static [&'static str]) -> Self {
        Self {
            property,
            key: property,
            source: Source::Text,
            cardinality: Cardinality::Optional,
            kind: ValueKind::Mixed(inline),
        }
    }

    /// Use a different model name than the markup key.
    pub const fn named(self, property: &'static str) -> Self {
        Self { property, ..self }
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == Cardinality::Required
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    /// Does a child element with this tag belong to the field?
    pub fn accepts_child(&self, tag: &str) -> bool {
        match (self.source, self.kind) {
            (Source::Child, ValueKind::Polymorphic(tags)) => tags.contains(&tag),
            (Source::Child, _) => self.key == tag,
            (Source::Text, ValueKind::Mixed(inline)) => inline.contains(&tag),
            _ => false,
        }
    }

    fn type_name(&self) -> String {
        match self.kind {
            ValueKind::Literal => "text".to_string(),
            ValueKind::Scalar(kind) => kind.to_string(),
            ValueKind::Nested => "element".to_string(),
            ValueKind::Polymorphic(tags) => tags.join(" | "),
            ValueKind::Mixed(inline) => format!("text + {}", inline.join(" | ")),
        }
    }

    fn source_name(&self) -> &'static str {
        match self.source {
            Source::Attribute => "attribute",
            Source::Child => "child",
            Source::Text => "content",
        }
    }
}

/// The complete description of one element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSchema {
    pub tag: &'static str,
    pub groups: &'static [&'static [FieldSchema]],
}

impl TypeSchema {
    pub const fn new(tag: &'static str, groups: &'static [&'static [FieldSchema]]) -> Self {
        Self { tag, groups }
    }

    /// Fields in serialization order.
    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSchema> {
        self.groups.iter().flat_map(|group| group.iter())
    }

    pub fn field(&self, property: &str) -> Option<&'static FieldSchema> {
        self.fields().find(|field| field.property == property)
    }

    pub fn attribute_for(&self, key: &str) -> Option<usize> {
        self.fields()
            .position(|field| field.source == Source::Attribute && field.key == key)
    }

    pub fn child_for(&self, tag: &str) -> Option<usize> {
        self.fields().position(|field| field.accepts_child(tag))
    }

    pub fn text_field(&self) -> Option<usize> {
        self.fields().position(|field| field.source == Source::Text)
    }

    /// The schema as a property bag, for display and documentation.
    pub fn properties(&self) -> PropertyBag {
        self.fields()
            .map(|field| {
                let mut property = Property::new(field.key)
                    .with_type(format!("{} {}", field.source_name(), field.type_name()))
                    .required(field.is_required());
                if field.is_repeated() {
                    property = property.with_value("repeated");
                }
                property
            })
            .collect()
    }
}

use Cardinality::{Optional, Repeated};

/// Multitext content for revisions that still allow a bare `text` child.
pub const MULTITEXT_CONTENT_LEGACY: &[FieldSchema] = &[
    FieldSchema::child("form", Repeated),
    FieldSchema::child("text", Optional),
];

pub const MULTITEXT_CONTENT: &[FieldSchema] = &[FieldSchema::child("form", Repeated)];

pub const EXTENSION_TAGS: &[&str] = &["field", "trait", "flag", "annotation"];

/// Creation and modification dates plus custom fields, traits, flags and annotations.
pub const EXTENSIBLE: &[FieldSchema] = &[
    FieldSchema::attribute("dateCreated", Optional, ScalarKind::DateTime),
    FieldSchema::attribute("dateModified", Optional, ScalarKind::DateTime),
    FieldSchema::polymorphic("extension", EXTENSION_TAGS, Repeated),
];

pub const NO_FIELDS: &[FieldSchema] = &[];

pub const ANNOTATIONS: &[FieldSchema] = &[FieldSchema::child("annotation", Repeated)];

pub const TRAITS: &[FieldSchema] = &[FieldSchema::child("trait", Repeated)];
