//! Header: controlled vocabularies (ranges) and custom field declarations
//!
//!     A range is a named vocabulary, e.g. `grammatical-info` or `semantic-domain-ddp4`. Its
//!     elements may form a hierarchy through `parent` ids. Nothing in the format forbids
//!     cycles in that hierarchy, so every walk here is guarded by a visited set.
//!
//!     Ranges may live in a separate `.lift-ranges` file, in which case the header only names
//!     them and gives the `href`; the file facade fills them in.

use super::base::Extensible;
use super::multitext::Multitext;
use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{Key, ScalarKind, Url};
use crate::lift::schema::{
    Cardinality, FieldSchema, TypeSchema, EXTENSIBLE, MULTITEXT_CONTENT_LEGACY, NO_FIELDS,
};
use crate::lift::serializing::Emitter;
use crate::lift::version::LiftVersion;
use std::collections::HashSet;

use Cardinality::{Optional, Repeated, Required};

const HEADER: TypeSchema = TypeSchema::new(
    "header",
    &[&[
        FieldSchema::child("description", Optional),
        FieldSchema::child("ranges", Optional),
        FieldSchema::child("fields", Optional),
    ]],
);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub description: Option<Multitext>,
    pub ranges: Option<Ranges>,
    pub fields: Option<FieldDefinitions>,
    pub residue: Residue,
}

impl Header {
    pub fn ranges(&self) -> &[Range] {
        self.ranges
            .as_ref()
            .map(|ranges| ranges.ranges.as_slice())
            .unwrap_or_default()
    }

    pub fn ranges_mut(&mut self) -> &mut Vec<Range> {
        &mut self.ranges.get_or_insert_with(Ranges::default).ranges
    }

    pub fn range(&self, id: &str) -> Option<&Range> {
        self.ranges().iter().find(|range| range.id == id)
    }

    /// Field definitions declared by the document (not the version defaults).
    pub fn field_definitions(&self) -> &[FieldDefinition] {
        self.fields
            .as_ref()
            .map(|fields| fields.definitions.as_slice())
            .unwrap_or_default()
    }

    pub fn add_field_definition(&mut self, definition: FieldDefinition) {
        self.fields
            .get_or_insert_with(FieldDefinitions::default)
            .definitions
            .push(definition);
    }
}

impl LiftNode for Header {
    fn schema(_version: LiftVersion) -> TypeSchema {
        HEADER
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Header {
            description: bound.one("description", ctx)?,
            ranges: bound.one("ranges", ctx)?,
            fields: bound.one("fields", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.one("description", self.description.as_ref());
        out.one("ranges", self.ranges.as_ref());
        out.one("fields", self.fields.as_ref());
        out.residue(&self.residue);
    }
}

const RANGES: TypeSchema = TypeSchema::new("ranges", &[&[FieldSchema::child("range", Repeated)]]);

/// The `ranges` wrapper. Also the shape of a `.lift-ranges` file's root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranges {
    pub ranges: Vec<Range>,
    pub residue: Residue,
}

impl LiftNode for Ranges {
    fn schema(_version: LiftVersion) -> TypeSchema {
        RANGES
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Ranges {
            ranges: bound.many("range", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.many("range", &self.ranges);
        out.residue(&self.residue);
    }
}

const RANGE_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("id", Required, ScalarKind::Key),
    FieldSchema::attribute("guid", Optional, ScalarKind::Key),
    FieldSchema::attribute("href", Optional, ScalarKind::Url),
    FieldSchema::child("description", Optional),
    FieldSchema::child("range-element", Repeated),
    FieldSchema::child("label", Repeated),
    FieldSchema::child("abbrev", Repeated),
];
const RANGE_LEGACY: TypeSchema = TypeSchema::new("range", &[RANGE_FIELDS, NO_FIELDS]);
const RANGE: TypeSchema = TypeSchema::new("range", &[RANGE_FIELDS, EXTENSIBLE]);

/// Result of walking up a range hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestors<'a> {
    /// Parents, nearest first, up to the root or the point where the walk looped.
    pub chain: Vec<&'a RangeElement>,
    /// The walk came back to an element it had already visited.
    pub cycle: bool,
}

/// A named controlled vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    pub id: Key,
    pub guid: Option<Key>,
    /// Location of the range's elements in an external `.lift-ranges` file.
    pub href: Option<Url>,
    pub description: Option<Multitext>,
    pub elements: Vec<RangeElement>,
    pub labels: Vec<Multitext>,
    pub abbrevs: Vec<Multitext>,
    /// Only written by 0.15.
    pub ext: Extensible,
    pub residue: Residue,
}

impl Range {
    pub fn new(id: impl Into<Key>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, element: RangeElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn element(&self, id: &str) -> Option<&RangeElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn children_of(&self, id: &str) -> Vec<&RangeElement> {
        self.elements
            .iter()
            .filter(|element| element.parent.as_ref().is_some_and(|parent| parent == id))
            .collect()
    }

    /// Walk the `parent` links upwards from `id`. Dangling parents end the walk.
    pub fn ancestors(&self, id: &str) -> Ancestors<'_> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut current = self.element(id);
        while let Some(parent_id) = current.and_then(|element| element.parent.as_ref()) {
            if !visited.insert(parent_id.as_str()) {
                return Ancestors { chain, cycle: true };
            }
            let Some(parent) = self.element(parent_id.as_str()) else {
                break;
            };
            chain.push(parent);
            current = Some(parent);
        }
        Ancestors {
            chain,
            cycle: false,
        }
    }

    /// Every distinct cycle in the hierarchy, each as element ids starting from the
    /// smallest id.
    pub fn find_cycles(&self) -> Vec<Vec<&str>> {
        let mut cycles: Vec<Vec<&str>> = Vec::new();
        for element in &self.elements {
            let mut path = vec![element.id.as_str()];
            let mut current = element;
            while let Some(parent) = current
                .parent
                .as_ref()
                .and_then(|parent| self.element(parent.as_str()))
            {
                if parent.id == element.id {
                    let start = path
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, id)| **id)
                        .map(|(index, _)| index)
                        .unwrap_or_default();
                    path.rotate_left(start);
                    if !cycles.contains(&path) {
                        cycles.push(path);
                    }
                    break;
                }
                if path.contains(&parent.id.as_str()) {
                    // Loops further up, without passing through this element.
                    break;
                }
                path.push(parent.id.as_str());
                current = parent;
            }
        }
        cycles
    }
}

impl LiftNode for Range {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => RANGE_LEGACY,
            LiftVersion::V0_15 => RANGE,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Range {
            id: bound.required_attr("id", ctx)?,
            guid: bound.attr("guid", ctx)?,
            href: bound.attr("href", ctx)?,
            description: bound.one("description", ctx)?,
            elements: bound.many("range-element", ctx)?,
            labels: bound.many("label", ctx)?,
            abbrevs: bound.many("abbrev", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("id", Some(&self.id));
        out.attr("guid", self.guid.as_ref());
        out.attr("href", self.href.as_ref());
        out.one("description", self.description.as_ref());
        out.many("range-element", &self.elements);
        out.many("label", &self.labels);
        out.many("abbrev", &self.abbrevs);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const RANGE_ELEMENT_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("id", Required, ScalarKind::Key),
    FieldSchema::attribute("parent", Optional, ScalarKind::Key),
    FieldSchema::attribute("guid", Optional, ScalarKind::Key),
    FieldSchema::child("description", Repeated),
    FieldSchema::child("label", Repeated),
    FieldSchema::child("abbrev", Repeated),
];
const RANGE_ELEMENT_LEGACY: TypeSchema =
    TypeSchema::new("range-element", &[RANGE_ELEMENT_FIELDS, NO_FIELDS]);
const RANGE_ELEMENT: TypeSchema =
    TypeSchema::new("range-element", &[RANGE_ELEMENT_FIELDS, EXTENSIBLE]);

/// One value of a range. The id is the value other elements refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeElement {
    pub id: Key,
    pub parent: Option<Key>,
    pub guid: Option<Key>,
    pub descriptions: Vec<Multitext>,
    pub labels: Vec<Multitext>,
    pub abbrevs: Vec<Multitext>,
    /// Only written by 0.15.
    pub ext: Extensible,
    pub residue: Residue,
}

impl RangeElement {
    pub fn new(id: impl Into<Key>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<Key>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_label(mut self, lang: &str, text: &str) -> Self {
        self.labels.push(Multitext::from_pairs([(lang, text)]));
        self
    }

    /// First label text in `lang` across all label multitexts.
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels.iter().find_map(|label| label.text(lang))
    }

    pub fn abbrev(&self, lang: &str) -> Option<&str> {
        self.abbrevs.iter().find_map(|abbrev| abbrev.text(lang))
    }
}

impl LiftNode for RangeElement {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => RANGE_ELEMENT_LEGACY,
            LiftVersion::V0_15 => RANGE_ELEMENT,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(RangeElement {
            id: bound.required_attr("id", ctx)?,
            parent: bound.attr("parent", ctx)?,
            guid: bound.attr("guid", ctx)?,
            descriptions: bound.many("description", ctx)?,
            labels: bound.many("label", ctx)?,
            abbrevs: bound.many("abbrev", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("id", Some(&self.id));
        out.attr("parent", self.parent.as_ref());
        out.attr("guid", self.guid.as_ref());
        out.many("description", &self.descriptions);
        out.many("label", &self.labels);
        out.many("abbrev", &self.abbrevs);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const FIELD_DEFINITIONS: TypeSchema =
    TypeSchema::new("fields", &[&[FieldSchema::child("field", Repeated)]]);

/// The header's `fields` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefinitions {
    pub definitions: Vec<FieldDefinition>,
    pub residue: Residue,
}

impl LiftNode for FieldDefinitions {
    fn schema(_version: LiftVersion) -> TypeSchema {
        FIELD_DEFINITIONS
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(FieldDefinitions {
            definitions: bound.many("field", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.many("field", &self.definitions);
        out.residue(&self.residue);
    }
}

const FIELD_DEFINITION_LEGACY: TypeSchema = TypeSchema::new(
    "field",
    &[
        &[FieldSchema::attribute("tag", Required, ScalarKind::Key).named("name")],
        MULTITEXT_CONTENT_LEGACY,
    ],
);
const FIELD_DEFINITION: TypeSchema = TypeSchema::new(
    "field",
    &[&[
        FieldSchema::attribute("name", Required, ScalarKind::Key),
        FieldSchema::attribute("class", Optional, ScalarKind::Text),
        FieldSchema::attribute("type", Optional, ScalarKind::Text).named("field_type"),
        FieldSchema::attribute("option-range", Optional, ScalarKind::Key).named("option_range"),
        FieldSchema::attribute("writing-system", Optional, ScalarKind::Text)
            .named("writing_system"),
        FieldSchema::child("label", Optional),
        FieldSchema::child("description", Optional),
    ]],
);

/// Declares a custom field.
///
/// 0.13 names the field with a `tag` attribute and describes it with plain forms (kept in
/// `content`); 0.15 uses `name` plus typed attributes and `label`/`description` children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: Key,
    pub class: Option<String>,
    pub field_type: Option<String>,
    pub option_range: Option<Key>,
    pub writing_system: Option<String>,
    pub label: Option<Multitext>,
    pub description: Option<Multitext>,
    pub content: Multitext,
    pub residue: Residue,
}

impl FieldDefinition {
    pub fn new(name: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A 0.13-style definition: a tag described by a single form.
    pub fn legacy(tag: &str, lang: &str, text: &str) -> Self {
        Self {
            name: Key::from(tag),
            content: Multitext::from_pairs([(lang, text)]),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_description(mut self, lang: &str, text: &str) -> Self {
        self.description = Some(Multitext::from_pairs([(lang, text)]));
        self
    }

    /// Description text in `lang`, whichever revision's shape holds it.
    pub fn describe(&self, lang: &str) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|description| description.text(lang))
            .or_else(|| self.content.text(lang))
    }
}

impl LiftNode for FieldDefinition {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => FIELD_DEFINITION_LEGACY,
            LiftVersion::V0_15 => FIELD_DEFINITION,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(FieldDefinition {
            name: bound.required_attr("name", ctx)?,
            class: bound.attr("class", ctx)?,
            field_type: bound.attr("field_type", ctx)?,
            option_range: bound.attr("option_range", ctx)?,
            writing_system: bound.attr("writing_system", ctx)?,
            label: bound.one("label", ctx)?,
            description: bound.one("description", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("name", Some(&self.name));
        out.attr("class", self.class.as_ref());
        out.attr("field_type", self.field_type.as_ref());
        out.attr("option_range", self.option_range.as_ref());
        out.attr("writing_system", self.writing_system.as_ref());
        out.one("label", self.label.as_ref());
        out.one("description", self.description.as_ref());
        self.content.emit_content(out);
        out.residue(&self.residue);
    }
}
