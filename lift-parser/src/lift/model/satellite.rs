//! Entities attached to entries and senses: notes, pronunciations, etymologies, examples and
//! their translations, relations and variants.

use super::base::{Extensible, Gloss, UrlRef};
use super::multitext::{Form, Multitext};
use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{Key, RefId, ScalarKind};
use crate::lift::schema::{
    Cardinality, FieldSchema, TypeSchema, EXTENSIBLE, MULTITEXT_CONTENT, MULTITEXT_CONTENT_LEGACY,
    NO_FIELDS,
};
use crate::lift::serializing::Emitter;
use crate::lift::version::LiftVersion;
use std::fmt;

use Cardinality::{Optional, Repeated, Required};

const NOTE_FIELDS: &[FieldSchema] = &[FieldSchema::attribute("type", Optional, ScalarKind::Key)];
const NOTE_LEGACY: TypeSchema =
    TypeSchema::new("note", &[NOTE_FIELDS, MULTITEXT_CONTENT_LEGACY, EXTENSIBLE]);
const NOTE: TypeSchema = TypeSchema::new("note", &[NOTE_FIELDS, MULTITEXT_CONTENT, EXTENSIBLE]);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub note_type: Option<Key>,
    pub content: Multitext,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Note {
    pub fn new(note_type: Option<&str>, content: Multitext) -> Self {
        Self {
            note_type: note_type.map(Key::from),
            content,
            ext: Extensible::created_now(),
            residue: Residue::default(),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.note_type {
            Some(note_type) => write!(f, "{note_type}: {}", self.content),
            None => self.content.fmt(f),
        }
    }
}

impl LiftNode for Note {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => NOTE_LEGACY,
            LiftVersion::V0_15 => NOTE,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Note {
            note_type: bound.attr("type", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("type", self.note_type.as_ref());
        self.content.emit_content(out);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const MEDIA: &[FieldSchema] = &[FieldSchema::child("media", Repeated)];
const PHONETIC_LEGACY: TypeSchema =
    TypeSchema::new("pronunciation", &[MULTITEXT_CONTENT_LEGACY, MEDIA, EXTENSIBLE]);
const PHONETIC: TypeSchema =
    TypeSchema::new("pronunciation", &[MULTITEXT_CONTENT, MEDIA, EXTENSIBLE]);

/// A pronunciation of an entry or variant, with optional recordings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phonetic {
    pub content: Multitext,
    pub media: Vec<UrlRef>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Phonetic {
    pub fn new(content: Multitext) -> Self {
        Self {
            content,
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }

    pub fn add_media(&mut self, media: UrlRef) {
        self.media.push(media);
        self.ext.touch();
    }
}

impl LiftNode for Phonetic {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => PHONETIC_LEGACY,
            LiftVersion::V0_15 => PHONETIC,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Phonetic {
            content: Multitext::take_content(&mut bound, ctx)?,
            media: bound.many("media", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        self.content.emit_content(out);
        out.many("media", &self.media);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const ETYMOLOGY: TypeSchema = TypeSchema::new(
    "etymology",
    &[
        &[
            FieldSchema::attribute("type", Required, ScalarKind::Key).named("etymology_type"),
            FieldSchema::attribute("source", Required, ScalarKind::Text),
            FieldSchema::child("gloss", Repeated),
            FieldSchema::child("form", Optional),
        ],
        EXTENSIBLE,
    ],
);

/// Where a word came from. Unlike a relation, the source has no entry in the lexicon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Etymology {
    pub etymology_type: Key,
    pub source: String,
    pub glosses: Vec<Gloss>,
    pub form: Option<Form>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Etymology {
    pub fn new(etymology_type: impl Into<Key>, source: impl Into<String>) -> Self {
        Self {
            etymology_type: etymology_type.into(),
            source: source.into(),
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Etymology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.etymology_type)?;
        if let Some(form) = &self.form {
            write!(f, " {form}")?;
        }
        Ok(())
    }
}

impl LiftNode for Etymology {
    fn schema(_version: LiftVersion) -> TypeSchema {
        ETYMOLOGY
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Etymology {
            etymology_type: bound.required_attr("etymology_type", ctx)?,
            source: bound.required_attr("source", ctx)?,
            glosses: bound.many("gloss", ctx)?,
            form: bound.one("form", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("etymology_type", Some(&self.etymology_type));
        out.attr("source", Some(&self.source));
        out.many("gloss", &self.glosses);
        out.one("form", self.form.as_ref());
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const TRANSLATION_FIELDS: &[FieldSchema] =
    &[FieldSchema::attribute("type", Optional, ScalarKind::Key)];
const TRANSLATION_LEGACY: TypeSchema =
    TypeSchema::new("translation", &[TRANSLATION_FIELDS, MULTITEXT_CONTENT_LEGACY]);
const TRANSLATION: TypeSchema =
    TypeSchema::new("translation", &[TRANSLATION_FIELDS, MULTITEXT_CONTENT]);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub translation_type: Option<Key>,
    pub content: Multitext,
    pub residue: Residue,
}

impl Translation {
    pub fn new(translation_type: Option<&str>, content: Multitext) -> Self {
        Self {
            translation_type: translation_type.map(Key::from),
            content,
            residue: Residue::default(),
        }
    }
}

impl LiftNode for Translation {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => TRANSLATION_LEGACY,
            LiftVersion::V0_15 => TRANSLATION,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Translation {
            translation_type: bound.attr("type", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("type", self.translation_type.as_ref());
        self.content.emit_content(out);
        out.residue(&self.residue);
    }
}

const EXAMPLE_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("source", Optional, ScalarKind::Key),
    FieldSchema::attribute("id", Optional, ScalarKind::RefId),
];
const TRANSLATIONS: &[FieldSchema] = &[FieldSchema::child("translation", Repeated)];
const NOTES: &[FieldSchema] = &[FieldSchema::child("note", Repeated)];
const EXAMPLE_LEGACY: TypeSchema = TypeSchema::new(
    "example",
    &[
        EXAMPLE_FIELDS,
        MULTITEXT_CONTENT_LEGACY,
        TRANSLATIONS,
        NO_FIELDS,
        EXTENSIBLE,
    ],
);
const EXAMPLE: TypeSchema = TypeSchema::new(
    "example",
    &[EXAMPLE_FIELDS, MULTITEXT_CONTENT, TRANSLATIONS, NOTES, EXTENSIBLE],
);

/// An example sentence, with translations. Notes on examples exist from 0.15 on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Example {
    pub source: Option<Key>,
    pub id: Option<RefId>,
    pub content: Multitext,
    pub translations: Vec<Translation>,
    pub notes: Vec<Note>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Example {
    pub fn new(content: Multitext) -> Self {
        Self {
            content,
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }

    pub fn add_translation(&mut self, translation: Translation) {
        self.translations.push(translation);
        self.ext.touch();
    }
}

impl LiftNode for Example {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => EXAMPLE_LEGACY,
            LiftVersion::V0_15 => EXAMPLE,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Example {
            source: bound.attr("source", ctx)?,
            id: bound.attr("id", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            translations: bound.many("translation", ctx)?,
            notes: bound.many("note", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("source", self.source.as_ref());
        out.attr("id", self.id.as_ref());
        self.content.emit_content(out);
        out.many("translation", &self.translations);
        out.many("note", &self.notes);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const RELATION: TypeSchema = TypeSchema::new(
    "relation",
    &[
        &[
            FieldSchema::attribute("type", Required, ScalarKind::Key).named("relation_type"),
            FieldSchema::attribute("ref", Required, ScalarKind::RefId).named("target"),
            FieldSchema::attribute("order", Optional, ScalarKind::Integer),
            FieldSchema::child("usage", Repeated),
        ],
        EXTENSIBLE,
    ],
);

/// A lexical relation to another entry or sense.
///
/// `target` is a weak reference: it is resolved through the lexicon's index when asked for,
/// and may name an item that does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    pub relation_type: Key,
    pub target: RefId,
    pub order: Option<u32>,
    pub usages: Vec<Multitext>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Relation {
    pub fn new(relation_type: impl Into<Key>, target: impl Into<RefId>) -> Self {
        Self {
            relation_type: relation_type.into(),
            target: target.into(),
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.relation_type, self.target)
    }
}

impl LiftNode for Relation {
    fn schema(_version: LiftVersion) -> TypeSchema {
        RELATION
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Relation {
            relation_type: bound.required_attr("relation_type", ctx)?,
            target: bound.required_attr("target", ctx)?,
            order: bound.attr("order", ctx)?,
            usages: bound.many("usage", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("relation_type", Some(&self.relation_type));
        out.attr("target", Some(&self.target));
        out.attr("order", self.order.as_ref());
        out.many("usage", &self.usages);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

const VARIANT_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("ref", Optional, ScalarKind::RefId).named("target"),
    FieldSchema::attribute("id", Optional, ScalarKind::RefId),
];
const VARIANT_CHILDREN: &[FieldSchema] = &[
    FieldSchema::child("pronunciation", Repeated),
    FieldSchema::child("relation", Repeated),
];
const VARIANT_LEGACY: TypeSchema = TypeSchema::new(
    "variant",
    &[VARIANT_FIELDS, MULTITEXT_CONTENT_LEGACY, VARIANT_CHILDREN, EXTENSIBLE],
);
const VARIANT: TypeSchema = TypeSchema::new(
    "variant",
    &[VARIANT_FIELDS, MULTITEXT_CONTENT, VARIANT_CHILDREN, EXTENSIBLE],
);

/// A variant form of an entry. `target` optionally points at the entry holding the
/// variant's full description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    pub target: Option<RefId>,
    pub id: Option<RefId>,
    pub content: Multitext,
    pub pronunciations: Vec<Phonetic>,
    pub relations: Vec<Relation>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Variant {
    pub fn new(content: Multitext) -> Self {
        Self {
            content,
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.content.fmt(f)
    }
}

impl LiftNode for Variant {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => VARIANT_LEGACY,
            LiftVersion::V0_15 => VARIANT,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Variant {
            target: bound.attr("target", ctx)?,
            id: bound.attr("id", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            pronunciations: bound.many("pronunciation", ctx)?,
            relations: bound.many("relation", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("target", self.target.as_ref());
        out.attr("id", self.id.as_ref());
        self.content.emit_content(out);
        out.many("pronunciation", &self.pronunciations);
        out.many("relation", &self.relations);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}
