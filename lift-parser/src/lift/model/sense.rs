//! Senses and the sense-level vocabulary references.

use super::base::{Extensible, Gloss, Trait, UrlRef};
use super::multitext::Multitext;
use super::satellite::{Example, Note, Relation};
use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{Key, RefId, ScalarKind};
use crate::lift::schema::{
    Cardinality, FieldSchema, TypeSchema, EXTENSIBLE, MULTITEXT_CONTENT, MULTITEXT_CONTENT_LEGACY,
    TRAITS,
};
use crate::lift::serializing::Emitter;
use crate::lift::util::ellipsize;
use crate::lift::version::LiftVersion;
use std::fmt;

use Cardinality::{Optional, Repeated, Required};

const GRAMMATICAL_INFO: TypeSchema = TypeSchema::new(
    "grammatical-info",
    &[
        &[FieldSchema::attribute("value", Required, ScalarKind::Key)],
        TRAITS,
    ],
);

/// Part of speech, by value: a reference into the header's `grammatical-info` range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammaticalInfo {
    pub value: Key,
    pub traits: Vec<Trait>,
    pub residue: Residue,
}

impl GrammaticalInfo {
    pub fn new(value: impl Into<Key>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for GrammaticalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl LiftNode for GrammaticalInfo {
    fn schema(_version: LiftVersion) -> TypeSchema {
        GRAMMATICAL_INFO
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(GrammaticalInfo {
            value: bound.required_attr("value", ctx)?,
            traits: bound.many("trait", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("value", Some(&self.value));
        out.many("trait", &self.traits);
        out.residue(&self.residue);
    }
}

const REVERSAL_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("type", Optional, ScalarKind::Key).named("reversal_type"),
    FieldSchema::attribute("ref", Optional, ScalarKind::RefId).named("target"),
];
const REVERSAL_CHILDREN: &[FieldSchema] = &[
    FieldSchema::child("main", Optional),
    FieldSchema::child("grammatical-info", Optional),
];
const REVERSAL_LEGACY: TypeSchema = TypeSchema::new(
    "reversal",
    &[REVERSAL_FIELDS, MULTITEXT_CONTENT_LEGACY, REVERSAL_CHILDREN],
);
const REVERSAL: TypeSchema = TypeSchema::new(
    "reversal",
    &[REVERSAL_FIELDS, MULTITEXT_CONTENT, REVERSAL_CHILDREN],
);

/// An entry in a reversal index. `main` nests the more general reversal this one is a
/// subentry of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reversal {
    pub reversal_type: Option<Key>,
    pub target: Option<RefId>,
    pub content: Multitext,
    pub main: Option<Box<Reversal>>,
    pub grammatical_info: Option<GrammaticalInfo>,
    pub residue: Residue,
}

impl Reversal {
    pub fn new(reversal_type: Option<&str>, content: Multitext) -> Self {
        Self {
            reversal_type: reversal_type.map(Key::from),
            content,
            ..Self::default()
        }
    }
}

impl LiftNode for Reversal {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => REVERSAL_LEGACY,
            LiftVersion::V0_15 => REVERSAL,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Reversal {
            reversal_type: bound.attr("reversal_type", ctx)?,
            target: bound.attr("target", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            main: bound.one::<Reversal>("main", ctx)?.map(Box::new),
            grammatical_info: bound.one("grammatical-info", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("reversal_type", self.reversal_type.as_ref());
        out.attr("target", self.target.as_ref());
        self.content.emit_content(out);
        out.one("main", self.main.as_deref());
        out.one("grammatical-info", self.grammatical_info.as_ref());
        out.residue(&self.residue);
    }
}

const SENSE: TypeSchema = TypeSchema::new(
    "sense",
    &[
        &[
            FieldSchema::attribute("id", Optional, ScalarKind::RefId),
            FieldSchema::attribute("order", Optional, ScalarKind::Integer),
            FieldSchema::child("grammatical-info", Optional),
            FieldSchema::child("gloss", Repeated),
            FieldSchema::child("definition", Optional),
            FieldSchema::child("relation", Repeated),
            FieldSchema::child("note", Repeated),
            FieldSchema::child("example", Repeated),
            FieldSchema::child("reversal", Repeated),
            FieldSchema::child("illustration", Repeated),
            FieldSchema::child("subsense", Repeated),
        ],
        EXTENSIBLE,
    ],
);

/// One meaning of an entry. Senses nest through `subsenses`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sense {
    pub id: Option<RefId>,
    pub order: Option<u32>,
    pub grammatical_info: Option<GrammaticalInfo>,
    pub glosses: Vec<Gloss>,
    pub definition: Option<Multitext>,
    pub relations: Vec<Relation>,
    pub notes: Vec<Note>,
    pub examples: Vec<Example>,
    pub reversals: Vec<Reversal>,
    pub illustrations: Vec<UrlRef>,
    pub subsenses: Vec<Sense>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Sense {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(RefId::from),
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }

    /// The gloss in `lang`, falling back to the first gloss. `None` when the sense has no
    /// glosses at all.
    pub fn get_gloss(&self, lang: &str) -> Option<&str> {
        self.glosses
            .iter()
            .find(|gloss| gloss.lang.matches(lang))
            .or_else(|| self.glosses.first())
            .map(Gloss::as_str)
    }

    /// The raw grammatical-info value, resolved or not.
    pub fn get_grammatical_info(&self) -> Option<&str> {
        self.grammatical_info.as_ref().map(|info| info.value.as_str())
    }

    /// `gloss \t grammatical-info \t id`, with fixed-width columns.
    pub fn summary_line(&self, lang: &str) -> String {
        let gloss = ellipsize(self.get_gloss(lang).unwrap_or_default(), 20);
        let info = ellipsize(self.get_grammatical_info().unwrap_or_default(), 10);
        let id = self.id.as_ref().map(RefId::as_str).unwrap_or_default();
        format!("{gloss:20}\t{info:10}\t{id}")
    }

    /// This sense and all its subsenses, depth first.
    pub fn descendants(&self) -> Vec<&Sense> {
        let mut senses = vec![self];
        for subsense in &self.subsenses {
            senses.extend(subsense.descendants());
        }
        senses
    }

    pub fn add_gloss(&mut self, gloss: Gloss) -> usize {
        self.glosses.push(gloss);
        self.ext.touch();
        self.glosses.len() - 1
    }

    pub fn set_definition(&mut self, definition: Multitext) {
        self.definition = Some(definition);
        self.ext.touch();
    }

    pub fn set_grammatical_info(&mut self, value: impl Into<Key>) {
        self.grammatical_info = Some(GrammaticalInfo::new(value));
        self.ext.touch();
    }

    pub fn add_example(&mut self, example: Example) -> usize {
        self.examples.push(example);
        self.ext.touch();
        self.examples.len() - 1
    }

    pub fn add_note(&mut self, note: Note) -> usize {
        self.notes.push(note);
        self.ext.touch();
        self.notes.len() - 1
    }

    pub fn add_relation(&mut self, relation: Relation) -> usize {
        self.relations.push(relation);
        self.ext.touch();
        self.relations.len() - 1
    }

    pub fn add_reversal(&mut self, reversal: Reversal) -> usize {
        self.reversals.push(reversal);
        self.ext.touch();
        self.reversals.len() - 1
    }

    pub fn add_illustration(&mut self, illustration: UrlRef) -> usize {
        self.illustrations.push(illustration);
        self.ext.touch();
        self.illustrations.len() - 1
    }

    pub fn add_subsense(&mut self, subsense: Sense) -> usize {
        self.subsenses.push(subsense);
        self.ext.touch();
        self.subsenses.len() - 1
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line("en"))
    }
}

impl LiftNode for Sense {
    fn schema(_version: LiftVersion) -> TypeSchema {
        SENSE
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Sense {
            id: bound.attr("id", ctx)?,
            order: bound.attr("order", ctx)?,
            grammatical_info: bound.one("grammatical-info", ctx)?,
            glosses: bound.many("gloss", ctx)?,
            definition: bound.one("definition", ctx)?,
            relations: bound.many("relation", ctx)?,
            notes: bound.many("note", ctx)?,
            examples: bound.many("example", ctx)?,
            reversals: bound.many("reversal", ctx)?,
            illustrations: bound.many("illustration", ctx)?,
            subsenses: bound.many("subsense", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("id", self.id.as_ref());
        out.attr("order", self.order.as_ref());
        out.one("grammatical-info", self.grammatical_info.as_ref());
        out.many("gloss", &self.glosses);
        out.one("definition", self.definition.as_ref());
        out.many("relation", &self.relations);
        out.many("note", &self.notes);
        out.many("example", &self.examples);
        out.many("reversal", &self.reversals);
        out.many("illustration", &self.illustrations);
        out.many("subsense", &self.subsenses);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}
