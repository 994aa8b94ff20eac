//! The lexicon container
//!
//!     A [`Lexicon`] owns the header and the ordered entries of one document, plus an
//!     identifier [`Index`] over everything in them that carries an id. Cross references in
//!     the model (relation targets, variant and reversal refs, grammatical-info values, range
//!     parents) are plain keys; they are resolved through the index when asked for and never
//!     stored as links.
//!
//!     The index is derived data. It is rebuilt after every edit made through
//!     [`Lexicon::update`] or [`Lexicon::add_entry`], and ignored by equality.
//!
//! Loading
//!
//!     [`to_lexicon`] is the entry point from a parsed tree. Structural problems (wrong root,
//!     missing required fields) fail the load; everything else comes back as diagnostics in
//!     the [`Loaded`] value next to the lexicon.

pub mod index;
pub mod query;

pub use index::{Index, Location};
pub use query::{MatchKind, SearchField, WritingSystems};

use self::index::sense_at;
use crate::lift::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::lift::error::{LiftError, LiftResult, LookupError};
use crate::lift::loader::LoadOptions;
use crate::lift::mapping::{map_element, Bound, LiftNode, MapContext, Residue};
use crate::lift::markup::Element;
use crate::lift::model::{
    Entry, Example, FieldDefinition, Header, Range, RangeElement, Relation, Reversal, Sense,
    Variant,
};
use crate::lift::scalar::{RefId, ScalarKind};
use crate::lift::schema::{Cardinality, FieldSchema, TypeSchema};
use crate::lift::serializing::{to_element, Emitter};
use crate::lift::version::{default_version, LiftVersion};
use std::fmt;

/// Range holding the values of `grammatical-info`.
pub const GRAMMATICAL_INFO_RANGE: &str = "grammatical-info";

const LIFT: TypeSchema = TypeSchema::new(
    "lift",
    &[&[
        FieldSchema::attribute("version", Cardinality::Optional, ScalarKind::Text),
        FieldSchema::attribute("producer", Cardinality::Optional, ScalarKind::Text),
        FieldSchema::child("header", Cardinality::Optional),
        FieldSchema::child("entry", Cardinality::Repeated),
    ]],
);

/// A borrowed identifiable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    Entry(&'a Entry),
    Sense(&'a Sense),
    Variant(&'a Variant),
    Example(&'a Example),
    Range(&'a Range),
    RangeElement(&'a RangeElement),
}

impl<'a> Item<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Entry(_) => "entry",
            Item::Sense(_) => "sense",
            Item::Variant(_) => "variant",
            Item::Example(_) => "example",
            Item::Range(_) => "range",
            Item::RangeElement(_) => "range-element",
        }
    }

    pub fn id(&self) -> &'a str {
        match *self {
            Item::Entry(entry) => entry.id.as_str(),
            Item::Sense(sense) => sense.id.as_ref().map(RefId::as_str).unwrap_or_default(),
            Item::Variant(variant) => variant.id.as_ref().map(RefId::as_str).unwrap_or_default(),
            Item::Example(example) => example.id.as_ref().map(RefId::as_str).unwrap_or_default(),
            Item::Range(range) => range.id.as_str(),
            Item::RangeElement(element) => element.id.as_str(),
        }
    }

    pub fn as_entry(&self) -> Option<&'a Entry> {
        match *self {
            Item::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_sense(&self) -> Option<&'a Sense> {
        match *self {
            Item::Sense(sense) => Some(sense),
            _ => None,
        }
    }

    /// The item as the element it would be written as.
    pub fn to_element(&self, version: LiftVersion) -> Element {
        match *self {
            Item::Entry(entry) => to_element(entry, "entry", version),
            Item::Sense(sense) => to_element(sense, "sense", version),
            Item::Variant(variant) => to_element(variant, "variant", version),
            Item::Example(example) => to_element(example, "example", version),
            Item::Range(range) => to_element(range, "range", version),
            Item::RangeElement(element) => to_element(element, "range-element", version),
        }
    }
}

impl fmt::Display for Item<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Entry(entry) => entry.fmt(f),
            Item::Sense(sense) => sense.fmt(f),
            other => write!(f, "{} {}", other.kind(), other.id()),
        }
    }
}

/// The outcome of resolving a weak reference. The raw key is always available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub raw: String,
    pub target: Result<Item<'a>, Diagnostic>,
}

impl<'a> Resolved<'a> {
    pub fn is_resolved(&self) -> bool {
        self.target.is_ok()
    }

    pub fn item(&self) -> Option<Item<'a>> {
        self.target.as_ref().ok().copied()
    }
}

/// A lexicon together with what was noticed while loading it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub lexicon: Lexicon,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    /// The root's `version` text, kept only when it names no known revision.
    pub declared_version: Option<String>,
    /// The revision whose schemas the document was read with and is written with.
    pub version: LiftVersion,
    pub producer: Option<String>,
    pub header: Option<Header>,
    entries: Vec<Entry>,
    pub residue: Residue,
    index: Index,
}

impl PartialEq for Lexicon {
    fn eq(&self, other: &Self) -> bool {
        self.declared_version == other.declared_version
            && self.version == other.version
            && self.producer == other.producer
            && self.header == other.header
            && self.entries == other.entries
            && self.residue == other.residue
    }
}

impl Eq for Lexicon {}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon::new(default_version())
    }
}

impl Lexicon {
    pub fn new(version: LiftVersion) -> Self {
        Self {
            declared_version: None,
            version,
            producer: None,
            header: None,
            entries: Vec::new(),
            residue: Residue::default(),
            index: Index::default(),
        }
    }

    pub fn version(&self) -> LiftVersion {
        self.version
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn ranges(&self) -> &[Range] {
        self.header
            .as_ref()
            .map(Header::ranges)
            .unwrap_or_default()
    }

    pub fn range(&self, id: &str) -> Option<&Range> {
        self.ranges().iter().find(|range| range.id == id)
    }

    /// Field definitions in force: the header's own, or the revision's defaults when the
    /// header declares none.
    pub fn field_definitions(&self) -> &[FieldDefinition] {
        match self.header.as_ref().map(Header::field_definitions) {
            Some(declared) if !declared.is_empty() => declared,
            _ => self.version.default_field_definitions(),
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Duplicate-id findings of the current index.
    pub fn index_diagnostics(&self) -> &[Diagnostic] {
        self.index.duplicates()
    }

    pub fn rebuild_index(&mut self) {
        let index = Index::build(&self.entries, self.ranges());
        self.index = index;
    }

    /// Apply an edit to the entries and header, then rebuild the index.
    pub fn update<R>(&mut self, edit: impl FnOnce(&mut Vec<Entry>, &mut Option<Header>) -> R) -> R {
        let result = edit(&mut self.entries, &mut self.header);
        self.rebuild_index();
        result
    }

    /// Append a new empty entry under a fresh id and return that id.
    pub fn add_entry(&mut self) -> RefId {
        let mut id = RefId::new(uuid::Uuid::new_v4().to_string());
        while self.index.contains(id.as_str()) {
            id = RefId::new(uuid::Uuid::new_v4().to_string());
        }
        self.update(|entries, _| entries.push(Entry::new(id.clone())));
        tracing::debug!(%id, "entry added");
        id
    }

    pub fn item_at(&self, location: &Location) -> Option<Item<'_>> {
        match location {
            Location::Entry(entry) => self.entries.get(*entry).map(Item::Entry),
            Location::Sense { entry, path } => {
                sense_at(self.entries.get(*entry)?, path).map(Item::Sense)
            }
            Location::Variant { entry, variant } => self
                .entries
                .get(*entry)?
                .variants
                .get(*variant)
                .map(Item::Variant),
            Location::Example {
                entry,
                path,
                example,
            } => sense_at(self.entries.get(*entry)?, path)?
                .examples
                .get(*example)
                .map(Item::Example),
            Location::Range(range) => self.ranges().get(*range).map(Item::Range),
            Location::RangeElement { range, element } => self
                .ranges()
                .get(*range)?
                .elements
                .get(*element)
                .map(Item::RangeElement),
        }
    }

    pub fn get_item_by_id(&self, id: &str) -> Result<Item<'_>, LookupError> {
        self.index
            .locate(id)
            .and_then(|location| self.item_at(&location))
            .ok_or_else(|| LookupError::NotFound(id.to_string()))
    }

    /// The entry, sense or range that owns the item with this id. `Ok(None)` for entries
    /// and ranges, which have no owner.
    pub fn get_item_parent_by_id(&self, id: &str) -> Result<Option<Item<'_>>, LookupError> {
        let location = self
            .index
            .locate(id)
            .ok_or_else(|| LookupError::NotFound(id.to_string()))?;
        Ok(location
            .parent()
            .and_then(|parent| self.item_at(&parent)))
    }

    pub fn resolve_target(&self, target: &RefId) -> Resolved<'_> {
        let raw = target.as_str().to_string();
        let target = self.get_item_by_id(&raw).map_err(|_| {
            Diagnostic::new(
                DiagnosticKind::UnresolvedReference,
                format!("reference to unknown id '{raw}'"),
            )
        });
        Resolved { raw, target }
    }

    pub fn resolve_relation(&self, relation: &Relation) -> Resolved<'_> {
        let mut resolved = self.resolve_target(&relation.target);
        if let Err(diagnostic) = &mut resolved.target {
            diagnostic.message = format!(
                "relation '{}' points at unknown id '{}'",
                relation.relation_type, resolved.raw
            );
        }
        resolved
    }

    /// Look a grammatical-info value up in the header's `grammatical-info` range.
    pub fn resolve_grammatical_info(&self, value: &str) -> Resolved<'_> {
        let target = self
            .range(GRAMMATICAL_INFO_RANGE)
            .and_then(|range| range.element(value))
            .map(Item::RangeElement)
            .ok_or_else(|| {
                Diagnostic::new(
                    DiagnosticKind::UnresolvedReference,
                    format!("grammatical-info '{value}' is not in the {GRAMMATICAL_INFO_RANGE} range"),
                )
            });
        Resolved {
            raw: value.to_string(),
            target,
        }
    }

    /// Resolve every reference in the lexicon and report the ones that point nowhere.
    pub fn check_references(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for (entry_index, entry) in self.entries.iter().enumerate() {
            let base = Location::Entry(entry_index).path();
            self.check_relations(&entry.relations, &base, &mut diagnostics);
            for (variant_index, variant) in entry.variants.iter().enumerate() {
                let path = format!("{base}/variant[{variant_index}]");
                if let Some(target) = &variant.target {
                    self.report(self.resolve_target(target), &path, &mut diagnostics);
                }
                self.check_relations(&variant.relations, &path, &mut diagnostics);
            }
            for (sense_index, sense) in entry.senses.iter().enumerate() {
                let path = format!("{base}/sense[{sense_index}]");
                self.check_sense(sense, &path, &mut diagnostics);
            }
        }
        tracing::debug!(unresolved = diagnostics.len(), "references checked");
        diagnostics
    }

    fn check_sense(&self, sense: &Sense, path: &str, diagnostics: &mut Diagnostics) {
        if let Some(value) = sense.get_grammatical_info() {
            let at = format!("{path}/grammatical-info");
            self.report(self.resolve_grammatical_info(value), &at, diagnostics);
        }
        self.check_relations(&sense.relations, path, diagnostics);
        for (index, reversal) in sense.reversals.iter().enumerate() {
            self.check_reversal(reversal, &format!("{path}/reversal[{index}]"), diagnostics);
        }
        for (index, subsense) in sense.subsenses.iter().enumerate() {
            self.check_sense(subsense, &format!("{path}/subsense[{index}]"), diagnostics);
        }
    }

    fn check_reversal(&self, reversal: &Reversal, path: &str, diagnostics: &mut Diagnostics) {
        if let Some(target) = &reversal.target {
            self.report(self.resolve_target(target), path, diagnostics);
        }
        if let Some(value) = reversal.grammatical_info.as_ref().map(|info| info.value.as_str()) {
            self.report(self.resolve_grammatical_info(value), path, diagnostics);
        }
        if let Some(main) = &reversal.main {
            self.check_reversal(main, &format!("{path}/main"), diagnostics);
        }
    }

    fn check_relations(&self, relations: &[Relation], path: &str, diagnostics: &mut Diagnostics) {
        for (index, relation) in relations.iter().enumerate() {
            let at = format!("{path}/relation[{index}]");
            self.report(self.resolve_relation(relation), &at, diagnostics);
        }
    }

    fn report(&self, resolved: Resolved<'_>, path: &str, diagnostics: &mut Diagnostics) {
        if let Err(diagnostic) = resolved.target {
            diagnostics.push(diagnostic.at(path));
        }
    }

    /// The lexicon as its root element.
    pub fn to_element(&self) -> Element {
        to_element(self, "lift", self.version)
    }
}

impl fmt::Display for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIFT lexicon v{}", self.version)?;
        if let Some(producer) = &self.producer {
            write!(f, "; produced by {producer}")?;
        }
        Ok(())
    }
}

impl LiftNode for Lexicon {
    fn schema(_version: LiftVersion) -> TypeSchema {
        LIFT
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        let declared: Option<String> = bound.attr("version", ctx)?;
        let known = declared.as_deref().and_then(LiftVersion::from_declared);
        let version = match known {
            Some(version) => version,
            None => {
                let fallback = default_version();
                let message = match &declared {
                    Some(text) => format!("unknown version '{text}', reading as {fallback}"),
                    None => format!("no version declared, reading as {fallback}"),
                };
                ctx.report(Diagnostic::new(DiagnosticKind::UnknownVersion, message));
                fallback
            }
        };
        ctx.set_version(version);

        let mut lexicon = Lexicon {
            declared_version: declared.filter(|_| known.is_none()),
            version,
            producer: bound.attr("producer", ctx)?,
            header: bound.one("header", ctx)?,
            entries: bound.many("entry", ctx)?,
            residue: Residue::default(),
            index: Index::default(),
        };
        lexicon.residue = bound.finish();
        lexicon.rebuild_index();
        tracing::debug!(
            entries = lexicon.entries.len(),
            version = %lexicon.version,
            "lexicon mapped"
        );
        Ok(lexicon)
    }

    fn emit(&self, out: &mut Emitter) {
        let version = self
            .declared_version
            .clone()
            .unwrap_or_else(|| self.version.as_str().to_string());
        out.attr("version", Some(&version));
        out.attr("producer", self.producer.as_ref());
        out.one("header", self.header.as_ref());
        out.many("entry", &self.entries);
        out.residue(&self.residue);
    }
}

/// Map a `lift` root into a lexicon, leaving the context open for further load steps.
pub(crate) fn map_root(root: Element, options: &LoadOptions) -> LiftResult<(Lexicon, MapContext)> {
    if root.name != "lift" {
        return Err(LiftError::UnexpectedRoot {
            expected: "lift",
            found: root.name,
        });
    }
    let mut ctx = MapContext::new(default_version()).with_strict_dates(options.strict_dates);
    ctx.enter("lift");
    let lexicon = map_element::<Lexicon>(root, &mut ctx)?;
    ctx.leave();
    Ok((lexicon, ctx))
}

/// Record the index and range findings and hand out the result.
pub(crate) fn finish_load(lexicon: Lexicon, mut ctx: MapContext) -> Loaded {
    for duplicate in lexicon.index_diagnostics() {
        ctx.report(duplicate.clone());
    }
    for (range_index, range) in lexicon.ranges().iter().enumerate() {
        for cycle in range.find_cycles() {
            ctx.report(
                Diagnostic::new(
                    DiagnosticKind::RangeCycle,
                    format!(
                        "range '{}' hierarchy loops through {}",
                        range.id,
                        cycle.join(" -> ")
                    ),
                )
                .at(Location::Range(range_index).path()),
            );
        }
    }
    Loaded {
        lexicon,
        diagnostics: ctx.into_diagnostics(),
    }
}

/// Build a lexicon from a parsed document tree.
pub fn to_lexicon(root: Element, options: &LoadOptions) -> LiftResult<Loaded> {
    let (lexicon, ctx) = map_root(root, options)?;
    Ok(finish_load(lexicon, ctx))
}
