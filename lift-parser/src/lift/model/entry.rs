use super::base::Extensible;
use super::multitext::Multitext;
use super::satellite::{Etymology, Note, Phonetic, Relation, Variant};
use super::sense::Sense;
use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{DateTime, Key, RefId, ScalarKind};
use crate::lift::schema::{Cardinality, FieldSchema, TypeSchema, EXTENSIBLE};
use crate::lift::serializing::Emitter;
use crate::lift::util::ellipsize;
use crate::lift::version::LiftVersion;
use std::fmt;

use Cardinality::{Optional, Repeated};

const ENTRY: TypeSchema = TypeSchema::new(
    "entry",
    &[
        &[
            FieldSchema::attribute("id", Optional, ScalarKind::RefId),
            FieldSchema::attribute("guid", Optional, ScalarKind::Key),
            FieldSchema::attribute("order", Optional, ScalarKind::Integer),
            FieldSchema::attribute("dateDeleted", Optional, ScalarKind::DateTime),
            FieldSchema::child("lexical-unit", Optional),
            FieldSchema::child("citation", Repeated),
            FieldSchema::child("pronunciation", Repeated),
            FieldSchema::child("variant", Repeated),
            FieldSchema::child("sense", Repeated),
            FieldSchema::child("note", Repeated),
            FieldSchema::child("relation", Repeated),
            FieldSchema::child("etymology", Repeated),
        ],
        EXTENSIBLE,
    ],
);

/// Width of the headword column in summary lines.
pub const HEADWORD_WIDTH: usize = 20;
/// Width of the gloss column in summary lines.
pub const GLOSS_WIDTH: usize = 30;

/// A dictionary entry.
///
/// Entries with `date_deleted` set are tombstones: they stay in the lexicon so that merging
/// tools can see the deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub id: RefId,
    pub guid: Option<Key>,
    /// Homograph number.
    pub order: Option<u32>,
    pub date_deleted: Option<DateTime>,
    pub lexical_unit: Option<Multitext>,
    pub citations: Vec<Multitext>,
    pub pronunciations: Vec<Phonetic>,
    pub variants: Vec<Variant>,
    pub senses: Vec<Sense>,
    pub notes: Vec<Note>,
    pub relations: Vec<Relation>,
    pub etymologies: Vec<Etymology>,
    pub ext: Extensible,
    pub residue: Residue,
}

impl Entry {
    pub fn new(id: impl Into<RefId>) -> Self {
        Self {
            id: id.into(),
            ext: Extensible::created_now(),
            ..Self::default()
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.date_deleted.is_some()
    }

    /// Headword: the lexical unit in collated order, `""` if there is none.
    pub fn headword(&self) -> String {
        self.lexical_unit
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// The gloss of the sense at `sense_index` in `lang`.
    ///
    /// `None` when the sense does not exist or has no gloss in that language; display code
    /// is expected to render that as empty.
    pub fn get_gloss(&self, sense_index: usize, lang: &str) -> Option<&str> {
        self.senses
            .get(sense_index)?
            .glosses
            .iter()
            .find(|gloss| gloss.lang.matches(lang))
            .map(|gloss| gloss.as_str())
    }

    /// Grammatical-info of the first sense that has one.
    pub fn get_grammatical_info(&self) -> Option<&str> {
        self.senses.iter().find_map(Sense::get_grammatical_info)
    }

    /// `headword \t glosses \t id` with the default column widths.
    pub fn get_summary_line(&self, lang: &str) -> String {
        self.summary_line_with(lang, HEADWORD_WIDTH, GLOSS_WIDTH)
    }

    /// Summary line with explicit column widths. Glosses of all senses in `lang` are joined
    /// with `; `; senses without one in that language are skipped.
    pub fn summary_line_with(&self, lang: &str, headword_width: usize, gloss_width: usize) -> String {
        let headword = ellipsize(&self.headword(), headword_width);
        let glosses: Vec<&str> = (0..self.senses.len())
            .filter_map(|index| self.get_gloss(index, lang))
            .collect();
        let glosses = ellipsize(&glosses.join("; "), gloss_width);
        format!(
            "{headword:headword_width$}\t{glosses:gloss_width$}\t{}",
            self.id
        )
    }

    /// All senses, subsenses included, depth first.
    pub fn all_senses(&self) -> Vec<&Sense> {
        self.senses.iter().flat_map(Sense::descendants).collect()
    }

    pub fn set_lexical_unit(&mut self, lexical_unit: Multitext) {
        self.lexical_unit = Some(lexical_unit);
        self.ext.touch();
    }

    pub fn add_citation(&mut self, citation: Multitext) -> usize {
        self.citations.push(citation);
        self.ext.touch();
        self.citations.len() - 1
    }

    pub fn add_sense(&mut self, sense: Sense) -> usize {
        self.senses.push(sense);
        self.ext.touch();
        self.senses.len() - 1
    }

    pub fn add_note(&mut self, note: Note) -> usize {
        self.notes.push(note);
        self.ext.touch();
        self.notes.len() - 1
    }

    pub fn add_variant(&mut self, variant: Variant) -> usize {
        self.variants.push(variant);
        self.ext.touch();
        self.variants.len() - 1
    }

    pub fn add_relation(&mut self, relation: Relation) -> usize {
        self.relations.push(relation);
        self.ext.touch();
        self.relations.len() - 1
    }

    pub fn add_etymology(&mut self, etymology: Etymology) -> usize {
        self.etymologies.push(etymology);
        self.ext.touch();
        self.etymologies.len() - 1
    }

    pub fn add_pronunciation(&mut self, pronunciation: Phonetic) -> usize {
        self.pronunciations.push(pronunciation);
        self.ext.touch();
        self.pronunciations.len() - 1
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_summary_line("en"))
    }
}

/// Identifier for an entry without an `id` attribute: its guid when it has one, a fresh
/// random one otherwise.
fn generated_id(guid: Option<&Key>) -> RefId {
    match guid {
        Some(guid) if !guid.as_str().is_empty() => RefId::new(guid.as_str()),
        _ => RefId::new(uuid::Uuid::new_v4().to_string()),
    }
}

impl LiftNode for Entry {
    fn schema(_version: LiftVersion) -> TypeSchema {
        ENTRY
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        let id: Option<RefId> = bound.attr("id", ctx)?;
        let guid: Option<Key> = bound.attr("guid", ctx)?;
        let id = match id {
            Some(id) => id,
            None => {
                // An empty id is reported but not kept: the generated one replaces it.
                bound.discard_raw("id");
                let id = generated_id(guid.as_ref());
                tracing::debug!(%id, path = %ctx.path(), "entry without id");
                id
            }
        };
        Ok(Entry {
            id,
            guid,
            order: bound.attr("order", ctx)?,
            date_deleted: bound.date("dateDeleted", ctx)?,
            lexical_unit: bound.one("lexical-unit", ctx)?,
            citations: bound.many("citation", ctx)?,
            pronunciations: bound.many("pronunciation", ctx)?,
            variants: bound.many("variant", ctx)?,
            senses: bound.many("sense", ctx)?,
            notes: bound.many("note", ctx)?,
            relations: bound.many("relation", ctx)?,
            etymologies: bound.many("etymology", ctx)?,
            ext: Extensible::take(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("id", Some(&self.id));
        out.attr("guid", self.guid.as_ref());
        out.attr("order", self.order.as_ref());
        out.attr("dateDeleted", self.date_deleted.as_ref());
        out.one("lexical-unit", self.lexical_unit.as_ref());
        out.many("citation", &self.citations);
        out.many("pronunciation", &self.pronunciations);
        out.many("variant", &self.variants);
        out.many("sense", &self.senses);
        out.many("note", &self.notes);
        out.many("relation", &self.relations);
        out.many("etymology", &self.etymologies);
        self.ext.emit_into(out);
        out.residue(&self.residue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::mapping::map_element;
    use crate::lift::markup::parse_str;
    use crate::lift::model::base::Gloss;
    use crate::lift::serializing::to_element;

    fn map(source: &str) -> (Entry, usize) {
        let mut ctx = MapContext::new(LiftVersion::V0_15);
        let entry = map_element(parse_str(source).expect("well-formed"), &mut ctx).expect("maps");
        (entry, ctx.diagnostics().len())
    }

    fn pepe() -> Entry {
        let mut entry = Entry::new("pepe_1");
        entry.set_lexical_unit(Multitext::from_pairs([("seh", "pëpe")]));
        let mut sense = Sense::new(Some("pepe_1_s1"));
        sense.add_gloss(Gloss::new("en", "house"));
        entry.add_sense(sense);
        entry
    }

    #[test]
    fn test_entry_without_senses_maps_cleanly() {
        let (entry, diagnostics) = map(r#"<entry id="a"><lexical-unit><form lang="seh"><text>a</text></form></lexical-unit></entry>"#);
        assert!(entry.senses.is_empty());
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let (with_guid, _) = map(r#"<entry guid="0ae89610-fc01-4bfd-a0d6-1125b7281d22"/>"#);
        assert_eq!(with_guid.id, "0ae89610-fc01-4bfd-a0d6-1125b7281d22");
        let (first, _) = map("<entry/>");
        let (second, _) = map("<entry/>");
        assert!(!first.id.as_str().is_empty());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_empty_id_is_replaced_and_round_trips() {
        let (entry, diagnostics) = map(r#"<entry id="" guid="0ae89610-fc01-4bfd-a0d6-1125b7281d22"/>"#);
        assert_eq!(entry.id, "0ae89610-fc01-4bfd-a0d6-1125b7281d22");
        assert!(entry.residue.attributes.is_empty());
        assert_eq!(diagnostics, 1);

        let (entry, _) = map(r#"<entry id=""/>"#);
        let element = to_element(&entry, "entry", LiftVersion::V0_15);
        let mut ctx = MapContext::new(LiftVersion::V0_15);
        assert_eq!(map_element::<Entry>(element, &mut ctx).expect("maps back"), entry);
    }

    #[test]
    fn test_summary_line_contains_headword_and_gloss() {
        let line = pepe().get_summary_line("en");
        assert!(line.contains("pëpe"));
        assert!(line.contains("house"));
        assert!(line.ends_with("\tpepe_1"));
    }

    #[test]
    fn test_get_gloss_uses_missing_sentinel() {
        let entry = pepe();
        assert_eq!(entry.get_gloss(0, "en"), Some("house"));
        assert_eq!(entry.get_gloss(0, "fr"), None);
        assert_eq!(entry.get_gloss(5, "en"), None);
    }

    #[test]
    fn test_deleted_entry_round_trips_as_tombstone() {
        let (entry, _) = map(r#"<entry id="gone" dateDeleted="2011-03-01T10:00:00Z"/>"#);
        assert!(entry.is_deleted());
        let element = to_element(&entry, "entry", LiftVersion::V0_15);
        assert_eq!(element.attribute("dateDeleted"), Some("2011-03-01T10:00:00Z"));
        let mut ctx = MapContext::new(LiftVersion::V0_15);
        assert_eq!(map_element::<Entry>(element, &mut ctx).expect("maps back"), entry);
    }

    #[test]
    fn test_built_entry_round_trips() {
        let entry = pepe();
        let element = to_element(&entry, "entry", LiftVersion::V0_13);
        let mut ctx = MapContext::new(LiftVersion::V0_13);
        assert_eq!(map_element::<Entry>(element, &mut ctx).expect("maps back"), entry);
    }
}
