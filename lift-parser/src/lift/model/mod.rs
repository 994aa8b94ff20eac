//! The typed lexicon model
//!
//!     text, multitext   language-tagged text with inline spans
//!     base              gloss, trait, flag, annotation, url reference, custom field and the
//!                       Extensible block they hang off
//!     satellite         note, pronunciation, etymology, translation, example, relation, variant
//!     sense             sense, grammatical-info, reversal
//!     entry             entry
//!     header            header, ranges, field definitions
//!
//! Every type implements [`LiftNode`](crate::lift::mapping::LiftNode): it names its schema per
//! format revision and moves values between that schema's slots and its own fields.

pub mod base;
pub mod entry;
pub mod header;
pub mod multitext;
pub mod satellite;
pub mod sense;
pub mod text;

pub use base::{Annotation, Extensible, Field, Flag, Gloss, Trait, UrlRef};
pub use entry::Entry;
pub use header::{
    Ancestors, FieldDefinition, FieldDefinitions, Header, Range, RangeElement, Ranges,
};
pub use multitext::{Form, Multitext};
pub use satellite::{Etymology, Example, Note, Phonetic, Relation, Translation, Variant};
pub use sense::{GrammaticalInfo, Reversal, Sense};
pub use text::{Span, Text};

use crate::lift::lexicon::Lexicon;
use crate::lift::mapping::LiftNode;
use crate::lift::schema::TypeSchema;
use crate::lift::version::LiftVersion;

/// Tags that hold a standalone multitext.
pub const MULTITEXT_TAGS: &[&str] = &[
    "lexical-unit",
    "citation",
    "definition",
    "label",
    "description",
    "usage",
    "abbrev",
];

/// The schemas an element tag maps through in `version`.
///
/// `field` is both a custom field and, inside the header's `fields`, a field definition, so a
/// tag can have more than one schema. Unknown tags have none.
pub fn schemas_for(tag: &str, version: LiftVersion) -> Vec<TypeSchema> {
    let schema = match tag {
        "lift" => Lexicon::schema(version),
        "header" => Header::schema(version),
        "ranges" => Ranges::schema(version),
        "range" => Range::schema(version),
        "range-element" => RangeElement::schema(version),
        "fields" => FieldDefinitions::schema(version),
        "field" => return vec![Field::schema(version), FieldDefinition::schema(version)],
        "entry" => Entry::schema(version),
        "sense" | "subsense" => Sense::schema(version),
        "grammatical-info" => GrammaticalInfo::schema(version),
        "reversal" | "main" => Reversal::schema(version),
        "note" => Note::schema(version),
        "pronunciation" => Phonetic::schema(version),
        "etymology" => Etymology::schema(version),
        "translation" => Translation::schema(version),
        "example" => Example::schema(version),
        "relation" => Relation::schema(version),
        "variant" => Variant::schema(version),
        "gloss" => Gloss::schema(version),
        "trait" => Trait::schema(version),
        "flag" => Flag::schema(version),
        "annotation" => Annotation::schema(version),
        "illustration" | "media" => UrlRef::schema(version),
        "form" => Form::schema(version),
        "text" => Text::schema(version),
        "span" => text::SPAN_SCHEMA,
        tag if MULTITEXT_TAGS.contains(&tag) => Multitext::schema(version),
        _ => return Vec::new(),
    };
    vec![schema]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("entry", 1)]
    #[case("subsense", 1)]
    #[case("lexical-unit", 1)]
    #[case("field", 2)]
    #[case("nonsense", 0)]
    fn test_schemas_for_tags(#[case] tag: &str, #[case] count: usize) {
        assert_eq!(schemas_for(tag, LiftVersion::LATEST).len(), count);
    }

    #[test]
    fn test_field_definition_schema_follows_version() {
        let legacy = schemas_for("field", LiftVersion::V0_13);
        assert!(legacy[1].properties().get("tag").is_some());
        let latest = schemas_for("field", LiftVersion::V0_15);
        assert!(latest[1].properties().get("option-range").is_some());
    }
}
