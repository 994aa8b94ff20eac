//! Round trip tests
//!
//! Serializing a lexicon and reading the output back must give an equal model. Equality is
//! on values: attribute order and indentation are not preserved, whitespace inside text is.

use lift_parser::lift::loader::{load, LoadOptions};
use lift_parser::lift::markup::{Element, Node};
use lift_parser::lift::model::{Annotation, Entry, Field, Gloss, Multitext, Sense, Span, Text};
use lift_parser::lift::testing::{assert_round_trip, load_sample, load_str, SAMPLE_0_15};
use lift_parser::{Lexicon, LiftVersion};
use proptest::prelude::*;
use rstest::rstest;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_sample_round_trips() {
    let loaded = load_sample().expect("sample loads");
    assert_round_trip(&loaded.lexicon);
}

#[test]
fn test_latest_sample_round_trips() {
    let loaded = load_str(SAMPLE_0_15).expect("sample loads");
    assert_eq!(loaded.lexicon.version(), LiftVersion::V0_15);
    assert_round_trip(&loaded.lexicon);
}

#[rstest]
#[case("duplicates.lift")]
#[case("tolerant.lift")]
#[case("unknown_version.lift")]
fn test_fixture_round_trips(#[case] name: &str) {
    let loaded = load(fixture(name), &LoadOptions::default()).expect("fixture loads");
    assert_round_trip(&loaded.lexicon);
}

#[test]
fn test_edited_lexicon_round_trips() {
    let mut lexicon = load_sample().expect("sample loads").lexicon;
    let id = lexicon.add_entry();
    lexicon.update(|entries, _| {
        if let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) {
            entry.set_lexical_unit(Multitext::from_pairs([("seh", "nkhuku")]));
            let mut sense = Sense::new(Some("nkhuku_s1"));
            sense.add_gloss(Gloss::new("en", "chicken"));
            entry.add_sense(sense);
        }
    });
    assert_round_trip(&lexicon);
}

fn word_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zàèëìòù][a-zàèëìòù ]{0,11}",
        "[a-z]{1,6} & [a-z]{1,6}",
        "[a-z]{1,4}<[a-z]{1,4}>",
        " {1,3}",
        " [a-z]{1,5} ",
    ]
}

/// Text built from segments; `true` segments are wrapped in a span.
fn text_strategy() -> impl Strategy<Value = Text> {
    let segment = prop_oneof![
        "[a-z]{1,4}",
        Just(" ".to_string()),
        Just("  ".to_string()),
    ];
    prop_oneof![
        word_strategy().prop_map(|content| Text::new(content)),
        prop::collection::vec((segment, any::<bool>()), 1..5).prop_map(|segments| {
            let mut text = Text::default();
            for (segment, spanned) in segments {
                let start = text.content.len();
                text.content.push_str(&segment);
                if spanned {
                    text.spans
                        .push(Span::new(start, text.content.len()).with_lang("seh"));
                }
            }
            text
        }),
    ]
}

#[derive(Debug, Clone)]
struct GeneratedEntry {
    id: String,
    unit: Text,
    glosses: Vec<Text>,
    traits: Vec<(String, String)>,
    field: Option<Text>,
    annotated: bool,
    unknown_child: Option<String>,
}

fn entry_strategy() -> impl Strategy<Value = GeneratedEntry> {
    (
        "[a-z]{2,8}_[0-9]{1,3}",
        text_strategy(),
        prop::collection::vec(text_strategy(), 0..3),
        prop::collection::vec(("[a-z]{1,8}", "[a-z0-9.]{1,8}"), 0..3),
        prop::option::of(text_strategy()),
        any::<bool>(),
        prop::option::of("[a-z][a-z ]{0,8}"),
    )
        .prop_map(
            |(id, unit, glosses, traits, field, annotated, unknown_child)| GeneratedEntry {
                id,
                unit,
                glosses,
                traits,
                field,
                annotated,
                unknown_child,
            },
        )
}

fn build_entry(generated: &GeneratedEntry) -> Entry {
    let mut entry = Entry::new(generated.id.as_str());
    entry.set_lexical_unit(Multitext::from_pairs([("seh", generated.unit.clone())]));
    let mut sense = Sense::new(None);
    for gloss in &generated.glosses {
        sense.add_gloss(Gloss::new("en", gloss.clone()));
    }
    entry.add_sense(sense);
    for (name, value) in &generated.traits {
        entry.ext.add_trait(name.as_str(), value.as_str());
    }
    if let Some(content) = &generated.field {
        entry.ext.add_field(Field::new(
            "literal-meaning",
            Multitext::from_pairs([("en", content.clone())]),
        ));
    }
    if generated.annotated {
        let mut annotation = Annotation::new("reviewed", "yes");
        annotation.who = Some("jd".to_string());
        entry.ext.annotations.push(annotation);
    }
    if let Some(text) = &generated.unknown_child {
        entry.residue.attributes.push(("x-status".to_string(), "draft".to_string()));
        entry.residue.children.push(Node::Element(
            Element::new("x-custom")
                .with_attribute("kind", "note")
                .with_text(format!("keep {text}")),
        ));
    }
    entry
}

proptest! {
    #[test]
    fn prop_generated_lexicons_round_trip(
        entries in prop::collection::vec(entry_strategy(), 0..6),
        latest in any::<bool>(),
    ) {
        let version = if latest { LiftVersion::V0_15 } else { LiftVersion::V0_13 };
        let mut lexicon = Lexicon::new(version);
        lexicon.update(|list, _| list.extend(entries.iter().map(build_entry)));
        assert_round_trip(&lexicon);
    }
}
