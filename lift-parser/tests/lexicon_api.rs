//! Loading, lookup and reference resolution against the curated samples and fixtures.

use lift_parser::lift::lexicon::{MatchKind, SearchField};
use lift_parser::lift::loader::{load, LiftFile, LoadOptions};
use lift_parser::lift::scalar::DateTime;
use lift_parser::lift::testing::{load_sample, load_str};
use lift_parser::lift::util::unicode_sort;
use lift_parser::{DiagnosticKind, Item, LiftError, LookupError};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_sample_loads_without_diagnostics() {
    let loaded = load_sample().expect("sample loads");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert!(loaded.lexicon.check_references().is_empty());
    assert_eq!(loaded.lexicon.len(), 3);
    assert_eq!(
        loaded.lexicon.producer.as_deref(),
        Some("SIL.FLEx 8.3.12")
    );
}

#[test]
fn test_lookup_returns_the_same_item() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    let first = lexicon.get_item_by_id("embe_s1.1").expect("subsense");
    let second = lexicon.get_item_by_id("embe_s1.1").expect("subsense");
    match (first, second) {
        (Item::Sense(a), Item::Sense(b)) => assert!(std::ptr::eq(a, b)),
        other => panic!("expected senses, got {other:?}"),
    }
    let parent = lexicon
        .get_item_parent_by_id("embe_s1.1")
        .expect("known id")
        .expect("has a parent");
    assert_eq!(parent.id(), "embe_s1");
}

#[test]
fn test_unknown_id_is_not_found() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    assert_eq!(
        lexicon.get_item_by_id("nope").unwrap_err(),
        LookupError::NotFound("nope".to_string())
    );
}

#[test]
fn test_grammatical_info_resolves_to_range_element() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    let resolved = lexicon.resolve_grammatical_info("Noun");
    match resolved.item() {
        Some(Item::RangeElement(element)) => assert_eq!(element.abbrev("en"), Some("n")),
        other => panic!("expected a range element, got {other:?}"),
    }
}

#[test]
fn test_tolerant_document_loads_with_diagnostics() {
    let loaded = load(fixture("tolerant.lift"), &LoadOptions::default()).expect("loads");
    let entry = &loaded.lexicon.entries()[0];
    assert_eq!(entry.id, "0b1e2c3d-4f50-4a6b-8c7d-9e0f1a2b3c4d");
    assert_eq!(
        entry.ext.date_created,
        Some(DateTime::Unparsed("last tuesday".to_string()))
    );
    assert_eq!(entry.residue.elements().count(), 1);

    let malformed: Vec<_> = loaded
        .diagnostics
        .of_kind(DiagnosticKind::MalformedValue)
        .collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].context, "/lift/entry[0]");

    let unresolved = loaded.lexicon.check_references();
    let contexts: Vec<_> = unresolved.iter().map(|d| d.context.as_str()).collect();
    assert_eq!(
        contexts,
        vec![
            "/lift/entry[0]/relation[0]",
            "/lift/entry[0]/sense[0]/grammatical-info",
        ]
    );
}

#[test]
fn test_strict_dates_reject_tolerant_document() {
    let options = LoadOptions {
        strict_dates: true,
        ..LoadOptions::default()
    };
    let err = load(fixture("tolerant.lift"), &options).expect_err("bad date");
    assert!(matches!(err, LiftError::SchemaViolation { .. }), "got {err:?}");
}

#[test]
fn test_duplicate_ids_are_reported_and_first_wins() {
    let loaded = load(fixture("duplicates.lift"), &LoadOptions::default()).expect("loads");
    let duplicates: Vec<_> = loaded
        .diagnostics
        .of_kind(DiagnosticKind::DuplicateId)
        .collect();
    assert_eq!(duplicates.len(), 2);
    let sense = loaded.lexicon.get_item_by_id("kala_s1").expect("sense");
    assert_eq!(sense.as_sense().and_then(|s| s.get_gloss("en")), Some("crab"));
}

#[test]
fn test_unknown_version_is_kept_and_reported() {
    let loaded = load(fixture("unknown_version.lift"), &LoadOptions::default()).expect("loads");
    assert_eq!(loaded.lexicon.declared_version.as_deref(), Some("0.12"));
    assert_eq!(
        loaded
            .diagnostics
            .of_kind(DiagnosticKind::UnknownVersion)
            .count(),
        1
    );
}

#[test]
fn test_truncated_document_is_malformed() {
    let err = load(fixture("truncated.lift"), &LoadOptions::default()).expect_err("truncated");
    assert!(err.is_malformed(), "got {err:?}");
    let err = LiftFile::from_string("<lift><entry id=\"a\"></lift>").expect_err("unclosed");
    assert!(err.is_malformed());
}

#[test]
fn test_find_by_gloss_and_custom_field() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    let found = lexicon
        .find("home", &SearchField::Gloss, MatchKind::Exact)
        .expect("valid query")
        .expect("a match");
    assert_eq!(found.id(), "nyumba_s1");
    assert!(lexicon
        .find("x", &SearchField::from("no-such-field"), MatchKind::Contains)
        .is_err());
}

#[test]
fn test_summary_lines_are_collated() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    let lines = lexicon.summary_lines("en");
    let heads: Vec<_> = lines
        .iter()
        .map(|line| line.split('\t').next().unwrap_or_default().trim_end())
        .collect();
    assert_eq!(heads, vec!["èmbe", "nyumba", "pëpe"]);
    assert!(lines[2].contains("house"));
    assert!(lines[2].ends_with("pepe_1"));
}

#[test]
fn test_unicode_sort_ignores_case_and_accents() {
    assert_eq!(
        unicode_sort(["zebra", "Émile", "apple", "éclair"]),
        vec!["apple", "éclair", "Émile", "zebra"]
    );
}

#[test]
fn test_writing_systems() {
    let lexicon = load_str(lift_parser::lift::testing::SAMPLE)
        .expect("sample loads")
        .lexicon;
    let systems = lexicon.writing_systems();
    assert!(systems.vernacular.iter().any(|lang| lang.as_str() == "seh"));
    assert!(systems.analysis.iter().any(|lang| lang.as_str() == "en"));
}

#[test]
fn test_entry_without_senses_is_fine() {
    let loaded = load_str(r#"<lift version="0.13"><entry id="solo"/></lift>"#).expect("loads");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert!(loaded.lexicon.entries()[0].senses.is_empty());
}

#[test]
fn test_summary_line_has_headword_and_gloss() {
    let lexicon = load_sample().expect("sample loads").lexicon;
    let entry = lexicon
        .get_item_by_id("pepe_1")
        .expect("entry")
        .as_entry()
        .expect("an entry");
    let line = entry.get_summary_line("en");
    assert!(line.contains("pëpe"));
    assert!(line.contains("house"));
    assert_eq!(entry.get_gloss(5, "en"), None);
    assert_eq!(entry.get_gloss(0, "fr"), None);
}

#[test]
fn test_unknown_grammatical_info_keeps_raw_value() {
    let loaded = load_str(
        r#"<lift version="0.13">
  <header><ranges><range id="grammatical-info"><range-element id="Noun"/></range></ranges></header>
  <entry id="a"><sense id="a1"><grammatical-info value="Noun"/></sense></entry>
  <entry id="b"><sense id="b1"><grammatical-info value="Adverb"/></sense></entry>
</lift>"#,
    )
    .expect("loads");
    let lexicon = &loaded.lexicon;
    let noun = lexicon.entries()[0].get_grammatical_info().expect("value");
    assert_eq!(noun, "Noun");
    assert!(lexicon.resolve_grammatical_info(noun).is_resolved());

    let adverb = lexicon.entries()[1].get_grammatical_info().expect("value");
    assert_eq!(adverb, "Adverb");
    let resolved = lexicon.resolve_grammatical_info(adverb);
    assert!(!resolved.is_resolved());
    assert_eq!(resolved.raw, "Adverb");
    assert_eq!(lexicon.check_references().len(), 1);
}
