//! Read-only queries over a lexicon: search, writing-system inference and summary lines.

use super::{Item, Lexicon};
use crate::lift::error::QueryError;
use crate::lift::model::{Entry, Field, Multitext, Sense};
use crate::lift::scalar::Lang;
use crate::lift::util::unicode_sort;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How a search term is compared with field content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive substring.
    #[default]
    Contains,
    Exact,
    Regex,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Contains => "contains",
            MatchKind::Exact => "exact",
            MatchKind::Regex => "regex",
        }
    }
}

impl FromStr for MatchKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(MatchKind::Contains),
            "exact" => Ok(MatchKind::Exact),
            "regex" => Ok(MatchKind::Regex),
            other => Err(QueryError::UnknownMatch(other.to_string())),
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field a search looks at. Entry fields yield entries, sense fields yield senses,
/// custom fields yield whichever carries them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchField {
    LexicalUnit,
    Variant,
    #[default]
    Gloss,
    Definition,
    GrammaticalInfo,
    /// A custom field, by the name its header definition gives it.
    Custom(String),
}

impl SearchField {
    pub fn name(&self) -> &str {
        match self {
            SearchField::LexicalUnit => "lexical-unit",
            SearchField::Variant => "variant",
            SearchField::Gloss => "gloss",
            SearchField::Definition => "definition",
            SearchField::GrammaticalInfo => "grammatical-info",
            SearchField::Custom(name) => name,
        }
    }

    fn on_entries(&self) -> bool {
        matches!(
            self,
            SearchField::LexicalUnit | SearchField::Variant | SearchField::Custom(_)
        )
    }

    fn on_senses(&self) -> bool {
        !matches!(self, SearchField::LexicalUnit | SearchField::Variant)
    }
}

impl From<&str> for SearchField {
    fn from(name: &str) -> Self {
        match name {
            "lexical-unit" => SearchField::LexicalUnit,
            "variant" => SearchField::Variant,
            "gloss" => SearchField::Gloss,
            "definition" => SearchField::Definition,
            "grammatical-info" => SearchField::GrammaticalInfo,
            other => SearchField::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Matcher {
    kind: MatchKind,
    term: String,
    pattern: Option<Regex>,
}

impl Matcher {
    fn new(term: &str, kind: MatchKind) -> Result<Self, QueryError> {
        let pattern = match kind {
            MatchKind::Regex => Some(Regex::new(term)?),
            _ => None,
        };
        let term = match kind {
            MatchKind::Contains => term.to_lowercase(),
            _ => term.to_string(),
        };
        Ok(Self {
            kind,
            term,
            pattern,
        })
    }

    fn is_match(&self, candidate: &str) -> bool {
        match (self.kind, &self.pattern) {
            (MatchKind::Contains, _) => candidate.to_lowercase().contains(&self.term),
            (MatchKind::Exact, _) => candidate == self.term,
            (MatchKind::Regex, Some(pattern)) => pattern.is_match(candidate),
            (MatchKind::Regex, None) => false,
        }
    }

    fn any<'t>(&self, candidates: impl IntoIterator<Item = &'t str>) -> bool {
        candidates.into_iter().any(|candidate| self.is_match(candidate))
    }
}

/// Text of every form, plus the legacy bare text.
fn texts(multitext: &Multitext) -> impl Iterator<Item = &str> {
    multitext
        .forms
        .iter()
        .map(|form| form.as_str())
        .chain(multitext.text.as_ref().map(|text| text.as_str()))
}

fn custom<'a>(fields: &'a [Field], name: &'a str) -> impl Iterator<Item = &'a str> {
    fields
        .iter()
        .filter(move |field| field.name == name)
        .flat_map(|field| texts(&field.content))
}

fn entry_matches(entry: &Entry, field: &SearchField, matcher: &Matcher) -> bool {
    match field {
        SearchField::LexicalUnit => entry
            .lexical_unit
            .as_ref()
            .is_some_and(|unit| matcher.any(texts(unit))),
        SearchField::Variant => entry
            .variants
            .iter()
            .any(|variant| matcher.any(texts(&variant.content))),
        SearchField::Custom(name) => matcher.any(custom(&entry.ext.fields, name)),
        _ => false,
    }
}

fn sense_matches(sense: &Sense, field: &SearchField, matcher: &Matcher) -> bool {
    match field {
        SearchField::Gloss => matcher.any(sense.glosses.iter().map(|gloss| gloss.as_str())),
        SearchField::Definition => sense
            .definition
            .as_ref()
            .is_some_and(|definition| matcher.any(texts(definition))),
        SearchField::GrammaticalInfo => matcher.any(sense.get_grammatical_info()),
        SearchField::Custom(name) => matcher.any(custom(&sense.ext.fields, name)),
        _ => false,
    }
}

/// Languages in use, in first-seen order. Vernacular languages are those of headwords,
/// citations, variants, pronunciations and examples; analysis languages those of glosses,
/// definitions, translations and notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WritingSystems {
    pub vernacular: Vec<Lang>,
    pub analysis: Vec<Lang>,
}

impl WritingSystems {
    fn add(list: &mut Vec<Lang>, lang: &Lang) {
        if !list.contains(lang) {
            list.push(lang.clone());
        }
    }

    fn vernacular_of(&mut self, multitext: &Multitext) {
        for form in &multitext.forms {
            Self::add(&mut self.vernacular, &form.lang);
        }
    }

    fn analysis_of(&mut self, multitext: &Multitext) {
        for form in &multitext.forms {
            Self::add(&mut self.analysis, &form.lang);
        }
    }

    fn sense(&mut self, sense: &Sense) {
        for gloss in &sense.glosses {
            Self::add(&mut self.analysis, &gloss.lang);
        }
        if let Some(definition) = &sense.definition {
            self.analysis_of(definition);
        }
        for note in &sense.notes {
            self.analysis_of(&note.content);
        }
        for example in &sense.examples {
            self.vernacular_of(&example.content);
            for translation in &example.translations {
                self.analysis_of(&translation.content);
            }
        }
        for subsense in &sense.subsenses {
            self.sense(subsense);
        }
    }
}

impl Lexicon {
    /// The first entry or sense whose `field` matches `text`.
    pub fn find(
        &self,
        text: &str,
        field: &SearchField,
        kind: MatchKind,
    ) -> Result<Option<Item<'_>>, QueryError> {
        Ok(self.search(text, field, kind, true)?.into_iter().next())
    }

    /// Every entry and sense whose `field` matches `text`, in document order.
    pub fn find_all(
        &self,
        text: &str,
        field: &SearchField,
        kind: MatchKind,
    ) -> Result<Vec<Item<'_>>, QueryError> {
        self.search(text, field, kind, false)
    }

    fn search(
        &self,
        text: &str,
        field: &SearchField,
        kind: MatchKind,
        first_only: bool,
    ) -> Result<Vec<Item<'_>>, QueryError> {
        if let SearchField::Custom(name) = field {
            if !self.field_definitions().iter().any(|d| d.name == name.as_str()) {
                return Err(QueryError::UnknownField(name.clone()));
            }
        }
        let matcher = Matcher::new(text, kind)?;
        tracing::debug!(%field, %kind, text, "searching lexicon");

        let mut found = Vec::new();
        for entry in &self.entries {
            if field.on_entries() && entry_matches(entry, field, &matcher) {
                found.push(Item::Entry(entry));
                if first_only {
                    return Ok(found);
                }
            }
            if !field.on_senses() {
                continue;
            }
            for sense in entry.all_senses() {
                if sense_matches(sense, field, &matcher) {
                    found.push(Item::Sense(sense));
                    if first_only {
                        return Ok(found);
                    }
                }
            }
        }
        Ok(found)
    }

    pub fn writing_systems(&self) -> WritingSystems {
        let mut systems = WritingSystems::default();
        for entry in &self.entries {
            if let Some(unit) = &entry.lexical_unit {
                systems.vernacular_of(unit);
            }
            for citation in &entry.citations {
                systems.vernacular_of(citation);
            }
            for variant in &entry.variants {
                systems.vernacular_of(&variant.content);
            }
            for pronunciation in &entry.pronunciations {
                systems.vernacular_of(&pronunciation.content);
            }
            for note in &entry.notes {
                systems.analysis_of(&note.content);
            }
            for sense in &entry.senses {
                systems.sense(sense);
            }
        }
        systems
    }

    /// One summary line per entry, collated.
    pub fn summary_lines(&self, lang: &str) -> Vec<String> {
        unicode_sort(self.entries.iter().map(|entry| entry.get_summary_line(lang)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::testing::load_sample;
    use rstest::rstest;

    #[rstest]
    #[case("hou", SearchField::Gloss, MatchKind::Contains, &["pepe_s1"])]
    #[case("HOUSE", SearchField::Gloss, MatchKind::Contains, &["pepe_s1"])]
    #[case("house", SearchField::Gloss, MatchKind::Exact, &["pepe_s1"])]
    #[case("hous", SearchField::Gloss, MatchKind::Exact, &[])]
    #[case("^p.pe$", SearchField::LexicalUnit, MatchKind::Regex, &["pepe_1"])]
    #[case("Noun", SearchField::GrammaticalInfo, MatchKind::Exact, &["pepe_s1", "nyumba_s1"])]
    #[case("dwelling", SearchField::Definition, MatchKind::Contains, &["nyumba_s1"])]
    #[case("nyumb", SearchField::Variant, MatchKind::Contains, &["nyumba_1"])]
    #[case("building", SearchField::from("literal-meaning"), MatchKind::Contains, &["nyumba_1"])]
    fn test_find_all(
        #[case] text: &str,
        #[case] field: SearchField,
        #[case] kind: MatchKind,
        #[case] expected: &[&str],
    ) {
        let lexicon = load_sample().expect("sample loads").lexicon;
        let found: Vec<_> = lexicon
            .find_all(text, &field, kind)
            .expect("valid query")
            .iter()
            .map(|item| item.id())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_find_returns_first_match() {
        let lexicon = load_sample().expect("sample loads").lexicon;
        let first = lexicon
            .find("Noun", &SearchField::GrammaticalInfo, MatchKind::Exact)
            .expect("valid query")
            .expect("a match");
        assert_eq!(first.id(), "pepe_s1");
    }

    #[test]
    fn test_bad_queries_are_errors() {
        let lexicon = load_sample().expect("sample loads").lexicon;
        assert!(matches!(
            lexicon.find("x", &SearchField::from("no-such-field"), MatchKind::Contains),
            Err(QueryError::UnknownField(_))
        ));
        assert!(matches!(
            lexicon.find("(", &SearchField::Gloss, MatchKind::Regex),
            Err(QueryError::InvalidPattern(_))
        ));
        assert!("fuzzy".parse::<MatchKind>().is_err());
    }

    #[test]
    fn test_writing_systems_first_seen_order() {
        let systems = load_sample().expect("sample loads").lexicon.writing_systems();
        let vernacular: Vec<_> = systems.vernacular.iter().map(Lang::as_str).collect();
        let analysis: Vec<_> = systems.analysis.iter().map(Lang::as_str).collect();
        assert_eq!(vernacular, vec!["seh"]);
        assert_eq!(analysis, vec!["en", "pt"]);
    }

    #[test]
    fn test_summary_lines_are_collated() {
        let lines = load_sample().expect("sample loads").lexicon.summary_lines("en");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("èmbe"));
        assert!(lines[2].starts_with("pëpe"));
    }
}
