//! Command implementations
//!
//! Each command loads what it needs, renders its output as a string and leaves printing and
//! exit codes to `main`. Errors are returned as ready-to-print messages.

use lift_config::LiftConfig;
use lift_parser::lift::lexicon::{Item, Lexicon, MatchKind, SearchField};
use lift_parser::lift::loader::{load, save};
use lift_parser::lift::markup::serialize;
use lift_parser::lift::model::schemas_for;
use lift_parser::lift::scalar::Lang;
use lift_parser::lift::util::unicode_sort;
use lift_parser::{Diagnostic, LiftVersion, Loaded};
use std::path::Path;

fn open(path: &Path, config: &LiftConfig) -> Result<Loaded, String> {
    load(path, &config.load_options()).map_err(|e| format!("Cannot load {}: {}", path.display(), e))
}

fn parse_version(text: &str) -> Result<LiftVersion, String> {
    LiftVersion::from_declared(text).ok_or_else(|| {
        let known: Vec<_> = LiftVersion::ALL.iter().map(LiftVersion::as_str).collect();
        format!("Unknown format version '{}' (known: {})", text, known.join(", "))
    })
}

fn entry_lines(lexicon: &Lexicon, lang: &str, config: &LiftConfig) -> Vec<String> {
    unicode_sort(lexicon.entries().iter().map(|entry| {
        entry.summary_line_with(lang, config.display.headword_width, config.display.gloss_width)
    }))
}

fn render(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Header summary followed by the collated entry lines.
pub fn show(path: &Path, lang: Option<&str>, config: &LiftConfig) -> Result<String, String> {
    let loaded = open(path, config)?;
    let lexicon = &loaded.lexicon;
    let lang = lang.unwrap_or(&config.display.gloss_language);
    let systems = lexicon.writing_systems();
    let join = |langs: &[Lang]| {
        langs.iter().map(|lang| lang.as_str()).collect::<Vec<_>>().join(", ")
    };

    let mut lines = vec![
        lexicon.to_string(),
        format!(
            "{} entries, {} ranges, {} field definitions",
            lexicon.len(),
            lexicon.ranges().len(),
            lexicon.field_definitions().len()
        ),
        format!(
            "vernacular: {}; analysis: {}",
            join(&systems.vernacular),
            join(&systems.analysis)
        ),
        String::new(),
    ];
    lines.extend(entry_lines(lexicon, lang, config));
    Ok(render(lines))
}

/// Everything noticed while loading plus every reference that points nowhere.
pub fn check(path: &Path, json: bool, config: &LiftConfig) -> Result<String, String> {
    let loaded = open(path, config)?;
    let mut findings: Vec<Diagnostic> = loaded.diagnostics.into_vec();
    findings.extend(loaded.lexicon.check_references());

    if json {
        let mut out = serde_json::to_string_pretty(&findings)
            .map_err(|e| format!("JSON serialization failed: {}", e))?;
        out.push('\n');
        return Ok(out);
    }
    if findings.is_empty() {
        return Ok(format!("{}: no problems found\n", path.display()));
    }
    let mut lines: Vec<String> = findings.iter().map(ToString::to_string).collect();
    lines.push(format!("{}: {} finding(s)", path.display(), findings.len()));
    Ok(render(lines))
}

pub fn get(path: &Path, id: &str, parent: bool, config: &LiftConfig) -> Result<String, String> {
    let loaded = open(path, config)?;
    let lexicon = &loaded.lexicon;
    let item = if parent {
        lexicon
            .get_item_parent_by_id(id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("'{}' has no parent", id))?
    } else {
        lexicon.get_item_by_id(id).map_err(|e| e.to_string())?
    };
    let text = serialize(&item.to_element(lexicon.version())).map_err(|e| e.to_string())?;
    // Drop the XML declaration: the output is a fragment.
    Ok(text
        .split_once('\n')
        .map(|(_, body)| body.to_string())
        .unwrap_or(text))
}

/// Arguments of `lift find`. Unset options fall back to the `[search]` configuration.
pub struct FindRequest<'a> {
    pub text: &'a str,
    pub field: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub all: bool,
    pub lang: Option<&'a str>,
}

pub fn find(path: &Path, request: &FindRequest<'_>, config: &LiftConfig) -> Result<String, String> {
    let loaded = open(path, config)?;
    let lexicon = &loaded.lexicon;
    let field = request
        .field
        .map(SearchField::from)
        .unwrap_or_else(|| config.search_field());
    let kind = match request.kind {
        Some(kind) => kind.parse::<MatchKind>().map_err(|e| e.to_string())?,
        None => config.search.kind.into(),
    };
    let lang = request.lang.unwrap_or(&config.display.gloss_language);

    let found = if request.all {
        lexicon.find_all(request.text, &field, kind)
    } else {
        lexicon
            .find(request.text, &field, kind)
            .map(|item| item.into_iter().collect())
    }
    .map_err(|e| e.to_string())?;

    if found.is_empty() {
        return Err(format!("No match for '{}' in {}", request.text, field));
    }
    let lines = found
        .into_iter()
        .map(|item| match item {
            Item::Entry(entry) => entry.summary_line_with(
                lang,
                config.display.headword_width,
                config.display.gloss_width,
            ),
            Item::Sense(sense) => sense.summary_line(lang),
            other => format!("{}\t{}", other.kind(), other.id()),
        })
        .collect();
    Ok(render(lines))
}

pub fn convert(
    path: &Path,
    output: &Path,
    to_version: Option<&str>,
    config: &LiftConfig,
) -> Result<String, String> {
    let mut lexicon = open(path, config)?.lexicon;
    if let Some(version) = to_version {
        lexicon.version = parse_version(version)?;
        lexicon.declared_version = None;
    }
    let written = save(&lexicon, output, &config.save_options())
        .map_err(|e| format!("Cannot write {}: {}", output.display(), e))?;
    Ok(format!(
        "Wrote {} ({} entries, LIFT {})\n",
        written.display(),
        lexicon.len(),
        lexicon.version()
    ))
}

pub fn schema(element: &str, version: Option<&str>, config: &LiftConfig) -> Result<String, String> {
    let version = match version {
        Some(version) => parse_version(version)?,
        None => config.default_version(),
    };
    let schemas = schemas_for(element, version);
    if schemas.is_empty() {
        return Err(format!("Unknown element '{}'", element));
    }
    let mut lines = Vec::new();
    for schema in schemas {
        lines.push(format!("<{}> in LIFT {}", element, version));
        lines.extend(
            schema
                .properties()
                .iter()
                .map(|property| format!("  {}", property)),
        );
    }
    Ok(render(lines))
}
