//! File facade
//!
//!     Reads and writes `.lift` files, together with the `.lift-ranges` files their headers
//!     may point to. A range whose `href` names an external file is listed in the `.lift`
//!     header by id only; its elements live in the ranges file, whose root is `lift-ranges`.
//!
//!     Loading fills such ranges in from the external file when
//!     [`LoadOptions::resolve_external_ranges`] is set. A ranges file that cannot be found is
//!     reported as a `MissingRanges` diagnostic and the header range is kept as written.
//!     Saving splits the header the same way again.
//!
//! # Example
//!
//! ```rust,ignore
//! use lift_parser::lift::loader::{load, LoadOptions};
//!
//! let loaded = load("sena.lift", &LoadOptions::default())?;
//! for diagnostic in loaded.diagnostics.iter() {
//!     eprintln!("{diagnostic}");
//! }
//! ```

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::error::{LiftError, LiftResult};
use super::lexicon::{finish_load, map_root, Lexicon, Loaded, Location};
use super::mapping::{map_element, MapContext};
use super::markup::{parse, parse_str, serialize, Element};
use super::model::{Range, Ranges};
use super::serializing::to_element;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LIFT_EXTENSION: &str = "lift";
pub const RANGES_EXTENSION: &str = "lift-ranges";
const RANGES_ROOT: &str = "lift-ranges";

/// Producer written by [`save`] unless the caller names another.
pub const PRODUCER: &str = concat!("lift-utils ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Report unparseable dates as schema violations instead of keeping the raw text.
    pub strict_dates: bool,
    /// Read ranges whose `href` points to a `.lift-ranges` file from that file.
    pub resolve_external_ranges: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict_dates: false,
            resolve_external_ranges: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Overrides [`PRODUCER`].
    pub producer: Option<String>,
}

/// A parsed `.lift` document, not yet mapped.
#[derive(Debug, Clone)]
pub struct LiftFile {
    path: Option<PathBuf>,
    root: Element,
}

impl LiftFile {
    /// Read and parse a `.lift` file.
    pub fn open(path: impl AsRef<Path>) -> LiftResult<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|ext| ext.to_str()) != Some(LIFT_EXTENSION) {
            return Err(LiftError::InvalidExtension(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|err| LiftError::io(path, err))?;
        let root = parse(&bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read lift file");
        Ok(Self {
            path: Some(path.to_path_buf()),
            root,
        })
    }

    /// Parse a document held in memory. Relative range hrefs resolve against the working
    /// directory.
    pub fn from_string(source: &str) -> LiftResult<Self> {
        Ok(Self {
            path: None,
            root: parse_str(source)?,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Map the document to a lexicon, pulling in external ranges if asked to.
    pub fn to_lexicon(&self, options: &LoadOptions) -> LiftResult<Loaded> {
        let (mut lexicon, mut ctx) = map_root(self.root.clone(), options)?;
        if options.resolve_external_ranges {
            resolve_external_ranges(&mut lexicon, self.path(), &mut ctx)?;
            lexicon.rebuild_index();
        }
        Ok(finish_load(lexicon, ctx))
    }
}

/// Read a `.lift` file into a lexicon.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> LiftResult<Loaded> {
    LiftFile::open(path)?.to_lexicon(options)
}

fn resolve_external_ranges(
    lexicon: &mut Lexicon,
    lift_path: Option<&Path>,
    ctx: &mut MapContext,
) -> LiftResult<()> {
    let Some(header) = lexicon.header.as_mut() else {
        return Ok(());
    };
    let mut files: HashMap<PathBuf, Ranges> = HashMap::new();

    for (index, range) in header.ranges_mut().iter_mut().enumerate() {
        let Some(href) = range.href.clone() else {
            continue;
        };
        let context = Location::Range(index).path();
        let candidates = candidate_paths(href.as_str(), lift_path);
        let Some(file) = candidates.iter().find(|path| path.is_file()) else {
            ctx.report(
                Diagnostic::new(
                    DiagnosticKind::MissingRanges,
                    format!("ranges file for '{}' not found at '{}'", range.id, href.as_str()),
                )
                .at(context),
            );
            continue;
        };

        if !files.contains_key(file) {
            let ranges = read_ranges_file(file, ctx)?;
            files.insert(file.clone(), ranges);
        }
        let external = files
            .get(file)
            .and_then(|ranges| ranges.ranges.iter().find(|other| other.id == range.id));
        match external {
            Some(external) => {
                let mut full = external.clone();
                full.href = Some(href);
                *range = full;
            }
            None => ctx.report(
                Diagnostic::new(
                    DiagnosticKind::MissingRanges,
                    format!("range '{}' is not defined in {}", range.id, file.display()),
                )
                .at(context),
            ),
        }
    }
    Ok(())
}

/// Read a `.lift-ranges` file with the schemas of the document that points to it.
fn read_ranges_file(path: &Path, ctx: &mut MapContext) -> LiftResult<Ranges> {
    let bytes = fs::read(path).map_err(|err| LiftError::io(path, err))?;
    let root = parse(&bytes)?;
    if root.name != RANGES_ROOT {
        return Err(LiftError::UnexpectedRoot {
            expected: RANGES_ROOT,
            found: root.name,
        });
    }
    ctx.enter(RANGES_ROOT);
    let ranges = map_element::<Ranges>(root, ctx);
    ctx.leave();
    let ranges = ranges?;
    tracing::debug!(
        path = %path.display(),
        ranges = ranges.ranges.len(),
        "read external ranges"
    );
    Ok(ranges)
}

/// Places to look for the file an `href` names, in order: the href itself, a file of the
/// same name beside the `.lift` file, then the `.lift` file's own `.lift-ranges` sibling.
fn candidate_paths(href: &str, lift_path: Option<&Path>) -> Vec<PathBuf> {
    let base = lift_path.and_then(Path::parent);
    let mut candidates = Vec::new();

    let named = match url::Url::parse(href) {
        Ok(parsed) => {
            let local = if parsed.scheme() == "file" {
                parsed.to_file_path().ok()
            } else {
                None
            };
            if let Some(local) = &local {
                candidates.push(local.clone());
            }
            local
                .as_ref()
                .and_then(|local| local.file_name())
                .map(PathBuf::from)
                .or_else(|| {
                    parsed
                        .path_segments()
                        .and_then(|mut segments| segments.next_back())
                        .filter(|name| !name.is_empty())
                        .map(PathBuf::from)
                })
        }
        Err(_) => {
            let relative = PathBuf::from(href);
            candidates.push(match base {
                Some(base) => base.join(&relative),
                None => relative.clone(),
            });
            relative.file_name().map(PathBuf::from)
        }
    };

    if let (Some(base), Some(name)) = (base, named) {
        candidates.push(base.join(name));
    }
    if let Some(lift_path) = lift_path {
        candidates.push(lift_path.with_extension(RANGES_EXTENSION));
    }
    candidates.dedup();
    candidates
}

/// Write a lexicon to `path`, forcing the `.lift` extension. Ranges with an `href` are
/// written to a `.lift-ranges` file beside it. Returns the path of the `.lift` file.
pub fn save(lexicon: &Lexicon, path: impl AsRef<Path>, options: &SaveOptions) -> LiftResult<PathBuf> {
    let path = path.as_ref().with_extension(LIFT_EXTENSION);
    let mut out = lexicon.clone();
    out.producer = Some(
        options
            .producer
            .clone()
            .unwrap_or_else(|| PRODUCER.to_string()),
    );

    let mut external = Vec::new();
    if let Some(header) = out.header.as_mut() {
        for range in header.ranges_mut().iter_mut() {
            if range.href.is_none() {
                continue;
            }
            let stub = Range {
                id: range.id.clone(),
                href: range.href.clone(),
                ..Range::default()
            };
            let mut full = std::mem::replace(range, stub);
            full.href = None;
            external.push(full);
        }
    }

    write_document(&path, &out.to_element())?;
    if !external.is_empty() {
        let ranges = Ranges {
            ranges: external,
            ..Ranges::default()
        };
        let ranges_path = path.with_extension(RANGES_EXTENSION);
        write_document(
            &ranges_path,
            &to_element(&ranges, RANGES_ROOT, lexicon.version()),
        )?;
    }
    tracing::info!(path = %path.display(), entries = lexicon.len(), "saved lexicon");
    Ok(path)
}

fn write_document(path: &Path, root: &Element) -> LiftResult<()> {
    let text = serialize(root)?;
    fs::write(path, text).map_err(|err| LiftError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::diagnostics::DiagnosticKind;
    use crate::lift::testing::{load_sample, SAMPLE};
    use std::fs;
    use tempfile::tempdir;

    const EXTERNAL: &str = r#"<lift version="0.13">
  <header>
    <ranges>
      <range id="grammatical-info" href="file:///nowhere/sena.lift-ranges"/>
    </ranges>
  </header>
  <entry id="a"><sense id="a1"><grammatical-info value="Noun"/></sense></entry>
</lift>"#;

    const RANGES_FILE: &str = r#"<lift-ranges>
  <range id="grammatical-info">
    <range-element id="Noun"><abbrev><form lang="en"><text>n</text></form></abbrev></range-element>
  </range>
</lift-ranges>"#;

    #[test]
    fn test_open_rejects_other_extensions() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sena.xml");
        fs::write(&path, SAMPLE).expect("write");
        let err = LiftFile::open(&path).expect_err("wrong extension");
        assert!(matches!(err, LiftError::InvalidExtension(_)));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempdir().expect("temp dir");
        let err = LiftFile::open(dir.path().join("missing.lift")).expect_err("missing");
        assert!(matches!(err, LiftError::Io { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sena.lift");
        fs::write(&path, SAMPLE).expect("write");
        let file = LiftFile::open(&path).expect("opens");
        assert_eq!(file.path(), Some(path.as_path()));
        assert_eq!(file.root().name, "lift");
        let loaded = file.to_lexicon(&LoadOptions::default()).expect("loads");
        assert_eq!(loaded.lexicon.len(), 3);
    }

    #[test]
    fn test_external_ranges_found_beside_the_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sena.lift");
        fs::write(&path, EXTERNAL).expect("write lift");
        fs::write(dir.path().join("sena.lift-ranges"), RANGES_FILE).expect("write ranges");

        let loaded = load(&path, &LoadOptions::default()).expect("loads");
        assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
        let range = loaded.lexicon.range("grammatical-info").expect("range");
        assert_eq!(range.elements.len(), 1);
        assert!(range.href.is_some());
        assert!(loaded.lexicon.resolve_grammatical_info("Noun").is_resolved());
    }

    #[test]
    fn test_missing_ranges_file_is_a_diagnostic() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sena.lift");
        fs::write(&path, EXTERNAL).expect("write lift");

        let loaded = load(&path, &LoadOptions::default()).expect("loads");
        let missing: Vec<_> = loaded
            .diagnostics
            .of_kind(DiagnosticKind::MissingRanges)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].context, "/lift/header/ranges/range[0]");
        assert!(loaded.lexicon.range("grammatical-info").is_some());
    }

    #[test]
    fn test_resolution_can_be_switched_off() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sena.lift");
        fs::write(&path, EXTERNAL).expect("write lift");
        let options = LoadOptions {
            resolve_external_ranges: false,
            ..LoadOptions::default()
        };
        let loaded = load(&path, &options).expect("loads");
        assert!(loaded.diagnostics.is_empty());
    }

    #[test]
    fn test_relative_href_candidates() {
        let lift = Path::new("/data/sena/sena.lift");
        let candidates = candidate_paths("shared/common.lift-ranges", Some(lift));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/data/sena/shared/common.lift-ranges"),
                PathBuf::from("/data/sena/common.lift-ranges"),
                PathBuf::from("/data/sena/sena.lift-ranges"),
            ]
        );
    }

    #[test]
    fn test_save_forces_extension_and_producer() {
        let dir = tempdir().expect("temp dir");
        let lexicon = load_sample().expect("sample loads").lexicon;
        let written = save(&lexicon, dir.path().join("out.xml"), &SaveOptions::default())
            .expect("saves");
        assert_eq!(written, dir.path().join("out.lift"));

        let loaded = load(&written, &LoadOptions::default()).expect("loads back");
        assert_eq!(loaded.lexicon.producer.as_deref(), Some(PRODUCER));
        let mut expected = lexicon.clone();
        expected.producer = Some(PRODUCER.to_string());
        assert_eq!(loaded.lexicon, expected);
        assert!(!dir.path().join("out.lift-ranges").exists());
    }

    #[test]
    fn test_save_splits_external_ranges_and_load_joins_them() {
        let dir = tempdir().expect("temp dir");
        let mut lexicon = load_sample().expect("sample loads").lexicon;
        lexicon.update(|_, header| {
            if let Some(header) = header.as_mut() {
                header.ranges_mut()[0].href = Some("sena.lift-ranges".into());
            }
        });
        let options = SaveOptions {
            producer: Some("test".to_string()),
        };
        let written = save(&lexicon, dir.path().join("sena.lift"), &options).expect("saves");

        let lift_text = fs::read_to_string(&written).expect("lift text");
        assert!(!lift_text.contains("range-element id=\"Noun\""));
        let ranges_text =
            fs::read_to_string(dir.path().join("sena.lift-ranges")).expect("ranges text");
        assert!(ranges_text.contains("<lift-ranges>"));
        assert!(ranges_text.contains("range-element id=\"Noun\""));
        assert!(!ranges_text.contains("href"));

        let loaded = load(&written, &LoadOptions::default()).expect("loads back");
        lexicon.producer = Some("test".to_string());
        assert_eq!(loaded.lexicon, lexicon);
    }
}
