//! Format revisions
//!
//!     Two revisions of the format are in use: 0.13, written by FieldWorks, and 0.15, the latest
//!     published one. They differ in a handful of element shapes (field definitions, the
//!     `field` name attribute, traits on glosses, notes on examples, extensible ranges), so
//!     every schema lookup takes a [`LiftVersion`].
//!
//!     Documents normally declare their revision on the root element. When they don't, or
//!     declare one we have no rules for, the process-wide default applies.

use super::model::header::FieldDefinition;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LiftVersion {
    #[serde(rename = "0.13")]
    V0_13,
    #[serde(rename = "0.15")]
    V0_15,
}

impl LiftVersion {
    /// The revision FieldWorks writes.
    pub const FIELDWORKS: LiftVersion = LiftVersion::V0_13;
    pub const LATEST: LiftVersion = LiftVersion::V0_15;
    pub const ALL: [LiftVersion; 2] = [LiftVersion::V0_13, LiftVersion::V0_15];

    pub fn as_str(&self) -> &'static str {
        match self {
            LiftVersion::V0_13 => "0.13",
            LiftVersion::V0_15 => "0.15",
        }
    }

    /// Look up a declared version string. Surrounding whitespace is ignored.
    pub fn from_declared(text: &str) -> Option<LiftVersion> {
        match text.trim() {
            "0.13" => Some(LiftVersion::V0_13),
            "0.15" => Some(LiftVersion::V0_15),
            _ => None,
        }
    }

    /// True for the revision that still allows a bare `text` child in multitext content.
    pub fn is_legacy(&self) -> bool {
        *self == LiftVersion::V0_13
    }

    /// The field definitions assumed when a document's header declares none.
    pub fn default_field_definitions(&self) -> &'static [FieldDefinition] {
        match self {
            LiftVersion::V0_13 => &DEFAULT_FIELDS_0_13,
            LiftVersion::V0_15 => &DEFAULT_FIELDS_0_15,
        }
    }
}

impl fmt::Display for LiftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DEFAULT_VERSION: AtomicU8 = AtomicU8::new(0);

fn encode(version: LiftVersion) -> u8 {
    match version {
        LiftVersion::V0_13 => 0,
        LiftVersion::V0_15 => 1,
    }
}

/// The revision used for documents without a usable version declaration. Starts as 0.13.
pub fn default_version() -> LiftVersion {
    match DEFAULT_VERSION.load(Ordering::Relaxed) {
        1 => LiftVersion::V0_15,
        _ => LiftVersion::V0_13,
    }
}

pub fn set_default_version(version: LiftVersion) {
    tracing::debug!(%version, "default format version set");
    DEFAULT_VERSION.store(encode(version), Ordering::Relaxed);
}

const FIELDWORKS_FIELDS: [(&str, &str); 6] = [
    ("cv-pattern", "This records the syllable pattern for a LexPronunciation in FieldWorks."),
    ("tone", "This records the tone information for a LexPronunciation in FieldWorks."),
    ("comment", "This records a comment (note) in a LexEtymology in FieldWorks."),
    ("import-residue", "This records residue left over from importing a standard format file into FieldWorks (or LinguaLinks)."),
    ("literal-meaning", "This field is used to store a literal meaning of the entry. Typically, this field is necessary only for a compound or an idiom where the meaning of the whole is different from the sum of its parts."),
    ("summary-definition", "A summary definition (located at the entry level in the Entry pane) is a general definition summarizing all the senses of a primary entry. It has no theoretical value; its use is solely pragmatic."),
];

static DEFAULT_FIELDS_0_13: Lazy<Vec<FieldDefinition>> = Lazy::new(|| {
    FIELDWORKS_FIELDS
        .iter()
        .map(|(tag, description)| FieldDefinition::legacy(*tag, "en", *description))
        .collect()
});

static DEFAULT_FIELDS_0_15: Lazy<Vec<FieldDefinition>> = Lazy::new(|| {
    let classes = ["LexPronunciation", "LexPronunciation", "LexEtymology", "LexEntry", "LexEntry", "LexEntry"];
    FIELDWORKS_FIELDS
        .iter()
        .zip(classes)
        .map(|((name, description), class)| {
            FieldDefinition::new(*name)
                .with_class(class)
                .with_type("multitext")
                .with_description("en", *description)
        })
        .collect()
});
