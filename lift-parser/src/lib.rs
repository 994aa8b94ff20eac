//! # lift-parser
//!
//! Reader and writer for LIFT (Lexicon Interchange FormaT) files.
//!
//! File Layout
//!
//! The crate is split along the path data takes through it:
//!
//! src/lift
//!   ├── markup        quick-xml adapter: bytes <-> owned element tree
//!   ├── scalar        typed scalar values (dates, ids, language tags, urls)
//!   ├── schema        per-element field descriptions (the single source of truth)
//!   ├── mapping       tree -> typed model, driven by the schema
//!   ├── serializing   typed model -> tree, driven by the same schema
//!   ├── model         base, header and lexicon entities
//!   ├── lexicon       the Lexicon container, identifier index and queries
//!   └── loader        file facade (.lift and .lift-ranges files)
//!
//! The contract between mapping and serializing is value equality: parsing the output of a
//! serialization yields a model equal to the one that was serialized. Byte equality with the
//! original file is not a goal.

pub mod lift;

pub use lift::{
    diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSeverity},
    error::{LiftError, LiftResult, LookupError},
    lexicon::{Item, Lexicon, Loaded},
    loader::{load, save, LiftFile, LoadOptions, SaveOptions},
    version::LiftVersion,
};
