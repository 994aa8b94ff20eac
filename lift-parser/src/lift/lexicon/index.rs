//! Identifier index
//!
//!     Maps ids to the place of the item in the owned entity graph. Locations are index paths
//!     (entry 3, sense 0, subsense 2) rather than references, so the index can live beside the
//!     entries it describes and is rebuilt whenever they change.
//!
//! Namespaces
//!
//!     Lexical items (entries, senses at any depth, variants, examples) share one namespace.
//!     Ranges have their own, and so do range elements, whose ids only need to be unique
//!     within their range. In each namespace the first occurrence wins; every later claim of
//!     the same id is reported as a `DuplicateId` diagnostic.

use crate::lift::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lift::model::{Entry, Range, Sense};
use std::collections::hash_map::Entry as Slot;
use std::collections::{HashMap, HashSet};

/// Where an identifiable item sits in the lexicon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Entry(usize),
    /// `path[0]` indexes the entry's senses, every further step the subsenses.
    Sense { entry: usize, path: Vec<usize> },
    Variant { entry: usize, variant: usize },
    Example {
        entry: usize,
        path: Vec<usize>,
        example: usize,
    },
    Range(usize),
    RangeElement { range: usize, element: usize },
}

impl Location {
    /// Element path of the item, in the form used by mapping diagnostics.
    pub fn path(&self) -> String {
        match self {
            Location::Entry(entry) => format!("/lift/entry[{entry}]"),
            Location::Sense { entry, path } => sense_path(*entry, path),
            Location::Variant { entry, variant } => {
                format!("/lift/entry[{entry}]/variant[{variant}]")
            }
            Location::Example {
                entry,
                path,
                example,
            } => format!("{}/example[{example}]", sense_path(*entry, path)),
            Location::Range(range) => format!("/lift/header/ranges/range[{range}]"),
            Location::RangeElement { range, element } => {
                format!("/lift/header/ranges/range[{range}]/range-element[{element}]")
            }
        }
    }

    /// The location of the owning entry, sense or range, if the item has one.
    pub fn parent(&self) -> Option<Location> {
        match self {
            Location::Entry(_) | Location::Range(_) => None,
            Location::Sense { entry, path } => match path.split_last() {
                Some((_, [])) | None => Some(Location::Entry(*entry)),
                Some((_, rest)) => Some(Location::Sense {
                    entry: *entry,
                    path: rest.to_vec(),
                }),
            },
            Location::Variant { entry, .. } => Some(Location::Entry(*entry)),
            Location::Example { entry, path, .. } => Some(Location::Sense {
                entry: *entry,
                path: path.clone(),
            }),
            Location::RangeElement { range, .. } => Some(Location::Range(*range)),
        }
    }
}

fn sense_path(entry: usize, path: &[usize]) -> String {
    let mut out = format!("/lift/entry[{entry}]");
    for (depth, index) in path.iter().enumerate() {
        let tag = if depth == 0 { "sense" } else { "subsense" };
        out.push_str(&format!("/{tag}[{index}]"));
    }
    out
}

/// Follow a sense path from an entry.
pub fn sense_at<'a>(entry: &'a Entry, path: &[usize]) -> Option<&'a Sense> {
    let (first, rest) = path.split_first()?;
    let mut sense = entry.senses.get(*first)?;
    for index in rest {
        sense = sense.subsenses.get(*index)?;
    }
    Some(sense)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    lexical: HashMap<String, Location>,
    ranges: HashMap<String, usize>,
    range_elements: HashMap<String, (usize, usize)>,
    duplicates: Vec<Diagnostic>,
}

impl Index {
    pub fn build(entries: &[Entry], ranges: &[Range]) -> Index {
        let mut index = Index::default();
        for (entry_index, entry) in entries.iter().enumerate() {
            index.register(entry.id.as_str(), Location::Entry(entry_index));
            for (variant, item) in entry.variants.iter().enumerate() {
                if let Some(id) = &item.id {
                    index.register(
                        id.as_str(),
                        Location::Variant {
                            entry: entry_index,
                            variant,
                        },
                    );
                }
            }
            for (sense_index, sense) in entry.senses.iter().enumerate() {
                index.register_sense(entry_index, vec![sense_index], sense);
            }
        }

        for (range_index, range) in ranges.iter().enumerate() {
            match index.ranges.entry(range.id.as_str().to_string()) {
                Slot::Vacant(slot) => {
                    slot.insert(range_index);
                }
                Slot::Occupied(first) => {
                    let first = Location::Range(*first.get());
                    index.duplicate(range.id.as_str(), &first, &Location::Range(range_index));
                }
            }
            let mut seen: HashSet<&str> = HashSet::new();
            for (element_index, element) in range.elements.iter().enumerate() {
                let location = Location::RangeElement {
                    range: range_index,
                    element: element_index,
                };
                if !seen.insert(element.id.as_str()) {
                    let first = range
                        .elements
                        .iter()
                        .position(|other| other.id == element.id)
                        .unwrap_or_default();
                    let first = Location::RangeElement {
                        range: range_index,
                        element: first,
                    };
                    index.duplicate(element.id.as_str(), &first, &location);
                    continue;
                }
                index
                    .range_elements
                    .entry(element.id.as_str().to_string())
                    .or_insert((range_index, element_index));
            }
        }

        tracing::debug!(
            lexical = index.lexical.len(),
            ranges = index.ranges.len(),
            duplicates = index.duplicates.len(),
            "identifier index built"
        );
        index
    }

    fn register_sense(&mut self, entry: usize, path: Vec<usize>, sense: &Sense) {
        if let Some(id) = &sense.id {
            self.register(
                id.as_str(),
                Location::Sense {
                    entry,
                    path: path.clone(),
                },
            );
        }
        for (example, item) in sense.examples.iter().enumerate() {
            if let Some(id) = &item.id {
                self.register(
                    id.as_str(),
                    Location::Example {
                        entry,
                        path: path.clone(),
                        example,
                    },
                );
            }
        }
        for (index, subsense) in sense.subsenses.iter().enumerate() {
            let mut child = path.clone();
            child.push(index);
            self.register_sense(entry, child, subsense);
        }
    }

    fn register(&mut self, id: &str, location: Location) {
        match self.lexical.entry(id.to_string()) {
            Slot::Vacant(slot) => {
                slot.insert(location);
            }
            Slot::Occupied(first) => {
                let first = first.get().clone();
                self.duplicate(id, &first, &location);
            }
        }
    }

    fn duplicate(&mut self, id: &str, first: &Location, again: &Location) {
        self.duplicates.push(
            Diagnostic::new(
                DiagnosticKind::DuplicateId,
                format!("id '{id}' already used at {}", first.path()),
            )
            .at(again.path()),
        );
    }

    /// Look an id up: lexical items first, then ranges, then range elements.
    pub fn locate(&self, id: &str) -> Option<Location> {
        if let Some(location) = self.lexical.get(id) {
            return Some(location.clone());
        }
        if let Some(range) = self.ranges.get(id) {
            return Some(Location::Range(*range));
        }
        self.range_elements
            .get(id)
            .map(|(range, element)| Location::RangeElement {
                range: *range,
                element: *element,
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// Collisions found while building, in document order.
    pub fn duplicates(&self) -> &[Diagnostic] {
        &self.duplicates
    }

    /// Number of distinct ids across all namespaces.
    pub fn len(&self) -> usize {
        self.lexical.len() + self.ranges.len() + self.range_elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
