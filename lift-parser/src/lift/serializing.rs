//! Schema-driven serialization of the typed model
//!
//!     The inverse of `mapping`. A type's [`LiftNode::emit`] deposits its values in an
//!     [`Emitter`] by property name, in any order; [`Emitter::finish`] then lays them out in
//!     the order the schema declares, attributes first, followed by the preserved residue.
//!     Absent optional values are simply not deposited and therefore not written.
//!
//!     The element's tag comes from the caller rather than the schema, because the same type
//!     appears under several tags (a multitext is a `lexical-unit`, a `citation`, a `label`).

use super::mapping::{LiftNode, Residue};
use super::markup::{Element, Node};
use super::scalar::Scalar;
use super::schema::TypeSchema;
use super::version::LiftVersion;

#[derive(Debug)]
enum Deposit {
    Value(String),
    Elements(Vec<Element>),
    Content(Vec<Node>),
}

/// Collects an entity's values for one element.
#[derive(Debug)]
pub struct Emitter {
    schema: TypeSchema,
    version: LiftVersion,
    tag: String,
    deposits: Vec<(&'static str, Deposit)>,
    residue: Residue,
}

impl Emitter {
    pub fn new(schema: TypeSchema, tag: impl Into<String>, version: LiftVersion) -> Self {
        Self {
            schema,
            version,
            tag: tag.into(),
            deposits: Vec::new(),
            residue: Residue::default(),
        }
    }

    pub fn version(&self) -> LiftVersion {
        self.version
    }

    /// Markup tag for children of a field: its key, or the property itself when the field
    /// is not declared for this version.
    pub fn child_tag(&self, property: &'static str) -> &'static str {
        self.schema
            .field(property)
            .map(|field| field.key)
            .unwrap_or(property)
    }

    fn deposit(&mut self, property: &'static str, deposit: Deposit) {
        let existing = self.deposits.iter_mut().find(|(p, _)| *p == property);
        match (existing, deposit) {
            (Some((_, Deposit::Elements(elements))), Deposit::Elements(more)) => {
                elements.extend(more)
            }
            (Some((_, Deposit::Content(nodes))), Deposit::Content(more)) => nodes.extend(more),
            (Some((_, slot)), deposit) => *slot = deposit,
            (None, deposit) => self.deposits.push((property, deposit)),
        }
    }

    pub fn attr<T: Scalar>(&mut self, property: &'static str, value: Option<&T>) {
        if let Some(value) = value {
            self.deposit(property, Deposit::Value(value.format_scalar()));
        }
    }

    pub fn one<T: LiftNode>(&mut self, property: &'static str, value: Option<&T>) {
        if let Some(value) = value {
            let element = to_element(value, self.child_tag(property), self.version);
            self.deposit(property, Deposit::Elements(vec![element]));
        }
    }

    pub fn many<T: LiftNode>(&mut self, property: &'static str, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let tag = self.child_tag(property);
        let elements = values
            .iter()
            .map(|value| to_element(value, tag, self.version))
            .collect();
        self.deposit(property, Deposit::Elements(elements));
    }

    /// Deposit an already built element, e.g. one member of a polymorphic field.
    pub fn element(&mut self, property: &'static str, element: Element) {
        self.deposit(property, Deposit::Elements(vec![element]));
    }

    pub fn content(&mut self, property: &'static str, nodes: Vec<Node>) {
        if !nodes.is_empty() {
            self.deposit(property, Deposit::Content(nodes));
        }
    }

    pub fn residue(&mut self, residue: &Residue) {
        self.residue = residue.clone();
    }

    /// Build the element in schema order, then append the residue.
    pub fn finish(self) -> Element {
        let mut element = Element::new(self.tag);
        let mut deposits = self.deposits;

        for field in self.schema.fields() {
            if let Some(index) = deposits.iter().position(|(p, _)| *p == field.property) {
                let (_, deposit) = deposits.remove(index);
                place(&mut element, field.key, deposit);
            }
        }
        for (property, deposit) in deposits {
            tracing::debug!(
                property,
                tag = %element.name,
                version = %self.version,
                "writing a field this version does not declare"
            );
            place(&mut element, property, deposit);
        }

        for (key, value) in self.residue.attributes {
            if element.attribute(&key).is_none() {
                element.attributes.push((key, value));
            }
        }
        for node in self.residue.children {
            match node {
                Node::Element(child) => element.push_element(child),
                Node::Text(text) => element.push_text(text),
            }
        }
        element
    }
}

fn place(element: &mut Element, key: &str, deposit: Deposit) {
    match deposit {
        Deposit::Value(value) => element.attributes.push((key.to_string(), value)),
        Deposit::Elements(children) => {
            for child in children {
                element.push_element(child);
            }
        }
        Deposit::Content(nodes) => {
            for node in nodes {
                match node {
                    Node::Element(child) => element.push_element(child),
                    Node::Text(text) => element.push_text(text),
                }
            }
        }
    }
}

/// Serialize a value as an element with the given tag.
pub fn to_element<T: LiftNode>(value: &T, tag: &str, version: LiftVersion) -> Element {
    let mut out = Emitter::new(T::schema(version), tag, version);
    value.emit(&mut out);
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::error::LiftResult;
    use crate::lift::mapping::{map_element, Bound, MapContext};
    use crate::lift::scalar::{Key, ScalarKind};
    use crate::lift::schema::{Cardinality, FieldSchema};

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        first: Option<Key>,
        second: Option<Key>,
        children: Vec<Pair>,
        residue: Residue,
    }

    const PAIR: TypeSchema = TypeSchema::new(
        "pair",
        &[&[
            FieldSchema::attribute("first", Cardinality::Optional, ScalarKind::Key),
            FieldSchema::attribute("second", Cardinality::Optional, ScalarKind::Key),
            FieldSchema::child("pair", Cardinality::Repeated).named("children"),
        ]],
    );

    impl LiftNode for Pair {
        fn schema(_version: LiftVersion) -> TypeSchema {
            PAIR
        }

        fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
            Ok(Pair {
                first: bound.attr("first", ctx)?,
                second: bound.attr("second", ctx)?,
                children: bound.many("children", ctx)?,
                residue: bound.finish(),
            })
        }

        fn emit(&self, out: &mut Emitter) {
            // Deposited out of order on purpose; the schema decides the layout.
            out.many("children", &self.children);
            out.attr("second", self.second.as_ref());
            out.attr("first", self.first.as_ref());
            out.residue(&self.residue);
        }
    }

    #[test]
    fn test_finish_follows_schema_order_then_residue() {
        let pair = Pair {
            first: Some(Key::from("a")),
            second: Some(Key::from("b")),
            children: vec![Pair {
                first: None,
                second: None,
                children: Vec::new(),
                residue: Residue::default(),
            }],
            residue: Residue {
                attributes: vec![("zz".to_string(), "1".to_string())],
                children: vec![Node::Element(Element::new("unknown"))],
            },
        };
        let element = to_element(&pair, "pair", LiftVersion::V0_15);
        let keys: Vec<_> = element.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["first", "second", "zz"]);
        let tags: Vec<_> = element.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(tags, vec!["pair", "unknown"]);

        let mut ctx = MapContext::new(LiftVersion::V0_15);
        let back: Pair = map_element(element, &mut ctx).expect("maps back");
        assert_eq!(back, pair);
    }

    #[test]
    fn test_residue_attribute_does_not_duplicate_a_declared_one() {
        let pair = Pair {
            first: Some(Key::from("new")),
            second: None,
            children: Vec::new(),
            residue: Residue {
                attributes: vec![("first".to_string(), "old".to_string())],
                children: Vec::new(),
            },
        };
        let element = to_element(&pair, "pair", LiftVersion::V0_13);
        assert_eq!(element.attributes.len(), 1);
        assert_eq!(element.attribute("first"), Some("new"));
    }
}
