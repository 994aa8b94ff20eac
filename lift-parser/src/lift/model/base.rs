//! Building blocks shared by the header and the lexicon entities.

use super::multitext::Multitext;
use super::text::Text;
use crate::lift::error::LiftResult;
use crate::lift::mapping::{map_child, Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{DateTime, Key, Lang, ScalarKind, Url};
use crate::lift::schema::{
    Cardinality, FieldSchema, TypeSchema, ANNOTATIONS, MULTITEXT_CONTENT,
    MULTITEXT_CONTENT_LEGACY, TRAITS,
};
use crate::lift::serializing::{to_element, Emitter};
use crate::lift::version::LiftVersion;
use std::fmt;

use Cardinality::{Optional, Required};

const GLOSS_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("lang", Required, ScalarKind::Lang),
    FieldSchema::child("text", Required),
];
const GLOSS_LEGACY: TypeSchema = TypeSchema::new("gloss", &[GLOSS_FIELDS, ANNOTATIONS]);
const GLOSS: TypeSchema = TypeSchema::new("gloss", &[GLOSS_FIELDS, TRAITS, ANNOTATIONS]);

/// A short translation of a sense, in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gloss {
    pub lang: Lang,
    pub text: Text,
    /// Only written by 0.15.
    pub traits: Vec<Trait>,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Gloss {
    pub fn new(lang: impl Into<Lang>, text: impl Into<Text>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

impl fmt::Display for Gloss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.fmt(f)
    }
}

impl LiftNode for Gloss {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => GLOSS_LEGACY,
            LiftVersion::V0_15 => GLOSS,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Gloss {
            lang: bound.required_attr("lang", ctx)?,
            text: bound.required_one("text", ctx)?,
            traits: bound.many("trait", ctx)?,
            annotations: bound.many("annotation", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("lang", Some(&self.lang));
        out.one("text", Some(&self.text));
        out.many("trait", &self.traits);
        out.many("annotation", &self.annotations);
        out.residue(&self.residue);
    }
}

const TRAIT_SCHEMA: TypeSchema = TypeSchema::new(
    "trait",
    &[
        &[
            FieldSchema::attribute("name", Required, ScalarKind::Key),
            FieldSchema::attribute("value", Required, ScalarKind::Key),
            FieldSchema::attribute("id", Optional, ScalarKind::Key),
        ],
        ANNOTATIONS,
    ],
);

/// A name/value pair, usually a value from a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trait {
    pub name: Key,
    pub value: Key,
    pub id: Option<Key>,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Trait {
    pub fn new(name: impl Into<Key>, value: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

impl LiftNode for Trait {
    fn schema(_version: LiftVersion) -> TypeSchema {
        TRAIT_SCHEMA
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Trait {
            name: bound.required_attr("name", ctx)?,
            value: bound.required_attr("value", ctx)?,
            id: bound.attr("id", ctx)?,
            annotations: bound.many("annotation", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("name", Some(&self.name));
        out.attr("value", Some(&self.value));
        out.attr("id", self.id.as_ref());
        out.many("annotation", &self.annotations);
        out.residue(&self.residue);
    }
}

const FLAG_SCHEMA: TypeSchema = TypeSchema::new(
    "flag",
    &[
        &[FieldSchema::attribute("name", Required, ScalarKind::Key)],
        ANNOTATIONS,
    ],
);

/// A named boolean marker; present means set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flag {
    pub name: Key,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Flag {
    pub fn new(name: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl LiftNode for Flag {
    fn schema(_version: LiftVersion) -> TypeSchema {
        FLAG_SCHEMA
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Flag {
            name: bound.required_attr("name", ctx)?,
            annotations: bound.many("annotation", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("name", Some(&self.name));
        out.many("annotation", &self.annotations);
        out.residue(&self.residue);
    }
}

const ANNOTATION_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("name", Required, ScalarKind::Key),
    FieldSchema::attribute("value", Required, ScalarKind::Key),
    FieldSchema::attribute("who", Optional, ScalarKind::Text),
    FieldSchema::attribute("when", Optional, ScalarKind::DateTime),
];
const ANNOTATION_LEGACY: TypeSchema =
    TypeSchema::new("annotation", &[ANNOTATION_FIELDS, MULTITEXT_CONTENT_LEGACY]);
const ANNOTATION: TypeSchema = TypeSchema::new("annotation", &[ANNOTATION_FIELDS, MULTITEXT_CONTENT]);

/// Editorial metadata: who said what about an item, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub name: Key,
    pub value: Key,
    pub who: Option<String>,
    pub when: Option<DateTime>,
    pub content: Multitext,
    pub residue: Residue,
}

impl Annotation {
    pub fn new(name: impl Into<Key>, value: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

impl LiftNode for Annotation {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => ANNOTATION_LEGACY,
            LiftVersion::V0_15 => ANNOTATION,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Annotation {
            name: bound.required_attr("name", ctx)?,
            value: bound.required_attr("value", ctx)?,
            who: bound.attr("who", ctx)?,
            when: bound.date("when", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("name", Some(&self.name));
        out.attr("value", Some(&self.value));
        out.attr("who", self.who.as_ref());
        out.attr("when", self.when.as_ref());
        self.content.emit_content(out);
        out.residue(&self.residue);
    }
}

const URL_REF_SCHEMA: TypeSchema = TypeSchema::new(
    "illustration",
    &[&[
        FieldSchema::attribute("href", Required, ScalarKind::Url),
        FieldSchema::child("label", Optional),
    ]],
);

/// A link to a media file: an `illustration` of a sense or the `media` of a pronunciation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRef {
    pub href: Url,
    pub label: Option<Multitext>,
    pub residue: Residue,
}

impl UrlRef {
    pub fn new(href: impl Into<Url>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

impl LiftNode for UrlRef {
    fn schema(_version: LiftVersion) -> TypeSchema {
        URL_REF_SCHEMA
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(UrlRef {
            href: bound.required_attr("href", ctx)?,
            label: bound.one("label", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("href", Some(&self.href));
        out.one("label", self.label.as_ref());
        out.residue(&self.residue);
    }
}

const FIELD_DATES: &[FieldSchema] = &[
    FieldSchema::attribute("dateCreated", Optional, ScalarKind::DateTime),
    FieldSchema::attribute("dateModified", Optional, ScalarKind::DateTime),
];
const FIELD_LEGACY: TypeSchema = TypeSchema::new(
    "field",
    &[
        &[FieldSchema::attribute("type", Required, ScalarKind::Key).named("name")],
        FIELD_DATES,
        MULTITEXT_CONTENT_LEGACY,
        TRAITS,
        ANNOTATIONS,
    ],
);
const FIELD: TypeSchema = TypeSchema::new(
    "field",
    &[
        &[FieldSchema::attribute("name", Required, ScalarKind::Key)],
        FIELD_DATES,
        MULTITEXT_CONTENT,
        TRAITS,
        ANNOTATIONS,
    ],
);

/// A custom field, named by one of the header's field definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: Key,
    pub date_created: Option<DateTime>,
    pub date_modified: Option<DateTime>,
    pub content: Multitext,
    pub traits: Vec<Trait>,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Field {
    pub fn new(name: impl Into<Key>, content: Multitext) -> Self {
        Self {
            name: name.into(),
            content,
            ..Self::default()
        }
    }
}

impl LiftNode for Field {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => FIELD_LEGACY,
            LiftVersion::V0_15 => FIELD,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Field {
            name: bound.required_attr("name", ctx)?,
            date_created: bound.date("dateCreated", ctx)?,
            date_modified: bound.date("dateModified", ctx)?,
            content: Multitext::take_content(&mut bound, ctx)?,
            traits: bound.many("trait", ctx)?,
            annotations: bound.many("annotation", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("name", Some(&self.name));
        out.attr("dateCreated", self.date_created.as_ref());
        out.attr("dateModified", self.date_modified.as_ref());
        self.content.emit_content(out);
        out.many("trait", &self.traits);
        out.many("annotation", &self.annotations);
        out.residue(&self.residue);
    }
}

/// Custom metadata any extensible entity may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensible {
    pub date_created: Option<DateTime>,
    pub date_modified: Option<DateTime>,
    pub fields: Vec<Field>,
    pub traits: Vec<Trait>,
    pub flags: Vec<Flag>,
    pub annotations: Vec<Annotation>,
}

impl Extensible {
    /// Metadata stamped with the current time as creation date.
    pub fn created_now() -> Self {
        Self {
            date_created: Some(DateTime::now()),
            ..Self::default()
        }
    }

    /// Read the extensible block, dispatching each extension child by its tag.
    pub fn take(bound: &mut Bound, ctx: &mut MapContext) -> LiftResult<Extensible> {
        let mut ext = Extensible {
            date_created: bound.date("dateCreated", ctx)?,
            date_modified: bound.date("dateModified", ctx)?,
            ..Extensible::default()
        };
        for (index, element) in bound.elements("extension").into_iter().enumerate() {
            tracing::trace!(tag = %element.name, "extension dispatch");
            match element.name.as_str() {
                "field" => ext.fields.push(map_child(element, Some(index), ctx)?),
                "trait" => ext.traits.push(map_child(element, Some(index), ctx)?),
                "flag" => ext.flags.push(map_child(element, Some(index), ctx)?),
                _ => ext
                    .annotations
                    .push(map_child(element, Some(index), ctx)?),
            }
        }
        Ok(ext)
    }

    pub fn emit_into(&self, out: &mut Emitter) {
        out.attr("dateCreated", self.date_created.as_ref());
        out.attr("dateModified", self.date_modified.as_ref());
        let version = out.version();
        for field in &self.fields {
            out.element("extension", to_element(field, "field", version));
        }
        for item in &self.traits {
            out.element("extension", to_element(item, "trait", version));
        }
        for flag in &self.flags {
            out.element("extension", to_element(flag, "flag", version));
        }
        for annotation in &self.annotations {
            out.element("extension", to_element(annotation, "annotation", version));
        }
    }

    /// Stamp the modification date with the current time.
    pub fn touch(&mut self) {
        self.date_modified = Some(DateTime::now());
    }

    pub fn trait_value(&self, name: &str) -> Option<&str> {
        self.traits
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag.name == name)
    }

    pub fn add_trait(&mut self, name: impl Into<Key>, value: impl Into<Key>) {
        self.traits.push(Trait::new(name, value));
        self.touch();
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
        self.touch();
    }

    pub fn is_empty(&self) -> bool {
        *self == Extensible::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::mapping::map_element;
    use crate::lift::markup::parse_str;
    use crate::lift::schema::EXTENSIBLE;
    use rstest::rstest;

    #[derive(Debug, PartialEq)]
    struct Holder {
        ext: Extensible,
        residue: Residue,
    }

    const HOLDER: TypeSchema = TypeSchema::new("holder", &[EXTENSIBLE]);

    impl LiftNode for Holder {
        fn schema(_version: LiftVersion) -> TypeSchema {
            HOLDER
        }

        fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
            Ok(Holder {
                ext: Extensible::take(&mut bound, ctx)?,
                residue: bound.finish(),
            })
        }

        fn emit(&self, out: &mut Emitter) {
            self.ext.emit_into(out);
            out.residue(&self.residue);
        }
    }

    fn map<T: LiftNode>(source: &str, version: LiftVersion) -> LiftResult<T> {
        let mut ctx = MapContext::new(version);
        map_element(parse_str(source).expect("well-formed"), &mut ctx)
    }

    #[test]
    fn test_extension_children_are_dispatched_by_tag() {
        let holder: Holder = map(
            r#"<holder dateCreated="2020-01-02">
                 <trait name="morph-type" value="stem"/>
                 <annotation name="status" value="checked" who="ab"/>
                 <field type="literal-meaning"><form lang="en"><text>lit</text></form></field>
                 <flag name="hidden"/>
                 <mystery/>
               </holder>"#,
            LiftVersion::V0_13,
        )
        .expect("maps");
        assert_eq!(holder.ext.trait_value("morph-type"), Some("stem"));
        assert_eq!(holder.ext.annotations[0].who.as_deref(), Some("ab"));
        let field = holder.ext.field("literal-meaning").expect("field");
        assert_eq!(field.content.text("en"), Some("lit"));
        assert!(holder.ext.has_flag("hidden"));
        assert_eq!(holder.residue.elements().count(), 1);
        assert_eq!(
            holder.ext.date_created.as_ref().map(ToString::to_string),
            Some("2020-01-02T00:00:00Z".to_string())
        );

        let element = to_element(&holder, "holder", LiftVersion::V0_13);
        let field = element.child("field").expect("field element");
        assert_eq!(field.attribute("type"), Some("literal-meaning"));
        let mut ctx = MapContext::new(LiftVersion::V0_13);
        let back: Holder = map_element(element, &mut ctx).expect("maps back");
        assert_eq!(back, holder);
    }

    #[rstest]
    #[case(LiftVersion::V0_13, r#"<field type="x"/>"#)]
    #[case(LiftVersion::V0_15, r#"<field name="x"/>"#)]
    fn test_field_name_attribute_follows_version(#[case] version: LiftVersion, #[case] source: &str) {
        let field: Field = map(source, version).expect("maps");
        assert_eq!(field.name, "x");
        assert!(field.residue.is_empty());
    }

    #[test]
    fn test_field_with_wrong_name_attribute_for_version_fails() {
        let err = map::<Field>(r#"<field name="x"/>"#, LiftVersion::V0_13).unwrap_err();
        assert!(err.to_string().contains("'type'"), "{err}");
    }

    #[test]
    fn test_gloss_traits_only_in_latest_revision() {
        let source = r#"<gloss lang="en"><text>house</text><trait name="a" value="b"/></gloss>"#;
        let latest: Gloss = map(source, LiftVersion::V0_15).expect("maps");
        assert_eq!(latest.traits.len(), 1);
        let legacy: Gloss = map(source, LiftVersion::V0_13).expect("maps");
        assert!(legacy.traits.is_empty());
        assert_eq!(legacy.residue.elements().count(), 1);
        assert_eq!(legacy.to_string(), "house");
    }

    #[test]
    fn test_trait_requires_value() {
        let err = map::<Trait>(r#"<trait name="a"/>"#, LiftVersion::V0_15).unwrap_err();
        assert!(err.to_string().contains("'value'"));
    }

    #[test]
    fn test_touch_sets_modification_date() {
        let mut ext = Extensible::default();
        assert!(ext.is_empty());
        ext.add_trait("status", "draft");
        assert!(ext.date_modified.as_ref().is_some_and(DateTime::is_parsed));
    }
}
