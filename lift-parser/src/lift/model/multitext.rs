//! Language-tagged text
//!
//!     [`Form`] is one piece of text in one language; [`Multitext`] is the same content in
//!     several languages. Multitext appears both as a standalone element (`lexical-unit`,
//!     `definition`, `label`, ...) and as the inline content of larger entities (notes,
//!     examples, variants), where it contributes only its forms.
//!
//! Order
//!
//!     Forms are stored in document order, which is what round trips. [`Multitext::iter`]
//!     presents them in a collated order instead (language tag, then content, both compared
//!     with the locale-independent collation key), so display output does not depend on how
//!     a producer happened to order its forms.

use super::base::{Annotation, Trait};
use super::text::Text;
use crate::lift::error::LiftResult;
use crate::lift::mapping::{Bound, LiftNode, MapContext, Residue};
use crate::lift::scalar::{Lang, ScalarKind};
use crate::lift::schema::{
    Cardinality, FieldSchema, TypeSchema, ANNOTATIONS, MULTITEXT_CONTENT, MULTITEXT_CONTENT_LEGACY,
    TRAITS,
};
use crate::lift::serializing::Emitter;
use crate::lift::util::collation_key;
use crate::lift::version::LiftVersion;
use std::fmt;

const FORM_FIELDS: &[FieldSchema] = &[
    FieldSchema::attribute("lang", Cardinality::Required, ScalarKind::Lang),
    FieldSchema::child("text", Cardinality::Required),
];

pub const FORM_SCHEMA: TypeSchema = TypeSchema::new("form", &[FORM_FIELDS, ANNOTATIONS]);

const MULTITEXT_LEGACY: TypeSchema =
    TypeSchema::new("multitext", &[MULTITEXT_CONTENT_LEGACY, TRAITS, ANNOTATIONS]);
const MULTITEXT: TypeSchema = TypeSchema::new("multitext", &[MULTITEXT_CONTENT, TRAITS, ANNOTATIONS]);

/// Text in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub lang: Lang,
    pub text: Text,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Form {
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

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.fmt(f)
    }
}

impl LiftNode for Form {
    fn schema(_version: LiftVersion) -> TypeSchema {
        FORM_SCHEMA
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        Ok(Form {
            lang: bound.required_attr("lang", ctx)?,
            text: bound.required_one("text", ctx)?,
            annotations: bound.many("annotation", ctx)?,
            residue: bound.finish(),
        })
    }

    fn emit(&self, out: &mut Emitter) {
        out.attr("lang", Some(&self.lang));
        out.one("text", Some(&self.text));
        out.many("annotation", &self.annotations);
        out.residue(&self.residue);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multitext {
    pub forms: Vec<Form>,
    /// Bare `text` child, only written by the 0.13 revision.
    pub text: Option<Text>,
    pub traits: Vec<Trait>,
    pub annotations: Vec<Annotation>,
    pub residue: Residue,
}

impl Multitext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(lang, text)` pairs, keeping their order.
    pub fn from_pairs<L, T>(pairs: impl IntoIterator<Item = (L, T)>) -> Self
    where
        L: Into<Lang>,
        T: Into<Text>,
    {
        Self {
            forms: pairs
                .into_iter()
                .map(|(lang, text)| Form::new(lang, text))
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty() && self.text.is_none()
    }

    /// Set the text for a language, replacing an existing form in that language.
    pub fn set(&mut self, lang: impl Into<Lang>, text: impl Into<Text>) {
        let lang = lang.into();
        let text = text.into();
        match self.forms.iter_mut().find(|form| form.lang == lang) {
            Some(form) => form.text = text,
            None => self.forms.push(Form {
                lang,
                text,
                ..Form::default()
            }),
        }
    }

    pub fn get(&self, lang: &str) -> Option<&Form> {
        self.forms.iter().find(|form| form.lang.matches(lang))
    }

    pub fn text(&self, lang: &str) -> Option<&str> {
        self.get(lang).map(Form::as_str)
    }

    /// Forms in collated order.
    pub fn iter(&self) -> impl Iterator<Item = &Form> {
        let mut forms: Vec<&Form> = self.forms.iter().collect();
        forms.sort_by_cached_key(|form| {
            (
                collation_key(form.lang.as_str()),
                collation_key(form.as_str()),
            )
        });
        forms.into_iter()
    }

    /// First form in collated order, falling back to the legacy bare text.
    pub fn first(&self) -> Option<&str> {
        self.iter()
            .next()
            .map(Form::as_str)
            .or_else(|| self.text.as_ref().map(Text::as_str))
    }

    /// Distinct languages in document order.
    pub fn langs(&self) -> Vec<&Lang> {
        let mut langs: Vec<&Lang> = Vec::new();
        for form in &self.forms {
            if !langs.contains(&&form.lang) {
                langs.push(&form.lang);
            }
        }
        langs
    }

    /// Read the inline multitext content (forms, and the legacy bare text) of an entity.
    pub fn take_content(bound: &mut Bound, ctx: &mut MapContext) -> LiftResult<Multitext> {
        Ok(Multitext {
            forms: bound.many("form", ctx)?,
            text: bound.one("text", ctx)?,
            ..Multitext::default()
        })
    }

    /// Write the inline content of an entity. Traits and annotations of an inline multitext
    /// belong to the entity, so only stray ones held here are written.
    pub fn emit_content(&self, out: &mut Emitter) {
        out.many("form", &self.forms);
        out.one("text", self.text.as_ref());
        out.many("trait", &self.traits);
        out.many("annotation", &self.annotations);
    }
}

impl fmt::Display for Multitext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for form in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            form.fmt(f)?;
        }
        if first {
            if let Some(text) = &self.text {
                text.fmt(f)?;
            }
        }
        Ok(())
    }
}

impl LiftNode for Multitext {
    fn schema(version: LiftVersion) -> TypeSchema {
        match version {
            LiftVersion::V0_13 => MULTITEXT_LEGACY,
            LiftVersion::V0_15 => MULTITEXT,
        }
    }

    fn from_bound(mut bound: Bound, ctx: &mut MapContext) -> LiftResult<Self> {
        let mut multitext = Multitext::take_content(&mut bound, ctx)?;
        multitext.traits = bound.many("trait", ctx)?;
        multitext.annotations = bound.many("annotation", ctx)?;
        multitext.residue = bound.finish();
        Ok(multitext)
    }

    fn emit(&self, out: &mut Emitter) {
        self.emit_content(out);
        out.residue(&self.residue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::mapping::map_element;
    use crate::lift::markup::parse_str;
    use crate::lift::serializing::to_element;

    fn map(source: &str, version: LiftVersion) -> Multitext {
        let mut ctx = MapContext::new(version);
        map_element(parse_str(source).expect("well-formed"), &mut ctx).expect("maps")
    }

    #[test]
    fn test_iteration_is_collated_not_document_order() {
        let multitext = Multitext::from_pairs([("seh", "b"), ("EN", "house"), ("en", "abode")]);
        let order: Vec<_> = multitext.iter().map(Form::as_str).collect();
        assert_eq!(order, vec!["abode", "house", "b"]);
        assert_eq!(multitext.forms[0].as_str(), "b");
        assert_eq!(multitext.to_string(), "abode; house; b");
    }

    #[test]
    fn test_lookup_by_language_ignores_case() {
        let multitext = Multitext::from_pairs([("en", "house")]);
        assert_eq!(multitext.text("EN"), Some("house"));
        assert_eq!(multitext.text("fr"), None);
    }

    #[test]
    fn test_set_replaces_existing_language() {
        let mut multitext = Multitext::from_pairs([("en", "house")]);
        multitext.set("en", "home");
        multitext.set("fr", "maison");
        assert_eq!(multitext.forms.len(), 2);
        assert_eq!(multitext.text("en"), Some("home"));
    }

    #[test]
    fn test_missing_form_lang_is_a_schema_violation() {
        let mut ctx = MapContext::new(LiftVersion::V0_15);
        let element = parse_str("<lexical-unit><form><text>x</text></form></lexical-unit>")
            .expect("well-formed");
        let err = map_element::<Multitext>(element, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("'lang'"), "{err}");
    }

    #[test]
    fn test_bare_text_only_in_legacy_revision() {
        let source = r#"<definition><text>old style</text><form lang="en"><text>new</text></form></definition>"#;
        let legacy = map(source, LiftVersion::V0_13);
        assert_eq!(legacy.text.as_ref().map(Text::as_str), Some("old style"));
        assert!(legacy.residue.is_empty());

        let latest = map(source, LiftVersion::V0_15);
        assert!(latest.text.is_none());
        assert_eq!(latest.residue.elements().count(), 1);
        assert_eq!(latest.text("en"), Some("new"));
    }

    #[test]
    fn test_multitext_round_trip_keeps_document_order() {
        let multitext = map(
            r#"<usage><form lang="z"><text>1</text></form><form lang="a"><text>2</text></form><trait name="t" value="v"/></usage>"#,
            LiftVersion::V0_15,
        );
        let element = to_element(&multitext, "usage", LiftVersion::V0_15);
        assert_eq!(element.name, "usage");
        let mut ctx = MapContext::new(LiftVersion::V0_15);
        let back: Multitext = map_element(element, &mut ctx).expect("maps back");
        assert_eq!(back, multitext);
        assert_eq!(back.traits.len(), 1);
    }
}
