//! Testing utilities
//!
//!     Hand-written LIFT is easy to get subtly wrong (a `text` outside its `form`, a `type`
//!     attribute where 0.15 wants `name`), and a test fed an illegal document tunes the
//!     reader to the wrong thing. Tests therefore share the curated documents below rather
//!     than inventing markup inline, except where the point of the test is the malformed or
//!     unusual input itself.
//!
//!     - [`SAMPLE`]: a small 0.13 dictionary in the shape FieldWorks exports. Three entries,
//!       a header with ranges and field definitions, and most satellite elements.
//!     - [`SAMPLE_0_15`]: the constructs only 0.15 has (typed field definitions, traits on
//!       glosses, notes on examples, extensible ranges).
//!
//!     [`assert_round_trip`] checks the mapping contract on any lexicon: serializing and
//!     reading back yields an equal model.

use super::error::LiftResult;
use super::lexicon::{to_lexicon, Lexicon, Loaded};
use super::loader::LoadOptions;
use super::mapping::{map_element, MapContext};
use super::markup::{parse_str, serialize};

pub const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lift version="0.13" producer="SIL.FLEx 8.3.12">
  <header>
    <description><form lang="en"><text>Sena sample dictionary</text></form></description>
    <ranges>
      <range id="grammatical-info">
        <range-element id="Noun">
          <label><form lang="en"><text>Noun</text></form></label>
          <abbrev><form lang="en"><text>n</text></form></abbrev>
        </range-element>
        <range-element id="Verb">
          <label><form lang="en"><text>Verb</text></form></label>
          <abbrev><form lang="en"><text>v</text></form></abbrev>
        </range-element>
      </range>
      <range id="semantic-domain-ddp4">
        <range-element id="5 Daily life"/>
        <range-element id="5.1 Household" parent="5 Daily life"/>
      </range>
    </ranges>
    <fields>
      <field tag="literal-meaning"><form lang="en"><text>Literal meaning of the entry.</text></form></field>
      <field tag="cv-pattern"><form lang="en"><text>Syllable pattern.</text></form></field>
    </fields>
  </header>
  <entry id="pepe_1" guid="d6f0d2a0-47c8-4a4f-9d1b-0c1c1f3c2a11" dateCreated="2008-07-01T00:00:00Z" dateModified="2011-03-01T10:00:00Z">
    <lexical-unit><form lang="seh"><text>pëpe</text></form></lexical-unit>
    <pronunciation>
      <form lang="seh"><text>pɛpɛ</text></form>
      <media href="pepe.wav"/>
    </pronunciation>
    <sense id="pepe_s1" order="1">
      <grammatical-info value="Noun"/>
      <gloss lang="en"><text>house</text></gloss>
      <gloss lang="pt"><text>casa</text></gloss>
      <example id="pepe_x1">
        <form lang="seh"><text>Ndi <span lang="seh" class="emphasis">pëpe</span> yanga.</text></form>
        <translation type="Free translation"><form lang="en"><text>It is my house.</text></form></translation>
      </example>
      <note type="encyclopedic"><form lang="en"><text>Built from mud bricks.</text></form></note>
      <trait name="semantic-domain-ddp4" value="5.1 Household"/>
    </sense>
    <etymology type="borrowed" source="Portuguese">
      <form lang="pt"><text>papel</text></form>
      <gloss lang="en"><text>paper</text></gloss>
    </etymology>
  </entry>
  <entry id="nyumba_1" dateCreated="2008-07-02T00:00:00Z">
    <lexical-unit><form lang="seh"><text>nyumba</text></form></lexical-unit>
    <variant ref="pepe_1">
      <form lang="seh"><text>nyumbá</text></form>
    </variant>
    <sense id="nyumba_s1">
      <grammatical-info value="Noun"/>
      <gloss lang="en"><text>home</text></gloss>
      <definition><form lang="en"><text>A dwelling for a family.</text></form></definition>
      <reversal type="en"><form lang="en"><text>home</text></form></reversal>
      <illustration href="nyumba.jpg"><label><form lang="en"><text>A home</text></form></label></illustration>
    </sense>
    <relation type="synonym" ref="pepe_1"/>
    <field type="literal-meaning"><form lang="en"><text>big building</text></form></field>
    <annotation name="reviewed" value="yes" who="jd" when="2011-03-01"/>
  </entry>
  <entry id="embe_1" dateCreated="2008-07-03">
    <lexical-unit><form lang="seh"><text>èmbe</text></form></lexical-unit>
    <sense id="embe_s1">
      <grammatical-info value="Verb"/>
      <gloss lang="en"><text>sing</text></gloss>
      <subsense id="embe_s1.1">
        <gloss lang="en"><text>chant</text></gloss>
      </subsense>
    </sense>
    <flag name="needs-audio"/>
  </entry>
</lift>
"#;

pub const SAMPLE_0_15: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lift version="0.15" producer="WeSay 1.6">
  <header>
    <ranges>
      <range id="grammatical-info" guid="3b2f8c5e-6a1d-4bb0-9a54-6a3f0fd2a6ef">
        <range-element id="Noun" dateCreated="2012-01-01T00:00:00Z">
          <label><form lang="en"><text>Noun</text></form></label>
          <trait name="catalog-source-id" value="Noun"/>
        </range-element>
      </range>
    </ranges>
    <fields>
      <field name="scientific-name" class="LexSense" type="multistring" writing-system="en">
        <label><form lang="en"><text>Scientific name</text></form></label>
        <description><form lang="en"><text>Latin name of the referent.</text></form></description>
      </field>
    </fields>
  </header>
  <entry id="khozi_1" dateCreated="2012-05-04T09:30:00+02:00">
    <lexical-unit><form lang="seh"><text>khozi</text></form></lexical-unit>
    <sense id="khozi_s1">
      <grammatical-info value="Noun"/>
      <gloss lang="en"><text>eagle</text><trait name="register" value="common"/></gloss>
      <example>
        <form lang="seh"><text>Khozi ibuluka.</text></form>
        <note type="source"><form lang="en"><text>Recorded in Caia.</text></form></note>
      </example>
      <field name="scientific-name"><form lang="en"><text>Haliaeetus vocifer</text></form></field>
    </sense>
  </entry>
</lift>
"#;

/// Load a document string with default options.
pub fn load_str(source: &str) -> LiftResult<Loaded> {
    to_lexicon(parse_str(source)?, &LoadOptions::default())
}

/// Load [`SAMPLE`].
pub fn load_sample() -> LiftResult<Loaded> {
    load_str(SAMPLE)
}

/// Serialize `lexicon` to text, read it back, and assert the result equals the original.
pub fn assert_round_trip(lexicon: &Lexicon) {
    let text = match serialize(&lexicon.to_element()) {
        Ok(text) => text,
        Err(err) => panic!("lexicon does not serialize: {err}"),
    };
    let root = match parse_str(&text) {
        Ok(root) => root,
        Err(err) => panic!("serialized lexicon does not parse: {err}\n{text}"),
    };
    let mut ctx = MapContext::new(lexicon.version());
    ctx.enter("lift");
    match map_element::<Lexicon>(root, &mut ctx) {
        Ok(back) => assert_eq!(&back, lexicon, "round trip changed the lexicon:\n{text}"),
        Err(err) => panic!("serialized lexicon does not map: {err}\n{text}"),
    }
}
