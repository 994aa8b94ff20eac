//! Snapshot of the writer's layout.

use lift_parser::lift::markup::serialize;
use lift_parser::lift::testing::load_str;

#[test]
fn test_minimal_lexicon_layout() {
    let loaded = load_str(
        r#"<lift version="0.13"><entry id="a"><lexical-unit><form lang="seh"><text>pëpe</text></form></lexical-unit><sense id="a1"><gloss lang="en"><text>house &amp; home</text></gloss></sense></entry></lift>"#,
    )
    .expect("loads");
    let text = serialize(&loaded.lexicon.to_element()).expect("serializes");
    insta::assert_snapshot!("minimal_lexicon", text);
}
