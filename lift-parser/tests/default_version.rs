//! The process-wide default version. Kept in its own test binary because it mutates global
//! state that the other tests read.

use lift_parser::lift::testing::load_str;
use lift_parser::lift::version::{default_version, set_default_version};
use lift_parser::{DiagnosticKind, LiftVersion};

#[test]
fn test_default_version_applies_to_undeclared_documents() {
    assert_eq!(default_version(), LiftVersion::V0_13);

    set_default_version(LiftVersion::V0_15);
    let loaded = load_str(r#"<lift><entry id="a"/></lift>"#).expect("loads");
    assert_eq!(loaded.lexicon.version(), LiftVersion::V0_15);
    assert_eq!(
        loaded
            .diagnostics
            .of_kind(DiagnosticKind::UnknownVersion)
            .count(),
        1
    );

    let declared = load_str(r#"<lift version="0.13"><entry id="a"/></lift>"#).expect("loads");
    assert_eq!(declared.lexicon.version(), LiftVersion::V0_13);

    set_default_version(LiftVersion::V0_13);
    assert_eq!(default_version(), LiftVersion::V0_13);
}
