//! Statement splitting: setup vs final query.

use triage_core::{script::Script, TriageError};

#[test]
fn splits_setup_and_final_query() {
    let script = Script::parse(
        "CREATE VIEW v AS SELECT 1;\n  CREATE VIEW w AS SELECT 2 ;\nSELECT * FROM v",
    )
    .unwrap();

    assert_eq!(script.len(), 3);
    assert_eq!(
        script.setup_statements(),
        &["CREATE VIEW v AS SELECT 1", "CREATE VIEW w AS SELECT 2"]
    );
    assert_eq!(script.final_query(), "SELECT * FROM v");
}

#[test]
fn drops_empty_and_whitespace_segments() {
    let script = Script::parse(";;  \n ; SELECT 1 ;\t; \n").unwrap();
    assert_eq!(script.statements(), &["SELECT 1"]);
    for s in script.statements() {
        assert!(!s.trim().is_empty(), "empty segment survived: {s:?}");
    }
}

#[test]
fn single_statement_has_no_setup() {
    let script = Script::parse("SELECT 1 AS x").unwrap();
    assert!(script.setup_statements().is_empty());
    assert_eq!(script.setup_batch(), None);
    assert_eq!(script.final_query(), "SELECT 1 AS x");
}

#[test]
fn setup_batch_rejoins_with_terminators() {
    let script = Script::parse("CREATE VIEW a AS SELECT 1; CREATE VIEW b AS SELECT 2; SELECT 3").unwrap();
    assert_eq!(
        script.setup_batch().as_deref(),
        Some("CREATE VIEW a AS SELECT 1;\nCREATE VIEW b AS SELECT 2;")
    );
}

#[test]
fn empty_script_is_rejected() {
    for text in ["", "   ", ";", " ; ;\n;\t"] {
        let err = Script::parse(text).unwrap_err();
        assert!(
            matches!(err, TriageError::EmptyScript),
            "expected EmptyScript for {text:?}, got {err:?}"
        );
    }
}

#[test]
fn rendered_script_parses_back_to_same_statements() {
    let texts = [
        "SELECT 1",
        "CREATE TABLE t(x); INSERT INTO t VALUES (1);\n\nSELECT x FROM t;",
        "  ;CREATE VIEW v AS SELECT 1;;; SELECT * FROM v ;  ",
    ];
    for text in texts {
        let script = Script::parse(text).unwrap();
        let reparsed = Script::parse(&script.render()).unwrap();
        assert_eq!(script, reparsed, "render() changed the statements of {text:?}");
    }
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Script::load(dir.path().join("nope.sql")).unwrap_err();
    assert!(matches!(err, TriageError::Io { .. }), "got {err:?}");
}

#[test]
fn bundled_feature_script_ends_in_a_select() {
    let script = Script::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../sql/queries.sql")).unwrap();
    assert!(script.len() > 1, "bundled script should define views first");
    assert!(script.final_query().trim_start().to_uppercase().starts_with("SELECT"));
}
