//! Ranking and per-user rollup.

use triage_core::{
    matrix::{Cell, FeatureMatrix},
    rank::{rank, rollup, RankedRow},
    TriageError,
};

/// Scored matrix with only the columns ranking reads.
fn scored(rows: &[(Cell, Cell, f64, f64)]) -> FeatureMatrix {
    let mut m = FeatureMatrix::new(vec![
        "tx_id".into(),
        "user_id".into(),
        "amount".into(),
        "anomaly_score".into(),
    ]);
    for (tx_id, user, amount, score) in rows {
        m.push_row(vec![tx_id.clone(), user.clone(), Cell::Real(*amount), Cell::Real(*score)]);
    }
    m
}

fn row(tx_id: i64, user: &str, amount: f64, anomaly_score: f64) -> RankedRow {
    RankedRow {
        tx_id,
        user_id: Some(user.to_string()),
        amount,
        anomaly_score,
    }
}

#[test]
fn ranks_descending_and_keeps_every_row() {
    let m = scored(&[
        (Cell::Integer(1), Cell::Text("a".into()), 10.0, 0.2),
        (Cell::Integer(2), Cell::Text("b".into()), 20.0, 0.9),
        (Cell::Integer(3), Cell::Text("c".into()), 30.0, 0.0),
        (Cell::Integer(4), Cell::Text("d".into()), 40.0, 1.0),
    ]);
    let ranked = rank(&m).unwrap();

    assert_eq!(ranked.len(), m.row_count());
    let ids: Vec<i64> = ranked.iter().map(|r| r.tx_id).collect();
    assert_eq!(ids, vec![4, 2, 1, 3]);
    assert!(ranked.windows(2).all(|w| w[0].anomaly_score >= w[1].anomaly_score));
}

#[test]
fn equal_scores_keep_query_order() {
    let m = scored(&[
        (Cell::Integer(7), Cell::Text("a".into()), 5.0, 0.5),
        (Cell::Integer(3), Cell::Text("a".into()), 5.0, 0.5),
        (Cell::Integer(9), Cell::Text("b".into()), 1.0, 0.8),
        (Cell::Integer(1), Cell::Text("b".into()), 5.0, 0.5),
    ]);
    let ids: Vec<i64> = rank(&m).unwrap().iter().map(|r| r.tx_id).collect();
    assert_eq!(ids, vec![9, 7, 3, 1]);
}

#[test]
fn tx_id_accepts_integral_text_and_real() {
    let m = scored(&[
        (Cell::Text("12".into()), Cell::Text("a".into()), 1.0, 0.1),
        (Cell::Real(13.0), Cell::Integer(42), 1.0, 0.2),
    ]);
    let ranked = rank(&m).unwrap();
    assert_eq!(ranked[0].tx_id, 13);
    assert_eq!(ranked[0].user_id.as_deref(), Some("42"));
    assert_eq!(ranked[1].tx_id, 12);
}

#[test]
fn real_user_ids_keep_their_decimal_point() {
    let m = scored(&[
        (Cell::Integer(1), Cell::Real(1.0), 5.0, 0.9),
        (Cell::Integer(2), Cell::Integer(1), 7.0, 0.4),
        (Cell::Integer(3), Cell::Real(2.5), 1.0, 0.1),
    ]);
    let ranked = rank(&m).unwrap();
    let users: Vec<_> = ranked.iter().map(|r| r.user_id.as_deref()).collect();
    assert_eq!(users, vec![Some("1.0"), Some("1"), Some("2.5")]);

    let summary = rollup(&ranked, 10);
    assert_eq!(summary.len(), 3, "REAL 1.0 and INTEGER 1 are distinct users");
}

#[test]
fn fractional_tx_id_is_rejected() {
    let m = scored(&[(Cell::Real(1.5), Cell::Text("a".into()), 1.0, 0.1)]);
    match rank(&m).unwrap_err() {
        TriageError::InvalidValue { column, row, .. } => {
            assert_eq!(column, "tx_id");
            assert_eq!(row, 0);
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn missing_user_id_column_is_reported() {
    let mut m = FeatureMatrix::new(vec!["tx_id".into(), "amount".into(), "anomaly_score".into()]);
    m.push_row(vec![Cell::Integer(1), Cell::Real(1.0), Cell::Real(0.0)]);
    let err = rank(&m).unwrap_err();
    assert!(matches!(err, TriageError::MissingFeature { ref column } if column == "user_id"), "got {err:?}");
}

#[test]
fn rollup_takes_max_score_and_total_amount() {
    let ranked = vec![
        row(1, "alice", 100.0, 0.9),
        row(2, "bob", 50.0, 0.8),
        row(3, "alice", 25.0, 0.4),
        row(4, "carol", 10.0, 0.1),
    ];
    let summary = rollup(&ranked, 1000);

    assert_eq!(summary.len(), 3);
    assert_eq!(summary[0].user_id, "alice");
    assert_eq!(summary[0].max_anomaly_score, 0.9);
    assert_eq!(summary[0].total_amount, 125.0);
    assert_eq!(summary[1].user_id, "bob");
    assert_eq!(summary[2].user_id, "carol");
}

#[test]
fn rollup_only_covers_top_k() {
    let ranked = vec![
        row(1, "a", 1.0, 0.9),
        row(2, "b", 1.0, 0.8),
        row(3, "a", 5.0, 0.7),
        row(4, "c", 1.0, 0.6),
    ];
    let summary = rollup(&ranked, 3);
    let users: Vec<&str> = summary.iter().map(|s| s.user_id.as_str()).collect();
    assert_eq!(users, vec!["a", "b"]);
    assert_eq!(summary[0].total_amount, 6.0);
}

#[test]
fn rollup_ties_break_on_amount_then_user_id() {
    let ranked = vec![
        row(1, "zed", 10.0, 0.5),
        row(2, "amy", 10.0, 0.5),
        row(3, "max", 20.0, 0.5),
    ];
    let users: Vec<String> = rollup(&ranked, 1000).into_iter().map(|s| s.user_id).collect();
    assert_eq!(users, vec!["max", "amy", "zed"]);
}

#[test]
fn rollup_skips_rows_without_user() {
    let mut ranked = vec![row(1, "a", 1.0, 0.9)];
    ranked.push(RankedRow {
        tx_id: 2,
        user_id: None,
        amount: 100.0,
        anomaly_score: 1.0,
    });
    let summary = rollup(&ranked, 1000);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].user_id, "a");
}

#[test]
fn rollup_size_is_bounded() {
    let ranked: Vec<RankedRow> = (0..2500i64)
        .map(|i| row(i, &format!("u{}", i % 1500), 1.0, 1.0 - i as f64 / 2500.0))
        .collect();
    let summary = rollup(&ranked, 1000);
    assert!(summary.len() <= 1000);
    // The first 1000 rows hold users u0..u999 exactly once.
    assert_eq!(summary.len(), 1000);

    let small = rollup(&ranked[..10], 1000);
    assert_eq!(small.len(), 10);
}
