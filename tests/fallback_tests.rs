// tests for the date and sort fallbacks

mod common;

use common::fixture_now;
use medquery::QueryResult;
use medquery::core::fallback::{
    self, SortRequest, date_window, has_date_predicate, has_order_by, parse_timestamp,
    sort_request,
};
use serde_json::{Value, json};

fn admissions() -> QueryResult {
    QueryResult::new(
        vec!["id".into(), "age".into(), "admit_date".into()],
        vec![
            vec![json!(1), json!(63), json!("2024-06-20")],
            vec![json!(2), json!(37), json!("2024-01-15")],
            vec![json!(3), json!(41), json!("2024-05-02 08:30:00")],
            vec![json!(4), json!(56), json!("2023-11-30")],
            vec![json!(5), Value::Null, json!("not a date")],
            vec![json!(6), json!(57), json!("2024-04-10")],
        ],
    )
}

fn ids(result: &QueryResult) -> Vec<i64> {
    result.rows.iter().map(|r| r[0].as_i64().unwrap()).collect()
}

#[test]
fn test_date_window_parsing() {
    assert_eq!(date_window("admissions in the last 90 days"), Some(90));
    assert_eq!(date_window("Last 2 weeks please"), Some(14));
    assert_eq!(date_window("past 3 months"), Some(90));
    assert_eq!(date_window("last 1 year"), Some(365));
    assert_eq!(date_window("the last patient"), None);
}

#[test]
fn test_last_90_days_filters_old_rows() {
    let applied = fallback::apply(
        admissions(),
        "show admissions in the last 90 days",
        "SELECT * FROM heart_disease LIMIT 200",
        fixture_now(),
    );

    // cutoff is 2024-04-01 12:00
    assert_eq!(ids(&applied.result), vec![1, 3, 6]);
    assert_eq!(applied.result.row_count, 3);

    let filter = applied.date_filter.unwrap();
    assert_eq!(filter.column, "admit_date");
    assert_eq!(filter.days, 90);
    assert_eq!(filter.dropped, 3);
}

#[test]
fn test_date_fallback_skipped_when_sql_filters_dates() {
    let sql = "SELECT * FROM heart_disease WHERE admit_date >= date('now', '-90 days') LIMIT 200";
    assert!(has_date_predicate(sql));

    let applied = fallback::apply(admissions(), "last 90 days", sql, fixture_now());
    assert_eq!(applied.result.row_count, 6);
    assert!(applied.date_filter.is_none());
}

#[test]
fn test_where_without_dates_is_not_a_date_predicate() {
    assert!(!has_date_predicate("SELECT * FROM t WHERE age > 50"));
    assert!(!has_date_predicate("SELECT admit_date FROM t"));
}

#[test]
fn test_date_fallback_without_date_column_is_noop() {
    let result = QueryResult::new(
        vec!["age".into()],
        vec![vec![json!(30)], vec![json!(40)]],
    );
    let applied = fallback::apply(result, "last 30 days", "SELECT age FROM t", fixture_now());
    assert_eq!(applied.result.row_count, 2);
    assert!(applied.date_filter.is_none());
}

#[test]
fn test_unnamed_text_dates_are_detected() {
    let result = QueryResult::new(
        vec!["id".into(), "seen".into()],
        vec![
            vec![json!(1), json!("2024-06-29")],
            vec![json!(2), json!("2020-01-01")],
        ],
    );
    let applied = fallback::apply(result, "last 7 days", "SELECT * FROM t", fixture_now());
    assert_eq!(ids(&applied.result), vec![1]);
}

#[test]
fn test_unparsable_date_column_is_noop() {
    let result = QueryResult::new(
        vec!["visit_date".into()],
        vec![vec![json!("soon")], vec![json!("later")]],
    );
    let applied = fallback::apply(result, "last 90 days", "SELECT * FROM t", fixture_now());
    assert_eq!(applied.result.row_count, 2);
    assert!(applied.date_filter.is_none());
}

#[test]
fn test_sorted_by_age_ascending() {
    let applied = fallback::apply(
        admissions(),
        "list patients sorted by age",
        "SELECT * FROM heart_disease LIMIT 200",
        fixture_now(),
    );

    let ages: Vec<Option<i64>> = applied.result.rows.iter().map(|r| r[1].as_i64()).collect();
    assert_eq!(
        ages,
        vec![Some(37), Some(41), Some(56), Some(57), Some(63), None]
    );
    assert_eq!(
        applied.sorted_by,
        Some(SortRequest {
            column: "age".into(),
            descending: false
        })
    );
}

#[test]
fn test_sorted_by_age_descending() {
    let applied = fallback::apply(
        admissions(),
        "patients sorted by age descending",
        "SELECT * FROM heart_disease",
        fixture_now(),
    );

    let ages: Vec<i64> = applied
        .result
        .rows
        .iter()
        .filter_map(|r| r[1].as_i64())
        .collect();
    assert!(ages.windows(2).all(|w| w[0] >= w[1]));
    // nulls stay last either way
    assert!(applied.result.rows.last().unwrap()[1].is_null());
}

#[test]
fn test_sort_skipped_when_sql_orders() {
    let sql = "SELECT * FROM heart_disease ORDER BY id LIMIT 200";
    assert!(has_order_by(sql));

    let applied = fallback::apply(admissions(), "sorted by age", sql, fixture_now());
    assert_eq!(ids(&applied.result), vec![1, 2, 3, 4, 5, 6]);
    assert!(applied.sorted_by.is_none());
}

#[test]
fn test_sort_by_unknown_column_is_noop() {
    let applied = fallback::apply(
        admissions(),
        "sorted by weight",
        "SELECT * FROM heart_disease",
        fixture_now(),
    );
    assert_eq!(ids(&applied.result), vec![1, 2, 3, 4, 5, 6]);
    assert!(applied.sorted_by.is_none());
}

#[test]
fn test_sort_request_forms() {
    let columns = vec!["resting_bp".to_string(), "age".to_string()];

    let req = sort_request("order by resting bp", &columns).unwrap();
    assert_eq!(req.column, "resting_bp");

    // intent without "by": the mentioned column is used
    let req = sort_request("age of patients, sorted, highest first", &columns).unwrap();
    assert_eq!(req.column, "age");
    assert!(req.descending);

    assert!(sort_request("average age", &columns).is_none());
}

#[test]
fn test_both_fallbacks_together() {
    let applied = fallback::apply(
        admissions(),
        "last 90 days sorted by age desc",
        "SELECT * FROM heart_disease",
        fixture_now(),
    );
    assert_eq!(ids(&applied.result), vec![1, 6, 3]);
    assert_eq!(applied.notes().len(), 2);
}

#[test]
fn test_timestamp_formats() {
    assert!(parse_timestamp("2024-06-30").is_some());
    assert!(parse_timestamp("2024-06-30 10:11:12").is_some());
    assert!(parse_timestamp("2024-06-30T10:11:12Z").is_some());
    assert!(parse_timestamp("06/30/2024").is_some());
    assert!(parse_timestamp("yesterday").is_none());
    assert!(parse_timestamp("").is_none());
}

#[test]
fn test_sort_mixed_dates_and_text() {
    let result = QueryResult::new(
        vec!["id".into(), "seen".into()],
        vec![
            vec![json!(1), json!("2024-03-01")],
            vec![json!(2), json!("zeta")],
            vec![json!(3), Value::Null],
            vec![json!(4), json!("2023-12-31")],
            vec![json!(5), json!("alpha")],
            vec![json!(6), json!("2024-01-15")],
        ],
    );
    let request = SortRequest {
        column: "seen".into(),
        descending: false,
    };

    let sorted = fallback::sort_rows(result, &request);
    assert_eq!(ids(&sorted), vec![4, 6, 1, 5, 2, 3]);
}
