//! Pure-logic coverage of the parse → criteria → codec pipeline for the
//! `music` table scenarios, without touching a store.

use dynasql_engine::criteria::{self, CriteriaValue, ParamStream};
use dynasql_engine::parser;
use dynasql_engine::statement::StatementKind;
use dynasql_engine::value::RecordValue;

#[test]
fn insert_statement_produces_one_record_worth_of_assignments() {
    let statement =
        parser::parse("INSERT INTO music(Artist,SongTitle,ReleaseYear,Price) VALUES(?,?,?,?)").unwrap();
    assert_eq!(statement.kind, StatementKind::Insert);
    assert_eq!(statement.assignments.len(), 4);
    assert_eq!(statement.assignments[0].column, "Artist");
}

#[test]
fn point_lookup_predicate_extracts_both_key_columns() {
    let statement =
        parser::parse("SELECT Artist,SongTitle,ReleaseYear,Price FROM music WHERE Artist=? AND SongTitle=?")
            .unwrap();
    let params = vec![RecordValue::String("A0".into()), RecordValue::String("T0".into())];
    let mut stream = ParamStream::new(&params);
    let key_map = criteria::extract_key_criteria(&statement.criteria, &mut stream).unwrap();
    assert_eq!(key_map.get("Artist"), Some(&CriteriaValue::Scalar(RecordValue::String("A0".into()))));
    assert_eq!(key_map.get("SongTitle"), Some(&CriteriaValue::Scalar(RecordValue::String("T0".into()))));
}

#[test]
fn single_column_in_list_produces_filter_not_key_map() {
    let statement =
        parser::parse("SELECT Artist,SongTitle,ReleaseYear,Price FROM music WHERE Artist IN(?,?)").unwrap();
    let params = vec![RecordValue::String("A0".into()), RecordValue::String("A1".into())];
    let mut stream = ParamStream::new(&params);
    let filter = criteria::build_filter(&statement.criteria, &mut stream).unwrap().unwrap();
    assert_eq!(filter.expression, "Artist IN (:p1, :p2)");
}

#[test]
fn composite_in_predicate_expands_to_two_tuples() {
    let statement = parser::parse("SELECT Artist,SongTitle FROM music WHERE (Artist,SongTitle) IN ((?,?),(?,?))").unwrap();
    let params = vec![
        RecordValue::String("A0".into()),
        RecordValue::String("T0".into()),
        RecordValue::String("A2".into()),
        RecordValue::String("T2".into()),
    ];
    let mut stream = ParamStream::new(&params);
    let key_map = criteria::extract_key_criteria(&statement.criteria, &mut stream).unwrap();
    let tuples = criteria::expand_key_tuples(&key_map).unwrap();
    assert_eq!(tuples.len(), 2);
}

#[test]
fn count_star_has_no_where_clause() {
    let statement = parser::parse("SELECT COUNT(*) FROM music").unwrap();
    assert!(statement.criteria.is_empty());
    assert_eq!(statement.columns.len(), 1);
}

#[test]
fn delete_without_where_has_empty_criteria() {
    let statement = parser::parse("DELETE FROM music").unwrap();
    assert!(statement.criteria.is_empty());
}

#[test]
fn too_few_bind_parameters_is_missing_bind_error() {
    let statement = parser::parse("SELECT Artist FROM music WHERE Artist = ? AND SongTitle = ?").unwrap();
    let params = vec![RecordValue::String("A0".into())];
    let mut stream = ParamStream::new(&params);
    let err = criteria::extract_key_criteria(&statement.criteria, &mut stream).unwrap_err();
    assert_eq!(err.kind(), dynasql_common::ErrorKind::MissingBind);
}
