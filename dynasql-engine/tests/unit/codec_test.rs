//! Round-trip coverage for nested list/map attribute values, which the
//! inline codec unit tests don't exercise.

use dynasql_engine::codec::{decode, encode};
use dynasql_engine::value::{Record, RecordValue};

#[test]
fn nested_list_and_map_round_trip() {
    let mut inner = Record::new();
    inner.insert("genre".into(), RecordValue::String("rock".into()));
    inner.insert("rating".into(), RecordValue::Integer(5));

    let mut record = Record::new();
    record.insert(
        "Tags".into(),
        RecordValue::List(vec![RecordValue::String("live".into()), RecordValue::String("remaster".into())]),
    );
    record.insert("Meta".into(), RecordValue::Map(inner));

    let encoded = encode(&record).unwrap();
    let decoded = decode(&encoded);
    assert_eq!(decoded, record);
}

#[test]
fn binary_values_round_trip() {
    let mut record = Record::new();
    record.insert("blob".into(), RecordValue::Bytes(vec![1, 2, 3, 4]));
    let encoded = encode(&record).unwrap();
    let decoded = decode(&encoded);
    assert_eq!(decoded, record);
}
