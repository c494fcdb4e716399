//! End-to-end scenarios against a reachable DynamoDB endpoint (a local
//! emulator, typically `docker run amazon/dynamodb-local`). Ignored by
//! default since they need network access; run with
//! `DYNASQL_TEST_ENDPOINT=http://localhost:8000 cargo test -- --ignored`.
//!
//! Mirrors the `music` table walkthrough: HASH=Artist, RANGE=SongTitle,
//! columns Artist, SongTitle, AlbumTitle, ReleaseYear, Price, Genre, Tags.

use dynasql_engine::connection::ConnectionConfig;
use dynasql_engine::driver::Driver;
use dynasql_engine::value::RecordValue;

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        region: "us-east-1".to_string(),
        endpoint: std::env::var("DYNASQL_TEST_ENDPOINT").ok(),
        key: Some("local".to_string()),
        secret: Some("local".to_string()),
        ..ConnectionConfig::default()
    }
}

#[tokio::test]
#[ignore = "requires a reachable DynamoDB endpoint"]
async fn music_table_lifecycle() {
    init_tracing();
    let driver = Driver::connect(&test_config(), None).await.expect("connect");

    driver
        .create_table("CREATE TABLE IF NOT EXISTS music (Artist string HASH KEY, SongTitle string RANGE KEY)")
        .await
        .expect("create table");

    let rows_affected = driver
        .execute(
            "INSERT INTO music(Artist,SongTitle,ReleaseYear,Price) VALUES(?,?,?,?)",
            &[
                RecordValue::String("A0".into()),
                RecordValue::String("T0".into()),
                RecordValue::Integer(2000),
                RecordValue::Float(0.5),
            ],
        )
        .await
        .expect("insert");
    assert_eq!(rows_affected, 1);

    let mut rows = Vec::new();
    driver
        .query(
            "SELECT Artist,SongTitle,ReleaseYear,Price FROM music WHERE Artist=? AND SongTitle=?",
            &[RecordValue::String("A0".into()), RecordValue::String("T0".into())],
            |record| {
                rows.push(record);
                Ok(true)
            },
        )
        .await
        .expect("point lookup");
    assert_eq!(rows.len(), 1);

    let mut count_rows = Vec::new();
    driver
        .query("SELECT COUNT(*) FROM music", &[], |record| {
            count_rows.push(record);
            Ok(true)
        })
        .await
        .expect("count star");
    assert_eq!(count_rows.len(), 1);

    let deleted = driver.execute("DELETE FROM music", &[]).await.expect("scan and delete");
    assert_eq!(deleted, 1);

    driver.drop_table("DROP TABLE IF EXISTS music").await.expect("drop table");
}

#[tokio::test]
#[ignore = "requires a reachable DynamoDB endpoint"]
async fn composite_in_predicate_issues_one_get_item_per_tuple() {
    let driver = Driver::connect(&test_config(), None).await.expect("connect");
    driver
        .create_table("CREATE TABLE IF NOT EXISTS music (Artist string HASH KEY, SongTitle string RANGE KEY)")
        .await
        .expect("create table");

    for (artist, song) in [("A0", "T0"), ("A2", "T2")] {
        driver
            .execute(
                "INSERT INTO music(Artist,SongTitle) VALUES(?,?)",
                &[RecordValue::String(artist.into()), RecordValue::String(song.into())],
            )
            .await
            .expect("insert");
    }

    let mut rows = Vec::new();
    driver
        .query(
            "SELECT Artist,SongTitle FROM music WHERE (Artist,SongTitle) IN ((?,?),(?,?))",
            &[
                RecordValue::String("A0".into()),
                RecordValue::String("T0".into()),
                RecordValue::String("A2".into()),
                RecordValue::String("T2".into()),
            ],
            |record| {
                rows.push(record);
                Ok(true)
            },
        )
        .await
        .expect("composite in");
    assert_eq!(rows.len(), 2);

    driver.drop_table("DROP TABLE IF EXISTS music").await.expect("drop table");
}
