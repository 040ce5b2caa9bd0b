//! PostgreSQL scan history repository tests.
//!
//! Require a live database: `DATABASE_URL=... cargo test -p batik-db -- --ignored`

use batik_core::{Error, NewScanRecord, ScanOrder, ScanQuery, ScanRepository};
use batik_core::defaults;
use batik_db::{connect_pool, PgScanRepository, DEFAULT_TEST_DATABASE_URL};
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../../migrations/20261019000000_scan_history.sql");

async fn setup_test_pool() -> PgPool {
    let _ = dotenvy::dotenv();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let pool = connect_pool(&database_url, defaults::DB_MAX_CONNECTIONS)
        .await
        .expect("Failed to create test pool");
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to apply schema");
    pool
}

fn record(owner: Uuid, name: &str, province: &str, description: &str) -> NewScanRecord {
    NewScanRecord {
        owner_id: owner,
        motif_id: "test_motif".to_string(),
        motif_name: name.to_string(),
        province: province.to_string(),
        description: description.to_string(),
        occasion: "Acara formal".to_string(),
        confidence: 91,
        image_url: format!("https://cdn.test/{}.jpg", Uuid::new_v4()),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_returns_assigned_fields() {
    let repo = PgScanRepository::new(setup_test_pool().await);
    let owner = Uuid::new_v4();

    let stored = repo
        .insert(record(owner, "Batik Kawung Solo", "Jawa Tengah", "Kawung"))
        .await
        .expect("insert");

    assert_eq!(stored.owner_id, owner);
    assert_eq!(stored.confidence, 91);
    assert_eq!(stored.province, "Jawa Tengah");

    let fetched = repo.fetch(owner, stored.id).await.expect("fetch");
    assert_eq!(fetched.id, stored.id);

    repo.delete_all(owner).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_query_filters_and_orders() {
    let repo = PgScanRepository::new(setup_test_pool().await);
    let owner = Uuid::new_v4();

    let first = repo
        .insert(record(owner, "Batik Barong Bali", "Bali", "Barong pelindung"))
        .await
        .unwrap();
    let second = repo
        .insert(record(owner, "Batik Pintu Aceh", "Aceh", "Rumah adat"))
        .await
        .unwrap();
    let third = repo
        .insert(record(owner, "Batik Besurek", "Bengkulu", "Kaligrafi 100% Arab"))
        .await
        .unwrap();

    let (all, total) = repo.query(&ScanQuery::for_owner(owner)).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(
        all.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![third.id, second.id, first.id]
    );

    let (oldest, _) = repo
        .query(&ScanQuery::for_owner(owner).order(ScanOrder::OldestFirst).page(0, 1))
        .await
        .unwrap();
    assert_eq!(oldest[0].id, first.id);

    let (bali, bali_total) = repo
        .query(&ScanQuery::for_owner(owner).province("BAL"))
        .await
        .unwrap();
    assert_eq!(bali_total, 1);
    assert_eq!(bali[0].id, first.id);

    let (hits, _) = repo
        .query(&ScanQuery::for_owner(owner).search("rumah"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, second.id);

    // Wildcards in user input are literal
    let (percent, _) = repo
        .query(&ScanQuery::for_owner(owner).search("100%"))
        .await
        .unwrap();
    assert_eq!(percent.len(), 1);
    let (underscore, _) = repo
        .query(&ScanQuery::for_owner(owner).search("_"))
        .await
        .unwrap();
    assert!(underscore.is_empty());

    repo.delete_all(owner).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_foreign_owner_is_not_found() {
    let repo = PgScanRepository::new(setup_test_pool().await);
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let stored = repo
        .insert(record(owner, "Batik Parang", "Yogyakarta", "Parang"))
        .await
        .unwrap();

    assert!(matches!(
        repo.fetch(stranger, stored.id).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        repo.delete(stranger, stored.id).await,
        Err(Error::NotFound(_))
    ));

    // Still present for the real owner
    repo.fetch(owner, stored.id).await.unwrap();
    repo.delete_all(owner).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_twice_then_not_found() {
    let repo = PgScanRepository::new(setup_test_pool().await);
    let owner = Uuid::new_v4();
    let stored = repo
        .insert(record(owner, "Batik Parang", "Yogyakarta", "Parang"))
        .await
        .unwrap();

    let removed = repo.delete(owner, stored.id).await.unwrap();
    assert_eq!(removed.image_url, stored.image_url);
    assert!(matches!(
        repo.delete(owner, stored.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_all_returns_removed_rows() {
    let repo = PgScanRepository::new(setup_test_pool().await);
    let owner = Uuid::new_v4();
    for _ in 0..3 {
        repo.insert(record(owner, "Batik Barong Bali", "Bali", ""))
            .await
            .unwrap();
    }

    let removed = repo.delete_all(owner).await.unwrap();
    assert_eq!(removed.len(), 3);

    let (rest, total) = repo.query(&ScanQuery::for_owner(owner)).await.unwrap();
    assert!(rest.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires PostgreSQL"]
async fn test_query_total_matches_rows_during_inserts() {
    let repo = std::sync::Arc::new(PgScanRepository::new(setup_test_pool().await));
    let owner = Uuid::new_v4();

    let writer = {
        let repo = repo.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                repo.insert(record(owner, &format!("Batik {}", i), "Bali", "Barong"))
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let (rows, total) = repo.query(&ScanQuery::for_owner(owner)).await.unwrap();
        assert_eq!(rows.len() as u64, total);
    }

    writer.await.unwrap();
    repo.delete_all(owner).await.expect("cleanup");
}
