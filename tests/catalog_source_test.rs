use stock_watch::alerts::AlertCenter;
use stock_watch::db;
use stock_watch::model::NewProduct;
use stock_watch::scheduler::run_cycle;
use stock_watch::source::{ProductSource, SqliteProductSource};
use tokio::sync::Mutex;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn item(name: &str, stock: i64, threshold: i64, lead: i64) -> NewProduct {
    NewProduct {
        name: name.into(),
        category: Some("Accessories".into()),
        current_stock: stock,
        reorder_threshold: threshold,
        lead_time_days: lead,
    }
}

#[tokio::test]
async fn sqlite_catalog_feeds_the_engine() {
    let pool = setup_pool().await;
    let mouse = db::insert_product(&pool, &item("Wireless Mouse", 5, 20, 4))
        .await
        .unwrap();
    let stand = db::insert_product(&pool, &item("Laptop Stand", 12, 20, 6))
        .await
        .unwrap();
    db::insert_product(&pool, &item("Monitor", 40, 10, 9))
        .await
        .unwrap();

    let source = SqliteProductSource::new(pool.clone());
    let snapshot = source.list_products().await.unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0].id, mouse);

    let center = Mutex::new(AlertCenter::new());
    let report = run_cycle(&center, &source).await.unwrap();
    assert_eq!(report.added, 5);

    let guard = center.lock().await;
    let ids: Vec<String> = guard.log().entries().iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids[0], format!("critical-stock-{}", mouse));
    assert_eq!(ids[1], format!("reorder-{}", mouse));
    assert_eq!(ids[2], format!("low-stock-{}", stand));
    assert_eq!(ids[3], format!("reorder-{}", stand));
    assert!(ids[4].starts_with("system-"));
    assert_eq!(
        guard.log().entries()[4].message,
        "Found 4 items requiring attention"
    );
}

#[tokio::test]
async fn restock_then_sellout_is_reported() {
    let pool = setup_pool().await;
    let id = db::insert_product(&pool, &item("USB Cable", 30, 15, 2))
        .await
        .unwrap();
    let source = SqliteProductSource::new(pool.clone());
    let center = Mutex::new(AlertCenter::new());

    let report = run_cycle(&center, &source).await.unwrap();
    assert_eq!(report.produced, 0);

    db::set_stock(&pool, &id, 0).await.unwrap();
    let report = run_cycle(&center, &source).await.unwrap();
    assert_eq!(report.added, 2);
    assert!(center
        .lock()
        .await
        .log()
        .get(&format!("out-of-stock-{}", id))
        .is_some());
}

#[tokio::test]
async fn closed_pool_is_a_source_failure() {
    let pool = setup_pool().await;
    let source = SqliteProductSource::new(pool.clone());
    pool.close().await;
    let center = Mutex::new(AlertCenter::new());
    assert!(run_cycle(&center, &source).await.is_err());
    assert!(center.lock().await.log().is_empty());
}
