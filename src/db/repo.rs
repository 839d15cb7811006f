use super::model::ProductRow;
use crate::model::{NewProduct, Product};
use anyhow::{anyhow, Result};
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    // sqlx creates the file only when asked to
    let mut rebuilt = format!("sqlite://{}", expanded_path);
    match query_part {
        Some(q) => {
            rebuilt.push('?');
            rebuilt.push_str(q);
        }
        None => rebuilt.push_str("?mode=rwc"),
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn insert_product(pool: &Pool, product: &NewProduct) -> Result<String> {
    if product.name.trim().is_empty() {
        return Err(anyhow!("product name must be non-empty"));
    }
    if product.current_stock < 0 || product.reorder_threshold < 0 {
        return Err(anyhow!("stock and reorder threshold must be >= 0"));
    }
    if product.lead_time_days < 1 {
        return Err(anyhow!("lead time must be at least one day"));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO products (id, name, category, current_stock, reorder_threshold, lead_time_days) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(product.name.trim())
    .bind(product.category.as_deref())
    .bind(product.current_stock)
    .bind(product.reorder_threshold)
    .bind(product.lead_time_days)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Overwrite the stock level. Returns false when the product does not exist.
#[instrument(skip_all)]
pub async fn set_stock(pool: &Pool, id: &str, stock: i64) -> Result<bool> {
    if stock < 0 {
        return Err(anyhow!("stock must be >= 0"));
    }
    let res = sqlx::query(
        "UPDATE products SET current_stock = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(stock)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// All products in insertion order.
#[instrument(skip_all)]
pub async fn list_products(pool: &Pool) -> Result<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        "SELECT id, name, category, current_stock, reorder_threshold, lead_time_days FROM products ORDER BY rowid ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

#[instrument(skip_all)]
pub async fn get_product(pool: &Pool, id: &str) -> Result<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(
        "SELECT id, name, category, current_stock, reorder_threshold, lead_time_days FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Product::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn new_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            category: Some("Electronics".into()),
            current_stock: stock,
            reorder_threshold: 20,
            lead_time_days: 3,
        }
    }

    #[test]
    fn prepare_url_passthrough_and_query() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://db/x"),
            "postgres://db/x"
        );
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested").join("inv.db");
        let url = format!("sqlite://{}", path.display());
        assert_eq!(prepare_sqlite_url(&url), format!("{}?mode=rwc", url));
        assert!(path.parent().unwrap().exists());
        let with_query = format!("{}?mode=ro", url);
        assert_eq!(prepare_sqlite_url(&with_query), with_query);
    }

    #[tokio::test]
    async fn insert_list_and_update() {
        let pool = setup_pool().await;
        let a = insert_product(&pool, &new_product("Wireless Mouse", 5))
            .await
            .unwrap();
        let b = insert_product(&pool, &new_product("USB Cable", 30))
            .await
            .unwrap();
        assert_ne!(a, b);

        let all = list_products(&pool).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Wireless Mouse", "USB Cable"]);
        assert_eq!(all[0].current_stock, Some(5));

        assert!(set_stock(&pool, &a, 0).await.unwrap());
        assert!(!set_stock(&pool, "missing", 1).await.unwrap());
        let mouse = get_product(&pool, &a).await.unwrap().unwrap();
        assert_eq!(mouse.current_stock, Some(0));
        assert!(get_product(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_products() {
        let pool = setup_pool().await;
        let mut p = new_product("  ", 1);
        assert!(insert_product(&pool, &p).await.is_err());
        p.name = "Stand".into();
        p.lead_time_days = 0;
        assert!(insert_product(&pool, &p).await.is_err());
        assert!(set_stock(&pool, "x", -1).await.is_err());
        assert!(list_products(&pool).await.unwrap().is_empty());
    }
}
