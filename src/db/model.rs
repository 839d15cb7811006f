//! Row shapes returned by the catalog queries.

use crate::model::Product;

/// `products` row as stored locally.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub current_stock: Option<i64>,
    pub reorder_threshold: Option<i64>,
    pub lead_time_days: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            current_stock: row.current_stock,
            reorder_threshold: row.reorder_threshold,
            lead_time_days: row.lead_time_days,
        }
    }
}
