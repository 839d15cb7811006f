use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product snapshot as read from the data source. Columns the engine does
/// not use are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub current_stock: Option<i64>,
    #[serde(default)]
    pub reorder_threshold: Option<i64>,
    pub lead_time_days: i64,
}

impl Product {
    pub fn stock(&self) -> i64 {
        self.current_stock.unwrap_or(0)
    }

    pub fn threshold(&self) -> i64 {
        self.reorder_threshold.unwrap_or(0)
    }
}

/// Insert payload for the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub current_stock: i64,
    pub reorder_threshold: i64,
    pub lead_time_days: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CriticalStock,
    LowStock,
    ReorderNeeded,
    /// Reserved; no evaluation rule produces it.
    ForecastAlert,
    System,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CriticalStock => "critical_stock",
            Category::LowStock => "low_stock",
            Category::ReorderNeeded => "reorder_needed",
            Category::ForecastAlert => "forecast_alert",
            Category::System => "system",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Category::CriticalStock => Severity::Error,
            Category::LowStock | Category::ForecastAlert => Severity::Warning,
            Category::ReorderNeeded | Category::System => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub category: Category,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub product_id: Option<String>,
}

impl Notification {
    pub fn severity(&self) -> Severity {
        self.category.severity()
    }
}
