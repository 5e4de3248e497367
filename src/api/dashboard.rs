//! Dashboard API - read-only aggregates behind the invoice dashboard
//!
//! Everything here is derived data over the same five tables the query
//! pipeline works against: overview stats, the paginated invoice list,
//! vendor/category/trend rollups and the cash outflow forecast. Failures
//! surface as HTTP 500 with an `error` body, unlike `/query` which folds
//! errors into a 200 response.

use crate::db::{quote_literal, DbError, ExecOutcome, SqlExecutor};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::error;

pub fn routes() -> Router {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/invoices", get(list_invoices_handler))
        .route("/invoices/:id", get(invoice_detail_handler))
        .route("/vendors/top10", get(top_vendors_handler))
        .route("/invoice-trends", get(invoice_trends_handler))
        .route("/category-spend", get(category_spend_handler))
        .route("/cash-outflow", get(cash_outflow_handler))
}

type DashboardResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn db_failure(e: DbError) -> (StatusCode, Json<Value>) {
    error!(error = %e, "dashboard query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
}

async fn fetch_rows(
    executor: &dyn SqlExecutor,
    sql: &str,
) -> Result<Vec<Map<String, Value>>, DbError> {
    match executor.execute(sql).await? {
        ExecOutcome::Rows(rows) => Ok(rows),
        ExecOutcome::Affected { .. } => Ok(Vec::new()),
    }
}

fn num(row: &Map<String, Value>, key: &str) -> f64 {
    row.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn int(row: &Map<String, Value>, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Escape LIKE metacharacters so a search term matches literally. Postgres
/// treats `\` as the escape character inside LIKE patterns by default.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

// =============================================================================
// Overview stats
// =============================================================================

/// One round trip: every window the overview cards need, as FILTER aggregates.
/// Amounts come back as float8 so the charts receive plain JSON numbers.
const STATS_SQL: &str = r#"SELECT
  COALESCE(SUM("totalAmount") FILTER (WHERE "invoiceDate" >= date_trunc('year', CURRENT_DATE)), 0)::float8 AS ytd_spend,
  COALESCE(SUM("totalAmount") FILTER (WHERE "invoiceDate" >= date_trunc('year', CURRENT_DATE) - INTERVAL '1 year'
                                        AND "invoiceDate" <  date_trunc('year', CURRENT_DATE)), 0)::float8 AS last_year_spend,
  COUNT(*) AS total_invoices,
  COUNT(*) FILTER (WHERE "invoiceDate" >= date_trunc('month', CURRENT_DATE) - INTERVAL '1 month'
                     AND "invoiceDate" <  date_trunc('month', CURRENT_DATE)) AS last_month_invoices,
  COUNT(*) FILTER (WHERE "invoiceDate" >= date_trunc('month', CURRENT_DATE)) AS this_month_invoices,
  COALESCE(AVG("totalAmount"), 0)::float8 AS avg_invoice,
  COALESCE(AVG("totalAmount") FILTER (WHERE "invoiceDate" >= date_trunc('month', CURRENT_DATE) - INTERVAL '1 month'
                                        AND "invoiceDate" <  date_trunc('month', CURRENT_DATE)), 0)::float8 AS last_month_avg
FROM invoices"#;

async fn stats_handler(Extension(executor): Extension<Arc<dyn SqlExecutor>>) -> DashboardResult {
    let rows = fetch_rows(executor.as_ref(), STATS_SQL).await.map_err(db_failure)?;
    let row = rows.into_iter().next().unwrap_or_default();

    let ytd = num(&row, "ytd_spend");
    let last_year = num(&row, "last_year_spend");
    let total_invoices = int(&row, "total_invoices");
    let last_month = int(&row, "last_month_invoices");
    let this_month = int(&row, "this_month_invoices");
    let avg = num(&row, "avg_invoice");
    let last_month_avg = num(&row, "last_month_avg");

    Ok(Json(json!({
        "totalSpend": {
            "value": ytd,
            "change": percent_change(ytd, last_year),
            "label": "YTD"
        },
        "totalInvoices": {
            "value": total_invoices,
            "change": percent_change(total_invoices as f64, last_month as f64)
        },
        "documentsUploaded": {
            "value": this_month,
            "change": percent_change(this_month as f64, last_month as f64),
            "label": "This Month"
        },
        "averageInvoiceValue": {
            "value": avg,
            "change": percent_change(avg, last_month_avg)
        }
    })))
}

// =============================================================================
// Invoice list
// =============================================================================

#[derive(Debug, Deserialize)]
struct InvoiceListParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    search: String,
    #[serde(default)]
    status: String,
    #[serde(default = "default_sort_by", rename = "sortBy")]
    sort_by: String,
    #[serde(default = "default_sort_order", rename = "sortOrder")]
    sort_order: String,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    10
}
fn default_sort_by() -> String {
    "invoiceDate".to_string()
}
fn default_sort_order() -> String {
    "desc".to_string()
}

/// Sort keys map onto a fixed column list; anything else falls back to the
/// invoice date. The parameter never reaches the SQL text directly.
fn sort_column(key: &str) -> &'static str {
    match key {
        "dueDate" => r#"i."dueDate""#,
        "amount" | "totalAmount" => r#"i."totalAmount""#,
        "invoiceNumber" => r#"i."invoiceNumber""#,
        "status" => "i.status",
        "vendor" => "v.name",
        _ => r#"i."invoiceDate""#,
    }
}

async fn list_invoices_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
    Query(params): Query<InvoiceListParams>,
) -> DashboardResult {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let offset = (u64::from(page) - 1) * u64::from(limit);

    let mut clauses = Vec::new();
    if !params.search.is_empty() {
        let pattern = quote_literal(&format!("%{}%", escape_like(&params.search)));
        clauses.push(format!(
            r#"(i."invoiceNumber" ILIKE {pattern} OR v.name ILIKE {pattern})"#
        ));
    }
    if !params.status.is_empty() {
        clauses.push(format!("i.status = {}", quote_literal(&params.status)));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let direction = if params.sort_order.eq_ignore_ascii_case("asc") { "ASC" } else { "DESC" };
    let data_sql = format!(
        r#"SELECT i.id, i."invoiceNumber", v.name AS vendor, i."invoiceDate" AS date, i."dueDate", i."totalAmount"::float8 AS amount, i.status, i.category, i.currency FROM invoices i JOIN vendors v ON i."vendorId" = v.id{where_sql} ORDER BY {} {direction} LIMIT {limit} OFFSET {offset}"#,
        sort_column(&params.sort_by)
    );
    let count_sql = format!(
        r#"SELECT COUNT(*) AS total FROM invoices i JOIN vendors v ON i."vendorId" = v.id{where_sql}"#
    );

    let data = fetch_rows(executor.as_ref(), &data_sql).await.map_err(db_failure)?;
    let count_rows = fetch_rows(executor.as_ref(), &count_sql).await.map_err(db_failure)?;
    let total = count_rows.first().map(|row| int(row, "total")).unwrap_or(0);
    let total_pages = (total + limit as i64 - 1) / limit as i64;

    Ok(Json(json!({
        "data": data,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages
        }
    })))
}

async fn invoice_detail_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
    Path(id): Path<String>,
) -> DashboardResult {
    let sql = format!(
        r#"SELECT row_to_json(i.*) AS invoice, row_to_json(v.*) AS vendor, row_to_json(c.*) AS customer,
  COALESCE((SELECT json_agg(li.*) FROM line_items li WHERE li."invoiceId" = i.id), '[]'::json) AS "lineItems",
  COALESCE((SELECT json_agg(p.*) FROM payments p WHERE p."invoiceId" = i.id), '[]'::json) AS payments
FROM invoices i
JOIN vendors v ON i."vendorId" = v.id
LEFT JOIN customers c ON i."customerId" = c.id
WHERE i.id = {}"#,
        quote_literal(&id)
    );

    let rows = fetch_rows(executor.as_ref(), &sql).await.map_err(db_failure)?;
    let Some(row) = rows.into_iter().next() else {
        return Err((StatusCode::NOT_FOUND, Json(json!({ "error": "Invoice not found" }))));
    };

    // Invoice fields live at the top level, relations hang off them.
    let mut body = match row.get("invoice") {
        Some(Value::Object(invoice)) => invoice.clone(),
        _ => Map::new(),
    };
    for key in ["vendor", "customer", "lineItems", "payments"] {
        body.insert(key.to_string(), row.get(key).cloned().unwrap_or(Value::Null));
    }
    Ok(Json(Value::Object(body)))
}

// =============================================================================
// Rollups
// =============================================================================

const TOP_VENDORS_SQL: &str = r#"SELECT v.name AS "vendorName",
  COALESCE(SUM(i."totalAmount"), 0)::float8 AS "totalSpend",
  COUNT(i.id) AS "invoiceCount"
FROM invoices i
JOIN vendors v ON i."vendorId" = v.id
GROUP BY v.id, v.name
ORDER BY "totalSpend" DESC
LIMIT 10"#;

async fn top_vendors_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
) -> DashboardResult {
    let rows = fetch_rows(executor.as_ref(), TOP_VENDORS_SQL).await.map_err(db_failure)?;
    Ok(Json(json!(rows)))
}

const TRENDS_SQL: &str = r#"SELECT EXTRACT(MONTH FROM "invoiceDate")::int4 AS month_number,
  COUNT(*) AS "invoiceCount",
  COALESCE(SUM("totalAmount"), 0)::float8 AS "totalSpend"
FROM invoices
WHERE "invoiceDate" >= date_trunc('year', CURRENT_DATE)
  AND "invoiceDate" <  date_trunc('year', CURRENT_DATE) + INTERVAL '1 year'
GROUP BY month_number
ORDER BY month_number"#;

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Twelve entries for the current calendar year, zero-filled for months with
/// no invoices.
async fn invoice_trends_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
) -> DashboardResult {
    let rows = fetch_rows(executor.as_ref(), TRENDS_SQL).await.map_err(db_failure)?;

    let mut by_month = [(0i64, 0f64); 12];
    for row in &rows {
        let month = int(row, "month_number");
        if (1..=12).contains(&month) {
            by_month[month as usize - 1] = (int(row, "invoiceCount"), num(row, "totalSpend"));
        }
    }

    let trends: Vec<Value> = MONTHS
        .iter()
        .zip(by_month)
        .map(|(name, (count, spend))| {
            json!({ "month": name, "invoiceCount": count, "totalSpend": spend })
        })
        .collect();
    Ok(Json(Value::Array(trends)))
}

const CATEGORY_SQL: &str = r#"SELECT category AS name,
  COALESCE(SUM("totalAmount"), 0)::float8 AS value
FROM invoices
WHERE category IS NOT NULL
GROUP BY category
ORDER BY value DESC"#;

async fn category_spend_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
) -> DashboardResult {
    let rows = fetch_rows(executor.as_ref(), CATEGORY_SQL).await.map_err(db_failure)?;
    Ok(Json(json!(rows)))
}

/// Pending and overdue invoices bucketed by how soon they fall due.
const CASH_OUTFLOW_SQL: &str = r#"SELECT CASE
    WHEN "dueDate" < CURRENT_DATE + INTERVAL '7 days'  THEN '0-7 days'
    WHEN "dueDate" < CURRENT_DATE + INTERVAL '30 days' THEN '8-30 days'
    WHEN "dueDate" < CURRENT_DATE + INTERVAL '60 days' THEN '31-60 days'
    ELSE '60+ days'
  END AS bucket,
  COALESCE(SUM("totalAmount"), 0)::float8 AS outflow
FROM invoices
WHERE status IN ('pending', 'overdue') AND "dueDate" >= CURRENT_DATE
GROUP BY bucket"#;

const OUTFLOW_BUCKETS: [&str; 4] = ["0-7 days", "8-30 days", "31-60 days", "60+ days"];

async fn cash_outflow_handler(
    Extension(executor): Extension<Arc<dyn SqlExecutor>>,
) -> DashboardResult {
    let rows = fetch_rows(executor.as_ref(), CASH_OUTFLOW_SQL).await.map_err(db_failure)?;

    let data: Vec<Value> = OUTFLOW_BUCKETS
        .iter()
        .map(|bucket| {
            let outflow = rows
                .iter()
                .find(|row| row.get("bucket").and_then(Value::as_str) == Some(bucket))
                .map(|row| num(row, "outflow"))
                .unwrap_or(0.0);
            json!({ "month": bucket, "outflow": outflow })
        })
        .collect();
    Ok(Json(Value::Array(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change_guards_division_by_zero() {
        assert_eq!(percent_change(10.0, 0.0), 0.0);
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(50.0, 100.0), -50.0);
    }

    #[test]
    fn test_sort_column_restricts_to_allow_list() {
        assert_eq!(sort_column("vendor"), "v.name");
        assert_eq!(sort_column("amount"), r#"i."totalAmount""#);
        // Injection attempts fall back to the default column.
        assert_eq!(sort_column("1; DROP TABLE invoices"), r#"i."invoiceDate""#);
    }

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_stats_sql_casts_amounts_to_float8() {
        assert!(STATS_SQL.contains("::float8"));
        assert!(STATS_SQL.contains(r#"FILTER (WHERE "invoiceDate""#));
    }
}
