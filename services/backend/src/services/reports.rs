//! Revenue and expense aggregation

use chrono::NaiveDate;
use serde_json::Value;
use shared::{IsoDate, MonthKey};
use std::collections::BTreeMap;

use crate::domain::{MonthlyFigures, MonthlyReport, RevenueSummary};
use crate::errors::Result;
use crate::mapping::{coerce_f64, pick, text, truthy};
use crate::repository::{Query, TableStore};

fn amount(row: &Value, key: &str) -> f64 {
    row.get(key).and_then(coerce_f64).unwrap_or(0.0)
}

pub async fn revenue_summary(store: &dyn TableStore) -> Result<RevenueSummary> {
    let orders = store
        .select(shared::TABLE_ORDERS, &Query::new().select("total_amount,paid_amount"))
        .await?;
    let expenses = store
        .select(shared::TABLE_EXPENSES, &Query::new().select("amount"))
        .await?;

    Ok(RevenueSummary {
        total_revenue: orders.iter().map(|o| amount(o, "total_amount")).sum(),
        total_paid: orders.iter().map(|o| amount(o, "paid_amount")).sum(),
        total_expenses: expenses.iter().map(|e| amount(e, "amount")).sum(),
    })
}

/// Income per arrival month; paid amount wins over the total when set.
///
/// Orders without a parsable arrival date are skipped.
pub fn monthly_income(orders: &[Value]) -> BTreeMap<MonthKey, f64> {
    let mut months = BTreeMap::new();
    for order in orders {
        let Some(arrival) = order.get("arrival_date").filter(|v| truthy(v)) else {
            continue;
        };
        let Ok(date) = IsoDate::parse_loose(&text(arrival)) else {
            tracing::debug!(arrival = %arrival, "Skipping order with unparsable arrival date");
            continue;
        };
        let value = pick(order, &["paid_amount", "total_amount"])
            .and_then(coerce_f64)
            .unwrap_or(0.0);
        *months.entry(date.month()).or_insert(0.0) += value;
    }
    months
}

/// `extracted_data` may be stored as an object or as a JSON string
fn extracted_data(invoice: &Value) -> Option<Value> {
    match invoice.get("extracted_data")? {
        Value::String(raw) => serde_json::from_str::<Value>(raw).ok().filter(Value::is_object),
        value @ Value::Object(_) => Some(value.clone()),
        _ => None,
    }
}

fn invoice_month(invoice: &Value, extracted: Option<&Value>, today: NaiveDate) -> MonthKey {
    let raw = pick(invoice, &["issued_at", "date"])
        .map(text)
        .or_else(|| {
            extracted
                .and_then(|data| data.get("invoice"))
                .and_then(|info| pick(info, &["invoice_date"]))
                .map(text)
        })
        .or_else(|| pick(invoice, &["created_at"]).map(text));

    raw.and_then(|r| IsoDate::parse_loose(&r).ok())
        .map(|d| d.month())
        .unwrap_or_else(|| MonthKey::of(today))
}

fn invoice_amount(invoice: &Value, extracted: Option<&Value>) -> Option<f64> {
    let from_extracted = extracted.and_then(|data| {
        pick(data, &["total_price"]).or_else(|| {
            data.get("totals")
                .and_then(|totals| pick(totals, &["grand_total", "amount_due"]))
        })
    });
    from_extracted
        .or_else(|| pick(invoice, &["total_price", "amount"]))
        .and_then(coerce_f64)
        .filter(|v| *v != 0.0)
}

/// Expenses per invoice month; dates that cannot be read count as `today`.
pub fn monthly_expenses(invoices: &[Value], today: NaiveDate) -> BTreeMap<MonthKey, f64> {
    let mut months = BTreeMap::new();
    for invoice in invoices {
        let extracted = extracted_data(invoice);
        let Some(value) = invoice_amount(invoice, extracted.as_ref()) else {
            tracing::debug!(invoice_id = %invoice.get("id").map(text).unwrap_or_default(), "Invoice has no amount");
            continue;
        };
        let month = invoice_month(invoice, extracted.as_ref(), today);
        *months.entry(month).or_insert(0.0) += value;
    }
    months
}

pub fn combine(income: BTreeMap<MonthKey, f64>, expenses: BTreeMap<MonthKey, f64>) -> MonthlyReport {
    let mut months: Vec<MonthKey> = income.keys().chain(expenses.keys()).copied().collect();
    months.sort_unstable();
    months.dedup();

    let monthly_data = months
        .into_iter()
        .rev()
        .map(|month| {
            let inc = income.get(&month).copied().unwrap_or(0.0);
            let exp = expenses.get(&month).copied().unwrap_or(0.0);
            MonthlyFigures {
                month: month.to_string(),
                income: inc,
                expenses: exp,
                net: inc - exp,
            }
        })
        .collect();

    let total_income: f64 = income.values().sum();
    let total_expenses: f64 = expenses.values().sum();
    MonthlyReport {
        monthly_data,
        total_income,
        total_expenses,
        total_net: total_income - total_expenses,
    }
}

/// Monthly income (orders) against expenses (invoices).
///
/// Either source failing degrades to an empty input rather than an error.
pub async fn monthly_income_expenses(store: &dyn TableStore, today: NaiveDate) -> MonthlyReport {
    let orders = store
        .select(
            shared::TABLE_ORDERS,
            &Query::new().select("total_amount,paid_amount,arrival_date"),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not fetch orders for monthly report");
            Vec::new()
        });
    let invoices = store
        .select(shared::TABLE_INVOICES, &Query::new().select("*"))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not fetch invoices for monthly report");
            Vec::new()
        });

    combine(monthly_income(&orders), monthly_expenses(&invoices, today))
}
