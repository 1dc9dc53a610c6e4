use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{InspectionStatus, IsoDate};
use validator::Validate;

use crate::mapping::{coerce_bool, coerce_f64, coerce_i64, pick, pick_str, text, truthy};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub id: Value,
    pub username: String,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    #[serde(default)]
    pub id: Option<String>,
    pub guest_name: String,
    pub unit_number: String,
    pub arrival_date: String,
    pub departure_date: String,
    pub status: String,
    #[serde(default)]
    pub guests_count: i64,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl OrderCreate {
    /// Build from the camelCase shape the web and mobile clients send
    pub fn from_client(payload: &Value) -> Self {
        let number = |key: &str| payload.get(key).and_then(coerce_f64).unwrap_or(0.0);
        OrderCreate {
            id: None,
            guest_name: pick_str(payload, &["guestName"], ""),
            unit_number: pick_str(payload, &["unitNumber"], ""),
            arrival_date: pick_str(payload, &["arrivalDate"], ""),
            departure_date: pick_str(payload, &["departureDate"], ""),
            status: pick_str(payload, &["status"], shared::ORDER_STATUS_NEW),
            guests_count: payload.get("guestsCount").and_then(coerce_i64).unwrap_or(0),
            special_requests: Some(pick_str(payload, &["specialRequests"], "")),
            internal_notes: Some(pick_str(payload, &["internalNotes"], "")),
            paid_amount: number("paidAmount"),
            total_amount: number("totalAmount"),
            payment_method: Some(pick_str(
                payload,
                &["paymentMethod"],
                shared::PAYMENT_METHOD_UNDECIDED,
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Checklists (exit and cleaning inspections)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistKind {
    Exit,
    Cleaning,
}

impl ChecklistKind {
    pub fn label(self) -> &'static str {
        match self {
            ChecklistKind::Exit => "exit",
            ChecklistKind::Cleaning => "cleaning",
        }
    }

    pub fn parent_table(self) -> &'static str {
        match self {
            ChecklistKind::Exit => shared::TABLE_INSPECTIONS,
            ChecklistKind::Cleaning => shared::TABLE_CLEANING_INSPECTIONS,
        }
    }

    pub fn task_table(self) -> &'static str {
        match self {
            ChecklistKind::Exit => shared::TABLE_INSPECTION_TASKS,
            ChecklistKind::Cleaning => shared::TABLE_CLEANING_INSPECTION_TASKS,
        }
    }

    /// Foreign key column on the task table
    pub fn parent_key(self) -> &'static str {
        match self {
            ChecklistKind::Exit => "inspection_id",
            ChecklistKind::Cleaning => "cleaning_inspection_id",
        }
    }

    pub fn default_tasks(self) -> &'static [&'static str] {
        match self {
            ChecklistKind::Exit => shared::DEFAULT_EXIT_TASKS,
            ChecklistKind::Cleaning => shared::DEFAULT_CLEANING_TASKS,
        }
    }

    /// Stable id of a checklist created by the sync job
    pub fn derived_id(self, key: &str) -> String {
        match self {
            ChecklistKind::Exit => format!("INSP-{}", key),
            ChecklistKind::Cleaning => format!("CLEAN-{}", key),
        }
    }

    /// Default task rows for a freshly derived checklist
    pub fn default_task_rows(self, parent_id: &str) -> Vec<Value> {
        self.default_tasks()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                json!({
                    "id": format!("{}-{}", parent_id, index + 1),
                    self.parent_key(): parent_id,
                    "name": name,
                    "completed": false,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistTask {
    pub id: String,
    pub name: String,
    pub completed: bool,
}

impl ChecklistTask {
    /// Read a task row; `completed` may be stored as text by older clients
    pub fn from_row(row: &Value) -> Self {
        ChecklistTask {
            id: row.get("id").map(text).unwrap_or_default(),
            name: row.get("name").map(text).unwrap_or_default(),
            completed: row.get("completed").map(coerce_bool).unwrap_or(false),
        }
    }
}

/// Incoming checklist upsert, accepting both key spellings
#[derive(Debug, Clone)]
pub struct ChecklistInput {
    pub id: String,
    pub order_id: Option<String>,
    pub unit_number: String,
    pub guest_name: String,
    pub departure_date: String,
    pub status: Option<String>,
    pub tasks: Vec<ChecklistTask>,
}

impl ChecklistInput {
    pub fn from_payload(payload: &Value) -> Self {
        let tasks = payload
            .get("tasks")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let mut task = ChecklistTask::from_row(item);
                        if task.id.is_empty() {
                            task.id = uuid::Uuid::new_v4().to_string();
                        }
                        task
                    })
                    .collect()
            })
            .unwrap_or_default();

        ChecklistInput {
            id: pick(payload, &["id"])
                .map(text)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            order_id: pick(payload, &["orderId", "order_id"]).map(text),
            unit_number: pick_str(payload, &["unitNumber", "unit_number"], ""),
            guest_name: pick_str(payload, &["guestName", "guest_name"], ""),
            departure_date: pick_str(payload, &["departureDate", "departure_date"], ""),
            status: pick(payload, &["status"]).map(text),
            tasks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSaveResult {
    pub id: String,
    pub order_id: Option<String>,
    pub unit_number: String,
    pub guest_name: String,
    pub departure_date: String,
    pub status: String,
    pub tasks: Vec<ChecklistTask>,
    pub saved_tasks_count: usize,
    pub total_tasks_count: usize,
    pub completed_tasks_count: usize,
    pub failed_tasks_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub kind: &'static str,
    pub created: usize,
    pub refreshed: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Where a checklist stands relative to its departure date.
///
/// A checklist with at least one task, all of them done, is complete
/// regardless of the date. Missing or unparsable dates count as not yet due.
pub fn compute_inspection_status(
    departure_date: &str,
    tasks: &[ChecklistTask],
    today: NaiveDate,
) -> InspectionStatus {
    if !tasks.is_empty() && tasks.iter().all(|t| t.completed) {
        return InspectionStatus::Completed;
    }
    match IsoDate::parse_loose(departure_date) {
        Ok(date) if date.date() == today => InspectionStatus::DueToday,
        Ok(date) if date.date() < today => InspectionStatus::Overdue,
        _ => InspectionStatus::NotYetDue,
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_revenue: f64,
    pub total_paid: f64,
    pub total_expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFigures {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub monthly_data: Vec<MonthlyFigures>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_net: f64,
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// Fields the vision model is asked to extract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    pub total_price: Option<f64>,
    pub product_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedInvoice {
    pub total_price: Option<f64>,
    pub product_description: Option<String>,
    pub saved: bool,
    pub id: Option<String>,
    pub image_data: String,
}

fn first_truthy(row: &Value, keys: &[&str]) -> Value {
    pick(row, keys).cloned().unwrap_or(Value::Null)
}

/// Client view of an invoice row.
///
/// Rows written by the extraction flow carry `extracted_data`; older rows use
/// `file_url`/`amount`/`issued_at`. Each shape prefers its own columns.
pub fn invoice_view(row: &Value) -> Value {
    let modern = row.get("extracted_data").map(truthy).unwrap_or(false);
    let id = row.get("id").map(text).unwrap_or_default();
    let currency = row
        .get("currency")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::from(shared::DEFAULT_CURRENCY));

    let (image_keys, price_keys, date_keys): (&[&str], &[&str], &[&str]) = if modern {
        (&["image_data", "file_url"], &["total_price", "amount"], &["date", "issued_at"])
    } else {
        (&["file_url", "image_data"], &["amount", "total_price"], &["issued_at", "date"])
    };

    json!({
        "id": id,
        "image_data": pick(row, image_keys).cloned().unwrap_or_else(|| Value::from("")),
        "total_price": first_truthy(row, price_keys),
        "currency": currency,
        "vendor": row.get("vendor").cloned().unwrap_or(Value::Null),
        "date": first_truthy(row, date_keys),
        "invoice_number": row.get("invoice_number").cloned().unwrap_or(Value::Null),
        "extracted_data": if modern { row["extracted_data"].clone() } else { Value::Null },
        "created_at": first_truthy(row, &["created_at", "issued_at"]),
        "updated_at": first_truthy(row, &["updated_at", "issued_at"]),
    })
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSession {
    pub clock_in: Value,
    pub clock_out: Value,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStatus {
    pub is_clocked_in: bool,
    pub session: Option<AttendanceSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(done: bool) -> ChecklistTask {
        ChecklistTask {
            id: "1".into(),
            name: "ניקיון חדרים".into(),
            completed: done,
        }
    }

    #[test]
    fn test_status_follows_departure_date() {
        let today = day("2025-06-10");
        let open = vec![task(false)];
        assert_eq!(
            compute_inspection_status("2025-06-11", &open, today),
            InspectionStatus::NotYetDue
        );
        assert_eq!(
            compute_inspection_status("2025-06-10T09:00:00", &open, today),
            InspectionStatus::DueToday
        );
        assert_eq!(
            compute_inspection_status("2025-06-01", &open, today),
            InspectionStatus::Overdue
        );
        assert_eq!(
            compute_inspection_status("", &open, today),
            InspectionStatus::NotYetDue
        );
    }

    #[test]
    fn test_status_completed_needs_tasks() {
        let today = day("2025-06-10");
        assert_eq!(
            compute_inspection_status("2025-06-01", &[task(true), task(true)], today),
            InspectionStatus::Completed
        );
        assert_eq!(
            compute_inspection_status("2025-06-01", &[], today),
            InspectionStatus::Overdue
        );
    }

    #[test]
    fn test_checklist_input_accepts_both_spellings() {
        let input = ChecklistInput::from_payload(&json!({
            "order_id": "o-9",
            "unitNumber": "וילה 3",
            "departure_date": "2025-07-01",
            "tasks": [{"name": "סבון", "completed": "yes"}, {"id": "t2", "name": "כיור"}]
        }));
        assert_eq!(input.order_id.as_deref(), Some("o-9"));
        assert_eq!(input.unit_number, "וילה 3");
        assert!(!input.id.is_empty());
        assert!(input.status.is_none());
        assert!(input.tasks[0].completed);
        assert!(!input.tasks[0].id.is_empty());
        assert_eq!(input.tasks[1].id, "t2");
        assert!(!input.tasks[1].completed);
    }

    #[test]
    fn test_default_task_rows_are_namespaced() {
        let rows = ChecklistKind::Cleaning.default_task_rows("CLEAN-2025-07-01");
        assert_eq!(rows.len(), 31);
        assert_eq!(rows[0]["id"], "CLEAN-2025-07-01-1");
        assert_eq!(rows[0]["cleaning_inspection_id"], "CLEAN-2025-07-01");
        assert_eq!(rows[30]["completed"], false);
    }

    #[test]
    fn test_order_from_client_defaults() {
        let order = OrderCreate::from_client(&json!({"guestName": "Lior", "guestsCount": "4"}));
        assert_eq!(order.guest_name, "Lior");
        assert_eq!(order.status, shared::ORDER_STATUS_NEW);
        assert_eq!(order.guests_count, 4);
        assert_eq!(order.payment_method.as_deref(), Some(shared::PAYMENT_METHOD_UNDECIDED));
        assert_eq!(order.special_requests.as_deref(), Some(""));
        assert_eq!(order.total_amount, 0.0);
    }

    #[test]
    fn test_invoice_view_modern_and_legacy() {
        let modern = invoice_view(&json!({
            "id": 7,
            "image_data": "data:image/png;base64,AAA",
            "total_price": 120.5,
            "extracted_data": {"total_price": 120.5},
            "created_at": "2025-01-01T00:00:00Z"
        }));
        assert_eq!(modern["id"], "7");
        assert_eq!(modern["total_price"], 120.5);
        assert_eq!(modern["currency"], "ILS");
        assert_eq!(modern["updated_at"], Value::Null);

        let legacy = invoice_view(&json!({
            "id": "inv-1",
            "file_url": "https://files/x.jpg",
            "amount": 99,
            "issued_at": "2024-12-30"
        }));
        assert_eq!(legacy["image_data"], "https://files/x.jpg");
        assert_eq!(legacy["total_price"], 99);
        assert_eq!(legacy["date"], "2024-12-30");
        assert_eq!(legacy["created_at"], "2024-12-30");
        assert_eq!(legacy["extracted_data"], Value::Null);
    }
}
