//! Bill routes: queue, submission, detail, transitions, payment, history.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{middleware::AuthUser, AppState};
use siren_core::storage::{StorageError, StorageService};
use siren_core::workflow::{self, BillDraft, PaymentDraft};
use siren_db::entities::{attachments, bill_status_logs, bills, payments};
use siren_db::repositories::{
    attachment::CreateAttachmentInput, AttachmentRepository, AuditRepository, BillQuery,
    WorkflowRepository,
};

use super::{db_error_response, workflow_error_response};

/// Creates the bill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/{id}", get(get_bill))
        .route("/bills/{id}/transition", post(transition_bill))
        .route("/bills/{id}/payment", post(record_payment))
        .route("/bills/{id}/history", get(bill_history))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the bill queue.
#[derive(Debug, Deserialize)]
pub struct ListBillsQuery {
    /// Filter by status (wire form, e.g. `PENDING_L1`).
    pub status: Option<String>,
    /// Filter by region.
    pub region_id: Option<Uuid>,
    /// Filter by ambulance.
    pub ambulance_id: Option<Uuid>,
}

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status (wire form).
    pub target: String,
    /// Optional reviewer note.
    pub note: Option<String>,
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Amount paid, as a decimal string.
    pub amount_paid: String,
    /// Payment mode (NEFT, cheque, cash, ...).
    pub payment_mode: String,
    /// Bank/UTR reference number.
    pub reference_no: String,
    /// Date the payment was executed (`YYYY-MM-DD`).
    pub payment_date: NaiveDate,
    /// Optional remarks.
    pub notes: Option<String>,
}

/// Response for a bill.
#[derive(Debug, Serialize)]
pub struct BillResponse {
    /// Bill ID.
    pub id: Uuid,
    /// Ambulance the expense belongs to.
    pub ambulance_id: Uuid,
    /// Region snapshot.
    pub region_id: Uuid,
    /// Submitting user.
    pub created_by: Uuid,
    /// Title.
    pub title: String,
    /// Vendor.
    pub vendor: String,
    /// Claimed amount.
    pub amount: String,
    /// Currency code tagging the amount.
    pub currency: String,
    /// Vendor invoice number.
    pub invoice_number: String,
    /// Date on the vendor invoice (`YYYY-MM-DD`).
    pub invoice_date: String,
    /// Description.
    pub description: Option<String>,
    /// Current status (wire form).
    pub status: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<bills::Model> for BillResponse {
    fn from(m: bills::Model) -> Self {
        Self {
            id: m.id,
            ambulance_id: m.ambulance_id,
            region_id: m.region_id,
            created_by: m.created_by,
            title: m.title,
            vendor: m.vendor,
            amount: m.amount.to_string(),
            currency: m.currency,
            invoice_number: m.invoice_number,
            invoice_date: m.invoice_date.to_string(),
            description: m.description,
            status: workflow::BillStatus::from(&m.status).to_string(),
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: Uuid,
    /// Amount paid.
    pub amount_paid: String,
    /// Payment mode.
    pub payment_mode: String,
    /// Reference number.
    pub reference_no: String,
    /// Date the payment was executed.
    pub payment_date: String,
    /// Remarks.
    pub notes: Option<String>,
    /// Recording user.
    pub paid_by: Uuid,
    /// Recording timestamp.
    pub paid_at: String,
}

impl From<payments::Model> for PaymentResponse {
    fn from(m: payments::Model) -> Self {
        Self {
            id: m.id,
            amount_paid: m.amount_paid.to_string(),
            payment_mode: m.payment_mode,
            reference_no: m.reference_no,
            payment_date: m.payment_date.to_string(),
            notes: m.notes,
            paid_by: m.paid_by,
            paid_at: m.paid_at.to_rfc3339(),
        }
    }
}

/// Response for a status history entry.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    /// Log entry ID.
    pub id: Uuid,
    /// Bill the entry belongs to.
    pub bill_id: Uuid,
    /// Status before the change; absent for the creation entry.
    pub from_status: Option<String>,
    /// Status after the change.
    pub to_status: String,
    /// Acting user.
    pub actor_id: Uuid,
    /// Note.
    pub note: Option<String>,
    /// Timestamp.
    pub created_at: String,
}

impl From<bill_status_logs::Model> for HistoryEntry {
    fn from(m: bill_status_logs::Model) -> Self {
        Self {
            id: m.id,
            bill_id: m.bill_id,
            from_status: m
                .from_status
                .as_ref()
                .map(|s| workflow::BillStatus::from(s).to_string()),
            to_status: workflow::BillStatus::from(&m.to_status).to_string(),
            actor_id: m.actor_id,
            note: m.note,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// Response for an attachment.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: Uuid,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Uploading user.
    pub uploaded_by: Uuid,
    /// Upload timestamp.
    pub created_at: String,
}

impl From<attachments::Model> for AttachmentResponse {
    fn from(m: attachments::Model) -> Self {
        Self {
            id: m.id,
            file_name: m.file_name,
            content_type: m.content_type,
            file_size: m.file_size,
            uploaded_by: m.uploaded_by,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/bills` - Role-scoped bill queue.
async fn list_bills(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListBillsQuery>,
) -> Response {
    let status = match query.status.as_deref() {
        Some(raw) => match workflow::BillStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return validation_response("unknown status filter");
            }
        },
        None => None,
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    let filter = BillQuery {
        status,
        region_id: query.region_id,
        ambulance_id: query.ambulance_id,
    };

    match repo.list_bills_for(&auth.principal(), &filter).await {
        Ok(bills) => {
            let items: Vec<BillResponse> = bills.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "bills": items }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// Collected multipart form for bill submission.
#[derive(Debug, Default)]
struct BillForm {
    ambulance_id: Option<Uuid>,
    title: Option<String>,
    vendor: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    invoice_number: Option<String>,
    invoice_date: Option<NaiveDate>,
    description: Option<String>,
    initial_status: Option<workflow::BillStatus>,
    files: Vec<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_bill_form(mut multipart: Multipart) -> Result<BillForm, Response> {
    let mut form = BillForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_response(&format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "ambulance_id" => {
                let text = read_text(field, &name).await?;
                let id = Uuid::parse_str(&text)
                    .map_err(|_| validation_response("ambulance_id must be a UUID"))?;
                form.ambulance_id = Some(id);
            }
            "title" => form.title = Some(read_text(field, &name).await?),
            "vendor" => form.vendor = Some(read_text(field, &name).await?),
            "amount" => {
                let text = read_text(field, &name).await?;
                let amount = Decimal::from_str(&text)
                    .map_err(|_| validation_response("amount must be a decimal number"))?;
                form.amount = Some(amount);
            }
            "currency" => form.currency = Some(read_text(field, &name).await?),
            "invoice_number" => form.invoice_number = Some(read_text(field, &name).await?),
            "invoice_date" => {
                let text = read_text(field, &name).await?;
                let date = NaiveDate::from_str(&text)
                    .map_err(|_| validation_response("invoice_date must be YYYY-MM-DD"))?;
                form.invoice_date = Some(date);
            }
            "description" => form.description = Some(read_text(field, &name).await?),
            "initial_status" => {
                let text = read_text(field, &name).await?;
                let status = workflow::BillStatus::parse(&text)
                    .ok_or_else(|| validation_response("unknown initial_status"))?;
                form.initial_status = Some(status);
            }
            "attachments" => {
                let file_name = field.file_name().unwrap_or("attachment").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_response(&format!("failed to read attachment: {e}")))?;
                form.files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, Response> {
    field
        .text()
        .await
        .map_err(|e| validation_response(&format!("field {name} is not valid text: {e}")))
}

/// POST `/bills` - Submit a bill (multipart, with optional attachments).
async fn create_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Response {
    let form = match read_bill_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let (
        Some(ambulance_id),
        Some(title),
        Some(vendor),
        Some(amount),
        Some(invoice_number),
        Some(invoice_date),
    ) = (
        form.ambulance_id,
        form.title,
        form.vendor,
        form.amount,
        form.invoice_number,
        form.invoice_date,
    ) else {
        return validation_response(
            "ambulance_id, title, vendor, amount, invoice_number, and invoice_date are required",
        );
    };

    let draft = BillDraft {
        ambulance_id,
        title,
        vendor,
        amount,
        currency: form.currency.unwrap_or_else(|| "INR".to_string()),
        invoice_number,
        invoice_date,
        description: form.description,
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    let bill = match repo
        .create_bill(&auth.principal(), &draft, form.initial_status)
        .await
    {
        Ok(bill) => bill,
        Err(e) => return workflow_error_response(&e),
    };

    info!(bill_id = %bill.id, actor = %auth.user_id(), "bill submitted");

    let attachment_repo = AttachmentRepository::new((*state.db).clone());
    let mut stored = Vec::with_capacity(form.files.len());
    for file in form.files {
        let attachment_id = Uuid::new_v4();
        let key = StorageService::generate_storage_key(bill.id, attachment_id, &file.file_name);

        let meta = match state
            .storage
            .store(&key, &file.content_type, file.bytes)
            .await
        {
            Ok(meta) => meta,
            Err(e) => return storage_error_response(&e),
        };

        let row = attachment_repo
            .create(CreateAttachmentInput {
                id: attachment_id,
                bill_id: bill.id,
                file_name: file.file_name,
                storage_key: meta.storage_key,
                content_type: file.content_type,
                file_size: i64::try_from(meta.file_size).unwrap_or(i64::MAX),
                uploaded_by: auth.user_id(),
            })
            .await;

        match row {
            Ok(row) => stored.push(AttachmentResponse::from(row)),
            Err(e) => return db_error_response(&e),
        }
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "bill": BillResponse::from(bill),
            "attachments": stored
        })),
    )
        .into_response()
}

/// GET `/bills/{id}` - Bill detail with payment, attachments, and history.
async fn get_bill(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let workflow_repo = WorkflowRepository::new((*state.db).clone());
    let detail = match workflow_repo.find_bill(id).await {
        Ok(detail) => detail,
        Err(e) => return workflow_error_response(&e),
    };

    let audit = AuditRepository::new((*state.db).clone());
    let history = match audit.list_for_bill(id).await {
        Ok(logs) => logs,
        Err(e) => return db_error_response(&e),
    };

    let attachment_repo = AttachmentRepository::new((*state.db).clone());
    let files = match attachment_repo.list_for_bill(id).await {
        Ok(files) => files,
        Err(e) => return db_error_response(&e),
    };

    let history: Vec<HistoryEntry> = history.into_iter().map(Into::into).collect();
    let files: Vec<AttachmentResponse> = files.into_iter().map(Into::into).collect();

    (
        StatusCode::OK,
        Json(json!({
            "bill": BillResponse::from(detail.bill),
            "payment": detail.payment.map(PaymentResponse::from),
            "attachments": files,
            "history": history
        })),
    )
        .into_response()
}

/// POST `/bills/{id}/transition` - Apply a guarded status transition.
async fn transition_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Response {
    let Some(target) = workflow::BillStatus::parse(&payload.target) else {
        return validation_response("unknown target status");
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .transition_bill(&auth.principal(), id, target, payload.note)
        .await
    {
        Ok(bill) => {
            info!(bill_id = %id, actor = %auth.user_id(), target = %target, "bill transitioned");
            (StatusCode::OK, Json(json!({ "bill": BillResponse::from(bill) }))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/bills/{id}/payment` - Record a payment and mark the bill PAID.
async fn record_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> Response {
    let Ok(amount_paid) = Decimal::from_str(&payload.amount_paid) else {
        return validation_response("amount_paid must be a decimal number");
    };

    let draft = PaymentDraft {
        amount_paid,
        payment_mode: payload.payment_mode,
        reference_no: payload.reference_no,
        payment_date: payload.payment_date,
        notes: payload.notes,
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo.record_payment(&auth.principal(), id, &draft).await {
        Ok((bill, payment)) => {
            info!(bill_id = %id, actor = %auth.user_id(), "payment recorded");
            (
                StatusCode::OK,
                Json(json!({
                    "bill": BillResponse::from(bill),
                    "payment": PaymentResponse::from(payment)
                })),
            )
                .into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/bills/{id}/history` - Full status history, newest first.
async fn bill_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    // 404 for unknown bills rather than an empty history.
    let workflow_repo = WorkflowRepository::new((*state.db).clone());
    if let Err(e) = workflow_repo.find_bill(id).await {
        return workflow_error_response(&e);
    }

    let audit = AuditRepository::new((*state.db).clone());
    match audit.list_for_bill(id).await {
        Ok(logs) => {
            let history: Vec<HistoryEntry> = logs.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "history": history }))).into_response()
        }
        Err(e) => db_error_response(&e),
    }
}

fn validation_response(message: &str) -> Response {
    warn!(reason = message, "rejected bill request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "VALIDATION_ERROR",
            "message": message
        })),
    )
        .into_response()
}

fn storage_error_response(err: &StorageError) -> Response {
    match err {
        StorageError::FileTooLarge { .. } | StorageError::InvalidMimeType { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": err.to_string()
            })),
        )
            .into_response(),
        _ => {
            error!(error = %err, "attachment storage failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "STORAGE_ERROR",
                    "message": "Failed to store attachment"
                })),
            )
                .into_response()
        }
    }
}
