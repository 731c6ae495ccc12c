use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::error::LeaveError;
use crate::leave::LeaveEngine;
use crate::model::leave_request::{LeaveQuery, LeaveRequest};

// matches the reason column width
const MAX_REASON_LEN: usize = 255;

fn validate_reason(reason: &str) -> Option<&'static str> {
    if reason.trim().is_empty() {
        Some("reason must not be empty")
    } else if reason.chars().count() > MAX_REASON_LEN {
        Some("reason must be at most 255 characters")
    } else {
        None
    }
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave admitted and balance debited", body = crate::model::leave_request::LeaveRecord),
        (status = 400, description = "Rejected by an admission rule", body = Object,
         example = json!({
            "error": "annual_cap_exceeded",
            "message": "annual leave cap of 12 days exceeded for 2026: already taken 10, requested 3",
            "details": { "year": 2026, "prior_total": 10, "requested": 3, "cap": 12 }
         })
        ),
        (status = 500, description = "Storage failure, nothing was applied")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    engine: web::Data<LeaveEngine>,
    payload: web::Json<LeaveRequest>,
) -> Result<HttpResponse, LeaveError> {
    if let Some(message) = validate_reason(&payload.reason) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "invalid_request",
            "message": message
        })));
    }

    let record = engine.admit(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(record))
}

/// for getting a leave record details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to fetch")
    ),
    responses(
        (status = 200, description = "Leave record found", body = crate::model::leave_request::LeaveRecord),
        (status = 404, description = "Leave record not found", body = Object, example = json!({
            "error": "not_found",
            "message": "leave record 1 not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let record = engine.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// for listing leave records endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Leave records ordered by start date", body = [crate::model::leave_request::LeaveRecord]),
        (status = 400, description = "Invalid filter")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    engine: web::Data<LeaveEngine>,
    query: web::Query<LeaveQuery>,
) -> Result<HttpResponse, LeaveError> {
    let leaves = engine.list(&query).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Remove leave (soft delete)
========================= */
/// The employee's balance is not credited back.
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to remove")
    ),
    responses(
        (status = 204, description = "Leave record removed"),
        (status = 404, description = "Leave record not found or already removed")
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    engine.remove(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
