use actix_web::{HttpResponse, http::StatusCode, web};
use serde_json::json;

use crate::error::LeaveError;
use crate::leave::LeaveEngine;
use crate::model::employee::{NewEmployee, UpdateEmployee};

fn blank_field_response(fields: &[(&'static str, Option<&String>)]) -> Option<HttpResponse> {
    let (field, _) = fields
        .iter()
        .find(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))?;

    Some(HttpResponse::BadRequest().json(json!({
        "error": "invalid_request",
        "message": format!("{} must not be empty", field)
    })))
}

// the id is part of the URL here, so an unknown employee is a 404
fn unknown_employee_in_path(err: LeaveError) -> Result<HttpResponse, LeaveError> {
    match err {
        LeaveError::EmployeeNotFound { .. } => Ok(err.response_with(StatusCode::NOT_FOUND)),
        other => Err(other),
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = crate::model::employee::Employee),
        (status = 400, description = "Missing required fields or employee code already taken", body = Object, example = json!({
            "error": "duplicate_employee",
            "message": "employee code EMP-001 is already registered",
            "details": { "employee_code": "EMP-001" }
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "error": "persistence",
            "message": "Internal Server Error"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    engine: web::Data<LeaveEngine>,
    payload: web::Json<NewEmployee>,
) -> Result<HttpResponse, LeaveError> {
    let blank = blank_field_response(&[
        ("employee_code", Some(&payload.employee_code)),
        ("first_name", Some(&payload.first_name)),
        ("email", Some(&payload.email)),
    ]);
    if let Some(response) = blank {
        return Ok(response);
    }

    let employee = engine.register_employee(&payload).await?;
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    responses(
        (status = 200, description = "All employees", body = [crate::model::employee::Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(engine: web::Data<LeaveEngine>) -> Result<HttpResponse, LeaveError> {
    let employees = engine.employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employee/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = crate::model::employee::Employee),
        (status = 404, description = "Unknown employee", body = Object, example = json!({
            "error": "employee_not_found",
            "message": "employee 7 not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    match engine.employee(path.into_inner()).await {
        Ok(employee) => Ok(HttpResponse::Ok().json(employee)),
        Err(err) => unknown_employee_in_path(err),
    }
}

/// Update directory fields. The leave balance cannot be changed here.
#[utoipa::path(
    put,
    path = "/api/employee/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = crate::model::employee::Employee),
        (status = 400, description = "Blank field or employee code already taken"),
        (status = 404, description = "Unknown employee")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, LeaveError> {
    let blank = blank_field_response(&[
        ("employee_code", payload.employee_code.as_ref()),
        ("first_name", payload.first_name.as_ref()),
        ("email", payload.email.as_ref()),
    ]);
    if let Some(response) = blank {
        return Ok(response);
    }

    match engine.update_employee(path.into_inner(), &payload).await {
        Ok(employee) => Ok(HttpResponse::Ok().json(employee)),
        Err(err) => unknown_employee_in_path(err),
    }
}
