use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, instrument};

use crate::attendance::scheduler::DailyRollupScheduler;
use crate::attendance::service::AttendanceService;
use crate::error::{RollupError, StoreError};
use crate::models::{
    AttendanceRangeReq, DepartmentAttendanceReq, DepartmentAttendanceResponse, RollupReq,
};
use crate::utils::pagination::PageQuery;

fn store_failure(e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(what) => HttpResponse::NotFound().json(json!({
            "message": format!("{what} not found")
        })),
        StoreError::Database(e) => {
            error!(error = %e, "Attendance query failed");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}

/// Live attendance of one department
#[utoipa::path(
    post,
    path = "/api/attendance/department",
    request_body = DepartmentAttendanceReq,
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "First-in/last-out per employee, read from the terminals", body = DepartmentAttendanceResponse),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Attendance"
)]
#[instrument(skip_all, fields(department_id = payload.department_id))]
pub async fn department_attendance(
    service: web::Data<AttendanceService>,
    payload: web::Json<DepartmentAttendanceReq>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let result = match service
        .fetch_attendance(payload.department_id, payload.date)
        .await
    {
        Ok(result) => result,
        Err(e) => return store_failure(e),
    };

    let page = query.slice(result.records);

    HttpResponse::Ok().json(DepartmentAttendanceResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        total_pages: page.total_pages,
        disconnected_devices: result.disconnected_devices,
    })
}

/// Ledger rows of matching employees between two dates
#[utoipa::path(
    post,
    path = "/api/attendance/range",
    request_body = AttendanceRangeReq,
    responses(
        (status = 200, description = "Persisted rows ordered by date, then last name", body = [crate::model::ledger::LedgerRecord]),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip_all)]
pub async fn attendance_range(
    service: web::Data<AttendanceService>,
    payload: web::Json<AttendanceRangeReq>,
) -> impl Responder {
    match service
        .fetch_attendance_range(&payload.employee_name, payload.start_time, payload.end_time)
        .await
    {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => store_failure(e),
    }
}

/// Re-run the ledger rollup for one date
#[utoipa::path(
    post,
    path = "/api/attendance/rollup",
    request_body = RollupReq,
    responses(
        (status = 200, description = "Rollup pass finished", body = crate::attendance::scheduler::RollupSummary),
        (status = 503, description = "Server is shutting down"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip_all, fields(date = %payload.date))]
pub async fn rollup(
    scheduler: web::Data<Arc<DailyRollupScheduler>>,
    payload: web::Json<RollupReq>,
) -> impl Responder {
    match scheduler.run_once(payload.date).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(RollupError::Cancelled) => HttpResponse::ServiceUnavailable().json(json!({
            "message": "Rollup cancelled by shutdown"
        })),
        Err(RollupError::Store(e)) => store_failure(e),
    }
}

/// Whether one terminal answers on its port
#[utoipa::path(
    get,
    path = "/api/devices/{id}/status",
    params(
        ("id", Path, description = "Device id")
    ),
    responses(
        (status = 200, description = "Connectivity of the device", body = crate::attendance::service::DeviceStatus),
        (status = 404, description = "Unknown device", body = Object, example = json!({
            "message": "device 9 not found"
        }))
    ),
    tag = "Device"
)]
pub async fn device_status(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> impl Responder {
    match service.device_status(path.into_inner()).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => store_failure(e),
    }
}
