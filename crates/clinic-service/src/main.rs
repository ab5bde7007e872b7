use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use clap::Parser;
use clinic_api::{ClinicApi, DoctorRequest, PatientRequest, API_CONTRACT_VERSION};
use clinic_core::{Appointment, AppointmentId, ClinicError, Doctor, DoctorId, Patient, PatientId};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";
const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");

#[derive(Debug, Clone)]
struct ServiceState {
    api: ClinicApi,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    #[serde(skip)]
    status: StatusCode,
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct PatientCreated {
    message: &'static str,
    patient_id: PatientId,
}

#[derive(Debug, Clone, Serialize)]
struct DoctorCreated {
    message: &'static str,
    doctor_id: DoctorId,
}

#[derive(Debug, Clone, Serialize)]
struct AppointmentCreated {
    message: &'static str,
    appointment_id: AppointmentId,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service_contract_version: &'static str,
    api_contract_version: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct AvailabilityQuery {
    is_available: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct AppointmentQuery {
    patient_id: PatientId,
}

#[derive(Debug, Parser)]
#[command(name = "clinic-service")]
#[command(about = "In-memory HTTP service for clinic appointment booking")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
    /// Tracing filter directives; falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_filter: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ClinicError> for ServiceError {
    fn from(err: ClinicError) -> Self {
        let status = match &err {
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            ClinicError::DoctorBusy { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        ServiceError {
            status,
            service_contract_version: SERVICE_CONTRACT_VERSION,
            error: err.to_string(),
        }
    }
}

fn message(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse { message })
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/openapi", get(openapi))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/:patient_id", get(get_patient).put(update_patient).delete(delete_patient))
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/:doctor_id", get(get_doctor).put(update_doctor).delete(delete_doctor))
        .route("/doctors/:doctor_id/availability", put(set_doctor_availability))
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/:appointment_id", get(get_appointment).delete(cancel_appointment))
        .route("/appointments/:appointment_id/complete", put(complete_appointment))
        .with_state(state)
}

fn init_tracing(directives: Option<&str>) {
    let filter = match directives {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref());

    let state = ServiceState { api: ClinicApi::new() };
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "clinic service listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn root() -> Json<MessageResponse> {
    message("Welcome to the medical appointment API!")
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
    })
}

async fn openapi() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/yaml; charset=utf-8")], OPENAPI_YAML)
}

async fn list_patients(State(state): State<ServiceState>) -> Json<Vec<Patient>> {
    Json(state.api.list_patients())
}

async fn get_patient(
    State(state): State<ServiceState>,
    Path(patient_id): Path<PatientId>,
) -> Json<Option<Patient>> {
    Json(state.api.get_patient(patient_id))
}

async fn create_patient(
    State(state): State<ServiceState>,
    Json(request): Json<PatientRequest>,
) -> Result<Json<PatientCreated>, ServiceError> {
    let patient_id = state.api.create_patient(request)?;
    Ok(Json(PatientCreated { message: "Patient created successfully", patient_id }))
}

async fn update_patient(
    State(state): State<ServiceState>,
    Path(patient_id): Path<PatientId>,
    Json(request): Json<PatientRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.update_patient(patient_id, request)?;
    Ok(message("Patient updated successfully"))
}

async fn delete_patient(
    State(state): State<ServiceState>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.delete_patient(patient_id)?;
    Ok(message("Patient deleted successfully"))
}

async fn list_doctors(State(state): State<ServiceState>) -> Json<Vec<Doctor>> {
    Json(state.api.list_doctors())
}

async fn get_doctor(
    State(state): State<ServiceState>,
    Path(doctor_id): Path<DoctorId>,
) -> Json<Option<Doctor>> {
    Json(state.api.get_doctor(doctor_id))
}

async fn create_doctor(
    State(state): State<ServiceState>,
    Json(request): Json<DoctorRequest>,
) -> Result<Json<DoctorCreated>, ServiceError> {
    let doctor_id = state.api.create_doctor(request)?;
    Ok(Json(DoctorCreated { message: "Doctor created successfully", doctor_id }))
}

async fn update_doctor(
    State(state): State<ServiceState>,
    Path(doctor_id): Path<DoctorId>,
    Json(request): Json<DoctorRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.update_doctor(doctor_id, request)?;
    Ok(message("Doctor updated successfully"))
}

async fn delete_doctor(
    State(state): State<ServiceState>,
    Path(doctor_id): Path<DoctorId>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.delete_doctor(doctor_id)?;
    Ok(message("Doctor deleted successfully"))
}

async fn set_doctor_availability(
    State(state): State<ServiceState>,
    Path(doctor_id): Path<DoctorId>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.set_doctor_availability(doctor_id, query.is_available)?;
    Ok(message("Doctor availability status updated successfully"))
}

async fn list_appointments(State(state): State<ServiceState>) -> Json<Vec<Appointment>> {
    Json(state.api.list_appointments())
}

async fn get_appointment(
    State(state): State<ServiceState>,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ServiceError> {
    Ok(Json(state.api.get_appointment(appointment_id)?))
}

async fn create_appointment(
    State(state): State<ServiceState>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<AppointmentCreated>, ServiceError> {
    let appointment = state.api.create_appointment(query.patient_id)?;
    Ok(Json(AppointmentCreated {
        message: "Appointment created successfully",
        appointment_id: appointment.id,
    }))
}

async fn complete_appointment(
    State(state): State<ServiceState>,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.complete_appointment(appointment_id)?;
    Ok(message("Appointment completed successfully"))
}

async fn cancel_appointment(
    State(state): State<ServiceState>,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.api.cancel_appointment(appointment_id)?;
    Ok(message("Appointment canceled successfully"))
}
