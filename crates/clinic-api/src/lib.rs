use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clinic_core::{
    Appointment, AppointmentId, Clinic, ClinicError, ClosedAppointment, Doctor, DoctorDetails,
    DoctorId, Patient, PatientDetails, PatientId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const API_CONTRACT_VERSION: &str = "api.v1";

pub type PatientRequest = PatientDetails;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorRequest {
    pub name: String,
    pub specialization: String,
    pub phone: String,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl DoctorRequest {
    fn into_parts(self) -> (DoctorDetails, Option<bool>) {
        let Self { name, specialization, phone, is_available } = self;
        (DoctorDetails { name, specialization, phone }, is_available)
    }
}

/// Shared handle to the clinic state.
///
/// Clones share one [`Clinic`] behind a single mutex, and every operation holds the lock for its
/// whole read-select-mutate sequence.
#[derive(Debug, Clone, Default)]
pub struct ClinicApi {
    state: Arc<Mutex<Clinic>>,
}

impl ClinicApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clinic(clinic: Clinic) -> Self {
        Self { state: Arc::new(Mutex::new(clinic)) }
    }

    fn lock(&self) -> MutexGuard<'_, Clinic> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn list_patients(&self) -> Vec<Patient> {
        self.lock().patients().cloned().collect()
    }

    #[must_use]
    pub fn get_patient(&self, id: PatientId) -> Option<Patient> {
        self.lock().patient(id).cloned()
    }

    /// Register a patient.
    ///
    /// # Errors
    /// Returns an error when the request fails validation.
    pub fn create_patient(&self, input: PatientRequest) -> Result<PatientId, ClinicError> {
        let id = self.lock().add_patient(input)?;
        info!(patient_id = %id, "patient created");
        Ok(id)
    }

    /// Replace a patient's details.
    ///
    /// # Errors
    /// Returns an error when the request fails validation or the patient does not exist.
    pub fn update_patient(&self, id: PatientId, input: PatientRequest) -> Result<(), ClinicError> {
        self.lock().update_patient(id, input)?;
        info!(patient_id = %id, "patient updated");
        Ok(())
    }

    /// Delete a patient.
    ///
    /// # Errors
    /// Returns an error when the patient does not exist.
    pub fn delete_patient(&self, id: PatientId) -> Result<Patient, ClinicError> {
        let patient = self.lock().remove_patient(id)?;
        info!(patient_id = %id, "patient deleted");
        Ok(patient)
    }

    #[must_use]
    pub fn list_doctors(&self) -> Vec<Doctor> {
        self.lock().doctors().cloned().collect()
    }

    #[must_use]
    pub fn get_doctor(&self, id: DoctorId) -> Option<Doctor> {
        self.lock().doctor(id).cloned()
    }

    /// Register a doctor; `is_available` defaults to true.
    ///
    /// # Errors
    /// Returns an error when the request fails validation.
    pub fn create_doctor(&self, input: DoctorRequest) -> Result<DoctorId, ClinicError> {
        let (details, is_available) = input.into_parts();
        let id = self.lock().add_doctor(details, is_available.unwrap_or(true))?;
        info!(doctor_id = %id, "doctor created");
        Ok(id)
    }

    /// Replace a doctor's details, keeping the availability flag unless the request sets one.
    ///
    /// # Errors
    /// Returns an error when the request fails validation, the doctor does not exist, or the
    /// request marks a busy doctor available.
    pub fn update_doctor(&self, id: DoctorId, input: DoctorRequest) -> Result<(), ClinicError> {
        let (details, is_available) = input.into_parts();
        self.lock().update_doctor(id, details, is_available)?;
        info!(doctor_id = %id, "doctor updated");
        Ok(())
    }

    /// Delete a doctor.
    ///
    /// # Errors
    /// Returns an error when the doctor does not exist.
    pub fn delete_doctor(&self, id: DoctorId) -> Result<Doctor, ClinicError> {
        let mut clinic = self.lock();
        if let Some(appointment) = clinic.active_appointment_for(id) {
            warn!(
                doctor_id = %id,
                appointment_id = %appointment.id,
                "deleting doctor with an active appointment"
            );
        }
        let doctor = clinic.remove_doctor(id)?;
        info!(doctor_id = %id, "doctor deleted");
        Ok(doctor)
    }

    /// Set a doctor's availability flag.
    ///
    /// # Errors
    /// Returns an error when the doctor does not exist or holds an active appointment and the
    /// request marks them available.
    pub fn set_doctor_availability(
        &self,
        id: DoctorId,
        is_available: bool,
    ) -> Result<(), ClinicError> {
        self.lock().set_available(id, is_available)?;
        info!(doctor_id = %id, is_available, "doctor availability updated");
        Ok(())
    }

    #[must_use]
    pub fn list_appointments(&self) -> Vec<Appointment> {
        self.lock().appointments().cloned().collect()
    }

    /// Look up one active appointment.
    ///
    /// # Errors
    /// Returns an error when no active appointment has this id.
    pub fn get_appointment(&self, id: AppointmentId) -> Result<Appointment, ClinicError> {
        self.lock().appointment(id).cloned().ok_or(ClinicError::AppointmentNotFound(id))
    }

    /// Book the patient with the first available doctor.
    ///
    /// # Errors
    /// Returns an error when the patient does not exist or no doctor is available.
    pub fn create_appointment(&self, patient_id: PatientId) -> Result<Appointment, ClinicError> {
        match self.lock().create_appointment(patient_id) {
            Ok(appointment) => {
                info!(
                    appointment_id = %appointment.id,
                    patient_id = %appointment.patient_id,
                    doctor_id = %appointment.doctor_id,
                    "appointment created"
                );
                Ok(appointment)
            }
            Err(err) => {
                warn!(patient_id = %patient_id, error = %err, "appointment request rejected");
                Err(err)
            }
        }
    }

    /// Complete an active appointment, releasing its doctor.
    ///
    /// # Errors
    /// Returns an error when the appointment or its doctor no longer exists.
    pub fn complete_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<ClosedAppointment, ClinicError> {
        let result = self.lock().complete_appointment(id);
        log_closed(id, result)
    }

    /// Cancel an active appointment, releasing its doctor.
    ///
    /// # Errors
    /// Returns an error when the appointment or its doctor no longer exists.
    pub fn cancel_appointment(&self, id: AppointmentId) -> Result<ClosedAppointment, ClinicError> {
        let result = self.lock().cancel_appointment(id);
        log_closed(id, result)
    }
}

fn log_closed(
    id: AppointmentId,
    result: Result<ClosedAppointment, ClinicError>,
) -> Result<ClosedAppointment, ClinicError> {
    match &result {
        Ok(closed) => info!(
            appointment_id = %id,
            doctor_id = %closed.appointment.doctor_id,
            outcome = closed.outcome.as_str(),
            "appointment closed"
        ),
        Err(err) => warn!(appointment_id = %id, error = %err, "appointment close rejected"),
    }
    result
}
