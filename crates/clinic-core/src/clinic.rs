use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Appointment, AppointmentId, ClinicError, Doctor, DoctorDetails, DoctorId, Patient,
    PatientDetails, PatientId, RecordStore,
};

/// How an active appointment left the active set. Both outcomes release the doctor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentOutcome {
    Completed,
    Canceled,
}

impl AppointmentOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClosedAppointment {
    pub appointment: Appointment,
    pub outcome: AppointmentOutcome,
}

/// Patients, doctors and the active appointment set.
///
/// A doctor's `is_available` flag is false while an active appointment references that doctor.
/// Every method either applies all of its mutations or returns an error having applied none.
#[derive(Debug, Clone, Default)]
pub struct Clinic {
    patients: RecordStore<PatientId, Patient>,
    doctors: RecordStore<DoctorId, Doctor>,
    appointments: RecordStore<AppointmentId, Appointment>,
}

impl Clinic {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    #[must_use]
    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    /// Register a patient under a freshly minted id.
    ///
    /// # Errors
    /// Returns [`ClinicError::Validation`] when the details are invalid.
    pub fn add_patient(&mut self, details: PatientDetails) -> Result<PatientId, ClinicError> {
        details.validate()?;
        Ok(self.patients.insert_with(|id| Patient { id, details }))
    }

    /// Replace a patient's details, keeping the id.
    ///
    /// # Errors
    /// Returns an error when the details are invalid or the patient does not exist.
    pub fn update_patient(
        &mut self,
        id: PatientId,
        details: PatientDetails,
    ) -> Result<(), ClinicError> {
        details.validate()?;
        let patient = self.patients.get_mut(id).ok_or(ClinicError::PatientNotFound(id))?;
        patient.details = details;
        Ok(())
    }

    /// Delete a patient. Appointments referencing the patient are left untouched.
    ///
    /// # Errors
    /// Returns [`ClinicError::PatientNotFound`] when the patient does not exist.
    pub fn remove_patient(&mut self, id: PatientId) -> Result<Patient, ClinicError> {
        self.patients.remove(id).ok_or(ClinicError::PatientNotFound(id))
    }

    pub fn doctors(&self) -> impl Iterator<Item = &Doctor> {
        self.doctors.values()
    }

    #[must_use]
    pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.get(id)
    }

    /// Register a doctor. A doctor added with `is_available = false` is off duty.
    ///
    /// # Errors
    /// Returns [`ClinicError::Validation`] when the details are invalid.
    pub fn add_doctor(
        &mut self,
        details: DoctorDetails,
        is_available: bool,
    ) -> Result<DoctorId, ClinicError> {
        details.validate()?;
        Ok(self.doctors.insert_with(|id| Doctor { id, details, is_available }))
    }

    /// Replace a doctor's details. `is_available = None` keeps the current flag.
    ///
    /// # Errors
    /// Returns an error when the details are invalid, the doctor does not exist, or the update
    /// would mark available a doctor who still holds an active appointment.
    pub fn update_doctor(
        &mut self,
        id: DoctorId,
        details: DoctorDetails,
        is_available: Option<bool>,
    ) -> Result<(), ClinicError> {
        details.validate()?;
        if let Some(is_available) = is_available {
            self.check_availability_change(id, is_available)?;
        }

        let doctor = self.doctors.get_mut(id).ok_or(ClinicError::DoctorNotFound(id))?;
        doctor.details = details;
        if let Some(is_available) = is_available {
            doctor.is_available = is_available;
        }
        Ok(())
    }

    /// Delete a doctor.
    ///
    /// An active appointment held by the doctor stays in place; completing or canceling it
    /// afterwards fails with [`ClinicError::DoctorNotFound`].
    ///
    /// # Errors
    /// Returns [`ClinicError::DoctorNotFound`] when the doctor does not exist.
    pub fn remove_doctor(&mut self, id: DoctorId) -> Result<Doctor, ClinicError> {
        self.doctors.remove(id).ok_or(ClinicError::DoctorNotFound(id))
    }

    /// Set a doctor's availability flag from outside the appointment lifecycle.
    ///
    /// Idempotent. Marking a free doctor unavailable takes them off duty; marking a doctor
    /// available while they hold an active appointment is refused.
    ///
    /// # Errors
    /// Returns [`ClinicError::DoctorNotFound`] or [`ClinicError::DoctorBusy`].
    pub fn set_available(&mut self, id: DoctorId, is_available: bool) -> Result<(), ClinicError> {
        self.check_availability_change(id, is_available)?;
        self.write_availability(id, is_available)
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    #[must_use]
    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    #[must_use]
    pub fn active_appointment_for(&self, doctor_id: DoctorId) -> Option<&Appointment> {
        self.appointments.values().find(|appointment| appointment.doctor_id == doctor_id)
    }

    /// Book the patient with the first available doctor, in doctor insertion order.
    ///
    /// # Errors
    /// Returns [`ClinicError::PatientNotFound`] for an unknown patient and
    /// [`ClinicError::NoAvailableDoctors`] when every doctor is unavailable.
    pub fn create_appointment(
        &mut self,
        patient_id: PatientId,
    ) -> Result<Appointment, ClinicError> {
        self.create_appointment_at(patient_id, OffsetDateTime::now_utc())
    }

    /// Same as [`Clinic::create_appointment`] with an explicit creation timestamp.
    ///
    /// # Errors
    /// See [`Clinic::create_appointment`].
    pub fn create_appointment_at(
        &mut self,
        patient_id: PatientId,
        date: OffsetDateTime,
    ) -> Result<Appointment, ClinicError> {
        if !self.patients.contains(patient_id) {
            return Err(ClinicError::PatientNotFound(patient_id));
        }

        let doctor_id = self
            .doctors
            .values()
            .find(|doctor| doctor.is_available)
            .map(|doctor| doctor.id)
            .ok_or(ClinicError::NoAvailableDoctors)?;

        self.write_availability(doctor_id, false)?;
        let id =
            self.appointments.insert_with(|id| Appointment { id, patient_id, doctor_id, date });
        self.appointments.get(id).cloned().ok_or(ClinicError::AppointmentNotFound(id))
    }

    /// Finish an appointment normally, releasing its doctor.
    ///
    /// # Errors
    /// See [`Clinic::close_appointment`].
    pub fn complete_appointment(
        &mut self,
        id: AppointmentId,
    ) -> Result<ClosedAppointment, ClinicError> {
        self.close_appointment(id, AppointmentOutcome::Completed)
    }

    /// Call off an appointment, releasing its doctor.
    ///
    /// # Errors
    /// See [`Clinic::close_appointment`].
    pub fn cancel_appointment(
        &mut self,
        id: AppointmentId,
    ) -> Result<ClosedAppointment, ClinicError> {
        self.close_appointment(id, AppointmentOutcome::Canceled)
    }

    /// Remove an active appointment and mark its doctor available again.
    ///
    /// The outcome is handed back to the caller but not recorded; both outcomes have the same
    /// effect on state.
    ///
    /// # Errors
    /// Returns [`ClinicError::AppointmentNotFound`] when the appointment is not active, and
    /// [`ClinicError::DoctorNotFound`] when its doctor was deleted in the meantime. In both cases
    /// nothing is modified.
    pub fn close_appointment(
        &mut self,
        id: AppointmentId,
        outcome: AppointmentOutcome,
    ) -> Result<ClosedAppointment, ClinicError> {
        let doctor_id = self
            .appointments
            .get(id)
            .map(|appointment| appointment.doctor_id)
            .ok_or(ClinicError::AppointmentNotFound(id))?;

        self.write_availability(doctor_id, true)?;
        let appointment =
            self.appointments.remove(id).ok_or(ClinicError::AppointmentNotFound(id))?;
        Ok(ClosedAppointment { appointment, outcome })
    }

    fn check_availability_change(
        &self,
        id: DoctorId,
        is_available: bool,
    ) -> Result<(), ClinicError> {
        if !self.doctors.contains(id) {
            return Err(ClinicError::DoctorNotFound(id));
        }
        if is_available {
            if let Some(appointment) = self.active_appointment_for(id) {
                let appointment_id = appointment.id;
                return Err(ClinicError::DoctorBusy { doctor_id: id, appointment_id });
            }
        }
        Ok(())
    }

    fn write_availability(&mut self, id: DoctorId, is_available: bool) -> Result<(), ClinicError> {
        let doctor = self.doctors.get_mut(id).ok_or(ClinicError::DoctorNotFound(id))?;
        doctor.is_available = is_available;
        Ok(())
    }
}
