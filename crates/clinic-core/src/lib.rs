use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod clinic;
mod store;

pub use clinic::{AppointmentOutcome, Clinic, ClosedAppointment};
pub use store::{RecordId, RecordStore};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum ClinicError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("patient {0} not found")]
    PatientNotFound(PatientId),
    #[error("doctor {0} not found")]
    DoctorNotFound(DoctorId),
    #[error("appointment {0} not found")]
    AppointmentNotFound(AppointmentId),
    #[error("no available doctors at the moment")]
    NoAvailableDoctors,
    #[error("doctor {doctor_id} holds active appointment {appointment_id}")]
    DoctorBusy { doctor_id: DoctorId, appointment_id: AppointmentId },
}

impl ClinicError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PatientNotFound(_) | Self::DoctorNotFound(_) | Self::AppointmentNotFound(_)
        )
    }
}

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl RecordId for $name {
            fn from_sequence(value: u64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(PatientId);
record_id!(DoctorId);
record_id!(AppointmentId);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub weight: f64,
    pub height: f64,
    pub phone: String,
}

impl PatientDetails {
    /// Validate patient fields before they reach the record store.
    ///
    /// # Errors
    /// Returns [`ClinicError::Validation`] when a required field is blank or a measurement is not
    /// a positive finite number.
    pub fn validate(&self) -> Result<(), ClinicError> {
        require_text("name", &self.name)?;
        require_text("sex", &self.sex)?;
        require_text("phone", &self.phone)?;

        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(ClinicError::Validation("weight MUST be a positive number".to_string()));
        }

        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ClinicError::Validation("height MUST be a positive number".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: PatientId,
    #[serde(flatten)]
    pub details: PatientDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorDetails {
    pub name: String,
    pub specialization: String,
    pub phone: String,
}

impl DoctorDetails {
    /// Validate doctor fields before they reach the record store.
    ///
    /// # Errors
    /// Returns [`ClinicError::Validation`] when a required field is blank.
    pub fn validate(&self) -> Result<(), ClinicError> {
        require_text("name", &self.name)?;
        require_text("specialization", &self.specialization)?;
        require_text("phone", &self.phone)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doctor {
    pub id: DoctorId,
    #[serde(flatten)]
    pub details: DoctorDetails,
    pub is_available: bool,
}

/// An active appointment. Completed and canceled appointments are removed rather than archived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

fn require_text(field: &str, value: &str) -> Result<(), ClinicError> {
    if value.trim().is_empty() {
        return Err(ClinicError::Validation(format!("{field} MUST be provided")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn patient_details(name: &str) -> PatientDetails {
        PatientDetails {
            name: name.to_string(),
            age: 42,
            sex: "female".to_string(),
            weight: 61.5,
            height: 168.0,
            phone: "555-0100".to_string(),
        }
    }

    // Test IDs: TVAL-001
    #[test]
    fn patient_validation_rejects_blank_name() {
        let mut details = patient_details("Ada");
        details.name = "  ".to_string();

        assert_eq!(
            details.validate(),
            Err(ClinicError::Validation("name MUST be provided".to_string()))
        );
    }

    // Test IDs: TVAL-002
    #[test]
    fn patient_validation_rejects_non_positive_measurements() {
        let mut details = patient_details("Ada");
        details.weight = 0.0;
        let err = details.validate().err().map(|err| err.to_string()).unwrap_or_default();
        assert!(err.contains("weight"), "unexpected validation result: `{err}`");

        let mut details = patient_details("Ada");
        details.height = f64::NAN;
        let err = details.validate().err().map(|err| err.to_string()).unwrap_or_default();
        assert!(err.contains("height"), "unexpected validation result: `{err}`");
    }

    // Test IDs: TVAL-003
    #[test]
    fn doctor_validation_requires_specialization() {
        let details = DoctorDetails {
            name: "Dr. Grey".to_string(),
            specialization: String::new(),
            phone: "555-0199".to_string(),
        };

        assert_eq!(
            details.validate(),
            Err(ClinicError::Validation("specialization MUST be provided".to_string()))
        );
    }

    // Test IDs: TSER-001
    #[test]
    fn records_serialize_with_flat_fields_and_numeric_ids() {
        let patient = Patient { id: PatientId(7), details: patient_details("Ada") };
        let value = match serde_json::to_value(&patient) {
            Ok(value) => value,
            Err(err) => panic!("patient should serialize: {err}"),
        };

        assert_eq!(value.get("id").and_then(serde_json::Value::as_u64), Some(7));
        assert_eq!(value.get("name").and_then(serde_json::Value::as_str), Some("Ada"));
        assert!(value.get("details").is_none());
    }

    // Test IDs: TSER-002
    #[test]
    fn appointment_date_serializes_as_rfc3339() {
        let appointment = Appointment {
            id: AppointmentId(1),
            patient_id: PatientId(2),
            doctor_id: DoctorId(3),
            date: OffsetDateTime::UNIX_EPOCH,
        };
        let value = match serde_json::to_value(&appointment) {
            Ok(value) => value,
            Err(err) => panic!("appointment should serialize: {err}"),
        };

        assert_eq!(
            value.get("date").and_then(serde_json::Value::as_str),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(value.get("doctor_id").and_then(serde_json::Value::as_u64), Some(3));
    }
}
