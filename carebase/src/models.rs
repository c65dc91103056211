//! Domain models and wire types.

use chrono::NaiveDate;
use postgres::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff member of a single hospital.
#[derive(Debug, Clone, Serialize)]
pub struct Staff {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub hospital: String,
}

/// A patient record. `patient_hn` carries the code of the owning hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub patient_hn: String,
    pub first_name_th: Option<String>,
    pub middle_name_th: Option<String>,
    pub last_name_th: Option<String>,
    pub first_name_en: Option<String>,
    pub middle_name_en: Option<String>,
    pub last_name_en: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub national_id: Option<String>,
    pub passport_id: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Columns every patient query must select, in [Patient::from_row] order.
/// The gender enum is read back as text.
pub const PATIENT_COLUMNS: &str = "id, patient_hn, first_name_th, middle_name_th, last_name_th, \
     first_name_en, middle_name_en, last_name_en, date_of_birth, gender::TEXT, \
     national_id, passport_id, phone_number, email";

impl Patient {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            patient_hn: row.get(1),
            first_name_th: row.get(2),
            middle_name_th: row.get(3),
            last_name_th: row.get(4),
            first_name_en: row.get(5),
            middle_name_en: row.get(6),
            last_name_en: row.get(7),
            date_of_birth: row.get(8),
            gender: row.get(9),
            national_id: row.get(10),
            passport_id: row.get(11),
            phone_number: row.get(12),
            email: row.get(13),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub hospital: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub username: String,
    pub password: String,
    pub hospital: String,
}

/// Optional filters for patient search. All present filters are combined
/// with AND on top of the caller's hospital scope.
#[derive(Debug, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub patient_hn: Option<String>,
    pub national_id: Option<String>,
    pub passport_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl PatientSearchQuery {
    /// Treat empty query-string values as absent filters.
    pub fn normalized(mut self) -> Self {
        fn drop_empty(value: &mut Option<String>) {
            if value.as_deref() == Some("") {
                *value = None;
            }
        }
        drop_empty(&mut self.patient_hn);
        drop_empty(&mut self.national_id);
        drop_empty(&mut self.passport_id);
        drop_empty(&mut self.first_name);
        drop_empty(&mut self.middle_name);
        drop_empty(&mut self.last_name);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPatientResponse {
    pub patients: Vec<Patient>,
}
