//! Data access for staff and patient records.
//!
//! The store owns a single synchronous connection behind a mutex; queries
//! are short and handlers only hold the lock for the duration of one call.

use std::sync::{Mutex, MutexGuard};

use postgres::types::ToSql;
use postgres::Client;
use tracing::debug;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::{Patient, PatientSearchQuery, Staff, PATIENT_COLUMNS};

pub struct Store {
    client: Mutex<Client>,
}

impl Store {
    /// Connect to the configured database.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = crate::db::connect(config)?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }

    fn client(&self) -> Result<MutexGuard<'_, Client>> {
        self.client
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".into()))
    }

    /// Insert a staff member and return the generated id.
    pub fn create_staff(
        &self,
        username: &str,
        password_hash: &str,
        hospital: &str,
    ) -> Result<Uuid> {
        let mut client = self.client()?;
        let row = client.query_one(
            "INSERT INTO staff (username, password_hash, hospital) \
             VALUES ($1, $2, $3) RETURNING id",
            &[&username, &password_hash, &hospital],
        )?;
        Ok(row.get(0))
    }

    /// Look up a staff member by username within one hospital.
    pub fn find_staff(&self, username: &str, hospital: &str) -> Result<Option<Staff>> {
        let mut client = self.client()?;
        let row = client.query_opt(
            "SELECT id, username, password_hash, hospital \
             FROM staff WHERE username = $1 AND hospital = $2",
            &[&username, &hospital],
        )?;
        Ok(row.map(|row| Staff {
            id: row.get(0),
            username: row.get(1),
            password_hash: row.get(2),
            hospital: row.get(3),
        }))
    }

    /// Search patients visible to `hospital`, narrowed by the present
    /// filters. Every query is scoped by the hospital prefix before any
    /// caller-supplied predicate is applied.
    pub fn search_patients(
        &self,
        hospital: &str,
        filter: &PatientSearchQuery,
    ) -> Result<Vec<Patient>> {
        let hospital_prefix = format!("{hospital}%");
        let first_name_pattern = filter.first_name.as_ref().map(|v| format!("%{v}%"));
        let middle_name_pattern = filter.middle_name.as_ref().map(|v| format!("%{v}%"));
        let last_name_pattern = filter.last_name.as_ref().map(|v| format!("%{v}%"));

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        conditions.push(format!("patient_hn LIKE ${}", params.len() + 1));
        params.push(&hospital_prefix);

        if let Some(patient_hn) = &filter.patient_hn {
            conditions.push(format!("patient_hn = ${}", params.len() + 1));
            params.push(patient_hn);
        }
        if let Some(national_id) = &filter.national_id {
            conditions.push(format!("national_id = ${}", params.len() + 1));
            params.push(national_id);
        }
        if let Some(passport_id) = &filter.passport_id {
            conditions.push(format!("passport_id = ${}", params.len() + 1));
            params.push(passport_id);
        }
        if let Some(pattern) = &first_name_pattern {
            let i = params.len() + 1;
            conditions.push(format!(
                "(LOWER(first_name_en) LIKE LOWER(${i}) OR LOWER(first_name_th) LIKE LOWER(${i}))"
            ));
            params.push(pattern);
        }
        if let Some(pattern) = &middle_name_pattern {
            let i = params.len() + 1;
            conditions.push(format!(
                "(LOWER(middle_name_en) LIKE LOWER(${i}) OR LOWER(middle_name_th) LIKE LOWER(${i}))"
            ));
            params.push(pattern);
        }
        if let Some(pattern) = &last_name_pattern {
            let i = params.len() + 1;
            conditions.push(format!(
                "(LOWER(last_name_en) LIKE LOWER(${i}) OR LOWER(last_name_th) LIKE LOWER(${i}))"
            ));
            params.push(pattern);
        }
        if let Some(date_of_birth) = &filter.date_of_birth {
            conditions.push(format!("date_of_birth = ${}", params.len() + 1));
            params.push(date_of_birth);
        }

        let query = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE {}",
            conditions.join(" AND ")
        );
        debug!(hospital, conditions = conditions.len(), "searching patients");

        let mut client = self.client()?;
        let rows = client.query(&query, &params)?;
        Ok(rows.iter().map(Patient::from_row).collect())
    }

    /// Fetch a patient by national id or passport id. Hospital enforcement
    /// is the caller's responsibility.
    pub fn patient_by_identifier(&self, identifier: &str) -> Result<Option<Patient>> {
        let mut client = self.client()?;
        let row = client.query_opt(
            &format!(
                "SELECT {PATIENT_COLUMNS} FROM patients \
                 WHERE national_id = $1 OR passport_id = $1"
            ),
            &[&identifier],
        )?;
        Ok(row.as_ref().map(Patient::from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::{migrate, MigrateOptions};
    use crate::migrations;
    use crate::test_postgres::fresh_database;

    fn seeded_store() -> Store {
        let config = fresh_database();
        migrate(migrations::registry(), &config, &MigrateOptions::default()).unwrap();
        Store::connect(&config).unwrap()
    }

    #[test]
    fn find_staff_is_scoped_by_hospital() {
        let store = seeded_store();

        let staff = store.find_staff("admin", "hn-001").unwrap().unwrap();
        assert_eq!(staff.username, "admin");
        assert_eq!(staff.hospital, "hn-001");

        assert!(store.find_staff("admin", "hn-002").unwrap().is_none());
        assert!(store.find_staff("nobody", "hn-001").unwrap().is_none());
    }

    #[test]
    fn created_staff_can_be_found() {
        let store = seeded_store();

        let id = store
            .create_staff("nurse_a", "$2a$12$not-a-real-hash", "hn-001")
            .unwrap();

        let staff = store.find_staff("nurse_a", "hn-001").unwrap().unwrap();
        assert_eq!(staff.id, id);
    }

    #[test]
    fn search_without_filters_returns_the_whole_hospital() {
        let store = seeded_store();

        let patients = store
            .search_patients("hn-001", &PatientSearchQuery::default())
            .unwrap();
        assert_eq!(patients.len(), 2);
        assert!(patients.iter().all(|p| p.patient_hn == "hn-001"));
    }

    #[test]
    fn search_by_name_is_case_insensitive_and_partial() {
        let store = seeded_store();

        let patients = store
            .search_patients(
                "hn-001",
                &PatientSearchQuery {
                    first_name: Some("john".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].first_name_en.as_deref(), Some("John"));
    }

    #[test]
    fn search_never_crosses_hospitals() {
        let store = seeded_store();

        // Alice belongs to hn-002; searching her id under hn-001 finds
        // nothing.
        let patients = store
            .search_patients(
                "hn-001",
                &PatientSearchQuery {
                    national_id: Some("3753395384991".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(patients.is_empty());

        let patients = store
            .search_patients(
                "hn-002",
                &PatientSearchQuery {
                    national_id: Some("3753395384991".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].first_name_en.as_deref(), Some("Alice"));
    }

    #[test]
    fn patient_lookup_matches_either_identifier() {
        let store = seeded_store();

        let by_national = store
            .patient_by_identifier("9855629944793")
            .unwrap()
            .unwrap();
        assert_eq!(by_national.first_name_en.as_deref(), Some("John"));

        let by_passport = store.patient_by_identifier("AB123456").unwrap().unwrap();
        assert_eq!(by_passport.id, by_national.id);

        assert!(store.patient_by_identifier("unknown").unwrap().is_none());
    }
}
