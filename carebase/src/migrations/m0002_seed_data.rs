use postgres::Transaction;
use tracing::info;

use crate::error::Result;
use crate::migrate::Migration;

/// Migration 2: development accounts and demo patients.
///
/// Both staff accounts use the password "password".
pub struct SeedData;

impl Migration for SeedData {
    fn number(&self) -> u32 {
        2
    }

    fn name(&self) -> String {
        "Seed initial data".to_string()
    }

    fn forwards(&self, tx: &mut Transaction<'_>) -> Result<()> {
        tx.batch_execute(
            r#"
            -- Super admin for hospital A
            INSERT INTO staff (id, username, password_hash, hospital) VALUES
            (uuid_generate_v4(), 'admin', '$2a$12$VsfCQivbKsbMdc8i9jMTTO2ekdf7FBjIH9r8X1SH4UG6GFZVNsnsK', 'hn-001');

            -- Staff for hospital B
            INSERT INTO staff (id, username, password_hash, hospital) VALUES
            (uuid_generate_v4(), 'staff_b', '$2a$12$VsfCQivbKsbMdc8i9jMTTO2ekdf7FBjIH9r8X1SH4UG6GFZVNsnsK', 'hn-002');

            -- Patients for hospital A
            INSERT INTO patients (id, patient_hn, first_name_th, last_name_th, first_name_en, last_name_en, date_of_birth, gender, national_id, passport_id) VALUES
            (uuid_generate_v4(), 'hn-001', 'จอห์น', 'โด', 'John', 'Doe', '1980-01-01', 'M', '9855629944793', 'AB123456'),
            (uuid_generate_v4(), 'hn-001', 'เจน', 'สมิธ', 'Jane', 'Smith', '1990-05-15', 'F', '9220297763701', 'CD654321');

            -- Patients for hospital B
            INSERT INTO patients (id, patient_hn, first_name_th, last_name_th, first_name_en, last_name_en, date_of_birth, gender, national_id, passport_id) VALUES
            (uuid_generate_v4(), 'hn-002', 'อลิซ', 'จอห์นสัน', 'Alice', 'Johnson', '1985-03-20', 'F', '3753395384991', 'EF567890'),
            (uuid_generate_v4(), 'hn-002', 'บ็อบ', 'บราวน์', 'Bob', 'Brown', '1975-11-10', 'M', '5258439754182', 'GH123456');
            "#,
        )?;

        info!("seed data inserted");
        Ok(())
    }
}
