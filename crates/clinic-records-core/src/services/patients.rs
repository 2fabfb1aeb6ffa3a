//! Patient registration and lookup.

use crate::db::{Database, DbResult};
use crate::models::Patient;

/// Typed access to the patient collection.
pub struct PatientService<'a> {
    db: &'a Database,
}

impl<'a> PatientService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new patient. Returns the stored record.
    pub fn register_patient(&self, patient: &Patient) -> DbResult<Patient> {
        let id = self.db.add(patient)?;
        Ok(Patient {
            id: Some(id),
            ..patient.clone()
        })
    }

    /// Save updated details (inserts if the id is unknown).
    pub fn update_patient(&self, patient: &Patient) -> DbResult<Patient> {
        let id = self.db.put(patient)?;
        Ok(Patient {
            id: Some(id),
            ..patient.clone()
        })
    }

    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.db.get_by_id(&id)
    }

    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        self.db.get_all()
    }

    /// Patients whose name or registration number contains `term`.
    pub fn search_patients(&self, term: &str) -> DbResult<Vec<Patient>> {
        let term = term.trim();
        let patients = self.list_patients()?;
        if term.is_empty() {
            return Ok(patients);
        }
        Ok(patients.into_iter().filter(|p| p.matches(term)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let db = setup_db();
        let service = PatientService::new(&db);

        let mut patient = Patient::new("REG-001".into(), "Jane Doe".into());
        patient.sex = "Female".into();
        patient.insurance_type = "NHIS".into();
        patient.nhis_number = "NH-123".into();

        let stored = service.register_patient(&patient).unwrap();
        let id = stored.id.unwrap();

        let retrieved = service.get_patient(id).unwrap().unwrap();
        assert_eq!(retrieved, stored);
        assert_eq!(Patient { id: None, ..retrieved }, patient);
    }

    #[test]
    fn test_update_patient_in_place() {
        let db = setup_db();
        let service = PatientService::new(&db);

        let mut stored = service
            .register_patient(&Patient::new("REG-001".into(), "Jane Doe".into()))
            .unwrap();
        stored.telephone = "0244000000".into();
        stored.remarks = "Moved to new address".into();
        service.update_patient(&stored).unwrap();

        let patients = service.list_patients().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].telephone, "0244000000");
        assert_eq!(patients[0].remarks, "Moved to new address");
    }

    #[test]
    fn test_duplicate_registration_number() {
        let db = setup_db();
        let service = PatientService::new(&db);

        service
            .register_patient(&Patient::new("REG-001".into(), "Jane Doe".into()))
            .unwrap();
        let result = service.register_patient(&Patient::new("REG-001".into(), "John Roe".into()));

        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();
        let service = PatientService::new(&db);

        for (reg, name) in [("REG-001", "Jane Doe"), ("REG-002", "John Doe"), ("OPD-003", "Ama Mensah")] {
            service
                .register_patient(&Patient::new(reg.into(), name.into()))
                .unwrap();
        }

        assert_eq!(service.search_patients("doe").unwrap().len(), 2);
        assert_eq!(service.search_patients("opd").unwrap().len(), 1);
        assert_eq!(service.search_patients("  ").unwrap().len(), 3);
        assert!(service.search_patients("kofi").unwrap().is_empty());
    }
}
