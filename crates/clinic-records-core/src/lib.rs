//! Clinic Records Core Library
//!
//! Offline patient records for a single clinic: registration, consultations,
//! local user accounts and settings, kept in one SQLite file.
//!
//! # Architecture
//!
//! ```text
//! Front end / CLI
//!        │
//!        ▼
//! ClinicRecordsCore ── session + role gating
//!        │
//!        ├──────────────► Authentication Gate (auth)
//!        │                        │
//!        ▼                        ▼
//! Record Services ──────► Storage Engine (db)
//!                                 │
//!                                 ▼
//!                     patients · visits · users · settings
//! ```
//!
//! # Core Principle
//!
//! **One storage handle, passed explicitly.** Services and the gate borrow the
//! [`Database`]; nothing reaches for global state.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage engine with snapshot export/import
//! - [`models`]: Domain types (Patient, Visit, User, Setting) and form fields
//! - [`auth`]: Password hashing, login checks, sessions
//! - [`services`]: Per-entity record services
//! - [`config`]: Store configuration

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use auth::{Authenticator, Session};
pub use config::StoreConfig;
pub use db::{Database, ImportSummary, Snapshot};
pub use models::{Action, Patient, PatientField, Role, Setting, User, Visit, VisitField};
pub use services::{PatientService, SettingService, UserService, VisitService};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::info;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicRecordsError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Protected record: {0}")]
    ProtectedRecord(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ClinicRecordsError {
    fn from(e: db::DbError) -> Self {
        use db::DbError;
        match e {
            DbError::StorageUnavailable(msg) => ClinicRecordsError::StorageUnavailable(msg),
            DbError::Constraint(msg) => ClinicRecordsError::ConstraintViolation(msg),
            DbError::ProtectedRecord(msg) => ClinicRecordsError::ProtectedRecord(msg),
            DbError::ImportFailed(msg) => ClinicRecordsError::ImportFailed(msg),
            DbError::Json(e) => ClinicRecordsError::SerializationError(e.to_string()),
            DbError::Sqlite(e) => ClinicRecordsError::DatabaseError(e.to_string()),
        }
    }
}

impl From<auth::AuthError> for ClinicRecordsError {
    fn from(e: auth::AuthError) -> Self {
        match e {
            auth::AuthError::Database(e) => e.into(),
            other => ClinicRecordsError::DatabaseError(other.to_string()),
        }
    }
}

impl From<models::FieldError> for ClinicRecordsError {
    fn from(e: models::FieldError) -> Self {
        ClinicRecordsError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for ClinicRecordsError {
    fn from(e: config::ConfigError) -> Self {
        ClinicRecordsError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicRecordsError {
    fn from(e: serde_json::Error) -> Self {
        ClinicRecordsError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// Creates the default administrator on first run.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let config = StoreConfig::new(path);
    let db = Database::open(config.database_path())?;
    Ok(Arc::new(ClinicRecordsCore::with_database(db, config)?))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicRecordsCore::with_database(
        db,
        StoreConfig::default(),
    )?))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Holds the current login session and checks the session's role before
/// every gated call.
#[derive(uniffi::Object)]
pub struct ClinicRecordsCore {
    db: Arc<Mutex<Database>>,
    config: StoreConfig,
    session: Mutex<Option<Session>>,
}

impl ClinicRecordsCore {
    /// Wrap an opened database, creating the default administrator if none
    /// exists.
    pub fn with_database(db: Database, config: StoreConfig) -> Result<Self, ClinicRecordsError> {
        if let Some(admin) = Authenticator::new(&db, &config).ensure_admin_exists()? {
            info!(username = %admin.username, "database initialised");
        }
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
            session: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current session, failing when no one is logged in.
    fn require_session(&self) -> Result<Session, ClinicRecordsError> {
        self.session
            .lock()?
            .clone()
            .ok_or(ClinicRecordsError::NotAuthenticated)
    }

    /// Current session, failing when its role may not perform `action`.
    fn require(&self, action: Action) -> Result<Session, ClinicRecordsError> {
        let session = self.require_session()?;
        if !session.permits(action) {
            return Err(ClinicRecordsError::PermissionDenied(format!(
                "{} may not {:?}",
                session.role, action
            )));
        }
        Ok(session)
    }
}

#[uniffi::export]
impl ClinicRecordsCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Log in. Returns `None` (and keeps any current session) on bad
    /// credentials.
    pub fn login(
        &self,
        username: String,
        password: String,
    ) -> Result<Option<FfiSession>, ClinicRecordsError> {
        let user = {
            let db = self.db.lock()?;
            Authenticator::new(&db, &self.config).authenticate(&username, &password)?
        };
        let Some(session) = user.as_ref().and_then(Session::for_user) else {
            return Ok(None);
        };

        info!(username = %session.username, role = %session.role, "logged in");
        *self.session.lock()? = Some(session.clone());
        Ok(Some(session.into()))
    }

    pub fn logout(&self) -> Result<(), ClinicRecordsError> {
        if let Some(session) = self.session.lock()?.take() {
            info!(username = %session.username, "logged out");
        }
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<FfiSession>, ClinicRecordsError> {
        Ok(self.session.lock()?.clone().map(|s| s.into()))
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn register_patient(&self, patient: FfiPatient) -> Result<FfiPatient, ClinicRecordsError> {
        self.require(Action::RegisterPatient)?;
        let mut patient = Patient::try_from(patient)?;
        validate_patient(&patient)?;
        patient.id = None;
        let today = Utc::now().date_naive();
        patient.registration_date.get_or_insert(today);
        patient.fill_age(today);

        let db = self.db.lock()?;
        let stored = PatientService::new(&db).register_patient(&patient)?;
        Ok(stored.into())
    }

    /// Save changes to an existing patient.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<FfiPatient, ClinicRecordsError> {
        self.require(Action::UpdatePatient)?;
        let patient = Patient::try_from(patient)?;
        validate_patient(&patient)?;
        if patient.id.is_none() {
            return Err(ClinicRecordsError::InvalidInput(
                "patient has no id".to_string(),
            ));
        }

        let db = self.db.lock()?;
        let stored = PatientService::new(&db).update_patient(&patient)?;
        Ok(stored.into())
    }

    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let patient = PatientService::new(&db).get_patient(id)?;
        Ok(patient.map(|p| p.into()))
    }

    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let patients = PatientService::new(&db).list_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name or registration number.
    pub fn search_patients(&self, term: String) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let patients = PatientService::new(&db).search_patients(&term)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Patient list as a JSON array.
    pub fn export_patients_json(&self) -> Result<String, ClinicRecordsError> {
        self.require(Action::ExportPatients)?;
        let db = self.db.lock()?;
        let patients = PatientService::new(&db).list_patients()?;
        Ok(serde_json::to_string_pretty(&patients)?)
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    /// Record a consultation. A missing visit date means now.
    pub fn record_visit(&self, visit: FfiVisit) -> Result<FfiVisit, ClinicRecordsError> {
        self.require(Action::RecordConsultation)?;
        let mut visit = Visit::try_from(visit)?;
        visit.id = None;

        let db = self.db.lock()?;
        let stored = VisitService::new(&db).record_visit(&visit)?;
        Ok(stored.into())
    }

    /// Visits for a patient, newest first.
    pub fn visits_for_patient(&self, patient_id: i64) -> Result<Vec<FfiVisit>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let visits = VisitService::new(&db).visits_for_patient(patient_id)?;
        Ok(visits.into_iter().map(|v| v.into()).collect())
    }

    pub fn latest_visit(&self, patient_id: i64) -> Result<Option<FfiVisit>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let visit = VisitService::new(&db).latest_visit(patient_id)?;
        Ok(visit.map(|v| v.into()))
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Create a user account. `role` is a role name such as "clinician".
    pub fn create_user(
        &self,
        username: String,
        password: String,
        role: String,
    ) -> Result<FfiUser, ClinicRecordsError> {
        self.require(Action::ManageUsers)?;
        let role = Role::parse(&role)
            .ok_or_else(|| ClinicRecordsError::InvalidInput(format!("unknown role: {}", role)))?;
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClinicRecordsError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let db = self.db.lock()?;
        let user = UserService::new(&db, &self.config).create_user(username, &password, role)?;
        Ok(user.into())
    }

    pub fn list_users(&self) -> Result<Vec<FfiUser>, ClinicRecordsError> {
        self.require(Action::ManageUsers)?;
        let db = self.db.lock()?;
        let users = UserService::new(&db, &self.config).list_users()?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    /// Delete a user account. Deleting yourself logs you out.
    pub fn delete_user(&self, id: i64) -> Result<bool, ClinicRecordsError> {
        let session = self.require(Action::ManageUsers)?;
        let deleted = {
            let db = self.db.lock()?;
            UserService::new(&db, &self.config).delete_user(id)?
        };
        if deleted && session.user_id == id {
            self.session.lock()?.take();
        }
        Ok(deleted)
    }

    // =========================================================================
    // Setting Operations
    // =========================================================================

    /// Setting value as JSON text.
    pub fn get_setting(&self, key: String) -> Result<Option<String>, ClinicRecordsError> {
        self.require_session()?;
        let db = self.db.lock()?;
        let value = SettingService::new(&db).get_setting(&key)?;
        Ok(value.map(|v| v.to_string()))
    }

    /// Save a setting. `value_json` must be valid JSON.
    ///
    /// The facility name must be a JSON string and is stored trimmed.
    pub fn save_setting(&self, key: String, value_json: String) -> Result<(), ClinicRecordsError> {
        self.require(Action::ManageSettings)?;
        let value: serde_json::Value = serde_json::from_str(&value_json)?;
        let db = self.db.lock()?;
        let settings = SettingService::new(&db);
        if key == models::FACILITY_NAME_KEY {
            let name = value.as_str().ok_or_else(|| {
                ClinicRecordsError::InvalidInput("facility name must be text".to_string())
            })?;
            settings.save_facility_name(name)?;
        } else {
            settings.save_setting(&key, value)?;
        }
        Ok(())
    }

    /// Facility name for the header; shown before login, so not gated.
    pub fn facility_name(&self) -> Result<String, ClinicRecordsError> {
        let db = self.db.lock()?;
        let name = SettingService::new(&db).facility_name()?;
        Ok(name.unwrap_or_else(|| models::DEFAULT_FACILITY_NAME.to_string()))
    }

    pub fn set_facility_name(&self, name: String) -> Result<(), ClinicRecordsError> {
        self.require(Action::ManageSettings)?;
        let db = self.db.lock()?;
        SettingService::new(&db).save_facility_name(&name)?;
        Ok(())
    }

    // =========================================================================
    // Backup Operations
    // =========================================================================

    /// Export every collection as JSON.
    pub fn export_json(&self) -> Result<String, ClinicRecordsError> {
        self.require(Action::BackupData)?;
        let db = self.db.lock()?;
        Ok(db.export_json()?)
    }

    /// Replace collections from a JSON backup.
    ///
    /// If the logged-in account is not in the imported users, the session
    /// ends.
    ///
    /// Plaintext passwords in backups written by the browser front end are
    /// hashed on the way in.
    pub fn import_json(&self, json: String) -> Result<FfiImportSummary, ClinicRecordsError> {
        let session = self.require(Action::BackupData)?;
        let rounds = self.config.password_hash_rounds();
        let snapshot =
            Snapshot::from_json_hashing_passwords(&json, |p| auth::hash_password(p, rounds))?;
        let (summary, still_present) = {
            let mut db = self.db.lock()?;
            let summary = db.import_all(&snapshot)?;
            let user = UserService::new(&db, &self.config).get_user(session.user_id)?;
            let still_present = user.is_some_and(|u| u.username == session.username);
            (summary, still_present)
        };

        if !still_present {
            info!(username = %session.username, "account replaced by import; logged out");
            self.session.lock()?.take();
        }
        Ok(summary.into())
    }
}

fn validate_patient(patient: &Patient) -> Result<(), ClinicRecordsError> {
    if patient.registration_number.trim().is_empty() {
        return Err(ClinicRecordsError::InvalidInput(
            "registration number is required".to_string(),
        ));
    }
    if patient.full_name.trim().is_empty() {
        return Err(ClinicRecordsError::InvalidInput(
            "full name is required".to_string(),
        ));
    }
    Ok(())
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe session.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSession {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            username: session.username,
            role: session.role.as_str().to_string(),
        }
    }
}

/// FFI-safe patient. Dates are `YYYY-MM-DD`, empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct FfiPatient {
    pub id: Option<i64>,
    pub registration_number: String,
    pub registration_date: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub age: Option<u32>,
    pub sex: String,
    pub marital_status: String,
    pub occupation: String,
    pub religion: String,
    pub home_address: String,
    pub telephone: String,
    pub kin_name: String,
    pub kin_relation: String,
    pub kin_relation_other: String,
    pub kin_contact: String,
    pub insurance_type: String,
    pub nhis_number: String,
    pub ccc_code: String,
    pub private_provider: String,
    pub insurance_number: String,
    pub remarks: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            registration_date: PatientField::RegistrationDate.get(&patient),
            date_of_birth: PatientField::DateOfBirth.get(&patient),
            age: patient.age,
            registration_number: patient.registration_number,
            full_name: patient.full_name,
            sex: patient.sex,
            marital_status: patient.marital_status,
            occupation: patient.occupation,
            religion: patient.religion,
            home_address: patient.home_address,
            telephone: patient.telephone,
            kin_name: patient.kin_name,
            kin_relation: patient.kin_relation,
            kin_relation_other: patient.kin_relation_other,
            kin_contact: patient.kin_contact,
            insurance_type: patient.insurance_type,
            nhis_number: patient.nhis_number,
            ccc_code: patient.ccc_code,
            private_provider: patient.private_provider,
            insurance_number: patient.insurance_number,
            remarks: patient.remarks,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = models::FieldError;

    fn try_from(p: FfiPatient) -> Result<Self, Self::Error> {
        let mut patient = Patient {
            id: p.id,
            age: p.age,
            ..Patient::default()
        };
        let values = [
            (PatientField::RegistrationNumber, &p.registration_number),
            (PatientField::RegistrationDate, &p.registration_date),
            (PatientField::FullName, &p.full_name),
            (PatientField::DateOfBirth, &p.date_of_birth),
            (PatientField::Sex, &p.sex),
            (PatientField::MaritalStatus, &p.marital_status),
            (PatientField::Occupation, &p.occupation),
            (PatientField::Religion, &p.religion),
            (PatientField::HomeAddress, &p.home_address),
            (PatientField::Telephone, &p.telephone),
            (PatientField::KinName, &p.kin_name),
            (PatientField::KinRelation, &p.kin_relation),
            (PatientField::KinRelationOther, &p.kin_relation_other),
            (PatientField::KinContact, &p.kin_contact),
            (PatientField::InsuranceType, &p.insurance_type),
            (PatientField::NhisNumber, &p.nhis_number),
            (PatientField::CccCode, &p.ccc_code),
            (PatientField::PrivateProvider, &p.private_provider),
            (PatientField::InsuranceNumber, &p.insurance_number),
            (PatientField::Remarks, &p.remarks),
        ];
        for (field, value) in values {
            field.set(&mut patient, value)?;
        }
        Ok(patient)
    }
}

/// FFI-safe visit. `visit_date` is RFC 3339.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct FfiVisit {
    pub id: Option<i64>,
    pub patient_id: i64,
    pub visit_date: Option<String>,
    pub history: String,
    pub examination_findings: String,
    pub investigations: String,
    pub diagnosis: String,
    pub principal_diagnosis: String,
    pub additional_diagnosis: String,
    pub treatment: String,
    pub clinical_remarks: String,
}

impl From<Visit> for FfiVisit {
    fn from(visit: Visit) -> Self {
        Self {
            id: visit.id,
            patient_id: visit.patient_id,
            visit_date: Some(visit.visit_date.to_rfc3339()),
            history: visit.history,
            examination_findings: visit.examination_findings,
            investigations: visit.investigations,
            diagnosis: visit.diagnosis,
            principal_diagnosis: visit.principal_diagnosis,
            additional_diagnosis: visit.additional_diagnosis,
            treatment: visit.treatment,
            clinical_remarks: visit.clinical_remarks,
        }
    }
}

impl TryFrom<FfiVisit> for Visit {
    type Error = ClinicRecordsError;

    fn try_from(v: FfiVisit) -> Result<Self, Self::Error> {
        let mut visit = match v.visit_date.as_deref().map(str::trim) {
            None | Some("") => Visit::new(v.patient_id),
            Some(date) => {
                let date = DateTime::parse_from_rfc3339(date).map_err(|e| {
                    ClinicRecordsError::InvalidInput(format!("visit date {}: {}", date, e))
                })?;
                Visit::at(v.patient_id, date.with_timezone(&Utc))
            }
        };
        visit.id = v.id;

        let values = [
            (VisitField::History, &v.history),
            (VisitField::ExaminationFindings, &v.examination_findings),
            (VisitField::Investigations, &v.investigations),
            (VisitField::Diagnosis, &v.diagnosis),
            (VisitField::PrincipalDiagnosis, &v.principal_diagnosis),
            (VisitField::AdditionalDiagnosis, &v.additional_diagnosis),
            (VisitField::Treatment, &v.treatment),
            (VisitField::ClinicalRemarks, &v.clinical_remarks),
        ];
        for (field, value) in values {
            field.set(&mut visit, value);
        }
        Ok(visit)
    }
}

/// FFI-safe user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiUser {
    pub id: Option<i64>,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

/// FFI-safe import summary. `None` means the collection was absent and left
/// untouched.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiImportSummary {
    pub patients: Option<u64>,
    pub visits: Option<u64>,
    pub users: Option<u64>,
    pub settings: Option<u64>,
}

impl From<ImportSummary> for FfiImportSummary {
    fn from(summary: ImportSummary) -> Self {
        let count = |n: Option<usize>| n.map(|n| u64::try_from(n).unwrap_or(u64::MAX));
        Self {
            patients: count(summary.patients),
            visits: count(summary.visits),
            users: count(summary.users),
            settings: count(summary.settings),
        }
    }
}
