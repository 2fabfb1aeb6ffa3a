//! Storage bindings for each entity.

use rusqlite::types::Value;

use super::{Collection, IndexColumn, NoIndex, Record};
use crate::models::{Patient, Setting, User, Visit};

/// Secondary indexes on patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientIndex {
    /// Unique
    RegistrationNumber,
}

impl IndexColumn for PatientIndex {
    fn column(self) -> &'static str {
        match self {
            PatientIndex::RegistrationNumber => "registration_number",
        }
    }
}

/// Secondary indexes on visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitIndex {
    PatientId,
}

impl IndexColumn for VisitIndex {
    fn column(self) -> &'static str {
        match self {
            VisitIndex::PatientId => "patient_id",
        }
    }
}

/// Secondary indexes on users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIndex {
    /// Unique
    Username,
    Role,
}

impl IndexColumn for UserIndex {
    fn column(self) -> &'static str {
        match self {
            UserIndex::Username => "username",
            UserIndex::Role => "role",
        }
    }
}

impl Record for Patient {
    type Key = i64;
    type Index = PatientIndex;

    const COLLECTION: Collection = Collection::Patients;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn index_values(&self) -> Vec<(PatientIndex, Value)> {
        vec![(
            PatientIndex::RegistrationNumber,
            Value::Text(self.registration_number.clone()),
        )]
    }
}

impl Record for Visit {
    type Key = i64;
    type Index = VisitIndex;

    const COLLECTION: Collection = Collection::Visits;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn index_values(&self) -> Vec<(VisitIndex, Value)> {
        vec![(VisitIndex::PatientId, Value::Integer(self.patient_id))]
    }
}

impl Record for User {
    type Key = i64;
    type Index = UserIndex;

    const COLLECTION: Collection = Collection::Users;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn index_values(&self) -> Vec<(UserIndex, Value)> {
        vec![
            (UserIndex::Username, Value::Text(self.username.clone())),
            (UserIndex::Role, Value::Text(self.role.as_str().to_string())),
        ]
    }

    fn is_bootstrap_candidate(&self) -> bool {
        self.is_administrator()
    }
}

impl Record for Setting {
    type Key = String;
    type Index = NoIndex;

    const COLLECTION: Collection = Collection::Settings;

    fn key(&self) -> Option<String> {
        Some(self.key.clone())
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn index_values(&self) -> Vec<(NoIndex, Value)> {
        Vec::new()
    }
}
