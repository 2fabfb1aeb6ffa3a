//! Consultation records.

use crate::db::{Database, DbResult, VisitIndex};
use crate::models::{sort_newest_first, Visit};

/// Typed access to the visit collection. Visits are append-only.
pub struct VisitService<'a> {
    db: &'a Database,
}

impl<'a> VisitService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a consultation. Returns the stored record.
    pub fn record_visit(&self, visit: &Visit) -> DbResult<Visit> {
        let id = self.db.add(visit)?;
        Ok(Visit {
            id: Some(id),
            ..visit.clone()
        })
    }

    /// All visits for a patient, newest first.
    pub fn visits_for_patient(&self, patient_id: i64) -> DbResult<Vec<Visit>> {
        let mut visits: Vec<Visit> = self.db.get_all_by_index(VisitIndex::PatientId, patient_id)?;
        sort_newest_first(&mut visits);
        Ok(visits)
    }

    /// Most recent visit, used to pre-fill the next consultation.
    pub fn latest_visit(&self, patient_id: i64) -> DbResult<Option<Visit>> {
        Ok(self.visits_for_patient(patient_id)?.into_iter().next())
    }
}
