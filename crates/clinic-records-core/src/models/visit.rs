//! Clinical visit (consultation) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded consultation. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Identifier of the patient seen
    pub patient_id: i64,
    /// When the consultation was saved
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub examination_findings: String,
    #[serde(default)]
    pub investigations: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub principal_diagnosis: String,
    #[serde(default)]
    pub additional_diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub clinical_remarks: String,
}

impl Visit {
    /// Create a visit for a patient, stamped with the current time.
    pub fn new(patient_id: i64) -> Self {
        Self::at(patient_id, Utc::now())
    }

    /// Create a visit for a patient at a given time.
    pub fn at(patient_id: i64, visit_date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            patient_id,
            visit_date,
            history: String::new(),
            examination_findings: String::new(),
            investigations: String::new(),
            diagnosis: String::new(),
            principal_diagnosis: String::new(),
            additional_diagnosis: String::new(),
            treatment: String::new(),
            clinical_remarks: String::new(),
        }
    }
}

/// Sort visits newest first.
pub fn sort_newest_first(visits: &mut [Visit]) {
    visits.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sort_newest_first() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let mut visits = vec![Visit::at(7, t1), Visit::at(7, t2)];

        sort_newest_first(&mut visits);

        assert_eq!(visits[0].visit_date, t2);
        assert_eq!(visits[1].visit_date, t1);
    }

    #[test]
    fn test_visit_json_shape() {
        let visit = Visit::at(7, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let json = serde_json::to_value(&visit).unwrap();
        assert_eq!(json["patientId"], 7);
        assert_eq!(json["visitDate"], "2024-03-01T09:00:00Z");
    }
}
