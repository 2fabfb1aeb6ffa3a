//! Property tests for single-record storage operations.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use clinic_records_core::db::{Database, VisitIndex};
use clinic_records_core::models::{Patient, Visit};

fn date_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of(
        (1900i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
    )
}

fn patient_strategy() -> impl Strategy<Value = Patient> {
    let identity = (
        "[A-Z0-9]{0,6}",
        "[A-Za-z' -]{1,30}",
        date_strategy(),
        date_strategy(),
        prop::option::of(0u32..130),
    );
    let details = (
        prop::sample::select(vec!["", "Male", "Female"]),
        ".{0,16}",
        ".{0,16}",
        "[0-9+ ]{0,14}",
        ".{0,40}",
    );
    let insurance = (
        prop::sample::select(vec!["", "NHIS", "Private", "None"]),
        "[A-Z0-9-]{0,12}",
        ".{0,12}",
        ".{0,60}",
    );
    (identity, details, insurance).prop_map(
        |(
            (reg_suffix, full_name, registration_date, date_of_birth, age),
            (sex, occupation, home_address, telephone, kin_name),
            (insurance_type, nhis_number, private_provider, remarks),
        )| Patient {
            id: None,
            registration_number: reg_suffix,
            registration_date,
            full_name,
            date_of_birth,
            age,
            sex: sex.to_string(),
            occupation,
            home_address,
            telephone,
            kin_name,
            insurance_type: insurance_type.to_string(),
            nhis_number,
            private_provider,
            remarks,
            ..Patient::default()
        },
    )
}

fn visit_strategy() -> impl Strategy<Value = Visit> {
    (
        1i64..20,
        1_500_000_000i64..1_900_000_000,
        ".{0,40}",
        ".{0,40}",
        ".{0,40}",
    )
        .prop_map(|(patient_id, secs, history, diagnosis, treatment)| {
            let mut visit = Visit::at(patient_id, Utc.timestamp_opt(secs, 0).unwrap());
            visit.history = history;
            visit.diagnosis = diagnosis;
            visit.treatment = treatment;
            visit
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_added_patient_reads_back(patients in prop::collection::vec(patient_strategy(), 1..6)) {
        let db = Database::open_in_memory().unwrap();

        let mut stored = Vec::new();
        for (i, mut patient) in patients.into_iter().enumerate() {
            patient.registration_number = format!("REG-{}-{}", i, patient.registration_number);
            let id = db.add(&patient).unwrap();
            stored.push((id, patient));
        }

        for (id, patient) in stored {
            let expected = Patient { id: Some(id), ..patient };
            prop_assert_eq!(db.get_by_id::<Patient>(&id).unwrap(), Some(expected));
        }
    }

    #[test]
    fn prop_put_replaces_whole_patient(first in patient_strategy(), second in patient_strategy()) {
        let db = Database::open_in_memory().unwrap();
        let id = db.add(&Patient { registration_number: "REG-1".into(), ..first }).unwrap();

        let replacement = Patient {
            id: Some(id),
            registration_number: "REG-2".into(),
            ..second
        };
        prop_assert_eq!(db.put(&replacement).unwrap(), id);
        prop_assert_eq!(db.get_by_id::<Patient>(&id).unwrap(), Some(replacement));
    }

    #[test]
    fn prop_added_visit_found_by_patient(visits in prop::collection::vec(visit_strategy(), 1..8)) {
        let db = Database::open_in_memory().unwrap();

        for visit in &visits {
            let id = db.add(visit).unwrap();
            let expected = Visit { id: Some(id), ..visit.clone() };
            prop_assert_eq!(db.get_by_id::<Visit>(&id).unwrap(), Some(expected));
        }

        for visit in &visits {
            let found: Vec<Visit> = db
                .get_all_by_index(VisitIndex::PatientId, visit.patient_id)
                .unwrap();
            let expected = visits.iter().filter(|v| v.patient_id == visit.patient_id).count();
            prop_assert_eq!(found.len(), expected);
        }
    }
}
