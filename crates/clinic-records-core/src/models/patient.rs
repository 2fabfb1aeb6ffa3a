//! Patient models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A registered patient.
///
/// Serialized with camelCase field names so backups keep the same shape as
/// records written by the browser front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Auto-assigned identifier - `None` until first stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Facility registration number (unique)
    pub registration_number: String,
    /// Date the patient was registered at the facility
    #[serde(default, deserialize_with = "form_value::date")]
    pub registration_date: Option<NaiveDate>,
    /// Full name
    pub full_name: String,
    /// Date of birth
    #[serde(default, rename = "dob", deserialize_with = "form_value::date")]
    pub date_of_birth: Option<NaiveDate>,
    /// Age in years as entered (or derived from date of birth)
    #[serde(default, deserialize_with = "form_value::age")]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub religion: String,
    #[serde(default)]
    pub home_address: String,
    #[serde(default)]
    pub telephone: String,
    /// Next of kin
    #[serde(default)]
    pub kin_name: String,
    #[serde(default)]
    pub kin_relation: String,
    /// Free-text relation when `kin_relation` is "Other"
    #[serde(default)]
    pub kin_relation_other: String,
    #[serde(default)]
    pub kin_contact: String,
    /// Insurance scheme ("NHIS", "Private", "None", ...)
    #[serde(default)]
    pub insurance_type: String,
    #[serde(default)]
    pub nhis_number: String,
    #[serde(default)]
    pub ccc_code: String,
    #[serde(default)]
    pub private_provider: String,
    #[serde(default)]
    pub insurance_number: String,
    #[serde(default)]
    pub remarks: String,
}

/// Field readers that also accept the browser front end's form values,
/// where every field is a string and an unset one is `""`.
mod form_value {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(u32),
        Text(String),
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid date {:?}: {}", s, e))),
            _ => Ok(None),
        }
    }

    pub fn age<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Option::<NumberOrText>::deserialize(d)? {
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(s)) if !s.trim().is_empty() => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid age {:?}", s))),
            _ => Ok(None),
        }
    }
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(registration_number: String, full_name: String) -> Self {
        Self {
            registration_number,
            full_name,
            registration_date: Some(chrono::Utc::now().date_naive()),
            ..Self::default()
        }
    }

    /// Check if this patient has been stored.
    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// Age in whole years on `date`, if the date of birth is known.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        if dob > date {
            return None;
        }
        let mut years = date.year() - dob.year();
        if (date.month(), date.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Fill `age` from the date of birth when it was left blank.
    pub fn fill_age(&mut self, today: NaiveDate) {
        if self.age.is_none() {
            self.age = self.age_on(today);
        }
    }

    /// Case-insensitive match on name or registration number.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.full_name.to_lowercase().contains(&term)
            || self.registration_number.to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("REG-001".into(), "Jane Doe".into());
        assert_eq!(patient.registration_number, "REG-001");
        assert_eq!(patient.full_name, "Jane Doe");
        assert!(!patient.is_registered());
        assert!(patient.registration_date.is_some());
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let mut patient = Patient::new("REG-001".into(), "Jane Doe".into());
        patient.date_of_birth = Some(date(1990, 6, 15));

        assert_eq!(patient.age_on(date(2024, 6, 14)), Some(33));
        assert_eq!(patient.age_on(date(2024, 6, 15)), Some(34));
        assert_eq!(patient.age_on(date(1989, 1, 1)), None);
    }

    #[test]
    fn test_fill_age_keeps_entered_value() {
        let mut patient = Patient::new("REG-001".into(), "Jane Doe".into());
        patient.date_of_birth = Some(date(2000, 1, 1));
        patient.age = Some(99);
        patient.fill_age(date(2024, 1, 1));
        assert_eq!(patient.age, Some(99));

        patient.age = None;
        patient.fill_age(date(2024, 1, 1));
        assert_eq!(patient.age, Some(24));
    }

    #[test]
    fn test_matches_name_or_registration_number() {
        let patient = Patient::new("REG-001".into(), "Jane Doe".into());
        assert!(patient.matches("jane"));
        assert!(patient.matches("reg-0"));
        assert!(!patient.matches("smith"));
    }

    #[test]
    fn test_camel_case_shape() {
        let patient = Patient::new("REG-001".into(), "Jane Doe".into());
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["registrationNumber"], "REG-001");
        assert_eq!(json["fullName"], "Jane Doe");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_reads_form_string_values() {
        let json = r#"{
            "id": 4,
            "registrationNumber": "REG-004",
            "registrationDate": "2023-11-02",
            "fullName": "Ama Mensah",
            "dob": "",
            "age": "34",
            "sex": "Female"
        }"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.registration_date, Some(date(2023, 11, 2)));
        assert_eq!(patient.date_of_birth, None);
        assert_eq!(patient.age, Some(34));

        let blank: Patient = serde_json::from_str(
            r#"{"registrationNumber": "R", "fullName": "N", "registrationDate": "", "age": "", "dob": null}"#,
        )
        .unwrap();
        assert_eq!(blank.registration_date, None);
        assert_eq!(blank.age, None);
    }

    #[test]
    fn test_rejects_unreadable_form_values() {
        for json in [
            r#"{"registrationNumber": "R", "fullName": "N", "age": "thirty"}"#,
            r#"{"registrationNumber": "R", "fullName": "N", "dob": "17/05/1990"}"#,
            r#"{"registrationNumber": "R", "fullName": "N", "age": -3}"#,
        ] {
            assert!(serde_json::from_str::<Patient>(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn test_serialized_dates_read_back() {
        let mut patient = Patient::new("REG-001".into(), "Jane Doe".into());
        patient.date_of_birth = Some(date(1990, 5, 17));
        patient.age = Some(34);
        let json = serde_json::to_string(&patient).unwrap();
        assert!(json.contains(r#""dob":"1990-05-17""#));
        assert_eq!(serde_json::from_str::<Patient>(&json).unwrap(), patient);
    }
}
