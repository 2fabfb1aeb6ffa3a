//! Typed form field mapping.
//!
//! Each form field a front end renders has a variant here with a getter and a
//! setter, so populating a form from a record (or a record from a form) never
//! relies on matching field names at runtime.

use chrono::NaiveDate;
use thiserror::Error;

use super::{Patient, Visit};

/// Form value errors.
#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid number for {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Fields of the patient registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientField {
    RegistrationNumber,
    RegistrationDate,
    FullName,
    DateOfBirth,
    Age,
    Sex,
    MaritalStatus,
    Occupation,
    Religion,
    HomeAddress,
    Telephone,
    KinName,
    KinRelation,
    KinRelationOther,
    KinContact,
    InsuranceType,
    NhisNumber,
    CccCode,
    PrivateProvider,
    InsuranceNumber,
    Remarks,
}

impl PatientField {
    pub const ALL: [PatientField; 21] = [
        PatientField::RegistrationNumber,
        PatientField::RegistrationDate,
        PatientField::FullName,
        PatientField::DateOfBirth,
        PatientField::Age,
        PatientField::Sex,
        PatientField::MaritalStatus,
        PatientField::Occupation,
        PatientField::Religion,
        PatientField::HomeAddress,
        PatientField::Telephone,
        PatientField::KinName,
        PatientField::KinRelation,
        PatientField::KinRelationOther,
        PatientField::KinContact,
        PatientField::InsuranceType,
        PatientField::NhisNumber,
        PatientField::CccCode,
        PatientField::PrivateProvider,
        PatientField::InsuranceNumber,
        PatientField::Remarks,
    ];

    /// Form element name.
    pub fn name(&self) -> &'static str {
        match self {
            PatientField::RegistrationNumber => "registrationNumber",
            PatientField::RegistrationDate => "registrationDate",
            PatientField::FullName => "fullName",
            PatientField::DateOfBirth => "dob",
            PatientField::Age => "age",
            PatientField::Sex => "sex",
            PatientField::MaritalStatus => "maritalStatus",
            PatientField::Occupation => "occupation",
            PatientField::Religion => "religion",
            PatientField::HomeAddress => "homeAddress",
            PatientField::Telephone => "telephone",
            PatientField::KinName => "kinName",
            PatientField::KinRelation => "kinRelation",
            PatientField::KinRelationOther => "kinRelationOther",
            PatientField::KinContact => "kinContact",
            PatientField::InsuranceType => "insuranceType",
            PatientField::NhisNumber => "nhisNumber",
            PatientField::CccCode => "cccCode",
            PatientField::PrivateProvider => "privateProvider",
            PatientField::InsuranceNumber => "insuranceNumber",
            PatientField::Remarks => "remarks",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }

    /// Display value of this field on `patient` (empty when unset).
    pub fn get(&self, patient: &Patient) -> String {
        match self {
            PatientField::RegistrationDate => format_date(patient.registration_date),
            PatientField::DateOfBirth => format_date(patient.date_of_birth),
            PatientField::Age => patient.age.map(|a| a.to_string()).unwrap_or_default(),
            _ => self.text(patient).cloned().unwrap_or_default(),
        }
    }

    /// Set this field on `patient` from a form value.
    pub fn set(&self, patient: &mut Patient, value: &str) -> Result<(), FieldError> {
        match self {
            PatientField::RegistrationDate => {
                patient.registration_date = parse_date(self.name(), value)?;
            }
            PatientField::DateOfBirth => {
                patient.date_of_birth = parse_date(self.name(), value)?;
            }
            PatientField::Age => {
                let value = value.trim();
                patient.age = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| FieldError::InvalidNumber {
                        field: self.name(),
                        value: value.to_string(),
                    })?)
                };
            }
            _ => {
                if let Some(slot) = self.text_mut(patient) {
                    *slot = value.to_string();
                }
            }
        }
        Ok(())
    }

    fn text<'p>(&self, patient: &'p Patient) -> Option<&'p String> {
        Some(match self {
            PatientField::RegistrationNumber => &patient.registration_number,
            PatientField::FullName => &patient.full_name,
            PatientField::Sex => &patient.sex,
            PatientField::MaritalStatus => &patient.marital_status,
            PatientField::Occupation => &patient.occupation,
            PatientField::Religion => &patient.religion,
            PatientField::HomeAddress => &patient.home_address,
            PatientField::Telephone => &patient.telephone,
            PatientField::KinName => &patient.kin_name,
            PatientField::KinRelation => &patient.kin_relation,
            PatientField::KinRelationOther => &patient.kin_relation_other,
            PatientField::KinContact => &patient.kin_contact,
            PatientField::InsuranceType => &patient.insurance_type,
            PatientField::NhisNumber => &patient.nhis_number,
            PatientField::CccCode => &patient.ccc_code,
            PatientField::PrivateProvider => &patient.private_provider,
            PatientField::InsuranceNumber => &patient.insurance_number,
            PatientField::Remarks => &patient.remarks,
            PatientField::RegistrationDate | PatientField::DateOfBirth | PatientField::Age => {
                return None
            }
        })
    }

    fn text_mut<'p>(&self, patient: &'p mut Patient) -> Option<&'p mut String> {
        Some(match self {
            PatientField::RegistrationNumber => &mut patient.registration_number,
            PatientField::FullName => &mut patient.full_name,
            PatientField::Sex => &mut patient.sex,
            PatientField::MaritalStatus => &mut patient.marital_status,
            PatientField::Occupation => &mut patient.occupation,
            PatientField::Religion => &mut patient.religion,
            PatientField::HomeAddress => &mut patient.home_address,
            PatientField::Telephone => &mut patient.telephone,
            PatientField::KinName => &mut patient.kin_name,
            PatientField::KinRelation => &mut patient.kin_relation,
            PatientField::KinRelationOther => &mut patient.kin_relation_other,
            PatientField::KinContact => &mut patient.kin_contact,
            PatientField::InsuranceType => &mut patient.insurance_type,
            PatientField::NhisNumber => &mut patient.nhis_number,
            PatientField::CccCode => &mut patient.ccc_code,
            PatientField::PrivateProvider => &mut patient.private_provider,
            PatientField::InsuranceNumber => &mut patient.insurance_number,
            PatientField::Remarks => &mut patient.remarks,
            PatientField::RegistrationDate | PatientField::DateOfBirth | PatientField::Age => {
                return None
            }
        })
    }
}

/// Narrative fields of the consultation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitField {
    History,
    ExaminationFindings,
    Investigations,
    Diagnosis,
    PrincipalDiagnosis,
    AdditionalDiagnosis,
    Treatment,
    ClinicalRemarks,
}

impl VisitField {
    pub const ALL: [VisitField; 8] = [
        VisitField::History,
        VisitField::ExaminationFindings,
        VisitField::Investigations,
        VisitField::Diagnosis,
        VisitField::PrincipalDiagnosis,
        VisitField::AdditionalDiagnosis,
        VisitField::Treatment,
        VisitField::ClinicalRemarks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VisitField::History => "history",
            VisitField::ExaminationFindings => "examinationFindings",
            VisitField::Investigations => "investigations",
            VisitField::Diagnosis => "diagnosis",
            VisitField::PrincipalDiagnosis => "principalDiagnosis",
            VisitField::AdditionalDiagnosis => "additionalDiagnosis",
            VisitField::Treatment => "treatment",
            VisitField::ClinicalRemarks => "clinicalRemarks",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }

    pub fn get<'v>(&self, visit: &'v Visit) -> &'v str {
        match self {
            VisitField::History => &visit.history,
            VisitField::ExaminationFindings => &visit.examination_findings,
            VisitField::Investigations => &visit.investigations,
            VisitField::Diagnosis => &visit.diagnosis,
            VisitField::PrincipalDiagnosis => &visit.principal_diagnosis,
            VisitField::AdditionalDiagnosis => &visit.additional_diagnosis,
            VisitField::Treatment => &visit.treatment,
            VisitField::ClinicalRemarks => &visit.clinical_remarks,
        }
    }

    pub fn set(&self, visit: &mut Visit, value: &str) {
        let slot = match self {
            VisitField::History => &mut visit.history,
            VisitField::ExaminationFindings => &mut visit.examination_findings,
            VisitField::Investigations => &mut visit.investigations,
            VisitField::Diagnosis => &mut visit.diagnosis,
            VisitField::PrincipalDiagnosis => &mut visit.principal_diagnosis,
            VisitField::AdditionalDiagnosis => &mut visit.additional_diagnosis,
            VisitField::Treatment => &mut visit.treatment,
            VisitField::ClinicalRemarks => &mut visit.clinical_remarks,
        };
        *slot = value.to_string();
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FieldError::InvalidDate {
            field,
            value: value.to_string(),
        })
}
