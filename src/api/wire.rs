//! Wire-format adapter between the backend's snake_case records and the
//! client model. All field-name translation and date parsing happens here
//! and nowhere else.
//!
//! Field mapping (backend → client model):
//!
//! | Backend field | Model field | Notes |
//! |---|---|---|
//! | `id` | `id` | opaque string |
//! | `patient_id` | `patient_id` | |
//! | `doctor_id` | `doctor_id` | absent until assigned |
//! | `status` | `status` | parsed into `ConsultationStatus` |
//! | `created_at` / `updated_at` | `created_at` / `updated_at` | RFC 3339 → `DateTime<Utc>` |
//! | `basic_details.age` | `basic_details.age` | |
//! | `basic_details.height` | `basic_details.height_cm` | unit fixed at cm |
//! | `basic_details.weight` | `basic_details.weight_kg` | unit fixed at kg |
//! | `basic_details.menstrual_cycle_regularity` | `basic_details.menstrual_cycle` | parsed into `MenstrualCycle` |
//! | `symptoms.*` | `symptoms.*` | seven booleans, missing → false |
//! | `symptoms.other` | `symptoms.other` | absent → empty string |
//! | `medical_history.previous_diagnosis` | `medical_history.previous_diagnosis` | parsed into `PreviousDiagnosis` |
//! | `medical_history.medications` | `medical_history.medications` | |
//! | `medical_history.reports_available` | `medical_history.reports_available` | already a boolean server-side |
//! | `media.{images,audio,video}` | `media.{images,audio,video}` | absent → empty buckets |
//! | `language` | `language` | absent → default language |
//!
//! Prescriptions map one-to-one (`consultation_id`, `lifestyle_recommendations`,
//! `follow_up_notes`, `pdf_url`) plus the same `created_at` parsing; medicine
//! rows carry `name`/`dosage`/`duration`/`instructions` unchanged.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config;
use crate::models::{
    BasicDetails, Consultation, ConsultationMedia, ConsultationStatus, MedicalHistory, Medicine,
    MenstrualCycle, ModelError, Prescription, PreviousDiagnosis, Role, Symptoms, User,
};

// ---------------------------------------------------------------------------
// Backend-shaped records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationRecord {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub basic_details: BasicDetailsRecord,
    #[serde(default)]
    pub symptoms: SymptomsRecord,
    pub medical_history: MedicalHistoryRecord,
    #[serde(default)]
    pub media: Option<MediaRecord>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicDetailsRecord {
    pub age: u32,
    pub height: u32,
    pub weight: u32,
    pub menstrual_cycle_regularity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymptomsRecord {
    #[serde(default)]
    pub irregular_periods: bool,
    #[serde(default)]
    pub acne: bool,
    #[serde(default)]
    pub weight_gain: bool,
    #[serde(default)]
    pub hair_loss: bool,
    #[serde(default)]
    pub facial_hair: bool,
    #[serde(default)]
    pub mood_changes: bool,
    #[serde(default)]
    pub fatigue: bool,
    #[serde(default)]
    pub other: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicalHistoryRecord {
    pub previous_diagnosis: String,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub reports_available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaRecord {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub audio: Vec<String>,
    #[serde(default)]
    pub video: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionRecord {
    pub id: String,
    pub consultation_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub created_at: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medicines: Vec<MedicineRecord>,
    #[serde(default)]
    pub lifestyle_recommendations: String,
    #[serde(default)]
    pub follow_up_notes: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicineRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ModelError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ModelError::InvalidTimestamp {
            field: field.into(),
            value: value.into(),
        })
}

pub fn user_from_record(record: UserRecord) -> Result<User, ModelError> {
    Ok(User {
        role: Role::from_str(&record.role)?,
        id: record.id,
        email: record.email,
        name: record.name,
        phone: record.phone,
    })
}

pub fn consultation_from_record(record: ConsultationRecord) -> Result<Consultation, ModelError> {
    let media = record.media.unwrap_or_default();
    Ok(Consultation {
        status: ConsultationStatus::from_str(&record.status)?,
        created_at: parse_timestamp("created_at", &record.created_at)?,
        updated_at: parse_timestamp("updated_at", &record.updated_at)?,
        basic_details: BasicDetails {
            age: record.basic_details.age,
            height_cm: record.basic_details.height,
            weight_kg: record.basic_details.weight,
            menstrual_cycle: MenstrualCycle::from_str(
                &record.basic_details.menstrual_cycle_regularity,
            )?,
        },
        symptoms: Symptoms {
            irregular_periods: record.symptoms.irregular_periods,
            acne: record.symptoms.acne,
            weight_gain: record.symptoms.weight_gain,
            hair_loss: record.symptoms.hair_loss,
            facial_hair: record.symptoms.facial_hair,
            mood_changes: record.symptoms.mood_changes,
            fatigue: record.symptoms.fatigue,
            other: record.symptoms.other.unwrap_or_default(),
        },
        medical_history: MedicalHistory {
            previous_diagnosis: PreviousDiagnosis::from_str(
                &record.medical_history.previous_diagnosis,
            )?,
            medications: record.medical_history.medications,
            reports_available: record.medical_history.reports_available,
        },
        media: ConsultationMedia {
            images: media.images,
            audio: media.audio,
            video: media.video,
        },
        language: record
            .language
            .unwrap_or_else(|| config::DEFAULT_LANGUAGE.to_string()),
        id: record.id,
        patient_id: record.patient_id,
        doctor_id: record.doctor_id,
    })
}

pub fn prescription_from_record(record: PrescriptionRecord) -> Result<Prescription, ModelError> {
    Ok(Prescription {
        created_at: parse_timestamp("created_at", &record.created_at)?,
        medicines: record
            .medicines
            .into_iter()
            .map(|m| Medicine {
                name: m.name,
                dosage: m.dosage,
                duration: m.duration,
                instructions: m.instructions,
            })
            .collect(),
        id: record.id,
        consultation_id: record.consultation_id,
        patient_id: record.patient_id,
        doctor_id: record.doctor_id,
        diagnosis: record.diagnosis,
        lifestyle_recommendations: record.lifestyle_recommendations,
        follow_up_notes: record.follow_up_notes,
        pdf_url: record.pdf_url,
    })
}
