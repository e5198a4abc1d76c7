use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ConsultationStatus, MenstrualCycle, PreviousDiagnosis};

/// Server-owned consultation record, fetched read-only by the client.
/// Media arrays hold durable URLs issued by the upload endpoint, never
/// local object URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub basic_details: BasicDetails,
    pub symptoms: Symptoms,
    pub medical_history: MedicalHistory,
    pub media: ConsultationMedia,
    pub language: String,
}

/// Age/height/weight plus cycle regularity. Zero means "not entered yet"
/// for the three numeric fields; the intake gate rejects zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicDetails {
    pub age: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
    pub menstrual_cycle: MenstrualCycle,
}

impl BasicDetails {
    /// Body mass index from height/weight, rounded to one decimal.
    pub fn bmi(&self) -> f64 {
        let height_m = f64::from(self.height_cm) / 100.0;
        let raw = f64::from(self.weight_kg) / (height_m * height_m);
        (raw * 10.0).round() / 10.0
    }
}

impl Default for BasicDetails {
    fn default() -> Self {
        Self {
            age: 0,
            height_cm: 0,
            weight_kg: 0,
            menstrual_cycle: MenstrualCycle::Regular,
        }
    }
}

/// Seven independent symptom flags plus a free-text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptoms {
    pub irregular_periods: bool,
    pub acne: bool,
    pub weight_gain: bool,
    pub hair_loss: bool,
    pub facial_hair: bool,
    pub mood_changes: bool,
    pub fatigue: bool,
    pub other: String,
}

impl Symptoms {
    /// Labels of the flags currently set, in display order.
    pub fn present_labels(&self) -> Vec<&'static str> {
        let flags = [
            (self.irregular_periods, "Irregular periods"),
            (self.acne, "Acne"),
            (self.weight_gain, "Weight gain"),
            (self.hair_loss, "Hair loss"),
            (self.facial_hair, "Facial hair"),
            (self.mood_changes, "Mood changes"),
            (self.fatigue, "Fatigue"),
        ];
        flags
            .into_iter()
            .filter_map(|(set, label)| set.then_some(label))
            .collect()
    }
}

/// Prior diagnosis, current medications, and whether the patient has
/// reports to share. `reports_available` is a boolean here because the
/// server stores the coerced form; the draft keeps the yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub previous_diagnosis: PreviousDiagnosis,
    pub medications: Option<String>,
    pub reports_available: bool,
}

/// Durable URL buckets by media kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationMedia {
    pub images: Vec<String>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

impl ConsultationMedia {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.audio.is_empty() && self.video.is_empty()
    }

    pub fn total(&self) -> usize {
        self.images.len() + self.audio.len() + self.video.len()
    }
}
