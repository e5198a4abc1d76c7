use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-owned prescription, created exactly once per consultation by a
/// doctor and read-only to the patient thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub consultation_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub created_at: DateTime<Utc>,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub lifestyle_recommendations: String,
    pub follow_up_notes: String,
    pub pdf_url: Option<String>,
}

/// One row of the prescription's medicine table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub duration: String,
    pub instructions: String,
}

impl Medicine {
    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.dosage.is_empty()
            && self.duration.is_empty()
            && self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_medicine_detection() {
        assert!(Medicine::default().is_blank());
        let filled = Medicine {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            duration: "3 months".into(),
            instructions: "After dinner".into(),
        };
        assert!(!filled.is_blank());
    }
}
