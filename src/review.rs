//! Doctor-side consultation review and prescription authoring.
//!
//! Loads one consultation, derives the read-only patient summary the
//! detail view shows (BMI, present symptoms, display labels), and holds
//! the prescription draft. The draft always carries at least one
//! medicine row; generation packages the draft with the consultation's
//! identities and posts it once, rejecting re-entry while in flight.
//!
//! Required-field marking is advisory: `missing_required` reports empty
//! fields for the form to flag, but generation dispatches regardless.

use crate::api::{ApiError, PortalApi, PrescriptionPayload};
use crate::models::{Consultation, ConsultationStatus, Medicine, Prescription};

/// Notice shown to the doctor after a prescription is created.
pub const COMPLETION_NOTICE: &str =
    "Prescription generated successfully! It will be sent to the patient via dashboard and WhatsApp.";

// ═══════════════════════════════════════════════════════════
// Patient summary
// ═══════════════════════════════════════════════════════════

/// Read-only view of the consultation for the detail panel. Free-text
/// fields the patient left empty are absent rather than blank.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSummary {
    pub patient_id: String,
    pub age: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
    pub bmi: f64,
    pub menstrual_cycle: &'static str,
    pub symptom_labels: Vec<&'static str>,
    pub other_symptoms: Option<String>,
    pub previous_diagnosis: &'static str,
    pub medications: Option<String>,
    pub reports_available: bool,
}

impl PatientSummary {
    fn from_consultation(consultation: &Consultation) -> Self {
        let history = &consultation.medical_history;
        Self {
            patient_id: consultation.patient_id.clone(),
            age: consultation.basic_details.age,
            height_cm: consultation.basic_details.height_cm,
            weight_kg: consultation.basic_details.weight_kg,
            bmi: consultation.basic_details.bmi(),
            menstrual_cycle: consultation.basic_details.menstrual_cycle.display_label(),
            symptom_labels: consultation.symptoms.present_labels(),
            other_symptoms: Some(consultation.symptoms.other.clone())
                .filter(|o| !o.is_empty()),
            previous_diagnosis: history.previous_diagnosis.display_label(),
            medications: history
                .medications
                .clone()
                .filter(|m| !m.is_empty()),
            reports_available: history.reports_available,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Prescription draft
// ═══════════════════════════════════════════════════════════

/// One editable field of a medicine row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicineField {
    Name,
    Dosage,
    Duration,
    Instructions,
}

/// The prescription being authored. The medicine list never goes below
/// one row, so the table always has somewhere to type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionDraft {
    pub diagnosis: String,
    medicines: Vec<Medicine>,
    pub lifestyle_recommendations: String,
    pub follow_up_notes: String,
}

impl Default for PrescriptionDraft {
    fn default() -> Self {
        Self {
            diagnosis: String::new(),
            medicines: vec![Medicine::default()],
            lifestyle_recommendations: String::new(),
            follow_up_notes: String::new(),
        }
    }
}

impl PrescriptionDraft {
    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    /// Append a blank row to the medicine table.
    pub fn add_medicine_row(&mut self) {
        self.medicines.push(Medicine::default());
    }

    /// Remove one row. The sole remaining row cannot be removed; returns
    /// `false` for that and for out-of-range indices.
    pub fn remove_medicine_row(&mut self, index: usize) -> bool {
        if self.medicines.len() <= 1 || index >= self.medicines.len() {
            return false;
        }
        self.medicines.remove(index);
        true
    }

    /// Set one field of one row, leaving the others untouched. Returns
    /// `false` for out-of-range indices.
    pub fn update_medicine_field(
        &mut self,
        index: usize,
        field: MedicineField,
        value: &str,
    ) -> bool {
        let Some(medicine) = self.medicines.get_mut(index) else {
            return false;
        };
        let slot = match field {
            MedicineField::Name => &mut medicine.name,
            MedicineField::Dosage => &mut medicine.dosage,
            MedicineField::Duration => &mut medicine.duration,
            MedicineField::Instructions => &mut medicine.instructions,
        };
        *slot = value.to_string();
        true
    }

    /// Labels of the required fields currently empty, for the form to
    /// mark. The medicine table counts as missing only when every row
    /// is blank. Advisory only; generation does not check this.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.diagnosis.is_empty() {
            missing.push("Diagnosis");
        }
        if self.medicines.iter().all(Medicine::is_blank) {
            missing.push("Medicines");
        }
        if self.lifestyle_recommendations.is_empty() {
            missing.push("Lifestyle Recommendations");
        }
        if self.follow_up_notes.is_empty() {
            missing.push("Follow-up Notes");
        }
        missing
    }
}

// ═══════════════════════════════════════════════════════════
// Review flow
// ═══════════════════════════════════════════════════════════

/// Errors from the review surface.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Consultation not found")]
    NotFound,

    #[error("Prescription generation already in progress")]
    GenerationInFlight,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A doctor's view of one consultation plus the prescription draft.
///
/// The only patient identity available here is the id carried on the
/// consultation; the backend exposes no user lookup.
#[derive(Debug)]
pub struct ReviewFlow<P: PortalApi> {
    api: P,
    consultation: Consultation,
    doctor_id: String,
    draft: PrescriptionDraft,
    generating: bool,
    issued: Option<Prescription>,
}

impl<P: PortalApi> ReviewFlow<P> {
    /// Fetch the consultation and open it for review. `doctor_id` is the
    /// signed-in doctor's id, stamped onto the generated prescription.
    pub async fn load(api: P, consultation_id: &str, doctor_id: &str) -> Result<Self, ReviewError> {
        let consultation = api
            .get_consultation_by_id(consultation_id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        tracing::debug!(consultation_id = %consultation.id, "consultation opened for review");
        Ok(Self {
            api,
            consultation,
            doctor_id: doctor_id.to_string(),
            draft: PrescriptionDraft::default(),
            generating: false,
            issued: None,
        })
    }

    pub fn consultation(&self) -> &Consultation {
        &self.consultation
    }

    pub fn patient_summary(&self) -> PatientSummary {
        PatientSummary::from_consultation(&self.consultation)
    }

    pub fn draft(&self) -> &PrescriptionDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PrescriptionDraft {
        &mut self.draft
    }

    /// True while a generation call is in flight; the action stays
    /// disabled for its duration.
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// The prescription created by the last successful generation.
    pub fn issued_prescription(&self) -> Option<&Prescription> {
        self.issued.as_ref()
    }

    /// [`COMPLETION_NOTICE`] once a prescription has been issued.
    pub fn completion_notice(&self) -> Option<&'static str> {
        self.issued.as_ref().map(|_| COMPLETION_NOTICE)
    }

    /// Package the draft with the consultation's identities and submit
    /// it. Single-flight: a call while one is already in progress is
    /// rejected without touching the backend.
    pub async fn generate_prescription(&mut self) -> Result<Prescription, ReviewError> {
        if self.generating {
            return Err(ReviewError::GenerationInFlight);
        }
        self.generating = true;

        let payload = PrescriptionPayload {
            consultation_id: self.consultation.id.clone(),
            patient_id: self.consultation.patient_id.clone(),
            doctor_id: self.doctor_id.clone(),
            diagnosis: self.draft.diagnosis.clone(),
            medicines: self.draft.medicines.clone(),
            lifestyle_recommendations: self.draft.lifestyle_recommendations.clone(),
            follow_up_notes: self.draft.follow_up_notes.clone(),
        };
        let result = self.api.create_prescription(&payload).await;
        self.generating = false;

        match result {
            Ok(prescription) => {
                tracing::info!(
                    prescription_id = %prescription.id,
                    consultation_id = %self.consultation.id,
                    "prescription issued"
                );
                self.issued = Some(prescription.clone());
                Ok(prescription)
            }
            Err(err) => {
                tracing::warn!(error = %err, "prescription generation failed");
                Err(err.into())
            }
        }
    }

    /// Generic status update for authorized roles; nothing calls this
    /// automatically. The local copy follows the server on success.
    pub async fn set_status(&mut self, status: ConsultationStatus) -> Result<(), ReviewError> {
        self.api
            .update_consultation_status(&self.consultation.id, status)
            .await?;
        self.consultation.status = status;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockPortal, RecordedCall};
    use crate::models::{
        BasicDetails, ConsultationMedia, MedicalHistory, MenstrualCycle, PreviousDiagnosis,
        Symptoms,
    };
    use chrono::Utc;

    fn consultation(id: &str) -> Consultation {
        let now = Utc::now();
        Consultation {
            id: id.to_string(),
            patient_id: "patient-1".to_string(),
            doctor_id: None,
            status: ConsultationStatus::Pending,
            created_at: now,
            updated_at: now,
            basic_details: BasicDetails {
                age: 28,
                height_cm: 165,
                weight_kg: 70,
                menstrual_cycle: MenstrualCycle::Irregular,
            },
            symptoms: Symptoms {
                acne: true,
                weight_gain: true,
                other: "Heavy bleeding".to_string(),
                ..Symptoms::default()
            },
            medical_history: MedicalHistory {
                previous_diagnosis: PreviousDiagnosis::Pcos,
                medications: Some("Metformin 500mg".to_string()),
                reports_available: true,
            },
            media: ConsultationMedia::default(),
            language: "English".to_string(),
        }
    }

    async fn loaded_flow(mock: MockPortal) -> ReviewFlow<MockPortal> {
        ReviewFlow::load(mock, "consult-1", "doctor-1").await.unwrap()
    }

    #[test]
    fn draft_starts_with_one_blank_medicine_row() {
        let draft = PrescriptionDraft::default();
        assert_eq!(draft.medicines().len(), 1);
        assert!(draft.medicines()[0].is_blank());
    }

    #[test]
    fn sole_medicine_row_cannot_be_removed() {
        let mut draft = PrescriptionDraft::default();
        assert!(!draft.remove_medicine_row(0));
        assert_eq!(draft.medicines().len(), 1);
    }

    #[test]
    fn rows_are_added_and_removed_in_place() {
        let mut draft = PrescriptionDraft::default();
        draft.update_medicine_field(0, MedicineField::Name, "Metformin");
        draft.add_medicine_row();
        draft.update_medicine_field(1, MedicineField::Name, "Inositol");
        draft.add_medicine_row();
        draft.update_medicine_field(2, MedicineField::Name, "Vitamin D");

        assert!(draft.remove_medicine_row(1));
        let names: Vec<_> = draft.medicines().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Metformin", "Vitamin D"]);

        assert!(!draft.remove_medicine_row(5));
        assert_eq!(draft.medicines().len(), 2);
    }

    #[test]
    fn update_medicine_field_touches_one_field_of_one_row() {
        let mut draft = PrescriptionDraft::default();
        draft.add_medicine_row();
        draft.update_medicine_field(0, MedicineField::Name, "Metformin");
        draft.update_medicine_field(0, MedicineField::Dosage, "500mg");
        draft.update_medicine_field(1, MedicineField::Instructions, "After dinner");

        assert_eq!(draft.medicines()[0].name, "Metformin");
        assert_eq!(draft.medicines()[0].dosage, "500mg");
        assert_eq!(draft.medicines()[0].instructions, "");
        assert_eq!(draft.medicines()[1].name, "");
        assert_eq!(draft.medicines()[1].instructions, "After dinner");

        assert!(!draft.update_medicine_field(7, MedicineField::Name, "x"));
    }

    #[test]
    fn missing_required_drains_as_fields_are_filled() {
        let mut draft = PrescriptionDraft::default();
        assert_eq!(
            draft.missing_required(),
            vec![
                "Diagnosis",
                "Medicines",
                "Lifestyle Recommendations",
                "Follow-up Notes",
            ],
        );

        draft.diagnosis = "PCOS".to_string();
        draft.update_medicine_field(0, MedicineField::Name, "Metformin");
        assert_eq!(
            draft.missing_required(),
            vec!["Lifestyle Recommendations", "Follow-up Notes"],
        );

        draft.lifestyle_recommendations = "Daily walk".to_string();
        draft.follow_up_notes = "Review in 6 weeks".to_string();
        assert!(draft.missing_required().is_empty());
    }

    #[tokio::test]
    async fn load_fetches_the_consultation_and_derives_the_summary() {
        let mock = MockPortal::new().with_consultations(vec![consultation("consult-1")]);
        let flow = loaded_flow(mock.clone()).await;

        assert_eq!(flow.consultation().id, "consult-1");
        assert!(mock
            .calls()
            .contains(&RecordedCall::GetConsultationById("consult-1".to_string())));

        let summary = flow.patient_summary();
        assert_eq!(summary.patient_id, "patient-1");
        assert_eq!(summary.bmi, 25.7);
        assert_eq!(summary.menstrual_cycle, "Irregular (varies by a few days)");
        assert_eq!(summary.symptom_labels, vec!["Acne", "Weight gain"]);
        assert_eq!(summary.other_symptoms.as_deref(), Some("Heavy bleeding"));
        assert_eq!(summary.previous_diagnosis, "PCOS");
        assert_eq!(summary.medications.as_deref(), Some("Metformin 500mg"));
        assert!(summary.reports_available);
    }

    #[tokio::test]
    async fn empty_free_text_is_absent_from_the_summary() {
        let mut consultation = consultation("consult-1");
        consultation.symptoms.other = String::new();
        consultation.medical_history.medications = Some(String::new());
        let mock = MockPortal::new().with_consultations(vec![consultation]);

        let flow = loaded_flow(mock).await;
        let summary = flow.patient_summary();
        assert_eq!(summary.other_symptoms, None);
        assert_eq!(summary.medications, None);
    }

    #[tokio::test]
    async fn load_of_an_unknown_consultation_is_not_found() {
        let err = ReviewFlow::load(MockPortal::new(), "missing", "doctor-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotFound));
    }

    #[tokio::test]
    async fn generation_packages_the_draft_with_the_consultation_identities() {
        let mock = MockPortal::new().with_consultations(vec![consultation("consult-1")]);
        let mut flow = loaded_flow(mock.clone()).await;

        flow.draft_mut().diagnosis = "PCOS with insulin resistance".to_string();
        flow.draft_mut()
            .update_medicine_field(0, MedicineField::Name, "Metformin");
        flow.draft_mut()
            .update_medicine_field(0, MedicineField::Dosage, "500mg");
        flow.draft_mut()
            .update_medicine_field(0, MedicineField::Duration, "3 months");
        flow.draft_mut()
            .update_medicine_field(0, MedicineField::Instructions, "After dinner");
        flow.draft_mut().lifestyle_recommendations = "30 minutes of walking daily".to_string();
        flow.draft_mut().follow_up_notes = "Review in 6 weeks".to_string();

        let prescription = flow.generate_prescription().await.unwrap();
        assert_eq!(prescription.consultation_id, "consult-1");
        assert_eq!(prescription.doctor_id, "doctor-1");

        let payload = &mock.create_prescription_payloads()[0];
        assert_eq!(payload["consultationId"], "consult-1");
        assert_eq!(payload["patientId"], "patient-1");
        assert_eq!(payload["doctorId"], "doctor-1");
        assert_eq!(payload["diagnosis"], "PCOS with insulin resistance");
        assert_eq!(payload["medicines"][0]["name"], "Metformin");
        assert_eq!(payload["medicines"][0]["dosage"], "500mg");
        assert_eq!(payload["lifestyleRecommendations"], "30 minutes of walking daily");
        assert_eq!(payload["followUpNotes"], "Review in 6 weeks");

        assert!(!flow.is_generating());
        assert_eq!(flow.completion_notice(), Some(COMPLETION_NOTICE));
        assert_eq!(
            flow.issued_prescription().map(|p| p.id.as_str()),
            Some(prescription.id.as_str()),
        );
    }

    #[tokio::test]
    async fn empty_required_fields_do_not_block_generation() {
        let mock = MockPortal::new().with_consultations(vec![consultation("consult-1")]);
        let mut flow = loaded_flow(mock.clone()).await;
        assert!(!flow.draft().missing_required().is_empty());

        flow.generate_prescription().await.unwrap();

        let payload = &mock.create_prescription_payloads()[0];
        assert_eq!(payload["diagnosis"], "");
        assert_eq!(payload["medicines"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generation_failure_clears_the_busy_state_without_a_notice() {
        let mock = MockPortal::new()
            .with_consultations(vec![consultation("consult-1")])
            .fail_create_prescription("Doctor not assigned to this consultation");
        let mut flow = loaded_flow(mock).await;

        let err = flow.generate_prescription().await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Doctor not assigned to this consultation"));
        assert!(!flow.is_generating());
        assert!(flow.completion_notice().is_none());
        assert!(flow.issued_prescription().is_none());
    }

    #[tokio::test]
    async fn set_status_follows_the_server_on_success() {
        let mock = MockPortal::new().with_consultations(vec![consultation("consult-1")]);
        let mut flow = loaded_flow(mock.clone()).await;
        assert_eq!(flow.consultation().status, ConsultationStatus::Pending);

        flow.set_status(ConsultationStatus::InReview).await.unwrap();
        assert_eq!(flow.consultation().status, ConsultationStatus::InReview);
        assert!(mock.calls().contains(&RecordedCall::UpdateConsultationStatus {
            id: "consult-1".to_string(),
            status: ConsultationStatus::InReview,
        }));
    }
}
