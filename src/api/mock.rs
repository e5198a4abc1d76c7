//! Scriptable in-memory stand-in for the backend, recording every call in
//! order. Clones share state, so a test can hand a clone to a workflow and
//! keep inspecting the call log through the original.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{
    ApiError, AuthSession, ConsultationPayload, PortalApi, PrescriptionPayload, SignUpDetails,
    UploadedFile,
};
use crate::models::{
    BasicDetails, Consultation, ConsultationMedia, ConsultationStatus, MedicalHistory, MediaFile,
    MenstrualCycle, Prescription, PreviousDiagnosis, Symptoms, User,
};

/// One observed backend call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    SignUp { email: String },
    SignIn { email: String },
    SignOut,
    GetCurrentUser,
    CreateConsultation(serde_json::Value),
    GetConsultationsForPatient,
    GetConsultationsForDoctor,
    GetConsultationById(String),
    UpdateConsultationStatus { id: String, status: ConsultationStatus },
    CreatePrescription(serde_json::Value),
    GetPrescriptionsByPatient(String),
    GetPrescriptionByConsultation(String),
    GetPrescriptionById(String),
    UploadFile { name: String },
    UploadMultiple { count: usize },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    current_user: Option<User>,
    sign_in_error: Option<String>,
    fail_current_user: Option<String>,
    consultations: Vec<Consultation>,
    prescriptions: Vec<Prescription>,
    fail_lists: Option<String>,
    fail_upload_at: Option<(usize, String)>,
    fail_create_consultation: Option<String>,
    fail_create_prescription: Option<String>,
    uploads_seen: usize,
    created: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockPortal {
    state: Arc<Mutex<MockState>>,
}

impl MockPortal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the signed-in identity; sign-in and who-am-I both yield it.
    pub fn with_user(self, user: User) -> Self {
        self.lock().current_user = Some(user);
        self
    }

    pub fn with_sign_in_error(self, message: &str) -> Self {
        self.lock().sign_in_error = Some(message.to_string());
        self
    }

    /// The who-am-I call fails with a transport error.
    pub fn with_current_user_failure(self, message: &str) -> Self {
        self.lock().fail_current_user = Some(message.to_string());
        self
    }

    pub fn with_consultations(self, consultations: Vec<Consultation>) -> Self {
        self.lock().consultations = consultations;
        self
    }

    pub fn with_prescriptions(self, prescriptions: Vec<Prescription>) -> Self {
        self.lock().prescriptions = prescriptions;
        self
    }

    /// Every list fetch fails with a transport error.
    pub fn with_list_failure(self, message: &str) -> Self {
        self.lock().fail_lists = Some(message.to_string());
        self
    }

    /// The `index`-th (zero-based) single-file upload fails.
    pub fn fail_upload_at(self, index: usize, message: &str) -> Self {
        self.lock().fail_upload_at = Some((index, message.to_string()));
        self
    }

    pub fn fail_create_consultation(self, message: &str) -> Self {
        self.lock().fail_create_consultation = Some(message.to_string());
        self
    }

    pub fn fail_create_prescription(self, message: &str) -> Self {
        self.lock().fail_create_prescription = Some(message.to_string());
        self
    }

    // ── Inspection ──────────────────────────────────────────

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn upload_call_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::UploadFile { .. }))
            .count()
    }

    pub fn create_consultation_payloads(&self) -> Vec<serde_json::Value> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::CreateConsultation(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn create_prescription_payloads(&self) -> Vec<serde_json::Value> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::CreatePrescription(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RecordedCall) {
        self.lock().calls.push(call);
    }

    fn scripted_user(&self) -> Result<User, ApiError> {
        self.lock().current_user.clone().ok_or(ApiError::Rejected {
            message: "Invalid credentials".into(),
        })
    }
}

fn consultation_from_payload(
    payload: &ConsultationPayload,
    id: String,
    patient_id: String,
) -> Result<Consultation, ApiError> {
    let now = Utc::now();
    Ok(Consultation {
        id,
        patient_id,
        doctor_id: None,
        status: ConsultationStatus::Pending,
        created_at: now,
        updated_at: now,
        basic_details: BasicDetails {
            age: payload.basic_details.age,
            height_cm: payload.basic_details.height,
            weight_kg: payload.basic_details.weight,
            menstrual_cycle: MenstrualCycle::from_str(
                &payload.basic_details.menstrual_cycle_regularity,
            )?,
        },
        symptoms: Symptoms {
            irregular_periods: payload.symptoms.irregular_periods,
            acne: payload.symptoms.acne,
            weight_gain: payload.symptoms.weight_gain,
            hair_loss: payload.symptoms.hair_loss,
            facial_hair: payload.symptoms.facial_hair,
            mood_changes: payload.symptoms.mood_changes,
            fatigue: payload.symptoms.fatigue,
            other: payload.symptoms.other.clone().unwrap_or_default(),
        },
        medical_history: MedicalHistory {
            previous_diagnosis: PreviousDiagnosis::from_str(
                &payload.medical_history.previous_diagnosis,
            )?,
            medications: Some(payload.medical_history.medications.clone()),
            reports_available: payload.medical_history.reports_available,
        },
        media: ConsultationMedia {
            images: payload.media.images.clone(),
            audio: payload.media.audio.clone(),
            video: payload.media.video.clone(),
        },
        language: payload.language.clone(),
    })
}

impl PortalApi for MockPortal {
    async fn sign_up(&self, details: &SignUpDetails) -> Result<AuthSession, ApiError> {
        self.record(RecordedCall::SignUp {
            email: details.email.clone(),
        });
        let user = User {
            id: "user-1".into(),
            email: details.email.clone(),
            role: details.role,
            name: details.name.clone(),
            phone: details.phone.clone(),
        };
        self.lock().current_user = Some(user.clone());
        Ok(AuthSession {
            user,
            token: "mock-token".into(),
        })
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, ApiError> {
        self.record(RecordedCall::SignIn {
            email: email.to_string(),
        });
        if let Some(message) = self.lock().sign_in_error.clone() {
            return Err(ApiError::Rejected { message });
        }
        Ok(AuthSession {
            user: self.scripted_user()?,
            token: "mock-token".into(),
        })
    }

    fn sign_out(&self) -> Result<(), ApiError> {
        self.record(RecordedCall::SignOut);
        self.lock().current_user = None;
        Ok(())
    }

    async fn get_current_user(&self) -> Result<Option<User>, ApiError> {
        self.record(RecordedCall::GetCurrentUser);
        if let Some(message) = self.lock().fail_current_user.clone() {
            return Err(ApiError::Transport(message));
        }
        Ok(self.lock().current_user.clone())
    }

    async fn create_consultation(
        &self,
        payload: &ConsultationPayload,
    ) -> Result<Consultation, ApiError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.record(RecordedCall::CreateConsultation(value));

        if let Some(message) = self.lock().fail_create_consultation.clone() {
            return Err(ApiError::Rejected { message });
        }

        let (id, patient_id) = {
            let mut state = self.lock();
            state.created += 1;
            let patient_id = state
                .current_user
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| "patient-1".into());
            (format!("consult-{}", state.created), patient_id)
        };
        let consultation = consultation_from_payload(payload, id, patient_id)?;
        self.lock().consultations.push(consultation.clone());
        Ok(consultation)
    }

    async fn get_consultations_for_patient(&self) -> Result<Vec<Consultation>, ApiError> {
        self.record(RecordedCall::GetConsultationsForPatient);
        if let Some(message) = self.lock().fail_lists.clone() {
            return Err(ApiError::Transport(message));
        }
        Ok(self.lock().consultations.clone())
    }

    async fn get_consultations_for_doctor(&self) -> Result<Vec<Consultation>, ApiError> {
        self.record(RecordedCall::GetConsultationsForDoctor);
        if let Some(message) = self.lock().fail_lists.clone() {
            return Err(ApiError::Transport(message));
        }
        Ok(self.lock().consultations.clone())
    }

    async fn get_consultation_by_id(&self, id: &str) -> Result<Option<Consultation>, ApiError> {
        self.record(RecordedCall::GetConsultationById(id.to_string()));
        Ok(self
            .lock()
            .consultations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn update_consultation_status(
        &self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<(), ApiError> {
        self.record(RecordedCall::UpdateConsultationStatus {
            id: id.to_string(),
            status,
        });
        let mut state = self.lock();
        if let Some(consultation) = state.consultations.iter_mut().find(|c| c.id == id) {
            consultation.status = status;
        }
        Ok(())
    }

    async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> Result<Prescription, ApiError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.record(RecordedCall::CreatePrescription(value));

        if let Some(message) = self.lock().fail_create_prescription.clone() {
            return Err(ApiError::Rejected { message });
        }

        let id = {
            let mut state = self.lock();
            state.created += 1;
            format!("presc-{}", state.created)
        };
        let prescription = Prescription {
            id,
            consultation_id: payload.consultation_id.clone(),
            patient_id: payload.patient_id.clone(),
            doctor_id: payload.doctor_id.clone(),
            created_at: Utc::now(),
            diagnosis: payload.diagnosis.clone(),
            medicines: payload.medicines.clone(),
            lifestyle_recommendations: payload.lifestyle_recommendations.clone(),
            follow_up_notes: payload.follow_up_notes.clone(),
            pdf_url: None,
        };
        self.lock().prescriptions.push(prescription.clone());
        Ok(prescription)
    }

    async fn get_prescriptions_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Prescription>, ApiError> {
        self.record(RecordedCall::GetPrescriptionsByPatient(
            patient_id.to_string(),
        ));
        if let Some(message) = self.lock().fail_lists.clone() {
            return Err(ApiError::Transport(message));
        }
        Ok(self
            .lock()
            .prescriptions
            .iter()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn get_prescription_by_consultation(
        &self,
        consultation_id: &str,
    ) -> Result<Option<Prescription>, ApiError> {
        self.record(RecordedCall::GetPrescriptionByConsultation(
            consultation_id.to_string(),
        ));
        Ok(self
            .lock()
            .prescriptions
            .iter()
            .find(|p| p.consultation_id == consultation_id)
            .cloned())
    }

    async fn get_prescription_by_id(&self, id: &str) -> Result<Option<Prescription>, ApiError> {
        self.record(RecordedCall::GetPrescriptionById(id.to_string()));
        Ok(self
            .lock()
            .prescriptions
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn upload_file(&self, file: &MediaFile) -> Result<UploadedFile, ApiError> {
        self.record(RecordedCall::UploadFile {
            name: file.name.clone(),
        });
        let index = {
            let mut state = self.lock();
            let index = state.uploads_seen;
            state.uploads_seen += 1;
            index
        };
        if let Some((fail_index, message)) = self.lock().fail_upload_at.clone() {
            if index == fail_index {
                return Err(ApiError::Rejected { message });
            }
        }
        Ok(UploadedFile {
            url: format!("/uploads/{}/{}", file.kind.bucket(), file.name),
            kind: file.kind,
        })
    }

    async fn upload_multiple(&self, files: &[MediaFile]) -> Result<Vec<UploadedFile>, ApiError> {
        self.record(RecordedCall::UploadMultiple { count: files.len() });
        Ok(files
            .iter()
            .map(|file| UploadedFile {
                url: format!("/uploads/{}/{}", file.kind.bucket(), file.name),
                kind: file.kind,
            })
            .collect())
    }
}
