//! Patient and doctor dashboards.
//!
//! Each dashboard is a snapshot loaded once on entry: the patient side
//! fetches consultations and prescriptions concurrently, the doctor
//! side fetches the consultation queue. A failed fetch leaves that list
//! empty rather than failing the whole page, so loading always ends in
//! a renderable state.

use crate::api::PortalApi;
use crate::models::{Consultation, ConsultationStatus, Prescription};

/// Shown on a patient's consultation card while a doctor has it open.
pub const REVIEW_IN_PROGRESS_NOTE: &str =
    "Your consultation is being reviewed by our expert doctors. You'll receive your prescription soon.";

// ═══════════════════════════════════════════════════════════
// Badges and placeholder actions
// ═══════════════════════════════════════════════════════════

/// Visual tone of a badge. `Neutral` is the tone of informational
/// badges (cycle, diagnosis, medicine duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeTone {
    Yellow,
    Blue,
    Green,
    #[default]
    Neutral,
}

impl BadgeTone {
    /// Tone of a consultation status badge.
    pub fn for_status(status: ConsultationStatus) -> Self {
        match status {
            ConsultationStatus::Pending => Self::Yellow,
            ConsultationStatus::InReview => Self::Blue,
            ConsultationStatus::Completed => Self::Green,
        }
    }
}

/// Delivery actions on a prescription card. Both are placeholders that
/// render disabled; the backend does not populate `pdf_url` yet and no
/// messaging integration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryAction {
    DownloadPdf,
    SendWhatsApp,
}

impl DeliveryAction {
    pub const ALL: [Self; 2] = [Self::DownloadPdf, Self::SendWhatsApp];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DownloadPdf => "Download PDF",
            Self::SendWhatsApp => "Send to WhatsApp",
        }
    }

    pub fn is_enabled(&self) -> bool {
        false
    }
}

// ═══════════════════════════════════════════════════════════
// Patient dashboard
// ═══════════════════════════════════════════════════════════

/// Counts for the patient's stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatientStats {
    pub total_consultations: usize,
    pub active_prescriptions: usize,
}

/// One entry of the patient's consultation list, paired with its
/// prescription when one exists.
#[derive(Debug, Clone)]
pub struct ConsultationCard<'a> {
    pub consultation: &'a Consultation,
    pub badge: BadgeTone,
    pub prescription: Option<&'a Prescription>,
}

impl ConsultationCard<'_> {
    /// The prescription section only shows once the consultation is
    /// completed, even if the prescription record already exists.
    pub fn prescription_available(&self) -> bool {
        self.prescription.is_some() && self.consultation.status == ConsultationStatus::Completed
    }

    /// [`REVIEW_IN_PROGRESS_NOTE`] while a doctor has the case open.
    pub fn review_note(&self) -> Option<&'static str> {
        (self.consultation.status == ConsultationStatus::InReview)
            .then_some(REVIEW_IN_PROGRESS_NOTE)
    }
}

/// The patient's two tabs: consultation history and prescriptions.
pub struct PatientDashboard {
    consultations: Vec<Consultation>,
    prescriptions: Vec<Prescription>,
}

impl PatientDashboard {
    /// Fetch both lists concurrently. Either one failing logs a warning
    /// and leaves that list empty.
    pub async fn load<P: PortalApi>(api: &P, patient_id: &str) -> Self {
        let (consultations, prescriptions) = tokio::join!(
            api.get_consultations_for_patient(),
            api.get_prescriptions_by_patient(patient_id),
        );
        let consultations = consultations.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "consultation list fetch failed");
            Vec::new()
        });
        let prescriptions = prescriptions.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "prescription list fetch failed");
            Vec::new()
        });
        tracing::debug!(
            consultations = consultations.len(),
            prescriptions = prescriptions.len(),
            "patient dashboard loaded"
        );
        Self {
            consultations,
            prescriptions,
        }
    }

    /// Consultations in the order the backend returned them.
    pub fn consultations(&self) -> &[Consultation] {
        &self.consultations
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn stats(&self) -> PatientStats {
        PatientStats {
            total_consultations: self.consultations.len(),
            active_prescriptions: self.prescriptions.len(),
        }
    }

    /// The prescription issued for one consultation, if any.
    pub fn prescription_for(&self, consultation_id: &str) -> Option<&Prescription> {
        self.prescriptions
            .iter()
            .find(|p| p.consultation_id == consultation_id)
    }

    /// Status-badged cards for the consultations tab, in list order.
    pub fn cards(&self) -> Vec<ConsultationCard<'_>> {
        self.consultations
            .iter()
            .map(|consultation| ConsultationCard {
                consultation,
                badge: BadgeTone::for_status(consultation.status),
                prescription: self.prescription_for(&consultation.id),
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Doctor dashboard
// ═══════════════════════════════════════════════════════════

/// Counts for the doctor's stat cards. `total_patients` is the number
/// of distinct patients across the queue; the backend has no patient
/// list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctorStats {
    pub total_patients: usize,
    pub pending: usize,
    pub in_review: usize,
    pub completed: usize,
}

/// The doctor's consultation queue feeding the detail view.
pub struct DoctorDashboard {
    consultations: Vec<Consultation>,
}

impl DoctorDashboard {
    /// Fetch the queue; a failure logs a warning and leaves it empty.
    pub async fn load<P: PortalApi>(api: &P) -> Self {
        let consultations = api.get_consultations_for_doctor().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "doctor queue fetch failed");
            Vec::new()
        });
        tracing::debug!(consultations = consultations.len(), "doctor dashboard loaded");
        Self { consultations }
    }

    /// Consultations in the order the backend returned them.
    pub fn consultations(&self) -> &[Consultation] {
        &self.consultations
    }

    pub fn stats(&self) -> DoctorStats {
        let mut patients: Vec<&str> = self
            .consultations
            .iter()
            .map(|c| c.patient_id.as_str())
            .collect();
        patients.sort_unstable();
        patients.dedup();

        let count = |status| {
            self.consultations
                .iter()
                .filter(|c| c.status == status)
                .count()
        };
        DoctorStats {
            total_patients: patients.len(),
            pending: count(ConsultationStatus::Pending),
            in_review: count(ConsultationStatus::InReview),
            completed: count(ConsultationStatus::Completed),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
