//! Consultation intake workflow.
//!
//! Four form steps gathered into one draft — basic details, symptoms,
//! medical history, media — then a single submission pass: every media
//! file is uploaded sequentially, the durable URLs are bucketed by
//! kind, and one consultation is created from the assembled payload.
//!
//! The draft is the union of all step data, so navigating backwards and
//! forwards never loses anything. The first upload failure aborts the
//! whole submission before any consultation exists server-side, which
//! is why there is no rollback path. Local media URLs live exactly as
//! long as the workflow: removal, discard, and drop all revoke them.

use std::time::Duration;

use uuid::Uuid;

use crate::api::consultations::{
    BasicDetailsPayload, MedicalHistoryPayload, MediaPayload, SymptomsPayload,
};
use crate::api::{ApiError, ConsultationPayload, PortalApi};
use crate::capture::ObjectUrlRegistry;
use crate::config;
use crate::models::{BasicDetails, Consultation, MediaFile, MediaKind, ReportsAvailable, Symptoms};
use crate::models::PreviousDiagnosis;
use crate::routes::Route;

/// Form steps shown in the progress header.
pub const FORM_STEP_COUNT: u8 = 4;

const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields (age, height, weight).";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStep {
    BasicDetails,
    Symptoms,
    MedicalHistory,
    MediaUpload,
    /// Uploads and consultation creation in flight; the submit action
    /// is disabled while here.
    Submitting,
    /// Terminal for this draft; a redirect to the patient dashboard has
    /// been scheduled.
    Submitted,
}

impl IntakeStep {
    /// 1-based position in the progress header, `None` once past the form.
    pub fn number(&self) -> Option<u8> {
        match self {
            Self::BasicDetails => Some(1),
            Self::Symptoms => Some(2),
            Self::MedicalHistory => Some(3),
            Self::MediaUpload => Some(4),
            Self::Submitting | Self::Submitted => None,
        }
    }

    pub fn title(&self) -> Option<&'static str> {
        match self {
            Self::BasicDetails => Some("Basic Details"),
            Self::Symptoms => Some("Symptoms"),
            Self::MedicalHistory => Some("Medical History"),
            Self::MediaUpload => Some("Upload Reports"),
            Self::Submitting | Self::Submitted => None,
        }
    }

    pub fn subtitle(&self) -> Option<&'static str> {
        match self {
            Self::BasicDetails => Some("Tell us about your basic health information"),
            Self::Symptoms => Some("Select all symptoms you're experiencing"),
            Self::MedicalHistory => Some("Share your medical history with us"),
            Self::MediaUpload => Some("Upload any relevant medical reports or documents"),
            Self::Submitting | Self::Submitted => None,
        }
    }
}

/// Step-3 form state. `reports_available` stays the yes/no selection
/// until submission, where it is coerced to a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalHistoryForm {
    pub previous_diagnosis: PreviousDiagnosis,
    pub medications: String,
    pub reports_available: ReportsAvailable,
}

impl Default for MedicalHistoryForm {
    fn default() -> Self {
        Self {
            previous_diagnosis: PreviousDiagnosis::NotDiagnosed,
            medications: String::new(),
            reports_available: ReportsAvailable::No,
        }
    }
}

/// The union of everything entered across the four steps.
#[derive(Debug, Clone)]
pub struct IntakeDraft {
    pub basic_details: BasicDetails,
    pub symptoms: Symptoms,
    pub medical_history: MedicalHistoryForm,
    pub media: Vec<MediaFile>,
    pub language: String,
}

impl Default for IntakeDraft {
    fn default() -> Self {
        Self {
            basic_details: BasicDetails::default(),
            symptoms: Symptoms::default(),
            medical_history: MedicalHistoryForm::default(),
            media: Vec::new(),
            language: config::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// A navigation the embedder should perform after showing the success
/// message for `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRedirect {
    pub route: Route,
    pub delay: Duration,
}

impl ScheduledRedirect {
    /// Wait out the delay, then yield the destination.
    pub async fn perform(self) -> Route {
        tokio::time::sleep(self.delay).await;
        self.route
    }
}

/// Errors from the intake workflow.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("{0}")]
    Validation(String),

    /// One media upload failed; nothing was created server-side.
    #[error("Failed to upload {name}: {source}")]
    Upload { name: String, source: ApiError },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Submission is only available from the upload step")]
    NotOnUploadStep,
}

// ═══════════════════════════════════════════════════════════
// IntakeFlow
// ═══════════════════════════════════════════════════════════

/// The four-step consultation draft and its submission.
///
/// Holds the shared object-URL registry so that every local URL minted
/// for a draft attachment is revoked when the attachment is removed or
/// the workflow ends, on every path.
pub struct IntakeFlow<P: PortalApi> {
    api: P,
    urls: ObjectUrlRegistry,
    step: IntakeStep,
    draft: IntakeDraft,
    validation_message: Option<String>,
    submit_error: Option<String>,
    redirect: Option<ScheduledRedirect>,
}

impl<P: PortalApi> IntakeFlow<P> {
    /// Start a fresh draft on step 1. `urls` must be the registry that
    /// minted (or will mint) the draft's local media URLs.
    pub fn new(api: P, urls: ObjectUrlRegistry) -> Self {
        Self {
            api,
            urls,
            step: IntakeStep::BasicDetails,
            draft: IntakeDraft::default(),
            validation_message: None,
            submit_error: None,
            redirect: None,
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn draft(&self) -> &IntakeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut IntakeDraft {
        &mut self.draft
    }

    /// Inline message for missing step-1 fields, cleared on a
    /// successful advance.
    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    /// Persistent banner for the last failed submission.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Set after a successful submission.
    pub fn scheduled_redirect(&self) -> Option<&ScheduledRedirect> {
        self.redirect.as_ref()
    }

    // ── Navigation ──────────────────────────────────────────

    /// Advance one step. From step 1 this is gated on age, height and
    /// weight being present and non-zero; later form steps advance
    /// unconditionally.
    pub fn next(&mut self) {
        match self.step {
            IntakeStep::BasicDetails => match self.validate_basic_details() {
                Ok(()) => {
                    self.validation_message = None;
                    self.step = IntakeStep::Symptoms;
                }
                Err(message) => self.validation_message = Some(message),
            },
            IntakeStep::Symptoms => self.step = IntakeStep::MedicalHistory,
            IntakeStep::MedicalHistory => self.step = IntakeStep::MediaUpload,
            IntakeStep::MediaUpload | IntakeStep::Submitting | IntakeStep::Submitted => {}
        }
    }

    /// Go back one step. Entered data is kept; the draft is shared
    /// across steps, not stored per step.
    pub fn back(&mut self) {
        self.step = match self.step {
            IntakeStep::Symptoms => IntakeStep::BasicDetails,
            IntakeStep::MedicalHistory => IntakeStep::Symptoms,
            IntakeStep::MediaUpload => IntakeStep::MedicalHistory,
            other => other,
        };
    }

    // ── Media ───────────────────────────────────────────────

    /// Append captured or picked files to the draft.
    pub fn add_media(&mut self, files: Vec<MediaFile>) {
        self.draft.media.extend(files);
    }

    /// Remove one attachment and revoke its local URL. Returns `false`
    /// if no attachment has that id.
    pub fn remove_media(&mut self, id: Uuid) -> bool {
        let Some(position) = self.draft.media.iter().position(|f| f.id == id) else {
            return false;
        };
        let file = self.draft.media.remove(position);
        self.urls.revoke(&file.local_url);
        true
    }

    // ── Submission ──────────────────────────────────────────

    /// Upload every draft attachment in order, then create the
    /// consultation.
    ///
    /// The first upload failure aborts everything after it, including
    /// consultation creation; the error names the offending file. On
    /// success the workflow is terminal and a redirect to the patient
    /// dashboard is scheduled after [`config::REDIRECT_DELAY`].
    pub async fn submit(&mut self) -> Result<Consultation, IntakeError> {
        if self.step != IntakeStep::MediaUpload {
            return Err(IntakeError::NotOnUploadStep);
        }
        if let Err(message) = self.validate_basic_details() {
            self.validation_message = Some(message.clone());
            return Err(IntakeError::Validation(message));
        }

        self.step = IntakeStep::Submitting;
        self.submit_error = None;

        match self.run_submission().await {
            Ok(consultation) => {
                self.step = IntakeStep::Submitted;
                self.redirect = Some(ScheduledRedirect {
                    route: Route::PatientDashboard,
                    delay: config::REDIRECT_DELAY,
                });
                tracing::info!(consultation_id = %consultation.id, "consultation submitted");
                Ok(consultation)
            }
            Err(err) => {
                self.step = IntakeStep::MediaUpload;
                self.submit_error = Some(err.to_string());
                tracing::warn!(error = %err, "consultation submission failed");
                Err(err)
            }
        }
    }

    /// End the workflow without submitting, revoking all local URLs.
    pub fn discard(mut self) {
        self.release_media_urls();
    }

    async fn run_submission(&self) -> Result<Consultation, IntakeError> {
        let mut media = MediaPayload::default();
        for file in &self.draft.media {
            let uploaded = self
                .api
                .upload_file(file)
                .await
                .map_err(|source| IntakeError::Upload {
                    name: file.name.clone(),
                    source,
                })?;
            match file.kind {
                MediaKind::Image => media.images.push(uploaded.url),
                MediaKind::Audio => media.audio.push(uploaded.url),
                MediaKind::Video => media.video.push(uploaded.url),
            }
            tracing::debug!(name = %file.name, "media uploaded");
        }

        let payload = self.build_payload(media);
        Ok(self.api.create_consultation(&payload).await?)
    }

    fn build_payload(&self, media: MediaPayload) -> ConsultationPayload {
        let draft = &self.draft;
        ConsultationPayload {
            basic_details: BasicDetailsPayload {
                age: draft.basic_details.age,
                height: draft.basic_details.height_cm,
                weight: draft.basic_details.weight_kg,
                menstrual_cycle_regularity: draft
                    .basic_details
                    .menstrual_cycle
                    .as_str()
                    .to_string(),
            },
            symptoms: SymptomsPayload {
                irregular_periods: draft.symptoms.irregular_periods,
                acne: draft.symptoms.acne,
                weight_gain: draft.symptoms.weight_gain,
                hair_loss: draft.symptoms.hair_loss,
                facial_hair: draft.symptoms.facial_hair,
                mood_changes: draft.symptoms.mood_changes,
                fatigue: draft.symptoms.fatigue,
                // An untouched field stays "" and is omitted entirely.
                other: if draft.symptoms.other.is_empty() {
                    None
                } else {
                    Some(draft.symptoms.other.clone())
                },
            },
            medical_history: MedicalHistoryPayload {
                previous_diagnosis: draft
                    .medical_history
                    .previous_diagnosis
                    .as_str()
                    .to_string(),
                medications: draft.medical_history.medications.clone(),
                reports_available: draft.medical_history.reports_available
                    == ReportsAvailable::Yes,
            },
            media,
            language: draft.language.clone(),
        }
    }

    fn validate_basic_details(&self) -> Result<(), String> {
        let details = &self.draft.basic_details;
        if details.age == 0 || details.height_cm == 0 || details.weight_kg == 0 {
            return Err(REQUIRED_FIELDS_MESSAGE.to_string());
        }
        Ok(())
    }

    fn release_media_urls(&mut self) {
        for file in self.draft.media.drain(..) {
            self.urls.revoke(&file.local_url);
        }
    }
}

impl<P: PortalApi> Drop for IntakeFlow<P> {
    /// Teardown on any path revokes whatever local URLs remain.
    fn drop(&mut self) {
        self.release_media_urls();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
