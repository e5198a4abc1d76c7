//! Consultation endpoints: create, list (patient/doctor), fetch one,
//! update status.
//!
//! Outbound payloads are camelCase per the backend contract; inbound
//! records go through the `wire` adapter. List fetches fail soft — a
//! non-success envelope is an empty list — while the create and
//! status-update mutations always surface rejection.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::wire::{self, ConsultationRecord};
use super::{ApiClient, ApiError};
use crate::models::{Consultation, ConsultationStatus};

/// Consultation submission payload, assembled by the intake workflow after
/// all media uploads have succeeded. `media` carries durable URLs only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationPayload {
    pub basic_details: BasicDetailsPayload,
    pub symptoms: SymptomsPayload,
    pub medical_history: MedicalHistoryPayload,
    pub media: MediaPayload,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDetailsPayload {
    pub age: u32,
    pub height: u32,
    pub weight: u32,
    pub menstrual_cycle_regularity: String,
}

/// `other` is omitted entirely when the patient typed nothing; the backend
/// distinguishes "absent" from "empty string".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomsPayload {
    pub irregular_periods: bool,
    pub acne: bool,
    pub weight_gain: bool,
    pub hair_loss: bool,
    pub facial_hair: bool,
    pub mood_changes: bool,
    pub fatigue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryPayload {
    pub previous_diagnosis: String,
    pub medications: String,
    pub reports_available: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
    pub images: Vec<String>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

#[derive(Deserialize)]
struct ConsultationEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    consultation: Option<ConsultationRecord>,
}

#[derive(Deserialize)]
struct ConsultationListEnvelope {
    success: bool,
    #[serde(default)]
    consultations: Option<Vec<ConsultationRecord>>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    pub async fn create_consultation(
        &self,
        payload: &ConsultationPayload,
    ) -> Result<Consultation, ApiError> {
        let builder = self.request(Method::POST, "/consultations")?.json(payload);
        let response = self.send(builder).await?;
        let envelope: ConsultationEnvelope = Self::parse(response).await?;

        if !envelope.success {
            return Err(ApiError::rejected(
                envelope.message,
                "Failed to submit consultation",
            ));
        }
        let record = envelope
            .consultation
            .ok_or_else(|| ApiError::Decode("consultation envelope missing payload".into()))?;

        let consultation = wire::consultation_from_record(record)?;
        tracing::info!(consultation_id = %consultation.id, "consultation created");
        Ok(consultation)
    }

    pub async fn get_consultations_for_patient(&self) -> Result<Vec<Consultation>, ApiError> {
        self.fetch_consultation_list("/consultations/patient").await
    }

    pub async fn get_consultations_for_doctor(&self) -> Result<Vec<Consultation>, ApiError> {
        self.fetch_consultation_list("/consultations/doctor").await
    }

    pub async fn get_consultation_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Consultation>, ApiError> {
        let builder = self.request(Method::GET, &format!("/consultations/{id}"))?;
        let response = self.send(builder).await?;
        let envelope: ConsultationEnvelope = Self::parse(response).await?;

        match (envelope.success, envelope.consultation) {
            (true, Some(record)) => Ok(Some(wire::consultation_from_record(record)?)),
            _ => Ok(None),
        }
    }

    pub async fn update_consultation_status(
        &self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<(), ApiError> {
        let body = StatusBody {
            status: status.as_str(),
        };
        let builder = self
            .request(Method::PATCH, &format!("/consultations/{id}/status"))?
            .json(&body);
        let response = self.send(builder).await?;
        let envelope: StatusEnvelope = Self::parse(response).await?;

        if !envelope.success {
            return Err(ApiError::rejected(
                envelope.message,
                "Failed to update consultation status",
            ));
        }
        tracing::info!(consultation_id = %id, status = status.as_str(), "status updated");
        Ok(())
    }

    async fn fetch_consultation_list(&self, path: &str) -> Result<Vec<Consultation>, ApiError> {
        let builder = self.request(Method::GET, path)?;
        let response = self.send(builder).await?;
        let envelope: ConsultationListEnvelope = Self::parse(response).await?;

        let records = match (envelope.success, envelope.consultations) {
            (true, Some(records)) => records,
            _ => return Ok(Vec::new()),
        };
        records
            .into_iter()
            .map(|r| wire::consultation_from_record(r).map_err(ApiError::from))
            .collect()
    }
}
