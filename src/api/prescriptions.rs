//! Prescription endpoints: create, list by patient, fetch by consultation
//! or by id.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::wire::{self, PrescriptionRecord};
use super::{ApiClient, ApiError};
use crate::models::{Medicine, Prescription};

/// Prescription submission payload, packaged by the authoring surface from
/// the draft plus the consultation's identities.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionPayload {
    pub consultation_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub lifestyle_recommendations: String,
    pub follow_up_notes: String,
}

#[derive(Deserialize)]
struct PrescriptionEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    prescription: Option<PrescriptionRecord>,
}

#[derive(Deserialize)]
struct PrescriptionListEnvelope {
    success: bool,
    #[serde(default)]
    prescriptions: Option<Vec<PrescriptionRecord>>,
}

impl ApiClient {
    pub async fn create_prescription(
        &self,
        payload: &PrescriptionPayload,
    ) -> Result<Prescription, ApiError> {
        let builder = self.request(Method::POST, "/prescriptions")?.json(payload);
        let response = self.send(builder).await?;
        let envelope: PrescriptionEnvelope = Self::parse(response).await?;

        if !envelope.success {
            return Err(ApiError::rejected(
                envelope.message,
                "Failed to generate prescription",
            ));
        }
        let record = envelope
            .prescription
            .ok_or_else(|| ApiError::Decode("prescription envelope missing payload".into()))?;

        let prescription = wire::prescription_from_record(record)?;
        tracing::info!(
            prescription_id = %prescription.id,
            consultation_id = %prescription.consultation_id,
            "prescription created"
        );
        Ok(prescription)
    }

    pub async fn get_prescriptions_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Prescription>, ApiError> {
        let builder = self.request(Method::GET, &format!("/prescriptions/patient/{patient_id}"))?;
        let response = self.send(builder).await?;
        let envelope: PrescriptionListEnvelope = Self::parse(response).await?;

        let records = match (envelope.success, envelope.prescriptions) {
            (true, Some(records)) => records,
            _ => return Ok(Vec::new()),
        };
        records
            .into_iter()
            .map(|r| wire::prescription_from_record(r).map_err(ApiError::from))
            .collect()
    }

    pub async fn get_prescription_by_consultation(
        &self,
        consultation_id: &str,
    ) -> Result<Option<Prescription>, ApiError> {
        self.fetch_prescription(&format!("/prescriptions/consultation/{consultation_id}"))
            .await
    }

    pub async fn get_prescription_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Prescription>, ApiError> {
        self.fetch_prescription(&format!("/prescriptions/{id}")).await
    }

    async fn fetch_prescription(&self, path: &str) -> Result<Option<Prescription>, ApiError> {
        let builder = self.request(Method::GET, path)?;
        let response = self.send(builder).await?;
        let envelope: PrescriptionEnvelope = Self::parse(response).await?;

        match (envelope.success, envelope.prescription) {
            (true, Some(record)) => Ok(Some(wire::prescription_from_record(record)?)),
            _ => Ok(None),
        }
    }
}
