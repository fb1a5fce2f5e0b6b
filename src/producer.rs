//! NATS message producer for risk assessments

use crate::types::RiskAssessment;
use anyhow::Result;
use async_nats::Client;
use tracing::{debug, error};

/// Producer for publishing risk assessments to NATS
#[derive(Clone)]
pub struct AssessmentProducer {
    client: Client,
    subject: String,
}

impl AssessmentProducer {
    /// Create a new assessment producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a risk assessment
    pub async fn publish(&self, assessment: &RiskAssessment) -> Result<()> {
        let payload = serde_json::to_vec(assessment)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            assessment_id = %assessment.assessment_id,
            claim_id = %assessment.claim_id,
            score = assessment.score,
            verdict = ?assessment.verdict,
            "Published risk assessment"
        );

        Ok(())
    }

    /// Publish multiple assessments in batch
    pub async fn publish_batch(&self, assessments: &[RiskAssessment]) -> Result<()> {
        for assessment in assessments {
            if let Err(e) = self.publish(assessment).await {
                error!(
                    assessment_id = %assessment.assessment_id,
                    error = %e,
                    "Failed to publish assessment"
                );
            }
        }
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
