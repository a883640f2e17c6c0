//! Churn prediction service
//!
//! A `ChurnService` only exists once an artifact pair has loaded and passed
//! its consistency checks. Requests never mutate it, so one instance is
//! shared across handlers behind an `Arc`.

use crate::artifacts::{ArtifactStore, ModelArtifacts};
use crate::error::{ArtifactLoadError, PredictError};
use crate::schema::CustomerRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Label returned when the customer is predicted to leave
pub const CHURN: &str = "Churn";
/// Label returned otherwise
pub const NO_CHURN: &str = "No Churn";

/// Response for one scored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// `"Churn"` or `"No Churn"`
    pub prediction: String,
    /// Churn probability rounded to two decimals
    pub probability: f64,
}

impl PredictionResult {
    fn new(label: u8, probability: f64) -> Self {
        let prediction = if label == 1 { CHURN } else { NO_CHURN };
        Self {
            prediction: prediction.to_string(),
            probability: (probability * 100.0).round() / 100.0,
        }
    }

    pub fn is_churn(&self) -> bool {
        self.prediction == CHURN
    }
}

/// Ready-state inference service
#[derive(Debug)]
pub struct ChurnService {
    artifacts: ModelArtifacts,
}

impl ChurnService {
    /// Load the artifact pair from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let artifacts = ArtifactStore::new(dir.as_ref()).load()?;
        Self::from_artifacts(artifacts)
    }

    /// Wrap an in-memory pair, applying the same checks as a load.
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, ArtifactLoadError> {
        artifacts.check_compatible()?;
        info!(
            run_id = %artifacts.run_id,
            n_features = artifacts.transformer.n_features(),
            "Churn service ready"
        );
        Ok(Self { artifacts })
    }

    /// Validate, transform and score an untyped JSON record.
    pub fn predict_json(&self, raw: &Value) -> Result<PredictionResult, PredictError> {
        let record = CustomerRecord::from_json(raw)?;
        self.predict(&record)
    }

    /// Transform and score a typed record.
    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult, PredictError> {
        let features = self.artifacts.transformer.transform(record)?;
        let (label, probability) = self.artifacts.classifier.predict_row(features.view())?;

        debug!(label, probability, "Scored record");
        Ok(PredictionResult::new(label, probability))
    }

    /// Score each record independently; one failure does not affect the rest.
    pub fn predict_batch(&self, raw: &[Value]) -> Vec<Result<PredictionResult, PredictError>> {
        raw.iter().map(|value| self.predict_json(value)).collect()
    }

    pub fn run_id(&self) -> &str {
        &self.artifacts.run_id
    }

    pub fn n_features(&self) -> usize {
        self.artifacts.transformer.n_features()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.artifacts.transformer.feature_names()
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::preprocessing::{ColumnRoles, FeatureTransformer};
    use crate::training::RandomForest;
    use ndarray::Array1;
    use serde_json::json;

    fn record(i: i64) -> CustomerRecord {
        CustomerRecord {
            credit_score: 450 + (i * 37) % 400,
            geography: ["France", "Germany", "Spain"][(i % 3) as usize].to_string(),
            gender: if i % 2 == 0 { "Female" } else { "Male" }.to_string(),
            age: 18 + (i * 7) % 60,
            tenure: i % 11,
            balance: ((i * 4211) % 150_000) as f64,
            num_of_products: 1 + i % 4,
            has_cr_card: (i % 2) as u8,
            is_active_member: ((i / 3) % 2) as u8,
            estimated_salary: 20_000.0 + ((i * 977) % 100_000) as f64,
        }
    }

    fn service() -> ChurnService {
        let table: Vec<CustomerRecord> = (0..120).map(record).collect();
        let labels = Array1::from_iter(table.iter().map(|r| u8::from(r.age > 50)));
        let (transformer, x) = FeatureTransformer::fit_transform(ColumnRoles::customer(), &table).unwrap();
        let mut forest = RandomForest::new(10);
        forest.fit(&x, &labels).unwrap();
        ChurnService::from_artifacts(ModelArtifacts::new("run-test", transformer, forest)).unwrap()
    }

    fn payload(age: i64) -> Value {
        json!({
            "CreditScore": 650,
            "Geography": "France",
            "Gender": "Female",
            "Age": age,
            "Tenure": 5,
            "Balance": 0.0,
            "NumOfProducts": 2,
            "HasCrCard": 1,
            "IsActiveMember": 1,
            "EstimatedSalary": 50000
        })
    }

    #[test]
    fn test_predict_json() {
        let service = service();
        let old = service.predict_json(&payload(70)).unwrap();
        let young = service.predict_json(&payload(25)).unwrap();

        assert!(old.is_churn());
        assert!(!young.is_churn());
        assert!(old.probability >= 0.5);
        assert_eq!((old.probability * 100.0).round() / 100.0, old.probability);
    }

    #[test]
    fn test_json_and_typed_paths_agree() {
        let service = service();
        let raw = payload(44);
        let typed = CustomerRecord::from_json(&raw).unwrap();
        assert_eq!(service.predict_json(&raw).unwrap(), service.predict(&typed).unwrap());
    }

    #[test]
    fn test_validation_error_kind() {
        let service = service();
        let mut raw = payload(40);
        raw.as_object_mut().unwrap().remove("CreditScore");

        let err = service.predict_json(&raw).unwrap_err();
        assert_eq!(err, PredictError::Validation(ValidationError::MissingField("CreditScore")));
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_transform_error_kind() {
        let service = service();
        let mut raw = payload(40);
        raw["Geography"] = json!("Italy");

        let err = service.predict_json(&raw).unwrap_err();
        assert_eq!(err.kind(), "transform");
    }

    #[test]
    fn test_batch_is_independent() {
        let service = service();
        let mut bad = payload(40);
        bad["Gender"] = json!(3);

        let results = service.predict_batch(&[payload(70), bad, payload(25)]);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().is_churn());
        assert!(matches!(results[1], Err(PredictError::Validation(_))));
        assert!(!results[2].as_ref().unwrap().is_churn());
    }

    #[test]
    fn test_rejects_incompatible_pair() {
        let table: Vec<CustomerRecord> = (0..12).map(record).collect();
        let transformer = FeatureTransformer::fit(ColumnRoles::customer(), &table).unwrap();
        let mut forest = RandomForest::new(2);
        forest
            .fit(&ndarray::Array2::zeros((4, 2)), &Array1::from_vec(vec![0, 1, 0, 1]))
            .unwrap();

        let err = ChurnService::from_artifacts(ModelArtifacts::new("r", transformer, forest)).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::FeatureMismatch { .. }));
    }
}
