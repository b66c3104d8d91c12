//! Combined anomaly/fraud scorer with a continuous-learning feedback loop.
//!
//! Model state is an immutable [`FittedModel`] snapshot behind
//! `RwLock<Arc<_>>`. Prediction clones the Arc out of the read guard and
//! scores lock-free; retraining fits a complete new snapshot first and
//! only then swaps it in, so a concurrent reader never observes a
//! half-updated model.
//!
//! The feedback buffer is a bounded queue behind one Mutex. Append,
//! threshold check, and drain happen inside a single critical section, so
//! two concurrent submissions can never both believe they crossed the
//! retrain threshold.

use crate::{
    classifier::{ForestParams, RandomForest},
    config::MonitorConfig,
    error::{AmlError, AmlResult},
    features::TransactionFeatures,
    isolation::IsolationForest,
    rng::{ComponentSlot, ModelRng},
    scaler::StandardScaler,
    synthetic::{self, LabeledExample},
    types::TransactionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

/// Snapshot name under which the AML scorer persists its model.
pub const MODEL_SNAPSHOT_NAME: &str = "aml_fraud_scorer";

/// A fully fitted, immutable model snapshot. Replaced wholesale on
/// retrain, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub outlier: IsolationForest,
    /// Absent when the training set had a single class.
    pub classifier: Option<RandomForest>,
    pub feature_names: Vec<String>,
    /// Monotonically increasing across retrains.
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
}

/// Per-prediction explanation returned alongside the combined score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreExplanation {
    /// Signed outlier decision function (negative = outlier side).
    pub anomaly_score: f64,
    pub is_outlier: bool,
    pub fraud_probability: f64,
    pub combined_score: f64,
    pub feature_importance: BTreeMap<String, f64>,
    pub model_version: u32,
    /// Set when scoring failed and the neutral fallback was returned.
    pub error: Option<String>,
}

/// One buffered analyst verdict awaiting the next retrain.
#[derive(Debug, Clone)]
struct FeedbackEntry {
    transaction_id: TransactionId,
    features: TransactionFeatures,
    is_fraud: bool,
    /// Score the model gave at alert time, kept to report how often the
    /// analysts contradicted it.
    predicted_score: f64,
}

pub struct FraudScorer {
    config: MonitorConfig,
    model: RwLock<Option<Arc<FittedModel>>>,
    feedback: Mutex<VecDeque<FeedbackEntry>>,
}

impl FraudScorer {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
            feedback: Mutex::new(VecDeque::new()),
        }
    }

    /// Restore a scorer from a persisted snapshot.
    pub fn from_snapshot(config: MonitorConfig, snapshot: FittedModel) -> Self {
        let scorer = Self::new(config);
        scorer.install(Arc::new(snapshot));
        scorer
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().expect("model lock poisoned").is_some()
    }

    pub fn model_version(&self) -> u32 {
        self.model
            .read()
            .expect("model lock poisoned")
            .as_ref()
            .map_or(0, |m| m.version)
    }

    /// Current snapshot, if fitted.
    pub fn snapshot(&self) -> Option<Arc<FittedModel>> {
        self.model.read().expect("model lock poisoned").clone()
    }

    pub fn feedback_len(&self) -> usize {
        self.feedback.lock().expect("feedback lock poisoned").len()
    }

    fn install(&self, snapshot: Arc<FittedModel>) {
        *self.model.write().expect("model lock poisoned") = Some(snapshot);
    }

    /// Ensure a model exists, bootstrap-training on synthetic data when
    /// nothing has been loaded. Returns the freshly fitted snapshot when
    /// one was created, so the caller can persist it.
    pub fn ensure_trained(&self) -> AmlResult<Option<Arc<FittedModel>>> {
        // Write lock serializes the check-and-train so two callers cannot
        // both bootstrap.
        let mut guard = self.model.write().expect("model lock poisoned");
        if guard.is_some() {
            return Ok(None);
        }
        log::warn!(
            "fraud scorer has no model; bootstrap-training on synthetic data \
             (placeholder — supply a historical corpus in production)"
        );
        let mut rng = ModelRng::for_component(self.config.seed, ComponentSlot::BootstrapData);
        let examples = synthetic::bootstrap_transactions(&mut rng);
        let fitted = Arc::new(self.fit(&examples, 1)?);
        *guard = Some(fitted.clone());
        Ok(Some(fitted))
    }

    /// Train on the given labeled examples and atomically swap the result
    /// in as the live model. Returns the new snapshot for persistence.
    pub fn train(&self, examples: &[LabeledExample]) -> AmlResult<Arc<FittedModel>> {
        let version = self.model_version() + 1;
        let fitted = Arc::new(self.fit(examples, version)?);
        self.install(fitted.clone());
        Ok(fitted)
    }

    fn fit(&self, examples: &[LabeledExample], version: u32) -> AmlResult<FittedModel> {
        if examples.is_empty() {
            return Err(AmlError::Scoring {
                reason: "empty training set".into(),
            });
        }

        let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.to_vector()).collect();
        let labels: Vec<usize> = examples.iter().map(|e| usize::from(e.is_fraud)).collect();

        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform_all(&rows);

        let mut iso_rng = ModelRng::for_component(self.config.seed, ComponentSlot::OutlierForest);
        let outlier = IsolationForest::fit(
            &scaled,
            self.config.n_estimators,
            self.config.contamination,
            &mut iso_rng,
        );

        // The classifier needs both classes; a one-sided batch still
        // refreshes the outlier model.
        let classifier = if labels.iter().any(|&l| l == 0) && labels.iter().any(|&l| l == 1) {
            let mut clf_rng =
                ModelRng::for_component(self.config.seed, ComponentSlot::FraudClassifier);
            Some(RandomForest::fit(
                &scaled,
                &labels,
                ForestParams::new(self.config.n_estimators, 2),
                &mut clf_rng,
            ))
        } else {
            log::warn!("training batch has a single class; keeping no fraud classifier");
            None
        };

        log::info!(
            "fraud scorer trained: version {version}, {} samples",
            examples.len()
        );

        Ok(FittedModel {
            scaler,
            outlier,
            classifier,
            feature_names: TransactionFeatures::feature_names(),
            version,
            trained_at: Utc::now(),
            training_samples: examples.len(),
        })
    }

    /// Score a transaction's features. Never fails: any internal error
    /// degrades to the neutral score 0.5 with an error explanation, so a
    /// scoring hiccup cannot block the transaction pipeline.
    pub fn predict(&self, features: &TransactionFeatures) -> (f64, ScoreExplanation) {
        match self.try_predict(features) {
            Ok(result) => result,
            Err(err) => {
                log::error!(
                    "scoring failed for {}: {err}; returning neutral score",
                    features.transaction_id
                );
                (
                    0.5,
                    ScoreExplanation {
                        anomaly_score: 0.0,
                        is_outlier: false,
                        fraud_probability: 0.5,
                        combined_score: 0.5,
                        feature_importance: BTreeMap::new(),
                        model_version: self.model_version(),
                        error: Some(err.to_string()),
                    },
                )
            }
        }
    }

    fn try_predict(&self, features: &TransactionFeatures) -> AmlResult<(f64, ScoreExplanation)> {
        // Only an untrained scorer takes the bootstrap write lock; an
        // installed snapshot is reused straight off the read guard.
        let model = match self.snapshot() {
            Some(model) => model,
            None => {
                self.ensure_trained()?;
                self.snapshot().ok_or_else(|| AmlError::Scoring {
                    reason: "model missing after bootstrap".into(),
                })?
            }
        };

        let raw = features.to_vector();
        if raw.len() != model.scaler.dim() {
            return Err(AmlError::Scoring {
                reason: format!(
                    "feature dimension {} does not match fitted model {}",
                    raw.len(),
                    model.scaler.dim()
                ),
            });
        }
        let scaled = model.scaler.transform(&raw);

        let anomaly_score = model.outlier.decision_function(&scaled);
        let is_outlier = model.outlier.is_outlier(&scaled);

        let fraud_probability = model
            .classifier
            .as_ref()
            .map_or(0.5, |clf| clf.predict_proba(&scaled)[1]);

        let combined_score =
            ((anomaly_score.abs() + fraud_probability) / 2.0).clamp(0.0, 1.0);

        let feature_importance: BTreeMap<String, f64> = match &model.classifier {
            Some(clf) => model
                .feature_names
                .iter()
                .cloned()
                .zip(clf.feature_importances().iter().copied())
                .collect(),
            None => BTreeMap::new(),
        };

        Ok((
            combined_score,
            ScoreExplanation {
                anomaly_score,
                is_outlier,
                fraud_probability,
                combined_score,
                feature_importance,
                model_version: model.version,
                error: None,
            },
        ))
    }

    /// Buffer one analyst verdict. When the buffer reaches the retrain
    /// threshold, retrains on the buffered examples only, bumps the model
    /// version, clears the buffer, and returns the new snapshot for
    /// persistence. Below the minimum-sample guard the retrain is skipped
    /// and the buffer is kept.
    pub fn add_feedback(
        &self,
        transaction_id: TransactionId,
        features: TransactionFeatures,
        is_fraud: bool,
        predicted_score: f64,
    ) -> AmlResult<Option<Arc<FittedModel>>> {
        let mut buffer = self.feedback.lock().expect("feedback lock poisoned");

        if buffer.len() == self.config.feedback_capacity {
            buffer.pop_front();
        }
        buffer.push_back(FeedbackEntry {
            transaction_id,
            features,
            is_fraud,
            predicted_score,
        });

        if buffer.len() < self.config.retrain_threshold {
            return Ok(None);
        }

        let usable: Vec<LabeledExample> = buffer
            .iter()
            .filter(|e| e.features.amount.is_finite())
            .map(|e| LabeledExample {
                features: e.features.clone(),
                is_fraud: e.is_fraud,
            })
            .collect();

        if usable.len() < self.config.min_retrain_samples {
            log::warn!(
                "retrain skipped: {} usable examples below minimum {}",
                usable.len(),
                self.config.min_retrain_samples
            );
            return Ok(None);
        }

        // Verdicts on the wrong side of the 0.5 line are the ones the
        // retrain exists to correct.
        let contradicted: Vec<TransactionId> = buffer
            .iter()
            .filter(|e| (e.predicted_score >= 0.5) != e.is_fraud)
            .map(|e| e.transaction_id.clone())
            .collect();
        let buffered = buffer.len();

        // Fit before clearing: a failed fit keeps both the old model and
        // the buffer, to be retried at the next threshold crossing.
        let fitted = self.train(&usable)?;
        buffer.clear();
        log::info!(
            "fraud scorer retrained from feedback: version {}, {}/{buffered} verdicts \
             contradicted the prior model",
            fitted.version,
            contradicted.len()
        );
        log::debug!("contradicted transactions: {contradicted:?}");
        Ok(Some(fitted))
    }
}
