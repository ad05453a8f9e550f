//! Request orchestration over the preprocessing, forecast, anomaly and
//! registry components.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anomaly_facade::{
    detector_for, evaluate, recommend_detector, AnomalyDetector, AnomalyMetrics, AnomalyReport,
    AnyDetector, ConsensusMerger, DetectorFailure, DetectorKind, FitSummary, UnionConsensus,
};
use forecast_facade::{
    recommend_forecaster, rmse, AnyForecaster, AutocorrelationDetector, EnsembleCombiner,
    ExcludedModel, ForecastError, ForecastModel, InverseErrorCombiner, MetricsSummary, ModelKind,
    ModelOutcome, Outcome, SeasonalityDetector, TrainingHistory,
};
use pipeline_facade::{
    check_stationarity, create_windows, PipelineError, PreparedData, Preprocessor, Scaler,
    ScalingTransform, TimeSeries, WindowConfig,
};
use rayon::prelude::*;
use registry_facade::{
    open_registry, ModelRegistry, RecordMetadata, RegistryError, RegistryExt, TrainingDiagnostics,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::request::{
    AnomalyRequest, AnomalyResponse, ForecastRequest, ForecastResponse, Recommendation,
};

/// Fitted model together with the scaler it was trained behind.
///
/// This is the fitted state stored in a registry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredForecaster {
    pub model: AnyForecaster,
    pub scaler: ScalingTransform,
    pub target_column: usize,
}

struct TrainedModel {
    model: AnyForecaster,
    history: TrainingHistory,
    validation_rmse: f64,
    prediction: Vec<f64>,
}

/// Runs forecast and anomaly requests against one configuration and one
/// registry.
pub struct Engine {
    config: EngineConfig,
    capabilities: Capabilities,
    registry: Arc<dyn ModelRegistry>,
}

impl Engine {
    pub fn new(config: EngineConfig, registry: Arc<dyn ModelRegistry>) -> Result<Self> {
        config.validate()?;
        let capabilities = Capabilities::compiled().without(&config.disabled_models);
        info!(
            models = ?capabilities.models().collect::<Vec<_>>(),
            detectors = ?capabilities.detectors().collect::<Vec<_>>(),
            parallel = config.parallel,
            "Engine ready"
        );
        Ok(Self {
            config,
            capabilities,
            registry,
        })
    }

    /// Engine over the registry described by `config.registry`.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let registry = open_registry(&config.registry);
        Self::new(config, registry)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn registry(&self) -> &Arc<dyn ModelRegistry> {
        &self.registry
    }

    // ========================================================================
    // Forecasting
    // ========================================================================

    /// Train every requested model on `series` and combine their forecasts.
    ///
    /// A model that fails to fit or predict is excluded and listed in the
    /// response; the request fails only when no model contributes.
    pub fn forecast(&self, series: &TimeSeries, request: &ForecastRequest) -> Result<ForecastResponse> {
        request.validate()?;
        for &kind in &request.model_set {
            self.capabilities.require_model(kind)?;
        }
        if request.steps > 1 && series.width() != 1 {
            return Err(EngineError::InvalidRequest(format!(
                "multi-step forecasts need a single-feature series, got {} features",
                series.width()
            )));
        }
        for kind in &request.model_set {
            if let Some(name) = request.record_name(*kind) {
                if self.registry.contains(&name)? {
                    return Err(RegistryError::AlreadyExists(name).into());
                }
            }
        }

        let mut preprocess = self.config.preprocess.clone();
        preprocess.window.input_len = request.window_length;
        preprocess.window.horizon = request.horizon;
        let prepared = Preprocessor::new(preprocess).prepare(series)?;

        let run = |kind: &ModelKind| (*kind, self.train_one(*kind, &prepared, request.steps));
        let runs: Vec<(ModelKind, Result<TrainedModel>)> = if self.config.parallel {
            request.model_set.par_iter().map(run).collect()
        } else {
            request.model_set.iter().map(run).collect()
        };

        let mut outcomes = Vec::with_capacity(runs.len());
        let mut trained = BTreeMap::new();
        for (kind, run) in runs {
            match run {
                Ok(model) => {
                    outcomes.push(ModelOutcome::prediction(
                        kind.as_str(),
                        model.prediction.clone(),
                        model.validation_rmse,
                    ));
                    trained.insert(kind, model);
                }
                Err(e) => {
                    warn!(model = %kind, error = %e, "Model failed");
                    outcomes.push(ModelOutcome::failed(kind.as_str(), e.to_string()));
                }
            }
        }

        let combiner = InverseErrorCombiner::new(self.config.ensemble.clone());
        let result = combiner
            .combine(&outcomes, request.explicit_weights.as_ref())
            .map_err(|e| match e {
                ForecastError::NoContributingModels => {
                    EngineError::NoUsableModels(excluded_models(&outcomes))
                }
                other => other.into(),
            })?;

        let validation_errors: BTreeMap<String, f64> = trained
            .iter()
            .filter(|(kind, _)| result.weights.contains_key(kind.as_str()))
            .map(|(kind, model)| (kind.as_str().to_string(), model.validation_rmse))
            .collect();

        let mut saved = BTreeMap::new();
        for (kind, model) in trained {
            if !result.weights.contains_key(kind.as_str()) {
                continue;
            }
            if let Some(name) = request.record_name(kind) {
                let location = self.persist(&name, model, &prepared)?;
                saved.insert(kind.as_str().to_string(), location);
            }
        }

        info!(
            contributors = result.weights.len(),
            excluded = result.excluded.len(),
            horizon = request.horizon,
            steps = request.steps,
            "Forecast complete"
        );

        Ok(ForecastResponse {
            result,
            horizon: request.horizon,
            steps: request.steps,
            validation_errors,
            stationary: prepared.stationarity.is_stationary,
            saved,
        })
    }

    fn train_one(&self, kind: ModelKind, prepared: &PreparedData, steps: usize) -> Result<TrainedModel> {
        let mut model = AnyForecaster::new(kind, &self.config.models);
        let validation = &prepared.split.validation;
        let history = model.fit(
            &prepared.split.train,
            (!validation.is_empty()).then_some(validation),
        )?;
        let validation_rmse = validation_rmse(&model, prepared)?;
        let prediction = predict_ahead(&model, prepared, steps)?;
        debug!(
            model = %kind,
            epochs = history.epochs_run,
            validation_rmse,
            "Model trained"
        );
        Ok(TrainedModel {
            model,
            history,
            validation_rmse,
            prediction,
        })
    }

    fn persist(&self, name: &str, trained: TrainedModel, prepared: &PreparedData) -> Result<String> {
        let shape = trained
            .model
            .input_shape()
            .ok_or(ForecastError::NotFitted)?;
        let diagnostics = TrainingDiagnostics {
            epochs: trained.history.epochs_run,
            final_loss: trained.history.final_loss(),
            final_val_loss: trained.history.final_val_loss(),
            metrics: BTreeMap::from([("validation_rmse".to_string(), trained.validation_rmse)]),
        };
        let metadata = RecordMetadata::new(
            trained.model.kind().as_str(),
            vec![shape.input_len, shape.width, shape.horizon],
        )
        .with_training_result(diagnostics)
        .with_hyperparameters(trained.model.hyperparameters());
        let stored = StoredForecaster {
            model: trained.model,
            scaler: prepared.scaler.clone(),
            target_column: prepared.target_column,
        };
        let location = self.registry.save(name, &stored, metadata)?;
        info!(name = %name, location = %location, "Model saved");
        Ok(location)
    }

    /// Fitted model stored under `name`, with its record metadata.
    pub fn load_forecaster(&self, name: &str) -> Result<(AnyForecaster, RecordMetadata)> {
        let (stored, metadata) = self.load_stored(name)?;
        Ok((stored.model, metadata))
    }

    fn load_stored(&self, name: &str) -> Result<(StoredForecaster, RecordMetadata)> {
        let record = self.registry.load_record(name)?;
        if record.metadata.model_type.parse::<ModelKind>().is_err() {
            return Err(EngineError::InvalidRequest(format!(
                "'{}' holds a {} model, not a forecaster",
                name, record.metadata.model_type
            )));
        }
        let stored: StoredForecaster = record.decode()?;
        self.capabilities.require_model(stored.model.kind())?;
        Ok((stored, record.metadata))
    }

    /// Forecast `steps` windows past the end of `series` with the model
    /// stored under `name`, reusing the scaler it was trained with.
    pub fn forecast_with(&self, name: &str, series: &TimeSeries, steps: usize) -> Result<Vec<f64>> {
        if steps == 0 {
            return Err(EngineError::InvalidRequest("steps must be positive".into()));
        }
        let (stored, _) = self.load_stored(name)?;
        let shape = stored.model.input_shape().ok_or(ForecastError::NotFitted)?;
        if series.width() != shape.width {
            return Err(PipelineError::shape(
                format!("{} features", shape.width),
                format!("{} features", series.width()),
            )
            .into());
        }
        if series.len() < shape.input_len {
            return Err(PipelineError::InsufficientData {
                required: shape.input_len,
                actual: series.len(),
            }
            .into());
        }

        let scaled = stored.scaler.transform(series)?;
        let values = scaled.values();
        let last_window = &values[values.len() - shape.input_size()..];
        let raw = if steps == 1 {
            stored
                .model
                .predict(&[last_window.to_vec()])?
                .pop()
                .ok_or_else(|| ForecastError::NumericalError("empty prediction".into()))?
        } else {
            stored.model.predict_future(last_window, steps)?.concat()
        };
        let forecast = stored
            .scaler
            .inverse_transform_feature(&raw, stored.target_column)?;
        info!(name = %name, values = forecast.len(), "Forecast from stored model");
        Ok(forecast)
    }

    /// Names of every stored record.
    pub fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.registry.list()?)
    }

    // ========================================================================
    // Anomaly detection
    // ========================================================================

    /// Fit every requested detector on `values` and merge their flags.
    ///
    /// A detector that fails is listed in `report.failures`; the request
    /// fails only when none succeeds. With `persist_as` set, every fitted
    /// detector is saved with its threshold.
    pub fn detect(&self, values: &[f64], request: &AnomalyRequest) -> Result<AnomalyResponse> {
        request.validate()?;
        for &kind in &request.methods {
            self.capabilities.require_detector(kind)?;
        }
        for kind in &request.methods {
            if let Some(name) = request.record_name(*kind) {
                if self.registry.contains(&name)? {
                    return Err(RegistryError::AlreadyExists(name).into());
                }
            }
        }
        let config = self
            .config
            .detectors
            .clone()
            .with_sensitivity(request.sensitivity)?;

        let run = |kind: &DetectorKind| {
            let mut detector = detector_for(*kind, &config);
            let outcome = match detector.fit(values) {
                Ok(summary) => detector.detect_fitted().map(|series| (summary, series)),
                Err(e) => Err(e),
            };
            (*kind, outcome.map(|(summary, series)| (detector, summary, series)))
        };
        let runs: Vec<_> = if self.config.parallel {
            request.methods.par_iter().map(run).collect()
        } else {
            request.methods.iter().map(run).collect()
        };

        let mut series = Vec::with_capacity(runs.len());
        let mut fitted = Vec::with_capacity(runs.len());
        let mut failures = Vec::new();
        for (kind, run) in runs {
            match run {
                Ok((detector, summary, s)) => {
                    series.push(s);
                    fitted.push((detector, summary));
                }
                Err(e) => {
                    warn!(method = %kind, error = %e, "Detector failed");
                    failures.push(DetectorFailure {
                        method: kind,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if series.is_empty() {
            return Err(EngineError::NoUsableDetectors(failures));
        }

        let mut report = UnionConsensus.merge(series)?;
        report.failures = failures;

        let mut saved = BTreeMap::new();
        for (detector, summary) in &fitted {
            if let Some(name) = request.record_name(detector.kind()) {
                let location = self.persist_detector(&name, detector, summary)?;
                saved.insert(detector.kind().as_str().to_string(), location);
            }
        }

        info!(
            points = values.len(),
            methods = report.per_method.len(),
            consensus = report.consensus_indices.len(),
            saved = saved.len(),
            "Anomaly detection complete"
        );
        Ok(AnomalyResponse { report, saved })
    }

    fn persist_detector(
        &self,
        name: &str,
        detector: &AnyDetector,
        summary: &FitSummary,
    ) -> Result<String> {
        let mut metrics = BTreeMap::from([("threshold".to_string(), summary.threshold)]);
        if let Some(log_likelihood) = summary.log_likelihood {
            metrics.insert("log_likelihood".to_string(), log_likelihood);
        }
        let diagnostics = TrainingDiagnostics {
            epochs: summary.iterations,
            final_loss: None,
            final_val_loss: None,
            metrics,
        };
        let hyperparameters = match detector {
            AnyDetector::StateTransition(d) => serde_json::to_value(d.config()),
            AnyDetector::TrendDecomposition(d) => serde_json::to_value(d.config()),
        }
        .unwrap_or(serde_json::Value::Null);
        let metadata = RecordMetadata::new(detector.kind().as_str(), vec![summary.observations])
            .with_training_result(diagnostics)
            .with_hyperparameters(hyperparameters);
        let location = self.registry.save(name, detector, metadata)?;
        info!(name = %name, location = %location, "Detector saved");
        Ok(location)
    }

    /// Fitted detector stored under `name`, with its record metadata.
    pub fn load_detector(&self, name: &str) -> Result<(AnyDetector, RecordMetadata)> {
        let record = self.registry.load_record(name)?;
        let kind: DetectorKind = record.metadata.model_type.parse().map_err(|_| {
            EngineError::InvalidRequest(format!(
                "'{}' holds a {} model, not a detector",
                name, record.metadata.model_type
            ))
        })?;
        self.capabilities.require_detector(kind)?;
        let detector: AnyDetector = record.decode()?;
        Ok((detector, record.metadata))
    }

    /// Score `values` with the detectors stored under `names` and merge
    /// their flags. Each detector keeps the threshold it was fitted with;
    /// `values` are treated as following its fitting data.
    pub fn detect_with<S: AsRef<str>>(
        &self,
        names: &[S],
        values: &[f64],
    ) -> Result<AnomalyReport> {
        if names.is_empty() {
            return Err(EngineError::InvalidRequest("no detector names given".into()));
        }
        let mut methods = BTreeSet::new();
        let mut series = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let (detector, _) = self.load_detector(name)?;
            if !methods.insert(detector.kind()) {
                return Err(EngineError::InvalidRequest(format!(
                    "more than one stored {} detector given",
                    detector.kind()
                )));
            }
            series.push(detector.detect(values)?);
        }
        let report = UnionConsensus.merge(series)?;
        info!(
            points = values.len(),
            methods = report.per_method.len(),
            consensus = report.consensus_indices.len(),
            "Detection with stored detectors complete"
        );
        Ok(report)
    }

    // ========================================================================
    // Evaluation and selection
    // ========================================================================

    /// Accuracy of the model stored under `name` on every window of
    /// `series`, in original units.
    pub fn evaluate_forecaster(&self, name: &str, series: &TimeSeries) -> Result<MetricsSummary> {
        let (stored, _) = self.load_stored(name)?;
        let shape = stored.model.input_shape().ok_or(ForecastError::NotFitted)?;
        if series.width() != shape.width {
            return Err(PipelineError::shape(
                format!("{} features", shape.width),
                format!("{} features", series.width()),
            )
            .into());
        }
        let scaled = stored.scaler.transform(series)?;
        let window = WindowConfig {
            input_len: shape.input_len,
            horizon: shape.horizon,
            target_column: stored.target_column,
        };
        let windows = create_windows(&scaled, &window)?;
        let predicted: Vec<f64> = stored.model.predict(windows.inputs())?.concat();
        let actual: Vec<f64> = windows.targets().concat();
        let predicted = stored
            .scaler
            .inverse_transform_feature(&predicted, stored.target_column)?;
        let actual = stored
            .scaler
            .inverse_transform_feature(&actual, stored.target_column)?;
        let metrics = MetricsSummary::compute(&actual, &predicted);
        info!(
            name = %name,
            windows = windows.len(),
            rmse = metrics.rmse,
            "Forecaster evaluated"
        );
        Ok(metrics)
    }

    /// Detection quality of the detector stored under `name` on `values`
    /// against known `labels`.
    pub fn evaluate_detector(
        &self,
        name: &str,
        values: &[f64],
        labels: &[bool],
    ) -> Result<AnomalyMetrics> {
        let (detector, _) = self.load_detector(name)?;
        let series = detector.detect(values)?;
        let metrics = evaluate(&series.flags, labels)?;
        info!(
            name = %name,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            "Detector evaluated"
        );
        Ok(metrics)
    }

    /// Suggest a forecaster and a detector from the size, trend and
    /// seasonality of `series`.
    pub fn recommend(&self, series: &TimeSeries, window_length: usize) -> Result<Recommendation> {
        if series.is_empty() {
            return Err(PipelineError::InsufficientData {
                required: 1,
                actual: 0,
            }
            .into());
        }
        let target = series.column(self.config.preprocess.window.target_column)?;
        let has_trend = !check_stationarity(&target).is_stationary;
        let period = AutocorrelationDetector::new()
            .detect(&target, self.config.detectors.trend.model.max_period);
        let has_seasonality = period.is_some();
        let recommendation = Recommendation {
            forecaster: recommend_forecaster(series.len(), series.width(), window_length),
            detector: recommend_detector(has_trend, has_seasonality),
            samples: series.len(),
            features: series.width(),
            window_length,
            has_trend,
            has_seasonality,
            period,
        };
        debug!(?recommendation, "Recommendation");
        Ok(recommendation)
    }
}

fn excluded_models(outcomes: &[ModelOutcome]) -> Vec<ExcludedModel> {
    outcomes
        .iter()
        .filter_map(|o| match &o.outcome {
            Outcome::Failed { reason } => Some(ExcludedModel {
                model: o.model.clone(),
                reason: reason.clone(),
            }),
            Outcome::Prediction { .. } => Some(ExcludedModel {
                model: o.model.clone(),
                reason: "prediction unusable".into(),
            }),
        })
        .collect()
}

/// RMSE in original units over the validation windows, or the training
/// windows when the split left no validation data.
fn validation_rmse(model: &AnyForecaster, prepared: &PreparedData) -> Result<f64> {
    let windows = if prepared.split.validation.is_empty() {
        warn!(model = %model.kind(), "No validation windows; weighting by training error");
        &prepared.split.train
    } else {
        &prepared.split.validation
    };
    let predicted: Vec<f64> = model.predict(windows.inputs())?.concat();
    let actual: Vec<f64> = windows.targets().concat();
    let predicted = prepared.inverse_targets(&predicted)?;
    let actual = prepared.inverse_targets(&actual)?;
    Ok(rmse(&actual, &predicted))
}

fn predict_ahead(model: &AnyForecaster, prepared: &PreparedData, steps: usize) -> Result<Vec<f64>> {
    let last_window = prepared.last_window();
    let scaled = if steps == 1 {
        model
            .predict(&[last_window])?
            .pop()
            .ok_or_else(|| ForecastError::NumericalError("empty prediction".into()))?
    } else {
        model.predict_future(&last_window, steps)?.concat()
    };
    Ok(prepared.inverse_targets(&scaled)?)
}
