//! # ensemble
//!
//! Command-line interface for ensemble forecasting and multi-method anomaly
//! detection over CSV or JSON series.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use engine::{
    AnomalyRequest, DetectorKind, Engine, EngineConfig, EngineError, ErrorPayload,
    ForecastRequest, ModelKind, TimeSeries,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
enum CliError {
    /// Bad input file or argument
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<String> for CliError {
    fn from(message: String) -> Self {
        Self::Input(message)
    }
}

impl CliError {
    fn payload(&self) -> ErrorPayload {
        match self {
            Self::Input(message) => ErrorPayload {
                kind: "input".to_string(),
                message: message.clone(),
            },
            Self::Engine(e) => e.to_payload(),
        }
    }
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ensemble")]
#[command(about = "Ensemble time series forecasting and anomaly detection", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON); ENSEMBLE_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the selected models and combine their forecasts
    Forecast {
        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values (default: first numeric column)
        #[arg(short, long)]
        column: Option<String>,

        /// Input steps per training window
        #[arg(short, long, default_value = "24")]
        window: usize,

        /// Steps predicted per window
        #[arg(long, default_value = "1")]
        horizon: usize,

        /// Comma-separated models (lstm, cnn)
        #[arg(short, long, default_value = "lstm,cnn")]
        models: String,

        /// Explicit weights, e.g. lstm=0.7,cnn=0.3
        #[arg(long)]
        weights: Option<String>,

        /// Autoregressive iterations past the end of the series
        #[arg(short, long, default_value = "1")]
        steps: usize,

        /// Save each contributing model as <NAME>_<model>
        #[arg(long)]
        save: Option<String>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect anomalies with one or more methods and merge the results
    Detect {
        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values
        #[arg(short, long)]
        column: Option<String>,

        /// Comma-separated methods (hmm, trend)
        #[arg(short, long, default_value = "hmm,trend")]
        methods: String,

        /// Sensitivity in (0, 1); higher flags fewer points
        #[arg(short, long, default_value = "0.95")]
        sensitivity: f64,

        /// Save each fitted detector as <NAME>_<method>
        #[arg(long)]
        save: Option<String>,

        /// Comma-separated saved detectors to score with instead of fitting,
        /// e.g. cpu_hmm,cpu_trend
        #[arg(long, conflicts_with = "save")]
        model: Option<String>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forecast with a previously saved model
    Predict {
        /// Saved model name, e.g. sales_lstm
        #[arg(short, long)]
        model: String,

        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values
        #[arg(short, long)]
        column: Option<String>,

        /// Autoregressive iterations past the end of the series
        #[arg(short, long, default_value = "1")]
        steps: usize,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Measure a saved model on held-out data
    Evaluate {
        #[command(subcommand)]
        command: EvaluateCommand,
    },

    /// Suggest a forecaster and a detector for a series
    Recommend {
        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values
        #[arg(short, long)]
        column: Option<String>,

        /// Input steps per training window
        #[arg(short, long, default_value = "24")]
        window: usize,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect the model registry
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
}

#[derive(Subcommand)]
enum EvaluateCommand {
    /// Forecast accuracy over every window of the input
    Forecaster {
        /// Saved model name, e.g. sales_lstm
        #[arg(short, long)]
        model: String,

        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values
        #[arg(short, long)]
        column: Option<String>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Precision and recall against known anomaly labels
    Detector {
        /// Saved detector name, e.g. cpu_trend
        #[arg(short, long)]
        model: String,

        /// Input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for time series values
        #[arg(short, long)]
        column: Option<String>,

        /// Labels file (CSV or JSON); non-zero marks an anomaly
        #[arg(short, long)]
        labels: PathBuf,

        /// Column name or index for the labels
        #[arg(long)]
        labels_column: Option<String>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List saved model names
    List,
}

/// Load time series data from a CSV file
fn load_csv_data(path: &PathBuf, column: Option<&str>) -> CliResult<Vec<f64>> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| format!("Failed to read headers: {}", e))?
        .clone();

    let col_idx = match column {
        Some(col) => match col.parse::<usize>() {
            Ok(idx) => Some(idx),
            Err(_) => Some(
                headers
                    .iter()
                    .position(|h| h.trim() == col)
                    .ok_or_else(|| format!("Column '{}' not found", col))?,
            ),
        },
        None => None,
    };

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read record: {}", e))?;

    // Without a column, take the first one holding any number.
    let col_idx = match col_idx {
        Some(idx) => idx,
        None => (0..headers.len())
            .find(|&i| {
                records
                    .iter()
                    .any(|r| r.get(i).is_some_and(|v| v.trim().parse::<f64>().is_ok()))
            })
            .unwrap_or(0),
    };

    // A named column must be numeric on every row so indices match file rows.
    let mut data = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (i, record) in records.iter().enumerate() {
        let cell = record.get(col_idx).unwrap_or("").trim();
        match cell.parse::<f64>() {
            Ok(value) => data.push(value),
            Err(_) if column.is_some() => {
                let line = record.position().map_or(i as u64 + 2, |p| p.line());
                return Err(format!("Line {}: '{}' is not a number", line, cell).into());
            }
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "Skipped non-numeric rows; indices refer to numeric rows only");
    }

    if data.is_empty() {
        return Err("No numeric data found in the specified column".to_string().into());
    }

    Ok(data)
}

/// Load time series data from a JSON file
fn load_json_data(path: &PathBuf, column: Option<&str>) -> CliResult<Vec<f64>> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let reader = BufReader::new(file);
    let json: serde_json::Value =
        serde_json::from_reader(reader).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    if let Some(arr) = json.as_array() {
        if !arr.is_empty() && arr.iter().all(|v| v.is_number()) {
            return Ok(arr.iter().filter_map(|v| v.as_f64()).collect());
        }

        // Array of objects
        if let Some(col) = column {
            let data: Vec<f64> = arr
                .iter()
                .filter_map(|obj| obj.get(col).and_then(|v| v.as_f64()))
                .collect();
            if !data.is_empty() {
                return Ok(data);
            }
        }

        for key in &["value", "values", "data", "y"] {
            let data: Vec<f64> = arr
                .iter()
                .filter_map(|obj| obj.get(*key).and_then(|v| v.as_f64()))
                .collect();
            if !data.is_empty() {
                return Ok(data);
            }
        }
    }

    if let Some(obj) = json.as_object() {
        for key in &["data", "values", "series", "y"] {
            if let Some(arr) = obj.get(*key).and_then(|v| v.as_array()) {
                let data: Vec<f64> = arr.iter().filter_map(|v| v.as_f64()).collect();
                if !data.is_empty() {
                    return Ok(data);
                }
            }
        }
    }

    Err("Could not extract numeric data from JSON".to_string().into())
}

/// Load data from file (auto-detect format)
fn load_data(path: &PathBuf, column: Option<&str>) -> CliResult<Vec<f64>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let data = match ext.as_str() {
        "csv" => load_csv_data(path, column),
        "json" => load_json_data(path, column),
        _ => load_csv_data(path, column).or_else(|_| load_json_data(path, column)),
    }?;
    info!(
        points = data.len(),
        file = ?path.file_name().unwrap_or_default(),
        "Loaded series"
    );
    Ok(data)
}

/// Parse a comma-separated list of identifiers
fn parse_list<T>(raw: &str) -> CliResult<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| CliError::Input(e.to_string())))
        .collect::<CliResult<Vec<T>>>()?;
    if items.is_empty() {
        return Err(CliError::Input(format!("Empty list: '{}'", raw)));
    }
    Ok(items)
}

/// Parse `lstm=0.7,cnn=0.3` into weights keyed by model identifier
fn parse_weights(raw: &str) -> CliResult<BTreeMap<String, f64>> {
    let mut weights = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("Weight '{}' is not of the form model=value", pair))?;
        let kind = name.trim().parse::<ModelKind>().map_err(|e| e.to_string())?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("Weight for '{}' is not a number: '{}'", name, value))?;
        weights.insert(kind.as_str().to_string(), value);
    }
    if weights.is_empty() {
        return Err(format!("No weights in '{}'", raw).into());
    }
    Ok(weights)
}

/// Write results to file or stdout
fn write_json<T: Serialize>(value: &T, output: Option<&PathBuf>) -> CliResult<()> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| format!("Failed to create output: {}", e))?;
            serde_json::to_writer_pretty(file, value)
                .map_err(|e| format!("Failed to write JSON: {}", e))?;
            info!(path = ?path, "Results written");
        }
        None => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| format!("Failed to encode JSON: {}", e))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> CliResult<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?
            .with_env_overrides(|key| std::env::var(key).ok())?,
        None => EngineConfig::from_env()?,
    };
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    config: EngineConfig,
    input: PathBuf,
    column: Option<String>,
    window: usize,
    horizon: usize,
    models: String,
    weights: Option<String>,
    steps: usize,
    save: Option<String>,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let data = load_data(&input, column.as_deref())?;
    let mut request = ForecastRequest::new(parse_list(&models)?, window, horizon).with_steps(steps);
    if let Some(raw) = weights {
        request = request.with_weights(parse_weights(&raw)?);
    }
    if let Some(name) = save {
        request = request.with_persist_as(name);
    }

    let engine = Engine::from_config(config)?;
    let response = engine.forecast(&TimeSeries::univariate(data), &request)?;
    write_json(&response, output.as_ref())
}

#[allow(clippy::too_many_arguments)]
fn run_detect(
    config: EngineConfig,
    input: PathBuf,
    column: Option<String>,
    methods: String,
    sensitivity: f64,
    save: Option<String>,
    model: Option<String>,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let data = load_data(&input, column.as_deref())?;
    let engine = Engine::from_config(config)?;

    if let Some(names) = model {
        let names: Vec<String> = parse_list(&names)?;
        let report = engine.detect_with(&names[..], &data)?;
        return write_json(&report, output.as_ref());
    }

    let methods: Vec<DetectorKind> = parse_list(&methods)?;
    let mut request = AnomalyRequest::new(methods).with_sensitivity(sensitivity);
    if let Some(name) = save {
        request = request.with_persist_as(name);
    }
    let response = engine.detect(&data, &request)?;
    write_json(&response, output.as_ref())
}

fn run_predict(
    config: EngineConfig,
    model: String,
    input: PathBuf,
    column: Option<String>,
    steps: usize,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let data = load_data(&input, column.as_deref())?;
    let engine = Engine::from_config(config)?;
    let forecast = engine.forecast_with(&model, &TimeSeries::univariate(data), steps)?;
    let json = serde_json::json!({
        "model": model,
        "steps": steps,
        "forecast": forecast,
    });
    write_json(&json, output.as_ref())
}

fn run_evaluate(config: EngineConfig, command: EvaluateCommand) -> CliResult<()> {
    let engine = Engine::from_config(config)?;
    match command {
        EvaluateCommand::Forecaster {
            model,
            input,
            column,
            output,
        } => {
            let data = load_data(&input, column.as_deref())?;
            let metrics = engine.evaluate_forecaster(&model, &TimeSeries::univariate(data))?;
            let json = serde_json::json!({
                "model": model,
                "metrics": metrics,
            });
            write_json(&json, output.as_ref())
        }
        EvaluateCommand::Detector {
            model,
            input,
            column,
            labels,
            labels_column,
            output,
        } => {
            let data = load_data(&input, column.as_deref())?;
            let labels: Vec<bool> = load_data(&labels, labels_column.as_deref())?
                .into_iter()
                .map(|v| v != 0.0)
                .collect();
            let metrics = engine.evaluate_detector(&model, &data, &labels)?;
            let json = serde_json::json!({
                "model": model,
                "metrics": metrics,
            });
            write_json(&json, output.as_ref())
        }
    }
}

fn run_recommend(
    config: EngineConfig,
    input: PathBuf,
    column: Option<String>,
    window: usize,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let data = load_data(&input, column.as_deref())?;
    let engine = Engine::from_config(config)?;
    let recommendation = engine.recommend(&TimeSeries::univariate(data), window)?;
    write_json(&recommendation, output.as_ref())
}

fn run_models_list(config: EngineConfig) -> CliResult<()> {
    let engine = Engine::from_config(config)?;
    for name in engine.list_models()? {
        println!("{}", name);
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Commands::Forecast {
            input,
            column,
            window,
            horizon,
            models,
            weights,
            steps,
            save,
            output,
        } => run_forecast(
            config, input, column, window, horizon, models, weights, steps, save, output,
        ),

        Commands::Detect {
            input,
            column,
            methods,
            sensitivity,
            save,
            model,
            output,
        } => run_detect(config, input, column, methods, sensitivity, save, model, output),

        Commands::Predict {
            model,
            input,
            column,
            steps,
            output,
        } => run_predict(config, model, input, column, steps, output),

        Commands::Evaluate { command } => run_evaluate(config, command),

        Commands::Recommend {
            input,
            column,
            window,
            output,
        } => run_recommend(config, input, column, window, output),

        Commands::Models {
            command: ModelsCommand::List,
        } => run_models_list(config),
    }
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ensemble=info,engine=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let payload = e.payload();
        match serde_json::to_string(&payload) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("Error: {}", payload.message),
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_csv_column_by_name_and_index() {
        let file = file_with(".csv", "date,value\n2024-01-01,1.5\n2024-01-02,2.5\n");
        let path = file.path().to_path_buf();
        assert_eq!(load_data(&path, Some("value")).unwrap(), vec![1.5, 2.5]);
        assert_eq!(load_data(&path, Some("1")).unwrap(), vec![1.5, 2.5]);
        assert!(load_data(&path, Some("missing")).is_err());
    }

    #[test]
    fn test_csv_named_column_rejects_non_numeric_rows() {
        let file = file_with(".csv", "date,value\n2024-01-01,1.5\n2024-01-02,n/a\n2024-01-03,2.5\n");
        let path = file.path().to_path_buf();
        let err = load_csv_data(&path, Some("value")).unwrap_err();
        assert!(err.to_string().contains("Line 3"), "{}", err);
        assert!(load_csv_data(&path, Some("1")).is_err());
        // Without a named column the row is skipped.
        assert_eq!(load_csv_data(&path, None).unwrap(), vec![1.5, 2.5]);
    }

    #[test]
    fn test_csv_defaults_to_first_numeric_column() {
        let file = file_with(".csv", "date,value\n2024-01-01,3\n2024-01-02,4\n");
        let path = file.path().to_path_buf();
        assert_eq!(load_data(&path, None).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_json_shapes() {
        let numbers = file_with(".json", "[1, 2, 3]");
        assert_eq!(
            load_data(&numbers.path().to_path_buf(), None).unwrap(),
            vec![1.0, 2.0, 3.0]
        );

        let objects = file_with(".json", r#"[{"t": 0, "temp": 5.5}, {"t": 1, "temp": 6.5}]"#);
        assert_eq!(
            load_data(&objects.path().to_path_buf(), Some("temp")).unwrap(),
            vec![5.5, 6.5]
        );

        let keyed = file_with(".json", r#"{"series": [7, 8]}"#);
        assert_eq!(
            load_data(&keyed.path().to_path_buf(), None).unwrap(),
            vec![7.0, 8.0]
        );

        let empty = file_with(".json", r#"{"other": []}"#);
        assert!(load_data(&empty.path().to_path_buf(), None).is_err());
    }

    #[test]
    fn test_unknown_extension_falls_back_to_json() {
        let file = file_with(".txt", "[4.0, 5.0]");
        assert_eq!(
            load_data(&file.path().to_path_buf(), None).unwrap(),
            vec![4.0, 5.0]
        );
    }

    #[test]
    fn test_parse_weights() {
        let weights = parse_weights("lstm=0.7, recurrent=0.2,cnn=0.3").unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights["lstm"], 0.2);
        assert_eq!(weights["cnn"], 0.3);
        assert!(parse_weights("lstm").is_err());
        assert!(parse_weights("lstm=abc").is_err());
        assert!(parse_weights("arima=1").is_err());
        assert!(parse_weights("").is_err());
    }

    #[test]
    fn test_parse_lists() {
        let models: Vec<ModelKind> = parse_list("lstm,cnn").unwrap();
        assert_eq!(models, vec![ModelKind::Recurrent, ModelKind::Convolutional]);
        let methods: Vec<DetectorKind> = parse_list("hmm, trend").unwrap();
        assert_eq!(
            methods,
            vec![DetectorKind::StateTransition, DetectorKind::TrendDecomposition]
        );
        assert!(parse_list::<ModelKind>("lstm,arima").is_err());
        assert!(parse_list::<ModelKind>(" , ").is_err());
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&serde_json::json!({"ok": true}), Some(&path)).unwrap();
        let written: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);
    }

    #[test]
    fn test_cli_parses_forecast() {
        let cli = Cli::try_parse_from([
            "ensemble", "forecast", "--input", "data.csv", "--window", "12", "--models", "cnn",
            "--weights", "cnn=1", "--save", "daily",
        ])
        .unwrap();
        match cli.command {
            Commands::Forecast {
                window,
                horizon,
                models,
                save,
                steps,
                ..
            } => {
                assert_eq!(window, 12);
                assert_eq!(horizon, 1);
                assert_eq!(steps, 1);
                assert_eq!(models, "cnn");
                assert_eq!(save.as_deref(), Some("daily"));
            }
            _ => panic!("expected forecast"),
        }
    }

    #[test]
    fn test_cli_parses_models_list() {
        let cli = Cli::try_parse_from(["ensemble", "models", "list", "--config", "engine.json"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models {
                command: ModelsCommand::List
            }
        ));
        assert_eq!(cli.config, Some(PathBuf::from("engine.json")));
    }

    #[test]
    fn test_input_error_payload() {
        let payload = CliError::Input("Column 'x' not found".into()).payload();
        assert_eq!(payload.kind, "input");
        let payload = CliError::from(EngineError::InvalidRequest("bad".into())).payload();
        assert_eq!(payload.kind, "invalid_request");
    }

    #[test]
    fn test_cli_parses_detect_save_and_model() {
        let cli = Cli::try_parse_from(["ensemble", "detect", "--input", "cpu.csv", "--save", "cpu"])
            .unwrap();
        match cli.command {
            Commands::Detect {
                methods,
                save,
                model,
                ..
            } => {
                assert_eq!(methods, "hmm,trend");
                assert_eq!(save.as_deref(), Some("cpu"));
                assert!(model.is_none());
            }
            _ => panic!("expected detect"),
        }

        let cli = Cli::try_parse_from([
            "ensemble", "detect", "--input", "cpu.csv", "--model", "cpu_hmm,cpu_trend",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Detect { model: Some(ref m), .. } if m == "cpu_hmm,cpu_trend"
        ));

        assert!(Cli::try_parse_from([
            "ensemble", "detect", "--input", "cpu.csv", "--model", "cpu_hmm", "--save", "cpu",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_parses_evaluate_and_recommend() {
        let cli = Cli::try_parse_from([
            "ensemble", "evaluate", "detector", "--model", "cpu_trend", "--input", "cpu.csv",
            "--labels", "labels.csv", "--labels-column", "is_anomaly",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate {
                command:
                    EvaluateCommand::Detector {
                        model,
                        labels,
                        labels_column,
                        ..
                    },
            } => {
                assert_eq!(model, "cpu_trend");
                assert_eq!(labels, PathBuf::from("labels.csv"));
                assert_eq!(labels_column.as_deref(), Some("is_anomaly"));
            }
            _ => panic!("expected evaluate detector"),
        }

        let cli = Cli::try_parse_from(["ensemble", "evaluate", "forecaster", "-m", "x_cnn", "-i", "a.csv"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Evaluate {
                command: EvaluateCommand::Forecaster { .. }
            }
        ));

        let cli = Cli::try_parse_from(["ensemble", "recommend", "--input", "a.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Recommend { window: 24, .. }));
    }

    #[test]
    fn test_detect_save_then_score_with_saved_detector() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<String> = (0..60)
            .map(|i| format!("{}", 1.0 + 0.1 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()))
            .collect();
        let train = file_with(".json", &format!("[{}]", values.join(",")));
        let config = EngineConfig::default()
            .with_registry(engine::RegistryConfig::file(dir.path()));

        run_detect(
            config.clone(),
            train.path().to_path_buf(),
            None,
            "trend".into(),
            0.95,
            Some("cpu".into()),
            None,
            Some(dir.path().join("fit.json")),
        )
        .unwrap();
        assert!(dir.path().join("cpu_trend.json").exists());

        let out = dir.path().join("scored.json");
        run_detect(
            config,
            train.path().to_path_buf(),
            None,
            "hmm,trend".into(),
            0.95,
            None,
            Some("cpu_trend".into()),
            Some(out.clone()),
        )
        .unwrap();
        let scored: serde_json::Value = serde_json::from_reader(File::open(&out).unwrap()).unwrap();
        assert_eq!(scored["per_method"]["trend"]["scores"].as_array().unwrap().len(), 60);
        assert!(scored["per_method"].get("hmm").is_none());
    }
}
