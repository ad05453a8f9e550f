//! Sliding windows and chronological splits.

use pipeline_api::{SplitConfig, WindowConfig};
use pipeline_spi::{DataSplit, PipelineError, Result, TimeSeries, Windows};

/// Number of windows a series of `len` steps yields, or `None` if it is too short.
pub fn window_count(len: usize, config: &WindowConfig) -> Option<usize> {
    len.checked_sub(config.min_length()).map(|n| n + 1)
}

/// Slide a window of `input_len` steps with stride 1 and pair each with the
/// next `horizon` values of the target column.
///
/// A series of length N yields exactly `N - L - H + 1` windows.
pub fn create_windows(series: &TimeSeries, config: &WindowConfig) -> Result<Windows> {
    config.validate()?;
    let count = window_count(series.len(), config).ok_or(PipelineError::InsufficientData {
        required: config.min_length(),
        actual: series.len(),
    })?;
    let target = series.column(config.target_column)?;

    let width = series.width();
    let (l, h) = (config.input_len, config.horizon);
    let values = series.values();
    let mut windows = Windows::new(l, h, width);
    for start in 0..count {
        windows.push(
            values[start * width..(start + l) * width].to_vec(),
            target[start + l..start + l + h].to_vec(),
        )?;
    }
    Ok(windows)
}

/// Partition sizes for `n` items: `floor(n * train)`, `floor(n * val)`, remainder.
pub fn split_sizes(n: usize, config: &SplitConfig) -> Result<(usize, usize, usize)> {
    config.validate()?;
    let n_train = (n as f64 * config.train_ratio) as usize;
    let n_val = (n as f64 * config.val_ratio) as usize;
    if n_train == 0 {
        return Err(PipelineError::InsufficientData {
            required: (1.0 / config.train_ratio).ceil() as usize,
            actual: n,
        });
    }
    Ok((n_train, n_val, n - n_train - n_val))
}

/// Split windows chronologically. Order is preserved; nothing is shuffled.
pub fn split_windows(windows: &Windows, config: &SplitConfig) -> Result<DataSplit<Windows>> {
    let (n_train, n_val, _) = split_sizes(windows.len(), config)?;
    Ok(DataSplit {
        train: windows.slice(0..n_train),
        validation: windows.slice(n_train..n_train + n_val),
        test: windows.slice(n_train + n_val..windows.len()),
    })
}

/// Split a raw series chronologically by observation.
pub fn split_series(series: &TimeSeries, config: &SplitConfig) -> Result<DataSplit<TimeSeries>> {
    let (n_train, n_val, _) = split_sizes(series.len(), config)?;
    Ok(DataSplit {
        train: series.slice(0..n_train)?,
        validation: series.slice(n_train..n_train + n_val)?,
        test: series.slice(n_train + n_val..series.len())?,
    })
}
