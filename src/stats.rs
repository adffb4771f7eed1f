use statrs::statistics::Statistics;
use crate::model::{SeriesPoint, SeriesSummary};

/// Trailing simple moving average. Positions without a full window are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                None
            } else {
                Some(values[i + 1 - window..=i].iter().mean())
            }
        })
        .collect()
}

pub fn summarize(series: &[SeriesPoint]) -> Option<SeriesSummary> {
    let defined: Vec<&SeriesPoint> = series.iter().filter(|p| p.value.is_some()).collect();
    if defined.is_empty() {
        return None;
    }

    let values: Vec<f64> = defined.iter().filter_map(|p| p.value).collect();

    // statrs returns NaN for a single sample
    let std_dev = if values.len() > 1 {
        values.iter().std_dev()
    } else {
        0.0
    };

    let mut peak = defined[0];
    for point in &defined[1..] {
        if point.value > peak.value {
            peak = point;
        }
    }

    Some(SeriesSummary {
        points: values.len(),
        total: values.iter().sum(),
        mean: values.iter().mean(),
        std_dev,
        peak: peak.value.unwrap_or_default(),
        peak_date: peak.date,
    })
}
