use statrs::statistics::{Data, OrderStatistics};
use thiserror::Error;

/// Reduces a series (one value per scenario, or per year) to a single number.
/// Objectives are built as a per-trace statistic followed by an aggregator.
pub trait Aggregator: Sync + Send {
    fn value(&self, series: &[f64]) -> Result<f64, AggregatorError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregatorError {
    #[error("Cannot aggregate an empty series")]
    EmptySeries,
    #[error("Quantile must lie in [0, 1]: `{0}`")]
    InvalidQuantile(f64),
}

fn non_empty(series: &[f64]) -> Result<&[f64], AggregatorError> {
    if series.is_empty() {
        Err(AggregatorError::EmptySeries)
    } else {
        Ok(series)
    }
}

pub struct ArithmeticMean;
impl Aggregator for ArithmeticMean {
    fn value(&self, series: &[f64]) -> Result<f64, AggregatorError> {
        let series = non_empty(series)?;
        Ok(series.iter().sum::<f64>() / (series.len() as f64))
    }
}

pub struct Maximum;
impl Aggregator for Maximum {
    fn value(&self, series: &[f64]) -> Result<f64, AggregatorError> {
        Ok(non_empty(series)?
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
    }
}

pub struct Minimum;
impl Aggregator for Minimum {
    fn value(&self, series: &[f64]) -> Result<f64, AggregatorError> {
        Ok(non_empty(series)?
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b)))
    }
}

/// Empirical quantile, as computed by `statrs`.
pub struct Quantile(pub f64);
impl Aggregator for Quantile {
    fn value(&self, series: &[f64]) -> Result<f64, AggregatorError> {
        if !(0.0..=1.0).contains(&self.0) {
            return Err(AggregatorError::InvalidQuantile(self.0));
        }
        let mut data = Data::new(non_empty(series)?.to_vec());
        Ok(data.quantile(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_aggregators() {
        let series = [3.0, -1.0, 4.0, 2.0];
        assert_eq!(ArithmeticMean.value(&series).unwrap(), 2.0);
        assert_eq!(Maximum.value(&series).unwrap(), 4.0);
        assert_eq!(Minimum.value(&series).unwrap(), -1.0);
    }

    #[test]
    fn test_quantile_endpoints_and_median() {
        let series = [5.0, 1.0, 3.0];
        assert_eq!(Quantile(0.0).value(&series).unwrap(), 1.0);
        assert_eq!(Quantile(1.0).value(&series).unwrap(), 5.0);
        assert!((Quantile(0.5).value(&series).unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(
            Quantile(1.2).value(&series).unwrap_err(),
            AggregatorError::InvalidQuantile(1.2)
        );
    }

    #[test]
    fn test_empty_series_is_an_error() {
        assert_eq!(
            ArithmeticMean.value(&[]).unwrap_err(),
            AggregatorError::EmptySeries
        );
        assert!(Maximum.value(&[]).is_err());
        assert!(Quantile(0.5).value(&[]).is_err());
    }
}
