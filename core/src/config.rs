use crate::error::{SalesError, SalesResult};
use serde::{Deserialize, Serialize};

/// Normal distribution parameters for a channel rating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingParams {
    pub mean:    f64,
    pub std_dev: f64,
}

/// Half-open uniform range `[low, high)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UniformRange {
    pub low:  f64,
    pub high: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AugmentConfig {
    /// Weights for satisfaction scores 1..=5.
    pub satisfaction_weights: Vec<f64>,
    /// Amazon discount off the base price.
    pub amazon_discount: UniformRange,
    /// MercadoLibre variation around the base price.
    pub mercadolibre_variation: UniformRange,
    /// Availability weights per channel, ordered homecenter, amazon, mercadolibre.
    pub availability_weights: [Vec<f64>; 3],
    /// Rating distributions per channel, same order.
    pub rating_params: [RatingParams; 3],
    pub months_forward: u32,
    /// Day jitter is drawn from `[0, max_day_jitter)`.
    pub max_day_jitter: u32,
    pub price_drift: UniformRange,
    pub price_floor: f64,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            satisfaction_weights:   vec![0.05, 0.05, 0.20, 0.40, 0.30],
            amazon_discount:        UniformRange { low: 0.05, high: 0.15 },
            mercadolibre_variation: UniformRange { low: -0.10, high: 0.20 },
            availability_weights: [
                vec![0.60, 0.25, 0.10, 0.05],
                vec![0.70, 0.20, 0.05, 0.05],
                vec![0.65, 0.25, 0.05, 0.05],
            ],
            rating_params: [
                RatingParams { mean: 4.2, std_dev: 0.8 },
                RatingParams { mean: 4.4, std_dev: 0.7 },
                RatingParams { mean: 4.0, std_dev: 0.9 },
            ],
            months_forward: 5,
            max_day_jitter: 28,
            price_drift:    UniformRange { low: 0.95, high: 1.05 },
            price_floor:    1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Estimated cost as a fraction of price.
    pub cost_ratio: f64,
    pub top_products: usize,
    pub min_rotation: u64,
    /// Size of the top-by-margin and top-by-rotation rankings.
    pub ranking_size: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cost_ratio:   0.65,
            top_products: 15,
            min_rotation: 5,
            ranking_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SalesConfig {
    pub augment: AugmentConfig,
    pub metrics: MetricsConfig,
}

impl SalesConfig {
    /// Load from a JSON file. Missing sections and fields take their defaults.
    pub fn load(path: &str) -> SalesResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SalesConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config from {path}");
        Ok(config)
    }

    pub fn validate(&self) -> SalesResult<()> {
        let aug = &self.augment;
        check_weights("satisfaction_weights", &aug.satisfaction_weights, 5)?;
        for weights in &aug.availability_weights {
            check_weights("availability_weights", weights, 4)?;
        }
        for params in &aug.rating_params {
            if !(params.std_dev >= 0.0) {
                return Err(invalid(format!("rating std_dev {} is negative", params.std_dev)));
            }
        }
        for (name, range) in [
            ("amazon_discount", aug.amazon_discount),
            ("mercadolibre_variation", aug.mercadolibre_variation),
            ("price_drift", aug.price_drift),
        ] {
            if !(range.low <= range.high) {
                return Err(invalid(format!("{name} range is inverted: [{}, {})", range.low, range.high)));
            }
        }
        if aug.max_day_jitter == 0 {
            return Err(invalid("max_day_jitter must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.metrics.cost_ratio) {
            return Err(invalid(format!("cost_ratio {} outside [0, 1)", self.metrics.cost_ratio)));
        }
        Ok(())
    }
}

fn check_weights(name: &str, weights: &[f64], expected_len: usize) -> SalesResult<()> {
    if weights.len() != expected_len {
        return Err(invalid(format!(
            "{name} needs {expected_len} entries, got {}",
            weights.len()
        )));
    }
    if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
        return Err(invalid(format!("{name} must be non-negative with a positive sum")));
    }
    Ok(())
}

fn invalid(message: String) -> SalesError {
    SalesError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SalesConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SalesConfig =
            serde_json::from_str(r#"{ "metrics": { "top_products": 5 } }"#).unwrap();
        assert_eq!(config.metrics.top_products, 5);
        assert_eq!(config.metrics.min_rotation, 5);
        assert_eq!(config.augment.months_forward, 5);
        assert_eq!(config.augment.price_floor, 1000.0);
    }

    #[test]
    fn short_weight_vector_rejected() {
        let mut config = SalesConfig::default();
        config.augment.satisfaction_weights = vec![0.5, 0.5];
        assert!(matches!(config.validate(), Err(SalesError::InvalidConfig(_))));
    }

    #[test]
    fn cost_ratio_of_one_rejected() {
        let mut config = SalesConfig::default();
        config.metrics.cost_ratio = 1.0;
        assert!(config.validate().is_err());
    }
}
