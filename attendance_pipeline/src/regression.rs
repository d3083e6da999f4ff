//! Single-feature power-law fit: ordinary least squares of
//! `ln(visitors)` on `ln(population)`.

use crate::error::{PipelineError, PipelineResult};

/// `visitors ≈ exp(intercept) · population^coefficient`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub coefficient: f64,
    pub intercept: f64,
}

/// Goodness of fit, in original (visitor) units on the training set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl PowerLaw {
    pub fn predict(&self, population: f64) -> f64 {
        self.intercept.exp() * population.powf(self.coefficient)
    }

    /// Fits `(population, visitors)` pairs; both must be positive.
    pub fn fit(samples: &[(f64, f64)]) -> PipelineResult<Self> {
        if samples.len() < 2 {
            return Err(PipelineError::Validation(format!(
                "need at least 2 samples to fit, got {}",
                samples.len()
            )));
        }
        if let Some((p, v)) = samples.iter().find(|(p, v)| !(*p > 0.0 && *v > 0.0)) {
            return Err(PipelineError::Validation(format!(
                "non-positive sample ({p}, {v}) cannot be log-transformed"
            )));
        }

        let n = samples.len() as f64;
        let xs: Vec<f64> = samples.iter().map(|(p, _)| p.ln()).collect();
        let ys: Vec<f64> = samples.iter().map(|(_, v)| v.ln()).collect();
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let (sxx, sxy) = xs
            .iter()
            .zip(&ys)
            .fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
                let dx = x - mean_x;
                (sxx + dx * dx, sxy + dx * (y - mean_y))
            });
        if sxx <= f64::EPSILON * n {
            return Err(PipelineError::Validation(
                "all samples share one population; slope is undefined".to_string(),
            ));
        }

        let coefficient = sxy / sxx;
        Ok(Self {
            coefficient,
            intercept: mean_y - coefficient * mean_x,
        })
    }

    /// R², RMSE and MAE of the back-transformed predictions.
    ///
    /// With constant targets R² is 1.0 for a perfect fit and 0.0 otherwise.
    pub fn evaluate(&self, samples: &[(f64, f64)]) -> Metrics {
        let n = samples.len() as f64;
        let mean_v = samples.iter().map(|(_, v)| v).sum::<f64>() / n;

        let (ss_res, ss_tot, abs_sum) =
            samples
                .iter()
                .fold((0.0, 0.0, 0.0), |(res, tot, abs), &(p, v)| {
                    let residual = v - self.predict(p);
                    (
                        res + residual * residual,
                        tot + (v - mean_v) * (v - mean_v),
                        abs + residual.abs(),
                    )
                });

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res.sqrt() <= 1e-9 * mean_v.abs().max(1.0) {
            1.0
        } else {
            0.0
        };

        Metrics {
            r2,
            rmse: (ss_res / n).sqrt(),
            mae: abs_sum / n,
        }
    }
}
