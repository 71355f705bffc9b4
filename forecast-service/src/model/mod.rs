use energy_domain::HourlyFeatures;

use crate::pipeline::PipelineError;

/// Ordinary least squares line `consumption = intercept + slope * hour`.
///
/// Hour is treated as a plain linear feature: 23 and 0 are far apart, and
/// `predict` extrapolates to any hour value without wrapping or clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Fits over the given rows.
    ///
    /// When every row has the same hour the slope is undetermined; the fit
    /// then falls back to a flat line through the mean consumption.
    pub fn fit(rows: &[HourlyFeatures]) -> Result<Self, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let n = rows.len() as f64;
        let mean_x = rows.iter().map(|r| f64::from(r.hour)).sum::<f64>() / n;
        let mean_y = rows.iter().map(|r| r.observation.consumption).sum::<f64>() / n;

        let (sxx, sxy) = rows.iter().fold((0.0, 0.0), |(sxx, sxy), r| {
            let dx = f64::from(r.hour) - mean_x;
            let dy = r.observation.consumption - mean_y;
            (sxx + dx * dx, sxy + dx * dy)
        });

        let model = if sxx == 0.0 {
            tracing::debug!(hour = mean_x, "constant hour feature, fitting flat line");
            Self {
                slope: 0.0,
                intercept: mean_y,
            }
        } else {
            let slope = sxy / sxx;
            Self {
                slope,
                intercept: mean_y - slope * mean_x,
            }
        };

        metrics::gauge!("forecast_model_slope").set(model.slope);
        metrics::gauge!("forecast_model_intercept").set(model.intercept);

        Ok(model)
    }

    pub fn predict(&self, hour: f64) -> f64 {
        self.intercept + self.slope * hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_domain::Observation;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use time::macros::datetime;

    fn row(hour: u8, consumption: f64) -> HourlyFeatures {
        HourlyFeatures {
            observation: Observation {
                timestamp: datetime!(2026-01-22 00:00:00).replace_hour(hour).unwrap().into(),
                consumption,
                production: 0.0,
            },
            hour,
            day_of_year: 22,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn three_points_on_a_line_fit_exactly() {
        let model = LinearModel::fit(&[row(0, 100.0), row(1, 110.0), row(2, 120.0)]).unwrap();
        assert_close(model.slope, 10.0);
        assert_close(model.intercept, 100.0);
        assert_close(model.predict(3.0), 130.0);
    }

    #[test]
    fn noisy_points_match_closed_form() {
        // x = 0,1,2,3 ; y = 1,3,2,5 -> slope 1.1, intercept 1.1
        let rows = [row(0, 1.0), row(1, 3.0), row(2, 2.0), row(3, 5.0)];
        let model = LinearModel::fit(&rows).unwrap();
        assert_close(model.slope, 1.1);
        assert_close(model.intercept, 1.1);
    }

    #[test]
    fn constant_hour_falls_back_to_mean() {
        let model = LinearModel::fit(&[row(5, 90.0), row(5, 110.0), row(5, 130.0)]).unwrap();
        assert_eq!(model.slope, 0.0);
        assert_close(model.intercept, 110.0);
    }

    fn rendered_gauge(rendered: &str, name: &str) -> Option<f64> {
        rendered
            .lines()
            .filter(|l| !l.starts_with('#'))
            .find_map(|l| l.strip_prefix(name)?.trim().parse().ok())
    }

    #[test]
    fn constant_hour_fit_still_reports_coefficients() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            LinearModel::fit(&[row(5, 90.0), row(5, 110.0), row(5, 130.0)]).unwrap();
        });

        let rendered = handle.render();
        assert_eq!(rendered_gauge(&rendered, "forecast_model_slope"), Some(0.0));
        assert_eq!(rendered_gauge(&rendered, "forecast_model_intercept"), Some(110.0));
    }

    #[test]
    fn single_row_is_flat() {
        let model = LinearModel::fit(&[row(7, 42.0)]).unwrap();
        assert_eq!(model, LinearModel { slope: 0.0, intercept: 42.0 });
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(LinearModel::fit(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn predict_extrapolates_without_wrapping() {
        let model = LinearModel { slope: -2.0, intercept: 10.0 };
        assert_close(model.predict(24.0), -38.0);
        assert_close(model.predict(-1.0), 12.0);
    }
}
