//! Time series of glacier-wide diagnostics.

use crate::model::FlowlineModel;
use crate::{FloatValue, Time};
use serde::{Deserialize, Serialize};

/// Length, area and volume sampled while a model runs.
///
/// All four vectors have the same length and samples are ordered by year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelHistory {
    pub years: Vec<Time>,
    /// Glacier length (m)
    pub length: Vec<FloatValue>,
    /// Glacier area ($\text{m}^2$)
    pub area: Vec<FloatValue>,
    /// Glacier volume ($\text{m}^3$)
    pub volume: Vec<FloatValue>,
}

impl ModelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the current state of `model`.
    pub fn record(&mut self, model: &FlowlineModel) {
        self.years.push(model.year());
        self.length.push(model.length());
        self.area.push(model.area());
        self.volume.push(model.volume());
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Time taken to complete $1 - e^{-1}$ of the total volume change.
    ///
    /// The change is measured between the first and last sample, and the crossing year
    /// is linearly interpolated between the two samples that bracket it. Returns `None`
    /// with fewer than two samples or if the volume did not change.
    pub fn response_time(&self) -> Option<Time> {
        if self.len() < 2 {
            return None;
        }
        let first = self.volume[0];
        let last = self.volume[self.len() - 1];
        let total_change = last - first;
        if total_change == 0.0 {
            return None;
        }
        let target = first + total_change * (1.0 - FloatValue::exp(-1.0));

        // Progress towards `target`, positive once it has been reached
        let progress = |v: FloatValue| (v - target) * total_change.signum();
        for i in 1..self.len() {
            let (v0, v1) = (self.volume[i - 1], self.volume[i]);
            if progress(v1) >= 0.0 {
                let (t0, t1) = (self.years[i - 1], self.years[i]);
                let fraction = if v1 == v0 {
                    1.0
                } else {
                    ((target - v0) / (v1 - v0)).clamp(0.0, 1.0)
                };
                return Some(t0 + fraction * (t1 - t0) - self.years[0]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    fn history(years: &[Time], volume: &[FloatValue]) -> ModelHistory {
        ModelHistory {
            years: years.to_vec(),
            length: vec![0.0; years.len()],
            area: vec![0.0; years.len()],
            volume: volume.to_vec(),
        }
    }

    #[test]
    fn test_response_time_growth() {
        let h = history(&[0.0, 10.0, 20.0], &[0.0, 100.0, 100.0]);
        // Target is 63.2 m3, reached 6.32 years into the first interval
        let expected = 10.0 * (1.0 - (-1.0_f64).exp());
        let rt = h.response_time().unwrap();
        assert!(is_close!(rt, expected), "rt = {}", rt);
    }

    #[test]
    fn test_response_time_retreat() {
        let h = history(&[100.0, 110.0, 120.0], &[100.0, 50.0, 0.0]);
        // Target is 36.8 m3, crossed in the second interval
        let target = 100.0 * (-1.0_f64).exp();
        let expected = 10.0 + 10.0 * (50.0 - target) / 50.0;
        let rt = h.response_time().unwrap();
        assert!(is_close!(rt, expected), "rt = {}", rt);
    }

    #[test]
    fn test_response_time_undefined() {
        assert_eq!(ModelHistory::new().response_time(), None);
        assert_eq!(history(&[0.0], &[1.0]).response_time(), None);
        assert_eq!(history(&[0.0, 1.0], &[5.0, 5.0]).response_time(), None);
    }
}
