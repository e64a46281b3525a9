//! Flowline geometry
//!
//! A [`GeometryProfile`] describes a glacier centreline discretised on a uniform grid.
//! Grid point 0 is the glacier head; the flow runs towards increasing indices.
//! Cross-sections are rectangular, so the ice section at a point is `thickness * width`.

use crate::constants::ICE_TOLERANCE;
use crate::errors::{RSGMError, RSGMResult};
use crate::FloatValue;
use ndarray::{Array, Array1, Zip};
use serde::{Deserialize, Serialize};

/// Minimum number of grid points needed to define at least one cell boundary.
pub const MIN_POINTS: usize = 2;

/// Bed, surface and width of a flowline.
///
/// The bed, widths and grid spacing are fixed at construction. The surface elevation is
/// the evolving state and is only written by the time-stepping code, which guarantees
/// that it never drops below the bed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeometryProfileData")]
pub struct GeometryProfile {
    bed: Array1<FloatValue>,
    surface: Array1<FloatValue>,
    widths: Array1<FloatValue>,
    /// Grid spacing (m)
    dx: FloatValue,
}

/// Unvalidated form of a serialised [`GeometryProfile`].
#[derive(Deserialize)]
struct GeometryProfileData {
    bed: Array1<FloatValue>,
    surface: Array1<FloatValue>,
    widths: Array1<FloatValue>,
    dx: FloatValue,
}

impl TryFrom<GeometryProfileData> for GeometryProfile {
    type Error = RSGMError;

    fn try_from(data: GeometryProfileData) -> RSGMResult<Self> {
        Self::new(data.bed, data.surface, data.widths, data.dx)
    }
}

impl GeometryProfile {
    /// Create a profile from a bed/surface/width triple.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the arrays differ in length, have fewer than
    /// [`MIN_POINTS`] points, contain non-finite values, have a negative width, have a
    /// surface below the bed, or if `dx` is not positive.
    pub fn new(
        bed: Array1<FloatValue>,
        surface: Array1<FloatValue>,
        widths: Array1<FloatValue>,
        dx: FloatValue,
    ) -> RSGMResult<Self> {
        let n = bed.len();
        if n < MIN_POINTS {
            return Err(RSGMError::TooFewPoints {
                minimum: MIN_POINTS,
                actual: n,
            });
        }
        for (name, len) in [("surface", surface.len()), ("widths", widths.len())] {
            if len != n {
                return Err(RSGMError::LengthMismatch {
                    name: name.to_string(),
                    expected: n,
                    actual: len,
                });
            }
        }
        if !dx.is_finite() || dx <= 0.0 {
            return Err(RSGMError::InvalidGridSpacing(dx));
        }

        for (index, ((&b, &s), &w)) in bed.iter().zip(surface.iter()).zip(widths.iter()).enumerate()
        {
            if !b.is_finite() {
                return Err(invalid_value("bed elevation", index, b, "Must be finite"));
            }
            if !s.is_finite() {
                return Err(invalid_value("surface elevation", index, s, "Must be finite"));
            }
            if s < b {
                return Err(invalid_value(
                    "surface elevation",
                    index,
                    s,
                    &format!("Surface is below the bed ({})", b),
                ));
            }
            if !w.is_finite() || w < 0.0 {
                return Err(invalid_value(
                    "width",
                    index,
                    w,
                    "Must be finite and non-negative",
                ));
            }
        }

        Ok(Self {
            bed,
            surface,
            widths,
            dx,
        })
    }

    /// Create an ice-free profile where the surface coincides with the bed.
    pub fn from_bed(
        bed: Array1<FloatValue>,
        widths: Array1<FloatValue>,
        dx: FloatValue,
    ) -> RSGMResult<Self> {
        let surface = bed.clone();
        Self::new(bed, surface, widths, dx)
    }

    /// Create an ice-free profile with a linearly descending bed and constant width.
    ///
    /// # Arguments
    ///
    /// * `top` - Bed elevation at the glacier head (m)
    /// * `bottom` - Bed elevation at the last grid point (m)
    /// * `n_points` - Number of grid points
    /// * `dx` - Grid spacing (m)
    /// * `width` - Channel width (m)
    pub fn linear(
        top: FloatValue,
        bottom: FloatValue,
        n_points: usize,
        dx: FloatValue,
        width: FloatValue,
    ) -> RSGMResult<Self> {
        if n_points < MIN_POINTS {
            return Err(RSGMError::TooFewPoints {
                minimum: MIN_POINTS,
                actual: n_points,
            });
        }
        let bed = Array::linspace(top, bottom, n_points);
        let widths = Array1::from_elem(n_points, width);
        Self::from_bed(bed, widths, dx)
    }

    /// Number of grid points
    pub fn n_points(&self) -> usize {
        self.bed.len()
    }

    /// Grid spacing (m)
    pub fn dx(&self) -> FloatValue {
        self.dx
    }

    /// Ice thickness at each grid point (m).
    ///
    /// Returns a copy; values are never negative.
    pub fn thickness(&self) -> Array1<FloatValue> {
        Zip::from(&self.surface)
            .and(&self.bed)
            .map_collect(|&s, &b| (s - b).max(0.0))
    }

    /// Snapshot of the surface elevation (m)
    pub fn surface_elevation(&self) -> Array1<FloatValue> {
        self.surface.clone()
    }

    /// Snapshot of the bed elevation (m)
    pub fn bed_elevation(&self) -> Array1<FloatValue> {
        self.bed.clone()
    }

    /// Snapshot of the channel widths (m)
    pub fn widths(&self) -> Array1<FloatValue> {
        self.widths.clone()
    }

    pub(crate) fn surface_view(&self) -> &Array1<FloatValue> {
        &self.surface
    }

    pub(crate) fn widths_view(&self) -> &Array1<FloatValue> {
        &self.widths
    }

    /// Glacier length (m).
    ///
    /// Measured from the head to the far edge of the last cell whose thickness exceeds
    /// [`ICE_TOLERANCE`]. Zero for an ice-free profile.
    pub fn length(&self) -> FloatValue {
        let thickness = self.thickness();
        thickness
            .iter()
            .rposition(|&h| h > ICE_TOLERANCE)
            .map_or(0.0, |last| (last + 1) as FloatValue * self.dx)
    }

    /// Glacier surface area ($\text{m}^2$)
    pub fn area(&self) -> FloatValue {
        Zip::from(&self.thickness())
            .and(&self.widths)
            .fold(0.0, |acc, &h, &w| if h > 0.0 { acc + w * self.dx } else { acc })
    }

    /// Glacier volume ($\text{m}^3$)
    pub fn volume(&self) -> FloatValue {
        Zip::from(&self.thickness())
            .and(&self.widths)
            .fold(0.0, |acc, &h, &w| if h > 0.0 { acc + h * w * self.dx } else { acc })
    }

    /// Replace the ice thickness, clamping negative values to zero.
    ///
    /// Keeps `surface >= bed` at every grid point.
    pub(crate) fn set_thickness(&mut self, thickness: &Array1<FloatValue>) {
        Zip::from(&mut self.surface)
            .and(&self.bed)
            .and(thickness)
            .for_each(|s, &b, &h| *s = b + h.max(0.0));
    }
}

fn invalid_value(name: &str, index: usize, value: FloatValue, reason: &str) -> RSGMError {
    RSGMError::InvalidProfileValue {
        name: name.to_string(),
        index,
        value,
        reason: reason.to_string(),
    }
}
