//! Shallow-ice flow law
//!
//! Ice flux is evaluated on a staggered grid: boundary `i + 1/2` sits between grid
//! points `i` and `i + 1`. Thickness and width at a boundary are the means of the two
//! neighbouring points and the surface slope is the centred difference across it.
//!
//! The depth-averaged velocity combines internal deformation (Glen's law, $n = 3$) and
//! basal sliding:
//!
//! $$u = \left(f_d h^{n+1} + f_s h^{n-1}\right) (\rho g)^n |\alpha|^{n-1} \alpha$$
//!
//! The flux through a rectangular section is $q = u h w$ and the equivalent nonlinear
//! diffusivity, used to bound the timestep, is
//!
//! $$D = \left(f_d h^{n+2} + f_s h^{n}\right) (\rho g)^n |\alpha|^{n-1}$$

use crate::geometry::GeometryProfile;
use crate::parameters::FlowParameters;
use crate::FloatValue;
use ndarray::Array1;

/// Fluxes and diffusivities at the cell boundaries of a flowline.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxField {
    /// Signed ice flux ($\text{m}^3\,\text{yr}^{-1}$) at every cell boundary, including the
    /// two domain boundaries which are always zero. Length `n_points + 1`; entry `i` is
    /// the flux entering grid point `i` from upstream.
    pub flux: Array1<FloatValue>,
    /// Diffusivity ($\text{m}^2\,\text{yr}^{-1}$) at the internal boundaries. Length `n_points - 1`.
    pub diffusivity: Array1<FloatValue>,
    /// Depth-averaged ice velocity ($\text{m yr}^{-1}$) at the internal boundaries.
    /// Length `n_points - 1`.
    pub velocity: Array1<FloatValue>,
}

impl FluxField {
    /// Largest diffusivity over the flowline, zero if there is no ice.
    pub fn max_diffusivity(&self) -> FloatValue {
        self.diffusivity.iter().fold(0.0, |acc: FloatValue, &d| acc.max(d))
    }

    /// Net outflow per unit area of each grid point ($\text{m yr}^{-1}$).
    ///
    /// $(q_{out} - q_{in}) / (w \Delta x)$; zero at points of zero width.
    pub fn divergence(&self, widths: &Array1<FloatValue>, dx: FloatValue) -> Array1<FloatValue> {
        Array1::from_shape_fn(widths.len(), |i| {
            let area = widths[i] * dx;
            if area > 0.0 {
                (self.flux[i + 1] - self.flux[i]) / area
            } else {
                0.0
            }
        })
    }
}

/// Evaluates the flow law for a fixed set of flow parameters.
///
/// The deformation and sliding factors are premultiplied by $(\rho g)^n$ and converted to
/// per-year units once, at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLaw {
    deformation: FloatValue,
    sliding: FloatValue,
}

impl FlowLaw {
    pub fn new(parameters: &FlowParameters) -> Self {
        let rho_g_n = parameters.rho_g_n();
        Self {
            deformation: parameters.deformation_factor() * rho_g_n,
            sliding: parameters.sliding_factor() * rho_g_n,
        }
    }

    /// Velocity and diffusivity for a single boundary.
    ///
    /// # Arguments
    ///
    /// * `thickness` - Ice thickness at the boundary (m)
    /// * `slope` - Surface slope, positive when the surface descends downstream
    ///
    /// # Returns
    ///
    /// `(velocity, diffusivity)` in $\text{m yr}^{-1}$ and $\text{m}^2\,\text{yr}^{-1}$
    pub fn velocity_and_diffusivity(
        &self,
        thickness: FloatValue,
        slope: FloatValue,
    ) -> (FloatValue, FloatValue) {
        if thickness <= 0.0 {
            return (0.0, 0.0);
        }
        let h2 = thickness * thickness;
        let slope2 = slope * slope;
        // (f_d h^4 + f_s h^2) |alpha|^2
        let coefficient = (self.deformation * h2 * h2 + self.sliding * h2) * slope2;
        (coefficient * slope, coefficient * thickness)
    }

    /// Evaluate fluxes over the whole flowline.
    ///
    /// No ice enters at the head and none leaves past the last grid point. A grid point of
    /// zero width holds no ice, so both of its boundaries are closed.
    pub fn evaluate(&self, geometry: &GeometryProfile) -> FluxField {
        let n = geometry.n_points();
        let dx = geometry.dx();
        let thickness = geometry.thickness();
        let surface = geometry.surface_view();
        let widths = geometry.widths_view();

        let mut flux = Array1::zeros(n + 1);
        let mut diffusivity = Array1::zeros(n - 1);
        let mut velocity = Array1::zeros(n - 1);

        for i in 0..n - 1 {
            let h_stag = 0.5 * (thickness[i] + thickness[i + 1]);
            if h_stag <= 0.0 || widths[i] <= 0.0 || widths[i + 1] <= 0.0 {
                continue;
            }
            let w_stag = 0.5 * (widths[i] + widths[i + 1]);
            let slope = (surface[i] - surface[i + 1]) / dx;

            let (u, d) = self.velocity_and_diffusivity(h_stag, slope);
            velocity[i] = u;
            diffusivity[i] = d;
            flux[i + 1] = u * h_stag * w_stag;
        }

        FluxField {
            flux,
            diffusivity,
            velocity,
        }
    }
}
