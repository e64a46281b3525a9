//! Python bindings
//!
//! Exposes the linear mass-balance model and the flowline model. Arrays are returned as
//! fresh numpy copies, so Python code can never alias the model state.

use numpy::PyArray1;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use rsgm_core::errors::RSGMError;
use rsgm_core::geometry::GeometryProfile;
use rsgm_core::mass_balance::{LinearMassBalance, MassBalanceModel};
use rsgm_core::model::{EquilibriumReport, FlowlineModel};
use rsgm_core::parameters::ModelParameters;
use rsgm_core::{FloatValue, Time};
use std::sync::Arc;

fn to_py_err(err: RSGMError) -> PyErr {
    if err.is_configuration_error() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

fn to_numpy(py: Python<'_>, values: ndarray::Array1<FloatValue>) -> Bound<'_, PyArray1<FloatValue>> {
    PyArray1::from_vec_bound(py, values.to_vec())
}

#[pyclass]
#[pyo3(name = "LinearMassBalance")]
#[derive(Debug, Clone)]
pub struct PyLinearMassBalance(Arc<LinearMassBalance>);

#[pymethods]
impl PyLinearMassBalance {
    #[new]
    #[pyo3(signature = (ela_h, grad=3.0, max_mb=None))]
    fn new(ela_h: FloatValue, grad: FloatValue, max_mb: Option<FloatValue>) -> PyResult<Self> {
        let mb = LinearMassBalance::new(ela_h, grad).map_err(to_py_err)?;
        let mb = match max_mb {
            Some(cap) => mb.with_max_mb(cap).map_err(to_py_err)?,
            None => mb,
        };
        Ok(Self(Arc::new(mb)))
    }

    #[getter]
    fn ela_h(&self) -> FloatValue {
        self.0.ela()
    }

    #[getter]
    fn grad(&self) -> FloatValue {
        self.0.grad()
    }

    #[getter]
    fn max_mb(&self) -> Option<FloatValue> {
        self.0.max_mb()
    }

    /// Mass balance at each elevation (mm w.e. yr-1)
    fn get_annual_mb<'py>(
        &self,
        py: Python<'py>,
        elevations: Vec<FloatValue>,
    ) -> Bound<'py, PyArray1<FloatValue>> {
        let elevations = ndarray::Array1::from_vec(elevations);
        to_numpy(py, self.0.annual_mass_balance(elevations.view()))
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
}

#[pyclass]
#[pyo3(name = "EquilibriumReport")]
#[derive(Debug, Clone)]
pub struct PyEquilibriumReport(EquilibriumReport);

#[pymethods]
impl PyEquilibriumReport {
    #[getter]
    fn converged(&self) -> bool {
        self.0.converged
    }

    #[getter]
    fn probes(&self) -> usize {
        self.0.probes
    }

    #[getter]
    fn year(&self) -> Time {
        self.0.year
    }

    #[getter]
    fn relative_change(&self) -> FloatValue {
        self.0.relative_change
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// Flowline glacier model.
///
/// `parameters` is an optional dict with `flow` and `numerics` entries; missing values
/// take their defaults. `glen_a` and `fs` override the flow parameters.
#[pyclass]
#[pyo3(name = "FlowlineModel")]
pub struct PyFlowlineModel(FlowlineModel);

#[pymethods]
impl PyFlowlineModel {
    #[new]
    #[pyo3(signature = (bed, widths, dx, mb_model, surface=None, y0=0.0, glen_a=None, fs=None, parameters=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        bed: Vec<FloatValue>,
        widths: Vec<FloatValue>,
        dx: FloatValue,
        mb_model: &PyLinearMassBalance,
        surface: Option<Vec<FloatValue>>,
        y0: Time,
        glen_a: Option<FloatValue>,
        fs: Option<FloatValue>,
        parameters: Option<Bound<'_, PyAny>>,
    ) -> PyResult<Self> {
        let bed = ndarray::Array1::from_vec(bed);
        let widths = ndarray::Array1::from_vec(widths);
        let geometry = match surface {
            Some(surface) => {
                GeometryProfile::new(bed, ndarray::Array1::from_vec(surface), widths, dx)
            }
            None => GeometryProfile::from_bed(bed, widths, dx),
        }
        .map_err(to_py_err)?;

        let mut params = match parameters {
            Some(parameters) => pythonize::depythonize_bound::<ModelParameters>(parameters)
                .map_err(|e| PyValueError::new_err(format!("{}", e)))?,
            None => ModelParameters::default(),
        };
        if let Some(glen_a) = glen_a {
            params.flow.glen_a = glen_a;
        }
        if let Some(fs) = fs {
            params.flow.fs = fs;
        }

        let mass_balance: Arc<dyn MassBalanceModel> = mb_model.0.clone();
        FlowlineModel::new(geometry, mass_balance, params, y0)
            .map(Self)
            .map_err(to_py_err)
    }

    #[getter]
    fn yr(&self) -> Time {
        self.0.year()
    }

    #[getter]
    fn length_m(&self) -> FloatValue {
        self.0.length()
    }

    #[getter]
    fn area_m2(&self) -> FloatValue {
        self.0.area()
    }

    #[getter]
    fn volume_m3(&self) -> FloatValue {
        self.0.volume()
    }

    #[getter]
    fn thick<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<FloatValue>> {
        to_numpy(py, self.0.thickness())
    }

    #[getter]
    fn surface_h<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<FloatValue>> {
        to_numpy(py, self.0.surface_elevation())
    }

    #[getter]
    fn bed_h<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<FloatValue>> {
        to_numpy(py, self.0.bed_elevation())
    }

    #[getter]
    fn widths_m<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<FloatValue>> {
        to_numpy(py, self.0.widths())
    }

    #[getter]
    fn velocities<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<FloatValue>> {
        to_numpy(py, self.0.velocities())
    }

    /// Current parameters as a dict
    #[getter]
    fn parameters(&self, py: Python<'_>) -> PyResult<PyObject> {
        pythonize::pythonize(py, self.0.parameters())
            .map_err(|e| PyValueError::new_err(format!("{}", e)))
    }

    fn specific_mass_balance(&self) -> FloatValue {
        self.0.specific_mass_balance()
    }

    fn run_until(&mut self, y1: Time) -> PyResult<()> {
        self.0.run_until(y1).map_err(to_py_err)
    }

    /// Run to `y1`, returning `(years, length, area, volume)` sampled every `store_interval` years.
    #[pyo3(signature = (y1, store_interval=1.0))]
    fn run_until_and_store(
        &mut self,
        y1: Time,
        store_interval: Time,
    ) -> PyResult<(Vec<Time>, Vec<FloatValue>, Vec<FloatValue>, Vec<FloatValue>)> {
        let history = self
            .0
            .run_until_and_store(y1, store_interval)
            .map_err(to_py_err)?;
        Ok((history.years, history.length, history.area, history.volume))
    }

    #[pyo3(signature = (rate=0.001, ystep=5.0, max_ite=200))]
    fn run_until_equilibrium(
        &mut self,
        rate: FloatValue,
        ystep: Time,
        max_ite: usize,
    ) -> PyResult<PyEquilibriumReport> {
        self.0
            .run_until_equilibrium(rate, ystep, max_ite)
            .map(PyEquilibriumReport)
            .map_err(to_py_err)
    }

    /// A new model continuing from this state under a different mass balance.
    fn with_mass_balance(&self, mb_model: &PyLinearMassBalance) -> Self {
        let mass_balance: Arc<dyn MassBalanceModel> = mb_model.0.clone();
        Self(self.0.clone().with_mass_balance(mass_balance))
    }

    fn __repr__(&self) -> String {
        format!(
            "FlowlineModel(yr={}, length_m={}, volume_m3={:.4e})",
            self.0.year(),
            self.0.length(),
            self.0.volume()
        )
    }
}

#[pymodule]
#[pyo3(name = "_lib")]
fn rsgm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyLinearMassBalance>()?;
    m.add_class::<PyEquilibriumReport>()?;
    m.add_class::<PyFlowlineModel>()?;
    Ok(())
}
