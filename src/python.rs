use std::path::PathBuf;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;
use strum::IntoEnumIterator;

use crate::aggregation::ChartVariant;
use crate::category::{CodedCategory, ContractType, PaymentMethod};
use crate::config::DashboardConfig;
use crate::engine::AggregationEngine;
use crate::filter::FilterSelection;
use crate::presentation::{DashboardPayload, Locale};
use crate::schema;

#[pyclass(name = "ChurnDashboard")]
pub struct PyChurnDashboard {
    engine: AggregationEngine,
    locale: Locale,
}

#[pymethods]
impl PyChurnDashboard {
    /// Load the customer CSV once.
    ///
    /// variant: "classic" or "full" chart set
    /// locale: "en" or "pt-br" for titles and formatted KPIs
    #[new]
    #[pyo3(signature = (path, variant="full", locale="en"))]
    fn new(path: String, variant: &str, locale: &str) -> PyResult<Self> {
        let variant: ChartVariant = variant.parse().map_err(|_| {
            PyValueError::new_err(format!(
                "Invalid variant: '{variant}'. Must be 'classic' or 'full'"
            ))
        })?;
        let locale: Locale = locale.parse().map_err(|_| {
            PyValueError::new_err(format!(
                "Invalid locale: '{locale}'. Must be 'en' or 'pt-br'"
            ))
        })?;

        let config = DashboardConfig {
            data_path: PathBuf::from(path),
            variant,
            locale,
        };
        Ok(Self {
            engine: config.build_engine()?,
            locale,
        })
    }

    /// Recompute KPIs and chart series for a selection; returns JSON.
    /// `None` or an empty list leaves that column unfiltered.
    #[pyo3(signature = (contracts=None, payment_methods=None))]
    fn compute(
        &self,
        contracts: Option<Vec<String>>,
        payment_methods: Option<Vec<String>>,
    ) -> PyResult<String> {
        let selection = FilterSelection::from_labels(
            contracts.unwrap_or_default(),
            payment_methods.unwrap_or_default(),
        );
        let result = self.engine.compute(&selection)?;
        Ok(DashboardPayload::new(&result, self.locale).to_json(false)?)
    }

    /// The filtered rows as a Polars DataFrame.
    #[pyo3(signature = (contracts=None, payment_methods=None))]
    fn filtered_frame(
        &self,
        contracts: Option<Vec<String>>,
        payment_methods: Option<Vec<String>>,
    ) -> PyResult<PyDataFrame> {
        let selection = FilterSelection::from_labels(
            contracts.unwrap_or_default(),
            payment_methods.unwrap_or_default(),
        );
        Ok(PyDataFrame(self.engine.dataset().filtered(&selection)?))
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn record_count(&self) -> usize {
        self.engine.dataset().len()
    }

    #[getter]
    fn contract_options(&self) -> Vec<&'static str> {
        ContractType::iter().map(CodedCategory::label).collect()
    }

    #[getter]
    fn payment_method_options(&self) -> Vec<&'static str> {
        PaymentMethod::iter().map(CodedCategory::label).collect()
    }

    #[getter]
    fn chart_ids(&self) -> Vec<&'static str> {
        self.engine.catalog().charts().iter().map(|c| c.id).collect()
    }

    #[getter]
    fn customers_df(&self) -> PyDataFrame {
        PyDataFrame(self.engine.dataset().frame().clone())
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let columns = PyModule::new(m.py(), "columns")?;
    columns.add("CUSTOMER_ID", schema::customer::CUSTOMER_ID)?;
    columns.add("GENDER", schema::customer::GENDER)?;
    columns.add("SENIOR_CITIZEN", schema::customer::SENIOR_CITIZEN)?;
    columns.add("CONTRACT", schema::customer::CONTRACT)?;
    columns.add("PAYMENT_METHOD", schema::customer::PAYMENT_METHOD)?;
    columns.add("MONTHLY_CHARGE", schema::customer::MONTHLY_CHARGE)?;
    columns.add("CLTV", schema::customer::CLTV)?;
    columns.add("TENURE_MONTHS", schema::customer::TENURE_MONTHS)?;
    columns.add("CHURNED", schema::customer::CHURNED)?;
    columns.add("CHURN_SCORE", schema::customer::CHURN_SCORE)?;
    columns.add("LATITUDE", schema::customer::LATITUDE)?;
    columns.add("LONGITUDE", schema::customer::LONGITUDE)?;
    m.add_submodule(&columns)?;

    let source = PyModule::new(m.py(), "source")?;
    source.add("REQUIRED", schema::source::REQUIRED.to_vec())?;
    m.add_submodule(&source)?;

    let kpi = PyModule::new(m.py(), "kpi")?;
    kpi.add("ALL", schema::kpi::ALL.to_vec())?;
    m.add_submodule(&kpi)?;

    Ok(())
}

#[pymodule]
fn churnlens(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyChurnDashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
