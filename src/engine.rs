use std::sync::Arc;

use polars::prelude::*;
use serde::Serialize;

use crate::aggregation::{finite_or_zero, ChartCatalog, ChartSeries};
use crate::dataset::Dataset;
use crate::error::ChurnError;
use crate::filter::FilterSelection;
use crate::schema::{customer, kpi};

/// The five headline numbers of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// Mean of the churn flag, in percent.
    pub churn_rate_pct: f64,
    pub avg_cltv: f64,
    pub avg_monthly_charge: f64,
    pub avg_tenure_months: f64,
    /// Mean of the senior-citizen flag, in percent.
    pub senior_pct: f64,
}

impl Kpis {
    /// All zero; reported for an empty view.
    pub const ZERO: Self = Self {
        churn_rate_pct: 0.0,
        avg_cltv: 0.0,
        avg_monthly_charge: 0.0,
        avg_tenure_months: 0.0,
        senior_pct: 0.0,
    };

    pub fn compute(view: &DataFrame) -> Result<Self, ChurnError> {
        if view.height() == 0 {
            return Ok(Self::ZERO);
        }

        let row = view
            .clone()
            .lazy()
            .select([
                col(customer::CHURNED)
                    .cast(DataType::Float64)
                    .mean()
                    .alias(kpi::CHURN_RATE),
                col(customer::CLTV).mean().alias(kpi::AVG_CLTV),
                col(customer::MONTHLY_CHARGE)
                    .mean()
                    .alias(kpi::AVG_MONTHLY_CHARGE),
                col(customer::TENURE_MONTHS)
                    .cast(DataType::Float64)
                    .mean()
                    .alias(kpi::AVG_TENURE),
                col(customer::SENIOR_CITIZEN)
                    .cast(DataType::Float64)
                    .mean()
                    .alias(kpi::SENIOR_PCT),
            ])
            .collect()?;

        let read = |name: &str| -> Result<f64, ChurnError> {
            Ok(finite_or_zero(row.column(name)?.f64()?.get(0)))
        };

        Ok(Self {
            churn_rate_pct: read(kpi::CHURN_RATE)? * 100.0,
            avg_cltv: read(kpi::AVG_CLTV)?,
            avg_monthly_charge: read(kpi::AVG_MONTHLY_CHARGE)?,
            avg_tenure_months: read(kpi::AVG_TENURE)?,
            senior_pct: read(kpi::SENIOR_PCT)? * 100.0,
        })
    }
}

/// Everything the presentation layer needs for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub record_count: usize,
    pub kpis: Kpis,
    pub series: Vec<ChartSeries>,
}

impl AggregationResult {
    /// Zero KPIs and one empty series per chart.
    pub fn empty(catalog: &ChartCatalog) -> Self {
        Self {
            record_count: 0,
            kpis: Kpis::ZERO,
            series: catalog.charts().iter().map(|c| c.empty_series()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    pub fn series(&self, id: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.id == id)
    }
}

/// Recomputes the dashboard from the shared table for a given selection.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    dataset: Arc<Dataset>,
    catalog: ChartCatalog,
}

impl AggregationEngine {
    pub fn new(dataset: Arc<Dataset>, catalog: ChartCatalog) -> Self {
        Self { dataset, catalog }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn catalog(&self) -> &ChartCatalog {
        &self.catalog
    }

    pub fn compute(&self, selection: &FilterSelection) -> Result<AggregationResult, ChurnError> {
        let view = self.dataset.filtered(selection)?;
        log::debug!(
            "Selection {:?}/{:?} matched {} of {} records",
            selection.contracts(),
            selection.payment_methods(),
            view.height(),
            self.dataset.len()
        );

        if view.height() == 0 {
            return Ok(AggregationResult::empty(&self.catalog));
        }

        let series = self
            .catalog
            .charts()
            .iter()
            .map(|chart| chart.evaluate(&view))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AggregationResult {
            record_count: view.height(),
            kpis: Kpis::compute(&view)?,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{Aggregation, ChartKind, ChartSpec, Dimension};
    use crate::category::{ContractType, Gender};
    use crate::dataset::CustomerRecord;
    use pretty_assertions::assert_eq;

    fn record(contract: ContractType, churned: bool, cltv: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id: format!("{contract:?}-{cltv}"),
            gender: Some(Gender::Male),
            senior_citizen: false,
            contract: Some(contract),
            payment_method: None,
            monthly_charge: cltv / 10.0,
            cltv,
            tenure_months: 10,
            churned,
            churn_score: 50.0,
            phone_service: None,
            internet_service: None,
            online_security: None,
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn engine() -> AggregationEngine {
        let dataset = Dataset::from_records(&[
            record(ContractType::MonthToMonth, true, 100.0),
            record(ContractType::MonthToMonth, false, 200.0),
            record(ContractType::OneYear, false, 300.0),
        ])
        .unwrap();
        let catalog = ChartCatalog::new(vec![ChartSpec::new(
            "churn_by_contract",
            ChartKind::Bar,
            Aggregation::Mean(customer::CHURNED),
        )
        .by(Dimension::Contract)]);
        AggregationEngine::new(Arc::new(dataset), catalog)
    }

    #[test]
    fn month_to_month_selection() {
        let selection = FilterSelection::new().with_contracts([ContractType::MonthToMonth]);
        let result = engine().compute(&selection).unwrap();
        assert_eq!(result.record_count, 2);
        assert_eq!(result.kpis.churn_rate_pct, 50.0);
        assert_eq!(result.kpis.avg_cltv, 150.0);
    }

    #[test]
    fn no_match_yields_zeroes_and_empty_series() {
        let selection = FilterSelection::new().with_contracts([ContractType::TwoYear]);
        let result = engine().compute(&selection).unwrap();
        assert_eq!(result.record_count, 0);
        assert_eq!(result.kpis, Kpis::ZERO);
        assert_eq!(result.series.len(), 1);
        assert!(result.series.iter().all(ChartSeries::is_empty));
    }

    #[test]
    fn kpis_of_empty_frame_are_zero() {
        let engine = engine();
        let empty = engine.dataset().frame().head(Some(0));
        assert_eq!(Kpis::compute(&empty).unwrap(), Kpis::ZERO);
    }
}
