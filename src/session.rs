use std::sync::Arc;

use crate::category::{ContractType, PaymentMethod};
use crate::engine::{AggregationEngine, AggregationResult};
use crate::error::ChurnError;
use crate::filter::FilterSelection;

/// One user's view of the dashboard.
///
/// Owns the selector state and the single live result; the engine and its
/// table are shared. Every selector change recomputes synchronously and
/// replaces the previous result.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    engine: Arc<AggregationEngine>,
    selection: FilterSelection,
    current: AggregationResult,
}

impl DashboardSession {
    pub fn open(engine: Arc<AggregationEngine>) -> Result<Self, ChurnError> {
        let selection = FilterSelection::new();
        let current = engine.compute(&selection)?;
        Ok(Self {
            engine,
            selection,
            current,
        })
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn current(&self) -> &AggregationResult {
        &self.current
    }

    pub fn select_contracts(
        &mut self,
        contracts: impl IntoIterator<Item = ContractType>,
    ) -> Result<&AggregationResult, ChurnError> {
        let selection = self.selection.clone().with_contracts(contracts);
        self.apply(selection)
    }

    pub fn select_payment_methods(
        &mut self,
        methods: impl IntoIterator<Item = PaymentMethod>,
    ) -> Result<&AggregationResult, ChurnError> {
        let selection = self.selection.clone().with_payment_methods(methods);
        self.apply(selection)
    }

    /// Replace the whole selection at once.
    pub fn apply(&mut self, selection: FilterSelection) -> Result<&AggregationResult, ChurnError> {
        self.current = self.engine.compute(&selection)?;
        self.selection = selection;
        Ok(&self.current)
    }

    pub fn clear(&mut self) -> Result<&AggregationResult, ChurnError> {
        self.apply(FilterSelection::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::ChartCatalog;
    use crate::category::Gender;
    use crate::dataset::{CustomerRecord, Dataset};

    fn engine() -> Arc<AggregationEngine> {
        let record = |contract, payment, churned| CustomerRecord {
            customer_id: "id".into(),
            gender: Some(Gender::Female),
            senior_citizen: true,
            contract: Some(contract),
            payment_method: Some(payment),
            monthly_charge: 50.0,
            cltv: 500.0,
            tenure_months: 24,
            churned,
            churn_score: 30.0,
            phone_service: None,
            internet_service: None,
            online_security: None,
            latitude: 10.0,
            longitude: 20.0,
        };
        let dataset = Dataset::from_records(&[
            record(ContractType::OneYear, PaymentMethod::MailedCheck, true),
            record(ContractType::OneYear, PaymentMethod::CreditCard, false),
            record(ContractType::TwoYear, PaymentMethod::MailedCheck, false),
        ])
        .unwrap();
        Arc::new(AggregationEngine::new(
            Arc::new(dataset),
            ChartCatalog::classic(),
        ))
    }

    #[test]
    fn selectors_narrow_and_clear_restores() {
        let mut session = DashboardSession::open(engine()).unwrap();
        assert_eq!(session.current().record_count, 3);

        session.select_contracts([ContractType::OneYear]).unwrap();
        assert_eq!(session.current().record_count, 2);

        let result = session
            .select_payment_methods([PaymentMethod::MailedCheck])
            .unwrap();
        assert_eq!(result.record_count, 1);
        assert_eq!(result.kpis.churn_rate_pct, 100.0);

        session.clear().unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.current().record_count, 3);
    }

    #[test]
    fn sessions_sharing_an_engine_stay_independent() {
        let engine = engine();
        let mut a = DashboardSession::open(engine.clone()).unwrap();
        let b = DashboardSession::open(engine).unwrap();

        a.select_contracts([ContractType::TwoYear]).unwrap();
        assert_eq!(a.current().record_count, 1);
        assert_eq!(b.current().record_count, 3);
    }
}
