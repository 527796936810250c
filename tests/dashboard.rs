use std::path::PathBuf;
use std::sync::Arc;

use churnlens::aggregation::{ChartKind, SeriesData};
use churnlens::category::{ContractType, PaymentMethod};
use churnlens::schema::chart;
use churnlens::{
    AggregationEngine, AggregationResult, ChartCatalog, ChartVariant, DashboardConfig,
    DashboardPayload, DashboardSession, FilterSelection, Kpis, Locale,
};
use pretty_assertions::assert_eq;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/churn_small.csv")
}

fn engine(variant: ChartVariant) -> AggregationEngine {
    DashboardConfig {
        data_path: fixture(),
        variant,
        locale: Locale::En,
    }
    .build_engine()
    .unwrap()
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn values(result: &AggregationResult, id: &str) -> Vec<(String, f64, usize)> {
    match &result.series(id).unwrap().data {
        SeriesData::Values(points) => points
            .iter()
            .map(|p| (p.category.clone(), p.value, p.count))
            .collect(),
        other => panic!("{id} is not a value series: {other:?}"),
    }
}

fn selections() -> Vec<FilterSelection> {
    vec![
        FilterSelection::new(),
        FilterSelection::new().with_contracts([ContractType::MonthToMonth]),
        FilterSelection::new().with_payment_methods([PaymentMethod::ElectronicCheck]),
        FilterSelection::new()
            .with_contracts([ContractType::OneYear, ContractType::TwoYear])
            .with_payment_methods([
                PaymentMethod::BankTransfer,
                PaymentMethod::CreditCard,
            ]),
        FilterSelection::from_labels(["Unknown"], Vec::<String>::new()),
        FilterSelection::new()
            .with_contracts([ContractType::TwoYear])
            .with_payment_methods([PaymentMethod::ElectronicCheck]),
    ]
}

#[test]
fn unfiltered_kpis_are_whole_table_means() {
    let result = engine(ChartVariant::Full)
        .compute(&FilterSelection::new())
        .unwrap();

    assert_eq!(result.record_count, 8);
    approx(result.kpis.churn_rate_pct, 50.0);
    approx(result.kpis.avg_cltv, 4187.5);
    approx(result.kpis.avg_monthly_charge, 55.625);
    approx(result.kpis.avg_tenure_months, 27.0);
    approx(result.kpis.senior_pct, 25.0);
}

#[test]
fn contract_filter_narrows_every_output() {
    let engine = engine(ChartVariant::Full);
    let result = engine
        .compute(&FilterSelection::from_labels(["Month-to-month"], Vec::<String>::new()))
        .unwrap();

    assert_eq!(result.record_count, 3);
    approx(result.kpis.churn_rate_pct, 100.0);
    approx(result.kpis.avg_cltv, 3000.0);
    assert_eq!(
        values(&result, chart::CHURN_BY_CONTRACT),
        vec![("Month-to-month".to_string(), 1.0, 3)]
    );
    match &result.series(chart::CUSTOMER_MAP).unwrap().data {
        SeriesData::Points(points) => {
            let ids: Vec<&str> = points.iter().map(|p| p.customer_id.as_str()).collect();
            assert_eq!(ids, vec!["C-001", "C-002", "C-007"]);
        }
        other => panic!("unexpected map data: {other:?}"),
    }
}

#[test]
fn categories_follow_canonical_order_with_unknown_last() {
    let result = engine(ChartVariant::Full)
        .compute(&FilterSelection::new())
        .unwrap();

    assert_eq!(
        values(&result, chart::CHURN_BY_CONTRACT),
        vec![
            ("Month-to-month".to_string(), 1.0, 3),
            ("One year".to_string(), 0.5, 2),
            ("Two year".to_string(), 0.0, 2),
            ("Unknown".to_string(), 0.0, 1),
        ]
    );
    assert_eq!(
        values(&result, chart::PAYMENT_MIX),
        vec![
            ("Electronic check".to_string(), 3.0, 3),
            ("Mailed check".to_string(), 2.0, 2),
            ("Bank transfer (automatic)".to_string(), 2.0, 2),
            ("Credit card (automatic)".to_string(), 1.0, 1),
        ]
    );
}

#[test]
fn tenure_bands_are_ordered_by_start() {
    let result = engine(ChartVariant::Full)
        .compute(&FilterSelection::new())
        .unwrap();

    assert_eq!(
        values(&result, chart::CHURN_BY_TENURE),
        vec![
            ("0-11".to_string(), 1.0, 3),
            ("12-23".to_string(), 0.0, 1),
            ("24-35".to_string(), 0.5, 2),
            ("60-71".to_string(), 0.0, 2),
        ]
    );
}

#[test]
fn box_plot_groups_by_contract_and_churn_status() {
    let result = engine(ChartVariant::Classic)
        .compute(&FilterSelection::new())
        .unwrap();

    let series = result.series(chart::CHARGES_BY_CONTRACT).unwrap();
    assert_eq!(series.kind, ChartKind::BoxPlot);
    let SeriesData::Summaries(groups) = &series.data else {
        panic!("charges by contract should be summaries");
    };

    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(
        categories,
        vec![
            "Month-to-month / Churned",
            "One year / Retained",
            "One year / Churned",
            "Two year / Retained",
            "Unknown / Retained",
        ]
    );

    let churned_m2m = &groups[0];
    assert_eq!(churned_m2m.parts, vec!["Month-to-month", "Churned"]);
    assert_eq!(churned_m2m.count, 3);
    approx(churned_m2m.min, 45.0);
    approx(churned_m2m.q1, 57.5);
    approx(churned_m2m.median, 70.0);
    approx(churned_m2m.q3, 75.0);
    approx(churned_m2m.max, 80.0);
    approx(groups[3].median, 55.0);
}

#[test]
fn every_category_is_canonical_for_its_dimensions() {
    let engine = engine(ChartVariant::Full);
    for selection in selections() {
        let result = engine.compute(&selection).unwrap();
        for spec in engine.catalog().charts() {
            let series = result.series(spec.id).unwrap();
            for parts in series.data.category_parts() {
                assert_eq!(parts.len(), spec.dimensions.len(), "{}", spec.id);
                for (dimension, label) in spec.dimensions.iter().zip(parts) {
                    assert!(
                        dimension.is_canonical(label),
                        "{label} is not a {dimension:?} label in {}",
                        spec.id
                    );
                }
            }
        }
    }
}

#[test]
fn no_match_yields_zeroes_and_empty_series() {
    let engine = engine(ChartVariant::Full);
    let selection = FilterSelection::new()
        .with_contracts([ContractType::TwoYear])
        .with_payment_methods([PaymentMethod::ElectronicCheck]);
    let result = engine.compute(&selection).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.kpis, Kpis::ZERO);
    assert_eq!(result.series.len(), ChartCatalog::full().charts().len());
    assert!(result.series.iter().all(|s| s.is_empty()));
    assert_eq!(result, AggregationResult::empty(engine.catalog()));
}

#[test]
fn unresolvable_selector_value_matches_nothing() {
    let result = engine(ChartVariant::Classic)
        .compute(&FilterSelection::from_labels(["Lifetime"], Vec::<String>::new()))
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn unknown_selects_rows_with_unmapped_contract() {
    let engine = engine(ChartVariant::Classic);
    let selection = FilterSelection::from_labels(["Unknown"], Vec::<String>::new());
    let records = engine.dataset().filtered_records(&selection).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["C-008"]);
}

#[test]
fn recomputing_the_same_selection_is_idempotent() {
    let engine = engine(ChartVariant::Full);
    for selection in selections() {
        let first = engine.compute(&selection).unwrap();
        let second = engine.compute(&selection).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn filtered_rows_are_exactly_the_matching_rows() {
    let engine = engine(ChartVariant::Classic);
    let all = engine.dataset().records().unwrap();
    for selection in selections() {
        let filtered = engine.dataset().filtered_records(&selection).unwrap();
        let expected: Vec<_> = all
            .iter()
            .filter(|r| selection.matches(r))
            .cloned()
            .collect();
        assert_eq!(filtered, expected);
        assert_eq!(engine.compute(&selection).unwrap().record_count, filtered.len());
    }
}

#[test]
fn session_tracks_selector_changes() {
    let mut session = DashboardSession::open(Arc::new(engine(ChartVariant::Full))).unwrap();
    assert_eq!(session.current().record_count, 8);

    let narrowed = session
        .select_contracts([ContractType::MonthToMonth])
        .unwrap();
    assert_eq!(narrowed.record_count, 3);

    let narrowed = session
        .select_payment_methods([PaymentMethod::ElectronicCheck])
        .unwrap();
    assert_eq!(narrowed.record_count, 1);
    assert_eq!(session.selection().contracts().len(), 1);

    assert_eq!(session.clear().unwrap().record_count, 8);
    assert!(session.selection().is_empty());
}

#[test]
fn payload_serializes_localized_titles() {
    let result = engine(ChartVariant::Classic)
        .compute(&FilterSelection::new())
        .unwrap();
    let json = DashboardPayload::new(&result, Locale::PtBr)
        .to_json(false)
        .unwrap();
    let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(payload["locale"], "pt-br");
    assert_eq!(payload["record_count"], 8);
    assert_eq!(payload["kpis"].as_array().unwrap().len(), 5);
    assert_eq!(payload["charts"].as_array().unwrap().len(), 3);
}
