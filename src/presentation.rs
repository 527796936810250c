//! Hand-off surface for the dashboard front end.
//!
//! Owns the lookup tables the renderer needs: localized titles, category
//! display names and color hints. Turns an [`AggregationResult`] into a
//! [`DashboardPayload`] that serializes to JSON; drawing stays with the
//! front end.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::aggregation::{ChartKind, ChartSeries, SeriesData};
use crate::category::UNMAPPED;
use crate::engine::{AggregationResult, Kpis};
use crate::error::ChurnError;
use crate::schema::{chart, kpi};

/// Bumped whenever a color or display-name table below changes.
pub const PALETTE_VERSION: u32 = 1;

const NEUTRAL: &str = "#B0B0B0";

/// Qualitative fallback palette, cycled by category position.
const QUALITATIVE: [&str; 8] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
];

/// Fixed colors for categories that must look the same on every chart.
const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("Churned", "#E74C3C"),
    ("Retained", "#2ECC71"),
    ("Male", "#3498DB"),
    ("Female", "#E91E63"),
    ("Senior", "#8E44AD"),
    ("Non-senior", "#F1C40F"),
    ("Month-to-month", "#EF553B"),
    ("One year", "#636EFA"),
    ("Two year", "#00CC96"),
];

/// Display names in Brazilian Portuguese; English uses the canonical label.
const PT_BR_CATEGORIES: &[(&str, &str)] = &[
    ("Male", "Masculino"),
    ("Female", "Feminino"),
    ("Senior", "Idoso"),
    ("Non-senior", "Não idoso"),
    ("Churned", "Cancelou"),
    ("Retained", "Ativo"),
    ("Month-to-month", "Mensal"),
    ("One year", "Anual"),
    ("Two year", "Bienal"),
    ("Electronic check", "Cheque eletrônico"),
    ("Mailed check", "Cheque enviado"),
    ("Bank transfer (automatic)", "Transferência bancária (automática)"),
    ("Credit card (automatic)", "Cartão de crédito (automático)"),
    ("Yes", "Sim"),
    ("No", "Não"),
    ("Fiber optic", "Fibra óptica"),
    ("No internet service", "Sem internet"),
    (UNMAPPED, "Desconhecido"),
];

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Locale {
    #[default]
    #[strum(to_string = "en")]
    #[serde(rename = "en")]
    En,
    #[strum(to_string = "pt-br", serialize = "pt_br", serialize = "pt")]
    #[serde(rename = "pt-br")]
    PtBr,
}

impl Locale {
    pub fn kpi_title(self, id: &str) -> &'static str {
        match (self, id) {
            (Self::En, kpi::CHURN_RATE) => "Churn Rate",
            (Self::En, kpi::AVG_CLTV) => "Average CLTV",
            (Self::En, kpi::AVG_MONTHLY_CHARGE) => "Average Revenue",
            (Self::En, kpi::AVG_TENURE) => "Average Tenure",
            (Self::En, kpi::SENIOR_PCT) => "Senior Citizens",
            (Self::PtBr, kpi::CHURN_RATE) => "Taxa de Churn",
            (Self::PtBr, kpi::AVG_CLTV) => "CLTV Médio",
            (Self::PtBr, kpi::AVG_MONTHLY_CHARGE) => "Faturamento Médio",
            (Self::PtBr, kpi::AVG_TENURE) => "Tempo Médio de Contrato",
            (Self::PtBr, kpi::SENIOR_PCT) => "Clientes Idosos",
            _ => "",
        }
    }

    pub fn chart_title(self, id: &str) -> String {
        let title = match (self, id) {
            (Self::En, chart::CHURN_BY_GENDER) => "Churn by Gender",
            (Self::En, chart::CUSTOMER_MAP) => "Customer Map",
            (Self::En, chart::CHARGES_BY_CONTRACT) => "Monthly Charges by Contract",
            (Self::En, chart::CHURN_BY_CONTRACT) => "Churn by Contract",
            (Self::En, chart::CHURN_BY_GENDER_SENIOR) => "Churn by Gender and Age Group",
            (Self::En, chart::CHURN_BY_TENURE) => "Churn Rate by Tenure",
            (Self::En, chart::TENURE_HISTOGRAM) => "Tenure Distribution",
            (Self::En, chart::PAYMENT_MIX) => "Payment Methods",
            (Self::En, chart::CHURN_BY_INTERNET) => "Churn by Internet Service",
            (Self::En, chart::SCORE_BY_CONTRACT) => "Average Churn Score by Contract",
            (Self::PtBr, chart::CHURN_BY_GENDER) => "Churn por Gênero",
            (Self::PtBr, chart::CUSTOMER_MAP) => "Mapa de Clientes",
            (Self::PtBr, chart::CHARGES_BY_CONTRACT) => {
                "Distribuição de Cobrança Mensal por Contrato"
            }
            (Self::PtBr, chart::CHURN_BY_CONTRACT) => "Churn por Contrato",
            (Self::PtBr, chart::CHURN_BY_GENDER_SENIOR) => "Churn por Gênero e Faixa Etária",
            (Self::PtBr, chart::CHURN_BY_TENURE) => "Taxa de Churn por Tempo de Contrato",
            (Self::PtBr, chart::TENURE_HISTOGRAM) => "Distribuição do Tempo de Contrato",
            (Self::PtBr, chart::PAYMENT_MIX) => "Formas de Pagamento",
            (Self::PtBr, chart::CHURN_BY_INTERNET) => "Churn por Serviço de Internet",
            (Self::PtBr, chart::SCORE_BY_CONTRACT) => "Churn Score Médio por Contrato",
            // Charts from custom catalogs fall back to their id.
            _ => return id.to_string(),
        };
        title.to_string()
    }

    /// Display name of a single (non-composite) category label.
    pub fn category(self, label: &str) -> String {
        match self {
            Self::En => label.to_string(),
            Self::PtBr => PT_BR_CATEGORIES
                .iter()
                .find(|(canonical, _)| *canonical == label)
                .map_or_else(|| label.to_string(), |(_, display)| (*display).to_string()),
        }
    }

    fn currency(self, value: f64) -> String {
        match self {
            Self::En => format!("$ {value:.2}"),
            Self::PtBr => format!("R$ {value:.2}"),
        }
    }

    fn months(self, value: f64) -> String {
        match self {
            Self::En => format!("{value:.1} months"),
            Self::PtBr => format!("{value:.1} meses"),
        }
    }
}

/// Color hint for a category at position `index` of its axis.
pub fn category_color(label: &str, index: usize) -> &'static str {
    if label == UNMAPPED {
        return NEUTRAL;
    }
    CATEGORY_COLORS
        .iter()
        .find(|(category, _)| *category == label)
        .map_or(QUALITATIVE[index % QUALITATIVE.len()], |(_, color)| *color)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub id: &'static str,
    pub title: &'static str,
    pub value: f64,
    pub display: String,
}

pub fn kpi_cards(kpis: &Kpis, locale: Locale) -> Vec<KpiCard> {
    let card = |id: &'static str, value: f64, display: String| KpiCard {
        id,
        title: locale.kpi_title(id),
        value,
        display,
    };
    vec![
        card(
            kpi::CHURN_RATE,
            kpis.churn_rate_pct,
            format!("{:.2}%", kpis.churn_rate_pct),
        ),
        card(kpi::AVG_CLTV, kpis.avg_cltv, locale.currency(kpis.avg_cltv)),
        card(
            kpi::AVG_MONTHLY_CHARGE,
            kpis.avg_monthly_charge,
            locale.currency(kpis.avg_monthly_charge),
        ),
        card(
            kpi::AVG_TENURE,
            kpis.avg_tenure_months,
            locale.months(kpis.avg_tenure_months),
        ),
        card(
            kpi::SENIOR_PCT,
            kpis.senior_pct,
            format!("{:.2}%", kpis.senior_pct),
        ),
    ]
}

/// Per-point presentation hints, aligned with the series' points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointHint {
    pub display: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload<'a> {
    pub id: &'a str,
    pub kind: ChartKind,
    pub title: String,
    pub hints: Vec<PointHint>,
    pub data: &'a SeriesData,
}

fn chart_payload(series: &ChartSeries, locale: Locale) -> ChartPayload<'_> {
    let hints = series
        .data
        .category_parts()
        .into_iter()
        .enumerate()
        .map(|(i, parts)| {
            let display = parts
                .iter()
                .map(|p| locale.category(p))
                .collect::<Vec<_>>()
                .join(crate::aggregation::COMPOSITE_SEPARATOR);
            // Composite categories take the color of their last part.
            let color = parts
                .last()
                .map_or(NEUTRAL, |last| category_color(last, i));
            PointHint { display, color }
        })
        .collect();

    ChartPayload {
        id: &series.id,
        kind: series.kind,
        title: locale.chart_title(&series.id),
        hints,
        data: &series.data,
    }
}

/// Everything the front end renders for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload<'a> {
    pub palette_version: u32,
    pub locale: Locale,
    pub record_count: usize,
    pub kpis: Vec<KpiCard>,
    pub charts: Vec<ChartPayload<'a>>,
}

impl<'a> DashboardPayload<'a> {
    pub fn new(result: &'a AggregationResult, locale: Locale) -> Self {
        Self {
            palette_version: PALETTE_VERSION,
            locale,
            record_count: result.record_count,
            kpis: kpi_cards(&result.kpis, locale),
            charts: result
                .series
                .iter()
                .map(|s| chart_payload(s, locale))
                .collect(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, ChurnError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::CategoryValue;
    use pretty_assertions::assert_eq;

    fn result() -> AggregationResult {
        AggregationResult {
            record_count: 2,
            kpis: Kpis {
                churn_rate_pct: 50.0,
                avg_cltv: 150.0,
                avg_monthly_charge: 15.0,
                avg_tenure_months: 10.0,
                senior_pct: 0.0,
            },
            series: vec![ChartSeries {
                id: chart::CHURN_BY_GENDER_SENIOR.to_string(),
                kind: ChartKind::Bar,
                data: SeriesData::Values(vec![
                    CategoryValue {
                        category: "Male / Senior".into(),
                        parts: vec!["Male".into(), "Senior".into()],
                        value: 0.5,
                        count: 2,
                    },
                    CategoryValue {
                        category: "Unknown / Non-senior".into(),
                        parts: vec![UNMAPPED.into(), "Non-senior".into()],
                        value: 0.0,
                        count: 1,
                    },
                ]),
            }],
        }
    }

    #[test]
    fn kpis_format_per_locale() {
        let kpis = result().kpis;
        let en: Vec<String> = kpi_cards(&kpis, Locale::En)
            .into_iter()
            .map(|c| c.display)
            .collect();
        assert_eq!(
            en,
            vec!["50.00%", "$ 150.00", "$ 15.00", "10.0 months", "0.00%"]
        );

        let pt = kpi_cards(&kpis, Locale::PtBr);
        assert_eq!(pt[0].title, "Taxa de Churn");
        assert_eq!(pt[1].display, "R$ 150.00");
    }

    #[test]
    fn composite_categories_are_localized_part_by_part() {
        let result = result();
        let payload = DashboardPayload::new(&result, Locale::PtBr);
        let hints = &payload.charts[0].hints;
        assert_eq!(hints[0].display, "Masculino / Idoso");
        assert_eq!(hints[0].color, "#8E44AD");
        assert_eq!(hints[1].display, "Desconhecido / Não idoso");
        assert_eq!(payload.charts[0].title, "Churn por Gênero e Faixa Etária");
    }

    #[test]
    fn unmapped_is_always_neutral() {
        assert_eq!(category_color(UNMAPPED, 3), NEUTRAL);
        assert_eq!(category_color("DSL", 0), QUALITATIVE[0]);
        assert_eq!(category_color("Churned", 5), "#E74C3C");
    }

    #[test]
    fn payload_serializes() {
        let result = result();
        let json = DashboardPayload::new(&result, Locale::En)
            .to_json(false)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["palette_version"], PALETTE_VERSION);
        assert_eq!(value["locale"], "en");
        assert_eq!(value["charts"][0]["data"]["type"], "values");
        assert_eq!(value["charts"][0]["kind"], "bar");
    }

    #[test]
    fn locales_parse_from_text() {
        assert_eq!("pt-BR".parse::<Locale>().unwrap(), Locale::PtBr);
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }
}
