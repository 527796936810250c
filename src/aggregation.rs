use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::category::{
    ChurnStatus, CodedCategory, ContractType, Gender, InternetService, OnlineSecurity,
    PaymentMethod, SeniorStatus, YesNo, UNMAPPED,
};
use crate::error::ChurnError;
use crate::schema::{chart, customer, derived, output};

/// Separator used when two category labels form one composite label.
pub const COMPOSITE_SEPARATOR: &str = " / ";

/// A categorical axis a chart can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Gender,
    SeniorStatus,
    Contract,
    PaymentMethod,
    ChurnStatus,
    PhoneService,
    InternetService,
    OnlineSecurity,
    /// Tenure bucketed into bands of `months` width, labelled `"0-11"`, `"12-23"`, ...
    TenureBand { months: u32 },
}

impl Dimension {
    /// Name of the label column this dimension groups on.
    pub fn column(&self) -> String {
        match self {
            Self::Gender => customer::GENDER.to_string(),
            Self::SeniorStatus => derived::SENIOR_STATUS.to_string(),
            Self::Contract => customer::CONTRACT.to_string(),
            Self::PaymentMethod => customer::PAYMENT_METHOD.to_string(),
            Self::ChurnStatus => derived::CHURN_STATUS.to_string(),
            Self::PhoneService => customer::PHONE_SERVICE.to_string(),
            Self::InternetService => customer::INTERNET_SERVICE.to_string(),
            Self::OnlineSecurity => customer::ONLINE_SECURITY.to_string(),
            Self::TenureBand { months } => {
                format!("{}_{}", derived::TENURE_BAND_PREFIX, band_width(*months))
            }
        }
    }

    /// Fixed label order of a categorical dimension; `None` for tenure bands,
    /// whose order comes from the data.
    pub fn fixed_labels(&self) -> Option<Vec<&'static str>> {
        match self {
            Self::Gender => Some(Gender::canonical_labels()),
            Self::SeniorStatus => Some(SeniorStatus::canonical_labels()),
            Self::Contract => Some(ContractType::canonical_labels()),
            Self::PaymentMethod => Some(PaymentMethod::canonical_labels()),
            Self::ChurnStatus => Some(ChurnStatus::canonical_labels()),
            Self::PhoneService => Some(YesNo::canonical_labels()),
            Self::InternetService => Some(InternetService::canonical_labels()),
            Self::OnlineSecurity => Some(OnlineSecurity::canonical_labels()),
            Self::TenureBand { .. } => None,
        }
    }

    /// Whether `label` can ever appear on this axis.
    pub fn is_canonical(&self, label: &str) -> bool {
        match (self.fixed_labels(), self) {
            (Some(labels), _) => labels.contains(&label),
            (None, Self::TenureBand { months }) => {
                let width = i64::from(band_width(*months));
                label
                    .split_once('-')
                    .and_then(|(lo, hi)| Some((lo.parse::<i64>().ok()?, hi.parse::<i64>().ok()?)))
                    .is_some_and(|(lo, hi)| lo >= 0 && lo % width == 0 && hi == lo + width - 1)
            }
            (None, _) => false,
        }
    }

    /// Add the label column this dimension needs, if it is not stored.
    fn prepare(&self, frame: &mut DataFrame) -> Result<(), ChurnError> {
        let Self::TenureBand { months } = self else {
            return Ok(());
        };
        let name = self.column();
        if frame.column(&name).is_ok() {
            return Ok(());
        }
        let labels: Vec<String> = frame
            .column(customer::TENURE_MONTHS)?
            .i64()?
            .into_iter()
            .map(|t| t.map_or_else(|| UNMAPPED.to_string(), |t| tenure_band_label(t, *months)))
            .collect();
        frame.with_column(Column::new(name.as_str().into(), &labels))?;
        Ok(())
    }

    /// Labels in axis order for the given (prepared) frame.
    fn ordered_labels(&self, frame: &DataFrame) -> Result<Vec<String>, ChurnError> {
        if let Some(labels) = self.fixed_labels() {
            return Ok(labels.into_iter().map(str::to_string).collect());
        }
        let Self::TenureBand { months } = self else {
            return Ok(Vec::new());
        };
        let starts: BTreeSet<i64> = frame
            .column(customer::TENURE_MONTHS)?
            .i64()?
            .into_iter()
            .flatten()
            .map(|t| band_start(t, *months))
            .collect();
        Ok(starts
            .into_iter()
            .map(|start| tenure_band_label(start, *months))
            .collect())
    }
}

fn band_width(months: u32) -> u32 {
    months.max(1)
}

fn band_start(tenure: i64, months: u32) -> i64 {
    let width = i64::from(band_width(months));
    tenure.div_euclid(width) * width
}

pub fn tenure_band_label(tenure: i64, months: u32) -> String {
    let start = band_start(tenure, months);
    format!("{}-{}", start, start + i64::from(band_width(months)) - 1)
}

/// How a chart reduces the rows of each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "fn", content = "column")]
pub enum Aggregation {
    /// Arithmetic mean of a numeric or flag column.
    Mean(&'static str),
    /// Number of rows.
    Count,
    /// Five-number summary of a numeric column (box plots).
    Summary(&'static str),
    /// One point per customer with coordinates (maps). Ignores dimensions.
    Points,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Histogram,
    Pie,
    BoxPlot,
    Map,
}

/// Declarative chart specification: what to group by and how to reduce.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: &'static str,
    pub kind: ChartKind,
    pub dimensions: Vec<Dimension>,
    pub aggregation: Aggregation,
}

impl ChartSpec {
    pub fn new(id: &'static str, kind: ChartKind, aggregation: Aggregation) -> Self {
        Self {
            id,
            kind,
            dimensions: Vec::new(),
            aggregation,
        }
    }

    pub fn by(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Compute this chart's series over an already-filtered view.
    pub fn evaluate(&self, view: &DataFrame) -> Result<ChartSeries, ChurnError> {
        let data = match self.aggregation {
            Aggregation::Points => SeriesData::Points(geo_points(view)?),
            Aggregation::Mean(column) => {
                let value = col(column).cast(DataType::Float64).mean();
                let groups = self.grouped(view, value)?;
                SeriesData::Values(
                    groups
                        .into_iter()
                        .map(|g| CategoryValue {
                            category: g.category(),
                            value: finite_or_zero(g.value),
                            count: g.count,
                            parts: g.parts,
                        })
                        .collect(),
                )
            }
            Aggregation::Count => {
                let groups = self.grouped(view, len().cast(DataType::Float64))?;
                SeriesData::Values(
                    groups
                        .into_iter()
                        .map(|g| CategoryValue {
                            category: g.category(),
                            value: g.count as f64,
                            count: g.count,
                            parts: g.parts,
                        })
                        .collect(),
                )
            }
            Aggregation::Summary(column) => {
                let groups = self.grouped(view, col(column).cast(DataType::Float64))?;
                SeriesData::Summaries(
                    groups
                        .into_iter()
                        .map(|mut g| {
                            let summary = FiveNumber::of(&mut g.values);
                            CategorySummary {
                                category: g.category(),
                                count: g.count,
                                parts: g.parts,
                                min: summary.min,
                                q1: summary.q1,
                                median: summary.median,
                                q3: summary.q3,
                                max: summary.max,
                                mean: summary.mean,
                            }
                        })
                        .collect(),
                )
            }
        };

        Ok(ChartSeries {
            id: self.id.to_string(),
            kind: self.kind,
            data,
        })
    }

    /// A series with this chart's id and shape but no points.
    pub fn empty_series(&self) -> ChartSeries {
        let data = match self.aggregation {
            Aggregation::Points => SeriesData::Points(Vec::new()),
            Aggregation::Mean(_) | Aggregation::Count => SeriesData::Values(Vec::new()),
            Aggregation::Summary(_) => SeriesData::Summaries(Vec::new()),
        };
        ChartSeries {
            id: self.id.to_string(),
            kind: self.kind,
            data,
        }
    }

    /// Group `view` by this chart's dimensions and reduce with `value`.
    ///
    /// Groups come back in canonical axis order: the cartesian product of each
    /// dimension's ordered labels, skipping combinations with no rows.
    fn grouped(&self, view: &DataFrame, value: Expr) -> Result<Vec<Group>, ChurnError> {
        if self.dimensions.is_empty() || view.height() == 0 {
            return Ok(Vec::new());
        }

        let mut frame = view.clone();
        for dimension in &self.dimensions {
            dimension.prepare(&mut frame)?;
        }
        let keys: Vec<String> = self.dimensions.iter().map(Dimension::column).collect();

        let grouped = frame
            .clone()
            .lazy()
            .group_by(keys.iter().map(|k| col(k.as_str())).collect::<Vec<_>>())
            .agg([
                value.alias(output::VALUE),
                len().cast(DataType::Int64).alias(output::COUNT),
            ])
            .collect()?;

        let key_columns = keys
            .iter()
            .map(|k| grouped.column(k.as_str()).and_then(|c| c.str()))
            .collect::<Result<Vec<_>, _>>()?;
        let counts = grouped.column(output::COUNT)?.i64()?;
        let values = grouped.column(output::VALUE)?;

        let mut by_key: HashMap<Vec<String>, Group> = HashMap::with_capacity(grouped.height());
        for i in 0..grouped.height() {
            let parts: Vec<String> = key_columns
                .iter()
                .map(|c| c.get(i).unwrap_or(UNMAPPED).to_string())
                .collect();
            let count = counts
                .get(i)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0);
            let (value, values) = match values.dtype() {
                DataType::List(_) => (None, list_values(values, i)?),
                _ => (values.f64()?.get(i), Vec::new()),
            };
            by_key.insert(
                parts.clone(),
                Group {
                    parts,
                    value,
                    values,
                    count,
                },
            );
        }

        let axes = self
            .dimensions
            .iter()
            .map(|d| d.ordered_labels(&frame))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ordered = Vec::with_capacity(by_key.len());
        for key in cartesian(&axes) {
            if let Some(group) = by_key.remove(&key) {
                ordered.push(group);
            }
        }
        if !by_key.is_empty() {
            // Labels outside the axis tables; keep them, sorted, after the known ones.
            let mut rest: Vec<Group> = by_key.into_values().collect();
            rest.sort_by(|a, b| a.parts.cmp(&b.parts));
            ordered.extend(rest);
        }
        Ok(ordered)
    }
}

struct Group {
    parts: Vec<String>,
    value: Option<f64>,
    values: Vec<f64>,
    count: usize,
}

impl Group {
    fn category(&self) -> String {
        self.parts.join(COMPOSITE_SEPARATOR)
    }
}

fn list_values(column: &Column, row: usize) -> Result<Vec<f64>, ChurnError> {
    let Some(series) = column.list()?.get_as_series(row) else {
        return Ok(Vec::new());
    };
    Ok(series.f64()?.into_iter().flatten().collect())
}

fn cartesian(axes: &[Vec<String>]) -> Vec<Vec<String>> {
    axes.iter().fold(vec![Vec::new()], |acc, axis| {
        acc.iter()
            .flat_map(|prefix| {
                axis.iter().map(move |label| {
                    let mut key = prefix.clone();
                    key.push(label.clone());
                    key
                })
            })
            .collect()
    })
}

fn geo_points(view: &DataFrame) -> Result<Vec<GeoPoint>, ChurnError> {
    let ids = view.column(customer::CUSTOMER_ID)?.str()?;
    let lat = view.column(customer::LATITUDE)?.f64()?;
    let lon = view.column(customer::LONGITUDE)?.f64()?;
    let cltv = view.column(customer::CLTV)?.f64()?;
    let charge = view.column(customer::MONTHLY_CHARGE)?.f64()?;

    let mut points = Vec::with_capacity(view.height());
    for i in 0..view.height() {
        let (Some(latitude), Some(longitude)) = (lat.get(i), lon.get(i)) else {
            continue;
        };
        points.push(GeoPoint {
            customer_id: ids.get(i).unwrap_or_default().to_string(),
            latitude,
            longitude,
            cltv: cltv.get(i).unwrap_or(0.0),
            monthly_charge: charge.get(i).unwrap_or(0.0),
        });
    }
    Ok(points)
}

/// `None`, NaN and infinities all read as zero.
pub fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

struct FiveNumber {
    min: f64,
    q1: f64,
    median: f64,
    q3: f64,
    max: f64,
    mean: f64,
}

impl FiveNumber {
    /// Quartiles use linear interpolation between closest ranks.
    fn of(values: &mut [f64]) -> Self {
        if values.is_empty() {
            return Self {
                min: 0.0,
                q1: 0.0,
                median: 0.0,
                q3: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        values.sort_by(f64::total_cmp);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            min: values[0],
            q1: quantile(values, 0.25),
            median: quantile(values, 0.5),
            q3: quantile(values, 0.75),
            max: values[values.len() - 1],
            mean: finite_or_zero(Some(mean)),
        }
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ── Series output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub category: String,
    pub parts: Vec<String>,
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub parts: Vec<String>,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub customer_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub cltv: f64,
    pub monthly_charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "points", rename_all = "snake_case")]
pub enum SeriesData {
    Values(Vec<CategoryValue>),
    Summaries(Vec<CategorySummary>),
    Points(Vec<GeoPoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Summaries(v) => v.len(),
            Self::Points(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Category label parts, one entry per point; empty for maps.
    pub fn category_parts(&self) -> Vec<&[String]> {
        match self {
            Self::Values(v) => v.iter().map(|p| p.parts.as_slice()).collect(),
            Self::Summaries(v) => v.iter().map(|p| p.parts.as_slice()).collect(),
            Self::Points(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub id: String,
    pub kind: ChartKind,
    pub data: SeriesData,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── Catalogue ───────────────────────────────────────────────────────────────

/// Preset chart sets.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ChartVariant {
    /// Churn by gender, customer map, charges by contract.
    Classic,
    /// Classic plus contract, demographic, tenure, payment and service breakdowns.
    #[default]
    Full,
}

/// Ordered list of chart specifications evaluated on every filter change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCatalog {
    charts: Vec<ChartSpec>,
}

impl ChartCatalog {
    pub fn new(charts: Vec<ChartSpec>) -> Self {
        Self { charts }
    }

    pub fn for_variant(variant: ChartVariant) -> Self {
        match variant {
            ChartVariant::Classic => Self::classic(),
            ChartVariant::Full => Self::full(),
        }
    }

    pub fn classic() -> Self {
        Self::new(vec![
            ChartSpec::new(
                chart::CHURN_BY_GENDER,
                ChartKind::Bar,
                Aggregation::Mean(customer::CHURNED),
            )
            .by(Dimension::Gender),
            ChartSpec::new(chart::CUSTOMER_MAP, ChartKind::Map, Aggregation::Points),
            ChartSpec::new(
                chart::CHARGES_BY_CONTRACT,
                ChartKind::BoxPlot,
                Aggregation::Summary(customer::MONTHLY_CHARGE),
            )
            .by(Dimension::Contract)
            .by(Dimension::ChurnStatus),
        ])
    }

    pub fn full() -> Self {
        let mut charts = Self::classic().charts;
        charts.extend([
            ChartSpec::new(
                chart::CHURN_BY_CONTRACT,
                ChartKind::Bar,
                Aggregation::Mean(customer::CHURNED),
            )
            .by(Dimension::Contract),
            ChartSpec::new(
                chart::CHURN_BY_GENDER_SENIOR,
                ChartKind::Bar,
                Aggregation::Mean(customer::CHURNED),
            )
            .by(Dimension::Gender)
            .by(Dimension::SeniorStatus),
            ChartSpec::new(
                chart::CHURN_BY_TENURE,
                ChartKind::Line,
                Aggregation::Mean(customer::CHURNED),
            )
            .by(Dimension::TenureBand { months: 12 }),
            ChartSpec::new(chart::TENURE_HISTOGRAM, ChartKind::Histogram, Aggregation::Count)
                .by(Dimension::TenureBand { months: 6 }),
            ChartSpec::new(chart::PAYMENT_MIX, ChartKind::Pie, Aggregation::Count)
                .by(Dimension::PaymentMethod),
            ChartSpec::new(
                chart::CHURN_BY_INTERNET,
                ChartKind::Bar,
                Aggregation::Mean(customer::CHURNED),
            )
            .by(Dimension::InternetService),
            ChartSpec::new(
                chart::SCORE_BY_CONTRACT,
                ChartKind::Bar,
                Aggregation::Mean(customer::CHURN_SCORE),
            )
            .by(Dimension::Contract),
        ]);
        Self::new(charts)
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn get(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }
}

impl Default for ChartCatalog {
    fn default() -> Self {
        Self::full()
    }
}
