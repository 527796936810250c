use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use crate::category::{
    label_or_unmapped, parse_flag, ChurnStatus, CodedCategory, ContractType, Gender,
    InternetService, OnlineSecurity, PaymentMethod, SeniorStatus, YesNo,
};
use crate::error::ChurnError;
use crate::filter::FilterSelection;
use crate::schema::{customer, derived, source};

/// One customer row. `None` on a categorical field means the source cell did
/// not match the column's code table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub gender: Option<Gender>,
    pub senior_citizen: bool,
    pub contract: Option<ContractType>,
    pub payment_method: Option<PaymentMethod>,
    pub monthly_charge: f64,
    pub cltv: f64,
    pub tenure_months: u32,
    pub churned: bool,
    pub churn_score: f64,
    pub phone_service: Option<YesNo>,
    pub internet_service: Option<InternetService>,
    pub online_security: Option<OnlineSecurity>,
    pub latitude: f64,
    pub longitude: f64,
}

/// The immutable customer table.
///
/// Built once at startup; every column is typed and every categorical column
/// holds canonical labels (or the unmapped sentinel), never raw codes.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: Option<PathBuf>,
    frame: DataFrame,
}

impl Dataset {
    /// Load and normalize the customer CSV. Any missing column or unparseable
    /// numeric cell aborts the load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChurnError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ChurnError::DataFileNotFound(path.to_path_buf()));
        }

        let raw = read_csv_as_strings(path)?;
        let mut dataset = Self::from_raw(&raw)?;
        dataset.source = Some(path.to_path_buf());

        log::info!(
            "Loaded {} customer records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Normalize an all-string frame whose columns carry the source headers.
    pub fn from_raw(raw: &DataFrame) -> Result<Self, ChurnError> {
        require_columns(raw, &source::REQUIRED)?;

        let cells = RawColumns::new(raw)?;
        let mut report = MappingReport::default();
        let mut columns = ColumnBuilder::with_capacity(raw.height());
        for row in 0..raw.height() {
            let record = cells.record(row, &mut report)?;
            columns.push(&record);
        }
        report.log();

        Ok(Self {
            source: None,
            frame: columns.finish()?,
        })
    }

    /// Build a table straight from typed records.
    pub fn from_records(records: &[CustomerRecord]) -> Result<Self, ChurnError> {
        let mut columns = ColumnBuilder::with_capacity(records.len());
        for record in records {
            columns.push(record);
        }
        Ok(Self {
            source: None,
            frame: columns.finish()?,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Rows passing the selection's predicate, in load order.
    pub fn filtered(&self, selection: &FilterSelection) -> Result<DataFrame, ChurnError> {
        if selection.is_empty() {
            return Ok(self.frame.clone());
        }
        let df = self
            .frame
            .clone()
            .lazy()
            .filter(selection.predicate())
            .collect()?;
        Ok(df)
    }

    pub fn records(&self) -> Result<Vec<CustomerRecord>, ChurnError> {
        records_from_frame(&self.frame)
    }

    pub fn filtered_records(
        &self,
        selection: &FilterSelection,
    ) -> Result<Vec<CustomerRecord>, ChurnError> {
        records_from_frame(&self.filtered(selection)?)
    }
}

/// Materialize typed records from a normalized frame.
pub fn records_from_frame(frame: &DataFrame) -> Result<Vec<CustomerRecord>, ChurnError> {
    let ids = frame.column(customer::CUSTOMER_ID)?.str()?;
    let gender = frame.column(customer::GENDER)?.str()?;
    let senior = frame.column(customer::SENIOR_CITIZEN)?.bool()?;
    let contract = frame.column(customer::CONTRACT)?.str()?;
    let payment = frame.column(customer::PAYMENT_METHOD)?.str()?;
    let monthly = frame.column(customer::MONTHLY_CHARGE)?.f64()?;
    let cltv = frame.column(customer::CLTV)?.f64()?;
    let tenure = frame.column(customer::TENURE_MONTHS)?.i64()?;
    let churned = frame.column(customer::CHURNED)?.bool()?;
    let score = frame.column(customer::CHURN_SCORE)?.f64()?;
    let phone = frame.column(customer::PHONE_SERVICE)?.str()?;
    let internet = frame.column(customer::INTERNET_SERVICE)?.str()?;
    let security = frame.column(customer::ONLINE_SECURITY)?.str()?;
    let lat = frame.column(customer::LATITUDE)?.f64()?;
    let lon = frame.column(customer::LONGITUDE)?.f64()?;

    let mut records = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        records.push(CustomerRecord {
            customer_id: ids.get(i).unwrap_or_default().to_string(),
            gender: gender.get(i).and_then(Gender::from_label),
            senior_citizen: senior.get(i).unwrap_or(false),
            contract: contract.get(i).and_then(ContractType::from_label),
            payment_method: payment.get(i).and_then(PaymentMethod::from_label),
            monthly_charge: monthly.get(i).unwrap_or(0.0),
            cltv: cltv.get(i).unwrap_or(0.0),
            tenure_months: tenure
                .get(i)
                .and_then(|t| u32::try_from(t).ok())
                .unwrap_or(0),
            churned: churned.get(i).unwrap_or(false),
            churn_score: score.get(i).unwrap_or(0.0),
            phone_service: phone.get(i).and_then(YesNo::from_label),
            internet_service: internet.get(i).and_then(InternetService::from_label),
            online_security: security.get(i).and_then(OnlineSecurity::from_label),
            latitude: lat.get(i).unwrap_or(0.0),
            longitude: lon.get(i).unwrap_or(0.0),
        });
    }
    Ok(records)
}

// ── Private helpers ─────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names so `"CLTV "` matches `CLTV`.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, ChurnError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), ChurnError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(ChurnError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Per-column count of cells that fell through to the unmapped sentinel.
#[derive(Default)]
struct MappingReport {
    unmapped: BTreeMap<&'static str, usize>,
}

impl MappingReport {
    fn resolve<T: CodedCategory>(&mut self, column: &'static str, raw: Option<&str>) -> Option<T> {
        let resolved = raw.and_then(T::resolve);
        if resolved.is_none() {
            *self.unmapped.entry(column).or_default() += 1;
        }
        resolved
    }

    fn log(&self) {
        for (column, count) in &self.unmapped {
            log::warn!("{count} value(s) in column '{column}' have no label mapping; grouped as unknown");
        }
    }
}

/// Borrowed string views over the raw source columns.
struct RawColumns<'a> {
    customer_id: &'a StringChunked,
    gender: &'a StringChunked,
    senior_citizen: &'a StringChunked,
    contract: &'a StringChunked,
    payment_method: &'a StringChunked,
    monthly_charges: &'a StringChunked,
    cltv: &'a StringChunked,
    tenure_months: &'a StringChunked,
    churn_value: &'a StringChunked,
    churn_score: &'a StringChunked,
    phone_service: &'a StringChunked,
    internet_service: &'a StringChunked,
    online_security: &'a StringChunked,
    latitude: &'a StringChunked,
    longitude: &'a StringChunked,
}

impl<'a> RawColumns<'a> {
    fn new(raw: &'a DataFrame) -> Result<Self, ChurnError> {
        let text = move |name: &str| -> Result<&'a StringChunked, ChurnError> {
            Ok(raw.column(name)?.str()?)
        };
        Ok(Self {
            customer_id: text(source::CUSTOMER_ID)?,
            gender: text(source::GENDER)?,
            senior_citizen: text(source::SENIOR_CITIZEN)?,
            contract: text(source::CONTRACT)?,
            payment_method: text(source::PAYMENT_METHOD)?,
            monthly_charges: text(source::MONTHLY_CHARGES)?,
            cltv: text(source::CLTV)?,
            tenure_months: text(source::TENURE_MONTHS)?,
            churn_value: text(source::CHURN_VALUE)?,
            churn_score: text(source::CHURN_SCORE)?,
            phone_service: text(source::PHONE_SERVICE)?,
            internet_service: text(source::INTERNET_SERVICE)?,
            online_security: text(source::ONLINE_SECURITY)?,
            latitude: text(source::LATITUDE)?,
            longitude: text(source::LONGITUDE)?,
        })
    }

    fn record(&self, row: usize, report: &mut MappingReport) -> Result<CustomerRecord, ChurnError> {
        let tenure = parse_number(self.tenure_months, source::TENURE_MONTHS, row)?;
        if tenure < 0.0 || tenure.fract() != 0.0 || tenure > f64::from(u32::MAX) {
            return Err(ChurnError::InvalidValue {
                column: source::TENURE_MONTHS.to_string(),
                row: row + 1,
                reason: format!("expected a whole number of months >= 0, got {tenure}"),
            });
        }

        let churn_score = parse_number(self.churn_score, source::CHURN_SCORE, row)?;
        if !(0.0..=100.0).contains(&churn_score) {
            return Err(ChurnError::InvalidValue {
                column: source::CHURN_SCORE.to_string(),
                row: row + 1,
                reason: format!("expected a score between 0 and 100, got {churn_score}"),
            });
        }

        Ok(CustomerRecord {
            customer_id: self
                .customer_id
                .get(row)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            gender: report.resolve(source::GENDER, self.gender.get(row)),
            senior_citizen: parse_bool(self.senior_citizen, source::SENIOR_CITIZEN, row)?,
            contract: report.resolve(source::CONTRACT, self.contract.get(row)),
            payment_method: report.resolve(source::PAYMENT_METHOD, self.payment_method.get(row)),
            monthly_charge: parse_number(self.monthly_charges, source::MONTHLY_CHARGES, row)?,
            cltv: parse_number(self.cltv, source::CLTV, row)?,
            // Range and fraction checked above.
            tenure_months: tenure as u32,
            churned: parse_bool(self.churn_value, source::CHURN_VALUE, row)?,
            churn_score,
            phone_service: report.resolve(source::PHONE_SERVICE, self.phone_service.get(row)),
            internet_service: report
                .resolve(source::INTERNET_SERVICE, self.internet_service.get(row)),
            online_security: report.resolve(source::ONLINE_SECURITY, self.online_security.get(row)),
            latitude: parse_number(self.latitude, source::LATITUDE, row)?,
            longitude: parse_number(self.longitude, source::LONGITUDE, row)?,
        })
    }
}

fn malformed(column: &str, row: usize, value: Option<&str>) -> ChurnError {
    ChurnError::MalformedField {
        column: column.to_string(),
        row: row + 1,
        value: value.unwrap_or_default().to_string(),
    }
}

fn parse_number(cells: &StringChunked, column: &str, row: usize) -> Result<f64, ChurnError> {
    let raw = cells.get(row);
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(column, row, raw))
}

fn parse_bool(cells: &StringChunked, column: &str, row: usize) -> Result<bool, ChurnError> {
    let raw = cells.get(row);
    raw.and_then(parse_flag)
        .ok_or_else(|| malformed(column, row, raw))
}

/// Column vectors of the normalized table.
struct ColumnBuilder {
    customer_id: Vec<String>,
    gender: Vec<&'static str>,
    senior_citizen: Vec<bool>,
    senior_status: Vec<&'static str>,
    contract: Vec<&'static str>,
    payment_method: Vec<&'static str>,
    monthly_charge: Vec<f64>,
    cltv: Vec<f64>,
    tenure_months: Vec<i64>,
    churned: Vec<bool>,
    churn_status: Vec<&'static str>,
    churn_score: Vec<f64>,
    phone_service: Vec<&'static str>,
    internet_service: Vec<&'static str>,
    online_security: Vec<&'static str>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

impl ColumnBuilder {
    fn with_capacity(n: usize) -> Self {
        Self {
            customer_id: Vec::with_capacity(n),
            gender: Vec::with_capacity(n),
            senior_citizen: Vec::with_capacity(n),
            senior_status: Vec::with_capacity(n),
            contract: Vec::with_capacity(n),
            payment_method: Vec::with_capacity(n),
            monthly_charge: Vec::with_capacity(n),
            cltv: Vec::with_capacity(n),
            tenure_months: Vec::with_capacity(n),
            churned: Vec::with_capacity(n),
            churn_status: Vec::with_capacity(n),
            churn_score: Vec::with_capacity(n),
            phone_service: Vec::with_capacity(n),
            internet_service: Vec::with_capacity(n),
            online_security: Vec::with_capacity(n),
            latitude: Vec::with_capacity(n),
            longitude: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, r: &CustomerRecord) {
        self.customer_id.push(r.customer_id.clone());
        self.gender.push(label_or_unmapped(r.gender));
        self.senior_citizen.push(r.senior_citizen);
        self.senior_status
            .push(SeniorStatus::from(r.senior_citizen).label());
        self.contract.push(label_or_unmapped(r.contract));
        self.payment_method.push(label_or_unmapped(r.payment_method));
        self.monthly_charge.push(r.monthly_charge);
        self.cltv.push(r.cltv);
        self.tenure_months.push(i64::from(r.tenure_months));
        self.churned.push(r.churned);
        self.churn_status.push(ChurnStatus::from(r.churned).label());
        self.churn_score.push(r.churn_score);
        self.phone_service.push(label_or_unmapped(r.phone_service));
        self.internet_service
            .push(label_or_unmapped(r.internet_service));
        self.online_security
            .push(label_or_unmapped(r.online_security));
        self.latitude.push(r.latitude);
        self.longitude.push(r.longitude);
    }

    fn finish(self) -> Result<DataFrame, ChurnError> {
        let df = DataFrame::new(vec![
            Column::new(customer::CUSTOMER_ID.into(), &self.customer_id),
            Column::new(customer::GENDER.into(), &self.gender),
            Column::new(customer::SENIOR_CITIZEN.into(), &self.senior_citizen),
            Column::new(derived::SENIOR_STATUS.into(), &self.senior_status),
            Column::new(customer::CONTRACT.into(), &self.contract),
            Column::new(customer::PAYMENT_METHOD.into(), &self.payment_method),
            Column::new(customer::MONTHLY_CHARGE.into(), &self.monthly_charge),
            Column::new(customer::CLTV.into(), &self.cltv),
            Column::new(customer::TENURE_MONTHS.into(), &self.tenure_months),
            Column::new(customer::CHURNED.into(), &self.churned),
            Column::new(derived::CHURN_STATUS.into(), &self.churn_status),
            Column::new(customer::CHURN_SCORE.into(), &self.churn_score),
            Column::new(customer::PHONE_SERVICE.into(), &self.phone_service),
            Column::new(customer::INTERNET_SERVICE.into(), &self.internet_service),
            Column::new(customer::ONLINE_SECURITY.into(), &self.online_security),
            Column::new(customer::LATITUDE.into(), &self.latitude),
            Column::new(customer::LONGITUDE.into(), &self.longitude),
        ])?;
        Ok(df)
    }
}
