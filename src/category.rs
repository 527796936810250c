//! Categorical value tables.
//!
//! Every categorical column has a fixed canonical order. Cells may arrive as
//! the display label or as an integer code; codes index into the canonical
//! order starting at zero. Anything else maps to [`UNMAPPED`].

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

/// Sentinel label for cells that match no entry of their code table.
pub const UNMAPPED: &str = "Unknown";

/// A closed set of labels with a stable order and an integer code per label.
pub trait CodedCategory: Copy + Eq + IntoEnumIterator + Into<&'static str> + 'static {
    /// Position of this value in the canonical order.
    fn code(self) -> i64;

    fn label(self) -> &'static str {
        self.into()
    }

    fn from_code(code: i64) -> Option<Self> {
        Self::iter().find(|c| c.code() == code)
    }

    /// Case-insensitive match on the display label.
    fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::iter().find(|c| c.label().eq_ignore_ascii_case(text))
    }

    /// Resolve a raw cell: label first, then integer code.
    fn resolve(raw: &str) -> Option<Self> {
        Self::from_label(raw).or_else(|| raw.trim().parse::<i64>().ok().and_then(Self::from_code))
    }

    /// Canonical labels followed by the unmapped sentinel.
    fn canonical_labels() -> Vec<&'static str> {
        Self::iter()
            .map(CodedCategory::label)
            .chain(std::iter::once(UNMAPPED))
            .collect()
    }
}

/// Label for an optional category, `None` being the unmapped sentinel.
pub fn label_or_unmapped<T: CodedCategory>(value: Option<T>) -> &'static str {
    value.map_or(UNMAPPED, CodedCategory::label)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum Gender {
    Male = 0,
    Female = 1,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum ContractType {
    #[strum(serialize = "Month-to-month")]
    #[serde(rename = "Month-to-month")]
    MonthToMonth = 0,
    #[strum(serialize = "One year")]
    #[serde(rename = "One year")]
    OneYear = 1,
    #[strum(serialize = "Two year")]
    #[serde(rename = "Two year")]
    TwoYear = 2,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum PaymentMethod {
    #[strum(serialize = "Electronic check")]
    #[serde(rename = "Electronic check")]
    ElectronicCheck = 0,
    #[strum(serialize = "Mailed check")]
    #[serde(rename = "Mailed check")]
    MailedCheck = 1,
    #[strum(serialize = "Bank transfer (automatic)")]
    #[serde(rename = "Bank transfer (automatic)")]
    BankTransfer = 2,
    #[strum(serialize = "Credit card (automatic)")]
    #[serde(rename = "Credit card (automatic)")]
    CreditCard = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum YesNo {
    No = 0,
    Yes = 1,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum InternetService {
    #[strum(serialize = "DSL")]
    #[serde(rename = "DSL")]
    Dsl = 0,
    #[strum(serialize = "Fiber optic")]
    #[serde(rename = "Fiber optic")]
    FiberOptic = 1,
    No = 2,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum OnlineSecurity {
    No = 0,
    Yes = 1,
    #[strum(serialize = "No internet service")]
    #[serde(rename = "No internet service")]
    NoInternetService = 2,
}

/// Label of the senior-citizen flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum SeniorStatus {
    #[strum(serialize = "Non-senior")]
    #[serde(rename = "Non-senior")]
    NonSenior = 0,
    Senior = 1,
}

/// Label of the churn flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum ChurnStatus {
    Retained = 0,
    Churned = 1,
}

impl From<bool> for SeniorStatus {
    fn from(senior: bool) -> Self {
        if senior {
            Self::Senior
        } else {
            Self::NonSenior
        }
    }
}

impl From<bool> for ChurnStatus {
    fn from(churned: bool) -> Self {
        if churned {
            Self::Churned
        } else {
            Self::Retained
        }
    }
}

impl CodedCategory for Gender {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for ContractType {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for PaymentMethod {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for YesNo {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for InternetService {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for OnlineSecurity {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for SeniorStatus {
    fn code(self) -> i64 {
        self as i64
    }
}

impl CodedCategory for ChurnStatus {
    fn code(self) -> i64 {
        self as i64
    }
}

/// Parse a boolean flag cell (`1`/`0`, `yes`/`no`, `true`/`false`).
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "yes" | "true" => Some(true),
        "0" | "0.0" | "no" | "false" => Some(false),
        _ => None,
    }
}
