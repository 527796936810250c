use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::category::{label_or_unmapped, CodedCategory, ContractType, PaymentMethod};
use crate::dataset::CustomerRecord;
use crate::schema::customer;

/// The user's selector state.
///
/// An empty set on a column means "no constraint on that column". Values are
/// stored as canonical labels; free text that resolves to no label is kept as
/// typed and simply matches no row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    contracts: BTreeSet<String>,
    payment_methods: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contracts(mut self, contracts: impl IntoIterator<Item = ContractType>) -> Self {
        self.contracts = contracts.into_iter().map(|c| c.label().to_string()).collect();
        self
    }

    pub fn with_payment_methods(
        mut self,
        methods: impl IntoIterator<Item = PaymentMethod>,
    ) -> Self {
        self.payment_methods = methods.into_iter().map(|m| m.label().to_string()).collect();
        self
    }

    /// Build a selection from raw selector values (labels or integer codes).
    pub fn from_labels<C, P, S, T>(contracts: C, payment_methods: P) -> Self
    where
        C: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            contracts: canonical_set::<ContractType, _, _>(contracts),
            payment_methods: canonical_set::<PaymentMethod, _, _>(payment_methods),
        }
    }

    pub fn contracts(&self) -> &BTreeSet<String> {
        &self.contracts
    }

    pub fn payment_methods(&self) -> &BTreeSet<String> {
        &self.payment_methods
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty() && self.payment_methods.is_empty()
    }

    /// Row predicate over the normalized table.
    pub fn predicate(&self) -> Expr {
        let mut expr = lit(true);
        if let Some(contracts) = membership(customer::CONTRACT, &self.contracts) {
            expr = expr.and(contracts);
        }
        if let Some(payments) = membership(customer::PAYMENT_METHOD, &self.payment_methods) {
            expr = expr.and(payments);
        }
        expr
    }

    /// Same predicate as [`FilterSelection::predicate`], evaluated on one record.
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        let admits = |selected: &BTreeSet<String>, label: &str| {
            selected.is_empty() || selected.contains(label)
        };
        admits(&self.contracts, label_or_unmapped(record.contract))
            && admits(&self.payment_methods, label_or_unmapped(record.payment_method))
    }
}

fn canonical_set<T, I, S>(values: I) -> BTreeSet<String>
where
    T: CodedCategory,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|raw| {
            let raw = raw.as_ref();
            T::resolve(raw).map_or_else(|| raw.trim().to_string(), |c| c.label().to_string())
        })
        .collect()
}

fn membership(column: &str, selected: &BTreeSet<String>) -> Option<Expr> {
    if selected.is_empty() {
        return None;
    }
    let values: Vec<&str> = selected.iter().map(String::as_str).collect();
    let values = Series::new(column.into(), values);
    Some(col(column).is_in(lit(values), false))
}
