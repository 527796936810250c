//! Column-name constants for churnlens.
//! Single source of truth - also exported to Python when the binding is built.

// ── Source CSV headers ──────────────────────────────────────────────────────
pub mod source {
    pub const CUSTOMER_ID: &str = "CustomerID";
    pub const GENDER: &str = "Gender";
    pub const SENIOR_CITIZEN: &str = "Senior Citizen";
    pub const CONTRACT: &str = "Contract";
    pub const PAYMENT_METHOD: &str = "Payment Method";
    pub const MONTHLY_CHARGES: &str = "Monthly Charges";
    pub const CLTV: &str = "CLTV";
    pub const TENURE_MONTHS: &str = "Tenure Months";
    pub const CHURN_VALUE: &str = "Churn Value";
    pub const CHURN_SCORE: &str = "Churn Score";
    pub const PHONE_SERVICE: &str = "Phone Service";
    pub const INTERNET_SERVICE: &str = "Internet Service";
    pub const ONLINE_SECURITY: &str = "Online Security";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";

    pub const REQUIRED: [&str; 15] = [
        CUSTOMER_ID,
        GENDER,
        SENIOR_CITIZEN,
        CONTRACT,
        PAYMENT_METHOD,
        MONTHLY_CHARGES,
        CLTV,
        TENURE_MONTHS,
        CHURN_VALUE,
        CHURN_SCORE,
        PHONE_SERVICE,
        INTERNET_SERVICE,
        ONLINE_SECURITY,
        LATITUDE,
        LONGITUDE,
    ];
}

// ── Normalized table columns ────────────────────────────────────────────────
pub mod customer {
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const GENDER: &str = "gender";
    pub const SENIOR_CITIZEN: &str = "senior_citizen";
    pub const CONTRACT: &str = "contract";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const MONTHLY_CHARGE: &str = "monthly_charge";
    pub const CLTV: &str = "cltv";
    pub const TENURE_MONTHS: &str = "tenure_months";
    pub const CHURNED: &str = "churned";
    pub const CHURN_SCORE: &str = "churn_score";
    pub const PHONE_SERVICE: &str = "phone_service";
    pub const INTERNET_SERVICE: &str = "internet_service";
    pub const ONLINE_SECURITY: &str = "online_security";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

// ── Label columns derived from boolean flags ────────────────────────────────
pub mod derived {
    pub const SENIOR_STATUS: &str = "senior_status";
    pub const CHURN_STATUS: &str = "churn_status";
    pub const TENURE_BAND_PREFIX: &str = "tenure_band";
}

// ── Aggregation output columns ──────────────────────────────────────────────
pub mod output {
    pub const VALUE: &str = "_value";
    pub const COUNT: &str = "_count";
}

// ── KPI identifiers ─────────────────────────────────────────────────────────
pub mod kpi {
    pub const CHURN_RATE: &str = "churn_rate";
    pub const AVG_CLTV: &str = "avg_cltv";
    pub const AVG_MONTHLY_CHARGE: &str = "avg_monthly_charge";
    pub const AVG_TENURE: &str = "avg_tenure";
    pub const SENIOR_PCT: &str = "senior_pct";

    pub const ALL: [&str; 5] = [
        CHURN_RATE,
        AVG_CLTV,
        AVG_MONTHLY_CHARGE,
        AVG_TENURE,
        SENIOR_PCT,
    ];
}

// ── Chart identifiers ───────────────────────────────────────────────────────
pub mod chart {
    pub const CHURN_BY_GENDER: &str = "churn_by_gender";
    pub const CUSTOMER_MAP: &str = "customer_map";
    pub const CHARGES_BY_CONTRACT: &str = "charges_by_contract";
    pub const CHURN_BY_CONTRACT: &str = "churn_by_contract";
    pub const CHURN_BY_GENDER_SENIOR: &str = "churn_by_gender_senior";
    pub const CHURN_BY_TENURE: &str = "churn_by_tenure";
    pub const TENURE_HISTOGRAM: &str = "tenure_histogram";
    pub const PAYMENT_MIX: &str = "payment_mix";
    pub const CHURN_BY_INTERNET: &str = "churn_by_internet";
    pub const SCORE_BY_CONTRACT: &str = "score_by_contract";
}
