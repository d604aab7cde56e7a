//! Deposit sizing.
//!
//! Amounts are whole currency units (the studio's configured figure, rounded),
//! and only converted to minor units at the processor boundary.

use crate::models::{Service, Studio};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositPolicy {
    pub require_deposit: bool,
    pub deposit_amount: f64,
    /// Interpret `deposit_amount` as a percent of the service price
    pub deposit_percentage: bool,
}

impl From<&Studio> for DepositPolicy {
    fn from(studio: &Studio) -> Self {
        Self {
            require_deposit: studio.require_deposit,
            deposit_amount: studio.deposit_amount,
            deposit_percentage: studio.deposit_percentage,
        }
    }
}

/// Deposit owed for a service priced at `price` (absent = 0). Never negative.
pub fn deposit_amount(price: Option<f64>, policy: &DepositPolicy) -> i64 {
    if !policy.require_deposit {
        return 0;
    }

    let raw = if policy.deposit_percentage {
        price.unwrap_or(0.0) * policy.deposit_amount / 100.0
    } else {
        policy.deposit_amount
    };

    if raw.is_finite() && raw > 0.0 {
        raw.round() as i64
    } else {
        0
    }
}

pub fn to_minor_units(units: i64) -> i64 {
    units.saturating_mul(100)
}

/// Whether a booking goes straight to an appointment or through a deposit payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositDecision {
    /// Book directly, no payment step
    None,
    /// Collect `amount` (whole units) on the studio's connected account
    Required { amount: i64, account_id: String },
}

impl DepositDecision {
    /// A studio without a payment account books directly even when it asks for
    /// deposits: a misconfigured studio still takes bookings.
    pub fn for_studio(studio: &Studio, service: &Service) -> Self {
        let amount = deposit_amount(service.price, &DepositPolicy::from(studio));
        match studio.stripe_account_id.as_deref().map(str::trim) {
            Some(account_id) if amount > 0 && !account_id.is_empty() => DepositDecision::Required {
                amount,
                account_id: account_id.to_string(),
            },
            _ => DepositDecision::None,
        }
    }
}
