//! Payment processor seam.
//!
//! The booking flow only needs three things from a processor: create a
//! payment intent on a studio's connected account, read it back, and look up
//! the card that paid. `StripeClient` is the production implementation.

mod stripe;

pub use stripe::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    /// Minor units
    pub amount: i64,
    /// Minor units actually captured
    #[serde(default)]
    pub amount_received: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Charge id of the most recent charge attempt
    #[serde(default)]
    pub latest_charge: Option<String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Minor units
    pub amount: i64,
    pub currency: String,
    /// Connected account that receives the funds
    pub account_id: String,
    pub metadata: BTreeMap<String, String>,
    pub description: Option<String>,
    pub receipt_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: Option<String>,
    pub last4: Option<String>,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(&self, request: &CreatePaymentIntent) -> Result<PaymentIntent>;

    /// Fetch an intent, scoped to `account_id` when given (platform account otherwise).
    /// Returns `Ok(None)` when the processor reports no such intent in that scope.
    async fn retrieve_payment_intent(
        &self,
        id: &str,
        account_id: Option<&str>,
    ) -> Result<Option<PaymentIntent>>;

    /// Card brand and last four digits of the card behind a charge.
    async fn card_details(&self, charge_id: &str, account_id: Option<&str>)
    -> Result<Option<CardDetails>>;
}
