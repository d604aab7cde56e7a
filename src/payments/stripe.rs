use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{CardDetails, CreatePaymentIntent, PaymentIntent, PaymentProcessor};
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook before it's treated as a replay.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeCharge {
    #[serde(default)]
    payment_method_details: Option<StripePaymentMethodDetails>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentMethodDetails {
    #[serde(default)]
    card: Option<StripeCard>,
}

#[derive(Debug, Deserialize)]
struct StripeCard {
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    last4: Option<String>,
}

/// Outcome of a Stripe API call whose "not found" is a normal answer.
enum Lookup<T> {
    Found(T),
    Missing,
}

impl StripeClient {
    pub fn new(secret_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, builder: RequestBuilder, account_id: Option<&str>) -> RequestBuilder {
        let builder = builder.bearer_auth(&self.secret_key);
        match account_id {
            Some(account) => builder.header("Stripe-Account", account),
            None => builder,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, builder: RequestBuilder) -> Result<Lookup<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe API error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .json::<T>()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to parse Stripe response: {}", e)))?;
            return Ok(Lookup::Found(body));
        }

        let error_text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<StripeErrorBody>(&error_text)
            .map(|b| b.error)
            .ok();

        if status == StatusCode::NOT_FOUND
            || detail.as_ref().and_then(|d| d.code.as_deref()) == Some("resource_missing")
        {
            return Ok(Lookup::Missing);
        }

        let message = detail
            .and_then(|d| d.message)
            .unwrap_or(error_text);
        Err(AppError::Internal(format!(
            "Stripe API error ({}): {}",
            status, message
        )))
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(&self, request: &CreatePaymentIntent) -> Result<PaymentIntent> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), request.amount.to_string()),
            ("currency".into(), request.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
        ];
        if let Some(ref description) = request.description {
            form.push(("description".into(), description.clone()));
        }
        if let Some(ref email) = request.receipt_email {
            form.push(("receipt_email".into(), email.clone()));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        let builder = self.request(
            self.client
                .post(format!("{}/v1/payment_intents", self.api_base))
                .form(&form),
            Some(&request.account_id),
        );

        match self.send::<PaymentIntent>(builder).await? {
            Lookup::Found(intent) => Ok(intent),
            Lookup::Missing => Err(AppError::Internal(
                "Stripe rejected the connected account".into(),
            )),
        }
    }

    async fn retrieve_payment_intent(
        &self,
        id: &str,
        account_id: Option<&str>,
    ) -> Result<Option<PaymentIntent>> {
        let builder = self.request(
            self.client.get(format!(
                "{}/v1/payment_intents/{}",
                self.api_base,
                urlencoding::encode(id)
            )),
            account_id,
        );

        match self.send::<PaymentIntent>(builder).await? {
            Lookup::Found(intent) => Ok(Some(intent)),
            Lookup::Missing => Ok(None),
        }
    }

    async fn card_details(
        &self,
        charge_id: &str,
        account_id: Option<&str>,
    ) -> Result<Option<CardDetails>> {
        let builder = self.request(
            self.client.get(format!(
                "{}/v1/charges/{}",
                self.api_base,
                urlencoding::encode(charge_id)
            )),
            account_id,
        );

        match self.send::<StripeCharge>(builder).await? {
            Lookup::Found(charge) => Ok(charge
                .payment_method_details
                .and_then(|d| d.card)
                .map(|card| CardDetails {
                    brand: card.brand,
                    last4: card.last4,
                })),
            Lookup::Missing => Ok(None),
        }
    }
}

// ============ Webhooks ============

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Connected account the event happened on (absent for platform events)
    #[serde(default)]
    pub account: Option<String>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`).
///
/// The signed payload is `"{t}.{body}"` under HMAC-SHA256 with the endpoint
/// secret. Any matching `v1` entry is accepted, provided the timestamp is
/// within `WEBHOOK_TOLERANCE_SECS` of `now`.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<bool> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return Ok(false);
    };
    let Ok(signed_at) = timestamp.parse::<i64>() else {
        return Ok(false);
    };
    if (now - signed_at).abs() > WEBHOOK_TOLERANCE_SECS {
        return Ok(false);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    Ok(signatures
        .iter()
        .any(|sig| bool::from(expected.as_bytes().ct_eq(sig.as_bytes()))))
}
