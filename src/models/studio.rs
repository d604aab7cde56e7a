use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Studio {
    pub id: String,
    pub name: String,
    pub allow_online_booking: bool,
    pub require_deposit: bool,
    /// Flat amount, or a percent of the service price when `deposit_percentage` is set
    pub deposit_amount: f64,
    pub deposit_percentage: bool,
    /// Connected payment account; deposits can only be collected when present
    #[serde(skip_serializing)]
    pub stripe_account_id: Option<String>,
    pub currency: String,
    pub timezone: Option<String>,
    pub created_at: i64,
}

impl Studio {
    pub fn has_payment_account(&self) -> bool {
        self.stripe_account_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

/// What the public booking page is allowed to see of a studio.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStudio {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub timezone: Option<String>,
    pub require_deposit: bool,
    pub deposit_amount: f64,
    pub deposit_percentage: bool,
    pub accepts_deposits: bool,
}

impl From<&Studio> for PublicStudio {
    fn from(studio: &Studio) -> Self {
        Self {
            id: studio.id.clone(),
            name: studio.name.clone(),
            currency: studio.currency.clone(),
            timezone: studio.timezone.clone(),
            require_deposit: studio.require_deposit,
            deposit_amount: studio.deposit_amount,
            deposit_percentage: studio.deposit_percentage,
            accepts_deposits: studio.require_deposit && studio.has_payment_account(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStudio {
    pub name: String,
    #[serde(default = "default_true")]
    pub allow_online_booking: bool,
    #[serde(default)]
    pub require_deposit: bool,
    #[serde(default)]
    pub deposit_amount: f64,
    #[serde(default)]
    pub deposit_percentage: bool,
    #[serde(default)]
    pub stripe_account_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_true() -> bool {
    true
}
