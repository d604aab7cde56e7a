//! Public booking flow: slot calculation, deposit policy, payment-intent
//! metadata, and reconciliation of confirmed deposits.

pub mod deposit;
pub mod metadata;
pub mod reconcile;
pub mod slots;

pub use deposit::{DepositDecision, DepositPolicy, deposit_amount, to_minor_units};
pub use metadata::{BookingMetadata, MetadataError};
pub use reconcile::{ReconcileOutcome, reconcile_payment};
pub use slots::{SLOT_STEP_MINUTES, available_slots, is_slot_available, overlapping};
