use crate::money::Money;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
        };
        write!(f, "{label}")
    }
}

/// Settlement status of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    New,
    Authorized,
    Captured,
    PartiallyRefunded,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthStatus {
    Authorized,
    /// Re-authorizing an authorized payment is idempotent; funds are not
    /// frozen a second time.
    AlreadyAuthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
    Captured,
    AlreadyCaptured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Refunded,
    PartialRefund,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub payment_id: Uuid,
    pub status: AuthStatus,
    pub amount: Money,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub payment_id: Uuid,
    pub status: CaptureStatus,
    pub amount: Money,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundResult {
    pub payment_id: Uuid,
    pub status: RefundStatus,
    pub amount: Money,
    pub method: PaymentMethod,
}

/// Snapshot of one payment's running totals and audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub method: PaymentMethod,
    pub authorized_amount: Money,
    pub captured_amount: Money,
    pub refunded_amount: Money,
    pub status: PaymentStatus,
    pub history: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment has not been authorized")]
    NotAuthorized,

    #[error("funds already captured for this payment")]
    AlreadyCaptured,

    #[error("capture amount {requested} exceeds remaining capturable {limit}")]
    AmountMismatch { requested: Money, limit: Money },

    #[error("refund amount {requested} exceeds refundable {refundable}")]
    RefundExceedsCapture { requested: Money, refundable: Money },

    #[error("payment amount must not be negative: {0}")]
    NegativeAmount(Money),
}

/// Common contract for all payment methods.
///
/// `order_total` is the order's `final_total()` at call time; it is the
/// capture ceiling for cash, and the authorization amount for card/online.
pub trait Payment: Send {
    fn method(&self) -> PaymentMethod;

    /// Freeze funds (optional marker for cash).
    fn authorize(&mut self, order_total: Money) -> Result<AuthResult, PaymentError>;

    /// Charge funds, cumulatively bounded by the authorized amount
    /// (card/online) and the order total.
    fn capture(&mut self, order_total: Money, amount: Money) -> Result<CaptureResult, PaymentError>;

    /// Return funds, cumulatively bounded by the captured amount.
    fn refund(&mut self, amount: Money) -> Result<RefundResult, PaymentError>;

    fn record(&self) -> PaymentRecord;
}

/// Running settlement state shared by every payment method.
#[derive(Debug)]
struct Ledger {
    id: Uuid,
    method: PaymentMethod,
    requires_auth: bool,
    authorized: Money,
    captured: Money,
    refunded: Money,
    status: PaymentStatus,
    history: Vec<String>,
}

impl Ledger {
    fn new(method: PaymentMethod, requires_auth: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            requires_auth,
            authorized: Money::zero(),
            captured: Money::zero(),
            refunded: Money::zero(),
            status: PaymentStatus::New,
            history: Vec::new(),
        }
    }

    fn note(&mut self, line: String) {
        self.history.push(format!("{} {}", Utc::now().to_rfc3339(), line));
    }

    fn authorize(&mut self, order_total: Money) -> Result<AuthResult, PaymentError> {
        if order_total.is_negative() {
            return Err(PaymentError::NegativeAmount(order_total));
        }
        match self.status {
            PaymentStatus::New => {
                self.authorized = order_total;
                self.status = PaymentStatus::Authorized;
                self.note(format!("authorized {} via {}", order_total, self.method));
                tracing::info!(payment_id = %self.id, amount = %order_total, "payment authorized");
                Ok(AuthResult {
                    payment_id: self.id,
                    status: AuthStatus::Authorized,
                    amount: order_total,
                    method: self.method,
                })
            }
            PaymentStatus::Authorized => Ok(AuthResult {
                payment_id: self.id,
                status: AuthStatus::AlreadyAuthorized,
                amount: self.authorized,
                method: self.method,
            }),
            _ => Err(PaymentError::AlreadyCaptured),
        }
    }

    fn capture(&mut self, order_total: Money, amount: Money) -> Result<CaptureResult, PaymentError> {
        if amount.is_negative() {
            return Err(PaymentError::NegativeAmount(amount));
        }
        if self.requires_auth && self.status == PaymentStatus::New {
            return Err(PaymentError::NotAuthorized);
        }

        let ceiling = if self.requires_auth {
            self.authorized.min(order_total)
        } else {
            order_total
        };

        if !self.captured.is_zero() && self.captured >= ceiling {
            return Ok(CaptureResult {
                payment_id: self.id,
                status: CaptureStatus::AlreadyCaptured,
                amount: self.captured,
                method: self.method,
            });
        }
        if self.captured + amount > ceiling {
            return Err(PaymentError::AmountMismatch {
                requested: amount,
                limit: ceiling - self.captured,
            });
        }

        self.captured += amount;
        self.status = PaymentStatus::Captured;
        self.note(format!("captured {} via {}", amount, self.method));
        tracing::info!(payment_id = %self.id, amount = %amount, "payment captured");
        Ok(CaptureResult {
            payment_id: self.id,
            status: CaptureStatus::Captured,
            amount,
            method: self.method,
        })
    }

    fn refund(&mut self, amount: Money) -> Result<RefundResult, PaymentError> {
        if amount.is_negative() {
            return Err(PaymentError::NegativeAmount(amount));
        }
        if amount.is_zero() {
            return Ok(RefundResult {
                payment_id: self.id,
                status: RefundStatus::NoOp,
                amount: Money::zero(),
                method: self.method,
            });
        }

        let refundable = self.captured - self.refunded;
        if amount > refundable {
            return Err(PaymentError::RefundExceedsCapture {
                requested: amount,
                refundable,
            });
        }

        self.refunded += amount;
        let status = if self.refunded == self.captured {
            self.status = PaymentStatus::Refunded;
            RefundStatus::Refunded
        } else {
            self.status = PaymentStatus::PartiallyRefunded;
            RefundStatus::PartialRefund
        };
        self.note(format!("refunded {} via {}", amount, self.method));
        tracing::info!(payment_id = %self.id, amount = %amount, "payment refunded");
        Ok(RefundResult {
            payment_id: self.id,
            status,
            amount,
            method: self.method,
        })
    }

    fn record(&self) -> PaymentRecord {
        PaymentRecord {
            payment_id: self.id,
            method: self.method,
            authorized_amount: self.authorized,
            captured_amount: self.captured,
            refunded_amount: self.refunded,
            status: self.status,
            history: self.history.clone(),
        }
    }
}

/// Cash settles at the counter: capture needs no prior authorization.
#[derive(Debug)]
pub struct CashPayment {
    ledger: Ledger,
}

impl CashPayment {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(PaymentMethod::Cash, false),
        }
    }
}

impl Default for CashPayment {
    fn default() -> Self {
        Self::new()
    }
}

impl Payment for CashPayment {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    fn authorize(&mut self, order_total: Money) -> Result<AuthResult, PaymentError> {
        self.ledger.authorize(order_total)
    }

    fn capture(&mut self, order_total: Money, amount: Money) -> Result<CaptureResult, PaymentError> {
        self.ledger.capture(order_total, amount)
    }

    fn refund(&mut self, amount: Money) -> Result<RefundResult, PaymentError> {
        self.ledger.refund(amount)
    }

    fn record(&self) -> PaymentRecord {
        self.ledger.record()
    }
}

/// Card payments freeze funds at a provider before capture.
#[derive(Debug)]
pub struct CardPayment {
    ledger: Ledger,
    provider: String,
}

impl CardPayment {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            ledger: Ledger::new(PaymentMethod::Card, true),
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl Default for CardPayment {
    fn default() -> Self {
        Self::new("mock-card")
    }
}

impl Payment for CardPayment {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Card
    }

    fn authorize(&mut self, order_total: Money) -> Result<AuthResult, PaymentError> {
        self.ledger.authorize(order_total)
    }

    fn capture(&mut self, order_total: Money, amount: Money) -> Result<CaptureResult, PaymentError> {
        self.ledger.capture(order_total, amount)
    }

    fn refund(&mut self, amount: Money) -> Result<RefundResult, PaymentError> {
        self.ledger.refund(amount)
    }

    fn record(&self) -> PaymentRecord {
        self.ledger.record()
    }
}

/// Online payments follow the card flow through a different provider.
#[derive(Debug)]
pub struct OnlinePayment {
    ledger: Ledger,
    provider: String,
}

impl OnlinePayment {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            ledger: Ledger::new(PaymentMethod::Online, true),
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl Default for OnlinePayment {
    fn default() -> Self {
        Self::new("mock-online")
    }
}

impl Payment for OnlinePayment {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Online
    }

    fn authorize(&mut self, order_total: Money) -> Result<AuthResult, PaymentError> {
        self.ledger.authorize(order_total)
    }

    fn capture(&mut self, order_total: Money, amount: Money) -> Result<CaptureResult, PaymentError> {
        self.ledger.capture(order_total, amount)
    }

    fn refund(&mut self, amount: Money) -> Result<RefundResult, PaymentError> {
        self.ledger.refund(amount)
    }

    fn record(&self) -> PaymentRecord {
        self.ledger.record()
    }
}
