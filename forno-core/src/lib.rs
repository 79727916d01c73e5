pub mod money;
pub mod payment;

pub use money::{quantize, Money};
pub use payment::{
    AuthResult, AuthStatus, CaptureResult, CaptureStatus, CashPayment, CardPayment, OnlinePayment,
    Payment, PaymentError, PaymentMethod, PaymentRecord, PaymentStatus, RefundResult, RefundStatus,
};
