//! Domain layer: services, models, and the commands they consume.

pub mod commands;
pub mod coupon_service;
pub mod models;
pub mod refund_service;
pub mod transaction_service;
pub mod transfer_service;
pub mod wallet_service;

pub use coupon_service::CouponService;
pub use refund_service::{calculate_refund, CancellationTier, RefundBreakdown, RefundService};
pub use transaction_service::TransactionService;
pub use transfer_service::TransferService;
pub use wallet_service::WalletService;
