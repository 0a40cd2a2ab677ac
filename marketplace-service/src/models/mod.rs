pub mod account;
pub mod agent;
pub mod booking;
pub mod notification;
pub mod payment;
pub mod service;

pub use account::{Account, ProfileChanges, ResetCode, Role, SanitizedAccount};
pub use agent::Agent;
pub use booking::{AgentSnapshot, Booking, BookingStatus, LineItem};
pub use notification::{Notification, NotificationStatus};
pub use payment::{
    generate_order_id, PaymentIntent, PaymentMethod, PaymentStatus, PointsEntry, RewardPoints,
    SavedCard, Wallet, WalletEntry,
};
pub use service::{Service, ServiceChanges};
