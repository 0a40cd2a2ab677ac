pub mod google;
pub mod jwt;
pub mod upi;

pub use google::GoogleVerifier;
pub use jwt::{Claims, TokenService};
