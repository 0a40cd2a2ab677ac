//! UPI deep link generation for link-settled payment methods.

use crate::config::UpiConfig;
use service_core::error::AppError;

/// Builds a `upi://pay` deep link for the given order. Requires a configured
/// payee VPA.
pub fn payment_link(config: &UpiConfig, order_id: &str, amount: f64) -> Result<String, AppError> {
    let upi_id = config
        .upi_id
        .as_deref()
        .ok_or_else(|| AppError::bad_request("UPI payments are not configured"))?;

    let name = urlencode(&config.business_name);
    let note = urlencode(&format!("Order {}", order_id));
    Ok(format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu=INR&tn={}",
        upi_id, name, amount, note
    ))
}

/// Percent-encode the few characters UPI apps choke on. Query values here
/// are business names and order notes, not arbitrary URLs.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            ' ' => out.push_str("%20"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '%' => out.push_str("%25"),
            '+' => out.push_str("%2B"),
            '=' => out.push_str("%3D"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UpiConfig {
        UpiConfig {
            upi_id: Some("merchant@upi".to_string()),
            business_name: "Service Hub".to_string(),
        }
    }

    #[test]
    fn builds_deep_link() {
        let link = payment_link(&config(), "TXN_1", 499.5).unwrap();
        assert_eq!(
            link,
            "upi://pay?pa=merchant@upi&pn=Service%20Hub&am=499.50&cu=INR&tn=Order%20TXN_1"
        );
    }

    #[test]
    fn requires_configured_vpa() {
        let config = UpiConfig {
            upi_id: None,
            business_name: "Service Hub".to_string(),
        };
        assert!(payment_link(&config, "TXN_1", 100.0).is_err());
    }
}
