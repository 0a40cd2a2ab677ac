pub mod password;
pub mod validation;

pub use password::{hash_password, verify_password};
pub use validation::ValidatedJson;

use rand::Rng;

/// Six-digit numeric code for password resets.
pub fn generate_reset_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
