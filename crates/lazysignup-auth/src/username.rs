//! Username generation for lazy accounts.

use uuid::Uuid;

/// Produce a candidate username of at most `max_length` characters.
///
/// The candidate is the hex form of a random UUIDv4, behind `prefix`
/// when one is configured, truncated to fit the user model. Uniqueness
/// is settled by the store's unique index, not here.
pub fn generate_username(prefix: Option<&str>, max_length: usize) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let candidate = match prefix {
        Some(p) => format!("{p}{token}"),
        None => token,
    };
    candidate.chars().take(max_length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_32_hex_chars() {
        let name = generate_username(None, 150);
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn truncated_to_max_length() {
        assert_eq!(generate_username(None, 30).len(), 30);
        assert_eq!(generate_username(Some("lazyuser_"), 13).len(), 13);
    }

    #[test]
    fn prefix_is_kept() {
        let name = generate_username(Some("lazyuser_"), 150);
        assert!(name.starts_with("lazyuser_"));
        assert_eq!(name.len(), "lazyuser_".len() + 32);
    }

    #[test]
    fn candidates_differ() {
        assert_ne!(generate_username(None, 150), generate_username(None, 150));
    }
}
