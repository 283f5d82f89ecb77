//! Item identifiers
//!
//! Ids are a base-36 millisecond timestamp followed by a random base-36
//! suffix. They sort roughly by creation time and do not collide in
//! practice; they are not meant to be unguessable.

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix
const SUFFIX_LEN: usize = 8;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh item id
pub fn next_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let mut id = to_base36(millis);

    let mut random = Uuid::new_v4().as_u128();
    for _ in 0..SUFFIX_LEN {
        id.push(ALPHABET[(random % 36) as usize] as char);
        random /= 36;
    }

    id
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..5000).map(|_| next_id()).collect();
        assert_eq!(ids.len(), 5000);
    }

    #[test]
    fn test_id_shape() {
        let id = next_id();
        assert!(id.len() > SUFFIX_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1295), "zz");
    }
}
