use std::time::{SystemTime, UNIX_EPOCH};

pub fn now() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|elapsed| elapsed.as_secs() as i64)
    .unwrap_or(0)
}

/// Compare a presented token against the configured one without
/// stopping at the first differing byte.
pub fn token_matches(expected: &str, presented: &str) -> bool {
  let (expected, presented) = (expected.as_bytes(), presented.as_bytes());
  if expected.len() != presented.len() {
    return false;
  }
  expected
    .iter()
    .zip(presented)
    .fold(0u8, |diff, (a, b)| diff | (a ^ b))
    == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_now_is_after_2024() {
    assert!(now() > 1_704_067_200);
  }

  #[test]
  fn test_token_matches() {
    assert!(token_matches("secret-token", "secret-token"));
    assert!(!token_matches("secret-token", "secret-tokeN"));
    assert!(!token_matches("secret-token", "secret"));
    assert!(!token_matches("secret-token", ""));
  }
}
