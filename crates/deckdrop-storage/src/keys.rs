//! Shared key and identifier generation for storage backends.
//!
//! Remote key format: `{prefix}/{unix_millis}-{sanitized filename}`. The filename is
//! recoverable from the key, which lets `get_file`/`list_files` rebuild records from
//! backend metadata alone.

use crate::traits::{StorageError, StorageResult};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// 128 random bits, hex encoded.
pub fn generate_file_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Leading dots would make hidden files or traversal segments
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Generate an object key (or public id) for `filename` uploaded at `now`.
pub fn generate_object_key(prefix: &str, filename: &str, now: DateTime<Utc>) -> String {
    let name = format!("{}-{}", now.timestamp_millis(), sanitize_filename(filename));
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Recover the (sanitized) filename from a key built by [`generate_object_key`].
pub fn filename_from_key(key: &str) -> String {
    let last = key.rsplit('/').next().unwrap_or(key);
    match last.split_once('-') {
        Some((millis, name)) if !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()) => {
            name.to_string()
        }
        _ => last.to_string(),
    }
}

/// Validate an externally supplied id before it reaches a path or key.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && !id.starts_with('/')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

/// `from + retention`, or a config error when the result leaves chrono's range.
pub fn expiry_after(from: DateTime<Utc>, retention: Duration) -> StorageResult<DateTime<Utc>> {
    from.checked_add_signed(retention).ok_or_else(|| {
        StorageError::ConfigError(format!(
            "Retention of {} days overflows the expiry of {}",
            retention.num_days(),
            from
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_overflow_is_a_config_error() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            expiry_after(now, Duration::days(7)).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
        );

        let err = expiry_after(DateTime::<Utc>::MAX_UTC, Duration::days(1)).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[test]
    fn file_ids_are_128_bit_hex() {
        let a = generate_file_id();
        let b = generate_file_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn sanitizes_filenames() {
        assert_eq!(sanitize_filename("Q3 review (final).pptx"), "Q3_review__final_.pptx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("   "), "file");
    }

    #[test]
    fn object_key_round_trips_filename() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let key = generate_object_key("presentations/", "deck-v2.md", now);
        assert_eq!(key, "presentations/1714564800000-deck-v2.md");
        assert_eq!(filename_from_key(&key), "deck-v2.md");
        assert_eq!(generate_object_key("", "a.md", now), "1714564800000-a.md");
        assert_eq!(filename_from_key("presentations/manual.md"), "manual.md");
    }

    #[test]
    fn rejects_unsafe_ids() {
        assert!(is_safe_id("3f2a9c"));
        assert!(is_safe_id("presentations/1714564800000-deck.md"));
        assert!(!is_safe_id("../secret"));
        assert!(!is_safe_id("/etc/passwd"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("a b"));
    }
}
