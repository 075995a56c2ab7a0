//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Serde adapter storing a [`Duration`](std::time::Duration) as whole milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }

    /// Same encoding for `Option<Duration>`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => serializer.serialize_some(&(d.as_millis().min(u64::MAX as u128) as u64)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        // 'é' is 2 bytes; cutting at byte 2 would land inside it
        let s = "aéb";
        assert_eq!(truncate_str(s, 2), "a");
        assert_eq!(truncate_str(s, 3), "aé");
    }

    #[derive(Serialize, Deserialize)]
    struct Timed {
        #[serde(with = "duration_ms")]
        timeout: Duration,
        #[serde(default, with = "duration_ms::option")]
        elapsed: Option<Duration>,
    }

    #[test]
    fn durations_are_encoded_as_millis() {
        let value = Timed {
            timeout: Duration::from_secs(2),
            elapsed: None,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["timeout"], 2000);
        assert!(json["elapsed"].is_null());

        let parsed: Timed = serde_json::from_str(r#"{"timeout": 1500}"#).unwrap();
        assert_eq!(parsed.timeout, Duration::from_millis(1500));
        assert!(parsed.elapsed.is_none());
    }
}
