use std::{cmp::min, collections::HashMap, time::Duration};

/// Additional request headers (auth tokens, etc).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        Self { inner: map }
    }
}

/// Exponential-backoff retry schedule for [`crate::RetryNet`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before the given attempt. Attempt 0 is the initial request.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match 2_u32.checked_pow(attempt - 1) {
            Some(factor) => min(self.base_delay.saturating_mul(factor), self.max_delay),
            None => self.max_delay,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NetOptions {
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// Max idle connections per host. 0 disables pooling.
    pub pool_max_idle_per_host: usize,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            pool_max_idle_per_host: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::key_present("Authorization", "Bearer token", Some("Bearer token"))]
    #[case::empty_value("X-Empty", "", Some(""))]
    fn headers_insert_and_get(
        #[case] key: &str,
        #[case] value: &str,
        #[case] expected: Option<&str>,
    ) {
        let mut headers = Headers::new();
        headers.insert(key, value);
        assert_eq!(headers.get(key), expected);
        assert_eq!(headers.get("missing"), None);
    }

    #[rstest]
    fn headers_from_hashmap_keeps_entries() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), "1".to_string());
        map.insert("b".to_string(), "2".to_string());
        let headers: Headers = map.into();

        assert!(!headers.is_empty());
        assert_eq!(headers.iter().count(), 2);
    }

    #[rstest]
    #[case(0, Duration::ZERO)]
    #[case(1, Duration::from_millis(100))]
    #[case(2, Duration::from_millis(200))]
    #[case(3, Duration::from_millis(400))]
    #[case(10, Duration::from_secs(5))] // capped at max_delay
    fn retry_policy_delay_schedule(#[case] attempt: u32, #[case] expected: Duration) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(attempt), expected);
    }

    #[rstest]
    fn retry_policy_large_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for_attempt(40) <= policy.max_delay);
    }
}
