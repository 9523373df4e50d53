use std::fmt;

/// HTTP Basic credentials attached to every request while set.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub(crate) fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Mutable pre-request state read fresh by
/// [`HttpDownloader`](crate::HttpDownloader) on every fetch.
///
/// The holder stores values as given and performs no range or consistency
/// checks: callers may set `sleep_max < sleep_min` or a `max_retries` of zero
/// without error. How such values play out is decided at fetch time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    /// Lower bound of the pre-request delay in microseconds.
    sleep_min: u64,
    /// Upper bound of the pre-request delay in microseconds.
    sleep_max: u64,
    /// Pause between retries in seconds; stored for callers, see
    /// [`FetchConfig::retry_pause`].
    retry_pause: u64,
    /// Per-attempt transfer timeout in seconds.
    timeout: u64,
    /// POST fields in insertion order; empty means GET.
    post_fields: Vec<(String, String)>,
    /// Raw `Key: Value` header lines in insertion order.
    headers: Vec<String>,
    /// Whether peer certificate and hostname verification are required.
    tls_verify: bool,
    /// Optional HTTP Basic credentials.
    basic_auth: Option<BasicAuth>,
    /// Number of attempts the retry loop runs.
    max_retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            sleep_min: 0,
            sleep_max: 0,
            retry_pause: 1,
            timeout: 5,
            post_fields: Vec::new(),
            headers: Vec::new(),
            tls_verify: true,
            basic_auth: None,
            max_retries: 1,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both delay bounds in one call.
    pub fn set_sleep(&mut self, min: u64, max: u64) {
        self.set_sleep_min(min);
        self.set_sleep_max(max);
    }

    /// Lower bound of the randomized pre-request delay in microseconds.
    ///
    /// A zero lower bound disables the delay entirely, regardless of the
    /// upper bound.
    pub fn sleep_min(&self) -> u64 {
        self.sleep_min
    }

    pub fn set_sleep_min(&mut self, sleep_min: u64) {
        self.sleep_min = sleep_min;
    }

    /// Upper bound of the randomized pre-request delay in microseconds.
    pub fn sleep_max(&self) -> u64 {
        self.sleep_max
    }

    pub fn set_sleep_max(&mut self, sleep_max: u64) {
        self.sleep_max = sleep_max;
    }

    /// Pause between retry attempts in seconds.
    ///
    /// The retry loop currently pauses a fixed one second between attempts;
    /// this value is stored and readable but not consulted.
    pub fn retry_pause(&self) -> u64 {
        self.retry_pause
    }

    pub fn set_retry_pause(&mut self, retry_pause: u64) {
        self.retry_pause = retry_pause;
    }

    /// Per-attempt transfer timeout in seconds.
    ///
    /// Bounds an individual attempt, not the whole call: a fetch may take up
    /// to `max_retries` timeouts plus the inter-attempt pauses plus the
    /// initial delay.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: u64) {
        self.timeout = timeout;
    }

    /// POST fields sent as a form-encoded request body; an empty set means
    /// the request stays a GET.
    pub fn post_fields(&self) -> &[(String, String)] {
        &self.post_fields
    }

    /// Replaces the whole POST field set.
    pub fn set_post_fields(&mut self, post_fields: Vec<(String, String)>) {
        self.post_fields = post_fields;
    }

    /// Inserts or overwrites a single POST field; the last write for a given
    /// key wins and the field keeps its original position.
    pub fn add_post_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .post_fields
            .iter_mut()
            .find(|(existing, _)| *existing == key)
        {
            Some((_, slot)) => *slot = value,
            None => self.post_fields.push((key, value)),
        }
    }

    /// Raw header lines sent verbatim, in insertion order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Replaces the whole header sequence.
    pub fn set_headers(&mut self, headers: Vec<String>) {
        self.headers = headers;
    }

    /// Appends a `Key: Value` header line.
    ///
    /// Repeated keys are not deduplicated; each call adds another line.
    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers.push(format!("{key}: {value}"));
    }

    /// Whether peer certificate and hostname verification are required.
    /// Defaults to true.
    pub fn tls_verify_enabled(&self) -> bool {
        self.tls_verify
    }

    pub fn enable_tls_verify(&mut self) {
        self.tls_verify = true;
    }

    /// Disables both certificate and hostname verification.
    pub fn disable_tls_verify(&mut self) {
        self.tls_verify = false;
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    /// Stores HTTP Basic credentials, overwriting any previous pair.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.basic_auth = Some(BasicAuth::new(username, password));
    }

    /// Number of attempts the retry loop runs. Defaults to 1.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.max_retries = max_retries;
    }
}

#[cfg(test)]
mod tests {
    use super::FetchConfig;

    #[test]
    fn defaults_match_documented_values() {
        let config = FetchConfig::default();

        assert_eq!(config.sleep_min(), 0);
        assert_eq!(config.sleep_max(), 0);
        assert_eq!(config.retry_pause(), 1);
        assert_eq!(config.timeout(), 5);
        assert_eq!(config.max_retries(), 1);
        assert!(config.tls_verify_enabled());
        assert!(config.post_fields().is_empty());
        assert!(config.headers().is_empty());
        assert!(config.basic_auth().is_none());
    }

    #[test]
    fn set_sleep_sets_both_bounds() {
        let mut config = FetchConfig::new();

        config.set_sleep(3, 5);

        assert_eq!(config.sleep_min(), 3);
        assert_eq!(config.sleep_max(), 5);
    }

    #[test]
    fn add_post_field_keeps_the_latest_value_per_key() {
        let mut config = FetchConfig::new();

        config.add_post_field("foo", "baz");
        config.add_post_field("other", "kept");
        config.add_post_field("foo", "qux");

        assert_eq!(
            config.post_fields(),
            [
                ("foo".to_owned(), "qux".to_owned()),
                ("other".to_owned(), "kept".to_owned()),
            ]
        );
    }

    #[test]
    fn set_post_fields_replaces_the_whole_set() {
        let mut config = FetchConfig::new();
        config.add_post_field("stale", "1");

        config.set_post_fields(vec![("fresh".to_owned(), "2".to_owned())]);

        assert_eq!(config.post_fields(), [("fresh".to_owned(), "2".to_owned())]);
    }

    #[test]
    fn add_header_appends_lines_in_order_without_dedup() {
        let mut config = FetchConfig::new();

        config.add_header("headerkey", "headerValue");
        config.add_header("X-Tag", "one");
        config.add_header("X-Tag", "two");

        assert_eq!(
            config.headers(),
            ["headerkey: headerValue", "X-Tag: one", "X-Tag: two"]
        );
    }

    #[test]
    fn tls_verify_toggles_and_stays_idempotent() {
        let mut config = FetchConfig::new();
        assert!(config.tls_verify_enabled());

        config.disable_tls_verify();
        config.disable_tls_verify();
        assert!(!config.tls_verify_enabled());

        config.enable_tls_verify();
        assert!(config.tls_verify_enabled());
    }

    #[test]
    fn basic_auth_stores_the_latest_pair() {
        let mut config = FetchConfig::new();
        assert!(config.basic_auth().is_none());

        config.set_basic_auth("username", "password");
        config.set_basic_auth("u", "p");

        let auth = config.basic_auth().expect("credentials must be set");
        assert_eq!(auth.username(), "u");
        assert_eq!(auth.password(), "p");
    }

    #[test]
    fn debug_redacts_the_password() {
        let mut config = FetchConfig::new();
        config.set_basic_auth("u", "secret-password");

        let debug = format!("{config:?}");

        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-password"));
    }
}
