//! Store key layout and identifier composition

use crate::utils::error::{LimiterError, Result};

/// Builds every store key from the configured prefix
#[derive(Debug, Clone)]
pub(crate) struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub(crate) fn sliding(&self, identifier: &str) -> String {
        format!("{}sliding:{}", self.prefix, identifier)
    }

    pub(crate) fn bucket(&self, identifier: &str) -> String {
        format!("{}bucket:{}", self.prefix, identifier)
    }

    pub(crate) fn fixed(&self, identifier: &str, window_start: i64) -> String {
        format!("{}fixed:{}:{}", self.prefix, identifier, window_start)
    }

    /// Pattern matching every fixed-window shard of `identifier`
    pub(crate) fn fixed_pattern(&self, identifier: &str) -> String {
        format!(
            "{}fixed:{}:*",
            escape_glob(&self.prefix),
            escape_glob(identifier)
        )
    }

    /// Whether `key` is a fixed-window shard of exactly `identifier`.
    /// The pattern above also matches identifiers extending `identifier:`.
    pub(crate) fn is_fixed_shard(&self, identifier: &str, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix("fixed:"))
            .and_then(|rest| rest.strip_prefix(identifier))
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|window_start| window_start.parse::<i64>().is_ok())
    }

    pub(crate) fn violations(&self, identifier: &str) -> String {
        format!("{}violations:{}", self.prefix, identifier)
    }

    pub(crate) fn ban(&self, identifier: &str) -> String {
        format!("{}ban:{}", self.prefix, identifier)
    }
}

/// Backslash-escape glob metacharacters so the text matches literally
pub(crate) fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Composes identifiers from request attributes
///
/// Parts always appear in the same order:
/// `user:<id>:key:<id>:ip:<addr>:endpoint:<path>`.
///
/// ```
/// use redlimit::IdentifierBuilder;
///
/// let id = IdentifierBuilder::new()
///     .with_ip("203.0.113.7")
///     .with_endpoint("/login")
///     .build()
///     .unwrap();
/// assert_eq!(id, "ip:203.0.113.7:endpoint:/login");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierBuilder {
    user_id: Option<String>,
    api_key_id: Option<String>,
    ip_address: Option<String>,
    endpoint: Option<String>,
}

impl IdentifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_api_key(mut self, api_key_id: impl Into<String>) -> Self {
        self.api_key_id = Some(api_key_id.into());
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Join the parts that were set; at least one is required
    pub fn build(&self) -> Result<String> {
        let parts = [
            ("user", &self.user_id),
            ("key", &self.api_key_id),
            ("ip", &self.ip_address),
            ("endpoint", &self.endpoint),
        ];

        let segments: Vec<String> = parts
            .iter()
            .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}:{}", label, v)))
            .collect();

        if segments.is_empty() {
            return Err(LimiterError::invalid_input(
                "identifier needs at least one of user, api key, ip or endpoint",
            ));
        }

        Ok(segments.join(":"))
    }
}
