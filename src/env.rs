//! Environment variable expansion for scalar values.
//!
//! Expansion runs every time a string-backed scalar is read, against whatever
//! [`EnvLookup`] the document was built with. Grammar, scanned left to right:
//!
//! - `${NAME}` is replaced anywhere in the string. Unset variables expand to
//!   an empty string. A substituted value is itself expanded once more.
//! - `$NAME` is only a reference when it is the entire scalar.
//! - `$${...}` and `$$NAME` are escapes: one leading `$` is dropped and the
//!   escaped token is kept literally. References nested further inside an
//!   escaped `$${...}` are still expanded.
//! - Everything else passes through untouched.

use regex_lite::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static BARE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)$").expect("bare reference pattern is valid")
});

/// Source of environment variable values.
pub trait EnvLookup: Send + Sync + fmt::Debug {
    /// Value of `name`, or `None` when unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment on every lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

/// Fixed in-memory environment, mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvLookup for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Expand environment references in `raw`.
pub fn expand(raw: &str, env: &dyn EnvLookup) -> String {
    expand_pass(raw, env, true)
}

fn expand_pass(raw: &str, env: &dyn EnvLookup, expand_values: bool) -> String {
    if !raw.contains('$') {
        return raw.to_string();
    }

    if let Some(caps) = BARE_REFERENCE.captures(raw) {
        return env.var(&caps[1]).unwrap_or_default();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$${") {
            // Escaped braced reference: keep "${" and keep scanning inside it.
            out.push_str("${");
            rest = after;
        } else if let Some(after) = tail.strip_prefix("$$").filter(|s| starts_name(s)) {
            let name_len = after.find(|c| !is_name_char(c)).unwrap_or(after.len());
            out.push('$');
            out.push_str(&after[..name_len]);
            rest = &after[name_len..];
        } else if let Some(body) = tail.strip_prefix("${") {
            let Some(end) = body.find('}') else {
                // Unterminated reference, the remainder is literal.
                out.push_str(tail);
                rest = "";
                break;
            };
            let value = env.var(&body[..end]).unwrap_or_default();
            if expand_values {
                out.push_str(&expand_pass(&value, env, false));
            } else {
                out.push_str(&value);
            }
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

fn starts_name(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> MapEnv {
        MapEnv::new()
            .with("ENV_VAR", "envVarValue")
            .with("ENV_VAR_EMBEDDED", "${ENV_VAR}")
            .with("ENV_VAR_EMPTY", "")
            .with("SELF_REF", "${SELF_REF}")
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(expand("my_string", &env()), "my_string");
        assert_eq!(expand("", &env()), "");
        assert_eq!(expand("cost: 5$", &env()), "cost: 5$");
    }

    #[test]
    fn test_braced_reference_anywhere() {
        let env = env();
        assert_eq!(expand("${ENV_VAR}", &env), "envVarValue");
        assert_eq!(expand(" ${ENV_VAR}", &env), " envVarValue");
        assert_eq!(expand("${ENV_VAR} ", &env), "envVarValue ");
        assert_eq!(expand("${ENV_VAR}/foo", &env), "envVarValue/foo");
        assert_eq!(expand("/foo/${ENV_VAR}/", &env), "/foo/envVarValue/");
        assert_eq!(
            expand("/${ENV_VAR}/${ENV_VAR}${ENV_VAR}/foo", &env),
            "/envVarValue/envVarValueenvVarValue/foo"
        );
        assert_eq!(
            expand("/foo/${ENV_VAR}/libx.so", &env),
            "/foo/envVarValue/libx.so"
        );
    }

    #[test]
    fn test_bare_reference_only_as_whole_value() {
        let env = env();
        assert_eq!(expand("$ENV_VAR", &env), "envVarValue");
        assert_eq!(expand("$ENV_VAR/foo", &env), "$ENV_VAR/foo");
        assert_eq!(expand("a $ENV_VAR", &env), "a $ENV_VAR");
        assert_eq!(expand("$UNSET_XX_VAR", &env), "");
    }

    #[test]
    fn test_unset_variable_expands_to_empty() {
        let env = env();
        assert_eq!(expand("${UNSET_XX_VAR}", &env), "");
        assert_eq!(expand("a${UNSET_XX_VAR}b", &env), "ab");
        assert_eq!(expand("${ENV_VAR_EMPTY}", &env), "");
    }

    #[test]
    fn test_escapes_strip_one_dollar() {
        let env = env();
        assert_eq!(expand("$${ENV_VAR}", &env), "${ENV_VAR}");
        assert_eq!(expand("$$ENV_VAR", &env), "$ENV_VAR");
        assert_eq!(
            expand("$${ENV_VAR}$${ENV_VAR}", &env),
            "${ENV_VAR}${ENV_VAR}"
        );
        assert_eq!(
            expand("$${ENV_VAR}${ENV_VAR}", &env),
            "${ENV_VAR}envVarValue"
        );
    }

    #[test]
    fn test_reference_nested_in_escape_is_expanded() {
        assert_eq!(expand("$${${ENV_VAR}}", &env()), "${envVarValue}");
    }

    #[test]
    fn test_substituted_value_expanded_once_more() {
        let env = env();
        assert_eq!(expand("${ENV_VAR_EMBEDDED}/foo", &env), "envVarValue/foo");
        // A self-referencing value stops after the second pass.
        assert_eq!(expand("${SELF_REF}", &env), "${SELF_REF}");
    }

    #[test]
    fn test_unterminated_reference_is_literal() {
        assert_eq!(expand("pre ${ENV_VAR", &env()), "pre ${ENV_VAR");
    }

    #[test]
    fn test_lonely_dollars_pass_through() {
        let env = env();
        assert_eq!(expand("$", &env), "$");
        assert_eq!(expand("$$", &env), "$$");
        assert_eq!(expand("$1.00", &env), "$1.00");
    }

    #[test]
    fn test_process_env_rejects_invalid_names() {
        assert_eq!(ProcessEnv.var(""), None);
        assert_eq!(ProcessEnv.var("A=B"), None);
    }
}
