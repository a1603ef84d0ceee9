use connect_core::password_and_salt_hash;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::PolicyError;

/// Authority configuration: where to listen and who may log in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Address the authority listens on
    pub bind: String,
    /// Login rules, evaluated in order
    pub logins: Vec<LoginRule>,
}

/// A credential matched by exact username or by a pattern over usernames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRule {
    /// Exact username; empty when the rule is pattern based
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Regular expression searched for in the username
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regexp: String,
    /// Plaintext password shared with the peer
    pub password: String,
    #[serde(skip)]
    compiled: OnceCell<Regex>,
}

impl PartialEq for LoginRule {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.regexp == other.regexp
            && self.password == other.password
    }
}

impl LoginRule {
    /// Rule for one exact username
    pub fn username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Rule for every username the pattern matches
    pub fn pattern(regexp: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            regexp: regexp.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Whether this rule applies to `username`
    ///
    /// The pattern is compiled on first use and cached; a pattern that fails
    /// to compile fails every evaluation that reaches it.
    pub fn matches(&self, username: &str) -> Result<bool, PolicyError> {
        if !self.username.is_empty() && self.username == username {
            return Ok(true);
        }
        if self.regexp.is_empty() {
            return Ok(false);
        }

        let regex = self
            .compiled
            .get_or_try_init(|| Regex::new(&self.regexp))
            .map_err(|source| PolicyError::InvalidPattern {
                pattern: self.regexp.clone(),
                source,
            })?;
        Ok(regex.is_match(username))
    }
}

impl AuthorityConfig {
    /// Check a salted password hash sent by a peer
    ///
    /// Every rule that applies to `username` is tried in order; the first
    /// whose stored password, salted the same way, equals `password` grants
    /// access.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        salt: &str,
    ) -> Result<bool, PolicyError> {
        for login in &self.logins {
            if !login.matches(username)? {
                continue;
            }
            if password_and_salt_hash(&login.password, salt) == password {
                return Ok(true);
            }
        }
        tracing::debug!(username, "no login rule accepted the credentials");
        Ok(false)
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            bind: ":5091".to_string(),
            logins: vec![
                LoginRule::username("example", "example"),
                LoginRule::pattern("^example-.*$", "example"),
            ],
        }
    }
}

impl Document for AuthorityConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(password: &str, salt: &str) -> String {
        password_and_salt_hash(password, salt)
    }

    #[test]
    fn default_accepts_exact_username() {
        let config = AuthorityConfig::default();
        assert!(config
            .authenticate("example", &hashed("example", "salt"), "salt")
            .unwrap());
    }

    #[test]
    fn default_accepts_pattern_usernames() {
        let config = AuthorityConfig::default();
        assert!(config
            .authenticate("example-lobby", &hashed("example", "s"), "s")
            .unwrap());
        assert!(!config
            .authenticate("lobby", &hashed("example", "s"), "s")
            .unwrap());
    }

    #[test]
    fn wrong_password_or_salt_is_refused() {
        let config = AuthorityConfig::default();
        assert!(!config
            .authenticate("example", &hashed("nope", "salt"), "salt")
            .unwrap());
        assert!(!config
            .authenticate("example", &hashed("example", "other"), "salt")
            .unwrap());
        // The plaintext itself is never accepted.
        assert!(!config.authenticate("example", "example", "salt").unwrap());
    }

    #[test]
    fn later_rule_can_grant_after_earlier_mismatch() {
        let config = AuthorityConfig {
            bind: ":5091".into(),
            logins: vec![
                LoginRule::username("hub", "first"),
                LoginRule::pattern("^hub$", "second"),
            ],
        };
        assert!(config
            .authenticate("hub", &hashed("second", "x"), "x")
            .unwrap());
    }

    #[test]
    fn bad_pattern_surfaces_only_when_evaluated() {
        let config: AuthorityConfig = toml::from_str(
            r#"
            bind = ":5091"

            [[logins]]
            username = "admin"
            password = "root"

            [[logins]]
            regexp = "(unclosed"
            password = "x"
            "#,
        )
        .unwrap();

        assert!(config
            .authenticate("admin", &hashed("root", "s"), "s")
            .unwrap());

        match config.authenticate("guest", &hashed("x", "s"), "s") {
            Err(PolicyError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn compiled_pattern_is_cached() {
        let rule = LoginRule::pattern("^srv-[0-9]+$", "pw");
        assert!(rule.matches("srv-12").unwrap());
        assert!(rule.compiled.get().is_some());
        assert!(!rule.matches("srv-x").unwrap());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authority.toml");

        let mut config = AuthorityConfig::default();
        config.logins.push(LoginRule::username("lobby", "secret"));
        config.save(&path).unwrap();

        let loaded = AuthorityConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("authority.toml");

        let created = AuthorityConfig::load_or_create(&path).unwrap();
        assert_eq!(created, AuthorityConfig::default());
        assert!(path.exists());

        let reloaded = AuthorityConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded, created);
    }

    #[test]
    fn invalid_toml_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authority.toml");
        std::fs::write(&path, "logins = {{not valid").unwrap();

        assert!(matches!(
            AuthorityConfig::load(&path),
            Err(PolicyError::Parse(_))
        ));
    }
}
