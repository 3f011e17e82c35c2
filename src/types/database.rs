use crate::error::VaultPgError;
use crate::types::vault::DatabaseCredentials;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::{fs, path::Path};

const DATABASE_KEY: &str = "database";

/// Connection parameters for the target database.
///
/// `host`, `port`, `database` and `secret_role` come from the configuration
/// file. `username` and `password` stay `None` until credentials are merged.
pub struct DatabaseConfig {
    port: u16,
    host: String,
    database: String,
    secret_role: String,
    username: Option<String>,
    password: Option<SecretString>,
}

#[derive(Deserialize)]
struct DatabaseSection {
    port: u16,
    host: String,
    database: String,
    secret_role: String,
}

impl From<DatabaseSection> for DatabaseConfig {
    fn from(s: DatabaseSection) -> Self {
        Self {
            port: s.port,
            host: s.host,
            database: s.database,
            secret_role: s.secret_role,
            username: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Read `path` and extract the `database` object.
    pub fn load(path: &Path) -> Result<Self, VaultPgError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, VaultPgError> {
        let mut root: Value = serde_json::from_str(contents)?;
        let section = root
            .get_mut(DATABASE_KEY)
            .map(Value::take)
            .ok_or(VaultPgError::MissingSection(DATABASE_KEY))?;
        let section: DatabaseSection = serde_json::from_value(section)?;
        Ok(section.into())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn secret_role(&self) -> &str {
        &self.secret_role
    }

    /// Adopt a generated credential pair. `None` leaves the current
    /// username and password untouched. Credentials can only be set once.
    pub fn merge_credentials(
        mut self,
        credentials: Option<DatabaseCredentials>,
    ) -> Result<Self, VaultPgError> {
        if let Some(creds) = credentials {
            if self.has_credentials() {
                return Err(VaultPgError::CredentialsAlreadyMerged);
            }
            self.username = Some(creds.username);
            self.password = Some(creds.password);
        }
        Ok(self)
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password
            .as_ref()
            .map(|p| p.expose_secret())
            .unwrap_or_default()
    }

    /// libpq key/value connection descriptor.
    pub fn connection_string(&self) -> String {
        self.render_descriptor(self.password())
    }

    /// Descriptor safe for logs: the password is masked.
    pub fn redacted_connection_string(&self) -> String {
        self.render_descriptor("********")
    }

    fn render_descriptor(&self, password: &str) -> String {
        let port = self.port.to_string();
        [
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("user", self.username()),
            ("password", password),
            ("dbname", self.database.as_str()),
        ]
        .iter()
        .map(|(key, value)| format!("{key}={}", quote_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("secret_role", &self.secret_role)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Quote per libpq rules: empty values and values with whitespace, quotes or
/// backslashes are wrapped in single quotes with `'` and `\` escaped.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE: &str = r#"{
        "database": {
            "host": "postgres",
            "port": 5432,
            "database": "inventory",
            "secret_role": "readonly"
        }
    }"#;

    fn creds(username: &str, password: &str) -> DatabaseCredentials {
        DatabaseCredentials {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            lease_id: "database/creds/readonly/1".to_string(),
            lease_duration: Duration::from_secs(3600),
            renewable: true,
        }
    }

    #[test]
    fn load_populates_fields_and_leaves_credentials_empty() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(cfg.host, "postgres");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.database, "inventory");
        assert_eq!(cfg.secret_role, "readonly");
        assert!(!cfg.has_credentials());
        assert_eq!(cfg.username(), "");
        assert_eq!(cfg.password(), "");
    }

    #[test]
    fn load_rejects_missing_or_mistyped_fields() {
        let missing_role = r#"{"database": {"host": "h", "port": 1, "database": "d"}}"#;
        assert!(matches!(
            DatabaseConfig::from_json_str(missing_role),
            Err(VaultPgError::Json(_))
        ));

        let string_port =
            r#"{"database": {"host": "h", "port": "5432", "database": "d", "secret_role": "r"}}"#;
        assert!(matches!(
            DatabaseConfig::from_json_str(string_port),
            Err(VaultPgError::Json(_))
        ));

        assert!(matches!(
            DatabaseConfig::from_json_str(r#"{"db": {}}"#),
            Err(VaultPgError::MissingSection("database"))
        ));
    }

    #[test]
    fn merge_sets_credentials_and_keeps_other_fields() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE)
            .unwrap()
            .merge_credentials(Some(creds("u1", "p1")))
            .unwrap();
        assert_eq!(cfg.username(), "u1");
        assert_eq!(cfg.password(), "p1");
        assert_eq!(cfg.host, "postgres");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.database, "inventory");
        assert_eq!(cfg.secret_role, "readonly");
    }

    #[test]
    fn merge_without_credentials_keeps_them_empty() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE)
            .unwrap()
            .merge_credentials(None)
            .unwrap();
        assert!(!cfg.has_credentials());
        assert_eq!(cfg.username(), "");
    }

    #[test]
    fn connection_string_orders_keys_like_libpq_descriptor() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE)
            .unwrap()
            .merge_credentials(Some(creds("v-approle-readonly", "A1a-xyz")))
            .unwrap();
        assert_eq!(
            cfg.connection_string(),
            "host=postgres port=5432 user=v-approle-readonly password=A1a-xyz dbname=inventory"
        );
        assert_eq!(
            cfg.redacted_connection_string(),
            "host=postgres port=5432 user=v-approle-readonly password=******** dbname=inventory"
        );
    }

    #[test]
    fn connection_string_quotes_special_values() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            cfg.connection_string(),
            "host=postgres port=5432 user='' password='' dbname=inventory"
        );

        let cfg = cfg.merge_credentials(Some(creds("u", r"it's a\pw"))).unwrap();
        assert!(cfg.connection_string().contains(r"password='it\'s a\\pw'"));
    }

    #[test]
    fn credentials_are_merged_only_once() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE)
            .unwrap()
            .merge_credentials(Some(creds("u1", "p1")))
            .unwrap();
        let cfg = cfg.merge_credentials(None).unwrap();
        assert_eq!(cfg.username(), "u1");
        assert!(matches!(
            cfg.merge_credentials(Some(creds("u2", "p2"))),
            Err(VaultPgError::CredentialsAlreadyMerged)
        ));
    }

    #[test]
    fn debug_hides_password() {
        let cfg = DatabaseConfig::from_json_str(SAMPLE)
            .unwrap()
            .merge_credentials(Some(creds("u1", "hunter2")))
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
