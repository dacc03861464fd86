//! Configuration loading and management
//!
//! The service is described by one YAML document:
//!
//! ```yaml
//! project_name: readinglist
//! documentation: https://readinglist.rtfd.org/
//! eos: "2026-12-31"
//! http: { host: 127.0.0.1, port: 8000 }
//! permission_policy: authenticated_writes
//! auth_header: x-user-id
//! resources:
//!   - name: articles
//!     fields:
//!       - { name: title, type: string, max_length: 1024 }
//!       - { name: url, type: string, format: url }
//!       - { name: unread, type: boolean, missing: true }
//! ```
//!
//! `READINGLIST_HOST`, `READINGLIST_PORT` and `READINGLIST_EOS` override the
//! matching settings, see [`AppConfig::with_env_overrides`].

use crate::core::auth::{AuthProvider, HeaderAuthProvider, NoAuthProvider, PermissionPolicy};
use crate::core::error::ConfigError;
use crate::core::schema::{FieldDef, FieldKind, ResourceSchema, validators};
use crate::resource::Resource;
use crate::server::hello::ServiceInfo;
use axum::http::HeaderName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Listening address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl HttpConfig {
    /// `host:port` string to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One field of a resource, see [`FieldDef`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,

    #[serde(rename = "type", default = "default_kind")]
    pub kind: FieldKind,

    /// Whether validation fails when the field is missing; ignored when
    /// `missing` provides a default
    #[serde(default = "default_required")]
    pub required: bool,

    /// Value used when the field is missing
    #[serde(default)]
    pub missing: Option<Value>,

    #[serde(default)]
    pub min_length: Option<usize>,

    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub min: Option<f64>,

    #[serde(default)]
    pub max: Option<f64>,

    #[serde(default)]
    pub one_of: Option<Vec<String>>,

    #[serde(default)]
    pub pattern: Option<String>,

    /// Named format: `url`, or `date` (YYYY-MM-DD)
    #[serde(default)]
    pub format: Option<String>,
}

fn default_kind() -> FieldKind {
    FieldKind::String
}

fn default_required() -> bool {
    true
}

impl FieldConfig {
    /// Build the field definition this entry describes
    pub fn to_field(&self) -> Result<FieldDef, ConfigError> {
        let mut field = FieldDef::new(&self.name, self.kind);

        field = match (&self.missing, self.required) {
            (Some(default), _) => field.with_default(default.clone()),
            (None, true) => field,
            (None, false) => field.optional(),
        };

        if self.min_length.is_some() || self.max_length.is_some() {
            field = field.rule(validators::string_length(
                self.min_length.unwrap_or(0),
                self.max_length.unwrap_or(usize::MAX),
            ));
        }

        if self.min.is_some() || self.max.is_some() {
            field = field.rule(validators::value_range(self.min, self.max));
        }

        if let Some(allowed) = &self.one_of {
            field = field.rule(validators::one_of(allowed.clone()));
        }

        if let Some(pattern) = &self.pattern {
            let regex = Regex::new(pattern).map_err(|e| self.invalid("pattern", pattern, e))?;
            field = field.rule(validators::pattern(regex));
        }

        match self.format.as_deref() {
            None => {}
            Some("url") => field = field.rule(validators::url()),
            Some("date") => field = field.rule(validators::date_format("%Y-%m-%d")),
            Some(other) => return Err(self.invalid("format", other, "expected 'url' or 'date'")),
        }

        Ok(field)
    }

    fn invalid(&self, setting: &str, value: &str, message: impl ToString) -> ConfigError {
        ConfigError::InvalidValue {
            field: format!("{}.{}", self.name, setting),
            value: value.to_string(),
            message: message.to_string(),
        }
    }
}

/// One resource exposed by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Collection path segment, e.g. "articles"
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl ResourceConfig {
    /// Base schema extended with the configured fields
    pub fn to_schema(&self) -> Result<ResourceSchema, ConfigError> {
        Resource::check_name(&self.name)?;
        let fields = self
            .fields
            .iter()
            .map(FieldConfig::to_field)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResourceSchema::base().extend(fields))
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_documentation")]
    pub documentation: String,

    /// End-of-service date announced by the hello endpoint
    #[serde(default)]
    pub eos: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,

    /// One of `allow_all`, `authenticated_writes`, `authenticated`
    #[serde(default = "default_policy")]
    pub permission_policy: String,

    /// Header carrying the user id set by an authenticating proxy;
    /// every caller is anonymous when unset
    #[serde(default)]
    pub auth_header: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

fn default_project_name() -> String {
    "readinglist".to_string()
}

fn default_documentation() -> String {
    "https://readinglist.rtfd.org/".to_string()
}

fn default_policy() -> String {
    "allow_all".to_string()
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `READINGLIST_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("READINGLIST_HOST") {
            self.http.host = host;
        }

        if let Some(port) = lookup("READINGLIST_PORT") {
            self.http.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    field: "READINGLIST_PORT".to_string(),
                    value: port.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(eos) = lookup("READINGLIST_EOS") {
            self.eos = Some(eos);
        }

        Ok(self)
    }

    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            project_name: self.project_name.clone(),
            documentation: self.documentation.clone(),
            eos: self.eos.clone(),
            ..Default::default()
        }
    }

    pub fn policy(&self) -> Result<PermissionPolicy, ConfigError> {
        PermissionPolicy::parse_policy(&self.permission_policy).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "permission_policy".to_string(),
                value: self.permission_policy.clone(),
                message: "expected allow_all, authenticated_writes or authenticated".to_string(),
            }
        })
    }

    pub fn auth_provider(&self) -> Result<Arc<dyn AuthProvider>, ConfigError> {
        let Some(header) = &self.auth_header else {
            return Ok(Arc::new(NoAuthProvider));
        };

        let name = HeaderName::from_bytes(header.to_lowercase().as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "auth_header".to_string(),
                value: header.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(Arc::new(HeaderAuthProvider::new(name)))
    }

    /// Configuration serving the reading list articles
    pub fn default_config() -> Self {
        let field = |name: &str, kind: FieldKind| FieldConfig {
            name: name.to_string(),
            kind,
            required: true,
            missing: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            one_of: None,
            pattern: None,
            format: None,
        };

        Self {
            project_name: default_project_name(),
            documentation: default_documentation(),
            eos: None,
            http: HttpConfig::default(),
            permission_policy: default_policy(),
            auth_header: None,
            resources: vec![ResourceConfig {
                name: "articles".to_string(),
                fields: vec![
                    FieldConfig {
                        min_length: Some(1),
                        max_length: Some(1024),
                        ..field("title", FieldKind::String)
                    },
                    FieldConfig {
                        format: Some("url".to_string()),
                        ..field("url", FieldKind::String)
                    },
                    FieldConfig {
                        missing: Some(Value::Bool(true)),
                        ..field("unread", FieldKind::Boolean)
                    },
                    FieldConfig {
                        missing: Some(Value::from(0)),
                        min: Some(0.0),
                        ..field("read_position", FieldKind::Integer)
                    },
                    FieldConfig {
                        required: false,
                        ..field("added_by", FieldKind::String)
                    },
                ],
            }],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default_config();
        assert_eq!(config.project_name, "readinglist");
        assert_eq!(config.http.address(), "127.0.0.1:8000");
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.resources[0].name, "articles");
    }

    #[test]
    fn test_yaml_serialization() {
        let config = AppConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_yaml_with_defaults() {
        let yaml = r#"
resources:
  - name: devices
    fields:
      - { name: label, max_length: 32 }
      - { name: battery, type: integer, min: 0, max: 100, required: false }
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.project_name, "readinglist");
        assert_eq!(config.http.port, 8000);
        assert!(config.eos.is_none());

        let schema = config.resources[0].to_schema().unwrap();
        assert_eq!(
            schema.known_fields(),
            vec!["id", "last_modified", "label", "battery"]
        );

        let record = schema.validate(&json!({"label": "phone"})).unwrap();
        assert!(!record.contains_key("battery"));

        let invalid = schema
            .validate(&json!({"label": "phone", "battery": 120}))
            .unwrap_err();
        assert!(invalid.message_for("battery").is_some());
    }

    #[test]
    fn test_invalid_resource_name_is_rejected() {
        for name in ["", "a/b", "{id}"] {
            let resource = ResourceConfig {
                name: name.to_string(),
                fields: Vec::new(),
            };
            assert!(matches!(
                resource.to_schema(),
                Err(ConfigError::InvalidValue { ref value, .. }) if value == name
            ));
        }
    }

    #[test]
    fn test_missing_supplies_default() {
        let config = AppConfig::default_config();
        let schema = config.resources[0].to_schema().unwrap();
        let record = schema
            .validate(&json!({"title": "Rust", "url": "https://rust-lang.org"}))
            .unwrap();
        assert_eq!(record["unread"], json!(true));
        assert_eq!(record["read_position"], json!(0));
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let yaml = r#"
resources:
  - name: devices
    fields:
      - { name: label, type: blob }
"#;
        assert!(matches!(
            AppConfig::from_yaml_str(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let mut field: FieldConfig =
            serde_yaml::from_str("{ name: code, pattern: '([a-z' }").unwrap();
        assert!(matches!(
            field.to_field(),
            Err(ConfigError::InvalidValue { .. })
        ));

        field.pattern = None;
        field.format = Some("email".to_string());
        let err = field.to_field().unwrap_err();
        assert!(err.to_string().contains("code.format"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("READINGLIST_HOST", "0.0.0.0"),
            ("READINGLIST_PORT", "9000"),
            ("READINGLIST_EOS", "2027-01-01"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::default_config()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.http.address(), "0.0.0.0:9000");
        assert_eq!(config.service_info().eos.as_deref(), Some("2027-01-01"));
    }

    #[test]
    fn test_invalid_port_override() {
        let result = AppConfig::default_config().with_overrides(|key| {
            (key == "READINGLIST_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_policy_and_auth_provider() {
        let mut config = AppConfig::default_config();
        assert!(matches!(config.policy().unwrap(), PermissionPolicy::AllowAll));

        config.permission_policy = "authenticated_writes".to_string();
        assert!(matches!(
            config.policy().unwrap(),
            PermissionPolicy::AuthenticatedWrites
        ));

        config.permission_policy = "nobody".to_string();
        assert!(config.policy().is_err());

        config.auth_header = Some("X-Remote-User".to_string());
        assert!(config.auth_provider().is_ok());

        config.auth_header = Some("bad header".to_string());
        assert!(config.auth_provider().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_yaml_file("/nonexistent/readinglist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
