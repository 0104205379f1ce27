pub mod toml_config;

use crate::adapters::http::{ApiCredentials, DEFAULT_TIMEOUT_SECONDS};
use crate::core::pipeline::PipelineSettings;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};

#[cfg(feature = "cli")]
use crate::domain::model::Operation;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "contact-etl")]
#[command(about = "Fetch, transform and save contacts through the contacts API")]
pub struct CliConfig {
    /// connect, heist, powers, birthdays or sorting
    #[arg(long, env = "CONTACTS_OPERATION", default_value = "connect")]
    pub operation: Operation,

    #[arg(short, long, help = "TOML config file; flags override its values")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CONTACTS_API_BASE_URL")]
    pub api_base_url: Option<String>,

    #[arg(long, env = "CONTACTS_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "CONTACTS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long, env = "CONTACTS_SUBSCRIPTION", hide_env_values = true)]
    pub subscription: Option<String>,

    #[arg(long, env = "CONTACTS_REQUESTOR")]
    pub requestor: Option<String>,

    #[arg(long, help = "Location assigned by the heist operation")]
    pub heist_location: Option<String>,

    #[arg(long, help = "Year birth years are computed from (defaults to the current year)")]
    pub reference_year: Option<i32>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl From<&CliConfig> for PartialConfig {
    fn from(cli: &CliConfig) -> Self {
        PartialConfig {
            base_url: cli.api_base_url.clone(),
            timeout_seconds: cli.timeout_seconds,
            client_id: cli.client_id.clone(),
            client_secret: cli.client_secret.clone(),
            subscription: cli.subscription.clone(),
            requestor: cli.requestor.clone(),
            heist_location: cli.heist_location.clone(),
            reference_year: cli.reference_year,
        }
    }
}

/// One configuration layer. Later layers win field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription: Option<String>,
    pub requestor: Option<String>,
    pub heist_location: Option<String>,
    pub reference_year: Option<i32>,
}

impl PartialConfig {
    pub fn merge(self, higher: PartialConfig) -> PartialConfig {
        PartialConfig {
            base_url: higher.base_url.or(self.base_url),
            timeout_seconds: higher.timeout_seconds.or(self.timeout_seconds),
            client_id: higher.client_id.or(self.client_id),
            client_secret: higher.client_secret.or(self.client_secret),
            subscription: higher.subscription.or(self.subscription),
            requestor: higher.requestor.or(self.requestor),
            heist_location: higher.heist_location.or(self.heist_location),
            reference_year: higher.reference_year.or(self.reference_year),
        }
    }

    pub fn resolve(self) -> Result<AppConfig> {
        let config = AppConfig {
            base_url: validate_required_field("api.base_url", &self.base_url)?.clone(),
            timeout_seconds: self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            credentials: ApiCredentials {
                client_id: validate_required_field("credentials.client_id", &self.client_id)?
                    .clone(),
                client_secret: validate_required_field(
                    "credentials.client_secret",
                    &self.client_secret,
                )?
                .clone(),
                subscription: validate_required_field(
                    "credentials.subscription",
                    &self.subscription,
                )?
                .clone(),
                requestor: validate_required_field("credentials.requestor", &self.requestor)?
                    .clone(),
            },
            heist_location: self.heist_location,
            reference_year: self.reference_year,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Fully resolved settings for one CLI run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub credentials: ApiCredentials,
    pub heist_location: Option<String>,
    pub reference_year: Option<i32>,
}

impl AppConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        if let Some(location) = &self.heist_location {
            settings.heist_location = location.clone();
        }
        if let Some(year) = self.reference_year {
            settings.reference_year = year;
        }
        settings
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.base_url)?;
        validate_range("api.timeout_seconds", self.timeout_seconds, 1, 600)?;
        validate_non_empty_string("credentials.client_id", &self.credentials.client_id)?;
        validate_non_empty_string("credentials.client_secret", &self.credentials.client_secret)?;
        validate_non_empty_string("credentials.subscription", &self.credentials.subscription)?;
        validate_non_empty_string("credentials.requestor", &self.credentials.requestor)?;
        if let Some(location) = &self.heist_location {
            validate_non_empty_string("pipeline.heist_location", location)?;
        }
        if let Some(year) = self.reference_year {
            validate_range("pipeline.reference_year", year, 1, 9999)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ContactError;

    fn complete() -> PartialConfig {
        PartialConfig {
            base_url: Some("https://contacts.example.com".to_string()),
            timeout_seconds: None,
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            subscription: Some("sub".to_string()),
            requestor: Some("alfred".to_string()),
            heist_location: None,
            reference_year: None,
        }
    }

    #[test]
    fn test_higher_layer_wins() {
        let file = PartialConfig {
            heist_location: Some("Vault".to_string()),
            ..complete()
        };
        let flags = PartialConfig {
            requestor: Some("robin".to_string()),
            ..PartialConfig::default()
        };

        let merged = file.merge(flags);

        assert_eq!(merged.requestor.as_deref(), Some("robin"));
        assert_eq!(merged.heist_location.as_deref(), Some("Vault"));
        assert_eq!(merged.client_id.as_deref(), Some("id"));
    }

    #[test]
    fn test_resolve_requires_credentials() {
        let missing = PartialConfig {
            client_secret: None,
            ..complete()
        };
        assert!(matches!(
            missing.resolve(),
            Err(ContactError::MissingConfig { field }) if field == "credentials.client_secret"
        ));
    }

    #[test]
    fn test_resolve_rejects_bad_url() {
        let bad = PartialConfig {
            base_url: Some("contacts.example.com".to_string()),
            ..complete()
        };
        assert!(matches!(
            bad.resolve(),
            Err(ContactError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_pipeline_settings_overrides() {
        let config = PartialConfig {
            heist_location: Some("Vault".to_string()),
            reference_year: Some(2000),
            ..complete()
        }
        .resolve()
        .unwrap();

        let settings = config.pipeline_settings();
        assert_eq!(settings.heist_location, "Vault");
        assert_eq!(settings.reference_year, 2000);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }
}
