use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::ConfigError;

/// One watchlist entry. `match_keywords` drive the substring matching; the
/// item name stands in when the list is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchItem {
    pub name: String,
    #[serde(default)]
    pub match_keywords: Vec<String>,
    #[serde(default)]
    pub only_half_price: bool,
}

impl WatchItem {
    pub fn keywords(&self) -> Vec<&str> {
        if self.match_keywords.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.match_keywords.iter().map(String::as_str).collect()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub key_env: String,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            key_env: "RAPIDAPI_KEY".to_string(),
            page_size: 10,
        }
    }
}

impl ApiConfig {
    /// Inline key first, then the configured environment variable.
    pub fn resolve_key(&self) -> Result<String, ConfigError> {
        self.key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env_var(&self.key_env))
            .ok_or_else(|| ConfigError::MissingApiKey(self.key_env.clone()))
    }
}

// Selectors may need updating if the store sites change their markup.
const DEFAULT_PRODUCT_SELECTOR: &str = "div.product-tile, article[class*=product]";

/// A specials page to scrape.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub url: String,
    pub product_selector: String,
}

fn default_stores() -> Vec<StoreConfig> {
    vec![
        StoreConfig {
            name: "Coles".to_string(),
            url: "https://www.coles.com.au/catalogues-and-specials".to_string(),
            product_selector: DEFAULT_PRODUCT_SELECTOR.to_string(),
        },
        StoreConfig {
            name: "Woolworths".to_string(),
            url: "https://www.woolworths.com.au/shop/catalogue".to_string(),
            product_selector: DEFAULT_PRODUCT_SELECTOR.to_string(),
        },
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSenders {
    pub store: String,
    pub addresses: Vec<String>,
}

fn default_senders() -> Vec<StoreSenders> {
    vec![
        StoreSenders {
            store: "Coles".to_string(),
            addresses: vec![
                "coles@coles.com.au".to_string(),
                "noreply@coles.com.au".to_string(),
                "catalogue@coles.com.au".to_string(),
            ],
        },
        StoreSenders {
            store: "Woolworths".to_string(),
            addresses: vec![
                "woolworths@woolworths.com.au".to_string(),
                "noreply@woolworths.com.au".to_string(),
            ],
        },
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub imap_server: String,
    pub imap_port: u16,
    pub user: String,
    pub app_password: String,
    pub senders: Vec<StoreSenders>,
    pub days: u32,
    pub max_messages: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            imap_server: "imap.gmail.com".to_string(),
            imap_port: 993,
            user: String::new(),
            app_password: String::new(),
            senders: default_senders(),
            days: 7,
            max_messages: 20,
        }
    }
}

impl MailConfig {
    /// Credentials from the config file, falling back to the EMAIL_USER /
    /// EMAIL_PASS environment variables.
    pub fn credentials(&self) -> Option<(String, String)> {
        let user = non_empty(self.user.clone()).or_else(|| env_var("EMAIL_USER"))?;
        let password = non_empty(self.app_password.clone()).or_else(|| env_var("EMAIL_PASS"))?;
        Some((user, password))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailReportConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub user: String,
    pub app_password: String,
    /// Defaults to the sending address when absent.
    #[serde(default)]
    pub to: Option<String>,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub watchlist: Vec<WatchItem>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_stores")]
    pub stores: Vec<StoreConfig>,
    #[serde(default)]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub email_report: Option<EmailReportConfig>,
    #[serde(default)]
    pub report_log: Option<PathBuf>,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_check_interval() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    15
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(non_empty)
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "watchlist": [{ "name": "Tim Tams", "match_keywords": ["tim tam"] }] }"#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.watchlist.len(), 1);
        assert!(!config.watchlist[0].only_half_price);
        assert_eq!(config.api.page_size, 10);
        assert_eq!(config.api.key_env, "RAPIDAPI_KEY");
        assert_eq!(config.stores.len(), 2);
        assert_eq!(config.stores[0].name, "Coles");
        assert!(config.mail.is_none());
        assert!(config.email_report.is_none());
        assert_eq!(config.check_interval_seconds, 3600);
        assert_eq!(config.request_timeout_seconds, 15);
    }

    #[test]
    fn keywords_fall_back_to_name() {
        let item = WatchItem {
            name: "Nescafe".to_string(),
            match_keywords: Vec::new(),
            only_half_price: false,
        };
        assert_eq!(item.keywords(), vec!["Nescafe"]);

        let item = WatchItem {
            name: "Coke".to_string(),
            match_keywords: vec!["coca-cola".to_string(), "coca cola".to_string()],
            only_half_price: true,
        };
        assert_eq!(item.keywords(), vec!["coca-cola", "coca cola"]);
    }

    #[test]
    fn inline_api_key_wins() {
        let api = ApiConfig {
            key: Some("abc123".to_string()),
            key_env: "SPECIALS_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            page_size: 10,
        };
        assert_eq!(api.resolve_key().expect("inline key"), "abc123");
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let api = ApiConfig {
            key: None,
            key_env: "SPECIALS_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            page_size: 10,
        };
        assert!(matches!(
            api.resolve_key(),
            Err(ConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn mail_section_parses_with_partial_fields() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "watchlist": [{ "name": "Milk" }],
                "mail": { "user": "me@example.com", "app_password": "secret" },
                "email_report": { "user": "me@example.com", "app_password": "secret" },
                "report_log": "specials.log"
            }"#,
        )
        .expect("config should parse");

        let mail = config.mail.expect("mail section");
        assert_eq!(mail.imap_server, "imap.gmail.com");
        assert_eq!(mail.imap_port, 993);
        assert_eq!(mail.days, 7);
        assert_eq!(mail.max_messages, 20);
        assert_eq!(mail.senders.len(), 2);

        let email = config.email_report.expect("email section");
        assert_eq!(email.smtp_server, "smtp.gmail.com");
        assert_eq!(email.smtp_port, 587);
        assert!(email.to.is_none());
    }
}
