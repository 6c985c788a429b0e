use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sms: SmsConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SmsConfig {
    pub gateway_url: String,
    pub auth_key: Secret<String>,
    pub sender_id: String,
    pub enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("INSTITUTE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("INSTITUTE_SERVICE_PORT")
            .unwrap_or_else(|_| "3007".to_string())
            .parse()?;

        let db_url =
            env::var("INSTITUTE_DATABASE_URL").expect("INSTITUTE_DATABASE_URL must be set");
        let db_name =
            env::var("INSTITUTE_DATABASE_NAME").unwrap_or_else(|_| "institute_db".to_string());

        let gateway_url = env::var("SMS_GATEWAY_URL").unwrap_or_else(|_| "".to_string());
        let auth_key = env::var("SMS_AUTH_KEY").unwrap_or_else(|_| "".to_string());
        let sender_id = env::var("SMS_SENDER_ID").unwrap_or_else(|_| "INSTTE".to_string());
        let sms_enabled = env::var("SMS_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            sms: SmsConfig {
                gateway_url,
                auth_key: Secret::new(auth_key),
                sender_id,
                enabled: sms_enabled,
            },
            service_name: "institute-service".to_string(),
        })
    }
}
