use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub encryption_password: String,
    pub encryption_salt: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            encryption_password: env::var("ENCRYPTION_PASSWORD")
                .context("ENCRYPTION_PASSWORD is required")?,
            encryption_salt: env::var("ENCRYPTION_SALT")
                .context("ENCRYPTION_SALT is required")?,
        })
    }
}
