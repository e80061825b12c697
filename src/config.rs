use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use reqwest::Url;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 7071;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Connection details for the Cosmos DB container holding the matches.
#[derive(Debug)]
pub struct CosmosSettings {
    pub endpoint: Url,
    pub key: SecretString,
    pub database: String,
    pub container: String,
}

#[derive(Debug)]
pub enum StoreSettings {
    Cosmos(CosmosSettings),
    Sqlite { database_url: String },
}

#[derive(Debug)]
pub struct Settings {
    pub addr: SocketAddr,
    pub store: StoreSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads every variable through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let host: IpAddr = match get("HOST") {
            Some(host) => host.trim().parse::<IpAddr>().map_err(|e| {
                ConfigError::Invalid { var: "HOST", reason: e.to_string() }
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port: u16 = match get("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| {
                ConfigError::Invalid { var: "PORT", reason: e.to_string() }
            })?,
            None => DEFAULT_PORT,
        };

        let backend = get("STORE_BACKEND").unwrap_or_else(|| "cosmos".to_string());
        let store = match backend.trim().to_lowercase().as_str() {
            "cosmos" => {
                let endpoint = require("COSMOS_DB_ENDPOINT")?;
                let endpoint = Url::parse(endpoint.trim()).map_err(|e| ConfigError::Invalid {
                    var: "COSMOS_DB_ENDPOINT",
                    reason: e.to_string(),
                })?;
                if !matches!(endpoint.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid {
                        var: "COSMOS_DB_ENDPOINT",
                        reason: format!("unsupported scheme '{}'", endpoint.scheme()),
                    });
                }

                StoreSettings::Cosmos(CosmosSettings {
                    endpoint,
                    key: SecretString::from(require("COSMOS_DB_KEY")?),
                    database: require("COSMOS_DB_DATABASE_NAME")?,
                    container: require("COSMOS_DB_CONTAINER_NAME")?,
                })
            }
            "sqlite" => StoreSettings::Sqlite {
                database_url: require("DATABASE_URL")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    reason: format!("expected 'cosmos' or 'sqlite', got '{}'", other),
                })
            }
        };

        Ok(Settings {
            addr: SocketAddr::new(host, port),
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    const COSMOS: [(&str, &str); 4] = [
        ("COSMOS_DB_ENDPOINT", "https://tenis.documents.azure.com:443/"),
        ("COSMOS_DB_KEY", "c2VjcmV0"),
        ("COSMOS_DB_DATABASE_NAME", "tenis"),
        ("COSMOS_DB_CONTAINER_NAME", "partidos"),
    ];

    #[test]
    fn cosmos_is_the_default_backend() {
        let settings = load(&COSMOS).unwrap();
        assert_eq!(settings.addr, "0.0.0.0:7071".parse::<SocketAddr>().unwrap());
        match settings.store {
            StoreSettings::Cosmos(cosmos) => {
                assert_eq!(cosmos.database, "tenis");
                assert_eq!(cosmos.container, "partidos");
                assert_eq!(cosmos.key.expose_secret(), "c2VjcmV0");
            }
            other => panic!("unexpected store settings: {:?}", other),
        }
    }

    #[test]
    fn each_cosmos_variable_is_required() {
        for (missing, _) in COSMOS {
            let vars: Vec<_> = COSMOS.iter().copied().filter(|(k, _)| *k != missing).collect();
            match load(&vars) {
                Err(ConfigError::Missing(name)) => assert_eq!(name, missing),
                other => panic!("expected {} to be reported missing, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = COSMOS.to_vec();
        vars[1] = ("COSMOS_DB_KEY", "  ");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("COSMOS_DB_KEY"))));
    }

    #[test]
    fn sqlite_backend_needs_database_url() {
        assert!(matches!(
            load(&[("STORE_BACKEND", "sqlite")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        let settings = load(&[
            ("STORE_BACKEND", "SQLite"),
            ("DATABASE_URL", "sqlite://partidos.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(settings.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(matches!(settings.store, StoreSettings::Sqlite { .. }));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let mut vars = COSMOS.to_vec();
        vars.push(("PORT", "seventy"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { var: "PORT", .. })));

        assert!(matches!(
            load(&[("STORE_BACKEND", "mongo")]),
            Err(ConfigError::Invalid { var: "STORE_BACKEND", .. })
        ));

        let mut vars = COSMOS.to_vec();
        vars[0] = ("COSMOS_DB_ENDPOINT", "ftp://tenis.example");
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { var: "COSMOS_DB_ENDPOINT", .. })));
    }
}
