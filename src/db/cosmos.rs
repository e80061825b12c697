use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use thiserror::Error;

use super::{sort_newest_first, MatchStore, StoreError};
use crate::config::CosmosSettings;
use crate::models::Match;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";
const CONTINUATION: &str = "x-ms-continuation";

#[derive(Debug, Error)]
pub enum CosmosSetupError {
    #[error("COSMOS_DB_KEY is not valid base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    #[error("COSMOS_DB_ENDPOINT cannot be used as a base URL")]
    InvalidEndpoint,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Azure Cosmos DB (SQL API) container accessed over its REST interface,
/// signing every request with the account master key.
pub struct CosmosStore {
    client: reqwest::Client,
    key: SecretBox<Vec<u8>>,
    docs_url: Url,
    collection_link: String,
}

#[derive(Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Match>,
}

#[derive(Deserialize)]
struct CosmosErrorBody {
    message: Option<String>,
}

impl CosmosStore {
    pub fn new(settings: &CosmosSettings) -> Result<Self, CosmosSetupError> {
        let key = STANDARD.decode(settings.key.expose_secret().trim())?;

        let mut docs_url = settings.endpoint.clone();
        docs_url
            .path_segments_mut()
            .map_err(|_| CosmosSetupError::InvalidEndpoint)?
            .pop_if_empty()
            .extend([
                "dbs",
                settings.database.as_str(),
                "colls",
                settings.container.as_str(),
                "docs",
            ]);

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            key: SecretBox::new(Box::new(key)),
            docs_url,
            collection_link: format!("dbs/{}/colls/{}", settings.database, settings.container),
        })
    }

    fn item_url(&self, id: &str) -> Url {
        let mut url = self.docs_url.clone();
        // docs_url is known to be a base URL, see `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    fn item_link(&self, id: &str) -> String {
        format!("{}/docs/{}", self.collection_link, id)
    }

    /// Request carrying the date, version and authorization headers.
    fn request(&self, method: Method, url: Url, resource_link: &str) -> Result<RequestBuilder, StoreError> {
        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let token = auth_token(
            self.key.expose_secret(),
            method.as_str(),
            "docs",
            resource_link,
            &date,
        )?;

        Ok(self
            .client
            .request(method, url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION))
    }
}

#[async_trait]
impl MatchStore for CosmosStore {
    async fn create(&self, record: &Match) -> Result<Match, StoreError> {
        let response = self
            .request(Method::POST, self.docs_url.clone(), &self.collection_link)?
            .header("x-ms-documentdb-partitionkey", partition_key(&record.id))
            .json(record)
            .send()
            .await?;

        check(response, None)
            .await?
            .json::<Match>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn list(&self, player: Option<&str>) -> Result<Vec<Match>, StoreError> {
        let body = list_query(player).to_string();
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::POST, self.docs_url.clone(), &self.collection_link)?
                .header(CONTENT_TYPE, "application/query+json")
                .header("x-ms-documentdb-isquery", "True")
                .header("x-ms-documentdb-query-enablecrosspartition", "True")
                .body(body.clone());
            if let Some(token) = &continuation {
                request = request.header(CONTINUATION, token);
            }

            let response = check(request.send().await?, None).await?;
            continuation = response
                .headers()
                .get(CONTINUATION)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned);

            let page: QueryPage = response
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            records.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        // The gateway cannot serve cross-partition ORDER BY.
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Match, StoreError> {
        let response = self
            .request(Method::GET, self.item_url(id), &self.item_link(id))?
            .header("x-ms-documentdb-partitionkey", partition_key(id))
            .send()
            .await?;

        check(response, Some(id))
            .await?
            .json::<Match>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, self.item_url(id), &self.item_link(id))?
            .header("x-ms-documentdb-partitionkey", partition_key(id))
            .send()
            .await?;

        check(response, Some(id)).await?;
        Ok(())
    }
}

/// Passes successful responses through. A 404 on a point operation means the
/// document is missing; any other failure carries the store's message.
async fn check(response: Response, item_id: Option<&str>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if let (StatusCode::NOT_FOUND, Some(id)) = (status, item_id) {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<CosmosErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(text);

    Err(StoreError::Backend {
        status: status.as_u16(),
        message: format!("({}) {}", status, message),
    })
}

/// Master-key authorization header value, already URL-encoded.
pub(crate) fn auth_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String, StoreError> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| StoreError::Decode(format!("unusable master key: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let token = format!("type=master&ver=1.0&sig={}", signature);
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

fn partition_key(id: &str) -> String {
    json!([id]).to_string()
}

pub(crate) fn list_query(player: Option<&str>) -> Value {
    match player {
        Some(player) => json!({
            "query": "SELECT * FROM c \
                      WHERE CONTAINS(LOWER(c.jugador1), LOWER(@jugador)) \
                      OR CONTAINS(LOWER(c.jugador2), LOWER(@jugador))",
            "parameters": [{ "name": "@jugador", "value": player }],
        }),
        None => json!({
            "query": "SELECT * FROM c",
            "parameters": [],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn settings() -> CosmosSettings {
        CosmosSettings {
            endpoint: Url::parse("https://tenis.documents.azure.com:443/").unwrap(),
            key: SecretString::from(STANDARD.encode("not-a-real-key")),
            database: "tenis".into(),
            container: "partidos".into(),
        }
    }

    #[test]
    fn token_is_url_encoded_master_token() {
        let token = auth_token(b"key", "GET", "docs", "dbs/tenis/colls/partidos/docs/p1", "Tue, 01 Jan 2030 00:00:00 GMT").unwrap();
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!token.contains('/'));
        assert!(!token.contains('+'));
    }

    #[test]
    fn token_depends_on_every_signed_part() {
        let date = "Tue, 01 Jan 2030 00:00:00 GMT";
        let base = auth_token(b"key", "GET", "docs", "dbs/a/colls/b/docs/1", date).unwrap();
        assert_eq!(base, auth_token(b"key", "get", "DOCS", "dbs/a/colls/b/docs/1", date).unwrap());
        assert_ne!(base, auth_token(b"key", "DELETE", "docs", "dbs/a/colls/b/docs/1", date).unwrap());
        assert_ne!(base, auth_token(b"key", "GET", "docs", "dbs/a/colls/b/docs/2", date).unwrap());
        assert_ne!(base, auth_token(b"other", "GET", "docs", "dbs/a/colls/b/docs/1", date).unwrap());
    }

    #[test]
    fn urls_and_links_point_at_the_container() {
        let store = CosmosStore::new(&settings()).unwrap();
        assert_eq!(
            store.docs_url.as_str(),
            "https://tenis.documents.azure.com/dbs/tenis/colls/partidos/docs"
        );
        assert_eq!(
            store.item_url("partido 1").as_str(),
            "https://tenis.documents.azure.com/dbs/tenis/colls/partidos/docs/partido%201"
        );
        assert_eq!(store.item_link("p1"), "dbs/tenis/colls/partidos/docs/p1");
    }

    #[test]
    fn invalid_key_is_rejected_up_front() {
        let mut bad = settings();
        bad.key = SecretString::from("%%% not base64".to_string());
        assert!(matches!(CosmosStore::new(&bad), Err(CosmosSetupError::InvalidKey(_))));
    }

    #[test]
    fn partition_key_is_a_json_array() {
        assert_eq!(partition_key("partido-1"), r#"["partido-1"]"#);
    }

    #[test]
    fn filtered_query_is_parameterised() {
        let query = list_query(Some("Nadal"));
        assert!(query["query"].as_str().unwrap().contains("LOWER(@jugador)"));
        assert_eq!(query["parameters"][0]["name"], "@jugador");
        assert_eq!(query["parameters"][0]["value"], "Nadal");

        let all = list_query(None);
        assert_eq!(all["query"], "SELECT * FROM c");
    }
}
