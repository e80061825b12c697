use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Stored tennis match. JSON keys follow the documents already held in the
/// `partidos` container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: String,
    #[serde(rename = "jugador1")]
    pub player1: String,
    #[serde(rename = "jugador2")]
    pub player2: String,
    #[serde(rename = "sets_jugador1")]
    pub sets_player1: i64,
    #[serde(rename = "sets_jugador2")]
    pub sets_player2: i64,
    #[serde(rename = "juegos", default)]
    pub games: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "ganador")]
    pub winner: String,
    #[serde(rename = "notas", default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: String,
}

/// Inbound body for `POST /partidos`.
///
/// Every field is optional at the serde level so that a missing key can be
/// reported by name in [`NewMatch::validate`] instead of surfacing as a
/// generic parse failure. Set counts stay as raw JSON until coercion.
#[derive(Debug, Default, Deserialize)]
pub struct NewMatch {
    #[serde(rename = "jugador1", alias = "player1", default)]
    pub player1: Option<Value>,
    #[serde(rename = "jugador2", alias = "player2", default)]
    pub player2: Option<Value>,
    #[serde(rename = "sets_jugador1", alias = "sets_player1", default)]
    pub sets_player1: Option<Value>,
    #[serde(rename = "sets_jugador2", alias = "sets_player2", default)]
    pub sets_player2: Option<Value>,
    #[serde(rename = "juegos", alias = "games", default)]
    pub games: Option<Value>,
    #[serde(rename = "fecha", alias = "date", default)]
    pub date: Option<Value>,
    #[serde(rename = "ganador", alias = "winner", default)]
    pub winner: Option<Value>,
    #[serde(rename = "notas", alias = "notes", default)]
    pub notes: Option<Value>,
}

/// Payload that passed validation; set counts are already integers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMatch {
    pub player1: String,
    pub player2: String,
    pub sets_player1: i64,
    pub sets_player2: i64,
    pub games: Option<String>,
    pub date: Option<String>,
    pub winner: String,
    pub notes: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Campo requerido '{0}' no encontrado")]
    MissingField(&'static str),

    #[error("Campo '{0}' debe ser un número entero")]
    NotAnInteger(&'static str),

    #[error("Campo '{0}' debe ser texto")]
    NotText(&'static str),
}

impl NewMatch {
    /// Parses a request body. Only a JSON object is accepted; serde would
    /// otherwise fill the struct positionally from an array.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_slice(body)?;
        serde_json::from_value(Value::Object(object))
    }

    /// Presence is checked for all required keys first, in wire order, then
    /// types are coerced.
    pub fn validate(self) -> Result<ValidMatch, ValidationError> {
        let required = [
            ("jugador1", &self.player1),
            ("jugador2", &self.player2),
            ("sets_jugador1", &self.sets_player1),
            ("sets_jugador2", &self.sets_player2),
            ("ganador", &self.winner),
        ];
        for (field, value) in required {
            if matches!(value, None | Some(Value::Null)) {
                return Err(ValidationError::MissingField(field));
            }
        }

        Ok(ValidMatch {
            player1: required_text("jugador1", self.player1)?,
            player2: required_text("jugador2", self.player2)?,
            sets_player1: set_count("sets_jugador1", self.sets_player1)?,
            sets_player2: set_count("sets_jugador2", self.sets_player2)?,
            games: optional_text("juegos", self.games)?,
            date: optional_text("fecha", self.date)?,
            winner: required_text("ganador", self.winner)?,
            notes: optional_text("notas", self.notes)?,
        })
    }
}

fn required_text(field: &'static str, value: Option<Value>) -> Result<String, ValidationError> {
    optional_text(field, value)?.ok_or(ValidationError::MissingField(field))
}

fn optional_text(field: &'static str, value: Option<Value>) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ValidationError::NotText(field)),
    }
}

// Accepts 3, 3.0 and "3".
fn set_count(field: &'static str, value: Option<Value>) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::NotAnInteger(field);
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(invalid()),
            }
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(_) => Err(invalid()),
    }
}

impl Match {
    /// Builds the document to insert: fresh id and creation time, defaults
    /// for the optional fields.
    pub fn new(valid: ValidMatch, now: DateTime<Local>) -> Self {
        Match {
            id: generate_match_id(now),
            player1: valid.player1,
            player2: valid.player2,
            sets_player1: valid.sets_player1,
            sets_player2: valid.sets_player2,
            games: valid.games.unwrap_or_default(),
            date: valid
                .date
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            winner: valid.winner,
            notes: valid.notes.unwrap_or_default(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }
}

/// `partido-<unix micros>-<8 random hex chars>`
pub fn generate_match_id(now: DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("partido-{}-{}", now.timestamp_micros(), &suffix[..8])
}

/// Query parameters for `GET /partidos`
#[derive(Debug, Default, Deserialize)]
pub struct ListMatchesQuery {
    #[serde(default)]
    pub jugador: Option<String>,
}

impl ListMatchesQuery {
    /// Blank filters behave like no filter at all.
    pub fn player_filter(&self) -> Option<&str> {
        self.jugador.as_deref().filter(|j| !j.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}
