//! Records exchanged with the scheduling backend.
//!
//! Field names on the wire are the backend's (`nome`, `telefone`, ...); the
//! Rust side uses English names and maps them with `serde(rename)`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The three entity kinds kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Client,
    Service,
    Appointment,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Service => "service",
            Self::Appointment => "appointment",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Self::Client),
            "service" => Some(Self::Service),
            "appointment" => Some(Self::Appointment),
            _ => None,
        }
    }

    /// Backend resource path for this kind.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Client => "/clientes",
            Self::Service => "/servicos",
            Self::Appointment => "/agendamentos",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "agendado")]
    Scheduled,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "agendado",
            Self::Completed => "concluido",
            Self::Cancelled => "cancelado",
        }
    }

    pub fn from_wire_value(value: &str) -> Option<Self> {
        match value {
            "agendado" => Some(Self::Scheduled),
            "concluido" => Some(Self::Completed),
            "cancelado" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Capitalized label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Agendado",
            Self::Completed => "Concluido",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Terminal statuses offer no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(
        rename = "data_cadastro",
        default,
        deserialize_with = "instant::deserialize_opt",
        serialize_with = "instant::serialize_opt"
    )]
    pub registered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "preco", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "duracao_minutos")]
    pub duration_minutes: i32,
    #[serde(
        rename = "ativo",
        default = "default_true",
        deserialize_with = "null_as_inactive"
    )]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// A missing `ativo` means active; an explicit `null` means inactive.
fn null_as_inactive<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "servico_id")]
    pub service_id: i64,
    #[serde(
        rename = "data_agendamento",
        deserialize_with = "instant::deserialize",
        serialize_with = "instant::serialize"
    )]
    pub scheduled_at: DateTime<Utc>,
    #[serde(
        rename = "data_criacao",
        default,
        deserialize_with = "instant::deserialize_opt",
        serialize_with = "instant::serialize_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    #[serde(rename = "cliente_nome", default)]
    pub client_name: Option<String>,
    #[serde(rename = "servico_nome", default)]
    pub service_name: Option<String>,
    #[serde(
        rename = "servico_preco",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub service_price: Option<Decimal>,
    #[serde(rename = "servico_duracao", default)]
    pub service_duration: Option<i32>,
}

/// Body of `POST /clientes` and `PUT /clientes/{id}`.
///
/// `email` is always serialized, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientPayload {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePayload {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "preco", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "duracao_minutos")]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentPayload {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "servico_id")]
    pub service_id: i64,
    #[serde(rename = "data_agendamento", serialize_with = "instant::serialize")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "observacoes")]
    pub notes: String,
}

/// Body of `PATCH /agendamentos/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusPayload {
    pub status: AppointmentStatus,
}

/// `GET /dashboard/estatisticas`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardStats {
    #[serde(rename = "total_clientes")]
    pub total_clients: u64,
    #[serde(rename = "total_servicos")]
    pub active_services: u64,
    #[serde(rename = "agendamentos_hoje")]
    pub appointments_today: u64,
    #[serde(rename = "agendamentos_semana", default)]
    pub appointments_week: u64,
    #[serde(rename = "agendamentos_mes", default)]
    pub appointments_month: u64,
    #[serde(rename = "receita_mes", with = "rust_decimal::serde::float")]
    pub revenue_month: Decimal,
    #[serde(rename = "agendamentos_por_status", default)]
    pub by_status: BTreeMap<String, u64>,
}

/// `GET /dashboard/servicos-populares`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopularService {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "total_agendamentos")]
    pub appointment_count: u64,
    #[serde(rename = "receita_total", with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// `GET /dashboard/receita-diaria`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRevenue {
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "receita", with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// `GET /dashboard/clientes-frequentes`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrequentClient {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "total_agendamentos")]
    pub appointment_count: u64,
    #[serde(
        rename = "ultimo_agendamento",
        default,
        deserialize_with = "instant::deserialize_opt"
    )]
    pub last_appointment: Option<DateTime<Utc>>,
}

/// `GET /agendamentos/disponibilidade`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Availability {
    #[serde(rename = "disponivel")]
    pub available: bool,
    #[serde(rename = "data")]
    pub requested: String,
    #[serde(rename = "servico_id", deserialize_with = "lenient_id")]
    pub service_id: i64,
    #[serde(rename = "motivo")]
    pub reason: String,
}

/// The backend echoes `servico_id` back as the raw query string.
fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(id) => Ok(id),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{text}'"))),
    }
}

/// Instant encoding shared by records and payloads.
pub mod instant {
    use super::*;

    /// Parse an instant as sent by the backend: RFC 3339, or a naive
    /// ISO-8601 timestamp taken as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// `2024-01-05T17:30:00.000Z`
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn serialize_opt<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid instant '{raw}'")))
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid instant '{raw}'"))),
            _ => Ok(None),
        }
    }
}
