use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "New Conversation";
pub const NEW_PREVIEW: &str = "New conversation started...";
pub const JUST_NOW: &str = "Just now";
/// Number of characters kept for previews and titles derived from a message.
pub const PREVIEW_LEN: usize = 50;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    #[serde(default = "Utc::now", deserialize_with = "normalize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Accepts RFC 3339 strings, naive ISO strings, epoch milliseconds or nothing at all.
/// Anything that cannot be read as an instant becomes "now".
fn normalize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let instant = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(text) => parse_instant(&text),
        _ => None,
    };
    Ok(instant.unwrap_or_else(Utc::now))
}

/// Strings without an offset are read in the browser's local time zone.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    local_to_utc(naive)
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps the first `len` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, len: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(len).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn recency_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then).max(TimeDelta::zero());
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    };
    if elapsed < TimeDelta::minutes(1) {
        JUST_NOW.to_string()
    } else if elapsed < TimeDelta::hours(1) {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed < TimeDelta::days(1) {
        plural(elapsed.num_hours(), "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Either a display label ("Just now") or the server's ISO instant.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        Conversation {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            timestamp: JUST_NOW.to_string(),
            preview: NEW_PREVIEW.to_string(),
            messages: vec![],
        }
    }

    pub fn welcome() -> Self {
        let mut conversation = Self::new(DEFAULT_TITLE);
        conversation.messages.push(Message::assistant(
            "Welcome to Bifrost! I'm your AI assistant, ready to help with any questions or tasks. How can I assist you today?",
        ));
        conversation
    }

    pub fn push(&mut self, message: Message) {
        if self.messages.is_empty() && self.title == DEFAULT_TITLE {
            self.title = truncate(&message.content, PREVIEW_LEN);
        }
        self.preview = truncate(&message.content, PREVIEW_LEN);
        self.timestamp = JUST_NOW.to_string();
        self.messages.push(message);
    }

    pub fn recency(&self, now: DateTime<Utc>) -> String {
        match parse_instant(&self.timestamp) {
            Some(then) => recency_label(then, now),
            None => self.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationList {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ollama,
    LmStudio,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Ollama, BackendKind::LmStudio];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::LmStudio => "lmstudio",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "Ollama",
            BackendKind::LmStudio => "LM Studio",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            BackendKind::Ollama => 11434,
            BackendKind::LmStudio => 1234,
        }
    }

    pub fn start_command(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama serve",
            BackendKind::LmStudio => "lms server start",
        }
    }

    pub fn install_url(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "https://ollama.ai",
            BackendKind::LmStudio => "https://lmstudio.ai",
        }
    }

    pub fn pull_hint(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "`ollama pull llama3.2`",
            BackendKind::LmStudio => "Load a model in LM Studio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub kind: BackendKind,
    pub port: u16,
}

impl BackendConfig {
    pub fn for_kind(kind: BackendKind) -> Self {
        BackendConfig {
            kind,
            port: kind.default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::for_kind(BackendKind::default())
    }
}

pub const ACCENT_COLORS: [&str; 6] = ["emerald", "blue", "purple", "amber", "rose", "indigo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            accent_color: ACCENT_COLORS[0].to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub theme: Theme,
    pub web_search_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    // Server bookkeeping, echoed back on save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// A partial update of [`AppConfig`]; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub backend: Option<BackendConfig>,
    pub theme: Option<Theme>,
    pub web_search_enabled: Option<bool>,
    pub model: Option<Option<String>>,
}

impl AppConfig {
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            self.backend = backend;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(enabled) = patch.web_search_enabled {
            self.web_search_enabled = enabled;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendHealth {
    pub status: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub status: HealthState,
    pub model_provider: String,
    #[serde(default)]
    pub backend_health: BackendHealth,
}

impl BackendStatus {
    /// What the client assumes when the health endpoint cannot be read.
    pub fn unreachable() -> Self {
        BackendStatus {
            status: HealthState::Unhealthy,
            model_provider: "unknown".to_string(),
            backend_health: BackendHealth {
                status: "unhealthy".to_string(),
                provider: "unknown".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailableModels {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub provider: String,
}

impl AvailableModels {
    pub fn empty(provider: Option<&str>) -> Self {
        AvailableModels {
            models: vec![],
            provider: provider.unwrap_or("unknown").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub query: String,
    pub web_search_enabled: bool,
    pub backend: BackendConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The assistant turn of a `/chat` reply. The gateway also sends `role`,
/// `conversationId` and `done`, which the client has no use for.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ChatReply,
}
