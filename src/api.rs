use crate::state::{
    AppConfig, AvailableModels, BackendStatus, ChatPayload, ChatResponse, Conversation,
    ConversationList,
};
use ::reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use async_trait::async_trait;
use leptos::logging::log;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

static API_URL: Option<&'static str> = option_env!("BIFROST_API_URL");
const DEFAULT_API_URL: &str = "http://localhost:8000";

pub fn api_url() -> &'static str {
    API_URL.unwrap_or(DEFAULT_API_URL)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] ::reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Url error {0}")]
    Url(#[from] url::ParseError),
}

/// The gateway that fronts the local model server.
#[async_trait(?Send)]
pub trait Backend {
    async fn health(&self) -> Result<BackendStatus, Error>;

    async fn models(&self, provider: Option<&str>) -> Result<AvailableModels, Error>;

    async fn load_config(&self) -> Result<AppConfig, Error>;

    async fn save_config(&self, config: &AppConfig) -> Result<(), Error>;

    async fn conversations(&self) -> Result<Vec<Conversation>, Error>;

    async fn create_conversation(&self, conversation: &Conversation)
        -> Result<Conversation, Error>;

    async fn delete_conversation(&self, id: &str) -> Result<(), Error>;

    async fn chat(&self, payload: &ChatPayload) -> Result<ChatResponse, Error>;
}

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: &str) -> Result<Self, Error> {
        let mut base = Url::parse(base)?;
        // Relative joins drop the last segment unless the path ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(HttpBackend {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, Error> {
        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn with_body<B: Serialize>(request: RequestBuilder, body: &B) -> Result<RequestBuilder, Error> {
        Ok(request
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(body)?))
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<BackendStatus, Error> {
        let url = self.endpoint("health")?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn models(&self, provider: Option<&str>) -> Result<AvailableModels, Error> {
        let mut url = self.endpoint("api/models")?;
        if let Some(provider) = provider {
            url.query_pairs_mut().append_pair("provider", provider);
        }
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn load_config(&self) -> Result<AppConfig, Error> {
        let url = self.endpoint("api/config")?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn save_config(&self, config: &AppConfig) -> Result<(), Error> {
        let url = self.endpoint("api/config")?;
        let request = Self::with_body(self.request(Method::PUT, url), config)?;
        let body = self.send(request).await?;
        log!("Configuration saved to backend: {body}");
        Ok(())
    }

    async fn conversations(&self) -> Result<Vec<Conversation>, Error> {
        let url = self.endpoint("api/conversations")?;
        let list: ConversationList = self.send_json(self.request(Method::GET, url)).await?;
        Ok(list.conversations)
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, Error> {
        let url = self.endpoint("api/conversations")?;
        let request = Self::with_body(self.request(Method::POST, url), conversation)?;
        self.send_json(request).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), Error> {
        let mut url = self.endpoint("api/conversations")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn chat(&self, payload: &ChatPayload) -> Result<ChatResponse, Error> {
        let url = self.endpoint("chat")?;
        let request = Self::with_body(self.request(Method::POST, url), payload)?;
        self.send_json(request).await
    }
}
