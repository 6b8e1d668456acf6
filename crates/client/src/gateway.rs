//! Backend request/response contract and its HTTP implementation.

use async_trait::async_trait;
use proto::{
    ChatId, GatewayError, LoadChatResponse, RenameRequest, RenameResponse, SaveKeysRequest,
    SaveKeysResponse, SendMessageRequest, SendMessageResponse,
};

/// Operations the session controller issues against the chat backend.
///
/// Implementations map every failure onto [`GatewayError`]; a 200 response
/// whose body reports an application-level error is still `Ok`.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// `POST /new_chat`
    async fn new_chat(&self) -> Result<(), GatewayError>;

    /// `GET /load_chat/{id}`
    async fn load_chat(&self, id: &ChatId) -> Result<LoadChatResponse, GatewayError>;

    /// `POST /chat`
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, GatewayError>;

    /// `POST /update_title/{id}`
    async fn rename_chat(
        &self,
        id: &ChatId,
        request: &RenameRequest,
    ) -> Result<RenameResponse, GatewayError>;

    /// `DELETE /delete_chat/{id}`
    async fn delete_chat(&self, id: &ChatId) -> Result<(), GatewayError>;

    /// `POST /save_api_keys`
    async fn save_api_keys(
        &self,
        request: &SaveKeysRequest,
    ) -> Result<SaveKeysResponse, GatewayError>;
}

#[cfg(feature = "http")]
pub use http::HttpGateway;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use proto::{
        ChatId, ErrorBody, GatewayError, LoadChatResponse, RenameRequest, RenameResponse,
        SaveKeysRequest, SaveKeysResponse, SendMessageRequest, SendMessageResponse,
    };
    use reqwest::{Client, RequestBuilder, Url};
    use serde::de::DeserializeOwned;
    use tracing::{debug, warn};

    use super::ChatGateway;

    const BODY_LOG_LIMIT: usize = 500;

    /// [`ChatGateway`] over HTTP/JSON with a cookie-backed backend session.
    #[derive(Debug, Clone)]
    pub struct HttpGateway {
        client: Client,
        base_url: Url,
    }

    impl HttpGateway {
        /// Creates a gateway for `base_url` with a per-request `timeout`.
        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
            let base_url = Url::parse(base_url)
                .map_err(|e| GatewayError::InvalidUrl(format!("{base_url}: {e}")))?;
            if base_url.cannot_be_a_base() {
                return Err(GatewayError::InvalidUrl(base_url.to_string()));
            }
            let client = Client::builder()
                .cookie_store(true)
                .timeout(timeout)
                .build()
                .map_err(|e| GatewayError::Network(e.to_string()))?;
            Ok(Self { client, base_url })
        }

        pub fn base_url(&self) -> &Url {
            &self.base_url
        }

        /// Joins path segments onto the base URL, percent-encoding each one.
        fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
                .pop_if_empty()
                .extend(segments);
            Ok(url)
        }

        async fn execute<T: DeserializeOwned>(
            &self,
            builder: RequestBuilder,
        ) -> Result<T, GatewayError> {
            let body = self.send(builder).await?;
            serde_json::from_str(&body).map_err(|e| {
                GatewayError::Decode(format!(
                    "{e}; body: {}",
                    body.chars().take(200).collect::<String>()
                ))
            })
        }

        /// Sends the request and returns the body of a 2xx response.
        async fn send(&self, builder: RequestBuilder) -> Result<String, GatewayError> {
            let response = builder
                .send()
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?;
            let status = response.status();
            debug!(status = %status.as_u16(), url = %response.url(), "Backend response received");
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?;
            if status.is_success() {
                return Ok(body);
            }
            Err(parse_error_body(status, &body))
        }
    }

    fn parse_error_body(status: reqwest::StatusCode, body: &str) -> GatewayError {
        if let Ok(ErrorBody {
            error: Some(message),
        }) = serde_json::from_str::<ErrorBody>(body)
        {
            return GatewayError::Server {
                status: status.as_u16(),
                message,
            };
        }
        warn!(
            status = %status.as_u16(),
            body = %body.chars().take(BODY_LOG_LIMIT).collect::<String>(),
            "Backend returned an error without a JSON error message"
        );
        GatewayError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    #[async_trait]
    impl ChatGateway for HttpGateway {
        async fn new_chat(&self) -> Result<(), GatewayError> {
            let url = self.endpoint(&["new_chat"])?;
            debug!(%url, "Requesting new chat");
            self.send(self.client.post(url)).await.map(|_| ())
        }

        async fn load_chat(&self, id: &ChatId) -> Result<LoadChatResponse, GatewayError> {
            let url = self.endpoint(&["load_chat", id.as_str()])?;
            debug!(chat_id = %id, "Loading chat");
            self.execute(self.client.get(url)).await
        }

        async fn send_message(
            &self,
            request: &SendMessageRequest,
        ) -> Result<SendMessageResponse, GatewayError> {
            let url = self.endpoint(&["chat"])?;
            debug!(
                model = %request.model_choice,
                chars = request.message.chars().count(),
                "Sending message"
            );
            self.execute(self.client.post(url).json(request)).await
        }

        async fn rename_chat(
            &self,
            id: &ChatId,
            request: &RenameRequest,
        ) -> Result<RenameResponse, GatewayError> {
            let url = self.endpoint(&["update_title", id.as_str()])?;
            debug!(chat_id = %id, "Renaming chat");
            self.execute(self.client.post(url).json(request)).await
        }

        async fn delete_chat(&self, id: &ChatId) -> Result<(), GatewayError> {
            let url = self.endpoint(&["delete_chat", id.as_str()])?;
            debug!(chat_id = %id, "Deleting chat");
            self.send(self.client.delete(url)).await.map(|_| ())
        }

        async fn save_api_keys(
            &self,
            request: &SaveKeysRequest,
        ) -> Result<SaveKeysResponse, GatewayError> {
            let url = self.endpoint(&["save_api_keys"])?;
            debug!("Saving provider keys");
            self.execute(self.client.post(url).json(request)).await
        }
    }

}
