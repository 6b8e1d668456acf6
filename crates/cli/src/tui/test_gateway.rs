//! In-memory backend for TUI tests.

use std::collections::HashMap;

use async_trait::async_trait;
use client::ChatGateway;
use proto::{
    ChatId, GatewayError, LoadChatResponse, Message, NewChatInfo, RenameRequest, RenameResponse,
    SaveKeysRequest, SaveKeysResponse, SendMessageRequest, SendMessageResponse,
};

#[derive(Debug, Default)]
pub(crate) struct StubGateway {
    pub titles: HashMap<ChatId, String>,
    pub fail_deletes: bool,
}

impl StubGateway {
    pub fn with_titles(titles: &[(&str, &str)]) -> Self {
        Self {
            titles: titles
                .iter()
                .map(|(id, title)| (ChatId::from(*id), title.to_string()))
                .collect(),
            fail_deletes: false,
        }
    }
}

#[async_trait]
impl ChatGateway for StubGateway {
    async fn new_chat(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn load_chat(&self, id: &ChatId) -> Result<LoadChatResponse, GatewayError> {
        let title = self.titles.get(id).ok_or_else(|| GatewayError::Server {
            status: 404,
            message: "Chat not found".to_string(),
        })?;
        Ok(LoadChatResponse {
            history: vec![
                Message::user("earlier question"),
                Message::assistant(format!("Loaded {title}")),
            ],
            title: Some(title.clone()),
        })
    }

    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, GatewayError> {
        Ok(SendMessageResponse {
            response: Some(format!("echo: {}", request.message)),
            new_chat_info: Some(NewChatInfo {
                id: ChatId::from("n1"),
                title: request.message.clone(),
            }),
            ..SendMessageResponse::default()
        })
    }

    async fn rename_chat(
        &self,
        _id: &ChatId,
        request: &RenameRequest,
    ) -> Result<RenameResponse, GatewayError> {
        Ok(RenameResponse {
            new_title: Some(request.new_title.clone()),
        })
    }

    async fn delete_chat(&self, _id: &ChatId) -> Result<(), GatewayError> {
        if self.fail_deletes {
            return Err(GatewayError::Server {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(())
    }

    async fn save_api_keys(
        &self,
        _request: &SaveKeysRequest,
    ) -> Result<SaveKeysResponse, GatewayError> {
        Ok(SaveKeysResponse::default())
    }
}
