//! LLM API 客户端
//!
//! 封装与 OpenAI 兼容接口的聊天调用和重试逻辑
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（OpenAI / Anthropic 兼容端点等）

use crate::config::Config;
use crate::error::JudgeError;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// LLM 的一次回复
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    /// 正常文本内容
    Content(String),
    /// 模型拒绝回答
    Refusal(String),
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_retries: usize,
    retry_delay: Duration,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.judge_api_key)
            .with_api_base(&config.judge_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.judge_model_name.clone(),
            max_retries: config.judge_max_retries.max(1),
            retry_delay: Duration::from_millis(config.judge_retry_delay_ms),
        }
    }

    /// 发送聊天请求，API 调用失败时按配置重试
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `response_format`: 回复格式约束（可选）
    pub async fn chat(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmReply, JudgeError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self
                .chat_once(user_message, system_message, response_format)
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(e @ JudgeError::ApiCallFailed { .. }) => {
                    if attempt < self.max_retries {
                        warn!(
                            "LLM 调用失败 (尝试 {}/{}): {}, 等待 {} 毫秒后重试...",
                            attempt,
                            self.max_retries,
                            e,
                            self.retry_delay.as_millis()
                        );
                        sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        warn!("LLM 调用失败，已重试 {} 次", self.max_retries);
        Err(last_error.unwrap_or_else(|| JudgeError::EmptyContent {
            model: self.model_name.clone(),
        }))
    }

    async fn chat_once(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmReply, JudgeError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let build_err = |e: OpenAIError| JudgeError::RequestBuildFailed(e.to_string());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(build_err)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_err)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_completion_tokens(1024u32);
        if let Some(format) = response_format {
            args.response_format(format.clone());
        }
        let request = args.build().map_err(build_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| JudgeError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        debug!("LLM API 调用成功");

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| JudgeError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
            return Ok(LlmReply::Refusal(refusal));
        }

        message
            .content
            .map(|content| LlmReply::Content(content.trim().to_string()))
            .filter(|reply| !matches!(reply, LlmReply::Content(c) if c.is_empty()))
            .ok_or_else(|| JudgeError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}
