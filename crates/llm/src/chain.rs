//! Render → complete → extract, composed for activity summaries.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::CompletionClient;
use crate::error::LlmError;
use crate::prompt::PromptTemplate;

/// Placeholder that receives the serialized activity payload.
pub const ACTIVITY_JSON_VAR: &str = "activity_json";

/// Prompt used for the daily GitHub summary.
///
/// Asks for a concise report in Chinese of who did what; the briefing is
/// read in Chinese, so the output language is part of the prompt.
pub const ACTIVITY_SUMMARY_TEMPLATE: &str = "你是一个专业的技术主管。\
请根据以下 GitHub 活动 JSON 数据，为我生成一份简洁的中文摘要报告，说明谁做了什么。\n\
数据: {activity_json}";

/// A linear prompt → model → text pipeline with no branching or turn state.
#[derive(Clone)]
pub struct SummarizationChain {
    template: PromptTemplate,
    client: Arc<dyn CompletionClient>,
}

impl SummarizationChain {
    pub fn new(template: PromptTemplate, client: Arc<dyn CompletionClient>) -> Self {
        Self { template, client }
    }

    /// Chain over [`ACTIVITY_SUMMARY_TEMPLATE`].
    pub fn activity_summary(client: Arc<dyn CompletionClient>) -> Result<Self, LlmError> {
        let template = PromptTemplate::from_template(ACTIVITY_SUMMARY_TEMPLATE)?;
        Ok(Self::new(template, client))
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Render the template with `vars`, run the completion, and return the
    /// model's text with surrounding whitespace removed.
    pub async fn invoke(&self, vars: &HashMap<&str, String>) -> Result<String, LlmError> {
        let prompt = self.template.render(vars)?;
        let output = self.client.complete(&prompt).await?;
        Ok(output.trim().to_string())
    }

    /// Convenience for the single-placeholder activity prompt.
    pub async fn summarize_activity(&self, activity_json: String) -> Result<String, LlmError> {
        let vars = HashMap::from([(ACTIVITY_JSON_VAR, activity_json)]);
        self.invoke(&vars).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt and answers with a fixed reply.
    struct Recording {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl Recording {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for Recording {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    body: "quota".to_string(),
                }),
            }
        }
    }

    #[test]
    fn activity_template_has_one_placeholder() {
        let template = PromptTemplate::from_template(ACTIVITY_SUMMARY_TEMPLATE).unwrap();
        assert_eq!(template.input_variables(), vec![ACTIVITY_JSON_VAR]);
    }

    #[test]
    fn activity_template_requests_chinese_summary() {
        assert!(ACTIVITY_SUMMARY_TEMPLATE.contains("简洁的中文摘要报告"));
        assert!(ACTIVITY_SUMMARY_TEMPLATE.contains("说明谁做了什么"));
    }

    #[tokio::test]
    async fn prompt_contains_full_payload() {
        let client = Recording::replying("  a fixed a bug\n");
        let chain = SummarizationChain::activity_summary(client.clone()).unwrap();
        let payload = serde_json::json!({
            "commits": [{"author": "a", "message": "fix bug", "timestamp": "2024-01-01T00:00:00Z"}]
        })
        .to_string();

        let summary = chain.summarize_activity(payload.clone()).await.unwrap();

        assert_eq!(summary, "a fixed a bug");
        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with(&format!("数据: {payload}")));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let client = Recording::failing(429);
        let chain = SummarizationChain::activity_summary(client).unwrap();

        let err = chain.summarize_activity("{}".to_string()).await.unwrap_err();
        assert_matches!(err, LlmError::Api { status: 429, .. });
        assert!(err.is_quota_exceeded());
    }

    #[tokio::test]
    async fn render_failure_skips_completion() {
        let client = Recording::replying("unused");
        let template = PromptTemplate::from_template("{other}").unwrap();
        let chain = SummarizationChain::new(template, client.clone());

        let err = chain.summarize_activity("{}".to_string()).await.unwrap_err();
        assert_matches!(err, LlmError::MissingVariable(_));
        assert!(client.prompts.lock().unwrap().is_empty());
    }
}
