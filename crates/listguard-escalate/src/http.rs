//! HTTP adjudicator over external chat-completion APIs.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API. Both are asked for a bare JSON array of answers.

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use listguard_core::{Error, Result};

use crate::client::{Adjudicator, BoxedAdjudication};
use crate::types::{Adjudication, AdjudicationRequest, AdjudicatorProvider};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_TOKENS: usize = 8192;

/// Adjudicator backed by one provider and model.
pub struct HttpAdjudicator {
    client: Client,
    provider: AdjudicatorProvider,
    model: String,
    api_key: String,
    name: String,
}

impl HttpAdjudicator {
    pub fn new(provider: AdjudicatorProvider, model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            name: format!("{}:{}", provider, model),
            provider,
            model,
            api_key,
        }
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        match self.provider {
            AdjudicatorProvider::OpenAI => {
                complete_openai_compat(&self.client, OPENAI_URL, &self.model, &self.api_key, &prompt)
                    .await
            }
            AdjudicatorProvider::Groq => {
                complete_openai_compat(&self.client, GROQ_URL, &self.model, &self.api_key, &prompt)
                    .await
            }
            AdjudicatorProvider::Anthropic => {
                complete_anthropic(&self.client, &self.model, &self.api_key, &prompt).await
            }
        }
    }
}

impl Adjudicator for HttpAdjudicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn adjudicate<'a>(&'a self, request: &'a AdjudicationRequest) -> BoxedAdjudication<'a> {
        Box::pin(async move {
            let prompt = build_prompt(request)?;
            let content = self.complete(prompt).await?;
            parse_answers(&content)
        })
    }
}

/// Instruction text for one request.
pub fn build_prompt(request: &AdjudicationRequest) -> Result<String> {
    let items = serde_json::to_string_pretty(&request.items)?;
    Ok(format!(
        "You check marketplace listings for the category \"{category}\" against the search \
query \"{query}\".\n\
\n\
Rules:\n\
1. A listing is valid only if it is the product itself, in the category \"{category}\", \
and it is exactly the model the query asks for.\n\
2. A different model, generation, series or variant (Ti, Super, Pro, Slim, OLED...) makes \
the listing invalid.\n\
3. Accessories, spare parts, cases, cables, games and stands are invalid.\n\
4. Devices styled as another model (\"in the case of\", \"styled as\") are invalid.\n\
5. Judge the text only. Do not assume facts that are not in the title.\n\
\n\
Answer with a JSON array only, one object per listing:\n\
[{{\"id\": string, \"isValid\": boolean, \"reason\": string, \"certainty\": number}}]\n\
`certainty` is your confidence between 0 and 1. Explain `reason` when isValid is false.\n\
\n\
Listings:\n{items}\n",
        category = request.category,
        query = request.query,
        items = items,
    ))
}

/// Parse the model output into answers.
///
/// Accepts a bare array, or text with an array embedded in it.
pub fn parse_answers(content: &str) -> Result<Vec<Adjudication>> {
    let trimmed = content.trim();
    if let Ok(answers) = serde_json::from_str::<Vec<Adjudication>>(trimmed) {
        return Ok(answers);
    }

    let start = trimmed.find('[');
    let end = trimmed.rfind(']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => serde_json::from_str(&trimmed[s..=e])
            .map_err(|err| Error::Escalation(format!("unparsable answer array: {}", err))),
        _ => Err(Error::Escalation("answer contains no JSON array".into())),
    }
}

/// Reasoning-style OpenAI models take `max_completion_tokens`.
fn uses_completion_tokens(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
}

/// One completion from an OpenAI-compatible API (OpenAI, Groq).
async fn complete_openai_compat(
    client: &Client,
    url: &str,
    model: &str,
    api_key: &str,
    prompt: &str,
) -> Result<String> {
    let mut body = json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
    });
    if uses_completion_tokens(model) {
        body["max_completion_tokens"] = json!(MAX_TOKENS);
    } else {
        body["max_tokens"] = json!(MAX_TOKENS);
        body["temperature"] = json!(0.0);
    }

    debug!("Adjudicating via {} with model {}", url, model);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Http(format!("API error {}: {}", status, body)));
    }

    let parsed: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Error::Http(format!("Invalid response body: {}", e)))?;

    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Escalation("response has no message content".into()))
}

/// One completion from Anthropic's Messages API.
async fn complete_anthropic(
    client: &Client,
    model: &str,
    api_key: &str,
    prompt: &str,
) -> Result<String> {
    let body = json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0.0,
        "max_tokens": MAX_TOKENS,
    });

    debug!("Adjudicating via Anthropic with model {}", model);

    let response = client
        .post(ANTHROPIC_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Http(format!("API error {}: {}", status, body)));
    }

    let parsed: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Error::Http(format!("Invalid response body: {}", e)))?;

    let text: String = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::Escalation("response has no text content".into()));
    }
    Ok(text)
}
