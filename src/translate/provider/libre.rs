use super::{ProviderTranslation, TranslationProvider};
use crate::translate::{Language, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const NAME: &str = "libretranslate";

/// Public LibreTranslate instance, used only once DeepL has given up.
///
/// The endpoint does not reliably echo what it detected, so every result
/// reports `"auto"` and the router falls back to script sniffing.
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'static str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(client: reqwest::Client, url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<ProviderTranslation, ProviderError> {
        let request = LibreTranslateRequest {
            q: text,
            source: "auto",
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(NAME, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(NAME, e))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(NAME, status, &body));
        }

        let parsed: LibreTranslateResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(NAME, format!("unparseable body: {}", e)))?;

        match (parsed.translated_text, parsed.error) {
            (Some(translated_text), _) => Ok(ProviderTranslation {
                translated_text,
                detected_source_lang: "auto".to_string(),
            }),
            (None, Some(error)) => Err(ProviderError::from_status(NAME, status, &error)),
            (None, None) => Err(ProviderError::malformed(NAME, "missing translatedText")),
        }
    }
}
