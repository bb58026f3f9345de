use super::{ProviderTranslation, TranslationProvider};
use crate::translate::{Language, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const NAME: &str = "deepl";

/// DeepL v2 translate endpoint. Detects the source language on every call.
pub struct DeepLProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: Vec<&'a str>,
    target_lang: &'static str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
    detected_source_language: Option<String>,
}

impl DeepLProvider {
    pub fn new(client: reqwest::Client, api_url: &str, api_key: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<ProviderTranslation, ProviderError> {
        let request = DeepLRequest {
            text: vec![text],
            target_lang: target.deepl_code(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
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

        let parsed: DeepLResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(NAME, format!("unparseable body: {}", e)))?;

        let translation = parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(NAME, "response contained no translations"))?;

        Ok(ProviderTranslation {
            translated_text: translation.text,
            detected_source_lang: translation
                .detected_source_language
                .map(|code| code.to_lowercase())
                .unwrap_or_else(|| "auto".to_string()),
        })
    }
}
