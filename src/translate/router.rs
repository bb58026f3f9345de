use super::{
    sniff_script, DetectedLanguage, Direction, Language, PipelineError, RetryController,
    TranslationRequest, TranslationResult,
};
use tracing::debug;

/// A translation together with the direction it was made in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedTranslation {
    pub direction: Direction,
    pub result: TranslationResult,
}

impl RoutedTranslation {
    /// Text sent back to the chat: direction marker, a space, the translation.
    pub fn reply_text(&self) -> String {
        format!("{} {}", self.direction.marker(), self.result.translated_text)
    }
}

/// Decides whether a message is Russian, Chinese or neither, and translates
/// it into the other language.
///
/// One provider call does both jobs: the router guesses a target from the
/// script, translates, and reads the detected source off the result. Only when
/// the guess was wrong (the detected source equals the guessed target) is a
/// second call made.
///
/// Text with neither Cyrillic nor CJK characters gets a single primary call
/// and is dropped if that call fails.
pub struct LanguageRouter {
    controller: RetryController,
}

impl LanguageRouter {
    pub fn new(controller: RetryController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &RetryController {
        &self.controller
    }

    /// `Ok(None)` means the text is in neither supported language.
    pub async fn route(&self, text: &str) -> Result<Option<RoutedTranslation>, PipelineError> {
        let script = sniff_script(text);
        let guessed_target = match script {
            Some(Language::Chinese) => Language::Russian,
            _ => Language::Chinese,
        };

        let request = TranslationRequest::new(text, guessed_target);
        let first = match script {
            Some(_) => self.controller.translate_with_retry(&request).await?,
            // Only live detection can route script-less text, and the fallback
            // has none: one primary call, no retries, no failover
            None => match self.controller.translate_primary_once(&request).await {
                Ok(result) => result,
                Err(e) => {
                    debug!("Skipping script-less message, detection unavailable: {}", e);
                    return Ok(None);
                }
            },
        };

        let source = match DetectedLanguage::from_code(&first.detected_source_lang) {
            // No live detection (fallback answered): trust the script
            DetectedLanguage::Unreported => script,
            detected => detected.language(),
        };

        let Some(source) = source else {
            debug!(
                "Skipping message in unsupported language (detected: {})",
                first.detected_source_lang
            );
            return Ok(None);
        };

        let direction = Direction::from_source(source);
        if direction.target() == guessed_target {
            return Ok(Some(RoutedTranslation {
                direction,
                result: first,
            }));
        }

        debug!(
            "Script guess was wrong, re-translating as {}",
            direction.marker()
        );
        let result = self
            .controller
            .translate_with_retry(&TranslationRequest::new(text, direction.target()))
            .await?;

        Ok(Some(RoutedTranslation { direction, result }))
    }
}
