use std::sync::Arc;

use overlay_logging::overlay_warn;

use crate::{
    CapabilityError, LanguageDetector, LanguagePair, LoggingProgressSink, TranslationCapability,
};

/// Target used for outbound messages when the caller names none.
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// The privileged-context handler behind the relay channel. Stateless
/// between calls: one call, one independent translation.
pub struct TranslationController {
    capability: Arc<dyn TranslationCapability>,
    detector: Arc<dyn LanguageDetector>,
    native_language: String,
}

impl TranslationController {
    pub fn new(capability: Arc<dyn TranslationCapability>, detector: Arc<dyn LanguageDetector>) -> Self {
        Self {
            capability,
            detector,
            native_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }

    /// Sets the user's native/display language (the target for incoming
    /// chat, the source for outgoing composition).
    pub fn with_native_language(mut self, language: impl Into<String>) -> Self {
        self.native_language = language.into();
        self
    }

    pub fn native_language(&self) -> &str {
        &self.native_language
    }

    /// Inbound chat path: detect the source language, skip text already in
    /// the native language, otherwise translate into it. `None` covers
    /// unavailable capabilities, empty input, same-language input, and any
    /// contained failure; nothing errors across the relay boundary.
    pub async fn handle_chat_message(&self, text: &str) -> Option<String> {
        if !self.capability.is_available() || !self.detector.is_available() {
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match self.chat_translation(text).await {
            Ok(reply) => reply,
            Err(err) => {
                overlay_warn!("chat translation failed: {}", err);
                None
            }
        }
    }

    async fn chat_translation(&self, text: &str) -> Result<Option<String>, CapabilityError> {
        let detected = self.detector.detect(text).await?;
        if detected == self.native_language {
            return Ok(None);
        }
        let pair = LanguagePair::new(detected, self.native_language.clone());
        let translator = self.capability.create(&pair, &LoggingProgressSink).await?;
        Ok(Some(translator.translate(text).await?))
    }

    /// Outbound composition path: no detection step, the text is the
    /// user's own writing in their native language.
    pub async fn handle_input_message(&self, text: &str, target: Option<&str>) -> Option<String> {
        if !self.capability.is_available() {
            return None;
        }
        let target = target.unwrap_or(DEFAULT_TARGET_LANGUAGE);
        let pair = LanguagePair::new(self.native_language.clone(), target);
        match self.input_translation(&pair, text).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                overlay_warn!("input translation failed: {}", err);
                None
            }
        }
    }

    async fn input_translation(
        &self,
        pair: &LanguagePair,
        text: &str,
    ) -> Result<String, CapabilityError> {
        let translator = self.capability.create(pair, &LoggingProgressSink).await?;
        translator.translate(text).await
    }
}
