use overlay_logging::{overlay_debug, overlay_trace};
use thiserror::Error;

/// A source→target language pair, lowercase BCP-47-style tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("capability unavailable")]
    Unavailable,
    #[error("model download failed: {0}")]
    Download(String),
    #[error("language detection failed: {0}")]
    Detection(String),
    #[error("translation failed: {0}")]
    Translation(String),
}

/// Progress of the one-time model download a translator creation may incur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadProgress {
    Started,
    Received { loaded: u64, total: Option<u64> },
    Done,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: DownloadProgress);
}

/// Logs download progress. Progress is observed and logged only; callers
/// await nothing but the final handle.
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn emit(&self, progress: DownloadProgress) {
        match progress {
            DownloadProgress::Started => overlay_debug!("translator model download started"),
            DownloadProgress::Received { loaded, total } => {
                overlay_trace!("translator model download: {} of {:?} bytes", loaded, total);
            }
            DownloadProgress::Done => overlay_debug!("translator model download finished"),
        }
    }
}

/// A created translator for one fixed language pair.
#[async_trait::async_trait]
pub trait TranslatorHandle: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, CapabilityError>;
}

/// The on-device translation capability, behind its create/translate
/// contract.
#[async_trait::async_trait]
pub trait TranslationCapability: Send + Sync {
    /// Cheap synchronous feature probe; must never fail.
    fn is_available(&self) -> bool;

    /// Creates a translator for `pair`. May download model data on first
    /// use; progress goes to `sink`. Callers gate on `is_available` first;
    /// calling anyway rejects and the rejection is contained upstream.
    async fn create(
        &self,
        pair: &LanguagePair,
        sink: &dyn ProgressSink,
    ) -> Result<Box<dyn TranslatorHandle>, CapabilityError>;
}

/// The on-device language-detection capability.
#[async_trait::async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Cheap synchronous feature probe; must never fail.
    fn is_available(&self) -> bool;

    /// Detected language tag for `text`.
    async fn detect(&self, text: &str) -> Result<String, CapabilityError>;
}

/// Stand-in for environments without an on-device translation model.
#[derive(Debug, Default)]
pub struct NullCapability;

#[async_trait::async_trait]
impl TranslationCapability for NullCapability {
    fn is_available(&self) -> bool {
        false
    }

    async fn create(
        &self,
        _pair: &LanguagePair,
        _sink: &dyn ProgressSink,
    ) -> Result<Box<dyn TranslatorHandle>, CapabilityError> {
        Err(CapabilityError::Unavailable)
    }
}

/// Stand-in for environments without on-device language detection.
#[derive(Debug, Default)]
pub struct NullDetector;

#[async_trait::async_trait]
impl LanguageDetector for NullDetector {
    fn is_available(&self) -> bool {
        false
    }

    async fn detect(&self, _text: &str) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable)
    }
}
