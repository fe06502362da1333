//! Overlay engine: the privileged background context — capability seams,
//! the translation controller, the relay channel, and watchable settings.
mod capability;
mod channel;
mod controller;
mod persist;
mod settings;

pub use capability::{
    CapabilityError, DownloadProgress, LanguageDetector, LanguagePair, LoggingProgressSink,
    NullCapability, NullDetector, ProgressSink, TranslationCapability, TranslatorHandle,
};
pub use channel::{BackgroundEvent, BackgroundHandle, MessageKind, RelayEnvelope, RequestId};
pub use controller::{TranslationController, DEFAULT_TARGET_LANGUAGE};
pub use persist::{AtomicFileWriter, PersistError};
pub use settings::{SettingChange, SettingsStore, SettingsSubscription};
