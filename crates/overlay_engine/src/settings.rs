use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, Weak};

use overlay_logging::{overlay_error, overlay_info, overlay_warn};
use serde::{Deserialize, Serialize};

use crate::persist::AtomicFileWriter;

const SETTINGS_FILENAME: &str = ".overlay_settings.ron";

/// The two preferences shared by every extension surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedSettings {
    translation_enabled: bool,
    target_language: String,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            translation_enabled: true,
            target_language: "en".to_string(),
        }
    }
}

/// A change pushed to watch subscribers. Fires for every external write,
/// whichever surface made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    TranslationEnabled(bool),
    TargetLanguage(String),
}

type SubscriberId = u64;

struct Inner {
    values: PersistedSettings,
    subscribers: Vec<(SubscriberId, mpsc::Sender<SettingChange>)>,
    next_subscriber: SubscriberId,
}

/// Watchable, persisted settings. Clones share state, so the popup writer
/// and every relay instance observe the same values. Updates are
/// last-write-wins and delivered asynchronously; subscribers need no
/// coordination beyond draining their own receiver.
#[derive(Clone)]
pub struct SettingsStore {
    dir: Option<PathBuf>,
    inner: Arc<Mutex<Inner>>,
}

impl SettingsStore {
    /// Store backed by `{dir}/.overlay_settings.ron`. A missing file means
    /// defaults; an unreadable or unparsable one is logged and means
    /// defaults too.
    pub fn load(dir: &Path) -> Self {
        Self::with_values(Some(dir.to_path_buf()), read_settings(dir))
    }

    /// Store with no backing file, for tests and hostless embedding.
    pub fn in_memory() -> Self {
        Self::with_values(None, PersistedSettings::default())
    }

    fn with_values(dir: Option<PathBuf>, values: PersistedSettings) -> Self {
        Self {
            dir,
            inner: Arc::new(Mutex::new(Inner {
                values,
                subscribers: Vec::new(),
                next_subscriber: 1,
            })),
        }
    }

    pub fn translation_enabled(&self) -> bool {
        self.lock().values.translation_enabled
    }

    pub fn target_language(&self) -> String {
        self.lock().values.target_language.clone()
    }

    pub fn set_translation_enabled(&self, value: bool) {
        let snapshot = {
            let mut inner = self.lock();
            inner.values.translation_enabled = value;
            notify(&mut inner, SettingChange::TranslationEnabled(value));
            inner.values.clone()
        };
        self.persist(&snapshot);
    }

    pub fn set_target_language(&self, value: impl Into<String>) {
        let value = value.into();
        let snapshot = {
            let mut inner = self.lock();
            inner.values.target_language = value.clone();
            notify(&mut inner, SettingChange::TargetLanguage(value));
            inner.values.clone()
        };
        self.persist(&snapshot);
    }

    /// Push-style watch. The subscription unsubscribes when dropped, so a
    /// relay tearing down cannot leak its registration.
    pub fn watch(&self) -> SettingsSubscription {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner.subscribers.push((id, tx));
        SettingsSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
            rx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("lock settings")
    }

    fn persist(&self, values: &PersistedSettings) {
        let Some(dir) = &self.dir else {
            return;
        };
        let pretty = ron::ser::PrettyConfig::new();
        match ron::ser::to_string_pretty(values, pretty) {
            Ok(content) => {
                let writer = AtomicFileWriter::new(dir.clone());
                if let Err(err) = writer.write(SETTINGS_FILENAME, &content) {
                    overlay_error!("Failed to write settings to {:?}: {}", dir, err);
                }
            }
            Err(err) => overlay_error!("Failed to serialize settings: {}", err),
        }
    }
}

fn notify(inner: &mut Inner, change: SettingChange) {
    // Senders whose subscription guard is gone drop out here.
    inner
        .subscribers
        .retain(|(_, tx)| tx.send(change.clone()).is_ok());
}

fn read_settings(dir: &Path) -> PersistedSettings {
    let path = dir.join(SETTINGS_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedSettings::default();
        }
        Err(err) => {
            overlay_warn!("Failed to read settings from {:?}: {}", path, err);
            return PersistedSettings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(values) => {
            overlay_info!("Loaded settings from {:?}", path);
            values
        }
        Err(err) => {
            overlay_warn!("Failed to parse settings from {:?}: {}", path, err);
            PersistedSettings::default()
        }
    }
}

/// Guard for one watch registration.
pub struct SettingsSubscription {
    id: SubscriberId,
    inner: Weak<Mutex<Inner>>,
    rx: mpsc::Receiver<SettingChange>,
}

impl SettingsSubscription {
    pub fn try_recv(&self) -> Option<SettingChange> {
        self.rx.try_recv().ok()
    }
}

impl Drop for SettingsSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                inner.subscribers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
