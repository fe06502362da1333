use std::fs;

use overlay_engine::{SettingChange, SettingsStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn defaults_apply_when_no_file_exists() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::load(temp.path());
    assert!(store.translation_enabled());
    assert_eq!(store.target_language(), "en");
}

#[test]
fn writes_persist_across_reloads() {
    let temp = TempDir::new().unwrap();
    let store = SettingsStore::load(temp.path());
    store.set_translation_enabled(false);
    store.set_target_language("fr");

    let reloaded = SettingsStore::load(temp.path());
    assert!(!reloaded.translation_enabled());
    assert_eq!(reloaded.target_language(), "fr");
}

#[test]
fn corrupt_settings_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".overlay_settings.ron"), "not ron at all {").unwrap();

    let store = SettingsStore::load(temp.path());
    assert!(store.translation_enabled());
    assert_eq!(store.target_language(), "en");
}

#[test]
fn watch_pushes_every_change_to_every_subscriber() {
    let store = SettingsStore::in_memory();
    let relay_sub = store.watch();
    let popup_sub = store.watch();

    store.set_translation_enabled(false);
    store.set_target_language("de");

    for sub in [&relay_sub, &popup_sub] {
        assert_eq!(sub.try_recv(), Some(SettingChange::TranslationEnabled(false)));
        assert_eq!(
            sub.try_recv(),
            Some(SettingChange::TargetLanguage("de".to_string()))
        );
        assert_eq!(sub.try_recv(), None);
    }
}

#[test]
fn dropping_a_subscription_unsubscribes_it() {
    let store = SettingsStore::in_memory();
    let kept = store.watch();
    let dropped = store.watch();
    drop(dropped);

    store.set_translation_enabled(false);
    assert_eq!(kept.try_recv(), Some(SettingChange::TranslationEnabled(false)));
}

#[test]
fn clones_share_values_and_watchers() {
    let store = SettingsStore::in_memory();
    let sub = store.watch();

    // A write through a clone (e.g. the popup surface) reaches watchers
    // registered through the original.
    let popup = store.clone();
    popup.set_translation_enabled(false);

    assert!(!store.translation_enabled());
    assert_eq!(sub.try_recv(), Some(SettingChange::TranslationEnabled(false)));
}
