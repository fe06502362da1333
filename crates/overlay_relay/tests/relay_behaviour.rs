use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use overlay_core::{profile_by_name, RelayPhase, SiteProfile, ANNOTATION_MARKER};
use overlay_dom::{Document, ElementData, NodeId};
use overlay_engine::{
    BackgroundHandle, CapabilityError, LanguageDetector, LanguagePair, ProgressSink,
    SettingsStore, TranslationCapability, TranslationController, TranslatorHandle,
};
use overlay_relay::{MarkerSiteAdapter, SiteTranslatorRelay};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(overlay_logging::initialize_for_tests);
}

/// Counts translate calls so tests can assert exactly how many messages
/// were relayed. Knows one phrase; everything else is echoed.
struct PhrasebookCapability {
    translations: Arc<AtomicUsize>,
}

struct PhrasebookTranslator {
    translations: Arc<AtomicUsize>,
}

#[async_trait]
impl TranslatorHandle for PhrasebookTranslator {
    async fn translate(&self, text: &str) -> Result<String, CapabilityError> {
        self.translations.fetch_add(1, Ordering::SeqCst);
        if text.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok(match text {
            "hello there" => "hola alli".to_string(),
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl TranslationCapability for PhrasebookCapability {
    fn is_available(&self) -> bool {
        true
    }

    async fn create(
        &self,
        _pair: &LanguagePair,
        _sink: &dyn ProgressSink,
    ) -> Result<Box<dyn TranslatorHandle>, CapabilityError> {
        Ok(Box::new(PhrasebookTranslator {
            translations: self.translations.clone(),
        }))
    }
}

struct EnglishChatDetector;

#[async_trait]
impl LanguageDetector for EnglishChatDetector {
    fn is_available(&self) -> bool {
        true
    }

    async fn detect(&self, _text: &str) -> Result<String, CapabilityError> {
        Ok("en".to_string())
    }
}

struct Fixture {
    doc: Document,
    relay: SiteTranslatorRelay,
    settings: SettingsStore,
    translations: Arc<AtomicUsize>,
    chat_root: NodeId,
}

fn fvm_profile() -> SiteProfile {
    profile_by_name("fvm").expect("fvm profile")
}

fn mount_on_page(page: &str) -> Fixture {
    init_logging();
    let mut doc = Document::from_html(page);
    let settings = SettingsStore::in_memory();
    let translations = Arc::new(AtomicUsize::new(0));
    let controller = TranslationController::new(
        Arc::new(PhrasebookCapability {
            translations: translations.clone(),
        }),
        Arc::new(EnglishChatDetector),
    )
    // Spanish-native viewer reading an English-language room.
    .with_native_language("es");
    let background = BackgroundHandle::new(controller);
    let profile = fvm_profile();
    let adapter = Box::new(MarkerSiteAdapter::for_profile(&profile));
    let relay = SiteTranslatorRelay::mount(&mut doc, profile, adapter, background, &settings);
    let chat_root = doc
        .find_by_marker("msg-list-fvm")
        .first()
        .copied()
        .unwrap_or_else(|| doc.root());
    Fixture {
        doc,
        relay,
        settings,
        translations,
        chat_root,
    }
}

fn mount() -> Fixture {
    mount_on_page(
        r#"<div class="room">
            <div class="sidebar user-list"></div>
            <div class="chat-col msg-list-fvm"></div>
        </div>"#,
    )
}

/// Appends one chat message the way the fvm site renders them: container →
/// row → [nick, body], text at firstChild.lastChild.
fn append_message(fx: &mut Fixture, text: &str) -> NodeId {
    append_message_with_classes(fx, text, "chat-msg")
}

fn append_message_with_classes(fx: &mut Fixture, text: &str, classes: &str) -> NodeId {
    let msg = fx
        .doc
        .append_child(fx.chat_root, ElementData::new("div").with_classes(classes))
        .expect("chat root is live");
    let row = fx
        .doc
        .append_child(msg, ElementData::new("div").with_classes("msg-row"))
        .unwrap();
    let _ = fx
        .doc
        .append_child(row, ElementData::new("span").with_classes("nick").with_text("ana"));
    let _ = fx
        .doc
        .append_child(row, ElementData::new("span").with_classes("body").with_text(text));
    msg
}

fn pump_until(fx: &mut Fixture, pred: impl Fn(&Document) -> bool) {
    for _ in 0..500 {
        fx.relay.pump(&mut fx.doc);
        if pred(&fx.doc) {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached");
}

fn settle(fx: &mut Fixture) {
    for _ in 0..50 {
        fx.relay.pump(&mut fx.doc);
        thread::sleep(Duration::from_millis(2));
    }
}

fn annotations(doc: &Document) -> Vec<NodeId> {
    doc.find_by_marker(ANNOTATION_MARKER)
}

#[test]
fn new_chat_message_gets_an_adjacent_translated_annotation() {
    let mut fx = mount();
    let msg = append_message(&mut fx, "hello there");
    fx.doc.flush();

    pump_until(&mut fx, |doc| !annotations(doc).is_empty());

    let notes = annotations(&fx.doc);
    assert_eq!(notes.len(), 1);
    assert_eq!(fx.doc.next_sibling(msg), Some(notes[0]));
    let note = fx.doc.element(notes[0]).unwrap();
    assert_eq!(note.text(), "hola alli");
    assert_eq!(note.style(), "background-color: #fff3c4");
}

#[test]
fn injected_annotations_never_feed_back_into_the_relay() {
    let mut fx = mount();
    append_message(&mut fx, "hello there");
    fx.doc.flush();
    pump_until(&mut fx, |doc| !annotations(doc).is_empty());

    // The injection itself mutated the chat root; deliver and process that
    // batch too.
    fx.doc.flush();
    settle(&mut fx);

    assert_eq!(fx.translations.load(Ordering::SeqCst), 1);
    assert_eq!(annotations(&fx.doc).len(), 1);
}

#[test]
fn burst_of_messages_each_get_their_own_annotation() {
    let mut fx = mount();
    let first = append_message(&mut fx, "hello there");
    let second = append_message(&mut fx, "good evening all");
    fx.doc.flush();

    pump_until(&mut fx, |doc| annotations(doc).len() == 2);

    let first_note = fx.doc.next_sibling(first).unwrap();
    assert_eq!(fx.doc.element(first_note).unwrap().text(), "hola alli");
    let second_note = fx.doc.next_sibling(second).unwrap();
    assert_eq!(
        fx.doc.element(second_note).unwrap().text(),
        "good evening all"
    );
    assert_eq!(fx.translations.load(Ordering::SeqCst), 2);
}

#[test]
fn room_notices_are_not_relayed() {
    let mut fx = mount();
    append_message_with_classes(&mut fx, "user123 has joined", "chat-msg room-notice-fvm");
    fx.doc.flush();
    settle(&mut fx);

    assert_eq!(fx.translations.load(Ordering::SeqCst), 0);
    assert!(annotations(&fx.doc).is_empty());
}

#[test]
fn error_banners_are_not_relayed() {
    let mut fx = mount();
    append_message_with_classes(&mut fx, "connection lost", "chat-msg chat-error");
    fx.doc.flush();
    settle(&mut fx);

    assert_eq!(fx.translations.load(Ordering::SeqCst), 0);
    assert!(annotations(&fx.doc).is_empty());
}

#[test]
fn flag_flip_gates_only_later_batches() {
    let mut fx = mount();
    append_message(&mut fx, "hello there");
    fx.doc.flush();
    pump_until(&mut fx, |doc| annotations(doc).len() == 1);

    // Popup turns the feature off mid-session.
    fx.settings.set_translation_enabled(false);
    append_message(&mut fx, "missed while off");
    fx.doc.flush();
    settle(&mut fx);
    assert_eq!(fx.translations.load(Ordering::SeqCst), 1);
    assert_eq!(annotations(&fx.doc).len(), 1);

    // Re-enabling does not retroactively process the missed batch.
    fx.settings.set_translation_enabled(true);
    settle(&mut fx);
    assert_eq!(fx.translations.load(Ordering::SeqCst), 1);

    append_message(&mut fx, "seen after re-enable");
    fx.doc.flush();
    pump_until(&mut fx, |doc| annotations(doc).len() == 2);
    assert_eq!(fx.translations.load(Ordering::SeqCst), 2);
}

#[test]
fn repeated_mount_unmount_never_stacks_observers() {
    init_logging();
    let mut doc = Document::from_html(r#"<div class="chat-col msg-list-fvm"></div>"#);
    let settings = SettingsStore::in_memory();

    for _ in 0..5 {
        let profile = fvm_profile();
        let controller = TranslationController::new(
            Arc::new(PhrasebookCapability {
                translations: Arc::new(AtomicUsize::new(0)),
            }),
            Arc::new(EnglishChatDetector),
        );
        let mut relay = SiteTranslatorRelay::mount(
            &mut doc,
            profile,
            Box::new(MarkerSiteAdapter::for_profile(&profile)),
            BackgroundHandle::new(controller),
            &settings,
        );
        assert_eq!(doc.observer_count(), 1);
        assert_eq!(relay.view().phase, RelayPhase::Watching);
        relay.unmount(&mut doc);
        assert_eq!(doc.observer_count(), 0);
        assert_eq!(relay.view().phase, RelayPhase::Unmounted);
    }
}

#[test]
fn missing_chat_root_is_inert_until_remount_finds_it() {
    let mut fx = mount_on_page(r#"<div class="room"></div>"#);
    assert_eq!(fx.relay.view().phase, RelayPhase::Idle);
    assert_eq!(fx.doc.observer_count(), 0);
    // Pumping an inert relay is harmless.
    fx.relay.pump(&mut fx.doc);

    // The site renders its chat widget late.
    let room = fx.doc.find_by_marker("room")[0];
    let chat = fx
        .doc
        .append_child(
            room,
            ElementData::new("div").with_classes("chat-col msg-list-fvm"),
        )
        .unwrap();
    fx.chat_root = chat;
    fx.relay.remount(&mut fx.doc);
    assert_eq!(fx.relay.view().phase, RelayPhase::Watching);
    assert_eq!(fx.doc.observer_count(), 1);

    append_message(&mut fx, "hello there");
    fx.doc.flush();
    pump_until(&mut fx, |doc| !annotations(doc).is_empty());
    assert_eq!(fx.translations.load(Ordering::SeqCst), 1);
}

#[test]
fn reply_arriving_after_unmount_is_dropped() {
    let mut fx = mount();
    // The slow phrase keeps the reply in flight past the unmount below.
    append_message(&mut fx, "slow hello");
    fx.doc.flush();
    // One pump dispatches the request; the reply has not arrived yet.
    fx.relay.pump(&mut fx.doc);
    assert_eq!(fx.relay.view().pending_translations, 1);

    fx.relay.unmount(&mut fx.doc);
    settle(&mut fx);

    assert!(annotations(&fx.doc).is_empty());
    assert_eq!(fx.relay.view().pending_translations, 0);
}
