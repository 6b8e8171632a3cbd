//! End-to-end command scenarios against the application state
//!
//! These tests drive `AppState` the way the orchestrator does, with in-memory
//! storage and recording speech engines.

use gigvoice::commands::{interpret, Command, CommandInterpreter, Effect, SERVICE_CATEGORIES};
use gigvoice::gigs::{FileStorage, Gig, ListingStore, MemoryStorage, DEFAULT_STORAGE_KEY};
use gigvoice::messages::ChatLog;
use gigvoice::speech::{
    ChannelRecognition, MemorySynthesis, RecognitionConfig, RecognitionEvent, RecognitionResult,
    SpeechInput, SpeechOutput, SynthesisConfig,
};
use gigvoice::ui::{AppState, VoiceStep};

struct TestApp {
    state: AppState,
    synth: MemorySynthesis,
    storage: MemoryStorage,
}

impl TestApp {
    fn new() -> Self {
        Self::with_gigs(&[])
    }

    fn with_gigs(gigs: &[Gig]) -> Self {
        let storage = MemoryStorage::new()
            .with_entry(DEFAULT_STORAGE_KEY, serde_json::to_string(gigs).unwrap());
        let store = ListingStore::load(Box::new(storage.clone()), DEFAULT_STORAGE_KEY);
        let synth = MemorySynthesis::new();
        let output = SpeechOutput::new(
            Box::new(synth.clone()),
            SynthesisConfig::default(),
            ChatLog::new(),
        );
        let input = SpeechInput::new(
            Box::new(ChannelRecognition::new()),
            RecognitionConfig::default(),
        );
        let state = AppState::new(store, output, Some(input))
            .with_interpreter(CommandInterpreter::with_seed(11));
        Self {
            state,
            synth,
            storage,
        }
    }

    fn say(&mut self, transcript: &str) -> Option<String> {
        self.synth.clear();
        let outcome = self.state.handle_transcript(transcript);
        assert_eq!(outcome.reply, self.synth.last_spoken());
        outcome.reply
    }

    fn saved(&self) -> Vec<Gig> {
        serde_json::from_str(&self.storage.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap()
    }

    fn ids(&self) -> Vec<u64> {
        self.state.store.iter().map(|g| g.id).collect()
    }
}

fn gig(id: u64, title: &str) -> Gig {
    Gig::new(id, title, "Someone", "9800000000", 450, "Aaj")
}

#[test]
fn test_plumber_booking_on_empty_collection() {
    let mut app = TestApp::new();

    let reply = app.say("plumber book karo");

    assert_eq!(app.state.store.len(), 1);
    let booked = &app.state.store.gigs()[0];
    assert_eq!(booked.work_title, "Plumber");
    assert_eq!(booked.wage, 500);
    assert_eq!(booked.workers_required, 1);
    assert_eq!(booked.current_workers, 0);
    assert_eq!(reply.as_deref(), Some("plumber book ho gaya! ₹500"));
    assert_eq!(app.saved(), app.state.store.gigs());
}

#[test]
fn test_leak_reuses_existing_plumber_terms() {
    let existing = Gig::new(1, "Plumber", "Ravi", "9811111111", 800, "Kal").with_location("Sector 5");
    let mut app = TestApp::with_gigs(&[existing]);

    app.say("leak fix karo");

    assert_eq!(app.state.store.len(), 2);
    let booked = &app.state.store.gigs()[0];
    assert_eq!(booked.wage, 800);
    assert_eq!(booked.location.as_deref(), Some("Sector 5"));
}

#[test]
fn test_services_lists_titles_and_example() {
    let mut app = TestApp::with_gigs(&[gig(2, "Painter"), gig(1, "Electrician")]);

    let reply = app.say("services dikhao").unwrap();

    assert_eq!(
        reply,
        "Available: Painter, Electrician. Kahiye \"painter book karo\""
    );
    assert_eq!(app.state.store.len(), 2);
}

#[test]
fn test_hello_reports_count() {
    let mut app = TestApp::with_gigs(&[gig(3, "A"), gig(2, "B"), gig(1, "C")]);
    let reply = app.say("hello").unwrap();
    assert!(reply.contains("3 gigs active"), "{}", reply);
}

#[test]
fn test_every_service_keyword_prepends_canonical_title() {
    for category in SERVICE_CATEGORIES {
        for keyword in category.keywords {
            let mut app = TestApp::with_gigs(&[gig(1, "Cook")]);
            app.say(keyword);

            assert_eq!(app.state.store.len(), 2, "keyword {}", keyword);
            assert_eq!(app.state.store.gigs()[0].work_title, category.title());
            assert_eq!(app.state.store.gigs()[1].id, 1);
        }
    }
}

#[test]
fn test_delete_on_empty_is_silent_noop() {
    let mut app = TestApp::new();
    let reply = app.say("delete");
    assert!(reply.is_none());
    assert!(app.state.store.is_empty());
}

#[test]
fn test_delete_removes_one_and_keeps_other_ids() {
    let mut app = TestApp::with_gigs(&[gig(30, "A"), gig(20, "B"), gig(10, "C")]);

    app.say("delete karo");

    assert_eq!(app.ids(), vec![30, 20]);
    assert_eq!(app.saved().len(), 2);
}

#[test]
fn test_delete_last_does_not_undo_latest_booking() {
    let mut app = TestApp::with_gigs(&[gig(10, "Cook")]);
    app.say("painter chahiye");
    let booked = app.state.store.gigs()[0].id;

    app.say("delete");

    assert_eq!(app.ids(), vec![booked]);
}

#[test]
fn test_rule_priority() {
    // Services query outranks booking; no gig is created
    let mut app = TestApp::new();
    app.say("plumber service");
    assert!(app.state.store.is_empty());

    // Booking outranks form, listing, delete and greeting
    assert!(matches!(interpret("plumber post gig"), Command::BookService(_)));
    assert!(matches!(interpret("show electrician"), Command::BookService(_)));
    assert!(matches!(interpret("delete paint"), Command::BookService(_)));
    assert!(matches!(interpret("hi painter"), Command::BookService(_)));
}

#[test]
fn test_cross_category_transcript_books_first_table_entry() {
    let mut app = TestApp::new();
    app.say("fan ka paint");
    assert_eq!(app.state.store.gigs()[0].work_title, "Electrician");

    app.say("pipe aur light");
    assert_eq!(app.state.store.gigs()[0].work_title, "Plumber");
}

#[test]
fn test_form_keyword_opens_form_without_mutation() {
    let mut app = TestApp::new();
    let outcome = app.state.handle_transcript("gig daalo");
    assert_eq!(outcome.effect, Effect::FormOpened);
    assert!(app.state.show_form);
    assert!(app.state.store.is_empty());
}

#[test]
fn test_recognition_result_flows_to_interpreter() {
    let mut app = TestApp::new();
    app.state.toggle_voice();

    let step = app
        .state
        .handle_recognition_event(RecognitionEvent::Result(vec![
            RecognitionResult::interim("bij"),
            RecognitionResult::final_text("बिजली ठीक करो"),
        ]));

    match step {
        VoiceStep::Handled { transcript, outcome } => {
            assert_eq!(transcript, "बिजली ठीक करो");
            assert!(matches!(outcome.effect, Effect::Inserted(_)));
        }
        other => panic!("unexpected step {:?}", other),
    }
    assert_eq!(app.state.store.gigs()[0].work_title, "Electrician");
}

#[test]
fn test_blank_final_result_is_discarded() {
    let mut app = TestApp::new();
    app.state.toggle_voice();
    let chat_before = app.state.chat.len();

    let step = app
        .state
        .handle_recognition_event(RecognitionEvent::Result(vec![RecognitionResult::final_text(
            "  ",
        )]));

    assert_eq!(step, VoiceStep::Nothing);
    assert_eq!(app.state.chat.len(), chat_before);
}

#[test]
fn test_storage_round_trip_preserves_order_and_fields() {
    let dir = std::env::temp_dir().join(format!("gigvoice-it-{}", uuid::Uuid::new_v4()));

    let written = {
        let mut store = ListingStore::load(Box::new(FileStorage::new(&dir)), DEFAULT_STORAGE_KEY);
        let mut interpreter = CommandInterpreter::with_seed(5);
        interpreter.handle("plumber", &mut store, 1_000);
        interpreter.handle("painter", &mut store, 2_000);
        store.insert(gig(3_000, "Cook"));
        store.gigs().to_vec()
    };

    let reloaded = ListingStore::load(Box::new(FileStorage::new(&dir)), DEFAULT_STORAGE_KEY);
    assert_eq!(reloaded.gigs(), written.as_slice());
    assert_eq!(
        reloaded.iter().map(|g| g.id).collect::<Vec<_>>(),
        vec![3_000, 2_000, 1_000]
    );
    assert!(reloaded.gigs()[0].location.is_none());
    assert!(reloaded.gigs()[1].location.is_some());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_chat_log_stays_bounded() {
    let mut app = TestApp::new();
    for _ in 0..20 {
        app.say("kuch karo na");
    }
    assert_eq!(app.state.chat.len(), 11);
    assert_eq!(app.state.recent_chat().len(), 8);
}
