// ../tests/tests.rs
use amur_isondo::ai_response::{
    FALLBACK_OPTIONS, fallback_options, parse_options, parse_persona, parse_question_setup,
};
use amur_isondo::game_state::{DEFAULT_CRITERIA, default_context};
use amur_isondo::tags::{TagCategory, balanced_sample, category_of, balanced_random_tags};
use amur_isondo::*;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use strum::IntoEnumIterator;

const FAN_OUT_LEVELS: &str = r#"[
  {"id": "a", "title": "A", "description": "", "question": "qa", "targetTopic": "ta", "persona": "pa",
   "difficulty": "beginner", "category": "introduction"},
  {"id": "b", "title": "B", "description": "", "question": "qb", "targetTopic": "tb", "persona": "pb",
   "difficulty": "beginner", "category": "history", "unlockAfter": "a"},
  {"id": "c", "title": "C", "description": "", "question": "qc", "targetTopic": "tc", "persona": "pc",
   "difficulty": "intermediate", "category": "science", "unlockAfter": "a"},
  {"id": "d", "title": "D", "description": "", "question": "qd", "targetTopic": "td", "persona": "pd",
   "difficulty": "advanced", "category": "philosophy", "unlockAfter": "b"}
]"#;

#[derive(Clone, Default)]
struct MemoryStore {
    saved: Arc<Mutex<Vec<ProgressionState>>>,
}

impl ProgressionStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressionState>, AppError> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }

    fn save(&self, state: &ProgressionState) -> Result<(), AppError> {
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

fn fan_out_tracker() -> (ProgressionTracker, MemoryStore) {
    let catalog = Arc::new(LevelCatalog::from_json(FAN_OUT_LEVELS).expect("valid catalog"));
    let store = MemoryStore::default();
    let tracker = ProgressionTracker::load(catalog, Box::new(store.clone())).expect("tracker");
    (tracker, store)
}

#[test]
fn test_builtin_catalog_is_a_linear_chain() {
    let catalog = LevelCatalog::builtin().expect("bundled levels parse");
    assert_eq!(catalog.levels().len(), 30);
    assert_eq!(catalog.entry_level().map(|l| l.id.as_str()), Some("intro"));

    for pair in catalog.levels().windows(2) {
        assert_eq!(pair[1].unlock_after.as_deref(), Some(pair[0].id.as_str()));
    }

    let last = catalog.levels().last().expect("non-empty");
    assert!(catalog.next_level(&last.id).is_none());
    assert!(catalog.next_level("no-such-level").is_none());
    assert_eq!(
        catalog.next_level("intro").map(|l| l.id.as_str()),
        Some("asking-questions")
    );
}

#[test]
fn test_catalog_rejects_dangling_prerequisite() {
    let json = r#"[
      {"id": "a", "title": "A", "description": "", "question": "q", "targetTopic": "t", "persona": "p",
       "difficulty": "beginner", "category": "history", "unlockAfter": "ghost"}
    ]"#;
    assert!(matches!(
        LevelCatalog::from_json(json),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_session_config_defaults_missing_level_fields() {
    let catalog = LevelCatalog::builtin().expect("bundled levels parse");
    let level = catalog.get("asking-questions").expect("level exists");
    assert!(level.context.is_none());

    let config = SessionConfig::from_level(level, "Tam".to_string(), "Tam, a miller".to_string());
    assert_eq!(config.context, default_context(&level.target_topic));
    assert_eq!(config.question, level.question);
    assert_eq!(config.validation_criteria.len(), 3);

    let mut bare = level.clone();
    bare.validation_criteria = None;
    let config = SessionConfig::from_level(&bare, "Tam".to_string(), String::new());
    assert_eq!(config.validation_criteria, DEFAULT_CRITERIA.map(String::from).to_vec());
}

#[test]
fn test_unlock_fan_out_is_idempotent() {
    let (mut tracker, store) = fan_out_tracker();
    assert!(tracker.is_unlocked("a"));
    assert!(!tracker.is_unlocked("b"));

    let first = tracker.complete("a").expect("a is unlocked");
    assert!(first.newly_completed);
    assert_eq!(first.newly_unlocked, vec!["b".to_string(), "c".to_string()]);
    assert!(tracker.is_unlocked("b") && tracker.is_unlocked("c"));
    assert!(!tracker.is_unlocked("d"));
    assert!(tracker.state().has_rewind_ability);

    let unlocked_after_first = tracker.state().unlocked_level_ids.clone();
    let saves_after_first = store.saved.lock().unwrap().len();

    let second = tracker.complete("a").expect("still fine");
    assert_eq!(second, Completion::default());
    assert_eq!(tracker.state().unlocked_level_ids, unlocked_after_first);
    assert_eq!(store.saved.lock().unwrap().len(), saves_after_first);
}

#[test]
fn test_rewind_ability_is_saved_once() {
    let (mut tracker, store) = fan_out_tracker();
    assert!(!tracker.state().has_rewind_ability);

    tracker.unlock_rewind_ability().expect("unlock rewind");
    let saves = store.saved.lock().unwrap().len();
    assert!(store.saved.lock().unwrap()[saves - 1].has_rewind_ability);

    tracker.unlock_rewind_ability().expect("already held");
    assert_eq!(store.saved.lock().unwrap().len(), saves);
}

#[test]
fn test_locked_level_cannot_be_completed() {
    let (mut tracker, _store) = fan_out_tracker();
    assert!(matches!(tracker.complete("d"), Err(AppError::Validation(_))));
    assert!(matches!(tracker.complete("zzz"), Err(AppError::Validation(_))));
    assert!(!tracker.is_completed("d"));
}

#[test]
fn test_progression_survives_reload() {
    let dir = tempfile::tempdir().expect("temp dir");
    let catalog = Arc::new(LevelCatalog::from_json(FAN_OUT_LEVELS).expect("valid catalog"));

    {
        let mut tracker = ProgressionTracker::load(
            catalog.clone(),
            Box::new(JsonProgressionStore::in_dir(dir.path())),
        )
        .expect("fresh tracker");
        tracker.complete("a").expect("complete a");
        tracker.set_current_level(Some("c")).expect("c unlocked");
    }

    let tracker =
        ProgressionTracker::load(catalog, Box::new(JsonProgressionStore::in_dir(dir.path())))
            .expect("reloaded tracker");
    assert!(tracker.is_completed("a"));
    assert_eq!(tracker.state().current_level_id.as_deref(), Some("c"));
    let ids: Vec<&str> = tracker.unlocked_levels().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let raw = fs::read_to_string(dir.path().join("amur-isondo-game-storage.json"))
        .expect("progression file written");
    assert!(raw.contains("completedLevelIds"));
}

#[test]
fn test_progression_reset_keeps_entry_level() {
    let (mut tracker, _store) = fan_out_tracker();
    tracker.complete("a").expect("complete a");
    tracker.reset().expect("reset");
    assert!(tracker.is_unlocked("a"));
    assert!(!tracker.is_unlocked("b"));
    assert!(!tracker.state().has_rewind_ability);
}

#[test]
fn test_balanced_sample_bounds() {
    let pools: Vec<Vec<u32>> = (0..8).map(|k| (k * 100..k * 100 + 30).collect()).collect();
    let pool_refs: Vec<&[u32]> = pools.iter().map(|p| p.as_slice()).collect();
    let mut rng = rand::rng();

    for count in [0usize, 1, 7, 8, 13, 20, 31] {
        let sample = balanced_sample(&pool_refs, count, &mut rng);
        assert_eq!(sample.len(), count);
        for k in 0..8u32 {
            let from_pool = sample.iter().filter(|v| **v / 100 == k).count();
            assert!(from_pool == count / 8 || from_pool == count / 8 + 1);
        }
    }
}

#[test]
fn test_balanced_sample_stops_at_exhausted_pool() {
    let small: &[u32] = &[1];
    let large: &[u32] = &[10, 11, 12, 13, 14];
    let sample = balanced_sample(&[small, large], 6, &mut rand::rng());
    assert_eq!(sample.len(), 4);
}

#[test]
fn test_random_tag_palette_covers_every_category() {
    let tags = balanced_random_tags(20);
    assert_eq!(tags.len(), 20);

    let mut per_category: HashMap<TagCategory, usize> = HashMap::new();
    for tag in &tags {
        let category = category_of(tag).expect("tag comes from a category");
        *per_category.entry(category).or_default() += 1;
    }
    for category in TagCategory::iter() {
        let n = per_category.get(&category).copied().unwrap_or(0);
        assert!(n == 2 || n == 3, "{} contributed {}", category, n);
    }
}

#[test]
fn test_content_filter_respects_severity() {
    let filter = ContentFilter::builtin().expect("bundled terms compile");

    assert_eq!(filter.filter("Oh heck, what the hell.", 2), "Oh heck, what the hell.");
    assert_eq!(filter.filter("That BLOODY goat!", 2), "That [censored] goat!");
    assert_eq!(filter.filter("That bloody goat!", 3), "That bloody goat!");

    // Whole words only.
    assert_eq!(filter.filter("Hello, classic grass.", 0), "Hello, classic grass.");

    assert!(filter.contains_inappropriate("what a shitty day", 2));
    assert!(!filter.contains_inappropriate("what a lovely day", 0));
}

#[test]
fn test_content_rating() {
    let filter = ContentFilter::builtin().expect("bundled terms compile");
    assert_eq!(filter.rating("A quiet morning by the river"), ContentRating::G);
    assert_eq!(filter.rating("gosh"), ContentRating::G);
    assert_eq!(filter.rating("damn it"), ContentRating::Pg13);
    assert_eq!(filter.rating("you bastard"), ContentRating::R);
    assert_eq!(filter.severity_of("bullshit"), 4);
    assert_eq!(ContentRating::Pg13.to_string(), "PG-13");
}

#[test]
fn test_persona_from_json_fixture() {
    let json_str = fs::read_to_string("tests/dummy_persona_response.json")
        .expect("Failed to read dummy persona JSON file");
    let persona = parse_persona(&json_str);
    assert_eq!(persona.name, "Ama Serwaa");
    assert!(persona.description.starts_with("Ama Serwaa, a patient herbalist"));
}

#[test]
fn test_persona_fallback_extracts_leading_name() {
    let persona = parse_persona("Name, a wise healer who tends the sick in a mountain village.");
    assert_eq!(persona.name, "Name");
    assert_eq!(
        persona.description,
        "Name, a wise healer who tends the sick in a mountain village."
    );

    let persona = parse_persona("{\"name\": broken json");
    assert!(!persona.name.is_empty());
}

#[test]
fn test_options_from_fenced_fixture() {
    let text = fs::read_to_string("tests/dummy_options_response.txt")
        .expect("Failed to read dummy options file");
    let options = parse_options(&text).expect("three options");
    let ids: Vec<OptionId> = options.iter().map(|o| o.id).collect();
    assert_eq!(ids, OptionId::ALL.to_vec());
    assert_eq!(options[1].text, "Why do puddles vanish on sunny days?");
}

#[test]
fn test_fallback_options() {
    let options = fallback_options();
    assert_eq!(options.len(), 3);
    assert_eq!(options[0].id, OptionId::A);
    assert_eq!(options[2].text, FALLBACK_OPTIONS[2]);
}

#[test]
fn test_question_setup_fixture_and_failure() {
    let json_str = fs::read_to_string("tests/dummy_question_setup.json")
        .expect("Failed to read dummy question setup file");
    let setup = parse_question_setup(&json_str).expect("valid setup");
    assert_eq!(setup.target_topic, "plate tectonics");
    assert_eq!(setup.validation_criteria.len(), 3);

    assert!(matches!(
        parse_question_setup("I think the topic is mountains."),
        Err(AppError::Parse { .. })
    ));
    assert!(matches!(
        parse_question_setup(r#"{"targetTopic": "x", "context": "y", "validationCriteria": []}"#),
        Err(AppError::Parse { .. })
    ));
}

#[test]
fn test_transcript_undo_truncation() {
    let mut transcript = Transcript::new();
    transcript.push_character("Ama", "greeting");
    assert!(!transcript.truncate_last_turn());

    transcript.push_user("u1");
    transcript.push_character("Ama", "c1");
    transcript.push_user("u2");
    transcript.push_character("Ama", "c2");
    assert!(transcript.truncate_last_turn());

    let texts: Vec<&str> = transcript.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["greeting", "u1", "c1"]);
    assert_eq!(transcript.player_turns(), 1);

    let history = transcript.to_chat_history();
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert_eq!(history[1].role, ChatRole::User);
}

#[test]
fn test_credentials_expire_after_thirty_days() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CredentialStore::in_dir(dir.path());
    assert_eq!(store.load().expect("no file is fine"), None);

    let issued = Utc::now() - Duration::days(31);
    store.set_at("  sk-old  ", issued).expect("saved");
    assert_eq!(
        store.load_at(issued + Duration::days(29)).expect("readable"),
        Some("sk-old".to_string())
    );

    let reopened = CredentialStore::in_dir(dir.path());
    assert_eq!(reopened.load().expect("readable"), None);
    assert!(!dir.path().join(credentials::CREDENTIAL_FILE).exists());
}

#[test]
fn test_credentials_clear() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CredentialStore::in_dir(dir.path());
    store.set("sk-live").expect("saved");
    assert_eq!(
        CredentialStore::in_dir(dir.path()).load().expect("readable"),
        Some("sk-live".to_string())
    );
    store.clear().expect("cleared");
    assert_eq!(store.load().expect("readable"), None);
}

#[test]
fn test_settings_defaults_and_roundtrip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = Settings::load_from_dir(dir.path()).expect("defaults");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.request_timeout(), std::time::Duration::from_secs(30));

    fs::write(
        dir.path().join("settings.json"),
        r#"{"model": "openai/gpt-4o-mini", "elaborate_on_miss": true}"#,
    )
    .expect("write partial settings");
    let settings = Settings::load_from_dir(dir.path()).expect("partial file");
    assert_eq!(settings.model, "openai/gpt-4o-mini");
    assert!(settings.elaborate_on_miss);
    assert_eq!(settings.max_tokens, 1000);
}
