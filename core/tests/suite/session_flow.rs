use crate::suite::support::Reply;
use crate::suite::support::ScriptedBackend;
use crate::suite::support::session;
use crate::suite::support::session_with;
use assert_matches::assert_matches;
use neurodoc_core::AppEvent;
use neurodoc_core::ClientConfig;
use neurodoc_core::HistoryFile;
use neurodoc_core::MemoryPreferenceStore;
use neurodoc_core::Preferences;
use neurodoc_core::SearchHistory;
use neurodoc_core::SearchPhase;
use neurodoc_core::SearchSession;
use neurodoc_core::SessionInit;
use neurodoc_core::UploadFile;
use neurodoc_core::ValidationError;
use neurodoc_core::i18n::bundle;
use neurodoc_protocol::FilterSpec;
use neurodoc_protocol::Locale;
use neurodoc_protocol::LocaleSelection;
use neurodoc_protocol::Theme;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

fn history(session: &SearchSession) -> Vec<&str> {
    session
        .history()
        .entries()
        .iter()
        .map(String::as_str)
        .collect()
}

/// Steps until the displayed text holds `graphemes` characters.
async fn step_until_displayed(session: &mut SearchSession, graphemes: usize) {
    while session.displayed().graphemes(true).count() < graphemes {
        assert!(session.step().await, "event channel closed");
    }
}

#[tokio::test(start_paused = true)]
async fn results_are_shown_and_recorded() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "cats",
        Reply::Json(json!({ "results": [{ "title": "Cat care" }, { "title": "Cat food" }] })),
    );
    let mut session = session(backend.clone());

    let ticket = session.search("cats").unwrap();
    assert_eq!(ticket.query, "cats");
    assert!(session.loading());
    assert_eq!(session.phase(), SearchPhase::Searching);

    session.settle().await;

    assert!(!session.loading());
    assert_eq!(session.phase(), SearchPhase::ResultsShown);
    assert_eq!(session.results().len(), 2);
    assert_eq!(session.results()[0].title(), Some("Cat care"));
    assert_eq!(session.response(), "");
    assert_eq!(session.displayed(), "");
    assert_eq!(history(&session), vec!["cats"]);
    assert_eq!(backend.searches()[0].lang, Locale::En);
}

#[tokio::test(start_paused = true)]
async fn empty_results_reveal_placeholder_without_history() {
    let backend = ScriptedBackend::new();
    backend.reply("older", Reply::Json(json!({ "results": [{ "title": "x" }] })));
    backend.reply("zzqx", Reply::Json(json!({ "results": [] })));
    let mut session = session(backend);
    session.search("older").unwrap();
    session.settle().await;

    session.search("zzqx").unwrap();
    session.settle().await;

    let texts = bundle(Locale::En);
    assert!(session.results().is_empty());
    assert_eq!(session.response(), texts.no_results);
    assert_eq!(session.displayed(), texts.no_results);
    assert_eq!(session.phase(), SearchPhase::Idle);
    assert_eq!(history(&session), vec!["older"]);
}

#[tokio::test(start_paused = true)]
async fn whitespace_query_only_notifies() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend.clone());

    assert_eq!(session.search("   "), Err(ValidationError::EmptyQuery));

    assert!(!session.loading());
    assert_eq!(session.phase(), SearchPhase::Idle);
    assert!(backend.searches().is_empty());
    assert_eq!(session.notifications_posted(), 1);
    assert_eq!(
        session.notification().map(|n| n.message.as_str()),
        Some(bundle(Locale::En).empty_query)
    );
    assert!(session.history().is_empty());

    tokio::time::advance(Duration::from_millis(2000)).await;
    assert_eq!(session.notification(), None);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_shows_connection_placeholder() {
    let backend = ScriptedBackend::new();
    backend.reply("cats", Reply::Error);
    let mut session = session(backend);

    session.search("cats").unwrap();
    session.settle().await;

    assert!(!session.loading());
    assert!(session.results().is_empty());
    assert_eq!(session.response(), bundle(Locale::En).connection_error);
    assert!(session.history().is_empty());
    assert_eq!(session.notifications_posted(), 0);
}

#[tokio::test(start_paused = true)]
async fn superseded_search_never_overwrites_newer_state() {
    let backend = ScriptedBackend::new();
    let release_a = backend.gate("a");
    backend.reply("b", Reply::Json(json!({ "results": [{ "title": "from b" }] })));
    let mut session = session(backend);

    let first = session.search("a").unwrap();
    let second = session.search("b").unwrap();
    assert!(second.generation > first.generation);

    session.settle().await;
    drop(release_a);

    // Even if a stale completion is delivered, it is discarded.
    session.handle_event(AppEvent::SearchSettled {
        generation: first.generation,
        outcome: Ok(serde_json::from_value(json!({ "results": [{ "title": "from a" }] })).unwrap()),
    });

    assert_eq!(session.results().len(), 1);
    assert_eq!(session.results()[0].title(), Some("from b"));
    assert_eq!(session.response(), "");
    assert!(!session.loading());
    assert_eq!(history(&session), vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn stale_error_does_not_replace_results() {
    let backend = ScriptedBackend::new();
    backend.reply("b", Reply::Json(json!({ "results": [{ "title": "from b" }] })));
    let mut session = session(backend);

    let first = session.search("a").unwrap();
    session.search("b").unwrap();
    session.settle().await;

    session.handle_event(AppEvent::SearchSettled {
        generation: first.generation,
        outcome: Err(neurodoc_core::BackendError::Status {
            endpoint: "search",
            status: 500,
            body: String::new(),
        }),
    });
    assert_eq!(session.response(), "");
    assert_eq!(session.results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reveal_grows_one_character_per_tick() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend);
    session.search("nothing").unwrap();

    let mut frames: Vec<String> = Vec::new();
    while session.is_busy() {
        assert!(session.step().await);
        if frames.last().map(String::as_str) != Some(session.displayed()) {
            frames.push(session.displayed().to_string());
        }
    }

    let target = bundle(Locale::En).no_results;
    let expected: Vec<String> = target
        .grapheme_indices(true)
        .map(|(start, grapheme)| target[..start + grapheme.len()].to_string())
        .collect();
    assert_eq!(frames.first().map(String::as_str), Some(""));
    assert_eq!(frames[1..].to_vec(), expected);
    assert_eq!(session.phase(), SearchPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn new_search_cancels_running_reveal() {
    let backend = ScriptedBackend::new();
    let release = backend.gate("cats");
    let mut session = session(backend);

    session.search("zzqx").unwrap();
    step_until_displayed(&mut session, 3).await;
    assert_eq!(session.phase(), SearchPhase::Rendering);

    session.search("cats").unwrap();
    assert_eq!(session.displayed(), "");
    assert_eq!(session.response(), "");
    assert_eq!(session.phase(), SearchPhase::Searching);

    // Let any ticks already queued for the old response drain.
    tokio::time::sleep(Duration::from_millis(200)).await;
    release
        .send(json!({ "results": [{ "title": "Cat care" }] }))
        .unwrap();
    session.settle().await;

    assert_eq!(session.displayed(), "");
    assert_eq!(session.results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn upload_mid_reveal_halts_without_restart() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend.clone());

    session.search("zzqx").unwrap();
    step_until_displayed(&mut session, 3).await;
    let frozen = session.displayed().to_string();

    session.upload(Some(UploadFile::new("doc.pdf", b"%PDF".to_vec())));
    assert!(session.loading());
    assert_eq!(session.uploaded_file(), Some("doc.pdf"));

    session.settle().await;

    assert!(!session.loading());
    assert_eq!(session.displayed(), frozen);
    assert_eq!(backend.uploads(), vec!["doc.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn response_settled_during_upload_reveals_after_it() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend);

    session.upload(Some(UploadFile::new("doc.pdf", Vec::new())));
    session.search("zzqx").unwrap();
    // The search clears the annotation left by the upload.
    assert_eq!(session.uploaded_file(), None);
    session.settle().await;

    assert_eq!(session.displayed(), bundle(Locale::En).no_results);
}

#[tokio::test(start_paused = true)]
async fn upload_failure_is_swallowed() {
    let backend = ScriptedBackend::new();
    backend.fail_uploads();
    let mut session = session(backend.clone());

    session.upload(None);
    assert!(!session.loading());
    assert!(backend.uploads().is_empty());

    session.upload(Some(UploadFile::new("notes.txt", b"hi".to_vec())));
    assert!(session.loading());
    session.settle().await;

    assert!(!session.loading());
    assert_eq!(session.uploaded_file(), Some("notes.txt"));
    assert_eq!(session.notifications_posted(), 0);
    assert_eq!(session.response(), "");
}

#[tokio::test(start_paused = true)]
async fn clearing_history_mid_flight_keeps_reconciliation() {
    let backend = ScriptedBackend::new();
    backend.reply("dogs", Reply::Json(json!({ "results": [{ "title": "d" }] })));
    let release = backend.gate("cats");
    let mut session = session(backend);
    session.search("dogs").unwrap();
    session.settle().await;

    session.search("cats").unwrap();
    session.clear_history();
    assert!(session.history().is_empty());

    release
        .send(json!({ "results": [{ "title": "c" }] }))
        .unwrap();
    session.settle().await;

    assert_eq!(history(&session), vec!["cats"]);
    assert_eq!(session.results()[0].title(), Some("c"));
}

#[tokio::test(start_paused = true)]
async fn clear_input_leaves_history_and_loading() {
    let backend = ScriptedBackend::new();
    backend.reply("cats", Reply::Json(json!({ "results": [{ "title": "c" }] })));
    let release = backend.gate("dogs");
    let mut session = session(backend);
    session.search("cats").unwrap();
    session.settle().await;

    session.set_input("dogs");
    session.submit_input().unwrap();
    session.clear_input();

    assert!(session.loading());
    assert_eq!(session.input(), "");
    assert!(session.results().is_empty());
    assert_eq!(history(&session), vec!["cats"]);

    release.send(json!({ "results": [] })).unwrap();
    session.settle().await;
    assert_eq!(session.response(), bundle(Locale::En).no_results);
}

#[tokio::test(start_paused = true)]
async fn filters_apply_to_the_next_search_only() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend.clone());
    let filters: FilterSpec = serde_json::from_value(json!({ "sort": "date" })).unwrap();

    assert!(session.apply_filters(filters.clone()).is_none());
    assert_eq!(session.pending_filters(), Some(&filters));

    session.set_input("cats");
    // Replacing the pending filter re-runs the search in the input box.
    let issued = session.apply_filters(filters.clone());
    assert_matches!(issued, Some(Ok(_)));
    session.settle().await;

    session.search("cats").unwrap();
    session.settle().await;

    let searches = backend.searches();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[0].filters, Some(filters));
    assert_eq!(searches[1].filters, None);
    assert_eq!(session.pending_filters(), None);
}

#[tokio::test(start_paused = true)]
async fn rejected_search_keeps_pending_filters() {
    let backend = ScriptedBackend::new();
    let mut session = session(backend.clone());
    let filters: FilterSpec = serde_json::from_value(json!({ "page": 2 })).unwrap();

    session.set_input("  ");
    assert_matches!(
        session.apply_filters(filters.clone()),
        Some(Err(ValidationError::EmptyQuery))
    );
    assert_eq!(session.pending_filters(), Some(&filters));
    assert!(backend.searches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn locale_selection_is_persisted_and_sent() {
    let backend = ScriptedBackend::new();
    let store = MemoryPreferenceStore::default();
    let mut session = session_with(backend.clone(), store.clone(), "pl-PL");

    assert_eq!(session.locale_selection(), LocaleSelection::Auto);
    assert_eq!(session.active_locale(), Locale::Pl);
    session.search("koty").unwrap();
    session.settle().await;
    assert_eq!(session.response(), bundle(Locale::Pl).no_results);

    session.select_locale(LocaleSelection::Pinned(Locale::Ar));
    session.select_locale(LocaleSelection::Pinned(Locale::Ar));
    session.set_theme(Theme::Dark);
    assert_eq!(store.save_count(), 2);
    assert_eq!(
        store.current(),
        Preferences {
            locale: LocaleSelection::Pinned(Locale::Ar),
            theme: Theme::Dark,
        }
    );

    assert_eq!(session.search(" "), Err(ValidationError::EmptyQuery));
    assert_eq!(
        session.notification().map(|n| n.message.as_str()),
        Some(bundle(Locale::Ar).empty_query)
    );

    session.search("قطط").unwrap();
    session.settle().await;
    let langs: Vec<Locale> = backend.searches().iter().map(|r| r.lang).collect();
    assert_eq!(langs, vec![Locale::Pl, Locale::Ar]);
}

#[tokio::test(start_paused = true)]
async fn stored_preferences_are_read_at_startup() {
    let store = MemoryPreferenceStore::new(Preferences {
        locale: LocaleSelection::Pinned(Locale::Pl),
        theme: Theme::Dark,
    });
    let session = session_with(ScriptedBackend::new(), store.clone(), "ar-EG");

    assert_eq!(session.active_locale(), Locale::Pl);
    assert_eq!(session.theme(), Theme::Dark);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn replay_moves_entry_to_front_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let file = HistoryFile::new(dir.path().to_path_buf());
    file.save(&SearchHistory::from_entries(
        ["recent", "old"].into_iter().map(str::to_string),
    ))
    .unwrap();

    let backend = ScriptedBackend::new();
    backend.reply("old", Reply::Json(json!({ "results": [{ "title": "o" }] })));
    let mut session = SearchSession::new(SessionInit {
        config: ClientConfig::default(),
        backend,
        preferences: Box::new(MemoryPreferenceStore::default()),
        history_file: Some(file.clone()),
        environment_locale: "en".to_string(),
    });
    assert_eq!(history(&session), vec!["recent", "old"]);

    session.replay_history("old").unwrap();
    assert_eq!(session.input(), "old");
    assert_eq!(history(&session), vec!["recent", "old"]);
    session.settle().await;

    assert_eq!(history(&session), vec!["old", "recent"]);
    assert_eq!(file.load().unwrap().entries(), session.history().entries());

    session.remove_history("recent");
    assert_eq!(file.load().unwrap().entries(), ["old".to_string()]);
}
