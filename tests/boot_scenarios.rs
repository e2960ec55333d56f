mod common;

use std::time::Duration;

use common::{names, BackendScript, TestHarness};
use studio_shell::{bootstrap::BootOutcome, message_channel::ShellEvent, UserIdentity, WindowRole};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn backend_never_ready_quits_with_fatal_reason_and_no_windows() {
    let harness = TestHarness::new(BackendScript {
        live: true,
        ready: false,
        ..BackendScript::default()
    });
    let started = Instant::now();
    assert!(!harness.shell.allows_runtime_exit(None));

    let outcome = harness.shell.run_boot().await;

    assert_eq!(outcome, None);
    assert!(started.elapsed() >= Duration::from_secs(12));
    assert!(started.elapsed() < Duration::from_secs(13));
    // The splash appeared while waiting and is gone again.
    assert_eq!(harness.host.created_count(WindowRole::Splash), 1);
    assert!(harness.host.visible().is_empty());
    assert!(harness.host.log().alive.is_empty());

    let log = harness.host.log();
    assert_eq!(log.exit_codes, vec![1]);
    assert_eq!(log.fatal_errors.len(), 1);
    assert!(log.fatal_errors[0].contains("12000ms"));
    drop(log);
    assert_eq!(harness.stops(), 1);
    assert!(harness.shell.allows_runtime_exit(None));
}

#[tokio::test(start_paused = true)]
async fn fatal_dialog_is_shown_while_windows_still_exist() {
    let harness = TestHarness::new(BackendScript::default());

    harness.shell.run_boot().await;

    let log = harness.host.log();
    let (alive, visible) = log.dialog_snapshot.clone().expect("fatal dialog was not shown");
    // The runtime exits by itself once no window is left, so the windows are
    // hidden for the dialog and only destroyed afterwards.
    assert!(alive.contains(&WindowRole::Main));
    assert!(visible.is_empty());
    assert!(log.alive.is_empty());
    assert_eq!(log.exit_codes, vec![1]);
}

#[tokio::test(start_paused = true)]
async fn fast_backend_skips_the_splash() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));

    let outcome = harness.shell.run_boot().await;

    assert_eq!(outcome, Some(BootOutcome::Picker));
    assert_eq!(harness.host.created_count(WindowRole::Splash), 0);
}

#[tokio::test(start_paused = true)]
async fn setup_needed_shows_wizard_and_user_close_quits() {
    let harness = TestHarness::new(BackendScript {
        live: true,
        ready: true,
        needs_user_action: true,
        ..BackendScript::default()
    });

    let outcome = harness.shell.run_boot().await;
    assert_eq!(outcome, Some(BootOutcome::SetupWizard));
    assert_eq!(harness.host.created_count(WindowRole::Picker), 0);
    // Revealed once its content is there.
    assert!(!harness.host.visible().contains(&WindowRole::SetupWizard));
    harness.page_loaded(WindowRole::SetupWizard).await;
    assert!(harness.host.visible().contains(&WindowRole::SetupWizard));

    harness.user_closes(WindowRole::SetupWizard).await;

    assert_eq!(harness.host.log().exit_codes, vec![0]);
    assert_eq!(harness.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn finished_setup_closes_wizard_without_quitting_and_opens_picker() {
    let harness = TestHarness::new(BackendScript {
        needs_user_action: true,
        ..BackendScript::ready_with_users(&["Alice"])
    });
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::SetupWizard).await;

    assert!(harness.shell.close_init_window(WindowRole::SetupWizard).await.unwrap());
    // The host reports the programmatic close afterwards.
    harness.shell.on_window_closed(WindowRole::SetupWizard).await;

    assert!(harness.host.log().exit_codes.is_empty());
    assert_eq!(harness.host.created_count(WindowRole::Picker), 1);
    assert!(!harness.shell.close_init_window(WindowRole::SetupWizard).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn picker_gets_exactly_the_ready_users_and_choice_reveals_main_after_load() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice", "Bob"]));

    let outcome = harness.shell.run_boot().await;
    assert_eq!(outcome, Some(BootOutcome::Picker));
    // Users came with the status payload; no extra fetch.
    assert_eq!(harness.api.count("list_users"), 0);

    // Held back until the picker page is loaded.
    assert!(harness.host.events_for(WindowRole::Picker).is_empty());
    harness.page_loaded(WindowRole::Picker).await;
    let picker_events = harness.host.events_for(WindowRole::Picker);
    assert_eq!(picker_events.len(), 1);
    let ShellEvent::Users(users) = &picker_events[0] else {
        panic!("picker expected a users event");
    };
    assert_eq!(names(users), vec!["Alice", "Bob"]);

    harness.page_loaded(WindowRole::Main).await;
    assert!(!harness.host.visible().contains(&WindowRole::Main));

    assert!(harness.shell.choose_user(WindowRole::Picker, "Alice").await.unwrap());

    assert_eq!(harness.api.count("set_active_user:Alice"), 1);
    let visible = harness.host.visible();
    assert!(visible.contains(&WindowRole::Main));
    assert!(!visible.contains(&WindowRole::Picker));
    assert!(!visible.contains(&WindowRole::Splash));
    assert!(!harness.host.log().alive.contains(&WindowRole::Picker));
    assert_eq!(
        harness.shell.session().active_user(),
        Some(UserIdentity::named("Alice"))
    );

    // Main reloads for the new session; the user arrives only after that load.
    assert!(harness.host.events_for(WindowRole::Main).is_empty());
    harness.page_loaded(WindowRole::Main).await;
    assert_eq!(
        harness.host.events_for(WindowRole::Main),
        vec![ShellEvent::ActiveUser(UserIdentity::named("Alice"))]
    );
}

#[tokio::test(start_paused = true)]
async fn choice_before_main_finished_loading_is_delivered_on_first_load() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;

    harness.shell.choose_user(WindowRole::Picker, "Alice").await.unwrap();
    assert!(harness.host.events_for(WindowRole::Main).is_empty());

    harness.page_loaded(WindowRole::Main).await;
    assert_eq!(harness.host.events_for(WindowRole::Main).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn users_are_fetched_when_status_payload_has_none() {
    let harness = TestHarness::new(BackendScript {
        status_users: None,
        ..BackendScript::ready_with_users(&["Carol"])
    });

    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;

    assert_eq!(harness.api.count("list_users"), 1);
    assert_eq!(
        harness.host.events_for(WindowRole::Picker),
        vec![ShellEvent::Users(vec![UserIdentity::named("Carol")])]
    );
}

#[tokio::test(start_paused = true)]
async fn at_most_one_window_per_role_through_boot_and_choice() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice", "Bob"]));
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;
    harness.shell.choose_user(WindowRole::Picker, "Bob").await.unwrap();
    harness.shell.open_preferences(Some(WindowRole::Main)).await.unwrap();
    harness.shell.open_preferences(None).await.unwrap();

    for role in WindowRole::ALL {
        assert!(harness.host.created_count(role) <= 1, "{role} created twice");
    }
}
