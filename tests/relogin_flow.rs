mod common;

use std::time::Duration;

use common::{BackendScript, TestHarness};
use studio_shell::{
    message_channel::{HideAndOpenOptions, ShellEvent},
    ShellError, UserIdentity, WindowRole, ROBUST_HIDE_MAX_WAIT,
};
use tokio::time::{sleep, Instant};

async fn logged_in(names: &[&str], user: &str) -> TestHarness {
    let harness = TestHarness::new(BackendScript::ready_with_users(names));
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;
    harness.page_loaded(WindowRole::Main).await;
    assert!(harness.shell.choose_user(WindowRole::Picker, user).await.unwrap());
    harness.page_loaded(WindowRole::Main).await;
    harness
}

fn position(calls: &[String], call: &str) -> Option<usize> {
    calls.iter().position(|recorded| recorded == call)
}

#[tokio::test(start_paused = true)]
async fn relogin_with_logout_ends_session_before_listing_users() {
    let harness = logged_in(&["Alice", "Bob"], "Alice").await;
    let before = harness.api.calls().len();

    let result = harness
        .shell
        .hide_and_open_picker(WindowRole::Main, HideAndOpenOptions { do_logout: true })
        .await;

    assert!(result.ok);
    let calls = harness.api.calls()[before..].to_vec();
    let logout = position(&calls, "logout").expect("logout was not called");
    let listed = position(&calls, "list_users").expect("users were not listed");
    assert!(logout < listed);
    assert_eq!(harness.shell.session().active_user(), None);

    let visible = harness.host.visible();
    assert!(!visible.contains(&WindowRole::Main));
    assert!(visible.contains(&WindowRole::Picker));
    assert_eq!(harness.host.created_count(WindowRole::Picker), 2);
    // Main stays around hidden for the next session.
    assert!(harness.host.log().alive.contains(&WindowRole::Main));
}

#[tokio::test(start_paused = true)]
async fn relogin_without_logout_keeps_backend_session() {
    let harness = logged_in(&["Alice"], "Alice").await;

    harness
        .shell
        .hide_and_open_picker(WindowRole::Main, HideAndOpenOptions { do_logout: false })
        .await;

    assert_eq!(harness.api.count("logout"), 0);
    assert_eq!(
        harness.shell.session().active_user(),
        Some(UserIdentity::named("Alice"))
    );
}

#[test]
fn relogin_logs_out_unless_told_otherwise() {
    assert!(HideAndOpenOptions::default().do_logout);
}

#[tokio::test(start_paused = true)]
async fn overlapping_relogin_requests_open_one_picker() {
    let harness = logged_in(&["Alice"], "Alice").await;
    let options = || HideAndOpenOptions { do_logout: true };

    let (first, second) = tokio::join!(
        harness.shell.hide_and_open_picker(WindowRole::Main, options()),
        harness.shell.hide_and_open_picker(WindowRole::Main, options()),
    );
    assert!(first.ok && second.ok);
    harness
        .shell
        .hide_and_open_picker(WindowRole::Main, options())
        .await;

    // One picker at boot, one for the re-login.
    assert_eq!(harness.host.created_count(WindowRole::Picker), 2);
    assert!(harness.host.log().alive.contains(&WindowRole::Picker));
}

#[tokio::test(start_paused = true)]
async fn relogin_as_other_user_delivers_new_identity_after_reload() {
    let harness = logged_in(&["Alice", "Bob"], "Alice").await;
    harness
        .shell
        .hide_and_open_picker(WindowRole::Main, HideAndOpenOptions::default())
        .await;
    harness.page_loaded(WindowRole::Picker).await;

    assert!(harness.shell.choose_user(WindowRole::Picker, "Bob").await.unwrap());
    harness.page_loaded(WindowRole::Main).await;

    assert_eq!(
        harness.host.events_for(WindowRole::Main),
        vec![
            ShellEvent::ActiveUser(UserIdentity::named("Alice")),
            ShellEvent::ActiveUser(UserIdentity::named("Bob")),
        ]
    );
    assert!(harness.host.visible().contains(&WindowRole::Main));
}

#[tokio::test(start_paused = true)]
async fn relogin_closes_preferences() {
    let harness = logged_in(&["Alice"], "Alice").await;
    harness.shell.open_preferences(Some(WindowRole::Main)).await.unwrap();
    assert!(harness.host.log().alive.contains(&WindowRole::Preferences));

    harness
        .shell
        .hide_and_open_picker(WindowRole::Preferences, HideAndOpenOptions::default())
        .await;

    assert!(!harness.host.log().alive.contains(&WindowRole::Preferences));
}

#[tokio::test(start_paused = true)]
async fn preferences_is_a_single_window() {
    let harness = logged_in(&["Alice"], "Alice").await;

    harness.shell.open_preferences(Some(WindowRole::Main)).await.unwrap();
    harness.page_loaded(WindowRole::Preferences).await;
    harness.shell.open_preferences(Some(WindowRole::Main)).await.unwrap();
    harness.shell.open_preferences(None).await.unwrap();

    assert_eq!(harness.host.created_count(WindowRole::Preferences), 1);
    assert!(harness.host.visible().contains(&WindowRole::Preferences));
}

#[tokio::test(start_paused = true)]
async fn closing_the_last_visible_window_quits_once() {
    let harness = logged_in(&["Alice"], "Alice").await;

    harness.user_closes(WindowRole::Main).await;
    harness.shell.request_exit(0).await;
    harness.shell.shutdown().await;

    assert_eq!(harness.host.log().exit_codes, vec![0]);
    assert_eq!(harness.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn closing_preferences_keeps_running() {
    let harness = logged_in(&["Alice"], "Alice").await;
    harness.shell.open_preferences(Some(WindowRole::Main)).await.unwrap();
    harness.page_loaded(WindowRole::Preferences).await;

    harness.user_closes(WindowRole::Preferences).await;

    assert!(harness.host.log().exit_codes.is_empty());
    assert_eq!(harness.stops(), 0);
}

#[tokio::test(start_paused = true)]
async fn main_window_cannot_pick_a_user() {
    let harness = logged_in(&["Alice", "Bob"], "Alice").await;

    let result = harness.shell.choose_user(WindowRole::Main, "Bob").await;

    assert!(matches!(result, Err(ShellError::Forbidden { role: WindowRole::Main, .. })));
    assert_eq!(harness.api.count("set_active_user:Bob"), 0);
    assert!(harness.shell.quit(WindowRole::Main).await.is_err());
    assert!(harness.host.log().exit_codes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn splash_has_no_bridge_verbs() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));

    assert!(harness.shell.refresh_users(WindowRole::Splash).await.is_err());
    assert!(harness.shell.pick_folder(WindowRole::Splash, None, None).await.is_err());
    assert!(!harness
        .shell
        .hide_and_open_picker(WindowRole::Splash, HideAndOpenOptions::default())
        .await
        .ok);
    assert!(harness.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_user_is_refused_after_one_refresh() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));
    harness.shell.run_boot().await;

    let result = harness.shell.choose_user(WindowRole::Picker, "Mallory").await;

    assert!(matches!(result, Err(ShellError::UnknownUser(name)) if name == "Mallory"));
    assert_eq!(harness.api.count("list_users"), 1);
    assert!(harness.api.calls().iter().all(|call| !call.starts_with("set_active_user")));
}

#[tokio::test(start_paused = true)]
async fn user_added_after_boot_is_found_by_refresh() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));
    harness.shell.run_boot().await;
    harness.api.script.lock().unwrap().users.push(UserIdentity::named("Dana"));

    assert!(harness.shell.choose_user(WindowRole::Picker, " Dana ").await.unwrap());
    assert_eq!(harness.api.count("set_active_user:Dana"), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_login_keeps_picker_and_refreshes_it() {
    let harness = TestHarness::new(BackendScript {
        accept_login: false,
        ..BackendScript::ready_with_users(&["Alice"])
    });
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;

    let accepted = harness.shell.choose_user(WindowRole::Picker, "Alice").await.unwrap();

    assert!(!accepted);
    assert!(harness.host.visible().contains(&WindowRole::Picker));
    assert!(!harness.host.visible().contains(&WindowRole::Main));
    assert_eq!(harness.host.events_for(WindowRole::Picker).len(), 2);
    assert_eq!(harness.shell.session().active_user(), None);
}

#[tokio::test(start_paused = true)]
async fn picker_quit_exits_cleanly() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));
    harness.shell.run_boot().await;

    harness.shell.quit(WindowRole::Picker).await.unwrap();

    assert_eq!(harness.host.log().exit_codes, vec![0]);
    assert_eq!(harness.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn folder_dialog_ignores_relative_default_path() {
    let harness = TestHarness::new(BackendScript::ready_with_users(&["Alice"]));
    let existing = std::env::temp_dir();

    let picked = harness
        .shell
        .pick_folder(WindowRole::Main, Some("Export"), Some("relative/dir"))
        .await
        .unwrap();
    assert_eq!(picked, None);

    let picked = harness
        .shell
        .pick_folder(WindowRole::Main, None, existing.to_str())
        .await
        .unwrap();
    assert_eq!(picked, Some(existing));
}

#[tokio::test(start_paused = true)]
async fn content_fault_reloads_the_window_after_confirmation() {
    let harness = logged_in(&["Alice"], "Alice").await;
    assert!(harness.shell.windows().lock().await.is_loaded(WindowRole::Main));

    harness
        .shell
        .on_content_fault(WindowRole::Main, "render process gone")
        .await;

    assert!(!harness.shell.windows().lock().await.is_loaded(WindowRole::Main));
    assert!(harness.host.log().exit_codes.is_empty());
    assert!(harness.host.visible().contains(&WindowRole::Main));
}

#[tokio::test(start_paused = true)]
async fn double_choice_activates_the_user_once() {
    let harness = TestHarness::new(BackendScript {
        login_delay: Some(Duration::from_millis(300)),
        ..BackendScript::ready_with_users(&["Alice"])
    });
    harness.shell.run_boot().await;
    harness.page_loaded(WindowRole::Picker).await;
    harness.page_loaded(WindowRole::Main).await;

    let (first, second) = tokio::join!(
        harness.shell.choose_user(WindowRole::Picker, "Alice"),
        harness.shell.choose_user(WindowRole::Picker, "Alice"),
    );

    assert!(first.unwrap() && second.unwrap());
    assert_eq!(harness.api.count("set_active_user:Alice"), 1);
    harness.page_loaded(WindowRole::Main).await;
    assert_eq!(harness.host.events_for(WindowRole::Main).len(), 1);

    // Once settled, a later choice goes through again.
    harness.shell.choose_user(WindowRole::Picker, "Alice").await.unwrap();
    assert_eq!(harness.api.count("set_active_user:Alice"), 2);
}

#[tokio::test(start_paused = true)]
async fn window_events_are_handled_while_main_refuses_to_hide() {
    let harness = logged_in(&["Alice"], "Alice").await;
    harness.host.log().sticky.insert(WindowRole::Main);
    let started = Instant::now();

    let (result, handled_after) = tokio::join!(
        harness
            .shell
            .hide_and_open_picker(WindowRole::Main, HideAndOpenOptions::default()),
        async {
            sleep(Duration::from_millis(100)).await;
            harness.page_loaded(WindowRole::Main).await;
            let elapsed = started.elapsed();
            // The picker only appears once the hide attempt is over.
            assert_eq!(harness.host.created_count(WindowRole::Picker), 1);
            elapsed
        },
    );

    assert!(result.ok);
    assert!(handled_after < Duration::from_millis(200));
    assert!(started.elapsed() >= ROBUST_HIDE_MAX_WAIT);
    assert_eq!(harness.host.log().minimized, vec![WindowRole::Main]);
    assert_eq!(harness.host.created_count(WindowRole::Picker), 2);
}
