#![allow(non_snake_case)]
use proptest::prelude::*;
use rps_table::test_helpers::{cancelled, finished, playing, snapshot, RecordingView, ScriptedApi};
use rps_table::{
    Config, Coordinator, FinalOutcome, GameStatus, Move, Outcome, Route, Seat, StatusSnapshot,
};

fn coordinator() -> (Coordinator<ScriptedApi, RecordingView>, ScriptedApi) {
    let api = ScriptedApi::new();
    let (coordinator, _events) =
        Coordinator::new(api.clone(), RecordingView::new(), Config::for_tests());
    (coordinator, api)
}

#[tokio::test]
async fn cancelled_snapshot__commits_cancelled_once_and_stops_everything() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    // when
    coordinator.on_snapshot(&cancelled());

    // then
    assert_eq!(coordinator.view().commits, vec![FinalOutcome::Cancelled]);
    assert!(coordinator.session().finalized);
    assert!(!coordinator.timers_active());

    // subsequent snapshots are ignored for commit purposes
    coordinator.on_snapshot(&finished(Some(Outcome::Player1Win), Some(Move::Rock), Some(Move::Paper)));
    coordinator.on_snapshot(&cancelled());
    assert_eq!(coordinator.view().commits.len(), 1);
}

#[tokio::test]
async fn finalize_ready_with_result__commits_finished_once() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    let ready = finished(Some(Outcome::Player2Win), Some(Move::Rock), Some(Move::Paper));
    coordinator.on_snapshot(&ready);
    coordinator.on_snapshot(&ready);

    assert_eq!(
        coordinator.view().commits,
        vec![FinalOutcome::Finished {
            result: Some(Outcome::Player2Win)
        }]
    );
    // both hands were revealed before the commit
    assert_eq!(
        coordinator.view().reveals,
        vec![(Seat::Player1, Move::Rock), (Seat::Player2, Move::Paper)]
    );
}

#[tokio::test]
async fn both_moves_without_result__commits_provisionally() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    coordinator.on_snapshot(&finished(None, Some(Move::Scissors), Some(Move::Scissors)));

    assert_eq!(
        coordinator.view().commits,
        vec![FinalOutcome::Finished { result: None }]
    );
}

#[tokio::test]
async fn finished_without_moves_or_result__does_not_commit() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    coordinator.on_snapshot(&finished(None, Some(Move::Rock), None));

    assert!(coordinator.view().commits.is_empty());
    assert!(!coordinator.session().finalized);
}

#[tokio::test]
async fn duplicate_snapshots__apply_view_side_effects_once() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    let mut snap = playing();
    snap.player1_move = Some(Move::Rock);
    snap.game_bank = Some(200.0);
    snap.is_bot_game = true;
    snap.bot_name = Some("Vera".into());

    coordinator.on_snapshot(&snap);
    coordinator.on_snapshot(&snap);
    coordinator.on_snapshot(&snap);

    let view = coordinator.view();
    assert_eq!(view.reveals, vec![(Seat::Player1, Move::Rock)]);
    assert_eq!(view.banks, vec![200.0]);
    assert_eq!(view.opponent_names, vec!["Vera".to_string()]);
    assert_eq!(view.cancel_visible, vec![true]);
}

#[tokio::test]
async fn bank_change__is_pushed_again() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    let mut snap = playing();
    snap.game_bank = Some(100.0);
    coordinator.on_snapshot(&snap);
    snap.game_bank = Some(200.0);
    coordinator.on_snapshot(&snap);

    assert_eq!(coordinator.view().banks, vec![100.0, 200.0]);
}

#[tokio::test]
async fn cancel_affordance__follows_phase() {
    let (mut coordinator, _api) = coordinator();
    coordinator.enter_game(7);

    coordinator.on_snapshot(&snapshot(GameStatus::Waiting));
    assert!(coordinator.view().cancel_visible.is_empty());

    coordinator.on_snapshot(&snapshot(GameStatus::Betting));
    assert_eq!(coordinator.view().cancel_visible, vec![true]);

    coordinator.on_snapshot(&snapshot(GameStatus::Waiting));
    assert_eq!(coordinator.view().cancel_visible, vec![true, false]);
}

#[tokio::test]
async fn failed_status_tick__is_skipped_without_state_change() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_status(Err(rps_table::test_helpers::decode_error()));

    coordinator.handle_event(rps_table::Event::StatusTick).await;

    assert!(coordinator.view().commits.is_empty());
    assert!(coordinator.view().notices.is_empty());
    assert_eq!(coordinator.session().phase, rps_table::Phase::WaitingOpponent);
}

#[tokio::test]
async fn status_tick__feeds_the_machine() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_status(Ok(finished(Some(Outcome::Draw), Some(Move::Rock), Some(Move::Rock))));

    coordinator.handle_event(rps_table::Event::StatusTick).await;

    assert_eq!(
        coordinator.view().commits,
        vec![FinalOutcome::Finished {
            result: Some(Outcome::Draw)
        }]
    );
    assert_eq!(api.calls(), vec!["status(7)".to_string()]);
}

#[tokio::test]
async fn rematch_navigation__yields_a_fresh_session() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    coordinator.on_snapshot(&finished(Some(Outcome::Player1Win), Some(Move::Rock), Some(Move::Paper)));
    assert!(coordinator.session().finalized);

    api.push_rematch(Ok(rps_table::api::RematchResponse {
        success: true,
        game_id: Some(8),
    }));
    coordinator
        .dispatch(rps_table::UserAction::Rematch)
        .await;

    assert_eq!(coordinator.session().game_id, Some(8));
    assert!(!coordinator.session().finalized);
    assert!(coordinator
        .view()
        .routes
        .contains(&Route::Game(8)));
    // the old session's commit is untouched
    assert_eq!(coordinator.view().commits.len(), 1);
}

fn arb_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    (0..5u8, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(status, p1, p2, result)| {
        let status = match status {
            0 => GameStatus::Waiting,
            1 => GameStatus::Betting,
            2 => GameStatus::Playing,
            3 => GameStatus::Finished,
            _ => GameStatus::Cancelled,
        };
        let mut snap = snapshot(status);
        if p1 {
            snap.player1_move = Some(Move::Rock);
        }
        if p2 {
            snap.player2_move = Some(Move::Paper);
        }
        if result {
            snap.result = Some(Outcome::Draw);
        }
        snap
    })
}

proptest! {
    // For every sequence of snapshots, the terminal commit executes at most
    // once and `finalized` never resets.
    #[test]
    fn terminal_commit__fires_at_most_once(snaps in proptest::collection::vec(arb_snapshot(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let (mut coordinator, _api) = coordinator();
            coordinator.enter_game(1);
            let mut was_finalized = false;
            for snap in &snaps {
                coordinator.on_snapshot(snap);
                if was_finalized {
                    prop_assert!(coordinator.session().finalized, "finalized flag reset");
                }
                was_finalized = coordinator.session().finalized;
            }
            prop_assert!(coordinator.view().commits.len() <= 1);
            prop_assert_eq!(coordinator.session().finalized, !coordinator.view().commits.is_empty());
            Ok(())
        })?;
    }
}
