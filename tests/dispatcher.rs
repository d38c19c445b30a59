#![allow(non_snake_case)]
use rps_table::api::{ApiError, CancelResponse, MoveResponse, RematchResponse, SearchResponse};
use rps_table::test_helpers::{RecordingView, ScriptedApi};
use rps_table::{
    Config, Coordinator, Move, Notice, Phase, Route, UserAction,
};

fn coordinator() -> (Coordinator<ScriptedApi, RecordingView>, ScriptedApi) {
    coordinator_with(RecordingView::new())
}

fn coordinator_with(
    view: RecordingView,
) -> (Coordinator<ScriptedApi, RecordingView>, ScriptedApi) {
    let api = ScriptedApi::new();
    let (coordinator, _events) = Coordinator::new(api.clone(), view, Config::for_tests());
    (coordinator, api)
}

#[tokio::test]
async fn place_bet_with_immediate_match__goes_straight_to_the_game() {
    let (mut coordinator, api) = coordinator();
    api.push_search(Ok(SearchResponse {
        opponent_found: true,
        game_id: Some(5),
    }));

    coordinator
        .dispatch(UserAction::PlaceBet { amount: 100 })
        .await;

    assert_eq!(coordinator.session().game_id, Some(5));
    assert_eq!(coordinator.view().routes, vec![Route::Game(5)]);
    assert!(coordinator.view().search_countdowns.is_empty());
}

#[tokio::test]
async fn place_bet_without_match__starts_the_search_countdown() {
    let (mut coordinator, api) = coordinator();
    api.push_search(Ok(SearchResponse::default()));

    coordinator
        .dispatch(UserAction::PlaceBet { amount: 100 })
        .await;

    assert_eq!(coordinator.session().phase, Phase::Searching);
    assert_eq!(coordinator.session().bet_amount, Some(100));
    assert_eq!(coordinator.view().search_countdowns, vec![5]);
}

#[tokio::test]
async fn place_bet_rejected_by_server__surfaces_the_message() {
    let (mut coordinator, api) = coordinator();
    api.push_search(Err(ApiError::Server("Insufficient balance".into())));

    coordinator
        .dispatch(UserAction::PlaceBet { amount: 10_000 })
        .await;

    assert!(coordinator
        .view()
        .notices
        .contains(&(Notice::Error, "Insufficient balance".to_string())));
    assert_eq!(coordinator.session().phase, Phase::Idle);
    assert!(!coordinator.timers_active());
}

#[tokio::test]
async fn place_bet_while_in_a_game__is_refused_locally() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);

    coordinator
        .dispatch(UserAction::PlaceBet { amount: 100 })
        .await;

    assert_eq!(coordinator.view().notice_texts(), vec!["Already in a game"]);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn cancel_search__returns_to_idle_and_tells_the_server() {
    let (mut coordinator, api) = coordinator();
    api.push_search(Ok(SearchResponse::default()));
    coordinator
        .dispatch(UserAction::PlaceBet { amount: 100 })
        .await;

    coordinator.dispatch(UserAction::CancelSearch).await;

    assert_eq!(coordinator.session().phase, Phase::Idle);
    assert_eq!(coordinator.session().bet_amount, None);
    assert!(!coordinator.timers_active());
    assert!(api.calls().contains(&"cancel_search".to_string()));
    assert!(coordinator
        .view()
        .notices
        .contains(&(Notice::Info, "Search cancelled".to_string())));
}

#[tokio::test]
async fn submit_move__disables_inputs_before_the_request_resolves() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_move(Ok(MoveResponse::default()));

    coordinator
        .dispatch(UserAction::SubmitMove { mv: Move::Paper })
        .await;

    // enabled on entry, disabled on submit, no re-enable on success
    assert_eq!(coordinator.view().inputs_enabled, vec![true, false]);
    assert_eq!(api.calls(), vec!["move(7, paper)".to_string()]);
}

#[tokio::test]
async fn submit_move_without_a_game__is_refused_locally() {
    let (mut coordinator, api) = coordinator();

    coordinator
        .dispatch(UserAction::SubmitMove { mv: Move::Rock })
        .await;

    assert_eq!(coordinator.view().notice_texts(), vec!["No active game"]);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn submit_move_rejected_by_server__reenables_inputs() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_move(Err(ApiError::Server("Not your turn".into())));

    coordinator
        .dispatch(UserAction::SubmitMove { mv: Move::Rock })
        .await;

    assert_eq!(coordinator.view().inputs_enabled, vec![true, false, true]);
    assert!(coordinator
        .view()
        .notices
        .contains(&(Notice::Error, "Not your turn".to_string())));
    assert!(coordinator.view().reveals.is_empty());
}

#[tokio::test]
async fn cancel_game_declined_at_the_prompt__sends_nothing() {
    let (mut coordinator, api) = coordinator_with(RecordingView::refusing_confirm());
    coordinator.enter_game(7);

    coordinator.dispatch(UserAction::CancelGame).await;

    assert_eq!(coordinator.view().confirms, 1);
    assert!(api.calls().is_empty());
    assert!(!coordinator.session().finalized);
}

#[tokio::test]
async fn cancel_game_confirmed__refunds_and_leaves_for_the_lobby() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_cancel_game(Ok(CancelResponse {
        success: true,
        message: Some("Stakes refunded".into()),
    }));

    coordinator.dispatch(UserAction::CancelGame).await;

    assert!(coordinator
        .view()
        .notices
        .contains(&(Notice::Success, "Stakes refunded".to_string())));
    assert_eq!(coordinator.view().routes, vec![Route::Lobby]);
    assert!(coordinator.session().finalized);
    assert_eq!(coordinator.session().phase, Phase::Cancelled);
    assert!(!coordinator.timers_active());
}

#[tokio::test]
async fn rematch_accepted__starts_a_fresh_session() {
    let (mut coordinator, api) = coordinator();
    coordinator.enter_game(7);
    api.push_rematch(Ok(RematchResponse {
        success: true,
        game_id: Some(8),
    }));

    coordinator.dispatch(UserAction::Rematch).await;

    assert_eq!(coordinator.session().game_id, Some(8));
    assert_eq!(coordinator.session().phase, Phase::WaitingOpponent);
    assert!(!coordinator.session().finalized);
    assert_eq!(coordinator.view().routes, vec![Route::Game(8)]);
    assert_eq!(api.calls(), vec!["rematch(7)".to_string()]);
}

#[tokio::test]
async fn rematch_without_a_game__is_refused_locally() {
    let (mut coordinator, api) = coordinator();

    coordinator.dispatch(UserAction::Rematch).await;

    assert_eq!(coordinator.view().notice_texts(), vec!["No active game"]);
    assert!(api.calls().is_empty());
}
