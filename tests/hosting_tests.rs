//! HTTP routes against an in-process app.
#![cfg(feature = "server")]

use actix_web::{test, web, App};
use serde_json::{json, Value};

use kitten_rl::hosting::{routes, AppState};
use kitten_rl::serving::{GameStore, PolicyBook};

fn state() -> web::Data<AppState> {
    web::Data::new(AppState {
        store: GameStore::default(),
        book: PolicyBook::empty(),
    })
}

#[actix_web::test]
async fn test_create_view_and_play() {
    let app = test::init_service(App::new().app_data(state()).configure(routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "players": 3, "agents": ["mle", "qlearning"], "seed": 4 }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["game_id"].as_u64().unwrap();

    let req = test::TestRequest::get().uri(&format!("/api/games/{}", id)).to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["players"], 3);
    assert_eq!(view["agents"], json!(["mle", "qlearning", "random"]));
    assert_eq!(view["turn"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/play", id))
        .set_json(json!({ "action": 4 }))
        .to_request();
    let reply: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reply["player"], 0);
    assert_eq!(reply["done"], false);
    assert_eq!(reply["view"]["turn"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/ai_move", id))
        .to_request();
    let reply: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reply["player"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/end_turn", id))
        .to_request();
    let reply: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reply["current_player"], reply["view"]["turn"]);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/reset", id))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["steps"], 0);
}

#[actix_web::test]
async fn test_error_statuses() {
    let app = test::init_service(App::new().app_data(state()).configure(routes)).await;

    let req = test::TestRequest::get().uri("/api/games/999").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "players": 9 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["game_id"].as_u64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/play", id))
        .set_json(json!({ "action": 8 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/games/{}", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/ai_move", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
