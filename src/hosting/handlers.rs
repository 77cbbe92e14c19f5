use actix_web::web;
use actix_web::HttpResponse;
use actix_web::Responder;
use serde::Deserialize;

use crate::core::Action;
use crate::error::Error;
use crate::serving::{AgentKind, GameId};

use super::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(default = "default_players")]
    pub players: usize,
    #[serde(default)]
    pub agents: Vec<AgentKind>,
    pub seed: Option<u64>,
}

fn default_players() -> usize {
    2
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub action: usize,
}

fn failure(e: Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::GameNotFound(_) => HttpResponse::NotFound().json(body),
        Error::GameOver(_) => HttpResponse::Conflict().json(body),
        Error::InvalidPlayerCount(_) | Error::InvalidAction(_) => HttpResponse::BadRequest().json(body),
        _ => {
            log::error!("request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

pub async fn create(state: web::Data<AppState>, body: web::Json<CreateRequest>) -> impl Responder {
    let req = body.into_inner();
    match state.store.create(req.players, req.agents, req.seed) {
        Ok(id) => HttpResponse::Ok().json(serde_json::json!({ "game_id": id })),
        Err(e) => failure(e),
    }
}

pub async fn view(state: web::Data<AppState>, path: web::Path<GameId>) -> impl Responder {
    match state.store.view(path.into_inner()) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => failure(e),
    }
}

pub async fn ai_move(state: web::Data<AppState>, path: web::Path<GameId>) -> impl Responder {
    match state.store.ai_move(path.into_inner(), &state.book) {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(e) => failure(e),
    }
}

pub async fn play(
    state: web::Data<AppState>,
    path: web::Path<GameId>,
    body: web::Json<PlayRequest>,
) -> impl Responder {
    let Some(action) = Action::from_index(body.action) else {
        return failure(Error::InvalidAction(body.action));
    };
    match state.store.play(path.into_inner(), action) {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(e) => failure(e),
    }
}

pub async fn end_turn(state: web::Data<AppState>, path: web::Path<GameId>) -> impl Responder {
    match state.store.end_turn(path.into_inner()) {
        Ok(view) => HttpResponse::Ok().json(serde_json::json!({
            "current_player": view.turn,
            "view": view,
        })),
        Err(e) => failure(e),
    }
}

pub async fn reset(state: web::Data<AppState>, path: web::Path<GameId>) -> impl Responder {
    match state.store.reset(path.into_inner()) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => failure(e),
    }
}

pub async fn remove(state: web::Data<AppState>, path: web::Path<GameId>) -> impl Responder {
    match state.store.remove(path.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "removed" })),
        Err(e) => failure(e),
    }
}
