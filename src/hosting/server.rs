use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;

use crate::serving::{GameStore, PolicyBook};

use super::handlers;

/// Shared state handed to every worker.
pub struct AppState {
    pub store: GameStore,
    pub book: PolicyBook,
}

pub struct Server;

impl Server {
    /// Serve until shut down. The policy book is fixed for the server's lifetime.
    pub async fn run(addr: &str, store: GameStore, book: PolicyBook) -> std::io::Result<()> {
        let state = web::Data::new(AppState { store, book });
        log::info!("starting game server on {}", addr);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(state.clone())
                .configure(routes)
        })
        .workers(4)
        .bind(addr)?
        .run()
        .await
    }
}

/// Register the game routes on an app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/games", web::post().to(handlers::create))
        .route("/api/games/{id}", web::get().to(handlers::view))
        .route("/api/games/{id}", web::delete().to(handlers::remove))
        .route("/api/games/{id}/ai_move", web::post().to(handlers::ai_move))
        .route("/api/games/{id}/play", web::post().to(handlers::play))
        .route("/api/games/{id}/end_turn", web::post().to(handlers::end_turn))
        .route("/api/games/{id}/reset", web::post().to(handlers::reset));
}
