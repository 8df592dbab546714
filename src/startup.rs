use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::auth::CredentialService;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::store::TokenStateStore;

pub fn run(listener: TcpListener, service: CredentialService) -> Result<Server, std::io::Error> {
    let codec = service.codec().clone();
    let service = web::Data::new(service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            // Protected routes (require a valid access token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Periodically drop expired refresh-token bindings. `every` must be
/// non-zero; `StoreSettings::validate` guarantees that for configured values.
pub fn spawn_purge_task(tokens: Arc<dyn TokenStateStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match tokens.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Purged expired refresh token bindings"),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to purge expired refresh token bindings")
                }
            }
        }
    })
}
