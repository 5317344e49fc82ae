//! HTTP server setup for the config gateway

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, web};

use crate::api;
use crate::model::common::AppState;
use crate::model::config::ListenConfig;

/// Creates and binds the config HTTP server on the configured address.
pub fn config_server(app_state: Arc<AppState>, listen: &ListenConfig) -> std::io::Result<Server> {
    let listener = TcpListener::bind(listen.addr())?;
    config_server_on(app_state, listener, listen)
}

/// Creates the config HTTP server on an already bound listener.
///
/// The server handles SIGINT/SIGTERM itself and drains in-flight requests
/// for up to the configured shutdown timeout.
pub fn config_server_on(
    app_state: Arc<AppState>,
    listener: TcpListener,
    listen: &ListenConfig,
) -> std::io::Result<Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(app_state.clone()))
            .service(api::routes())
    })
    .client_request_timeout(listen.read_timeout())
    .client_disconnect_timeout(listen.write_timeout())
    .shutdown_timeout(listen.shutdown_timeout_secs())
    .listen(listener)?
    .run())
}
