//! Route handlers

pub mod health;
pub mod push;

use actix_web::web;

/// Configure all gateway routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    push::configure_routes(cfg);
    health::configure_routes(cfg);
}
