//! Route registration for the config API

use actix_web::{Scope, web};
use vconf_common::CONFIG_PATH;

use super::config;

pub fn routes() -> Scope {
    web::scope(CONFIG_PATH)
        .service(config::get_config)
        .service(config::create_config)
        .service(config::update_config)
        .service(config::delete_config)
}
