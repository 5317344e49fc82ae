//! Config API handlers
//!
//! - GET    /config?service=&version=   read one version (0 or absent = latest)
//! - POST   /config  {service, data}    create version 1
//! - PUT    /config  {service, data}    append a new version
//! - DELETE /config?service=&version=   delete one version (0 or absent = all)

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, delete, get, post, put, web};
use tracing::{error, info, warn};
use uuid::Uuid;
use vconf_common::{CONTENT_TYPE_JSON, RequestData};
use vconf_persistence::ConfigStorage;

use crate::error::GatewayError;
use crate::model::common::AppState;

use super::model::ConfigQueryParam;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller identity attached to every request log line
struct RequestContext {
    request_id: String,
    remote_addr: String,
    method: String,
    request_uri: String,
}

impl RequestContext {
    fn new(req: &HttpRequest) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            remote_addr: req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string(),
            method: req.method().to_string(),
            request_uri: req.uri().to_string(),
        }
    }

    fn completed(&self, mut response: HttpResponse) -> HttpResponse {
        info!(
            request_id = %self.request_id,
            remote_addr = %self.remote_addr,
            request_uri = %self.request_uri,
            status = response.status().as_u16(),
            "{} request completed",
            self.method
        );
        self.tag(&mut response);
        response
    }

    fn failed(&self, err: GatewayError) -> HttpResponse {
        let status = err.status_code();
        if status.is_server_error() {
            error!(
                request_id = %self.request_id,
                remote_addr = %self.remote_addr,
                request_uri = %self.request_uri,
                status = status.as_u16(),
                kind = err.kind(),
                error = %err,
                "{} request aborted with error",
                self.method
            );
        } else {
            warn!(
                request_id = %self.request_id,
                remote_addr = %self.remote_addr,
                request_uri = %self.request_uri,
                status = status.as_u16(),
                kind = err.kind(),
                error = %err,
                "{} request aborted with error",
                self.method
            );
        }

        let mut response = err.error_response();
        self.tag(&mut response);
        response
    }

    fn tag(&self, response: &mut HttpResponse) {
        if let Ok(value) = header::HeaderValue::from_str(&self.request_id) {
            response
                .headers_mut()
                .insert(header::HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
    }
}

fn parse_body(body: &[u8]) -> Result<RequestData, GatewayError> {
    Ok(serde_json::from_slice(body)?)
}

/// Read a config version
///
/// GET /config
#[get("")]
pub async fn get_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ConfigQueryParam>,
) -> HttpResponse {
    let ctx = RequestContext::new(&req);

    let (service, version) = match params.service_and_version() {
        Ok(v) => v,
        Err(e) => return ctx.failed(e.into()),
    };

    match data.storage().read(service, version).await {
        Ok(cfg) => ctx.completed(
            HttpResponse::Ok()
                .content_type(CONTENT_TYPE_JSON)
                .insert_header((header::CACHE_CONTROL, "no-cache"))
                .body(cfg.payload),
        ),
        Err(e) => ctx.failed(e.into()),
    }
}

/// Create a new config
///
/// POST /config
#[post("")]
pub async fn create_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let ctx = RequestContext::new(&req);

    let request = match parse_body(&body) {
        Ok(r) => r,
        Err(e) => return ctx.failed(e),
    };

    match data
        .storage()
        .create(&request.service, request.payload())
        .await
    {
        Ok(()) => ctx.completed(HttpResponse::NoContent().finish()),
        Err(e) => ctx.failed(e.into()),
    }
}

/// Append a new config version
///
/// PUT /config
#[put("")]
pub async fn update_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let ctx = RequestContext::new(&req);

    let request = match parse_body(&body) {
        Ok(r) => r,
        Err(e) => return ctx.failed(e),
    };

    match data
        .storage()
        .update(&request.service, request.payload())
        .await
    {
        Ok(_) => ctx.completed(HttpResponse::Ok().finish()),
        Err(e) => ctx.failed(e.into()),
    }
}

/// Delete one version or the whole history
///
/// DELETE /config
#[delete("")]
pub async fn delete_config(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ConfigQueryParam>,
) -> HttpResponse {
    let ctx = RequestContext::new(&req);

    let (service, version) = match params.service_and_version() {
        Ok(v) => v,
        Err(e) => return ctx.failed(e.into()),
    };

    match data.storage().delete(service, version).await {
        Ok(()) => ctx.completed(HttpResponse::Ok().finish()),
        Err(e) => ctx.failed(e.into()),
    }
}
