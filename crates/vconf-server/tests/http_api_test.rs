//! Gateway status mapping and payload pass-through, driven through the
//! actix test harness against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use vconf_persistence::{MemoryStore, StorageEngine};
use vconf_server::AppState;
use vconf_server::api::routes;

fn app_state(grace: Duration) -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(StorageEngine::new(
        MemoryStore::new(),
        grace,
    ))))
}

macro_rules! gateway {
    ($grace:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from(app_state($grace)))
                .service(routes()),
        )
        .await
    };
}

fn post(body: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/config")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body.to_string())
        .to_request()
}

fn put(body: &str) -> actix_http::Request {
    test::TestRequest::put()
        .uri("/config")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body.to_string())
        .to_request()
}

fn get(query: &str) -> actix_http::Request {
    test::TestRequest::get()
        .uri(&format!("/config?{}", query))
        .to_request()
}

fn delete(query: &str) -> actix_http::Request {
    test::TestRequest::delete()
        .uri(&format!("/config?{}", query))
        .to_request()
}

#[actix_rt::test]
async fn create_returns_no_content_and_read_echoes_payload() {
    let app = gateway!(Duration::from_secs(10));

    let resp = test::call_service(
        &app,
        post(r#"{"service":"example","data":{"key1":"Value1","key2":"Value2"}}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, get("service=example")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(resp.headers().contains_key("x-request-id"));

    let body = test::read_body(resp).await;
    assert_eq!(&body[..], br#"{"key1":"Value1","key2":"Value2"}"#);
}

#[actix_rt::test]
async fn duplicate_create_is_forbidden() {
    let app = gateway!(Duration::from_secs(10));

    let resp = test::call_service(&app, post(r#"{"service":"example","data":{"p":1}}"#)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, post(r#"{"service":"example","data":{"p":2}}"#)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, get("service=example&version=1")).await;
    assert_eq!(test::read_body(resp).await, r#"{"p":1}"#);
}

#[actix_rt::test]
async fn malformed_bodies_are_bad_requests() {
    let app = gateway!(Duration::from_secs(10));

    for body in [
        "",
        "{",
        r#"{"service":"example"}"#,
        r#"{"service":"example","data":{broken}}"#,
        r#"{"service":"","data":{}}"#,
    ] {
        let resp = test::call_service(&app, post(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "POST body {:?}", body);

        let resp = test::call_service(&app, put(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "PUT body {:?}", body);
    }
}

#[actix_rt::test]
async fn missing_service_param_is_bad_request() {
    let app = gateway!(Duration::from_secs(10));

    let resp = test::call_service(&app, get("version=1")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, delete("service=")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn read_and_update_of_unknown_service_are_not_found() {
    let app = gateway!(Duration::from_secs(10));

    let resp = test::call_service(&app, get("service=absent")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, put(r#"{"service":"absent","data":{}}"#)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn update_then_read_latest_and_by_number() {
    let app = gateway!(Duration::from_secs(10));

    test::call_service(&app, post(r#"{"service":"example","data":{"v":1}}"#)).await;
    let resp = test::call_service(&app, put(r#"{"service":"example","data":{"v":2}}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get("service=example")).await;
    assert_eq!(test::read_body(resp).await, r#"{"v":2}"#);

    // Non-numeric version selects the latest
    let resp = test::call_service(&app, get("service=example&version=latest")).await;
    assert_eq!(test::read_body(resp).await, r#"{"v":2}"#);

    let resp = test::call_service(&app, get("service=example&version=1")).await;
    assert_eq!(test::read_body(resp).await, r#"{"v":1}"#);

    let resp = test::call_service(&app, get("service=example&version=9")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_of_recently_read_version_is_forbidden() {
    let app = gateway!(Duration::from_millis(200));

    test::call_service(&app, post(r#"{"service":"example","data":{}}"#)).await;
    test::call_service(&app, get("service=example&version=1")).await;

    let resp = test::call_service(&app, delete("service=example&version=1")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    actix_rt::time::sleep(Duration::from_millis(300)).await;

    let resp = test::call_service(&app, delete("service=example&version=1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get("service=example&version=1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_right_after_create_is_forbidden() {
    let app = gateway!(Duration::from_millis(200));

    let resp = test::call_service(&app, post(r#"{"service":"example","data":{}}"#)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, delete("service=example")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    actix_rt::time::sleep(Duration::from_millis(300)).await;

    let resp = test::call_service(&app, delete("service=example")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn delete_whole_history_frees_the_name() {
    let app = gateway!(Duration::from_millis(200));

    test::call_service(&app, post(r#"{"service":"example","data":{"gen":1}}"#)).await;
    test::call_service(&app, put(r#"{"service":"example","data":{"gen":1}}"#)).await;

    // Version 1 counts as read at creation
    actix_rt::time::sleep(Duration::from_millis(300)).await;

    let resp = test::call_service(&app, delete("service=example")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, post(r#"{"service":"example","data":{"gen":2}}"#)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, get("service=example")).await;
    assert_eq!(test::read_body(resp).await, r#"{"gen":2}"#);
}

#[actix_rt::test]
async fn delete_of_unknown_service_succeeds() {
    let app = gateway!(Duration::from_secs(10));

    let resp = test::call_service(&app, delete("service=absent")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
