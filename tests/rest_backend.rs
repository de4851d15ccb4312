use alugux::config::RemoteConfig;
use alugux::errors::AppError;
use alugux::remote::{AuthService, DataService, Filter, Query, RestBackend, Table};
use alugux::session::Credentials;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

async fn backend(server: &MockServer) -> RestBackend {
    let config = RemoteConfig {
        url: server.uri(),
        anon_key: ANON_KEY.to_string(),
        timeout_secs: 5,
    };
    RestBackend::new(&config).unwrap()
}

async fn sign_in(server: &MockServer, backend: &RestBackend, user: Uuid) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({ "email": "ana@alugux.app", "password": "segredo1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "token_type": "bearer",
            "refresh_token": "refresh",
            "user": { "id": user, "email": "ana@alugux.app" },
        })))
        .expect(1)
        .mount(server)
        .await;

    let session = backend
        .sign_in(&Credentials::new("ana@alugux.app", "segredo1"))
        .await
        .unwrap();
    assert_eq!(session.user_id(), user);
}

#[tokio::test]
async fn test_select_sends_postgrest_params_with_anon_token() {
    let server = MockServer::start().await;
    let owner = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/properties"))
        .and(query_param("select", "id,title"))
        .and(query_param("owner_id", format!("eq.{owner}")))
        .and(query_param("status", "eq.Disponível"))
        .and(query_param("order", "title.asc"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4(), "title": "Loft" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = backend(&server)
        .await
        .select(
            &Query::from(Table::Properties)
                .select(&["id", "title"])
                .eq("owner_id", owner)
                .eq("status", "Disponível")
                .order_by("title", true),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Loft");
}

#[tokio::test]
async fn test_requests_carry_session_token_after_sign_in() {
    let server = MockServer::start().await;
    let backend = backend(&server).await;
    let user = Uuid::new_v4();
    sign_in(&server, &backend, user).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/rentals"))
        .and(query_param("select", "*,properties(title)"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = backend
        .select(&Query::from(Table::Rentals).embed(Table::Properties, "property_id", &["title"]))
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(backend.current_session().await.unwrap().user_id(), user);
}

#[tokio::test]
async fn test_count_reads_content_range_from_head() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/rentals"))
        .and(query_param("select", "id"))
        .and(query_param("status", "eq.Ativo"))
        .and(query_param("start_date", "lte.2024-02-29"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-1/2"))
        .expect(1)
        .mount(&server)
        .await;

    let count = backend(&server)
        .await
        .count(
            &Query::from(Table::Rentals)
                .eq("status", "Ativo")
                .lte("start_date", "2024-02-29"),
        )
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_insert_asks_for_the_stored_row() {
    let server = MockServer::start().await;
    let row = json!({ "title": "Loft", "address": "Rua A, 1", "price": "1000" });

    Mock::given(method("POST"))
        .and(path("/rest/v1/properties"))
        .and(header("prefer", "return=representation"))
        .and(body_json(row.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": "9b2f7d4e-1c1a-4c55-9d8e-6f1f0c1d2e3f", "title": "Loft" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = backend(&server).await.insert(Table::Properties, row).await.unwrap();
    assert_eq!(stored["id"], "9b2f7d4e-1c1a-4c55-9d8e-6f1f0c1d2e3f");
}

#[tokio::test]
async fn test_insert_without_returned_row_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rentals"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = backend(&server)
        .await
        .insert(Table::Rentals, json!({ "tenant_name": "Ana" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote { status: 500, .. }));
}

#[tokio::test]
async fn test_update_filters_by_query_params() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/properties"))
        .and(query_param("id", format!("eq.{id}")))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "status": "Alugado" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": id, "status": "Alugado" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = backend(&server)
        .await
        .update(Table::Properties, &[Filter::eq("id", id)], json!({ "status": "Alugado" }))
        .await
        .unwrap();
    assert_eq!(rows[0]["status"], "Alugado");
}

#[tokio::test]
async fn test_error_status_maps_to_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rentals"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "insert or update on table \"rentals\" violates foreign key constraint",
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .await
        .insert(Table::Rentals, json!({ "property_id": Uuid::new_v4() }))
        .await
        .unwrap_err();
    match err {
        AppError::Remote { status, message } => {
            assert_eq!(status, 409);
            assert!(message.contains("foreign key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rejected_sign_in_keeps_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials",
        })))
        .mount(&server)
        .await;

    let backend = backend(&server).await;
    let err = backend
        .sign_in(&Credentials::new("ana@alugux.app", "errada"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Invalid login credentials");
    assert!(backend.current_session().await.is_none());
}

#[tokio::test]
async fn test_sign_out_posts_logout_and_forgets_session() {
    let server = MockServer::start().await;
    let backend = backend(&server).await;
    sign_in(&server, &backend, Uuid::new_v4()).await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend.sign_out().await.unwrap();
    assert!(backend.current_session().await.is_none());
    assert!(matches!(
        backend.update_password("novasenha").await,
        Err(AppError::SessionMissing)
    ));
}

#[tokio::test]
async fn test_password_reset_sends_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(query_param("redirect_to", "https://alugux.app/auth?reset=true"))
        .and(body_json(json!({ "email": "ana@alugux.app" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .await
        .reset_password_email("ana@alugux.app", "https://alugux.app/auth?reset=true")
        .await
        .unwrap();
}
