use std::net::SocketAddr;

use axum::{middleware, response::Redirect, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{auth, state::AppState, todos};

pub fn build_app(state: AppState) -> Router {
    let protected = todos::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_session,
    ));

    Router::new()
        .route("/", get(|| async { Redirect::to("/lists") }))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(protected)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .method_not_allowed_fallback(|| async { Redirect::to("/login") })
        .fallback(|| async { Redirect::to("/login") })
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::{test_keys, TokenCodec},
        testing::test_state,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    fn form(method: &str, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    fn location(res: &Response) -> &str {
        res.headers()[header::LOCATION].to_str().unwrap()
    }

    /// `name=value` part of the response's Set-Cookie header.
    fn cookie_pair(res: &Response) -> String {
        let raw = res.headers()[header::SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn register_and_login(app: &Router, email: &str) -> String {
        let body = format!("email={}&password=secret1", email.replace('@', "%40"));
        let res = app.clone().oneshot(form("POST", "/register", &body, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let res = app.clone().oneshot(form("POST", "/login", &body, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        cookie_pair(&res)
    }

    #[tokio::test]
    async fn register_redirects_to_login_and_rejects_duplicates() {
        let (state, users, _) = test_state();
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(form("POST", "/register", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");

        let res = app
            .clone()
            .oneshot(form("POST", "/register", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("Email already registered"));
        assert_eq!(users.count().await, 1);
    }

    #[tokio::test]
    async fn register_with_short_password_rerenders_form() {
        let (state, users, _) = test_state();
        let app = build_app(state);
        let res = app
            .oneshot(form("POST", "/register", "email=a%40b.com&password=123", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("Invalid input"));
        assert_eq!(users.count().await, 0);
    }

    #[tokio::test]
    async fn login_sets_cookie_that_verifies_to_identity() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        app.clone()
            .oneshot(form("POST", "/register", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();

        let res = app
            .oneshot(form("POST", "/login", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/lists");

        let raw = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("Path=/"));
        assert!(!raw.contains("Secure"));

        let pair = cookie_pair(&res);
        let token = pair.strip_prefix("jwt=").unwrap();
        let claims = test_keys("test-secret")
            .verify(token, OffsetDateTime::now_utc())
            .unwrap();
        assert_eq!(claims.identity, "a@b.com");
    }

    #[tokio::test]
    async fn login_accepts_json() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        app.clone()
            .oneshot(form("POST", "/register", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();

        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.com","password":"secret1"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(location(&res), "/lists");
        assert!(res.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn failed_login_redirects_to_login_without_cookie() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        app.clone()
            .oneshot(form("POST", "/register", "email=a%40b.com&password=secret1", None))
            .await
            .unwrap();

        for body in ["email=a%40b.com&password=wrong12", "email=x%40b.com&password=secret1", "email=&password="] {
            let res = app.clone().oneshot(form("POST", "/login", body, None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&res), "/login");
            assert!(!res.headers().contains_key(header::SET_COOKIE));
        }
    }

    #[tokio::test]
    async fn lists_without_cookie_redirects_to_login() {
        let (state, _, _) = test_state();
        let res = build_app(state).oneshot(get("/lists", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn lists_with_expired_cookie_redirects_to_login() {
        let (state, _, _) = test_state();
        let issued = test_keys("test-secret")
            .issue("a@b.com", OffsetDateTime::now_utc() - Duration::hours(48))
            .unwrap();
        let cookie = format!("jwt={}", issued.token);
        let res = build_app(state).oneshot(get("/lists", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn lists_with_foreign_signature_redirects_to_login() {
        let (state, _, _) = test_state();
        let issued = test_keys("someone-elses-secret")
            .issue("a@b.com", OffsetDateTime::now_utc())
            .unwrap();
        let cookie = format!("jwt={}", issued.token);
        let res = build_app(state).oneshot(get("/lists", Some(&cookie))).await.unwrap();
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let (state, _, _) = test_state();
        let issued = test_keys("test-secret")
            .issue("a@b.com", OffsetDateTime::now_utc())
            .unwrap();
        let req = Request::builder()
            .uri("/lists")
            .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(Body::empty())
            .unwrap();
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("a@b.com"));
    }

    #[tokio::test]
    async fn todo_crud_roundtrip() {
        let (state, _, todos) = test_state();
        let app = build_app(state);
        let cookie = register_and_login(&app, "a@b.com").await;

        let res = app
            .clone()
            .oneshot(form("POST", "/lists/create", "title=Buy+milk&content=2+litres", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), "/lists");

        let stored = todos.all().await;
        assert_eq!(stored.len(), 1);
        let id = stored[0].id;
        assert_eq!(stored[0].user_email, "a@b.com");
        assert!(!stored[0].done);

        let res = app.clone().oneshot(get("/lists", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("Buy milk"));

        let res = app
            .clone()
            .oneshot(get(&format!("/lists/edit/{id}"), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(form(
                "POST",
                &format!("/lists/edit/{id}"),
                "title=Buy+oat+milk&content=&done=on",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(location(&res), "/lists");
        let stored = todos.all().await;
        assert_eq!(stored[0].title, "Buy oat milk");
        assert!(stored[0].done);

        let res = app
            .clone()
            .oneshot(form("POST", &format!("/lists/delete/{id}"), "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), "/lists");
        assert!(todos.all().await.is_empty());
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (state, _, todos) = test_state();
        let app = build_app(state);
        let cookie = register_and_login(&app, "a@b.com").await;
        let res = app
            .oneshot(form("POST", "/lists/create", "title=+++&content=x", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("Title is required"));
        assert!(todos.all().await.is_empty());
    }

    #[tokio::test]
    async fn users_cannot_touch_each_others_todos() {
        let (state, _, todos) = test_state();
        let app = build_app(state);
        let alice = register_and_login(&app, "alice@b.com").await;
        let bob = register_and_login(&app, "bob@b.com").await;

        app.clone()
            .oneshot(form("POST", "/lists/create", "title=Secret", Some(&alice)))
            .await
            .unwrap();
        let id = todos.all().await[0].id;

        let res = app
            .clone()
            .oneshot(get(&format!("/lists/edit/{id}"), Some(&bob)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app
            .clone()
            .oneshot(form("POST", &format!("/lists/delete/{id}"), "", Some(&bob)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.oneshot(get("/lists", Some(&bob))).await.unwrap();
        assert!(!body_text(res).await.contains("Secret"));
        assert_eq!(todos.all().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        let cookie = register_and_login(&app, "a@b.com").await;
        let res = app
            .oneshot(get("/lists/edit/not-a-uuid", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let (state, _, _) = test_state();
        let res = build_app(state).oneshot(get("/logout", None)).await.unwrap();
        assert_eq!(location(&res), "/login");
        let raw = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(raw.starts_with("jwt=;"));
        assert!(raw.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn refresh_reissues_cookie() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        let cookie = register_and_login(&app, "a@b.com").await;
        let res = app
            .clone()
            .oneshot(form("POST", "/refresh", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), "/lists");
        let fresh = cookie_pair(&res);
        assert_ne!(fresh, cookie);

        let res = app.oneshot(get("/lists", Some(&fresh))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_past_window_redirects_to_login() {
        let (state, _, _) = test_state();
        let stale = test_keys("test-secret")
            .issue("a@b.com", OffsetDateTime::now_utc() - Duration::hours(30))
            .unwrap();
        let cookie = format!("jwt={}", stale.token);
        let res = build_app(state)
            .oneshot(form("POST", "/refresh", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), "/login");
        assert!(!res.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn root_and_unknown_paths_redirect() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        let res = app.clone().oneshot(get("/", None)).await.unwrap();
        assert_eq!(location(&res), "/lists");
        let res = app.oneshot(get("/nowhere", None)).await.unwrap();
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_redirects_to_login() {
        let (state, _, _) = test_state();
        let app = build_app(state);
        let cookie = register_and_login(&app, "a@b.com").await;
        let uri = format!("/lists/delete/{}", uuid::Uuid::new_v4());

        let res = app.clone().oneshot(get(&uri, Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");

        let res = app.clone().oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(location(&res), "/login");

        let res = app.oneshot(form("DELETE", "/login", "", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }
}
