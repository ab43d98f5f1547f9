use std::sync::Arc;

use weft::{Handler, HttpMethod, HttpRequest, Server, ServerConfig, WeftError};

fn server() -> Server {
    Server::new(ServerConfig::default())
}

fn get(path: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::GET, path)
}

#[test]
fn test_registration_order_is_the_tie_break() {
    let server = server();
    server
        .get("/(.*)", Handler::with_captures(1, |_: &[String]| "catchall"))
        .unwrap();
    server
        .get("/specific", Handler::no_args(|| "specific"))
        .unwrap();

    let response = server.process(&get("/specific"));
    assert_eq!(response.body, b"catchall");
}

#[test]
fn test_method_matching_is_case_insensitive_and_exact() {
    let server = server();
    server
        .match_method("get", "/submit", Handler::no_args(|| "fetched"))
        .unwrap();

    let response = server.process(&get("/submit"));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"fetched");

    let response = server.process(&HttpRequest::new(HttpMethod::POST, "/submit"));
    assert_eq!(response.status_code, 405);
    assert_eq!(response.header("Allow"), Some("GET"));
}

#[test]
fn test_unmatched_path_is_404() {
    let server = server();
    server.get("/known", Handler::no_args(|| "")).unwrap();

    let response = server.process(&get("/elsewhere"));
    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, b"Page not found");
}

#[test]
fn test_captures_bind_positionally() {
    let server = server();
    server
        .get(
            "/say/:greeting/to/:name",
            Handler::with_captures(2, |caps: &[String]| format!("{} {}", caps[0], caps[1])),
        )
        .unwrap();

    let response = server.process(&get("/say/hi/to/weft"));
    assert_eq!(response.body, b"hi weft");
}

#[test]
fn test_context_handler_sees_params() {
    let server = server();
    server
        .get(
            "/users/:id",
            Handler::with_context(|ctx| format!("user {}", ctx.get_param("id").unwrap_or("?"))),
        )
        .unwrap();

    let response = server.process(&get("/users/42"));
    assert_eq!(response.body, b"user 42");
}

#[test]
fn test_abort_output_is_exact() {
    let server = server();
    server
        .get(
            "/gone",
            Handler::with_context(|ctx| {
                ctx.abort(404, "missing");
            }),
        )
        .unwrap();

    let response = server.process(&get("/gone"));
    assert_eq!(response.status_code, 404);
    assert_eq!(
        response.header("Content-Type"),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(response.body, b"missing");
}

#[test]
fn test_redirect_output_is_exact() {
    let server = server();
    server
        .get(
            "/old",
            Handler::with_context(|ctx| {
                ctx.redirect(302, "/login");
            }),
        )
        .unwrap();

    let response = server.process(&get("/old"));
    assert_eq!(response.status_code, 302);
    assert_eq!(response.header("Location"), Some("/login"));
    assert_eq!(response.body, b"Redirecting to: /login");
}

#[test]
fn test_return_value_after_abort_is_discarded() {
    let server = server();
    server
        .get(
            "/aborting",
            Handler::with_context(|ctx| {
                ctx.abort(403, "no entry");
                "should never be written"
            }),
        )
        .unwrap();

    let response = server.process(&get("/aborting"));
    assert_eq!(response.status_code, 403);
    assert_eq!(response.body, b"no entry");
}

#[test]
fn test_returned_text_defaults_to_200() {
    let server = server();
    server.get("/plain", Handler::no_args(|| "payload")).unwrap();

    let response = server.process(&get("/plain"));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"payload");
}

#[test]
fn test_returned_bytes_written_unframed() {
    let server = server();
    server
        .get("/bin", Handler::no_args(|| vec![0u8, 159, 146, 150]))
        .unwrap();

    let response = server.process(&get("/bin"));
    assert_eq!(response.body, vec![0u8, 159, 146, 150]);
}

#[test]
fn test_content_type_alias_then_body() {
    let server = server();
    server
        .get(
            "/data",
            Handler::with_context(|ctx| {
                assert_eq!(
                    ctx.content_type("json"),
                    Some("application/json".to_string())
                );
                r#"{"ok":true}"#
            }),
        )
        .unwrap();

    let response = server.process(&get("/data"));
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(response.body, br#"{"ok":true}"#);
}

#[test]
fn test_malformed_route_is_rejected_at_registration() {
    let server = server();
    let err = server
        .get("/bad/(unclosed", Handler::with_captures(1, |_: &[String]| ""))
        .unwrap_err();
    assert!(matches!(err, WeftError::Configuration { .. }));
}

#[test]
fn test_arity_mismatch_is_rejected_at_registration() {
    let server = server();
    let err = server
        .get("/users/:id/:field", Handler::with_captures(1, |_: &[String]| ""))
        .unwrap_err();
    assert!(matches!(err, WeftError::Configuration { .. }));
}

#[test]
fn test_panicking_handler_becomes_500_and_serving_continues() {
    let server = server();
    server
        .get(
            "/explode",
            Handler::no_args(|| -> &str { panic!("handler blew up") }),
        )
        .unwrap();
    server.get("/fine", Handler::no_args(|| "still up")).unwrap();

    let response = server.process(&get("/explode"));
    assert_eq!(response.status_code, 500);

    let response = server.process(&get("/fine"));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"still up");
}

#[test]
fn test_raw_handler_bypasses_router() {
    let server = server();
    server.get("/(.*)", Handler::with_captures(1, |_: &[String]| "routed")).unwrap();
    server.handle("/raw", "GET", |_req| {
        weft::HttpResponse::text(200, "raw path")
    });

    let raw = server.raw_response(&get("/raw")).unwrap();
    assert_eq!(raw.body, b"raw path");
    assert!(server.raw_response(&get("/not-raw")).is_none());
}

#[test]
fn test_custom_verb_registration() {
    let server = server();
    server
        .match_method("purge", "/cache", Handler::no_args(|| "purged"))
        .unwrap();

    let request = HttpRequest::new(HttpMethod::Other("PURGE".to_string()), "/cache");
    let response = server.process(&request);
    assert_eq!(response.body, b"purged");
}

#[test]
fn test_concurrent_dispatch_keeps_params_isolated() {
    let server = Arc::new(server());
    server
        .get(
            "/echo/:value",
            Handler::with_context(|ctx| ctx.get_param("value").unwrap_or("?").to_string()),
        )
        .unwrap();

    let mut workers = Vec::new();
    for i in 0..8 {
        let server = server.clone();
        workers.push(std::thread::spawn(move || {
            for round in 0..50 {
                let value = format!("w{i}r{round}");
                let response = server.process(&get(&format!("/echo/{value}")));
                assert_eq!(response.body, value.as_bytes());
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
}
