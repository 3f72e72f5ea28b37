//! Desktop authentication and task calls against the live mock service.
//!
//! # Design
//! Starts the mock service on a random port, then drives `RtmClient` over
//! real HTTP with `UreqTransport`. The "user approves in a browser" step is a
//! plain GET of the authorisation URL.

use std::net::SocketAddr;

use rtm_core::{
    Credentials, Endpoints, Params, Permission, Resolve, RtmClient, RtmError, UreqTransport,
};

const KEY: &str = "test-key";
const SECRET: &str = "test-secret";

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr, secret: &str) -> RtmClient<UreqTransport> {
    let creds = Credentials::new(KEY, secret).with_perms(Permission::Delete);
    RtmClient::new(creds, UreqTransport::default()).with_endpoints(Endpoints::at(&format!("http://{addr}")))
}

/// What the user does in the browser.
fn approve(url: &str) {
    let status = ureq::get(url).call().unwrap().status();
    assert_eq!(status, 200, "approval rejected");
}

#[test]
fn desktop_auth_and_task_lifecycle() {
    let addr = start_mock_server();
    let mut api = client(addr, SECRET);

    // Step 1: no token yet.
    assert!(!api.token_valid().unwrap());

    // Step 2: frob and authorisation URL.
    let (url, frob) = api.authenticate_desktop().unwrap();
    assert!(url.starts_with(&format!("http://{addr}/services/auth/?")));
    assert!(url.contains("perms=delete"));

    // Step 3: the frob is useless until approved.
    assert!(!api.retrieve_token(&frob).unwrap());
    assert_eq!(api.token(), None);

    // Step 4: approve, then exchange.
    approve(&url);
    assert!(api.retrieve_token(&frob).unwrap());
    let token = api.token().unwrap().to_string();
    assert!(api.token_valid().unwrap());

    // Step 5: a timeline for the write calls.
    let result = api.method("rtm.timelines.create").call(Params::new()).unwrap();
    let timeline = result.get("timeline").value().unwrap().to_string();

    // Step 6: create a list.
    let result = api
        .method("rtm")
        .resolve("lists")
        .resolve("add")
        .call(Params::new().with("timeline", &timeline).with("name", "an example list"))
        .unwrap();
    let list_id = result.get("list").get("id").as_str().unwrap().to_string();
    assert_eq!(result.get("list").get("name").as_str(), Some("an example list"));

    // Step 7: add a task to it.
    let result = api
        .method("rtm.tasks")
        .resolve("add")
        .call(
            Params::new()
                .with("timeline", &timeline)
                .with("list_id", &list_id)
                .with("name", "some task & more"),
        )
        .unwrap();
    let task_id = result
        .get("list")
        .get("taskseries")
        .get("task")
        .get("id")
        .as_str()
        .unwrap()
        .to_string();

    // Step 8: list all tasks.
    let result = api
        .method("rtm.tasks.getList")
        .call(Params::new().with("filter", "status:incomplete"))
        .unwrap();
    let mut found = Vec::new();
    for list in result.get("tasks").iter() {
        for series in list.iter() {
            found.push((
                list.attribute("id").unwrap().to_string(),
                series.get("name").as_str().unwrap().to_string(),
                series.get("task").get("id").as_str().unwrap().to_string(),
            ));
        }
    }
    assert_eq!(found, vec![(list_id, "some task & more".to_string(), task_id)]);

    // Step 9: a failed exchange clears the held token.
    assert!(!api.retrieve_token(&frob).unwrap());
    assert_eq!(api.token(), None);

    // Step 10: the token itself is still good for a new client.
    let mut restored = client(addr, SECRET);
    restored.set_token(Some(token));
    assert!(restored.token_valid().unwrap());
}

#[test]
fn remote_failures_surface_as_errors() {
    let addr = start_mock_server();
    let api = client(addr, SECRET);

    let err = api.method("rtm.nope").call(Params::new()).unwrap_err();
    assert_eq!(err.code(), Some("112"));

    // without a token every authenticated method is refused
    let err = api.method("rtm.tasks.getList").call(Params::new()).unwrap_err();
    assert_eq!(err.code(), Some("98"));
}

#[test]
fn wrong_secret_fails_signature_check() {
    let addr = start_mock_server();
    let api = client(addr, "not-the-secret");

    let err = api.authenticate_desktop().unwrap_err();
    match err {
        RtmError::MethodFailed { method, code, message } => {
            assert_eq!(method, "rtm.auth.getFrob");
            assert_eq!(code, "96");
            assert_eq!(message, "Invalid signature");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn http_error_status_is_request_failed() {
    let addr = start_mock_server();
    let endpoints = Endpoints {
        rest_url: format!("http://{addr}/no/such/path/"),
        auth_url: format!("http://{addr}/services/auth/"),
    };
    let api = RtmClient::new(Credentials::new(KEY, SECRET), UreqTransport::default())
        .with_endpoints(endpoints);

    let err = api.method("rtm.test.echo").call(Params::new()).unwrap_err();
    match err {
        RtmError::RequestFailed { method, status, reason } => {
            assert_eq!(method, "rtm.test.echo");
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unreachable_service_is_a_transport_error() {
    // bind then drop to get a port nobody listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let mut api = client(addr, SECRET);
    api.set_token(Some("tok".to_string()));

    assert!(matches!(api.token_valid(), Err(RtmError::Transport(_))));
}
