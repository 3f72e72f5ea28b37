//! In-memory stand-in for the Remember The Milk REST service.
//!
//! Serves `/services/rest/` and `/services/auth/` with the same signing and
//! `<rsp>` envelope rules as the real service. A GET to the auth endpoint
//! with a valid frob plays the part of the human approving access.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ERR_INVALID_SIGNATURE: u32 = 96;
pub const ERR_LOGIN_FAILED: u32 = 98;
pub const ERR_INVALID_API_KEY: u32 = 100;
pub const ERR_INVALID_FROB: u32 = 101;
pub const ERR_METHOD_NOT_FOUND: u32 = 112;
pub const ERR_TIMELINE: u32 = 300;
pub const ERR_MISSING_ARGUMENT: u32 = 4000;

/// Key pair the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub shared_secret: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "test-key".to_string(),
            shared_secret: "test-secret".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TaskSeries {
    pub id: u64,
    pub task_id: u64,
    pub name: String,
    pub due: String,
}

#[derive(Clone, Debug)]
pub struct TaskList {
    pub id: u64,
    pub name: String,
    pub series: Vec<TaskSeries>,
}

/// Everything the mock remembers between requests.
#[derive(Debug)]
pub struct MockState {
    /// frob → granted permission, `None` until approved
    frobs: HashMap<String, Option<String>>,
    /// token → permission
    tokens: HashMap<String, String>,
    lists: Vec<TaskList>,
    timelines: u64,
    next_id: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            frobs: HashMap::new(),
            tokens: HashMap::new(),
            lists: vec![TaskList {
                id: 1,
                name: "Inbox".to_string(),
                series: Vec::new(),
            }],
            timelines: 0,
            next_id: 2,
        }
    }
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

pub type Db = Arc<RwLock<MockState>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    db: Db,
}

type Params = BTreeMap<String, String>;

/// A remote failure: `(code, message)`.
type Failure = (u32, String);

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(RwLock::new(MockState::default())),
    };
    Router::new()
        .route("/services/rest/", get(rest))
        .route("/services/auth/", get(approve))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

/// MD5 over the secret and every parameter except `api_sig`, in key order.
pub fn signature(secret: &str, params: &Params) -> String {
    let mut payload = String::from(secret);
    for (key, value) in params.iter().filter(|(k, _)| k.as_str() != "api_sig") {
        payload.push_str(key);
        payload.push_str(value);
    }
    format!("{:x}", md5::compute(payload.as_bytes()))
}

fn check_signed(config: &MockConfig, params: &Params) -> Result<(), Failure> {
    if params.get("api_key") != Some(&config.api_key) {
        return Err((ERR_INVALID_API_KEY, "Invalid API Key".to_string()));
    }
    let expected = signature(&config.shared_secret, params);
    if params.get("api_sig") != Some(&expected) {
        return Err((ERR_INVALID_SIGNATURE, "Invalid signature".to_string()));
    }
    Ok(())
}

fn xml_reply(result: Result<String, Failure>) -> impl IntoResponse {
    let body = match result {
        Ok(inner) => format!(r#"<?xml version="1.0" encoding="UTF-8"?><rsp stat="ok">{inner}</rsp>"#),
        Err((code, msg)) => format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rsp stat="fail"><err code="{code}" msg="{}"/></rsp>"#,
            escape(msg.as_str())
        ),
    };
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body)
}

async fn rest(State(state): State<AppState>, Query(params): Query<Params>) -> impl IntoResponse {
    let method = params.get("method").cloned().unwrap_or_default();
    tracing::debug!(method = %method, "mock call");
    let result = match check_signed(&state.config, &params) {
        Ok(()) => {
            let mut db = state.db.write().await;
            dispatch(&mut db, &method, &params)
        }
        Err(failure) => Err(failure),
    };
    xml_reply(result)
}

async fn approve(State(state): State<AppState>, Query(params): Query<Params>) -> impl IntoResponse {
    if check_signed(&state.config, &params).is_err() {
        return (StatusCode::FORBIDDEN, "invalid api_key or api_sig");
    }
    let Some(frob) = params.get("frob") else {
        return (StatusCode::BAD_REQUEST, "web authentication is not supported");
    };
    let perms = params.get("perms").cloned().unwrap_or_else(|| "read".to_string());
    let mut db = state.db.write().await;
    match db.frobs.get_mut(frob) {
        Some(granted) => {
            *granted = Some(perms);
            (StatusCode::OK, "application authorized")
        }
        None => (StatusCode::NOT_FOUND, "unknown frob"),
    }
}

fn dispatch(db: &mut MockState, method: &str, params: &Params) -> Result<String, Failure> {
    match method {
        "rtm.auth.getFrob" => {
            let frob = Uuid::new_v4().simple().to_string();
            db.frobs.insert(frob.clone(), None);
            Ok(format!("<frob>{frob}</frob>"))
        }
        "rtm.auth.getToken" => {
            let frob = required(params, "frob")?;
            let perms = match db.frobs.get(frob) {
                Some(Some(perms)) => perms.clone(),
                _ => {
                    return Err((
                        ERR_INVALID_FROB,
                        "Invalid frob - did you authenticate?".to_string(),
                    ))
                }
            };
            db.frobs.remove(frob);
            let token = Uuid::new_v4().simple().to_string();
            db.tokens.insert(token.clone(), perms.clone());
            Ok(auth_xml(&token, &perms))
        }
        "rtm.auth.checkToken" => {
            let token = authorized(db, params)?;
            let perms = db.tokens.get(&token).cloned().unwrap_or_default();
            Ok(auth_xml(&token, &perms))
        }
        "rtm.timelines.create" => {
            authorized(db, params)?;
            db.timelines += 1;
            Ok(format!("<timeline>{}</timeline>", db.timelines))
        }
        "rtm.lists.add" => {
            authorized(db, params)?;
            require_timeline(db, params)?;
            let name = required(params, "name")?.to_string();
            let list = TaskList {
                id: db.next_id(),
                name,
                series: Vec::new(),
            };
            let xml = format!(
                r#"<transaction id="{}" undoable="0"/><list id="{}" name="{}" deleted="0" locked="0" archived="0" position="-1" smart="0"/>"#,
                db.next_id(),
                list.id,
                escape(list.name.as_str())
            );
            db.lists.push(list);
            Ok(xml)
        }
        "rtm.tasks.add" => {
            authorized(db, params)?;
            require_timeline(db, params)?;
            let name = required(params, "name")?.to_string();
            let list_id = match params.get("list_id") {
                Some(id) => id
                    .parse::<u64>()
                    .map_err(|_| (ERR_MISSING_ARGUMENT, "list_id invalid".to_string()))?,
                None => 1,
            };
            let series = TaskSeries {
                id: db.next_id(),
                task_id: db.next_id(),
                name,
                due: String::new(),
            };
            let transaction = db.next_id();
            let list = db
                .lists
                .iter_mut()
                .find(|l| l.id == list_id)
                .ok_or((ERR_MISSING_ARGUMENT, "list_id invalid".to_string()))?;
            list.series.push(series.clone());
            Ok(format!(
                r#"<transaction id="{transaction}" undoable="0"/><list id="{list_id}">{}</list>"#,
                series_xml(&series)
            ))
        }
        "rtm.tasks.getList" => {
            authorized(db, params)?;
            let lists: String = db
                .lists
                .iter()
                .filter(|l| !l.series.is_empty())
                .map(|l| {
                    let series: String = l.series.iter().map(series_xml).collect();
                    format!(r#"<list id="{}">{series}</list>"#, l.id)
                })
                .collect();
            Ok(format!(r#"<tasks rev="1">{lists}</tasks>"#))
        }
        other => Err((
            ERR_METHOD_NOT_FOUND,
            format!("Method \"{other}\" not found"),
        )),
    }
}

fn required<'p>(params: &'p Params, name: &str) -> Result<&'p str, Failure> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| (ERR_MISSING_ARGUMENT, format!("Missing argument {name}")))
}

fn authorized(db: &MockState, params: &Params) -> Result<String, Failure> {
    match params.get("auth_token") {
        Some(token) if db.tokens.contains_key(token) => Ok(token.clone()),
        _ => Err((
            ERR_LOGIN_FAILED,
            "Login failed / Invalid auth token".to_string(),
        )),
    }
}

fn require_timeline(db: &MockState, params: &Params) -> Result<(), Failure> {
    let valid = params
        .get("timeline")
        .and_then(|t| t.parse::<u64>().ok())
        .is_some_and(|t| t >= 1 && t <= db.timelines);
    if valid {
        Ok(())
    } else {
        Err((ERR_TIMELINE, "Timeline invalid or not provided".to_string()))
    }
}

fn auth_xml(token: &str, perms: &str) -> String {
    format!(
        r#"<auth><token>{token}</token><perms>{perms}</perms><user id="1" username="mock" fullname="Mock User"/></auth>"#
    )
}

fn series_xml(series: &TaskSeries) -> String {
    format!(
        r#"<taskseries id="{}" name="{}" source="api"><tags/><participants/><notes/><task id="{}" due="{}" has_due_time="0" completed="" deleted="" priority="N" postponed="0" estimate=""/></taskseries>"#,
        series.id,
        escape(series.name.as_str()),
        series.task_id,
        series.due
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn signature_ignores_api_sig_and_sorts_keys() {
        let a = params(&[("yxz", "foo"), ("feg", "bar"), ("abc", "baz")]);
        let mut b = a.clone();
        b.insert("api_sig".to_string(), "whatever".to_string());
        assert_eq!(signature("BANANAS", &a), "82044aae4dd676094f23f1ec152159ba");
        assert_eq!(signature("BANANAS", &b), signature("BANANAS", &a));
    }

    #[test]
    fn unknown_method_fails_with_112() {
        let mut db = MockState::default();
        let err = dispatch(&mut db, "rtm.nope", &Params::new()).unwrap_err();
        assert_eq!(err.0, ERR_METHOD_NOT_FOUND);
    }

    #[test]
    fn get_token_requires_approved_frob() {
        let mut db = MockState::default();
        db.frobs.insert("f".to_string(), None);
        let err = dispatch(&mut db, "rtm.auth.getToken", &params(&[("frob", "f")])).unwrap_err();
        assert_eq!(err.0, ERR_INVALID_FROB);

        db.frobs.insert("f".to_string(), Some("delete".to_string()));
        let xml = dispatch(&mut db, "rtm.auth.getToken", &params(&[("frob", "f")])).unwrap();
        assert!(xml.contains("<perms>delete</perms>"));
        assert!(db.frobs.is_empty());
        assert_eq!(db.tokens.len(), 1);
    }

    #[test]
    fn write_methods_need_a_timeline() {
        let mut db = MockState::default();
        db.tokens.insert("t".to_string(), "delete".to_string());
        let err = dispatch(
            &mut db,
            "rtm.lists.add",
            &params(&[("auth_token", "t"), ("name", "x")]),
        )
        .unwrap_err();
        assert_eq!(err.0, ERR_TIMELINE);
    }

    #[test]
    fn added_task_shows_up_in_get_list() {
        let mut db = MockState::default();
        db.tokens.insert("t".to_string(), "delete".to_string());
        dispatch(&mut db, "rtm.timelines.create", &params(&[("auth_token", "t")])).unwrap();
        dispatch(
            &mut db,
            "rtm.tasks.add",
            &params(&[("auth_token", "t"), ("timeline", "1"), ("name", "milk & eggs")]),
        )
        .unwrap();
        let xml = dispatch(&mut db, "rtm.tasks.getList", &params(&[("auth_token", "t")])).unwrap();
        assert!(xml.starts_with(r#"<tasks rev="1"><list id="1">"#));
        assert!(xml.contains(r#"name="milk &amp; eggs""#));
    }
}
