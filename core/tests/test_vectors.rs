//! Verify signing and URL building against JSON vectors in `test-vectors/`.
//!
//! Each case lists the secret, the parameters (`null` marks an explicitly
//! absent value) and the expected digest or URL.

use rtm_core::{build_url, sign, HttpResponse, Params, Response, RtmError};

/// Build `Params` from a JSON object, mapping `null` to an absent value.
fn params_from(value: &serde_json::Value) -> Params {
    let mut params = Params::new();
    for (key, value) in value.as_object().unwrap() {
        match value.as_str() {
            Some(v) => params.insert(key.as_str(), v),
            None => params.insert_absent(key.as_str()),
        }
    }
    params
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

#[test]
fn sign_test_vectors() {
    let raw = include_str!("../../test-vectors/sign.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let secret = case["secret"].as_str().unwrap();
        let params = params_from(&case["params"]);

        assert_eq!(
            sign(secret, &params),
            case["expected"].as_str().unwrap(),
            "{name}: signature"
        );
    }
}

// ---------------------------------------------------------------------------
// URL building
// ---------------------------------------------------------------------------

#[test]
fn url_test_vectors() {
    let raw = include_str!("../../test-vectors/url.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let base_url = case["base_url"].as_str().unwrap();
        let secret = case["secret"].as_str().unwrap();
        let params = params_from(&case["params"]);

        assert_eq!(
            build_url(base_url, secret, &params),
            case["expected_url"].as_str().unwrap(),
            "{name}: url"
        );
    }
}

// ---------------------------------------------------------------------------
// Reply navigation
// ---------------------------------------------------------------------------

#[test]
fn get_list_reply_navigation() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<rsp stat="ok">
  <tasks rev="rev1">
    <list id="100653">
      <taskseries id="117192" created="2006-05-07T10:19:54Z" modified="2006-05-07T10:19:54Z"
                  name="Get Bananas" source="api" url="" location_id="">
        <tags/>
        <participants/>
        <notes/>
        <task id="117192" due="2006-05-09T00:00:00Z" has_due_time="0" added="2006-05-07T10:19:54Z"
              completed="" deleted="" priority="N" postponed="0" estimate=""/>
      </taskseries>
      <taskseries id="117193" name="Call Mum" source="js">
        <tags><tag>family</tag><tag>phone</tag></tags>
        <task id="117193" due="" priority="1"/>
      </taskseries>
      <deleted>
        <taskseries id="117100"><task id="117100" deleted="2006-05-06T10:00:00Z"/></taskseries>
      </deleted>
    </list>
    <list id="100654"/>
  </tasks>
</rsp>"#;
    let rsp = Response::from_xml("rtm.tasks.getList", body).unwrap();

    let tasks = rsp.get("tasks");
    assert_eq!(tasks.get("rev").as_str(), Some("rev1"));
    assert_eq!(tasks.len(), 2);

    let inbox = tasks.at(0);
    assert_eq!(inbox.get("id").as_str(), Some("100653"));
    assert_eq!(inbox.len(), 2);

    let first = inbox.at(0);
    assert_eq!(first.get("name").as_str(), Some("Get Bananas"));
    assert_eq!(
        first.get("task").get("due").as_str(),
        Some("2006-05-09T00:00:00Z")
    );
    assert_eq!(first.get("tags").len(), 0);

    let second = inbox.at(1);
    let tags: Vec<&str> = second.get("tags").iter().filter_map(|t| t.text()).collect();
    assert_eq!(tags, vec!["family", "phone"]);
    assert_eq!(second.get("task").get("due").as_str(), Some(""));
    assert!(second.get("notes").is_absent());

    let deleted = inbox.get("deleted");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted.at(0).get("id").as_str(), Some("117100"));

    assert!(tasks.at(1).is_empty());
}

#[test]
fn failure_reply_vector() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?><rsp stat="fail"><err code="112" msg="Method &quot;rtm.foo&quot; not found"/></rsp>"#;
    let err = Response::from_xml("rtm.foo", body).unwrap_err();
    assert_eq!(err.code(), Some("112"));
    assert_eq!(
        err.to_string(),
        r#"request rtm.foo failed. Code: 112, message: Method "rtm.foo" not found"#
    );
}

#[test]
fn html_error_page_is_rejected() {
    let response = HttpResponse::ok("<html><head><title>Down</title></head><body/></html>");
    let err = Response::from_xml("rtm.test.echo", &response.body).unwrap_err();
    assert!(matches!(err, RtmError::MalformedResponse { .. }));
}
