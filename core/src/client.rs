//! Request signing, method calls and the authentication flow.
//!
//! # Design
//! `RtmClient` owns the credentials and a `Transport`. Every call is split
//! into `build_call`, which produces a signed `HttpRequest`, and
//! `parse_call`, which turns an `HttpResponse` into a `Response`. Neither
//! touches the network; `call_method` glues them to the transport. Hosts that
//! want to do the I/O themselves can use the two halves directly.
//!
//! Remote failures propagate as `RtmError` everywhere except in
//! `token_valid` and `retrieve_token`, where "not authorised (yet)" is an
//! expected answer and is reported as `false`.

use tracing::{debug, info, warn};

use crate::config::{ApiVersion, Credentials, Endpoints, Permission};
use crate::error::RtmError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::method::{MethodPath, MethodProxy};
use crate::request::build_url;
use crate::response::Response;
use crate::sign::Params;

pub const GET_FROB: &str = "rtm.auth.getFrob";
pub const GET_TOKEN: &str = "rtm.auth.getToken";
pub const CHECK_TOKEN: &str = "rtm.auth.checkToken";

/// Methods that reject the `v` parameter.
const UNVERSIONED_METHODS: &[&str] = &[GET_TOKEN, CHECK_TOKEN];

/// Synchronous client for the Remember The Milk REST API.
#[derive(Debug, Clone)]
pub struct RtmClient<T> {
    credentials: Credentials,
    endpoints: Endpoints,
    api_version: ApiVersion,
    transport: T,
}

impl<T: Transport> RtmClient<T> {
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            api_version: ApiVersion::default(),
            transport,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn perms(&self) -> Permission {
        self.credentials.perms
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.token.as_deref()
    }

    /// Replace the held token, e.g. with one restored from storage.
    pub fn set_token(&mut self, token: Option<String>) {
        self.credentials.token = token;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Proxy for the remote method (or method prefix) `name`.
    pub fn method(&self, name: &str) -> MethodProxy<'_, T> {
        MethodProxy::new(self, MethodPath::new(name))
    }

    /// Signed GET request for `method`. Adds `method` and, when configured,
    /// `v=2`; the caller supplies every other parameter.
    pub fn build_call(&self, method: &str, mut params: Params) -> HttpRequest {
        if self.api_version == ApiVersion::V2 && !UNVERSIONED_METHODS.contains(&method) {
            params.insert_default("v", "2");
        }
        params.insert("method", method);
        let url = build_url(&self.endpoints.rest_url, &self.credentials.shared_secret, &params);
        HttpRequest::get(url)
    }

    /// Check the status and the `<rsp>` envelope of a reply to `method`.
    pub fn parse_call(&self, method: &str, response: HttpResponse) -> Result<Response, RtmError> {
        check_status(method, &response)?;
        Response::from_xml(method, &response.body).inspect_err(|err| {
            if let RtmError::MethodFailed { code, message, .. } = err {
                warn!(method, code = %code, message = %message, "remote method failed");
            }
        })
    }

    /// Call `method` with `api_key` and no token.
    pub fn call_method(&self, method: &str, mut params: Params) -> Result<Response, RtmError> {
        params.insert_default("api_key", &self.credentials.api_key);
        debug!(method, "calling remote method");
        let request = self.build_call(method, params);
        let response = self.transport.send(&request)?;
        self.parse_call(method, response)
    }

    /// Call `method` with `api_key` and, when one is held, `auth_token`.
    /// Parameters supplied by the caller take precedence.
    pub fn call_method_auth(&self, method: &str, mut params: Params) -> Result<Response, RtmError> {
        if let Some(token) = self.token() {
            params.insert_default("auth_token", token);
        }
        self.call_method(method, params)
    }

    /// Start desktop authentication. Returns the URL the user must open and
    /// the frob to pass to `retrieve_token` once they have approved.
    pub fn authenticate_desktop(&self) -> Result<(String, String), RtmError> {
        let rsp = self.call_method(GET_FROB, Params::new())?;
        let frob = rsp
            .get("frob")
            .value()
            .ok_or_else(|| RtmError::MalformedResponse {
                method: GET_FROB.to_string(),
                detail: "reply has no <frob>".to_string(),
            })?
            .to_string();
        let url = self.auth_url(Some(&frob));
        Ok((url, frob))
    }

    /// Authorisation URL for web applications; the service redirects back to
    /// the application's registered callback with a frob.
    pub fn authenticate_webapp(&self) -> String {
        self.auth_url(None)
    }

    /// Whether the held token is accepted by the service. Without a token no
    /// request is made.
    pub fn token_valid(&self) -> Result<bool, RtmError> {
        let Some(token) = self.token() else {
            return Ok(false);
        };
        match self.call_method(CHECK_TOKEN, Params::new().with("auth_token", token)) {
            Ok(_) => Ok(true),
            Err(err) if err.is_remote_failure() => {
                debug!(error = %err, "token rejected");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Exchange an approved frob for a token and keep it. On a remote
    /// failure the held token is cleared and `false` is returned.
    pub fn retrieve_token(&mut self, frob: &str) -> Result<bool, RtmError> {
        let rsp = match self.call_method(GET_TOKEN, Params::new().with("frob", frob)) {
            Ok(rsp) => rsp,
            Err(err) if err.is_remote_failure() => {
                info!(error = %err, "token not granted, clearing held token");
                self.credentials.token = None;
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        let token = rsp
            .get("auth")
            .get("token")
            .value()
            .ok_or_else(|| RtmError::MalformedResponse {
                method: GET_TOKEN.to_string(),
                detail: "reply has no <auth><token>".to_string(),
            })?;
        info!("token granted");
        self.credentials.token = Some(token.to_string());
        Ok(true)
    }

    fn auth_url(&self, frob: Option<&str>) -> String {
        let mut params = Params::new()
            .with("api_key", &self.credentials.api_key)
            .with("perms", self.credentials.perms);
        if let Some(frob) = frob {
            params.insert("frob", frob);
        }
        build_url(&self.endpoints.auth_url, &self.credentials.shared_secret, &params)
    }
}

/// Map a non-200 status to `RtmError::RequestFailed`.
fn check_status(method: &str, response: &HttpResponse) -> Result<(), RtmError> {
    if response.status == 200 {
        return Ok(());
    }
    warn!(method, status = response.status, reason = %response.reason, "request failed");
    Err(RtmError::RequestFailed {
        method: method.to_string(),
        status: response.status,
        reason: response.reason.clone(),
    })
}
