//! Dotted remote-method names built one lookup at a time.
//!
//! `client.method("rtm").resolve("tasks").resolve("getList")` names
//! `rtm.tasks.getList`; nothing is sent until `call`.

use std::fmt;

use crate::client::RtmClient;
use crate::error::RtmError;
use crate::http::Transport;
use crate::response::Response;
use crate::sign::Params;
use crate::Resolve;

/// Immutable dotted method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPath(String);

impl MethodPath {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{segment}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote method bound to a client, ready to be called.
pub struct MethodProxy<'c, T> {
    client: &'c RtmClient<T>,
    path: MethodPath,
}

impl<'c, T: Transport> MethodProxy<'c, T> {
    pub(crate) fn new(client: &'c RtmClient<T>, path: MethodPath) -> Self {
        Self { client, path }
    }

    pub fn path(&self) -> &MethodPath {
        &self.path
    }

    /// Invoke the method with the client's `api_key` and `auth_token`.
    pub fn call(&self, params: Params) -> Result<Response, RtmError> {
        self.client.call_method_auth(self.path.as_str(), params)
    }
}

impl<'c, T: Transport> Resolve for MethodProxy<'c, T> {
    type Output = MethodProxy<'c, T>;

    fn resolve(&self, name: &str) -> Self::Output {
        MethodProxy::new(self.client, self.path.child(name))
    }
}

impl<T> fmt::Debug for MethodProxy<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MethodProxy {}>", self.path)
    }
}
