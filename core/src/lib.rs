//! Synchronous client for the Remember The Milk REST API.
//!
//! # Overview
//! Requests are signed GET calls to a single REST endpoint; replies are XML
//! wrapped in `<rsp stat="ok|fail">`. The crate signs requests, runs the
//! desktop authentication flow and exposes replies through a schema-free
//! view, so any method of the service can be called without declaring its
//! reply type.
//!
//! ```no_run
//! use rtm_core::{Credentials, Params, Permission, Resolve, RtmClient, UreqTransport};
//!
//! # fn main() -> Result<(), rtm_core::RtmError> {
//! let creds = Credentials::new("api-key", "shared-secret").with_perms(Permission::Delete);
//! let mut client = RtmClient::new(creds, UreqTransport::default());
//!
//! if !client.token_valid()? {
//!     let (url, frob) = client.authenticate_desktop()?;
//!     println!("approve access at {url}, then press enter");
//!     # let _ = std::io::stdin().read_line(&mut String::new());
//!     client.retrieve_token(&frob)?;
//! }
//!
//! let result = client
//!     .method("rtm")
//!     .resolve("tasks")
//!     .resolve("getList")
//!     .call(Params::new().with("filter", "status:incomplete"))?;
//! for list in result.get("tasks").iter() {
//!     for series in list.iter() {
//!         let due = series.get("task").get("due").as_str().unwrap_or("-");
//!         println!("{due} {}", series.get("name").as_str().unwrap_or_default());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `RtmClient` splits every call into `build_call` and `parse_call`; the
//!   `Transport` trait is the only I/O seam.
//! - `MethodProxy` and the reply views share one capability, `Resolve`:
//!   look a name up and get the next step of the chain.
//! - Which reply elements are collections is data in `schema`, not code.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod method;
pub mod request;
pub mod response;
pub mod schema;
pub mod sign;
pub mod xml;

pub use client::RtmClient;
pub use config::{ApiVersion, Credentials, Endpoints, ParsePermissionError, Permission};
pub use error::RtmError;
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use method::{MethodPath, MethodProxy};
pub use request::build_url;
pub use response::{Field, NodeList, Response, ResponseNode};
pub use sign::{sign, Params};
pub use xml::Element;

/// Name lookup that yields the next step of a chain.
///
/// On a `MethodProxy` the next step is a longer method name; on a reply view
/// it is a `Field`.
pub trait Resolve {
    type Output;

    fn resolve(&self, name: &str) -> Self::Output;
}
