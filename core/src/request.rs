//! Signed request URL construction.

use url::form_urlencoded;

use crate::sign::{sign, Params, API_SIG};

/// Build `base_url?k=v&...&api_sig=...` from `params`.
///
/// The signature is computed over exactly the pairs that are encoded, then
/// appended last. Keys and values are form-urlencoded (space becomes `+`).
pub fn build_url(base_url: &str, secret: &str, params: &Params) -> String {
    let signature = sign(secret, params);
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.present() {
        query.append_pair(key, value);
    }
    query.append_pair(API_SIG, &signature);
    format!("{base_url}?{}", query.finish())
}
