use url::Url;

/// Hosts whose `/redirect` endpoint wraps the real destination in a `q` parameter.
const REDIRECT_HOSTS: &[&str] = &["youtube.com"];

/// Path of the redirect endpoint.
const REDIRECT_PATH: &str = "/redirect";

/// Query parameter carrying the wrapped destination.
const DESTINATION_PARAM: &str = "q";

/// Unwrap a redirect-wrapper URL into its real destination.
///
/// Anything that is not a recognised wrapper, or a wrapper without a usable
/// `q` parameter, is returned unchanged.
#[must_use]
pub fn unwrap_redirect(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if !is_redirect_wrapper(&parsed) {
        return url.to_string();
    }

    // query_pairs percent-decodes the value for us
    parsed
        .query_pairs()
        .find(|(key, _)| key == DESTINATION_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| url.to_string())
}

fn is_redirect_wrapper(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    let host_matches = REDIRECT_HOSTS
        .iter()
        .any(|wrapper| host == *wrapper || host.ends_with(&format!(".{wrapper}")));

    host_matches && url.path() == REDIRECT_PATH
}
