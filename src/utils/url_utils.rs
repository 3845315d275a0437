//! URL helpers.

use anyhow::{Context, Result};
use url::Url;

/// Extract the host portion of a URL.
pub fn domain_of(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("failed to parse URL {url_str}"))?;
    url.host_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| anyhow::anyhow!("URL has no host: {url_str}"))
}

/// Whether two URLs share a host.
#[must_use]
pub fn same_domain(a: &str, b: &str) -> bool {
    match (domain_of(a), domain_of(b)) {
        (Ok(da), Ok(db)) => da.eq_ignore_ascii_case(&db),
        _ => false,
    }
}

/// Join a path onto a base URL, tolerating trailing slashes.
pub fn join_path(base: &str, path: &str) -> Result<String> {
    let url = Url::parse(base).with_context(|| format!("failed to parse base URL {base}"))?;
    let joined = url
        .join(path)
        .with_context(|| format!("failed to join {path} onto {base}"))?;
    Ok(joined.to_string())
}
