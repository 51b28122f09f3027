use url::Url;

const INVALID_SCHEME: &str = "service endpoint scheme must be https:// or http://";
const MISSING_HOST: &str = "service endpoint must contain a host";

/// Clap value_parser for `--service-endpoint`.
pub fn check_endpoint(url: &str) -> Result<String, String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(INVALID_SCHEME.to_string());
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(MISSING_HOST.to_string());
    }

    Ok(url.to_string())
}
