use reqwest::{Client, Url};
include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// Header carrying the SHA-256 digest of an Artifactory artifact.
pub const CHECKSUM_SHA256_HEADER: &str = "X-Checksum-Sha256";

pub struct Http;

impl Http {
    /// Builds the client shared by every component of one run.
    pub fn client() -> reqwest::Result<Client> {
        Client::builder().user_agent(format!("{}/{}", APP_METADATA_NAME, APP_METADATA_VERSION)).build()
    }

    /// Appends path segments to `base`, treating `base` as a directory.
    ///
    /// Empty segments and duplicate slashes are dropped, so
    /// `join_url("https://hc-ping.com/", &["uuid", "/fail"])` yields
    /// `https://hc-ping.com/uuid/fail`.
    pub fn join_url(base: &Url, segments: &[&str]) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|part| !part.is_empty()));
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_with_trailing_slash() {
        let base = Url::parse("https://hc-ping.com/").unwrap();
        let url = Http::join_url(&base, &["abc-123", "/fail"]);
        assert_eq!(url.as_str(), "https://hc-ping.com/abc-123/fail");
    }

    #[test]
    fn test_join_url_keeps_base_path() {
        let base = Url::parse("https://healthchecks.example.com/hc").unwrap();
        let url = Http::join_url(&base, &["api/v2/checks", "uuid", "pause"]);
        assert_eq!(url.as_str(), "https://healthchecks.example.com/hc/api/v2/checks/uuid/pause");
    }

    #[test]
    fn test_join_url_skips_empty_segments() {
        let base = Url::parse("https://hc-ping.com").unwrap();
        let url = Http::join_url(&base, &["uuid", ""]);
        assert_eq!(url.as_str(), "https://hc-ping.com/uuid");
    }
}
