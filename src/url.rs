use crate::error::Error;
use crate::query::QueryMap;

pub const YOUTUBE_URL: &str = "https://youtube.com/";

const URL_MARKERS: [&str; 3] = ["youtu.be/", "www.youtube", "youtube.com/embed/"];

/// Whether this extractor should handle `url` at all. Used by upstream
/// dispatch to pick an extractor before normalization runs.
pub fn valid_url(url: &str) -> bool {
    URL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Maps the known alternate URL shapes onto the canonical watch URL. The
/// rewrites are ordered literal substitutions; whatever survives them must
/// carry a `v` parameter. Idempotent.
pub fn normalize(url: &str) -> Result<String, Error> {
    let rewritten = url
        .replace("youtu.be/", "youtube.com/watch?v=")
        .replace("youtube.com/embed/", "youtube.com/watch?v=")
        .replace("/v/", "/watch?v=")
        .replace("/watch#", "/watch?")
        .replace("youtube.com/shorts/", "youtube.com/watch?v=");

    match QueryMap::parse(&rewritten).get("v") {
        Some(id) => Ok(format!("{}watch?v={}", YOUTUBE_URL, id)),
        None => Err(Error::InvalidUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_shapes() {
        let canonical = "https://youtube.com/watch?v=abc123";
        for url in [
            "https://youtu.be/abc123",
            "https://www.youtube.com/embed/abc123",
            "https://www.youtube.com/v/abc123",
            "https://www.youtube.com/watch#v=abc123",
            "https://www.youtube.com/shorts/abc123",
            "https://www.youtube.com/watch?v=abc123",
        ] {
            assert_eq!(normalize(url).unwrap(), canonical, "input: {}", url);
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("https://youtu.be/abc123").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn rejects_urls_without_video_id() {
        assert!(matches!(
            normalize("https://www.youtube.com/feed/trending"),
            Err(Error::InvalidUrl)
        ));
    }

    #[test]
    fn url_markers() {
        assert!(valid_url("https://youtu.be/abc"));
        assert!(valid_url("https://www.youtube.com/watch?v=abc"));
        assert!(valid_url("https://youtube.com/embed/abc"));
        assert!(!valid_url("https://vimeo.com/12345"));
    }
}
