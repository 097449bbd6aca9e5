//! Pipeline driver: canonical watch URL -> page fetch -> player-response
//! location -> stream candidates. Candidate-level anomalies are skipped so
//! one bad entry never aborts the batch; page-level failures surface as a
//! single typed error.

use crate::error::Error;
use crate::json;
use crate::manifest;
use crate::player_response::{self, PlayerResponse};
use crate::query::{self, QueryMap};
use crate::url;
use crate::util::Fetch;
use crate::video::{StreamQuery, Video, VideoInfo};

const PLAYBACK: &str = "videoplayback";
const DEFAULT_SIGNATURE_KEY: &str = "signature";

pub use crate::url::valid_url;

/// Extracts every stream candidate for `url`, ordered ascending by
/// `(resolution, audio_bitrate)`. An input with zero discoverable streams
/// and no playability error yields an empty list.
pub async fn get_all_videos<F: Fetch + Sync>(client: &F, url: &str) -> Result<Vec<Video>, Error> {
    let watch_url = url::normalize(url)?;

    debug!("fetching watch page {}", watch_url);
    let source = client.fetch_text(&watch_url).await?;

    let mut videos = parse_videos(client, &source).await?;
    videos.sort_by_key(|v| (v.resolution(), v.audio_bitrate()));

    Ok(videos)
}

async fn parse_videos<F: Fetch + Sync>(client: &F, source: &str) -> Result<Vec<Video>, Error> {
    let js_player_url = player_response::find_js_player_url(source).ok_or_else(|| {
        Error::MalformedPlayerResponse("no player script URL in page".to_string())
    })?;

    let response = PlayerResponse::from_html(source)?;

    if let Some(status) = &response.playability_status {
        if status.is_error() {
            return Err(Error::UnavailableStream(
                status
                    .reason
                    .clone()
                    .unwrap_or_else(|| "video has no playable stream".to_string()),
            ));
        }
    }

    let details = response.video_details.as_ref();
    if details.map(|d| d.is_live).unwrap_or(false) {
        return Err(Error::UnavailableStream(
            "live streams are not supported".to_string(),
        ));
    }

    let info = details.map(|d| VideoInfo {
        title: d.title.clone(),
        length_seconds: d.length_seconds,
        author: d.author.clone(),
    });

    let mut videos = Vec::new();

    // Legacy comma-separated stream map, present on very old page snapshots.
    if let Some(map) = json::get_string_value(source, "url_encoded_fmt_stream_map") {
        for entry in map.split(',') {
            let (stream, key) = unscramble(entry);
            add_candidate(&mut videos, &info, stream, &js_player_url, &key);
        }
    }

    if let Some(streaming) = &response.streaming_data {
        let formats = streaming
            .formats
            .iter()
            .flatten()
            .chain(streaming.adaptive_formats.iter().flatten());

        for item in formats {
            match &item.url {
                Some(direct) if !direct.is_empty() => {
                    let stream = StreamQuery {
                        uri: direct.clone(),
                        is_encrypted: false,
                    };
                    add_candidate(
                        &mut videos,
                        &info,
                        stream,
                        &js_player_url,
                        DEFAULT_SIGNATURE_KEY,
                    );
                }
                _ => {
                    if let Some(scrambled) = item.scrambled_query() {
                        let (stream, key) = unscramble(scrambled);
                        add_candidate(&mut videos, &info, stream, &js_player_url, &key);
                    }
                }
            }
        }
    }

    match json::get_string_value(source, "adaptive_fmts") {
        Some(map) => {
            for entry in map.split(',') {
                let (stream, key) = unscramble(entry);
                add_candidate(&mut videos, &info, stream, &js_player_url, &key);
            }
        }
        None => {
            // A dashmpd manifest is only consulted when the page carries no
            // adaptive_fmts map of its own.
            if let Some(dashmpd) = json::get_string_value(source, "dashmpd") {
                let manifest_url = query::percent_decode(dashmpd).replace(r"\/", "/");
                debug!("fetching dash manifest {}", manifest_url);
                let manifest_text = client.fetch_text(&manifest_url).await?.replace(r"\/", "/");

                match manifest::media_uris(&manifest_text) {
                    Ok(uris) => {
                        for uri in uris {
                            add_candidate(
                                &mut videos,
                                &info,
                                unscramble_manifest_uri(&uri),
                                &js_player_url,
                                DEFAULT_SIGNATURE_KEY,
                            );
                        }
                    }
                    Err(e) => debug!("skipping unparseable dash manifest: {}", e),
                }
            }
        }
    }

    Ok(videos)
}

fn add_candidate(
    videos: &mut Vec<Video>,
    info: &Option<VideoInfo>,
    stream: StreamQuery,
    js_player_url: &str,
    signature_key: &str,
) {
    match Video::from_query(info.clone(), stream, js_player_url, signature_key) {
        Some(video) => videos.push(video),
        None => debug!("skipping stream candidate without a parseable itag"),
    }
}

/// Unscrambles one `k=v&...` cipher entry into a usable (or
/// decryption-pending) stream URI, returning it together with the page's
/// signature key name.
pub(crate) fn unscramble(entry: &str) -> (StreamQuery, String) {
    let entry = entry.replace(r"\u0026", "&");
    let query = QueryMap::parse(&entry);

    let mut uri = query.get("url").unwrap_or_default().to_string();
    let signature_key = query
        .get("sp")
        .unwrap_or(DEFAULT_SIGNATURE_KEY)
        .to_string();

    let mut encrypted = false;
    if let Some(signature) = query.get("s") {
        // Scrambled signature: append a placeholder the decipher step will
        // overwrite on first URI access.
        encrypted = true;
        uri.push_str(&signature_and_host(&signature_key, signature, &query));
    } else if let Some(signature) = query.get("sig") {
        uri.push_str(&signature_and_host(&signature_key, signature, &query));
    }

    let mut uri = query::percent_decode(&query::percent_decode(&uri));

    if !QueryMap::parse(&uri).contains_key("ratebypass") {
        uri.push_str("&ratebypass=yes");
    }

    (
        StreamQuery {
            uri,
            is_encrypted: encrypted,
        },
        signature_key,
    )
}

fn signature_and_host(key: &str, signature: &str, query: &QueryMap) -> String {
    let mut result = format!("&{}={}", key, signature);

    if let Some(host) = query.get("fallback_host") {
        result.push_str("&fallback_host=");
        result.push_str(host);
    }

    result
}

/// Rebuilds a path-segment-encoded DASH media URI
/// (`.../videoplayback/k1/v1/k2/v2/...`) as a standard query URL.
pub(crate) fn unscramble_manifest_uri(manifest_uri: &str) -> StreamQuery {
    let start = manifest_uri
        .find(PLAYBACK)
        .map(|idx| idx + PLAYBACK.len())
        .unwrap_or(manifest_uri.len());

    let base = &manifest_uri[..start];
    let segments: Vec<&str> = manifest_uri[start..]
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut uri = String::from(base);
    uri.push('?');

    for (i, pair) in segments.chunks(2).enumerate() {
        if pair.len() < 2 {
            break;
        }
        if i > 0 {
            uri.push('&');
        }
        uri.push_str(pair[0]);
        uri.push('=');
        uri.push_str(&pair[1].replace("%2F", "/"));
    }

    StreamQuery {
        uri,
        is_encrypted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::util::{Fetch, FetchError};

    struct PageFetcher {
        page: String,
    }

    #[async_trait::async_trait]
    impl Fetch for PageFetcher {
        async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.page.clone())
        }
    }

    fn watch_page(player_response: &str) -> String {
        format!(
            r#"<html><script>{{"jsUrl": "/s/player/abc/base.js"}}</script><script>var ytInitialPlayerResponse = {};</script></html>"#,
            player_response
        )
    }

    #[test]
    fn unscramble_scrambled_signature() {
        let (stream, key) =
            unscramble("s=SCRAMBLED&sp=sig&url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D22");

        assert_eq!(key, "sig");
        assert!(stream.is_encrypted);
        assert_eq!(
            stream.uri,
            "https://host/videoplayback?itag=22&sig=SCRAMBLED&ratebypass=yes"
        );
    }

    #[test]
    fn unscramble_defaults_signature_key() {
        let (stream, key) =
            unscramble("s=SCRAMBLED&url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D22");

        assert_eq!(key, "signature");
        assert!(stream.is_encrypted);
        assert_eq!(
            stream.uri,
            "https://host/videoplayback?itag=22&signature=SCRAMBLED&ratebypass=yes"
        );
    }

    #[test]
    fn unscramble_legacy_plain_signature() {
        let (stream, _) =
            unscramble("sig=PLAIN&url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D22");

        assert!(!stream.is_encrypted);
        assert_eq!(
            stream.uri,
            "https://host/videoplayback?itag=22&signature=PLAIN&ratebypass=yes"
        );
    }

    #[test]
    fn unscramble_propagates_fallback_host() {
        let (stream, _) = unscramble(
            "s=S&fallback_host=alt.host&url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D22",
        );

        assert!(stream.uri.contains("&fallback_host=alt.host"));
    }

    #[test]
    fn unscramble_keeps_existing_ratebypass() {
        let (stream, _) = unscramble(
            "url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D22%26ratebypass%3Dyes",
        );

        assert_eq!(
            stream.uri,
            "https://host/videoplayback?itag=22&ratebypass=yes"
        );
    }

    #[test]
    fn manifest_uri_unscrambling() {
        let stream = unscramble_manifest_uri(
            "https://host/api/manifest/dash/videoplayback/id/abc%2Fdef/itag/137/source/youtube",
        );

        assert!(!stream.is_encrypted);
        assert_eq!(
            stream.uri,
            "https://host/api/manifest/dash/videoplayback?id=abc/def&itag=137&source=youtube"
        );
    }

    #[tokio::test]
    async fn builds_candidates_from_streaming_data() {
        let page = watch_page(
            r#"{"videoDetails": {"title": "t", "lengthSeconds": "61", "author": "a"},
                "streamingData": {
                    "formats": [{"itag": 22, "url": "https://host/videoplayback?itag=22"}],
                    "adaptiveFormats": [
                        {"itag": 137, "signatureCipher": "s=SCRAMBLED&sp=sig&url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D137"},
                        {"itag": 9999999, "url": ""}
                    ]
                }}"#,
        );
        let client = PageFetcher { page };

        let videos = get_all_videos(&client, "https://youtu.be/abc123")
            .await
            .unwrap();

        assert_eq!(videos.len(), 2);
        // Sorted ascending: the adaptive 1080p entry outranks the muxed 720p.
        assert_eq!(videos[0].format_code(), 22);
        assert!(!videos[0].is_encrypted());
        assert_eq!(videos[0].title(), Some("t"));
        assert_eq!(
            videos[0].js_player_url(),
            "https://www.youtube.com/s/player/abc/base.js"
        );

        assert_eq!(videos[1].format_code(), 137);
        assert!(videos[1].is_encrypted());
    }

    #[tokio::test]
    async fn legacy_stream_map_and_streaming_data_are_not_exclusive() {
        let page = concat!(
            r#"<html><script>{"jsUrl": "/s/player/abc/base.js", "#,
            r#""url_encoded_fmt_stream_map": "url=https%3A%2F%2Fhost%2Fvideoplayback%3Fitag%3D43&sig=SIG"}</script>"#,
            r#"<script>var ytInitialPlayerResponse = {"videoDetails": {"title": "t"}, "#,
            r#""streamingData": {"formats": [{"itag": 22, "url": "https://host/videoplayback?itag=22"}]}};</script></html>"#,
        );
        let client = PageFetcher {
            page: page.to_string(),
        };

        let videos = get_all_videos(&client, "https://youtu.be/abc123")
            .await
            .unwrap();

        let codes: Vec<i64> = videos.iter().map(|v| v.format_code()).collect();
        assert_eq!(codes, vec![43, 22]);
        assert!(videos.iter().all(|v| !v.is_encrypted()));
        assert!(videos[0].raw_uri().ends_with("&signature=SIG&ratebypass=yes"));
    }

    struct ManifestFetcher {
        page: String,
        manifest: String,
    }

    #[async_trait::async_trait]
    impl Fetch for ManifestFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("/api/manifest/") {
                Ok(self.manifest.clone())
            } else {
                Ok(self.page.clone())
            }
        }
    }

    #[tokio::test]
    async fn dash_manifest_fallback() {
        let page = concat!(
            r#"<html><script>{"jsUrl": "/s/player/abc/base.js", "#,
            r#""dashmpd": "https:\/\/host\/api\/manifest\/dash"}</script>"#,
            r#"<script>var ytInitialPlayerResponse = {"videoDetails": {"title": "t"}};</script></html>"#,
        );
        let manifest = concat!(
            r#"<MPD><Period><Representation id="140">"#,
            r#"<BaseURL>https://host2/videoplayback/itag/140/source/youtube</BaseURL>"#,
            r#"</Representation></Period></MPD>"#,
        );
        let client = ManifestFetcher {
            page: page.to_string(),
            manifest: manifest.to_string(),
        };

        let videos = get_all_videos(&client, "https://youtu.be/abc123")
            .await
            .unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].format_code(), 140);
        assert!(!videos[0].is_encrypted());
        assert_eq!(
            videos[0].raw_uri(),
            "https://host2/videoplayback?itag=140&source=youtube"
        );
    }

    #[tokio::test]
    async fn playability_error_is_unavailable() {
        let page = watch_page(
            r#"{"playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}}"#,
        );
        let client = PageFetcher { page };

        match get_all_videos(&client, "https://youtu.be/abc123").await {
            Err(Error::UnavailableStream(reason)) => assert_eq!(reason, "Video unavailable"),
            other => panic!("expected UnavailableStream, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn live_stream_is_unavailable() {
        let page = watch_page(
            r#"{"videoDetails": {"title": "t", "isLive": true},
                "streamingData": {"formats": [{"itag": 22, "url": "https://host/videoplayback?itag=22"}]}}"#,
        );
        let client = PageFetcher { page };

        assert!(matches!(
            get_all_videos(&client, "https://youtu.be/abc123").await,
            Err(Error::UnavailableStream(_))
        ));
    }

    #[tokio::test]
    async fn page_without_streams_yields_empty_list() {
        let page = watch_page(r#"{"videoDetails": {"title": "t"}}"#);
        let client = PageFetcher { page };

        let videos = get_all_videos(&client, "https://youtu.be/abc123")
            .await
            .unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_fetch() {
        let client = PageFetcher {
            page: String::new(),
        };

        assert!(matches!(
            get_all_videos(&client, "https://example.com/watch").await,
            Err(Error::InvalidUrl)
        ));
    }

    #[tokio::test]
    async fn page_without_player_script_is_malformed() {
        let page = r#"<html><script>var ytInitialPlayerResponse = {"videoDetails": {"title": "t"}};</script></html>"#;
        let client = PageFetcher {
            page: page.to_string(),
        };

        assert!(matches!(
            get_all_videos(&client, "https://youtu.be/abc123").await,
            Err(Error::MalformedPlayerResponse(_))
        ));
    }
}
