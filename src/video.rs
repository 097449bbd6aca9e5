use crate::cipher::DecipherProgram;
use crate::error::Error;
use crate::format::{self, AdaptiveKind, AudioFormat, FormatDescriptor, VideoFormat};
use crate::query::QueryMap;
use crate::util::Fetch;

/// One raw stream location produced by unscrambling a cipher entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub uri: String,
    pub is_encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub length_seconds: Option<i64>,
    pub author: Option<String>,
}

/// One playable stream candidate. The URI may still carry a scrambled
/// signature; `uri()` resolves it lazily, exactly once.
#[derive(Debug, Clone)]
pub struct Video {
    info: Option<VideoInfo>,
    format_code: i64,
    uri: String,
    encrypted: bool,
    needs_n_descramble: bool,
    js_player_url: String,
    signature_key: String,
}

impl Video {
    /// Builds a candidate from an unscrambled query. The itag is parsed once
    /// here; entries without one are not candidates at all.
    pub(crate) fn from_query(
        info: Option<VideoInfo>,
        query: StreamQuery,
        js_player_url: &str,
        signature_key: &str,
    ) -> Option<Video> {
        let uri_query = QueryMap::parse(&query.uri);
        let format_code = uri_query.get("itag")?.parse().ok()?;

        Some(Video {
            info,
            format_code,
            needs_n_descramble: uri_query.contains_key("n"),
            uri: query.uri,
            encrypted: query.is_encrypted,
            js_player_url: js_player_url.to_string(),
            signature_key: signature_key.to_string(),
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.title.as_deref())
    }

    pub fn info(&self) -> Option<&VideoInfo> {
        self.info.as_ref()
    }

    pub fn format_code(&self) -> i64 {
        self.format_code
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn needs_n_descramble(&self) -> bool {
        self.needs_n_descramble
    }

    /// The stored URI as-is, without triggering decryption.
    pub fn raw_uri(&self) -> &str {
        &self.uri
    }

    pub fn js_player_url(&self) -> &str {
        &self.js_player_url
    }

    /// Resolves the final playable URL. The first call on an encrypted
    /// candidate fetches the player script, replays the decipher program on
    /// the signature and rewrites the stored URI; every later call is a pure
    /// read.
    pub async fn uri<F: Fetch + Sync>(&mut self, client: &F) -> Result<String, Error> {
        if self.encrypted {
            self.uri = self.decrypt(client).await?;
            self.encrypted = false;
        }

        if self.needs_n_descramble {
            warn!(
                "itag {} carries an n parameter; descrambling it is not supported and playback may be throttled",
                self.format_code
            );
            self.needs_n_descramble = false;
        }

        Ok(self.uri.clone())
    }

    async fn decrypt<F: Fetch + Sync>(&self, client: &F) -> Result<String, Error> {
        let mut query = QueryMap::parse(&self.uri);

        let signature = match query.get(&self.signature_key) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return Ok(self.uri.clone()),
        };

        let js = client.fetch_text(&self.js_player_url).await?;
        let program = DecipherProgram::from_js(&js)?;

        query.set(&self.signature_key, &program.apply(&signature));
        Ok(query.to_string())
    }

    pub fn descriptor(&self) -> FormatDescriptor {
        format::descriptor(self.format_code)
    }

    pub fn resolution(&self) -> i32 {
        format::resolution(self.format_code)
    }

    pub fn fps(&self) -> i32 {
        format::fps(self.format_code)
    }

    pub fn audio_bitrate(&self) -> i32 {
        format::audio_bitrate(self.format_code)
    }

    pub fn video_format(&self) -> VideoFormat {
        format::video_format(self.format_code)
    }

    pub fn audio_format(&self) -> AudioFormat {
        format::audio_format(self.format_code)
    }

    pub fn adaptive_kind(&self) -> AdaptiveKind {
        format::adaptive_kind(self.format_code)
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive_kind() != AdaptiveKind::None
    }

    pub fn is_3d(&self) -> bool {
        format::is_3d(self.format_code)
    }
}

/// A candidate from some other extractor: a direct URL with no capability
/// data to rank on.
#[derive(Debug, Clone)]
pub struct OtherVideo {
    pub title: Option<String>,
    pub uri: String,
}

/// Candidate list element for selection. Ranking only understands
/// `Standard` entries; a list containing anything else falls back to its
/// first element.
#[derive(Debug, Clone)]
pub enum AnyVideo {
    Standard(Video),
    Other(OtherVideo),
}

/// Picks the best candidate under a resolution ceiling and an optional
/// audio-bitrate ceiling (-1 = unconstrained). Candidates are ordered
/// ascending by `(resolution, audio_bitrate)` and the last survivor wins.
pub fn find_video(
    videos: &[AnyVideo],
    max_resolution: i32,
    max_audio_bitrate: i32,
) -> Option<&AnyVideo> {
    let first = videos.first()?;

    let mut standard = Vec::with_capacity(videos.len());
    for any in videos {
        match any {
            AnyVideo::Standard(video) => standard.push((any, video)),
            AnyVideo::Other(_) => return Some(first),
        }
    }

    standard.retain(|(_, video)| {
        if max_audio_bitrate < 0 {
            video.resolution() <= max_resolution
        } else {
            video.resolution() <= max_resolution
                && video.audio_bitrate() >= 0
                && video.audio_bitrate() <= max_audio_bitrate
        }
    });
    standard.sort_by_key(|(_, video)| (video.resolution(), video.audio_bitrate()));

    standard.last().map(|(any, _)| *any)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::util::{Fetch, FetchError};

    const PLAYER_JS: &str = concat!(
        r#"var Mt={vW:function(a){a.reverse()},"#,
        r#"i7:function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c},"#,
        r#"O2:function(a,b){a.splice(0,b)}};"#,
        r#"var ix=function(a){a=a.split("");Mt.vW(a,1);return a.join("")};"#,
        r#"function wq(a,b){var c=b.sig||null;c&&d.set(f,(0,encodeURIComponent)(ix(c)))}"#,
    );

    struct ScriptFetcher {
        calls: Mutex<usize>,
    }

    impl ScriptFetcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Fetch for ScriptFetcher {
        async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
            *self.calls.lock().unwrap() += 1;
            Ok(PLAYER_JS.to_string())
        }
    }

    fn standard(itag: i64) -> AnyVideo {
        let query = StreamQuery {
            uri: format!("https://host/videoplayback?itag={}", itag),
            is_encrypted: false,
        };
        AnyVideo::Standard(
            Video::from_query(None, query, "https://host/player.js", "signature").unwrap(),
        )
    }

    fn resolution_of(video: Option<&AnyVideo>) -> i32 {
        match video {
            Some(AnyVideo::Standard(v)) => v.resolution(),
            _ => panic!("expected a standard candidate"),
        }
    }

    #[test]
    fn candidates_without_itag_are_rejected() {
        let query = StreamQuery {
            uri: "https://host/videoplayback?x=1".to_string(),
            is_encrypted: false,
        };
        assert!(Video::from_query(None, query, "js", "signature").is_none());

        let query = StreamQuery {
            uri: "https://host/videoplayback?itag=nope".to_string(),
            is_encrypted: false,
        };
        assert!(Video::from_query(None, query, "js", "signature").is_none());
    }

    #[tokio::test]
    async fn unencrypted_uri_is_returned_as_is() {
        let fetcher = ScriptFetcher::new();
        let query = StreamQuery {
            uri: "https://host/videoplayback?itag=22".to_string(),
            is_encrypted: false,
        };
        let mut video = Video::from_query(None, query, "js", "signature").unwrap();

        let uri = video.uri(&fetcher).await.unwrap();
        assert_eq!(uri, "https://host/videoplayback?itag=22");
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn decrypt_rewrites_signature_once() {
        let fetcher = ScriptFetcher::new();
        let query = StreamQuery {
            uri: "https://host/videoplayback?itag=22&signature=abcd".to_string(),
            is_encrypted: true,
        };
        let mut video =
            Video::from_query(None, query, "https://host/player.js", "signature").unwrap();
        assert!(video.is_encrypted());

        // The fixture program is a single reverse.
        let uri = video.uri(&fetcher).await.unwrap();
        assert_eq!(uri, "https://host/videoplayback?itag=22&signature=dcba");
        assert!(!video.is_encrypted());
        assert_eq!(fetcher.calls(), 1);

        // Second access is a pure read.
        let again = video.uri(&fetcher).await.unwrap();
        assert_eq!(again, uri);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn decrypt_honors_the_pages_signature_key() {
        let fetcher = ScriptFetcher::new();
        let query = StreamQuery {
            uri: "https://host/videoplayback?itag=22&sig2=abcd".to_string(),
            is_encrypted: true,
        };
        let mut video = Video::from_query(None, query, "https://host/player.js", "sig2").unwrap();

        let uri = video.uri(&fetcher).await.unwrap();
        assert_eq!(uri, "https://host/videoplayback?itag=22&sig2=dcba");
    }

    #[test]
    fn ranking_scenario() {
        // (360, 128), (720, 192), (1080, 128)
        let videos = vec![standard(34), standard(22), standard(37)];

        let best = find_video(&videos, 720, -1);
        assert_eq!(resolution_of(best), 720);

        let constrained = find_video(&videos, 720, 150);
        assert_eq!(resolution_of(constrained), 360);
    }

    #[test]
    fn ranking_is_empty_safe() {
        assert!(find_video(&[], 1080, -1).is_none());
    }

    #[test]
    fn ranking_falls_back_on_foreign_candidates() {
        let videos = vec![
            standard(18),
            AnyVideo::Other(OtherVideo {
                title: None,
                uri: "https://elsewhere/stream".to_string(),
            }),
        ];

        match find_video(&videos, 1080, -1) {
            Some(AnyVideo::Standard(v)) => assert_eq!(v.resolution(), 360),
            _ => panic!("expected the first candidate"),
        }
    }

    #[test]
    fn nothing_survives_the_filter() {
        let videos = vec![standard(22), standard(37)];
        assert!(find_video(&videos, 144, -1).is_none());
    }
}
