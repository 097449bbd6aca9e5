use regex::Regex;
use serde::Deserialize;
use serde_aux::prelude::*;

use crate::error::Error;
use crate::json;

/// Parsed subset of the embedded player response. Everything is optional;
/// the page format has drifted repeatedly and a missing branch must degrade
/// to "no candidates from this source", not a parse failure.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub streaming_data: Option<StreamingData>,
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    pub status: Option<String>,
    pub reason: Option<String>,
}

impl PlayabilityStatus {
    pub fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("error"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    pub formats: Option<Vec<StreamFormat>>,
    pub adaptive_formats: Option<Vec<StreamFormat>>,
    pub dash_manifest_url: Option<String>,
}

/// One muxed or adaptive stream entry. Either `url` is directly usable or
/// `cipher`/`signatureCipher` holds a scrambled query string.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    pub itag: Option<i64>,
    pub url: Option<String>,
    pub cipher: Option<String>,
    pub signature_cipher: Option<String>,
    pub mime_type: Option<String>,
    pub bitrate: Option<i64>,
}

impl StreamFormat {
    pub fn scrambled_query(&self) -> Option<&str> {
        self.cipher
            .as_deref()
            .or(self.signature_cipher.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub length_seconds: Option<i64>,
    pub author: Option<String>,
    #[serde(default)]
    pub is_live: bool,
}

impl PlayerResponse {
    /// Locates and parses the embedded player response from raw page text.
    pub fn from_html(source: &str) -> Result<PlayerResponse, Error> {
        let raw = locate_player_json(source).ok_or_else(|| {
            Error::MalformedPlayerResponse("no player response anchor matched".to_string())
        })?;

        serde_json::from_str(&normalize_literals(&raw)).map_err(Error::from)
    }
}

/// Finds the player-response JSON text using the three historical page
/// anchors, in priority order. The legacy config object embeds the response
/// as an escaped string field; the other two are plain object literals.
fn locate_player_json(source: &str) -> Option<String> {
    let legacy_config = Regex::new(r"ytplayer\.config\s*=\s*").unwrap();
    if let Some(m) = legacy_config.find(source) {
        if let Some(config) = json::extract_object(&source[m.end()..]) {
            if let Some(raw) = json::get_string_value(config, "player_response") {
                if let Some(unescaped) = json::unescape(raw) {
                    return Some(unescaped);
                }
            }
        }
    }

    let initial = Regex::new(r"var\s+ytInitialPlayerResponse\s*=").unwrap();
    if let Some(m) = initial.find(source) {
        if let Some(object) = json::extract_object(&source[m.end()..]) {
            return Some(object.to_string());
        }
    }

    let indexed = Regex::new(r#"\["ytInitialPlayerResponse"\]\s*="#).unwrap();
    if let Some(m) = indexed.find(source) {
        if let Some(object) = json::extract_object(&source[m.end()..]) {
            return Some(object.to_string());
        }
    }

    None
}

fn normalize_literals(raw: &str) -> String {
    raw.replace(r"\u0026", "&")
        .replace("\r\n", "")
        .replace('\n', "")
        .replace('\r', "")
}

/// Resolves the page's player script URL: a `jsUrl`/`PLAYER_JS_URL` key, or
/// the `player_ias/base` script tag as a fallback. Site-relative paths are
/// rebased onto the canonical host.
pub fn find_js_player_url(source: &str) -> Option<String> {
    let js = json::get_string_value(source, "jsUrl")
        .or_else(|| json::get_string_value(source, "PLAYER_JS_URL"))
        .map(|s| s.replace(r"\/", "/"))
        .or_else(|| {
            Regex::new(r#"<script\s+src="([^"]+)"[^>]*name="player_ias/base""#)
                .unwrap()
                .captures(source)
                .map(|caps| caps[1].replace(r"\/", "/"))
        })?;

    if js.starts_with("/yts") || js.starts_with("/s") {
        return Some(format!("https://www.youtube.com{}", js));
    }
    if !js.starts_with("http") {
        return Some(format!("https:{}", js));
    }

    Some(js)
}
