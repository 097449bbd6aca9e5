//! # ytx-rs
//!
//! This crate turns a YouTube watch URL into a ranked list of directly
//! playable stream URLs. It scrapes the watch page for the embedded player
//! response, rebuilds stream URIs from the page's several historical
//! formats, and undoes the signature cipher by pattern-matching the player
//! script's string primitives — the script itself is never executed.
//!
//! ## Usage
//!
//! Extraction is a single call; decryption of a scrambled signature happens
//! lazily the first time a candidate's URI is requested.
//!
//! ```rust,no_run
//! use ytx_rs::{extractor, util};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create HttpClient, a wrapper around reqwest::Client that carries
//!     // the cookie jar. It implements the Fetch capability the pipeline
//!     // needs for the page and player-script requests.
//!     let client = util::HttpClient::new().unwrap();
//!
//!     // All candidates, ordered ascending by (resolution, audio bitrate)
//!     let mut videos = extractor::get_all_videos(&client, "https://youtu.be/...")
//!         .await
//!         .unwrap();
//!
//!     // Pick the best candidate no taller than 720p
//!     if let Some(best) = videos.last_mut() {
//!         // First access runs the decipher step if the URI was scrambled
//!         let url = best.uri(&client).await.unwrap();
//!         println!("{}", url);
//!     }
//! }
//! ```
//!
//! Live streams and DRM-protected content are out of scope; both surface as
//! typed errors. Streams that need n-parameter descrambling are detected and
//! flagged, but not descrambled.

#[forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod cipher;
pub mod error;
pub mod extractor;
pub mod format;
pub mod json;
pub mod manifest;
pub mod player_response;
pub mod query;
pub mod url;
pub mod util;
pub mod video;
