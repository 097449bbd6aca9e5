//! Static itag capability table. Pure lookups, no I/O; unknown codes degrade
//! to `-1`/`Unknown`/`None` instead of failing. The code lists track the
//! upstream site's itag assignments and are a maintenance surface, not a
//! runtime concern.

/// Container the stream is muxed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mp4,
    WebM,
    Mobile,
    Flv,
    Unknown,
}

impl VideoFormat {
    /// File extension, or empty when the container is unknown.
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => ".mp4",
            VideoFormat::WebM => ".webm",
            VideoFormat::Mobile => ".3gp",
            VideoFormat::Flv => ".flv",
            VideoFormat::Unknown => "",
        }
    }
}

/// Audio encoding inside the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Aac,
    Vorbis,
    Opus,
    Unknown,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => ".mp3",
            AudioFormat::Aac => ".aac",
            AudioFormat::Vorbis => ".ogg",
            AudioFormat::Opus => ".opus",
            AudioFormat::Unknown => "",
        }
    }
}

/// Adaptive classification: whether a stream carries only one elementary
/// stream and needs client-side muxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveKind {
    None,
    Video,
    Audio,
}

/// Everything the capability table knows about one itag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub resolution: i32,
    pub fps: i32,
    pub audio_bitrate: i32,
    pub video_format: VideoFormat,
    pub audio_format: AudioFormat,
    pub adaptive_kind: AdaptiveKind,
    pub is_3d: bool,
}

pub fn descriptor(code: i64) -> FormatDescriptor {
    FormatDescriptor {
        resolution: resolution(code),
        fps: fps(code),
        audio_bitrate: audio_bitrate(code),
        video_format: video_format(code),
        audio_format: audio_format(code),
        adaptive_kind: adaptive_kind(code),
        is_3d: is_3d(code),
    }
}

/// Short-edge resolution in pixels, -1 when unknown.
pub fn resolution(code: i64) -> i32 {
    match code {
        6 => 270,
        17 | 394 | 330 | 278 | 160 => 144,
        5 | 36 | 83 | 395 | 331 | 242 | 133 => 240,
        18 | 34 | 43 | 82 | 100 | 101 | 396 | 332 | 243 | 134 => 360,
        35 | 44 | 59 | 397 | 333 | 244 | 135 => 480,
        85 => 520,
        22 | 398 | 334 | 302 | 45 | 84 | 102 | 247 | 298 | 136 => 720,
        37 | 46 | 399 | 335 | 303 | 248 | 299 | 137 => 1080,
        400 | 336 | 308 | 271 | 304 | 264 => 1440,
        401 | 337 | 315 | 313 | 305 | 266 => 2160,
        38 => 3072,
        138 | 272 | 402 | 571 => 4320,
        _ => -1,
    }
}

/// Frame rate, -1 when unknown (audio-only codes included).
pub fn fps(code: i64) -> i32 {
    match code {
        571 | 402 | 401 | 400 | 399 | 398 | 337 | 336 | 335 | 334 | 333 | 332 | 331 | 330
        | 272 | 315 | 308 | 303 | 302 | 305 | 304 | 299 | 298 => 60,
        18 | 22 | 37 | 43 | 59 | 397 | 396 | 395 | 394 | 313 | 271 | 248 | 247 | 244 | 243
        | 242 | 278 | 138 | 266 | 264 | 137 | 136 | 135 | 134 | 133 | 160 => 30,
        _ => -1,
    }
}

/// Audio bitrate in kbps, -1 when the stream carries no audio or the code is
/// unknown.
pub fn audio_bitrate(code: i64) -> i32 {
    match code {
        17 => 24,
        36 => 38,
        139 | 249 | 250 => 48,
        5 | 6 => 64,
        18 | 82 | 83 => 96,
        34 | 35 | 37 | 43 | 44 | 59 | 100 | 140 | 171 | 251 => 128,
        84 | 85 => 152,
        22 | 38 | 45 | 46 | 101 | 102 | 256 => 192,
        141 | 172 | 327 => 256,
        258 => 384,
        338 => 480,
        _ => -1,
    }
}

pub fn adaptive_kind(code: i64) -> AdaptiveKind {
    match code {
        18 | 22 | 37 | 43 | 59 | 133 | 134 | 135 | 136 | 137 | 138 | 160 | 242 | 243 | 244
        | 247 | 248 | 264 | 266 | 271 | 272 | 278 | 298 | 299 | 302 | 303 | 304 | 305 | 308
        | 313 | 315 | 330 | 331 | 332 | 333 | 334 | 335 | 336 | 337 | 394 | 395 | 396 | 397
        | 398 | 399 | 400 | 401 | 402 | 571 => AdaptiveKind::Video,
        139 | 140 | 141 | 171 | 172 | 249 | 250 | 251 | 256 | 258 | 327 | 338 => {
            AdaptiveKind::Audio
        }
        _ => AdaptiveKind::None,
    }
}

pub fn video_format(code: i64) -> VideoFormat {
    match code {
        5 | 6 | 34 | 35 => VideoFormat::Flv,
        13 | 17 | 36 => VideoFormat::Mobile,
        18 | 22 | 37 | 38 | 59 | 82 | 83 | 84 | 85 | 133 | 134 | 135 | 136 | 137 | 138 | 139
        | 140 | 141 | 160 | 264 | 266 | 298 | 299 | 304 | 305 | 394 | 395 | 396 | 397 | 398
        | 399 | 400 | 401 | 402 | 571 => VideoFormat::Mp4,
        43 | 44 | 45 | 46 | 100 | 101 | 102 | 171 | 172 | 242 | 243 | 244 | 247 | 248 | 249
        | 250 | 251 | 271 | 272 | 278 | 302 | 303 | 308 | 313 | 315 | 330 | 331 | 332 | 333
        | 334 | 335 | 336 | 337 => VideoFormat::WebM,
        _ => VideoFormat::Unknown,
    }
}

pub fn audio_format(code: i64) -> AudioFormat {
    match code {
        5 | 6 => AudioFormat::Mp3,
        13 | 17 | 18 | 22 | 34 | 35 | 36 | 37 | 38 | 59 | 82 | 83 | 84 | 85 | 139 | 140
        | 141 | 256 | 258 | 327 => AudioFormat::Aac,
        44 | 45 | 46 | 100 | 101 | 102 | 171 | 172 => AudioFormat::Vorbis,
        43 | 249 | 250 | 251 | 338 => AudioFormat::Opus,
        _ => AudioFormat::Unknown,
    }
}

pub fn is_3d(code: i64) -> bool {
    matches!(code, 82 | 83 | 84 | 85 | 100 | 101 | 102)
}
