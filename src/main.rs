use ytx_rs::{extractor, util, video};

#[tokio::main]
async fn main() {
    env_logger::init();

    // Read url from args
    let url = std::env::args().nth(1).expect("No url provided");

    if !extractor::valid_url(&url) {
        println!("Not a YouTube URL: {}", url);
        return;
    }

    // Create HttpClient
    let client = util::HttpClient::new().expect("Could not create HttpClient");

    println!("Extracting streams from {}", url);
    let videos = match extractor::get_all_videos(&client, &url).await {
        Ok(videos) => videos,
        Err(e) => {
            println!("Extraction failed: {}", e);
            return;
        }
    };

    if videos.is_empty() {
        println!("No streams found");
        return;
    }

    if let Some(title) = videos[0].title() {
        println!("Title: {}", title);
    }

    for v in &videos {
        println!(
            "itag {:>3}: {}p {}fps, audio {}kbps, {:?}/{:?}, adaptive {:?}{}",
            v.format_code(),
            v.resolution(),
            v.fps(),
            v.audio_bitrate(),
            v.video_format(),
            v.audio_format(),
            v.adaptive_kind(),
            if v.is_encrypted() { " (scrambled)" } else { "" },
        );
    }

    // Pick the best candidate capped at 1080p and resolve its playable URL
    let candidates: Vec<video::AnyVideo> = videos
        .into_iter()
        .map(video::AnyVideo::Standard)
        .collect();

    let mut best = match video::find_video(&candidates, 1080, -1) {
        Some(video::AnyVideo::Standard(v)) => v.clone(),
        _ => {
            println!("No candidate within constraints");
            return;
        }
    };

    match best.uri(&client).await {
        Ok(uri) => println!("Best (itag {}): {}", best.format_code(), uri),
        Err(e) => println!("Could not resolve stream URL: {}", e),
    }
}
