use once_cell::sync::Lazy;
use regex::Regex;

// @module: YouTube URL recognition

// @const: watch?v= and youtu.be links, capturing the video id
static YOUTUBE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)([^\s&]+)").unwrap()
});

/// Whether `url` is a YouTube video link
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL_REGEX.is_match(url)
}

/// Video id of a YouTube link
pub fn extract_youtube_id(url: &str) -> Option<String> {
    YOUTUBE_URL_REGEX
        .captures(url)
        .and_then(|caps| caps.get(4))
        .map(|m| m.as_str().to_string())
}
