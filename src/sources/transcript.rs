use std::sync::Arc;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpTransport, USER_AGENT};
use crate::sources::text::collapse_whitespace;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_english(&self) -> bool {
        self.language_code.starts_with("en")
    }

    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches timed captions for a YouTube video.
pub struct TranscriptFetcher {
    transport: Arc<dyn HttpTransport>,
}

impl TranscriptFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn fetch(&self, video_id: &str) -> BookmarkResult<Transcript> {
        let page = self.get(&format!("{}{}", WATCH_URL, video_id))?;
        let tracks = caption_tracks(&page)?;
        let track = pick_track(&tracks).ok_or_else(|| {
            BookmarkError::Parse(format!("No captions available for video {}", video_id))
        })?;

        tracing::debug!(video_id, language = %track.language_code, "Fetching caption track");

        let xml = self.get(&track.base_url)?;
        let segments = parse_timedtext(&xml);
        if segments.is_empty() {
            return Err(BookmarkError::Parse(format!(
                "Transcript for video {} is empty",
                video_id
            )));
        }

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Transcript { text, segments })
    }

    fn get(&self, url: &str) -> BookmarkResult<String> {
        let request = HttpRequest::get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9");
        let response = self.transport.execute(request)?;

        if !response.is_success() {
            return Err(BookmarkError::Parse(format!(
                "YouTube returned HTTP {}",
                response.status
            )));
        }
        Ok(response.body)
    }
}

/// Locate the caption track list embedded in the watch page's player response
fn caption_tracks(page: &str) -> BookmarkResult<Vec<CaptionTrack>> {
    let start = page
        .find(CAPTION_TRACKS_KEY)
        .map(|i| i + CAPTION_TRACKS_KEY.len())
        .ok_or_else(|| BookmarkError::Parse("No captions available".to_string()))?;

    // The array is followed by the rest of the player response; read one value only
    let value = serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| BookmarkError::Parse("Caption track list is missing".to_string()))??;

    Ok(serde_json::from_value(value)?)
}

/// Manual English captions, then generated English, then whatever comes first
fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.is_english() && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.is_english()))
        .or_else(|| tracks.first())
}

fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    let document = Html::parse_fragment(xml);
    let Ok(selector) = Selector::parse("text") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let text = collapse_whitespace(&decode_entities(&element.text().collect::<String>()));
            if text.is_empty() {
                return None;
            }
            let attr = |name: &str| {
                element
                    .value()
                    .attr(name)
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            Some(TranscriptSegment {
                text,
                start: attr("start"),
                duration: attr("dur"),
            })
        })
        .collect()
}

// Caption text arrives double-escaped; the parser undoes one level.
// `<` is re-escaped so decoded brackets stay text instead of becoming tags.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(&text.replace('<', "&lt;"))
        .root_element()
        .text()
        .collect()
}
