//! Representative photos from the Wikipedia page-summary API.

use super::{urlencode, USER_AGENT};
use crate::collab::{PhotoLookup, PlacePhoto, RemoteError};
use serde::Deserialize;
use std::time::Duration;

pub struct WikipediaPhotos;

#[derive(Deserialize)]
struct SummaryResponse {
    thumbnail: Option<ImageRef>,
    originalimage: Option<ImageRef>,
    extract: Option<String>,
}

#[derive(Deserialize)]
struct ImageRef {
    source: String,
}

/// Wikipedia titles use underscores where names use spaces.
fn page_title(name: &str) -> String {
    urlencode(&name.trim().replace(' ', "_"))
}

fn into_photo(parsed: SummaryResponse) -> Option<PlacePhoto> {
    let thumb = parsed.thumbnail.map(|img| img.source);
    // full-resolution image first, thumbnail as a fallback
    let url = parsed.originalimage.map(|img| img.source).or_else(|| thumb.clone())?;
    Some(PlacePhoto {
        url,
        thumb_url: thumb,
        description: parsed.extract,
    })
}

impl PhotoLookup for WikipediaPhotos {
    fn photo_for(&self, name: &str) -> Result<Option<PlacePhoto>, RemoteError> {
        let url = format!(
            "https://en.wikipedia.org/api/rest_v1/page/summary/{}",
            page_title(name)
        );

        let response = match ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .call()
        {
            Ok(response) => response,
            // no article for that name
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(ureq::Error::Status(status, response)) => {
                return Err(RemoteError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(e) => return Err(RemoteError::Network(e.to_string())),
        };

        let parsed: SummaryResponse = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        Ok(into_photo(parsed))
    }
}
