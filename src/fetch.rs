use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStreamDefaultReader, Response};

use crate::rom::error::{RomError, RomResult};

/// Tracks a monotone 0–100 percentage for one pipeline phase. `update`
/// returns a value only when the displayed number should change, and never
/// lets it go backwards (late chunk-size estimates can otherwise shrink the
/// bar).
#[derive(Debug, Default)]
pub struct ProgressGauge {
    last: u8,
}

impl ProgressGauge {
    pub fn new() -> Self {
        ProgressGauge::default()
    }

    pub fn update(&mut self, received: u64, total: Option<u64>) -> Option<u8> {
        let percent = match total {
            // Hold one short of done until the stream actually ends. Clamp
            // before narrowing: an under-reported Content-Length can push
            // the raw ratio past what u8 holds.
            Some(total) if total > 0 => (received * 100 / total).min(99) as u8,
            _ => 0,
        };
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }

    pub fn finish(&mut self) -> Option<u8> {
        if self.last < 100 {
            self.last = 100;
            Some(100)
        } else {
            None
        }
    }
}

fn network_error(detail: &str) -> RomError {
    RomError::Fetch {
        status: 0,
        reason: detail.to_string(),
    }
}

/// Download the dataset archive for a case, reporting byte progress.
///
/// One attempt, no retry: a failure surfaces in the UI and the user decides
/// whether to reload. Nothing outside this function observes the bytes
/// until the full payload is in hand.
pub async fn fetch_archive(
    url: &str,
    on_progress: impl Fn(u8),
) -> RomResult<Vec<u8>> {
    let window = web_sys::window().ok_or_else(|| network_error("no window"))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|_| network_error("network request failed"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| network_error("fetch returned a non-response"))?;

    if !response.ok() {
        return Err(RomError::Fetch {
            status: response.status(),
            reason: response.status_text(),
        });
    }

    let total = response
        .headers()
        .get("Content-Length")
        .ok()
        .flatten()
        .and_then(|v| v.parse::<u64>().ok());

    let body = response
        .body()
        .ok_or_else(|| network_error("response has no body"))?;
    let reader: ReadableStreamDefaultReader = body
        .get_reader()
        .dyn_into()
        .map_err(|_| network_error("body stream is not readable"))?;

    let mut bytes = Vec::new();
    let mut gauge = ProgressGauge::new();
    loop {
        let chunk = JsFuture::from(reader.read())
            .await
            .map_err(|_| network_error("stream read failed"))?;
        let done = Reflect::get(&chunk, &"done".into())
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }
        let value = Reflect::get(&chunk, &"value".into())
            .map_err(|_| network_error("stream chunk without value"))?;
        let array = Uint8Array::new(&value);
        let offset = bytes.len();
        bytes.resize(offset + array.length() as usize, 0);
        array.copy_to(&mut bytes[offset..]);

        if let Some(percent) = gauge.update(bytes.len() as u64, total) {
            on_progress(percent);
        }
    }
    if gauge.finish().is_some() {
        on_progress(100);
    }
    Ok(bytes)
}
