//! Fixtures and instrumented codecs shared by the unit tests.

use crate::codec::{Dimensions, ImageCodec, RasterCodec};
use crate::error::{CompressError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A noisy gradient, so encoders have something to chew on.
fn sample_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    sample_image(width, height)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

/// Stage log entry: `(source width, started)`
pub type StageEvent = (u32, bool);

/// Wraps `RasterCodec`, recording what it was asked to do.
///
/// Source width doubles as an item tag in runner tests, so every input of a
/// batch is given a distinct width.
#[derive(Default)]
pub struct SpyCodec {
    inner: RasterCodec,
    qualities: Mutex<Vec<f32>>,
    fail_draw: bool,
    fail_encode_width: Option<u32>,
    empty_output: bool,
    stage_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    events: Mutex<Vec<StageEvent>>,
}

impl SpyCodec {
    pub fn failing_draw() -> Self {
        Self {
            fail_draw: true,
            ..Default::default()
        }
    }

    /// Encode fails for surfaces of exactly this width.
    pub fn failing_encode_width(width: u32) -> Self {
        Self {
            fail_encode_width: Some(width),
            ..Default::default()
        }
    }

    pub fn empty_output() -> Self {
        Self {
            empty_output: true,
            ..Default::default()
        }
    }

    /// Sleeps in the decode stage so concurrent items overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = Some(delay);
        self
    }

    pub fn qualities(&self) -> Vec<f32> {
        self.qualities.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ImageCodec for SpyCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        let image = self.inner.decode(bytes)?;
        self.events.lock().unwrap().push((image.width(), true));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.stage_delay {
            std::thread::sleep(delay);
        }
        Ok(image)
    }

    fn draw(&self, image: DynamicImage, target: Dimensions) -> Result<DynamicImage> {
        if self.fail_draw {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(CompressError::Draw("no drawing context".to_string()));
        }
        self.inner.draw(image, target)
    }

    fn encode(&self, surface: &DynamicImage, media_type: &str, quality: f32) -> Result<Vec<u8>> {
        self.qualities.lock().unwrap().push(quality);
        self.events.lock().unwrap().push((surface.width(), false));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_encode_width == Some(surface.width()) {
            return Err(CompressError::Encode("encoder returned no data".to_string()));
        }
        if self.empty_output {
            return Ok(Vec::new());
        }
        self.inner.encode(surface, media_type, quality)
    }
}
