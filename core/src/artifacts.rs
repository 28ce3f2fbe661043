//! Artifact output: CSV tables and the score histogram.
//!
//! Everything encodes to bytes first and touches the filesystem last,
//! so the pipeline can build all artifacts before writing any.

use crate::{
    config::HistogramConfig,
    error::{TriageError, TriageResult},
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

// ── Tables ───────────────────────────────────────────────────────────────────

/// Encode `rows` as a headed CSV.
pub fn encode_table<R: Serialize>(rows: &[R]) -> TriageResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV buffer: {}", e.error()).into())
}

/// Write `rows` to `path` as CSV, replacing any existing file.
pub fn persist_table<R: Serialize>(rows: &[R], path: impl AsRef<Path>) -> TriageResult<()> {
    let bytes = encode_table(rows)?;
    write_artifact(path, &bytes)
}

/// Read a CSV table written by `persist_table`.
pub fn read_table<R: DeserializeOwned>(path: impl AsRef<Path>) -> TriageResult<Vec<R>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)?;
    let rows = rdr.deserialize().collect::<Result<Vec<R>, csv::Error>>()?;
    Ok(rows)
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_artifact(path: impl AsRef<Path>, bytes: &[u8]) -> TriageResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TriageError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| TriageError::io(path, e))?;
    log::debug!("wrote {} byte(s) to {}", bytes.len(), path.display());
    Ok(())
}

// ── Histogram ────────────────────────────────────────────────────────────────

/// Equal-width bin counts over [lo, hi]; the last bin is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub lo: f64,
    pub hi: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` buckets spanning their min and max.
    /// A zero-width range is widened to [v - 0.5, v + 0.5].
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        assert!(bins > 0, "bins must be > 0");
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if values.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let mut counts = vec![0usize; bins];
        let width = (hi - lo) / bins as f64;
        for &v in values {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { lo, hi, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Renders a frequency histogram to an image.
pub trait HistogramRenderer {
    /// Encode the histogram image in memory.
    fn encode_histogram(&self, values: &[f64], title: &str) -> TriageResult<Vec<u8>>;

    /// Encode and write to `path`, creating parent directories.
    fn render_histogram(&self, values: &[f64], title: &str, path: &Path) -> TriageResult<()> {
        let bytes = self.encode_histogram(values, title)?;
        write_artifact(path, &bytes)
    }
}

const BACKGROUND: [u8; 3] = [255, 255, 255];
const AXIS: [u8; 3] = [0, 0, 0];
const BAR_FILL: [u8; 3] = [31, 119, 180];
const BAR_EDGE: [u8; 3] = [20, 80, 125];

/// RGB bar chart encoded as PNG. No font rasterization: the title and
/// axis labels travel as `tEXt` chunks.
#[derive(Debug, Clone)]
pub struct PngHistogram {
    pub bins: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for PngHistogram {
    fn default() -> Self {
        Self::from_config(&HistogramConfig::default())
    }
}

impl PngHistogram {
    pub fn from_config(config: &HistogramConfig) -> Self {
        Self {
            bins: config.bins,
            width: config.width,
            height: config.height,
        }
    }

    fn rasterize(&self, histogram: &Histogram) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut canvas = Canvas::new(w, h);

        // Plot area inside ~10% margins, matplotlib-ish.
        let left = w / 10;
        let right = w - w / 20;
        let top = h / 10;
        let bottom = h - h / 10;
        let plot_w = right - left;
        let plot_h = bottom - top;

        let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
        let bins = histogram.counts.len();
        for (i, &count) in histogram.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let x0 = left + i * plot_w / bins;
            let x1 = left + (i + 1) * plot_w / bins;
            let bar_h = (count as f64 / peak as f64 * (plot_h as f64 * 0.95)).round() as usize;
            let y0 = bottom - bar_h.max(1);
            canvas.fill_rect(x0, y0, x1, bottom, BAR_FILL);
            canvas.outline_rect(x0, y0, x1, bottom, BAR_EDGE);
        }

        canvas.fill_rect(left, bottom, right + 1, bottom + 2, AXIS);
        canvas.fill_rect(left.saturating_sub(2), top, left, bottom + 2, AXIS);
        canvas.pixels
    }
}

impl HistogramRenderer for PngHistogram {
    fn encode_histogram(&self, values: &[f64], title: &str) -> TriageResult<Vec<u8>> {
        let histogram = Histogram::from_values(values, self.bins);
        let pixels = self.rasterize(&histogram);

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.add_text_chunk("Title".to_string(), title.to_string())?;
            encoder.add_text_chunk("XLabel".to_string(), "Score".to_string())?;
            encoder.add_text_chunk("YLabel".to_string(), "Freq".to_string())?;
            encoder.add_text_chunk(
                "Bins".to_string(),
                format!(
                    "{} bins over [{}, {}]: {:?}",
                    histogram.counts.len(),
                    histogram.lo,
                    histogram.hi,
                    histogram.counts
                ),
            )?;
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Tightly packed RGB8 buffer.
struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&BACKGROUND);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn set(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 3;
            self.pixels[i..i + 3].copy_from_slice(&rgb);
        }
    }

    /// Fill [x0, x1) x [y0, y1).
    fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, rgb);
            }
        }
    }

    fn outline_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        for x in x0..x1 {
            self.set(x, y0, rgb);
        }
        for y in y0..y1 {
            self.set(x0, y, rgb);
            self.set(x1 - 1, y, rgb);
        }
    }
}
