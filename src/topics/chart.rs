// Scatter chart of projected documents, colored by main topic.
//
// Drawn with plotters into an in-memory RGB buffer, PNG-encoded with the
// image crate and wrapped in a base64 data URI so it can ride along in a
// JSON response. Text needs a TrueType font; it is located and registered
// at render time, and a missing font is reported as ChartError::NoFont so
// the caller can drop the chart.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::register_font;
use tracing::debug;

pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 800;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Fonts tried when no font is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Fonts handed to plotters during this process.
///
/// plotters needs `'static` font data, so each file is read and leaked at
/// most once: `loaded` keeps the leaked bytes for re-registration and
/// `rejected` remembers files plotters refused to parse.
#[derive(Default)]
struct FontRegistry {
    active: Option<PathBuf>,
    loaded: HashMap<PathBuf, &'static [u8]>,
    rejected: HashSet<PathBuf>,
}

static FONTS: LazyLock<Mutex<FontRegistry>> = LazyLock::new(Default::default);

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("no TrueType font available for chart text")]
    NoFont,
    #[error("font {0} could not be loaded")]
    InvalidFont(PathBuf),
    #[error("chart needs one topic per point ({points} points, {topics} topics)")]
    LengthMismatch { points: usize, topics: usize },
    #[error("drawing failed: {0}")]
    Drawing(String),
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
}

/// Find a usable font: the configured one first, then common system paths.
pub fn locate_font(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Make the located font the active plotters font.
///
/// The returned guard keeps other renders from swapping the font until this
/// one is finished.
fn ensure_font(
    configured: Option<&Path>,
) -> Result<MutexGuard<'static, FontRegistry>, ChartError> {
    let path = locate_font(configured).ok_or(ChartError::NoFont)?;
    let mut fonts = FONTS
        .lock()
        .map_err(|_| ChartError::Drawing("font registry lock poisoned".to_string()))?;
    if fonts.active.as_deref() == Some(path.as_path()) {
        return Ok(fonts);
    }
    if fonts.rejected.contains(&path) {
        return Err(ChartError::InvalidFont(path));
    }

    let bytes = match fonts.loaded.get(&path) {
        Some(&bytes) => bytes,
        None => {
            let raw = std::fs::read(&path).map_err(|_| ChartError::InvalidFont(path.clone()))?;
            let leaked: &'static [u8] = Box::leak(raw.into_boxed_slice());
            fonts.loaded.insert(path.clone(), leaked);
            leaked
        }
    };
    if register_font("sans-serif", FontStyle::Normal, bytes).is_err() {
        fonts.rejected.insert(path.clone());
        return Err(ChartError::InvalidFont(path));
    }

    debug!(font = %path.display(), "Registered chart font");
    fonts.active = Some(path);
    Ok(fonts)
}

/// Color for topic `index` of `n_topics`, spread evenly over a rainbow
/// colormap (violet through red).
pub fn rainbow_color(index: usize, n_topics: usize) -> RGBColor {
    let x = if n_topics > 1 {
        index as f64 / (n_topics - 1) as f64
    } else {
        0.0
    };
    let r = (2.0 * x - 0.5).abs().clamp(0.0, 1.0);
    let g = (std::f64::consts::PI * x).sin().clamp(0.0, 1.0);
    let b = (std::f64::consts::PI * x / 2.0).cos().clamp(0.0, 1.0);
    let channel = |v: f64| (v * 255.0).round() as u8;
    RGBColor(channel(r), channel(g), channel(b))
}

fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = max - min;
    let pad = if span > 0.0 { span * 0.08 } else { 1.0 };
    (min - pad)..(max + pad)
}

/// Render the scatter plot and return it as a PNG data URI.
///
/// `main_topics` holds the 0-based main topic of each point.
pub fn render_scatter(
    points: &[[f64; 2]],
    main_topics: &[usize],
    n_topics: usize,
    font: Option<&Path>,
) -> Result<String, ChartError> {
    if points.len() != main_topics.len() {
        return Err(ChartError::LengthMismatch {
            points: points.len(),
            topics: main_topics.len(),
        });
    }
    let _font = ensure_font(font)?;

    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    draw(&mut buffer, points, main_topics, n_topics)?;

    let image = RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
        .ok_or_else(|| ChartError::Encoding("buffer size does not match dimensions".to_string()))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ChartError::Encoding(e.to_string()))?;

    let b64 = general_purpose::STANDARD.encode(&png);
    Ok(format!("{DATA_URI_PREFIX}{b64}"))
}

fn draw(
    buffer: &mut [u8],
    points: &[[f64; 2]],
    main_topics: &[usize],
    n_topics: usize,
) -> Result<(), ChartError> {
    let drawing = |e: &dyn std::fmt::Display| ChartError::Drawing(e.to_string());

    let root = BitMapBackend::with_buffer(buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| drawing(&e))?;

    let x_range = padded_range(points.iter().map(|p| p[0]));
    let y_range = padded_range(points.iter().map(|p| p[1]));

    let mut chart = ChartBuilder::on(&root)
        .caption("Review Topic Distribution (t-SNE)", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| drawing(&e))?;

    chart
        .configure_mesh()
        .x_desc("t-SNE Dimension 1")
        .y_desc("t-SNE Dimension 2")
        .axis_desc_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .draw()
        .map_err(|e| drawing(&e))?;

    for topic in 0..n_topics {
        let color = rainbow_color(topic, n_topics);
        let members: Vec<(f64, f64)> = points
            .iter()
            .zip(main_topics)
            .filter(|(_, &t)| t == topic)
            .map(|(p, _)| (p[0], p[1]))
            .collect();
        if members.is_empty() {
            continue;
        }

        chart
            .draw_series(
                members
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 8, color.mix(0.7).filled())),
            )
            .map_err(|e| drawing(&e))?
            .label(format!("Topic {}", topic + 1))
            .legend(move |(x, y)| Circle::new((x, y), 6, color.filled()));

        chart
            .draw_series(
                members
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 8, BLACK.stroke_width(1))),
            )
            .map_err(|e| drawing(&e))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 16))
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK.mix(0.4))
        .draw()
        .map_err(|e| drawing(&e))?;

    root.present().map_err(|e| drawing(&e))?;
    Ok(())
}

/// Decode a PNG data URI produced by `render_scatter` back to PNG bytes.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let b64 = uri.strip_prefix(DATA_URI_PREFIX)?;
    general_purpose::STANDARD.decode(b64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rainbow_endpoints() {
        // Violet-blue at the start, red at the end
        let first = rainbow_color(0, 5);
        let last = rainbow_color(4, 5);
        assert_eq!(first, RGBColor(128, 0, 255));
        assert_eq!(last, RGBColor(255, 0, 0));
    }

    #[test]
    fn test_rainbow_distinct_colors() {
        let colors: Vec<RGBColor> = (0..5).map(|i| rainbow_color(i, 5)).collect();
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn test_padded_range_degenerate() {
        let range = padded_range([2.0, 2.0].into_iter());
        assert_eq!(range, 1.0..3.0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = render_scatter(&[[0.0, 0.0]], &[], 2, None).unwrap_err();
        assert!(matches!(err, ChartError::LengthMismatch { .. }));
    }

    #[test]
    fn test_missing_configured_font_falls_back_to_system() {
        let located = locate_font(Some(Path::new("/nonexistent/font.ttf")));
        if let Some(path) = located {
            assert!(path.is_file());
        }
    }

    #[test]
    fn test_render_when_font_available() {
        if locate_font(None).is_none() {
            // No system font on this machine, nothing to render with
            return;
        }
        let points = [[0.0, 0.0], [1.0, 1.0], [5.0, 5.0], [6.0, 5.5], [0.5, 0.2]];
        let topics = [0, 0, 1, 1, 0];
        let uri = render_scatter(&points, &topics, 2, None).unwrap();
        assert!(uri.starts_with(DATA_URI_PREFIX));
        let png = decode_data_uri(&uri).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_unparsable_font_is_rejected_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("broken.ttf");
        std::fs::write(&bad, b"not a font").unwrap();
        let points = [[0.0, 0.0], [1.0, 1.0]];

        let err = render_scatter(&points, &[0, 1], 2, Some(&bad)).unwrap_err();
        assert!(matches!(err, ChartError::InvalidFont(ref p) if p == &bad));
        let first = FONTS.lock().unwrap().loaded[&bad].as_ptr();

        // The second attempt neither re-reads nor re-leaks the file
        std::fs::write(&bad, b"still not a font").unwrap();
        let err = render_scatter(&points, &[0, 1], 2, Some(&bad)).unwrap_err();
        assert!(matches!(err, ChartError::InvalidFont(_)));
        let fonts = FONTS.lock().unwrap();
        assert!(fonts.rejected.contains(&bad));
        assert_eq!(fonts.loaded[&bad].as_ptr(), first);
    }

    #[test]
    fn test_configured_font_replaces_active_font() {
        let Some(system) = locate_font(None) else {
            return;
        };
        let dir = tempfile::TempDir::new().unwrap();
        let copy = dir.path().join("configured.ttf");
        std::fs::copy(&system, &copy).unwrap();
        let points = [[0.0, 0.0], [1.0, 1.0], [2.0, 0.5]];
        let topics = [0, 1, 0];

        {
            render_scatter(&points, &topics, 2, Some(&copy)).unwrap();
            // Other tests may render in between, so check right after a render
            let fonts = ensure_font(Some(&copy)).unwrap();
            assert_eq!(fonts.active.as_deref(), Some(copy.as_path()));
        }
        let fonts = ensure_font(None).unwrap();
        assert_eq!(fonts.active.as_deref(), Some(system.as_path()));
        assert!(fonts.loaded.contains_key(&copy));
    }

    #[test]
    fn test_decode_rejects_other_uris() {
        assert!(decode_data_uri("data:text/plain;base64,aGk=").is_none());
    }
}
