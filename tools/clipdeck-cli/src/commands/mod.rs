pub mod check;
pub mod crop;
pub mod quote;
pub mod vocals;

use std::path::{Path, PathBuf};

use clipdeck_common::error::ClipdeckError;
use clipdeck_media_model::asset::EncodedAsset;
use clipdeck_media_model::geometry::{DisplayRect, PixelSize, Point, Size};

/// Turn a pipeline error into the status line shown to the user.
pub fn report(err: ClipdeckError) -> anyhow::Error {
    tracing::debug!(error = %err, class = ?err.class(), "Pipeline failed");
    anyhow::anyhow!(err.status_message())
}

/// Write `asset` to `output`, or to `output_dir/<asset name>`.
pub fn save_asset(
    asset: &EncodedAsset,
    output: Option<PathBuf>,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = output.unwrap_or_else(|| output_dir.join(asset.file_name()));
    asset
        .write_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
    Ok(path)
}

fn parse_numbers(s: &str, sep: char, count: usize) -> Result<Vec<f64>, String> {
    let values: Vec<f64> = s
        .split(sep)
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{part}' is not a number"))
        })
        .collect::<Result<_, _>>()?;
    if values.len() != count {
        return Err(format!("expected {count} values separated by '{sep}'"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err("values must be finite".to_string());
    }
    Ok(values)
}

/// `1280x720`
pub fn parse_size(s: &str) -> Result<Size, String> {
    let v = parse_numbers(&s.to_ascii_lowercase(), 'x', 2)?;
    let size = Size::new(v[0], v[1]);
    if !size.is_laid_out() {
        return Err("width and height must be positive".to_string());
    }
    Ok(size)
}

/// `3840x2160`
pub fn parse_pixel_size(s: &str) -> Result<PixelSize, String> {
    let size = parse_size(s)?;
    if size.width.fract() != 0.0 || size.height.fract() != 0.0 {
        return Err("pixel sizes must be whole numbers".to_string());
    }
    Ok(PixelSize::new(size.width as u32, size.height as u32))
}

/// `x,y,w,h`
pub fn parse_rect(s: &str) -> Result<DisplayRect, String> {
    let v = parse_numbers(s, ',', 4)?;
    if v[2] < 0.0 || v[3] < 0.0 {
        return Err("width and height must not be negative".to_string());
    }
    Ok(DisplayRect::new(v[0], v[1], v[2], v[3]))
}

/// `x0,y0:x1,y1`
pub fn parse_drag(s: &str) -> Result<(Point, Point), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| "expected x0,y0:x1,y1".to_string())?;
    let a = parse_numbers(from, ',', 2)?;
    let b = parse_numbers(to, ',', 2)?;
    Ok((Point::new(a[0], a[1]), Point::new(b[0], b[1])))
}

/// Print a progress line in place.
pub fn print_progress(progress: f64) {
    use std::io::Write;
    print!("\r  Progress: {:.1}%  ", progress * 100.0);
    let _ = std::io::stdout().flush();
}
