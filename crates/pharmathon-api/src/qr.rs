use anyhow::Result;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// Render a check-in code as a PNG, sized for scanning off a phone screen.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(data.as_bytes())?;
    let img = code.render::<Luma<u8>>().min_dimensions(512, 512).build();

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
