//! Test fixtures: synthetic scans and request bodies.

use base64::Engine;
use std::io::Cursor;

/// Encode RGBA8 pixels as PNG
pub fn png_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(rgba).unwrap();
    }
    buf.into_inner()
}

/// Solid-colour PNG
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let pixel = [rgb[0], rgb[1], rgb[2], 255];
    let rgba: Vec<u8> = pixel
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    png_from_rgba(width, height, &rgba)
}

/// White scan with black squares at `(x, y, size)`
pub fn scan_with_squares(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> Vec<u8> {
    scan_with_colored_squares(width, height, squares, [0, 0, 0])
}

/// White scan with squares of one colour at `(x, y, size)`
pub fn scan_with_colored_squares(
    width: u32,
    height: u32,
    squares: &[(u32, u32, u32)],
    rgb: [u8; 3],
) -> Vec<u8> {
    let mut rgba = vec![255u8; (width * height * 4) as usize];
    for &(sx, sy, size) in squares {
        for y in sy..(sy + size).min(height) {
            for x in sx..(sx + size).min(width) {
                let i = ((y * width + x) * 4) as usize;
                rgba[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }
    png_from_rgba(width, height, &rgba)
}

/// Base64 of `bytes`
pub fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Upload request body for `(filename, bytes)` pairs
pub fn upload_body<B: AsRef<[u8]>>(files: &[(&str, B)]) -> serde_json::Value {
    serde_json::json!({
        "files": files
            .iter()
            .map(|(name, bytes)| serde_json::json!({ "filename": name, "data": b64(bytes.as_ref()) }))
            .collect::<Vec<_>>()
    })
}

/// Structured analysis response body
pub fn analysis_json(category: &str) -> serde_json::Value {
    serde_json::json!({
        "description": format!("A {category} item"),
        "objects": ["stamp"],
        "categories": [category],
        "colors": ["blue"],
        "confidence": 87
    })
}
