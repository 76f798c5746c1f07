use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// Must match the enhance profile in src/transform/enhance.rs
const BRIGHTNESS: f64 = 1.1;
const CONTRAST: f64 = 1.15;
const MIDPOINT: f64 = 128.0;

/// Brightness scale followed by contrast remap around the midpoint, unclamped.
fn tone_exact(v: f64) -> f64 {
    (v * BRIGHTNESS - MIDPOINT) * CONTRAST + MIDPOINT
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("tone_lut.rs");
    let mut file = File::create(&dest_path).unwrap();

    writeln!(file, "/// Lookup table for brightness + contrast").unwrap();
    writeln!(file, "/// Index: 8-bit channel value, Value: adjusted value (unclamped)").unwrap();
    writeln!(file, "pub static TONE_LUT: [f32; 256] = [").unwrap();
    for i in 0..256 {
        if i > 0 && i % 8 == 0 {
            writeln!(file).unwrap();
        }
        write!(file, "    {:.6},", tone_exact(i as f64) as f32).unwrap();
    }
    writeln!(file, "\n];").unwrap();

    println!("cargo::rerun-if-changed=build.rs");
}
