#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Small deterministic image with enough detail that encoders cannot cheat.
pub fn sample_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9e37_79b9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let noise = (state >> 24) as u8;
        Rgb([(x * 3) as u8 ^ noise, (y * 5) as u8, noise / 2])
    }))
}

pub fn write_image(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    sample_image(32, 24).save(path).unwrap();
}

/// Builds `src/a.jpg`, `src/sub/b.png` and `src/notes.txt` under `root`.
pub fn create_scenario_tree(root: &Path) -> PathBuf {
    let src = root.join("src");
    write_image(&src.join("a.jpg"));
    write_image(&src.join("sub").join("b.png"));
    fs::write(src.join("notes.txt"), b"not an image").unwrap();
    src
}
