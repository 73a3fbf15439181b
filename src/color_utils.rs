//! Color utility functions for labels and picking.
//!
//! Two independent mappings live here:
//! - a display palette (`palette_color`) giving each label index a stable,
//!   distinguishable color, and
//! - the identity encoding (`encode_id` / `decode_id`) used by the hit-test
//!   surface, which packs a label slot and handle id into one RGBA pixel.
//!
//! Identity encoding capacity is fixed by the channel widths: at most
//! [`MAX_LABEL_SLOTS`] label slots per item (`slot = r * 256 + g`) and handle
//! ids `0..=`[`MAX_HANDLE_ID`] (`b = handle + 1`). Alpha 255 marks an
//! occupied pixel, alpha 0 an empty one.

use crate::constants::{
    MAX_HANDLE_ID, MAX_LABEL_SLOTS, PALETTE_BASE_HUES, PALETTE_SHADE, PALETTE_TINT,
    PALETTE_VARIANTS,
};

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn blend(channel: u8, target: u8, amount: f32) -> u8 {
    let c = f32::from(channel);
    let t = f32::from(target);
    (c + (t - c) * amount).round() as u8
}

/// Base hue `i` of the palette, spread evenly around the color wheel.
/// Even and odd entries alternate saturation so neighbours stay apart.
fn base_color(i: usize) -> [u8; 3] {
    let hue = (i % PALETTE_BASE_HUES) as f32 * (360.0 / PALETTE_BASE_HUES as f32);
    let (s, v) = if i % 2 == 0 { (0.85, 0.95) } else { (0.65, 0.75) };
    let (r, g, b) = hsv_to_rgb(hue, s, v);
    [to_byte(r), to_byte(g), to_byte(b)]
}

/// Display color for a label index.
///
/// Indices `0..20` are the base hues, `20..40` the same hues blended 40%
/// toward white, `40..60` blended 20% toward black. Larger indices cycle.
pub fn palette_color(index: usize) -> [u8; 3] {
    let base = base_color(index % PALETTE_BASE_HUES);
    match (index / PALETTE_BASE_HUES) % PALETTE_VARIANTS {
        0 => base,
        1 => base.map(|c| blend(c, 255, PALETTE_TINT)),
        _ => base.map(|c| blend(c, 0, PALETTE_SHADE)),
    }
}

/// Pack a label slot and handle id into an opaque identity color.
///
/// Returns `None` when either value exceeds the encoding capacity.
pub fn encode_id(slot: usize, handle: u8) -> Option<[u8; 4]> {
    if slot >= MAX_LABEL_SLOTS || handle > MAX_HANDLE_ID {
        return None;
    }
    Some([(slot >> 8) as u8, (slot & 0xff) as u8, handle + 1, 255])
}

/// Inverse of [`encode_id`]. Transparent pixels decode to `None`.
pub fn decode_id(pixel: [u8; 4]) -> Option<(usize, u8)> {
    let [r, g, b, a] = pixel;
    if a == 0 || b == 0 {
        return None;
    }
    Some((usize::from(r) * 256 + usize::from(g), b - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_blue() {
        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_palette_is_deterministic() {
        for i in 0..100 {
            assert_eq!(palette_color(i), palette_color(i));
        }
    }

    #[test]
    fn test_palette_sixty_distinct_before_cycling() {
        let colors: HashSet<[u8; 3]> = (0..60).map(palette_color).collect();
        assert_eq!(colors.len(), 60);
        assert_eq!(palette_color(60), palette_color(0));
        assert_eq!(palette_color(75), palette_color(15));
    }

    #[test]
    fn test_palette_tint_is_lighter_and_shade_darker() {
        let base = palette_color(3);
        let tint = palette_color(23);
        let shade = palette_color(43);
        let sum = |c: [u8; 3]| c.iter().map(|&v| u32::from(v)).sum::<u32>();
        assert!(sum(tint) > sum(base));
        assert!(sum(shade) < sum(base));
    }

    #[test]
    fn test_encode_id_layout() {
        assert_eq!(encode_id(0, 0), Some([0, 0, 1, 255]));
        assert_eq!(encode_id(258, 3), Some([1, 2, 4, 255]));
        assert_eq!(encode_id(65535, 254), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_encode_id_capacity() {
        assert_eq!(encode_id(MAX_LABEL_SLOTS, 0), None);
        assert_eq!(encode_id(0, 255), None);
    }

    #[test]
    fn test_decode_transparent_is_empty() {
        assert_eq!(decode_id([0, 0, 0, 0]), None);
        assert_eq!(decode_id([12, 34, 5, 0]), None);
    }

    #[test]
    fn test_decode_inverts_encode_at_edges() {
        for &(slot, handle) in &[(0, 0), (1, 8), (255, 1), (256, 0), (65535, 254)] {
            let pixel = encode_id(slot, handle).unwrap();
            assert_eq!(decode_id(pixel), Some((slot, handle)));
        }
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(slot in 0..MAX_LABEL_SLOTS, handle in 0..=MAX_HANDLE_ID) {
            let pixel = encode_id(slot, handle).unwrap();
            prop_assert_eq!(pixel[3], 255);
            prop_assert_eq!(decode_id(pixel), Some((slot, handle)));
        }
    }
}
