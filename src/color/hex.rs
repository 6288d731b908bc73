// src/color/hex.rs

use super::Color;

/// `#` followed by two lowercase hex digits per sample, in sample order.
pub fn to_hex(color: &Color) -> String {
    samples_to_hex(color.samples())
}

pub fn samples_to_hex(samples: &[u8]) -> String {
    format!("#{}", hex::encode(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_and_rgba_to_hex() {
        assert_eq!(to_hex(&Color::Rgb([66, 135, 245])), "#4287f5");
        assert_eq!(to_hex(&Color::Rgba([4, 1, 255, 100])), "#0401ff64");
    }

    #[test]
    fn test_hex_is_zero_padded_lowercase() {
        assert_eq!(to_hex(&Color::Rgb([0, 10, 171])), "#000aab");
        assert_eq!(samples_to_hex(&[255, 255, 255]), "#ffffff");
    }
}
