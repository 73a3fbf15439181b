//! Global constants for the session core

/// Default minimum width/height (canvas pixels) a finished box must reach.
/// Smaller boxes are discarded when a resize gesture ends.
pub const DEFAULT_MIN_BOX_SIZE: f32 = 5.0;

/// Default half-size of a resize handle square on the identity surface.
pub const DEFAULT_HANDLE_RADIUS: u32 = 4;

/// Number of base hues in the display palette.
pub const PALETTE_BASE_HUES: usize = 20;

/// Number of shade variants per base hue (base, tint, shade).
pub const PALETTE_VARIANTS: usize = 3;

/// Blend factor toward white for the tint variant.
pub const PALETTE_TINT: f32 = 0.4;

/// Blend factor toward black for the shade variant.
pub const PALETTE_SHADE: f32 = 0.2;

/// Label slots distinguishable on one identity surface (two 8-bit channels).
pub const MAX_LABEL_SLOTS: usize = 65536;

/// Highest handle id that fits the third channel (`handle + 1 <= 255`).
pub const MAX_HANDLE_ID: u8 = 254;

/// Wire value standing in for "no label" in parent/previous/next fields.
pub const NO_LABEL: i64 = -1;
