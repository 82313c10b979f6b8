// Atlas mapping image: a 256x256 texture of two-byte entries translating a
// 16-bit codepoint (row = high byte, column = low byte) to an atlas position.

use std::collections::HashMap;

use crate::atlas::AtlasPos;
use crate::{MISSING_GLYPH_MARKER, UNICODE_REPLACEMENT_CHARACTER};

pub const MAPPING_SIDE: u32 = 256;
pub const MAPPING_BYTES: usize = 2 * (MAPPING_SIDE * MAPPING_SIDE) as usize;

/// Fallback position for a codepoint the atlas does not contain.
/// Surrogates and the noncharacters at the top of the plane resolve to the
/// replacement character, everything else to the missing-glyph marker.
pub fn default_position(codepoint: u32, replacement: AtlasPos, missing: AtlasPos) -> AtlasPos {
    if (0xd800..0xe000).contains(&codepoint) || codepoint >= 0xfffe {
        replacement
    } else {
        missing
    }
}

pub fn encode_atlas_mapping(atlas_map: &HashMap<u16, AtlasPos>) -> Vec<u8> {
    let lookup = |c: u32| atlas_map.get(&(c as u16)).copied().unwrap_or_default();
    let replacement = lookup(UNICODE_REPLACEMENT_CHARACTER);
    let missing = lookup(MISSING_GLYPH_MARKER);

    let mut image = vec![0u8; MAPPING_BYTES];
    for (codepoint, entry) in image.chunks_exact_mut(2).enumerate() {
        let pos = default_position(codepoint as u32, replacement, missing);
        entry[0] = pos.x;
        entry[1] = pos.y;
    }

    for (&codepoint, pos) in atlas_map {
        let k = 2 * codepoint as usize;
        image[k] = pos.x;
        image[k + 1] = pos.y;
    }
    image
}
