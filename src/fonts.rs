//! Font loading and text measurement using `ttf-parser`.
//!
//! Without a loaded face we fall back to an average-advance model, which
//! keeps line breaking deterministic for tests and for hosts that only care
//! about relative placement.

use std::collections::HashMap;

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
}

static BUILTIN: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
};

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new("Helvetica", false, false),
        }
    }

    /// Load a TTF/OTF font from bytes. The first loaded face becomes the
    /// fallback for families we have no face for.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;
        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            bytes,
        };
        let key = FontKey::new(family, bold, italic);
        if self.fonts.is_empty() {
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Get font data for a key, falling back to the regular face of the
    /// family, then to the default face, then to builtin metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&FontKey::new(&key.family, false, false)))
            .or_else(|| self.fonts.get(&self.default_key))
            .unwrap_or(&BUILTIN)
    }

    pub fn has_real_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// Measure the width of a string at a given font size (in px).
    ///
    /// With real font bytes we sum glyph advances. Otherwise an average
    /// advance of 0.5 × font_size per char (0.55 bold, 0.6 monospace).
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));

        if data.bytes.is_empty() {
            let avg = if is_monospace(family) {
                0.6
            } else if bold {
                0.55
            } else {
                0.5
            };
            return text.chars().count() as f32 * font_size * avg;
        }

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        // Fallback for missing glyph
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_monospace(family: &str) -> bool {
    let f = family.to_ascii_lowercase();
    f.contains("courier") || f.contains("mono")
}
