use serde::{Deserialize, Serialize};

/// Layer color.
///
/// Serialized as a HEX6 string (`#RRGGBB`), the form map styles expect for paint properties. Opacity of a layer is
/// stored separately in its [`LayerStyle`](crate::layer::LayerStyle).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Red color: `#FF0000`
    pub const RED: Color = Color::rgb(255, 0, 0);
    /// Green color: `#00FF00`
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    /// Blue color: `#0000FF`
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    /// White color: `#FFFFFF`
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Black color: `#000000`
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Constructs color from its RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts the color into HEX6 string: `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`), alpha
    /// channel of a HEX8 string is ignored.
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if hex_string.len() != 7 && hex_string.len() != 9 || !hex_string.starts_with('#') {
            return None;
        }

        let r = u8::from_str_radix(hex_string.get(1..3)?, 16).ok()?;
        let g = u8::from_str_radix(hex_string.get(3..5)?, 16).ok()?;
        let b = u8::from_str_radix(hex_string.get(5..7)?, 16).ok()?;

        Some(Self { r, g, b })
    }

    /// Parses a color from the HEX6 string.
    ///
    /// # Panics
    ///
    /// Panics if the parsing fails.
    pub const fn from_hex(hex_string: &'static str) -> Self {
        let bytes = hex_string.as_bytes();
        if bytes.len() != 7 || bytes[0] != b'#' {
            panic!("Invalid color hex string");
        }

        let r = decode_byte(&[bytes[1], bytes[2]]);
        let g = decode_byte(&[bytes[3], bytes[4]]);
        let b = decode_byte(&[bytes[5], bytes[6]]);

        Self { r, g, b }
    }

    /// Generates a random color. Falls back to a color derived from `seed` if the system random source is not
    /// available.
    pub fn random(seed: u64) -> Self {
        let mut bytes = [0u8; 3];
        if getrandom::fill(&mut bytes).is_err() {
            log::debug!("System random source is unavailable, deriving color from seed {seed}");
            let mixed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17);
            bytes = [(mixed >> 16) as u8, (mixed >> 8) as u8, mixed as u8];
        }

        Self::rgb(bytes[0], bytes[1], bytes[2])
    }

    /// Red component of the color.
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Green component of the color.
    pub fn g(&self) -> u8 {
        self.g
    }

    /// Blue component of the color.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Returns a darker shade of the color, used for polygon outlines.
    pub fn darken(&self, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * (1.0 - factor)).round() as u8;
        Color::rgb(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fixed palette new layers take their colors from before falling back to random colors.
pub const DEFAULT_PALETTE: [Color; 10] = [
    Color::from_hex("#E6194B"),
    Color::from_hex("#3CB44B"),
    Color::from_hex("#4363D8"),
    Color::from_hex("#F58231"),
    Color::from_hex("#911EB4"),
    Color::from_hex("#46F0F0"),
    Color::from_hex("#F032E6"),
    Color::from_hex("#BCF60C"),
    Color::from_hex("#008080"),
    Color::from_hex("#9A6324"),
];

const fn decode_byte(chars: &[u8]) -> u8 {
    debug_assert!(chars.len() == 2);
    let first = decode_char(chars[0]);
    let second = decode_char(chars[1]);

    first * 16 + second
}

const fn decode_char(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => panic!("Invalid hex character"),
    }
}
