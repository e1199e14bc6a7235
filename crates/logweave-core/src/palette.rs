//! Label colours for services.
//!
//! Service names are hashed to a stable index into the palette so the same
//! service always gets the same colour, regardless of the order in which
//! services are listed or how many times the command is run. Two services may
//! share a colour; the palette is small on purpose.

use crossterm::style::Color;

/// Ordered colour palette used to tag service labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_names(["blue", "cyan", "green", "magenta", "red", "yellow"])
    }
}

impl Palette {
    /// Build a palette from colour names. Unknown names are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            colors: names
                .into_iter()
                .filter_map(|name| parse_color(name.as_ref()))
                .collect(),
        }
    }

    /// True when no configured name was a usable colour.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Return a stable colour for a service name, or `None` for an empty
    /// palette.
    pub fn color_for(&self, service: &str) -> Option<Color> {
        if self.colors.is_empty() {
            return None;
        }
        let idx = stable_hash(service) % self.colors.len();
        Some(self.colors[idx])
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Simple djb2-style hash that is stable across Rust versions and process
/// restarts, making label colour assignment deterministic.
fn stable_hash(s: &str) -> usize {
    s.bytes().fold(5381usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    })
}

/// Parse a colour name into a crossterm [`Color`].
///
/// Plain names are the standard eight ANSI colours (crossterm calls these
/// `Dark*`); the `light_` variants are the bright ones. Also accepts
/// `#rrggbb` and `indexed:N`.
fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::DarkRed),
        "green" => Some(Color::DarkGreen),
        "yellow" => Some(Color::DarkYellow),
        "blue" => Some(Color::DarkBlue),
        "magenta" => Some(Color::DarkMagenta),
        "cyan" => Some(Color::DarkCyan),
        "gray" | "grey" => Some(Color::Grey),
        "dark_gray" | "darkgray" | "dark_grey" | "darkgrey" => Some(Color::DarkGrey),
        "light_red" => Some(Color::Red),
        "light_green" => Some(Color::Green),
        "light_yellow" => Some(Color::Yellow),
        "light_blue" => Some(Color::Blue),
        "light_magenta" => Some(Color::Magenta),
        "light_cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        s if s.starts_with('#') => parse_hex(&s[1..]),
        s if s.starts_with("indexed:") => {
            let n: u8 = s["indexed:".len()..].parse().ok()?;
            Some(Color::AnsiValue(n))
        }
        _ => None,
    }
}

/// `rrggbb` without the leading `#`.
fn parse_hex(digits: &str) -> Option<Color> {
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(digits, 16).ok()?;
    Some(Color::Rgb {
        r: (rgb >> 16) as u8,
        g: (rgb >> 8) as u8,
        b: rgb as u8,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
