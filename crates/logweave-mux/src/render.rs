//! Renders parsed records as text lines.

use std::io::{self, Write};

use crossterm::style::{style, Stylize};
use logweave_core::{ParsedRecord, Palette};

/// Writes one line per [`ParsedRecord`].
///
/// Lines look like `<service> › <message>`, or just `<message>` when labels
/// are hidden (a single followed service). A record's render override is
/// written verbatim.
pub struct Renderer<W> {
    out: W,
    palette: Option<Palette>,
    separator: String,
    show_labels: bool,
}

impl<W: Write> Renderer<W> {
    /// Uncoloured renderer with the default `›` separator.
    pub fn new(out: W) -> Self {
        Self {
            out,
            palette: None,
            separator: "›".to_string(),
            show_labels: true,
        }
    }

    /// Colour service labels from `palette`. An empty palette leaves labels
    /// plain.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = (!palette.is_empty()).then_some(palette);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn show_labels(&mut self, show: bool) {
        self.show_labels = show;
    }

    pub fn render(&mut self, record: &ParsedRecord) -> io::Result<()> {
        if let Some(line) = &record.render_override {
            return writeln!(self.out, "{line}");
        }
        if !self.show_labels {
            return writeln!(self.out, "{}", record.display_text);
        }

        match self
            .palette
            .as_ref()
            .and_then(|palette| palette.color_for(&record.service))
        {
            Some(color) => writeln!(
                self.out,
                "{} {} {}",
                style(&record.service).with(color),
                self.separator,
                record.display_text
            ),
            None => writeln!(
                self.out,
                "{} {} {}",
                record.service, self.separator, record.display_text
            ),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
