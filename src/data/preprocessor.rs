// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Character-level cleanup applied to text pulled out of HTML,
// before any boilerplate or line filtering happens.
//
// Fed pages carry the usual web debris:
//   - Non-breaking spaces (&nbsp;) between numbers and units
//   - Zero-width spaces and byte order marks
//   - Soft hyphens inside long words
//   - Tabs and stray control characters
//
// Cleaning steps (applied in order):
//   1. Map Unicode whitespace variants to a plain space
//   2. Drop soft hyphens and zero-width characters entirely
//   3. Replace remaining control characters with a space
//   4. Collapse runs of spaces and trim the line

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single line of text. Never returns embedded newlines.
    pub fn clean_line(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars() {
            let mapped = match c {
                '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => continue,
                '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            if mapped == ' ' {
                // Only add a space if the last char wasn't a space
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(mapped);
                last_space = false;
            }
        }

        out.trim_end().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
