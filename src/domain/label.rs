//! Quoted DOT labels.

/// Append-only builder for a quoted node label.
///
/// Starts as `"<name>`; [`Label::finish`] closes the quote and consumes the
/// builder. Fragments are written verbatim, so values must go through
/// [`escape`] first.
#[derive(Debug)]
pub struct Label {
    buf: String,
}

impl Label {
    pub fn new(name: &str) -> Self {
        let mut buf = String::with_capacity(name.len() + 16);
        buf.push('"');
        buf.push_str(name);
        Self { buf }
    }

    pub fn write(&mut self, fragments: &[&str]) {
        for s in fragments {
            self.buf.push_str(s);
        }
    }

    pub fn finish(mut self) -> String {
        self.buf.push('"');
        self.buf
    }
}

/// Escape text for use inside a quoted DOT string.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
