//! crates/logtree-sink/src/line_mode.rs
//! Trailing-newline policy for formatted records.

/// Controls whether formatted records end with a newline terminator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LineMode {
    /// Append `\n` after each formatted record.
    #[default]
    WithNewline,
    /// Emit the formatted record without a terminator.
    WithoutNewline,
}

impl LineMode {
    /// Reports whether this mode appends a newline.
    #[must_use]
    pub const fn append_newline(self) -> bool {
        matches!(self, Self::WithNewline)
    }
}

impl From<bool> for LineMode {
    fn from(append_newline: bool) -> Self {
        if append_newline {
            Self::WithNewline
        } else {
            Self::WithoutNewline
        }
    }
}
