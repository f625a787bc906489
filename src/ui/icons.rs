// Glyphs used to decorate buttons

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    ArrowRight,
    FileUp,
    Rocket,
    Download,
}

impl Icon {
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::ArrowRight => "→",
            Self::FileUp => "⇪",
            Self::Rocket => "➶",
            Self::Download => "⤓",
        }
    }
}

const LOADER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Loader frame for the given tick
pub const fn loader(tick: usize) -> &'static str {
    LOADER_FRAMES[tick % LOADER_FRAMES.len()]
}

/// Prefix a label with its icon, or with the loader while busy
pub fn decorate(icon: Icon, label: &str, loading: bool, tick: usize) -> String {
    let glyph = if loading { loader(tick) } else { icon.glyph() };
    format!("{glyph} {label}")
}
