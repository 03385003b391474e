//! Canonical severity / priority levels and the visual emphasis shared by
//! every renderer.
//!
//! Models answer in whichever language the prompt used, so a finding may say
//! `"高"` where another says `"High"`. All of that vocabulary funnels through
//! [`Level::normalize`]; renderers never inspect raw tokens themselves.

use std::fmt;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Canonical level for a severity, priority, effort or impact token.
///
/// Variant order is the display order for recommendations: `High` sorts
/// first, `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    High,
    Medium,
    Low,
    Unknown,
}

impl Level {
    /// Maps a raw token to its canonical level. Case-insensitive; surrounding
    /// whitespace is ignored. Anything unrecognised is `Unknown`.
    pub fn normalize(token: &str) -> Level {
        match token.trim().to_lowercase().as_str() {
            "高" | "high" => Level::High,
            "中" | "medium" => Level::Medium,
            "低" | "low" => Level::Low,
            _ => Level::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
            Level::Unknown => "unknown",
        }
    }

    pub const fn emphasis(self) -> Emphasis {
        match self {
            Level::High => Emphasis::strong(Tone::Red),
            Level::Medium => Emphasis::strong(Tone::Yellow),
            Level::Low => Emphasis::strong(Tone::Green),
            Level::Unknown => Emphasis::PLAIN,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Emphasis
// ---------------------------------------------------------------------------

/// Medium-independent color name. The terminal maps it to ANSI codes, the
/// HTML document to CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Red,
    Yellow,
    Green,
    Default,
}

impl Tone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Tone::Red => "red",
            Tone::Yellow => "yellow",
            Tone::Green => "green",
            Tone::Default => "default",
        }
    }
}

/// How a piece of text should stand out: a tone plus a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Emphasis {
    pub tone: Tone,
    pub bold: bool,
}

impl Emphasis {
    pub const PLAIN: Emphasis = Emphasis {
        tone: Tone::Default,
        bold: false,
    };

    pub const fn strong(tone: Tone) -> Self {
        Emphasis { tone, bold: true }
    }
}

// ---------------------------------------------------------------------------
// ScoreBand
// ---------------------------------------------------------------------------

/// Lowest score rendered as good.
pub const GOOD_SCORE: u8 = 80;
/// Lowest score rendered as a warning; anything below is critical.
pub const WARNING_SCORE: u8 = 50;

/// Threshold band of an availability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Warning,
    Critical,
}

impl ScoreBand {
    pub const fn from_score(score: u8) -> Self {
        if score >= GOOD_SCORE {
            ScoreBand::Good
        } else if score >= WARNING_SCORE {
            ScoreBand::Warning
        } else {
            ScoreBand::Critical
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Warning => "warning",
            ScoreBand::Critical => "critical",
        }
    }

    pub const fn emphasis(self) -> Emphasis {
        match self {
            ScoreBand::Good => Emphasis::strong(Tone::Green),
            ScoreBand::Warning => Emphasis::strong(Tone::Yellow),
            ScoreBand::Critical => Emphasis::strong(Tone::Red),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
