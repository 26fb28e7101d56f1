//! Shape classification
//!
//! Maps free-text certificate shape labels onto canonical shape families.
//! Vendor labels are noisy ("Cut-Cornered Rectangular Modified Brilliant",
//! "Square Emerald Cut", "cc"), so classification runs an explicit ordered
//! rule list over the normalized label; the first matching rule wins, and
//! tests freeze that priority order.

use serde::{Deserialize, Serialize};

/// Canonical shape family keys used throughout the configuration tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFamily {
    Round,
    Princess,
    Asscher,
    Emerald,
    RadiantSq,
    RadiantRec,
    Pear,
    Cushion,
    Heart,
}

impl ShapeFamily {
    /// Key used in the shape-requirements configuration
    pub fn key(&self) -> &'static str {
        match self {
            ShapeFamily::Round => "round",
            ShapeFamily::Princess => "princess",
            ShapeFamily::Asscher => "asscher",
            ShapeFamily::Emerald => "emerald",
            ShapeFamily::RadiantSq => "radiant sq",
            ShapeFamily::RadiantRec => "radiant rec",
            ShapeFamily::Pear => "pear",
            ShapeFamily::Cushion => "cushion",
            ShapeFamily::Heart => "heart",
        }
    }

    /// Reverse of [`ShapeFamily::key`] for single-word label fallbacks
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "round" => Some(ShapeFamily::Round),
            "princess" => Some(ShapeFamily::Princess),
            "asscher" => Some(ShapeFamily::Asscher),
            "emerald" => Some(ShapeFamily::Emerald),
            "radiant sq" => Some(ShapeFamily::RadiantSq),
            "radiant rec" => Some(ShapeFamily::RadiantRec),
            "pear" => Some(ShapeFamily::Pear),
            "cushion" => Some(ShapeFamily::Cushion),
            "heart" => Some(ShapeFamily::Heart),
            _ => None,
        }
    }

    /// Rounds take a dedicated evaluation path with extra crown/cut scoring
    pub fn is_round(&self) -> bool {
        matches!(self, ShapeFamily::Round)
    }
}

impl std::fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One substring rule evaluated against the normalized label
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains(&'static str),
    ContainsBoth(&'static str, &'static str),
    FirstToken(&'static str),
}

impl Pattern {
    fn matches(&self, label: &str) -> bool {
        match self {
            Pattern::Contains(needle) => label.contains(needle),
            Pattern::ContainsBoth(a, b) => label.contains(a) && label.contains(b),
            Pattern::FirstToken(token) => label.split_whitespace().next() == Some(*token),
        }
    }
}

/// Priority-ordered classification rules; earlier rules win.
///
/// The order is load-bearing: "cushion" must be checked before "radiant" so
/// cushion-modified labels stay cushions, and the cut-cornered rectangular
/// test must precede the bare "rectangular" and "radiant" tests.
const RULES: &[(Pattern, ShapeFamily)] = &[
    (Pattern::Contains("round"), ShapeFamily::Round),
    (Pattern::Contains("square emerald"), ShapeFamily::Asscher),
    (Pattern::Contains("square modified"), ShapeFamily::Princess),
    (
        Pattern::ContainsBoth("cut cornered", "rectangular"),
        ShapeFamily::RadiantRec,
    ),
    (Pattern::Contains("cut emerald"), ShapeFamily::Emerald),
    (
        Pattern::ContainsBoth("cut cornered", "square"),
        ShapeFamily::RadiantSq,
    ),
    (Pattern::FirstToken("cc"), ShapeFamily::Cushion),
    (Pattern::Contains("cushion"), ShapeFamily::Cushion),
    (Pattern::Contains("rectangular"), ShapeFamily::RadiantRec),
    (Pattern::Contains("radiant"), ShapeFamily::RadiantSq),
    (Pattern::Contains("octagonal modified"), ShapeFamily::RadiantSq),
    (Pattern::ContainsBoth("pear", "brilliant"), ShapeFamily::Pear),
];

/// Classify a free-text shape label.
///
/// Hyphens are folded into spaces so "Cut-Cornered" and "Cut Cornered"
/// behave identically. When no rule matches, the label's first token is
/// tried as a bare family key; `None` means the shape cannot be determined
/// and the gem must be routed to manual review.
pub fn classify(label: &str) -> Option<ShapeFamily> {
    let normalized = label.to_lowercase().replace('-', " ");
    for (pattern, family) in RULES {
        if pattern.matches(&normalized) {
            return Some(*family);
        }
    }
    normalized
        .split_whitespace()
        .next()
        .and_then(ShapeFamily::from_key)
}
