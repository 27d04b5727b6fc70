// src/rank.rs

use std::fmt;

/// Canonical taxonomic rank code, plus the synthesized "minor rank" form
/// used for intermediate levels that carry no standard rank of their own.
///
/// Report consumers distinguish traditional from intermediate levels by
/// testing whether the rendered code is a single character, so `Minor`
/// always renders as `<letter><n>` with `n >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankCode {
    /// `R`, the tree root sentinel (taxid 1).
    Root,
    /// `U`, the unclassified pseudo-level (taxid 0); never becomes a node.
    Unclassified,
    /// One of the standard single-letter levels: D, K, P, C, O, F, G, S.
    Canonical(char),
    /// Synthesized sub-level `<letter><n>` under a parent coded `letter`.
    Minor(char, u32),
}

/// The standard level letters in root-to-leaf order. `D` (domain) and `K`
/// (kingdom) both count as canonical; some report schemas collapse them.
const CANONICAL_LETTERS: [char; 8] = ['D', 'K', 'P', 'C', 'O', 'F', 'G', 'S'];

impl RankCode {
    /// Resolve a raw rank token from a report or taxonomy file.
    ///
    /// Returns `None` for tokens the fixed table cannot resolve (`-`,
    /// multi-character codes such as `S1`, unknown rank words); those are
    /// deferred to the tree builder, which synthesizes a minor rank from
    /// the attachment parent's code.
    pub fn from_raw(token: &str) -> Option<RankCode> {
        match token {
            "root" | "R" => Some(RankCode::Root),
            "unclassified" | "U" => Some(RankCode::Unclassified),
            "kingdom" => Some(RankCode::Canonical('K')),
            "superkingdom" | "domain" => Some(RankCode::Canonical('D')),
            "phylum" => Some(RankCode::Canonical('P')),
            "class" => Some(RankCode::Canonical('C')),
            "order" => Some(RankCode::Canonical('O')),
            "family" => Some(RankCode::Canonical('F')),
            "genus" => Some(RankCode::Canonical('G')),
            "species" => Some(RankCode::Canonical('S')),
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if CANONICAL_LETTERS.contains(&c) => {
                        Some(RankCode::Canonical(c))
                    }
                    _ => None,
                }
            }
        }
    }

    /// Synthesize the minor-rank code for a child of `parent` whose own
    /// rank could not be resolved. A single-letter parent starts a chain
    /// at 1; a minor parent continues its chain.
    pub fn minor_under(parent: RankCode) -> RankCode {
        match parent {
            RankCode::Root => RankCode::Minor('R', 1),
            RankCode::Unclassified => RankCode::Minor('U', 1),
            RankCode::Canonical(c) => RankCode::Minor(c, 1),
            RankCode::Minor(c, n) => RankCode::Minor(c, n + 1),
        }
    }

    /// True for the traditional single-letter levels (incl. root and
    /// unclassified), false for synthesized intermediate levels.
    pub fn is_canonical(&self) -> bool {
        !matches!(self, RankCode::Minor(_, _))
    }

    /// The base letter, without any minor-rank numeral.
    pub fn letter(&self) -> char {
        match self {
            RankCode::Root => 'R',
            RankCode::Unclassified => 'U',
            RankCode::Canonical(c) | RankCode::Minor(c, _) => *c,
        }
    }
}

impl fmt::Display for RankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankCode::Root => write!(f, "R"),
            RankCode::Unclassified => write!(f, "U"),
            RankCode::Canonical(c) => write!(f, "{c}"),
            RankCode::Minor(c, n) => write!(f, "{c}{n}"),
        }
    }
}
