//! Token matcher: earliest command marker in a normalized phonetic string
//!
//! Direction and separator groups are scanned independently; the earlier
//! occurrence wins, direction on an exact tie. Marker order inside a group is
//! irrelevant: occurrences compare by start index, then by length.

use crate::types::{Command, TokenMatch};

/// A romanized substring that signals a spoken command
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub text: &'static str,
    /// Occurrences that begin with this longer form belong to another command
    pub reject_if_starts: Option<&'static str>,
}

impl Marker {
    const fn plain(text: &'static str) -> Self {
        Self { text, reject_if_starts: None }
    }

    const fn guarded(text: &'static str, reject_if_starts: &'static str) -> Self {
        Self { text, reject_if_starts: Some(reject_if_starts) }
    }

    /// First accepted occurrence in `s`
    fn find_in(&self, s: &str) -> Option<usize> {
        let mut from = 0;
        while let Some(pos) = s[from..].find(self.text) {
            let at = from + pos;
            match self.reject_if_starts {
                Some(longer) if s[at..].starts_with(longer) => from = at + self.text.len(),
                _ => return Some(at),
            }
        }
        None
    }
}

/// Markers for one command
#[derive(Debug, Clone, Copy)]
pub struct MarkerGroup {
    pub command: Command,
    pub markers: &'static [Marker],
}

/// 上 / 下 / 左 / 右
pub const DIRECTION_GROUPS: [MarkerGroup; 4] = [
    MarkerGroup {
        command: Command::Up,
        // 向 (xiang) is heard as "towards" → up
        markers: &[
            Marker::plain("shang"),
            Marker::plain("sha"),
            Marker::plain("sang"),
            Marker::plain("xiang"),
        ],
    },
    MarkerGroup {
        command: Command::Down,
        // no bare "xi": it would fire inside xiang
        markers: &[Marker::guarded("xia", "xiang"), Marker::plain("hia")],
    },
    MarkerGroup {
        command: Command::Left,
        markers: &[Marker::plain("zuo"), Marker::plain("zu"), Marker::plain("zhuo")],
    },
    MarkerGroup {
        command: Command::Right,
        markers: &[Marker::plain("you"), Marker::plain("yo"), Marker::plain("iu")],
    },
];

/// 继续 and romanized variants. 下一个 is not listed: it collides with 下.
pub const SEPARATOR_GROUPS: [MarkerGroup; 2] = [
    MarkerGroup {
        command: Command::Continue,
        markers: &[
            Marker::plain("jixu"),
            Marker::plain("jixuyixia"),
            Marker::plain("jixuba"),
            Marker::plain("jixv"),
            Marker::plain("jixü"),
            Marker::plain("continue"),
        ],
    },
    MarkerGroup {
        command: Command::Next,
        markers: &[Marker::plain("next")],
    },
];

/// Scans normalized text against the marker catalogue
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenMatcher;

impl TokenMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Earliest command in `s`.
    ///
    /// With `suppress_directions` the direction group is ignored as if absent,
    /// so a separator later in the text can still match.
    pub fn find(&self, s: &str, suppress_directions: bool) -> Option<TokenMatch> {
        if s.is_empty() {
            return None;
        }

        let direction = if suppress_directions {
            None
        } else {
            self.find_direction(s)
        };
        let separator = self.find_separator(s);

        match (direction, separator) {
            (Some(d), Some(sep)) => Some(if d.start <= sep.start { d } else { sep }),
            (Some(d), None) => Some(d),
            (None, Some(sep)) => Some(sep),
            (None, None) => None,
        }
    }

    /// Earliest direction marker
    pub fn find_direction(&self, s: &str) -> Option<TokenMatch> {
        earliest_in(s, &DIRECTION_GROUPS)
    }

    /// Earliest separator marker
    pub fn find_separator(&self, s: &str) -> Option<TokenMatch> {
        earliest_in(s, &SEPARATOR_GROUPS)
    }
}

/// Earliest occurrence across groups; longest marker on equal start
fn earliest_in(s: &str, groups: &[MarkerGroup]) -> Option<TokenMatch> {
    let mut best: Option<TokenMatch> = None;

    for group in groups {
        for marker in group.markers {
            let Some(start) = marker.find_in(s) else {
                continue;
            };
            let candidate = TokenMatch {
                command: group.command,
                start,
                end: start + marker.text.len(),
            };
            best = match best {
                Some(b) if b.start < start || (b.start == start && b.len() >= candidate.len()) => {
                    Some(b)
                }
                _ => Some(candidate),
            };
        }
    }

    best
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn found(s: &str) -> Option<(Command, usize, usize)> {
        TokenMatcher::new().find(s, false).map(|m| (m.command, m.start, m.end))
    }

    #[test]
    fn test_empty_is_no_match() {
        assert_eq!(found(""), None);
        assert_eq!(found("haode"), None);
    }

    #[test]
    fn test_each_direction() {
        assert_eq!(found("shang"), Some((Command::Up, 0, 5)));
        assert_eq!(found("xia"), Some((Command::Down, 0, 3)));
        assert_eq!(found("zuo"), Some((Command::Left, 0, 3)));
        assert_eq!(found("you"), Some((Command::Right, 0, 3)));
    }

    #[test]
    fn test_longest_marker_on_tie() {
        // "sha" and "shang" both start at 0
        assert_eq!(found("shangbian"), Some((Command::Up, 0, 5)));
        assert_eq!(found("jixuyixia"), Some((Command::Continue, 0, 9)));
    }

    #[test]
    fn test_xiang_is_up_not_down() {
        assert_eq!(found("xiangzuo"), Some((Command::Up, 0, 5)));
    }

    #[test]
    fn test_xia_after_rejected_xiang() {
        let m = TokenMatcher::new().find_direction("xiangxia").unwrap();
        assert_eq!(m.start, 0);
        assert_eq!(m.command, Command::Up);

        let down = earliest_in("xiangxia", &DIRECTION_GROUPS[1..2]).unwrap();
        assert_eq!((down.command, down.start), (Command::Down, 5));
    }

    #[test]
    fn test_earliest_wins_across_groups() {
        assert_eq!(found("jixuxia"), Some((Command::Continue, 0, 4)));
        assert_eq!(found("xiajixu"), Some((Command::Down, 0, 3)));
        assert_eq!(found("haodejixu"), Some((Command::Continue, 5, 9)));
    }

    #[test]
    fn test_suppressed_directions_leave_separators() {
        let matcher = TokenMatcher::new();
        assert_eq!(matcher.find("shang", true), None);
        let m = matcher.find("shangjixu", true).unwrap();
        assert_eq!((m.command, m.start), (Command::Continue, 5));
    }

    #[test]
    fn test_romanized_separators() {
        assert_eq!(found("continue"), Some((Command::Continue, 0, 8)));
        assert_eq!(found("next"), Some((Command::Next, 0, 4)));
        assert_eq!(found("jixv"), Some((Command::Continue, 0, 4)));
    }

    #[test]
    fn test_xiayige_is_down() {
        assert_eq!(found("xiayige"), Some((Command::Down, 0, 3)));
    }
}
