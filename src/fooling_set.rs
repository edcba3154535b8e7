/* Check fooling sets: every pair of elements must be told apart by its suffix, using only a
 * membership oracle for the language. */

use log::debug;
use std::fmt;

use crate::fa::render_word;

/// Outcome of appending one suffix to two prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixVerdict {
    Distinguishes,
    BothInLanguage,
    NeitherInLanguage,
}

impl SuffixVerdict {
    pub fn is_distinguishing(&self) -> bool {
        matches!(self, SuffixVerdict::Distinguishes)
    }
}

/// Decide whether `z` distinguishes `x` from `y`: exactly one of `xz` and `yz` must be in the
/// language.
pub fn check_distinguishing_suffix<L>(x: &str, y: &str, z: &str, mut is_in_language: L) -> SuffixVerdict
where
    L: FnMut(&str) -> bool,
{
    let first = is_in_language(&format!("{}{}", x, z));
    let second = is_in_language(&format!("{}{}", y, z));

    match (first, second) {
        (true, true) => SuffixVerdict::BothInLanguage,
        (false, false) => SuffixVerdict::NeitherInLanguage,
        _ => SuffixVerdict::Distinguishes,
    }
}

/// The first pair of fooling set elements whose suffix fails to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub i: usize,
    pub j: usize,
    pub x: String,
    pub y: String,
    pub z: String,
    /// True if both `xz` and `yz` are in the language, false if neither is.
    pub both_in_language: bool,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "When i = {} and j = {}, the suffix", self.i, self.j)?;
        writeln!(f)?;
        writeln!(f, "z = '{}'", self.z)?;
        writeln!(f)?;
        writeln!(f, "fails to distinguish the two fooling set elements")?;
        writeln!(f)?;
        writeln!(f, "x = '{}'", self.x)?;
        writeln!(f, "y = '{}'", self.y)?;

        let xz = format!("{}{}", self.x, self.z);
        let yz = format!("{}{}", self.y, self.z);
        if self.both_in_language {
            write!(
                f,
                "Both xz = '{}' and yz = '{}' are in the language.",
                render_word(&xz),
                render_word(&yz)
            )
        } else {
            write!(
                f,
                "Both xz = '{}' and yz = '{}' are not in the language.",
                render_word(&xz),
                render_word(&yz)
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoolingSetVerdict {
    Verified,
    Violation(Violation),
}

impl FoolingSetVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, FoolingSetVerdict::Verified)
    }
}

/// Check the elements `element(1)..=element(num_elements)` pairwise.
///
/// Ordered pairs are visited with `i` in the outer loop and `j` in the inner one, and the first
/// pair whose suffix does not distinguish its elements is reported. Each element is generated once.
pub fn verify_fooling_set<E, S, L>(
    num_elements: usize,
    mut element: E,
    mut suffix: S,
    mut is_in_language: L,
) -> FoolingSetVerdict
where
    E: FnMut(usize) -> String,
    S: FnMut(usize, usize) -> String,
    L: FnMut(&str) -> bool,
{
    let elements: Vec<String> = (1..=num_elements).map(&mut element).collect();

    for (i, x) in (1..).zip(elements.iter()) {
        for (j, y) in (1..).zip(elements.iter()) {
            if i == j {
                continue;
            }
            let z = suffix(i, j);
            let verdict = check_distinguishing_suffix(x, y, &z, &mut is_in_language);
            if !verdict.is_distinguishing() {
                debug!("Fooling set check failed for i = {}, j = {}", i, j);
                return FoolingSetVerdict::Violation(Violation {
                    i,
                    j,
                    x: x.clone(),
                    y: y.clone(),
                    z,
                    both_in_language: verdict == SuffixVerdict::BothInLanguage,
                });
            }
        }
    }

    debug!("Fooling set of {} elements verified", num_elements);
    FoolingSetVerdict::Verified
}
