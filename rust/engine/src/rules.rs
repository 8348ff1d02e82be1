use crate::player::Action;
use serde::{Deserialize, Serialize};

/// Text a player shouts instead of a number when the pass condition holds.
pub const PASS_CALL: &str = "Pass!";
/// Bubble text shown when a player lets the clock run out.
pub const SILENT_CALL: &str = "...";

/// Returns `true` when `n` triggers the pass condition.
///
/// A number requires "pass" if it is a multiple of 7 or if its decimal
/// representation contains the digit 7. Zero is a multiple of 7.
///
/// # Examples
///
/// ```
/// use buzz7_engine::rules::is_pass_required;
///
/// assert!(is_pass_required(7));
/// assert!(is_pass_required(17));
/// assert!(is_pass_required(70));
/// assert!(!is_pass_required(8));
/// assert!(!is_pass_required(13));
/// ```
pub fn is_pass_required(n: u32) -> bool {
    if n % 7 == 0 {
        return true;
    }
    let mut rest = n;
    while rest > 0 {
        if rest % 10 == 7 {
            return true;
        }
        rest /= 10;
    }
    false
}

/// The action a correct player submits for `target`.
pub fn required_action(target: u32) -> Action {
    if is_pass_required(target) {
        Action::DeclarePass
    } else {
        Action::DeclareNumber
    }
}

/// What a correct player says out loud for `target`.
///
/// ```
/// use buzz7_engine::rules::call_for;
///
/// assert_eq!(call_for(14), "Pass!");
/// assert_eq!(call_for(15), "15");
/// ```
pub fn call_for(target: u32) -> String {
    if is_pass_required(target) {
        PASS_CALL.to_string()
    } else {
        target.to_string()
    }
}

/// What a seat actually said for `target`; `None` means the clock ran out.
pub fn spoken(target: u32, action: Option<Action>) -> String {
    match action {
        Some(Action::DeclarePass) => PASS_CALL.to_string(),
        Some(Action::DeclareNumber) => target.to_string(),
        None => SILENT_CALL.to_string(),
    }
}

/// Why a turn was scored as a mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    /// Declared pass on a safe number
    WrongPass,
    /// Declared the number when pass was required
    WrongNumber,
    /// The turn clock ran out
    Timeout,
}

/// Outcome of judging a single turn input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Mistake(MistakeKind),
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// Judges a declared action against the pass condition of `target`.
///
/// `None` stands for "no action before the clock expired"; a timeout is
/// always a mistake, even on a number that needs no pass.
///
/// ```
/// use buzz7_engine::player::Action;
/// use buzz7_engine::rules::{judge, MistakeKind, Verdict};
///
/// assert_eq!(judge(7, Some(Action::DeclarePass)), Verdict::Correct);
/// assert_eq!(
///     judge(8, Some(Action::DeclarePass)),
///     Verdict::Mistake(MistakeKind::WrongPass)
/// );
/// assert_eq!(judge(5, None), Verdict::Mistake(MistakeKind::Timeout));
/// ```
pub fn judge(target: u32, action: Option<Action>) -> Verdict {
    let required = is_pass_required(target);
    match action {
        None => Verdict::Mistake(MistakeKind::Timeout),
        Some(Action::DeclarePass) if required => Verdict::Correct,
        Some(Action::DeclarePass) => Verdict::Mistake(MistakeKind::WrongPass),
        Some(Action::DeclareNumber) if required => Verdict::Mistake(MistakeKind::WrongNumber),
        Some(Action::DeclareNumber) => Verdict::Correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiples_and_digit_sevens_require_pass() {
        for n in [0, 7, 14, 17, 21, 27, 70, 71, 77, 107, 700, 1007] {
            assert!(is_pass_required(n), "{} should require pass", n);
        }
        for n in [1, 8, 13, 15, 16, 19, 20, 22, 100, 101] {
            assert!(!is_pass_required(n), "{} should not require pass", n);
        }
    }

    #[test]
    fn matches_string_definition_for_first_thousand() {
        for n in 0..1000u32 {
            let expected = n % 7 == 0 || n.to_string().contains('7');
            assert_eq!(is_pass_required(n), expected, "mismatch at {}", n);
        }
    }

    #[test]
    fn required_action_follows_condition() {
        assert_eq!(required_action(28), Action::DeclarePass);
        assert_eq!(required_action(29), Action::DeclareNumber);
    }

    #[test]
    fn number_on_pass_target_is_wrong_number() {
        assert_eq!(
            judge(17, Some(Action::DeclareNumber)),
            Verdict::Mistake(MistakeKind::WrongNumber)
        );
        assert_eq!(judge(18, Some(Action::DeclareNumber)), Verdict::Correct);
    }

    #[test]
    fn spoken_text_reflects_what_was_declared() {
        assert_eq!(spoken(14, Some(Action::DeclareNumber)), "14");
        assert_eq!(spoken(15, Some(Action::DeclarePass)), PASS_CALL);
        assert_eq!(spoken(15, None), SILENT_CALL);
    }

    #[test]
    fn timeout_is_a_mistake_even_on_pass_targets() {
        assert_eq!(judge(7, None), Verdict::Mistake(MistakeKind::Timeout));
        assert!(!judge(5, None).is_correct());
    }
}
