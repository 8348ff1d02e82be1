use crate::roster::Roster;

/// Finds the seat that plays after `current`.
///
/// Walks the circle from `current + 1`, wrapping around and skipping
/// eliminated seats. `current` itself is the last candidate, so a lone
/// survivor plays again. Returns `None` only when every seat is eliminated,
/// which a correctly run match never reaches.
///
/// # Examples
///
/// ```
/// use buzz7_engine::roster::Roster;
/// use buzz7_engine::turn::next_active;
///
/// let mut roster = Roster::new(4, 3).unwrap();
/// roster.eliminate(1).unwrap();
/// roster.eliminate(2).unwrap();
/// assert_eq!(next_active(0, &roster), Some(3));
/// assert_eq!(next_active(3, &roster), Some(0));
/// ```
pub fn next_active(current: usize, roster: &Roster) -> Option<usize> {
    let len = roster.len();
    if len == 0 {
        return None;
    }
    (1..=len)
        .map(|step| (current + step) % len)
        .find(|&seat| !roster.players()[seat].is_eliminated())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rotation_wraps() {
        let roster = Roster::new(3, 3).expect("roster");
        assert_eq!(next_active(0, &roster), Some(1));
        assert_eq!(next_active(1, &roster), Some(2));
        assert_eq!(next_active(2, &roster), Some(0));
    }

    #[test]
    fn skips_eliminated_after_wrap() {
        let mut roster = Roster::new(5, 3).expect("roster");
        roster.eliminate(0).expect("eliminate");
        roster.eliminate(4).expect("eliminate");
        assert_eq!(next_active(3, &roster), Some(1));
    }

    #[test]
    fn current_seat_can_follow_itself() {
        let mut roster = Roster::new(3, 3).expect("roster");
        roster.eliminate(0).expect("eliminate");
        roster.eliminate(2).expect("eliminate");
        assert_eq!(next_active(1, &roster), Some(1));
    }

    #[test]
    fn everyone_out_yields_none() {
        let mut roster = Roster::new(3, 3).expect("roster");
        for seat in 0..3 {
            roster.eliminate(seat).expect("eliminate");
        }
        assert_eq!(next_active(1, &roster), None);
    }

    #[test]
    fn never_lands_on_eliminated_seat() {
        let mut roster = Roster::new(6, 3).expect("roster");
        roster.eliminate(2).expect("eliminate");
        roster.eliminate(5).expect("eliminate");
        let mut seat = 0;
        for _ in 0..20 {
            seat = next_active(seat, &roster).expect("next");
            assert!(!roster.players()[seat].is_eliminated());
        }
    }
}
