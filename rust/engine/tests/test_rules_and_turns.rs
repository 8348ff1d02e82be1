use buzz7_engine::roster::Roster;
use buzz7_engine::rules::{call_for, is_pass_required};
use buzz7_engine::turn::next_active;

#[test]
fn documented_rule_examples() {
    for n in [7, 14, 17, 27, 70, 0] {
        assert!(is_pass_required(n), "{} requires pass", n);
    }
    for n in [8, 13] {
        assert!(!is_pass_required(n), "{} is safe", n);
    }
}

#[test]
fn calls_match_rule() {
    assert_eq!(call_for(77), "Pass!");
    assert_eq!(call_for(76), "Pass!");
    assert_eq!(call_for(80), "80");
}

#[test]
fn rotation_with_two_seats_out() {
    let mut roster = Roster::new(4, 3).expect("roster");
    roster.eliminate(1).expect("eliminate");
    roster.eliminate(2).expect("eliminate");
    let mut seat = 0;
    let mut seen = Vec::new();
    for _ in 0..4 {
        seat = next_active(seat, &roster).expect("next seat");
        seen.push(seat);
    }
    assert_eq!(seen, vec![3, 0, 3, 0]);
}
