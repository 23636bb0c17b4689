//! The unified hiring formula. These numbers are load-bearing: every
//! multi-year projection compounds them.

use workforce_core::hiring::calculate_hiring_requirement;

const GROWTH: f64 = 0.03;
const TERMINATION: f64 = 0.12;
const NEW_HIRE_TERMINATION: f64 = 0.25;

#[test]
fn thousand_employees_reference_case() {
    let r = calculate_hiring_requirement(1000, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.experienced_terminations, 120);
    assert!((r.growth_amount - 30.0).abs() < 1e-9);
    assert_eq!(r.total_hires_needed, 200);
    assert_eq!(r.expected_new_hire_terminations, 50);
    assert_eq!(r.net_hiring_impact, 150);
    assert_eq!(r.replacement_hires, 120);
    assert_eq!(r.growth_hires, 80);
    assert_eq!(r.expected_ending_headcount(), 1030);
}

#[test]
fn growth_and_replacement_are_inflated_together() {
    let r = calculate_hiring_requirement(5036, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.experienced_terminations, 605);
    // Inflating each component separately yields 807 here.
    assert_eq!(r.total_hires_needed, 1009);
    assert_ne!(r.total_hires_needed, 807);
}

#[test]
fn expected_new_hire_terminations_round_half_up() {
    // 1 employee: ceil(0.12) = 1 termination, ceil(1.03 / 0.75) = 2 hires,
    // 2 * 0.25 = 0.5 exactly.
    let r = calculate_hiring_requirement(1, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.total_hires_needed, 2);
    assert_eq!(r.expected_new_hire_terminations, 1);
    assert_eq!(r.net_hiring_impact, 1);

    // 214 * 0.25 = 53.5
    let r = calculate_hiring_requirement(1061, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.total_hires_needed, 214);
    assert_eq!(r.expected_new_hire_terminations, 54);
}

#[test]
fn terminations_round_up() {
    // 1030 * 0.12 = 123.6
    let r = calculate_hiring_requirement(1030, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.experienced_terminations, 124);
    assert_eq!(r.total_hires_needed, 207);
    assert_eq!(r.expected_ending_headcount(), 1061);
}

#[test]
fn empty_workforce_needs_nothing() {
    let r = calculate_hiring_requirement(0, GROWTH, TERMINATION, NEW_HIRE_TERMINATION);
    assert_eq!(r.experienced_terminations, 0);
    assert_eq!(r.total_hires_needed, 0);
    assert_eq!(r.expected_new_hire_terminations, 0);
    assert_eq!(r.expected_ending_headcount(), 0);
}

#[test]
fn zero_new_hire_attrition_hires_exactly_the_net_need() {
    let r = calculate_hiring_requirement(1000, GROWTH, TERMINATION, 0.0);
    assert_eq!(r.total_hires_needed, 150);
    assert_eq!(r.expected_new_hire_terminations, 0);
    assert_eq!(r.net_hiring_impact, 150);
}
