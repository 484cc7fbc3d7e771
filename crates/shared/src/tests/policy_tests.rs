use super::*;
use proptest::prelude::*;

fn any_step() -> impl Strategy<Value = Step> {
    proptest::sample::select(Step::ALL.to_vec())
}

#[test]
fn advancing_one_step_is_valid_everywhere_but_the_end() {
    for step in Step::ALL {
        match step.next() {
            Some(next) => {
                let result = validate_transition(step, next);
                assert!(result.is_valid, "{step} -> {next}");
                assert!(result.can_advance);
                assert!(!result.can_go_back);
            }
            None => assert!(Step::ALL
                .into_iter()
                .all(|to| !validate_transition(step, to).is_valid)),
        }
    }
}

#[test]
fn skipping_names_the_next_step() {
    let result = validate_transition(Step::PreProduction, Step::PostProduction);
    assert!(!result.is_valid);
    assert!(result.can_advance);
    assert!(result.message.contains(Step::Recording.label()));
}

#[test]
fn backward_moves_explain_forward_only_flow() {
    let result = validate_transition(Step::Recording, Step::Scripted);
    assert!(!result.is_valid);
    assert_eq!(result.message, BACKWARD_MESSAGE);
    assert!(result.can_advance);
    assert!(!result.can_go_back);
}

#[test]
fn helpers_report_domain_edges() {
    assert!(is_first_step(Step::Scripted));
    assert!(!is_first_step(Step::Recording));
    assert!(is_last_step(Step::Finished));
    assert_eq!(next_valid_steps(Step::Recording), vec![Step::PostProduction]);
    assert!(next_valid_steps(Step::Finished).is_empty());
}

#[test]
fn no_next_steps_message_depends_on_position() {
    assert!(no_next_steps_message(Step::Finished).contains("already finished"));
    assert!(no_next_steps_message(Step::Recording).contains(Step::Recording.label()));
}

#[test]
fn forward_only_policy_delegates() {
    let policy = ForwardOnlyPolicy;
    assert_eq!(
        policy.validate(Step::Scripted, Step::PreProduction),
        validate_transition(Step::Scripted, Step::PreProduction)
    );
}

proptest! {
    #[test]
    fn same_step_is_never_valid(step in any_step()) {
        let result = validate_transition(step, step);
        prop_assert!(!result.is_valid);
        prop_assert!(!result.can_advance);
        prop_assert!(!result.can_go_back);
        prop_assert_eq!(result.message.as_str(), ALREADY_AT_STEP_MESSAGE);
    }

    #[test]
    fn going_back_is_never_valid(from in any_step(), to in any_step()) {
        prop_assume!(to < from);
        let result = validate_transition(from, to);
        prop_assert!(!result.is_valid);
        prop_assert!(result.can_advance);
    }

    #[test]
    fn skipping_two_names_the_step_in_between(from in any_step()) {
        if let Some(to) = Step::from_number(from.number() + 2) {
            let result = validate_transition(from, to);
            prop_assert!(!result.is_valid);
            let between = from.next().expect("step in between");
            prop_assert!(result.message.contains(between.label()));
        }
    }

    #[test]
    fn valid_exactly_when_next(from in any_step(), to in any_step()) {
        prop_assert_eq!(is_valid_transition(from, to), from.next() == Some(to));
    }
}
