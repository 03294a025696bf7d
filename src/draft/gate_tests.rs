use super::*;
use crate::draft::header::HeaderField;
use crate::draft::test_support::{complete_header, open_session};

#[test]
fn placeholder_category_is_the_only_missing_requirement() {
    let mut session = open_session();
    complete_header(&mut session);
    session.set_header(HeaderField::Category, "none").expect("placeholder");
    session.edit(1, "A", "changed").expect("edit");

    let missing = compute_missing_requirements(session.draft());
    assert_eq!(
        missing.into_iter().collect::<Vec<_>>(),
        vec![RequirementId::ChangeCategory]
    );
    assert!(!is_submittable(session.draft()));

    session
        .set_header(HeaderField::Category, "NEW_VALUE_ADD")
        .expect("category");
    assert!(compute_missing_requirements(session.draft()).is_empty());
    assert!(is_submittable(session.draft()));
    assert_eq!(ensure_submittable(session.draft()), Ok(()));
}

#[test]
fn all_keep_draft_needs_a_substantive_change() {
    let mut session = open_session();
    complete_header(&mut session);

    let missing = compute_missing_requirements(session.draft());
    assert!(missing.contains(&RequirementId::SubstantiveChange));
    assert_eq!(missing.len(), 1);
    assert!(!is_submittable(session.draft()));

    let err = ensure_submittable(session.draft()).expect_err("rejected");
    assert_eq!(
        err.to_string(),
        "submission rejected; missing requirements: substantive_change"
    );
}

#[test]
fn header_requirements_compare_trimmed_and_case_insensitively() {
    let mut session = open_session();
    session.toggle_retire(2).expect("retire");
    session.set_header(HeaderField::TicketRef, "   ").expect("ticket");
    session.set_header(HeaderField::Reason, "\t").expect("reason");
    session
        .set_header(HeaderField::Category, " None ")
        .expect("category");

    let missing = compute_missing_requirements(session.draft());
    assert_eq!(
        missing.into_iter().collect::<Vec<_>>(),
        vec![
            RequirementId::ChangeTicketRef,
            RequirementId::ChangeReason,
            RequirementId::ChangeCategory,
        ]
    );
}

#[test]
fn removing_input_never_shrinks_the_missing_set() {
    let mut session = open_session();
    complete_header(&mut session);
    session.edit(1, "A", "changed").expect("edit");
    assert!(is_submittable(session.draft()));

    let steps: [(HeaderField, RequirementId); 3] = [
        (HeaderField::TicketRef, RequirementId::ChangeTicketRef),
        (HeaderField::Reason, RequirementId::ChangeReason),
        (HeaderField::Category, RequirementId::ChangeCategory),
    ];
    let mut previous = compute_missing_requirements(session.draft());
    for (field, id) in steps {
        session.set_header(field, "").expect("clear");
        let current = compute_missing_requirements(session.draft());
        assert!(current.is_superset(&previous));
        assert!(current.contains(&id));
        previous = current;
    }

    session.edit(1, "A", "x").expect("revert");
    let current = compute_missing_requirements(session.draft());
    assert!(current.is_superset(&previous));
    assert_eq!(current.len(), RequirementId::ALL.len());
}

#[test]
fn filling_the_last_requirement_flips_submittable() {
    let mut session = open_session();
    session.set_header(HeaderField::TicketRef, "CHG-7").expect("ticket");
    session.set_header(HeaderField::Reason, "cleanup").expect("reason");
    session
        .set_header(HeaderField::Category, "OTHER")
        .expect("category");
    assert!(!is_submittable(session.draft()));

    session.add_row().expect("add");
    assert!(is_submittable(session.draft()));
}

#[test]
fn evaluation_reports_every_requirement_in_order_with_hints() {
    let session = open_session();
    let statuses = evaluate_requirements(session.draft());
    let ids = statuses.iter().map(|status| status.id).collect::<Vec<_>>();
    assert_eq!(ids, RequirementId::ALL.to_vec());
    assert!(statuses
        .iter()
        .all(|status| status.status == RequirementState::Unmet && status.hint.is_some()));

    let json = serde_json::to_value(&statuses[3]).expect("serialize");
    assert_eq!(json["id"], "substantive_change");
    assert_eq!(json["status"], "unmet");
}

#[test]
fn unsubmittable_dirty_drafts_remain_saveable() {
    let mut session = open_session();
    assert!(!is_saveable(session.draft()));
    session.set_comment(1, "checked").expect("comment");
    assert!(is_saveable(session.draft()));
    assert!(!is_submittable(session.draft()));
}
