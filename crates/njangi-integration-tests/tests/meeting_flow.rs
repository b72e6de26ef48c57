//! A full meeting cycle: enrollment, attendance, closing, penalties,
//! payout attribution.

use njangi_integration_tests::{date, fresh_stores, jean, marie, presence_tontine};
use njangi_model::{PenaltyStatus, Session, SessionStatus};
use njangi_store::Attendance;

#[tokio::test]
async fn presence_tontine_meeting_cycle() {
    let (_backend, stores) = fresh_stores();

    // Enrollment.
    let tontine = stores.tontines.add(presence_tontine()).await.unwrap();
    let jean = stores.members.add(jean()).await.unwrap();
    let marie = stores.members.add(marie()).await.unwrap();
    stores.tontines.register_member(&jean.id, &tontine.id, 1).await.unwrap();
    stores.tontines.register_member(&marie.id, &tontine.id, 2).await.unwrap();
    assert_eq!(stores.tontines.member_count(&tontine.id), 2);

    // Schedule the first session.
    let session = stores
        .sessions
        .add(Session::new(&tontine.id, 0, date(2024, 1, 15)))
        .await
        .unwrap();
    assert_eq!(session.number, 1);

    // Jean attends and pays in full; Marie is absent.
    let contribution = stores
        .contributions
        .record_with_attendance(&session.id, &jean.id, true, 50_000)
        .await
        .unwrap()
        .expect("present and paying creates a contribution");
    assert_eq!(contribution.expected_amount, 50_000);

    let absent = stores
        .contributions
        .record_with_attendance(&session.id, &marie.id, false, 0)
        .await
        .unwrap();
    assert!(absent.is_none());

    // Closing penalizes the absentee of a presence tontine.
    let outcome = stores
        .sessions
        .close(
            &session.id,
            5_000,
            &[Attendance::new(&jean.id, true), Attendance::new(&marie.id, false)],
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.penalties_created.len(), 1);
    assert_eq!(outcome.total_contributions, 50_000);
    assert_eq!(outcome.total_penalties, 5_000);
    assert_eq!(outcome.attendance_count, 1);

    // The created penalty is fetchable and payable.
    stores.penalties.fetch_all().await.unwrap();
    let penalty = stores
        .penalties
        .by_member(&marie.id)
        .into_iter()
        .next()
        .expect("absence penalty exists");
    assert_eq!(penalty.amount, 5_000);

    let paid = stores.penalties.pay(&penalty.id, 2_000).await.unwrap();
    assert_eq!(paid.status, PenaltyStatus::PartiallyPaid);
    assert_eq!(paid.remaining(), 3_000);

    // Pooled balance: 50,000 contributed + 2,000 penalty paid.
    assert_eq!(stores.tours.tontine_balance(&tontine.id).await.unwrap(), 52_000);

    // The backend attributes the session's pooled gain to Jean.
    let tour = stores.tours.assign_gain(&session.id, &jean.id).await.unwrap();
    assert_eq!(tour.number, 1);
    assert_eq!(tour.amount, 50_000);
    assert_eq!(tour.beneficiary_id, jean.id);

    // Money out brings the pool down.
    assert_eq!(stores.tours.tontine_balance(&tontine.id).await.unwrap(), 2_000);

    // Marie has not received a tour yet, Jean has.
    let eligibility = stores.tours.eligible_beneficiaries(&tontine.id).await.unwrap();
    let of = |id: &str| eligibility.iter().find(|e| e.member_id == id).unwrap().clone();
    assert!(!of(&jean.id).eligible);
    assert!(of(&marie.id).eligible);

    // Exports are pure functions over fetched state.
    let bytes = njangi_export::members_workbook(&stores.members.all()).unwrap();
    assert!(bytes.starts_with(b"PK"));
    let name = njangi_export::export_filename("membres", date(2026, 8, 6));
    assert_eq!(name, "membres_2026-08-06.xlsx");
}
