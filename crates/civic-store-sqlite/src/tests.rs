//! Integration tests for `SqliteStore` against an in-memory database.

use civic_core::{
  Classify as _, ErrorKind,
  petition::{Category, NewPetition, PetitionStatus},
  response::NewResponse,
  signature::NewSignature,
  store::{PetitionQuery, PetitionStore},
  timeline::TimelineEventKind,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_petition(title: &str, goal: u64) -> NewPetition {
  NewPetition {
    title:             title.into(),
    description:       "The road to the market has collapsed".into(),
    category:          Category::Infrastructure,
    creator_id:        Uuid::new_v4(),
    representative_id: Uuid::new_v4(),
    signature_goal:    Some(goal),
  }
}

fn kinds(entries: &[civic_core::timeline::TimelineEntry]) -> Vec<TimelineEventKind> {
  entries.iter().map(|e| e.kind).collect()
}

async fn sign_n(s: &SqliteStore, petition_id: Uuid, n: usize) {
  for _ in 0..n {
    s.sign(NewSignature::new(petition_id, Uuid::new_v4()))
      .await
      .unwrap();
  }
}

// ─── Petitions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_petition() {
  let s = store().await;

  let p = s.create_petition(new_petition("Fix Ikorodu Road", 10)).await.unwrap();
  assert_eq!(p.status, PetitionStatus::Active);
  assert_eq!(p.signature_count, 0);

  let fetched = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(fetched, p);

  let timeline = s.timeline(p.petition_id).await.unwrap();
  assert_eq!(kinds(&timeline), [TimelineEventKind::Created]);
  assert_eq!(timeline[0].description.as_deref(), Some("Petition created"));
}

#[tokio::test]
async fn get_petition_missing_returns_none() {
  let s = store().await;
  assert!(s.get_petition(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.petition_detail(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_petition_is_rejected_without_writing() {
  let s = store().await;

  let err = s.create_petition(new_petition("", 10)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let page = s.list_petitions(&PetitionQuery::default()).await.unwrap();
  assert_eq!(page.total, 0);
}

#[tokio::test]
async fn goal_beyond_storable_range_is_a_validation_error() {
  let s = store().await;

  let err = s
    .create_petition(new_petition("Huge", u64::MAX))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let page = s.list_petitions(&PetitionQuery::default()).await.unwrap();
  assert_eq!(page.total, 0);
}

#[tokio::test]
async fn list_filters_and_paginates() {
  let s = store().await;

  for i in 0..5 {
    s.create_petition(new_petition(&format!("Road repair {i}"), 10))
      .await
      .unwrap();
  }
  let mut school = new_petition("More teachers for Kano schools", 10);
  school.category = Category::Education;
  let school = s.create_petition(school).await.unwrap();

  let all = s.list_petitions(&PetitionQuery::default()).await.unwrap();
  assert_eq!(all.total, 6);
  // Newest first.
  assert_eq!(all.items[0].petition_id, school.petition_id);

  let education = s
    .list_petitions(&PetitionQuery {
      category: Some(Category::Education),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(education.total, 1);
  assert_eq!(education.items[0].petition_id, school.petition_id);

  let searched = s
    .list_petitions(&PetitionQuery {
      search: Some("ROAD".into()),
      page: Some(2),
      limit: Some(2),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(searched.total, 5);
  assert_eq!(searched.total_pages, 3);
  assert_eq!(searched.items.len(), 2);
  assert!(searched.items.iter().all(|p| p.title.starts_with("Road repair")));
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let s = store().await;
  s.create_petition(new_petition("100% renewable grid", 10)).await.unwrap();
  s.create_petition(new_petition("1000 new boreholes", 10)).await.unwrap();

  let page = s
    .list_petitions(&PetitionQuery { search: Some("100%".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].title, "100% renewable grid");
}

#[tokio::test]
async fn search_ignores_case_beyond_ascii() {
  let s = store().await;
  let ecole = s
    .create_petition(new_petition("ÉCOLE publique de Cotonou", 10))
    .await
    .unwrap();
  s.create_petition(new_petition("Ecole road", 10)).await.unwrap();

  let query = PetitionQuery { search: Some("école".into()), ..Default::default() };
  let page = s.list_petitions(&query).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].petition_id, ecole.petition_id);
  assert!(query.matches(&ecole));

  let upper = PetitionQuery { search: Some("ÉCOLE".into()), ..Default::default() };
  assert_eq!(s.list_petitions(&upper).await.unwrap().total, 1);
}

#[tokio::test]
async fn list_filters_by_status() {
  let s = store().await;
  let done = s.create_petition(new_petition("Quick win", 1)).await.unwrap();
  s.create_petition(new_petition("Slow burn", 100)).await.unwrap();
  sign_n(&s, done.petition_id, 1).await;

  let page = s
    .list_petitions(&PetitionQuery {
      status: Some(PetitionStatus::ThresholdReached),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].petition_id, done.petition_id);
}

// ─── Signing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_records_signature_and_increments() {
  let s = store().await;
  let p = s.create_petition(new_petition("Clean water", 10)).await.unwrap();
  let citizen = Uuid::new_v4();

  let result = s
    .sign(NewSignature {
      petition_id: p.petition_id,
      citizen_id:  citizen,
      comment:     Some("My street has had no water for weeks".into()),
      anonymous:   true,
    })
    .await
    .unwrap();
  assert_eq!(result.signature_count, 1);
  assert_eq!(result.status, PetitionStatus::Active);
  assert!(!result.threshold_reached);

  let sigs = s.list_signatures(p.petition_id).await.unwrap();
  assert_eq!(sigs.len(), 1);
  assert_eq!(sigs[0], result.signature);
  assert!(sigs[0].anonymous);
}

#[tokio::test]
async fn duplicate_signature_changes_nothing() {
  let s = store().await;
  let p = s.create_petition(new_petition("Clean water", 10)).await.unwrap();
  let citizen = Uuid::new_v4();

  s.sign(NewSignature::new(p.petition_id, citizen)).await.unwrap();
  let err = s
    .sign(NewSignature::new(p.petition_id, citizen))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::DuplicateSignature);
  assert!(!err.is_retryable());

  let p = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(p.signature_count, 1);
  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), 1);
}

#[tokio::test]
async fn sign_unknown_petition_is_not_found() {
  let s = store().await;
  let err = s
    .sign(NewSignature::new(Uuid::new_v4(), Uuid::new_v4()))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn signing_outside_active_is_invalid_state() {
  let s = store().await;
  let p = s.create_petition(new_petition("Closed early", 10)).await.unwrap();
  s.close(p.petition_id).await.unwrap();
  let before = s.timeline(p.petition_id).await.unwrap();

  let err = s
    .sign(NewSignature::new(p.petition_id, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidState);

  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), 0);
  assert_eq!(s.timeline(p.petition_id).await.unwrap(), before);
}

#[tokio::test]
async fn threshold_reached_exactly_at_goal() {
  let s = store().await;
  let p = s.create_petition(new_petition("Goal of five", 5)).await.unwrap();

  for i in 1..=4 {
    let r = s.sign(NewSignature::new(p.petition_id, Uuid::new_v4())).await.unwrap();
    assert_eq!(r.signature_count, i);
    assert!(!r.threshold_reached);
  }
  let fifth = s.sign(NewSignature::new(p.petition_id, Uuid::new_v4())).await.unwrap();
  assert!(fifth.threshold_reached);
  assert_eq!(fifth.status, PetitionStatus::ThresholdReached);

  let sixth = s
    .sign(NewSignature::new(p.petition_id, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert_eq!(sixth.kind(), ErrorKind::InvalidState);

  let timeline = s.timeline(p.petition_id).await.unwrap();
  assert_eq!(kinds(&timeline), [
    TimelineEventKind::Created,
    TimelineEventKind::ThresholdReached
  ]);
  assert_eq!(
    timeline[1].description.as_deref(),
    Some("Petition reached 5 signatures! Ready to be sent.")
  );
}

#[tokio::test]
async fn milestone_emitted_once_when_passing_one_hundred() {
  let s = store().await;
  let p = s.create_petition(new_petition("Big one", 1000)).await.unwrap();

  sign_n(&s, p.petition_id, 110).await;

  let timeline = s.timeline(p.petition_id).await.unwrap();
  let milestones: Vec<_> = timeline
    .iter()
    .filter(|e| e.kind == TimelineEventKind::SignatureMilestone)
    .collect();
  assert_eq!(milestones.len(), 1);
  assert_eq!(
    milestones[0].description.as_deref(),
    Some("Petition reached 100 signatures!")
  );
  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), 110);
}

#[tokio::test]
async fn milestone_and_threshold_in_one_signing_keep_insertion_order() {
  let s = store().await;
  let p = s.create_petition(new_petition("Exactly a hundred", 100)).await.unwrap();

  sign_n(&s, p.petition_id, 100).await;

  let timeline = s.timeline(p.petition_id).await.unwrap();
  assert_eq!(kinds(&timeline), [
    TimelineEventKind::Created,
    TimelineEventKind::SignatureMilestone,
    TimelineEventKind::ThresholdReached,
  ]);
  assert_eq!(timeline[1].created_at, timeline[2].created_at);
  assert!(timeline[1].sequence < timeline[2].sequence);
}

#[tokio::test]
async fn end_to_end_goal_of_two() {
  let s = store().await;
  let p = s.create_petition(new_petition("Two will do", 2)).await.unwrap();
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();

  let r = s.sign(NewSignature::new(p.petition_id, a)).await.unwrap();
  assert_eq!((r.signature_count, r.status), (1, PetitionStatus::Active));
  assert_eq!(kinds(&s.timeline(p.petition_id).await.unwrap()), [
    TimelineEventKind::Created
  ]);

  let r = s.sign(NewSignature::new(p.petition_id, b)).await.unwrap();
  assert_eq!(
    (r.signature_count, r.status),
    (2, PetitionStatus::ThresholdReached)
  );
  assert_eq!(kinds(&s.timeline(p.petition_id).await.unwrap()), [
    TimelineEventKind::Created,
    TimelineEventKind::ThresholdReached
  ]);

  let err = s.sign(NewSignature::new(p.petition_id, a)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::DuplicateSignature);
  let p = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(p.signature_count, 2);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_signers_lose_no_updates() {
  let s = store().await;
  let p = s.create_petition(new_petition("Crowded", 1000)).await.unwrap();
  const N: usize = 64;

  let handles: Vec<_> = (0..N)
    .map(|_| {
      let s = s.clone();
      let id = p.petition_id;
      tokio::spawn(async move { s.sign(NewSignature::new(id, Uuid::new_v4())).await })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap();
  }

  let p = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(p.signature_count, N as u64);
  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), N as u64);
  assert_eq!(s.list_signatures(p.petition_id).await.unwrap().len(), N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_double_submit_admits_exactly_one() {
  let s = store().await;
  let p = s.create_petition(new_petition("Double click", 1000)).await.unwrap();
  let citizen = Uuid::new_v4();

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      let id = p.petition_id;
      tokio::spawn(async move { s.sign(NewSignature::new(id, citizen)).await })
    })
    .collect();

  let mut ok = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => ok += 1,
      Err(e) => assert_eq!(e.kind(), ErrorKind::DuplicateSignature),
    }
  }
  assert_eq!(ok, 1);
  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), 1);
}

// ─── Delivery gateway ────────────────────────────────────────────────────────

#[tokio::test]
async fn gateway_progression_sets_each_timestamp_once() {
  let s = store().await;
  let p = s.create_petition(new_petition("Deliver me", 1)).await.unwrap();
  sign_n(&s, p.petition_id, 1).await;

  let ready = s.ready_for_delivery(10).await.unwrap();
  assert_eq!(ready.len(), 1);

  let sent = s.mark_sent(p.petition_id).await.unwrap();
  assert_eq!(sent.status, PetitionStatus::Sent);
  assert!(sent.sent_at.is_some());
  assert!(s.ready_for_delivery(10).await.unwrap().is_empty());

  let delivered = s.mark_delivered(p.petition_id).await.unwrap();
  assert_eq!(delivered.status, PetitionStatus::Delivered);
  assert_eq!(delivered.sent_at, sent.sent_at);

  let read = s.mark_read(p.petition_id).await.unwrap();
  assert_eq!(read.status, PetitionStatus::Read);
  assert!(read.read_at.is_some());

  let stored = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(stored, read);

  assert_eq!(kinds(&s.timeline(p.petition_id).await.unwrap()), [
    TimelineEventKind::Created,
    TimelineEventKind::ThresholdReached,
    TimelineEventKind::EmailSent,
    TimelineEventKind::EmailDelivered,
    TimelineEventKind::EmailOpened,
  ]);
}

#[tokio::test]
async fn out_of_order_gateway_step_is_invalid_state() {
  let s = store().await;
  let p = s.create_petition(new_petition("Not yet", 10)).await.unwrap();

  for err in [
    s.mark_sent(p.petition_id).await.unwrap_err(),
    s.mark_delivered(p.petition_id).await.unwrap_err(),
    s.mark_read(p.petition_id).await.unwrap_err(),
  ] {
    assert_eq!(err.kind(), ErrorKind::InvalidState);
  }

  let after = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(after, p);
  assert_eq!(s.timeline(p.petition_id).await.unwrap().len(), 1);
}

// ─── Responses and closing ───────────────────────────────────────────────────

fn response(name: &str) -> NewResponse {
  NewResponse {
    responder_name:  Some(name.into()),
    responder_title: Some("Senator".into()),
    content:         "Work begins next quarter.".into(),
    official:        true,
  }
}

#[tokio::test]
async fn response_moves_to_responded_and_is_listed() {
  let s = store().await;
  let p = s.create_petition(new_petition("Answer us", 1)).await.unwrap();
  sign_n(&s, p.petition_id, 1).await;
  s.mark_sent(p.petition_id).await.unwrap();

  let (petition, stored) = s
    .mark_responded(p.petition_id, response("Hon. Adebayo"))
    .await
    .unwrap();
  assert_eq!(petition.status, PetitionStatus::Responded);
  assert!(petition.responded_at.is_some());

  let detail = s.petition_detail(p.petition_id).await.unwrap().unwrap();
  assert_eq!(detail.responses, vec![stored]);
  let last = detail.timeline.last().unwrap();
  assert_eq!(last.kind, TimelineEventKind::ResponseReceived);
  assert_eq!(
    last.description.as_deref(),
    Some("Response received from Hon. Adebayo")
  );
}

#[tokio::test]
async fn closed_petition_refuses_responses_and_second_close() {
  let s = store().await;
  let p = s.create_petition(new_petition("Shut", 10)).await.unwrap();
  let closed = s.close(p.petition_id).await.unwrap();
  assert_eq!(closed.status, PetitionStatus::Closed);
  assert!(closed.closed_at.is_some());

  let err = s
    .mark_responded(p.petition_id, response("Hon. Bello"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidState);
  assert!(s.responses(p.petition_id).await.unwrap().is_empty());

  let err = s.close(p.petition_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn empty_response_is_a_validation_error() {
  let s = store().await;
  let p = s.create_petition(new_petition("Say something", 10)).await.unwrap();
  let mut r = response("Hon. Bello");
  r.content = "  ".into();

  let err = s.mark_responded(p.petition_id, r).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Timeline ledger ─────────────────────────────────────────────────────────

#[tokio::test]
async fn append_timeline_requires_petition() {
  let s = store().await;
  let err = s
    .append_timeline(Uuid::new_v4(), TimelineEventKind::EmailSent, None)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let p = s.create_petition(new_petition("Annotated", 10)).await.unwrap();
  let entry = s
    .append_timeline(
      p.petition_id,
      TimelineEventKind::EmailOpened,
      Some("Opened by the chief of staff".into()),
    )
    .await
    .unwrap();
  let timeline = s.timeline(p.petition_id).await.unwrap();
  assert_eq!(timeline.last(), Some(&entry));
  // Appending is a pure insert; status is untouched.
  let after = s.get_petition(p.petition_id).await.unwrap().unwrap();
  assert_eq!(after.status, PetitionStatus::Active);
}

// ─── Cascade ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_cascades_to_owned_rows() {
  let s = store().await;
  let p = s.create_petition(new_petition("Ephemeral", 1)).await.unwrap();
  sign_n(&s, p.petition_id, 1).await;
  s.mark_responded(p.petition_id, response("Hon. Musa")).await.unwrap();

  s.delete_petition(p.petition_id).await.unwrap();

  assert!(s.get_petition(p.petition_id).await.unwrap().is_none());
  assert_eq!(s.count_signatures(p.petition_id).await.unwrap(), 0);
  assert_eq!(
    s.timeline(p.petition_id).await.unwrap_err().kind(),
    ErrorKind::NotFound
  );

  let orphans: i64 = s
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT (SELECT COUNT(*) FROM signatures)
              + (SELECT COUNT(*) FROM timeline)
              + (SELECT COUNT(*) FROM responses)",
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(orphans, 0);

  let err = s.delete_petition(p.petition_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
