use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    Question, QuestionId, QuizDefinition, QuizHeader, QuizId, QuizResult, SessionStatus,
    SubmitTrigger,
};
use quiz_core::time::fixed_now;
use serde_json::{Value, json};
use services::{
    AppServices, AssessmentEngine, AssessmentSession, Clock, EngineConfig, SessionCommand,
    SessionError, SessionDriver, SessionOutcome, StaticEntitlement, SubmissionCoordinator,
};
use storage::repository::{
    InMemoryRepository, QuizRecord, QuizRepository, QuizSource, ResultRepository, ResultRow,
    StorageError,
};
use tokio::sync::mpsc;

fn three_question_body() -> Value {
    json!({
        "id": "algebra",
        "title": "Algebra basics",
        "duration": 20,
        "questions": [
            { "question": "2 + 2", "options": ["3", "4", "5"], "correctIndex": 1 },
            { "question": "3 * 3", "options": ["9", "6", "12"], "correctIndex": 0 },
            { "question": "10 / 5", "options": ["5", "3", "2"], "correctIndex": 2 }
        ]
    })
}

async fn seeded_repo(body: Value) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    let record = QuizRecord::from_json(None, body).unwrap();
    repo.upsert_quiz(&record).await.unwrap();
    repo
}

fn engine(
    source: Arc<dyn QuizSource>,
    premium: bool,
    repo: &InMemoryRepository,
) -> AssessmentEngine {
    AssessmentEngine::new(
        EngineConfig::default(),
        Clock::fixed(fixed_now()),
        source,
        Arc::new(StaticEntitlement(premium)),
        Arc::new(repo.clone()),
    )
}

fn short_quiz(duration_secs: u32) -> QuizDefinition {
    let questions = (0..2)
        .map(|i| {
            Question::new(
                QuestionId::from_ordinal(i),
                format!("Question {}", i + 1),
                vec!["yes".into(), "no".into()],
                0,
            )
            .unwrap()
        })
        .collect();
    QuizDefinition::new(
        QuizId::new("short").unwrap(),
        "Short",
        duration_secs,
        false,
        questions,
    )
    .unwrap()
}

/// Counts body fetches and optionally delays them.
struct CountingSource {
    inner: InMemoryRepository,
    fetches: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl QuizSource for CountingSource {
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError> {
        self.inner.quiz_header(id).await
    }

    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_quiz_by_id(id).await
    }
}

/// Stalls the header request; the body comes back immediately.
struct SlowHeaderSource {
    inner: InMemoryRepository,
    delay: Duration,
}

#[async_trait]
impl QuizSource for SlowHeaderSource {
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.quiz_header(id).await
    }

    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError> {
        self.inner.fetch_quiz_by_id(id).await
    }
}

struct FailingResults;

#[async_trait]
impl ResultRepository for FailingResults {
    async fn append_result(&self, _result: &QuizResult) -> Result<i64, StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn get_result(&self, _id: i64) -> Result<QuizResult, StorageError> {
        Err(StorageError::NotFound)
    }

    async fn list_result_rows(
        &self,
        _quiz_id: &QuizId,
        _limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn three_questions_partial_answers_score_33() {
    let repo = seeded_repo(three_question_body()).await;
    let engine = engine(Arc::new(repo.clone()), false, &repo);

    let mut session = engine.start_session("algebra").await.unwrap();
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.quiz().duration_secs(), 1200);
    session.start().unwrap();

    let q = |n| QuestionId::from_ordinal(n);
    session.select(&q(0), 1).unwrap();
    session.select(&q(1), 1).unwrap();

    let receipt = engine.coordinator().submit_manual(&mut session).await.unwrap();
    assert!(receipt.fresh);
    assert!(receipt.persisted);
    assert_eq!(receipt.result.attempted(), 2);
    assert_eq!(receipt.result.skipped(), 1);
    assert_eq!(receipt.result.correct(), 1);
    assert_eq!(receipt.result.percentage(), 33);
    assert_eq!(receipt.result.submitted_at(), fixed_now());

    let stored = repo.get_result(receipt.result_id.unwrap()).await.unwrap();
    assert_eq!(stored, receipt.result);
}

#[tokio::test]
async fn repeated_submit_persists_once() {
    let repo = seeded_repo(three_question_body()).await;
    let engine = engine(Arc::new(repo.clone()), false, &repo);
    let mut session = engine.start_session("algebra").await.unwrap();
    session.start().unwrap();

    let first = engine.coordinator().submit_manual(&mut session).await.unwrap();
    let second = engine.coordinator().submit_manual(&mut session).await.unwrap();

    assert!(first.fresh);
    assert!(!second.fresh);
    assert_eq!(first.result, second.result);
    assert_eq!(first.result_id, second.result_id);
    let rows = repo
        .list_result_rows(&QuizId::new("algebra").unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn premium_quiz_without_entitlement_never_fetches_body() {
    let mut body = three_question_body();
    body["premium"] = json!(true);
    let repo = seeded_repo(body).await;
    let source = Arc::new(CountingSource {
        inner: repo.clone(),
        fetches: AtomicUsize::new(0),
        delay: Duration::ZERO,
    });

    let blocked = engine(source.clone(), false, &repo);
    let err = blocked.start_session("algebra").await.unwrap_err();
    assert!(matches!(err, SessionError::NotEntitled(_)));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

    let allowed = engine(source.clone(), true, &repo);
    let session = allowed.start_session("algebra").await.unwrap();
    assert!(session.quiz().requires_entitlement());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn load_errors_are_classified() {
    let repo = seeded_repo(json!({ "id": "broken", "title": "Broken", "questions": [] })).await;
    let engine = engine(Arc::new(repo.clone()), false, &repo);

    assert!(matches!(
        engine.start_session("   ").await,
        Err(SessionError::InvalidQuizId(_))
    ));
    assert!(matches!(
        engine.start_session("missing").await,
        Err(SessionError::NotFound(_))
    ));
    assert!(matches!(
        engine.start_session("broken").await,
        Err(SessionError::Malformed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_load_signals_once_and_keeps_waiting() {
    let repo = seeded_repo(three_question_body()).await;
    let source = Arc::new(CountingSource {
        inner: repo.clone(),
        fetches: AtomicUsize::new(0),
        delay: Duration::from_secs(10),
    });
    let engine = engine(source.clone(), false, &repo);

    let signals = AtomicUsize::new(0);
    let session = engine
        .start_session_with_progress("algebra", || {
            signals.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(signals.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(session.quiz().total(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_header_also_signals() {
    let repo = seeded_repo(three_question_body()).await;
    let source = Arc::new(SlowHeaderSource {
        inner: repo.clone(),
        delay: Duration::from_secs(10),
    });
    let engine = engine(source, false, &repo);

    let signals = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();
    let session = engine
        .start_session_with_progress("algebra", || {
            signals.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(signals.load(Ordering::SeqCst), 1);
    assert_eq!(session.quiz().total(), 3);
}

#[tokio::test(start_paused = true)]
async fn fast_load_does_not_signal() {
    let repo = seeded_repo(three_question_body()).await;
    let source = Arc::new(CountingSource {
        inner: repo.clone(),
        fetches: AtomicUsize::new(0),
        delay: Duration::from_secs(1),
    });
    let engine = engine(source, false, &repo);

    let signals = AtomicUsize::new(0);
    engine
        .start_session_with_progress("algebra", || {
            signals.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    assert_eq!(signals.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn driver_auto_submits_when_time_runs_out() {
    let repo = InMemoryRepository::new();
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let session = AssessmentSession::new(short_quiz(5));
    let (driver, snapshots) = SessionDriver::new(session, coordinator, Duration::from_secs(1));

    let (tx, rx) = mpsc::channel(8);
    tx.send(SessionCommand::SelectCurrent(0)).await.unwrap();
    let started = tokio::time::Instant::now();
    let SessionOutcome::Completed(receipt) = driver.run(rx).await else {
        panic!("expected completion");
    };
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(receipt.result.trigger(), SubmitTrigger::Expired);
    assert_eq!(receipt.result.attempted(), 1);
    assert_eq!(receipt.result.correct(), 1);
    assert_eq!(receipt.result.percentage(), 50);

    let snap = snapshots.borrow().clone();
    assert_eq!(snap.status, SessionStatus::Completed);
    assert_eq!(snap.remaining_secs, 0);
    assert_eq!(snap.result_id, receipt.result_id);
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn driver_manual_submit_beats_expiry() {
    let repo = InMemoryRepository::new();
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let (driver, _snapshots) =
        SessionDriver::new(
        AssessmentSession::new(short_quiz(60)),
        coordinator,
        Duration::from_secs(1),
    );

    let (tx, rx) = mpsc::channel(8);
    tx.send(SessionCommand::Next).await.unwrap();
    tx.send(SessionCommand::SelectCurrent(1)).await.unwrap();
    tx.send(SessionCommand::Submit).await.unwrap();

    let SessionOutcome::Completed(receipt) = driver.run(rx).await else {
        panic!("expected completion");
    };
    assert_eq!(receipt.result.trigger(), SubmitTrigger::Manual);
    assert_eq!(receipt.result.correct(), 0);
    assert_eq!(receipt.result.skipped(), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    let rows = repo
        .list_result_rows(&QuizId::new("short").unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn closing_commands_abandons_without_result() {
    let repo = InMemoryRepository::new();
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let (driver, snapshots) =
        SessionDriver::new(
        AssessmentSession::new(short_quiz(3)),
        coordinator,
        Duration::from_secs(1),
    );

    let (tx, rx) = mpsc::channel(8);
    drop(tx);
    assert!(matches!(driver.run(rx).await, SessionOutcome::Abandoned));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(snapshots.borrow().status, SessionStatus::Abandoned);
    assert!(snapshots.borrow().result.is_none());
    let rows = repo
        .list_result_rows(&QuizId::new("short").unwrap(), 10)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn persist_failure_keeps_session_completed() {
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(FailingResults));
    let mut session = AssessmentSession::new(short_quiz(60));
    session.start().unwrap();

    let receipt = coordinator.submit_manual(&mut session).await.unwrap();
    assert!(receipt.fresh);
    assert!(!receipt.persisted);
    assert_eq!(receipt.result_id, None);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert!(session.persist_error().unwrap().contains("disk full"));
}

#[tokio::test(start_paused = true)]
async fn submit_and_final_pulse_in_same_turn_store_one_result() {
    let repo = InMemoryRepository::new();
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let (driver, snapshots) = SessionDriver::new(
        AssessmentSession::new(short_quiz(1)),
        coordinator,
        Duration::from_secs(1),
    );

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(driver.run(rx));
    tokio::task::yield_now().await;
    assert_eq!(snapshots.borrow().status, SessionStatus::Running);

    tx.send(SessionCommand::Submit).await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;

    let SessionOutcome::Completed(receipt) = task.await.unwrap() else {
        panic!("expected completion");
    };
    assert!(receipt.fresh);
    assert!(receipt.persisted);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let rows = repo
        .list_result_rows(&QuizId::new("short").unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(Some(rows[0].id), receipt.result_id);
    assert_eq!(rows[0].result, receipt.result);
    assert_eq!(snapshots.borrow().status, SessionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn rejected_answer_is_reported_in_snapshot() {
    let repo = InMemoryRepository::new();
    let coordinator =
        SubmissionCoordinator::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let (driver, mut snapshots) = SessionDriver::new(
        AssessmentSession::new(short_quiz(60)),
        coordinator,
        Duration::from_secs(1),
    );

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(driver.run(rx));

    tx.send(SessionCommand::SelectCurrent(6)).await.unwrap();
    let snap = snapshots
        .wait_for(|s| s.last_error.is_some())
        .await
        .unwrap()
        .clone();
    assert!(snap.last_error.unwrap().contains("option 6"));
    assert_eq!(snap.answered_count, 0);

    tx.send(SessionCommand::SelectCurrent(0)).await.unwrap();
    let snap = snapshots
        .wait_for(|s| s.answered_count == 1)
        .await
        .unwrap()
        .clone();
    assert_eq!(snap.last_error, None);

    tx.send(SessionCommand::Leave).await.unwrap();
    assert!(matches!(task.await.unwrap(), SessionOutcome::Abandoned));
    assert_eq!(snapshots.borrow().status, SessionStatus::Abandoned);
}

#[tokio::test]
async fn in_memory_services_run_and_list_a_session() {
    let (services, storage) = AppServices::in_memory(
        Clock::fixed(fixed_now()),
        EngineConfig::default(),
        Arc::new(StaticEntitlement(false)),
    );
    let record = QuizRecord::from_json(None, three_question_body()).unwrap();
    storage.quizzes.upsert_quiz(&record).await.unwrap();

    let engine = services.engine();
    let mut session = engine.start_session("algebra").await.unwrap();
    session.start().unwrap();
    session.select(&QuestionId::from_ordinal(2), 2).unwrap();
    let receipt = engine.coordinator().submit_manual(&mut session).await.unwrap();

    let items = services.history().list_recent("algebra", 7, 10).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(Some(items[0].id), receipt.result_id);
    assert_eq!(items[0].correct, 1);
    assert_eq!(items[0].skipped, 2);
}
