use async_trait::async_trait;
use contact_etl::adapters::memory::{InMemoryContactStore, StaticTokenProvider};
use contact_etl::core::pipeline::PipelineState;
use contact_etl::{
    Age, AuthContext, Contact, ContactError, ContactFilter, ContactPipeline, ContactStore,
    Operation, PipelineSettings,
};
use std::time::Duration;

/// A store whose reads never complete. Writes land in the wrapped in-memory store.
struct StalledStore {
    inner: InMemoryContactStore,
}

#[async_trait]
impl ContactStore for StalledStore {
    async fn list_contacts(
        &self,
        _auth: &AuthContext,
        _filter: &ContactFilter,
    ) -> contact_etl::Result<Vec<Contact>> {
        std::future::pending().await
    }

    async fn save_contacts(&self, auth: &AuthContext, batch: &[Contact]) -> contact_etl::Result<()> {
        self.inner.save_contacts(auth, batch).await
    }
}

fn roster() -> Vec<Contact> {
    vec![
        Contact::new("Clark", "Kent", "Superman")
            .with_status("Alive")
            .with_age(Age::Years(40))
            .with_location("Metropolis"),
        Contact::new("Jonathan", "Crane", "Scarecrow")
            .with_status("Alive")
            .with_age(Age::Years(30))
            .with_location("Arkham"),
        Contact::new("Bruce", "Wayne", "Batman")
            .with_status("Alive")
            .with_age(Age::Years(44))
            .with_location("Gotham"),
        Contact::new("Jason", "Todd", "Robin")
            .with_status("Deceased")
            .with_age(Age::Unknown)
            .with_location("Gotham"),
        Contact::new("Dick", "Grayson", "Robin")
            .with_status("Alive")
            .with_age(Age::Years(25))
            .with_location("Bludhaven"),
    ]
}

fn pipeline(store: InMemoryContactStore) -> ContactPipeline<InMemoryContactStore, StaticTokenProvider> {
    let settings = PipelineSettings {
        reference_year: 2024,
        ..PipelineSettings::default()
    };
    ContactPipeline::with_settings(store, StaticTokenProvider::new("t0k3n"), settings)
}

#[tokio::test]
async fn test_connect_saves_batch_unchanged() {
    let store = InMemoryContactStore::with_contacts(roster());
    let pipeline = pipeline(store.clone());

    let report = pipeline.run(Operation::Connect).await.unwrap();

    assert_eq!(report.fetched, 5);
    assert_eq!(store.saved_batches(), vec![roster()]);
    assert_eq!(store.contacts(), roster());
}

#[tokio::test]
async fn test_heist_moves_alive_contacts_to_bank() {
    let store = InMemoryContactStore::with_contacts(roster());
    let pipeline = pipeline(store.clone());

    let report = pipeline.run(Operation::Heist).await.unwrap();

    assert_eq!(report.fetched, 4);
    assert!(report
        .persisted
        .iter()
        .all(|c| c.status == "Alive" && c.location == "Bank"));

    let jason = store
        .contacts()
        .into_iter()
        .find(|c| c.first_name == "Jason")
        .unwrap();
    assert_eq!(jason.location, "Gotham");
}

#[tokio::test]
async fn test_powers_end_to_end() {
    let store = InMemoryContactStore::with_contacts(roster());
    let pipeline = pipeline(store.clone());

    let report = pipeline.run(Operation::Powers).await.unwrap();

    assert_eq!(report.persisted.len(), 2);
    let superman = &report.persisted[0];
    assert_eq!(superman.title, "Superman");
    assert_eq!(
        superman.powers,
        Some(vec!["Laser Eyes".to_string(), "X-Ray Vision".to_string()])
    );
    let scarecrow = &report.persisted[1];
    assert_eq!(scarecrow.powers, Some(vec!["Toxic Immunity".to_string()]));
    assert_eq!(scarecrow.abilities, Some(vec!["Pedagogy".to_string()]));

    // a second run leaves the stored annotations as they were
    pipeline.run(Operation::Powers).await.unwrap();
    let batches = store.saved_batches();
    assert_eq!(batches[0], batches[1]);
}

#[tokio::test]
async fn test_birthdays_saves_only_the_oldest() {
    let store = InMemoryContactStore::with_contacts(roster());
    let pipeline = pipeline(store.clone());

    let report = pipeline.run(Operation::Birthdays).await.unwrap();

    assert_eq!(report.persisted.len(), 1);
    assert_eq!(report.persisted[0].first_name, "Bruce");
    assert_eq!(report.persisted[0].birth_year.as_deref(), Some("1980"));
    assert_eq!(store.saved_batches()[0].len(), 1);
}

#[tokio::test]
async fn test_birthdays_without_known_ages_saves_nothing() {
    let store = InMemoryContactStore::with_contacts(vec![
        Contact::new("John", "Doe", "Unknown Soldier").with_age(Age::Unknown)
    ]);
    let pipeline = pipeline(store.clone());

    let outcome = pipeline.execute(Operation::Birthdays).await;

    assert_eq!(outcome.final_state(), PipelineState::Failed);
    assert!(matches!(outcome.result, Err(ContactError::EmptyBatch { .. })));
    assert!(store.saved_batches().is_empty());
}

#[tokio::test]
async fn test_malformed_age_blocks_persist() {
    let mut contacts = roster();
    contacts.push(
        Contact::new("Harvey", "Dent", "Two-Face").with_age(Age::Invalid(serde_json::json!(-2))),
    );
    let store = InMemoryContactStore::with_contacts(contacts);
    let pipeline = pipeline(store.clone());

    let outcome = pipeline.execute(Operation::Birthdays).await;

    assert!(matches!(outcome.result, Err(ContactError::InvalidAge { .. })));
    assert_eq!(
        outcome.history[outcome.history.len() - 2],
        PipelineState::Transforming
    );
    assert!(store.saved_batches().is_empty());
}

#[tokio::test]
async fn test_sorting_orders_by_title_then_age() {
    let store = InMemoryContactStore::with_contacts(roster());
    let pipeline = pipeline(store.clone());

    let report = pipeline.run(Operation::Sorting).await.unwrap();

    let order: Vec<(&str, String)> = report
        .persisted
        .iter()
        .map(|c| (c.title.as_str(), c.age.to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Batman", "44".to_string()),
            ("Robin", "25".to_string()),
            ("Robin", "Unknown".to_string()),
            ("Scarecrow", "30".to_string()),
            ("Superman", "40".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_auth_failure_never_reaches_store() {
    let store = InMemoryContactStore::with_contacts(roster());
    let tokens = StaticTokenProvider::failing("expired credentials");
    let pipeline = ContactPipeline::new(store.clone(), tokens);

    let outcome = pipeline.execute(Operation::Connect).await;

    assert_eq!(
        outcome.history,
        vec![
            PipelineState::Idle,
            PipelineState::Authenticating,
            PipelineState::Failed
        ]
    );
    assert!(matches!(outcome.result, Err(ContactError::Auth { .. })));
    assert!(store.last_auth().is_none());
    assert!(store.saved_batches().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_transitions_to_failed_without_save() {
    let store = InMemoryContactStore::with_contacts(roster()).failing_reads("503");
    let pipeline = pipeline(store.clone());

    let outcome = pipeline.execute(Operation::Sorting).await;

    assert_eq!(outcome.final_state(), PipelineState::Failed);
    assert!(!outcome.history.contains(&PipelineState::Persisting));
    assert!(matches!(outcome.result, Err(ContactError::Fetch { .. })));
    assert!(store.saved_batches().is_empty());
}

#[tokio::test]
async fn test_persist_failure_is_reported() {
    let store = InMemoryContactStore::with_contacts(roster()).failing_writes("read-only");
    let pipeline = pipeline(store.clone());

    let err = pipeline.run(Operation::Heist).await.unwrap_err();

    assert!(matches!(err, ContactError::Persist { .. }));
    assert_eq!(store.contacts(), roster());
}

#[tokio::test]
async fn test_persist_failure_history_ends_in_failed() {
    let store = InMemoryContactStore::with_contacts(roster()).failing_writes("read-only");
    let pipeline = pipeline(store.clone());

    let outcome = pipeline.execute(Operation::Heist).await;

    assert_eq!(
        outcome.history,
        vec![
            PipelineState::Idle,
            PipelineState::Authenticating,
            PipelineState::Fetching,
            PipelineState::Transforming,
            PipelineState::Persisting,
            PipelineState::Failed
        ]
    );
    match outcome.result {
        Err(ContactError::Persist { message }) => assert!(message.contains("read-only")),
        other => panic!("expected Persist, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_dropped_during_fetch_saves_nothing() {
    let inner = InMemoryContactStore::with_contacts(roster());
    let pipeline = ContactPipeline::new(
        StalledStore {
            inner: inner.clone(),
        },
        StaticTokenProvider::new("t0k3n"),
    );

    let result =
        tokio::time::timeout(Duration::from_millis(50), pipeline.run(Operation::Connect)).await;

    assert!(result.is_err(), "fetch should still be pending");
    assert!(inner.saved_batches().is_empty());
    assert_eq!(inner.contacts(), roster());
}

#[tokio::test]
async fn test_one_token_per_run_attached_to_store_calls() {
    let store = InMemoryContactStore::with_contacts(roster());
    let tokens = StaticTokenProvider::new("t0k3n");
    let pipeline = ContactPipeline::new(store.clone(), tokens.clone());

    pipeline.run(Operation::Connect).await.unwrap();
    pipeline.run(Operation::Sorting).await.unwrap();

    assert_eq!(tokens.calls(), 2);
    let auth = store.last_auth().unwrap();
    assert_eq!(auth.operation, Operation::Sorting);
    assert_eq!(auth.bearer_token(), Some("t0k3n"));
}
