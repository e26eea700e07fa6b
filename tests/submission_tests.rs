//! # Submission Tests
//!
//! End-to-end tests of the new-project conversation: the dialogue is driven
//! message by message, then the finished draft goes through the submission
//! pipeline backed by in-memory fakes for file hosting, object storage and the
//! project database.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use showcase::db::{NewProject, PersistedProject, ProjectStore, User};
use showcase::dialogue::{advance, start, FlowInput, PhotoVariant, ProjectDialogueState, Transition};
use showcase::flow_errors::FlowError;
use showcase::image_intake::FileSource;
use showcase::links::{ProjectLink, SocialPlatform};
use showcase::session::{begin_conversation, InMemorySessionStore, SessionStore};
use showcase::storage::ObjectStorage;
use showcase::submission::{finish_flow, ProjectSubmitter};

const TELEGRAM_ID: i64 = 4242;

struct FakeFiles {
    path: Option<String>,
}

#[async_trait]
impl FileSource for FakeFiles {
    async fn resolve_path(&self, file_id: &str) -> Result<String> {
        self.path
            .clone()
            .ok_or_else(|| anyhow!("File {file_id} has no downloadable path"))
    }

    async fn download(&self, _file_path: &str) -> Result<Bytes> {
        Ok(Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"))
    }
}

#[derive(Default)]
struct FakeStorage {
    fail: bool,
    uploads: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, path: &str, _data: Bytes, content_type: &str) -> Result<String> {
        if self.fail {
            return Err(anyhow!("storage unavailable"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string()));
        Ok(format!("https://storage.example/public/{path}"))
    }
}

#[derive(Default)]
struct FakeProjects {
    return_no_row: bool,
    next_id: AtomicI64,
    inserted: Mutex<Vec<PersistedProject>>,
}

#[async_trait]
impl ProjectStore for FakeProjects {
    async fn ensure_user(&self, telegram_id: i64, display_name: Option<&str>) -> Result<User> {
        Ok(User {
            id: 1,
            telegram_id,
            display_name: display_name.map(str::to_string),
            created_at: Utc::now(),
        })
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Option<PersistedProject>> {
        if self.return_no_row {
            return Ok(None);
        }
        let persisted = PersistedProject {
            project_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: project.user_id,
            title: project.title.clone(),
            description: project.description.clone(),
            slug: project.slug.clone(),
            avatar_url: project.avatar_url.clone(),
            links: project.links.clone(),
            created_at: Utc::now(),
        };
        self.inserted.lock().unwrap().push(persisted.clone());
        Ok(Some(persisted))
    }
}

struct Harness {
    storage: Arc<FakeStorage>,
    projects: Arc<FakeProjects>,
    sessions: Arc<InMemorySessionStore>,
    submitter: ProjectSubmitter,
}

fn harness(file_path: Option<&str>, storage: FakeStorage, projects: FakeProjects) -> Harness {
    let storage = Arc::new(storage);
    let projects = Arc::new(projects);
    let sessions = Arc::new(InMemorySessionStore::new());
    let submitter = ProjectSubmitter::new(
        Arc::new(FakeFiles {
            path: file_path.map(str::to_string),
        }),
        storage.clone(),
        projects.clone(),
        sessions.clone(),
    );
    Harness {
        storage,
        projects,
        sessions,
        submitter,
    }
}

fn user() -> User {
    User {
        id: 1,
        telegram_id: TELEGRAM_ID,
        display_name: Some("Ada Lovelace".to_string()),
        created_at: Utc::now(),
    }
}

fn photos() -> Vec<PhotoVariant> {
    vec![
        PhotoVariant {
            file_id: "thumb".to_string(),
            width: 90,
            height: 90,
            file_size: 1_000,
        },
        PhotoVariant {
            file_id: "full".to_string(),
            width: 1280,
            height: 1280,
            file_size: 120_000,
        },
    ]
}

/// Feed answers to the dialogue, returning the final transition
fn run_dialogue(answers: Vec<FlowInput>) -> Transition {
    let mut state = match start() {
        Transition::Prompt { next, .. } => next,
        other => panic!("Unexpected start transition: {other:?}"),
    };

    let mut answers = answers.into_iter().peekable();
    while let Some(input) = answers.next() {
        let transition = advance(state, input);
        if answers.peek().is_none() {
            return transition;
        }
        state = match transition {
            Transition::Prompt { next, .. } => next,
            other => return other,
        };
    }
    panic!("No answers given");
}

fn text(value: &str) -> FlowInput {
    FlowInput::Text(value.to_string())
}

fn form(twitter: &str, github: &str) -> Vec<FlowInput> {
    vec![
        text("Acme"),
        text("A widget maker"),
        text(twitter),
        text(github),
        FlowInput::Photo(photos()),
    ]
}

#[tokio::test]
async fn test_acme_end_to_end() {
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), FakeProjects::default());
    begin_conversation(h.sessions.as_ref(), TELEGRAM_ID).await;

    let (draft, photo) = match run_dialogue(form("no", "https://github.com/acme-oss")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };
    assert_eq!(photo.file_id, "full");

    let project = h
        .submitter
        .submit(TELEGRAM_ID, &user(), draft, &photo)
        .await
        .expect("submission should succeed");

    assert_eq!(project.title, "Acme");
    assert_eq!(project.description, "A widget maker");
    assert_eq!(
        project.links,
        vec![ProjectLink {
            title: "GitHub".to_string(),
            url: "https://github.com/acme-oss".to_string(),
        }]
    );
    assert!(project.slug.starts_with("acme-"));

    let uploads = h.storage.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, format!("{}.jpg", project.slug));
    assert_eq!(uploads[0].1, "image/jpeg");
    assert_eq!(
        project.avatar_url.as_deref(),
        Some(format!("https://storage.example/public/{}.jpg", project.slug).as_str())
    );

    assert_eq!(h.projects.inserted.lock().unwrap().len(), 1);

    let session = h.sessions.get(TELEGRAM_ID).await.unwrap();
    assert_eq!(session.active_project, Some(project.project_id));
    assert_eq!(session.project, Some(project));
}

#[tokio::test]
async fn test_bare_twitter_handle_end_to_end() {
    let h = harness(Some("photos/file_8.png"), FakeStorage::default(), FakeProjects::default());

    let (draft, photo) = match run_dialogue(form("elonmusk", "no")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let project = h
        .submitter
        .submit(TELEGRAM_ID, &user(), draft, &photo)
        .await
        .unwrap();

    assert_eq!(
        project.links,
        vec![ProjectLink {
            title: "Twitter".to_string(),
            url: "https://twitter.com/elonmusk".to_string(),
        }]
    );

    let uploads = h.storage.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0].0, format!("{}.png", project.slug));
    assert_eq!(uploads[0].1, "image/png");
}

#[tokio::test]
async fn test_both_links_keep_twitter_first() {
    let h = harness(Some("photos/file_9.jpg"), FakeStorage::default(), FakeProjects::default());

    let (draft, photo) = match run_dialogue(form(
        "https://www.twitter.com/acme_hq",
        "acme-oss",
    )) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let project = h
        .submitter
        .submit(TELEGRAM_ID, &user(), draft, &photo)
        .await
        .unwrap();

    let titles: Vec<_> = project.links.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Twitter", "GitHub"]);
    assert_eq!(project.links[0].url, "https://twitter.com/acme_hq");
    assert_eq!(project.links[1].url, "https://github.com/acme-oss");
}

#[tokio::test]
async fn test_malformed_url_never_reaches_submission() {
    let transition = run_dialogue(vec![
        text("Acme"),
        text("A widget maker"),
        text("https://example.com/acme"),
    ]);
    assert_eq!(
        transition,
        Transition::Abort(FlowError::InvalidUrl(SocialPlatform::Twitter))
    );

    let transition = run_dialogue(vec![
        text("Acme"),
        text("A widget maker"),
        text("no"),
        text("https://gitlab.com/acme"),
    ]);
    assert_eq!(
        transition,
        Transition::Abort(FlowError::InvalidUrl(SocialPlatform::Github))
    );
}

#[tokio::test]
async fn test_non_photo_at_image_step_aborts() {
    let transition = run_dialogue(vec![
        text("Acme"),
        text("A widget maker"),
        text("no"),
        text("no"),
        text("I will send it later"),
    ]);
    assert_eq!(transition, Transition::Abort(FlowError::MissingPhoto));
}

#[tokio::test]
async fn test_upload_failure_creates_no_project() {
    let storage = FakeStorage {
        fail: true,
        ..Default::default()
    };
    let h = harness(Some("photos/file_7.jpg"), storage, FakeProjects::default());
    begin_conversation(h.sessions.as_ref(), TELEGRAM_ID).await;

    let (draft, photo) = match run_dialogue(form("no", "no")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let result = h.submitter.submit(TELEGRAM_ID, &user(), draft, &photo).await;
    assert!(matches!(result, Err(FlowError::Upload(_))));
    assert!(h.projects.inserted.lock().unwrap().is_empty());

    let session = h.sessions.get(TELEGRAM_ID).await.unwrap();
    assert_eq!(session.active_project, None);
}

#[tokio::test]
async fn test_missing_file_path_is_an_upload_error() {
    let h = harness(None, FakeStorage::default(), FakeProjects::default());

    let (draft, photo) = match run_dialogue(form("no", "no")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let result = h.submitter.submit(TELEGRAM_ID, &user(), draft, &photo).await;
    assert!(matches!(result, Err(FlowError::Upload(_))));
    assert!(h.storage.uploads.lock().unwrap().is_empty());
    assert!(h.projects.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_insert_result_is_fatal() {
    let projects = FakeProjects {
        return_no_row: true,
        ..Default::default()
    };
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), projects);

    let (draft, photo) = match run_dialogue(form("no", "no")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let error = h
        .submitter
        .submit(TELEGRAM_ID, &user(), draft, &photo)
        .await
        .unwrap_err();
    assert!(matches!(error, FlowError::Persistence(_)));
    assert!(error.is_fatal());
    assert_eq!(h.sessions.get(TELEGRAM_ID).await, None);
}

#[tokio::test]
async fn test_repeated_submission_creates_distinct_projects() {
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), FakeProjects::default());

    let mut slugs = Vec::new();
    for _ in 0..2 {
        let (draft, photo) = match run_dialogue(form("no", "no")) {
            Transition::Submit { draft, photo } => (draft, photo),
            other => panic!("Unexpected transition: {other:?}"),
        };
        let project = h
            .submitter
            .submit(TELEGRAM_ID, &user(), draft, &photo)
            .await
            .unwrap();
        slugs.push((project.project_id, project.slug));
    }

    assert_ne!(slugs[0].0, slugs[1].0);
    assert_ne!(slugs[0].1, slugs[1].1);
    assert_eq!(h.projects.inserted.lock().unwrap().len(), 2);

    let session = h.sessions.get(TELEGRAM_ID).await.unwrap();
    assert_eq!(session.active_project, Some(slugs[1].0));
}

#[tokio::test]
async fn test_dialogue_state_after_each_step() {
    let state = match start() {
        Transition::Prompt { next, .. } => next,
        other => panic!("Unexpected transition: {other:?}"),
    };
    assert_eq!(state, ProjectDialogueState::AwaitName);

    let state = match advance(state, text("Acme")) {
        Transition::Prompt { next, .. } => next,
        other => panic!("Unexpected transition: {other:?}"),
    };
    assert!(matches!(state, ProjectDialogueState::AwaitDescription { .. }));
}

/// Run the full form through `submit`, then close the conversation
async fn submit_and_finish(h: &Harness) -> (Result<PersistedProject, FlowError>, ProjectDialogueState) {
    begin_conversation(h.sessions.as_ref(), TELEGRAM_ID).await;

    let (draft, photo) = match run_dialogue(form("no", "no")) {
        Transition::Submit { draft, photo } => (draft, photo),
        other => panic!("Unexpected transition: {other:?}"),
    };

    let outcome = h.submitter.submit(TELEGRAM_ID, &user(), draft, &photo).await;
    let state = finish_flow(h.sessions.as_ref(), TELEGRAM_ID, outcome.as_ref()).await;
    (outcome, state)
}

async fn in_conversation(h: &Harness) -> bool {
    h.sessions
        .get(TELEGRAM_ID)
        .await
        .map(|session| session.in_conversation)
        .unwrap_or(false)
}

#[tokio::test]
async fn test_finish_after_success_is_done() {
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), FakeProjects::default());

    let (outcome, state) = submit_and_finish(&h).await;
    let project = outcome.expect("submission should succeed");

    assert_eq!(
        state,
        ProjectDialogueState::Done {
            project_id: project.project_id
        }
    );
    assert!(!state.is_active());
    assert!(!in_conversation(&h).await);

    // The active project survives the end of the conversation
    let session = h.sessions.get(TELEGRAM_ID).await.unwrap();
    assert_eq!(session.active_project, Some(project.project_id));
}

#[tokio::test]
async fn test_finish_after_upload_failure_is_aborted() {
    let storage = FakeStorage {
        fail: true,
        ..Default::default()
    };
    let h = harness(Some("photos/file_7.jpg"), storage, FakeProjects::default());

    let (outcome, state) = submit_and_finish(&h).await;

    assert!(matches!(outcome, Err(FlowError::Upload(_))));
    assert_eq!(state, ProjectDialogueState::Aborted);
    assert!(!state.is_active());
    assert!(!in_conversation(&h).await);
}

#[tokio::test]
async fn test_finish_after_persistence_failure_is_aborted() {
    let projects = FakeProjects {
        return_no_row: true,
        ..Default::default()
    };
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), projects);

    let (outcome, state) = submit_and_finish(&h).await;

    assert!(matches!(outcome, Err(FlowError::Persistence(_))));
    assert_eq!(state, ProjectDialogueState::Aborted);
    assert!(!in_conversation(&h).await);
}

#[tokio::test]
async fn test_finish_after_invalid_answer_is_aborted() {
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), FakeProjects::default());
    begin_conversation(h.sessions.as_ref(), TELEGRAM_ID).await;
    assert!(in_conversation(&h).await);

    let error = match run_dialogue(vec![
        text("Acme"),
        text("A widget maker"),
        text("https://facebook.com/acme"),
    ]) {
        Transition::Abort(error) => error,
        other => panic!("Unexpected transition: {other:?}"),
    };
    assert_eq!(error, FlowError::InvalidUrl(SocialPlatform::Twitter));

    let state = finish_flow(h.sessions.as_ref(), TELEGRAM_ID, Err(&error)).await;
    assert_eq!(state, ProjectDialogueState::Aborted);
    assert!(!in_conversation(&h).await);
    assert!(h.projects.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_project_starts_after_finished_flow() {
    let h = harness(Some("photos/file_7.jpg"), FakeStorage::default(), FakeProjects::default());

    let (_, state) = submit_and_finish(&h).await;

    // A finished flow no longer swallows input: the next message reaches the
    // idle handler and /newproject starts over
    assert!(!state.is_active());
    assert_eq!(advance(state, text("/newproject")), Transition::Ignore);
    assert!(matches!(start(), Transition::Prompt { .. }));
}
