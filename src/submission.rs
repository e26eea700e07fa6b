//! # Project Submission Module
//!
//! Runs once the form is complete: generate a slug, move the photo into object
//! storage, insert the project and point the user's session at it. Nothing is
//! inserted unless the upload succeeded, and the session is only touched
//! after a successful insert.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::db::{NewProject, PersistedProject, ProjectStore, User};
use crate::dialogue::{DraftProject, PhotoVariant, ProjectDialogueState};
use crate::flow_errors::FlowError;
use crate::image_intake::{intake_image, FileSource};
use crate::session::{end_conversation, set_active_project, SessionStore};
use crate::slug::generate_slug;
use crate::storage::ObjectStorage;

/// Collaborators needed to turn a finished draft into a stored project
#[derive(Clone)]
pub struct ProjectSubmitter {
    files: Arc<dyn FileSource>,
    storage: Arc<dyn ObjectStorage>,
    projects: Arc<dyn ProjectStore>,
    sessions: Arc<dyn SessionStore>,
}

impl ProjectSubmitter {
    pub fn new(
        files: Arc<dyn FileSource>,
        storage: Arc<dyn ObjectStorage>,
        projects: Arc<dyn ProjectStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            files,
            storage,
            projects,
            sessions,
        }
    }

    /// Upload the photo and persist the project for `user`
    ///
    /// `session_key` is the key the user's session is stored under (the Telegram
    /// user id); `user` is the database account the project belongs to.
    pub async fn submit(
        &self,
        session_key: i64,
        user: &User,
        mut draft: DraftProject,
        photo: &PhotoVariant,
    ) -> Result<PersistedProject, FlowError> {
        let slug = generate_slug(&draft.name);
        info!(user_id = user.id, slug = %slug, "Submitting project");

        let avatar_url =
            intake_image(self.files.as_ref(), self.storage.as_ref(), photo, &slug).await?;
        draft.image_url = Some(avatar_url);

        let new_project = NewProject {
            user_id: user.id,
            links: draft.links(),
            title: draft.name,
            description: draft.description,
            slug,
            avatar_url: draft.image_url,
        };

        let project = match self.projects.insert_project(&new_project).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                error!(user_id = user.id, slug = %new_project.slug, "Project insert returned no row");
                return Err(FlowError::Persistence("insert returned no row".to_string()));
            }
            Err(e) => {
                error!(user_id = user.id, slug = %new_project.slug, error = %e, "Project insert failed");
                return Err(FlowError::Persistence(e.to_string()));
            }
        };

        set_active_project(self.sessions.as_ref(), session_key, project.clone()).await;
        info!(
            user_id = user.id,
            project_id = project.project_id,
            "Project submitted"
        );

        Ok(project)
    }
}

/// Close the conversation for `session_key` and return its terminal state
///
/// Runs before anything is sent back to the chat, so a failed Bot API call
/// cannot leave the user stuck in `Persisting`.
pub async fn finish_flow(
    sessions: &dyn SessionStore,
    session_key: i64,
    outcome: Result<&PersistedProject, &FlowError>,
) -> ProjectDialogueState {
    end_conversation(sessions, session_key).await;

    match outcome {
        Ok(project) => ProjectDialogueState::Done {
            project_id: project.project_id,
        },
        Err(e) => {
            debug!(session_key, error = %e, "Conversation aborted");
            ProjectDialogueState::Aborted
        }
    }
}
