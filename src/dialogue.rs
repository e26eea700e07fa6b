//! New-project dialogue module: conversation states and the transition function.
//!
//! The form is a linear sequence of five steps. Each awaiting state carries the
//! draft built so far; `advance` is pure so the whole sequence can be exercised
//! without a bot.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::flow_errors::FlowError;
use crate::links::{normalize_link, ProjectLink, SocialPlatform};

/// Number of interactive steps shown in the `[i/N]` counter
pub const TOTAL_STEPS: usize = 5;

/// Steps of the new-project form, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStep {
    Name,
    Description,
    Twitter,
    Github,
    Image,
}

impl FormStep {
    /// 1-based position in the form
    pub fn number(self) -> usize {
        match self {
            FormStep::Name => 1,
            FormStep::Description => 2,
            FormStep::Twitter => 3,
            FormStep::Github => 4,
            FormStep::Image => 5,
        }
    }

    /// Localization key of the prompt for this step
    pub fn prompt_key(self) -> &'static str {
        match self {
            FormStep::Name => "prompt-name",
            FormStep::Description => "prompt-description",
            FormStep::Twitter => "prompt-twitter",
            FormStep::Github => "prompt-github",
            FormStep::Image => "prompt-image",
        }
    }
}

/// Project fields collected so far
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftProject {
    pub name: String,
    pub description: String,
    pub twitter_url: Option<String>,
    pub github_url: Option<String>,
    pub image_url: Option<String>,
}

impl DraftProject {
    /// Links in storage order: Twitter before GitHub, skipped ones omitted
    pub fn links(&self) -> Vec<ProjectLink> {
        [
            (SocialPlatform::Twitter, &self.twitter_url),
            (SocialPlatform::Github, &self.github_url),
        ]
        .into_iter()
        .filter_map(|(platform, url)| {
            url.as_ref().map(|url| ProjectLink {
                title: platform.title().to_string(),
                url: url.clone(),
            })
        })
        .collect()
    }
}

/// One size of a photo as offered by the chat platform
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u32,
}

/// Conversation state for the new-project dialogue
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ProjectDialogueState {
    #[default]
    Idle,
    AwaitName,
    AwaitDescription {
        draft: DraftProject,
    },
    AwaitTwitter {
        draft: DraftProject,
    },
    AwaitGithub {
        draft: DraftProject,
    },
    AwaitImage {
        draft: DraftProject,
    },
    Persisting {
        draft: DraftProject,
    },
    Done {
        project_id: i64,
    },
    Aborted,
}

impl ProjectDialogueState {
    /// Whether the user is in the middle of the form
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ProjectDialogueState::Idle
                | ProjectDialogueState::Done { .. }
                | ProjectDialogueState::Aborted
        )
    }
}

/// Type alias for the new-project dialogue
pub type ProjectDialogue = Dialogue<ProjectDialogueState, InMemStorage<ProjectDialogueState>>;

/// A user message, reduced to what the form cares about
#[derive(Clone, Debug, PartialEq)]
pub enum FlowInput {
    Text(String),
    Photo(Vec<PhotoVariant>),
    Other,
}

/// Result of feeding one input to the dialogue
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Move to `next` and show the prompt for `step`
    Prompt {
        next: ProjectDialogueState,
        step: FormStep,
    },
    /// All fields collected: upload the photo and persist the project
    Submit {
        draft: DraftProject,
        photo: PhotoVariant,
    },
    /// Stop the form without side effects
    Abort(FlowError),
    /// The state does not consume input
    Ignore,
}

/// Begin the form
pub fn start() -> Transition {
    Transition::Prompt {
        next: ProjectDialogueState::AwaitName,
        step: FormStep::Name,
    }
}

/// Accept a text reply; anything non-empty is taken verbatim
pub fn validate_text_reply(input: &FlowInput, step: FormStep) -> Result<String, FlowError> {
    match input {
        FlowInput::Text(text) if !text.is_empty() => Ok(text.clone()),
        _ => Err(FlowError::MissingText(step)),
    }
}

/// Pick the highest-resolution variant (the platform lists sizes ascending)
pub fn select_largest_variant(variants: &[PhotoVariant]) -> Option<&PhotoVariant> {
    variants.last()
}

/// Feed one input to the dialogue
pub fn advance(state: ProjectDialogueState, input: FlowInput) -> Transition {
    let result = match state {
        ProjectDialogueState::AwaitName => {
            validate_text_reply(&input, FormStep::Name).map(|name| Transition::Prompt {
                next: ProjectDialogueState::AwaitDescription {
                    draft: DraftProject {
                        name,
                        ..Default::default()
                    },
                },
                step: FormStep::Description,
            })
        }
        ProjectDialogueState::AwaitDescription { mut draft } => {
            validate_text_reply(&input, FormStep::Description).map(|description| {
                draft.description = description;
                Transition::Prompt {
                    next: ProjectDialogueState::AwaitTwitter { draft },
                    step: FormStep::Twitter,
                }
            })
        }
        ProjectDialogueState::AwaitTwitter { mut draft } => {
            validate_text_reply(&input, FormStep::Twitter)
                .and_then(|raw| normalize_link(SocialPlatform::Twitter, &raw))
                .map(|link| {
                    draft.twitter_url = link.map(|link| link.url);
                    Transition::Prompt {
                        next: ProjectDialogueState::AwaitGithub { draft },
                        step: FormStep::Github,
                    }
                })
        }
        ProjectDialogueState::AwaitGithub { mut draft } => {
            validate_text_reply(&input, FormStep::Github)
                .and_then(|raw| normalize_link(SocialPlatform::Github, &raw))
                .map(|link| {
                    draft.github_url = link.map(|link| link.url);
                    Transition::Prompt {
                        next: ProjectDialogueState::AwaitImage { draft },
                        step: FormStep::Image,
                    }
                })
        }
        ProjectDialogueState::AwaitImage { draft } => match input {
            FlowInput::Photo(variants) => select_largest_variant(&variants)
                .cloned()
                .map(|photo| Transition::Submit { draft, photo })
                .ok_or(FlowError::MissingPhoto),
            _ => Err(FlowError::MissingPhoto),
        },
        ProjectDialogueState::Idle
        | ProjectDialogueState::Persisting { .. }
        | ProjectDialogueState::Done { .. }
        | ProjectDialogueState::Aborted => Ok(Transition::Ignore),
    };

    result.unwrap_or_else(Transition::Abort)
}
