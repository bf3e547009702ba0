//! Two-stage account creation.
//!
//! Stage 1 registers the identity at the identity provider. Stage 2 stores the
//! security question of the account then confirms the identity. The flow only
//! moves forward, and only once the network side of the current stage
//! succeeded.

pub mod form;

use crate::{
    services::{
        identity::{IdentityError, IdentityProvider, SignUpRequest},
        profile::{BackendError, ConfirmIdentityRequest, ProfileBackend, SecurityProfileRequest},
    },
    session::Session,
    Route,
};

use form::{CredentialsForm, SecurityForm};

#[derive(Debug, Clone)]
pub enum Error {
    Identity(IdentityError),
    Backend(BackendError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Identity(e) => write!(f, "{}", e),
            Self::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<IdentityError> for Error {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<BackendError> for Error {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum Message {
    View(ViewMessage),
    Registered(Result<(), Error>),
    ProfileCompleted(Result<(), Error>),
}

#[derive(Debug, Clone)]
pub enum ViewMessage {
    EmailEdited(String),
    PasswordEdited(String),
    ConfirmPasswordEdited(String),
    UserRoleSelected(String),
    SecurityQuestionSelected(String),
    SecurityAnswerEdited(String),
    Submit,
}

/// Side effect requested by the flow after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    Redirect(Route),
    Register(SignUpRequest),
    CompleteProfile(SecurityProfileRequest, ConfirmIdentityRequest),
}

impl Command {
    /// Runs the network side of the command, returning the message to feed back
    /// to the flow.
    pub async fn perform(
        self,
        identity: &dyn IdentityProvider,
        backend: &dyn ProfileBackend,
    ) -> Option<Message> {
        match self {
            Self::Register(request) => Some(Message::Registered(
                identity.sign_up(&request).await.map_err(Error::from),
            )),
            Self::CompleteProfile(profile, confirm) => Some(Message::ProfileCompleted(
                complete_profile(backend, &profile, &confirm).await,
            )),
            Self::None | Self::Redirect(_) => None,
        }
    }
}

/// Saves the security profile then confirms the identity. The confirmation is
/// never attempted if the profile was not saved.
pub async fn complete_profile(
    backend: &dyn ProfileBackend,
    profile: &SecurityProfileRequest,
    confirm: &ConfirmIdentityRequest,
) -> Result<(), Error> {
    backend.save_security_profile(profile).await?;
    backend.confirm_identity(confirm).await?;
    Ok(())
}

#[derive(Debug)]
pub enum Stage {
    CollectCredentials(CredentialsForm),
    /// The identity of `email` exists but is not confirmed yet.
    CollectSecurityQuestion {
        email: String,
        form: SecurityForm,
    },
    Complete,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CollectCredentials(_) => "CollectCredentials",
            Self::CollectSecurityQuestion { .. } => "CollectSecurityQuestion",
            Self::Complete => "Complete",
        }
    }

    /// Step shown to the user, `None` once the flow is over.
    pub fn number(&self) -> Option<u8> {
        match self {
            Self::CollectCredentials(_) => Some(1),
            Self::CollectSecurityQuestion { .. } => Some(2),
            Self::Complete => None,
        }
    }
}

/// Network call the flow is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    /// Identity registration of the submitted email.
    Registration { email: String },
    ProfileCompletion,
}

#[derive(Debug)]
pub struct SignUpFlow {
    user_pool_id: String,
    stage: Stage,
    pending: Option<Pending>,
    notification: Option<Notification>,
}

impl SignUpFlow {
    /// Starts a flow at stage 1, or redirects to the landing page if the session
    /// already belongs to a signed-in user.
    pub fn new(session: &Session, user_pool_id: String) -> (Self, Command) {
        let flow = Self {
            user_pool_id,
            stage: Stage::CollectCredentials(CredentialsForm::default()),
            pending: None,
            notification: None,
        };
        if session.user_role().is_some() {
            tracing::debug!("Session already has a role, skipping sign up");
            (flow, Command::Redirect(Route::Landing))
        } else {
            (flow, Command::None)
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::View(ViewMessage::Submit) => self.on_submit(),
            Message::View(edit) => {
                self.on_edit(edit);
                Command::None
            }
            Message::Registered(res) => self.on_registered(res),
            Message::ProfileCompleted(res) => self.on_profile_completed(res),
        }
    }

    /// Submits the current stage and drives it until it needs user input again.
    pub async fn submit(
        &mut self,
        identity: &dyn IdentityProvider,
        backend: &dyn ProfileBackend,
    ) -> Command {
        let mut command = self.update(Message::View(ViewMessage::Submit));
        while let Command::Register(_) | Command::CompleteProfile(..) = command {
            command = match command.perform(identity, backend).await {
                Some(message) => self.update(message),
                None => Command::None,
            };
        }
        command
    }

    fn on_submit(&mut self) -> Command {
        if self.pending.is_some() {
            tracing::warn!("A submission is already in flight, ignoring");
            return Command::None;
        }
        match &mut self.stage {
            Stage::CollectCredentials(form) => match form.validate() {
                Ok(credentials) => {
                    self.pending = Some(Pending::Registration {
                        email: credentials.email.clone(),
                    });
                    self.notification = None;
                    Command::Register(SignUpRequest::from(&credentials))
                }
                Err(errors) => {
                    tracing::debug!("Credentials rejected: {}", errors);
                    form.apply(&errors);
                    Command::None
                }
            },
            Stage::CollectSecurityQuestion { email, form } => match form.validate() {
                Ok(answer) => {
                    self.pending = Some(Pending::ProfileCompletion);
                    self.notification = None;
                    Command::CompleteProfile(
                        SecurityProfileRequest {
                            email: email.clone(),
                            question: answer.question,
                            answer: answer.answer,
                        },
                        ConfirmIdentityRequest {
                            user_pool_id: self.user_pool_id.clone(),
                            username: email.clone(),
                        },
                    )
                }
                Err(errors) => {
                    tracing::debug!("Security answer rejected: {}", errors);
                    form.apply(&errors);
                    Command::None
                }
            },
            Stage::Complete => Command::None,
        }
    }

    fn on_edit(&mut self, edit: ViewMessage) {
        match (&mut self.stage, edit) {
            (Stage::CollectCredentials(form), ViewMessage::EmailEdited(v)) => form.email.set(v),
            (Stage::CollectCredentials(form), ViewMessage::PasswordEdited(v)) => {
                form.password.set(v)
            }
            (Stage::CollectCredentials(form), ViewMessage::ConfirmPasswordEdited(v)) => {
                form.confirm_password.set(v)
            }
            (Stage::CollectCredentials(form), ViewMessage::UserRoleSelected(v)) => {
                form.user_role.set(v)
            }
            (Stage::CollectSecurityQuestion { form, .. }, ViewMessage::SecurityQuestionSelected(v)) => {
                form.question.set(v)
            }
            (Stage::CollectSecurityQuestion { form, .. }, ViewMessage::SecurityAnswerEdited(v)) => {
                form.answer.set(v)
            }
            (stage, msg) => {
                tracing::warn!("Current stage {} has ignored message: {:?}", stage.name(), msg)
            }
        }
    }

    fn on_registered(&mut self, res: Result<(), Error>) -> Command {
        let email = match (self.pending.take(), &self.stage) {
            (Some(Pending::Registration { email }), Stage::CollectCredentials(_)) => email,
            (pending, stage) => {
                tracing::warn!(
                    "Current stage {} has ignored unrequested registration result",
                    stage.name()
                );
                self.pending = pending;
                return Command::None;
            }
        };
        match res {
            Ok(()) => {
                tracing::info!("Identity registered, asking security question");
                self.stage = Stage::CollectSecurityQuestion {
                    email,
                    form: SecurityForm::default(),
                };
            }
            Err(e) => {
                tracing::error!("Error signing up: {}", e);
                self.notification = Some(Notification::Error(e.to_string()));
            }
        }
        Command::None
    }

    fn on_profile_completed(&mut self, res: Result<(), Error>) -> Command {
        match (self.pending.take(), &self.stage) {
            (Some(Pending::ProfileCompletion), Stage::CollectSecurityQuestion { .. }) => {}
            (pending, stage) => {
                tracing::warn!(
                    "Current stage {} has ignored unrequested profile completion result",
                    stage.name()
                );
                self.pending = pending;
                return Command::None;
            }
        }
        match res {
            Ok(()) => {
                tracing::info!("Sign up complete");
                self.stage = Stage::Complete;
                self.notification = Some(Notification::Success("Sign up successful!".to_string()));
                Command::Redirect(Route::SignIn)
            }
            Err(e) => {
                tracing::error!("Error completing sign up: {}", e);
                self.notification = Some(Notification::Error(e.to_string()));
                Command::None
            }
        }
    }
}
