use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::engagement::Acknowledgement;
use crate::domain::errors::{ApiError, SessionError, SubmitError};
use crate::domain::forms::SubEventRsvpForm;
use crate::domain::guest::{
    Guest, IdentifyOutcome, IdentifyQuery, PersonalizedProgram, RestoreOutcome, SavedIdentity,
    normalize_code,
};
use crate::domain::keys;
use crate::domain::ports::{GuestDirectory, KeyValueStore};

#[derive(Default)]
struct SessionState {
    guest: Option<Guest>,
    program: Option<PersonalizedProgram>,
}

impl SessionState {
    fn personal_code(&self) -> Option<String> {
        self.guest.as_ref().and_then(|g| g.personal_code.clone())
    }
}

// Identified-or-anonymous guest session, persisted through the key/value store.
pub struct GuestSession<D, S> {
    directory: D,
    store: S,
    event_id: String,
    state: Mutex<SessionState>,
    // Held for the duration of one identification; contenders get Busy.
    identify_gate: Mutex<()>,
    submit_gate: Mutex<()>,
}

impl<D, S> GuestSession<D, S>
where
    D: GuestDirectory,
    S: KeyValueStore,
{
    pub fn new(directory: D, store: S, event_id: impl Into<String>) -> Self {
        Self {
            directory,
            store,
            event_id: event_id.into(),
            state: Mutex::new(SessionState::default()),
            identify_gate: Mutex::new(()),
            submit_gate: Mutex::new(()),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    // Local read only; no network.
    pub async fn saved_code(&self) -> Result<Option<String>, SessionError> {
        let code = self
            .store
            .get(keys::PERSONAL_CODE)
            .await
            .map_err(SessionError::Storage)?;
        Ok(code.map(|c| normalize_code(&c)).filter(|c| !c.is_empty()))
    }

    pub async fn saved_identity(&self) -> Result<Option<SavedIdentity>, SessionError> {
        let Some(personal_code) = self.saved_code().await? else {
            return Ok(None);
        };
        let guest_name = self
            .store
            .get(keys::GUEST_NAME)
            .await
            .map_err(SessionError::Storage)?
            .unwrap_or_default();
        Ok(Some(SavedIdentity {
            personal_code,
            guest_name,
        }))
    }

    // Validates the saved code against the backend.
    #[tracing::instrument(name = "restore_session", skip(self), fields(event_id = %self.event_id))]
    pub async fn restore(&self) -> Result<RestoreOutcome, SessionError> {
        let _gate = self.identify_gate.lock().await;

        let Some(code) = self.saved_code().await? else {
            return Ok(RestoreOutcome::NoSavedCode);
        };

        match self.directory.guest_by_code(&self.event_id, &code).await {
            Ok(guest) => {
                let guest = with_code(guest, &code);
                self.establish(guest.clone(), &code).await;
                info!(guest_id = %guest.id, "session restored");
                Ok(RestoreOutcome::Restored(guest))
            }
            Err(ApiError::NotFound) => {
                warn!("saved personal code rejected; clearing session");
                let mut state = self.state.lock().await;
                self.store
                    .remove_many(&keys::SESSION)
                    .await
                    .map_err(SessionError::Storage)?;
                *state = SessionState::default();
                Ok(RestoreOutcome::Rejected)
            }
            Err(err) => {
                warn!(error = %err, "could not validate saved personal code");
                Ok(RestoreOutcome::Unavailable)
            }
        }
    }

    #[tracing::instrument(name = "identify_guest", skip_all, fields(event_id = %self.event_id))]
    pub async fn identify(&self, query: IdentifyQuery) -> Result<IdentifyOutcome, SessionError> {
        let query = query.normalized().ok_or(SessionError::EmptyQuery)?;
        let _gate = self
            .identify_gate
            .try_lock()
            .map_err(|_| SessionError::Busy)?;

        let code = match query {
            IdentifyQuery::Code(code) => code,
            IdentifyQuery::Details { name, email, phone } => {
                let found = self
                    .directory
                    .identify(
                        &self.event_id,
                        name.as_deref(),
                        email.as_deref(),
                        phone.as_deref(),
                    )
                    .await
                    .map_err(SessionError::Api)?;

                if found.multiple_matches {
                    return Ok(IdentifyOutcome::Ambiguous {
                        message: found.message,
                    });
                }
                if !found.found {
                    return Ok(IdentifyOutcome::NotFound {
                        message: found.message,
                    });
                }
                match found.personal_code {
                    Some(code) => normalize_code(&code),
                    None => {
                        return Err(SessionError::Api(ApiError::Decode(
                            "identify match carried no personal code".to_string(),
                        )));
                    }
                }
            }
        };

        let guest = match self.directory.guest_by_code(&self.event_id, &code).await {
            Ok(guest) => with_code(guest, &code),
            Err(ApiError::NotFound) => {
                return Ok(IdentifyOutcome::NotFound {
                    message: "No guest found for this personal code".to_string(),
                });
            }
            Err(err) => return Err(SessionError::Api(err)),
        };

        self.persist(&code, &guest).await?;
        self.establish(guest.clone(), &code).await;
        info!(guest_id = %guest.id, "guest identified");
        Ok(IdentifyOutcome::Identified(guest))
    }

    // Storage and memory are cleared together, or neither is.
    #[tracing::instrument(name = "logout_guest", skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.store
            .remove_many(&keys::SESSION)
            .await
            .map_err(SessionError::Storage)?;
        *state = SessionState::default();
        info!("guest logged out");
        Ok(())
    }

    // Ok(None) when nobody is identified.
    pub async fn refresh_program(&self) -> Result<Option<PersonalizedProgram>, SessionError> {
        let Some(code) = self.personal_code().await else {
            return Ok(None);
        };
        let program = self
            .directory
            .personalized_program(&self.event_id, &code)
            .await
            .map_err(SessionError::Api)?;

        let mut state = self.state.lock().await;
        // Ignore the result if the session changed while the request ran.
        if state.personal_code().as_deref() == Some(code.as_str()) {
            state.program = Some(program.clone());
        }
        Ok(Some(program))
    }

    #[tracing::instrument(name = "submit_sub_event_rsvp", skip_all)]
    pub async fn submit_sub_event_rsvp(
        &self,
        form: SubEventRsvpForm,
    ) -> Result<Acknowledgement, SubmitError> {
        let code = self
            .personal_code()
            .await
            .ok_or(SubmitError::NotIdentified)?;
        let payload = form.into_payload()?;
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        let ack = self
            .directory
            .submit_sub_event_rsvp(&self.event_id, &code, &payload)
            .await?;

        if let Err(err) = self.refresh_program().await {
            warn!(error = %err, "program refresh after rsvp failed");
        }
        Ok(ack)
    }

    pub async fn is_identified(&self) -> bool {
        self.state.lock().await.guest.is_some()
    }

    pub async fn guest(&self) -> Option<Guest> {
        self.state.lock().await.guest.clone()
    }

    pub async fn program(&self) -> Option<PersonalizedProgram> {
        self.state.lock().await.program.clone()
    }

    pub async fn personal_code(&self) -> Option<String> {
        self.state.lock().await.personal_code()
    }

    async fn persist(&self, code: &str, guest: &Guest) -> Result<(), SessionError> {
        let result = async {
            self.store
                .set(keys::PERSONAL_CODE, code.to_string())
                .await?;
            self.store.set(keys::GUEST_NAME, guest.name.clone()).await?;
            if let Some(first_name) = &guest.first_name {
                self.store
                    .set(keys::GUEST_FIRST_NAME, first_name.clone())
                    .await?;
            }
            Ok::<(), String>(())
        }
        .await;

        if let Err(err) = result {
            // Do not leave half a session behind.
            if let Err(cleanup) = self.store.remove_many(&keys::SESSION).await {
                warn!(error = %cleanup, "could not roll back partial session");
            }
            return Err(SessionError::Storage(err));
        }
        Ok(())
    }

    // Program load is best-effort; the session exists without it.
    async fn establish(&self, guest: Guest, code: &str) {
        let program = match self
            .directory
            .personalized_program(&self.event_id, code)
            .await
        {
            Ok(program) => Some(program),
            Err(err) => {
                warn!(error = %err, "personalized program unavailable");
                None
            }
        };

        let mut state = self.state.lock().await;
        state.guest = Some(guest);
        state.program = program;
    }
}

fn with_code(mut guest: Guest, code: &str) -> Guest {
    guest.personal_code = Some(code.to_string());
    guest
}
