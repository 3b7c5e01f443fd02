use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiRequest};
use crate::error::ClientResult;
use crate::session::{AuthState, Session};
use crate::types::{AuthResponse, Credentials, UserProfile};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";

/// Session lifecycle: bootstrap from storage, login, register, logout.
#[derive(Clone)]
pub struct AuthController {
    client: ApiClient,
    session: Arc<Session>,
}

impl AuthController {
    pub fn new(client: ApiClient) -> Self {
        let session = client.session().clone();
        Self { client, session }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Settle the initial state from what is stored locally.
    ///
    /// A cached profile is trusted without a network call; an expired access
    /// token is then refreshed by the first request that needs it.
    pub async fn bootstrap(&self) -> AuthState {
        self.session.settle(AuthState::Bootstrapping);

        let tokens = match self.session.store().get() {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Unable to read stored session: {}", e);
                return self.settle_anonymous();
            }
        };

        if tokens.pair().is_none() {
            debug!("No stored token pair");
            return self.settle_anonymous();
        }

        match self.session.store().get_user() {
            Ok(Some(user)) => {
                debug!("Using cached profile for {}", user.email);
                let state = AuthState::Authenticated(user);
                self.session.settle(state.clone());
                return state;
            }
            Ok(None) => {}
            Err(e) => warn!("Unable to read cached profile: {}", e),
        }

        match self.client.get::<UserProfile>(ME_PATH).await {
            Ok(user) => {
                if let Err(e) = self.session.store().set_user(&user) {
                    warn!("Unable to cache profile: {}", e);
                }
                let state = AuthState::Authenticated(user);
                self.session.settle(state.clone());
                state
            }
            Err(e) => {
                info!("Stored session rejected: {}", e);
                self.settle_anonymous()
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        self.authenticate(LOGIN_PATH, Credentials::new(email, password))
            .await
    }

    pub async fn register(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        self.authenticate(REGISTER_PATH, Credentials::new(email, password))
            .await
    }

    /// Forget the session locally; tokens are not revoked server-side
    pub fn logout(&self) -> ClientResult<()> {
        self.session.end()?;
        Ok(())
    }

    /// Fetch the profile from the server and refresh the cached copy
    pub async fn whoami(&self) -> ClientResult<UserProfile> {
        let user: UserProfile = self.client.get(ME_PATH).await?;
        self.session.store().set_user(&user)?;
        self.session.settle(AuthState::Authenticated(user.clone()));
        Ok(user)
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.state().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.state().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session.subscribe()
    }

    async fn authenticate(&self, path: &str, credentials: Credentials) -> ClientResult<UserProfile> {
        let request = ApiRequest::post(path, &credentials)?.anonymous();
        let response: AuthResponse = self.client.send_json(request).await?;
        self.session.establish(&response.tokens, &response.user)?;
        info!("Signed in as {}", response.user.email);
        Ok(response.user)
    }

    fn settle_anonymous(&self) -> AuthState {
        if let Err(e) = self.session.end() {
            warn!("Unable to clear stored session: {}", e);
        }
        AuthState::Anonymous
    }
}
