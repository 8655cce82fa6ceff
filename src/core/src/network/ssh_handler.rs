//! Glue between the `russh` server callbacks and a [`CredentialPolicy`].

use log::debug;
use russh::keys::PublicKey;
use russh::server::{Auth, Config, Handler, Msg, Session};
use russh::{Channel, ChannelId, SshId};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::auth_interception::{method_set, AuthMechanism, AuthResult, CredentialPolicy};
use crate::configuration::types::SshServiceConfig;
use crate::error_handling::types::ConnectionError;
use crate::host_identity::HostIdentity;

/// Extra idle time the transport tolerates beyond the channel wait before dropping a peer on
/// its own. This is what finally closes a session the connection handler stopped waiting on.
const INACTIVITY_MARGIN: Duration = Duration::from_secs(10);

/// Builds the transport configuration shared by every connection.
///
/// Only password authentication is advertised and the host key is the persisted identity.
pub fn server_config(identity: &HostIdentity, ssh: &SshServiceConfig) -> Config {
    let channel_timeout = Duration::from_secs(ssh.channel_timeout_secs);
    let mut config = Config {
        methods: method_set(&[AuthMechanism::Password]),
        keys: vec![identity.key().clone()],
        max_auth_attempts: ssh.max_auth_attempts,
        inactivity_timeout: Some(channel_timeout + INACTIVITY_MARGIN),
        ..Default::default()
    };
    if let Some(server_id) = &ssh.server_id {
        config.server_id = SshId::Standard(server_id.clone());
    }
    config
}

/// `russh` handler for one connection.
///
/// Password attempts go to the policy; every other method is refused with a hint to use
/// passwords. A session channel request is reported once through `channel_request` and
/// refused, as is every other channel kind (the transport default).
pub struct HoneypotHandler<P> {
    policy: P,
    channel_request: Option<oneshot::Sender<ChannelId>>,
}

impl<P: CredentialPolicy> HoneypotHandler<P> {
    pub fn new(policy: P, channel_request: oneshot::Sender<ChannelId>) -> Self {
        Self {
            policy,
            channel_request: Some(channel_request),
        }
    }

    fn reject(&self, user: &str) -> Auth {
        Auth::Reject {
            proceed_with_methods: Some(method_set(self.policy.allowed_mechanisms(user))),
            partial_success: false,
        }
    }
}

impl<P: CredentialPolicy + 'static> Handler for HoneypotHandler<P> {
    type Error = ConnectionError;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        debug!("auth_none for {:?} refused", user);
        Ok(self.reject(user))
    }

    async fn auth_publickey_offered(
        &mut self,
        user: &str,
        _public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        debug!("Public key offered for {:?} refused", user);
        Ok(self.reject(user))
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        _public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        Ok(self.reject(user))
    }

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        match self.policy.on_password_auth(user, password) {
            AuthResult::Reject => Ok(self.reject(user)),
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        debug!("Session channel {:?} requested, refusing", channel.id());
        if let Some(tx) = self.channel_request.take() {
            let _ = tx.send(channel.id());
        }
        Ok(false)
    }
}
