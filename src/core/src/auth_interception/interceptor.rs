use log::{info, warn};

use super::policy::{AuthMechanism, AuthResult, CredentialPolicy};
use crate::data_capture::CaptureEvent;
use crate::network::types::ConnectionContext;
use crate::telemetry::TelemetrySender;

const PASSWORD_ONLY: &[AuthMechanism] = &[AuthMechanism::Password];

/// Per-connection policy: record the attempt, report it, refuse it.
pub struct AuthInterceptor {
    context: ConnectionContext,
    /// Present only when remote logging is enabled and a controller is configured.
    telemetry: Option<TelemetrySender>,
}

impl AuthInterceptor {
    pub fn new(context: ConnectionContext, telemetry: Option<TelemetrySender>) -> Self {
        Self { context, telemetry }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    fn report(&self, username: &str, password: &str) {
        let telemetry = match &self.telemetry {
            Some(telemetry) => telemetry,
            None => return,
        };

        // A dual-stack listener sees IPv4 peers as ::ffff:a.b.c.d
        let source_ip = self.context.remote_addr.ip().to_canonical();
        let event = CaptureEvent::ssh_login(source_ip, username, password);
        if let Err(e) = telemetry.dispatch(event) {
            warn!(
                "[{}] Capture from {} not sent to controller: {}",
                self.context.id, self.context.remote_addr, e
            );
        }
    }
}

impl CredentialPolicy for AuthInterceptor {
    fn on_password_auth(&mut self, username: &str, password: &str) -> AuthResult {
        let attempt = self.context.record_attempt();

        // Debug formatting escapes control characters, so a crafted password cannot inject
        // fake lines into the local log
        info!(
            "Login attempt #{}: {:?}:{:?} from {}",
            attempt, username, password, self.context.remote_addr
        );

        self.report(username, password);

        AuthResult::Reject
    }

    fn allowed_mechanisms(&self, _username: &str) -> &'static [AuthMechanism] {
        PASSWORD_ONLY
    }
}
