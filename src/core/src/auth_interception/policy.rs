use russh::{MethodKind, MethodSet};

/// Authentication mechanisms a policy may advertise to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMechanism {
    Password,
}

impl From<AuthMechanism> for MethodKind {
    fn from(mechanism: AuthMechanism) -> Self {
        match mechanism {
            AuthMechanism::Password => MethodKind::Password,
        }
    }
}

/// Transport method set matching a list of mechanisms.
pub fn method_set(mechanisms: &[AuthMechanism]) -> MethodSet {
    let kinds: Vec<MethodKind> = mechanisms.iter().copied().map(MethodKind::from).collect();
    MethodSet::from(kinds.as_slice())
}

/// Decision returned for an authentication attempt.
///
/// Has no accepting variant, so nothing a policy returns can open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Reject,
}

/// Hook the transport adapter calls for every credential-based login attempt.
pub trait CredentialPolicy: Send {
    fn on_password_auth(&mut self, username: &str, password: &str) -> AuthResult;

    fn allowed_mechanisms(&self, username: &str) -> &'static [AuthMechanism];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_maps_to_the_transport_method() {
        let set = method_set(&[AuthMechanism::Password]);
        let expected = MethodSet::from([MethodKind::Password].as_slice());
        assert_eq!(format!("{:?}", set), format!("{:?}", expected));
    }
}
