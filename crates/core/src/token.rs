/// Opaque issuer and validator of user tokens.
///
/// The token format is owned by the implementation; callers only store the
/// issued string and ask whether a presented one is well formed.
pub trait TokenAuthority: Send + Sync {
    /// Issues a new token for `subject`. Every call returns a distinct token.
    fn issue(&self, subject: &str) -> String;

    /// Returns whether `token` could have been issued by this authority.
    fn validate(&self, token: &str) -> bool;
}
