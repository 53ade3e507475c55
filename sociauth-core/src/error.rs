/// The error taxonomy shared across the sociauth crates.
///
/// Provider handshake failures and identity-resolution races are absorbed at
/// the boundary; only genuine infrastructure failure ([`AuthError::Persistence`],
/// [`AuthError::Session`]) is allowed to surface to the caller, and then as a
/// generic failure rather than a provider-specific message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The requested provider name is not registered with the gateway.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// Any failure during the provider handshake: consent denial, invalid or
    /// expired code, timeout, network failure, malformed response.
    #[error("provider error: {0}")]
    Provider(String),
    /// The user store is unavailable or rejected an operation. A uniqueness
    /// violation on insert is NOT reported through this variant; the resolver
    /// absorbs it as a retry signal.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// The session store failed. Fatal for the request, not retried.
    #[error("session error: {0}")]
    Session(String),
}
