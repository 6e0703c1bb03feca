/// Classification of a failed fetch cycle.
///
/// Stores never give up on a domain, so every class except `Cancelled`
/// drives backoff. The class decides how loudly the failure is logged and
/// which counter it lands in.
///
/// | Class | Recorded in snapshot? | Backoff? | Log level |
/// |-------|----------------------|----------|-----------|
/// | `Cancelled` | No | No | debug |
/// | `Transient` | Yes | Yes | warn |
/// | `Terminal` | Yes | Yes | error |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Superseded by a newer cycle. Not an error.
    Cancelled,

    /// Network trouble, timeouts, 5xx and throttling responses.
    /// Expected to clear on its own.
    Transient,

    /// The server rejected the request or sent a payload we cannot use.
    /// Retrying on the normal backoff schedule is still the only option,
    /// but it usually needs a server-side fix.
    Terminal,
}
