/// Access to the platform's microphone permission.
///
/// `start_recording` only checks `is_granted`; callers decide when to
/// `request`, retrying the start afterwards.
pub trait PermissionProvider: Send + Sync {
    /// Whether capture permission is currently granted.
    fn is_granted(&self) -> bool;

    /// Ask the platform for permission. May block while the user
    /// interacts with a consent prompt. Returns the resulting grant.
    fn request(&self) -> bool;
}
