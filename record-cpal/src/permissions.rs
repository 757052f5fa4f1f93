//! Desktop microphone permission model.
//!
//! Desktop hosts served by cpal (ALSA/PulseAudio, WASAPI desktop apps,
//! pre-consent CoreAudio) gate microphone access at the system level,
//! not per process: there is no consent dialog to drive from here, and
//! an OS-level denial shows up as a device-open failure when the stream
//! starts. Both checks therefore report granted.

use record_core::PermissionProvider;

#[derive(Debug, Default)]
pub struct DesktopPermissions;

impl DesktopPermissions {
    pub fn new() -> Self {
        Self
    }
}

impl PermissionProvider for DesktopPermissions {
    fn is_granted(&self) -> bool {
        true
    }

    fn request(&self) -> bool {
        true
    }
}
