#![forbid(unsafe_code)]

//! Offline worker update lifecycle.
//!
//! [`UpdateController`] is a pure state machine: the host forwards platform
//! notifications (registration result, `updatefound`, worker `statechange`,
//! `controllerchange`, timer ticks, banner button clicks) and receives a list
//! of [`UpdateCommand`]s to execute. [`WorkerHost`] is the seam the host
//! implements so the commands can be applied in one call.
//!
//! ```text
//! NoRegistration ──registered──▶ Registered ──update_found──▶ UpdateInstalling
//!                                    ▲                              │
//!                      first install │            installed with    │
//!                                    └──────────  controller ───────┤
//!                                                                   ▼
//!                        UpdateDismissed ◀──dismiss── UpdateWaiting ──accept──▶ UpdateAccepted
//!                               └────────periodic_check─────▲
//! ```
//!
//! # Invariants
//!
//! 1. At most one banner is visible; a repeated `waiting` while it is shown
//!    produces no command.
//! 2. Accepting posts `SKIP_WAITING` and never reloads directly.
//! 3. `controllerchange` reloads exactly once, whatever the banner state.
//! 4. A dismissed update is re-offered by the next periodic check while the
//!    worker is still waiting.
//! 5. Registration failure is terminal for the session and emits nothing.
//! 6. While the banner is visible, "Update" always reaches the worker that is
//!    waiting at click time, even if a newer one replaced it.
//! 7. A failed `SKIP_WAITING` post returns to dismissed, so the update is
//!    offered again instead of being lost for the session.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::UpdateConfig;
use crate::error::PlatformError;
use crate::worker::WorkerMessage;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    NoRegistration,
    Registered,
    UpdateInstalling,
    UpdateWaiting,
    UpdateAccepted,
    UpdateDismissed,
}

/// Side effect requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCommand {
    /// Start the repeating freshness-check timer.
    ArmPeriodicCheck { interval_secs: u32 },
    /// Ask the platform to re-fetch the worker script.
    CheckForUpdate,
    /// Render the update banner ("Update" / "Later").
    ShowBanner,
    /// Remove the update banner.
    RemoveBanner,
    /// Post a message to the waiting worker.
    PostMessage(WorkerMessage),
    /// Reload the page.
    Reload,
}

/// Platform surface the update commands act on.
pub trait WorkerHost {
    fn arm_periodic_check(&mut self, interval_secs: u32);
    fn check_for_update(&mut self);
    fn show_banner(&mut self);
    fn remove_banner(&mut self);
    fn post_message(&mut self, message: WorkerMessage) -> Result<(), PlatformError>;
    fn reload(&mut self);
}

impl UpdateCommand {
    /// Execute this command against `host`. Only posting can fail.
    pub fn apply<H: WorkerHost + ?Sized>(self, host: &mut H) -> Result<(), PlatformError> {
        match self {
            Self::ArmPeriodicCheck { interval_secs } => host.arm_periodic_check(interval_secs),
            Self::CheckForUpdate => host.check_for_update(),
            Self::ShowBanner => host.show_banner(),
            Self::RemoveBanner => host.remove_banner(),
            Self::PostMessage(message) => host.post_message(message)?,
            Self::Reload => host.reload(),
        }
        Ok(())
    }
}

/// Update lifecycle state machine.
#[derive(Debug, Clone)]
pub struct UpdateController {
    state: UpdateState,
    check_interval_secs: u32,
    banner_visible: bool,
    waiting_worker: bool,
    reloading: bool,
}

impl UpdateController {
    #[must_use]
    pub fn new(config: &UpdateConfig) -> Self {
        Self {
            state: UpdateState::NoRegistration,
            check_interval_secs: config.check_interval_secs,
            banner_visible: false,
            waiting_worker: false,
            reloading: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> UpdateState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    /// Whether a reload has already been requested.
    #[inline]
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// Registration succeeded.
    ///
    /// `has_controller` is whether a worker already controls this page;
    /// `waiting`/`installing` mirror the registration's worker slots at the
    /// time it resolved.
    pub fn registered(
        &mut self,
        has_controller: bool,
        waiting: bool,
        installing: bool,
    ) -> Vec<UpdateCommand> {
        if self.state != UpdateState::NoRegistration {
            debug!(state = ?self.state, "duplicate registration ignored");
            return Vec::new();
        }
        info!(
            interval_secs = self.check_interval_secs,
            "offline worker registered"
        );
        self.state = UpdateState::Registered;
        let mut commands = vec![UpdateCommand::ArmPeriodicCheck {
            interval_secs: self.check_interval_secs,
        }];
        if waiting && has_controller {
            commands.extend(self.worker_waiting());
        } else if installing {
            commands.extend(self.update_found());
        }
        commands
    }

    /// Registration was rejected. The session runs without offline support.
    pub fn registration_failed(&mut self, reason: &str) -> Vec<UpdateCommand> {
        warn!(reason, "offline worker registration failed");
        Vec::new()
    }

    /// The periodic timer fired.
    pub fn periodic_check(&mut self) -> Vec<UpdateCommand> {
        if self.state == UpdateState::NoRegistration || self.reloading {
            return Vec::new();
        }
        let mut commands = vec![UpdateCommand::CheckForUpdate];
        if self.state == UpdateState::UpdateDismissed && self.waiting_worker {
            debug!("re-offering dismissed update");
            commands.extend(self.worker_waiting());
        }
        commands
    }

    /// The platform reported a new worker version installing.
    pub fn update_found(&mut self) -> Vec<UpdateCommand> {
        match self.state {
            UpdateState::NoRegistration | UpdateState::UpdateAccepted => Vec::new(),
            // The banner keeps offering whichever worker ends up waiting.
            _ if self.banner_visible => {
                debug!("newer worker installing behind visible banner");
                Vec::new()
            }
            _ => {
                info!("update found; new worker installing");
                self.state = UpdateState::UpdateInstalling;
                Vec::new()
            }
        }
    }

    /// The installing worker reached `installed`.
    ///
    /// Without a controlling worker this was the first install: the page is
    /// now offline capable and nothing needs to be offered.
    pub fn worker_installed(&mut self, has_controller: bool) -> Vec<UpdateCommand> {
        if self.state == UpdateState::NoRegistration {
            return Vec::new();
        }
        if has_controller {
            self.worker_waiting()
        } else {
            info!("offline cache ready");
            if self.state == UpdateState::UpdateInstalling {
                self.state = UpdateState::Registered;
            }
            Vec::new()
        }
    }

    /// A new worker is waiting to take over a page that already has one.
    pub fn worker_waiting(&mut self) -> Vec<UpdateCommand> {
        if self.state == UpdateState::NoRegistration {
            return Vec::new();
        }
        self.waiting_worker = true;
        if self.state == UpdateState::UpdateAccepted {
            return Vec::new();
        }
        if self.banner_visible {
            self.state = UpdateState::UpdateWaiting;
            return Vec::new();
        }
        info!("update waiting; showing banner");
        self.state = UpdateState::UpdateWaiting;
        self.banner_visible = true;
        vec![UpdateCommand::ShowBanner]
    }

    /// The user chose "Update".
    pub fn accept(&mut self) -> Vec<UpdateCommand> {
        if self.state != UpdateState::UpdateWaiting || !self.banner_visible {
            debug!(state = ?self.state, "accept without banner ignored");
            return Vec::new();
        }
        info!("update accepted; activating waiting worker");
        self.state = UpdateState::UpdateAccepted;
        self.banner_visible = false;
        vec![
            UpdateCommand::RemoveBanner,
            UpdateCommand::PostMessage(WorkerMessage::SkipWaiting),
        ]
    }

    /// Posting `SKIP_WAITING` failed, so no `controllerchange` will follow.
    ///
    /// The update falls back to dismissed and the next periodic check offers
    /// it again.
    pub fn post_failed(&mut self) -> Vec<UpdateCommand> {
        if self.state != UpdateState::UpdateAccepted || self.reloading {
            return Vec::new();
        }
        info!("waiting worker unreachable; update will be offered again");
        self.state = UpdateState::UpdateDismissed;
        self.waiting_worker = true;
        Vec::new()
    }

    /// Execute `commands` against `host` in order, feeding platform failures
    /// back into the state machine.
    pub fn run<H: WorkerHost + ?Sized>(&mut self, commands: Vec<UpdateCommand>, host: &mut H) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            if let Err(err) = command.apply(host) {
                warn!(%err, ?command, "update command failed");
                if let UpdateCommand::PostMessage(_) = command {
                    queue.extend(self.post_failed());
                }
            }
        }
    }

    /// The user chose "Later".
    pub fn dismiss(&mut self) -> Vec<UpdateCommand> {
        if !self.banner_visible {
            return Vec::new();
        }
        info!("update dismissed");
        self.state = UpdateState::UpdateDismissed;
        self.banner_visible = false;
        vec![UpdateCommand::RemoveBanner]
    }

    /// A different worker took control of the page.
    pub fn controller_change(&mut self) -> Vec<UpdateCommand> {
        if self.reloading {
            return Vec::new();
        }
        info!(state = ?self.state, "controller changed; reloading");
        self.reloading = true;
        self.waiting_worker = false;
        vec![UpdateCommand::Reload]
    }
}

impl Default for UpdateController {
    fn default() -> Self {
        Self::new(&UpdateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registered() -> UpdateController {
        let mut c = UpdateController::default();
        c.registered(true, false, false);
        c
    }

    fn waiting() -> UpdateController {
        let mut c = registered();
        c.update_found();
        c.worker_installed(true);
        c
    }

    #[test]
    fn registration_arms_timer() {
        let mut c = UpdateController::default();
        assert_eq!(
            c.registered(false, false, false),
            vec![UpdateCommand::ArmPeriodicCheck { interval_secs: 60 }]
        );
        assert_eq!(c.state(), UpdateState::Registered);
        assert_eq!(c.periodic_check(), vec![UpdateCommand::CheckForUpdate]);
    }

    #[test]
    fn registration_with_waiting_worker_prompts_immediately() {
        let mut c = UpdateController::default();
        assert_eq!(
            c.registered(true, true, false),
            vec![
                UpdateCommand::ArmPeriodicCheck { interval_secs: 60 },
                UpdateCommand::ShowBanner,
            ]
        );
        assert_eq!(c.state(), UpdateState::UpdateWaiting);
    }

    #[test]
    fn failed_registration_stays_inert() {
        let mut c = UpdateController::default();
        assert!(c.registration_failed("SecurityError").is_empty());
        assert_eq!(c.state(), UpdateState::NoRegistration);
        assert!(c.periodic_check().is_empty());
        assert!(c.worker_waiting().is_empty());
    }

    #[test]
    fn first_install_shows_no_banner() {
        let mut c = UpdateController::default();
        c.registered(false, false, true);
        assert_eq!(c.state(), UpdateState::UpdateInstalling);
        assert!(c.worker_installed(false).is_empty());
        assert_eq!(c.state(), UpdateState::Registered);
        assert!(!c.banner_visible());
    }

    #[test]
    fn upgrade_shows_exactly_one_banner() {
        let mut c = registered();
        assert!(c.update_found().is_empty());
        assert_eq!(c.state(), UpdateState::UpdateInstalling);
        assert_eq!(c.worker_installed(true), vec![UpdateCommand::ShowBanner]);
        assert!(c.worker_waiting().is_empty());
        assert!(c.banner_visible());
    }

    #[test]
    fn accept_posts_skip_waiting_and_waits_for_controller() {
        let mut c = waiting();
        let commands = c.accept();
        assert_eq!(
            commands,
            vec![
                UpdateCommand::RemoveBanner,
                UpdateCommand::PostMessage(WorkerMessage::SkipWaiting),
            ]
        );
        assert!(!commands.contains(&UpdateCommand::Reload));
        assert!(c.accept().is_empty());
        assert_eq!(c.controller_change(), vec![UpdateCommand::Reload]);
        assert!(c.controller_change().is_empty());
    }

    #[test]
    fn dismissed_update_is_reoffered_by_next_check() {
        let mut c = waiting();
        assert_eq!(c.dismiss(), vec![UpdateCommand::RemoveBanner]);
        assert_eq!(c.state(), UpdateState::UpdateDismissed);
        assert!(c.dismiss().is_empty());
        assert_eq!(
            c.periodic_check(),
            vec![UpdateCommand::CheckForUpdate, UpdateCommand::ShowBanner]
        );
        assert_eq!(c.state(), UpdateState::UpdateWaiting);
    }

    #[test]
    fn controller_change_reloads_without_banner() {
        let mut c = registered();
        assert_eq!(c.controller_change(), vec![UpdateCommand::Reload]);
        assert!(c.is_reloading());
        assert!(c.periodic_check().is_empty());
    }

    #[derive(Debug, Default)]
    struct Host {
        calls: Vec<&'static str>,
        fail_post: bool,
    }

    impl WorkerHost for Host {
        fn arm_periodic_check(&mut self, _interval_secs: u32) {
            self.calls.push("arm");
        }
        fn check_for_update(&mut self) {
            self.calls.push("check");
        }
        fn show_banner(&mut self) {
            self.calls.push("show");
        }
        fn remove_banner(&mut self) {
            self.calls.push("remove");
        }
        fn post_message(&mut self, _message: WorkerMessage) -> Result<(), PlatformError> {
            self.calls.push("post");
            if self.fail_post {
                Err(PlatformError::exception("InvalidStateError"))
            } else {
                Ok(())
            }
        }
        fn reload(&mut self) {
            self.calls.push("reload");
        }
    }

    #[test]
    fn commands_run_in_order() {
        let mut c = waiting();
        let mut host = Host::default();
        let commands = c.accept();
        c.run(commands, &mut host);
        let commands = c.controller_change();
        c.run(commands, &mut host);
        assert_eq!(host.calls, vec!["remove", "post", "reload"]);
    }

    #[test]
    fn failed_post_offers_the_update_again() {
        let mut c = waiting();
        let mut host = Host {
            fail_post: true,
            ..Host::default()
        };
        let commands = c.accept();
        c.run(commands, &mut host);
        assert_eq!(host.calls, vec!["remove", "post"]);
        assert_eq!(c.state(), UpdateState::UpdateDismissed);

        assert_eq!(
            c.periodic_check(),
            vec![UpdateCommand::CheckForUpdate, UpdateCommand::ShowBanner]
        );
        assert_eq!(c.state(), UpdateState::UpdateWaiting);

        host.fail_post = false;
        let commands = c.accept();
        c.run(commands, &mut host);
        assert_eq!(host.calls, vec!["remove", "post", "remove", "post"]);
        assert_eq!(c.state(), UpdateState::UpdateAccepted);
    }

    #[test]
    fn failed_post_then_new_worker_shows_banner() {
        let mut c = waiting();
        let mut host = Host {
            fail_post: true,
            ..Host::default()
        };
        let commands = c.accept();
        c.run(commands, &mut host);
        assert!(c.update_found().is_empty());
        assert_eq!(c.worker_installed(true), vec![UpdateCommand::ShowBanner]);
    }

    #[test]
    fn post_failure_after_reload_is_ignored() {
        let mut c = waiting();
        c.accept();
        c.controller_change();
        assert!(c.post_failed().is_empty());
        assert_eq!(c.state(), UpdateState::UpdateAccepted);
    }

    #[test]
    fn newer_worker_behind_banner_keeps_update_button_live() {
        let mut c = waiting();
        assert!(c.update_found().is_empty());
        assert_eq!(c.state(), UpdateState::UpdateWaiting);
        assert!(c.banner_visible());

        assert!(c.worker_installed(true).is_empty());
        assert_eq!(c.state(), UpdateState::UpdateWaiting);
        assert_eq!(
            c.accept(),
            vec![
                UpdateCommand::RemoveBanner,
                UpdateCommand::PostMessage(WorkerMessage::SkipWaiting),
            ]
        );
    }

    #[test]
    fn repeated_waiting_notifications_never_duplicate_the_banner() {
        let mut c = waiting();
        for _ in 0..3 {
            assert!(c.update_found().is_empty());
            assert!(c.worker_installed(true).is_empty());
            assert!(c.worker_waiting().is_empty());
        }
        assert!(c.banner_visible());
        assert_eq!(c.state(), UpdateState::UpdateWaiting);
    }

    #[test]
    fn new_worker_after_dismissal_prompts_once() {
        let mut c = waiting();
        c.dismiss();
        assert!(c.update_found().is_empty());
        assert_eq!(c.state(), UpdateState::UpdateInstalling);
        assert_eq!(c.worker_installed(true), vec![UpdateCommand::ShowBanner]);
        assert!(c.worker_installed(true).is_empty());
        assert_eq!(c.periodic_check(), vec![UpdateCommand::CheckForUpdate]);
    }

    #[test]
    fn accepted_update_ignores_later_notifications() {
        let mut c = waiting();
        c.accept();
        assert!(c.update_found().is_empty());
        assert!(c.worker_installed(true).is_empty());
        assert!(c.worker_waiting().is_empty());
        assert_eq!(c.state(), UpdateState::UpdateAccepted);
        assert!(!c.banner_visible());
        assert_eq!(c.controller_change(), vec![UpdateCommand::Reload]);
    }
}
