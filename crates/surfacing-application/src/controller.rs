//! Session orchestration controller.
//!
//! The controller is the single writer of the [`SessionStore`]. Shell events
//! and the completions of background work are handled one at a time on the
//! controller's task; background work (the settle delay, the capture call,
//! the request) runs in spawned tasks that only post a [`Completion`] back.
//!
//! There is no cancellation of in-flight work. Each completion carries the
//! generation it was issued under and is dropped if the session has moved on.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use surfacing_core::{
    ApiClient, CaptureError, CaptureOutcome, CaptureProvider, DisplayId, PendingPrompt,
    PresentationShell, RequestError, RequestOutcome, SessionSnapshot, SessionStore, ShellEvent,
    StatusAction, StatusClick, Visibility,
};
use tokio::sync::{mpsc, watch};

/// Time the window needs to finish hiding before the screen is captured.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub settle_delay: Duration,
    pub display: DisplayId,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            display: DisplayId::PRIMARY,
        }
    }
}

/// Result of background work, tagged with the generation it was issued under.
#[derive(Debug)]
enum Completion {
    Capture {
        generation: u64,
        outcome: CaptureOutcome,
    },
    Request {
        generation: u64,
        outcome: RequestOutcome,
    },
}

pub struct SessionController {
    store: SessionStore,
    shell: Arc<dyn PresentationShell>,
    capture: Arc<dyn CaptureProvider>,
    api: Arc<dyn ApiClient>,
    config: ControllerConfig,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    last_notified: SessionSnapshot,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        shell: Arc<dyn PresentationShell>,
        capture: Arc<dyn CaptureProvider>,
        api: Arc<dyn ApiClient>,
        config: ControllerConfig,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let last_notified = store.snapshot();
        Self {
            store,
            shell,
            capture,
            api,
            config,
            completions_tx,
            completions_rx,
            last_notified,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    /// Runs the event loop until the shell asks to quit or drops its sender.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ShellEvent>) {
        tracing::info!("Session controller started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if self.handle_event(event).is_break() {
                        break;
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.apply_completion(completion);
                }
            }
        }
        tracing::info!("Session controller stopped");
    }

    /// Handles one shell event. Breaks on [`ShellEvent::QuitRequested`].
    pub fn handle_event(&mut self, event: ShellEvent) -> ControlFlow<()> {
        tracing::debug!(?event, generation = self.store.generation(), "Shell event");
        match event {
            ShellEvent::ToggleRequested => self.on_toggle_requested(),
            ShellEvent::CaptureRequested => self.on_capture_requested(),
            ShellEvent::SubmitRequested => self.on_submit_requested(),
            ShellEvent::Deactivated => self.on_deactivated(),
            ShellEvent::DraftChanged(text) => self.on_draft_changed(text),
            ShellEvent::StatusItemClicked(click) => self.on_status_item_clicked(click),
            ShellEvent::SettingsRequested => self.on_settings_requested(),
            ShellEvent::QuitRequested => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Waits for the next background completion and applies it.
    ///
    /// For shells that drive the controller without [`run`](Self::run).
    pub async fn process_next_completion(&mut self) {
        if let Some(completion) = self.completions_rx.recv().await {
            self.apply_completion(completion);
        }
    }

    /// Hidden → reset, then show. Visible → hide, keeping the session as is.
    pub fn on_toggle_requested(&mut self) {
        self.shell.close_settings();
        match self.store.visibility() {
            Visibility::Hidden => {
                self.store.reset();
                self.show();
            }
            Visibility::Visible => self.hide(),
        }
        self.notify();
    }

    /// Focus left the application: reset regardless of in-flight work and hide.
    pub fn on_deactivated(&mut self) {
        let generation = self.store.reset();
        tracing::debug!(generation, "Session reset on deactivation");
        if self.store.visibility().is_visible() {
            self.hide();
        }
        self.notify();
    }

    pub fn on_draft_changed(&mut self, text: String) {
        self.store.set_draft(text);
        self.notify();
    }

    pub fn on_status_item_clicked(&mut self, click: StatusClick) {
        match click.action() {
            StatusAction::Toggle => self.on_toggle_requested(),
            StatusAction::ShowMenu => self.shell.show_menu(),
        }
    }

    /// Hides the panel (without reset) and opens the settings surface.
    pub fn on_settings_requested(&mut self) {
        if self.store.visibility().is_visible() {
            self.hide();
        }
        self.shell.open_settings();
        self.notify();
    }

    /// Hides the window, waits for it to settle, captures, then restores.
    pub fn on_capture_requested(&mut self) {
        if !self.store.visibility().is_visible() {
            tracing::debug!("Ignoring capture request while hidden");
            return;
        }
        if self.store.is_capturing() {
            tracing::debug!("Ignoring capture request while a capture is in flight");
            return;
        }

        let generation = self.store.generation();
        self.store.begin_capture();
        // The panel must be off screen before the provider runs, or it ends
        // up in its own capture.
        self.shell.set_visibility(Visibility::Hidden);
        self.notify();

        let provider = Arc::clone(&self.capture);
        let completions = self.completions_tx.clone();
        let ControllerConfig {
            settle_delay,
            display,
        } = self.config;

        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            let outcome = match tokio::spawn(async move { provider.capture(display).await }).await
            {
                Ok(result) => CaptureOutcome::from(result),
                Err(err) if err.is_cancelled() => CaptureOutcome::Cancelled,
                Err(err) => CaptureOutcome::Failed(CaptureError::Unknown(format!(
                    "capture task failed: {err}"
                ))),
            };
            let _ = completions.send(Completion::Capture {
                generation,
                outcome,
            });
        });
    }

    /// Sends the draft (and attachment) to the API client.
    pub fn on_submit_requested(&mut self) {
        if self.store.draft().trim().is_empty() {
            tracing::debug!("Ignoring submit of an empty draft");
            return;
        }

        let PendingPrompt {
            text,
            image,
            generation,
        } = self.store.begin_thinking();
        self.notify();
        tracing::debug!(generation, with_image = image.is_some(), "Submitting prompt");

        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();
        let prompt = text.trim().to_string();

        tokio::spawn(async move {
            let outcome =
                match tokio::spawn(async move { api.generate(&prompt, image).await }).await {
                    Ok(result) => RequestOutcome::from(result),
                    Err(err) => {
                        tracing::warn!(error = %err, "Request task ended without a result");
                        RequestOutcome::Failed(RequestError::Interrupted)
                    }
                };
            let _ = completions.send(Completion::Request {
                generation,
                outcome,
            });
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Capture {
                generation,
                outcome,
            } => self.apply_capture(generation, outcome),
            Completion::Request {
                generation,
                outcome,
            } => self.apply_request(generation, outcome),
        }
    }

    fn apply_capture(&mut self, generation: u64, outcome: CaptureOutcome) {
        self.store.end_capture();
        let current = self.store.generation();

        match outcome {
            CaptureOutcome::Image(image) if generation == current => {
                tracing::debug!(generation, dimensions = ?image.dimensions(), "Attached capture");
                self.store.attach_image(image);
            }
            CaptureOutcome::Image(_) => {
                tracing::debug!(generation, current, "Discarding stale capture");
            }
            CaptureOutcome::Cancelled => {
                tracing::debug!(generation, "Capture cancelled");
            }
            CaptureOutcome::Failed(err) => {
                tracing::warn!(error = %err, "Screen capture failed; continuing without image");
            }
        }

        // Restore exactly once per capture, to whatever the session says now.
        let visibility = self.store.visibility();
        self.shell.set_visibility(visibility);
        if visibility.is_visible() {
            self.shell.focus_input();
        }
        self.notify();
    }

    fn apply_request(&mut self, generation: u64, outcome: RequestOutcome) {
        let current = self.store.generation();
        if generation != current {
            tracing::debug!(generation, current, "Discarding stale response");
            return;
        }

        match outcome {
            RequestOutcome::Text(text) => self.store.complete_response(text),
            RequestOutcome::Failed(err) => {
                tracing::warn!(error = %err, "Request failed");
                self.store.fail(&err);
            }
        }
        self.notify();
    }

    fn show(&mut self) {
        self.store.set_visibility(Visibility::Visible);
        self.shell.set_visibility(Visibility::Visible);
        self.shell.focus_input();
    }

    fn hide(&mut self) {
        self.store.set_visibility(Visibility::Hidden);
        self.shell.set_visibility(Visibility::Hidden);
    }

    fn notify(&mut self) {
        let snapshot = self.store.snapshot();
        if snapshot != self.last_notified {
            self.shell.on_state_changed(&snapshot);
            self.last_notified = snapshot;
        }
    }
}
