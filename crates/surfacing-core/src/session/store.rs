use super::model::{PendingPrompt, Session, SessionSnapshot, Visibility};
use crate::capture::CapturedImage;
use crate::request::RequestError;
use tokio::sync::watch;

/// Owner of the single [`Session`].
///
/// Every mutation takes `&mut self`, so the store has exactly one writer and
/// no two mutations can interleave. Each mutation publishes a fresh snapshot
/// on a `watch` channel for passive readers.
///
/// `generation` advances only on [`reset`](Self::reset) and
/// [`begin_thinking`](Self::begin_thinking).
pub struct SessionStore {
    session: Session,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let session = Session::default();
        let (snapshots, _) = watch::channel(session.snapshot());
        Self { session, snapshots }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.session.generation
    }

    pub fn visibility(&self) -> Visibility {
        self.session.visibility
    }

    pub fn draft(&self) -> &str {
        &self.session.draft_text
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_capturing
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.session.visibility = visibility;
        self.publish();
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.session.draft_text = text.into();
        self.publish();
    }

    pub fn attach_image(&mut self, image: CapturedImage) {
        self.session.attached_image = Some(image);
        self.publish();
    }

    pub fn clear_image(&mut self) -> Option<CapturedImage> {
        let image = self.session.attached_image.take();
        self.publish();
        image
    }

    pub fn begin_capture(&mut self) {
        self.session.is_capturing = true;
        self.publish();
    }

    pub fn end_capture(&mut self) {
        self.session.is_capturing = false;
        self.publish();
    }

    /// Moves the draft and attachment out into a [`PendingPrompt`], clears the
    /// previous response, raises the thinking flag and advances the generation.
    pub fn begin_thinking(&mut self) -> PendingPrompt {
        let text = std::mem::take(&mut self.session.draft_text);
        let image = self.session.attached_image.take();
        self.session.response_text = None;
        self.session.is_thinking = true;
        self.session.generation += 1;
        self.publish();

        PendingPrompt {
            text,
            image,
            generation: self.session.generation,
        }
    }

    pub fn complete_response(&mut self, text: impl Into<String>) {
        self.session.is_thinking = false;
        self.session.response_text = Some(text.into());
        self.publish();
    }

    /// Records a failed request as the visible response.
    pub fn fail(&mut self, error: &RequestError) {
        self.session.is_thinking = false;
        self.session.response_text = Some(error.user_message());
        self.publish();
    }

    /// Clears draft, attachment, response and thinking flag, and advances the
    /// generation so in-flight results are discarded. Returns the new
    /// generation. Visibility and the capture-in-flight marker are untouched.
    pub fn reset(&mut self) -> u64 {
        self.session.draft_text.clear();
        self.session.attached_image = None;
        self.session.response_text = None;
        self.session.is_thinking = false;
        self.session.generation += 1;
        self.publish();
        self.session.generation
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPhase;
    use image::{DynamicImage, RgbaImage};

    fn image(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(width, height)))
    }

    #[test]
    fn starts_hidden_and_empty() {
        let store = SessionStore::new();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.visibility, Visibility::Hidden);
        assert_eq!(snapshot.draft_text, "");
        assert!(!snapshot.has_image());
        assert!(!snapshot.is_thinking);
        assert_eq!(snapshot.response_text, None);
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.phase(), SessionPhase::Idle);
    }

    #[test]
    fn begin_thinking_moves_draft_and_image_out() {
        let mut store = SessionStore::new();
        store.set_visibility(Visibility::Visible);
        store.set_draft("what is on screen?");
        store.attach_image(image(8, 6));
        store.complete_response("old answer");

        let pending = store.begin_thinking();

        assert_eq!(pending.text, "what is on screen?");
        assert_eq!(pending.image.map(|i| i.dimensions()), Some((8, 6)));
        assert_eq!(pending.generation, 1);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.draft_text, "");
        assert!(!snapshot.has_image());
        assert!(snapshot.is_thinking);
        assert_eq!(snapshot.response_text, None);
        assert_eq!(snapshot.phase(), SessionPhase::Thinking);
    }

    #[test]
    fn only_reset_and_submit_advance_generation() {
        let mut store = SessionStore::new();
        store.set_visibility(Visibility::Visible);
        store.set_draft("x");
        store.attach_image(image(1, 1));
        store.clear_image();
        store.begin_capture();
        store.end_capture();
        store.complete_response("y");
        store.fail(&RequestError::MalformedResponse);
        assert_eq!(store.generation(), 0);

        store.begin_thinking();
        assert_eq!(store.generation(), 1);
        assert_eq!(store.reset(), 2);
    }

    #[test]
    fn reset_twice_only_moves_generation() {
        let mut store = SessionStore::new();
        store.set_visibility(Visibility::Visible);
        store.set_draft("draft");
        store.attach_image(image(2, 2));
        store.complete_response("answer");

        store.reset();
        let once = store.snapshot();
        store.reset();
        let twice = store.snapshot();

        assert_eq!(twice.generation, once.generation + 1);
        assert_eq!(
            SessionSnapshot {
                generation: once.generation,
                ..twice
            },
            once
        );
        assert_eq!(once.draft_text, "");
        assert!(!once.has_image());
        assert_eq!(once.response_text, None);
        assert!(!once.is_thinking);
    }

    #[test]
    fn fail_turns_off_thinking_and_shows_message() {
        let mut store = SessionStore::new();
        store.set_draft("x");
        store.begin_thinking();
        store.fail(&RequestError::MissingCredential);

        let snapshot = store.snapshot();
        assert!(!snapshot.is_thinking);
        assert_eq!(
            snapshot.response_text.as_deref(),
            Some(crate::request::MISSING_CREDENTIAL_MESSAGE)
        );
    }

    #[test]
    fn subscribers_see_latest_snapshot() {
        let mut store = SessionStore::new();
        let mut rx = store.subscribe();
        store.set_visibility(Visibility::Visible);
        store.set_draft("hello");

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.draft_text, "hello");
        assert_eq!(seen.phase(), SessionPhase::Active);
    }

    #[test]
    fn capturing_phase_wins_over_response() {
        let mut store = SessionStore::new();
        store.set_visibility(Visibility::Visible);
        store.complete_response("shown");
        assert_eq!(store.snapshot().phase(), SessionPhase::Responded);
        store.begin_capture();
        assert_eq!(store.snapshot().phase(), SessionPhase::Capturing);
        store.end_capture();
        assert_eq!(store.snapshot().phase(), SessionPhase::Responded);
    }
}
