//! Cropper session: one file, one selection, at most one output.
//!
//! The session owns the transient preview resource, the decoded source and
//! the crop controller. Decoding and applying are split into begin/finish
//! halves so a host can run the expensive part elsewhere; results are tied
//! to a generation and anything from a superseded file is dropped.
//!
//! ```text
//! Idle --select_file--> Loading --complete_decode--> Ready --apply--> Closed
//!                          |                           |
//!                          +------> Failed --retry-----+
//! ```
//!
//! `cancel()` moves any state to `Closed`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CropperConfig;
use crate::decode::{decode_image, DecodeError, ImageFile, SourceImage};
use crate::raster::{self, CropOutput, RasterizeError};
use crate::selection::{CropController, CropSelection};

/// Host-side resource backing the on-screen preview (an object URL in a
/// browser). Acquired per selected file and released exactly once.
pub trait PreviewResources {
    type Handle;

    fn acquire(&mut self, file: &ImageFile) -> Result<Self::Handle, DecodeError>;

    fn release(&mut self, handle: Self::Handle);
}

/// Preview resources for hosts that render nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl PreviewResources for NoPreview {
    type Handle = ();

    fn acquire(&mut self, _file: &ImageFile) -> Result<(), DecodeError> {
        Ok(())
    }

    fn release(&mut self, _handle: ()) {}
}

/// Identifies one pending decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeTicket {
    generation: u64,
}

impl DecodeTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// What happened to a completed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image is ready for cropping.
    Ready,
    /// Decoding failed; the session shows an error.
    Failed,
    /// The ticket was superseded and the result was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No file selected yet.
    Idle,
    /// A file is selected and its decode is pending.
    Loading,
    /// The image is decoded and the selection is interactive.
    Ready,
    /// The last decode failed.
    Failed,
    /// Applied or cancelled. Terminal.
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        }
    }
}

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a decoded image
    #[error("No image is ready for cropping")]
    NotReady,

    #[error("An apply is already in progress")]
    ApplyInProgress,

    /// The result belongs to a superseded file or apply
    #[error("Result is stale")]
    Stale,

    #[error("Session is closed")]
    Closed,

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Crop failed: {0}")]
    Rasterize(#[from] RasterizeError),
}

/// Snapshot of everything needed to produce the output.
///
/// Holds its own reference to the source so it can be run while the session
/// keeps handling input.
#[derive(Debug, Clone)]
pub struct ApplyJob {
    id: u64,
    generation: u64,
    source: Arc<SourceImage>,
    selection: CropSelection,
    config: CropperConfig,
}

impl ApplyJob {
    pub fn selection(&self) -> &CropSelection {
        &self.selection
    }

    pub fn run(&self) -> Result<CropOutput, RasterizeError> {
        raster::apply(&self.source, &self.selection, &self.config)
    }
}

/// A single crop interaction.
pub struct CropSession<R: PreviewResources> {
    config: CropperConfig,
    resources: R,
    preview: Option<R::Handle>,
    file: Option<ImageFile>,
    source: Option<Arc<SourceImage>>,
    controller: CropController,
    state: SessionState,
    error: Option<String>,
    generation: u64,
    apply_in_flight: Option<u64>,
    next_job: u64,
}

impl<R: PreviewResources> CropSession<R> {
    pub fn new(config: CropperConfig, resources: R) -> Self {
        let config = config.normalized();
        let controller = CropController::new(config.limits);
        Self {
            config,
            resources,
            preview: None,
            file: None,
            source: None,
            controller,
            state: SessionState::Idle,
            error: None,
            generation: 0,
            apply_in_flight: None,
            next_job: 0,
        }
    }

    /// Select a new file, replacing any previous one.
    ///
    /// Releases the previous preview resource, invalidates outstanding decode
    /// tickets and apply jobs, and enters `Loading`.
    ///
    /// # Errors
    ///
    /// `Closed` after apply or cancel. `Decode` when the preview resource
    /// cannot be acquired; the session is then `Failed` and keeps the file
    /// for [`retry`](Self::retry).
    pub fn select_file(&mut self, file: ImageFile) -> Result<DecodeTicket, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        self.release_preview();
        self.generation += 1;
        self.apply_in_flight = None;
        self.source = None;
        self.error = None;
        self.controller = CropController::new(self.config.limits);

        debug!(
            generation = self.generation,
            mime = file.mime.as_str(),
            len = file.len(),
            "selected file"
        );

        match self.resources.acquire(&file) {
            Ok(handle) => {
                self.preview = Some(handle);
                self.file = Some(file);
                self.state = SessionState::Loading;
                Ok(DecodeTicket {
                    generation: self.generation,
                })
            }
            Err(e) => {
                warn!(error = %e, "failed to acquire preview resource");
                self.file = Some(file);
                self.error = Some(e.to_string());
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }

    /// The file awaiting decode for `ticket`, if the ticket is still current.
    pub fn pending_file(&self, ticket: DecodeTicket) -> Option<&ImageFile> {
        if self.is_current(ticket) {
            self.file.as_ref()
        } else {
            None
        }
    }

    /// Hand the result of a decode back to the session.
    pub fn complete_decode(
        &mut self,
        ticket: DecodeTicket,
        result: Result<SourceImage, DecodeError>,
    ) -> LoadOutcome {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale decode result"
            );
            return LoadOutcome::Stale;
        }

        let result = result.and_then(|image| image.validate().map(|()| image));

        match result {
            Ok(image) => {
                debug!(width = image.width, height = image.height, "image ready");
                self.source = Some(Arc::new(image));
                self.controller = CropController::new(self.config.limits);
                self.state = SessionState::Ready;
                LoadOutcome::Ready
            }
            Err(e) => {
                warn!(error = %e, "decode failed");
                self.release_preview();
                self.error = Some(e.to_string());
                self.state = SessionState::Failed;
                LoadOutcome::Failed
            }
        }
    }

    /// Decode the pending file inline.
    pub fn decode_pending(&mut self, ticket: DecodeTicket) -> LoadOutcome {
        let result = match self.pending_file(ticket) {
            Some(file) => decode_image(file),
            None => return LoadOutcome::Stale,
        };
        self.complete_decode(ticket, result)
    }

    /// Re-issue the decode for the file that failed.
    pub fn retry(&mut self) -> Result<DecodeTicket, SessionError> {
        if self.state != SessionState::Failed {
            return Err(SessionError::NotReady);
        }
        match self.file.take() {
            Some(file) => self.select_file(file),
            None => Err(SessionError::NotReady),
        }
    }

    /// The crop controller, while the selection is interactive.
    ///
    /// `None` while loading, after a failure, after close and while an apply
    /// is in flight.
    pub fn controller_mut(&mut self) -> Option<&mut CropController> {
        if self.state == SessionState::Ready && self.apply_in_flight.is_none() {
            Some(&mut self.controller)
        } else {
            None
        }
    }

    pub fn controller(&self) -> &CropController {
        &self.controller
    }

    pub fn selection(&self) -> &CropSelection {
        self.controller.selection()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    pub fn preview(&self) -> Option<&R::Handle> {
        self.preview.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &CropperConfig {
        &self.config
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the cropper should be on screen.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Loading | SessionState::Ready | SessionState::Failed
        )
    }

    pub fn is_applying(&self) -> bool {
        self.apply_in_flight.is_some()
    }

    /// Snapshot the current selection for rasterizing.
    pub fn begin_apply(&mut self) -> Result<ApplyJob, SessionError> {
        match self.state {
            SessionState::Closed => return Err(SessionError::Closed),
            SessionState::Ready => {}
            _ => return Err(SessionError::NotReady),
        }
        if self.apply_in_flight.is_some() {
            return Err(SessionError::ApplyInProgress);
        }
        let source = match &self.source {
            Some(source) => Arc::clone(source),
            None => return Err(SessionError::NotReady),
        };

        self.controller.end_drag();
        let id = self.next_job;
        self.next_job += 1;
        self.apply_in_flight = Some(id);

        Ok(ApplyJob {
            id,
            generation: self.generation,
            source,
            selection: *self.controller.selection(),
            config: self.config.clone(),
        })
    }

    /// Accept the result of a job started with [`begin_apply`](Self::begin_apply).
    ///
    /// On success the session closes and the preview resource is released.
    /// On failure the session stays `Ready` so the user can try again.
    pub fn finish_apply(
        &mut self,
        job: ApplyJob,
        result: Result<CropOutput, RasterizeError>,
    ) -> Result<CropOutput, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        if self.apply_in_flight != Some(job.id) || job.generation != self.generation {
            debug!(job = job.id, "discarding stale apply result");
            return Err(SessionError::Stale);
        }
        self.apply_in_flight = None;

        match result {
            Ok(output) => {
                debug!(len = output.bytes.len(), mime = output.mime(), "apply complete");
                self.close();
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "apply failed");
                Err(e.into())
            }
        }
    }

    /// Produce the output synchronously.
    pub fn apply(&mut self) -> Result<CropOutput, SessionError> {
        let job = self.begin_apply()?;
        let result = job.run();
        self.finish_apply(job, result)
    }

    /// Abandon the session without output. Idempotent.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        debug!(generation = self.generation, "cancelled");
        self.generation += 1;
        self.close();
    }

    fn close(&mut self) {
        self.release_preview();
        self.apply_in_flight = None;
        self.file = None;
        self.source = None;
        self.controller.end_drag();
        self.state = SessionState::Closed;
    }

    fn is_current(&self, ticket: DecodeTicket) -> bool {
        self.state == SessionState::Loading && ticket.generation == self.generation
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            self.resources.release(handle);
        }
    }
}

impl<R: PreviewResources> Drop for CropSession<R> {
    fn drop(&mut self) {
        self.release_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageMime;
    use crate::selection::PointerPosition;
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;
    use std::rc::Rc;

    /// Counts acquisitions and records every released handle.
    #[derive(Default, Clone)]
    struct Tracker {
        acquired: Rc<Cell<u32>>,
        released: Rc<RefCell<Vec<u32>>>,
        fail_acquire: Rc<Cell<bool>>,
    }

    impl PreviewResources for Tracker {
        type Handle = u32;

        fn acquire(&mut self, _file: &ImageFile) -> Result<u32, DecodeError> {
            if self.fail_acquire.get() {
                return Err(DecodeError::Resource("out of handles".to_string()));
            }
            self.acquired.set(self.acquired.get() + 1);
            Ok(self.acquired.get())
        }

        fn release(&mut self, handle: u32) {
            self.released.borrow_mut().push(handle);
        }
    }

    fn png_file(width: u32, height: u32) -> ImageFile {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        ImageFile::new(ImageMime::Png, bytes)
    }

    fn session() -> (CropSession<Tracker>, Tracker) {
        let tracker = Tracker::default();
        (CropSession::new(CropperConfig::default(), tracker.clone()), tracker)
    }

    fn ready_session() -> (CropSession<Tracker>, Tracker) {
        let (mut s, tracker) = session();
        let ticket = s.select_file(png_file(40, 30)).unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Ready);
        (s, tracker)
    }

    #[test]
    fn test_new_session_is_idle() {
        let (s, _) = session();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.is_active());
        assert!(s.source().is_none());
        assert_eq!(*s.selection(), CropSelection::default());
    }

    #[test]
    fn test_loading_refuses_interaction() {
        let (mut s, _) = session();
        let _ticket = s.select_file(png_file(4, 4)).unwrap();
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.is_active());
        assert!(s.controller_mut().is_none());
        assert!(matches!(s.begin_apply(), Err(SessionError::NotReady)));
    }

    #[test]
    fn test_decode_makes_session_ready() {
        let (mut s, tracker) = ready_session();
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.preview(), Some(&1));
        assert_eq!(tracker.acquired.get(), 1);

        let source = s.source().unwrap();
        assert_eq!((source.width, source.height), (40, 30));

        let ctl = s.controller_mut().unwrap();
        assert!(ctl.begin_drag(PointerPosition::new(50.0, 50.0)));
        assert!(ctl.is_dragging());
    }

    #[test]
    fn test_cancel_releases_exactly_once() {
        let (mut s, tracker) = ready_session();
        s.cancel();
        s.cancel();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.is_active());
        assert!(s.source().is_none());
        drop(s);
        assert_eq!(*tracker.released.borrow(), vec![1]);
    }

    #[test]
    fn test_apply_releases_exactly_once() {
        let (mut s, tracker) = ready_session();
        let output = s.apply().unwrap();
        assert_eq!(output.mime(), "image/jpeg");
        assert_eq!((output.width, output.height), (256, 256));
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.is_active());

        s.cancel();
        drop(s);
        assert_eq!(*tracker.released.borrow(), vec![1]);
    }

    #[test]
    fn test_drop_releases_preview() {
        let (s, tracker) = ready_session();
        drop(s);
        assert_eq!(*tracker.released.borrow(), vec![1]);
    }

    #[test]
    fn test_replacing_file_releases_previous_preview() {
        let (mut s, tracker) = session();
        let _a = s.select_file(png_file(4, 4)).unwrap();
        let b = s.select_file(png_file(6, 6)).unwrap();
        assert_eq!(*tracker.released.borrow(), vec![1]);
        assert_eq!(s.preview(), Some(&2));

        assert_eq!(s.decode_pending(b), LoadOutcome::Ready);
        drop(s);
        assert_eq!(*tracker.released.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_stale_decode_is_discarded() {
        let (mut s, _) = session();
        let a = s.select_file(png_file(10, 10)).unwrap();
        let b = s.select_file(png_file(20, 12)).unwrap();

        // A finishes after B was selected
        let late = SourceImage::solid(10, 10, [0, 0, 255]);
        assert_eq!(s.complete_decode(a, Ok(late)), LoadOutcome::Stale);
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.source().is_none());
        assert!(s.pending_file(a).is_none());

        assert_eq!(s.decode_pending(b), LoadOutcome::Ready);
        let source = s.source().unwrap();
        assert_eq!((source.width, source.height), (20, 12));

        // and the same ticket cannot be used twice
        assert_eq!(s.decode_pending(b), LoadOutcome::Stale);
    }

    #[test]
    fn test_corrupt_file_fails_and_can_retry() {
        let (mut s, tracker) = session();
        let ticket = s
            .select_file(ImageFile::new(ImageMime::Jpeg, vec![0xFF, 0xD8, 0x00, 0x01]))
            .unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Failed);
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.is_active());
        assert!(s.source().is_none());
        assert!(s.error_message().is_some());
        assert!(s.controller_mut().is_none());
        assert_eq!(*tracker.released.borrow(), vec![1]);

        let again = s.retry().unwrap();
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.error_message().is_none());
        assert_eq!(s.decode_pending(again), LoadOutcome::Failed);
        assert_eq!(*tracker.released.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_new_file_recovers_from_failure() {
        let (mut s, _) = session();
        let ticket = s.select_file(ImageFile::new(ImageMime::Png, vec![1, 2, 3])).unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Failed);

        let ticket = s.select_file(png_file(8, 8)).unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Ready);
        assert!(s.error_message().is_none());
    }

    #[test]
    fn test_empty_decode_result_fails() {
        let (mut s, _) = session();
        let ticket = s.select_file(png_file(2, 2)).unwrap();
        let outcome = s.complete_decode(ticket, Ok(SourceImage::new(0, 0, Vec::new())));
        assert_eq!(outcome, LoadOutcome::Failed);
        assert!(s.source().is_none());
    }

    #[test]
    fn test_mismatched_pixel_buffer_fails() {
        let (mut s, tracker) = session();
        let ticket = s.select_file(png_file(2, 2)).unwrap();
        let short = SourceImage {
            width: 100,
            height: 100,
            pixels: vec![255; 16],
        };
        assert_eq!(s.complete_decode(ticket, Ok(short)), LoadOutcome::Failed);
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.source().is_none());
        assert!(matches!(s.apply(), Err(SessionError::NotReady)));
        assert_eq!(*tracker.released.borrow(), vec![1]);
    }

    #[test]
    fn test_acquire_failure_marks_failed() {
        let (mut s, tracker) = session();
        tracker.fail_acquire.set(true);
        let result = s.select_file(png_file(4, 4));
        assert!(matches!(result, Err(SessionError::Decode(DecodeError::Resource(_)))));
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.preview().is_none());

        tracker.fail_acquire.set(false);
        let ticket = s.retry().unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Ready);
    }

    #[test]
    fn test_retry_only_after_failure() {
        let (mut s, _) = ready_session();
        assert!(matches!(s.retry(), Err(SessionError::NotReady)));
    }

    #[test]
    fn test_rasterize_failure_keeps_session_ready() {
        let tracker = Tracker::default();
        let config = CropperConfig {
            output_size: 0,
            ..CropperConfig::default()
        };
        let mut s = CropSession::new(config, tracker.clone());
        let ticket = s.select_file(png_file(5, 5)).unwrap();
        s.decode_pending(ticket);

        let result = s.apply();
        assert!(matches!(
            result,
            Err(SessionError::Rasterize(RasterizeError::SurfaceAllocation { size: 0 }))
        ));
        assert_eq!(s.state(), SessionState::Ready);
        assert!(!s.is_applying());
        assert!(s.controller_mut().is_some());
        assert!(tracker.released.borrow().is_empty());
    }

    #[test]
    fn test_single_apply_in_flight() {
        let (mut s, _) = ready_session();
        let job = s.begin_apply().unwrap();
        assert!(s.is_applying());
        assert!(matches!(s.begin_apply(), Err(SessionError::ApplyInProgress)));
        assert!(s.controller_mut().is_none());

        let result = job.run();
        let output = s.finish_apply(job, result).unwrap();
        assert!(!output.bytes.is_empty());
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_apply_snapshot_ignores_later_edits() {
        let (mut s, _) = ready_session();
        s.controller_mut().unwrap().set_size(40.0);
        let job = s.begin_apply().unwrap();
        assert_eq!(job.selection().size, 40.0);
    }

    #[test]
    fn test_superseded_apply_is_stale() {
        let (mut s, _) = ready_session();
        let job = s.begin_apply().unwrap();
        let result = job.run();

        let ticket = s.select_file(png_file(3, 3)).unwrap();
        assert!(matches!(s.finish_apply(job, result), Err(SessionError::Stale)));
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Ready);
    }

    #[test]
    fn test_apply_after_cancel_is_rejected() {
        let (mut s, _) = ready_session();
        let job = s.begin_apply().unwrap();
        s.cancel();
        let result = job.run();
        assert!(matches!(s.finish_apply(job, result), Err(SessionError::Closed)));
        assert!(matches!(s.apply(), Err(SessionError::Closed)));
        assert!(matches!(s.select_file(png_file(2, 2)), Err(SessionError::Closed)));
    }

    #[test]
    fn test_decode_after_cancel_is_stale() {
        let (mut s, tracker) = session();
        let ticket = s.select_file(png_file(4, 4)).unwrap();
        s.cancel();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Stale);
        assert_eq!(*tracker.released.borrow(), vec![1]);
    }

    #[test]
    fn test_no_preview_host() {
        let mut s = CropSession::new(CropperConfig::default(), NoPreview);
        let ticket = s.select_file(png_file(12, 12)).unwrap();
        assert_eq!(s.decode_pending(ticket), LoadOutcome::Ready);
        assert!(s.apply().is_ok());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::Idle.as_str(), "idle");
        assert_eq!(SessionState::Loading.as_str(), "loading");
        assert_eq!(SessionState::Ready.as_str(), "ready");
        assert_eq!(SessionState::Failed.as_str(), "failed");
        assert_eq!(SessionState::Closed.as_str(), "closed");
    }
}
