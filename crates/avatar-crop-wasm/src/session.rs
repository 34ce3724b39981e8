//! Cropper session bindings.
//!
//! `JsCropSession` drives one crop interaction from JavaScript. The host
//! renders the preview from `preview_url` and the `selection` object, feeds
//! pointer events in display pixels, and receives the finished avatar through
//! the `on_complete` callback.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsCropSession(
//!   { output_size: 256 },
//!   (bytes: Uint8Array, mime: string) => upload(new Blob([bytes], { type: mime })),
//!   () => closeDialog(),
//! );
//!
//! const ticket = session.select_file(new Uint8Array(await file.arrayBuffer()), file.type);
//! setTimeout(() => session.decode(ticket), 0);
//!
//! box.onpointerdown = (e) =>
//!   session.begin_drag(e.offsetX, e.offsetY, box.clientWidth, box.clientHeight);
//! saveButton.onclick = () => session.apply();
//! ```

use avatar_crop_core::decode::validated_file;
use avatar_crop_core::{CropSession, DecodeTicket, LoadOutcome, PointerPosition, SessionState};
use js_sys::{Function, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::resources::ObjectUrlResources;
use crate::types::{outcome_name, parse_config, selection_to_js, to_js_error};

#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession<ObjectUrlResources>,
    pending: Option<DecodeTicket>,
    on_complete: Function,
    on_cancel: Function,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session.
    ///
    /// # Arguments
    /// * `config` - Optional partial config object (`undefined` for defaults)
    /// * `on_complete` - Called with `(bytes: Uint8Array, mime: string)` after a successful apply
    /// * `on_cancel` - Called with no arguments when the session is cancelled
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        on_complete: Function,
        on_cancel: Function,
    ) -> Result<JsCropSession, JsValue> {
        let config = parse_config(config)?;
        Ok(Self {
            inner: CropSession::new(config, ObjectUrlResources),
            pending: None,
            on_complete,
            on_cancel,
        })
    }

    /// Select a file, replacing any previous one.
    ///
    /// Returns a ticket to pass to [`decode`](Self::decode). Throws if the
    /// file fails the upload checks or the session is closed.
    pub fn select_file(&mut self, bytes: Vec<u8>, mime: &str) -> Result<f64, JsValue> {
        let file = validated_file(mime, bytes, self.inner.config().max_upload_bytes)
            .map_err(to_js_error)?;
        let ticket = self.inner.select_file(file).map_err(to_js_error)?;
        self.pending = Some(ticket);
        Ok(ticket.generation() as f64)
    }

    /// Decode the file selected under `ticket`.
    ///
    /// Returns `"ready"`, `"failed"` or `"stale"` (a newer file was selected).
    pub fn decode(&mut self, ticket: f64) -> String {
        let outcome = match self.pending {
            Some(pending) if pending.generation() as f64 == ticket => {
                self.pending = None;
                self.inner.decode_pending(pending)
            }
            _ => LoadOutcome::Stale,
        };
        outcome_name(outcome).to_string()
    }

    /// Retry decoding after a failure. Returns a new ticket.
    pub fn retry(&mut self) -> Result<f64, JsValue> {
        let ticket = self.inner.retry().map_err(to_js_error)?;
        self.pending = Some(ticket);
        Ok(ticket.generation() as f64)
    }

    /// Start dragging if the pointer is inside the circle.
    ///
    /// Coordinates are pixels relative to the preview box of size
    /// `display_width` x `display_height`.
    pub fn begin_drag(
        &mut self,
        x: f64,
        y: f64,
        display_width: f64,
        display_height: f64,
    ) -> bool {
        let Some(pointer) = PointerPosition::from_display(x, y, display_width, display_height)
        else {
            return false;
        };
        self.inner
            .controller_mut()
            .is_some_and(|ctl| ctl.begin_drag(pointer))
    }

    /// Move the circle while dragging. Returns whether anything moved.
    pub fn continue_drag(
        &mut self,
        x: f64,
        y: f64,
        display_width: f64,
        display_height: f64,
    ) -> bool {
        let Some(pointer) = PointerPosition::from_display(x, y, display_width, display_height)
        else {
            return false;
        };
        self.inner
            .controller_mut()
            .is_some_and(|ctl| ctl.continue_drag(pointer))
    }

    pub fn end_drag(&mut self) {
        if let Some(ctl) = self.inner.controller_mut() {
            ctl.end_drag();
        }
    }

    /// Move the circle by a delta in percent (keyboard arrows).
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        if let Some(ctl) = self.inner.controller_mut() {
            ctl.nudge(dx, dy);
        }
    }

    /// Set the circle diameter. Returns the size actually applied.
    pub fn set_size(&mut self, size: f64) -> f64 {
        match self.inner.controller_mut() {
            Some(ctl) => ctl.set_size(size),
            None => self.inner.selection().size,
        }
    }

    /// Set the zoom factor. Returns the zoom actually applied.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        match self.inner.controller_mut() {
            Some(ctl) => ctl.set_zoom(zoom),
            None => self.inner.selection().scale,
        }
    }

    pub fn reset(&mut self) {
        if let Some(ctl) = self.inner.controller_mut() {
            ctl.reset();
        }
    }

    /// Produce the avatar and hand it to `on_complete`.
    ///
    /// Throws if no image is ready or rasterizing fails; the session stays
    /// interactive in the latter case.
    pub fn apply(&mut self) -> Result<(), JsValue> {
        let output = self.inner.apply().map_err(to_js_error)?;
        self.pending = None;

        let bytes = Uint8Array::from(output.bytes.as_slice());
        if let Err(e) = self
            .on_complete
            .call2(&JsValue::NULL, &bytes, &JsValue::from_str(output.mime()))
        {
            console::warn_2(&JsValue::from_str("on_complete callback threw"), &e);
        }
        Ok(())
    }

    /// Close the session without output and notify `on_cancel`.
    ///
    /// Does nothing if the session is already closed.
    pub fn cancel(&mut self) {
        if self.inner.state() == SessionState::Closed {
            return;
        }
        self.inner.cancel();
        self.pending = None;

        if let Err(e) = self.on_cancel.call0(&JsValue::NULL) {
            console::warn_2(&JsValue::from_str("on_cancel callback threw"), &e);
        }
    }

    /// Upload limit this session enforces in `select_file`.
    #[wasm_bindgen(getter)]
    pub fn max_upload_bytes(&self) -> usize {
        self.inner.config().max_upload_bytes
    }

    /// One of `"idle"`, `"loading"`, `"ready"`, `"failed"`, `"closed"`.
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.state().as_str().to_string()
    }

    /// Whether the cropper should be shown.
    #[wasm_bindgen(getter)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.inner.controller().is_dragging()
    }

    /// `blob:` URL of the selected file, for the preview `<img>`.
    #[wasm_bindgen(getter)]
    pub fn preview_url(&self) -> Option<String> {
        self.inner.preview().cloned()
    }

    /// Current selection as `{ center_x, center_y, size, scale }`.
    #[wasm_bindgen(getter)]
    pub fn selection(&self) -> Result<JsValue, JsValue> {
        selection_to_js(self.inner.selection())
    }

    #[wasm_bindgen(getter)]
    pub fn error_message(&self) -> Option<String> {
        self.inner.error_message().map(str::to_string)
    }
}
