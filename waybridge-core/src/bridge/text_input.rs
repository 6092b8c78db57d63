//! Text input (input method) session.
//!
//! Local changes are queued and go out as one `commit` per round trip. The
//! compositor's `done(serial)` echoes the number of commits it has seen;
//! incoming pre-edit, commit and delete events are buffered until a `done`
//! whose serial matches our latest commit and are then applied together.

use super::registry::InterfaceKind;
use super::{Bridge, ObjectKind, Protocol};
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use crate::handle::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputState {
    Disabled,
    Enabled,
    /// A commit was sent and its `done` has not arrived yet.
    AwaitingDone,
}

/// Outgoing `zwp_text_input_v3` requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInputRequest {
    Enable,
    Disable,
    SetSurroundingText { text: String, cursor: i32, anchor: i32 },
    /// Raw content hint bits and purpose value.
    SetContentType { hint: u32, purpose: u32 },
    SetCursorRectangle { x: i32, y: i32, width: i32, height: i32 },
    Commit,
}

impl TextInputRequest {
    fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Raw `zwp_text_input_v3` events.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTextInputEvent {
    Enter { surface: Handle },
    Leave { surface: Handle },
    PreeditString {
        text: Option<String>,
        cursor_begin: i32,
        cursor_end: i32,
    },
    CommitString { text: Option<String> },
    DeleteSurroundingText { before: u32, after: u32 },
    Done { serial: u32 },
}

#[derive(Debug, Default)]
struct Incoming {
    preedit: Option<(String, Option<(i32, i32)>)>,
    commit: Option<String>,
    delete: Option<(u32, u32)>,
}

#[derive(Debug)]
pub(crate) struct TextInputSession {
    handle: Handle,
    state: TextInputState,
    // Number of commits sent, compared against done serials.
    serial: u32,
    queued: Vec<TextInputRequest>,
    focus: Option<Handle>,
    incoming: Incoming,
    preedit_visible: bool,
}

impl TextInputSession {
    fn new(handle: Handle) -> Self {
        Self {
            handle,
            state: TextInputState::Disabled,
            serial: 0,
            queued: Vec::new(),
            focus: None,
            incoming: Incoming::default(),
            preedit_visible: false,
        }
    }

    fn queue(&mut self, request: TextInputRequest) {
        match request {
            TextInputRequest::Enable | TextInputRequest::Disable => {
                // Both reset the whole double-buffered state.
                self.queued.clear();
                self.queued.push(request);
            },
            request => match self.queued.iter_mut().find(|queued| queued.same_kind(&request)) {
                Some(queued) => *queued = request,
                None => self.queued.push(request),
            },
        }
    }

    pub(crate) fn handle(&self) -> Handle {
        self.handle
    }

    pub(crate) fn forget_surface(&mut self, surface: Handle) {
        if self.focus == Some(surface) {
            self.focus = None;
            self.incoming = Incoming::default();
            self.preedit_visible = false;
        }
    }
}

impl<P: Protocol> Bridge<P> {
    /// Create the text input object once both a seat and the manager exist.
    pub(crate) fn ensure_text_input(&mut self) -> Result<(), BridgeError> {
        if self.text_input.is_some() {
            return Ok(());
        }
        let Some((_, manager)) = self.global_object(InterfaceKind::TextInputManager) else {
            return Ok(());
        };
        let Some((_, seat)) = self.global_object(InterfaceKind::Seat) else {
            return Ok(());
        };
        let handle = self.insert_object(ObjectKind::TextInput, None, |protocol, handle| {
            protocol.get_text_input(handle, &manager, &seat)
        })?;
        log::debug!("Text input available as {:?}", handle);
        self.text_input = Some(TextInputSession::new(handle));
        Ok(())
    }

    pub(crate) fn remove_text_input(&mut self) {
        let Some(session) = self.text_input.take() else {
            return;
        };
        if session.preedit_visible {
            self.emit(BridgeEvent::TextInputPreedit {
                text: String::new(),
                cursor: None,
            });
        }
        if let Some(surface) = session.focus {
            self.emit(BridgeEvent::TextInputFocus { surface, focused: false });
        }
        self.release(session.handle);
    }

    pub fn text_input_state(&self) -> Option<TextInputState> {
        self.text_input.as_ref().map(|session| session.state)
    }

    /// Surface the input method is focused on.
    pub fn text_input_focus(&self) -> Option<Handle> {
        self.text_input.as_ref()?.focus
    }

    fn session_mut(&mut self) -> Result<&mut TextInputSession, BridgeError> {
        self.text_input
            .as_mut()
            .ok_or(BridgeError::MissingGlobal("zwp_text_input_manager_v3"))
    }

    /// Ask for input method activation. Sent with the next flush.
    pub fn enable_text_input(&mut self) -> Result<(), BridgeError> {
        let session = self.session_mut()?;
        session.queue(TextInputRequest::Enable);
        if session.state == TextInputState::Disabled {
            session.state = TextInputState::Enabled;
        }
        Ok(())
    }

    pub fn disable_text_input(&mut self) -> Result<(), BridgeError> {
        let session = self.session_mut()?;
        if session.state == TextInputState::Disabled && session.queued.is_empty() {
            return Ok(());
        }
        session.queue(TextInputRequest::Disable);
        Ok(())
    }

    fn queue_property(&mut self, request: TextInputRequest) -> Result<(), BridgeError> {
        let session = self.session_mut()?;
        if session.state == TextInputState::Disabled {
            log::trace!("Ignoring {:?} while text input is disabled", request);
            return Ok(());
        }
        session.queue(request);
        Ok(())
    }

    /// Text around the cursor. `cursor` and `anchor` are byte offsets.
    pub fn set_surrounding_text(&mut self, text: &str, cursor: i32, anchor: i32) -> Result<(), BridgeError> {
        self.queue_property(TextInputRequest::SetSurroundingText {
            text: text.to_owned(),
            cursor,
            anchor,
        })
    }

    pub fn set_content_type(&mut self, hint: u32, purpose: u32) -> Result<(), BridgeError> {
        self.queue_property(TextInputRequest::SetContentType { hint, purpose })
    }

    /// Cursor area in surface-local coordinates, used to place candidate popups.
    pub fn set_cursor_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), BridgeError> {
        self.queue_property(TextInputRequest::SetCursorRectangle { x, y, width, height })
    }

    /// Send queued changes followed by a single commit.
    ///
    /// Nothing is sent while a previous commit is waiting for its `done`;
    /// the queued changes go out together once it arrives.
    pub fn flush_text_input(&mut self) {
        let Some(session) = self.text_input.as_mut() else {
            return;
        };
        if session.queued.is_empty() || session.state == TextInputState::AwaitingDone {
            return;
        }
        let Some(object) = self
            .objects
            .get(session.handle)
            .filter(|bound| bound.kind == ObjectKind::TextInput)
            .map(|bound| bound.object.clone())
        else {
            return;
        };
        let disabling = session.queued.contains(&TextInputRequest::Disable);
        for request in session.queued.drain(..) {
            self.protocol.text_input(&object, &request);
        }
        self.protocol.text_input(&object, &TextInputRequest::Commit);
        session.serial = session.serial.wrapping_add(1);
        session.state = if disabling {
            TextInputState::Disabled
        } else {
            TextInputState::AwaitingDone
        };
        log::trace!("Text input commit #{}", session.serial);
    }

    /// Feed one `zwp_text_input_v3` event.
    pub fn on_text_input_event(&mut self, text_input: Handle, event: RawTextInputEvent) {
        if !self.resolve(text_input, ObjectKind::TextInput) {
            return;
        }
        if let RawTextInputEvent::Enter { surface } | RawTextInputEvent::Leave { surface } = event {
            if !self.resolve(surface, ObjectKind::Surface) {
                return;
            }
        }
        let Some(session) = self
            .text_input
            .as_mut()
            .filter(|session| session.handle == text_input)
        else {
            return;
        };

        let mut events = Vec::new();
        match event {
            RawTextInputEvent::Enter { surface } => {
                session.focus = Some(surface);
                events.push(BridgeEvent::TextInputFocus { surface, focused: true });
            },
            RawTextInputEvent::Leave { surface } => {
                session.focus = None;
                session.state = TextInputState::Disabled;
                session.queued.clear();
                session.incoming = Incoming::default();
                if std::mem::take(&mut session.preedit_visible) {
                    events.push(BridgeEvent::TextInputPreedit {
                        text: String::new(),
                        cursor: None,
                    });
                }
                events.push(BridgeEvent::TextInputFocus { surface, focused: false });
            },
            RawTextInputEvent::PreeditString {
                text,
                cursor_begin,
                cursor_end,
            } => {
                // Negative offsets hide the cursor.
                let cursor = (cursor_begin >= 0 && cursor_end >= 0).then_some((cursor_begin, cursor_end));
                session.incoming.preedit = Some((text.unwrap_or_default(), cursor));
            },
            RawTextInputEvent::CommitString { text } => {
                session.incoming.commit = Some(text.unwrap_or_default());
            },
            RawTextInputEvent::DeleteSurroundingText { before, after } => {
                session.incoming.delete = Some((before, after));
            },
            RawTextInputEvent::Done { serial } => {
                let incoming = std::mem::take(&mut session.incoming);
                if session.state == TextInputState::Disabled {
                    log::trace!("Dropping text input done {} while disabled", serial);
                } else if serial != session.serial {
                    log::trace!("Dropping stale text input done {} (expected {})", serial, session.serial);
                } else {
                    session.state = TextInputState::Enabled;
                    if let Some((before, after)) = incoming.delete {
                        events.push(BridgeEvent::TextInputDeleteSurrounding { before, after });
                    }
                    if let Some(text) = incoming.commit {
                        events.push(BridgeEvent::TextInputCommitted { text });
                    }
                    match incoming.preedit {
                        Some((text, cursor)) => {
                            session.preedit_visible = !text.is_empty();
                            events.push(BridgeEvent::TextInputPreedit { text, cursor });
                        },
                        None if session.preedit_visible => {
                            session.preedit_visible = false;
                            events.push(BridgeEvent::TextInputPreedit {
                                text: String::new(),
                                cursor: None,
                            });
                        },
                        None => {},
                    }
                }
            },
        }
        for event in events {
            self.emit(event);
        }
    }
}
