//! Output (monitor) tracking.
//!
//! Geometry, mode, scale and naming events accumulate into a pending copy
//! which only becomes visible on `done`.

use super::registry::InterfaceKind;
use super::{Bridge, ObjectKind, Protocol};
use crate::events::BridgeEvent;
use crate::handle::Handle;

/// Published description of an output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    /// Position in the global compositor space.
    pub x: i32,
    pub y: i32,
    /// Physical size in millimetres, 0 when unknown.
    pub physical_width: i32,
    pub physical_height: i32,
    /// Current mode in pixels.
    pub width: i32,
    pub height: i32,
    /// Refresh rate in mHz.
    pub refresh: i32,
    pub scale: i32,
    /// Raw `wl_output.transform` value.
    pub transform: i32,
    pub make: String,
    pub model: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            physical_width: 0,
            physical_height: 0,
            width: 0,
            height: 0,
            refresh: 0,
            scale: 1,
            transform: 0,
            make: String::new(),
            model: String::new(),
            name: None,
            description: None,
        }
    }
}

impl OutputInfo {
    /// Pixel density of the current mode.
    ///
    /// Computed over the diagonal so outputs reporting their physical size
    /// in the other orientation still give the right answer.
    pub fn pixels_per_mm(&self) -> Option<f32> {
        if self.physical_width <= 0 || self.physical_height <= 0 || self.width <= 0 || self.height <= 0 {
            return None;
        }
        let px = (self.width as f32).powi(2) + (self.height as f32).powi(2);
        let mm = (self.physical_width as f32).powi(2) + (self.physical_height as f32).powi(2);
        Some((px / mm).sqrt())
    }
}

/// Raw `wl_output` events.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Geometry {
        x: i32,
        y: i32,
        physical_width: i32,
        physical_height: i32,
        make: String,
        model: String,
        transform: i32,
    },
    Mode {
        current: bool,
        width: i32,
        height: i32,
        refresh: i32,
    },
    Scale(i32),
    Name(String),
    Description(String),
    Done,
}

#[derive(Debug, Default)]
pub(crate) struct OutputState {
    pending: OutputInfo,
    current: Option<OutputInfo>,
}

impl OutputState {
    /// Last complete snapshot.
    pub(crate) fn current(&self) -> Option<&OutputInfo> {
        self.current.as_ref()
    }
}

impl<P: Protocol> Bridge<P> {
    pub(crate) fn add_output(&mut self, output: Handle) {
        self.outputs.insert(output, OutputState::default());
    }

    pub(crate) fn remove_output(&mut self, output: Handle) {
        if self.outputs.remove(&output).is_none() {
            return;
        }
        let affected: Vec<Handle> = self
            .windows
            .iter_mut()
            .filter_map(|(surface, window)| {
                let before = window.outputs.len();
                window.outputs.retain(|entered| *entered != output);
                (window.outputs.len() != before).then_some(*surface)
            })
            .collect();
        for surface in affected {
            self.update_surface_scale(surface);
        }
        self.emit(BridgeEvent::OutputRemoved { output });
    }

    /// Feed one `wl_output` event.
    pub fn on_output_event(&mut self, output: Handle, event: OutputEvent) {
        if !self.resolve(output, ObjectKind::Global(InterfaceKind::Output)) {
            return;
        }
        let Some(state) = self.outputs.get_mut(&output) else {
            return;
        };
        let pending = &mut state.pending;
        match event {
            OutputEvent::Geometry {
                x,
                y,
                physical_width,
                physical_height,
                make,
                model,
                transform,
            } => {
                pending.x = x;
                pending.y = y;
                pending.physical_width = physical_width;
                pending.physical_height = physical_height;
                pending.make = make;
                pending.model = model;
                pending.transform = transform;
            },
            OutputEvent::Mode {
                current,
                width,
                height,
                refresh,
            } => {
                if current {
                    pending.width = width;
                    pending.height = height;
                    pending.refresh = refresh;
                }
            },
            OutputEvent::Scale(scale) => pending.scale = scale.max(1),
            OutputEvent::Name(name) => pending.name = Some(name),
            OutputEvent::Description(description) => pending.description = Some(description),
            OutputEvent::Done => {
                let info = pending.clone();
                log::debug!(
                    "Output {:?}: {}x{} @ {} mHz, scale {}",
                    output,
                    info.width,
                    info.height,
                    info.refresh,
                    info.scale
                );
                state.current = Some(info.clone());
                self.emit(BridgeEvent::OutputChanged { output, info });
                let on_output: Vec<Handle> = self
                    .windows
                    .iter()
                    .filter(|(_, window)| window.outputs.contains(&output))
                    .map(|(surface, _)| *surface)
                    .collect();
                for surface in on_output {
                    self.update_surface_scale(surface);
                }
            },
        }
    }

    /// Last complete description of `output`.
    pub fn output_info(&self, output: Handle) -> Option<&OutputInfo> {
        self.outputs.get(&output)?.current()
    }
}
