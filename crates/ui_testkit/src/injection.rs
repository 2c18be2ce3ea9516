//! Pointer event sequences.
//!
//! Describes which events a real pointer produces for an interaction;
//! [`crate::user`] plays them against an element.

use crate::event::EventKind;

/// One step of a pointer interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Dispatch an event of this kind to the target.
    Dispatch(EventKind),
    /// Move focus to the target's nearest focusable ancestor-or-self,
    /// unless the preceding `mousedown` was default-prevented.
    Focus,
}

/// An ordered list of steps.
#[derive(Clone, Debug, Default)]
pub struct EventSequence {
    steps: Vec<Step>,
}

impl EventSequence {
    /// Create a new empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    fn dispatch_all(&mut self, kinds: &[EventKind]) {
        self.steps
            .extend(kinds.iter().copied().map(Step::Dispatch));
    }

    fn extend(&mut self, other: EventSequence) {
        self.steps.extend(other.steps);
    }

    /// Steps in dispatch order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Event kinds in dispatch order, without focus steps.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Dispatch(kind) => Some(*kind),
                Step::Focus => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Pointer arriving over the target.
    pub fn hover() -> EventSequence {
        let mut seq = Self::new();
        seq.dispatch_all(&[
            EventKind::PointerOver,
            EventKind::PointerEnter,
            EventKind::MouseOver,
            EventKind::MouseEnter,
            EventKind::PointerMove,
            EventKind::MouseMove,
        ]);
        seq
    }

    /// Pointer leaving the target.
    pub fn unhover() -> EventSequence {
        let mut seq = Self::new();
        seq.dispatch_all(&[
            EventKind::PointerMove,
            EventKind::MouseMove,
            EventKind::PointerOut,
            EventKind::PointerLeave,
            EventKind::MouseOut,
            EventKind::MouseLeave,
        ]);
        seq
    }

    /// Button press and release, focusing between down and up.
    pub fn press() -> EventSequence {
        let mut seq = Self::new();
        seq.dispatch_all(&[EventKind::PointerDown, EventKind::MouseDown]);
        seq.push(Step::Focus);
        seq.dispatch_all(&[EventKind::PointerUp, EventKind::MouseUp, EventKind::Click]);
        seq
    }

    /// A full click: hover (unless skipped) then press.
    pub fn click(skip_hover: bool) -> EventSequence {
        let mut seq = if skip_hover {
            Self::new()
        } else {
            Self::hover()
        };
        seq.extend(Self::press());
        seq
    }

    /// Two presses followed by `dblclick`.
    pub fn double_click(skip_hover: bool) -> EventSequence {
        let mut seq = Self::click(skip_hover);
        seq.dispatch_all(&[
            EventKind::PointerDown,
            EventKind::MouseDown,
            EventKind::PointerUp,
            EventKind::MouseUp,
            EventKind::Click,
            EventKind::DblClick,
        ]);
        seq
    }
}
