//! Mapping host key events onto the 8x8 matrix coordinates
//! [`ti994a::peripherals::keyboard::Keyboard`] models (spec.md §1 calls
//! the Linux evdev source out of scope as anything but a key-event
//! source).
use ti994a::peripherals::keyboard::Keyboard;

#[cfg(feature = "evdev")]
pub mod evdev;

/// A single key transition: `(row, column, pressed)`, already resolved to
/// matrix coordinates by whatever host-specific keymap produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub row: usize,
    pub column: usize,
    pub pressed: bool,
}

/// A source of [`KeyEvent`]s, polled once per host frame.
pub trait KeyEventSource {
    /// Returns every key transition observed since the last poll, in
    /// order. Implementations that can't distinguish ordering (batched
    /// OS event queues) may return them in arrival order instead.
    fn poll(&mut self) -> Vec<KeyEvent>;
}

/// Drains every pending event from `source` into `keyboard`.
pub fn apply_events(keyboard: &mut Keyboard, source: &mut impl KeyEventSource) {
    for event in source.poll() {
        keyboard.set_key(event.row, event.column, event.pressed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<KeyEvent>);

    impl KeyEventSource for FixedSource {
        fn poll(&mut self) -> Vec<KeyEvent> {
            std::mem::take(&mut self.0)
        }
    }

    #[test]
    fn applies_every_pending_event() {
        let mut keyboard = Keyboard::new();
        let mut source = FixedSource(vec![
            KeyEvent { row: 4, column: 2, pressed: true },
            KeyEvent { row: 0, column: 0, pressed: true },
        ]);
        apply_events(&mut keyboard, &mut source);
        assert!(keyboard.is_pressed(4, 2));
        assert!(keyboard.is_pressed(0, 0));
        assert!(source.0.is_empty());
    }
}
