//! A [`KeyEventSource`] backed by a Linux `/dev/input/eventN` device node
//! (spec.md §1: specified only as a key-event source, the evdev
//! integration itself is a host concern).
//!
//! Requires the `evdev` feature.
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use evdev_rs::enums::{EventCode, EV_KEY};
use evdev_rs::{Device, ReadFlag, ReadStatus};

use super::{KeyEvent, KeyEventSource};

/// QWERTY-to-matrix layout for the keys the console actually wires up.
/// Keys absent from this table are ignored by [`EvdevSource::poll`].
const KEYMAP: &[(EV_KEY, usize, usize)] = &[
    (EV_KEY::KEY_1, 0, 0), (EV_KEY::KEY_2, 1, 0), (EV_KEY::KEY_3, 2, 0),
    (EV_KEY::KEY_4, 3, 0), (EV_KEY::KEY_5, 4, 0), (EV_KEY::KEY_6, 5, 0),
    (EV_KEY::KEY_7, 6, 0), (EV_KEY::KEY_8, 7, 0),
    (EV_KEY::KEY_Q, 0, 1), (EV_KEY::KEY_W, 1, 1), (EV_KEY::KEY_E, 2, 1),
    (EV_KEY::KEY_R, 3, 1), (EV_KEY::KEY_T, 4, 1), (EV_KEY::KEY_Y, 5, 1),
    (EV_KEY::KEY_U, 6, 1), (EV_KEY::KEY_I, 7, 1),
    (EV_KEY::KEY_A, 0, 2), (EV_KEY::KEY_S, 1, 2), (EV_KEY::KEY_D, 2, 2),
    (EV_KEY::KEY_F, 3, 2), (EV_KEY::KEY_G, 4, 2), (EV_KEY::KEY_H, 5, 2),
    (EV_KEY::KEY_J, 6, 2), (EV_KEY::KEY_K, 7, 2),
    (EV_KEY::KEY_Z, 0, 3), (EV_KEY::KEY_X, 1, 3), (EV_KEY::KEY_C, 2, 3),
    (EV_KEY::KEY_V, 3, 3), (EV_KEY::KEY_B, 4, 3), (EV_KEY::KEY_N, 5, 3),
    (EV_KEY::KEY_M, 6, 3), (EV_KEY::KEY_COMMA, 7, 3),
    (EV_KEY::KEY_LEFTSHIFT, 0, 4), (EV_KEY::KEY_RIGHTSHIFT, 0, 4),
    (EV_KEY::KEY_SPACE, 1, 4),
    (EV_KEY::KEY_ENTER, 5, 4),
    (EV_KEY::KEY_LEFTCTRL, 6, 4), (EV_KEY::KEY_RIGHTCTRL, 6, 4),
    (EV_KEY::KEY_LEFTALT, 7, 4), (EV_KEY::KEY_RIGHTALT, 7, 4),
    (EV_KEY::KEY_9, 0, 5), (EV_KEY::KEY_O, 2, 5), (EV_KEY::KEY_L, 6, 5),
    (EV_KEY::KEY_0, 0, 6), (EV_KEY::KEY_P, 2, 6),
    (EV_KEY::KEY_MINUS, 4, 6), (EV_KEY::KEY_SEMICOLON, 5, 6),
    (EV_KEY::KEY_SLASH, 6, 6), (EV_KEY::KEY_DOT, 7, 6),
];

fn lookup(code: &EV_KEY) -> Option<(usize, usize)> {
    KEYMAP.iter().find(|(key, ..)| key == code).map(|&(_, row, col)| (row, col))
}

/// Reads key-down/key-up events off a device node opened non-blocking, so
/// [`poll`][KeyEventSource::poll] never stalls the host's frame loop.
pub struct EvdevSource {
    device: Device,
}

impl EvdevSource {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        let device = Device::new_from_file(file)?;
        Ok(EvdevSource { device })
    }
}

impl KeyEventSource for EvdevSource {
    fn poll(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        loop {
            match self.device.next_event(ReadFlag::NORMAL) {
                Ok((ReadStatus::Success, event)) => {
                    if let EventCode::EV_KEY(ref key) = event.event_code {
                        if event.value == 2 {
                            continue; // key-repeat, matrix state is already set
                        }
                        if let Some((row, column)) = lookup(key) {
                            events.push(KeyEvent { row, column, pressed: event.value == 1 });
                        }
                    }
                }
                Ok((ReadStatus::Sync, _)) => continue,
                Err(_) => break, // EAGAIN (no more queued events) or a real I/O error
            }
        }
        events
    }
}
