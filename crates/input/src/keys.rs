use evdev::Key as EvKey;

/// Keys the scene reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Move forward.
    W,
    /// Strafe left.
    A,
    /// Move backward.
    S,
    /// Strafe right.
    D,
    /// Turn left.
    H,
    /// Pitch down.
    J,
    /// Pitch up.
    K,
    /// Turn right.
    L,
    /// Quit.
    Q,
    /// Move up.
    Space,
    /// Move down. Either shift key.
    Shift,
}

impl Key {
    pub const ALL: [Key; 11] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::H,
        Key::J,
        Key::K,
        Key::L,
        Key::Q,
        Key::Space,
        Key::Shift,
    ];

    /// Map a Linux input key code to a scene key.
    pub fn from_code(code: u16) -> Option<Key> {
        let key = match EvKey::new(code) {
            EvKey::KEY_W => Key::W,
            EvKey::KEY_A => Key::A,
            EvKey::KEY_S => Key::S,
            EvKey::KEY_D => Key::D,
            EvKey::KEY_H => Key::H,
            EvKey::KEY_J => Key::J,
            EvKey::KEY_K => Key::K,
            EvKey::KEY_L => Key::L,
            EvKey::KEY_Q => Key::Q,
            EvKey::KEY_SPACE => Key::Space,
            EvKey::KEY_LEFTSHIFT | EvKey::KEY_RIGHTSHIFT => Key::Shift,
            _ => return None,
        };
        Some(key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Held/released flag per [`Key`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    held: [bool; Key::ALL.len()],
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn set(&mut self, key: Key, down: bool) {
        self.held[key.index()] = down;
    }

    /// Apply one key event. `value` follows evdev: 0 release, 1 press, 2 repeat.
    /// Returns `false` if the code is not one of ours.
    pub fn apply(&mut self, code: u16, value: i32) -> bool {
        match Key::from_code(code) {
            Some(key) => {
                self.set(key, value != 0);
                true
            }
            None => false,
        }
    }

    /// Release every key.
    pub fn clear(&mut self) {
        self.held = [false; Key::ALL.len()];
    }

    pub fn any_down(&self) -> bool {
        self.held.iter().any(|&h| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_repeat_release() {
        let mut keys = KeyState::new();
        let w = EvKey::KEY_W.code();

        assert!(keys.apply(w, 1));
        assert!(keys.is_down(Key::W));

        keys.apply(w, 2);
        assert!(keys.is_down(Key::W), "repeat keeps key held");

        keys.apply(w, 0);
        assert!(!keys.is_down(Key::W));
    }

    #[test]
    fn unmapped_codes_are_ignored() {
        let mut keys = KeyState::new();
        assert!(!keys.apply(EvKey::KEY_F12.code(), 1));
        assert!(!keys.apply(EvKey::KEY_ENTER.code(), 1));
        assert!(!keys.any_down());
    }

    #[test]
    fn both_shift_keys_map_to_shift() {
        let mut keys = KeyState::new();
        keys.apply(EvKey::KEY_RIGHTSHIFT.code(), 1);
        assert!(keys.is_down(Key::Shift));
        keys.apply(EvKey::KEY_LEFTSHIFT.code(), 0);
        assert!(!keys.is_down(Key::Shift));
    }

    #[test]
    fn every_key_has_a_code() {
        let codes = [
            EvKey::KEY_W,
            EvKey::KEY_A,
            EvKey::KEY_S,
            EvKey::KEY_D,
            EvKey::KEY_H,
            EvKey::KEY_J,
            EvKey::KEY_K,
            EvKey::KEY_L,
            EvKey::KEY_Q,
            EvKey::KEY_SPACE,
            EvKey::KEY_LEFTSHIFT,
        ];
        for (code, key) in codes.iter().zip(Key::ALL) {
            assert_eq!(Key::from_code(code.code()), Some(key));
        }
    }

    #[test]
    fn clear_releases_all() {
        let mut keys = KeyState::new();
        for key in Key::ALL {
            keys.set(key, true);
        }
        keys.clear();
        assert_eq!(keys, KeyState::default());
    }
}
