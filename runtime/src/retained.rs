//! State that survives reset.
//!
//! A small fixed block the platform maps onto battery-backed RAM or a
//! flash page. The first word is a magic flag distinguishing a factory
//! first run from every later boot; the rest is the power-cycle counter,
//! the device UID and the authentication keys.

use byte_slice_cast::{AsByteSlice, AsMutByteSlice};
use config::identity::{
    AUTHENTICATION_KEY_BYTE_LENGTH, FIRST_RUN_CLEAR, FIRST_RUN_SET, UID_BYTE_LENGTH,
};

const FIRST_RUN_OFFSET: usize = 0;
const POWER_CYCLES_OFFSET: usize = 1;
const UID_OFFSET: usize = 2;
const SECRET_OFFSET: usize = UID_OFFSET + UID_BYTE_LENGTH / 4;
const SHARED_OFFSET: usize = SECRET_OFFSET + AUTHENTICATION_KEY_BYTE_LENGTH / 4;
const WORD_COUNT: usize = SHARED_OFFSET + AUTHENTICATION_KEY_BYTE_LENGTH / 4;

/// The persistent block, stored as words so the platform can stream it to
/// its backing store a register at a time.
#[derive(Clone)]
pub struct RetainedState {
    words: [u32; WORD_COUNT],
}

impl RetainedState {
    /// A factory-fresh block: first-run set, nothing counted, no keys.
    pub fn new() -> Self {
        let mut state = Self {
            words: [0; WORD_COUNT],
        };
        state.words[FIRST_RUN_OFFSET] = FIRST_RUN_SET;
        state
    }

    /// Rebuild from words previously read out of the backing store.
    pub fn from_words(words: &[u32]) -> Option<Self> {
        let words: [u32; WORD_COUNT] = words.try_into().ok()?;
        Some(Self { words })
    }

    pub fn as_words(&self) -> &[u32] {
        &self.words
    }

    pub fn is_first_run(&self) -> bool {
        self.words[FIRST_RUN_OFFSET] == FIRST_RUN_SET
    }

    /// Mark the first run consumed. Returns the previous state of the
    /// flag.
    pub fn clear_first_run(&mut self) -> bool {
        let was = self.is_first_run();
        self.words[FIRST_RUN_OFFSET] = FIRST_RUN_CLEAR;
        was
    }

    pub fn power_cycles(&self) -> u32 {
        self.words[POWER_CYCLES_OFFSET]
    }

    pub fn bump_power_cycles(&mut self) -> u32 {
        self.words[POWER_CYCLES_OFFSET] = self.words[POWER_CYCLES_OFFSET].wrapping_add(1);
        self.words[POWER_CYCLES_OFFSET]
    }

    pub fn uid(&self) -> [u8; UID_BYTE_LENGTH] {
        let mut out = [0u8; UID_BYTE_LENGTH];
        out.copy_from_slice(
            self.words[UID_OFFSET..SECRET_OFFSET].as_byte_slice(),
        );
        out
    }

    pub fn set_uid(&mut self, uid: &[u8; UID_BYTE_LENGTH]) {
        self.words[UID_OFFSET..SECRET_OFFSET]
            .as_mut_byte_slice()
            .copy_from_slice(uid);
    }

    pub fn secret_key(&self) -> [u8; AUTHENTICATION_KEY_BYTE_LENGTH] {
        let mut out = [0u8; AUTHENTICATION_KEY_BYTE_LENGTH];
        out.copy_from_slice(self.words[SECRET_OFFSET..SHARED_OFFSET].as_byte_slice());
        out
    }

    pub fn set_secret_key(&mut self, key: &[u8; AUTHENTICATION_KEY_BYTE_LENGTH]) {
        self.words[SECRET_OFFSET..SHARED_OFFSET]
            .as_mut_byte_slice()
            .copy_from_slice(key);
    }

    pub fn shared_key(&self) -> [u8; AUTHENTICATION_KEY_BYTE_LENGTH] {
        let mut out = [0u8; AUTHENTICATION_KEY_BYTE_LENGTH];
        out.copy_from_slice(self.words[SHARED_OFFSET..].as_byte_slice());
        out
    }

    pub fn set_shared_key(&mut self, key: &[u8; AUTHENTICATION_KEY_BYTE_LENGTH]) {
        self.words[SHARED_OFFSET..]
            .as_mut_byte_slice()
            .copy_from_slice(key);
    }

}

impl Default for RetainedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_state_runs_first_once() {
        let mut state = RetainedState::new();
        assert!(state.is_first_run());
        assert!(state.clear_first_run());
        assert!(!state.is_first_run());
        assert!(!state.clear_first_run());
    }

    #[test]
    fn power_cycles_count_up() {
        let mut state = RetainedState::new();
        assert_eq!(state.power_cycles(), 0);
        assert_eq!(state.bump_power_cycles(), 1);
        assert_eq!(state.bump_power_cycles(), 2);
    }

    #[test]
    fn word_round_trip_preserves_everything() {
        let mut state = RetainedState::new();
        state.set_uid(&[7u8; UID_BYTE_LENGTH]);
        state.set_secret_key(&[1u8; AUTHENTICATION_KEY_BYTE_LENGTH]);
        state.set_shared_key(&[2u8; AUTHENTICATION_KEY_BYTE_LENGTH]);
        state.bump_power_cycles();

        let copy = RetainedState::from_words(state.as_words()).unwrap();
        assert_eq!(copy.uid(), [7u8; UID_BYTE_LENGTH]);
        assert_eq!(copy.secret_key(), [1u8; AUTHENTICATION_KEY_BYTE_LENGTH]);
        assert_eq!(copy.shared_key(), [2u8; AUTHENTICATION_KEY_BYTE_LENGTH]);
        assert_eq!(copy.power_cycles(), 1);
        assert!(copy.is_first_run());

        assert!(RetainedState::from_words(&[0u32; 3]).is_none());
    }

    #[test]
    fn layout_is_stable() {
        // 4 + 4 + 16 + 32 + 32 bytes
        assert_eq!(WORD_COUNT * 4, 88);
        assert_eq!(SECRET_OFFSET, 6);
        assert_eq!(SHARED_OFFSET, 14);
    }
}
