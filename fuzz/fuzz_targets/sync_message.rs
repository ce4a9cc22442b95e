//! Fuzz the sync message decoder and the child-side state transition
//!
//! Payloads arrive from any document sharing the channel, so decoding
//! must never panic and an accepted message must never produce an
//! invalid playback state.

#![no_main]

use libfuzzer_sys::fuzz_target;
use timewarp_core::PlaybackState;
use timewarp_sync::transition;
use timewarp_wire::SyncMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(Some(message)) = SyncMessage::decode_str(payload) else {
        return;
    };

    // Re-encoding an accepted message must decode to the same message
    let reencoded = message.encode();
    assert_eq!(SyncMessage::decode(&reencoded).ok().flatten(), Some(message));

    if let Ok(next) = transition(PlaybackState::default(), &message) {
        let speed = next.speed.value();
        assert!(!speed.is_nan() && speed >= 0.0);
        assert_eq!(next.paused, message.paused || speed == 0.0);
    }
});
