//! Replay fingerprint over accepted gesture events.

use crate::debounce::GestureEvent;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sprout_types::Timestamp;

type Blake2b256 = Blake2b<U32>;

const DOMAIN: &[u8] = b"sprout/gesture-signature/v1";

/// Granularity of the capture timestamp folded into the signature.
const COARSE_SECS: u64 = 60;

/// Event offsets are rounded to this many milliseconds before hashing.
const OFFSET_BUCKET_MS: u64 = 100;

/// Deterministic hex signature of a capture.
///
/// Equal event sequences captured within the same minute hash identically,
/// which is what makes resubmitted recordings detectable.
pub fn gesture_signature(events: &[GestureEvent], captured_at: Timestamp) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(DOMAIN);
    hasher.update((captured_at.as_secs() / COARSE_SECS).to_be_bytes());
    hasher.update((events.len() as u32).to_be_bytes());
    for event in events {
        hasher.update([event.label.tag()]);
        hasher.update((event.offset_ms / OFFSET_BUCKET_MS).to_be_bytes());
    }
    hex::encode(hasher.finalize())
}
