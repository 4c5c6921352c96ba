//! Sortable post identifiers.
//!
//! 26-character Crockford base32 strings: 48 bits of Unix milliseconds
//! followed by 80 random bits. Ids from one generator are strictly
//! increasing, even within the same millisecond.

use parking_lot::Mutex;

use crate::rng::SimRng;
use crate::time::now_millis;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const RANDOM_BITS: u32 = 80;
const RANDOM_MASK: u128 = (1u128 << RANDOM_BITS) - 1;
const ENCODED_LEN: usize = 26;

#[derive(Debug)]
struct LastId {
    millis: u64,
    random: u128,
}

/// Monotonic id source. Randomness comes from an OS-seeded generator, so ids
/// never disturb the seeded generation streams.
#[derive(Debug)]
pub struct IdGenerator {
    state: Mutex<(SimRng, Option<LastId>)>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new((SimRng::from_entropy(), None)),
        }
    }

    pub fn next_id(&self) -> String {
        self.next_id_at(now_millis())
    }

    /// Id for the given timestamp; clamps to the previous timestamp if the
    /// clock went backwards.
    pub fn next_id_at(&self, millis: u64) -> String {
        let mut guard = self.state.lock();
        let (rng, last) = &mut *guard;

        let (millis, random) = match last {
            Some(prev) if millis <= prev.millis => {
                let bumped = (prev.random + 1) & RANDOM_MASK;
                if bumped == 0 {
                    (prev.millis + 1, 0)
                } else {
                    (prev.millis, bumped)
                }
            }
            _ => {
                let hi = rng.next_u64() as u128;
                let lo = rng.next_u64() as u128;
                (millis, ((hi << 64) | lo) & RANDOM_MASK)
            }
        };

        *last = Some(LastId { millis, random });
        encode(millis, random)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(millis: u64, random: u128) -> String {
    let mut value = ((millis as u128 & 0xFFFF_FFFF_FFFF) << RANDOM_BITS) | random;
    let mut out = [0u8; ENCODED_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

/// Milliseconds encoded in an id's first ten characters.
pub fn id_millis(id: &str) -> Option<u64> {
    if id.len() != ENCODED_LEN {
        return None;
    }
    let mut value: u64 = 0;
    for ch in id[..10].bytes() {
        let digit = ALPHABET.iter().position(|&a| a == ch)? as u64;
        value = (value << 5) | digit;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let id = IdGenerator::new().next_id();
        assert_eq!(id.len(), 26);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_monotonic_within_millisecond() {
        let ids = IdGenerator::new();
        let a = ids.next_id_at(1_000);
        let b = ids.next_id_at(1_000);
        let c = ids.next_id_at(999);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_sorts_by_time() {
        let ids = IdGenerator::new();
        let early = ids.next_id_at(1_000);
        let late = ids.next_id_at(2_000);
        assert!(early < late);
        assert_eq!(id_millis(&early), Some(1_000));
        assert_eq!(id_millis(&late), Some(2_000));
    }

    #[test]
    fn test_id_millis_rejects_garbage() {
        assert_eq!(id_millis("short"), None);
        assert_eq!(id_millis("UUUUUUUUUUUUUUUUUUUUUUUUUU"), None);
    }
}
