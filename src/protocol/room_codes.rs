use rand::RngExt;

/// Generate an uppercase-letter room code of the requested length.
///
/// Codes are letters only so they are easy to shout across a living room.
/// Uniqueness against live rooms is the registry's job (rejection sampling).
pub fn generate_room_code(length: usize) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..LETTERS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = LETTERS[idx] as char;
            ch
        })
        .collect()
}
