//! Multiple-choice challenge: the user's code hidden among decoys.

use rand::Rng;
use rand::seq::SliceRandom;

/// Buttons shown per challenge: the real code and two decoys.
pub const CHALLENGE_SIZE: usize = 3;

/// A two-digit code, uniform over `"10"..="99"`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(10..=99u8).to_string()
}

/// The real code plus distinct decoys, in uniformly random order.
pub fn build_challenge<R: Rng + ?Sized>(correct: &str, rng: &mut R) -> Vec<String> {
    let mut codes = Vec::with_capacity(CHALLENGE_SIZE);
    codes.push(correct.to_owned());

    while codes.len() < CHALLENGE_SIZE {
        let decoy = generate_code(rng);
        if !codes.contains(&decoy) {
            codes.push(decoy);
        }
    }

    codes.shuffle(rng);
    codes
}
