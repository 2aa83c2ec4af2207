//! Random default nickname.
//!
//! Produces nicks like `hermit42`: a crustacean-ish word plus two digits,
//! short enough for the nine-character limit many networks still enforce.

use rand::RngExt;

const STEMS: &[&str] = &[
    "crab", "krill", "shrimp", "prawn", "hermit", "isopod", "molt", "claw", "pincer", "shell", "reef",
    "tide", "kelp", "brine",
];

/// Generate a random nickname of at most nine characters.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let stem = STEMS[rng.random_range(0..STEMS.len())];
    let num: u8 = rng.random_range(0..100);
    format!("{}{:02}", stem, num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_nick_limit() {
        for _ in 0..200 {
            let nick = generate_nickname();
            assert!(nick.len() <= 9, "{} too long", nick);
            assert!(nick.chars().next().is_some_and(|c| c.is_ascii_alphabetic()));
        }
    }
}
