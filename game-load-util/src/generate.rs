//! Synthetic player data.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::NewPlayer;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const EMAIL_PROVIDERS: [&str; 4] = ["gmail", "yahoo", "microsoft", "hotmail"];

pub const NAME_LEN: usize = 15;
pub const PASSWORD_LEN: usize = 15;
pub const EMAIL_LOCAL_LEN: usize = 10;

/// Random string over `[a-z0-9]`.
pub fn alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())]))
        .collect()
}

#[inline]
pub fn player_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    alphanumeric(rng, NAME_LEN)
}

#[inline]
pub fn password<R: Rng + ?Sized>(rng: &mut R) -> String {
    alphanumeric(rng, PASSWORD_LEN)
}

pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let local = alphanumeric(rng, EMAIL_LOCAL_LEN);
    // Non-empty const array
    let provider = EMAIL_PROVIDERS.choose(rng).copied().unwrap_or("gmail");
    format!("{local}@{provider}.com")
}

pub fn new_player<R: Rng + ?Sized>(rng: &mut R) -> NewPlayer {
    NewPlayer::new(player_name(rng), email(rng), password(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn is_lower_alnum(s: &str) -> bool {
        s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }

    #[test]
    fn names_and_passwords_are_fifteen_lowercase_alnum() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let name = player_name(&mut rng);
            let pwd = password(&mut rng);
            assert_eq!(name.len(), 15);
            assert_eq!(pwd.len(), 15);
            assert!(is_lower_alnum(&name), "{name}");
            assert!(is_lower_alnum(&pwd), "{pwd}");
        }
    }

    #[test]
    fn emails_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            let email = email(&mut rng);
            let (local, domain) = email.split_once('@').unwrap();
            assert_eq!(local.len(), 10);
            assert!(is_lower_alnum(local), "{email}");
            let provider = domain.strip_suffix(".com").unwrap();
            assert!(EMAIL_PROVIDERS.contains(&provider), "{email}");
            seen.insert(provider.to_string());
        }
        assert_eq!(seen.len(), EMAIL_PROVIDERS.len());
    }

    #[test]
    fn new_player_fills_every_field() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = new_player(&mut rng);
        assert_eq!(p.player_name.len(), NAME_LEN);
        assert_eq!(p.password.len(), PASSWORD_LEN);
        assert!(p.email.contains('@'));
    }
}
