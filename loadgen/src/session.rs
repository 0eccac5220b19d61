use std::sync::Arc;

use rand::Rng;

use crate::error::TaskError;

/// Ids fetched once at session start. Never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct IdentifierPool {
    ids: Arc<[String]>,
}

impl IdentifierPool {
    #[must_use]
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids: ids.into() }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Uniform index in `[0, len)`.
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, TaskError> {
        if self.ids.is_empty() {
            return Err(TaskError::PoolOutOfRange { len: 0 });
        }
        Ok(rng.gen_range(0..self.ids.len()))
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, TaskError> {
        let idx = self.random_index(rng)?;
        self.ids
            .get(idx)
            .map(String::as_str)
            .ok_or(TaskError::PoolOutOfRange { len: self.ids.len() })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Active,
}

/// Per simulated user. Starts out `Initializing` with an empty pool.
#[derive(Debug, Clone)]
pub struct UserSession {
    state: SessionState,
    pool: IdentifierPool,
}

impl Default for UserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UserSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Initializing,
            pool: IdentifierPool::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Moves to `Active` with the fetched pool.
    pub fn activate(&mut self, pool: IdentifierPool) {
        self.pool = pool;
        self.state = SessionState::Active;
    }

    pub fn pool(&self) -> Result<&IdentifierPool, TaskError> {
        match self.state {
            SessionState::Active => Ok(&self.pool),
            SessionState::Initializing => Err(TaskError::SessionInactive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_pool_is_out_of_range() {
        let pool = IdentifierPool::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            pool.choose(&mut rng),
            Err(TaskError::PoolOutOfRange { len: 0 })
        ));
    }

    #[test]
    fn index_selection_is_uniform() {
        const N: usize = 8;
        const TRIALS: usize = 80_000;
        let pool = IdentifierPool::new((0..N).map(|i| format!("id-{i}")).collect());
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = [0usize; N];
        for _ in 0..TRIALS {
            hits[pool.random_index(&mut rng).unwrap()] += 1;
        }
        let expected = TRIALS / N;
        for (i, h) in hits.iter().enumerate() {
            // 10% band around 10_000, many standard deviations wide
            assert!(h.abs_diff(expected) < expected / 10, "index {i} hit {h} times");
        }
    }

    #[test]
    fn pool_unavailable_until_active() {
        let mut session = UserSession::new();
        assert_eq!(session.state(), SessionState::Initializing);
        assert!(matches!(session.pool(), Err(TaskError::SessionInactive)));
        session.activate(IdentifierPool::new(vec!["a".into()]));
        assert_eq!(session.state(), SessionState::Active);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(session.pool().unwrap().choose(&mut rng).unwrap(), "a");
    }
}
