//! Record identifier generation
//!
//! Identifiers are six uppercase alphanumeric characters. A candidate is
//! checked against the target collection and redrawn on collision, up to a
//! configured number of attempts.

use crate::storage::{Collection, DocumentStore};
use crate::utils::error::{DashboardError, Result};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Characters an identifier is drawn from
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identifier length
pub const ID_LENGTH: usize = 6;

/// An identifier known to be free at generation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedId {
    pub id: String,
    /// Candidates drawn, including the accepted one
    pub attempts: u32,
}

/// Collision-checked identifier source
#[derive(Debug)]
pub struct IdGenerator {
    rng: Mutex<StdRng>,
    max_attempts: u32,
}

impl IdGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Deterministic sequence, for tests
    pub fn with_seed(seed: u64, max_attempts: u32) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one candidate without checking the store
    pub fn candidate(&self) -> String {
        let mut rng = self.rng.lock();
        (0..ID_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Draw candidates until one is not present in `collection`
    pub async fn generate(
        &self,
        store: &dyn DocumentStore,
        collection: Collection,
    ) -> Result<GeneratedId> {
        for attempt in 1..=self.max_attempts {
            let id = self.candidate();
            if !store.exists(collection, &id).await? {
                debug!("Generated {} id {} after {} attempt(s)", collection, id, attempt);
                return Ok(GeneratedId {
                    id,
                    attempts: attempt,
                });
            }
            debug!("Generated {} id {} is taken, retrying", collection, id);
        }

        warn!(
            "Could not find a free {} id in {} attempts",
            collection, self.max_attempts
        );
        Err(DashboardError::internal(format!(
            "Could not generate a unique id for {} after {} attempts",
            collection, self.max_attempts
        )))
    }
}

/// Whether `id` has the shape of a generated identifier
pub fn is_generated_id(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| ALPHABET.contains(&b))
}
