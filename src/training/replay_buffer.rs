use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One environment step as stored for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
    /// Actions legal in `next_state`; empty means every action is allowed.
    pub next_legal: Vec<usize>,
}

/// A prioritized sample: slot indices, the transitions in them, and their
/// normalized importance-sampling weights.
#[derive(Debug, Clone)]
pub struct SampledBatch {
    pub indices: Vec<usize>,
    pub transitions: Vec<Transition>,
    pub weights: Vec<f32>,
}

impl SampledBatch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Fixed-capacity ring buffer with a priority per slot.
///
/// A new transition overwrites the oldest slot and that slot's priority
/// together, so priorities never drift from their transitions.
pub struct PrioritizedReplayBuffer {
    buffer: Vec<Transition>,
    priorities: Vec<f32>,
    capacity: usize,
    position: usize,
    priority_epsilon: f32,
    rng: StdRng,
}

impl PrioritizedReplayBuffer {
    pub fn new(capacity: usize, priority_epsilon: f32) -> Self {
        Self::with_rng(capacity, priority_epsilon, StdRng::from_os_rng())
    }

    pub fn seeded(capacity: usize, priority_epsilon: f32, seed: u64) -> Self {
        Self::with_rng(capacity, priority_epsilon, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, priority_epsilon: f32, rng: StdRng) -> Self {
        let capacity = capacity.max(1);
        let priority_epsilon = if priority_epsilon.is_finite() && priority_epsilon > 0.0 {
            priority_epsilon
        } else {
            1e-5
        };
        PrioritizedReplayBuffer {
            buffer: Vec::with_capacity(capacity.min(4096)),
            priorities: Vec::with_capacity(capacity.min(4096)),
            capacity,
            position: 0,
            priority_epsilon,
            rng,
        }
    }

    /// Clamp non-positive or non-finite priorities to the floor.
    fn sanitize(&self, priority: f32) -> f32 {
        if priority.is_finite() && priority >= self.priority_epsilon {
            priority
        } else {
            self.priority_epsilon
        }
    }

    /// Add a transition with the given priority. Overwrites the oldest slot when full.
    pub fn push(&mut self, transition: Transition, priority: f32) {
        let priority = self.sanitize(priority);
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
            self.priorities.push(priority);
        } else {
            self.buffer[self.position] = transition;
            self.priorities[self.position] = priority;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Add a transition at the current maximum priority (1.0 when empty).
    pub fn push_max(&mut self, transition: Transition) {
        let priority = self.max_priority();
        self.push(transition, priority);
    }

    pub fn max_priority(&self) -> f32 {
        self.priorities
            .iter()
            .copied()
            .fold(None, |acc: Option<f32>, p| Some(acc.map_or(p, |a| a.max(p))))
            .unwrap_or(1.0)
    }

    /// Draw `batch_size` slots with replacement, slot `i` with probability
    /// `p_i^alpha / sum(p^alpha)`. Weights are `(N * P(i))^-beta`, divided by
    /// the largest weight in the batch. `None` when the buffer is empty.
    pub fn sample(&mut self, batch_size: usize, alpha: f32, beta: f32) -> Option<SampledBatch> {
        if self.buffer.is_empty() || batch_size == 0 {
            return None;
        }

        let scaled: Vec<f64> = self
            .priorities
            .iter()
            .map(|&p| (p as f64).powf(alpha as f64))
            .collect();
        let total: f64 = scaled.iter().sum();
        let dist = WeightedIndex::new(&scaled).ok()?;

        let n = self.buffer.len() as f64;
        let mut indices = Vec::with_capacity(batch_size);
        let mut weights = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let idx = dist.sample(&mut self.rng);
            let prob = scaled[idx] / total;
            indices.push(idx);
            weights.push((n * prob).powf(-(beta as f64)));
        }

        let max_weight = weights.iter().copied().fold(f64::MIN_POSITIVE, f64::max);
        let weights = weights.iter().map(|w| (w / max_weight) as f32).collect();
        let transitions = indices.iter().map(|&i| self.buffer[i].clone()).collect();

        Some(SampledBatch {
            indices,
            transitions,
            weights,
        })
    }

    /// Store `|error| + epsilon` for each sampled slot. Unknown slots are ignored.
    pub fn update_priorities(&mut self, indices: &[usize], errors: &[f32]) {
        for (&idx, &error) in indices.iter().zip(errors) {
            if idx < self.priorities.len() {
                self.priorities[idx] = self.sanitize(error.abs() + self.priority_epsilon);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&Transition> {
        self.buffer.get(index)
    }

    pub fn priority(&self, index: usize) -> Option<f32> {
        self.priorities.get(index).copied()
    }

    pub fn priority_epsilon(&self) -> f32 {
        self.priority_epsilon
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
