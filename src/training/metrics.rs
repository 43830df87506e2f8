use std::collections::VecDeque;

/// Result of a single episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub length: usize,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    total_updates: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            total_updates: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.total_updates += 1;
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    fn mean_over_episodes(&self, last_n: usize, f: impl Fn(&EpisodeResult) -> f32) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.episode_results.iter().rev().take(n).map(f).sum();
        sum / n as f32
    }

    /// Average episode reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        self.mean_over_episodes(last_n, |r| r.total_reward)
    }

    /// Average episode length over the last N episodes.
    pub fn average_length(&self, last_n: usize) -> f32 {
        self.mean_over_episodes(last_n, |r| r.length as f32)
    }

    /// Best episode reward still in the window.
    pub fn best_reward(&self) -> Option<f32> {
        self.episode_results
            .iter()
            .map(|r| r.total_reward)
            .fold(None, |acc: Option<f32>, r| Some(acc.map_or(r, |a| a.max(r))))
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_updates(&self) -> usize {
        self.total_updates
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(total_reward: f32, length: usize) -> EpisodeResult {
        EpisodeResult {
            total_reward,
            length,
        }
    }

    #[test]
    fn test_empty_metrics() {
        let m = TrainingMetrics::new();
        assert_eq!(m.average_reward(10), 0.0);
        assert_eq!(m.average_length(10), 0.0);
        assert_eq!(m.average_loss(10), 0.0);
        assert_eq!(m.best_reward(), None);
    }

    #[test]
    fn test_rolling_window_averages() {
        let mut m = TrainingMetrics::new();
        m.record_episode(episode(1.0, 10));
        m.record_episode(episode(3.0, 20));
        m.record_episode(episode(-1.0, 30));

        assert!((m.average_reward(2) - 1.0).abs() < 1e-6);
        assert!((m.average_reward(100) - 1.0).abs() < 1e-6);
        assert!((m.average_length(2) - 25.0).abs() < 1e-6);
        assert_eq!(m.best_reward(), Some(3.0));
    }

    #[test]
    fn test_capacity_caps_window_not_total() {
        let mut m = TrainingMetrics::with_capacity(3);
        for i in 0..10 {
            m.record_episode(episode(i as f32, 1));
            m.record_update(i as f32);
        }
        assert_eq!(m.total_episodes(), 10);
        assert_eq!(m.total_updates(), 10);
        // Window holds 7, 8, 9
        assert!((m.average_reward(100) - 8.0).abs() < 1e-6);
        assert!((m.average_loss(100) - 8.0).abs() < 1e-6);
    }
}
