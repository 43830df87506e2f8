use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::DqnLearner;
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::{CheckpointError, LearnerError};

const LATEST_FILE: &str = "latest";
const METADATA_FILE: &str = "metadata.json";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 3,
        }
    }
}

/// A checkpoint directory together with its parsed metadata.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Self {
        fs::create_dir_all(&config.checkpoint_dir).ok();
        CheckpointManager { config }
    }

    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    /// Save the learner into `checkpoint_{episode:07}`.
    ///
    /// Everything is written to a `.tmp` sibling first and renamed into place,
    /// then the `latest` pointer is updated and old checkpoints are pruned.
    pub fn save_checkpoint(
        &self,
        learner: &DqnLearner,
        environment: &str,
        metrics: &CheckpointMetrics,
        episode: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", episode);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        // Networks and training_state.json
        learner.save(&tmp_dir).map_err(|e| match e {
            LearnerError::Checkpoint(inner) => inner,
            other => CheckpointError::ModelSave(other.to_string()),
        })?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = CheckpointMetadata {
            episode,
            timestamp,
            environment: environment.to_string(),
            metrics: metrics.clone(),
            epsilon: learner.epsilon(),
            hyperparameters: learner.config().clone(),
        };
        let meta_json = serde_json::to_string_pretty(&metadata)?;
        fs::write(tmp_dir.join(METADATA_FILE), meta_json)?;

        // Atomic rename
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest(&dir_name)?;
        self.prune_old_checkpoints()?;

        log::info!("saved checkpoint {}", final_dir.display());
        Ok(final_dir)
    }

    /// Read the metadata of a checkpoint directory.
    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        if !dir.is_dir() {
            return Err(CheckpointError::DirNotFound(dir.to_path_buf()));
        }
        let metadata = read_metadata(&dir.join(METADATA_FILE))?;
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
        })
    }

    /// Directory named by the `latest` pointer file.
    pub fn latest_dir(&self) -> Result<PathBuf, CheckpointError> {
        let pointer = self.config.checkpoint_dir.join(LATEST_FILE);
        if !pointer.is_file() {
            return Err(CheckpointError::NoLatest(self.config.checkpoint_dir.clone()));
        }
        let name = fs::read_to_string(&pointer)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CheckpointError::NoLatest(self.config.checkpoint_dir.clone()));
        }
        Ok(self.config.checkpoint_dir.join(name))
    }

    /// Restore the learner from the latest checkpoint and return its metadata.
    pub fn load_latest(&self, learner: &mut DqnLearner) -> Result<CheckpointData, CheckpointError> {
        let data = self.load_checkpoint(&self.latest_dir()?)?;
        learner.load(&data.path).map_err(|e| match e {
            LearnerError::Checkpoint(inner) => inner,
            other => CheckpointError::ModelLoad(other.to_string()),
        })?;
        log::info!(
            "resumed from {} (episode {})",
            data.path.display(),
            data.metadata.episode
        );
        Ok(data)
    }

    /// List all checkpoints sorted by episode (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointData>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push(CheckpointData { path, metadata });
            }
        }
        results.sort_by_key(|c| c.metadata.episode);
        Ok(results)
    }

    /// Prune old checkpoints, keeping the union of the last N and best N by
    /// average reward.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: HashSet<usize> =
            (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_reward: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.metadata.metrics.average_reward))
            .collect();
        by_reward.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        for (i, _) in by_reward.iter().take(self.config.keep_best_n) {
            keep.insert(*i);
        }

        for (i, c) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                log::debug!("pruning checkpoint {}", c.path.display());
                fs::remove_dir_all(&c.path)?;
            }
        }

        Ok(())
    }

    /// Point `latest` at the given checkpoint directory name.
    fn update_latest(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let pointer = self.config.checkpoint_dir.join(LATEST_FILE);
        let tmp = self.config.checkpoint_dir.join(format!("{LATEST_FILE}.tmp"));
        fs::write(&tmp, dir_name)?;
        fs::rename(&tmp, &pointer)?;
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}
