use burn::prelude::*;
use burn::tensor::TensorData;

use crate::error::LearnerError;
use crate::game::{Cell, GameState, Player, CELLS, SIZE};

/// Length of the Tic-Tac-Toe encoding produced by [`encode_state`].
pub const TIC_TAC_TOE_FEATURES: usize = 2 * CELLS;

/// Encode a Tic-Tac-Toe position as two planes relative to `perspective`.
///
/// Plane 0: `perspective`'s marks (1.0 where placed)
/// Plane 1: opponent's marks (1.0 where placed)
pub fn encode_state(state: &GameState, perspective: Player) -> Vec<f32> {
    let mut data = vec![0.0f32; TIC_TAC_TOE_FEATURES];
    let board = state.board();
    for row in 0..SIZE {
        for col in 0..SIZE {
            let idx = row * SIZE + col;
            match board.get(row, col) {
                Cell::Taken(owner) if owner == perspective => data[idx] = 1.0,
                Cell::Taken(_) => data[CELLS + idx] = 1.0,
                Cell::Empty => {}
            }
        }
    }
    data
}

/// Stack flat observations into a `[batch, dim]` tensor, checking every row.
pub fn rows_to_tensor<B: Backend>(
    rows: &[&[f32]],
    dim: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>, LearnerError> {
    let mut flat = Vec::with_capacity(rows.len() * dim);
    for row in rows {
        if row.len() != dim {
            return Err(LearnerError::StateDim {
                got: row.len(),
                expected: dim,
            });
        }
        flat.extend_from_slice(row);
    }
    Ok(Tensor::from_data(TensorData::new(flat, [rows.len(), dim]), device))
}

/// Pull a tensor back to host memory as a flat `Vec<f32>`.
pub fn tensor_to_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> Result<Vec<f32>, LearnerError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| LearnerError::Tensor(format!("{e:?}")))
}
