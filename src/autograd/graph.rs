//! Computation graph for automatic differentiation.
//!
//! Tape-based recording of operations and the backward pass.

use std::collections::HashMap;
use std::sync::Arc;

use super::grad_fn::GradFn;
use super::tensor::{Tensor, TensorId};

/// Entry in the computation tape.
#[derive(Clone)]
pub(crate) struct TapeEntry {
    /// ID of the output tensor
    pub output_id: TensorId,

    /// Function to compute gradients
    pub grad_fn: Arc<dyn GradFn>,

    /// IDs of input tensors
    pub input_ids: Vec<TensorId>,
}

/// Computation graph that records operations for the backward pass.
///
/// Operations are appended in execution order, so walking the tape backwards
/// visits every output before the inputs that produced it.
#[allow(missing_debug_implementations)]
pub struct ComputationGraph {
    /// Recorded operations (tape)
    tape: Vec<TapeEntry>,

    /// Tensors seen as operation inputs; leaves receive gradients here
    tensors: HashMap<TensorId, Tensor>,
}

impl ComputationGraph {
    /// Create a new empty computation graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tape: Vec::new(),
            tensors: HashMap::new(),
        }
    }

    /// Clear all recorded operations and stored gradients.
    pub fn clear(&mut self) {
        self.tape.clear();
        self.tensors.clear();
    }

    /// Register an operation input.
    ///
    /// The first registration wins so that gradients already accumulated on a
    /// leaf are not lost when the same parameter feeds several operations.
    pub fn register_tensor(&mut self, tensor: Tensor) {
        self.tensors.entry(tensor.id()).or_insert(tensor);
    }

    /// Record an operation to the tape.
    pub fn record(
        &mut self,
        output_id: TensorId,
        grad_fn: Arc<dyn GradFn>,
        input_ids: Vec<TensorId>,
    ) {
        self.tape.push(TapeEntry {
            output_id,
            grad_fn,
            input_ids,
        });
    }

    /// Get a tensor by ID.
    #[must_use]
    pub fn get_tensor(&self, id: TensorId) -> Option<&Tensor> {
        self.tensors.get(&id)
    }

    /// Compute gradients via backpropagation.
    ///
    /// 1. Seed `grad_output` for the output tensor
    /// 2. Walk the tape in reverse
    /// 3. For each operation with a known output gradient, compute input gradients
    /// 4. Accumulate gradients for tensors used multiple times
    /// 5. Store the totals on leaf tensors that require gradients
    pub fn backward(&mut self, output_id: TensorId, grad_output: Tensor) {
        let mut grads: HashMap<TensorId, Tensor> = HashMap::new();
        grads.insert(output_id, grad_output);

        for entry in self.tape.iter().rev() {
            let Some(grad_out) = grads.get(&entry.output_id).cloned() else {
                continue;
            };

            let input_grads = entry.grad_fn.backward(&grad_out);

            for (input_id, input_grad) in entry.input_ids.iter().zip(input_grads) {
                match grads.get_mut(input_id) {
                    Some(existing) => {
                        for (a, b) in existing.data_mut().iter_mut().zip(input_grad.data()) {
                            *a += b;
                        }
                    }
                    None => {
                        grads.insert(*input_id, input_grad);
                    }
                }
            }
        }

        for (id, grad) in grads {
            if let Some(tensor) = self.tensors.get_mut(&id) {
                if tensor.requires_grad_enabled() && tensor.is_leaf() {
                    tensor.accumulate_grad(grad);
                }
            }
        }
    }

    /// Get the number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tape.len()
    }

    /// Check if the tape is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    /// Get gradient for a tensor by ID (after backward).
    #[must_use]
    pub fn get_grad(&self, id: TensorId) -> Option<Tensor> {
        self.tensors.get(&id).and_then(|t| t.grad().cloned())
    }

    /// Clear gradient for a specific tensor.
    pub fn clear_grad(&mut self, id: TensorId) {
        if let Some(tensor) = self.tensors.get_mut(&id) {
            tensor.clear_grad();
        }
    }
}

impl Default for ComputationGraph {
    fn default() -> Self {
        Self::new()
    }
}
