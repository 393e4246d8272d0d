//! Reverse-mode automatic differentiation for training the embedding table,
//! the content generator and the pair discriminator.
//!
//! # Architecture
//!
//! Define-by-run (dynamic) computational graph:
//! - Operations are recorded to a thread-local tape during the forward pass
//! - Gradients are computed in reverse order during the backward pass
//! - Gradients of tensors used more than once are accumulated
//!
//! The tape grows until [`clear_graph`] is called. A training driver clears
//! it once per step, after the optimizer has consumed the gradients.
//!
//! # Example
//!
//! ```
//! use garrec::autograd::{clear_graph, get_grad, Tensor};
//!
//! clear_graph();
//! let x = Tensor::from_slice(&[1.0, 2.0, 3.0]).requires_grad();
//! let w = Tensor::from_slice(&[0.5, 0.5, 0.5]);
//!
//! let y = x.mul(&w).sum();
//! y.backward();
//!
//! let grad = get_grad(x.id()).expect("x is a leaf that requires grad");
//! assert_eq!(grad.data(), &[0.5, 0.5, 0.5]);
//! ```
//!
//! # References
//!
//! - Baydin, A. G., et al. (2018). Automatic differentiation in machine learning: a survey. JMLR.
//! - Griewank, A., & Walther, A. (2008). Evaluating derivatives. SIAM.

pub(crate) mod grad_fn;
mod graph;
mod ops;
mod tensor;

pub use grad_fn::GradFn;
pub use graph::ComputationGraph;
pub use tensor::{Tensor, TensorId};

use std::cell::RefCell;

thread_local! {
    /// Global computation graph for the current thread.
    static GRAPH: RefCell<ComputationGraph> = RefCell::new(ComputationGraph::new());

    /// Flag to disable gradient tracking (for inference).
    static GRAD_ENABLED: RefCell<bool> = const { RefCell::new(true) };
}

/// Execute a closure without gradient tracking.
///
/// Scoring during evaluation should run inside this so nothing is taped.
///
/// ```
/// use garrec::autograd::{no_grad, Tensor};
///
/// let x = Tensor::from_slice(&[1.0, 2.0]).requires_grad();
/// let y = no_grad(|| x.mul(&x).sum());
/// assert!(!y.requires_grad_enabled());
/// ```
pub fn no_grad<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    GRAD_ENABLED.with(|enabled| {
        let prev = *enabled.borrow();
        *enabled.borrow_mut() = false;
        let result = f();
        *enabled.borrow_mut() = prev;
        result
    })
}

/// Check if gradient tracking is currently enabled.
#[must_use]
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(|enabled| *enabled.borrow())
}

/// Run a closure against the thread-local computation graph.
pub(crate) fn with_graph<F, R>(f: F) -> R
where
    F: FnOnce(&mut ComputationGraph) -> R,
{
    GRAPH.with(|graph| f(&mut graph.borrow_mut()))
}

/// Clear the computation graph (called after the optimizer step).
pub fn clear_graph() {
    GRAPH.with(|graph| graph.borrow_mut().clear());
}

/// Get gradient for a tensor by ID from the graph.
#[must_use]
pub fn get_grad(id: TensorId) -> Option<Tensor> {
    with_graph(|graph| graph.get_grad(id))
}

/// Clear gradient for a specific tensor by ID.
pub fn clear_grad(id: TensorId) {
    with_graph(|graph| graph.clear_grad(id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_grad_context() {
        assert!(is_grad_enabled());

        no_grad(|| {
            assert!(!is_grad_enabled());
        });

        assert!(is_grad_enabled());
    }

    #[test]
    fn test_nested_no_grad() {
        no_grad(|| {
            no_grad(|| {
                assert!(!is_grad_enabled());
            });
            assert!(!is_grad_enabled());
        });

        assert!(is_grad_enabled());
    }

    #[test]
    fn test_no_grad_records_nothing() {
        clear_graph();
        let x = Tensor::from_slice(&[1.0, 2.0]).requires_grad();
        let _ = no_grad(|| x.sum());
        assert!(with_graph(|g| g.is_empty()));
    }

    #[test]
    fn test_clear_graph_drops_gradients() {
        clear_graph();
        let x = Tensor::from_slice(&[3.0]).requires_grad();
        x.mul(&x).sum().backward();
        assert!(get_grad(x.id()).is_some());

        clear_graph();
        assert!(get_grad(x.id()).is_none());
    }
}
