//! Use Cases
//!
//! Application-specific orchestration of the optimizer.

mod run_optimization;

pub use run_optimization::{
    OptimizationMode, OptimizationReport, OptimizeRequest, RunOptimizationUseCase, UseCaseError,
};
