pub mod adapter;
pub mod comm;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod facts;
pub mod fixpoint;
pub mod goal;
pub mod graph;
pub mod metrics;
pub mod rules;
pub mod session;
pub mod stream;
pub mod subst;
pub mod symbol;
pub mod tensor;
pub mod term;
pub mod trace;
pub mod unify;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_utils;
