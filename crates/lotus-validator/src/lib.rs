//! The syntactic deny-list validator (C5): a tokenizer-aware scan of
//! already-bound SQL rejecting write keywords and multi-statement input.
//! Deliberately not a parser — `lotus-preflight` is where relation
//! authorization actually happens, by asking the engine.

pub mod deny;
pub mod tokenizer;

pub use deny::check;
