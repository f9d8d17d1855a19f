pub mod policies;
pub mod refine;
