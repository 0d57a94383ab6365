pub mod coverage;
pub mod identity;
pub mod input_normalizer;
pub mod renderer;
pub mod test_generation;
