pub mod use_cases;

pub use use_cases::coverage::CoverageAnalyzer;
pub use use_cases::input_normalizer::InputNormalizer;
pub use use_cases::test_generation::{GenerationOutcome, RenderedTestCase, TestGenerationUseCase};
