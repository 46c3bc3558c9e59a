pub mod gemini;

pub use gemini::GeminiRecommender;
