pub mod gemini;
pub mod schema;
pub mod util;

pub use gemini::Gemini;
pub use schema::GeminiOutput;
