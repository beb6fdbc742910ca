mod classifier;
mod client;
mod inference;

pub use classifier::{ChangeClassifier, ClassificationError};
pub use client::OpenAiClient;
