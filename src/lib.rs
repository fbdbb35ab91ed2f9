pub mod batch;
pub mod config;
pub mod descriptor;
pub mod dtw;
pub mod error;
pub mod gesture;
pub mod history;
pub mod io;
pub mod pose;
pub mod recording;
pub mod relevance;
pub mod session;
pub mod synthetic;
pub mod template;
pub mod trajectory;
pub mod types;

pub use config::{EngineConfig, Strategy};
pub use error::{GestureError, Result};
pub use session::{Recognizer, RecordingSession};
pub use template::TemplateStore;
pub use types::{Frame, LandmarkSample, MatchResult};
