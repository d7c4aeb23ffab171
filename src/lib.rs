pub mod analysis;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod form;
pub mod model;
pub mod prompt;

pub use analysis::{AnalysisClient, AnalysisError, AnalysisResult};
pub use client::{RecordClient, TransportError};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardState, Stats, View};
pub use form::{ArtikelForm, DeleteConfirm, FormPhase};
pub use model::logical::Record;
