pub mod use_cases;

pub use use_cases::default_provider::{DefaultProvider, DefaultProviderConfig};
pub use use_cases::dispatcher::{AnalysisDispatcher, DispatchOutcome};
pub use use_cases::investigation::{Investigation, InvestigationConfig, InvestigationUseCase};
pub use use_cases::narrative_templates::NarrativeTemplate;
