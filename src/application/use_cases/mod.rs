pub mod default_provider;
pub mod dispatcher;
pub mod investigation;
pub mod narrative_templates;
