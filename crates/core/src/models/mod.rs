pub mod allocation;
pub mod settings;
pub mod validation;
pub mod valuation;
pub mod weights;
