//! Structured field extraction
//!
//! Pulls name, email, phone, location and age out of free-text chat via a
//! schema-constrained completion call, then checks the result with simple
//! format rules.
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_core::extraction::InformationExtractor;
//!
//! let extractor = InformationExtractor::new(llm);
//! let record = extractor.extract_information("My name is Jane, email jane@x.com").await;
//! let report = extractor.validate_extraction(&record);
//! assert!(report.is_valid);
//! ```

mod extractor;
mod schema;
mod validation;

pub use extractor::InformationExtractor;
pub use schema::{
    EXTRACTION_FUNCTION_NAME, ExtractedRecord, ExtractionField, extraction_function,
    extraction_schema,
};
pub use validation::{AGE_RANGE, ValidationReport, validate_extraction};
