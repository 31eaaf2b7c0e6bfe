//! Generative-content synthesis pipeline.
//!
//! profile + kind → [`prompt_builder`] → [`provider::GenerativeClient`] → raw text →
//! [`fields`] (built on [`sections`]) → [`assembler`] (with [`fallback`]) → record.
//! Everything except the provider call is pure.

pub mod assembler;
pub mod fallback;
pub mod fields;
pub mod handlers;
pub mod kind;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod provider;
pub mod records;
pub mod sections;
