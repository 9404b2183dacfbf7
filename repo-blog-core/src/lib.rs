#![doc = "repo-blog-core: core logic library for repo-blog."]

//! This crate holds the generation pipeline: repository scanning, content
//! extraction, prompt building and generation with retry, platform
//! formatting, publishing orchestration and local storage.
//! Concrete generation and publishing HTTP clients live in the CLI crate;
//! they plug in through the traits in [`contract`].
//!
//! # Usage
//! Add this as a dependency for all shared pipeline, formatting, config and
//! publish code.

pub mod config;
pub mod contract;
pub mod error;
pub mod extract;
pub mod format;
pub mod frontmatter;
pub mod generate;
pub mod github;
pub mod locator;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod scan;
pub mod storage;
