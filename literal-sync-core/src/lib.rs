#![doc = "literal-sync-core: core logic library for literal-sync."]

//! This crate holds the literal round-tripper: it pulls embedded HTML/CSS/JS out of page
//! documents and SQL out of virtual domain documents, writes them to reviewable files,
//! rebuilds the documents from those files and checks that both sides agree.
//!
//! # Usage
//! The CLI crate only parses arguments and config; everything that touches documents,
//! manifests or extracted files lives here.

pub mod config;
pub mod content;
pub mod contract;
pub mod discover;
pub mod document;
pub mod manifest;
pub mod page;
pub mod pipeline;
pub mod virtual_domain;
