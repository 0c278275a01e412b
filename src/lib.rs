// Copyright 2026 Applyflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Applyflow engine library — multi-step job application automation.
//!
//! This library crate exposes the core modules for integration testing.

#![allow(
    dead_code,
    unused_imports,
    clippy::new_without_default,
    clippy::should_implement_trait
)]

pub mod answers;
pub mod classify;
pub mod cli;
pub mod config;
pub mod content;
pub mod driver;
pub mod error;
pub mod events;
pub mod machine;
pub mod mapper;
pub mod pacing;
pub mod record;
pub mod snapshot;
pub mod variants;
