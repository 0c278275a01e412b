//! CLI subcommand implementations for the applyflow binary.

pub mod apply_cmd;
pub mod classify_cmd;
pub mod doctor;
