//! IPC command handlers (Sections 21.1-21.6).
//!
//! Each submodule implements the commands for one IPC category.

pub mod diagnostics;
pub mod economy;
pub mod file_io;
pub mod identity;
pub mod messenger;
pub mod network;
pub mod whisper;
