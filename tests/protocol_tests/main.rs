//! Protocol tests: command parsing and response framing

mod codec_tests;
mod command_tests;
