//! Controller firmware protocol
//!
//! The arm firmware prints `Ready for commands...` after reset, then
//! `REQUEST` whenever its receive buffer has room. Line-ack builds answer
//! each command with `OK`, `DONE` or `NEXT`.

pub mod response_parser;
