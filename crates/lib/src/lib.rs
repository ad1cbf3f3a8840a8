//! Relay core library: LINE webhook ingress, completion backend, reply delivery, and the
//! HTTP server that ties them together. Used by the `relay` CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod routing;
pub mod signature;
pub mod storage;
