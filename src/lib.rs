// Library root
// -----------
// The binary (`main.rs`) parses the command line and hands a `RestClient`
// to either the interactive menu or a one-shot command.
//
// Module responsibilities:
// - `api`: builds and sends PostgREST requests (the query builder).
// - `gateway`: per-table CRUD on top of `api`.
// - `filter`: in-memory range filtering, de-duplication and ordering.
// - `suggest`: catalog use cases, suggestion logging and the report.
// - `config`: backend credentials from the environment and `.env` files.
// - `ui` / `cli`: the terminal front-ends.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod model;
pub mod suggest;
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
