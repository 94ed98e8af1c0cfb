//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; the route table dispatches to the client.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_short_id_json, format_short_id_text, format_table_json, format_table_text,
};
pub use route::RunContext;
