//! Mode listing (no connection needed).

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use aldes_core::Mode;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ModeView {
    name: &'static str,
    code: &'static str,
}

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Mode")]
    name: &'static str,
    #[tabled(rename = "Code")]
    code: &'static str,
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let views: Vec<ModeView> = Mode::iter()
        .map(|m| ModeView {
            name: m.display_name(),
            code: m.code(),
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &views,
        |v| ModeRow {
            name: v.name,
            code: v.code,
        },
        |v| v.name.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
