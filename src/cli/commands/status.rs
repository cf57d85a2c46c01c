use crate::colors::*;

pub(super) fn format_status(kind: &str, detail: &str) -> String {
    let (color, action) = match kind {
        "resolving" => (C_CYAN, "resolving"),
        "linking" => (C_MAGENTA, "linking"),
        "wrote" => (C_GREEN, "wrote"),
        "dry-run" => (C_YELLOW, "dry-run"),
        "error" => (C_RED, "error"),
        _ => (C_DIM, kind),
    };
    format!("{C_GRAY}[pnpgen]{C_RESET} {color}{action}{C_RESET} {detail}")
}
