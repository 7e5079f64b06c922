use std::fmt::Display;

/// Write a message to stderr.
///
/// Results go to stdout, everything meant for the user goes through here.
fn print_message(v: impl Display) {
    eprintln!("{v}");
}

pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("❌ ERROR: {v}"));
}

/// double width character, add an additional space for alignment
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("⚠️  {v}"));
}
