/// Formats an error and its whole chain of sources, one cause per line.
///
/// Used as the `Debug` implementation of our error enums, so that logging `{:?}`
/// shows where an error actually comes from.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Escapes control characters so a value always renders on a single line
pub fn escape_control_chars(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}
