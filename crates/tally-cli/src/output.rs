use serde::Serialize;

/// Print a serializable outcome to stdout as pretty JSON.
pub fn output<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
