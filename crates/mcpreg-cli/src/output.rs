use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print `- item` lines, one per entry.
pub fn print_list<S: AsRef<str>>(items: &[S]) {
    for item in items {
        println!("  - {}", item.as_ref());
    }
}
