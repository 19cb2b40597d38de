use sir_ro::runner::run_with_args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_with_args()?;
    for path in &summary.written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
