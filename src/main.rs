use anyhow::Context;
use shotmark::ExportRequest;

fn main() -> anyhow::Result<()> {
    let request = ExportRequest::from_args(std::env::args().skip(1))?;
    shotmark::run(&request)
        .with_context(|| format!("exporting {}", request.project.display()))?;
    Ok(())
}
