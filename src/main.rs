use buildbase::diag::Reporter;

fn main() {
    let reporter = Reporter::stdout();

    // All fatal conditions funnel through die() here, at the outermost entry
    // point, so the library itself never terminates the process.
    if let Err(e) = buildbase::run(&reporter) {
        log::error!("fatal: {}", e);
        reporter.die(&e.to_string(), "");
    }
}
