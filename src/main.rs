fn main() {
    if let Err(e) = depot_cli::run_cli() {
        depot_logger::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
