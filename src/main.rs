fn main() {
    if let Err(e) = confidant::cli::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
