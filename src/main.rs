fn main() {
    if let Err(err) = journal_normalizer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
