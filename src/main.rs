fn main() {
    if let Err(err) = permits_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
