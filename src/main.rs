fn main() {
    if let Err(err) = csv_station::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
