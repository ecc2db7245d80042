fn main() {
    if let Err(err) = sheet_import::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
