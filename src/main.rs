fn main() {
    if let Err(err) = marketplace_notifier::run() {
        eprintln!("marketplace-notifier: {err:#}");
        std::process::exit(1);
    }
}
