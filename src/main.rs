fn main() {
    std::process::exit(tfavail::cli::run());
}
