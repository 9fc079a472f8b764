fn main() {
    std::process::exit(paddi_cli::run_from_env());
}
