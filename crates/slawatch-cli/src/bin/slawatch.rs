fn main() {
    let code = slawatch_cli::run_from_env();
    std::process::exit(code);
}
