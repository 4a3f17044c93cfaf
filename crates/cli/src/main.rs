fn main() -> std::process::ExitCode {
    voltwiz_cli::run()
}
