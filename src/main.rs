fn main() -> std::process::ExitCode {
    bracket_tool_lib::run()
}
