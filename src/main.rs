fn main() -> anyhow::Result<()> {
    let command_line_interface = nota::cli::CommandLineInterface::load();
    command_line_interface.run()
}
